// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! depth-probe-core: empirical depth-buffer precision measurement.
//!
//! For each of a set of log-spaced distances between the near and far planes,
//! an adaptive search finds the smallest gap between two coplanar quads that
//! the depth test still orders correctly. Each candidate gap is judged by a
//! [`DepthOracle`] (the GPU, or the [`ReferenceOracle`] software rasterizer)
//! under jittered, order-reversed trials.
//!
//! ```
//! use depth_probe_core::{BatchDriver, DepthEncoding, ProbeConfig, ReferenceOracle};
//!
//! let config = ProbeConfig {
//!     encoding: DepthEncoding::LogDepthViaClipZ,
//!     near: 1.0,
//!     far: 1000.0,
//!     param_c: 1.0,
//!     num_sample_points: 4,
//!     num_perturbed_trials: 2,
//! };
//! let oracle = ReferenceOracle::new(config.encoding);
//! let mut driver = BatchDriver::new(config, oracle, 42).unwrap();
//! let results = driver.run().unwrap();
//! assert_eq!(results.len(), 3);
//! assert!(results.iter().all(|r| r.resolved_gap > 0.0));
//! ```
#![forbid(unsafe_code)]

pub mod batch;
pub mod config;
pub mod encoding;
pub mod oracle;
pub mod preset;
pub mod reference;
pub mod report;
pub mod samples;
pub mod search;
pub mod trial;

pub use batch::{BatchDriver, ProbeResult};
pub use config::{ConfigError, ProbeConfig};
pub use encoding::{DepthEncoding, DepthParams};
pub use oracle::{DepthOracle, OracleError, Visibility, PLANE_A_COLOR, PLANE_B_COLOR};
pub use preset::{PresetError, PresetService, PresetStore};
pub use reference::{DepthFormat, ReferenceOracle};
pub use report::{ParsedSample, ReportError, RunReport};
pub use samples::sample_distances;
pub use search::{
    minimal_resolvable_gap, search_gap, GapSearch, SearchOutcome, SearchState, StepKind,
    MAXIMUM_GAP, MINIMUM_GAP,
};
pub use trial::{GapPredicate, TrialEvaluator};

/// Jitter seed used when the caller does not pick one, so repeated runs match.
pub const DEFAULT_JITTER_SEED: u64 = 0x5EED_DEB7;
