// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Run configuration for a probing batch.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encoding::{DepthEncoding, DepthParams};

/// Error type for invalid probe configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Near plane is zero, negative, or not finite.
    #[error("near must be positive and finite (got {0})")]
    InvalidNear(f32),
    /// Far plane does not lie beyond the near plane.
    #[error("far must be finite and greater than near (near {near}, far {far})")]
    InvalidRange {
        /// Configured near plane.
        near: f32,
        /// Configured far plane.
        far: f32,
    },
    /// Compression parameter unusable for the selected encoding.
    #[error("parameter C must be positive and finite for {encoding} (got {value})")]
    InvalidParamC {
        /// Encoding that consumes `C`.
        encoding: DepthEncoding,
        /// Offending value.
        value: f32,
    },
    /// Fewer than two sample points leaves nothing between near and far.
    #[error("num_sample_points must be at least 2 (got {0})")]
    TooFewSamplePoints(u32),
    /// Zero trials would accept every gap.
    #[error("num_perturbed_trials must be at least 1")]
    NoPerturbedTrials,
    /// Encoding selector did not match any known encoding.
    #[error("unknown depth encoding `{0}` (expected perspective, logfn or logcf)")]
    UnknownEncoding(String),
    /// Oracle was built for a different encoding than the run asks for.
    #[error("oracle encodes {oracle} but the run is configured for {config}")]
    EncodingMismatch {
        /// Encoding requested by the configuration.
        config: DepthEncoding,
        /// Encoding the oracle was constructed with.
        oracle: DepthEncoding,
    },
}

/// Immutable parameters for one probing run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Encoding under test.
    pub encoding: DepthEncoding,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
    /// Compression parameter `C` (only read by the fragment-depth log encoding).
    pub param_c: f32,
    /// `N`; the run probes `N - 1` distances strictly between near and far.
    pub num_sample_points: u32,
    /// Jittered, order-reversed trials required per candidate gap.
    pub num_perturbed_trials: u32,
}

impl ProbeConfig {
    /// Check every invariant the probing engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.near.is_finite() && self.near > 0.0) {
            return Err(ConfigError::InvalidNear(self.near));
        }
        if !(self.far.is_finite() && self.far > self.near) {
            return Err(ConfigError::InvalidRange {
                near: self.near,
                far: self.far,
            });
        }
        if self.encoding.uses_param_c() && !(self.param_c.is_finite() && self.param_c > 0.0) {
            return Err(ConfigError::InvalidParamC {
                encoding: self.encoding,
                value: self.param_c,
            });
        }
        if self.num_sample_points < 2 {
            return Err(ConfigError::TooFewSamplePoints(self.num_sample_points));
        }
        if self.num_perturbed_trials == 0 {
            return Err(ConfigError::NoPerturbedTrials);
        }
        Ok(())
    }

    /// Parameters handed to the oracle on every call.
    pub fn depth_params(&self) -> DepthParams {
        DepthParams {
            near: self.near,
            far: self.far,
            param_c: self.param_c,
        }
    }
}
