// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles for depth-probe crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`oracle`] - Stub oracles with known resolution thresholds and faults
//! - [`predicate`] - Gap predicates for driving the search without an oracle
//! - [`preset`] - In-memory preset store fake for testing without filesystem

pub mod oracle;
pub mod predicate;
pub mod preset;

pub use oracle::{CountingOracle, FailingOracle, StuckOracle, ThresholdOracle};
pub use predicate::{AlwaysResolvable, NeverResolvable, ThresholdPredicate};
pub use preset::InMemoryPresetStore;
