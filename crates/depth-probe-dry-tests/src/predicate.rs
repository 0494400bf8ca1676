// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Gap predicates for exercising the search directly.

use depth_probe_core::{GapPredicate, OracleError};

/// Resolves every gap at or above `threshold`; counts the questions asked.
#[derive(Clone, Debug)]
pub struct ThresholdPredicate {
    /// Smallest resolvable gap.
    pub threshold: f32,
    /// Number of `is_gap_resolvable` calls so far.
    pub calls: u64,
}

impl ThresholdPredicate {
    /// Predicate with the given resolution limit.
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            calls: 0,
        }
    }
}

impl GapPredicate for ThresholdPredicate {
    fn is_gap_resolvable(&mut self, _center: f32, gap: f32) -> Result<bool, OracleError> {
        self.calls += 1;
        Ok(gap >= self.threshold)
    }
}

/// Every gap resolves.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysResolvable;

impl GapPredicate for AlwaysResolvable {
    fn is_gap_resolvable(&mut self, _: f32, _: f32) -> Result<bool, OracleError> {
        Ok(true)
    }
}

/// No gap resolves.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverResolvable;

impl GapPredicate for NeverResolvable {
    fn is_gap_resolvable(&mut self, _: f32, _: f32) -> Result<bool, OracleError> {
        Ok(false)
    }
}
