// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Adaptive search for the smallest gap the depth test still resolves at one
//! sample distance.
//!
//! The window is `[baseGap - range, baseGap]`. Each step probes four evenly
//! spaced candidates from the top of the window down and moves the window
//! according to the first candidate that fails:
//!
//! | first failure | base gap            | range        |
//! |---------------|---------------------|--------------|
//! | 0             | `+= range`          | `*= 2`       |
//! | 1             | unchanged           | `*= 0.5`     |
//! | 2             | `-= 0.25 · range`   | `*= 0.5`     |
//! | 3             | `-= 0.5 · range`    | `*= 0.5`     |
//! | none          | `-= 0.5 · range`    | `*= 0.5`     |
//!
//! The constants are part of the measurement: changing them changes the
//! reported precision numbers.

use tracing::trace;

use crate::oracle::OracleError;
use crate::trial::GapPredicate;

/// The search stops once the window is this narrow.
pub const MINIMUM_GAP: f32 = 1.0e-20;
/// The search stops once the gap grows this large.
pub const MAXIMUM_GAP: f32 = 1.0e30;

const INITIAL_WINDOW_FRACTION: f32 = 0.1;
const CANDIDATES_PER_STEP: u32 = 4;

/// Mutable window of one search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchState {
    /// Largest candidate gap of the window.
    pub base_gap: f32,
    /// Width of the window below `base_gap`.
    pub range: f32,
}

/// What a single step did to the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepKind {
    /// Even the largest candidate failed; the window moved up and doubled.
    Widened,
    /// Candidate `first_failure` (1..=3) failed; the window halved.
    Narrowed {
        /// Index of the first failing candidate.
        first_failure: u32,
    },
    /// All four candidates resolved; the window moved down and halved.
    AllResolved,
}

/// Result of searching one sample distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SearchOutcome {
    /// The search ran to completion; the smallest gap still reliably resolved.
    Converged(f32),
    /// The sample distance was not strictly between near and far.
    OutOfRange,
}

impl SearchOutcome {
    /// Gap to report, using `far` as the out-of-range sentinel.
    pub fn resolved_gap(self, far: f32) -> f32 {
        match self {
            Self::Converged(gap) => gap,
            Self::OutOfRange => far,
        }
    }

    /// `true` for [`SearchOutcome::OutOfRange`].
    pub const fn is_out_of_range(self) -> bool {
        matches!(self, Self::OutOfRange)
    }
}

/// Stepping search at one sample distance.
#[derive(Clone, Debug)]
pub struct GapSearch {
    sample_distance: f32,
    near: f32,
    far: f32,
    state: SearchState,
    steps: u32,
}

impl GapSearch {
    /// Start a search at `sample_distance`, or `None` unless
    /// `near < sample_distance < far`.
    pub fn new(sample_distance: f32, near: f32, far: f32) -> Option<Self> {
        if !(near < sample_distance && sample_distance < far) {
            return None;
        }
        let min_boundary_distance = (sample_distance - near).min(far - sample_distance);
        let base_gap = min_boundary_distance * INITIAL_WINDOW_FRACTION;
        Some(Self {
            sample_distance,
            near,
            far,
            state: SearchState {
                base_gap,
                range: base_gap,
            },
            steps: 0,
        })
    }

    /// Current window.
    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Steps taken so far.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Sample distance this search is centred on.
    pub fn sample_distance(&self) -> f32 {
        self.sample_distance
    }

    /// Whether another step is allowed.
    pub fn is_window_valid(&self) -> bool {
        let SearchState { base_gap, range } = self.state;
        let s = self.sample_distance;
        range > MINIMUM_GAP
            && base_gap < MAXIMUM_GAP
            && base_gap < s * 0.5
            && s + base_gap * 0.5 < self.far
            && s - base_gap * 0.5 > self.near
    }

    /// Probe the four candidates of the current window and move it.
    pub fn step<P>(&mut self, predicate: &mut P) -> Result<StepKind, OracleError>
    where
        P: GapPredicate + ?Sized,
    {
        let SearchState {
            mut base_gap,
            mut range,
        } = self.state;

        let mut kind = StepKind::AllResolved;
        for i in 0..CANDIDATES_PER_STEP {
            let candidate = base_gap - i as f32 / CANDIDATES_PER_STEP as f32 * range;
            if !predicate.is_gap_resolvable(self.sample_distance, candidate)? {
                kind = if i == 0 {
                    StepKind::Widened
                } else {
                    StepKind::Narrowed { first_failure: i }
                };
                break;
            }
        }

        match kind {
            StepKind::Widened => {
                base_gap += range;
                range *= 2.0;
            }
            StepKind::Narrowed { first_failure: 1 } => {
                range *= 0.5;
            }
            StepKind::Narrowed { first_failure: 2 } => {
                base_gap -= 0.25 * range;
                range *= 0.5;
            }
            StepKind::Narrowed { .. } | StepKind::AllResolved => {
                base_gap -= 0.5 * range;
                range *= 0.5;
            }
        }

        self.state = SearchState { base_gap, range };
        self.steps += 1;
        trace!(
            sample = self.sample_distance,
            step = self.steps,
            ?kind,
            base_gap,
            range,
            "gap search step"
        );
        Ok(kind)
    }

    /// Step until the window becomes invalid and return the final base gap.
    pub fn run<P>(mut self, predicate: &mut P) -> Result<f32, OracleError>
    where
        P: GapPredicate + ?Sized,
    {
        while self.is_window_valid() {
            self.step(predicate)?;
        }
        Ok(self.state.base_gap)
    }
}

/// Search one sample distance to completion.
pub fn search_gap<P>(
    predicate: &mut P,
    sample_distance: f32,
    near: f32,
    far: f32,
) -> Result<SearchOutcome, OracleError>
where
    P: GapPredicate + ?Sized,
{
    match GapSearch::new(sample_distance, near, far) {
        Some(search) => search.run(predicate).map(SearchOutcome::Converged),
        None => Ok(SearchOutcome::OutOfRange),
    }
}

/// Smallest reliably resolvable gap at `sample_distance`, or exactly `far`
/// when the distance is not strictly inside the frustum.
pub fn minimal_resolvable_gap<P>(
    predicate: &mut P,
    sample_distance: f32,
    near: f32,
    far: f32,
) -> Result<f32, OracleError>
where
    P: GapPredicate + ?Sized,
{
    search_gap(predicate, sample_distance, near, far).map(|o| o.resolved_gap(far))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    /// Answers from a fixed script, then resolves everything.
    struct Scripted(Vec<bool>);

    impl GapPredicate for Scripted {
        fn is_gap_resolvable(&mut self, _: f32, _: f32) -> Result<bool, OracleError> {
            Ok(if self.0.is_empty() {
                true
            } else {
                self.0.remove(0)
            })
        }
    }

    fn fresh() -> GapSearch {
        // min boundary distance 90 -> base = range = 9
        GapSearch::new(100.0, 10.0, 1000.0).unwrap()
    }

    #[test]
    fn initial_window_is_a_tenth_of_the_nearest_boundary() {
        let s = fresh();
        assert_eq!(
            s.state(),
            SearchState {
                base_gap: 9.0,
                range: 9.0
            }
        );
        assert!(s.is_window_valid());
    }

    #[test]
    fn first_candidate_failure_widens() {
        let mut s = fresh();
        let kind = s.step(&mut Scripted(vec![false])).unwrap();
        assert_eq!(kind, StepKind::Widened);
        assert_eq!(
            s.state(),
            SearchState {
                base_gap: 18.0,
                range: 18.0
            }
        );
    }

    #[test]
    fn later_failures_shrink_with_offsets() {
        let cases = [
            (vec![true, false], 9.0, 4.5),
            (vec![true, true, false], 6.75, 4.5),
            (vec![true, true, true, false], 4.5, 4.5),
            (vec![true, true, true, true], 4.5, 4.5),
        ];
        for (script, base_gap, range) in cases {
            let mut s = fresh();
            s.step(&mut Scripted(script.clone())).unwrap();
            assert_eq!(
                s.state(),
                SearchState { base_gap, range },
                "script {script:?}"
            );
        }
    }

    #[test]
    fn out_of_range_samples_report_far() {
        let mut p = Scripted(vec![]);
        for s in [0.5, 10.0, 1000.0, 2000.0] {
            assert_eq!(minimal_resolvable_gap(&mut p, s, 10.0, 1000.0).unwrap(), 1000.0);
            assert!(search_gap(&mut p, s, 10.0, 1000.0)
                .unwrap()
                .is_out_of_range());
        }
    }

    #[test]
    fn never_resolvable_widens_until_the_window_leaves_the_frustum() {
        struct Never;
        impl GapPredicate for Never {
            fn is_gap_resolvable(&mut self, _: f32, _: f32) -> Result<bool, OracleError> {
                Ok(false)
            }
        }
        let gap = minimal_resolvable_gap(&mut Never, 100.0, 1.0, 1000.0).unwrap();
        // 9.9 -> 19.8 -> 39.6 -> 79.2, which is past half the sample distance.
        assert!((gap - 79.2).abs() < 1e-3, "{gap}");
    }
}
