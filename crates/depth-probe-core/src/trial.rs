// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Jittered, order-reversed trials that turn one oracle comparison into a
//! robust "this gap is resolvable" predicate.

use rand::Rng;
use tracing::trace;

use crate::encoding::DepthParams;
use crate::oracle::{DepthOracle, OracleError};

/// Jitter is drawn from `±gap / JITTER_DIVISOR`.
pub const JITTER_DIVISOR: f32 = 500.0;

/// Yes/no question the gap search asks about a candidate gap.
pub trait GapPredicate {
    /// Can two planes `gap` apart, centred on `center`, be told apart?
    fn is_gap_resolvable(&mut self, center: f32, gap: f32) -> Result<bool, OracleError>;
}

impl<P: GapPredicate + ?Sized> GapPredicate for &mut P {
    fn is_gap_resolvable(&mut self, center: f32, gap: f32) -> Result<bool, OracleError> {
        (**self).is_gap_resolvable(center, gap)
    }
}

/// Wraps an oracle with a seeded jitter source and a fixed trial count.
pub struct TrialEvaluator<O, R> {
    oracle: O,
    rng: R,
    params: DepthParams,
    trials: u32,
}

impl<O, R> TrialEvaluator<O, R>
where
    O: DepthOracle,
    R: Rng,
{
    /// Build an evaluator running `trials` perturbed trials per candidate gap.
    pub fn new(oracle: O, rng: R, params: DepthParams, trials: u32) -> Self {
        Self {
            oracle,
            rng,
            params,
            trials,
        }
    }

    /// Borrow the wrapped oracle.
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Release the wrapped oracle.
    pub fn into_oracle(self) -> O {
        self.oracle
    }

    fn jitter(&mut self, gap: f32) -> f32 {
        let half_width = gap / JITTER_DIVISOR;
        if half_width > 0.0 {
            self.rng.gen_range(-half_width..half_width)
        } else {
            0.0
        }
    }

    /// The nearer plane must win with both draw orders.
    fn ordered_in_both_draw_orders(
        &mut self,
        plane_near: f32,
        plane_far: f32,
    ) -> Result<bool, OracleError> {
        let forward = self.oracle.test(&self.params, plane_near, plane_far)?;
        if !forward.only_a() {
            trace!(plane_near, plane_far, ?forward, "forward order rejected");
            return Ok(false);
        }
        let reversed = self.oracle.test(&self.params, plane_far, plane_near)?;
        if !reversed.only_b() {
            trace!(plane_near, plane_far, ?reversed, "reversed order rejected");
            return Ok(false);
        }
        Ok(true)
    }
}

impl<O, R> GapPredicate for TrialEvaluator<O, R>
where
    O: DepthOracle,
    R: Rng,
{
    fn is_gap_resolvable(&mut self, center: f32, gap: f32) -> Result<bool, OracleError> {
        for _ in 0..self.trials {
            let perturbed = gap + self.jitter(gap);
            let plane_near = center - 0.5 * perturbed;
            let plane_far = center + 0.5 * perturbed;
            if !self.ordered_in_both_draw_orders(plane_near, plane_far)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::encoding::DepthEncoding;
    use crate::oracle::Visibility;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const PARAMS: DepthParams = DepthParams {
        near: 1.0,
        far: 100.0,
        param_c: 1.0,
    };

    /// Records every call and answers with the true ordering.
    #[derive(Default)]
    struct Recording {
        calls: Vec<(f32, f32)>,
    }

    impl DepthOracle for Recording {
        fn encoding(&self) -> DepthEncoding {
            DepthEncoding::Perspective
        }

        fn test(
            &mut self,
            _params: &DepthParams,
            a: f32,
            b: f32,
        ) -> Result<Visibility, OracleError> {
            self.calls.push((a, b));
            Ok(Visibility {
                a_visible: a < b,
                b_visible: b < a,
            })
        }
    }

    /// Always claims plane A won, whatever the depths.
    struct StuckOnA;

    impl DepthOracle for StuckOnA {
        fn encoding(&self) -> DepthEncoding {
            DepthEncoding::Perspective
        }

        fn test(&mut self, _: &DepthParams, _: f32, _: f32) -> Result<Visibility, OracleError> {
            Ok(Visibility {
                a_visible: true,
                b_visible: false,
            })
        }
    }

    #[test]
    fn runs_every_trial_in_both_orders() {
        let mut eval = TrialEvaluator::new(
            Recording::default(),
            StdRng::seed_from_u64(7),
            PARAMS,
            3,
        );
        assert!(eval.is_gap_resolvable(10.0, 1.0).unwrap());
        let calls = &eval.oracle().calls;
        assert_eq!(calls.len(), 6);
        for pair in calls.chunks(2) {
            let (near, far) = pair[0];
            assert_eq!(pair[1], (far, near));
            let gap = far - near;
            assert!((gap - 1.0).abs() <= 1.0 / JITTER_DIVISOR + 1e-5, "gap {gap}");
            assert!(((near + far) * 0.5 - 10.0).abs() < 1e-5);
        }
    }

    #[test]
    fn order_reversal_exposes_a_stuck_oracle() {
        let mut eval = TrialEvaluator::new(StuckOnA, StdRng::seed_from_u64(1), PARAMS, 5);
        assert!(!eval.is_gap_resolvable(10.0, 1.0).unwrap());
    }

    #[test]
    fn same_seed_draws_same_planes() {
        let run = |seed| {
            let mut eval = TrialEvaluator::new(
                Recording::default(),
                StdRng::seed_from_u64(seed),
                PARAMS,
                4,
            );
            eval.is_gap_resolvable(20.0, 0.5).unwrap();
            eval.into_oracle().calls
        };
        assert_eq!(run(3), run(3));
        assert_ne!(run(3), run(4));
    }
}
