// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stub oracles.

use depth_probe_core::{DepthEncoding, DepthOracle, DepthParams, OracleError, Visibility};

/// Orders planes correctly once they are at least `threshold` apart.
///
/// Closer pairs behave like coincident geometry in a real depth buffer: the
/// first plane drawn keeps the pixel, so only one draw order looks right.
#[derive(Clone, Debug)]
pub struct ThresholdOracle {
    encoding: DepthEncoding,
    threshold: f32,
}

impl ThresholdOracle {
    /// Oracle claiming to implement `encoding` with a fixed resolution limit.
    pub fn new(encoding: DepthEncoding, threshold: f32) -> Self {
        Self {
            encoding,
            threshold,
        }
    }

    /// Configured resolution limit.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl DepthOracle for ThresholdOracle {
    fn encoding(&self) -> DepthEncoding {
        self.encoding
    }

    fn test(
        &mut self,
        _: &DepthParams,
        depth_a: f32,
        depth_b: f32,
    ) -> Result<Visibility, OracleError> {
        let a_wins = (depth_b - depth_a).abs() < self.threshold || depth_a < depth_b;
        Ok(Visibility {
            a_visible: a_wins,
            b_visible: !a_wins,
        })
    }
}

/// Always reports plane A, whatever the depths.
#[derive(Clone, Copy, Debug)]
pub struct StuckOracle(pub DepthEncoding);

impl DepthOracle for StuckOracle {
    fn encoding(&self) -> DepthEncoding {
        self.0
    }

    fn test(&mut self, _: &DepthParams, _: f32, _: f32) -> Result<Visibility, OracleError> {
        Ok(Visibility {
            a_visible: true,
            b_visible: false,
        })
    }
}

/// Forwards to an inner oracle and records every plane pair it was asked about.
#[derive(Clone, Debug)]
pub struct CountingOracle<O> {
    inner: O,
    calls: Vec<(f32, f32)>,
}

impl<O> CountingOracle<O> {
    /// Wrap `inner`.
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            calls: Vec::new(),
        }
    }

    /// Number of `test` calls so far.
    pub fn count(&self) -> usize {
        self.calls.len()
    }

    /// Every `(depth_a, depth_b)` pair in call order.
    pub fn calls(&self) -> &[(f32, f32)] {
        &self.calls
    }

    /// Unwrap the inner oracle.
    pub fn into_inner(self) -> O {
        self.inner
    }
}

impl<O: DepthOracle> DepthOracle for CountingOracle<O> {
    fn encoding(&self) -> DepthEncoding {
        self.inner.encoding()
    }

    fn test(
        &mut self,
        params: &DepthParams,
        depth_a: f32,
        depth_b: f32,
    ) -> Result<Visibility, OracleError> {
        self.calls.push((depth_a, depth_b));
        self.inner.test(params, depth_a, depth_b)
    }
}

/// Answers correctly for `remaining` calls, then fails every read-back.
#[derive(Clone, Debug)]
pub struct FailingOracle {
    encoding: DepthEncoding,
    remaining: usize,
}

impl FailingOracle {
    /// Oracle that serves `calls_before_failure` good answers.
    pub fn new(encoding: DepthEncoding, calls_before_failure: usize) -> Self {
        Self {
            encoding,
            remaining: calls_before_failure,
        }
    }
}

impl DepthOracle for FailingOracle {
    fn encoding(&self) -> DepthEncoding {
        self.encoding
    }

    fn test(
        &mut self,
        _: &DepthParams,
        depth_a: f32,
        depth_b: f32,
    ) -> Result<Visibility, OracleError> {
        if self.remaining == 0 {
            return Err(OracleError::Readback("simulated read-back failure".into()));
        }
        self.remaining -= 1;
        Ok(Visibility {
            a_visible: depth_a < depth_b,
            b_visible: depth_b < depth_a,
        })
    }
}
