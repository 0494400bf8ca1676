// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Software oracle: a 1×1 colour + depth target rasterized on the CPU.
//!
//! Follows the fixed-function path a GPU takes for the probe: vertex-stage
//! clipping, optional fragment depth override (clamped), quantisation to the
//! depth format, `Less` compare against a cleared depth of 1.0, and exact
//! primary-colour decoding of the surviving pixel.

use serde::{Deserialize, Serialize};

use crate::encoding::{DepthEncoding, DepthParams};
use crate::oracle::{DepthOracle, OracleError, Visibility, PLANE_A_COLOR, PLANE_B_COLOR};

/// Storage format of the emulated depth attachment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthFormat {
    /// 24-bit unsigned normalised depth (the `DEPTH24_STENCIL8` layout).
    #[default]
    Unorm24,
    /// 32-bit float depth.
    Float32,
}

impl DepthFormat {
    const UNORM24_MAX: u32 = (1 << 24) - 1;

    /// Ordered key for a depth in `[0, 1]`; smaller key = nearer.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn store(self, depth: f32) -> u32 {
        match self {
            Self::Unorm24 => (f64::from(depth) * f64::from(Self::UNORM24_MAX)).round() as u32,
            // Non-negative IEEE floats order like their bit patterns.
            Self::Float32 => depth.to_bits(),
        }
    }
}

/// 1×1 render target.
#[derive(Clone, Copy, Debug)]
struct Target {
    color: [u8; 4],
    depth: u32,
}

/// Deterministic CPU stand-in for the GPU oracle.
#[derive(Clone, Debug)]
pub struct ReferenceOracle {
    encoding: DepthEncoding,
    format: DepthFormat,
    target: Target,
    tests_run: u64,
}

impl ReferenceOracle {
    /// Oracle for `encoding` with a 24-bit depth attachment.
    pub fn new(encoding: DepthEncoding) -> Self {
        Self::with_format(encoding, DepthFormat::default())
    }

    /// Oracle for `encoding` with an explicit depth format.
    pub fn with_format(encoding: DepthEncoding, format: DepthFormat) -> Self {
        Self {
            encoding,
            format,
            target: Target {
                color: [0; 4],
                depth: format.store(1.0),
            },
            tests_run: 0,
        }
    }

    /// Depth format of the emulated attachment.
    pub fn format(&self) -> DepthFormat {
        self.format
    }

    /// Number of `test` calls served.
    pub fn tests_run(&self) -> u64 {
        self.tests_run
    }

    fn clear(&mut self) {
        self.target = Target {
            color: [0; 4],
            depth: self.format.store(1.0),
        };
    }

    /// Depth of the single fragment a plane at `distance` produces, or `None`
    /// when the primitive is clipped away.
    fn fragment_depth(&self, distance: f32, params: &DepthParams) -> Option<f32> {
        let vertex_depth = match self.encoding {
            DepthEncoding::LogDepthViaClipZ => self.encoding.window_depth(distance, params),
            DepthEncoding::Perspective | DepthEncoding::LogDepthViaFragmentDepth => {
                DepthEncoding::Perspective.window_depth(distance, params)
            }
        };
        if !(0.0..=1.0).contains(&vertex_depth) {
            return None;
        }
        if self.encoding.writes_fragment_depth() {
            let frag = self.encoding.window_depth(distance, params);
            if frag.is_nan() {
                return None;
            }
            return Some(frag.clamp(0.0, 1.0));
        }
        Some(vertex_depth)
    }

    fn draw_plane(&mut self, distance: f32, params: &DepthParams, color: [u8; 4]) {
        let Some(depth) = self.fragment_depth(distance, params) else {
            return;
        };
        let stored = self.format.store(depth);
        if stored < self.target.depth {
            self.target = Target {
                color,
                depth: stored,
            };
        }
    }
}

impl DepthOracle for ReferenceOracle {
    fn encoding(&self) -> DepthEncoding {
        self.encoding
    }

    fn test(
        &mut self,
        params: &DepthParams,
        depth_a: f32,
        depth_b: f32,
    ) -> Result<Visibility, OracleError> {
        self.clear();
        self.draw_plane(depth_a, params, PLANE_A_COLOR);
        self.draw_plane(depth_b, params, PLANE_B_COLOR);
        self.tests_run += 1;
        Ok(Visibility::from_rgba8(self.target.color))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    const PARAMS: DepthParams = DepthParams {
        near: 1.0,
        far: 1000.0,
        param_c: 1.0,
    };

    #[test]
    fn well_separated_planes_resolve_in_both_orders() {
        for e in DepthEncoding::ALL {
            let mut o = ReferenceOracle::new(e);
            assert!(o.test(&PARAMS, 10.0, 20.0).unwrap().only_a(), "{e}");
            assert!(o.test(&PARAMS, 20.0, 10.0).unwrap().only_b(), "{e}");
        }
        assert_eq!(ReferenceOracle::new(DepthEncoding::Perspective).tests_run(), 0);
    }

    #[test]
    fn coincident_planes_keep_the_first_draw() {
        let mut o = ReferenceOracle::new(DepthEncoding::LogDepthViaClipZ);
        let v = o.test(&PARAMS, 50.0, 50.0).unwrap();
        assert!(v.only_a());
    }

    #[test]
    fn planes_beyond_far_are_clipped() {
        let mut o = ReferenceOracle::new(DepthEncoding::Perspective);
        let v = o.test(&PARAMS, 2000.0, 3000.0).unwrap();
        assert!(v.is_inconclusive());
        assert_eq!(o.tests_run(), 1);
    }

    #[test]
    fn perspective_loses_far_planes_that_log_depth_keeps() {
        // At 900 units a 0.01 gap moves perspective depth by ~1e-8, well
        // under one 24-bit step; the log mapping still separates them.
        let mut persp = ReferenceOracle::new(DepthEncoding::Perspective);
        let mut log = ReferenceOracle::new(DepthEncoding::LogDepthViaClipZ);
        let (a, b) = (900.0, 900.01);
        assert!(!persp.test(&PARAMS, b, a).unwrap().only_b());
        assert!(log.test(&PARAMS, b, a).unwrap().only_b());
    }

    #[test]
    fn float_depth_is_finer_than_unorm24() {
        let mut unorm = ReferenceOracle::new(DepthEncoding::LogDepthViaClipZ);
        let mut float =
            ReferenceOracle::with_format(DepthEncoding::LogDepthViaClipZ, DepthFormat::Float32);
        // Both land on 24-bit step 2428 but are distinct as floats.
        let (a, b) = (1.001, 1.001_000_3);
        assert!(!unorm.test(&PARAMS, b, a).unwrap().only_b());
        assert!(float.test(&PARAMS, b, a).unwrap().only_b());
        assert_eq!(float.format(), DepthFormat::Float32);
    }
}
