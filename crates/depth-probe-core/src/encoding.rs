// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Depth encodings under test and the formulas that map view distance to stored depth.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

/// How a view-space distance becomes the value stored in the depth buffer.
///
/// Resolved once per session: an oracle is built for exactly one encoding and
/// never switches at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepthEncoding {
    /// Standard projection matrix followed by the clip-space divide.
    #[serde(rename = "perspective")]
    Perspective,
    /// `(ln(-z) - ln(n)) / (ln(f) - ln(n))` written into clip-space Z (pre-multiplied by `w`).
    #[serde(rename = "logfn")]
    LogDepthViaClipZ,
    /// `ln(-c·z + 1) / ln(c·f + 1)` written to the fragment depth output.
    #[serde(rename = "logcf")]
    LogDepthViaFragmentDepth,
}

impl DepthEncoding {
    /// Every encoding, in CLI listing order.
    pub const ALL: [Self; 3] = [
        Self::Perspective,
        Self::LogDepthViaClipZ,
        Self::LogDepthViaFragmentDepth,
    ];

    /// Short selector used on the command line and in presets.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Perspective => "perspective",
            Self::LogDepthViaClipZ => "logfn",
            Self::LogDepthViaFragmentDepth => "logcf",
        }
    }

    /// Human-readable description for run banners.
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Perspective => "Perspective (normal) depth",
            Self::LogDepthViaClipZ => "Log depth ((log(-z)-log(n)) / (log(f)-log(n)) type)",
            Self::LogDepthViaFragmentDepth => "Log depth (log(-cz+1) / log(cf+1) type)",
        }
    }

    /// Whether the compression parameter `C` influences this encoding.
    pub const fn uses_param_c(self) -> bool {
        matches!(self, Self::LogDepthViaFragmentDepth)
    }

    /// Whether the fragment stage overrides the rasterizer's interpolated depth.
    pub const fn writes_fragment_depth(self) -> bool {
        matches!(self, Self::LogDepthViaFragmentDepth)
    }

    /// Window-space depth in `[0, 1]` (before clamping) for a plane at `distance`
    /// in front of the camera.
    ///
    /// Computed in `f32` with the same operation order as the shaders, so the
    /// rounding behaviour matches what a GPU would store.
    #[allow(clippy::imprecise_flops)]
    pub fn window_depth(self, distance: f32, params: &DepthParams) -> f32 {
        match self {
            Self::Perspective => perspective_window_depth(distance, params.near, params.far),
            Self::LogDepthViaClipZ => {
                let log_near = params.near.ln();
                let log_far = params.far.ln();
                (distance.ln() - log_near) / (log_far - log_near)
            }
            Self::LogDepthViaFragmentDepth => {
                let log_cf_plus_1_inv = 1.0 / (params.param_c * params.far + 1.0).ln();
                (params.param_c * distance + 1.0).ln() * log_cf_plus_1_inv
            }
        }
    }
}

/// Depth after an OpenGL-style projection matrix and perspective divide,
/// remapped from NDC `[-1, 1]` to window `[0, 1]`.
fn perspective_window_depth(distance: f32, near: f32, far: f32) -> f32 {
    let z_view = -distance;
    let m22 = -(far + near) / (far - near);
    let m23 = -2.0 * far * near / (far - near);
    let z_clip = m22 * z_view + m23;
    let w_clip = -z_view;
    let z_ndc = z_clip / w_clip;
    z_ndc * 0.5 + 0.5
}

impl fmt::Display for DepthEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DepthEncoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.name() == s)
            .ok_or_else(|| ConfigError::UnknownEncoding(s.to_owned()))
    }
}

/// Frustum and compression parameters shared by every oracle call of a run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepthParams {
    /// Near clip distance (positive).
    pub near: f32,
    /// Far clip distance (greater than `near`).
    pub far: f32,
    /// Compression parameter `C` of the fragment-depth log encoding.
    pub param_c: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: DepthParams = DepthParams {
        near: 1.0,
        far: 1000.0,
        param_c: 1.0,
    };

    fn approx(a: f32, b: f32, tol: f32) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for e in DepthEncoding::ALL {
            assert_eq!(e.name().parse::<DepthEncoding>(), Ok(e));
        }
        assert_eq!(
            "reverse-z".parse::<DepthEncoding>(),
            Err(ConfigError::UnknownEncoding("reverse-z".into()))
        );
    }

    #[test]
    fn every_encoding_maps_near_to_zero_and_far_to_one() {
        for e in [DepthEncoding::Perspective, DepthEncoding::LogDepthViaClipZ] {
            assert!(approx(e.window_depth(PARAMS.near, &PARAMS), 0.0, 1e-6), "{e}");
            assert!(approx(e.window_depth(PARAMS.far, &PARAMS), 1.0, 1e-6), "{e}");
        }
        let cf = DepthEncoding::LogDepthViaFragmentDepth;
        assert!(approx(cf.window_depth(PARAMS.far, &PARAMS), 1.0, 1e-6));
        assert!(cf.window_depth(PARAMS.near, &PARAMS) > 0.0);
    }

    #[test]
    fn window_depth_is_increasing_with_distance() {
        for e in DepthEncoding::ALL {
            let mut prev = e.window_depth(1.5, &PARAMS);
            for d in [3.0_f32, 10.0, 40.0, 200.0, 900.0] {
                let next = e.window_depth(d, &PARAMS);
                assert!(next > prev, "{e} not increasing at {d}");
                prev = next;
            }
        }
    }

    #[test]
    fn perspective_spends_most_precision_near_the_camera() {
        let p = DepthEncoding::Perspective;
        // Half of the depth range is used up by distance 2 when near = 1.
        assert!(p.window_depth(2.0, &PARAMS) > 0.49);
        let l = DepthEncoding::LogDepthViaClipZ;
        assert!(l.window_depth(2.0, &PARAMS) < 0.11);
    }

    #[test]
    fn serde_uses_cli_names() {
        let json = serde_json::to_string(&DepthEncoding::LogDepthViaFragmentDepth).ok();
        assert_eq!(json.as_deref(), Some("\"logcf\""));
    }
}
