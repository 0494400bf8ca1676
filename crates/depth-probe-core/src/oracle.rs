// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Oracle port: the rasterize-and-read-back comparison the search is built on.

use thiserror::Error;

use crate::encoding::{DepthEncoding, DepthParams};

/// RGBA8 tint of plane A (pure red).
pub const PLANE_A_COLOR: [u8; 4] = [255, 0, 0, 255];
/// RGBA8 tint of plane B (pure green).
pub const PLANE_B_COLOR: [u8; 4] = [0, 255, 0, 255];

/// Error raised when an oracle cannot produce an answer at all.
///
/// An ambiguous pixel is *not* an error; it comes back as a [`Visibility`]
/// with both flags cleared or both set.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Reading the probe pixel back from the render target failed.
    #[error("probe pixel read-back failed: {0}")]
    Readback(String),
    /// The rendering backend became unusable (device lost, out of memory).
    #[error("rendering backend failure: {0}")]
    Backend(String),
}

/// Which plane's colour survived the depth test at the probe pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Visibility {
    /// Plane A (first drawn, red) owns the pixel.
    pub a_visible: bool,
    /// Plane B (second drawn, green) owns the pixel.
    pub b_visible: bool,
}

impl Visibility {
    /// Decode a read-back pixel. Only exact primaries count; anything blended
    /// or cleared decodes as neither plane.
    pub fn from_rgba8(pixel: [u8; 4]) -> Self {
        let [r, g, _, _] = pixel;
        Self {
            a_visible: r == 255 && g == 0,
            b_visible: g == 255 && r == 0,
        }
    }

    /// Plane A alone is visible.
    pub const fn only_a(self) -> bool {
        self.a_visible && !self.b_visible
    }

    /// Plane B alone is visible.
    pub const fn only_b(self) -> bool {
        self.b_visible && !self.a_visible
    }

    /// Neither or both planes were detected.
    pub const fn is_inconclusive(self) -> bool {
        self.a_visible == self.b_visible
    }
}

/// Depth-test oracle for one encoding.
///
/// Implementations own their rendering resources and mutate them on every
/// call, hence `&mut self`: one oracle, one caller at a time.
pub trait DepthOracle {
    /// Encoding this oracle was built for.
    fn encoding(&self) -> DepthEncoding;

    /// Draw plane A at `depth_a` then plane B at `depth_b` (positive view
    /// distances) and report which one the depth test kept.
    fn test(
        &mut self,
        params: &DepthParams,
        depth_a: f32,
        depth_b: f32,
    ) -> Result<Visibility, OracleError>;
}

impl<O: DepthOracle + ?Sized> DepthOracle for &mut O {
    fn encoding(&self) -> DepthEncoding {
        (**self).encoding()
    }

    fn test(
        &mut self,
        params: &DepthParams,
        depth_a: f32,
        depth_b: f32,
    ) -> Result<Visibility, OracleError> {
        (**self).test(params, depth_a, depth_b)
    }
}

impl<O: DepthOracle + ?Sized> DepthOracle for Box<O> {
    fn encoding(&self) -> DepthEncoding {
        (**self).encoding()
    }

    fn test(
        &mut self,
        params: &DepthParams,
        depth_a: f32,
        depth_b: f32,
    ) -> Result<Visibility, OracleError> {
        (**self).test(params, depth_a, depth_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_exact_primaries_only() {
        assert!(Visibility::from_rgba8(PLANE_A_COLOR).only_a());
        assert!(Visibility::from_rgba8(PLANE_B_COLOR).only_b());
        assert!(Visibility::from_rgba8([0, 0, 0, 0]).is_inconclusive());
        assert!(Visibility::from_rgba8([255, 255, 0, 255]).is_inconclusive());
        assert!(Visibility::from_rgba8([254, 0, 0, 255]).is_inconclusive());
    }
}
