// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! CPU-side probe geometry: the one-pixel frustum and the two probe quads.

use std::f32::consts::PI;

use depth_probe_core::{DepthParams, PLANE_A_COLOR, PLANE_B_COLOR};
use glam::{Mat4, Vec4};

/// Vertical field of view of the notional full-size viewport.
const FULL_FOV_Y: f32 = 0.22 * PI;
/// The probe pixel is one of this many rows of the full viewport.
const FULL_VIEWPORT_ROWS: f32 = 1024.0;

/// Vertices per probe quad (two triangles).
pub const QUAD_VERTICES: u32 = 6;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position_vcs: [f32; 4],
    pub color: [f32; 4],
}

/// Uniform block shared by all three shader modules.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Globals {
    pub proj: [[f32; 4]; 4],
    pub log_near: f32,
    pub log_far: f32,
    pub param_c: f32,
    pub log_cf_plus_1_inv: f32,
}

/// Half-height of the full viewport at the near plane.
fn top(near: f32) -> f32 {
    (FULL_FOV_Y * 0.5).atan() * near
}

/// OpenGL-convention projection whose near-plane window is one pixel of the
/// full viewport wide.
pub fn one_pixel_projection(near: f32, far: f32) -> Mat4 {
    let edge_one_pixel = 2.0 * top(near) / FULL_VIEWPORT_ROWS;
    let fov_y = 2.0 * (0.5 * edge_one_pixel / near).atan();
    Mat4::perspective_rh_gl(fov_y, 1.0, near, far)
}

impl Globals {
    pub fn new(params: &DepthParams) -> Self {
        Self {
            proj: one_pixel_projection(params.near, params.far).to_cols_array_2d(),
            log_near: params.near.ln(),
            log_far: params.far.ln(),
            param_c: params.param_c,
            log_cf_plus_1_inv: 1.0 / (params.param_c * params.far + 1.0).ln(),
        }
    }
}

fn rgba(color: [u8; 4]) -> [f32; 4] {
    color.map(|c| f32::from(c) / 255.0)
}

fn quad(distance: f32, half_edge: f32, color: [f32; 4]) -> [Vertex; QUAD_VERTICES as usize] {
    let z = -distance;
    let corner = |x: f32, y: f32| Vertex {
        position_vcs: Vec4::new(x * half_edge, y * half_edge, z, 1.0).to_array(),
        color,
    };
    let (bl, br, tl, tr) = (
        corner(-1.0, -1.0),
        corner(1.0, -1.0),
        corner(-1.0, 1.0),
        corner(1.0, 1.0),
    );
    [bl, br, tl, br, tr, tl]
}

/// Plane A (red) followed by plane B (green), both large enough to cover the
/// pixel at the farther of the two distances.
pub fn probe_quads(near: f32, depth_a: f32, depth_b: f32) -> [Vertex; 2 * QUAD_VERTICES as usize] {
    let half_edge = (top(near) / near) * depth_a.max(depth_b);
    let a = quad(depth_a, half_edge, rgba(PLANE_A_COLOR));
    let b = quad(depth_b, half_edge, rgba(PLANE_B_COLOR));
    let mut out = [a[0]; 2 * QUAD_VERTICES as usize];
    out[..QUAD_VERTICES as usize].copy_from_slice(&a);
    out[QUAD_VERTICES as usize..].copy_from_slice(&b);
    out
}
