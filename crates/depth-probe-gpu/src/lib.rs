// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! depth-probe-gpu: the depth oracle on real hardware via wgpu.
//!
//! [`GpuOracle`] owns its device, pipeline and 1×1 render target. It is built
//! for one [`DepthEncoding`](depth_probe_core::DepthEncoding) and answers
//! [`DepthOracle::test`](depth_probe_core::DepthOracle::test) by rendering and
//! reading back a single pixel, blocking until the read-back completes.
#![forbid(unsafe_code)]

mod oracle;
mod scene;

use thiserror::Error;

pub use oracle::{AdapterSummary, GpuOracle};

/// Failures while setting up the GPU oracle. All are fatal for a run.
#[derive(Debug, Error)]
pub enum GpuError {
    /// No adapter matched the request.
    #[error("no suitable graphics adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    /// The adapter refused to create a device.
    #[error("device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    /// Shader or pipeline creation raised a validation error.
    #[error("probe pipeline rejected: {0}")]
    Pipeline(String),
}
