// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! wgpu implementation of the depth oracle.

use std::sync::mpsc;

use depth_probe_core::{DepthEncoding, DepthOracle, DepthParams, OracleError, Visibility};
use tracing::{debug, info};

use crate::scene::{probe_quads, Globals, Vertex, QUAD_VERTICES};
use crate::GpuError;

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;
/// Rows of a texture-to-buffer copy must be padded to this many bytes.
const READBACK_ROW_BYTES: u32 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

/// Adapter the oracle ended up on.
#[derive(Clone, Debug)]
pub struct AdapterSummary {
    /// Adapter name as reported by the driver.
    pub name: String,
    /// Graphics API in use.
    pub backend: String,
    /// Driver name and version.
    pub driver: String,
}

/// Depth oracle rendering into a 1×1 offscreen target on the GPU.
pub struct GpuOracle {
    encoding: DepthEncoding,
    adapter: AdapterSummary,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    globals_buf: wgpu::Buffer,
    vertex_buf: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    color_tex: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    readback: wgpu::Buffer,
}

fn shader_for(device: &wgpu::Device, encoding: DepthEncoding) -> wgpu::ShaderModule {
    match encoding {
        DepthEncoding::Perspective => {
            device.create_shader_module(wgpu::include_wgsl!("shaders/perspective.wgsl"))
        }
        DepthEncoding::LogDepthViaClipZ => {
            device.create_shader_module(wgpu::include_wgsl!("shaders/log_clip_z.wgsl"))
        }
        DepthEncoding::LogDepthViaFragmentDepth => {
            device.create_shader_module(wgpu::include_wgsl!("shaders/log_frag_depth.wgsl"))
        }
    }
}

fn target(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    })
}

impl GpuOracle {
    /// Acquire an adapter and device and build the pipeline for `encoding`.
    ///
    /// Blocks on adapter/device acquisition.
    pub fn new(encoding: DepthEncoding) -> Result<Self, GpuError> {
        pollster::block_on(Self::new_async(encoding))
    }

    /// Async form of [`GpuOracle::new`].
    pub async fn new_async(encoding: DepthEncoding) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;
        let info = adapter.get_info();
        let summary = AdapterSummary {
            name: info.name.clone(),
            backend: format!("{:?}", info.backend),
            driver: format!("{} {}", info.driver, info.driver_info),
        };
        info!(
            adapter = %summary.name,
            backend = %summary.backend,
            driver = %summary.driver,
            device_type = ?info.device_type,
            "graphics adapter"
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("depth-probe-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
            })
            .await?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let globals_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let vertex_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("probe-quads"),
            size: (std::mem::size_of::<Vertex>() * 2 * QUAD_VERTICES as usize) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pixel-readback"),
            size: u64::from(READBACK_ROW_BYTES),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_bg"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buf.as_entire_binding(),
            }],
        });

        let shader = shader_for(&device, encoding);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("probe_layout"),
            bind_group_layouts: &[&globals_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("probe_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0=>Float32x4, 1=>Float32x4],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..wgpu::PrimitiveState::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let color_tex = target(
            &device,
            "probe_color",
            COLOR_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        );
        let color_view = color_tex.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = target(
            &device,
            "probe_depth",
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        )
        .create_view(&wgpu::TextureViewDescriptor::default());

        if let Some(err) = device.pop_error_scope().await {
            return Err(GpuError::Pipeline(err.to_string()));
        }
        debug!(%encoding, "probe pipeline ready");

        Ok(Self {
            encoding,
            adapter: summary,
            device,
            queue,
            pipeline,
            globals_buf,
            vertex_buf,
            bind_group,
            color_tex,
            color_view,
            depth_view,
            readback,
        })
    }

    /// Adapter this oracle renders on.
    pub fn adapter(&self) -> &AdapterSummary {
        &self.adapter
    }

    fn draw(&self, params: &DepthParams, depth_a: f32, depth_b: f32) {
        self.queue.write_buffer(
            &self.globals_buf,
            0,
            bytemuck::bytes_of(&Globals::new(params)),
        );
        self.queue.write_buffer(
            &self.vertex_buf,
            0,
            bytemuck::cast_slice(&probe_quads(params.near, depth_a, depth_b)),
        );

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("probe-encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("probe-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0),
                        store: wgpu::StoreOp::Discard,
                    }),
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &self.bind_group, &[]);
            rpass.set_vertex_buffer(0, self.vertex_buf.slice(..));
            // Plane A strictly before plane B.
            rpass.draw(0..QUAD_VERTICES, 0..1);
            rpass.draw(QUAD_VERTICES..2 * QUAD_VERTICES, 0..1);
        }
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.color_tex,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(READBACK_ROW_BYTES),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(Some(encoder.finish()));
    }

    fn read_pixel(&self) -> Result<[u8; 4], OracleError> {
        let slice = self.readback.slice(..4);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| OracleError::Backend(e.to_string()))?;
        rx.recv()
            .map_err(|e| OracleError::Readback(e.to_string()))?
            .map_err(|e| OracleError::Readback(e.to_string()))?;

        let pixel = {
            let data = slice.get_mapped_range();
            [data[0], data[1], data[2], data[3]]
        };
        self.readback.unmap();
        Ok(pixel)
    }
}

impl DepthOracle for GpuOracle {
    fn encoding(&self) -> DepthEncoding {
        self.encoding
    }

    fn test(
        &mut self,
        params: &DepthParams,
        depth_a: f32,
        depth_b: f32,
    ) -> Result<Visibility, OracleError> {
        self.draw(params, depth_a, depth_b);
        self.read_pixel().map(Visibility::from_rgba8)
    }
}
