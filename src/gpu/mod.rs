//! wgpu implementation of [`RenderBackend`].
//!
//! The host owns the surface (or any other color target) and hands the
//! backend a [`GpuTarget`] each frame. The backend owns the pipeline, the wind
//! texture, the particle vertex buffer and a depth buffer sized to the target.

mod context;

use wgpu::util::DeviceExt;

pub use context::GpuContext;

use crate::backend::RenderBackend;
use crate::config::RendererConfig;
use crate::encode::EncodedTexture;
use crate::error::{GpuError, RenderError};
use crate::particles::ParticleSet;
use crate::shader::{generate_render_shader, FrameUniforms};
use crate::state::RenderState;

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Source-over on every channel, alpha included, so the target's alpha
/// matches [`blend_over`](crate::shading::blend_over).
pub(crate) const POINT_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: POINT_BLEND_COMPONENT,
    alpha: POINT_BLEND_COMPONENT,
};

const POINT_BLEND_COMPONENT: wgpu::BlendComponent = wgpu::BlendComponent {
    src_factor: wgpu::BlendFactor::SrcAlpha,
    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
    operation: wgpu::BlendOperation::Add,
};

/// Bytes per particle in the vertex buffer.
const PARTICLE_STRIDE: wgpu::BufferAddress = 8;

/// Color target for one frame.
pub struct GpuTarget<'a> {
    pub view: &'a wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

struct WindTextureGpu {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

struct ParticleBufferGpu {
    buffer: wgpu::Buffer,
    capacity: u32,
}

struct DepthTarget {
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    wind: Option<WindTextureGpu>,
    particles: Option<ParticleBufferGpu>,
    depth: Option<DepthTarget>,
    clear_color: wgpu::Color,
}

impl WgpuBackend {
    /// Compile the shell pipeline for targets of `color_format`.
    ///
    /// Shader compilation and pipeline creation run inside a validation
    /// error scope; any error there is returned as
    /// [`GpuError::ShaderCompilation`].
    pub async fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        color_format: wgpu::TextureFormat,
        config: &RendererConfig,
    ) -> Result<Self, GpuError> {
        let shader_src = generate_render_shader(config);

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Wind Shell Shader"),
            source: wgpu::ShaderSource::Wgsl(shader_src.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Wind Shell Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Wind Shell Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Wind Shell Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: PARTICLE_STRIDE,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &[wgpu::VertexAttribute {
                        offset: 0,
                        shader_location: 0,
                        format: wgpu::VertexFormat::Float32x2, // uv
                    }],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(POINT_BLEND),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
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

        if let Some(err) = device.pop_error_scope().await {
            tracing::error!(%err, "wind shell pipeline failed to compile");
            return Err(GpuError::ShaderCompilation(err.to_string()));
        }

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Wind Shell Uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Wind Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let [r, g, b, a] = config.clear_color;

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
            uniform_buffer,
            sampler,
            wind: None,
            particles: None,
            depth: None,
            clear_color: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            },
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn create_wind_texture(&self, width: u32, height: u32) -> WindTextureGpu {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Wind Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Wind Shell Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        WindTextureGpu {
            texture,
            bind_group,
            width,
            height,
        }
    }

    /// Recreate the depth buffer when the target size changes.
    fn ensure_depth(&mut self, width: u32, height: u32) {
        let stale = self
            .depth
            .as_ref()
            .map_or(true, |d| d.width != width || d.height != height);
        if stale {
            self.depth = Some(DepthTarget {
                view: create_depth_texture(&self.device, width, height),
                width,
                height,
            });
        }
    }
}

impl RenderBackend for WgpuBackend {
    type Target<'a> = GpuTarget<'a>;

    fn upload_wind(&mut self, texture: &EncodedTexture) -> Result<(), RenderError> {
        let (width, height) = (texture.width(), texture.height());
        let max = self.device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            return Err(GpuError::TextureTooLarge { width, height, max }.into());
        }

        // Same-size updates reuse the texture; write_texture lands before the
        // next submit, so no frame sees a partial upload.
        let reuse = self
            .wind
            .as_ref()
            .is_some_and(|w| w.width == width && w.height == height);
        if !reuse {
            tracing::debug!(width, height, "creating wind texture");
            self.wind = Some(self.create_wind_texture(width, height));
        }
        if let Some(wind) = &self.wind {
            self.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &wind.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                texture.data(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(width * 4),
                    rows_per_image: Some(height),
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
        }
        Ok(())
    }

    fn upload_particles(&mut self, particles: &ParticleSet) -> Result<(), RenderError> {
        let count = u32::try_from(particles.len()).unwrap_or(u32::MAX);
        if count == 0 {
            self.particles = None;
            return Ok(());
        }

        match &self.particles {
            Some(existing) if existing.capacity >= count => {
                self.queue
                    .write_buffer(&existing.buffer, 0, particles.as_bytes());
            }
            _ => {
                tracing::debug!(count, "creating particle buffer");
                let buffer = self
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Particle Buffer"),
                        contents: particles.as_bytes(),
                        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    });
                self.particles = Some(ParticleBufferGpu {
                    buffer,
                    capacity: count,
                });
            }
        }
        Ok(())
    }

    fn draw(
        &mut self,
        target: GpuTarget<'_>,
        state: &RenderState,
        particle_count: u32,
    ) -> Result<(), RenderError> {
        let uniforms = FrameUniforms {
            time: state.elapsed() as f32,
            rotation: state.shader_rotation(),
            viewport: [target.width as f32, target.height as f32],
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        self.ensure_depth(target.width.max(1), target.height.max(1));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Wind Shell Encoder"),
            });

        {
            let depth_view = self.depth.as_ref().map(|d| &d.view);
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Wind Shell Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: depth_view.map(|view| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let (Some(wind), Some(particles)) = (&self.wind, &self.particles) {
                let instances = particle_count.min(particles.capacity);
                if instances > 0 {
                    render_pass.set_pipeline(&self.pipeline);
                    render_pass.set_bind_group(0, &wind.bind_group, &[]);
                    render_pass.set_vertex_buffer(0, particles.buffer.slice(..));
                    render_pass.draw(0..6, 0..instances);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
