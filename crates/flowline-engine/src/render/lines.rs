use anyhow::{Context, Result};

use crate::coords::Affine2;
use crate::geometry::{custom_attributes_size, CustomAttribute, LineBatch};
use crate::shader::ShaderBuilder;
use crate::tessellate::JobId;
use crate::worker::{GpuContextGuard, LineBufferChannel, WorkerConfig};

use super::common::{
    frame_ubo_size, premul_alpha_blend, uniform_padded_size, vertex_format, FrameUniforms,
};
use super::upload::{BufferUsage, LineBufferSlot};
use super::{RenderCtx, RenderTarget};

/// Renderer setup.
#[derive(Debug, Clone)]
pub struct FlowLineConfig {
    pub usage: BufferUsage,
    /// Floats per encoded vertex: `x, y` plus per-vertex extras.
    pub instruction_stride: usize,
    pub worker: WorkerConfig,
    /// Renders hit colors into an id target; blending is disabled.
    pub hit_detection: bool,
}

impl Default for FlowLineConfig {
    fn default() -> Self {
        Self {
            usage: BufferUsage::Static,
            instruction_stride: 3, // x, y, time offset
            worker: WorkerConfig::default(),
            hit_detection: false,
        }
    }
}

/// Per-frame state written to the frame uniform.
#[derive(Debug, Copy, Clone)]
pub struct FrameParams {
    /// World → clip for the current view.
    pub world_to_clip: Affine2,
    /// Seconds, usually `FrameTime::elapsed`.
    pub time: f32,
    /// World units per logical pixel.
    pub resolution: f32,
    pub global_alpha: f32,
    pub depth: f32,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            world_to_clip: Affine2::IDENTITY,
            time: 0.0,
            resolution: 1.0,
            global_alpha: 1.0,
            depth: 0.0,
        }
    }
}

/// Wide line renderer fed by the background tessellator.
///
/// Frame flow:
/// - `request_buffers` whenever the line geometry or its transform changes
/// - `prepare` once per frame to pick up finished tessellations
/// - `render` to draw the most recent buffers
pub struct FlowLineRenderer {
    config: FlowLineConfig,
    shader: ShaderBuilder,
    channel: LineBufferChannel,
    slot: LineBufferSlot<wgpu::Buffer>,
    context: Option<GpuContextGuard>,
    user_uniforms: Vec<u8>,

    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    frame_ubo: Option<wgpu::Buffer>,
    user_ubo: Option<wgpu::Buffer>,

    warned_no_stroke: bool,
    warned_missing_uniforms: bool,
}

impl FlowLineRenderer {
    /// Spawns the tessellation worker. GPU resources are created lazily on
    /// the first `render`.
    pub fn new(config: FlowLineConfig, shader: ShaderBuilder) -> Result<Self> {
        let layout_stride = shader.layout().extra_count() + 2;
        anyhow::ensure!(
            layout_stride == config.instruction_stride,
            "shader layout expects instruction stride {layout_stride}, config has {}",
            config.instruction_stride
        );

        let context = GpuContextGuard::new();
        let channel = LineBufferChannel::new(&config.worker, context.handle())
            .context("failed to spawn tessellation worker")?;

        Ok(Self {
            slot: LineBufferSlot::new(config.usage),
            config,
            shader,
            channel,
            context: Some(context),
            user_uniforms: Vec::new(),
            pipeline_format: None,
            pipeline: None,
            bind_group_layout: None,
            bind_group: None,
            frame_ubo: None,
            user_ubo: None,
            warned_no_stroke: false,
            warned_missing_uniforms: false,
        })
    }

    /// Encodes `batch` with `transform` (world → local) and queues it for
    /// tessellation. Supersedes any request still in flight.
    pub fn request_buffers<F>(
        &mut self,
        batch: &LineBatch<F>,
        attributes: &[CustomAttribute<F>],
        transform: &Affine2,
    ) -> Result<JobId> {
        anyhow::ensure!(self.context.is_some(), "flow line renderer has been disposed");
        anyhow::ensure!(
            batch.stride() == self.config.instruction_stride,
            "batch stride {} does not match renderer stride {}",
            batch.stride(),
            self.config.instruction_stride
        );
        let custom = custom_attributes_size(attributes);
        anyhow::ensure!(
            custom == self.shader.layout().custom_size(),
            "custom attributes carry {custom} floats, shader layout expects {}",
            self.shader.layout().custom_size()
        );

        self.slot
            .request(&mut self.channel, batch, attributes, transform)
            .context("failed to submit line buffers")
    }

    /// Contents of the `u_user` uniform block, laid out to match the
    /// declarations given to the shader builder.
    pub fn set_user_uniforms(&mut self, bytes: &[u8]) {
        self.user_uniforms.clear();
        self.user_uniforms.extend_from_slice(bytes);
    }

    /// Routes finished jobs and uploads the newest buffers.
    ///
    /// Returns whether new buffers became current.
    pub fn prepare(&mut self, ctx: &RenderCtx<'_>) -> bool {
        if self.context.is_none() {
            return false;
        }
        self.channel.pump();
        self.slot.refresh(ctx)
    }

    /// Draws the current buffers into `target`. Does nothing until a
    /// tessellation has been uploaded.
    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, frame: &FrameParams) {
        if self.context.is_none() {
            return;
        }
        if !self.shader.has_stroke() {
            if !self.warned_no_stroke {
                log::debug!("FlowLineRenderer: shader has no stroke; nothing to draw");
                self.warned_no_stroke = true;
            }
            return;
        }
        if self.shader.has_user_uniforms() && self.user_uniforms.is_empty() {
            if !self.warned_missing_uniforms {
                log::warn!("FlowLineRenderer: shader declares user uniforms but none were set");
                self.warned_missing_uniforms = true;
            }
            return;
        }

        self.ensure_pipeline(ctx);
        self.ensure_bindings(ctx);

        let Some(lines) = self.slot.current() else { return };
        if lines.index_count == 0 {
            return;
        }

        let uniforms = FrameUniforms {
            projection: frame.world_to_clip.then_after(&lines.inverse_transform).to_mat4(),
            viewport_size_px: ctx.viewport.size_px(),
            pixel_ratio: ctx.scale_factor.max(f32::EPSILON),
            time: frame.time,
            resolution: frame.resolution,
            global_alpha: frame.global_alpha,
            hit_detection: if self.config.hit_detection { 1.0 } else { 0.0 },
            depth: frame.depth,
        };

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };
        let Some(frame_ubo) = self.frame_ubo.as_ref() else { return };

        ctx.queue.write_buffer(frame_ubo, 0, bytemuck::bytes_of(&uniforms));
        if let Some(user_ubo) = self.user_ubo.as_ref() {
            let mut padded = self.user_uniforms.clone();
            padded.resize(user_ubo.size() as usize, 0);
            ctx.queue.write_buffer(user_ubo, 0, &padded);
        }

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("flowline stroke pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, lines.vertices.slice(..));
        rpass.set_index_buffer(lines.indices.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..lines.index_count, 0, 0..1);
    }

    /// Releases GPU resources. Responses still in flight are discarded when
    /// they arrive; further requests are rejected.
    pub fn dispose(&mut self) {
        if let Some(context) = self.context.take() {
            context.dispose();
        }
        self.slot.clear(&mut self.channel);

        self.pipeline_format = None;
        self.pipeline = None;
        self.bind_group_layout = None;
        self.bind_group = None;
        self.frame_ubo = None;
        self.user_ubo = None;
        log::debug!("FlowLineRenderer: disposed");
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.context.is_none()
    }

    #[inline]
    pub fn shader(&self) -> &ShaderBuilder {
        &self.shader
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let Some(vertex_src) = self.shader.stroke_vertex_shader() else { return };
        let Some(fragment_src) = self.shader.stroke_fragment_shader() else { return };

        let vertex_module = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("flowline stroke vertex shader"),
            source: wgpu::ShaderSource::Wgsl(vertex_src.into()),
        });
        let fragment_module = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("flowline stroke fragment shader"),
            source: wgpu::ShaderSource::Wgsl(fragment_src.into()),
        });

        let stages = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;
        let mut entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: stages,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(frame_ubo_size()),
            },
            count: None,
        }];
        if self.shader.has_user_uniforms() {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: stages,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            });
        }

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("flowline stroke bgl"),
                    entries: &entries,
                });

        let pipeline_layout =
            ctx.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("flowline stroke pipeline layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    immediate_size: 0,
                });

        let layout = self.shader.layout();
        let attributes: Vec<wgpu::VertexAttribute> = layout
            .inputs()
            .iter()
            .enumerate()
            .map(|(location, input)| wgpu::VertexAttribute {
                format: vertex_format(input.components),
                offset: (input.offset * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
                shader_location: location as u32,
            })
            .collect();
        let vertex_buffers = [wgpu::VertexBufferLayout {
            array_stride: layout.stride_bytes(),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &attributes,
        }];

        // Hit colors must land unmodified.
        let blend = if self.config.hit_detection { None } else { Some(premul_alpha_blend()) };

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("flowline stroke pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &vertex_buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
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

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);

        self.bind_group = None;
        self.frame_ubo = None;
        self.user_ubo = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        let user_size = self
            .shader
            .has_user_uniforms()
            .then(|| uniform_padded_size(self.user_uniforms.len()));
        let user_ubo_current = self.user_ubo.as_ref().map(wgpu::Buffer::size) == user_size;
        if self.bind_group.is_some() && self.frame_ubo.is_some() && user_ubo_current {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        let frame_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("flowline frame ubo"),
            size: frame_ubo_size(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let user_ubo = user_size.map(|size| {
            ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("flowline user ubo"),
                size,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: frame_ubo.as_entire_binding(),
        }];
        if let Some(user_ubo) = user_ubo.as_ref() {
            entries.push(wgpu::BindGroupEntry {
                binding: 1,
                resource: user_ubo.as_entire_binding(),
            });
        }

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("flowline stroke bind group"),
            layout: bgl,
            entries: &entries,
        });

        self.frame_ubo = Some(frame_ubo);
        self.user_ubo = user_ubo;
        self.bind_group = Some(bind_group);
    }
}
