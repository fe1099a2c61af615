use anyhow::{Context, Result};
use wgpu::util::DeviceExt;

use crate::device::{ContextHandle, ContextId};
use crate::render::{ClockFaceRenderer, DrawCall, PassEncoder, RenderCtx, RenderTarget};

use super::geometry::{Point, SECONDS_PER_DAY, build_spiral};
use super::mapped::ScopedWrite;

/// Fixed WGSL source of the spiral program.
pub const SPIRAL_WGSL: &str = include_str!("shaders/spiral.wgsl");

const VS_ENTRY: &str = "vs_main";
const FS_ENTRY: &str = "fs_main";

const IDENTITY: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

/// Outcome of releasing a [`SpiralRenderer`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Teardown {
    /// The context was current; all buffers were explicitly destroyed.
    Released { buffers: usize },
    /// The context was already gone; no release calls were issued.
    ContextLost,
}

/// Renderer for the 24-hour spiral.
///
/// GPU objects:
/// - program: WGSL module + render pipeline (triangle strip, no blending)
/// - static table: 86400 [`Point`]s, uploaded once (`VERTEX`)
/// - offset: one `f32`, stepped per instance, rewritten every frame
/// - transform: `vec4<f32>` uniform (2x2 column-major), rewritten every frame
///
/// All objects belong to the context captured at construction. They are released
/// explicitly by [`destroy`](Self::destroy) or on drop, but only while that context
/// is still current.
pub struct SpiralRenderer {
    context: ContextHandle,
    released: bool,

    _shader: wgpu::ShaderModule,
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,

    instance_vbo: wgpu::Buffer,
    transform_ubo: wgpu::Buffer,
    offset_vbo: wgpu::Buffer,
}

impl SpiralRenderer {
    /// Creates the renderer with the built-in shader.
    pub fn new(ctx: &RenderCtx<'_>) -> Result<Self> {
        Self::with_shader_source(ctx, SPIRAL_WGSL)
    }

    /// Creates the renderer from custom WGSL.
    ///
    /// The source must expose `vs_main`/`fs_main` with the spiral's vertex interface.
    /// Invalid source fails before any GPU object is created.
    pub fn with_shader_source(ctx: &RenderCtx<'_>, source: &str) -> Result<Self> {
        validate_shader(source)?;

        let device = ctx.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("gyre spiral shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("gyre spiral bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of_val(&IDENTITY) as u64),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("gyre spiral pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("gyre spiral pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(VS_ENTRY),
                compilation_options: Default::default(),
                buffers: &[Point::layout(), offset_layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(FS_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
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

        // COPY_SRC on every buffer allows read-back for diagnostics.
        let spiral = build_spiral();
        let instance_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("gyre spiral table vbo"),
            contents: bytemuck::cast_slice(&spiral),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_SRC,
        });

        let offset_vbo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("gyre spiral offset vbo"),
            size: std::mem::size_of::<f32>() as u64,
            usage: wgpu::BufferUsages::VERTEX
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let transform_ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("gyre spiral transform ubo"),
            contents: bytemuck::cast_slice(&IDENTITY),
            usage: wgpu::BufferUsages::UNIFORM
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("gyre spiral bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transform_ubo.as_entire_binding(),
            }],
        });

        log::debug!(
            "{}: spiral renderer ready ({} samples, {:?})",
            ctx.context.id(),
            spiral.len(),
            ctx.surface_format,
        );

        Ok(Self {
            context: ctx.context.clone(),
            released: false,
            _shader: shader,
            pipeline,
            bind_group,
            instance_vbo,
            transform_ubo,
            offset_vbo,
        })
    }

    /// Context the renderer's objects belong to.
    pub fn context_id(&self) -> ContextId {
        self.context.id()
    }

    /// Begins a load/store pass on `target` and draws the spiral into it.
    pub fn encode(&self, target: &mut RenderTarget<'_>, num_instances: u32) -> DrawCall {
        let mut rpass = target.begin_load_pass("gyre spiral pass");
        self.draw(&mut rpass, num_instances)
    }

    /// Releases all GPU objects now and reports what happened.
    pub fn destroy(mut self) -> Teardown {
        self.release()
    }

    fn release(&mut self) -> Teardown {
        self.released = true;

        if !self.context.is_current() {
            log::debug!("{}: context gone, skipping spiral release", self.context.id());
            return Teardown::ContextLost;
        }

        // Pipeline, bind group and shader module have no explicit destroy in wgpu;
        // they are freed when `self` is dropped.
        self.instance_vbo.destroy();
        self.transform_ubo.destroy();
        self.offset_vbo.destroy();

        log::debug!("{}: spiral renderer released", self.context.id());
        Teardown::Released { buffers: 3 }
    }
}

impl ClockFaceRenderer for SpiralRenderer {
    fn map_offset<'a>(&'a self, queue: &'a wgpu::Queue) -> ScopedWrite<'a, 1> {
        ScopedWrite::new(queue, &self.offset_vbo)
    }

    fn map_transform<'a>(&'a self, queue: &'a wgpu::Queue) -> ScopedWrite<'a, 4> {
        ScopedWrite::new(queue, &self.transform_ubo)
    }

    /// Draws the whole table as one triangle strip.
    ///
    /// `num_instances` is accepted for interface compatibility but a single instance
    /// is always submitted: the offset buffer holds exactly one instance's data.
    fn draw(&self, pass: &mut dyn PassEncoder, num_instances: u32) -> DrawCall {
        if num_instances != 1 {
            log::trace!("spiral draw: ignoring num_instances={num_instances}");
        }

        let call = DrawCall {
            vertices: 0..SECONDS_PER_DAY,
            instances: 0..1,
        };

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group);
        pass.set_vertex_buffer(0, &self.instance_vbo);
        pass.set_vertex_buffer(1, &self.offset_vbo);
        pass.draw(call.vertices.clone(), call.instances.clone());

        call
    }
}

impl Drop for SpiralRenderer {
    fn drop(&mut self) {
        if !self.released {
            self.release();
        }
    }
}

/// Parses and validates WGSL, and checks the spiral entry points exist.
pub fn validate_shader(source: &str) -> Result<()> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| anyhow::anyhow!(e.emit_to_string(source)))
        .context("spiral shader failed to parse")?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|e| anyhow::Error::new(e.into_inner()))
    .context("spiral shader failed validation")?;

    for (name, stage) in [
        (VS_ENTRY, naga::ShaderStage::Vertex),
        (FS_ENTRY, naga::ShaderStage::Fragment),
    ] {
        anyhow::ensure!(
            module
                .entry_points
                .iter()
                .any(|ep| ep.name == name && ep.stage == stage),
            "spiral shader has no {stage:?} entry point `{name}`",
        );
    }

    Ok(())
}

// ── vertex layouts ────────────────────────────────────────────────────────

impl Point {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32, // radius
        1 => Float32, // angle
        2 => Float32  // index
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Point>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

const OFFSET_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![3 => Float32];

/// Offset advances once per instance, not per vertex.
fn offset_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<f32>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &OFFSET_ATTRS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Viewport;
    use crate::device::HeadlessGpu;
    use crate::render::{PassCmd, RecordingPass};

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    fn gpu() -> Option<HeadlessGpu> {
        match HeadlessGpu::new_blocking() {
            Ok(gpu) => Some(gpu),
            Err(e) => {
                eprintln!("skipping GPU test: {e:#}");
                None
            }
        }
    }

    fn ctx(gpu: &HeadlessGpu) -> RenderCtx<'_> {
        RenderCtx::new(
            gpu.device(),
            gpu.queue(),
            FORMAT,
            Viewport::new(64.0, 64.0),
            gpu.context(),
        )
    }

    fn read_f32s(gpu: &HeadlessGpu, buffer: &wgpu::Buffer) -> Vec<f32> {
        let bytes = gpu.read_buffer(buffer, buffer.size()).unwrap();
        bytemuck::pod_collect_to_vec(&bytes)
    }

    /// Runs `f` inside a validation error scope and returns what it caught.
    fn validation_error(gpu: &HeadlessGpu, f: impl FnOnce()) -> Option<wgpu::Error> {
        let scope = gpu.device().push_error_scope(wgpu::ErrorFilter::Validation);
        f();
        pollster::block_on(scope.pop())
    }

    /// Writes to and copies out of each buffer. Fails validation for destroyed ones.
    fn touch_buffers(gpu: &HeadlessGpu, buffers: &[wgpu::Buffer]) {
        let scratch_size = buffers.iter().map(|b| b.size()).max().unwrap_or(4);
        let scratch = gpu.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("scratch"),
            size: scratch_size,
            usage: wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        for buffer in buffers {
            if buffer.usage().contains(wgpu::BufferUsages::COPY_DST) {
                gpu.queue().write_buffer(buffer, 0, &[0; 4]);
            }
            encoder.copy_buffer_to_buffer(buffer, 0, &scratch, 0, buffer.size());
        }
        gpu.queue().submit(std::iter::once(encoder.finish()));
    }

    fn renderer_buffers(renderer: &SpiralRenderer) -> Vec<wgpu::Buffer> {
        vec![
            renderer.instance_vbo.clone(),
            renderer.transform_ubo.clone(),
            renderer.offset_vbo.clone(),
        ]
    }

    // ── shader ────────────────────────────────────────────────────────────

    #[test]
    fn builtin_shader_validates() {
        validate_shader(SPIRAL_WGSL).unwrap();
    }

    #[test]
    fn broken_shader_is_rejected() {
        let err = validate_shader("@vertex fn vs_main( {").unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse"));
    }

    #[test]
    fn shader_without_fragment_entry_is_rejected() {
        let src = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }";
        let err = validate_shader(src).unwrap_err();
        assert!(err.to_string().contains("fs_main"));
    }

    #[test]
    fn init_rejects_bad_shader_before_creating_gpu_objects() {
        let Some(gpu) = gpu() else { return };
        let mut result = None;
        let caught = validation_error(&gpu, || {
            result = Some(SpiralRenderer::with_shader_source(&ctx(&gpu), "not wgsl"));
        });

        assert!(result.is_some_and(|r| r.is_err()));
        // Handing the source to wgpu would have raised a shader module error.
        assert!(caught.is_none(), "unexpected device error: {caught:?}");
    }

    // ── per-frame writes ──────────────────────────────────────────────────

    #[test]
    fn offset_write_round_trips() {
        let Some(gpu) = gpu() else { return };
        let renderer = SpiralRenderer::new(&ctx(&gpu)).unwrap();

        let mut view = renderer.map_offset(gpu.queue());
        view[0] = 0.5;
        view.unmap();

        assert_eq!(read_f32s(&gpu, &renderer.offset_vbo), vec![0.5]);
    }

    #[test]
    fn transform_write_round_trips() {
        let Some(gpu) = gpu() else { return };
        let renderer = SpiralRenderer::new(&ctx(&gpu)).unwrap();

        assert_eq!(read_f32s(&gpu, &renderer.transform_ubo), IDENTITY.to_vec());

        renderer.set_transform(gpu.queue(), [0.5, -0.25, 0.25, 0.5]);
        assert_eq!(read_f32s(&gpu, &renderer.transform_ubo), vec![0.5, -0.25, 0.25, 0.5]);
    }

    #[test]
    fn mapping_discards_previous_contents() {
        let Some(gpu) = gpu() else { return };
        let renderer = SpiralRenderer::new(&ctx(&gpu)).unwrap();

        renderer.set_transform(gpu.queue(), [2.0, 2.0, 2.0, 2.0]);
        let view = renderer.map_transform(gpu.queue());
        assert_eq!(*view, [0.0; 4]);
        drop(view);

        assert_eq!(read_f32s(&gpu, &renderer.transform_ubo), vec![0.0; 4]);
    }

    // ── draw ──────────────────────────────────────────────────────────────

    #[test]
    fn frame_issues_fixed_command_sequence() {
        let Some(gpu) = gpu() else { return };
        let renderer = SpiralRenderer::new(&ctx(&gpu)).unwrap();

        renderer.set_offset(gpu.queue(), 0.5);
        renderer.set_transform(gpu.queue(), IDENTITY);

        let mut pass = RecordingPass::new();
        let call = renderer.draw(&mut pass, 1);

        assert_eq!(
            pass.commands,
            vec![
                PassCmd::SetPipeline,
                PassCmd::SetBindGroup { index: 0 },
                PassCmd::SetVertexBuffer { slot: 0, size: SECONDS_PER_DAY as u64 * 12 },
                PassCmd::SetVertexBuffer { slot: 1, size: 4 },
                PassCmd::Draw { vertices: 0..SECONDS_PER_DAY, instances: 0..1 },
            ]
        );
        assert_eq!(call.vertices, 0..86_400);
    }

    #[test]
    fn draw_always_submits_one_instance() {
        let Some(gpu) = gpu() else { return };
        let renderer = SpiralRenderer::new(&ctx(&gpu)).unwrap();

        for n in [0, 1, 7, 1_000] {
            let mut pass = RecordingPass::new();
            assert_eq!(renderer.draw(&mut pass, n).instances, 0..1);
            assert_eq!(pass.draws().count(), 1);
        }
    }

    #[test]
    fn encodes_into_offscreen_target() {
        let Some(gpu) = gpu() else { return };
        let renderer = SpiralRenderer::new(&ctx(&gpu)).unwrap();
        renderer.set_offset(gpu.queue(), 0.5);
        renderer.set_transform(gpu.queue(), IDENTITY);

        let texture = gpu.create_target(64, 64, FORMAT);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        {
            let mut target = RenderTarget::new(&mut encoder, &view);
            let call = renderer.encode(&mut target, 1);
            assert_eq!(call.instances, 0..1);
        }
        gpu.queue().submit(std::iter::once(encoder.finish()));

        let pixels = gpu.read_texture(&texture).unwrap();
        assert_eq!(pixels.len(), 64 * 64 * 4);
        // Untouched texels stay zeroed; the spiral writes opaque colour.
        let drawn = pixels.chunks_exact(4).filter(|px| px[3] == 255).count();
        assert!(drawn > 0, "spiral drew nothing");
        assert!(drawn < 64 * 64, "spiral covered the whole target");
    }

    // ── teardown ──────────────────────────────────────────────────────────

    #[test]
    fn destroy_releases_buffers_while_current() {
        let Some(gpu) = gpu() else { return };
        let renderer = SpiralRenderer::new(&ctx(&gpu)).unwrap();
        assert_eq!(renderer.context_id(), gpu.context().id());
        let buffers = renderer_buffers(&renderer);

        assert_eq!(
            validation_error(&gpu, || touch_buffers(&gpu, &buffers)).map(|e| e.to_string()),
            None
        );
        assert_eq!(renderer.destroy(), Teardown::Released { buffers: 3 });

        for buffer in &buffers {
            let caught = validation_error(&gpu, || {
                touch_buffers(&gpu, std::slice::from_ref(buffer));
            });
            assert!(caught.is_some(), "{buffer:?} still usable after destroy");
        }
    }

    #[test]
    fn destroy_skips_release_for_stale_context() {
        let Some(gpu) = gpu() else { return };
        let renderer = SpiralRenderer::new(&ctx(&gpu)).unwrap();
        let buffers = renderer_buffers(&renderer);

        gpu.invalidate();
        assert_eq!(renderer.destroy(), Teardown::ContextLost);

        let caught = validation_error(&gpu, || touch_buffers(&gpu, &buffers));
        assert!(caught.is_none(), "buffers were released: {caught:?}");
    }

    #[test]
    fn drop_releases_like_destroy() {
        let Some(gpu) = gpu() else { return };
        let renderer = SpiralRenderer::new(&ctx(&gpu)).unwrap();
        let offset = renderer.offset_vbo.clone();
        drop(renderer);

        let caught = validation_error(&gpu, || {
            touch_buffers(&gpu, std::slice::from_ref(&offset));
        });
        assert!(caught.is_some());
    }

    #[test]
    fn renderer_may_outlive_its_context() {
        let Some(gpu) = gpu() else { return };
        let renderer = SpiralRenderer::new(&ctx(&gpu)).unwrap();
        let handle = gpu.context();
        drop(gpu);
        assert!(!handle.is_current());
        drop(renderer);
    }
}
