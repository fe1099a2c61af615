use anyhow::Result;
use winit::window::WindowId;

use gyre_engine::core::{App, AppControl, FrameCtx};
use gyre_engine::device::GpuInit;
use gyre_engine::logging::{LoggingConfig, init_logging};
use gyre_engine::render::ClockFaceRenderer;
use gyre_engine::render::spiral::{SpiralRenderer, geometry};
use gyre_engine::time::DayClock;
use gyre_engine::window::{Runtime, RuntimeConfig};

mod config;

use config::StudioConfig;

const CLEAR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.03,
    a: 1.0,
};

/// Drives one spiral renderer per GPU context.
struct SpiralFace {
    clock: DayClock,
    renderer: Option<SpiralRenderer>,
}

impl SpiralFace {
    fn new(clock: DayClock) -> Self {
        Self {
            clock,
            renderer: None,
        }
    }
}

impl App for SpiralFace {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let current = ctx.gpu.context().id();
        if self.renderer.as_ref().map(|r| r.context_id()) != Some(current) {
            // Objects from a previous context are not ours to release anymore.
            self.renderer = None;
            let adapter = ctx.gpu.adapter_info();
            let size = ctx.gpu.size();
            log::info!(
                "{current}: {} ({:?}), surface {}x{}",
                adapter.name,
                adapter.backend,
                size.width,
                size.height,
            );
            match SpiralRenderer::new(&ctx.render_ctx()) {
                Ok(r) => self.renderer = Some(r),
                Err(e) => {
                    log::error!("failed to create spiral renderer: {e:#}");
                    return AppControl::Exit;
                }
            }
        }
        let Some(renderer) = self.renderer.as_ref() else {
            return AppControl::Exit;
        };

        let now = self.clock.seconds_of_day();
        let offset = geometry::offset_for_time(now);

        if ctx.time.frame_index % 600 == 0 {
            log::debug!("frame {}: t={now:.0}s offset={offset:.3}", ctx.time.frame_index);
        }

        ctx.render(CLEAR, |rctx, target| {
            let (sx, sy) = rctx.viewport.fit_unit_circle();

            renderer.set_offset(rctx.queue, offset);
            renderer.set_transform(rctx.queue, [sx, 0.0, 0.0, sy]);
            renderer.encode(target, 1);
        })
    }

    fn on_context_teardown(&mut self, window_id: WindowId) {
        if let Some(renderer) = self.renderer.take() {
            let teardown = renderer.destroy();
            log::info!("window {window_id:?} closing: {teardown:?}");
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = StudioConfig::from_env();
    let clock = match config.start_seconds {
        Some(start) => DayClock::starting_at(start, config.time_scale),
        None if config.time_scale == 1.0 => DayClock::wall(),
        None => DayClock::starting_at(DayClock::wall().seconds_of_day(), config.time_scale),
    };
    log::info!("starting {:?} (time scale {})", config.title, clock.time_scale());

    Runtime::run(
        RuntimeConfig {
            title: config.title,
            ..Default::default()
        },
        GpuInit::default(),
        SpiralFace::new(clock),
    )
}
