use anyhow::{Context, Result};

use super::{ContextHandle, ContextToken, GpuInit};

/// Surfaceless GPU context for offscreen rendering and GPU-backed tests.
pub struct HeadlessGpu {
    device: wgpu::Device,
    queue: wgpu::Queue,
    context: ContextToken,
}

impl HeadlessGpu {
    pub async fn new(init: GpuInit) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: None,
                force_fallback_adapter: init.force_fallback_adapter,
            })
            .await
            .context("failed to find a GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&init.device_descriptor("gyre headless device"))
            .await
            .context("failed to create wgpu device/queue")?;

        let context = ContextToken::new();
        context.watch_device(&device);
        log::debug!("{} ready (headless): {}", context.id(), adapter.get_info().name);

        Ok(Self {
            device,
            queue,
            context,
        })
    }

    /// Blocking variant of [`new`](Self::new) with default settings.
    pub fn new_blocking() -> Result<Self> {
        pollster::block_on(Self::new(GpuInit::default()))
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn context(&self) -> ContextHandle {
        self.context.handle()
    }

    pub fn invalidate(&self) {
        self.context.invalidate();
    }

    /// Creates a single-sample color texture usable as a render target.
    pub fn create_target(
        &self,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("gyre offscreen target"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        })
    }

    /// Copies `size` bytes from the start of `buffer` back to the CPU.
    ///
    /// `buffer` must have `COPY_SRC` usage. Blocks until the copy completes.
    pub fn read_buffer(&self, buffer: &wgpu::Buffer, size: u64) -> Result<Vec<u8>> {
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("gyre readback"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("gyre readback encoder"),
            });
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        self.map_staging(&staging)
    }

    /// Reads a whole 2D texture back as tightly packed rows.
    ///
    /// `texture` must have `COPY_SRC` usage and an uncompressed color format.
    pub fn read_texture(&self, texture: &wgpu::Texture) -> Result<Vec<u8>> {
        let extent = texture.size();
        let texel = texture
            .format()
            .block_copy_size(None)
            .context("texture format has no single-aspect texel size")?;

        let row = extent.width * texel;
        let padded_row = row.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("gyre texture readback"),
            size: u64::from(padded_row) * u64::from(extent.height),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("gyre texture readback encoder"),
            });
        encoder.copy_texture_to_buffer(
            texture.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(extent.height),
                },
            },
            wgpu::Extent3d {
                depth_or_array_layers: 1,
                ..extent
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let padded = self.map_staging(&staging)?;
        Ok(padded
            .chunks_exact(padded_row as usize)
            .flat_map(|r| &r[..row as usize])
            .copied()
            .collect())
    }

    /// Maps a `MAP_READ` buffer after the queue drains and copies it out.
    fn map_staging(&self, staging: &wgpu::Buffer) -> Result<Vec<u8>> {
        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .context("device poll failed during readback")?;

        rx.recv()
            .context("readback callback dropped")?
            .context("failed to map readback buffer")?;

        let bytes = slice.get_mapped_range().to_vec();
        staging.unmap();
        Ok(bytes)
    }
}
