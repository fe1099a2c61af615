use std::ops::Range;

/// The render-pass commands renderers issue.
///
/// Implemented for `wgpu::RenderPass`; [`RecordingPass`] captures the same calls as
/// data for inspection.
pub trait PassEncoder {
    fn set_pipeline(&mut self, pipeline: &wgpu::RenderPipeline);
    fn set_bind_group(&mut self, index: u32, bind_group: &wgpu::BindGroup);
    fn set_vertex_buffer(&mut self, slot: u32, buffer: &wgpu::Buffer);
    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>);
}

impl PassEncoder for wgpu::RenderPass<'_> {
    fn set_pipeline(&mut self, pipeline: &wgpu::RenderPipeline) {
        wgpu::RenderPass::set_pipeline(self, pipeline);
    }

    fn set_bind_group(&mut self, index: u32, bind_group: &wgpu::BindGroup) {
        wgpu::RenderPass::set_bind_group(self, index, bind_group, &[]);
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: &wgpu::Buffer) {
        wgpu::RenderPass::set_vertex_buffer(self, slot, buffer.slice(..));
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        wgpu::RenderPass::draw(self, vertices, instances);
    }
}

/// A recorded pass command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassCmd {
    SetPipeline,
    SetBindGroup { index: u32 },
    SetVertexBuffer { slot: u32, size: u64 },
    Draw { vertices: Range<u32>, instances: Range<u32> },
}

/// `PassEncoder` that records commands instead of encoding them.
#[derive(Debug, Default)]
pub struct RecordingPass {
    pub commands: Vec<PassCmd>,
}

impl RecordingPass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw commands only, in issue order.
    pub fn draws(&self) -> impl Iterator<Item = &PassCmd> {
        self.commands
            .iter()
            .filter(|c| matches!(c, PassCmd::Draw { .. }))
    }
}

impl PassEncoder for RecordingPass {
    fn set_pipeline(&mut self, _pipeline: &wgpu::RenderPipeline) {
        self.commands.push(PassCmd::SetPipeline);
    }

    fn set_bind_group(&mut self, index: u32, _bind_group: &wgpu::BindGroup) {
        self.commands.push(PassCmd::SetBindGroup { index });
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: &wgpu::Buffer) {
        self.commands.push(PassCmd::SetVertexBuffer {
            slot,
            size: buffer.size(),
        });
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.commands.push(PassCmd::Draw { vertices, instances });
    }
}
