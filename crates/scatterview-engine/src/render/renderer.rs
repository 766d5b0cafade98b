use anyhow::Result;

use crate::annotation::AxisLabel;
use crate::coords::Viewport;
use crate::pipeline::FrameState;
use crate::vertex::{PrimitiveType, Vertex, VertexBuffer};

use super::RenderStates;

/// The frame currently being rendered, as seen by trace overlays.
pub trait DrawTarget {
    /// Records a draw of `vertices` assembled as `kind`, positioned by
    /// `states.transform`.
    fn draw_vertices(&mut self, kind: PrimitiveType, vertices: &[Vertex], states: &RenderStates);

    /// Records a draw of a whole `VertexBuffer`.
    ///
    /// Targets that keep device-side copies override this and use the
    /// buffer's usage, id and revision.
    fn draw_buffer(&mut self, buffer: &VertexBuffer, states: &RenderStates) {
        self.draw_vertices(buffer.kind(), buffer.as_slice(), states);
    }
}

/// Rasterizer driven by the render pipeline.
///
/// Every method except `pixels` runs on the GPU thread. A frame is produced
/// by `draw`, any number of `draw_vertices` calls through `target()`, an
/// optional `draw_annotation`, then `finalize`.
pub trait Renderer: Send + 'static {
    /// (Re)creates the offscreen target. Invalidates the pixel buffer.
    fn create_target(&mut self, viewport: Viewport, is_3d: bool) -> Result<()>;

    /// Starts a frame: clears to the background and draws grid and markers.
    fn draw(&mut self, frame: &FrameState) -> Result<()>;

    /// Draw target for the frame started by `draw`.
    fn target(&mut self) -> &mut dyn DrawTarget;

    /// Draws 3D axis labels computed for this frame.
    fn draw_annotation(&mut self, frame: &FrameState, labels: &[AxisLabel]) -> Result<()>;

    /// Completes the frame and makes its pixels readable.
    fn finalize(&mut self) -> Result<()>;

    /// Tightly packed RGBA8 pixels of the last finalized frame.
    fn pixels(&self) -> Option<&[u8]>;

    /// Frees GPU resources. Must tolerate repeated calls.
    fn release(&mut self);
}
