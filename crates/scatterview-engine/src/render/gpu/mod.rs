//! wgpu implementation of the opaque renderer.
//!
//! Renders offscreen into an RGBA8 texture and reads every finalized frame
//! back into CPU memory for the present phase.

mod context;
mod renderer;

pub use context::GpuContext;
pub use renderer::WgpuRenderer;
