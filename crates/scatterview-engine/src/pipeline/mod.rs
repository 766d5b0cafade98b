//! Render/present pipeline.
//!
//! Per frame: Idle → Rendering (GPU thread) → Composited (calling thread) →
//! Idle. `FrameState` is the snapshot that crosses the thread boundary;
//! `DisplaySurface` is the CPU-visible double buffer on the other end.

mod frame;
mod render_pipeline;
mod surface;

pub use frame::{FrameInfo, FrameOutcome, FrameState, SkipReason};
pub use render_pipeline::RenderPipeline;
pub use surface::DisplaySurface;
