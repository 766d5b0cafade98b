//! Rendering seam between the pipeline and a rasterizer.
//!
//! The pipeline only talks to `Renderer` and `DrawTarget`. `gpu` holds the
//! wgpu implementation used by the studio binary.
//!
//! Convention:
//! - `RenderStates::transform` maps vertex positions to wgpu clip space.
//! - Renderers read back tightly packed RGBA8, top row first, except 3D
//!   frames, which come out bottom row first.

mod renderer;
mod states;

pub mod gpu;

pub use renderer::{DrawTarget, Renderer};
pub use states::RenderStates;
