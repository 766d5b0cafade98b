//! CPU-side vertex records and the vertex buffer used by trace overlays.
//!
//! Vertex data is `#[repr(C)]` + `Pod` so renderers can upload it with
//! `bytemuck::cast_slice` without copying.

mod buffer;
mod primitive;

pub use buffer::{BufferUsage, VertexBuffer};
pub use primitive::{PrimitiveType, Vertex};
