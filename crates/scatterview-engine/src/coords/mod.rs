//! Coordinate and geometry types shared by the transform engine, the
//! pipeline and renderers.
//!
//! Canonical pixel space:
//! - Device pixels
//! - Origin top-left
//! - +X right, +Y down
//!
//! Data space is f64 (axis values); GPU-facing vertex data is f32.

mod color;
mod rect;
mod vec3;
mod viewport;

pub use color::ColorRgba;
pub use rect::Rect;
pub use vec3::Vec3;
pub use viewport::Viewport;
