//! Data-space to device-pixel mapping.
//!
//! `TransformEngine` owns the axis ranges, the grid rectangle and the mode
//! flags, and republishes an immutable `Transform` whenever any of them
//! changes.

mod engine;
mod value;

pub use engine::{TransformEngine, MIN_SPAN};
pub use value::Transform;
