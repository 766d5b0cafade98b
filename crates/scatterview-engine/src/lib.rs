//! Scatterview engine crate.
//!
//! This crate owns the GPU worker thread, the axis/pixel coordinate mapping
//! and the two-phase render/present pipeline used by scatter chart front ends.

pub mod annotation;
pub mod axis;
pub mod camera;
pub mod chart;
pub mod config;
pub mod coords;
pub mod error;
pub mod grid;
pub mod logging;
pub mod marker;
pub mod overlay;
pub mod pipeline;
pub mod render;
pub mod scheduler;
pub mod transform;
pub mod vertex;

pub use image;

pub use axis::{Axis, AxisRange};
pub use chart::ScatterChart;
pub use config::{ChartConfig, GpuInit, SchedulerConfig};
pub use error::SchedulerError;
pub use pipeline::{FrameOutcome, FrameState, RenderPipeline, SkipReason};
pub use render::gpu::WgpuRenderer;
pub use render::{DrawTarget, RenderStates, Renderer};
pub use scheduler::{GpuTaskScheduler, TaskHandle};
