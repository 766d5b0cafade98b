//! Construction-time configuration.
//!
//! All structs implement `Default` with the values the chart starts with, so
//! callers only override what they need:
//!
//! ```
//! use scatterview_engine::config::ChartConfig;
//!
//! let cfg = ChartConfig { width: 1024, height: 768, ..Default::default() };
//! assert!(!cfg.enable_3d);
//! ```

use crate::axis::AxisSet;
use crate::coords::ColorRgba;

/// Smallest target edge accepted by resize, in pixels.
pub const MIN_TARGET_EDGE: u32 = 10;

/// GPU worker thread configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Name given to the worker OS thread.
    pub thread_name: String,
    /// Worker stack size in bytes. `None` uses the platform default.
    pub stack_size: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { thread_name: "gpu-render".to_owned(), stack_size: None }
    }
}

/// Initialization parameters for the wgpu renderer.
///
/// Keep this structure stable and minimal. Add configuration flags only when a
/// concrete platform or backend requirement exists.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Backends the instance may pick from.
    pub backends: wgpu::Backends,

    pub power_preference: wgpu::PowerPreference,

    /// Accept a software adapter when no hardware adapter is found.
    pub allow_fallback_adapter: bool,

    /// Required wgpu features.
    ///
    /// Favor an empty set for portability unless a feature is strictly necessary.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            allow_fallback_adapter: true,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
        }
    }
}

/// Everything a `ScatterChart` needs at construction.
#[derive(Debug, Clone)]
pub struct ChartConfig {
    /// Initial target size. Clamped to `MIN_TARGET_EDGE`.
    pub width: u32,
    pub height: u32,
    pub axes: AxisSet,
    pub enable_3d: bool,
    pub polar: bool,
    pub background: ColorRgba,
    /// Orbit camera elevation envelope.
    pub camera_bounds_check: bool,
    pub marker_count: usize,
    pub scheduler: SchedulerConfig,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            axes: AxisSet::default(),
            enable_3d: false,
            polar: false,
            background: ColorRgba::black(),
            camera_bounds_check: true,
            marker_count: crate::marker::DEFAULT_MARKER_COUNT,
            scheduler: SchedulerConfig::default(),
        }
    }
}
