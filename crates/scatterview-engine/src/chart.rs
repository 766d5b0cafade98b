//! Chart element facade.
//!
//! `ScatterChart` is what a host control talks to: axis setters, mode
//! toggles, resize, and the render/present cycle. It owns the transform
//! engine and every piece of per-frame state, and snapshots them into a
//! `FrameState` for each render.

use std::sync::Arc;

use anyhow::Result;
use image::RgbaImage;

use crate::annotation::Annotation;
use crate::axis::{Axis, AxisRange};
use crate::camera::OrbitCamera;
use crate::config::{ChartConfig, MIN_TARGET_EDGE};
use crate::coords::{ColorRgba, Rect, Viewport};
use crate::grid::GridShape;
use crate::marker::Markers;
use crate::overlay::{MarkerOverlay, TraceOverlay};
use crate::pipeline::{FrameOutcome, FrameState, RenderPipeline, SkipReason};
use crate::render::Renderer;
use crate::scheduler::{GpuTaskScheduler, TaskHandle};
use crate::transform::{Transform, TransformEngine};

pub struct ScatterChart<R: Renderer> {
    engine: TransformEngine,
    camera: OrbitCamera,
    grid: GridShape,
    markers: Markers,
    annotation: Annotation,
    background: ColorRgba,
    pipeline: RenderPipeline<R>,
}

impl<R: Renderer> ScatterChart<R> {
    /// Spawns a dedicated GPU thread and builds the chart on it.
    pub fn new<F>(config: ChartConfig, factory: F) -> Result<Self>
    where
        F: FnOnce() -> Result<R> + Send + 'static,
    {
        let scheduler = Arc::new(GpuTaskScheduler::new(&config.scheduler)?);
        Self::with_scheduler(config, scheduler, factory)
    }

    /// Builds the chart on an existing scheduler.
    ///
    /// Blocks until the renderer exists and the first target is created.
    pub fn with_scheduler<F>(
        config: ChartConfig,
        scheduler: Arc<GpuTaskScheduler>,
        factory: F,
    ) -> Result<Self>
    where
        F: FnOnce() -> Result<R> + Send + 'static,
    {
        let pipeline = RenderPipeline::new(scheduler, factory)?;

        let mut camera = OrbitCamera::default();
        camera.set_bounds_check(config.camera_bounds_check);

        let mut chart = Self {
            engine: TransformEngine::new(config.axes, Rect::default()),
            camera,
            grid: GridShape::default(),
            markers: Markers::new(config.marker_count),
            annotation: Annotation::default(),
            background: config.background,
            pipeline,
        };
        chart.set_polar_coordinate(config.polar);
        chart.set_3d_enabled(config.enable_3d);

        if !chart.on_viewport_resized(config.width, config.height).wait()? {
            anyhow::bail!("failed to create the initial render target");
        }
        log::info!(
            "chart ready at {}x{}",
            chart.pipeline.viewport().width,
            chart.pipeline.viewport().height
        );
        Ok(chart)
    }

    // ── axes ──────────────────────────────────────────────────────────────

    pub fn axis(&self, axis: Axis) -> &AxisRange {
        self.engine.axes().get(axis)
    }

    /// Sets an axis minimum; the maximum is clipped if needed.
    pub fn set_axis_min(&mut self, axis: Axis, value: f64) {
        if self.engine.set_axis_min(axis, value) {
            self.annotation.update_axes(self.engine.axes());
        }
    }

    /// Sets an axis maximum; the minimum is clipped if needed.
    pub fn set_axis_max(&mut self, axis: Axis, value: f64) {
        if self.engine.set_axis_max(axis, value) {
            self.annotation.update_axes(self.engine.axes());
        }
    }

    pub fn set_x_axis_min(&mut self, value: f64) {
        self.set_axis_min(Axis::X, value);
    }

    pub fn set_x_axis_max(&mut self, value: f64) {
        self.set_axis_max(Axis::X, value);
    }

    pub fn set_y_axis_min(&mut self, value: f64) {
        self.set_axis_min(Axis::Y, value);
    }

    pub fn set_y_axis_max(&mut self, value: f64) {
        self.set_axis_max(Axis::Y, value);
    }

    pub fn set_z_axis_min(&mut self, value: f64) {
        self.set_axis_min(Axis::Z, value);
    }

    pub fn set_z_axis_max(&mut self, value: f64) {
        self.set_axis_max(Axis::Z, value);
    }

    // ── modes ─────────────────────────────────────────────────────────────

    #[inline]
    pub fn is_3d_enabled(&self) -> bool {
        self.engine.is_3d_enabled()
    }

    /// Switches between 2D and 3D. Leaving 3D hides the annotation.
    pub fn set_3d_enabled(&mut self, enabled: bool) {
        self.engine.set_3d_enabled(enabled);
        if enabled {
            self.annotation.update_axes(self.engine.axes());
            self.annotation.enable();
        } else {
            self.annotation.disable();
        }
    }

    #[inline]
    pub fn is_polar_coordinate(&self) -> bool {
        self.engine.is_polar()
    }

    /// In polar mode the X range follows Y and the grid aspect ratio.
    pub fn set_polar_coordinate(&mut self, enabled: bool) {
        self.engine.set_polar(enabled);
        self.annotation.update_axes(self.engine.axes());
    }

    // ── scene state ───────────────────────────────────────────────────────

    #[inline]
    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    #[inline]
    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    #[inline]
    pub fn grid(&self) -> &GridShape {
        &self.grid
    }

    /// Style access. The window rectangle is driven by `on_viewport_resized`.
    #[inline]
    pub fn grid_mut(&mut self) -> &mut GridShape {
        &mut self.grid
    }

    #[inline]
    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    #[inline]
    pub fn markers_mut(&mut self) -> &mut Markers {
        &mut self.markers
    }

    #[inline]
    pub fn annotation(&self) -> &Annotation {
        &self.annotation
    }

    #[inline]
    pub fn annotation_mut(&mut self) -> &mut Annotation {
        &mut self.annotation
    }

    #[inline]
    pub fn background(&self) -> ColorRgba {
        self.background
    }

    pub fn set_background(&mut self, color: ColorRgba) {
        self.background = color;
    }

    #[inline]
    pub fn transform(&self) -> Arc<Transform> {
        self.engine.transform()
    }

    #[inline]
    pub fn pipeline(&self) -> &RenderPipeline<R> {
        &self.pipeline
    }

    // ── pixel <-> value ───────────────────────────────────────────────────

    pub fn pixel_at_x(&self, value: f64, clamp_to_grid: bool) -> f64 {
        self.engine.pixel_at_x(value, clamp_to_grid)
    }

    pub fn pixel_at_y(&self, value: f64, clamp_to_grid: bool) -> f64 {
        self.engine.pixel_at_y(value, clamp_to_grid)
    }

    pub fn x_at_pixel(&self, px: f64) -> f64 {
        self.engine.x_at_pixel(px)
    }

    pub fn y_at_pixel(&self, py: f64) -> f64 {
        self.engine.y_at_pixel(py)
    }

    // ── overlays ──────────────────────────────────────────────────────────

    pub fn set_trace_overlay(&self, overlay: impl TraceOverlay + 'static) {
        self.pipeline.set_trace_overlay(overlay);
    }

    pub fn set_marker_overlay(&mut self, overlay: impl MarkerOverlay + Send + 'static) {
        self.pipeline.set_marker_overlay(overlay);
    }

    // ── frame cycle ───────────────────────────────────────────────────────

    /// Resizes the chart. Edges below `MIN_TARGET_EDGE` are raised to it.
    pub fn on_viewport_resized(&mut self, width: u32, height: u32) -> TaskHandle<bool> {
        let viewport = Viewport::new(width, height).at_least(MIN_TARGET_EDGE);
        self.grid.set_window_rect(Rect::from_size(
            f64::from(viewport.width),
            f64::from(viewport.height),
        ));
        self.engine.set_viewport(self.grid.grid_rect());
        self.annotation.update_axes(self.engine.axes());
        self.pipeline.resize(viewport.width, viewport.height, self.engine.is_3d_enabled())
    }

    /// Captures the current chart state for one render.
    pub fn frame_state(&mut self) -> FrameState {
        self.grid.update_planes(&self.camera);
        FrameState {
            viewport: self.pipeline.viewport(),
            transform: self.engine.transform(),
            axes: *self.engine.axes(),
            is_3d: self.engine.is_3d_enabled(),
            camera: self.camera.clone(),
            grid: self.grid.clone(),
            markers: self.markers.clone(),
            annotation: self.annotation.clone(),
            background: self.background,
        }
    }

    /// Enqueues a render of the current state.
    pub fn render(&mut self) -> TaskHandle<FrameOutcome> {
        let frame = self.frame_state();
        self.pipeline.render(frame)
    }

    /// Publishes the last rendered frame.
    pub fn present(&mut self) -> FrameOutcome {
        self.pipeline.present()
    }

    /// Renders, waits for the GPU, then presents.
    pub fn render_and_present(&mut self) -> FrameOutcome {
        match self.render().wait() {
            Ok(FrameOutcome::Rendered(_)) => self.present(),
            Ok(other) => other,
            Err(err) => FrameOutcome::Skipped(SkipReason::Fault(err.to_string())),
        }
    }

    /// The last published bitmap.
    #[inline]
    pub fn front(&self) -> Arc<RgbaImage> {
        self.pipeline.front()
    }

    /// Frees GPU resources. Idempotent; also runs on drop.
    pub fn release(&mut self) {
        self.pipeline.release();
    }
}
