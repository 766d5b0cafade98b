use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use image::RgbaImage;

use crate::config::MIN_TARGET_EDGE;
use crate::coords::Viewport;
use crate::error::panic_message;
use crate::overlay::{MarkerOverlay, PixelCanvas, TraceOverlay};
use crate::render::{RenderStates, Renderer};
use crate::scheduler::{GpuTaskScheduler, TaskHandle};

use super::{DisplaySurface, FrameInfo, FrameOutcome, FrameState, SkipReason};

/// State only touched on the GPU thread, except for `present` reading the
/// finished pixels.
struct GpuSide<R> {
    renderer: R,
    trace: Option<Box<dyn TraceOverlay>>,
    completed: Option<FrameInfo>,
}

/// Two-phase frame production.
///
/// `render` enqueues a GPU task and returns immediately; `present` copies
/// the finished frame into the display bitmap on the calling thread, runs
/// the marker overlay and publishes.
pub struct RenderPipeline<R: Renderer> {
    scheduler: Arc<GpuTaskScheduler>,
    gpu: Arc<Mutex<GpuSide<R>>>,
    ready: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    viewport: Viewport,
    surface: DisplaySurface,
    markers: Option<Box<dyn MarkerOverlay + Send>>,
    released: bool,
}

impl<R: Renderer> RenderPipeline<R> {
    /// Builds the renderer on the GPU thread with `factory` and waits for it.
    ///
    /// The target is not ready until the first `resize` completes.
    pub fn new<F>(scheduler: Arc<GpuTaskScheduler>, factory: F) -> Result<Self>
    where
        F: FnOnce() -> Result<R> + Send + 'static,
    {
        let renderer = scheduler.submit(factory).wait()??;
        Ok(Self {
            scheduler,
            gpu: Arc::new(Mutex::new(GpuSide { renderer, trace: None, completed: None })),
            ready: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            viewport: Viewport::default(),
            surface: DisplaySurface::new(Viewport::default()),
            markers: None,
            released: false,
        })
    }

    #[inline]
    pub fn scheduler(&self) -> &Arc<GpuTaskScheduler> {
        &self.scheduler
    }

    /// Size of the current target (after clamping).
    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// True once the GPU target for the latest resize exists.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// The last published frame.
    #[inline]
    pub fn front(&self) -> Arc<RgbaImage> {
        self.surface.front()
    }

    pub fn set_trace_overlay(&self, overlay: impl TraceOverlay + 'static) {
        lock(&self.gpu).trace = Some(Box::new(overlay));
    }

    pub fn clear_trace_overlay(&self) {
        lock(&self.gpu).trace = None;
    }

    pub fn set_marker_overlay(&mut self, overlay: impl MarkerOverlay + Send + 'static) {
        self.markers = Some(Box::new(overlay));
    }

    pub fn clear_marker_overlay(&mut self) {
        self.markers = None;
    }

    // ── resize ────────────────────────────────────────────────────────────

    /// Recreates the target at `width`×`height`, each clamped to at least
    /// `MIN_TARGET_EDGE`.
    ///
    /// The back bitmap is replaced immediately; the GPU target is recreated
    /// on the GPU thread. The handle resolves to `true` when the target is
    /// usable.
    pub fn resize(&mut self, width: u32, height: u32, is_3d: bool) -> TaskHandle<bool> {
        let viewport = Viewport::new(width, height).at_least(MIN_TARGET_EDGE);
        if self.released {
            return TaskHandle::resolved(false);
        }

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.ready.store(false, Ordering::Release);
        self.viewport = viewport;
        self.surface.resize(viewport);

        let gpu = Arc::clone(&self.gpu);
        let ready = Arc::clone(&self.ready);
        let current = Arc::clone(&self.generation);
        self.scheduler.submit(move || {
            let mut side = lock(&gpu);
            side.completed = None;
            let created = panic::catch_unwind(AssertUnwindSafe(|| {
                side.renderer.create_target(viewport, is_3d)
            }));
            match created {
                Ok(Ok(())) => {
                    // A newer resize may already be queued behind us.
                    if current.load(Ordering::Acquire) == generation {
                        ready.store(true, Ordering::Release);
                    }
                    true
                }
                Ok(Err(err)) => {
                    log::error!("failed to create {}x{} target: {err:#}", viewport.width, viewport.height);
                    false
                }
                Err(payload) => {
                    log::error!("target creation panicked: {}", panic_message(payload.as_ref()));
                    false
                }
            }
        })
    }

    // ── render ────────────────────────────────────────────────────────────

    /// Enqueues one frame. Resolves to `Skipped(TargetNotReady)` without
    /// touching the GPU when no target exists.
    pub fn render(&self, frame: FrameState) -> TaskHandle<FrameOutcome> {
        if self.released || !self.is_ready() {
            log::trace!("render skipped: target not ready");
            return TaskHandle::resolved(FrameOutcome::Skipped(SkipReason::TargetNotReady));
        }

        let gpu = Arc::clone(&self.gpu);
        let ready = Arc::clone(&self.ready);
        let current = Arc::clone(&self.generation);
        let generation = current.load(Ordering::Acquire);
        self.scheduler.submit(move || {
            if !ready.load(Ordering::Acquire) || current.load(Ordering::Acquire) != generation {
                return FrameOutcome::Skipped(SkipReason::TargetNotReady);
            }

            let mut guard = lock(&gpu);
            let side = &mut *guard;
            side.completed = None;
            let drawn = panic::catch_unwind(AssertUnwindSafe(|| {
                render_frame(&mut side.renderer, side.trace.as_mut(), &frame)
            }));

            let fault = match drawn {
                Ok(Ok(())) => {
                    let info = FrameInfo { viewport: frame.viewport, is_3d: frame.is_3d };
                    side.completed = Some(info);
                    return FrameOutcome::Rendered(info);
                }
                Ok(Err(err)) => format!("{err:#}"),
                Err(payload) => panic_message(payload.as_ref()),
            };
            log::error!("render failed: {fault}");
            FrameOutcome::Skipped(SkipReason::Fault(fault))
        })
    }

    // ── present ───────────────────────────────────────────────────────────

    /// Publishes the last rendered frame.
    ///
    /// The rendered frame stays available until the next render, resize or
    /// release, so presenting again republishes it with fresh markers.
    /// Rows are flipped exactly when the frame that produced the pixels was
    /// 3D, regardless of the chart's current mode.
    pub fn present(&mut self) -> FrameOutcome {
        if self.released {
            return FrameOutcome::Skipped(SkipReason::TargetNotReady);
        }

        let info = {
            let side = lock(&self.gpu);
            let Some(info) = side.completed else {
                return FrameOutcome::Skipped(SkipReason::NoFrame);
            };
            if info.viewport != self.surface.viewport() {
                log::debug!("dropping frame rendered for a previous size");
                return FrameOutcome::Skipped(SkipReason::NoFrame);
            }
            let Some(pixels) = side.renderer.pixels() else {
                return FrameOutcome::Skipped(SkipReason::NoFrame);
            };
            if !self.surface.copy_in(pixels, info.is_3d) {
                return FrameOutcome::Skipped(SkipReason::NoFrame);
            }
            info
        };

        if let Some(overlay) = self.markers.as_mut() {
            let back = self.surface.back_mut();
            let drawn = panic::catch_unwind(AssertUnwindSafe(|| {
                overlay.draw_markers(&mut PixelCanvas::new(back));
            }));
            if let Err(payload) = drawn {
                let msg = panic_message(payload.as_ref());
                log::error!("marker overlay panicked: {msg}");
                return FrameOutcome::Skipped(SkipReason::Fault(msg));
            }
        }

        self.surface.publish();
        FrameOutcome::Presented(info)
    }

    // ── release ───────────────────────────────────────────────────────────

    /// Frees renderer resources on the GPU thread. Idempotent.
    ///
    /// If the scheduler has already shut down the renderer is left to be
    /// dropped with the pipeline.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.ready.store(false, Ordering::Release);

        if self.scheduler.is_closed() {
            log::debug!("scheduler closed; skipping renderer release");
            return;
        }
        let gpu = Arc::clone(&self.gpu);
        let done = self.scheduler.execute(move || {
            let mut side = lock(&gpu);
            side.completed = None;
            side.renderer.release();
        });
        if let Err(err) = done.wait() {
            log::warn!("renderer release did not run: {err}");
        }
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl<R: Renderer> Drop for RenderPipeline<R> {
    fn drop(&mut self) {
        self.release();
    }
}

fn render_frame<R: Renderer>(
    renderer: &mut R,
    trace: Option<&mut Box<dyn TraceOverlay>>,
    frame: &FrameState,
) -> Result<()> {
    renderer.draw(frame)?;

    if let Some(trace) = trace {
        let states = RenderStates::data_space(frame);
        trace.draw_traces(renderer.target(), &states);
    }

    if frame.is_3d && frame.annotation.is_enabled() {
        let grid = frame.grid.grid_rect();
        let labels = frame.annotation.labels(
            RenderStates::label_projection(frame),
            (grid.width / 2.0) as f32,
            (grid.height / 2.0) as f32,
            (frame.viewport.width, frame.viewport.height),
        );
        renderer.draw_annotation(frame, &labels)?;
    }

    renderer.finalize()
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
