use std::sync::Arc;

use crate::annotation::Annotation;
use crate::axis::AxisSet;
use crate::camera::OrbitCamera;
use crate::coords::{ColorRgba, Viewport};
use crate::grid::GridShape;
use crate::marker::Markers;
use crate::transform::Transform;

/// Everything one render needs, captured on the calling thread.
///
/// Moved into the GPU task as a whole, so the GPU side never sees a mix of
/// old and new chart state.
#[derive(Debug, Clone)]
pub struct FrameState {
    pub viewport: Viewport,
    pub transform: Arc<Transform>,
    pub axes: AxisSet,
    pub is_3d: bool,
    pub camera: OrbitCamera,
    pub grid: GridShape,
    pub markers: Markers,
    pub annotation: Annotation,
    pub background: ColorRgba,
}

impl FrameState {
    /// A 2D frame with default chart state over `viewport`.
    pub fn blank(viewport: Viewport) -> Self {
        let mut grid = GridShape::default();
        grid.set_window_rect(crate::coords::Rect::from_size(
            f64::from(viewport.width),
            f64::from(viewport.height),
        ));
        Self {
            viewport,
            transform: Arc::new(Transform::IDENTITY),
            axes: AxisSet::default(),
            is_3d: false,
            camera: OrbitCamera::default(),
            grid,
            markers: Markers::default(),
            annotation: Annotation::default(),
            background: ColorRgba::black(),
        }
    }
}

/// Metadata of a frame that finished rendering.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    pub viewport: Viewport,
    pub is_3d: bool,
}

/// Why a render or present did nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No GPU target exists yet (before the first resize, or mid-resize).
    TargetNotReady,
    /// Present found no finished frame.
    NoFrame,
    /// The renderer or an overlay failed; the message is already logged.
    Fault(String),
}

/// Result of one pipeline phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered(FrameInfo),
    Presented(FrameInfo),
    Skipped(SkipReason),
}

impl FrameOutcome {
    #[inline]
    pub fn is_skipped(&self) -> bool {
        matches!(self, FrameOutcome::Skipped(_))
    }
}
