use std::sync::Arc;

use crate::axis::{Axis, AxisSet};
use crate::coords::{Rect, Vec3};
use crate::grid::{GRID_Z_MAX, GRID_Z_MIN};

use super::Transform;

/// Smallest axis span the engine will divide by.
///
/// Only reached when the clip rule produced `min == max` (e.g. a bound moved
/// onto zero) or the caller passed non-finite values.
pub const MIN_SPAN: f64 = 1e-9;

/// Smallest pixel extent used for scale computation.
const MIN_EXTENT: f64 = 1.0;

/// Computes and publishes the data → pixel transform.
///
/// Every mutation that affects the mapping recomputes a fresh `Transform`
/// and replaces the published `Arc` in one step. Readers holding an older
/// `Arc` keep a consistent (if stale) value.
#[derive(Debug, Clone)]
pub struct TransformEngine {
    axes: AxisSet,
    viewport: Rect,
    is_3d: bool,
    polar: bool,
    current: Arc<Transform>,
}

impl Default for TransformEngine {
    fn default() -> Self {
        Self::new(AxisSet::default(), Rect::default())
    }
}

impl TransformEngine {
    pub fn new(axes: AxisSet, viewport: Rect) -> Self {
        let mut engine = Self {
            axes,
            viewport,
            is_3d: false,
            polar: false,
            current: Arc::new(Transform::IDENTITY),
        };
        engine.recompute();
        engine
    }

    // ── state ─────────────────────────────────────────────────────────────

    #[inline]
    pub fn axes(&self) -> &AxisSet {
        &self.axes
    }

    /// Grid rectangle the axes are mapped onto.
    #[inline]
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    #[inline]
    pub fn is_3d_enabled(&self) -> bool {
        self.is_3d
    }

    #[inline]
    pub fn is_polar(&self) -> bool {
        self.polar
    }

    /// The currently published transform.
    #[inline]
    pub fn transform(&self) -> Arc<Transform> {
        Arc::clone(&self.current)
    }

    // ── mutation ──────────────────────────────────────────────────────────

    /// Sets an axis minimum with auto-clip. Returns `true` if anything changed.
    ///
    /// X is read-only while polar mode is active.
    pub fn set_axis_min(&mut self, axis: Axis, value: f64) -> bool {
        let changed = self.axes.get_mut(axis).set_min(value);
        if changed {
            self.recompute();
        }
        changed
    }

    /// Sets an axis maximum with auto-clip. Returns `true` if anything changed.
    pub fn set_axis_max(&mut self, axis: Axis, value: f64) -> bool {
        let changed = self.axes.get_mut(axis).set_max(value);
        if changed {
            self.recompute();
        }
        changed
    }

    pub fn set_viewport(&mut self, viewport: Rect) {
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        self.recompute();
    }

    pub fn set_3d_enabled(&mut self, enabled: bool) {
        if enabled == self.is_3d {
            return;
        }
        self.is_3d = enabled;
        self.recompute();
    }

    /// Switches polar mode. Leaving polar mode keeps the last derived X range
    /// but makes it settable again.
    pub fn set_polar(&mut self, enabled: bool) {
        if enabled == self.polar {
            return;
        }
        self.polar = enabled;
        if !enabled {
            self.axes.x.release_derived();
        }
        self.recompute();
    }

    // ── pixel <-> value ───────────────────────────────────────────────────

    /// Pixel column of the X-axis value `value`.
    ///
    /// With `clamp_to_grid` the result is limited to the grid's horizontal extent.
    pub fn pixel_at_x(&self, value: f64, clamp_to_grid: bool) -> f64 {
        let px = self.current.transform_point(Vec3::new(value, 0.0, 0.0)).x;
        if clamp_to_grid {
            px.clamp(self.viewport.left(), self.viewport.right().max(self.viewport.left()))
        } else {
            px
        }
    }

    /// Pixel row of the Y-axis value `value`, measured from the top.
    ///
    /// The transform grows upward from the grid bottom; the row is
    /// `grid_height - transformed_y`.
    pub fn pixel_at_y(&self, value: f64, clamp_to_grid: bool) -> f64 {
        let ty = self.current.transform_point(Vec3::new(0.0, value, 0.0)).y;
        let row = self.viewport.height - ty;
        if clamp_to_grid {
            row.clamp(self.viewport.top(), self.viewport.bottom().max(self.viewport.top()))
        } else {
            row
        }
    }

    /// X-axis value at pixel column `px`, clamped into the X range.
    pub fn x_at_pixel(&self, px: f64) -> f64 {
        let v = self.current.inverse_transform_point(Vec3::new(px, 0.0, 0.0)).x;
        self.axes.x.clamp(v)
    }

    /// Y-axis value at pixel row `py` (top origin), clamped into the Y range.
    pub fn y_at_pixel(&self, py: f64) -> f64 {
        let ty = self.viewport.height - py;
        let v = self.current.inverse_transform_point(Vec3::new(0.0, ty, 0.0)).y;
        self.axes.y.clamp(v)
    }

    // ── recompute ─────────────────────────────────────────────────────────

    fn recompute(&mut self) {
        let width = extent(self.viewport.width);
        let height = extent(self.viewport.height);

        if self.polar {
            let aspect = width / height;
            let half = self.axes.y.span() * aspect / 2.0;
            self.axes.x.derive(-half, half);
        }

        let x_span = safe_span(self.axes.x.span(), Axis::X);
        let y_span = safe_span(self.axes.y.span(), Axis::Y);

        let transform = if self.is_3d {
            let z_span = safe_span(self.axes.z.span(), Axis::Z);
            Transform {
                scale: Vec3::new(width / x_span, height / y_span, (GRID_Z_MAX - GRID_Z_MIN) / z_span),
                origin: Vec3::new(
                    self.axes.x.midpoint(),
                    self.axes.y.midpoint(),
                    self.axes.z.midpoint(),
                ),
                position: Vec3::zero(),
            }
        } else {
            let scale = Vec3::new(width / x_span, height / y_span, 1.0);
            Transform {
                scale,
                origin: Vec3::zero(),
                position: Vec3::new(-self.axes.x.min() * scale.x, -self.axes.y.min() * scale.y, 0.0),
            }
        };

        self.current = Arc::new(transform);
    }
}

fn extent(px: f64) -> f64 {
    if px.is_finite() && px >= MIN_EXTENT { px } else { MIN_EXTENT }
}

fn safe_span(span: f64, axis: Axis) -> f64 {
    if span.is_finite() && span >= MIN_SPAN {
        span
    } else {
        log::warn!("degenerate {axis:?} axis span {span}; using {MIN_SPAN}");
        MIN_SPAN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::AxisRange;

    fn engine_2d(x: (f64, f64), y: (f64, f64), w: f64, h: f64) -> TransformEngine {
        let axes = AxisSet {
            x: AxisRange::new(x.0, x.1),
            y: AxisRange::new(y.0, y.1),
            z: AxisRange::default(),
        };
        TransformEngine::new(axes, Rect::from_size(w, h))
    }

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    // ── 2D ────────────────────────────────────────────────────────────────

    #[test]
    fn corners_map_to_grid_corners() {
        let e = engine_2d((-5.0, 5.0), (-3.0, 3.0), 1000.0, 600.0);
        let t = e.transform();
        let lo = t.transform_point(Vec3::new(-5.0, -3.0, 0.0));
        let hi = t.transform_point(Vec3::new(5.0, 3.0, 0.0));
        assert!(close(lo.x, 0.0, 1e-9) && close(lo.y, 0.0, 1e-9));
        assert!(close(hi.x, 1000.0, 1e-9) && close(hi.y, 600.0, 1e-9));
        assert_eq!(t.origin, Vec3::zero());
        assert_eq!(t.scale.z, 1.0);
    }

    #[test]
    fn pixel_rows_grow_downward() {
        let e = engine_2d((-5.0, 5.0), (-3.0, 3.0), 1000.0, 600.0);
        assert!(close(e.pixel_at_y(-3.0, false), 600.0, 1e-9));
        assert!(close(e.pixel_at_y(3.0, false), 0.0, 1e-9));
    }

    #[test]
    fn pixel_value_round_trip() {
        let e = engine_2d((-5.0, 5.0), (-3.0, 3.0), 1000.0, 600.0);
        for v in [-5.0, -2.75, 0.0, 1.3, 2.5, 5.0] {
            assert!(close(e.x_at_pixel(e.pixel_at_x(v, false)), v, 1e-4));
        }
        for v in [-3.0, -0.4, 0.0, 2.9] {
            assert!(close(e.y_at_pixel(e.pixel_at_y(v, false)), v, 1e-4));
        }
    }

    #[test]
    fn value_at_pixel_clamps_into_range() {
        let e = engine_2d((-5.0, 5.0), (-3.0, 3.0), 1000.0, 600.0);
        assert_eq!(e.x_at_pixel(-50.0), -5.0);
        assert_eq!(e.x_at_pixel(5000.0), 5.0);
        assert_eq!(e.y_at_pixel(-10.0), 3.0);
    }

    #[test]
    fn clamp_to_grid_limits_pixels() {
        let axes = AxisSet {
            x: AxisRange::new(0.0, 10.0),
            y: AxisRange::new(0.0, 10.0),
            z: AxisRange::default(),
        };
        let e = TransformEngine::new(axes, Rect::new(1.0, 1.0, 100.0, 100.0));
        assert_eq!(e.pixel_at_x(50.0, true), 101.0);
        assert_eq!(e.pixel_at_x(-50.0, true), 1.0);
        assert!(e.pixel_at_x(50.0, false) > 101.0);
        assert_eq!(e.pixel_at_y(-20.0, true), 101.0);
    }

    // ── setters ───────────────────────────────────────────────────────────

    #[test]
    fn setter_recomputes_and_replaces_transform() {
        let mut e = engine_2d((-1.0, 1.0), (-1.0, 1.0), 200.0, 200.0);
        let before = e.transform();
        assert!(e.set_axis_max(Axis::X, 3.0));
        let after = e.transform();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before.scale.x, 100.0);
        assert_eq!(after.scale.x, 50.0);
    }

    #[test]
    fn unchanged_setter_keeps_transform() {
        let mut e = engine_2d((-1.0, 1.0), (-1.0, 1.0), 200.0, 200.0);
        let before = e.transform();
        assert!(!e.set_axis_min(Axis::Y, -1.0));
        assert!(Arc::ptr_eq(&before, &e.transform()));
    }

    #[test]
    fn max_below_min_clips_min() {
        let mut e = engine_2d((5.0, 10.0), (-1.0, 1.0), 200.0, 200.0);
        e.set_axis_max(Axis::X, 1.0);
        assert!(close(e.axes().x.min(), 0.9, 1e-12));
        assert_eq!(e.axes().x.max(), 1.0);
    }

    // ── polar ─────────────────────────────────────────────────────────────

    #[test]
    fn polar_derives_x_from_y_and_aspect() {
        let mut e = engine_2d((-1.0, 1.0), (-3.0, 3.0), 800.0, 600.0);
        e.set_polar(true);
        assert!(close(e.axes().x.min(), -4.0, 1e-12));
        assert!(close(e.axes().x.max(), 4.0, 1e-12));
        assert!(e.axes().x.is_polar_derived());
    }

    #[test]
    fn polar_x_setters_are_noops() {
        let mut e = engine_2d((-1.0, 1.0), (-3.0, 3.0), 800.0, 600.0);
        e.set_polar(true);
        assert!(!e.set_axis_min(Axis::X, -100.0));
        assert!(!e.set_axis_max(Axis::X, 100.0));
        assert!(close(e.axes().x.max(), 4.0, 1e-12));
    }

    #[test]
    fn polar_follows_y_and_viewport_changes() {
        let mut e = engine_2d((-1.0, 1.0), (-3.0, 3.0), 800.0, 600.0);
        e.set_polar(true);
        e.set_axis_max(Axis::Y, 9.0);
        // span 12, aspect 4/3 -> half width 8
        assert!(close(e.axes().x.max(), 8.0, 1e-12));
        e.set_viewport(Rect::from_size(600.0, 600.0));
        assert!(close(e.axes().x.max(), 6.0, 1e-12));
    }

    #[test]
    fn leaving_polar_makes_x_settable() {
        let mut e = engine_2d((-1.0, 1.0), (-3.0, 3.0), 800.0, 600.0);
        e.set_polar(true);
        e.set_polar(false);
        assert!(e.set_axis_min(Axis::X, -2.0));
        assert_eq!(e.axes().x.min(), -2.0);
    }

    // ── 3D ────────────────────────────────────────────────────────────────

    #[test]
    fn symmetric_ranges_center_on_zero() {
        let axes = AxisSet {
            x: AxisRange::new(-5.0, 5.0),
            y: AxisRange::new(-3.0, 3.0),
            z: AxisRange::new(-3.0, 3.0),
        };
        let mut e = TransformEngine::new(axes, Rect::from_size(800.0, 600.0));
        e.set_3d_enabled(true);
        let t = e.transform();
        assert_eq!(t.origin, Vec3::zero());
        assert_eq!(t.position, Vec3::zero());
        assert!(close(t.scale.z, (GRID_Z_MAX - GRID_Z_MIN) / 6.0, 1e-12));
    }

    #[test]
    fn asymmetric_range_moves_origin() {
        let axes = AxisSet {
            x: AxisRange::new(-2.0, 8.0),
            y: AxisRange::new(-3.0, 3.0),
            z: AxisRange::new(-3.0, 3.0),
        };
        let mut e = TransformEngine::new(axes, Rect::from_size(800.0, 600.0));
        e.set_3d_enabled(true);
        let t = e.transform();
        assert_eq!(t.origin.x, 3.0);
        assert_eq!(t.position, Vec3::zero());
    }

    #[test]
    fn toggling_3d_switches_origin_and_position() {
        let mut e = engine_2d((-2.0, 8.0), (0.0, 4.0), 100.0, 100.0);
        e.set_3d_enabled(true);
        assert_eq!(e.transform().position, Vec3::zero());
        e.set_3d_enabled(false);
        let t = e.transform();
        assert_eq!(t.origin, Vec3::zero());
        assert!(close(t.position.x, 20.0, 1e-9));
    }

    // ── degenerate input ──────────────────────────────────────────────────

    #[test]
    fn zero_span_falls_back_to_min_span() {
        let mut e = engine_2d((-1.0, 1.0), (-1.0, 1.0), 100.0, 100.0);
        // min == max is not inverted, so no clip happens.
        e.set_axis_max(Axis::X, -1.0);
        assert_eq!(e.axes().x.span(), 0.0);
        let t = e.transform();
        assert!(t.scale.x.is_finite());
        assert!(t.scale.x > 0.0);
    }

    #[test]
    fn empty_viewport_never_divides_by_zero() {
        let e = engine_2d((-1.0, 1.0), (-1.0, 1.0), 0.0, 0.0);
        let t = e.transform();
        assert!(t.scale.is_finite());
        assert!(e.x_at_pixel(0.5).is_finite());
    }
}
