//! Per-axis value ranges with the auto-clip rule.
//!
//! Writes never get rejected. Moving one bound past the other nudges the
//! other bound by 10% of its own magnitude so that `min < max` is restored.

/// Identifies one of the three chart axes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Recomputes `min` after `max` changed.
///
/// `max - 0.1·|max|` when `max < min`, otherwise `min` unchanged.
#[inline]
pub fn clip_min(min: f64, max: f64) -> f64 {
    if max < min {
        max - max.abs() * 0.1
    } else {
        min
    }
}

/// Recomputes `max` after `min` changed.
///
/// `min + 0.1·|min|` when `min > max`, otherwise `max` unchanged.
#[inline]
pub fn clip_max(min: f64, max: f64) -> f64 {
    if min > max {
        min + min.abs() * 0.1
    } else {
        max
    }
}

/// A `[min, max]` interval of data-space values mapped onto one screen axis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AxisRange {
    min: f64,
    max: f64,
    polar_derived: bool,
}

impl Default for AxisRange {
    fn default() -> Self {
        Self::new(-1.0, 1.0)
    }
}

impl AxisRange {
    /// Creates a range. Bounds are taken as given; use the setters for
    /// clipped updates.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max, polar_derived: false }
    }

    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    #[inline]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    #[inline]
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// True while this range is computed from another axis (polar mode).
    #[inline]
    pub fn is_polar_derived(&self) -> bool {
        self.polar_derived
    }

    /// Sets the lower bound, clipping the upper bound if needed.
    ///
    /// Returns `true` if the range changed. No-op while polar-derived or
    /// for non-finite values.
    pub fn set_min(&mut self, value: f64) -> bool {
        if self.polar_derived || !value.is_finite() || self.min == value {
            return false;
        }
        self.min = value;
        self.max = clip_max(self.min, self.max);
        true
    }

    /// Sets the upper bound, clipping the lower bound if needed.
    ///
    /// Returns `true` if the range changed. No-op while polar-derived or
    /// for non-finite values.
    pub fn set_max(&mut self, value: f64) -> bool {
        if self.polar_derived || !value.is_finite() || self.max == value {
            return false;
        }
        self.max = value;
        self.min = clip_min(self.min, self.max);
        true
    }

    /// Clamps `value` into `[min, max]`.
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    /// Overwrites both bounds as a derived range.
    pub(crate) fn derive(&mut self, min: f64, max: f64) {
        self.min = min;
        self.max = max;
        self.polar_derived = true;
    }

    pub(crate) fn release_derived(&mut self) {
        self.polar_derived = false;
    }
}

/// The X, Y and Z ranges of one chart.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct AxisSet {
    pub x: AxisRange,
    pub y: AxisRange,
    pub z: AxisRange,
}

impl AxisSet {
    pub fn get(&self, axis: Axis) -> &AxisRange {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    pub fn get_mut(&mut self, axis: Axis) -> &mut AxisRange {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── clip rules ────────────────────────────────────────────────────────

    #[test]
    fn clip_min_only_when_inverted() {
        assert_eq!(clip_min(-1.0, 1.0), -1.0);
        assert!((clip_min(5.0, 1.0) - 0.9).abs() < 1e-12);
        assert!((clip_min(5.0, -2.0) + 2.2).abs() < 1e-12);
    }

    #[test]
    fn clip_max_only_when_inverted() {
        assert_eq!(clip_max(-1.0, 1.0), 1.0);
        assert_eq!(clip_max(10.0, 1.0), 11.0);
        assert_eq!(clip_max(-5.0, -10.0), -4.5);
    }

    // ── setters ───────────────────────────────────────────────────────────

    #[test]
    fn set_max_below_min_reclips_min() {
        let mut r = AxisRange::new(5.0, 10.0);
        assert!(r.set_max(1.0));
        assert_eq!(r.max(), 1.0);
        assert!((r.min() - 0.9).abs() < 1e-12);
        assert!(r.min() < r.max());
    }

    #[test]
    fn set_min_above_max_reclips_max() {
        let mut r = AxisRange::new(-1.0, 1.0);
        assert!(r.set_min(4.0));
        assert_eq!(r.min(), 4.0);
        assert!((r.max() - 4.4).abs() < 1e-12);
    }

    #[test]
    fn non_finite_bounds_are_ignored() {
        let mut r = AxisRange::new(-2.0, 3.0);
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(!r.set_min(bad));
            assert!(!r.set_max(bad));
        }
        assert_eq!((r.min(), r.max()), (-2.0, 3.0));
    }

    #[test]
    fn setting_same_value_is_noop() {
        let mut r = AxisRange::new(-1.0, 1.0);
        assert!(!r.set_min(-1.0));
        assert!(!r.set_max(1.0));
    }

    #[test]
    fn derived_range_ignores_setters() {
        let mut r = AxisRange::default();
        r.derive(-4.0, 4.0);
        assert!(!r.set_min(0.0));
        assert!(!r.set_max(9.0));
        assert_eq!((r.min(), r.max()), (-4.0, 4.0));

        r.release_derived();
        assert!(r.set_min(0.0));
    }

    #[test]
    fn clamp_into_range() {
        let r = AxisRange::new(-5.0, 5.0);
        assert_eq!(r.clamp(-7.0), -5.0);
        assert_eq!(r.clamp(7.0), 5.0);
        assert_eq!(r.clamp(2.5), 2.5);
    }
}
