//! 3D axis annotation.
//!
//! Produces screen-space anchors for the min/max/unit labels of each axis by
//! projecting three edges of the grid box. Glyph rendering belongs to the
//! host; renderers draw the label anchors as short tick marks.

use glam::{Mat4, Vec3, Vec4Swizzles};

use crate::axis::{Axis, AxisSet};
use crate::coords::ColorRgba;
use crate::grid::{GRID_Z_MAX, GRID_Z_MIN};

pub const DEFAULT_FONT_SIZE: f32 = 13.0;

/// What a label shows.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LabelKind {
    Min,
    Max,
    Unit,
}

/// One positioned label.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisLabel {
    pub axis: Axis,
    pub kind: LabelKind,
    pub text: String,
    /// Anchor in device pixels, top-left origin.
    pub anchor: [f32; 2],
    /// Screen angle of the axis edge in degrees, counter-clockwise from +X.
    pub angle: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub units: [String; 3],
    pub font_size: f32,
    pub color: ColorRgba,
    enabled: bool,
    axes: AxisSet,
}

impl Default for Annotation {
    fn default() -> Self {
        Self {
            units: ["sym".into(), "dBm".into(), "carr".into()],
            font_size: DEFAULT_FONT_SIZE,
            color: ColorRgba::red(),
            enabled: false,
            axes: AxisSet::default(),
        }
    }
}

impl Annotation {
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Hides every label. Called when leaving 3D.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn unit(&self, axis: Axis) -> &str {
        &self.units[axis_index(axis)]
    }

    pub fn set_unit(&mut self, axis: Axis, unit: impl Into<String>) {
        self.units[axis_index(axis)] = unit.into();
    }

    /// Copies the axis ranges shown by the labels.
    pub fn update_axes(&mut self, axes: &AxisSet) {
        self.axes = *axes;
    }

    #[inline]
    pub fn axes(&self) -> &AxisSet {
        &self.axes
    }

    /// Computes label anchors.
    ///
    /// `box_to_clip` maps grid-box coordinates (half extents `half_w`/`half_h`
    /// on X/Y, `GRID_Z_MIN..GRID_Z_MAX` on Z) to clip space. Returns nothing
    /// while disabled.
    pub fn labels(
        &self,
        box_to_clip: Mat4,
        half_w: f32,
        half_h: f32,
        viewport: (u32, u32),
    ) -> Vec<AxisLabel> {
        if !self.enabled {
            return Vec::new();
        }
        let (z0, z1) = (GRID_Z_MIN as f32, GRID_Z_MAX as f32);
        let edges = [
            (Axis::X, Vec3::new(-half_w, -half_h, z1), Vec3::new(half_w, -half_h, z1)),
            (Axis::Y, Vec3::new(-half_w, -half_h, z1), Vec3::new(-half_w, half_h, z1)),
            (Axis::Z, Vec3::new(half_w, -half_h, z1), Vec3::new(half_w, -half_h, z0)),
        ];

        let mut out = Vec::with_capacity(9);
        for (axis, a, b) in edges {
            let (Some(pa), Some(pb)) = (
                project(box_to_clip, a, viewport),
                project(box_to_clip, b, viewport),
            ) else {
                continue;
            };
            let angle = (pa[1] - pb[1]).atan2(pb[0] - pa[0]).to_degrees();
            let mid = [(pa[0] + pb[0]) / 2.0, (pa[1] + pb[1]) / 2.0];
            let range = self.axes.get(axis);

            out.push(self.label(axis, LabelKind::Min, format_value(range.min()), pa, angle));
            out.push(self.label(axis, LabelKind::Max, format_value(range.max()), pb, angle));
            out.push(self.label(axis, LabelKind::Unit, self.unit(axis).to_owned(), mid, angle));
        }
        out
    }

    fn label(&self, axis: Axis, kind: LabelKind, text: String, anchor: [f32; 2], angle: f32) -> AxisLabel {
        AxisLabel { axis, kind, text, anchor, angle }
    }
}

fn axis_index(axis: Axis) -> usize {
    match axis {
        Axis::X => 0,
        Axis::Y => 1,
        Axis::Z => 2,
    }
}

fn format_value(v: f64) -> String {
    format!("{v}")
}

/// Clip → device pixels. `None` for points behind the camera.
fn project(m: Mat4, p: Vec3, (w, h): (u32, u32)) -> Option<[f32; 2]> {
    let clip = m * p.extend(1.0);
    if clip.w <= f32::EPSILON {
        return None;
    }
    let ndc = clip.xyz() / clip.w;
    Some([(ndc.x + 1.0) * 0.5 * w as f32, (1.0 - ndc.y) * 0.5 * h as f32])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::AxisRange;

    fn identity_labels(a: &Annotation) -> Vec<AxisLabel> {
        // Scale the box down into clip space.
        let m = Mat4::from_scale(Vec3::new(0.01, 0.01, 0.001));
        a.labels(m, 50.0, 50.0, (200, 200))
    }

    #[test]
    fn defaults() {
        let a = Annotation::default();
        assert_eq!(a.unit(Axis::X), "sym");
        assert_eq!(a.unit(Axis::Y), "dBm");
        assert_eq!(a.unit(Axis::Z), "carr");
        assert_eq!(a.font_size, 13.0);
        assert_eq!(a.color, ColorRgba::red());
        assert!(!a.is_enabled());
    }

    #[test]
    fn disabled_yields_no_labels() {
        let a = Annotation::default();
        assert!(identity_labels(&a).is_empty());
    }

    #[test]
    fn enabled_yields_nine_labels() {
        let mut a = Annotation::default();
        a.enable();
        a.update_axes(&AxisSet {
            x: AxisRange::new(-5.0, 5.0),
            y: AxisRange::default(),
            z: AxisRange::default(),
        });
        let labels = identity_labels(&a);
        assert_eq!(labels.len(), 9);

        let x_min = &labels[0];
        assert_eq!((x_min.axis, x_min.kind), (Axis::X, LabelKind::Min));
        assert_eq!(x_min.text, "-5");
        // (-50, -50) -> ndc (-0.5, -0.5) -> pixel (50, 150)
        assert!((x_min.anchor[0] - 50.0).abs() < 1e-3);
        assert!((x_min.anchor[1] - 150.0).abs() < 1e-3);
        assert!(x_min.angle.abs() < 1e-3);

        let y_unit = labels.iter().find(|l| l.axis == Axis::Y && l.kind == LabelKind::Unit);
        assert_eq!(y_unit.map(|l| l.text.as_str()), Some("dBm"));
        assert!(y_unit.is_some_and(|l| (l.angle - 90.0).abs() < 1e-3));
    }

    #[test]
    fn set_unit_overrides() {
        let mut a = Annotation::default();
        a.set_unit(Axis::Z, "bins");
        assert_eq!(a.unit(Axis::Z), "bins");
    }
}
