//! Data-space markers drawn by the renderer in 3D.

use crate::coords::{ColorRgba, Vec3};
use crate::transform::Transform;
use crate::vertex::{PrimitiveType, Vertex};

pub const DEFAULT_MARKER_COUNT: usize = 12;

/// Half-size of a marker octahedron at `scale == 1`, in transformed units.
const MARKER_RADIUS: f32 = 6.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Marker {
    pub visible: bool,
    pub position: Vec3,
    pub active: bool,
    pub active_color: ColorRgba,
    pub inactive_color: ColorRgba,
    pub scale: f32,
}

impl Default for Marker {
    fn default() -> Self {
        Self {
            visible: false,
            position: Vec3::zero(),
            active: false,
            active_color: ColorRgba::red(),
            inactive_color: ColorRgba::white(),
            scale: 1.0,
        }
    }
}

impl Marker {
    #[inline]
    pub fn color(&self) -> ColorRgba {
        if self.active { self.active_color } else { self.inactive_color }
    }
}

/// Fixed-size marker table plus the selected index.
#[derive(Debug, Clone, PartialEq)]
pub struct Markers {
    items: Vec<Marker>,
    selected: Option<usize>,
}

impl Default for Markers {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER_COUNT)
    }
}

impl Markers {
    pub fn new(count: usize) -> Self {
        Self { items: vec![Marker::default(); count], selected: None }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Marker> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Marker> {
        self.items.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.items.iter()
    }

    #[inline]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Selects a marker, making it the only active one. Out-of-range indices
    /// clear the selection.
    pub fn select(&mut self, index: Option<usize>) {
        let index = index.filter(|&i| i < self.items.len());
        self.selected = index;
        for (i, m) in self.items.iter_mut().enumerate() {
            m.active = Some(i) == index;
        }
    }

    /// Triangle-list octahedra for every visible marker, positioned through
    /// `transform`.
    pub fn vertices(&self, transform: &Transform) -> (PrimitiveType, Vec<Vertex>) {
        let mut out = Vec::new();
        for m in self.items.iter().filter(|m| m.visible && m.position.is_finite()) {
            let c = transform.transform_point(m.position).to_f32();
            push_octahedron(&mut out, [c.x, c.y, c.z], MARKER_RADIUS * m.scale, m.color().to_array());
        }
        (PrimitiveType::Triangles, out)
    }
}

fn push_octahedron(out: &mut Vec<Vertex>, c: [f32; 3], r: f32, color: [f32; 4]) {
    let [x, y, z] = c;
    let tips = [[x, y + r, z], [x, y - r, z]];
    let ring = [[x + r, y, z], [x, y, z + r], [x - r, y, z], [x, y, z - r]];
    for tip in tips {
        for i in 0..ring.len() {
            let j = (i + 1) % ring.len();
            out.push(Vertex::new(tip, color));
            out.push(Vertex::new(ring[i], color));
            out.push(Vertex::new(ring[j], color));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_twelve_hidden_markers() {
        let m = Markers::default();
        assert_eq!(m.len(), 12);
        assert!(m.iter().all(|m| !m.visible));
        let (_, v) = m.vertices(&Transform::IDENTITY);
        assert!(v.is_empty());
    }

    #[test]
    fn select_activates_exactly_one() {
        let mut m = Markers::default();
        m.select(Some(3));
        assert_eq!(m.selected(), Some(3));
        assert_eq!(m.iter().filter(|m| m.active).count(), 1);
        assert_eq!(m.get(3).map(Marker::color), Some(ColorRgba::red()));

        m.select(Some(99));
        assert_eq!(m.selected(), None);
        assert!(m.iter().all(|m| !m.active));
    }

    #[test]
    fn visible_marker_emits_octahedron() {
        let mut m = Markers::default();
        if let Some(mk) = m.get_mut(0) {
            mk.visible = true;
            mk.position = Vec3::new(1.0, 2.0, 0.0);
        }
        let t = Transform { scale: Vec3::splat(10.0), ..Transform::IDENTITY };
        let (kind, v) = m.vertices(&t);
        assert_eq!(kind, PrimitiveType::Triangles);
        assert_eq!(v.len(), 24);
        assert_eq!(v[0].position, [10.0, 20.0 + MARKER_RADIUS, 0.0]);
    }
}
