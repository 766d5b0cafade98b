//! Chart grid geometry.
//!
//! The grid owns three rectangles: the window rectangle handed in by the host,
//! the grid rectangle (window inset by the border) that axis ranges map onto,
//! and the client rectangle used by overlays. In 3D the grid is a box whose
//! depth spans `GRID_Z_MIN..GRID_Z_MAX`.

use crate::camera::OrbitCamera;
use crate::coords::{ColorRgba, Rect};
use crate::vertex::{PrimitiveType, Vertex};

/// Near face of the 3D grid box, in transformed units.
pub const GRID_Z_MIN: f64 = -200.0;
/// Far face of the 3D grid box, in transformed units.
pub const GRID_Z_MAX: f64 = 200.0;

/// Border between the window edge and the grid rectangle, in pixels.
pub const GRID_BORDER: f64 = 1.0;

/// Number of divisions along each axis.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Divisions {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl Default for Divisions {
    fn default() -> Self {
        Self { x: 10, y: 10, z: 0 }
    }
}

/// Which faces of the 3D grid box carry the back grid planes.
///
/// Each flag selects the positive face on its axis (`top`: +Y, `front`: +Z,
/// `right`: +X); otherwise the negative face is used.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct PlaneVisibility {
    pub top: bool,
    pub front: bool,
    pub right: bool,
}

impl PlaneVisibility {
    /// Picks the faces behind the data as seen from the camera.
    pub fn from_camera(camera: &OrbitCamera) -> Self {
        let az = camera.azimuth();
        Self {
            top: camera.elevation() < 0.0,
            front: !(-90.0..90.0).contains(&az),
            right: az < 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridShape {
    window: Rect,
    grid: Rect,
    client: Rect,
    pub divisions: Divisions,
    /// Draw division lines; `false` draws the border only.
    pub show_lines: bool,
    pub line_color: ColorRgba,
    pub planes: PlaneVisibility,
}

impl Default for GridShape {
    fn default() -> Self {
        Self {
            window: Rect::default(),
            grid: Rect::default(),
            client: Rect::default(),
            divisions: Divisions::default(),
            show_lines: true,
            line_color: ColorRgba::from_u8(96, 96, 96, 255),
            planes: PlaneVisibility::default(),
        }
    }
}

impl GridShape {
    #[inline]
    pub fn window_rect(&self) -> Rect {
        self.window
    }

    /// Rectangle that axis ranges are mapped onto.
    #[inline]
    pub fn grid_rect(&self) -> Rect {
        self.grid
    }

    #[inline]
    pub fn client_rect(&self) -> Rect {
        self.client
    }

    /// Sets the window rectangle and derives the grid and client rectangles.
    ///
    /// Returns `true` if the grid rectangle changed, in which case the caller
    /// must recompute the transform.
    pub fn set_window_rect(&mut self, window: Rect) -> bool {
        let window = window.normalized();
        if window == self.window {
            return false;
        }
        self.window = window;
        let inner = window.inset(GRID_BORDER);
        let grid = Rect::from_size(inner.width, inner.height);
        self.client = inner;
        let changed = grid != self.grid;
        self.grid = grid;
        changed
    }

    pub fn update_planes(&mut self, camera: &OrbitCamera) {
        self.planes = PlaneVisibility::from_camera(camera);
    }

    /// Line-list vertices for the 2D grid in grid-rect pixel space.
    ///
    /// The border is always emitted; interior division lines only when
    /// `show_lines` is set.
    pub fn line_vertices(&self) -> (PrimitiveType, Vec<Vertex>) {
        let Rect { width: w, height: h, .. } = self.grid;
        let color = self.line_color.to_array();
        let mut out = Vec::new();
        let mut seg = |x0: f64, y0: f64, x1: f64, y1: f64| {
            out.push(Vertex::new([x0 as f32, y0 as f32, 0.0], color));
            out.push(Vertex::new([x1 as f32, y1 as f32, 0.0], color));
        };

        seg(0.0, 0.0, w, 0.0);
        seg(w, 0.0, w, h);
        seg(w, h, 0.0, h);
        seg(0.0, h, 0.0, 0.0);

        if self.show_lines {
            for i in 1..self.divisions.x {
                let x = w * f64::from(i) / f64::from(self.divisions.x);
                seg(x, 0.0, x, h);
            }
            for i in 1..self.divisions.y {
                let y = h * f64::from(i) / f64::from(self.divisions.y);
                seg(0.0, y, w, y);
            }
        }

        (PrimitiveType::Lines, out)
    }

    /// Line-list vertices for the 3D grid box, centered on the origin.
    ///
    /// Coordinates are in transformed units: the box spans the grid rect
    /// extent on X/Y and `GRID_Z_MIN..GRID_Z_MAX` on Z. The twelve box edges
    /// are always emitted. With `show_lines`, interior division lines are
    /// added on the three back planes selected by `planes`; Z divisions only
    /// when `divisions.z > 0`.
    pub fn box_vertices(&self) -> (PrimitiveType, Vec<Vertex>) {
        let hx = (self.grid.width / 2.0) as f32;
        let hy = (self.grid.height / 2.0) as f32;
        let (z0, z1) = (GRID_Z_MIN as f32, GRID_Z_MAX as f32);
        let color = self.line_color.to_array();

        let corners = [
            [-hx, -hy, z0],
            [hx, -hy, z0],
            [hx, hy, z0],
            [-hx, hy, z0],
            [-hx, -hy, z1],
            [hx, -hy, z1],
            [hx, hy, z1],
            [-hx, hy, z1],
        ];
        const EDGES: [(usize, usize); 12] = [
            (0, 1), (1, 2), (2, 3), (3, 0),
            (4, 5), (5, 6), (6, 7), (7, 4),
            (0, 4), (1, 5), (2, 6), (3, 7),
        ];

        let mut out = Vec::with_capacity(EDGES.len() * 2);
        for (a, b) in EDGES {
            out.push(Vertex::new(corners[a], color));
            out.push(Vertex::new(corners[b], color));
        }
        if !self.show_lines {
            return (PrimitiveType::Lines, out);
        }

        let xp = if self.planes.right { hx } else { -hx };
        let yp = if self.planes.top { hy } else { -hy };
        let zp = if self.planes.front { z1 } else { z0 };
        let Divisions { x: dx, y: dy, z: dz } = self.divisions;
        let mut seg = |a: [f32; 3], b: [f32; 3]| {
            out.push(Vertex::new(a, color));
            out.push(Vertex::new(b, color));
        };

        for x in interior(-hx, hx, dx) {
            seg([x, -hy, zp], [x, hy, zp]);
            seg([x, yp, z0], [x, yp, z1]);
        }
        for y in interior(-hy, hy, dy) {
            seg([-hx, y, zp], [hx, y, zp]);
            seg([xp, y, z0], [xp, y, z1]);
        }
        if dz > 0 {
            for z in interior(z0, z1, dz) {
                seg([-hx, yp, z], [hx, yp, z]);
                seg([xp, -hy, z], [xp, hy, z]);
            }
        }
        (PrimitiveType::Lines, out)
    }
}

/// Positions of the `n - 1` interior division lines between `lo` and `hi`.
fn interior(lo: f32, hi: f32, n: u32) -> impl Iterator<Item = f32> {
    let step = if n > 0 { (hi - lo) / n as f32 } else { 0.0 };
    (1..n).map(move |i| lo + step * i as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_rect_is_window_inset_by_border() {
        let mut g = GridShape::default();
        assert!(g.set_window_rect(Rect::from_size(800.0, 600.0)));
        assert_eq!(g.grid_rect(), Rect::from_size(798.0, 598.0));
        assert_eq!(g.client_rect(), Rect::new(1.0, 1.0, 798.0, 598.0));
    }

    #[test]
    fn same_window_reports_unchanged() {
        let mut g = GridShape::default();
        g.set_window_rect(Rect::from_size(100.0, 100.0));
        assert!(!g.set_window_rect(Rect::from_size(100.0, 100.0)));
    }

    #[test]
    fn moving_window_keeps_grid_size() {
        let mut g = GridShape::default();
        g.set_window_rect(Rect::from_size(100.0, 100.0));
        assert!(!g.set_window_rect(Rect::new(20.0, 20.0, 100.0, 100.0)));
        assert_eq!(g.client_rect(), Rect::new(21.0, 21.0, 98.0, 98.0));
    }

    #[test]
    fn border_only_without_lines() {
        let mut g = GridShape::default();
        g.set_window_rect(Rect::from_size(50.0, 50.0));
        g.show_lines = false;
        let (kind, v) = g.line_vertices();
        assert_eq!(kind, PrimitiveType::Lines);
        assert_eq!(v.len(), 8);
    }

    #[test]
    fn division_lines_are_interior() {
        let mut g = GridShape::default();
        g.set_window_rect(Rect::from_size(102.0, 102.0));
        let (_, v) = g.line_vertices();
        // border (4) + 9 vertical + 9 horizontal, two vertices each
        assert_eq!(v.len(), (4 + 9 + 9) * 2);
        assert_eq!(v[8].position[0], 10.0);
    }

    #[test]
    fn box_has_twelve_edges() {
        let mut g = GridShape::default();
        g.set_window_rect(Rect::from_size(202.0, 102.0));
        g.show_lines = false;
        let (_, v) = g.box_vertices();
        assert_eq!(v.len(), 24);
        assert!(v.iter().all(|p| p.position[2] == -200.0 || p.position[2] == 200.0));
    }

    // ── 3D division planes ────────────────────────────────────────────────

    fn plane_lines(g: &GridShape) -> Vec<Vertex> {
        g.box_vertices().1.split_off(24)
    }

    #[test]
    fn box_lines_without_z_divisions() {
        let mut g = GridShape::default();
        g.set_window_rect(Rect::from_size(202.0, 102.0));
        // 9 X lines on two planes, 9 Y lines on two planes
        assert_eq!(plane_lines(&g).len(), (9 * 2 + 9 * 2) * 2);
    }

    #[test]
    fn z_divisions_add_depth_lines() {
        let mut g = GridShape::default();
        g.set_window_rect(Rect::from_size(202.0, 102.0));
        g.divisions.z = 4;
        let lines = plane_lines(&g);
        assert_eq!(lines.len(), (9 * 2 + 9 * 2 + 3 * 2) * 2);
        assert!(lines.iter().any(|v| v.position[2] == -100.0));
        assert!(lines.iter().any(|v| v.position[2] == 100.0));
    }

    #[test]
    fn planes_pick_the_back_faces() {
        let mut g = GridShape::default();
        g.set_window_rect(Rect::from_size(202.0, 102.0));
        g.divisions = Divisions { x: 2, y: 2, z: 0 };

        // X line at x = 0: first segment on the XY plane, second on the floor.
        let lines = plane_lines(&g);
        assert_eq!(lines[0].position, [0.0, -50.0, -200.0]);
        assert_eq!(lines[2].position, [0.0, -50.0, -200.0]);
        assert_eq!(lines[3].position, [0.0, -50.0, 200.0]);

        g.planes = PlaneVisibility { top: true, front: true, right: true };
        let lines = plane_lines(&g);
        assert_eq!(lines[0].position, [0.0, -50.0, 200.0]);
        assert_eq!(lines[2].position, [0.0, 50.0, -200.0]);
        // Y line at y = 0 on the YZ plane sits at +X.
        assert_eq!(lines[6].position, [100.0, 0.0, -200.0]);
    }

    #[test]
    fn update_planes_reads_camera() {
        let mut g = GridShape::default();
        let mut cam = OrbitCamera::default();
        cam.set_azimuth(135.0);
        g.update_planes(&cam);
        assert!(g.planes.front);
        assert!(!g.planes.right);
    }

    #[test]
    fn planes_follow_camera() {
        let mut cam = OrbitCamera::default();
        cam.set_azimuth(-30.0);
        cam.set_elevation(-20.0);
        let p = PlaneVisibility::from_camera(&cam);
        assert!(p.top);
        assert!(p.right);
        assert!(!p.front);
    }
}
