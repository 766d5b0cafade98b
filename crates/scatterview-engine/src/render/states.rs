use glam::{Mat4, Vec3};

use crate::coords::Viewport;
use crate::grid::{GRID_Z_MAX, GRID_Z_MIN};
use crate::pipeline::FrameState;

/// Share of clip space the largest grid-box extent occupies in 3D.
///
/// Leaves room for the box corners when rotated.
const FIT_3D: f32 = 1.2;

/// Per-draw state handed to `DrawTarget::draw_vertices`.
///
/// `transform` maps vertex positions straight to wgpu clip space
/// (x/y in `[-1, 1]`, z in `[0, 1]`).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderStates {
    pub transform: Mat4,
    pub viewport: Viewport,
    pub is_3d: bool,
}

impl Default for RenderStates {
    fn default() -> Self {
        Self { transform: Mat4::IDENTITY, viewport: Viewport::default(), is_3d: false }
    }
}

impl RenderStates {
    /// Grid space to clip space.
    ///
    /// 2D grid space is pixels relative to the grid rectangle's bottom-left
    /// corner with +Y up. 3D grid space is the box centered on the origin
    /// that `GridShape::box_vertices` describes.
    pub fn grid_space(frame: &FrameState) -> Self {
        let transform = if frame.is_3d { grid_to_clip_3d(frame) } else { grid_to_clip_2d(frame) };
        Self { transform, viewport: frame.viewport, is_3d: frame.is_3d }
    }

    /// Data space to clip space: `grid_space` combined with the chart transform.
    pub fn data_space(frame: &FrameState) -> Self {
        Self::grid_space(frame).then(frame.transform.matrix())
    }

    /// Pixel space matching the frame's row order.
    ///
    /// Same as `pixel_space` for 2D; mirrored vertically for 3D frames so
    /// that pixel overlays line up once present flips the rows back.
    pub fn overlay_space(frame: &FrameState) -> Self {
        let states = Self::pixel_space(frame.viewport);
        if frame.is_3d {
            Self { transform: flip_y() * states.transform, is_3d: true, ..states }
        } else {
            states
        }
    }

    /// 3D grid box to clip space as it appears on screen, without the
    /// bottom-up row flip. Used to place axis labels.
    pub fn label_projection(frame: &FrameState) -> Mat4 {
        box_to_clip(frame)
    }

    /// Device pixels (top-left origin, +Y down) to clip space.
    pub fn pixel_space(viewport: Viewport) -> Self {
        let (w, h) = extent(viewport);
        let transform = Mat4::from_translation(Vec3::new(-1.0, 1.0, 0.5))
            * Mat4::from_scale(Vec3::new(2.0 / w, -2.0 / h, 0.0));
        Self { transform, viewport, is_3d: false }
    }

    /// Applies `model` before the current transform.
    #[must_use]
    pub fn then(self, model: Mat4) -> Self {
        Self { transform: self.transform * model, ..self }
    }
}

fn extent(viewport: Viewport) -> (f32, f32) {
    (viewport.width.max(1) as f32, viewport.height.max(1) as f32)
}

fn grid_to_clip_2d(frame: &FrameState) -> Mat4 {
    let (w, h) = extent(frame.viewport);
    let client = frame.grid.client_rect();
    let gx = client.x as f32;
    let gy = client.y as f32;
    let gh = frame.grid.grid_rect().height as f32;

    Mat4::from_translation(Vec3::new(-1.0 + 2.0 * gx / w, 1.0 - 2.0 * (gy + gh) / h, 0.5))
        * Mat4::from_scale(Vec3::new(2.0 / w, 2.0 / h, 0.0))
}

fn flip_y() -> Mat4 {
    Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0))
}

/// 3D frames are rendered bottom-up (GL row order); present flips them back.
fn grid_to_clip_3d(frame: &FrameState) -> Mat4 {
    flip_y() * box_to_clip(frame)
}

fn box_to_clip(frame: &FrameState) -> Mat4 {
    let grid = frame.grid.grid_rect();
    let depth = (GRID_Z_MAX - GRID_Z_MIN) as f32;
    let largest = (grid.width as f32).max(grid.height as f32).max(depth).max(1.0);
    let fit = FIT_3D / largest;

    let camera = &frame.camera;
    camera.projection_matrix(frame.viewport.aspect())
        * camera.view_matrix()
        * Mat4::from_scale(Vec3::splat(fit))
}
