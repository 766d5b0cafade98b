//! Host callbacks invoked by the pipeline.
//!
//! - `TraceOverlay` runs on the GPU thread after the base draw and before
//!   finalize. It draws traces through the frame's `DrawTarget`.
//! - `MarkerOverlay` runs on the presenting thread against the CPU bitmap,
//!   after the frame was copied in and before it is published.

use image::{Rgba, RgbaImage};

use crate::coords::ColorRgba;
use crate::render::{DrawTarget, RenderStates};

pub trait TraceOverlay: Send {
    fn draw_traces(&mut self, target: &mut dyn DrawTarget, states: &RenderStates);
}

impl<F> TraceOverlay for F
where
    F: FnMut(&mut dyn DrawTarget, &RenderStates) + Send,
{
    fn draw_traces(&mut self, target: &mut dyn DrawTarget, states: &RenderStates) {
        self(target, states)
    }
}

pub trait MarkerOverlay {
    fn draw_markers(&mut self, canvas: &mut PixelCanvas<'_>);
}

impl<F> MarkerOverlay for F
where
    F: FnMut(&mut PixelCanvas<'_>),
{
    fn draw_markers(&mut self, canvas: &mut PixelCanvas<'_>) {
        self(canvas)
    }
}

/// Clipped drawing over the back display bitmap.
///
/// Coordinates are device pixels, top-left origin. Writes outside the image
/// are dropped.
pub struct PixelCanvas<'a> {
    image: &'a mut RgbaImage,
    dirty: Option<(u32, u32, u32, u32)>,
}

impl<'a> PixelCanvas<'a> {
    pub fn new(image: &'a mut RgbaImage) -> Self {
        Self { image, dirty: None }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Bounding box `(x0, y0, x1, y1)` (inclusive) of everything written so far.
    #[inline]
    pub fn dirty_rect(&self) -> Option<(u32, u32, u32, u32)> {
        self.dirty
    }

    pub fn pixel(&self, x: i64, y: i64) -> Option<[u8; 4]> {
        let (x, y) = self.index(x, y)?;
        Some(self.image.get_pixel(x, y).0)
    }

    /// Overwrites one pixel.
    pub fn put_pixel(&mut self, x: i64, y: i64, color: ColorRgba) {
        let Some((x, y)) = self.index(x, y) else { return };
        self.image.put_pixel(x, y, Rgba(color.to_rgba8()));
        self.dirty = Some(match self.dirty {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }

    pub fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: ColorRgba) {
        let x_end = x.saturating_add(i64::from(width)).min(i64::from(self.width()));
        let y_end = y.saturating_add(i64::from(height)).min(i64::from(self.height()));
        for py in y.max(0)..y_end {
            for px in x.max(0)..x_end {
                self.put_pixel(px, py, color);
            }
        }
    }

    /// Bresenham line, both endpoints included.
    pub fn draw_line(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: ColorRgba) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y) = (x0, y0);
        let mut err = dx + dy;
        loop {
            self.put_pixel(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Plus-shaped marker of half-size `radius` centered on `(x, y)`.
    pub fn cross(&mut self, x: i64, y: i64, radius: u32, color: ColorRgba) {
        let r = i64::from(radius);
        self.draw_line(x - r, y, x + r, y, color);
        self.draw_line(x, y - r, x, y + r, color);
    }

    fn index(&self, x: i64, y: i64) -> Option<(u32, u32)> {
        let x = u32::try_from(x).ok()?;
        let y = u32::try_from(y).ok()?;
        (x < self.width() && y < self.height()).then_some((x, y))
    }
}
