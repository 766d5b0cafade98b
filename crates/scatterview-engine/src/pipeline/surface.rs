use std::sync::Arc;

use image::RgbaImage;

use crate::coords::Viewport;

/// Double-buffered CPU bitmap.
///
/// Present writes into the back buffer; `publish` swaps it to the front in
/// one step. Readers clone the front `Arc` and never see a partial frame.
#[derive(Debug)]
pub struct DisplaySurface {
    front: Arc<RgbaImage>,
    back: RgbaImage,
}

impl DisplaySurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            front: Arc::new(RgbaImage::new(viewport.width, viewport.height)),
            back: RgbaImage::new(viewport.width, viewport.height),
        }
    }

    /// Size of the next frame to be published.
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.back.width(), self.back.height())
    }

    /// The last published frame.
    #[inline]
    pub fn front(&self) -> Arc<RgbaImage> {
        Arc::clone(&self.front)
    }

    /// Recreates the back buffer. The front keeps showing the old frame
    /// until the next publish, except for the unsized front of a surface
    /// that was created before the first resize.
    pub fn resize(&mut self, viewport: Viewport) {
        if self.viewport() == viewport {
            return;
        }
        self.back = RgbaImage::new(viewport.width, viewport.height);
        let (w, h) = self.front.dimensions();
        if w == 0 || h == 0 {
            self.front = Arc::new(RgbaImage::new(viewport.width, viewport.height));
        }
    }

    #[inline]
    pub(crate) fn back_mut(&mut self) -> &mut RgbaImage {
        &mut self.back
    }

    /// Copies a tightly packed RGBA8 frame into the back buffer.
    ///
    /// With `flip_rows` the source is taken as bottom row first. Returns
    /// `false` (copying nothing) if the length does not match.
    pub fn copy_in(&mut self, pixels: &[u8], flip_rows: bool) -> bool {
        let dst: &mut [u8] = &mut self.back;
        if pixels.len() != dst.len() {
            log::warn!(
                "frame size mismatch: got {} bytes, back buffer holds {}",
                pixels.len(),
                dst.len()
            );
            return false;
        }
        if !flip_rows {
            dst.copy_from_slice(pixels);
            return true;
        }
        let row = self.back.width() as usize * 4;
        if row == 0 {
            return true;
        }
        let dst: &mut [u8] = &mut self.back;
        for (dst_row, src_row) in dst.chunks_exact_mut(row).zip(pixels.chunks_exact(row).rev()) {
            dst_row.copy_from_slice(src_row);
        }
        true
    }

    /// Swaps back to front.
    pub fn publish(&mut self) {
        let (w, h) = self.back.dimensions();
        let next = Arc::new(std::mem::replace(&mut self.back, RgbaImage::new(0, 0)));
        let previous = std::mem::replace(&mut self.front, next);
        // Reuse the old front's allocation unless a reader still holds it.
        self.back = match Arc::try_unwrap(previous) {
            Ok(img) if img.dimensions() == (w, h) => img,
            _ => RgbaImage::new(w, h),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(w: u32, h: u32) -> Vec<u8> {
        (0..h).flat_map(|y| std::iter::repeat_n(y as u8, w as usize * 4)).collect()
    }

    #[test]
    fn copy_and_publish() {
        let mut s = DisplaySurface::new(Viewport::new(2, 3));
        assert!(s.copy_in(&rows(2, 3), false));
        s.publish();
        let front = s.front();
        assert_eq!(front.get_pixel(0, 0).0, [0; 4]);
        assert_eq!(front.get_pixel(1, 2).0, [2; 4]);
    }

    #[test]
    fn flip_reverses_rows_once() {
        let mut s = DisplaySurface::new(Viewport::new(2, 3));
        assert!(s.copy_in(&rows(2, 3), true));
        s.publish();
        let front = s.front();
        assert_eq!(front.get_pixel(0, 0).0, [2; 4]);
        assert_eq!(front.get_pixel(0, 2).0, [0; 4]);
    }

    #[test]
    fn wrong_length_is_rejected() {
        let mut s = DisplaySurface::new(Viewport::new(2, 2));
        assert!(!s.copy_in(&[0; 4], false));
    }

    #[test]
    fn held_front_is_not_overwritten() {
        let mut s = DisplaySurface::new(Viewport::new(1, 1));
        assert!(s.copy_in(&[1, 1, 1, 1], false));
        s.publish();
        let held = s.front();

        assert!(s.copy_in(&[9, 9, 9, 9], false));
        s.publish();
        assert_eq!(held.get_pixel(0, 0).0, [1; 4]);
        assert_eq!(s.front().get_pixel(0, 0).0, [9; 4]);
    }

    #[test]
    fn unsized_front_is_sized_by_first_resize() {
        let mut s = DisplaySurface::new(Viewport::new(0, 0));
        s.resize(Viewport::new(10, 10));
        assert_eq!(s.front().dimensions(), (10, 10));
        assert_eq!(s.viewport(), Viewport::new(10, 10));

        // Once sized, the front waits for a publish like any other frame.
        let blank = s.front();
        s.resize(Viewport::new(20, 20));
        assert!(Arc::ptr_eq(&blank, &s.front()));
        assert_eq!(s.viewport(), Viewport::new(20, 20));
    }

    #[test]
    fn resize_keeps_front_until_publish() {
        let mut s = DisplaySurface::new(Viewport::new(4, 4));
        s.resize(Viewport::new(8, 2));
        assert_eq!(s.viewport(), Viewport::new(8, 2));
        assert_eq!(s.front().dimensions(), (4, 4));
        s.publish();
        assert_eq!(s.front().dimensions(), (8, 2));
    }
}
