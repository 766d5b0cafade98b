/// Render target size in device pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Enforces a minimum edge length on both sides.
    #[inline]
    pub fn at_least(self, min_edge: u32) -> Self {
        Self::new(self.width.max(min_edge), self.height.max(min_edge))
    }

    /// Size of a tightly packed RGBA8 frame.
    #[inline]
    pub fn byte_len(self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    #[inline]
    pub fn aspect(self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}
