/// Viewport size in CSS/logical pixels.
///
/// The generated vertex shader maps clip space to this pixel basis so that stroke
/// widths, offsets and the anti-aliasing margin are expressed in pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Size as a `[w, h]` pair, clamped to at least one pixel.
    #[inline]
    pub fn size_px(self) -> [f32; 2] {
        [self.width.max(1.0), self.height.max(1.0)]
    }
}
