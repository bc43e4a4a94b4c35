/// Linear premultiplied RGBA color.
///
/// Invariant:
/// - `rgb` components are expected to be multiplied by `a` (premultiplied alpha).
///
/// Hit-test colors built with [`from_hit_id`](Self::from_hit_id) are the
/// exception: they are opaque and carry an id in their RGB bytes.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32, // premultiplied
    pub g: f32, // premultiplied
    pub b: f32, // premultiplied
    pub a: f32,
}

/// Largest id representable by a hit color (24 bits of RGB).
pub const MAX_HIT_ID: u32 = 0x00FF_FFFF;

impl Color {
    /// Creates a premultiplied color from straight sRGB bytes (`0`–`255`).
    #[inline]
    pub fn from_srgb_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::from_straight(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a as f32 / 255.0)
    }

    /// Creates a premultiplied color from premultiplied components.
    #[inline]
    pub const fn from_premul(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a premultiplied color from straight alpha components.
    #[inline]
    pub fn from_straight(r: f32, g: f32, b: f32, a: f32) -> Self {
        let a = a.clamp(0.0, 1.0);
        Self {
            r: (r.clamp(0.0, 1.0)) * a,
            g: (g.clamp(0.0, 1.0)) * a,
            b: (b.clamp(0.0, 1.0)) * a,
            a,
        }
    }

    /// Returns a straight-alpha representation.
    ///
    /// For `a == 0`, RGB is returned as 0.
    #[inline]
    pub fn to_straight(self) -> (f32, f32, f32, f32) {
        if self.a <= 0.0 {
            (0.0, 0.0, 0.0, 0.0)
        } else {
            let inv = 1.0 / self.a;
            (self.r * inv, self.g * inv, self.b * inv, self.a)
        }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// WGSL `vec4<f32>` literal, usable as a stroke color expression.
    pub fn to_wgsl(self) -> String {
        format!("vec4<f32>({:?}, {:?}, {:?}, {:?})", self.r, self.g, self.b, self.a)
    }

    /// Encodes a feature id into an opaque color for the hit-detection pass.
    ///
    /// Ids above [`MAX_HIT_ID`] wrap; callers keep ids within 24 bits.
    pub fn from_hit_id(id: u32) -> Self {
        debug_assert!(id <= MAX_HIT_ID, "hit id {id} does not fit in 24 bits");
        let [_, r, g, b] = (id & MAX_HIT_ID).to_be_bytes();
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    /// Decodes the id of a color produced by [`from_hit_id`](Self::from_hit_id).
    pub fn hit_id(self) -> u32 {
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        u32::from_be_bytes([0, byte(self.r), byte(self.g), byte(self.b)])
    }

    /// Decodes an id from a pixel read back from an `Rgba8Unorm` hit target.
    /// Transparent pixels hit nothing.
    pub fn hit_id_from_rgba8(px: [u8; 4]) -> Option<u32> {
        if px[3] == 0 {
            return None;
        }
        Some(u32::from_be_bytes([0, px[0], px[1], px[2]]))
    }

    /// Clamps all channels to [0, 1] and enforces premultiplication.
    #[inline]
    pub fn clamped(self) -> Self {
        let a = self.a.clamp(0.0, 1.0);

        // Clamp premultiplied rgb so it cannot exceed alpha.
        let r = self.r.clamp(0.0, a);
        let g = self.g.clamp(0.0, a);
        let b = self.b.clamp(0.0, a);

        Self { r, g, b, a }
    }
}

impl From<Color> for [f32; 4] {
    fn from(c: Color) -> Self {
        c.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_is_premultiplied() {
        let c = Color::from_straight(1.0, 0.5, 0.0, 0.5);
        assert_eq!(c, Color::from_premul(0.5, 0.25, 0.0, 0.5));
        let (r, g, b, a) = c.to_straight();
        assert_eq!((r, g, b, a), (1.0, 0.5, 0.0, 0.5));
    }

    #[test]
    fn hit_ids_survive_color_encoding() {
        for id in [0, 1, 255, 256, 65_535, 1_234_567, MAX_HIT_ID] {
            let c = Color::from_hit_id(id);
            assert_eq!(c.a, 1.0);
            assert_eq!(c.hit_id(), id);
        }
    }

    #[test]
    fn hit_id_from_pixel_bytes() {
        assert_eq!(Color::hit_id_from_rgba8([0x01, 0x02, 0x03, 0xFF]), Some(0x010203));
        assert_eq!(Color::hit_id_from_rgba8([0x00, 0x00, 0x00, 0x00]), None);
    }

    #[test]
    fn wgsl_literal_keeps_decimal_points() {
        let c = Color::from_premul(1.0, 0.0, 0.25, 1.0);
        assert_eq!(c.to_wgsl(), "vec4<f32>(1.0, 0.0, 0.25, 1.0)");
    }

    #[test]
    fn clamped_caps_rgb_at_alpha() {
        let c = Color::from_premul(0.9, 0.1, -0.2, 0.5).clamped();
        assert_eq!(c, Color::from_premul(0.5, 0.1, 0.0, 0.5));
    }
}
