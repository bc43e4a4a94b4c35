use super::Vec2;

/// 2D affine transform stored as `[a, b, c, d, e, f]`.
///
/// Applying it maps `(x, y)` to:
///
/// ```text
/// x' = a·x + c·y + e
/// y' = b·x + d·y + f
/// ```
///
/// This is the layout used by the instruction encoder (world → local) and by
/// tessellation jobs (local → world, the inverse).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Affine2(pub [f64; 6]);

impl Affine2 {
    pub const IDENTITY: Affine2 = Affine2([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    #[inline]
    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self([a, b, c, d, e, f])
    }

    #[inline]
    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    #[inline]
    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self([sx, 0.0, 0.0, sy, 0.0, 0.0])
    }

    pub fn rotation(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self([c, s, -s, c, 0.0, 0.0])
    }

    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }

    #[inline]
    pub fn apply_vec(&self, p: Vec2) -> Vec2 {
        let (x, y) = self.apply(p.x, p.y);
        Vec2::new(x, y)
    }

    #[inline]
    pub fn determinant(&self) -> f64 {
        let [a, b, c, d, _, _] = self.0;
        a * d - b * c
    }

    /// Returns the inverse transform, or `None` when the matrix is singular.
    pub fn invert(&self) -> Option<Affine2> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let [a, b, c, d, e, f] = self.0;
        Some(Affine2([
            d / det,
            -b / det,
            -c / det,
            a / det,
            (c * f - d * e) / det,
            -(a * f - b * e) / det,
        ]))
    }

    /// Composition `self ∘ rhs`: applies `rhs` first, then `self`.
    pub fn then_after(&self, rhs: &Affine2) -> Affine2 {
        let [a1, b1, c1, d1, e1, f1] = self.0;
        let [a2, b2, c2, d2, e2, f2] = rhs.0;
        Affine2([
            a1 * a2 + c1 * b2,
            b1 * a2 + d1 * b2,
            a1 * c2 + c1 * d2,
            b1 * c2 + d1 * d2,
            a1 * e2 + c1 * f2 + e1,
            b1 * e2 + d1 * f2 + f1,
        ])
    }

    /// Column-major 4×4 matrix for a WGSL `mat4x4<f32>` uniform.
    pub fn to_mat4(&self) -> [[f32; 4]; 4] {
        let [a, b, c, d, e, f] = self.0.map(|v| v as f32);
        [
            [a, b, 0.0, 0.0],
            [c, d, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [e, f, 0.0, 1.0],
        ]
    }
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}
