//! Packing of the quad corner role and the signed tangent sum into one `f32`.
//!
//! ```text
//! encode: sum == 0  →  role·10000
//!         otherwise →  sign(sum)·(role·10000 + |sum|)
//! decode: role = floor(|v| / 10000 + 0.5)
//!         sum  = fract(|v| / 10000) · 10000 · sign(v)
//! ```
//!
//! Decoding is exact for `|sum| < 5000`. The generated vertex shader performs the
//! same decode; [`unpack_vertex_params`] mirrors it in `f32`.

/// Scale separating the role from the tangent sum.
pub const VERTEX_ROLE_SCALE: f32 = 10000.0;

/// Corner of a segment quad.
///
/// Roles 0 and 1 sit on the segment start, 2 and 3 on its end; even roles are
/// offset along the positive normal, odd ones along the negative normal.
pub type VertexRole = u8;

pub fn pack_vertex_params(role: VertexRole, tangent_sum: f64) -> f32 {
    let base = f64::from(role) * f64::from(VERTEX_ROLE_SCALE);
    if tangent_sum == 0.0 {
        return base as f32;
    }
    (tangent_sum.signum() * (base + tangent_sum.abs())) as f32
}

pub fn unpack_vertex_params(packed: f32) -> (VertexRole, f32) {
    let scaled = packed.abs() / VERTEX_ROLE_SCALE;
    let role = (scaled + 0.5).floor() as VertexRole;
    let sign = if packed == 0.0 { 0.0 } else { packed.signum() };
    let sum = (scaled - scaled.floor()) * VERTEX_ROLE_SCALE * sign;
    (role, sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_role() {
        for role in 0..4u8 {
            for sum in [0.0, 0.25, -0.25, 1.5, -1.5, 12.75, -300.125, 4999.0] {
                let (r, s) = unpack_vertex_params(pack_vertex_params(role, sum));
                assert_eq!(r, role, "role for sum {sum}");
                assert!((f64::from(s) - sum).abs() < 1e-2, "sum {sum} decoded as {s}");
            }
        }
    }

    #[test]
    fn zero_sum_packs_to_bare_role() {
        assert_eq!(pack_vertex_params(0, 0.0), 0.0);
        assert_eq!(pack_vertex_params(3, 0.0), 30000.0);
        assert_eq!(unpack_vertex_params(0.0), (0, 0.0));
    }

    #[test]
    fn negative_sum_keeps_sign() {
        let packed = pack_vertex_params(2, -0.5);
        assert!(packed < 0.0);
        let (role, sum) = unpack_vertex_params(packed);
        assert_eq!(role, 2);
        assert!(sum < 0.0);
    }
}
