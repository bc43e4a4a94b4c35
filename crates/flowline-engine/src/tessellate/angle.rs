//! Join-angle math shared by the tessellator and the generated shaders.
//!
//! ```text
//!   pB (before)                          pA (after)
//!    X             negative             X
//!     \             offset             /
//!      \                              /
//!       \   join              join   /
//!        \ angle 0          angle 1 /
//!         \←---                ←---/      positive
//!          \   ←--          ←--   /        offset
//!           \     ↑       ↓      /
//!            X────┴───────┴─────X
//!            p0                  p1
//! ```

use std::f64::consts::{PI, TAU};

use crate::coords::Vec2;

/// Joins whose angle cosine is above this value are near-hairpin turns (angle
/// close to 0 or 2π): they get no join offset and add nothing to the tangent sum.
///
/// Used by the tessellator for the tangent sum and interpolated into the
/// generated WGSL for the join offsets; both must agree.
pub const LINE_ANGLE_COSINE_CUTOFF: f64 = 0.985;

/// Marker stored in place of a join angle when the segment end is a cap.
pub const CAP_ANGLE: f32 = -1.0;

/// Angle at `p0` from the direction `p0→pa` to the direction `p0→pb`, in `[0, 2π)`.
///
/// The winding is resolved with a cross-product test so the same geometry gives
/// the same angle whichever way the line is walked. A zero-length leg has no
/// direction and yields `0`, which falls above the cosine cutoff and so
/// contributes nothing.
pub fn join_angle(p0: Vec2, pa: Vec2, pb: Vec2) -> f64 {
    let (Some(tangent_a), Some(tangent_b)) = ((pa - p0).try_normalize(), (pb - p0).try_normalize())
    else {
        return 0.0;
    };

    let angle = tangent_b.dot(tangent_a).clamp(-1.0, 1.0).acos();
    let clockwise = tangent_b.dot(tangent_a.perp()) > 0.0;
    let angle = if clockwise { angle } else { TAU - angle };

    if angle >= TAU { 0.0 } else { angle }
}

/// Whether a join is far enough from a hairpin for its half-angle tangent to be stable.
#[inline]
pub fn has_stable_join(angle: f64) -> bool {
    angle.cos() <= LINE_ANGLE_COSINE_CUTOFF
}

/// Tangent-sum contribution of a join at a segment start.
#[inline]
pub fn start_join_tangent(angle: f64) -> f64 {
    if has_stable_join(angle) { ((angle - PI) / 2.0).tan() } else { 0.0 }
}

/// Tangent-sum contribution of a join at a segment end.
#[inline]
pub fn end_join_tangent(angle: f64) -> f64 {
    if has_stable_join(angle) { ((PI - angle) / 2.0).tan() } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64) -> Vec2 {
        Vec2::new(x, y)
    }

    #[test]
    fn straight_line_is_pi() {
        let a = join_angle(v(10.0, 0.0), v(0.0, 0.0), v(20.0, 0.0));
        assert!((a - PI).abs() < 1e-12);
        assert_eq!(start_join_tangent(a), 0.0);
        assert_eq!(end_join_tangent(a), 0.0);
    }

    #[test]
    fn right_angle_resolves_winding() {
        // p0 at origin, next along +x, previous along +y or -y
        let up = join_angle(v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0));
        let down = join_angle(v(0.0, 0.0), v(1.0, 0.0), v(0.0, -1.0));
        assert!((up - PI / 2.0).abs() < 1e-12);
        assert!((down - 3.0 * PI / 2.0).abs() < 1e-12);
        // mirrored turns contribute opposite tangents
        assert!((start_join_tangent(up) + 1.0).abs() < 1e-12);
        assert!((start_join_tangent(up) + start_join_tangent(down)).abs() < 1e-12);
    }

    #[test]
    fn degenerate_leg_adds_nothing() {
        let a = join_angle(v(1.0, 1.0), v(1.0, 1.0), v(5.0, 0.0));
        assert_eq!(a, 0.0);
        assert!(!has_stable_join(a));
        assert_eq!(start_join_tangent(a), 0.0);
    }

    #[test]
    fn folded_back_stays_in_range() {
        let a = join_angle(v(0.0, 0.0), v(1.0, 0.0), v(2.0, 0.0));
        assert!((0.0..TAU).contains(&a));
        assert!(!has_stable_join(a));
    }
}
