//! Scalar helpers.
//!
//! `lerpsat` is the primitive every camera blend is built on.

/// Tolerance used by approximate comparisons and degenerate-input checks.
pub const EPSILON: f32 = 1e-6;

/// Clamps `v` into `[lo, hi]`.
///
/// Unlike `f32::clamp` this never panics on an inverted range; `hi` wins.
#[inline]
pub fn clamp(v: f32, lo: f32, hi: f32) -> f32 {
    if v > hi {
        hi
    } else if v < lo {
        lo
    } else {
        v
    }
}

/// Clamps `v` into `[0, 1]`.
#[inline]
pub fn sat(v: f32) -> f32 {
    clamp(v, 0.0, 1.0)
}

/// Linear interpolation. `t == 1` returns `b` exactly.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Linear interpolation with `t` saturated to `[0, 1]` first.
#[inline]
pub fn lerpsat(a: f32, b: f32, t: f32) -> f32 {
    lerp(a, b, sat(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sat_clamps_both_ends() {
        assert_eq!(sat(-0.5), 0.0);
        assert_eq!(sat(0.25), 0.25);
        assert_eq!(sat(7.0), 1.0);
    }

    #[test]
    fn lerp_hits_endpoints_exactly() {
        assert_eq!(lerp(3.0, 10.0, 0.0), 3.0);
        assert_eq!(lerp(3.0, 10.0, 1.0), 10.0);
        assert_eq!(lerp(-0.1, 0.3, 1.0), 0.3);
    }

    #[test]
    fn lerpsat_is_idempotent_under_clamp() {
        for &t in &[-10.0_f32, -1.0, -0.001, 1.001, 2.0, 1e6] {
            let clamped = t.clamp(0.0, 1.0);
            assert_eq!(lerpsat(2.0, 5.0, t), lerpsat(2.0, 5.0, clamped));
        }
    }

    #[test]
    fn clamp_prefers_upper_bound_on_inverted_range() {
        assert_eq!(clamp(5.0, 2.0, 1.0), 1.0);
    }
}
