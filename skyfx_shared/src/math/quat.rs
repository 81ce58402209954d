//! Quaternions.

use std::ops::Mul;

use serde::{Deserialize, Serialize};

use super::vector::{Vec3, Vec4};

/// Above this cosine `slerp` falls back to normalized linear blending.
const SLERP_LINEAR_THRESHOLD: f32 = 0.9995;

/// Rotation quaternion `(x, y, z, w)`.
///
/// Unit length is not enforced by the type; call [`Quat::normalize`] after
/// composing orientations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians about `axis` (expected unit length).
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    /// Yaw about `+Y`, pitch about `+X`, roll about `+Z`.
    ///
    /// The result equals `yaw * pitch * roll`: roll is applied first, yaw
    /// last.
    pub fn from_yaw_pitch_roll(yaw: f32, pitch: f32, roll: f32) -> Self {
        let (sy, cy) = (yaw * 0.5).sin_cos();
        let (sp, cp) = (pitch * 0.5).sin_cos();
        let (sr, cr) = (roll * 0.5).sin_cos();
        Self::new(
            cy * sp * cr + sy * cp * sr,
            sy * cp * cr - cy * sp * sr,
            cy * cp * sr - sy * sp * cr,
            cy * cp * cr + sy * sp * sr,
        )
    }

    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z + self.w * rhs.w
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Scales to unit length. A zero quaternion yields NaN.
    pub fn normalize(self) -> Self {
        let inv = 1.0 / self.len();
        Self::new(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
    }

    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Rotates `v` by this (unit) quaternion.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let t = u.cross(v) * 2.0;
        v + t * self.w + u.cross(t)
    }

    /// Spherical interpolation along the shortest arc.
    pub fn slerp(self, to: Self, t: f32) -> Self {
        let mut to = to;
        let mut cos = self.dot(to);
        if cos < 0.0 {
            to = Self::new(-to.x, -to.y, -to.z, -to.w);
            cos = -cos;
        }

        if cos > SLERP_LINEAR_THRESHOLD {
            let blended = Vec4::from(self).lerp(Vec4::from(to), t);
            return Self::from(blended).normalize();
        }

        let theta = cos.acos();
        let sin = theta.sin();
        let wa = ((1.0 - t) * theta).sin() / sin;
        let wb = (t * theta).sin() / sin;
        Self::new(
            self.x * wa + to.x * wb,
            self.y * wa + to.y * wb,
            self.z * wa + to.z * wb,
            self.w * wa + to.w * wb,
        )
    }

    pub fn approx_eq(self, rhs: Self, eps: f32) -> bool {
        Vec4::from(self).approx_eq(Vec4::from(rhs), eps)
    }
}

/// Hamilton product. Not commutative.
impl Mul for Quat {
    type Output = Self;

    fn mul(self, b: Self) -> Self {
        let a = self;
        Self::new(
            a.w * b.x + b.w * a.x + (a.y * b.z - a.z * b.y),
            a.w * b.y + b.w * a.y + (a.z * b.x - a.x * b.z),
            a.w * b.z + b.w * a.z + (a.x * b.y - a.y * b.x),
            a.w * b.w - (a.x * b.x + a.y * b.y + a.z * b.z),
        )
    }
}

impl From<Vec4> for Quat {
    fn from(v: Vec4) -> Self {
        Self::new(v.x, v.y, v.z, v.w)
    }
}

impl From<Quat> for Vec4 {
    fn from(q: Quat) -> Self {
        Vec4::new(q.x, q.y, q.z, q.w)
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    #[test]
    fn yaw_pitch_roll_is_product_of_single_axes() {
        let (y, p, r) = (0.7, -0.3, 1.1);
        let composed = Quat::from_yaw_pitch_roll(y, 0.0, 0.0)
            * Quat::from_yaw_pitch_roll(0.0, p, 0.0)
            * Quat::from_yaw_pitch_roll(0.0, 0.0, r);
        assert!(composed.approx_eq(Quat::from_yaw_pitch_roll(y, p, r), 1e-6));
    }

    #[test]
    fn yaw_then_pitch_stays_unit_length() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let yaw: f32 = rng.gen_range(-100.0..100.0);
            let pitch: f32 = rng.gen_range(-100.0..100.0);
            let q = (Quat::from_yaw_pitch_roll(yaw, 0.0, 0.0)
                * Quat::from_yaw_pitch_roll(0.0, pitch, 0.0))
            .normalize();
            assert!((q.len() - 1.0).abs() < 1e-5, "yaw={yaw} pitch={pitch}");
        }
    }

    #[test]
    fn multiplication_order_matters() {
        let a = Quat::from_yaw_pitch_roll(0.9, 0.0, 0.0);
        let b = Quat::from_yaw_pitch_roll(0.0, 0.4, 0.0);
        assert!(!(a * b).approx_eq(b * a, 1e-4));
    }

    #[test]
    fn rotate_yaw_quarter_turn() {
        let q = Quat::from_yaw_pitch_roll(std::f32::consts::FRAC_PI_2, 0.0, 0.0);
        let v = q.rotate(-Vec3::Z);
        assert!(v.approx_eq(-Vec3::X, 1e-6), "{v:?}");
    }

    #[test]
    fn slerp_endpoints_and_midpoint() {
        let a = Quat::IDENTITY;
        let b = Quat::from_axis_angle(Vec3::Y, 1.0);
        assert!(a.slerp(b, 0.0).approx_eq(a, 1e-6));
        assert!(a.slerp(b, 1.0).approx_eq(b, 1e-6));
        let mid = a.slerp(b, 0.5);
        assert!(mid.approx_eq(Quat::from_axis_angle(Vec3::Y, 0.5), 1e-6));
    }

    #[test]
    fn slerp_takes_shortest_path() {
        let a = Quat::IDENTITY;
        let b = Quat::from_axis_angle(Vec3::Y, 0.5);
        let neg_b = Quat::new(-b.x, -b.y, -b.z, -b.w);
        let mid = a.slerp(neg_b, 0.5);
        assert!(mid.approx_eq(Quat::from_axis_angle(Vec3::Y, 0.25), 1e-6));
    }

    #[test]
    fn slerp_near_parallel_uses_linear_fallback() {
        let a = Quat::IDENTITY;
        let b = Quat::from_axis_angle(Vec3::X, 1e-3);
        let mid = a.slerp(b, 0.5);
        assert!((mid.len() - 1.0).abs() < 1e-6);
        assert!(mid.approx_eq(Quat::from_axis_angle(Vec3::X, 5e-4), 1e-5));
    }
}
