//! Vector types.
//!
//! `Vec2`, `Vec3` and `Vec4` share their arithmetic through `impl_vector!`;
//! only the type-specific pieces (cross product, axis constants) are written
//! out by hand.

use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use super::scalar::{sat, EPSILON};

/// 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

/// 3D vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 4D vector. Also the storage layout of [`super::Quat`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

macro_rules! impl_vector {
    ($ty:ident { $($f:ident),+ }, $n:literal) => {
        impl $ty {
            pub const ZERO: Self = Self { $($f: 0.0),+ };
            pub const ONE: Self = Self { $($f: 1.0),+ };

            pub const fn new($($f: f32),+) -> Self {
                Self { $($f),+ }
            }

            /// Every component set to `v`.
            pub const fn splat(v: f32) -> Self {
                Self { $($f: v),+ }
            }

            pub fn dot(self, rhs: Self) -> f32 {
                0.0 $(+ self.$f * rhs.$f)+
            }

            pub fn len_sq(self) -> f32 {
                self.dot(self)
            }

            pub fn len(self) -> f32 {
                self.len_sq().sqrt()
            }

            /// Scales to unit length.
            ///
            /// The length is not guarded: a zero vector produces NaN
            /// components. Use [`Self::try_normalize`] when the input may be
            /// degenerate.
            pub fn normalize(self) -> Self {
                self / self.len()
            }

            /// Unit vector, or `None` when the length is below `EPSILON`.
            pub fn try_normalize(self) -> Option<Self> {
                let len = self.len();
                if len.is_finite() && len > EPSILON {
                    Some(self / len)
                } else {
                    None
                }
            }

            /// Unclamped linear interpolation. `t == 1` returns `to` exactly.
            pub fn lerp(self, to: Self, t: f32) -> Self {
                self * (1.0 - t) + to * t
            }

            /// Linear interpolation with `t` saturated to `[0, 1]`.
            pub fn lerpsat(self, to: Self, t: f32) -> Self {
                self.lerp(to, sat(t))
            }

            pub fn approx_eq(self, rhs: Self, eps: f32) -> bool {
                true $(&& (self.$f - rhs.$f).abs() <= eps)+
            }

            pub fn is_finite(self) -> bool {
                true $(&& self.$f.is_finite())+
            }

            pub fn to_array(self) -> [f32; $n] {
                [$(self.$f),+]
            }
        }

        impl From<[f32; $n]> for $ty {
            fn from(a: [f32; $n]) -> Self {
                let [$($f),+] = a;
                Self { $($f),+ }
            }
        }

        impl From<$ty> for [f32; $n] {
            fn from(v: $ty) -> Self {
                v.to_array()
            }
        }

        impl Add for $ty {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                Self { $($f: self.$f + rhs.$f),+ }
            }
        }

        impl Sub for $ty {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                Self { $($f: self.$f - rhs.$f),+ }
            }
        }

        impl Mul<f32> for $ty {
            type Output = Self;
            fn mul(self, s: f32) -> Self {
                Self { $($f: self.$f * s),+ }
            }
        }

        impl Mul<$ty> for f32 {
            type Output = $ty;
            fn mul(self, v: $ty) -> $ty {
                v * self
            }
        }

        impl Div<f32> for $ty {
            type Output = Self;
            fn div(self, s: f32) -> Self {
                Self { $($f: self.$f / s),+ }
            }
        }

        impl Neg for $ty {
            type Output = Self;
            fn neg(self) -> Self {
                Self { $($f: -self.$f),+ }
            }
        }

        impl AddAssign for $ty {
            fn add_assign(&mut self, rhs: Self) {
                *self = *self + rhs;
            }
        }

        impl SubAssign for $ty {
            fn sub_assign(&mut self, rhs: Self) {
                *self = *self - rhs;
            }
        }

        impl MulAssign<f32> for $ty {
            fn mul_assign(&mut self, s: f32) {
                *self = *self * s;
            }
        }
    };
}

impl_vector!(Vec2 { x, y }, 2);
impl_vector!(Vec3 { x, y, z }, 3);
impl_vector!(Vec4 { x, y, z, w }, 4);

impl Vec3 {
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    pub fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    /// Extends to a `Vec4` with the given `w`.
    pub const fn extend(self, w: f32) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, w)
    }
}

impl Vec4 {
    /// Drops `w`.
    pub const fn truncate(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}
