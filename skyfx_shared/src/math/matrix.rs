//! 4x4 matrices.

use std::ops::Mul;

use serde::{Deserialize, Serialize};

use super::{
    quat::Quat,
    vector::{Vec3, Vec4},
};

/// Determinants at or below this magnitude are treated as singular.
const SINGULAR_EPSILON: f32 = 1e-12;

/// 4x4 matrix, row-major (`m[row][col]`).
///
/// Points are row vectors: `v' = v * M`, so translation lives in row 3 and
/// `a * b` applies `a` first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat4 {
    pub m: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub const ZERO: Self = Self { m: [[0.0; 4]; 4] };

    pub const fn from_rows(m: [[f32; 4]; 4]) -> Self {
        Self { m }
    }

    pub fn row(&self, r: usize) -> Vec4 {
        Vec4::from(self.m[r])
    }

    pub fn col(&self, c: usize) -> Vec4 {
        Vec4::new(self.m[0][c], self.m[1][c], self.m[2][c], self.m[3][c])
    }

    pub fn transpose(&self) -> Self {
        let mut out = Self::ZERO;
        for (r, row) in self.m.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                out.m[c][r] = *v;
            }
        }
        out
    }

    /// Rotation part of a unit quaternion, laid out for row vectors.
    pub fn from_quat(q: Quat) -> Self {
        let (x, y, z, w) = (q.x, q.y, q.z, q.w);
        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (xw, yw, zw) = (x * w, y * w, z * w);
        Self::from_rows([
            [1.0 - 2.0 * (yy + zz), 2.0 * (xy + zw), 2.0 * (xz - yw), 0.0],
            [2.0 * (xy - zw), 1.0 - 2.0 * (xx + zz), 2.0 * (yz + xw), 0.0],
            [2.0 * (xz + yw), 2.0 * (yz - xw), 1.0 - 2.0 * (xx + yy), 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn from_translation(t: Vec3) -> Self {
        let mut out = Self::IDENTITY;
        out.m[3] = [t.x, t.y, t.z, 1.0];
        out
    }

    /// Rotation of `angle` radians about `axis`, followed by `translation`.
    pub fn from_axis_angle_translation(axis: Vec3, angle: f32, translation: Vec3) -> Self {
        let mut out = Self::from_quat(Quat::from_axis_angle(axis, angle));
        out.m[3] = [translation.x, translation.y, translation.z, 1.0];
        out
    }

    /// Scale, then rotate, then translate.
    pub fn from_scale_rotation_translation(scale: Vec3, rotation: Quat, translation: Vec3) -> Self {
        let mut out = Self::from_quat(rotation);
        for (row, s) in out.m.iter_mut().zip([scale.x, scale.y, scale.z]) {
            for v in row.iter_mut().take(3) {
                *v *= s;
            }
        }
        out.m[3] = [translation.x, translation.y, translation.z, 1.0];
        out
    }

    /// Perspective projection for a camera looking down `-Z`.
    ///
    /// `fov` enters as `cos(fov) / sin(fov)` on the x axis; y is scaled by
    /// `width / height`. Depth is reversed: view depth `-near` maps to 1 and
    /// `-far` maps to 0.
    pub fn perspective(near: f32, far: f32, fov: f32, width: f32, height: f32) -> Self {
        let (s, c) = fov.sin_cos();
        let f = c / s;
        let aspect = width / height;
        let range = far - near;

        let mut out = Self::ZERO;
        out.m[0][0] = f;
        out.m[1][1] = f * aspect;
        out.m[2][2] = near / range;
        out.m[2][3] = -1.0;
        out.m[3][2] = far * near / range;
        out
    }

    pub fn determinant(&self) -> f32 {
        let (s, c) = self.sub_determinants();
        s[0] * c[5] - s[1] * c[4] + s[2] * c[3] + s[3] * c[2] - s[4] * c[1] + s[5] * c[0]
    }

    /// General inverse by cofactor expansion.
    ///
    /// Returns `None` when the determinant is within `SINGULAR_EPSILON` of
    /// zero or not finite.
    pub fn inverse(&self) -> Option<Self> {
        let a = &self.m;
        let (s, c) = self.sub_determinants();
        let det = s[0] * c[5] - s[1] * c[4] + s[2] * c[3] + s[3] * c[2] - s[4] * c[1] + s[5] * c[0];
        if !det.is_finite() || det.abs() <= SINGULAR_EPSILON {
            return None;
        }
        let inv = 1.0 / det;

        let out = [
            [
                (a[1][1] * c[5] - a[1][2] * c[4] + a[1][3] * c[3]) * inv,
                (-a[0][1] * c[5] + a[0][2] * c[4] - a[0][3] * c[3]) * inv,
                (a[3][1] * s[5] - a[3][2] * s[4] + a[3][3] * s[3]) * inv,
                (-a[2][1] * s[5] + a[2][2] * s[4] - a[2][3] * s[3]) * inv,
            ],
            [
                (-a[1][0] * c[5] + a[1][2] * c[2] - a[1][3] * c[1]) * inv,
                (a[0][0] * c[5] - a[0][2] * c[2] + a[0][3] * c[1]) * inv,
                (-a[3][0] * s[5] + a[3][2] * s[2] - a[3][3] * s[1]) * inv,
                (a[2][0] * s[5] - a[2][2] * s[2] + a[2][3] * s[1]) * inv,
            ],
            [
                (a[1][0] * c[4] - a[1][1] * c[2] + a[1][3] * c[0]) * inv,
                (-a[0][0] * c[4] + a[0][1] * c[2] - a[0][3] * c[0]) * inv,
                (a[3][0] * s[4] - a[3][1] * s[2] + a[3][3] * s[0]) * inv,
                (-a[2][0] * s[4] + a[2][1] * s[2] - a[2][3] * s[0]) * inv,
            ],
            [
                (-a[1][0] * c[3] + a[1][1] * c[1] - a[1][2] * c[0]) * inv,
                (a[0][0] * c[3] - a[0][1] * c[1] + a[0][2] * c[0]) * inv,
                (-a[3][0] * s[3] + a[3][1] * s[1] - a[3][2] * s[0]) * inv,
                (a[2][0] * s[3] - a[2][1] * s[1] + a[2][2] * s[0]) * inv,
            ],
        ];
        Some(Self::from_rows(out))
    }

    /// 2x2 minors of the top two rows (`s`) and bottom two rows (`c`).
    fn sub_determinants(&self) -> ([f32; 6], [f32; 6]) {
        let a = &self.m;
        let s = [
            a[0][0] * a[1][1] - a[1][0] * a[0][1],
            a[0][0] * a[1][2] - a[1][0] * a[0][2],
            a[0][0] * a[1][3] - a[1][0] * a[0][3],
            a[0][1] * a[1][2] - a[1][1] * a[0][2],
            a[0][1] * a[1][3] - a[1][1] * a[0][3],
            a[0][2] * a[1][3] - a[1][2] * a[0][3],
        ];
        let c = [
            a[2][0] * a[3][1] - a[3][0] * a[2][1],
            a[2][0] * a[3][2] - a[3][0] * a[2][2],
            a[2][0] * a[3][3] - a[3][0] * a[2][3],
            a[2][1] * a[3][2] - a[3][1] * a[2][2],
            a[2][1] * a[3][3] - a[3][1] * a[2][3],
            a[2][2] * a[3][3] - a[3][2] * a[2][3],
        ];
        (s, c)
    }

    /// `v * M` for a homogeneous row vector.
    pub fn transform_vec4(&self, v: Vec4) -> Vec4 {
        let mut out = [0.0; 4];
        for (c, o) in out.iter_mut().enumerate() {
            *o = v.x * self.m[0][c] + v.y * self.m[1][c] + v.z * self.m[2][c] + v.w * self.m[3][c];
        }
        Vec4::from(out)
    }

    /// Transforms a point (`w = 1`) without a perspective divide.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.transform_vec4(p.extend(1.0)).truncate()
    }

    /// Transforms a direction (`w = 0`).
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        self.transform_vec4(v.extend(0.0)).truncate()
    }

    pub fn approx_eq(&self, rhs: &Self, eps: f32) -> bool {
        self.m
            .iter()
            .flatten()
            .zip(rhs.m.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= eps)
    }
}

impl Mul for Mat4 {
    type Output = Self;

    fn mul(self, b: Self) -> Self {
        let mut out = Self::ZERO;
        for i in 0..4 {
            for j in 0..4 {
                out.m[i][j] = (0..4).map(|k| self.m[i][k] * b.m[k][j]).sum();
            }
        }
        out
    }
}
