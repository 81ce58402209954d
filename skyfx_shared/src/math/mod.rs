//! Math kernel.
//!
//! This module intentionally stays small and deterministic.
//! It avoids SIMD/unsafe and focuses on stable semantics.
//!
//! Conventions:
//! - `Mat4` is row-major and multiplies row vectors (`v' = v * M`).
//! - The camera looks down local `-Z`, `+Y` is up.
//! - Quaternions are Hamilton products: `a * b` applies `b` first, then `a`.
//!
//! Degenerate input is never asserted on. Operations that are undefined for
//! some input either document their IEEE result (`normalize` on a zero
//! vector yields NaN) or return `Option` (`try_normalize`, `Mat4::inverse`).

pub mod matrix;
pub mod quat;
pub mod scalar;
pub mod vector;

pub use matrix::Mat4;
pub use quat::Quat;
pub use scalar::{clamp, lerp, lerpsat, sat, EPSILON};
pub use vector::{Vec2, Vec3, Vec4};
