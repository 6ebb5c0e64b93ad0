// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deterministic math helpers: vectors, quaternions, splittable keys and the
//! value stream they feed.
//!
//! All operations round to `f32`.

use thiserror::Error;

mod key;
mod prng;
mod quat;
mod vec3;

pub use key::PrngKey;
pub use prng::Prng;
pub use quat::Quat;
pub use vec3::Vec3;

/// Global epsilon used by math routines when detecting degenerate values.
pub const EPSILON: f32 = 1e-6;

/// Numerical-domain failures surfaced at the transform boundary.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MathError {
    /// A quaternion contained NaN or an infinity.
    #[error("non-finite quaternion {0:?}")]
    NonFiniteQuat([f32; 4]),
    /// A quaternion had (near) zero norm and encodes no rotation.
    #[error("quaternion has zero norm")]
    ZeroNormQuat,
    /// A vector contained NaN or an infinity.
    #[error("non-finite vector {0:?}")]
    NonFiniteVector([f32; 3]),
    /// A scalar joint coordinate was NaN or an infinity.
    #[error("non-finite scalar {0}")]
    NonFiniteScalar(f32),
}

/// Linear interpolation between `a` and `b` with smooth cosine easing.
///
/// `s = 0` gives `a`, `s = 1` gives `b`; the slope vanishes at both ends.
pub fn cosine_interp(a: f32, b: f32, s: f32) -> f32 {
    let w = 0.5 * (1.0 - libm::cosf(core::f32::consts::PI * s));
    a + (b - a) * w
}
