// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::math::{MathError, Vec3, EPSILON};

/// Quaternion stored as `(x, y, z, w)` with `w` as the scalar part.
///
/// * All angles are expressed in radians.
/// * Rotations are active: [`Quat::rotate`] turns a vector expressed in the
///   child frame into the parent frame.
/// * Nothing renormalises implicitly; callers supply unit quaternions.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quat {
    data: [f32; 4],
}

impl Quat {
    /// Creates a quaternion from components without validation.
    ///
    /// Use [`Quat::try_new`] for data crossing an input boundary and
    /// [`Quat::from_axis_angle`] for axis/angle construction.
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { data: [x, y, z, w] }
    }

    /// Creates a quaternion, rejecting non-finite components and zero norm.
    pub fn try_new(x: f32, y: f32, z: f32, w: f32) -> Result<Self, MathError> {
        let q = Self::new(x, y, z, w);
        q.validate()?;
        Ok(q)
    }

    /// Checks the quaternion is finite with a norm above `EPSILON`.
    pub fn validate(&self) -> Result<(), MathError> {
        if !self.data.iter().all(|c| c.is_finite()) {
            return Err(MathError::NonFiniteQuat(self.data));
        }
        if self.norm() <= EPSILON {
            return Err(MathError::ZeroNormQuat);
        }
        Ok(())
    }

    /// Returns the quaternion as an array.
    pub fn to_array(self) -> [f32; 4] {
        self.data
    }

    fn component(&self, idx: usize) -> f32 {
        self.data[idx]
    }

    /// Returns the identity quaternion.
    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Constructs a quaternion from a rotation axis and angle in radians.
    ///
    /// Returns the identity quaternion when the axis length is ≤ `EPSILON`.
    /// Trig goes through `libm` so results do not depend on the platform libm.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let len_sq = axis.length_squared();
        if len_sq <= EPSILON * EPSILON {
            return Self::identity();
        }
        let norm_axis = axis.scale(1.0 / len_sq.sqrt());
        let half = angle * 0.5;
        let scaled = norm_axis.scale(libm::sinf(half));
        Self::new(
            scaled.component(0),
            scaled.component(1),
            scaled.component(2),
            libm::cosf(half),
        )
    }

    /// Decomposes a unit quaternion into `(axis, angle)` with `angle ∈ [0, 2π]`.
    ///
    /// A rotation of (almost) zero angle reports the X axis.
    pub fn to_axis_angle(&self) -> (Vec3, f32) {
        let w = self.component(3).clamp(-1.0, 1.0);
        let angle = 2.0 * libm::acosf(w);
        let s = (1.0 - w * w).max(0.0).sqrt();
        if s <= EPSILON {
            return (Vec3::UNIT_X, angle);
        }
        let axis = Vec3::new(
            self.component(0) / s,
            self.component(1) / s,
            self.component(2) / s,
        );
        (axis, angle)
    }

    /// Hamilton product of two quaternions (`self * other`).
    ///
    /// The product rotates by `other` first and then by `self`. Operand order
    /// matters: quaternion multiplication is non‑commutative.
    ///
    /// # Examples
    /// ```
    /// use core::f32::consts::FRAC_PI_2;
    /// use rcmg_core::math::{Quat, Vec3};
    /// let yaw = Quat::from_axis_angle(Vec3::UNIT_Y, FRAC_PI_2);
    /// let pitch = Quat::from_axis_angle(Vec3::UNIT_X, FRAC_PI_2);
    /// assert_ne!(yaw.multiply(&pitch), pitch.multiply(&yaw));
    /// ```
    pub fn multiply(&self, other: &Self) -> Self {
        let ax = self.component(0);
        let ay = self.component(1);
        let az = self.component(2);
        let aw = self.component(3);

        let bx = other.component(0);
        let by = other.component(1);
        let bz = other.component(2);
        let bw = other.component(3);

        Self::new(
            aw * bx + ax * bw + ay * bz - az * by,
            aw * by - ax * bz + ay * bw + az * bx,
            aw * bz + ax * by - ay * bx + az * bw,
            aw * bw - ax * bx - ay * by - az * bz,
        )
    }

    /// Conjugate `(-x, -y, -z, w)`; the inverse of a unit quaternion.
    pub fn conjugate(&self) -> Self {
        Self::new(
            -self.component(0),
            -self.component(1),
            -self.component(2),
            self.component(3),
        )
    }

    /// Rotates `v` by this (unit) quaternion.
    pub fn rotate(&self, v: &Vec3) -> Vec3 {
        let u = Vec3::new(self.component(0), self.component(1), self.component(2));
        let t = u.cross(v).scale(2.0);
        v.add(&t.scale(self.component(3))).add(&u.cross(&t))
    }

    /// Euclidean norm of the four components.
    pub fn norm(&self) -> f32 {
        self.data.iter().map(|c| c * c).sum::<f32>().sqrt()
    }

    /// Normalises the quaternion; returns identity when norm is ~0.
    pub fn normalize(&self) -> Self {
        let len = self.norm();
        if len <= EPSILON {
            return Self::identity();
        }
        let inv = 1.0 / len;
        Self::new(
            self.component(0) * inv,
            self.component(1) * inv,
            self.component(2) * inv,
            self.component(3) * inv,
        )
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::identity()
    }
}

/// Converts a 4‑element `[f32; 4]` array `(x, y, z, w)` into a `Quat`.
/// The components are taken verbatim; normalization is not enforced.
impl From<[f32; 4]> for Quat {
    fn from(value: [f32; 4]) -> Self {
        Self { data: value }
    }
}
