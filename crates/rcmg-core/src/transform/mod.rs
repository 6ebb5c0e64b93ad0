// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Rigid transforms and the group operations FK is built from.

use crate::math::{MathError, Quat, Vec3};

pub mod grid;

/// Rigid transform: translation followed by a unit-quaternion rotation.
///
/// Conventions:
/// - `pos` in meters, expressed in the outer (parent) frame.
/// - `rot` as a unit quaternion mapping inner-frame vectors to the outer frame.
/// - A transform maps a point `p` of the inner frame to `pos + rot ⋅ p`.
///
/// Values are immutable; [`Transform::try_new`] is the checked constructor and
/// the only place numeric-domain problems are detected. `compose` and `invert`
/// are total on transforms that passed it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pos: Vec3,
    rot: Quat,
}

impl Transform {
    /// Identity transform (no translation, no rotation).
    pub const fn identity() -> Self {
        Self {
            pos: Vec3::ZERO,
            rot: Quat::identity(),
        }
    }

    /// Creates a transform after checking both parts are finite and the
    /// rotation has positive norm. The rotation is not renormalised.
    pub fn try_new(pos: Vec3, rot: Quat) -> Result<Self, MathError> {
        if !pos.is_finite() {
            return Err(MathError::NonFiniteVector(pos.to_array()));
        }
        rot.validate()?;
        Ok(Self { pos, rot })
    }

    /// Pure translation.
    pub fn from_pos(pos: Vec3) -> Result<Self, MathError> {
        Self::try_new(pos, Quat::identity())
    }

    /// Pure rotation.
    pub fn from_rot(rot: Quat) -> Result<Self, MathError> {
        Self::try_new(Vec3::ZERO, rot)
    }

    /// Translation component.
    pub fn pos(&self) -> Vec3 {
        self.pos
    }

    /// Rotation component.
    pub fn rot(&self) -> Quat {
        self.rot
    }

    /// Copy with the translation replaced.
    pub fn with_pos(&self, pos: Vec3) -> Result<Self, MathError> {
        Self::try_new(pos, self.rot)
    }

    /// Applies `inner` first and then `outer`.
    ///
    /// Associative, not commutative: `compose(a, compose(b, c)) ==
    /// compose(compose(a, b), c)` up to rounding.
    pub fn compose(outer: &Self, inner: &Self) -> Self {
        Self {
            pos: outer.pos.add(&outer.rot.rotate(&inner.pos)),
            rot: outer.rot.multiply(&inner.rot),
        }
    }

    /// Inverse transform, so that `compose(t, invert(t))` is the identity.
    pub fn invert(&self) -> Self {
        let rot = self.rot.conjugate();
        Self {
            pos: rot.rotate(&self.pos).scale(-1.0),
            rot,
        }
    }

    /// Maps a point of the inner frame into the outer frame.
    pub fn apply_point(&self, p: &Vec3) -> Vec3 {
        self.pos.add(&self.rot.rotate(p))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
