// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Joint types and the registry mapping each one to its capabilities.

use std::fmt;

use ndarray::Array2;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::config::RcmgConfig;
use crate::draw;
use crate::math::{MathError, PrngKey, Quat, Vec3};
use crate::transform::Transform;

/// Joint-type tag.
///
/// The built-in variants cover the usual single-axis, spherical and free
/// joints; `Custom` lets callers register additional behaviour under their own
/// name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointType {
    /// Six degrees of freedom: quaternion followed by position (7 columns).
    Free,
    /// Three rotational degrees of freedom as a quaternion (4 columns).
    Spherical,
    /// Hinge about the X axis.
    Rx,
    /// Hinge about the Y axis.
    Ry,
    /// Hinge about the Z axis.
    Rz,
    /// Slider along the X axis.
    Px,
    /// Slider along the Y axis.
    Py,
    /// Slider along the Z axis.
    Pz,
    /// Hinge about the axis stored in [`JointParams::axis`].
    Rr,
    /// Slider along the axis stored in [`JointParams::axis`].
    Pr,
    /// Rigidly attached; no coordinates.
    Frozen,
    /// Caller-registered joint type.
    Custom(&'static str),
}

impl JointType {
    /// Canonical tag, e.g. `"free"` or `"rx"`.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Spherical => "spherical",
            Self::Rx => "rx",
            Self::Ry => "ry",
            Self::Rz => "rz",
            Self::Px => "px",
            Self::Py => "py",
            Self::Pz => "pz",
            Self::Rr => "rr",
            Self::Pr => "pr",
            Self::Frozen => "frozen",
            Self::Custom(name) => *name,
        }
    }

    /// All built-in joint types.
    pub const BUILTINS: [Self; 11] = [
        Self::Free,
        Self::Spherical,
        Self::Rx,
        Self::Ry,
        Self::Rz,
        Self::Px,
        Self::Py,
        Self::Pz,
        Self::Rr,
        Self::Pr,
        Self::Frozen,
    ];
}

impl fmt::Display for JointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Joint-specific static parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointParams {
    /// Axis used by `rr` and `pr` joints. Expected to be unit length.
    pub axis: Vec3,
}

impl Default for JointParams {
    fn default() -> Self {
        Self { axis: Vec3::UNIT_X }
    }
}

/// Maps one link's coordinate block to its joint transform.
pub type JointFkFn = fn(&[f32], &JointParams) -> Result<Transform, MathError>;

/// Draws a `(num_samples, dof)` coordinate time series.
pub type JointDrawFn = fn(&RcmgConfig, PrngKey, PrngKey) -> Array2<f32>;

/// Capability record of a joint type.
#[derive(Debug, Clone, Copy)]
pub struct JointSpec {
    /// Width of the coordinate block.
    pub dof: usize,
    /// Forward kinematics of a single block.
    pub fk: JointFkFn,
    /// Random trajectory draw; `None` means the type cannot be generated.
    pub draw: Option<JointDrawFn>,
}

impl JointSpec {
    /// Creates a capability record.
    pub const fn new(dof: usize, fk: JointFkFn, draw: Option<JointDrawFn>) -> Self {
        Self { dof, fk, draw }
    }
}

/// Registry lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JointError {
    /// No capability record exists for the tag.
    #[error("joint type `{0}` is not registered")]
    UnknownJointType(JointType),
}

/// Table of joint capabilities keyed by tag.
///
/// There is no process-global instance: build one at start-up, register
/// extensions, then hand it by reference to [`crate::SystemBuilder`].
#[derive(Debug, Clone, Default)]
pub struct JointRegistry {
    specs: FxHashMap<JointType, JointSpec>,
}

impl JointRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in joint type.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for ty in JointType::BUILTINS {
            if let Some(spec) = builtin_spec(ty) {
                registry.register(ty, spec);
            }
        }
        registry
    }

    /// Registers `spec` under `ty`, returning the record it replaced.
    ///
    /// The last registration for a tag wins.
    pub fn register(&mut self, ty: JointType, spec: JointSpec) -> Option<JointSpec> {
        self.specs.insert(ty, spec)
    }

    /// Looks up a capability record.
    pub fn get(&self, ty: &JointType) -> Option<&JointSpec> {
        self.specs.get(ty)
    }

    /// Looks up a capability record, failing with the tag when missing.
    pub fn resolve(&self, ty: JointType) -> Result<JointSpec, JointError> {
        self.specs
            .get(&ty)
            .copied()
            .ok_or(JointError::UnknownJointType(ty))
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

fn fk_free(q: &[f32], _: &JointParams) -> Result<Transform, MathError> {
    Transform::try_new(
        Vec3::new(q[4], q[5], q[6]),
        Quat::new(q[0], q[1], q[2], q[3]),
    )
}

fn fk_spherical(q: &[f32], _: &JointParams) -> Result<Transform, MathError> {
    Transform::from_rot(Quat::new(q[0], q[1], q[2], q[3]))
}

fn hinge(axis: Vec3, angle: f32) -> Result<Transform, MathError> {
    if !angle.is_finite() {
        return Err(MathError::NonFiniteScalar(angle));
    }
    Transform::from_rot(Quat::from_axis_angle(axis, angle))
}

fn slider(axis: Vec3, offset: f32) -> Result<Transform, MathError> {
    Transform::from_pos(axis.scale(offset))
}

fn fk_rx(q: &[f32], _: &JointParams) -> Result<Transform, MathError> {
    hinge(Vec3::UNIT_X, q[0])
}

fn fk_ry(q: &[f32], _: &JointParams) -> Result<Transform, MathError> {
    hinge(Vec3::UNIT_Y, q[0])
}

fn fk_rz(q: &[f32], _: &JointParams) -> Result<Transform, MathError> {
    hinge(Vec3::UNIT_Z, q[0])
}

fn fk_px(q: &[f32], _: &JointParams) -> Result<Transform, MathError> {
    slider(Vec3::UNIT_X, q[0])
}

fn fk_py(q: &[f32], _: &JointParams) -> Result<Transform, MathError> {
    slider(Vec3::UNIT_Y, q[0])
}

fn fk_pz(q: &[f32], _: &JointParams) -> Result<Transform, MathError> {
    slider(Vec3::UNIT_Z, q[0])
}

fn fk_rr(q: &[f32], params: &JointParams) -> Result<Transform, MathError> {
    hinge(params.axis, q[0])
}

fn fk_pr(q: &[f32], params: &JointParams) -> Result<Transform, MathError> {
    slider(params.axis, q[0])
}

fn fk_frozen(_: &[f32], _: &JointParams) -> Result<Transform, MathError> {
    Ok(Transform::identity())
}

fn builtin_spec(ty: JointType) -> Option<JointSpec> {
    let spec = match ty {
        JointType::Free => JointSpec::new(7, fk_free, Some(draw::draw_free)),
        JointType::Spherical => JointSpec::new(4, fk_spherical, Some(draw::draw_spherical)),
        JointType::Rx => JointSpec::new(1, fk_rx, Some(draw::draw_revolute)),
        JointType::Ry => JointSpec::new(1, fk_ry, Some(draw::draw_revolute)),
        JointType::Rz => JointSpec::new(1, fk_rz, Some(draw::draw_revolute)),
        JointType::Px => JointSpec::new(1, fk_px, Some(draw::draw_prismatic)),
        JointType::Py => JointSpec::new(1, fk_py, Some(draw::draw_prismatic)),
        JointType::Pz => JointSpec::new(1, fk_pz, Some(draw::draw_prismatic)),
        JointType::Rr => JointSpec::new(1, fk_rr, Some(draw::draw_revolute)),
        JointType::Pr => JointSpec::new(1, fk_pr, Some(draw::draw_prismatic)),
        JointType::Frozen => JointSpec::new(0, fk_frozen, Some(draw::draw_frozen)),
        JointType::Custom(_) => return None,
    };
    Some(spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_complete() {
        let registry = JointRegistry::with_builtins();
        assert_eq!(registry.len(), JointType::BUILTINS.len());
        assert_eq!(registry.resolve(JointType::Free).unwrap().dof, 7);
        assert_eq!(registry.resolve(JointType::Spherical).unwrap().dof, 4);
        assert_eq!(registry.resolve(JointType::Frozen).unwrap().dof, 0);
    }

    #[test]
    fn last_registration_wins() {
        let mut registry = JointRegistry::with_builtins();
        let replaced = registry.register(JointType::Rx, JointSpec::new(1, fk_frozen, None));
        assert!(replaced.is_some());
        assert!(registry.resolve(JointType::Rx).unwrap().draw.is_none());
    }

    #[test]
    fn unknown_type_is_named() {
        let err = JointRegistry::new()
            .resolve(JointType::Custom("saddle"))
            .unwrap_err();
        assert_eq!(err.to_string(), "joint type `saddle` is not registered");
    }

    #[test]
    fn hinge_reports_non_finite_angle() {
        assert_eq!(
            fk_rz(&[f32::NAN], &JointParams::default()).map_err(|e| e.to_string()),
            Err("non-finite scalar NaN".to_owned())
        );
        assert_eq!(
            fk_rx(&[f32::INFINITY], &JointParams::default()),
            Err(MathError::NonFiniteScalar(f32::INFINITY))
        );
    }

    #[test]
    fn free_joint_rejects_zero_quaternion() {
        let q = [0.0; 7];
        assert_eq!(
            fk_free(&q, &JointParams::default()),
            Err(MathError::ZeroNormQuat)
        );
    }
}
