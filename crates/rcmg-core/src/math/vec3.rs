// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::math::{MathError, EPSILON};

/// Deterministic 3D vector used for link positions, axes and gravity.
///
/// * Components are metres when used as positions and unitless when used as
///   axes; the calling context decides.
/// * Arithmetic uses `f32` so generated data rounds identically on every
///   supported target.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Vec3 {
    data: [f32; 3],
}

impl Vec3 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Unit vector pointing along the positive X axis.
    pub const UNIT_X: Self = Self::new(1.0, 0.0, 0.0);

    /// Unit vector pointing along the positive Y axis.
    pub const UNIT_Y: Self = Self::new(0.0, 1.0, 0.0);

    /// Unit vector pointing along the positive Z axis.
    pub const UNIT_Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Creates a vector from components.
    ///
    /// No validation happens here; use [`Vec3::try_new`] at input boundaries.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { data: [x, y, z] }
    }

    /// Creates a vector, rejecting non-finite components.
    pub fn try_new(x: f32, y: f32, z: f32) -> Result<Self, MathError> {
        let v = Self::new(x, y, z);
        if v.is_finite() {
            Ok(v)
        } else {
            Err(MathError::NonFiniteVector(v.data))
        }
    }

    /// Returns the components as an array.
    pub fn to_array(self) -> [f32; 3] {
        self.data
    }

    pub(crate) fn component(&self, idx: usize) -> f32 {
        self.data[idx]
    }

    /// True when every component is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|c| c.is_finite())
    }

    /// Adds two vectors.
    pub fn add(&self, other: &Self) -> Self {
        Self::new(
            self.component(0) + other.component(0),
            self.component(1) + other.component(1),
            self.component(2) + other.component(2),
        )
    }

    /// Subtracts another vector.
    pub fn sub(&self, other: &Self) -> Self {
        Self::new(
            self.component(0) - other.component(0),
            self.component(1) - other.component(1),
            self.component(2) - other.component(2),
        )
    }

    /// Scales the vector by a scalar.
    pub fn scale(&self, scalar: f32) -> Self {
        Self::new(
            self.component(0) * scalar,
            self.component(1) * scalar,
            self.component(2) * scalar,
        )
    }

    /// Dot product with another vector.
    pub fn dot(&self, other: &Self) -> f32 {
        self.component(0) * other.component(0)
            + self.component(1) * other.component(1)
            + self.component(2) * other.component(2)
    }

    /// Cross product with another vector.
    pub fn cross(&self, other: &Self) -> Self {
        let ax = self.component(0);
        let ay = self.component(1);
        let az = self.component(2);
        let bx = other.component(0);
        let by = other.component(1);
        let bz = other.component(2);
        Self::new(ay * bz - az * by, az * bx - ax * bz, ax * by - ay * bx)
    }

    /// Vector length (magnitude).
    pub fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Squared magnitude of the vector.
    pub fn length_squared(&self) -> f32 {
        self.dot(self)
    }

    /// Normalises the vector, returning the zero vector if length ≤ `EPSILON`.
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len <= EPSILON {
            return Self::ZERO;
        }
        self.scale(1.0 / len)
    }
}

/// Converts a 3-element `[f32; 3]` array into a `Vec3` interpreted as `(x, y, z)`.
///
/// # Examples
/// ```
/// use rcmg_core::math::Vec3;
/// let v = Vec3::from([1.0, 2.0, 3.0]);
/// assert_eq!(v.to_array(), [1.0, 2.0, 3.0]);
/// ```
impl From<[f32; 3]> for Vec3 {
    fn from(value: [f32; 3]) -> Self {
        Self { data: value }
    }
}
