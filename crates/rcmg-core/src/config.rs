// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Random chain motion configuration shared by every joint draw function.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration parsing and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// A field (or pair of fields) holds an unusable value.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Sampling ranges and hold-time statistics for randomized motion.
///
/// Draw functions receive this value untouched. Every trajectory is built from
/// waypoints held `t_min..t_max` seconds apart and eased with cosine
/// interpolation at the sample period `ts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RcmgConfig {
    /// Trajectory duration in seconds.
    pub t: f32,
    /// Sample period in seconds.
    pub ts: f32,
    /// Minimum time between two waypoints.
    pub t_min: f32,
    /// Maximum time between two waypoints.
    pub t_max: f32,
    /// Minimum angular velocity of hinge joints (rad/s).
    pub dang_min: f32,
    /// Maximum angular velocity of hinge joints (rad/s).
    pub dang_max: f32,
    /// Minimum angular velocity for free and spherical joints (rad/s).
    pub dang_min_free_spherical: f32,
    /// Maximum angular velocity for free and spherical joints (rad/s).
    pub dang_max_free_spherical: f32,
    /// Lower bound of the initial hinge angle.
    pub ang0_min: f32,
    /// Upper bound of the initial hinge angle.
    pub ang0_max: f32,
    /// Minimum translational velocity (m/s).
    pub dpos_min: f32,
    /// Maximum translational velocity (m/s).
    pub dpos_max: f32,
    /// Lower position clamp of prismatic coordinates.
    pub pos_min: f32,
    /// Upper position clamp of prismatic coordinates.
    pub pos_max: f32,
}

impl Default for RcmgConfig {
    fn default() -> Self {
        Self {
            t: 60.0,
            ts: 0.01,
            t_min: 0.05,
            t_max: 0.30,
            dang_min: 0.1,
            dang_max: 3.0,
            dang_min_free_spherical: 0.1,
            dang_max_free_spherical: 3.0,
            ang0_min: -core::f32::consts::PI,
            ang0_max: core::f32::consts::PI,
            dpos_min: 0.001,
            dpos_max: 0.7,
            pos_min: -2.5,
            pos_max: 2.5,
        }
    }
}

impl RcmgConfig {
    /// Number of samples every draw function produces (`round(t / ts)`).
    pub fn num_samples(&self) -> usize {
        (self.t / self.ts).round().max(0.0) as usize
    }

    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes to pretty JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects non-positive durations and inverted ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [("t", self.t), ("ts", self.ts), ("t_min", self.t_min)];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "`{name}` must be > 0, got {value}"
                )));
            }
        }
        let ranges = [
            ("t", self.t_min, self.t_max),
            ("dang", self.dang_min, self.dang_max),
            (
                "dang_free_spherical",
                self.dang_min_free_spherical,
                self.dang_max_free_spherical,
            ),
            ("ang0", self.ang0_min, self.ang0_max),
            ("dpos", self.dpos_min, self.dpos_max),
            ("pos", self.pos_min, self.pos_max),
        ];
        for (name, lo, hi) in ranges {
            if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
                return Err(ConfigError::Invalid(format!(
                    "`{name}_min` ({lo}) must not exceed `{name}_max` ({hi})"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = RcmgConfig::from_json_str(r#"{ "t": 0.5 }"#).unwrap();
        assert_eq!(config.num_samples(), 50);
        assert_eq!(config.dang_max, RcmgConfig::default().dang_max);
    }

    #[test]
    fn json_round_trip() {
        let config = RcmgConfig {
            t: 2.0,
            ..RcmgConfig::default()
        };
        let json = config.to_json_string().unwrap();
        assert_eq!(RcmgConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn inverted_range_is_invalid() {
        let err = RcmgConfig::from_json_str(r#"{ "t_min": 1.0, "t_max": 0.5 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
    }
}
