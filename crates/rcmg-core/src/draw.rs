// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Random chain motion draws for the built-in joint types.
//!
//! Every draw has the same shape: a waypoint time grid from the time key, one
//! waypoint track per coordinate component from the value key, and cosine
//! easing between waypoints sampled at `config.ts`. The result always has
//! `config.num_samples()` rows.

use ndarray::Array2;

use crate::config::RcmgConfig;
use crate::math::{cosine_interp, Prng, PrngKey, Quat, Vec3};

/// Waypoint times: starts at zero, steps by `t_min..t_max` until the
/// trajectory duration is covered.
fn waypoint_times(prng: &mut Prng, config: &RcmgConfig) -> Vec<f32> {
    let mut times = vec![0.0];
    let mut t = 0.0_f32;
    loop {
        if t >= config.t {
            return times;
        }
        t += prng.uniform(config.t_min, config.t_max);
        times.push(t);
    }
}

/// Angle waypoints walking with a random-sign velocity drawn per segment.
fn angle_track(prng: &mut Prng, times: &[f32], ang0: f32, dmin: f32, dmax: f32) -> Vec<f32> {
    let mut values = Vec::with_capacity(times.len());
    let mut value = ang0;
    values.push(value);
    for pair in times.windows(2) {
        let dt = pair[1] - pair[0];
        value += prng.sign() * prng.uniform(dmin, dmax) * dt;
        values.push(value);
    }
    values
}

/// Position waypoints clamped into `[pos_min, pos_max]`.
fn position_track(prng: &mut Prng, times: &[f32], config: &RcmgConfig) -> Vec<f32> {
    let mut values = Vec::with_capacity(times.len());
    let mut value = 0.0_f32.clamp(config.pos_min, config.pos_max);
    values.push(value);
    for pair in times.windows(2) {
        let dt = pair[1] - pair[0];
        value += prng.sign() * prng.uniform(config.dpos_min, config.dpos_max) * dt;
        value = value.clamp(config.pos_min, config.pos_max);
        values.push(value);
    }
    values
}

/// Samples a waypoint track on the regular grid `k * ts`, `k < n`.
fn sample_track(times: &[f32], values: &[f32], n: usize, ts: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(n);
    let mut seg = 0;
    for k in 0..n {
        let tk = k as f32 * ts;
        while seg + 2 < times.len() && tk >= times[seg + 1] {
            seg += 1;
        }
        if seg + 1 >= times.len() {
            out.push(values[seg]);
            continue;
        }
        let span = times[seg + 1] - times[seg];
        let s = if span > 0.0 {
            ((tk - times[seg]) / span).clamp(0.0, 1.0)
        } else {
            1.0
        };
        out.push(cosine_interp(values[seg], values[seg + 1], s));
    }
    out
}

fn angle_series(
    key: PrngKey,
    times: &[f32],
    config: &RcmgConfig,
    dmin: f32,
    dmax: f32,
) -> Vec<f32> {
    let mut prng = key.into_prng();
    let ang0 = prng.uniform(config.ang0_min, config.ang0_max);
    let track = angle_track(&mut prng, times, ang0, dmin, dmax);
    sample_track(times, &track, config.num_samples(), config.ts)
}

fn position_series(key: PrngKey, times: &[f32], config: &RcmgConfig) -> Vec<f32> {
    let mut prng = key.into_prng();
    let track = position_track(&mut prng, times, config);
    sample_track(times, &track, config.num_samples(), config.ts)
}

fn columns(n: usize, cols: &[Vec<f32>]) -> Array2<f32> {
    Array2::from_shape_fn((n, cols.len()), |(i, j)| cols[j][i])
}

/// Quaternion track from three independent Euler angle tracks (`z·y·x`).
fn rotation_columns(keys: Vec<PrngKey>, times: &[f32], config: &RcmgConfig) -> Vec<Vec<f32>> {
    let tracks: Vec<Vec<f32>> = keys
        .into_iter()
        .map(|k| {
            angle_series(
                k,
                times,
                config,
                config.dang_min_free_spherical,
                config.dang_max_free_spherical,
            )
        })
        .collect();
    let n = config.num_samples();
    let mut cols: Vec<Vec<f32>> = (0..4).map(|_| Vec::with_capacity(n)).collect();
    let steps = tracks[0].iter().zip(&tracks[1]).zip(&tracks[2]).take(n);
    for ((ax, ay), az) in steps {
        let qx = Quat::from_axis_angle(Vec3::UNIT_X, *ax);
        let qy = Quat::from_axis_angle(Vec3::UNIT_Y, *ay);
        let qz = Quat::from_axis_angle(Vec3::UNIT_Z, *az);
        let q = qz.multiply(&qy).multiply(&qx);
        for (col, c) in cols.iter_mut().zip(q.to_array()) {
            col.push(c);
        }
    }
    cols
}

/// Hinge angle trajectory, one column.
pub fn draw_revolute(config: &RcmgConfig, key_t: PrngKey, key_value: PrngKey) -> Array2<f32> {
    let times = waypoint_times(&mut key_t.into_prng(), config);
    let angle = angle_series(key_value, &times, config, config.dang_min, config.dang_max);
    columns(config.num_samples(), &[angle])
}

/// Slider position trajectory, one column.
pub fn draw_prismatic(config: &RcmgConfig, key_t: PrngKey, key_value: PrngKey) -> Array2<f32> {
    let times = waypoint_times(&mut key_t.into_prng(), config);
    let pos = position_series(key_value, &times, config);
    columns(config.num_samples(), &[pos])
}

/// Orientation trajectory, four quaternion columns `(x, y, z, w)`.
pub fn draw_spherical(config: &RcmgConfig, key_t: PrngKey, key_value: PrngKey) -> Array2<f32> {
    let times = waypoint_times(&mut key_t.into_prng(), config);
    let cols = rotation_columns(key_value.split(3), &times, config);
    columns(config.num_samples(), &cols)
}

/// Free-body trajectory: four quaternion columns then three position columns.
pub fn draw_free(config: &RcmgConfig, key_t: PrngKey, key_value: PrngKey) -> Array2<f32> {
    let times = waypoint_times(&mut key_t.into_prng(), config);
    let (key_rot, key_pos) = key_value.split2();
    let mut cols = rotation_columns(key_rot.split(3), &times, config);
    for k in key_pos.split(3) {
        cols.push(position_series(k, &times, config));
    }
    columns(config.num_samples(), &cols)
}

/// Zero-width block for joints without coordinates.
pub fn draw_frozen(config: &RcmgConfig, _key_t: PrngKey, _key_value: PrngKey) -> Array2<f32> {
    Array2::zeros((config.num_samples(), 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short() -> RcmgConfig {
        RcmgConfig {
            t: 0.5,
            ..RcmgConfig::default()
        }
    }

    #[test]
    fn shapes_follow_config() {
        let c = short();
        let k = || PrngKey::from_seed(0).split2();
        let (a, b) = k();
        assert_eq!(draw_revolute(&c, a, b).dim(), (50, 1));
        let (a, b) = k();
        assert_eq!(draw_spherical(&c, a, b).dim(), (50, 4));
        let (a, b) = k();
        assert_eq!(draw_free(&c, a, b).dim(), (50, 7));
        let (a, b) = k();
        assert_eq!(draw_frozen(&c, a, b).dim(), (50, 0));
    }

    #[test]
    fn free_rotation_columns_are_unit_quaternions() {
        let (a, b) = PrngKey::from_seed(4).split2();
        let q = draw_free(&short(), a, b);
        for row in q.rows() {
            let norm: f32 = row.iter().take(4).map(|c| c * c).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-4, "{norm}");
        }
    }

    #[test]
    fn prismatic_stays_in_bounds() {
        let c = RcmgConfig {
            pos_min: -0.01,
            pos_max: 0.01,
            ..short()
        };
        let (a, b) = PrngKey::from_seed(8).split2();
        assert!(draw_prismatic(&c, a, b).iter().all(|p| p.abs() <= 0.01));
    }

    #[test]
    fn sample_track_hits_waypoints() {
        let times = [0.0, 1.0, 2.0];
        let values = [0.0, 1.0, -1.0];
        let s = sample_track(&times, &values, 3, 1.0);
        assert!((s[0] - 0.0).abs() < 1e-6);
        assert!((s[1] - 1.0).abs() < 1e-6);
        assert!((s[2] + 1.0).abs() < 1e-6);
    }
}
