// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Setup functions that rewrite a system before each draw.

use std::sync::Arc;

use rcmg_core::{JointParams, JointType, Prng, PrngKey, System, Vec3};

use crate::error::GenError;
use crate::generator::SetupFn;

/// Draws each boxed link's static offset position uniformly inside its box.
///
/// Every link consumes one split of `key` whether or not it has a box, so
/// adding a box to one link leaves the draws of the others unchanged.
pub fn randomize_positions(key: PrngKey, sys: &System) -> Result<System, GenError> {
    let keys = key.split(sys.num_links());
    let transforms = sys
        .links()
        .iter()
        .zip(keys)
        .map(|(link, k)| match link.pos_bounds {
            None => Ok(link.transform),
            Some((lo, hi)) => {
                let mut prng = k.into_prng();
                let (lo, hi) = (lo.to_array(), hi.to_array());
                let pos = Vec3::new(
                    prng.uniform(lo[0], hi[0]),
                    prng.uniform(lo[1], hi[1]),
                    prng.uniform(lo[2], hi[2]),
                );
                link.transform.with_pos(pos)
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(sys.map_link_transforms(|i, _| Ok(transforms[i]))?)
}

/// Uniformly distributed unit vector, by rejection from the unit cube.
fn unit_axis(prng: &mut Prng) -> Vec3 {
    loop {
        let v = Vec3::new(
            prng.uniform(-1.0, 1.0),
            prng.uniform(-1.0, 1.0),
            prng.uniform(-1.0, 1.0),
        );
        let n2 = v.length_squared();
        if n2 > 1e-4 && n2 <= 1.0 {
            return v.normalize();
        }
    }
}

/// Draws a fresh unit axis for every `rr` and `pr` link.
///
/// Like [`randomize_positions`], every link consumes one split of `key`, so
/// the axis drawn for a link depends only on the key and its index.
pub fn randomize_joint_axes(key: PrngKey, sys: &System) -> Result<System, GenError> {
    let keys = key.split(sys.num_links());
    let params: Vec<JointParams> = sys
        .links()
        .iter()
        .zip(keys)
        .map(|(link, k)| match link.joint {
            JointType::Rr | JointType::Pr => JointParams {
                axis: unit_axis(&mut k.into_prng()),
            },
            _ => link.params,
        })
        .collect();
    Ok(sys.map_link_params(|i, _| Ok(params[i]))?)
}

/// Runs `setups` in order, giving each its own split of the key.
pub fn chain_setups(setups: Vec<SetupFn>) -> SetupFn {
    Arc::new(move |key: PrngKey, sys: &System| -> Result<System, GenError> {
        let mut current = sys.clone();
        for (setup, k) in setups.iter().zip(key.split(setups.len())) {
            current = setup(k, &current)?;
        }
        Ok(current)
    })
}
