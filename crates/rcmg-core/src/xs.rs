// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Edits on time series of global link transforms (`xs`, shape `T × N`).
//!
//! Each helper runs the structural scan once per timestep, so every link is
//! processed after its parent.

use ndarray::Array2;

use crate::joint::JointType;
use crate::kinematics::KinematicsError;
use crate::math::Quat;
use crate::scan::{self, ScanMode};
use crate::system::System;
use crate::transform::{grid, Transform};

/// Joint types left untouched by [`scale_xs`] unless the caller says otherwise.
pub const DEFAULT_SCALE_EXCLUDE: [JointType; 4] =
    [JointType::Px, JointType::Py, JointType::Pz, JointType::Free];

fn check_links(sys: &System, xs: &Array2<Transform>) -> Result<(), KinematicsError> {
    let expected = sys.num_links();
    let found = xs.ncols();
    if expected == found {
        Ok(())
    } else {
        Err(KinematicsError::LinkCount { expected, found })
    }
}

fn per_step<F>(
    sys: &System,
    xs: &Array2<Transform>,
    mut f: F,
) -> Result<Array2<Transform>, KinematicsError>
where
    F: FnMut(&[Transform]) -> Result<Vec<Transform>, KinematicsError>,
{
    check_links(sys, xs)?;
    let rows = xs
        .rows()
        .into_iter()
        .map(|row| f(&row.to_vec()))
        .collect::<Result<Vec<_>, _>>()?;
    if rows.is_empty() {
        return Ok(xs.clone());
    }
    Ok(grid::stack_rows(rows)?)
}

/// Splits global transforms into parent-to-child translations (`transform1`)
/// and rotations (`transform2`).
pub fn unzip_xs(
    sys: &System,
    xs: &Array2<Transform>,
) -> Result<(Array2<Transform>, Array2<Transform>), KinematicsError> {
    check_links(sys, xs)?;
    let parents = sys.parents();
    let mut pos_rows = Vec::with_capacity(xs.nrows());
    let mut rot_rows = Vec::with_capacity(xs.nrows());
    for row in xs.rows() {
        let row = row.to_vec();
        let pairs = scan::tree(
            &parents,
            ScanMode::Structural,
            &(Transform::identity(), Transform::identity()),
            &parents,
            |i, _, parent: &Option<usize>| -> Result<_, KinematicsError> {
                let rel = match parent {
                    None => row[i],
                    Some(p) => Transform::compose(&row[*p].invert(), &row[i]),
                };
                Ok((
                    Transform::from_pos(rel.pos())?,
                    Transform::from_rot(rel.rot())?,
                ))
            },
        )?;
        let (p, r): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        pos_rows.push(p);
        rot_rows.push(r);
    }
    if xs.nrows() == 0 {
        return Ok((xs.clone(), xs.clone()));
    }
    Ok((grid::stack_rows(pos_rows)?, grid::stack_rows(rot_rows)?))
}

/// Forward kinematics from split transforms: `x_i = x_parent ∘ t1_i ∘ t2_i`.
pub fn zip_xs(
    sys: &System,
    transform1: &Array2<Transform>,
    transform2: &Array2<Transform>,
) -> Result<Array2<Transform>, KinematicsError> {
    check_links(sys, transform1)?;
    check_links(sys, transform2)?;
    if transform1.dim() != transform2.dim() {
        return Err(KinematicsError::LinkCount {
            expected: transform1.ncols(),
            found: transform2.ncols(),
        });
    }
    let parents = sys.parents();
    let rows = (0..transform1.nrows())
        .map(|t| {
            scan::tree(
                &parents,
                ScanMode::Structural,
                &Transform::identity(),
                &parents,
                |i, parent_x, _: &Option<usize>| -> Result<_, KinematicsError> {
                    let rel = Transform::compose(&transform1[[t, i]], &transform2[[t, i]]);
                    Ok(Transform::compose(parent_x, &rel))
                },
            )
        })
        .collect::<Result<Vec<_>, _>>()?;
    if rows.is_empty() {
        return Ok(transform1.clone());
    }
    Ok(grid::stack_rows(rows)?)
}

/// Replaces the transforms of links attached to the world by the identity.
pub fn delete_to_world_pos_rot(
    sys: &System,
    xs: &Array2<Transform>,
) -> Result<Array2<Transform>, KinematicsError> {
    let parents = sys.parents();
    per_step(sys, xs, |row| {
        scan::tree(
            &parents,
            ScanMode::Structural,
            &Transform::identity(),
            &parents,
            |i, _, parent: &Option<usize>| {
                Ok(if parent.is_none() {
                    Transform::identity()
                } else {
                    row[i]
                })
            },
        )
    })
}

fn scale_transform(
    x: &Transform,
    joint: JointType,
    factor: f32,
) -> Result<Transform, KinematicsError> {
    let mut pos = x.pos();
    let mut rot = x.rot();
    if matches!(
        joint,
        JointType::Px | JointType::Py | JointType::Pz | JointType::Pr | JointType::Free
    ) {
        pos = pos.scale(factor);
    }
    if matches!(
        joint,
        JointType::Rx
            | JointType::Ry
            | JointType::Rz
            | JointType::Rr
            | JointType::Spherical
            | JointType::Free
    ) {
        let (axis, angle) = rot.to_axis_angle();
        rot = Quat::from_axis_angle(axis, angle * factor);
    }
    Ok(Transform::try_new(pos, rot)?)
}

/// Scales the joint motion encoded in per-link transforms by `factor`.
///
/// The transforms are read as joint transforms (`transform2`): translational
/// parts of sliders and rotation angles of hinges are multiplied; links whose
/// type is in `exclude` pass through unchanged.
pub fn scale_xs(
    sys: &System,
    xs: &Array2<Transform>,
    factor: f32,
    exclude: &[JointType],
) -> Result<Array2<Transform>, KinematicsError> {
    let parents = sys.parents();
    let types = sys.link_types();
    per_step(sys, xs, |row| {
        scan::tree(
            &parents,
            ScanMode::Structural,
            &Transform::identity(),
            &types,
            |i, _, joint: &JointType| {
                if exclude.contains(joint) {
                    Ok(row[i])
                } else {
                    scale_transform(&row[i], *joint, factor)
                }
            },
        )
    })
}

/// Selects the columns of `xs` (laid out like `sys_xs`) that belong to the
/// links of the smaller system `sys`, in `sys` order.
pub fn match_xs(
    sys: &System,
    xs: &Array2<Transform>,
    sys_xs: &System,
) -> Result<Array2<Transform>, KinematicsError> {
    check_links(sys_xs, xs)?;
    let columns = sys
        .link_names()
        .into_iter()
        .map(|name| sys_xs.name_to_idx(name))
        .collect::<Result<Vec<_>, _>>()?;
    let (t, _) = xs.dim();
    Ok(Array2::from_shape_fn((t, columns.len()), |(i, j)| {
        xs[[i, columns[j]]]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::JointRegistry;
    use crate::kinematics::forward_kinematics;
    use crate::math::Vec3;
    use crate::system::{LinkDef, SystemBuilder};
    use ndarray::array;

    fn chain(registry: &JointRegistry) -> System {
        let offset = Transform::from_pos(Vec3::new(0.0, 0.5, 0.0)).unwrap();
        SystemBuilder::new(registry)
            .link(LinkDef::new("base", JointType::Px))
            .link(
                LinkDef::new("upper", JointType::Rz)
                    .parent("base")
                    .transform(offset),
            )
            .link(
                LinkDef::new("lower", JointType::Rx)
                    .parent("upper")
                    .transform(offset),
            )
            .build()
            .unwrap()
    }

    fn close(a: &Transform, b: &Transform) -> bool {
        let dp = a.pos().sub(&b.pos()).length();
        let ra = a.rot().to_array();
        let rb = b.rot().to_array();
        let same: f32 = ra.iter().zip(rb).map(|(x, y)| (x - y).abs()).sum();
        let flip: f32 = ra.iter().zip(rb).map(|(x, y)| (x + y).abs()).sum();
        dp < 1e-4 && same.min(flip) < 1e-4
    }

    #[test]
    fn unzip_then_zip_restores_globals() {
        let registry = JointRegistry::with_builtins();
        let sys = chain(&registry);
        let q = array![[0.2_f32, 0.4, -0.3], [-0.1, 1.2, 0.7]];
        let xs = forward_kinematics(&sys, q.view()).unwrap();
        let (t1, t2) = unzip_xs(&sys, &xs).unwrap();
        assert_eq!(t1[[0, 0]].rot(), Quat::identity());
        assert_eq!(t2[[0, 0]].pos(), Vec3::ZERO);
        let back = zip_xs(&sys, &t1, &t2).unwrap();
        for (a, b) in back.iter().zip(xs.iter()) {
            assert!(close(a, b), "{a:?} != {b:?}");
        }
    }

    #[test]
    fn roots_become_identity() {
        let registry = JointRegistry::with_builtins();
        let sys = chain(&registry);
        let q = array![[0.9_f32, 0.0, 0.0]];
        let xs = forward_kinematics(&sys, q.view()).unwrap();
        let out = delete_to_world_pos_rot(&sys, &xs).unwrap();
        assert_eq!(out[[0, 0]], Transform::identity());
        assert_eq!(out[[0, 2]], xs[[0, 2]]);
    }

    #[test]
    fn scale_skips_excluded_types() {
        let registry = JointRegistry::with_builtins();
        let sys = chain(&registry);
        let slide = Transform::from_pos(Vec3::new(1.0, 0.0, 0.0)).unwrap();
        let turn = Transform::from_rot(Quat::from_axis_angle(Vec3::UNIT_Z, 0.4)).unwrap();
        let xs = Array2::from_shape_vec((1, 3), vec![slide, turn, turn]).unwrap();
        let out = scale_xs(&sys, &xs, 2.0, &DEFAULT_SCALE_EXCLUDE).unwrap();
        assert_eq!(out[[0, 0]], slide);
        let (_, angle) = out[[0, 1]].rot().to_axis_angle();
        assert!((angle - 0.8).abs() < 1e-4, "{angle}");
    }

    #[test]
    fn match_selects_by_name() {
        let registry = JointRegistry::with_builtins();
        let large = chain(&registry);
        let small = SystemBuilder::new(&registry)
            .link(LinkDef::new("lower", JointType::Rx))
            .link(LinkDef::new("base", JointType::Px))
            .build()
            .unwrap();
        let q = array![[0.2_f32, 0.4, -0.3]];
        let xs = forward_kinematics(&large, q.view()).unwrap();
        let picked = match_xs(&small, &xs, &large).unwrap();
        assert_eq!(picked.dim(), (1, 2));
        assert_eq!(picked[[0, 0]], xs[[0, 2]]);
        assert_eq!(picked[[0, 1]], xs[[0, 0]]);
    }

    #[test]
    fn wrong_link_count_is_rejected() {
        let registry = JointRegistry::with_builtins();
        let sys = chain(&registry);
        let xs = Array2::from_elem((2, 2), Transform::identity());
        assert_eq!(
            delete_to_world_pos_rot(&sys, &xs).unwrap_err(),
            KinematicsError::LinkCount {
                expected: 3,
                found: 2
            }
        );
    }
}
