// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Forward kinematics over generalized coordinates.

use ndarray::{Array2, ArrayView2};
use thiserror::Error;

use crate::joint::JointType;
use crate::math::MathError;
use crate::scan::{self, ScanError, ScanMode};
use crate::system::{Link, System, SystemError};
use crate::transform::grid::{self, GridError};
use crate::transform::Transform;

/// Forward kinematics failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KinematicsError {
    /// `q` did not have `total_dof` columns.
    #[error("q has {found} columns, system needs {expected}")]
    CoordinateWidth {
        /// `System::total_dof`.
        expected: usize,
        /// Columns supplied.
        found: usize,
    },
    /// A joint FK function rejected its coordinates.
    #[error("link {link} ({joint}): {source}")]
    Joint {
        /// Link index.
        link: usize,
        /// Joint tag of that link.
        joint: JointType,
        /// Underlying domain error.
        source: MathError,
    },
    /// A transform series had the wrong number of link columns.
    #[error("transform series has {found} links, system has {expected}")]
    LinkCount {
        /// `System::num_links`.
        expected: usize,
        /// Columns supplied.
        found: usize,
    },
    /// Numeric-domain failure outside a joint FK function.
    #[error(transparent)]
    Math(#[from] MathError),
    /// Link lookup failed.
    #[error(transparent)]
    System(#[from] SystemError),
    /// Structural problem in the link table.
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// Assembling the output grid failed.
    #[error(transparent)]
    Grid(#[from] GridError),
}

fn block_starts(sys: &System) -> Vec<(&Link, usize)> {
    sys.links().iter().zip(sys.q_offsets()).collect()
}

fn joint_transform(
    index: usize,
    link: &Link,
    start: usize,
    q: &[f32],
) -> Result<Transform, KinematicsError> {
    let block = &q[start..start + link.spec.dof];
    (link.spec.fk)(block, &link.params).map_err(|source| KinematicsError::Joint {
        link: index,
        joint: link.joint,
        source,
    })
}

fn check_width(sys: &System, found: usize) -> Result<(), KinematicsError> {
    let expected = sys.total_dof();
    if found == expected {
        Ok(())
    } else {
        Err(KinematicsError::CoordinateWidth { expected, found })
    }
}

/// Global transforms of every link for one coordinate vector.
///
/// `global_i = compose(global_parent, compose(offset_i, joint_i(q_i)))`; roots
/// compose with the identity.
pub fn forward_kinematics_step(sys: &System, q: &[f32]) -> Result<Vec<Transform>, KinematicsError> {
    check_width(sys, q.len())?;
    let links = block_starts(sys);
    scan::tree(
        &sys.parents(),
        ScanMode::Structural,
        &Transform::identity(),
        &links,
        |i, parent, (link, start)| {
            let joint = joint_transform(i, link, *start, q)?;
            let local = Transform::compose(&link.transform, &joint);
            Ok(Transform::compose(parent, &local))
        },
    )
}

/// Parent-to-child transforms (`offset_i ∘ joint_i`) for one coordinate vector.
pub fn local_transforms_step(sys: &System, q: &[f32]) -> Result<Vec<Transform>, KinematicsError> {
    check_width(sys, q.len())?;
    block_starts(sys)
        .into_iter()
        .enumerate()
        .map(|(i, (link, start))| {
            let joint = joint_transform(i, link, start, q)?;
            Ok(Transform::compose(&link.transform, &joint))
        })
        .collect()
}

/// Global transforms for a `T × total_dof` coordinate matrix.
///
/// Rows are independent; the result is a `T × N` grid. The width is checked
/// before any row is processed.
pub fn forward_kinematics(
    sys: &System,
    q: ArrayView2<'_, f32>,
) -> Result<Array2<Transform>, KinematicsError> {
    check_width(sys, q.ncols())?;
    let rows = q
        .rows()
        .into_iter()
        .map(|row| forward_kinematics_step(sys, &row.to_vec()))
        .collect::<Result<Vec<_>, _>>()?;
    if rows.is_empty() {
        return Ok(Array2::from_elem(
            (0, sys.num_links()),
            Transform::identity(),
        ));
    }
    Ok(grid::stack_rows(rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::JointRegistry;
    use crate::system::{LinkDef, SystemBuilder};
    use ndarray::array;

    #[test]
    fn width_is_checked_first() {
        let registry = JointRegistry::with_builtins();
        let sys = SystemBuilder::new(&registry)
            .link(LinkDef::new("a", JointType::Rx))
            .build()
            .unwrap();
        let q = array![[0.0_f32, 1.0]];
        assert_eq!(
            forward_kinematics(&sys, q.view()).unwrap_err(),
            KinematicsError::CoordinateWidth {
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn bad_free_block_names_the_link() {
        let registry = JointRegistry::with_builtins();
        let sys = SystemBuilder::new(&registry)
            .link(LinkDef::new("a", JointType::Free))
            .build()
            .unwrap();
        let q = [0.0_f32; 7];
        let err = forward_kinematics_step(&sys, &q).unwrap_err();
        assert!(matches!(
            err,
            KinematicsError::Joint {
                link: 0,
                joint: JointType::Free,
                source: MathError::ZeroNormQuat
            }
        ));
    }
}
