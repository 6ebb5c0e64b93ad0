// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reshaping helpers for time × link collections of transforms.

use ndarray::{Array1, Array2, Array3};
use thiserror::Error;

use super::Transform;

/// Shape failures when assembling transform grids.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Rows passed to [`stack_rows`] did not all have the same length.
    #[error("ragged rows: row {row} has {found} transforms, expected {expected}")]
    Ragged {
        /// Offending row.
        row: usize,
        /// Length of row 0.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
    /// The backing array rejected the requested shape.
    #[error("shape error: {0}")]
    Shape(String),
    /// A link index was outside the grid.
    #[error("link {index} out of range for {links} links")]
    LinkOutOfRange {
        /// Requested column.
        index: usize,
        /// Number of columns.
        links: usize,
    },
}

/// Stacks per-timestep rows (one transform per link) into a `T × N` grid.
pub fn stack_rows(rows: Vec<Vec<Transform>>) -> Result<Array2<Transform>, GridError> {
    let t = rows.len();
    let n = rows.first().map_or(0, Vec::len);
    let mut flat = Vec::with_capacity(t * n);
    for (row, links) in rows.into_iter().enumerate() {
        if links.len() != n {
            return Err(GridError::Ragged {
                row,
                expected: n,
                found: links.len(),
            });
        }
        flat.extend(links);
    }
    Array2::from_shape_vec((t, n), flat).map_err(|e| GridError::Shape(e.to_string()))
}

/// Swaps the two axes (`T × N` ↔ `N × T`), returning standard layout.
pub fn transpose(grid: &Array2<Transform>) -> Array2<Transform> {
    grid.t().as_standard_layout().into_owned()
}

/// Time series of a single link.
pub fn take_link(grid: &Array2<Transform>, index: usize) -> Result<Array1<Transform>, GridError> {
    let links = grid.ncols();
    if index >= links {
        return Err(GridError::LinkOutOfRange { index, links });
    }
    Ok(grid.column(index).to_owned())
}

/// Splits a `T × N` grid into positions `T × N × 3` and rotations `T × N × 4`.
pub fn grid_to_arrays(grid: &Array2<Transform>) -> (Array3<f32>, Array3<f32>) {
    let (t, n) = grid.dim();
    let pos = Array3::from_shape_fn((t, n, 3), |(i, j, c)| {
        grid[[i, j]].pos().to_array()[c]
    });
    let rot = Array3::from_shape_fn((t, n, 4), |(i, j, c)| {
        grid[[i, j]].rot().to_array()[c]
    });
    (pos, rot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    fn at(x: f32) -> Transform {
        Transform::from_pos(Vec3::new(x, 0.0, 0.0)).unwrap()
    }

    #[test]
    fn stack_transpose_and_take_link() {
        let grid = stack_rows(vec![vec![at(0.0), at(1.0)], vec![at(2.0), at(3.0)]]).unwrap();
        assert_eq!(grid.dim(), (2, 2));
        let tr = transpose(&grid);
        assert_eq!(tr[[1, 0]], at(1.0));
        assert_eq!(tr[[0, 1]], at(2.0));
        assert!(take_link(&grid, 2).is_err());
        assert_eq!(
            take_link(&grid, 1).unwrap().to_vec(),
            vec![at(1.0), at(3.0)]
        );
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = stack_rows(vec![vec![at(0.0)], vec![]]).unwrap_err();
        assert_eq!(
            err,
            GridError::Ragged {
                row: 1,
                expected: 1,
                found: 0
            }
        );
    }

    #[test]
    fn arrays_carry_components() {
        let grid = stack_rows(vec![vec![at(4.0)]]).unwrap();
        let (pos, rot) = grid_to_arrays(&grid);
        assert_eq!(pos.shape(), &[1, 1, 3]);
        assert!((pos[[0, 0, 0]] - 4.0).abs() < f32::EPSILON);
        assert!((rot[[0, 0, 3]] - 1.0).abs() < f32::EPSILON);
    }
}
