// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-feature standardization fitted on a large generated batch.

use std::sync::Arc;

use ndarray::{ArrayD, Axis, IxDyn};
use rcmg_core::PrngKey;

use crate::batch::batch_generator_lazy;
use crate::error::GenError;
use crate::generator::Generator;
use crate::tree::Tree;

/// Added to every standard deviation so constant features stay finite.
pub const STD_EPSILON: f32 = 1e-8;

/// Maps every leaf to `(x - mean) / std` with statistics per trailing feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalizer {
    mean: Tree,
    std: Tree,
}

fn flatten_batch_time(a: &ArrayD<f32>) -> Result<ArrayD<f32>, GenError> {
    let shape = a.shape();
    if shape.len() < 3 {
        return Err(GenError::Shape(format!(
            "normalizer needs (batch, time, …) leaves, got {shape:?}"
        )));
    }
    let mut flat = vec![shape[0] * shape[1]];
    flat.extend_from_slice(&shape[2..]);
    Ok(a.as_standard_layout().into_owned().into_shape(IxDyn(&flat))?)
}

impl Normalizer {
    /// Fits mean and standard deviation over the batch and time axes of `data`.
    pub fn fit(data: &Tree) -> Result<Self, GenError> {
        let mean = data.map_leaves(|a| {
            flatten_batch_time(a)?
                .mean_axis(Axis(0))
                .ok_or_else(|| GenError::Shape("cannot fit on an empty batch".into()))
        })?;
        let std = data.map_leaves(|a| {
            let flat = flatten_batch_time(a)?;
            Ok(flat.std_axis(Axis(0), 0.0) + STD_EPSILON)
        })?;
        Ok(Self { mean, std })
    }

    /// Per-leaf means.
    pub fn mean(&self) -> &Tree {
        &self.mean
    }

    /// Per-leaf standard deviations (epsilon included).
    pub fn std(&self) -> &Tree {
        &self.std
    }

    /// Standardizes a tree with the fitted structure.
    ///
    /// Leaves may carry any number of leading axes; the statistics broadcast
    /// over them.
    pub fn normalize(&self, data: &Tree) -> Result<Tree, GenError> {
        let centered = data.zip_leaves(&self.mean, |x, m| {
            broadcast_check(x, m)?;
            Ok(x - m)
        })?;
        centered.zip_leaves(&self.std, |x, s| Ok(x / s))
    }
}

fn broadcast_check(x: &ArrayD<f32>, stat: &ArrayD<f32>) -> Result<(), GenError> {
    let trailing = &x.shape()[x.ndim().saturating_sub(stat.ndim())..];
    if trailing == stat.shape() {
        Ok(())
    } else {
        Err(GenError::Shape(format!(
            "leaf {:?} does not end in feature shape {:?}",
            x.shape(),
            stat.shape()
        )))
    }
}

/// Fits a [`Normalizer`] on one batch of `approx_with_large_batchsize` samples.
///
/// An already batched generator is used as is.
pub fn make_normalizer_from_generator(
    generator: &Arc<dyn Generator>,
    key: PrngKey,
    approx_with_large_batchsize: usize,
    units: usize,
) -> Result<Normalizer, GenError> {
    let batched = batch_generator_lazy(generator, approx_with_large_batchsize, units)?;
    Normalizer::fit(&batched.generate(key)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn fitted_data_is_standardized() {
        let data = Tree::leaf(Array3::from_shape_fn((4, 5, 2), |(b, t, f)| {
            (b * 5 + t) as f32 * if f == 0 { 1.0 } else { -3.0 } + 7.0
        }));
        let norm = Normalizer::fit(&data).unwrap();
        let Tree::Leaf(out) = norm.normalize(&data).unwrap() else {
            unreachable!()
        };
        let flat = out.into_shape((20, 2)).unwrap();
        for f in 0..2 {
            let col = flat.column(f);
            let mean = col.mean().unwrap();
            let std = col.std(0.0);
            assert!(mean.abs() < 1e-4, "{mean}");
            assert!((std - 1.0).abs() < 1e-4, "{std}");
        }
    }

    #[test]
    fn unbatched_leaves_cannot_be_fitted() {
        let data = Tree::leaf(ndarray::Array2::<f32>::zeros((5, 2)));
        assert!(matches!(Normalizer::fit(&data), Err(GenError::Shape(_))));
    }
}
