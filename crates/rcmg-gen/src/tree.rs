// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Nested containers of `f32` arrays produced by generators.

use std::collections::BTreeMap;

use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn};

use crate::error::GenError;

/// Generator output: arrays nested in maps and sequences.
///
/// Leaves carry a leading time axis and, once batched, one or more leading
/// batch axes in front of it. Map keys are ordered so two trees with the same
/// keys always walk their leaves in the same order.
#[derive(Debug, Clone, PartialEq)]
pub enum Tree {
    /// One array.
    Leaf(ArrayD<f32>),
    /// Named children.
    Map(BTreeMap<String, Tree>),
    /// Positional children.
    Seq(Vec<Tree>),
}

impl Tree {
    /// Wraps an array of any dimensionality.
    pub fn leaf<D: ndarray::Dimension>(array: ndarray::Array<f32, D>) -> Self {
        Self::Leaf(array.into_dyn())
    }

    /// Builds a map node from `(name, child)` pairs.
    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Self)>,
        K: Into<String>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Leaves in walk order.
    pub fn leaves(&self) -> Vec<&ArrayD<f32>> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a ArrayD<f32>>) {
        match self {
            Self::Leaf(a) => out.push(a),
            Self::Map(m) => m.values().for_each(|t| t.collect_leaves(out)),
            Self::Seq(s) => s.iter().for_each(|t| t.collect_leaves(out)),
        }
    }

    /// Dimensionality of the first leaf, if any.
    pub fn first_leaf_ndim(&self) -> Option<usize> {
        self.leaves().first().map(|a| a.ndim())
    }

    /// Length of the leading axis shared by every leaf.
    pub fn leading_len(&self) -> Result<usize, GenError> {
        let mut lens = self
            .leaves()
            .into_iter()
            .map(|a| a.shape().first().copied());
        let first = lens
            .next()
            .flatten()
            .ok_or_else(|| GenError::Shape("tree has no leading axis".into()))?;
        if lens.all(|l| l == Some(first)) {
            Ok(first)
        } else {
            Err(GenError::Shape("leaves disagree on the leading axis".into()))
        }
    }

    /// Applies `f` to every leaf, keeping the structure.
    pub fn map_leaves<F>(&self, mut f: F) -> Result<Self, GenError>
    where
        F: FnMut(&ArrayD<f32>) -> Result<ArrayD<f32>, GenError>,
    {
        self.map_leaves_inner(&mut f)
    }

    fn map_leaves_inner<F>(&self, f: &mut F) -> Result<Self, GenError>
    where
        F: FnMut(&ArrayD<f32>) -> Result<ArrayD<f32>, GenError>,
    {
        Ok(match self {
            Self::Leaf(a) => Self::Leaf(f(a)?),
            Self::Map(m) => Self::Map(
                m.iter()
                    .map(|(k, t)| Ok((k.clone(), t.map_leaves_inner(f)?)))
                    .collect::<Result<_, GenError>>()?,
            ),
            Self::Seq(s) => Self::Seq(
                s.iter()
                    .map(|t| t.map_leaves_inner(f))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    /// Applies `f` to matching leaf pairs of two trees with the same structure.
    pub fn zip_leaves<F>(&self, other: &Self, mut f: F) -> Result<Self, GenError>
    where
        F: FnMut(&ArrayD<f32>, &ArrayD<f32>) -> Result<ArrayD<f32>, GenError>,
    {
        self.zip_leaves_inner(other, &mut f)
    }

    fn zip_leaves_inner<F>(&self, other: &Self, f: &mut F) -> Result<Self, GenError>
    where
        F: FnMut(&ArrayD<f32>, &ArrayD<f32>) -> Result<ArrayD<f32>, GenError>,
    {
        match (self, other) {
            (Self::Leaf(a), Self::Leaf(b)) => Ok(Self::Leaf(f(a, b)?)),
            (Self::Map(a), Self::Map(b)) if a.len() == b.len() => a
                .iter()
                .map(|(k, ta)| {
                    let tb = b
                        .get(k)
                        .ok_or_else(|| GenError::Shape(format!("missing key `{k}`")))?;
                    Ok((k.clone(), ta.zip_leaves_inner(tb, f)?))
                })
                .collect::<Result<_, GenError>>()
                .map(Self::Map),
            (Self::Seq(a), Self::Seq(b)) if a.len() == b.len() => a
                .iter()
                .zip(b)
                .map(|(ta, tb)| ta.zip_leaves_inner(tb, f))
                .collect::<Result<_, _>>()
                .map(Self::Seq),
            _ => Err(GenError::Shape("trees differ in structure".into())),
        }
    }

    /// Stacks trees of identical structure along a new leading axis.
    pub fn stack(trees: &[Self]) -> Result<Self, GenError> {
        let (first, rest) = trees
            .split_first()
            .ok_or_else(|| GenError::Shape("cannot stack zero trees".into()))?;
        match first {
            Self::Leaf(_) => {
                let views = trees
                    .iter()
                    .map(|t| match t {
                        Self::Leaf(a) => Ok(a.view()),
                        _ => Err(GenError::Shape("trees differ in structure".into())),
                    })
                    .collect::<Result<Vec<ArrayViewD<'_, f32>>, _>>()?;
                Ok(Self::Leaf(ndarray::stack(Axis(0), &views)?))
            }
            Self::Map(m) => {
                let mut out = BTreeMap::new();
                for key in m.keys() {
                    let children = trees
                        .iter()
                        .map(|t| match t {
                            Self::Map(other) if other.len() == m.len() => {
                                other.get(key).cloned().ok_or_else(|| {
                                    GenError::Shape(format!("missing key `{key}`"))
                                })
                            }
                            _ => Err(GenError::Shape("trees differ in structure".into())),
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    out.insert(key.clone(), Self::stack(&children)?);
                }
                Ok(Self::Map(out))
            }
            Self::Seq(s) => {
                if rest
                    .iter()
                    .any(|t| !matches!(t, Self::Seq(o) if o.len() == s.len()))
                {
                    return Err(GenError::Shape("trees differ in structure".into()));
                }
                (0..s.len())
                    .map(|i| {
                        let children: Vec<Self> = trees
                            .iter()
                            .filter_map(|t| match t {
                                Self::Seq(o) => o.get(i).cloned(),
                                _ => None,
                            })
                            .collect();
                        Self::stack(&children)
                    })
                    .collect::<Result<_, _>>()
                    .map(Self::Seq)
            }
        }
    }

    /// Slice `index` of the leading axis of every leaf.
    pub fn index(&self, index: usize) -> Result<Self, GenError> {
        self.map_leaves(|a| {
            if a.ndim() == 0 || index >= a.len_of(Axis(0)) {
                return Err(GenError::Shape(format!(
                    "index {index} out of range for leaf of shape {:?}",
                    a.shape()
                )));
            }
            Ok(a.index_axis(Axis(0), index).to_owned())
        })
    }

    /// Merges the two leading axes `(p, v, …)` into one `(p·v, …)` axis, row-major.
    pub fn merge_leading(&self) -> Result<Self, GenError> {
        self.map_leaves(|a| {
            let shape = a.shape();
            if shape.len() < 2 {
                return Err(GenError::Shape(format!(
                    "cannot merge leading axes of shape {shape:?}"
                )));
            }
            let mut merged = vec![shape[0] * shape[1]];
            merged.extend_from_slice(&shape[2..]);
            Ok(a.as_standard_layout()
                .into_owned()
                .into_shape(IxDyn(&merged))?)
        })
    }

    /// Splits the leading axis `(p·v, …)` into `(p, v, …)`.
    pub fn expand_leading(&self, p: usize) -> Result<Self, GenError> {
        self.map_leaves(|a| {
            let shape = a.shape();
            let lead = shape.first().copied().unwrap_or(0);
            if p == 0 || lead % p != 0 {
                return Err(GenError::Shape(format!(
                    "leading axis {lead} does not split into {p} rows"
                )));
            }
            let mut expanded = vec![p, lead / p];
            expanded.extend_from_slice(&shape[1..]);
            Ok(a.as_standard_layout()
                .into_owned()
                .into_shape(IxDyn(&expanded))?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array};

    fn sample(v: f32) -> Tree {
        Tree::Seq(vec![
            Tree::leaf(array![[v, v + 1.0]]),
            Tree::map([("pos", Tree::leaf(array![v]))]),
        ])
    }

    #[test]
    fn stack_then_index_restores_each_tree() {
        let trees = [sample(0.0), sample(10.0), sample(20.0)];
        let stacked = Tree::stack(&trees).unwrap();
        assert_eq!(stacked.first_leaf_ndim(), Some(3));
        assert_eq!(stacked.leading_len().unwrap(), 3);
        for (i, t) in trees.iter().enumerate() {
            assert_eq!(&stacked.index(i).unwrap(), t);
        }
    }

    #[test]
    fn merge_and_expand_are_row_major() {
        let grid = Tree::leaf(Array::from_shape_fn((2, 3, 1), |(p, v, _)| (p * 3 + v) as f32));
        let flat = grid.merge_leading().unwrap();
        let Tree::Leaf(a) = &flat else {
            unreachable!()
        };
        assert_eq!(
            a.iter().copied().collect::<Vec<_>>(),
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]
        );
        assert_eq!(flat.expand_leading(2).unwrap(), grid);
        assert!(flat.expand_leading(4).is_err());
    }

    #[test]
    fn mismatched_structures_do_not_stack() {
        let err = Tree::stack(&[sample(0.0), Tree::leaf(array![1.0_f32])]).unwrap_err();
        assert!(matches!(err, GenError::Shape(_)));
    }
}
