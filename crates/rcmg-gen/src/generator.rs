// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Single-trajectory generators.
//!
//! A generator maps one [`PrngKey`] to one sample [`Tree`]. The built-in
//! [`RcmgGenerator`] draws every link's coordinates with its joint type's draw
//! function, runs forward kinematics and hands the result to a finalize
//! function.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

use ndarray::{Array2, Axis};
use rcmg_core::scan::{self, ScanMode};
use rcmg_core::transform::grid;
use rcmg_core::{forward_kinematics, KinematicsError, PrngKey, RcmgConfig, System, Transform};

use crate::error::GenError;
use crate::tree::Tree;

/// Anything that turns a key into a sample.
///
/// Implementations must be pure: the same key always yields the same tree
/// and no state survives between calls.
pub trait Generator: Send + Sync {
    /// Draws one sample.
    fn generate(&self, key: PrngKey) -> Result<Tree, GenError>;
}

impl<F> Generator for F
where
    F: Fn(PrngKey) -> Result<Tree, GenError> + Send + Sync,
{
    fn generate(&self, key: PrngKey) -> Result<Tree, GenError> {
        self(key)
    }
}

/// Rewrites the system before drawing, e.g. to randomize static offsets.
pub type SetupFn = Arc<dyn Fn(PrngKey, &System) -> Result<System, GenError> + Send + Sync>;

/// Shapes `(leftover key, q, x, system)` into the generator's output.
pub type FinalizeFn = Arc<
    dyn Fn(PrngKey, Array2<f32>, Array2<Transform>, &System) -> Result<Tree, GenError>
        + Send
        + Sync,
>;

fn pos_rot_leaves(x: &Array2<Transform>) -> Tree {
    let (pos, rot) = grid::grid_to_arrays(x);
    Tree::map([("pos", Tree::leaf(pos)), ("rot", Tree::leaf(rot))])
}

/// Default finalize: `Seq([q, Map { pos, rot }])`.
///
/// `q` is `(T, total_dof)`, `pos` is `(T, N, 3)` and `rot` is `(T, N, 4)`.
pub fn finalize_q_x(
    _key: PrngKey,
    q: Array2<f32>,
    x: Array2<Transform>,
    _sys: &System,
) -> Result<Tree, GenError> {
    Ok(Tree::Seq(vec![Tree::leaf(q), pos_rot_leaves(&x)]))
}

/// Finalize that names every link: `Map { q, links: Map { name: Map { pos, rot } } }`.
///
/// Per-link leaves are `(T, 3)` and `(T, 4)`.
pub fn finalize_link_series(
    _key: PrngKey,
    q: Array2<f32>,
    x: Array2<Transform>,
    sys: &System,
) -> Result<Tree, GenError> {
    let mut links = BTreeMap::new();
    for (i, name) in sys.link_names().into_iter().enumerate() {
        let series = grid::take_link(&x, i).map_err(KinematicsError::from)?;
        let pos = Array2::from_shape_fn((series.len(), 3), |(k, c)| {
            series[k].pos().to_array()[c]
        });
        let rot = Array2::from_shape_fn((series.len(), 4), |(k, c)| {
            series[k].rot().to_array()[c]
        });
        links.insert(
            name.to_owned(),
            Tree::map([("pos", Tree::leaf(pos)), ("rot", Tree::leaf(rot))]),
        );
    }
    Ok(Tree::map([("q", Tree::leaf(q)), ("links", Tree::Map(links))]))
}

fn default_finalize() -> FinalizeFn {
    Arc::new(finalize_q_x)
}

/// Randomized chain-motion generator over a fixed system.
#[derive(Clone)]
pub struct RcmgGenerator {
    sys: System,
    config: RcmgConfig,
    setup: Option<SetupFn>,
    finalize: FinalizeFn,
}

impl std::fmt::Debug for RcmgGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RcmgGenerator")
            .field("links", &self.sys.num_links())
            .field("config", &self.config)
            .field("setup", &self.setup.is_some())
            .finish_non_exhaustive()
    }
}

impl RcmgGenerator {
    /// Validates the configuration and every link's draw capability.
    ///
    /// A link whose joint type has no draw function fails here, naming the
    /// type, rather than on the first call. `finalize` defaults to
    /// [`finalize_q_x`].
    pub fn build(
        sys: System,
        config: RcmgConfig,
        setup: Option<SetupFn>,
        finalize: Option<FinalizeFn>,
    ) -> Result<Self, GenError> {
        config.validate()?;
        if let Some(link) = sys.links().iter().find(|l| l.spec.draw.is_none()) {
            return Err(GenError::MissingDrawFn(link.joint));
        }
        Ok(Self {
            sys,
            config,
            setup,
            finalize: finalize.unwrap_or_else(default_finalize),
        })
    }

    /// Base system (before setup).
    pub fn system(&self) -> &System {
        &self.sys
    }

    /// Motion configuration.
    pub fn config(&self) -> &RcmgConfig {
        &self.config
    }

    /// Draws the `(T, total_dof)` coordinate matrix, returning the leftover key.
    fn draw_q(&self, sys: &System, key: PrngKey) -> Result<(PrngKey, Array2<f32>), GenError> {
        let n = self.config.num_samples();
        let links = sys.links();
        let sentinel = (key, Array2::<f32>::zeros((n, 0)));
        let drawn = scan::tree(
            &sys.parents(),
            ScanMode::Sequential,
            &sentinel,
            links,
            |_, (prev, _), link| -> Result<_, GenError> {
                let (carry, key_t, key_v) = prev.clone().split3();
                let draw = link.spec.draw.ok_or(GenError::MissingDrawFn(link.joint))?;
                let block = draw(&self.config, key_t, key_v);
                if block.dim() != (n, link.spec.dof) {
                    return Err(GenError::Shape(format!(
                        "`{}` draw returned {:?}, expected ({n}, {})",
                        link.joint,
                        block.dim(),
                        link.spec.dof
                    )));
                }
                Ok((carry, block))
            },
        )?;
        let (mut carries, blocks): (Vec<_>, Vec<_>) = drawn.into_iter().unzip();
        let leftover = carries.pop().unwrap_or(sentinel.0);
        if blocks.is_empty() {
            return Ok((leftover, sentinel.1));
        }
        let views: Vec<_> = blocks.iter().map(|b| b.view()).collect();
        Ok((leftover, ndarray::concatenate(Axis(1), &views)?))
    }
}

impl Generator for RcmgGenerator {
    fn generate(&self, key: PrngKey) -> Result<Tree, GenError> {
        let (key_start, key_setup) = key.split2();
        let sys: Cow<'_, System> = match &self.setup {
            Some(setup) => Cow::Owned(setup(key_setup, &self.sys)?),
            None => Cow::Borrowed(&self.sys),
        };
        let (leftover, q) = self.draw_q(&sys, key_start)?;
        let x = forward_kinematics(&sys, q.view())?;
        (self.finalize)(leftover, q, x, &sys)
    }
}

/// Builds a shareable generator with the default finalize and no setup.
pub fn build_generator(sys: System, config: RcmgConfig) -> Result<Arc<dyn Generator>, GenError> {
    Ok(Arc::new(RcmgGenerator::build(sys, config, None, None)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcmg_core::{JointRegistry, JointSpec, JointType, LinkDef, SystemBuilder};

    fn short() -> RcmgConfig {
        RcmgConfig {
            t: 0.3,
            ..RcmgConfig::default()
        }
    }

    #[test]
    fn default_finalize_shapes() {
        let registry = JointRegistry::with_builtins();
        let sys = SystemBuilder::new(&registry)
            .link(LinkDef::new("a", JointType::Spherical))
            .link(LinkDef::new("b", JointType::Py).parent("a"))
            .build()
            .unwrap();
        let gen = RcmgGenerator::build(sys, short(), None, None).unwrap();
        let out = gen.generate(PrngKey::from_seed(1)).unwrap();
        let shapes: Vec<Vec<usize>> = out.leaves().iter().map(|a| a.shape().to_vec()).collect();
        assert_eq!(shapes, vec![vec![30, 5], vec![30, 2, 3], vec![30, 2, 4]]);
    }

    #[test]
    fn link_series_names_every_link() {
        let registry = JointRegistry::with_builtins();
        let sys = SystemBuilder::new(&registry)
            .link(LinkDef::new("hip", JointType::Rz))
            .link(LinkDef::new("knee", JointType::Ry).parent("hip"))
            .build()
            .unwrap();
        let finalize: FinalizeFn = Arc::new(finalize_link_series);
        let gen = RcmgGenerator::build(sys, short(), None, Some(finalize)).unwrap();
        let Tree::Map(out) = gen.generate(PrngKey::from_seed(2)).unwrap() else {
            unreachable!("finalize_link_series returns a map")
        };
        let Some(Tree::Map(links)) = out.get("links") else {
            unreachable!("links entry is a map")
        };
        assert_eq!(links.keys().collect::<Vec<_>>(), vec!["hip", "knee"]);
        assert_eq!(links["knee"].leaves()[0].shape(), &[30, 3]);
    }

    fn fk_identity(
        _: &[f32],
        _: &rcmg_core::JointParams,
    ) -> Result<Transform, rcmg_core::MathError> {
        Ok(Transform::identity())
    }

    #[test]
    fn missing_draw_fn_is_named_at_build() {
        let mut registry = JointRegistry::with_builtins();
        registry.register(JointType::Custom("saddle"), JointSpec::new(2, fk_identity, None));
        let sys = SystemBuilder::new(&registry)
            .link(LinkDef::new("seat", JointType::Custom("saddle")))
            .build()
            .unwrap();
        let err = RcmgGenerator::build(sys, short(), None, None).unwrap_err();
        assert_eq!(err.to_string(), "joint type `saddle` has no draw function");
    }

    #[test]
    fn closures_are_generators() {
        let gen = |key: PrngKey| -> Result<Tree, GenError> {
            let v = key.into_prng().next_f32();
            Ok(Tree::leaf(ndarray::arr1(&[v])))
        };
        let a = gen.generate(PrngKey::from_seed(3)).unwrap();
        let b = gen.generate(PrngKey::from_seed(3)).unwrap();
        assert_eq!(a, b);
    }
}
