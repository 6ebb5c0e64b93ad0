// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use std::sync::Arc;

use rcmg_core::{JointRegistry, JointSpec, JointType, LinkDef, PrngKey, SystemBuilder};
use rcmg_dry_tests::{short_config, three_link_generator, three_link_system, SHORT_SAMPLES};
use rcmg_gen::{
    batch_generator_lazy, batch_generators_lazy, build_generator, BatchSizes, GenError,
};

fn shapes(tree: &rcmg_gen::Tree) -> Vec<Vec<usize>> {
    tree.leaves().iter().map(|a| a.shape().to_vec()).collect()
}

#[test]
fn three_link_sample_shapes() {
    let registry = JointRegistry::with_builtins();
    let sys = three_link_system(&registry);
    assert_eq!(sys.total_dof(), 9);
    let gen = three_link_generator(&registry);
    let sample = gen.generate(PrngKey::from_seed(42)).unwrap();
    assert_eq!(
        shapes(&sample),
        vec![
            vec![SHORT_SAMPLES, 9],
            vec![SHORT_SAMPLES, 3, 3],
            vec![SHORT_SAMPLES, 3, 4],
        ]
    );
}

#[test]
fn generation_is_bit_reproducible() {
    let registry = JointRegistry::with_builtins();
    let gen = three_link_generator(&registry);
    let a = gen.generate(PrngKey::from_seed(7)).unwrap();
    let b = gen.generate(PrngKey::from_seed(7)).unwrap();
    assert_eq!(a, b);
    let c = gen.generate(PrngKey::from_seed(8)).unwrap();
    assert_ne!(a, c);
}

#[test]
fn batch_of_sixteen_ignores_the_unit_split() {
    let registry = JointRegistry::with_builtins();
    let gen = three_link_generator(&registry);

    let serial = batch_generators_lazy(vec![Arc::clone(&gen)], BatchSizes::Static(vec![16]), 1)
        .unwrap()
        .generate(PrngKey::from_seed(3))
        .unwrap();
    let parallel = batch_generators_lazy(vec![Arc::clone(&gen)], BatchSizes::Static(vec![16]), 2)
        .unwrap()
        .generate(PrngKey::from_seed(3))
        .unwrap();

    assert_eq!(serial.leaves()[0].shape(), &[16, SHORT_SAMPLES, 9]);
    assert_eq!(serial, parallel);
}

#[test]
fn flat_slot_f_uses_sub_key_f() {
    let registry = JointRegistry::with_builtins();
    let gen = three_link_generator(&registry);
    let batched = batch_generators_lazy(vec![Arc::clone(&gen)], BatchSizes::Static(vec![12]), 3)
        .unwrap()
        .generate(PrngKey::from_seed(5))
        .unwrap();
    for (f, key) in PrngKey::from_seed(5).split(12).into_iter().enumerate() {
        assert_eq!(batched.index(f).unwrap(), gen.generate(key).unwrap(), "slot {f}");
    }
}

#[test]
fn already_batched_generator_is_returned_unchanged() {
    let registry = JointRegistry::with_builtins();
    let gen = three_link_generator(&registry);
    let once = batch_generator_lazy(&gen, 4, 1).unwrap();
    assert!(!Arc::ptr_eq(&once, &gen));
    let twice = batch_generator_lazy(&once, 4, 1).unwrap();
    assert!(Arc::ptr_eq(&once, &twice));
    let sample = twice.generate(PrngKey::from_seed(0)).unwrap();
    assert_eq!(sample.first_leaf_ndim(), Some(3));
}

#[test]
fn indivisible_batch_fails_before_drawing() {
    let registry = JointRegistry::with_builtins();
    let gen = three_link_generator(&registry);
    assert!(matches!(
        batch_generators_lazy(vec![gen], BatchSizes::Static(vec![18]), 4),
        Err(GenError::BatchSize {
            batch: 18,
            units: 4
        })
    ));
}

fn fk_fixed(
    _: &[f32],
    _: &rcmg_core::JointParams,
) -> Result<rcmg_core::Transform, rcmg_core::MathError> {
    Ok(rcmg_core::Transform::identity())
}

#[test]
fn joint_without_draw_fn_is_named() {
    let mut registry = JointRegistry::with_builtins();
    registry.register(JointType::Custom("gimbal"), JointSpec::new(3, fk_fixed, None));
    let sys = SystemBuilder::new(&registry)
        .link(LinkDef::new("base", JointType::Free))
        .link(LinkDef::new("mount", JointType::Custom("gimbal")).parent("base"))
        .build()
        .unwrap();
    let Err(err) = build_generator(sys, short_config()) else {
        unreachable!("gimbal has no draw function");
    };
    assert!(matches!(err, GenError::MissingDrawFn(JointType::Custom("gimbal"))));
    assert!(err.to_string().contains("gimbal"));
}
