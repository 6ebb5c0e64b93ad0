// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use rcmg_core::{JointRegistry, JointType, PrngKey};
use rcmg_dry_tests::short_config;

#[test]
fn same_keys_same_trajectory() {
    let config = short_config();
    let registry = JointRegistry::with_builtins();
    for ty in JointType::BUILTINS {
        let draw = registry.resolve(ty).unwrap().draw.unwrap();
        let (kt, kv) = PrngKey::from_seed(11).split2();
        let first = draw(&config, kt, kv);
        let (kt, kv) = PrngKey::from_seed(11).split2();
        let second = draw(&config, kt, kv);
        assert_eq!(first, second, "{ty} draw is not a pure function of its keys");
        assert_eq!(first.nrows(), config.num_samples());
    }
}

#[test]
fn different_value_keys_change_the_trajectory() {
    let config = short_config();
    let (kt, _) = PrngKey::from_seed(2).split2();
    let (a, b) = PrngKey::from_seed(3).split2();
    let first = rcmg_core::draw::draw_revolute(&config, kt.clone(), a);
    let second = rcmg_core::draw::draw_revolute(&config, kt, b);
    assert_ne!(first, second);
}

#[test]
fn hinge_samples_are_continuous() {
    let config = short_config();
    let (kt, kv) = PrngKey::from_seed(21).split2();
    let q = rcmg_core::draw::draw_revolute(&config, kt, kv);
    // Velocity is bounded by dang_max, so one sample can move at most dang_max·ts
    // plus cosine overshoot.
    let bound = config.dang_max * config.ts * 2.0;
    for pair in q.column(0).to_vec().windows(2) {
        assert!((pair[1] - pair[0]).abs() <= bound, "{pair:?}");
    }
}
