// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use rcmg_core::PrngKey;
use rcmg_dry_tests::{failing_generator, tagged_generator, TAG_LEAF};
use rcmg_gen::{batch_generators_lazy, BatchSizes, GenError, Tree};

fn tags(batch: &Tree) -> Vec<usize> {
    let Tree::Map(m) = batch else {
        unreachable!("tagged generators emit maps")
    };
    m[TAG_LEAF].leaves()[0].iter().map(|&t| t as usize).collect()
}

#[test]
fn static_counts_are_exact_and_contiguous() {
    let gens = (0..3).map(tagged_generator).collect();
    let batched = batch_generators_lazy(gens, BatchSizes::Static(vec![3, 5, 8]), 2).unwrap();
    let out = batched.generate(PrngKey::from_seed(1)).unwrap();
    let slots = tags(&out);
    assert_eq!(slots.len(), 16);
    assert_eq!(slots, [vec![0; 3], vec![1; 5], vec![2; 8]].concat());

    // the slot map is fixed across calls
    let again = batched.generate(PrngKey::from_seed(2)).unwrap();
    assert_eq!(tags(&again), slots);
}

#[test]
fn stochastic_assignment_is_keyed() {
    let gens: Vec<_> = (0..4).map(tagged_generator).collect();
    let batched = batch_generators_lazy(gens, BatchSizes::Stochastic(32), 4).unwrap();
    let a = tags(&batched.generate(PrngKey::from_seed(10)).unwrap());
    let b = tags(&batched.generate(PrngKey::from_seed(10)).unwrap());
    assert_eq!(a, b);
    assert!(a.iter().all(|&t| t < 4));

    let differs = (11..20).any(|s| tags(&batched.generate(PrngKey::from_seed(s)).unwrap()) != a);
    assert!(differs, "slot draws never changed with the key");
}

#[test]
fn every_slot_gets_its_own_key() {
    let gens = vec![tagged_generator(0)];
    let batched = batch_generators_lazy(gens, BatchSizes::Static(vec![24]), 3).unwrap();
    let Tree::Map(out) = batched.generate(PrngKey::from_seed(4)).unwrap() else {
        unreachable!()
    };
    let draws: Vec<f32> = out["draw"].leaves()[0].iter().copied().collect();
    for i in 0..draws.len() {
        for j in (i + 1)..draws.len() {
            assert_ne!(draws[i].to_bits(), draws[j].to_bits(), "slots {i} and {j}");
        }
    }
}

#[test]
fn one_failing_slot_fails_the_whole_batch() {
    let gens = vec![tagged_generator(0), failing_generator()];
    let batched = batch_generators_lazy(gens, BatchSizes::Static(vec![15, 1]), 4).unwrap();
    for seed in 0..3 {
        assert!(matches!(
            batched.generate(PrngKey::from_seed(seed)),
            Err(GenError::Shape(_))
        ));
    }

    let healthy = vec![tagged_generator(0), tagged_generator(1)];
    let batched = batch_generators_lazy(healthy, BatchSizes::Static(vec![15, 1]), 4).unwrap();
    assert_eq!(tags(&batched.generate(PrngKey::from_seed(0)).unwrap()).len(), 16);
}
