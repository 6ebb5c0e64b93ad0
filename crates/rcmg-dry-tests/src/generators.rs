// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Generators whose output reveals which generator and which key made it.

use std::sync::Arc;

use ndarray::Array2;
use rcmg_core::PrngKey;
use rcmg_gen::{GenError, Generator, Tree};

/// Map key of the `(1, 1)` leaf holding the generator's tag.
pub const TAG_LEAF: &str = "tag";

/// Generator emitting `Map { tag: [[tag]], draw: [[u]] }`.
///
/// `u` is the first uniform draw of the key, so distinct keys give distinct
/// samples. Both leaves are `(1, 1)` so batching adds exactly one axis.
pub fn tagged_generator(tag: usize) -> Arc<dyn Generator> {
    Arc::new(move |key: PrngKey| -> Result<Tree, GenError> {
        let draw = key.into_prng().next_f32();
        Ok(Tree::map([
            (TAG_LEAF, Tree::leaf(Array2::from_elem((1, 1), tag as f32))),
            ("draw", Tree::leaf(Array2::from_elem((1, 1), draw))),
        ]))
    })
}

/// Generator that rejects every key with [`GenError::Shape`].
pub fn failing_generator() -> Arc<dyn Generator> {
    Arc::new(|_key: PrngKey| -> Result<Tree, GenError> {
        Err(GenError::Shape("failing generator".to_owned()))
    })
}
