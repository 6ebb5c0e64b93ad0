// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Eagerly materialized sample pools served in fixed-size batches.

use std::sync::Arc;

use rcmg_core::{Prng, PrngKey};
use tracing::{debug, info, instrument};

use crate::batch::batch_generator_lazy;
use crate::error::GenError;
use crate::generator::Generator;
use crate::tree::Tree;

/// Draws `sizes[i]` samples from `generators[i]` and returns them unbatched.
///
/// The root key is `PrngKey::from_seed(seed)`; each generator consumes one
/// split of it in order. Generators with a size of zero contribute nothing
/// but still consume their split.
#[instrument(skip(generators), fields(generators = generators.len()))]
pub fn batch_generators_eager_to_list(
    generators: &[Arc<dyn Generator>],
    sizes: &[usize],
    seed: u64,
    units: usize,
) -> Result<Vec<Tree>, GenError> {
    if generators.len() != sizes.len() {
        return Err(GenError::BatchSizesMismatch {
            generators: generators.len(),
            sizes: sizes.len(),
        });
    }
    let mut key = PrngKey::from_seed(seed);
    let mut data = Vec::with_capacity(sizes.iter().sum());
    for (i, (generator, &size)) in generators.iter().zip(sizes).enumerate() {
        let (next, consume) = key.split2();
        key = next;
        if size == 0 {
            debug!(generator = i, "skipping empty eager size");
            continue;
        }
        let sample = batch_generator_lazy(generator, size, units)?.generate(consume)?;
        for j in 0..size {
            data.push(sample.index(j)?);
        }
        debug!(generator = i, size, pooled = data.len(), "eager generation");
    }
    Ok(data)
}

/// Serves whole batches from a fixed pool through a cursor.
///
/// With `M` samples and batch size `K` the pool holds `M / K` batches; a
/// remainder smaller than `K` is never served. When shuffling is on the pool
/// is reshuffled every time the cursor is back at the first batch.
///
/// The cursor is plain mutable state: share a cache between threads only
/// behind your own lock.
#[derive(Debug, Clone)]
pub struct BatchCache {
    data: Vec<Tree>,
    batch: usize,
    batches: usize,
    cursor: usize,
    shuffle: bool,
    prng: Prng,
}

impl BatchCache {
    /// Wraps a pool of unbatched samples.
    pub fn from_list(
        data: Vec<Tree>,
        batch: usize,
        shuffle: bool,
        seed: u64,
    ) -> Result<Self, GenError> {
        if batch == 0 || data.len() < batch {
            return Err(GenError::PoolTooSmall {
                pool: data.len(),
                batch,
            });
        }
        let batches = data.len() / batch;
        info!(
            pool = data.len(),
            batch,
            batches,
            shuffle,
            "batch cache ready"
        );
        Ok(Self {
            data,
            batch,
            batches,
            cursor: 0,
            shuffle,
            prng: PrngKey::from_seed(seed).into_prng(),
        })
    }

    /// Index of the next batch to serve.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whole batches per pass over the pool.
    pub fn batches_per_pass(&self) -> usize {
        self.batches
    }

    /// Samples in the pool.
    pub fn pool_len(&self) -> usize {
        self.data.len()
    }

    /// Next `(K, …)` batch.
    pub fn next_batch(&mut self) -> Result<Tree, GenError> {
        if self.shuffle && self.cursor == 0 {
            self.prng.shuffle(&mut self.data);
        }
        let start = self.cursor * self.batch;
        let out = Tree::stack(&self.data[start..start + self.batch])?;
        self.cursor = (self.cursor + 1) % self.batches;
        Ok(out)
    }
}

/// [`batch_generators_eager_to_list`] followed by [`BatchCache::from_list`].
pub fn batch_generators_eager(
    generators: &[Arc<dyn Generator>],
    sizes: &[usize],
    batch: usize,
    shuffle: bool,
    seed: u64,
    units: usize,
) -> Result<BatchCache, GenError> {
    let data = batch_generators_eager_to_list(generators, sizes, seed, units)?;
    BatchCache::from_list(data, batch, shuffle, seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    fn pool(n: usize) -> Vec<Tree> {
        (0..n).map(|i| Tree::leaf(arr1(&[i as f32]))).collect()
    }

    #[test]
    fn remainder_is_never_served() {
        let mut cache = BatchCache::from_list(pool(7), 3, false, 0).unwrap();
        assert_eq!(cache.batches_per_pass(), 2);
        let first = cache.next_batch().unwrap();
        let second = cache.next_batch().unwrap();
        let third = cache.next_batch().unwrap();
        assert_eq!(first, third);
        assert_ne!(first, second);
        assert!(!second.leaves()[0].iter().any(|&v| v >= 6.0));
    }

    #[test]
    fn pool_smaller_than_batch_is_rejected() {
        let err = BatchCache::from_list(pool(2), 3, true, 0).unwrap_err();
        assert!(matches!(err, GenError::PoolTooSmall { pool: 2, batch: 3 }));
    }
}
