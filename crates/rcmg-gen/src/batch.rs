// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Lazy batching of generators over a `P × V` grid.
//!
//! A batch of `B` samples is laid out as `P` parallel units of `V` lanes
//! each. The call's key is split into exactly `B` sub-keys and sub-key `f`
//! always lands on cell `(f / V, f % V)`, so the output is the same for every
//! `(P, V)` split of the same `B`.
//!
//! Units run on scoped worker threads; a unit's lanes run in order on its
//! thread. The only synchronization point is the final gather, and a failure
//! in any cell fails the whole call.

use std::num::NonZeroUsize;
use std::sync::Arc;

use rcmg_core::PrngKey;
use tracing::{debug, instrument, warn};

use crate::error::GenError;
use crate::generator::Generator;
use crate::tree::Tree;

/// Batches up to this size run as a single unit of `B` lanes.
pub const MAX_SINGLE_UNIT_BATCH: usize = 8;

/// Number of parallel units on this machine (at least 1).
pub fn available_units() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Splits `batch` into `(P, V)`.
///
/// Batches of at most [`MAX_SINGLE_UNIT_BATCH`] use one unit. Larger batches
/// use every unit and must divide evenly.
pub fn distribute_batchsize(batch: usize, units: usize) -> Result<(usize, usize), GenError> {
    if batch == 0 || units == 0 {
        return Err(GenError::BatchSize { batch, units });
    }
    if batch <= MAX_SINGLE_UNIT_BATCH {
        return Ok((1, batch));
    }
    if batch % units != 0 {
        return Err(GenError::BatchSize { batch, units });
    }
    Ok((units, batch / units))
}

/// Run-length slot map: generator `i` fills `sizes[i]` consecutive slots.
pub fn build_batch_matrix(sizes: &[usize]) -> Vec<usize> {
    sizes
        .iter()
        .enumerate()
        .flat_map(|(i, &n)| std::iter::repeat(i).take(n))
        .collect()
}

/// `(P, V, …)` leaves to `(P·V, …)`, row-major.
pub fn merge_batchsize(tree: &Tree) -> Result<Tree, GenError> {
    tree.merge_leading()
}

/// `(P·V, …)` leaves to `(P, V, …)`.
pub fn expand_batchsize(tree: &Tree, p: usize) -> Result<Tree, GenError> {
    tree.expand_leading(p)
}

/// How batch slots are assigned to generators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchSizes {
    /// One count per generator; the slot map is fixed for every call.
    Static(Vec<usize>),
    /// Total batch size; every call draws a generator per slot.
    Stochastic(usize),
}

impl BatchSizes {
    /// Total batch size `B`.
    pub fn total(&self) -> usize {
        match self {
            Self::Static(sizes) => sizes.iter().sum(),
            Self::Stochastic(batch) => *batch,
        }
    }
}

#[derive(Debug, Clone)]
enum Assignment {
    Static(Vec<usize>),
    Stochastic,
}

/// Generator producing `B` samples per call with a leading batch axis.
pub struct BatchedGenerator {
    generators: Vec<Arc<dyn Generator>>,
    assignment: Assignment,
    batch: usize,
    units: usize,
    lanes: usize,
}

impl std::fmt::Debug for BatchedGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchedGenerator")
            .field("generators", &self.generators.len())
            .field("assignment", &self.assignment)
            .field("batch", &self.batch)
            .field("units", &self.units)
            .field("lanes", &self.lanes)
            .finish()
    }
}

impl BatchedGenerator {
    /// Validates sizes and fixes the `(P, V)` grid for `units` parallel units.
    pub fn new(
        generators: Vec<Arc<dyn Generator>>,
        sizes: BatchSizes,
        units: usize,
    ) -> Result<Self, GenError> {
        let batch = sizes.total();
        let assignment = match sizes {
            BatchSizes::Static(sizes) => {
                if sizes.len() != generators.len() {
                    return Err(GenError::BatchSizesMismatch {
                        generators: generators.len(),
                        sizes: sizes.len(),
                    });
                }
                Assignment::Static(build_batch_matrix(&sizes))
            }
            BatchSizes::Stochastic(_) => {
                if generators.is_empty() {
                    return Err(GenError::BatchSizesMismatch {
                        generators: 0,
                        sizes: 1,
                    });
                }
                Assignment::Stochastic
            }
        };
        let (units, lanes) = distribute_batchsize(batch, units)?;
        Ok(Self {
            generators,
            assignment,
            batch,
            units,
            lanes,
        })
    }

    /// The `(P, V)` grid.
    pub fn grid(&self) -> (usize, usize) {
        (self.units, self.lanes)
    }

    /// Total batch size.
    pub fn batch_size(&self) -> usize {
        self.batch
    }

    fn slots(&self, key: PrngKey) -> (PrngKey, Vec<usize>) {
        match &self.assignment {
            Assignment::Static(slots) => (key, slots.clone()),
            Assignment::Stochastic => {
                let (key, consume) = key.split2();
                let mut prng = consume.into_prng();
                let n = self.generators.len();
                let slots = (0..self.batch).map(|_| prng.next_index(n)).collect();
                (key, slots)
            }
        }
    }

    fn run_unit(&self, cells: Vec<(usize, PrngKey)>) -> Result<Tree, GenError> {
        let samples = cells
            .into_iter()
            .map(|(which, key)| self.generators[which].generate(key))
            .collect::<Result<Vec<_>, _>>()?;
        Tree::stack(&samples)
    }
}

impl Generator for BatchedGenerator {
    fn generate(&self, key: PrngKey) -> Result<Tree, GenError> {
        let (key, slots) = self.slots(key);
        let mut cells = slots.into_iter().zip(key.split(self.batch));
        let units: Vec<Vec<(usize, PrngKey)>> = (0..self.units)
            .map(|_| cells.by_ref().take(self.lanes).collect())
            .collect();

        let rows = if self.units == 1 {
            units
                .into_iter()
                .map(|cells| self.run_unit(cells))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            std::thread::scope(|s| {
                let handles: Vec<_> = units
                    .into_iter()
                    .map(|cells| s.spawn(move || self.run_unit(cells)))
                    .collect();
                handles
                    .into_iter()
                    .map(|h| match h.join() {
                        Ok(row) => row,
                        Err(e) => std::panic::resume_unwind(e),
                    })
                    .collect::<Result<Vec<_>, _>>()
            })?
        };
        merge_batchsize(&Tree::stack(&rows)?)
    }
}

/// Batches several generators into one.
///
/// The grid is sized for `units` parallel units; see
/// [`distribute_batchsize`].
#[instrument(skip(generators), fields(generators = generators.len()))]
pub fn batch_generators_lazy(
    generators: Vec<Arc<dyn Generator>>,
    sizes: BatchSizes,
    units: usize,
) -> Result<Arc<dyn Generator>, GenError> {
    let batched = BatchedGenerator::new(generators, sizes, units)?;
    debug!(grid = ?batched.grid(), "batched generator ready");
    Ok(Arc::new(batched))
}

/// Batches a single generator `batch` times.
///
/// The generator is probed once with `PrngKey::from_seed(0)`. If its first
/// leaf already has more than two axes it is taken to be batched and is
/// returned unchanged.
#[instrument(skip(generator))]
pub fn batch_generator_lazy(
    generator: &Arc<dyn Generator>,
    batch: usize,
    units: usize,
) -> Result<Arc<dyn Generator>, GenError> {
    let probe = generator.generate(PrngKey::from_seed(0))?;
    if let Some(ndim) = probe.first_leaf_ndim().filter(|&n| n > 2) {
        warn!(
            ndim,
            "generator seems already batched; returning it unchanged"
        );
        return Ok(Arc::clone(generator));
    }
    batch_generators_lazy(
        vec![Arc::clone(generator)],
        BatchSizes::Static(vec![batch]),
        units,
    )
}
