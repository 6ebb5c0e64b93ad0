// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error type shared by every generator, batching and cache operation.

use rcmg_core::{
    ConfigError, JointType, KinematicsError, MathError, ScanError, SystemError,
};
use thiserror::Error;

/// Failures raised while building or running generators.
///
/// Configuration problems name the offending joint type; shape problems are
/// raised before any sample is drawn. A batched call either returns every
/// sample or one of these.
#[derive(Debug, Error)]
pub enum GenError {
    /// Building or editing the system failed.
    #[error(transparent)]
    System(#[from] SystemError),
    /// Forward kinematics rejected the drawn coordinates.
    #[error(transparent)]
    Kinematics(#[from] KinematicsError),
    /// The motion configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Numeric-domain failure (non-finite or degenerate input).
    #[error(transparent)]
    Math(#[from] MathError),
    /// Per-link arrays did not line up with the link table.
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// A link's joint type cannot be generated.
    #[error("joint type `{0}` has no draw function")]
    MissingDrawFn(JointType),
    /// The batch could not be split over the available units.
    #[error("batch size {batch} cannot be split over {units} parallel units")]
    BatchSize {
        /// Requested total batch size.
        batch: usize,
        /// Parallel units.
        units: usize,
    },
    /// Static batch sizes did not pair up with the generators.
    #[error("{generators} generators but {sizes} batch sizes")]
    BatchSizesMismatch {
        /// Number of generators.
        generators: usize,
        /// Number of per-generator sizes.
        sizes: usize,
    },
    /// The offline pool cannot fill a single batch.
    #[error("pool of {pool} samples cannot serve batches of {batch}")]
    PoolTooSmall {
        /// Samples in the pool.
        pool: usize,
        /// Requested batch size.
        batch: usize,
    },
    /// Arrays or trees had incompatible shapes.
    #[error("shape error: {0}")]
    Shape(String),
}

impl From<ndarray::ShapeError> for GenError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::Shape(err.to_string())
    }
}
