// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! rcmg-gen: randomized motion generators and deterministic batching.
//!
//! A [`Generator`] turns one key into one sample [`Tree`]. [`RcmgGenerator`]
//! draws random chain motion for every link of a system and runs forward
//! kinematics; [`batch_generators_lazy`] stacks many samples over a
//! `P × V` grid of scoped worker threads; [`BatchCache`] serves an eagerly
//! materialized pool in fixed-size batches.
//!
//! The library emits `tracing` events but never installs a subscriber.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::redundant_pub_crate,
    clippy::many_single_char_names,
    clippy::module_name_repetitions,
    clippy::use_self,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::option_if_let_else,
    clippy::doc_markdown,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::similar_names,
    clippy::trivially_copy_pass_by_ref,
    clippy::needless_pass_by_value,
    clippy::type_complexity
)]

mod batch;
mod cache;
mod error;
mod generator;
mod normalizer;
mod setup;
mod tree;

pub use batch::{
    available_units, batch_generator_lazy, batch_generators_lazy, build_batch_matrix,
    distribute_batchsize, expand_batchsize, merge_batchsize, BatchSizes, BatchedGenerator,
    MAX_SINGLE_UNIT_BATCH,
};
pub use cache::{batch_generators_eager, batch_generators_eager_to_list, BatchCache};
pub use error::GenError;
pub use generator::{
    build_generator, finalize_link_series, finalize_q_x, FinalizeFn, Generator, RcmgGenerator,
    SetupFn,
};
pub use normalizer::{make_normalizer_from_generator, Normalizer, STD_EPSILON};
pub use setup::{chain_setups, randomize_joint_axes, randomize_positions};
pub use tree::Tree;
