// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! rcmg-core: kinematic trees, rigid transforms and forward kinematics.
//!
//! A [`System`] is a parent-ordered table of links. Every link carries a
//! joint type whose capabilities (coordinate width, FK function, trajectory
//! draw) are resolved from a [`JointRegistry`] when the system is built.
//! Per-link computations run through the ordered fold in [`scan`], which
//! guarantees that a link is visited after its parent.
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

/// Deterministic math subsystem (Vec3, Quat, PRNG, split keys).
pub mod math;

/// Rigid transforms and `T × N` transform grids.
pub mod transform;

mod config;
pub mod draw;
mod joint;
mod kinematics;
pub mod scan;
mod system;
pub mod xs;

pub use config::{ConfigError, RcmgConfig};
pub use joint::{
    JointDrawFn, JointError, JointFkFn, JointParams, JointRegistry, JointSpec, JointType,
};
pub use kinematics::{
    forward_kinematics, forward_kinematics_step, local_transforms_step, KinematicsError,
};
pub use math::{MathError, Prng, PrngKey, Quat, Vec3};
pub use scan::{ScanError, ScanMode};
pub use system::{Link, LinkDef, System, SystemBuilder, SystemError};
pub use transform::grid::GridError;
pub use transform::Transform;
