// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for rcmg crates.
//!
//! # Modules
//!
//! - [`systems`] - Small kinematic systems and short motion configs
//! - [`generators`] - Tagged and failing generators for batching tests
#![forbid(unsafe_code)]

pub mod generators;
pub mod systems;

pub use generators::{failing_generator, tagged_generator, TAG_LEAF};
pub use systems::{short_config, three_link_generator, three_link_system, SHORT_SAMPLES};
