// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Small kinematic systems and short motion configs.

use std::sync::Arc;

use rcmg_core::{
    JointRegistry, JointType, LinkDef, RcmgConfig, System, SystemBuilder, Transform, Vec3,
};
use rcmg_gen::{build_generator, Generator};

/// Samples produced by [`short_config`].
pub const SHORT_SAMPLES: usize = 50;

/// Default ranges over half a second (50 samples at 100 Hz).
pub fn short_config() -> RcmgConfig {
    RcmgConfig {
        t: 0.5,
        ..RcmgConfig::default()
    }
}

/// Free-floating pelvis with two hinged thighs.
///
/// Link 0 is a free joint (7 columns); links 1 and 2 are `rx` hinges attached
/// to link 0, so `total_dof == 9`.
///
/// # Panics
/// Panics if `registry` lacks the built-in `free` or `rx` types.
#[allow(clippy::expect_used)]
pub fn three_link_system(registry: &JointRegistry) -> System {
    let hip = |y: f32| Transform::from_pos(Vec3::new(0.0, y, -0.1)).expect("finite offset");
    SystemBuilder::new(registry)
        .link(LinkDef::new("pelvis", JointType::Free))
        .link(
            LinkDef::new("thigh_left", JointType::Rx)
                .parent("pelvis")
                .transform(hip(0.1)),
        )
        .link(
            LinkDef::new("thigh_right", JointType::Rx)
                .parent("pelvis")
                .transform(hip(-0.1)),
        )
        .build()
        .expect("three-link system builds")
}

/// [`three_link_system`] wrapped in a generator using [`short_config`].
///
/// # Panics
/// Panics if `registry` lacks the built-in `free` or `rx` types.
#[allow(clippy::expect_used)]
pub fn three_link_generator(registry: &JointRegistry) -> Arc<dyn Generator> {
    build_generator(three_link_system(registry), short_config()).expect("generator builds")
}
