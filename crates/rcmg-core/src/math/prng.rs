// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
/// Stateful `xoroshiro128+` pseudo-random number generator.
///
/// A `Prng` is what a [`crate::math::PrngKey`] turns into once it is consumed;
/// it is never split. Every draw made from one instance is a pure function of
/// the seed and the number of previous draws.
///
/// * Not cryptographically secure; use only for data synthesis.
/// * Matching seeds yield identical sequences across supported platforms.
#[derive(Debug, Clone)]
pub struct Prng {
    state: [u64; 2],
}

impl Prng {
    /// Constructs a PRNG from two 64-bit seeds.
    ///
    /// The all-zero state is a fixed point of xoroshiro and gets replaced by a
    /// golden-ratio constant.
    pub fn from_seed(seed0: u64, seed1: u64) -> Self {
        let mut state = [seed0, seed1];
        if state[0] == 0 && state[1] == 0 {
            state[0] = 0x9e37_79b9_7f4a_7c15;
        }
        Self { state }
    }

    /// Returns the next raw 64-bit output.
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(55) ^ s1 ^ (s1 << 14);
        self.state[1] = s1.rotate_left(36);

        result
    }

    /// Returns the next float in `[0, 1)`.
    ///
    /// Uses the high 23 bits of the output to fill the mantissa.
    pub fn next_f32(&mut self) -> f32 {
        let raw = self.next_u64();
        let bits = ((raw >> 41) as u32) | 0x3f80_0000;
        f32::from_bits(bits) - 1.0
    }

    /// Returns a float drawn uniformly from `[lo, hi)`.
    ///
    /// `lo == hi` returns `lo` and still advances the stream by one draw.
    pub fn uniform(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_f32()
    }

    /// Returns `1.0` or `-1.0` with equal probability.
    pub fn sign(&mut self) -> f32 {
        if self.next_u64() >> 63 == 0 {
            1.0
        } else {
            -1.0
        }
    }

    /// Returns an index drawn uniformly from `0..n`; `n == 0` yields `0`.
    ///
    /// Uses rejection sampling to avoid modulo bias.
    pub fn next_index(&mut self, n: usize) -> usize {
        let span = n as u64;
        if span <= 1 {
            return 0;
        }
        let value = if span.is_power_of_two() {
            self.next_u64() & (span - 1)
        } else {
            let bound = u64::MAX - u64::MAX % span;
            loop {
                let candidate = self.next_u64();
                if candidate < bound {
                    break candidate % span;
                }
            }
        };
        value as usize
    }

    /// Fisher–Yates shuffle of `items` in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_index(i + 1);
            items.swap(i, j);
        }
    }
}
