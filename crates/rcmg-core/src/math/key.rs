// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Splittable random keys.
//!
//! A [`PrngKey`] is a 32-byte value that is either split into child keys or
//! consumed into a [`Prng`] stream, never both and never twice. Splitting is
//! counter based:
//!
//! ```text
//! child[i] = BLAKE3("rcmg:key:split" ‖ parent ‖ n as u64 LE ‖ i as u64 LE)
//! ```
//!
//! so the children of a split depend on the parent and on the split arity
//! `n`, and two different parents (or arities) never share a derivation
//! input. Consuming a key seeds xoroshiro128+ with its first 16 bytes.
//!
//! Keys are `Clone` but not `Copy`: every split and every consume takes the
//! key by value so reuse has to be spelled out.

use crate::math::Prng;

const SEED_DOMAIN: &[u8] = b"rcmg:key:seed";
const SPLIT_DOMAIN: &[u8] = b"rcmg:key:split";

/// Single-use splittable random key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PrngKey([u8; 32]);

impl PrngKey {
    /// Derives the root key for an integer seed.
    pub fn from_seed(seed: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(SEED_DOMAIN);
        hasher.update(&seed.to_le_bytes());
        Self(hasher.finalize().into())
    }

    /// Wraps raw key bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn child(&self, n: u64, i: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(SPLIT_DOMAIN);
        hasher.update(&self.0);
        hasher.update(&n.to_le_bytes());
        hasher.update(&i.to_le_bytes());
        Self(hasher.finalize().into())
    }

    /// Splits this key into `n` child keys.
    pub fn split(self, n: usize) -> Vec<Self> {
        let arity = n as u64;
        (0..arity).map(|i| self.child(arity, i)).collect()
    }

    /// Splits into two keys.
    pub fn split2(self) -> (Self, Self) {
        (self.child(2, 0), self.child(2, 1))
    }

    /// Splits into three keys.
    pub fn split3(self) -> (Self, Self, Self) {
        (self.child(3, 0), self.child(3, 1), self.child(3, 2))
    }

    /// Consumes the key into a value stream.
    pub fn into_prng(self) -> Prng {
        let mut lo = [0u8; 8];
        let mut hi = [0u8; 8];
        lo.copy_from_slice(&self.0[..8]);
        hi.copy_from_slice(&self.0[8..16]);
        Prng::from_seed(u64::from_le_bytes(lo), u64::from_le_bytes(hi))
    }
}

impl std::fmt::Debug for PrngKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrngKey(")?;
        for b in &self.0[..8] {
            write!(f, "{b:02x}")?;
        }
        write!(f, "…)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_is_pure() {
        let a = PrngKey::from_seed(5).split(4);
        let b = PrngKey::from_seed(5).split(4);
        assert_eq!(a, b);
    }

    #[test]
    fn split_children_are_pairwise_distinct() {
        let keys = PrngKey::from_seed(1).split(64);
        for i in 0..keys.len() {
            for j in (i + 1)..keys.len() {
                assert_ne!(keys[i], keys[j], "children {i} and {j} collide");
            }
        }
    }

    #[test]
    fn split_depends_on_arity() {
        let two = PrngKey::from_seed(3).split(2);
        let (a, b) = PrngKey::from_seed(3).split2();
        assert_eq!(two, vec![a, b]);
        let three = PrngKey::from_seed(3).split(3);
        assert_ne!(two[0], three[0]);
    }

    #[test]
    fn consumed_streams_differ_between_siblings() {
        let (a, b) = PrngKey::from_seed(9).split2();
        let mut pa = a.into_prng();
        let mut pb = b.into_prng();
        assert_ne!(pa.next_u64(), pb.next_u64());
    }
}
