//! Seeded hash oracles: the only source of hash values for a `ChainedHashSet`.
//!
//! The set never looks inside an oracle. It only relies on two things:
//! the same `(seeds, bytes)` pair always yields the same word, and the word
//! width is fixed by the oracle's `Word` type for the set's whole lifetime.

use core::hash::{BuildHasher, Hasher};
use rand::rngs::OsRng;
use rand::RngCore;
use siphasher::sip::SipHasher13;

/// Fixed-width unsigned hash output.
pub trait HashWord: Copy + Eq + core::fmt::Debug {
    /// Number of significant bits.
    const BITS: u32;

    /// Bin index for a power-of-two table: `self & mask`, truncated to `usize`.
    fn bin(self, mask: usize) -> usize;
}

impl HashWord for u32 {
    const BITS: u32 = 32;

    #[inline]
    fn bin(self, mask: usize) -> usize {
        (self as usize) & mask
    }
}

impl HashWord for u64 {
    const BITS: u32 = 64;

    #[inline]
    fn bin(self, mask: usize) -> usize {
        // Truncation is fine: masks never exceed usize.
        (self as usize) & mask
    }
}

/// A deterministic, seeded function from bytes to a fixed-width word.
pub trait HashOracle {
    type Word: HashWord;

    fn hash(&self, bytes: &[u8]) -> Self::Word;
}

/// The pair of seed words chosen once per run.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Seeds {
    pub seed0: u64,
    pub seed1: u64,
}

impl Seeds {
    pub const fn new(seed0: u64, seed1: u64) -> Self {
        Self { seed0, seed1 }
    }

    /// Draw both seeds from the operating system's secure entropy source.
    pub fn from_entropy() -> Self {
        let mut rng = OsRng;
        Self::new(rng.next_u64(), rng.next_u64())
    }
}

/// 64-bit oracle: SipHash-1-3 keyed with both 64-bit seeds.
#[derive(Clone, Debug)]
pub struct Sip64 {
    k0: u64,
    k1: u64,
}

impl Sip64 {
    pub fn new(seeds: Seeds) -> Self {
        Self {
            k0: seeds.seed0,
            k1: seeds.seed1,
        }
    }
}

impl HashOracle for Sip64 {
    type Word = u64;

    #[inline]
    fn hash(&self, bytes: &[u8]) -> u64 {
        let mut h = SipHasher13::new_with_keys(self.k0, self.k1);
        h.write(bytes);
        h.finish()
    }
}

/// 32-bit oracle: SipHash-1-3 keyed with the low halves of both seeds,
/// folded to 32 bits.
#[derive(Clone, Debug)]
pub struct Sip32 {
    k0: u32,
    k1: u32,
}

impl Sip32 {
    pub fn new(seeds: Seeds) -> Self {
        Self {
            k0: seeds.seed0 as u32,
            k1: seeds.seed1 as u32,
        }
    }
}

impl HashOracle for Sip32 {
    type Word = u32;

    #[inline]
    fn hash(&self, bytes: &[u8]) -> u32 {
        let mut h = SipHasher13::new_with_keys(u64::from(self.k0), u64::from(self.k1));
        h.write(bytes);
        let full = h.finish();
        (full ^ (full >> 32)) as u32
    }
}

/// Adapts any `BuildHasher` into a 64-bit oracle.
///
/// Each call builds a fresh hasher and writes the raw bytes only, so two
/// adapters built from equal `BuildHasher`s agree on every input.
#[derive(Clone, Debug, Default)]
pub struct BuildHasherOracle<S>(pub S);

impl<S: BuildHasher> HashOracle for BuildHasherOracle<S> {
    type Word = u64;

    #[inline]
    fn hash(&self, bytes: &[u8]) -> u64 {
        let mut h = self.0.build_hasher();
        h.write(bytes);
        h.finish()
    }
}
