//! Order-independent digest over a collection of byte records.
//!
//! Each record is folded into two 64-bit lanes by a multiply-rotate loop;
//! the low 32 bits of both lanes are XORed into the accumulator. XOR makes
//! the result independent of visiting order, so two sets holding the same
//! records agree no matter how they were built.

use core::fmt;

const LANE0_INIT: u64 = 0x100;
const LANE1_INIT: u64 = 0x200;
const LANE0_MUL: u64 = 0x123_4567;
const LANE1_MUL: u64 = 0xabc_def9;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Checksum {
    words: [u32; 2],
}

fn record_lanes(record: &[u8]) -> (u64, u64) {
    let mut h0 = LANE0_INIT;
    let mut h1 = LANE1_INIT;
    for &b in record {
        h0 = h0.wrapping_add(u64::from(b)).wrapping_mul(LANE0_MUL).rotate_left(13);
        h1 = h1.wrapping_add(u64::from(b)).wrapping_mul(LANE1_MUL).rotate_left(19);
    }
    (h0, h1)
}

impl Checksum {
    pub const fn new() -> Self {
        Self { words: [0; 2] }
    }

    pub fn add(&mut self, record: &[u8]) {
        let (h0, h1) = record_lanes(record);
        self.words[0] ^= h0 as u32;
        self.words[1] ^= h1 as u32;
    }

    pub fn words(&self) -> [u32; 2] {
        self.words
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x} {:08x}", self.words[0], self.words[1])
    }
}

impl<'a> Extend<&'a [u8]> for Checksum {
    fn extend<I: IntoIterator<Item = &'a [u8]>>(&mut self, iter: I) {
        for record in iter {
            self.add(record);
        }
    }
}

impl<'a> FromIterator<&'a [u8]> for Checksum {
    fn from_iter<I: IntoIterator<Item = &'a [u8]>>(iter: I) -> Self {
        let mut c = Checksum::new();
        c.extend(iter);
        c
    }
}
