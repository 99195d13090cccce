//! ChainedHashSet: separate-chaining set of byte strings with bucket-split growth.

use crate::oracle::{HashOracle, HashWord};
use crate::reentrancy::BusyFlag;
use core::fmt;
use slotmap::{DefaultKey, SlotMap};

/// Bin count after the first growth step.
pub const INITIAL_BINS: usize = 8;

/// Growth triggers once `len == LOAD_FACTOR * bins`.
pub const LOAD_FACTOR: usize = 3;

#[derive(Debug)]
struct Entry<W> {
    bytes: Box<[u8]>,
    hash: W,
    next: Option<DefaultKey>,
}

/// A set of byte strings hashed by an injected [`HashOracle`].
///
/// Entries live in a slot arena; each bin holds the arena key of its chain
/// head and each entry holds the key of its successor. An entry's bin is
/// always `hash & (bins - 1)` for the current bin count.
pub struct ChainedHashSet<H: HashOracle> {
    oracle: H,
    bins: Vec<Option<DefaultKey>>,
    slots: SlotMap<DefaultKey, Entry<H::Word>>, // never shrinks: no removal
    busy: BusyFlag,
}

impl<H: HashOracle> ChainedHashSet<H> {
    /// Empty set with no bins allocated yet.
    pub fn new(oracle: H) -> Self {
        Self {
            oracle,
            bins: Vec::new(),
            slots: SlotMap::with_key(),
            busy: BusyFlag::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Current bin count: 0 before the first insert, else a power of two.
    pub fn bins(&self) -> usize {
        self.bins.len()
    }

    pub fn oracle(&self) -> &H {
        &self.oracle
    }

    #[inline]
    fn mask(&self) -> usize {
        debug_assert!(self.bins.len().is_power_of_two());
        self.bins.len() - 1
    }

    fn hash_of(&self, bytes: &[u8]) -> H::Word {
        let _busy = self.busy.enter();
        self.oracle.hash(bytes)
    }

    fn find_in_chain(&self, pos: usize, hash: H::Word, bytes: &[u8]) -> Option<DefaultKey> {
        let mut cur = self.bins[pos];
        while let Some(k) = cur {
            let e = &self.slots[k];
            if e.hash == hash && *e.bytes == *bytes {
                return Some(k);
            }
            cur = e.next;
        }
        None
    }

    /// Insert a copy of `bytes`. Returns `false` if an equal record was
    /// already present, in which case the set is left unchanged apart from
    /// a growth step that may have been due.
    pub fn insert(&mut self, bytes: &[u8]) -> bool {
        if self.slots.len() == self.bins.len() * LOAD_FACTOR {
            self.rehash();
        }
        let hash = self.hash_of(bytes);
        let pos = hash.bin(self.mask());
        if self.find_in_chain(pos, hash, bytes).is_some() {
            return false;
        }
        let k = self.slots.insert(Entry {
            bytes: bytes.into(),
            hash,
            next: self.bins[pos],
        });
        self.bins[pos] = Some(k);
        true
    }

    pub fn contains(&self, bytes: &[u8]) -> bool {
        if self.bins.is_empty() {
            return false;
        }
        let hash = self.hash_of(bytes);
        self.find_in_chain(hash.bin(self.mask()), hash, bytes).is_some()
    }

    /// Double the bin count (0 becomes `INITIAL_BINS`) and split every old
    /// chain in one pass.
    ///
    /// With the mask widened by one bit, an entry in bin `i` lands either in
    /// `i` or in `i + old_bins`. Staying entries keep their relative order;
    /// moving entries are prepended to their new chain. Stored hashes are
    /// reused, never recomputed.
    fn rehash(&mut self) {
        let old_bins = self.bins.len();
        let new_bins = if old_bins == 0 {
            INITIAL_BINS
        } else {
            old_bins * 2
        };
        let mask = new_bins - 1;
        let mut bins: Vec<Option<DefaultKey>> = vec![None; new_bins];

        for (i, head) in self.bins.iter_mut().enumerate() {
            let mut cur = head.take();
            let mut stay_tail: Option<DefaultKey> = None;
            while let Some(k) = cur {
                let entry = &mut self.slots[k];
                cur = entry.next.take();
                let pos = entry.hash.bin(mask);
                if pos == i {
                    match stay_tail {
                        Some(t) => self.slots[t].next = Some(k),
                        None => bins[i] = Some(k),
                    }
                    stay_tail = Some(k);
                } else {
                    debug_assert_eq!(pos, i + old_bins);
                    entry.next = bins[pos];
                    bins[pos] = Some(k);
                }
            }
        }
        self.bins = bins;

        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::debug!(old_bins, new_bins, len = self.slots.len(), "rehash");
        }
    }

    /// Walk one chain from its head, yielding `(stored hash, bytes)`.
    ///
    /// Panics if `bin >= self.bins()`.
    pub fn chain(&self, bin: usize) -> Chain<'_, H::Word> {
        Chain {
            slots: &self.slots,
            cur: self.bins[bin],
        }
    }

    /// Every stored record exactly once, in bin order then chain order.
    pub fn iter(&self) -> Iter<'_, H::Word> {
        Iter {
            heads: self.bins.iter(),
            slots: &self.slots,
            cur: None,
            remaining: self.slots.len(),
        }
    }
}

impl<H: HashOracle + Default> Default for ChainedHashSet<H> {
    fn default() -> Self {
        Self::new(H::default())
    }
}

impl<H: HashOracle> fmt::Debug for ChainedHashSet<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedHashSet")
            .field("len", &self.len())
            .field("bins", &self.bins())
            .field("hash_bits", &<H::Word as HashWord>::BITS)
            .finish()
    }
}

impl<'a, H: HashOracle> Extend<&'a [u8]> for ChainedHashSet<H> {
    fn extend<I: IntoIterator<Item = &'a [u8]>>(&mut self, iter: I) {
        for bytes in iter {
            self.insert(bytes);
        }
    }
}

impl<'a, H: HashOracle> IntoIterator for &'a ChainedHashSet<H> {
    type Item = &'a [u8];
    type IntoIter = Iter<'a, H::Word>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over one bin's chain.
pub struct Chain<'a, W> {
    slots: &'a SlotMap<DefaultKey, Entry<W>>,
    cur: Option<DefaultKey>,
}

impl<'a, W: Copy> Iterator for Chain<'a, W> {
    type Item = (W, &'a [u8]);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let e = &self.slots[self.cur?];
        self.cur = e.next;
        Some((e.hash, &e.bytes[..]))
    }
}

/// Iterator over all records in bin order, then chain order.
pub struct Iter<'a, W> {
    heads: core::slice::Iter<'a, Option<DefaultKey>>,
    slots: &'a SlotMap<DefaultKey, Entry<W>>,
    cur: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, W> Iterator for Iter<'a, W> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(k) = self.cur {
                let e = &self.slots[k];
                self.cur = e.next;
                self.remaining -= 1;
                return Some(&e.bytes[..]);
            }
            self.cur = *self.heads.next()?;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<W> ExactSizeIterator for Iter<'_, W> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{BuildHasherOracle, Seeds, Sip32, Sip64};
    use std::collections::BTreeSet;

    fn sip64() -> ChainedHashSet<Sip64> {
        ChainedHashSet::new(Sip64::new(Seeds::new(7, 11)))
    }

    /// Hash is the first byte (0 for the empty record), so bin placement
    /// is predictable.
    #[derive(Clone, Default)]
    struct FirstByte;
    impl HashOracle for FirstByte {
        type Word = u64;
        fn hash(&self, bytes: &[u8]) -> u64 {
            bytes.first().copied().map(u64::from).unwrap_or(0)
        }
    }

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl core::hash::BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl core::hash::Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        } // every record collides in bin 0
    }

    fn assert_bins_consistent<H: HashOracle>(s: &ChainedHashSet<H>) {
        let bins = s.bins();
        assert!(bins == 0 || bins.is_power_of_two());
        let mut walked = 0;
        for bin in 0..bins {
            for (hash, bytes) in s.chain(bin) {
                assert_eq!(hash.bin(bins - 1), bin, "record {:?} in wrong bin", bytes);
                assert_eq!(hash, s.oracle().hash(bytes));
                walked += 1;
            }
        }
        assert_eq!(walked, s.len());
    }

    /// Invariant: an empty set has no bins and yields nothing.
    #[test]
    fn new_set_is_unallocated() {
        let s = sip64();
        assert_eq!(s.len(), 0);
        assert!(s.is_empty());
        assert_eq!(s.bins(), 0);
        assert!(!s.contains(b"a"));
        assert_eq!(s.iter().count(), 0);
    }

    /// Invariant: duplicates are no-ops; each distinct record appears once.
    #[test]
    fn duplicate_insert_is_noop() {
        let mut s = sip64();
        assert!(s.insert(b"a"));
        assert!(s.insert(b"b"));
        assert!(!s.insert(b"a"));
        assert!(s.insert(b"c"));
        assert_eq!(s.len(), 3);

        let seen: Vec<&[u8]> = s.iter().collect();
        assert_eq!(seen.len(), 3);
        let uniq: BTreeSet<&[u8]> = seen.into_iter().collect();
        let expected: BTreeSet<&[u8]> = [&b"a"[..], &b"b"[..], &b"c"[..]].into_iter().collect();
        assert_eq!(uniq, expected);
    }

    /// Invariant: the empty record is a legitimate member, stored once.
    #[test]
    fn empty_record_counted_once() {
        let mut s = sip64();
        assert!(s.insert(b""));
        assert!(!s.insert(b""));
        assert_eq!(s.len(), 1);
        assert!(s.contains(b""));
        assert_eq!(s.iter().next(), Some(&b""[..]));
    }

    /// Invariant: first insert allocates 8 bins; growth happens exactly when
    /// an insert finds `len == 3 * bins`.
    #[test]
    fn growth_thresholds() {
        let mut s = sip64();
        s.insert(b"0");
        assert_eq!(s.bins(), INITIAL_BINS);
        for i in 1..24u32 {
            s.insert(&i.to_le_bytes());
        }
        assert_eq!(s.len(), 24);
        assert_eq!(s.bins(), 8);
        s.insert(&24u32.to_le_bytes());
        assert_eq!(s.bins(), 16);
        assert_eq!(s.len(), 25);
        assert_bins_consistent(&s);
    }

    /// Invariant: the growth check runs before the duplicate lookup.
    #[test]
    fn duplicate_at_threshold_still_grows() {
        let mut s = sip64();
        for i in 0..24u32 {
            s.insert(&i.to_le_bytes());
        }
        assert_eq!(s.bins(), 8);
        assert!(!s.insert(&0u32.to_le_bytes()));
        assert_eq!(s.bins(), 16);
        assert_eq!(s.len(), 24);
        assert_bins_consistent(&s);
    }

    /// Invariant: a split keeps staying entries in order in bin `i` and moves
    /// the rest to bin `i + old_bins`.
    #[test]
    fn split_sends_entries_to_i_or_i_plus_old() {
        let mut s = ChainedHashSet::new(FirstByte);
        for b in [0u8, 8, 16] {
            s.insert(&[b]);
        }
        for b in (1u8..24).filter(|b| b % 8 != 0) {
            s.insert(&[b]);
        }
        assert_eq!(s.bins(), 8);
        let bin0: Vec<&[u8]> = s.chain(0).map(|(_, b)| b).collect();
        assert_eq!(bin0, vec![&[16u8][..], &[8u8][..], &[0u8][..]]);

        // len == 24: this insert splits 8 -> 16 first.
        s.insert(&[24]);
        assert_eq!(s.bins(), 16);
        let bin0: Vec<&[u8]> = s.chain(0).map(|(_, b)| b).collect();
        assert_eq!(bin0, vec![&[16u8][..], &[0u8][..]]);
        let bin8: Vec<&[u8]> = s.chain(8).map(|(_, b)| b).collect();
        assert_eq!(bin8, vec![&[24u8][..], &[8u8][..]]);
        assert_bins_consistent(&s);
    }

    /// Invariant: many growth steps lose nothing.
    #[test]
    fn no_loss_across_several_growths() {
        let mut s = ChainedHashSet::new(Sip32::new(Seeds::new(3, 5)));
        for i in 0..1000u32 {
            assert!(s.insert(format!("rec-{i}").as_bytes()));
        }
        assert_eq!(s.len(), 1000);
        assert_eq!(s.bins(), 512);
        assert_bins_consistent(&s);
        for i in 0..1000u32 {
            assert!(s.contains(format!("rec-{i}").as_bytes()));
        }
        assert!(!s.contains(b"rec-1000"));
    }

    /// Invariant: a constant hash still yields a correct set (one long chain).
    #[test]
    fn constant_hash_collisions() {
        let mut s = ChainedHashSet::new(BuildHasherOracle(ConstBuildHasher));
        for i in 0..100u8 {
            s.insert(&[i, i]);
        }
        for i in 0..100u8 {
            assert!(!s.insert(&[i, i]));
        }
        assert_eq!(s.len(), 100);
        assert_eq!(s.chain(0).count(), 100);
        for bin in 1..s.bins() {
            assert_eq!(s.chain(bin).count(), 0);
        }
        assert!(s.contains(&[42, 42]));
        assert!(!s.contains(&[42]));
    }

    /// Invariant: records sharing a hash are told apart by length and content.
    #[test]
    fn equal_hash_different_content() {
        let mut s = ChainedHashSet::new(FirstByte);
        assert!(s.insert(b"ab"));
        assert!(s.insert(b"abc"));
        assert!(s.insert(b"ax"));
        assert!(!s.insert(b"ab"));
        assert_eq!(s.len(), 3);
        assert_eq!(s.chain(b'a' as usize & 7).count(), 3);
    }

    /// Invariant: a repeated insert moves nothing.
    #[test]
    fn idempotent_insert_keeps_layout() {
        let mut s = sip64();
        for i in 0..20u32 {
            s.insert(&i.to_be_bytes());
        }
        let layout = |s: &ChainedHashSet<Sip64>| -> Vec<Vec<Vec<u8>>> {
            (0..s.bins())
                .map(|b| s.chain(b).map(|(_, r)| r.to_vec()).collect())
                .collect()
        };
        let before = layout(&s);
        assert!(!s.insert(&5u32.to_be_bytes()));
        assert_eq!(layout(&s), before);
    }

    #[test]
    fn iter_is_exact_size() {
        let mut s = sip64();
        s.extend([&b"x"[..], &b"y"[..], &b"x"[..], &b"z"[..]]);
        let it = s.iter();
        assert_eq!(it.len(), 3);
        assert_eq!((&s).into_iter().count(), 3);
    }

    /// Invariant (debug-only): an oracle that calls back into its own set
    /// while hashing panics instead of observing a half-built state.
    #[cfg(debug_assertions)]
    #[test]
    fn oracle_reentry_panics_in_debug() {
        use std::cell::Cell;

        struct Reentrant {
            set: Cell<*const ChainedHashSet<Reentrant>>,
        }
        impl HashOracle for Reentrant {
            type Word = u64;
            fn hash(&self, bytes: &[u8]) -> u64 {
                let p = self.set.get();
                if !p.is_null() {
                    // Shared access only; the outer call is `contains`.
                    let _ = unsafe { (*p).contains(bytes) };
                }
                bytes.len() as u64
            }
        }

        let mut s = ChainedHashSet::new(Reentrant {
            set: Cell::new(core::ptr::null()),
        });
        s.insert(b"a");
        s.oracle().set.set(&s as *const _);
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = s.contains(b"b");
        }));
        assert!(res.is_err(), "expected re-entry to panic in debug builds");
    }
}
