#![cfg(test)]

// Property tests for ChainedHashSet kept inside the crate so they can walk
// individual chains and compare against the oracle directly.

use crate::chained_hash_set::{ChainedHashSet, LOAD_FACTOR};
use crate::oracle::{BuildHasherOracle, HashOracle, HashWord, Seeds, Sip32, Sip64};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashSet};
use std::hash::{BuildHasher, Hasher};

// Pool-indexed operations: indices shrink to earlier records, the pool
// shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize),
    Contains(Vec<u8>),
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<Vec<u8>>, Vec<OpI>)> {
    proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..6), 1..=64).prop_flat_map(
        |pool| {
            let idxs: Vec<usize> = (0..pool.len()).collect();
            let idx = proptest::sample::select(idxs);
            let contains_pool = proptest::sample::select(pool.clone());
            let op = prop_oneof![
                4 => idx.prop_map(OpI::Insert),
                1 => prop_oneof![
                    contains_pool,
                    proptest::collection::vec(any::<u8>(), 0..6)
                ]
                .prop_map(OpI::Contains),
                1 => Just(OpI::Iterate),
            ];
            proptest::collection::vec(op, 1..200).prop_map(move |ops| (pool.clone(), ops))
        },
    )
}

// Every chained entry sits in the bin its stored hash selects, the stored
// hash matches the oracle, and the chains hold exactly `len` records.
fn check_layout<H: HashOracle>(sut: &ChainedHashSet<H>) -> Result<(), TestCaseError> {
    let bins = sut.bins();
    prop_assert!(bins == 0 || bins.is_power_of_two());
    prop_assert!(sut.len() <= bins * LOAD_FACTOR);
    let mut walked = 0usize;
    for bin in 0..bins {
        for (hash, bytes) in sut.chain(bin) {
            prop_assert_eq!(hash.bin(bins - 1), bin);
            prop_assert_eq!(hash, sut.oracle().hash(bytes));
            walked += 1;
        }
    }
    prop_assert_eq!(walked, sut.len());
    Ok(())
}

fn run_state_machine<H: HashOracle>(
    mut sut: ChainedHashSet<H>,
    pool: Vec<Vec<u8>>,
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashSet<Vec<u8>> = HashSet::new();
    for op in ops {
        match op {
            OpI::Insert(i) => {
                let rec = &pool[i];
                let fresh = sut.insert(rec);
                prop_assert_eq!(fresh, model.insert(rec.clone()));
            }
            OpI::Contains(rec) => {
                prop_assert_eq!(sut.contains(&rec), model.contains(&rec));
            }
            OpI::Iterate => {
                let seen: Vec<&[u8]> = sut.iter().collect();
                let uniq: BTreeSet<&[u8]> = seen.iter().copied().collect();
                prop_assert_eq!(seen.len(), uniq.len(), "iter yielded a record twice");
                let m: BTreeSet<&[u8]> = model.iter().map(Vec::as_slice).collect();
                prop_assert_eq!(uniq, m);
            }
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        check_layout(&sut)?;
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashSet.
// - insert reports a fresh record iff the model did not hold it.
// - contains parity for pool and random records.
// - iter yields each record exactly once; record set equals the model.
// - After every op the bin layout is consistent with the current bin count.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_sip64((pool, ops) in arb_scenario(), s0 in any::<u64>(), s1 in any::<u64>()) {
        run_state_machine(ChainedHashSet::new(Sip64::new(Seeds::new(s0, s1))), pool, ops)?;
    }

    #[test]
    fn prop_state_machine_sip32((pool, ops) in arb_scenario(), s0 in any::<u64>(), s1 in any::<u64>()) {
        run_state_machine(ChainedHashSet::new(Sip32::new(Seeds::new(s0, s1))), pool, ops)?;
    }
}

// Collision variant: a hasher that keeps only 2 bits of entropy, so chains
// get long and splits leave most bins empty.
#[derive(Clone, Default)]
struct TwoBitBuildHasher;
struct TwoBitHasher(u64);
impl BuildHasher for TwoBitBuildHasher {
    type Hasher = TwoBitHasher;
    fn build_hasher(&self) -> Self::Hasher {
        TwoBitHasher(0)
    }
}
impl Hasher for TwoBitHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.wrapping_add(u64::from(b));
        }
    }
    fn finish(&self) -> u64 {
        (self.0 & 1) | ((self.0 & 2) << 20)
    }
}

// Property: same invariants as above under heavy collisions.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_state_machine(ChainedHashSet::new(BuildHasherOracle(TwoBitBuildHasher)), pool, ops)?;
    }
}

// Property: insertion order does not affect membership, size, or layout
// validity. Bin counts may differ: a duplicate landing on the growth
// threshold still grows the table.
proptest! {
    #[test]
    fn prop_order_independent(recs in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..4), 0..300)) {
        let seeds = Seeds::new(1, 2);
        let mut fwd = ChainedHashSet::new(Sip64::new(seeds));
        let mut rev = ChainedHashSet::new(Sip64::new(seeds));
        for r in &recs { fwd.insert(r); }
        for r in recs.iter().rev() { rev.insert(r); }
        prop_assert_eq!(fwd.len(), rev.len());
        let a: BTreeSet<&[u8]> = fwd.iter().collect();
        let b: BTreeSet<&[u8]> = rev.iter().collect();
        prop_assert_eq!(a, b);
        check_layout(&fwd)?;
        check_layout(&rev)?;
    }
}
