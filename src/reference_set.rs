//! ReferenceSet: baseline byte-string set used to cross-check `ChainedHashSet`.
//!
//! Built on `hashbrown::HashTable` with its own `BuildHasher`, so it shares
//! neither the hash oracle nor the chaining logic with the set under test.

use core::hash::BuildHasher;
use hashbrown::hash_table::Entry;
use hashbrown::HashTable;
use std::collections::hash_map::RandomState;

pub struct ReferenceSet<S = RandomState> {
    hasher: S,
    table: HashTable<Box<[u8]>>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl Default for ReferenceSet {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: BuildHasher> ReferenceSet<S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            table: HashTable::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn insert(&mut self, bytes: &[u8]) -> bool {
        let hash = self.hasher.hash_one(bytes);
        match self.table.entry(
            hash,
            |stored| **stored == *bytes,
            |stored| self.hasher.hash_one(&**stored),
        ) {
            Entry::Occupied(_) => false,
            Entry::Vacant(v) => {
                let _ = v.insert(bytes.into());
                true
            }
        }
    }

    pub fn contains(&self, bytes: &[u8]) -> bool {
        let hash = self.hasher.hash_one(bytes);
        self.table.find(hash, |stored| **stored == *bytes).is_some()
    }

    /// Every record once, in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.table.iter().map(|stored| &**stored)
    }
}
