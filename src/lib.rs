//! chained-hashset: a single-threaded set of byte strings built on
//! separate chaining, used to collect unique records and report their
//! count and an order-independent checksum.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep the chaining table small and auditable, and keep
//!   everything around it (hashing, input, checksums) swappable.
//! - Layers:
//!   - ChainedHashSet<H>: the table. Bins are chain heads into a slot
//!     arena; entries carry their full hash and a successor key.
//!   - HashOracle: seeded, deterministic bytes-to-word function injected
//!     into the table. The word type fixes the width (32 or 64 bits) for
//!     the table's lifetime.
//!   - ReferenceSet + Checksum: an independent baseline set and an
//!     order-independent digest, used to cross-check the table.
//!   - input + harness: record readers and the run loop behind the
//!     `chainset` binary.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync`, no atomics.
//! - Insert-only: no removal, no shrinking.
//! - Bin count is 0 or a power of two; an entry always sits in bin
//!   `hash & (bins - 1)`.
//! - Growth happens when an insert finds `len == 3 * bins`.
//!
//! Hasher and rehashing invariants
//! - Each entry stores the hash computed at insertion and growth always
//!   uses the stored value; the oracle is never invoked during a rehash.
//! - Doubling the bin count splits bin `i` into `i` and `i + old_bins`,
//!   so growth is one pass over the existing entries.
//!
//! Reentrancy policy
//! - The oracle is the only user code the table calls. A debug-only guard
//!   panics if the oracle calls back into the table mid-hash.
//!
//! Notes and non-goals
//! - No persistence, deletion, or iteration order contract beyond "bin
//!   order, then chain order".
//! - Allocation failure aborts, as everywhere in `std`.

pub mod chained_hash_set;
mod chained_hash_set_proptest;
pub mod checksum;
pub mod harness;
pub mod input;
pub mod oracle;
pub mod reference_set;
mod reentrancy;

// Public surface
pub use chained_hash_set::{ChainedHashSet, INITIAL_BINS, LOAD_FACTOR};
pub use checksum::Checksum;
pub use harness::{
    feed, run, run_with_seeds, Backend, ByteSet, HarnessError, HashWidth, Report, RunConfig,
};
pub use input::{InputError, InputFormat};
pub use oracle::{BuildHasherOracle, HashOracle, HashWord, Seeds, Sip32, Sip64};
pub use reference_set::ReferenceSet;
