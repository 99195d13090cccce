//! Run harness: feed a record stream into a set and report size and checksum.

use crate::chained_hash_set::ChainedHashSet;
use crate::checksum::Checksum;
use crate::input::{InputError, InputFormat, Records};
use crate::oracle::{HashOracle, Seeds, Sip32, Sip64};
use crate::reference_set::ReferenceSet;
use core::fmt;
use core::hash::BuildHasher;
use std::io::BufRead;

/// Insert/size/digest surface shared by the chained set and its baseline.
pub trait ByteSet {
    fn insert(&mut self, bytes: &[u8]) -> bool;
    fn len(&self) -> usize;
    fn checksum(&self) -> Checksum;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bin count, for sets that expose one.
    fn bins(&self) -> Option<usize> {
        None
    }
}

impl<H: HashOracle> ByteSet for ChainedHashSet<H> {
    fn insert(&mut self, bytes: &[u8]) -> bool {
        ChainedHashSet::insert(self, bytes)
    }

    fn len(&self) -> usize {
        ChainedHashSet::len(self)
    }

    fn checksum(&self) -> Checksum {
        self.iter().collect()
    }

    fn bins(&self) -> Option<usize> {
        Some(ChainedHashSet::bins(self))
    }
}

impl<S: BuildHasher> ByteSet for ReferenceSet<S> {
    fn insert(&mut self, bytes: &[u8]) -> bool {
        ReferenceSet::insert(self, bytes)
    }

    fn len(&self) -> usize {
        ReferenceSet::len(self)
    }

    fn checksum(&self) -> Checksum {
        self.iter().collect()
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum HashWidth {
    W32,
    #[default]
    W64,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Backend {
    #[default]
    Chained,
    Reference,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RunConfig {
    pub format: InputFormat,
    /// Ignored by the reference backend.
    pub width: HashWidth,
    pub backend: Backend,
    /// Compute the content checksum after loading.
    pub checksum: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Report {
    pub records: u64,
    pub size: usize,
    pub bins: Option<usize>,
    pub checksum: Option<Checksum>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "size == {}", self.size)?;
        if let Some(c) = &self.checksum {
            writeln!(f, "checksum {c}")?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("no records were read")]
    EmptyInput,
}

/// Run with seeds drawn from the OS entropy source.
pub fn run<R: BufRead>(config: &RunConfig, reader: R) -> Result<Report, HarnessError> {
    run_with_seeds(config, Seeds::from_entropy(), reader)
}

pub fn run_with_seeds<R: BufRead>(
    config: &RunConfig,
    seeds: Seeds,
    reader: R,
) -> Result<Report, HarnessError> {
    match (config.backend, config.width) {
        (Backend::Reference, _) => feed(config, ReferenceSet::new(), reader),
        (Backend::Chained, HashWidth::W32) => {
            feed(config, ChainedHashSet::new(Sip32::new(seeds)), reader)
        }
        (Backend::Chained, HashWidth::W64) => {
            feed(config, ChainedHashSet::new(Sip64::new(seeds)), reader)
        }
    }
}

/// Load every record of `reader` into `set` and summarize it.
pub fn feed<S: ByteSet, R: BufRead>(
    config: &RunConfig,
    mut set: S,
    reader: R,
) -> Result<Report, HarnessError> {
    let mut records = 0u64;
    for record in Records::new(config.format, reader) {
        set.insert(&record?);
        records += 1;
    }
    if set.is_empty() {
        return Err(HarnessError::EmptyInput);
    }

    let report = Report {
        records,
        size: set.len(),
        bins: set.bins(),
        checksum: config.checksum.then(|| set.checksum()),
    };
    if tracing::enabled!(tracing::Level::INFO) {
        tracing::info!(
            backend = ?config.backend,
            width = ?config.width,
            records,
            size = report.size,
            bins = ?report.bins,
            "load complete"
        );
    }
    Ok(report)
}
