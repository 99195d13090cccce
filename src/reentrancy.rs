//! Debug-only detection of a hash oracle calling back into its own set.
//!
//! `ChainedHashSet` hands control to user code in exactly one place: the
//! oracle's `hash`. While that call is in flight the set may be halfway
//! through a growth step, so any nested access is a bug in the oracle.
//! Debug builds panic on it; release builds compile the tracker away.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

/// Per-set busy flag. Public entry points that may run the oracle start
/// with `let _busy = self.busy.enter();`.
#[derive(Debug)]
pub(crate) struct BusyFlag {
    #[cfg(debug_assertions)]
    busy: Cell<bool>,
    // The set is single-threaded; keep it !Send + !Sync.
    _nosend: PhantomData<*mut ()>,
}

impl BusyFlag {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            busy: Cell::new(false),
            _nosend: PhantomData,
        }
    }

    /// Mark the set busy until the returned guard drops.
    /// Debug builds panic if the set is already busy.
    #[inline]
    pub(crate) fn enter(&self) -> BusyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.busy.replace(true),
                "ChainedHashSet re-entered from its hash oracle"
            );
            BusyGuard { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            BusyGuard { _z: PhantomData }
        }
    }
}

impl Default for BusyFlag {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct BusyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a BusyFlag,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.busy.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::BusyFlag;

    #[test]
    fn sequential_entries_are_ok() {
        let f = BusyFlag::new();
        drop(f.enter());
        drop(f.enter());
        let _g = f.enter();
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_entry_panics_in_debug() {
        let f = BusyFlag::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = f.enter();
            let _inner = f.enter();
        }));
        assert!(res.is_err(), "expected nested entry to panic in debug builds");
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn nested_entry_is_noop_in_release() {
        let f = BusyFlag::new();
        let _outer = f.enter();
        let _inner = f.enter();
    }
}
