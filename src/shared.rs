//! Thread-safe handle over a [`Ledger`].
//!
//! Sealing reads the tail and the pending buffer and then writes both, so
//! every operation goes through one mutex. A seal holds the lock for the
//! whole mining search.

use crate::blockchain::{BlockSummary, Ledger, ValidationReport};
use crate::error::Result;
use crate::transaction::Transaction;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

#[derive(Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    pub fn add_pending(&self, tx: Transaction) {
        self.inner.lock().add_pending(tx);
    }

    pub fn seal_block(&self, beneficiary: &str) -> Result<BlockSummary> {
        self.inner.lock().seal_block(beneficiary)
    }

    /// Seal on a worker thread so the caller is not stalled by mining.
    pub fn spawn_seal(&self, beneficiary: impl Into<String>) -> JoinHandle<Result<BlockSummary>> {
        let ledger = self.clone();
        let beneficiary = beneficiary.into();
        thread::spawn(move || ledger.seal_block(&beneficiary))
    }

    pub fn validate(&self) -> ValidationReport {
        self.inner.lock().validate()
    }

    pub fn is_valid(&self) -> bool {
        self.inner.lock().is_valid()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Run `f` against the ledger while holding the lock.
    pub fn with_ledger<R>(&self, f: impl FnOnce(&Ledger) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Take the ledger back once this is the last handle.
    pub fn into_inner(self) -> Option<Ledger> {
        Arc::try_unwrap(self.inner).ok().map(Mutex::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawned_seal_appends_block() {
        let shared = SharedLedger::new(Ledger::with_difficulty(1).unwrap());
        shared.add_pending(Transaction::transfer("A", "B", 3));

        let summary = shared.spawn_seal("M").join().unwrap().unwrap();
        assert_eq!(summary.position, 1);
        assert_eq!(shared.len(), 2);
        assert!(shared.with_ledger(|l| l.pending().is_empty()));
        assert!(shared.is_valid());
    }

    #[test]
    fn test_concurrent_seals_stay_linked() {
        let shared = SharedLedger::new(Ledger::with_difficulty(1).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                shared.add_pending(Transaction::transfer("A", "B", i));
                shared.spawn_seal(format!("miner-{}", i))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(shared.len(), 5);
        assert_eq!(shared.validate(), ValidationReport::Valid);

        let ledger = shared.into_inner().unwrap();
        let positions: Vec<u64> = ledger.blocks().iter().map(|b| b.position()).collect();
        assert_eq!(positions, vec![0, 1, 2, 3, 4]);
    }
}
