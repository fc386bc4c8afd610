//! Hooks for the ledger's informational messages.
//!
//! The core never prints. Mining completions and validation outcomes are
//! handed to a [`ChainObserver`]; the default [`TracingObserver`] turns them
//! into `tracing` events.

use crate::blockchain::{BlockSummary, ValidationReport};
use crate::transaction::Transaction;
use tracing::{debug, info, warn};

pub trait ChainObserver: Send + Sync {
    fn pending_added(&self, _tx: &Transaction) {}

    fn block_mined(&self, _summary: &BlockSummary) {}

    fn chain_validated(&self, _report: &ValidationReport) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ChainObserver for TracingObserver {
    fn pending_added(&self, tx: &Transaction) {
        debug!(
            "Queued transaction {} -> {} ({})",
            tx.sender(),
            tx.receiver(),
            tx.amount()
        );
    }

    fn block_mined(&self, summary: &BlockSummary) {
        info!(
            position = summary.position,
            nonce = summary.nonce,
            attempts = summary.attempts,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Block {} mined: {}",
            summary.position,
            summary.hash
        );
    }

    fn chain_validated(&self, report: &ValidationReport) {
        match report {
            ValidationReport::Valid => info!("Blockchain is valid."),
            ValidationReport::Invalid { index, reason } => {
                warn!("Blockchain integrity compromised at block {}: {}", index, reason)
            }
        }
    }
}
