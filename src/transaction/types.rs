/// Payload types carried by Intercoin blocks
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Sentinel payload sealed into the genesis block.
pub const GENESIS_PAYLOAD: &str = "Genesis block";

/// A transaction that can occur in a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transaction {
    Transfer(TransferTx),
    Reward(RewardTx),
}

impl Transaction {
    pub fn transfer(sender: impl Into<String>, receiver: impl Into<String>, amount: u64) -> Self {
        Transaction::Transfer(TransferTx::new(sender, receiver, amount))
    }

    pub fn reward(sender: impl Into<String>, beneficiary: impl Into<String>, amount: u64) -> Self {
        Transaction::Reward(RewardTx {
            sender: sender.into(),
            receiver: beneficiary.into(),
            amount,
        })
    }

    pub fn sender(&self) -> &str {
        match self {
            Transaction::Transfer(tx) => &tx.sender,
            Transaction::Reward(tx) => &tx.sender,
        }
    }

    pub fn receiver(&self) -> &str {
        match self {
            Transaction::Transfer(tx) => &tx.receiver,
            Transaction::Reward(tx) => &tx.receiver,
        }
    }

    pub fn amount(&self) -> u64 {
        match self {
            Transaction::Transfer(tx) => tx.amount,
            Transaction::Reward(tx) => tx.amount,
        }
    }

    pub fn is_reward(&self) -> bool {
        matches!(self, Transaction::Reward(_))
    }
}

/// Value moved from one party to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTx {
    pub sender: String,
    pub receiver: String,
    pub amount: u64,
}

impl TransferTx {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, amount: u64) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
        }
    }
}

/// Mining incentive injected by the ledger when a block is sealed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTx {
    pub sender: String,
    pub receiver: String,
    pub amount: u64,
}

/// Contents of a block: the genesis sentinel or the transactions pending at
/// sealing time.
///
/// Serialized untagged, so the genesis payload is a bare JSON string and a
/// transaction batch is a JSON array. Field order follows declaration order,
/// which keeps [`Payload::canonical_json`] stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Genesis(String),
    Transactions(Vec<Transaction>),
}

impl Payload {
    pub fn genesis() -> Self {
        Payload::Genesis(GENESIS_PAYLOAD.to_string())
    }

    /// Deterministic serialization fed into the block hash.
    pub fn canonical_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn transactions(&self) -> &[Transaction] {
        match self {
            Payload::Genesis(_) => &[],
            Payload::Transactions(txs) => txs,
        }
    }
}

impl From<Vec<Transaction>> for Payload {
    fn from(txs: Vec<Transaction>) -> Self {
        Payload::Transactions(txs)
    }
}
