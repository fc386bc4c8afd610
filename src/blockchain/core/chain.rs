use crate::config::{default_reward_sender, LedgerConfig};
use crate::error::{ChainError, Result};
use crate::observer::{ChainObserver, TracingObserver};
use crate::transaction::{Payload, Transaction};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::block::{Block, MiningOutcome, GENESIS_PREVIOUS_HASH};
use super::validation::{validate_chain, ValidationReport};

pub const DEFAULT_DIFFICULTY: u32 = 4;
pub const DEFAULT_MINING_REWARD: u64 = 10;
pub const REWARD_SENDER: &str = "System";
pub const GENESIS_TIMESTAMP: &str = "01/01/2017";

/// What a seal produced, handed to observers and returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSummary {
    pub position: u64,
    pub hash: String,
    pub nonce: u64,
    pub attempts: u64,
    pub transactions: usize,
    pub elapsed: Duration,
}

impl BlockSummary {
    fn new(block: &Block, attempts: u64, elapsed: Duration) -> Self {
        Self {
            position: block.position(),
            hash: block.hash().to_string(),
            nonce: block.nonce(),
            attempts,
            transactions: block.payload().transactions().len(),
            elapsed,
        }
    }
}

fn default_observer() -> Arc<dyn ChainObserver> {
    Arc::new(TracingObserver)
}

/// Wire form of a [`Ledger`]. Every deserialization of a ledger passes
/// through `TryFrom<LedgerSnapshot>`, which enforces the same settings checks
/// as construction and requires a genesis block.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerSnapshot {
    pub chain: Vec<Block>,
    #[serde(default)]
    pub pending: Vec<Transaction>,
    pub difficulty: u32,
    pub mining_reward: u64,
    #[serde(default = "default_reward_sender")]
    pub reward_sender: String,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "LedgerSnapshot")]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    difficulty: u32,
    mining_reward: u64,
    reward_sender: String,
    #[serde(skip, default = "default_observer")]
    observer: Arc<dyn ChainObserver>,
}

impl TryFrom<LedgerSnapshot> for Ledger {
    type Error = ChainError;

    fn try_from(snapshot: LedgerSnapshot) -> Result<Self> {
        LedgerConfig {
            difficulty: snapshot.difficulty,
            mining_reward: snapshot.mining_reward,
            reward_sender: snapshot.reward_sender.clone(),
        }
        .validate()?;

        if snapshot.chain.is_empty() {
            return Err(ChainError::Serialization(
                "ledger snapshot has no genesis block".to_string(),
            ));
        }

        Ok(Ledger {
            chain: snapshot.chain,
            pending: snapshot.pending,
            difficulty: snapshot.difficulty,
            mining_reward: snapshot.mining_reward,
            reward_sender: snapshot.reward_sender,
            observer: default_observer(),
        })
    }
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("chain", &self.chain)
            .field("pending", &self.pending)
            .field("difficulty", &self.difficulty)
            .field("mining_reward", &self.mining_reward)
            .field("reward_sender", &self.reward_sender)
            .finish_non_exhaustive()
    }
}

impl Ledger {
    /// Create a ledger at the default difficulty of 4.
    pub fn new() -> Result<Self> {
        Self::with_difficulty(DEFAULT_DIFFICULTY)
    }

    pub fn with_difficulty(difficulty: u32) -> Result<Self> {
        Self::from_config(&LedgerConfig {
            difficulty,
            ..LedgerConfig::default()
        })
    }

    pub fn from_config(config: &LedgerConfig) -> Result<Self> {
        Self::new_with_observer(config, default_observer())
    }

    /// Create a ledger whose messages go to `observer`. Genesis is mined here,
    /// at the configured difficulty.
    pub fn new_with_observer(
        config: &LedgerConfig,
        observer: Arc<dyn ChainObserver>,
    ) -> Result<Self> {
        config.validate()?;

        let start = Instant::now();
        let (genesis, attempts) = Self::mine_genesis(config.difficulty)?;
        observer.block_mined(&BlockSummary::new(&genesis, attempts, start.elapsed()));

        Ok(Ledger {
            chain: vec![genesis],
            pending: Vec::new(),
            difficulty: config.difficulty,
            mining_reward: config.mining_reward,
            reward_sender: config.reward_sender.clone(),
            observer,
        })
    }

    /// The hardcoded first block, mined at `difficulty`.
    pub fn create_genesis(difficulty: u32) -> Result<Block> {
        Self::mine_genesis(difficulty).map(|(block, _)| block)
    }

    fn mine_genesis(difficulty: u32) -> Result<(Block, u64)> {
        let mut genesis = Block::new(0, GENESIS_TIMESTAMP, Payload::genesis(), GENESIS_PREVIOUS_HASH)?;
        let attempts = genesis.mine(difficulty)?;
        Ok((genesis, attempts))
    }

    /// Route future messages to `observer`.
    pub fn set_observer(&mut self, observer: Arc<dyn ChainObserver>) {
        self.observer = observer;
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.chain.get(index)
    }

    pub fn latest_block(&self) -> &Block {
        // The chain always holds at least genesis.
        &self.chain[self.chain.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn mining_reward(&self) -> u64 {
        self.mining_reward
    }

    /// Queue a payload item for the next seal. Items are opaque to the ledger.
    pub fn add_pending(&mut self, tx: Transaction) {
        self.observer.pending_added(&tx);
        self.pending.push(tx);
    }

    /// Package the pending buffer plus a reward for `beneficiary` into a new
    /// block, mine it, append it and clear the buffer. Blocks until mined.
    pub fn seal_block(&mut self, beneficiary: &str) -> Result<BlockSummary> {
        let start = Instant::now();
        let mut block = self.next_block(beneficiary)?;
        let attempts = block.mine(self.difficulty)?;
        Ok(self.append_sealed(block, attempts, start.elapsed()))
    }

    /// Like [`Ledger::seal_block`] but stops after `max_attempts` digests.
    /// Exhaustion returns [`ChainError::MiningExhausted`] and leaves the chain
    /// and the pending buffer untouched.
    pub fn try_seal_block(&mut self, beneficiary: &str, max_attempts: u64) -> Result<BlockSummary> {
        let start = Instant::now();
        let mut block = self.next_block(beneficiary)?;
        match block.mine_bounded(self.difficulty, max_attempts)? {
            MiningOutcome::Mined { attempts } => {
                Ok(self.append_sealed(block, attempts, start.elapsed()))
            }
            MiningOutcome::Exhausted { attempts } => Err(ChainError::MiningExhausted {
                attempts,
                difficulty: self.difficulty,
            }),
        }
    }

    fn next_block(&self, beneficiary: &str) -> Result<Block> {
        let mut transactions = self.pending.clone();
        transactions.push(Transaction::reward(
            self.reward_sender.as_str(),
            beneficiary,
            self.mining_reward,
        ));

        Block::new(
            self.chain.len() as u64,
            Block::now_timestamp(),
            Payload::from(transactions),
            self.latest_block().hash(),
        )
    }

    fn append_sealed(&mut self, block: Block, attempts: u64, elapsed: Duration) -> BlockSummary {
        let summary = BlockSummary::new(&block, attempts, elapsed);
        self.chain.push(block);
        self.pending.clear();
        self.observer.block_mined(&summary);
        summary
    }

    /// Full integrity walk with the reason and index of the first failure.
    pub fn validate(&self) -> ValidationReport {
        let report = validate_chain(&self.chain, self.difficulty);
        self.observer.chain_validated(&report);
        report
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_valid()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restore a ledger from its JSON form. Block hashes are not checked
    /// here; run [`Ledger::validate`] on the result.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: LedgerSnapshot = serde_json::from_str(json)?;
        Ledger::try_from(snapshot)
    }
}

#[cfg(any(test, feature = "tamper"))]
impl Ledger {
    /// Overwrite the block at `index` as-is, returning the original.
    pub fn replace_block(&mut self, index: usize, block: Block) -> Result<Block> {
        let slot = self
            .chain
            .get_mut(index)
            .ok_or(ChainError::BlockNotFound(index))?;
        Ok(std::mem::replace(slot, block))
    }

    pub fn swap_blocks(&mut self, a: usize, b: usize) -> Result<()> {
        for index in [a, b] {
            if index >= self.chain.len() {
                return Err(ChainError::BlockNotFound(index));
            }
        }
        self.chain.swap(a, b);
        Ok(())
    }
}
