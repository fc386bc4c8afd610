use crate::error::{ChainError, Result};
use crate::transaction::Payload;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub type Sha256Hash = [u8; 32];

/// A SHA-256 digest renders as 64 hex digits, so no higher target can be met.
pub const MAX_DIFFICULTY: u32 = 64;

/// Predecessor link stored in the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Result of a mining search with an attempt cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiningOutcome {
    Mined { attempts: u64 },
    Exhausted { attempts: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    position: u64,
    timestamp: String,
    payload: Payload,
    previous_hash: String,
    nonce: u64,
    hash: String,
}

impl Block {
    /// Builds a block at nonce 0 with its hash already derived. The block is
    /// not mined yet.
    pub fn new(
        position: u64,
        timestamp: impl Into<String>,
        payload: Payload,
        previous_hash: impl Into<String>,
    ) -> Result<Self> {
        let mut block = Block {
            position,
            timestamp: timestamp.into(),
            payload,
            previous_hash: previous_hash.into(),
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.calculate_hash()?;
        Ok(block)
    }

    /// Current time in the ISO-8601 form used for block timestamps.
    pub fn now_timestamp() -> String {
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn is_genesis(&self) -> bool {
        self.position == 0
    }

    /// Re-derives the digest of the block's current contents.
    pub fn calculate_hash(&self) -> Result<String> {
        let prefix = self.prefix_hasher()?;
        Ok(hex::encode(digest_with_nonce(&prefix, self.nonce)))
    }

    /// True when the stored hash starts with `difficulty` zero hex digits.
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        hash_meets_difficulty(&self.hash, difficulty)
    }

    /// Proof-of-work search: bumps the nonce until the hash carries
    /// `difficulty` leading zero hex digits. Returns the number of digests
    /// computed.
    pub fn mine(&mut self, difficulty: u32) -> Result<u64> {
        match self.search(difficulty, None)? {
            MiningOutcome::Mined { attempts } => Ok(attempts),
            MiningOutcome::Exhausted { attempts } => Err(ChainError::MiningExhausted {
                attempts,
                difficulty,
            }),
        }
    }

    /// Like [`Block::mine`] but gives up after `max_attempts` digests. On
    /// exhaustion the block keeps the last nonce tried, with a matching hash.
    pub fn mine_bounded(&mut self, difficulty: u32, max_attempts: u64) -> Result<MiningOutcome> {
        self.search(difficulty, Some(max_attempts))
    }

    fn search(&mut self, difficulty: u32, max_attempts: Option<u64>) -> Result<MiningOutcome> {
        if difficulty > MAX_DIFFICULTY {
            return Err(ChainError::InvalidDifficulty(difficulty));
        }

        // Everything but the nonce is fixed for the whole search.
        let prefix = self.prefix_hasher()?;
        let mut nonce = self.nonce;
        let mut digest = digest_with_nonce(&prefix, nonce);
        let mut attempts: u64 = 1;

        while !digest_meets_difficulty(&digest, difficulty) {
            if max_attempts.is_some_and(|max| attempts >= max) {
                self.nonce = nonce;
                self.hash = hex::encode(digest);
                return Ok(MiningOutcome::Exhausted { attempts });
            }
            nonce += 1;
            digest = digest_with_nonce(&prefix, nonce);
            attempts += 1;
        }

        self.nonce = nonce;
        self.hash = hex::encode(digest);
        Ok(MiningOutcome::Mined { attempts })
    }

    fn prefix_hasher(&self) -> Result<Sha256> {
        let mut hasher = Sha256::new();
        hasher.update(self.position.to_string().as_bytes());
        hasher.update(self.previous_hash.as_bytes());
        hasher.update(self.timestamp.as_bytes());
        hasher.update(self.payload.canonical_json()?.as_bytes());
        Ok(hasher)
    }
}

fn digest_with_nonce(prefix: &Sha256, nonce: u64) -> Sha256Hash {
    let mut buf = [0u8; 20];
    let mut hasher = prefix.clone();
    hasher.update(decimal_digits(nonce, &mut buf));
    hasher.finalize().into()
}

/// Writes `value` in base 10 into `buf` and returns the used tail.
fn decimal_digits(mut value: u64, buf: &mut [u8; 20]) -> &[u8] {
    let mut start = buf.len();
    loop {
        start -= 1;
        buf[start] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 {
            break;
        }
    }
    &buf[start..]
}

/// Checks leading zero nibbles directly on the raw digest.
pub fn digest_meets_difficulty(digest: &Sha256Hash, difficulty: u32) -> bool {
    if difficulty > MAX_DIFFICULTY {
        return false;
    }
    let full_bytes = (difficulty / 2) as usize;
    if digest[..full_bytes].iter().any(|b| *b != 0) {
        return false;
    }
    difficulty % 2 == 0 || digest[full_bytes] >> 4 == 0
}

/// Checks the leading characters of a hex-rendered hash.
pub fn hash_meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let difficulty = difficulty as usize;
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

/// Raw field set of a block, reassembled without re-deriving the hash.
///
/// This is the only way to alter a block after it is built, and exists to
/// simulate an attacker editing stored blocks.
#[cfg(any(test, feature = "tamper"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockParts {
    pub position: u64,
    pub timestamp: String,
    pub payload: Payload,
    pub previous_hash: String,
    pub nonce: u64,
    pub hash: String,
}

#[cfg(any(test, feature = "tamper"))]
impl Block {
    pub fn into_parts(self) -> BlockParts {
        BlockParts {
            position: self.position,
            timestamp: self.timestamp,
            payload: self.payload,
            previous_hash: self.previous_hash,
            nonce: self.nonce,
            hash: self.hash,
        }
    }

    pub fn from_parts(parts: BlockParts) -> Self {
        Block {
            position: parts.position,
            timestamp: parts.timestamp,
            payload: parts.payload,
            previous_hash: parts.previous_hash,
            nonce: parts.nonce,
            hash: parts.hash,
        }
    }
}
