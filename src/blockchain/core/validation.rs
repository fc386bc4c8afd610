use super::block::Block;
use crate::error::Result as ChainResult;
use std::fmt;

/// Why a chain failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    /// Stored hash differs from the digest of the block's current fields.
    HashMismatch { stored: String, computed: String },
    /// `previous_hash` does not match the predecessor's stored hash.
    BrokenLink { expected: String, found: String },
    /// Stored hash lacks the required leading zero digits.
    InsufficientWork { difficulty: u32 },
    /// The hash could not be recomputed at all.
    Internal(String),
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InvalidReason::HashMismatch { stored, computed } => write!(
                f,
                "block has been tampered with (stored hash {}, computed {})",
                stored, computed
            ),
            InvalidReason::BrokenLink { expected, found } => write!(
                f,
                "invalid previous hash (expected {}, found {})",
                expected, found
            ),
            InvalidReason::InsufficientWork { difficulty } => write!(
                f,
                "block has not been properly mined (needs {} leading zeros)",
                difficulty
            ),
            InvalidReason::Internal(msg) => write!(f, "error validating block: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationReport {
    Valid,
    Invalid { index: usize, reason: InvalidReason },
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationReport::Valid)
    }

    /// Index of the first failing block, if any.
    pub fn failed_index(&self) -> Option<usize> {
        match self {
            ValidationReport::Valid => None,
            ValidationReport::Invalid { index, .. } => Some(*index),
        }
    }

    pub fn reason(&self) -> Option<&InvalidReason> {
        match self {
            ValidationReport::Valid => None,
            ValidationReport::Invalid { reason, .. } => Some(reason),
        }
    }
}

/// Walks the chain from position 1, checking self-integrity, linkage and
/// proof-of-work in that order. Genesis is trusted as the anchor. Stops at
/// the first failure.
pub fn validate_chain(blocks: &[Block], difficulty: u32) -> ValidationReport {
    validate_chain_with(blocks, difficulty, Block::calculate_hash)
}

/// Same walk with the digest derivation supplied by the caller. A failing
/// `rehash` is reported as [`InvalidReason::Internal`] at that block.
fn validate_chain_with(
    blocks: &[Block],
    difficulty: u32,
    rehash: impl Fn(&Block) -> ChainResult<String>,
) -> ValidationReport {
    for (index, pair) in blocks.windows(2).enumerate() {
        let index = index + 1;
        if let Err(reason) = validate_link(&pair[0], &pair[1], difficulty, &rehash) {
            return ValidationReport::Invalid { index, reason };
        }
    }
    ValidationReport::Valid
}

fn validate_link(
    previous: &Block,
    current: &Block,
    difficulty: u32,
    rehash: &impl Fn(&Block) -> ChainResult<String>,
) -> Result<(), InvalidReason> {
    let computed = rehash(current).map_err(|e| InvalidReason::Internal(e.to_string()))?;
    if computed != current.hash() {
        return Err(InvalidReason::HashMismatch {
            stored: current.hash().to_string(),
            computed,
        });
    }

    if current.previous_hash() != previous.hash() {
        return Err(InvalidReason::BrokenLink {
            expected: previous.hash().to_string(),
            found: current.previous_hash().to_string(),
        });
    }

    if !current.meets_difficulty(difficulty) {
        return Err(InvalidReason::InsufficientWork { difficulty });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Payload, Transaction};

    fn mined(position: u64, previous_hash: &str, difficulty: u32) -> Block {
        let mut block = Block::new(
            position,
            format!("t{}", position),
            Payload::from(vec![Transaction::transfer("A", "B", position)]),
            previous_hash,
        )
        .unwrap();
        block.mine(difficulty).unwrap();
        block
    }

    fn chain_of(len: u64, difficulty: u32) -> Vec<Block> {
        let mut blocks = vec![mined(0, "0", difficulty)];
        for position in 1..len {
            let prev = blocks[blocks.len() - 1].hash().to_string();
            blocks.push(mined(position, &prev, difficulty));
        }
        blocks
    }

    #[test]
    fn test_single_block_chain_is_valid() {
        assert!(validate_chain(&chain_of(1, 1), 1).is_valid());
    }

    #[test]
    fn test_linked_chain_is_valid() {
        let report = validate_chain(&chain_of(4, 1), 1);
        assert_eq!(report, ValidationReport::Valid);
        assert_eq!(report.failed_index(), None);
    }

    #[test]
    fn test_unlinked_block_reports_broken_link() {
        let mut blocks = chain_of(2, 1);
        blocks.push(mined(2, "feed", 1));

        let report = validate_chain(&blocks, 1);
        assert_eq!(report.failed_index(), Some(2));
        assert!(matches!(
            report.reason(),
            Some(InvalidReason::BrokenLink { found, .. }) if found == "feed"
        ));
    }

    #[test]
    fn test_unmined_block_reports_insufficient_work() {
        let mut blocks = chain_of(2, 2);
        let prev = blocks[1].hash().to_string();
        // First unmined candidate whose nonce-0 hash misses the target.
        let lazy = (0..)
            .map(|i| Block::new(2, format!("t2-{}", i), Payload::from(Vec::new()), prev.as_str()).unwrap())
            .find(|b| !b.meets_difficulty(2))
            .unwrap();
        blocks.push(lazy);

        let report = validate_chain(&blocks, 2);
        assert_eq!(
            report,
            ValidationReport::Invalid {
                index: 2,
                reason: InvalidReason::InsufficientWork { difficulty: 2 }
            }
        );
    }

    #[test]
    fn test_genesis_is_not_checked() {
        let mut blocks = chain_of(1, 0);
        let unmined = Block::new(0, "x", Payload::genesis(), "0").unwrap();
        blocks[0] = unmined;
        assert!(validate_chain(&blocks, 8).is_valid());
    }

    #[test]
    fn test_rehash_failure_reports_internal() {
        use crate::error::ChainError;

        let blocks = chain_of(3, 1);
        let failing_at_two = |block: &Block| {
            if block.position() == 2 {
                Err(ChainError::Serialization("payload not serializable".to_string()))
            } else {
                block.calculate_hash()
            }
        };

        let report = validate_chain_with(&blocks, 1, failing_at_two);
        assert_eq!(report.failed_index(), Some(2));
        assert!(matches!(
            report.reason(),
            Some(InvalidReason::Internal(msg)) if msg.contains("payload not serializable")
        ));
    }
}
