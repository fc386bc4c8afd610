//! Configuration management for Intercoin

use crate::blockchain::{DEFAULT_DIFFICULTY, DEFAULT_MINING_REWARD, MAX_DIFFICULTY, REWARD_SENDER};
use crate::error::{ChainError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "intercoin.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
    #[serde(default = "default_mining_reward")]
    pub mining_reward: u64,
    #[serde(default = "default_reward_sender")]
    pub reward_sender: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            mining_reward: default_mining_reward(),
            reward_sender: default_reward_sender(),
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(ChainError::InvalidDifficulty(self.difficulty));
        }
        if self.reward_sender.trim().is_empty() {
            return Err(ChainError::Config(
                "ledger.reward_sender must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_difficulty() -> u32 {
    DEFAULT_DIFFICULTY
}

fn default_mining_reward() -> u64 {
    DEFAULT_MINING_REWARD
}

pub(crate) fn default_reward_sender() -> String {
    REWARD_SENDER.to_string()
}

/// Loads `intercoin.toml` from the working directory, falling back to defaults
/// when the file is absent.
pub fn load_config() -> Result<Config> {
    load_config_from(DEFAULT_CONFIG_PATH)
}

pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let config: Config = if path.exists() {
        let config_str = fs::read_to_string(path)?;
        toml::from_str(&config_str)?
    } else {
        Config::default()
    };

    config.ledger.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.ledger.difficulty, DEFAULT_DIFFICULTY);
        assert_eq!(config.ledger.mining_reward, DEFAULT_MINING_REWARD);
        assert_eq!(config.ledger.reward_sender, REWARD_SENDER);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ledger]\ndifficulty = 2").unwrap();

        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.ledger.difficulty, 2);
        assert_eq!(config.ledger.mining_reward, 10);
    }

    #[test]
    fn test_difficulty_above_digest_width_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ledger]\ndifficulty = 65").unwrap();

        let err = load_config_from(file.path()).unwrap_err();
        assert_eq!(err, ChainError::InvalidDifficulty(65));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ledger]\ndifficulty = \"four\"").unwrap();

        assert!(matches!(
            load_config_from(file.path()),
            Err(ChainError::Config(_))
        ));
    }
}
