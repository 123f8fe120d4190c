//! Configuration management for Frostchain

use crate::crypto::address_from_string;
use crate::error::{ChainError, Result};
use crate::miner::DEFAULT_BATCH_SIZE;
use crate::transaction::BLOCK_REWARD;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub miner: MinerConfig,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MinerConfig {
    /// Address mined rewards are paid to (base64 text form).
    pub beneficiary_address: Option<String>,
    /// Amount the coinbase claims. The reward cap is a strict `<`
    /// against the issuance, so this must stay below it.
    #[serde(default = "default_reward")]
    pub reward: f64,
    /// Nonces tried per batch before the candidate is refreshed.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            path: default_db_path(),
        }
    }
}

impl Default for MinerConfig {
    fn default() -> Self {
        MinerConfig {
            beneficiary_address: None,
            reward: default_reward(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_db_path() -> String {
    dirs::home_dir()
        .map(|home| home.join(".frostchain").join("chain.db"))
        .map(|path| path.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frostchain.db".to_string())
}

fn default_reward() -> f64 {
    9.99
}

fn default_batch_size() -> u32 {
    DEFAULT_BATCH_SIZE
}

/// Load configuration from the given file (or defaults when absent)
/// and validate critical values.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_str = match path {
        Some(path) => fs::read_to_string(path).map_err(|e| {
            ChainError::Config(format!("failed to read {}: {}", path.display(), e))
        })?,
        None => fs::read_to_string("frostchain.toml").unwrap_or_default(),
    };

    let config: Config = if config_str.is_empty() {
        Config {
            storage: StorageConfig::default(),
            miner: MinerConfig::default(),
        }
    } else {
        toml::from_str(&config_str).map_err(|e| ChainError::Config(e.to_string()))?
    };

    if config.storage.path.is_empty() {
        return Err(ChainError::Config("storage.path must not be empty".to_string()));
    }
    if config.miner.batch_size == 0 {
        return Err(ChainError::Config("miner.batch_size must be positive".to_string()));
    }
    if !(config.miner.reward > 0.0 && config.miner.reward < BLOCK_REWARD) {
        return Err(ChainError::Config(format!(
            "miner.reward must be in (0, {}) to pass the strict reward cap",
            BLOCK_REWARD
        )));
    }
    if let Some(address) = &config.miner.beneficiary_address {
        address_from_string(address)
            .map_err(|e| ChainError::Config(format!("miner.beneficiary_address: {}", e)))?;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{address_to_string, KeyPair};
    use std::io::Write;

    #[test]
    fn test_defaults_when_config_missing() {
        let config = load_config(None).unwrap();
        assert_eq!(config.miner.reward, 9.99);
        assert_eq!(config.miner.batch_size, DEFAULT_BATCH_SIZE);
        assert!(config.miner.beneficiary_address.is_none());
        assert!(!config.storage.path.is_empty());
    }

    #[test]
    fn test_parse_and_validate() {
        let keypair = KeyPair::generate().unwrap();
        let address = address_to_string(&keypair.address());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[storage]\npath = \"/tmp/frost-test.db\"\n\n\
             [miner]\nbeneficiary_address = \"{}\"\nreward = 5.0\nbatch_size = 128",
            address
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.storage.path, "/tmp/frost-test.db");
        assert_eq!(config.miner.reward, 5.0);
        assert_eq!(config.miner.batch_size, 128);
    }

    #[test]
    fn test_full_reward_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[miner]\nreward = 10.0").unwrap();
        assert!(matches!(
            load_config(Some(file.path())),
            Err(ChainError::Config(_))
        ));
    }

    #[test]
    fn test_bad_beneficiary_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[miner]\nbeneficiary_address = \"not-an-address\"").unwrap();
        assert!(matches!(
            load_config(Some(file.path())),
            Err(ChainError::Config(_))
        ));
    }
}
