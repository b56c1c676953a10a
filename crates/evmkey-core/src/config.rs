//! Wallet configuration

use std::path::{Path, PathBuf};

use evmkey_hd::{DerivationPath, ParentKeyEncoding, PathError, WordCount, ETHEREUM_PATH};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid derivation path: {0}")]
    Path(#[from] PathError),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Chain parameters and derivation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// EIP-155 chain id
    pub chain_id: u64,
    /// Path from the master node to the account key
    pub derivation_path: String,
    /// Parent public key form for non-hardened steps
    pub parent_key_encoding: ParentKeyEncoding,
    /// Length of newly generated phrases
    pub word_count: WordCount,
    /// Gas limit for plain value transfers
    pub native_gas_limit: u64,
    /// Fractional digits shown for balances
    pub display_precision: u8,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            derivation_path: ETHEREUM_PATH.to_string(),
            parent_key_encoding: ParentKeyEncoding::Uncompressed,
            word_count: WordCount::Twelve,
            native_gas_limit: 21_000,
            display_precision: 4,
        }
    }
}

impl WalletConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain_id == 0 {
            return Err(ConfigError::Invalid("chain_id must be non-zero".into()));
        }
        if self.native_gas_limit < 21_000 {
            return Err(ConfigError::Invalid(format!(
                "native_gas_limit {} is below the 21000 intrinsic cost",
                self.native_gas_limit
            )));
        }
        if self.display_precision > 18 {
            return Err(ConfigError::Invalid(
                "display_precision must be at most 18".into(),
            ));
        }
        self.derivation_path()?;
        Ok(())
    }

    pub fn derivation_path(&self) -> Result<DerivationPath, PathError> {
        self.derivation_path.parse()
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }
}
