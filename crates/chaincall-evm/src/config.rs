//! Dispatch configuration.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::transaction::TxType;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Defaults applied by [`crate::contract::Contract`] when building
/// transactions and calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchConfig {
    /// Chain id written into populated transactions
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Envelope used by `populate_transaction` and `send`. Blob
    /// transactions need blob hashes a contract call cannot supply, so
    /// `blob` is rejected.
    #[serde(default)]
    pub tx_type: TxType,
    /// Default sender when no `from` override is given
    #[serde(default)]
    pub from: Option<Address>,
    /// Block tag for static calls
    #[serde(default = "default_block")]
    pub block: String,
}

fn default_chain_id() -> u64 { 1 }
fn default_block() -> String { "latest".into() }

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            tx_type: TxType::default(),
            from: None,
            block: default_block(),
        }
    }
}

impl DispatchConfig {
    /// Parse from a JSON document; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tx_type == TxType::Blob {
            return Err(ConfigError::Invalid(
                "txType 'blob' cannot be populated from a contract call".into(),
            ));
        }
        Ok(())
    }

    /// Load from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn with_tx_type(mut self, tx_type: TxType) -> Self {
        self.tx_type = tx_type;
        self
    }

    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }
}
