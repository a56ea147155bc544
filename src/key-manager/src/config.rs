//! Key manager configuration.
//!
//! Loaded from JSON; every field has a default so an empty object is a valid config.

use std::{fs, path::Path};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Deepest nesting the engine accepts for re-entrant calls.
pub const MAX_SUPPORTED_CALL_DEPTH: u32 = 16;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed parsing key manager config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid key manager config: {0}")]
    Invalid(&'static str),
}

/// How SUPER_* permissions interact with value transfers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuperPrecedence {
    /// A SUPER permission only skips the allow-list when the value dimension is also covered.
    #[default]
    Strict,
    /// A SUPER permission for the call type skips the allow-list outright.
    Advisory,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyManagerConfig {
    /// Chain id bound into relay call signatures.
    pub chain_id: u64,
    /// Controller granted every permission while the account has no controllers configured.
    pub initial_controller: Option<Address>,
    pub super_precedence: SuperPrecedence,
    /// Re-entrant nesting allowed below the top-level call.
    pub max_call_depth: u32,
    /// Cost units a request may spend when the caller does not supply a limit.
    pub default_cost_limit: u64,
}

impl Default for KeyManagerConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            initial_controller: None,
            super_precedence: SuperPrecedence::Strict,
            max_call_depth: 1,
            default_cost_limit: 1_000_000,
        }
    }
}

impl KeyManagerConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain_id == 0 {
            return Err(ConfigError::Invalid("chain_id must be non-zero"));
        }
        if self.max_call_depth > MAX_SUPPORTED_CALL_DEPTH {
            return Err(ConfigError::Invalid("max_call_depth exceeds 16"));
        }
        if self.default_cost_limit == 0 {
            return Err(ConfigError::Invalid("default_cost_limit must be non-zero"));
        }
        Ok(())
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn with_initial_controller(mut self, controller: Address) -> Self {
        self.initial_controller = Some(controller);
        self
    }

    pub fn with_super_precedence(mut self, precedence: SuperPrecedence) -> Self {
        self.super_precedence = precedence;
        self
    }
}
