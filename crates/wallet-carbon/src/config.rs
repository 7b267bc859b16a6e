//! Configuration for the wallet carbon CLI

use anyhow::{Context, Result};
use carbon_engine::FactorTable;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants;

// =============================================================================
// File-based Configuration (config.toml)
// =============================================================================

/// Configuration loaded from config.toml. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub factors: FactorsConfig,
    #[serde(default)]
    pub moralis: MoralisConfig,
}

/// Emission factor data location
#[derive(Debug, Default, Deserialize)]
pub struct FactorsConfig {
    /// Path to carbon_data.json
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Moralis wallet history settings
#[derive(Debug, Deserialize)]
pub struct MoralisConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    /// Chain used when `--chain` is not given
    #[serde(default = "default_chain")]
    pub default_chain: String,
    /// Transactions requested per chain
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl Default for MoralisConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_chain: default_chain(),
            limit: default_limit(),
        }
    }
}

fn default_chain() -> String {
    constants::DEFAULT_CHAIN.to_string()
}

fn default_limit() -> u32 {
    constants::DEFAULT_HISTORY_LIMIT
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content).with_context(|| {
            "Failed to parse config.toml. Check for:\n\
             - Invalid TOML syntax (missing quotes, brackets, etc.)\n\
             - Incorrect data types (moralis.limit must be a number)\n\n\
             See config.toml.example for the expected format."
        })
    }

    /// Load the config file if present; a missing file means defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Resolved settings
#[derive(Debug)]
pub struct Config {
    /// Factor data files to try, in order
    pub factor_candidates: Vec<PathBuf>,
    /// Moralis API key (environment takes precedence over config.toml)
    pub moralis_api_key: Option<String>,
    pub default_chain: String,
    pub history_limit: u32,
}

impl Config {
    /// Combine file config with CLI and environment overrides
    pub fn from_file(file_config: &FileConfig, factors_override: Option<PathBuf>, env_api_key: Option<String>) -> Self {
        let mut factor_candidates = Vec::new();
        factor_candidates.extend(factors_override);
        factor_candidates.extend(file_config.factors.path.clone());
        factor_candidates.extend(FactorTable::default_candidates());

        let moralis_api_key = env_api_key
            .filter(|key| !key.trim().is_empty())
            .or_else(|| file_config.moralis.api_key.clone())
            .filter(|key| !key.trim().is_empty());

        Self {
            factor_candidates,
            moralis_api_key,
            default_chain: file_config.moralis.default_chain.clone(),
            history_limit: file_config.moralis.limit,
        }
    }

    /// Load the emission factor table (never fails; falls back to built-ins)
    pub fn factor_table(&self) -> FactorTable {
        FactorTable::load_or_default(&self.factor_candidates)
    }
}
