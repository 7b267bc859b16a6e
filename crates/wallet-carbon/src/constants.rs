//! Centralized constants for the wallet carbon CLI

// =============================================================================
// API Endpoints
// =============================================================================

/// Moralis wallet history base URL (append wallet address)
pub const MORALIS_API_BASE: &str = "https://deep-index.moralis.io/api/v2.2";

/// Environment variable holding the Moralis API key
pub const MORALIS_API_KEY_ENV: &str = "MORALIS_API_KEY";

// =============================================================================
// History Defaults
// =============================================================================

/// Chain queried when none is given
pub const DEFAULT_CHAIN: &str = "eth";

/// Transactions requested per wallet/chain
pub const DEFAULT_HISTORY_LIMIT: u32 = 100;

/// Recent transactions included in the activity summary
pub const RECENT_SAMPLE_SIZE: usize = 5;

/// Wei per native token (ETH, MATIC, BNB, ...)
pub const WEI_PER_NATIVE: f64 = 1e18;

// =============================================================================
// Rate Limiting
// =============================================================================

/// Attempts per history request (first try + retries)
pub const MAX_FETCH_ATTEMPTS: u32 = 4;

/// Base retry delay after a failed request (seconds)
pub const RETRY_BASE_DELAY_SECS: u64 = 2;

/// Base retry delay after HTTP 429 (seconds)
pub const RATE_LIMIT_BASE_DELAY_SECS: u64 = 30;

// =============================================================================
// File Names
// =============================================================================

/// Default config file path
pub const CONFIG_FILE: &str = "config.toml";
