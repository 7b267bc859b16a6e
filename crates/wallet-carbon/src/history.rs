//! Wallet transaction history via the Moralis API
//!
//! Fetches a wallet's recent transactions for one chain, classifies them,
//! and reduces them to the network/type counts the estimator consumes.
//! Summaries are cached in-process by `address:chain:limit` for the life of
//! the client; there is no eviction.

use anyhow::{Context, Result};
use carbon_engine::report::group_thousands;
use carbon_engine::{NetworkDistribution, TransactionTypeDistribution};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::constants;

// =============================================================================
// Moralis response format
// =============================================================================

/// Wallet history response (`GET /{address}?chain=..&limit=..`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletHistoryResponse {
    #[serde(default)]
    pub result: Vec<RawTransaction>,
}

/// A transaction as returned by Moralis. Numeric fields arrive as strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTransaction {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub block_timestamp: Option<String>,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub receipt_gas_used: Option<String>,
}

impl RawTransaction {
    fn gas_used(&self) -> u64 {
        self.receipt_gas_used
            .as_deref()
            .and_then(|g| g.parse().ok())
            .unwrap_or(0)
    }

    fn value_wei(&self) -> u128 {
        self.value.as_deref().and_then(|v| v.parse().ok()).unwrap_or(0)
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Coarse transaction category derived from calldata and value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    ContractInteraction,
    SimpleTransfer,
    Other,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::ContractInteraction => "contract_interaction",
            TxKind::SimpleTransfer => "simple_transfer",
            TxKind::Other => "other",
        }
    }
}

/// Calldata means a contract call; otherwise a non-zero value is a transfer
pub fn classify(tx: &RawTransaction) -> TxKind {
    let has_calldata = tx.input.as_deref().is_some_and(|input| !input.is_empty() && input != "0x");
    if has_calldata {
        TxKind::ContractInteraction
    } else if tx.value_wei() > 0 {
        TxKind::SimpleTransfer
    } else {
        TxKind::Other
    }
}

/// Map a user-supplied chain name to its Moralis chain id (unknown -> eth)
pub fn map_chain_name(chain: &str) -> &'static str {
    match chain.trim().to_lowercase().as_str() {
        "ethereum" | "eth" => "eth",
        "polygon" | "matic" => "polygon",
        "bsc" | "bnb" | "binance" => "bsc",
        "arbitrum" => "arbitrum",
        "optimism" => "optimism",
        "base" => "base",
        "avalanche" | "avax" => "avalanche",
        _ => "eth",
    }
}

/// Factor table network key for a Moralis chain id
pub fn chain_network_key(chain_id: &str) -> &str {
    match chain_id {
        "eth" => "ethereum",
        other => other,
    }
}

// =============================================================================
// Activity summary
// =============================================================================

/// One of the most recent transactions, prepared for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionSample {
    pub hash: String,
    pub time: String,
    pub gas_used: u64,
    pub value_native: f64,
    pub block: String,
}

/// Summary of a wallet's history on one chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletActivity {
    pub address: String,
    /// Moralis chain id
    pub chain: String,
    pub total_transactions: u64,
    pub total_gas_used: u64,
    pub type_counts: BTreeMap<String, u64>,
    pub recent: Vec<TransactionSample>,
}

impl WalletActivity {
    pub fn network_distribution(&self) -> NetworkDistribution {
        let mut dist = NetworkDistribution::new();
        if self.total_transactions > 0 {
            dist.insert(chain_network_key(&self.chain).to_string(), self.total_transactions);
        }
        dist
    }

    pub fn type_distribution(&self) -> TransactionTypeDistribution {
        self.type_counts.clone()
    }

    pub fn average_gas(&self) -> u64 {
        self.total_gas_used.checked_div(self.total_transactions).unwrap_or(0)
    }
}

/// Distributions merged across several chains
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinedActivity {
    pub total_transactions: u64,
    pub networks: NetworkDistribution,
    pub transaction_types: TransactionTypeDistribution,
}

/// Merge per-chain activity into single network and type distributions
pub fn combine(activities: &[WalletActivity]) -> CombinedActivity {
    let mut combined = CombinedActivity::default();
    for activity in activities {
        combined.total_transactions = combined.total_transactions.saturating_add(activity.total_transactions);
        for (network, count) in activity.network_distribution() {
            let entry = combined.networks.entry(network).or_insert(0);
            *entry = entry.saturating_add(count);
        }
        for (tx_type, count) in activity.type_distribution() {
            let entry = combined.transaction_types.entry(tx_type).or_insert(0);
            *entry = entry.saturating_add(count);
        }
    }
    combined
}

fn format_timestamp(raw: Option<&str>) -> String {
    match raw {
        None => "Unknown time".to_string(),
        Some(ts) => DateTime::parse_from_rfc3339(ts)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|_| ts.to_string()),
    }
}

fn short_hash(hash: Option<&str>) -> String {
    let hash = hash.unwrap_or("Unknown");
    format!("{}...", hash.chars().take(16).collect::<String>())
}

/// Reduce a transaction list to counts, gas totals and recent samples
pub fn summarize(address: &str, chain_id: &str, transactions: &[RawTransaction]) -> WalletActivity {
    let mut type_counts = BTreeMap::new();
    for tx in transactions {
        *type_counts.entry(classify(tx).as_str().to_string()).or_insert(0u64) += 1;
    }

    let recent = transactions
        .iter()
        .take(constants::RECENT_SAMPLE_SIZE)
        .map(|tx| TransactionSample {
            hash: short_hash(tx.hash.as_deref()),
            time: format_timestamp(tx.block_timestamp.as_deref()),
            gas_used: tx.gas_used(),
            value_native: tx.value_wei() as f64 / constants::WEI_PER_NATIVE,
            block: tx.block_number.clone().unwrap_or_else(|| "Unknown".to_string()),
        })
        .collect();

    WalletActivity {
        address: address.to_string(),
        chain: chain_id.to_string(),
        total_transactions: transactions.len() as u64,
        total_gas_used: transactions
            .iter()
            .fold(0u64, |acc, tx| acc.saturating_add(tx.gas_used())),
        type_counts,
        recent,
    }
}

/// Human-readable activity summary
pub fn format_activity(activity: &WalletActivity) -> String {
    let chain = activity.chain.to_uppercase();
    if activity.total_transactions == 0 {
        return format!("No transactions found for {} on {}.", activity.address, activity.chain);
    }

    let mut lines = vec![
        format!("Transaction History for {} on {}:", activity.address, chain),
        String::new(),
        "Summary Statistics:".to_string(),
        format!("  Total Transactions: {}", group_thousands(activity.total_transactions)),
        format!("  Total Gas Used: {}", group_thousands(activity.total_gas_used)),
        format!("  Average Gas per Transaction: {}", group_thousands(activity.average_gas())),
        String::new(),
        "Transaction Type Breakdown:".to_string(),
    ];

    let mut types: Vec<_> = activity.type_counts.iter().collect();
    types.sort_by(|a, b| b.1.cmp(a.1));
    for (tx_type, count) in types {
        let percentage = *count as f64 / activity.total_transactions as f64 * 100.0;
        lines.push(format!(
            "  {}: {} ({:.1}%)",
            carbon_engine::report::title_case(&tx_type.replace('_', " ")),
            count,
            percentage
        ));
    }

    lines.push(String::new());
    lines.push(format!("Recent Transactions (latest {}):", activity.recent.len()));
    for (idx, tx) in activity.recent.iter().enumerate() {
        lines.push(String::new());
        lines.push(format!("{}. Transaction {}", idx + 1, tx.hash));
        lines.push(format!("   Time: {}", tx.time));
        lines.push(format!("   Gas Used: {}", group_thousands(tx.gas_used)));
        lines.push(format!("   Value: {:.6} {}", tx.value_native, native_symbol(&activity.chain)));
        lines.push(format!("   Block: {}", tx.block));
    }

    let remaining = activity.total_transactions.saturating_sub(activity.recent.len() as u64);
    if remaining > 0 {
        lines.push(String::new());
        lines.push(format!("... and {} more transactions", remaining));
    }

    lines.join("\n")
}

fn native_symbol(chain_id: &str) -> &'static str {
    match chain_id {
        "polygon" => "MATIC",
        "bsc" => "BNB",
        "avalanche" => "AVAX",
        _ => "ETH",
    }
}

/// Load a saved Moralis wallet history response
pub fn load_history_file(path: &Path) -> Result<WalletHistoryResponse> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    serde_json::from_str(&content).with_context(|| "Failed to parse wallet history JSON")
}

/// Wallet history endpoint. The address is pushed as one encoded path
/// segment so it cannot alter the query.
pub fn history_url(address: &str, chain_id: &str, limit: u32) -> Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(constants::MORALIS_API_BASE).context("Invalid Moralis API base URL")?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("Moralis API base URL cannot take a path"))?
        .push(address);
    url.query_pairs_mut()
        .append_pair("chain", chain_id)
        .append_pair("limit", &limit.to_string());
    Ok(url)
}

// =============================================================================
// HTTP client with in-process cache
// =============================================================================

/// Result of a history lookup
#[derive(Debug, Clone)]
pub struct Fetched {
    pub activity: WalletActivity,
    /// True when served from the in-process cache
    pub cached: bool,
}

pub struct HistoryClient {
    http: reqwest::Client,
    api_key: String,
    cache: HashMap<String, WalletActivity>,
}

impl HistoryClient {
    /// Create a client. Fails if no API key is configured.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let Some(api_key) = api_key else {
            anyhow::bail!(
                "{} environment variable not set.\n\n\
                 Set it, or add api_key under [moralis] in config.toml.\n\
                 Use --from-file to analyse a saved history export instead.",
                constants::MORALIS_API_KEY_ENV
            );
        };

        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            cache: HashMap::new(),
        })
    }

    pub fn cache_key(address: &str, chain: &str, limit: u32) -> String {
        format!("{}:{}:{}", address.to_lowercase(), chain.to_lowercase(), limit)
    }

    /// Fetch and summarize history for one chain, serving repeats from cache
    pub async fn fetch(&mut self, address: &str, chain: &str, limit: u32) -> Result<Fetched> {
        let key = Self::cache_key(address, chain, limit);
        if let Some(activity) = self.cache.get(&key) {
            return Ok(Fetched {
                activity: activity.clone(),
                cached: true,
            });
        }

        let chain_id = map_chain_name(chain);
        let response = self.fetch_history(address, chain_id, limit).await?;
        let activity = summarize(address, chain_id, &response.result);
        info!(
            "Fetched {} transactions for {} on {}",
            activity.total_transactions, address, chain_id
        );

        self.cache.insert(key, activity.clone());
        Ok(Fetched {
            activity,
            cached: false,
        })
    }

    /// GET wallet history with retry (longer backoff when rate limited)
    async fn fetch_history(&self, address: &str, chain_id: &str, limit: u32) -> Result<WalletHistoryResponse> {
        let url = history_url(address, chain_id, limit)?;

        let mut last_error = None;
        let mut was_rate_limited = false;

        for attempt in 0..constants::MAX_FETCH_ATTEMPTS {
            if attempt > 0 {
                let base_delay = if was_rate_limited {
                    constants::RATE_LIMIT_BASE_DELAY_SECS
                } else {
                    constants::RETRY_BASE_DELAY_SECS
                };
                let delay = Duration::from_secs(base_delay * 2u64.pow(attempt - 1));
                warn!(
                    "Retry {}/{} after {:?}{}",
                    attempt,
                    constants::MAX_FETCH_ATTEMPTS - 1,
                    delay,
                    if was_rate_limited { " (rate limited)" } else { "" }
                );
                sleep(delay).await;
            }

            match self
                .http
                .get(url.clone())
                .header("accept", "application/json")
                .header("X-API-Key", &self.api_key)
                .send()
                .await
            {
                Ok(response) => {
                    if response.status().is_success() {
                        return response
                            .json::<WalletHistoryResponse>()
                            .await
                            .context("Failed to decode Moralis response");
                    } else if response.status().as_u16() == 429 {
                        was_rate_limited = true;
                        last_error = Some(anyhow::anyhow!("Rate limited (429)"));
                    } else {
                        was_rate_limited = false;
                        last_error = Some(anyhow::anyhow!("Moralis API returned status: {}", response.status()));
                    }
                }
                Err(e) => {
                    was_rate_limited = false;
                    last_error = Some(anyhow::anyhow!("Request failed: {}", e));
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow::anyhow!("Failed after {} attempts", constants::MAX_FETCH_ATTEMPTS))
            .context(format!("Error fetching transaction data from Moralis for {}", address)))
    }
}
