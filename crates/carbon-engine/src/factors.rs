//! Emission factor table
//!
//! Maps network names and transaction types to per-transaction CO2/energy
//! coefficients. The table is loaded once from `carbon_data.json`; when that
//! resource is missing or malformed the built-in factors are used instead.
//! Lookups never fail: unknown keys resolve to the default factor, and the
//! result records which path was taken.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::constants;
use crate::error::FactorError;

/// Built-in network factors: (network, kg CO2 per tx, kWh per tx)
const BUILTIN_NETWORKS: [(&str, f64, f64); 7] = [
    ("ethereum", 0.0001, 0.0002),
    ("polygon", 0.00009, 0.00018),
    ("optimism", 0.00005, 0.0001),
    ("arbitrum", 0.00005, 0.0001),
    ("base", 0.00005, 0.0001),
    ("bsc", 0.00012, 0.00024),
    ("avalanche", 0.0001, 0.0002),
];

/// Built-in transaction type multipliers
const BUILTIN_TRANSACTION_TYPES: [(&str, f64); 8] = [
    ("simple_transfer", 1.0),
    ("swap", 1.5),
    ("liquidity_add", 2.0),
    ("liquidity_remove", 2.0),
    ("nft_mint", 2.5),
    ("nft_transfer", 1.2),
    ("contract_deployment", 5.0),
    ("complex_defi", 3.0),
];

/// Per-transaction emission profile of a network
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkEmissionFactor {
    pub network_id: String,
    pub co2_per_tx_kg: f64,
    pub energy_per_tx_kwh: f64,
}

/// Weighting applied to a category of transaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionTypeFactor {
    pub type_id: String,
    pub multiplier: f64,
}

/// Outcome of a factor lookup
#[derive(Debug, Clone, PartialEq)]
pub enum FactorLookup<F> {
    /// The key was present in the table
    Found(F),
    /// The key was missing; the default factor was substituted
    Defaulted(F),
}

impl<F> FactorLookup<F> {
    pub fn factor(&self) -> &F {
        match self {
            FactorLookup::Found(f) | FactorLookup::Defaulted(f) => f,
        }
    }

    pub fn into_factor(self) -> F {
        match self {
            FactorLookup::Found(f) | FactorLookup::Defaulted(f) => f,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, FactorLookup::Defaulted(_))
    }
}

// =============================================================================
// JSON resource format (carbon_data.json)
// =============================================================================

#[derive(Debug, Deserialize)]
struct FactorFile {
    networks: HashMap<String, NetworkEntry>,
    transaction_types: HashMap<String, TransactionTypeEntry>,
}

#[derive(Debug, Deserialize)]
struct NetworkEntry {
    co2_per_transaction_kg: f64,
    energy_per_transaction_kwh: f64,
}

#[derive(Debug, Deserialize)]
struct TransactionTypeEntry {
    multiplier: f64,
}

/// Normalize a network or type name for lookup.
/// "Arbitrum One" and "arbitrum-one" both become "arbitrum_one".
pub fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}

fn check_factor(key: &str, field: &'static str, value: f64) -> Result<f64, FactorError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(FactorError::Invalid {
            key: key.to_string(),
            field,
            value,
        })
    }
}

// =============================================================================
// Factor Table
// =============================================================================

/// Immutable set of network and transaction type factors
#[derive(Debug, Clone, PartialEq)]
pub struct FactorTable {
    networks: BTreeMap<String, NetworkEmissionFactor>,
    transaction_types: BTreeMap<String, TransactionTypeFactor>,
}

impl Default for FactorTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FactorTable {
    /// The fixed factor set used when no data file is available
    pub fn builtin() -> Self {
        let networks = BUILTIN_NETWORKS
            .iter()
            .map(|&(id, co2, energy)| {
                (
                    id.to_string(),
                    NetworkEmissionFactor {
                        network_id: id.to_string(),
                        co2_per_tx_kg: co2,
                        energy_per_tx_kwh: energy,
                    },
                )
            })
            .collect();

        let transaction_types = BUILTIN_TRANSACTION_TYPES
            .iter()
            .map(|&(id, multiplier)| {
                (
                    id.to_string(),
                    TransactionTypeFactor {
                        type_id: id.to_string(),
                        multiplier,
                    },
                )
            })
            .collect();

        Self {
            networks,
            transaction_types,
        }
    }

    /// Parse a factor table from the JSON resource format
    pub fn from_json_str(json: &str) -> Result<Self, FactorError> {
        let file: FactorFile = serde_json::from_str(json)?;

        let mut networks = BTreeMap::new();
        for (name, entry) in file.networks {
            let key = normalize_key(&name);
            let factor = NetworkEmissionFactor {
                co2_per_tx_kg: check_factor(&key, "co2_per_transaction_kg", entry.co2_per_transaction_kg)?,
                energy_per_tx_kwh: check_factor(
                    &key,
                    "energy_per_transaction_kwh",
                    entry.energy_per_transaction_kwh,
                )?,
                network_id: key.clone(),
            };
            networks.insert(key, factor);
        }

        let mut transaction_types = BTreeMap::new();
        for (name, entry) in file.transaction_types {
            let key = normalize_key(&name);
            let factor = TransactionTypeFactor {
                multiplier: check_factor(&key, "multiplier", entry.multiplier)?,
                type_id: key.clone(),
            };
            transaction_types.insert(key, factor);
        }

        Ok(Self {
            networks,
            transaction_types,
        })
    }

    /// Load a factor table from a JSON file
    pub fn from_path(path: &Path) -> Result<Self, FactorError> {
        let content = std::fs::read_to_string(path).map_err(|source| FactorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Load from the first existing candidate path, falling back to the
    /// built-in table. Never fails.
    pub fn load_or_default(candidates: &[PathBuf]) -> Self {
        let Some(path) = candidates.iter().find(|p| p.exists()) else {
            info!(
                "No {} found (searched {} locations), using built-in emission factors",
                constants::FACTOR_DATA_FILENAME,
                candidates.len()
            );
            return Self::builtin();
        };

        match Self::from_path(path) {
            Ok(table) => {
                info!(
                    "Loaded {} network and {} transaction type factors from {}",
                    table.networks.len(),
                    table.transaction_types.len(),
                    path.display()
                );
                table
            }
            Err(e) => {
                warn!("Could not load carbon data: {}. Using defaults.", e);
                Self::builtin()
            }
        }
    }

    /// Default search locations for the factor data file, relative to the
    /// working directory
    pub fn default_candidates() -> Vec<PathBuf> {
        vec![
            Path::new(constants::FACTOR_DATA_DIR).join(constants::FACTOR_DATA_FILENAME),
            PathBuf::from(constants::FACTOR_DATA_FILENAME),
        ]
    }

    /// Look up the factor for a network (case-insensitive, spaces and
    /// hyphens treated as underscores)
    pub fn lookup_network(&self, name: &str) -> FactorLookup<NetworkEmissionFactor> {
        let key = normalize_key(name);
        match self.networks.get(&key) {
            Some(factor) => FactorLookup::Found(factor.clone()),
            None => {
                debug!(network = %name, "unknown network, using default factor");
                FactorLookup::Defaulted(NetworkEmissionFactor {
                    network_id: key,
                    co2_per_tx_kg: constants::DEFAULT_CO2_PER_TX_KG,
                    energy_per_tx_kwh: constants::DEFAULT_ENERGY_PER_TX_KWH,
                })
            }
        }
    }

    /// Look up the multiplier for a transaction type
    pub fn lookup_type(&self, name: &str) -> FactorLookup<TransactionTypeFactor> {
        let key = normalize_key(name);
        match self.transaction_types.get(&key) {
            Some(factor) => FactorLookup::Found(factor.clone()),
            None => {
                debug!(transaction_type = %name, "unknown transaction type, using default multiplier");
                FactorLookup::Defaulted(TransactionTypeFactor {
                    type_id: key,
                    multiplier: constants::DEFAULT_TYPE_MULTIPLIER,
                })
            }
        }
    }

    pub fn networks(&self) -> impl Iterator<Item = &NetworkEmissionFactor> {
        self.networks.values()
    }

    pub fn transaction_types(&self) -> impl Iterator<Item = &TransactionTypeFactor> {
        self.transaction_types.values()
    }
}
