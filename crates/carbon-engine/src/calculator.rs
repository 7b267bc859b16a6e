//! Emissions calculator
//!
//! Turns per-network transaction counts (and an optional transaction type
//! mix) into CO2 and energy totals. The calculation is pure: the same factor
//! table and inputs always produce the same result.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::equivalents::{self, EquivalenceSet};
use crate::error::EstimateError;
use crate::factors::FactorTable;
use crate::strategies::{self, Strategy};

/// Network name -> transaction count
pub type NetworkDistribution = BTreeMap<String, u64>;

/// Transaction type name -> transaction count
pub type TransactionTypeDistribution = BTreeMap<String, u64>;

/// Emissions attributed to one network
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkEmissions {
    pub transactions: u64,
    pub co2_kg: f64,
    pub energy_kwh: f64,
    /// True when the network was missing from the factor table
    pub default_factor: bool,
}

/// Aggregate emissions for a wallet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionsResult {
    pub total_co2_kg: f64,
    pub total_energy_kwh: f64,
    /// Weighted transaction type multiplier applied to every network
    pub type_multiplier: f64,
    pub per_network: BTreeMap<String, NetworkEmissions>,
}

impl EmissionsResult {
    /// Networks sorted by descending CO2 (ties keep name order)
    pub fn networks_by_co2(&self) -> Vec<(&str, &NetworkEmissions)> {
        let mut networks: Vec<_> = self
            .per_network
            .iter()
            .map(|(name, emissions)| (name.as_str(), emissions))
            .collect();
        networks.sort_by(|a, b| b.1.co2_kg.total_cmp(&a.1.co2_kg));
        networks
    }
}

/// Full estimate for a wallet with activity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Footprint {
    pub transaction_count: u64,
    pub emissions: EmissionsResult,
    pub equivalents: EquivalenceSet,
    pub strategies: Vec<Strategy>,
}

/// Result of analysing a wallet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CarbonAnalysis {
    /// No transactions were supplied
    NoActivity,
    Estimated(Footprint),
}

impl CarbonAnalysis {
    pub fn footprint(&self) -> Option<&Footprint> {
        match self {
            CarbonAnalysis::NoActivity => None,
            CarbonAnalysis::Estimated(footprint) => Some(footprint),
        }
    }
}

/// Weighted-average multiplier over the whole transaction type mix.
///
/// `Σ(count × multiplier) / Σ(count)`, or 1.0 when the mix is empty or all
/// counts are zero.
pub fn type_multiplier(table: &FactorTable, transaction_types: &TransactionTypeDistribution) -> f64 {
    let total: f64 = transaction_types.values().map(|&count| count as f64).sum();
    if total == 0.0 {
        return 1.0;
    }

    let weighted: f64 = transaction_types
        .iter()
        .map(|(tx_type, &count)| count as f64 * table.lookup_type(tx_type).factor().multiplier)
        .sum();

    weighted / total
}

/// Compute per-network and total emissions
pub fn compute_emissions(
    table: &FactorTable,
    network_distribution: &NetworkDistribution,
    transaction_types: &TransactionTypeDistribution,
) -> Result<EmissionsResult, EstimateError> {
    let multiplier = type_multiplier(table, transaction_types);
    if !multiplier.is_finite() {
        return Err(EstimateError::NonFiniteMultiplier);
    }

    // Type mix is not validated against network totals; mismatches are accepted
    let network_total: u64 = network_distribution.values().fold(0, |acc, &c| acc.saturating_add(c));
    let type_total: u64 = transaction_types.values().fold(0, |acc, &c| acc.saturating_add(c));
    if !transaction_types.is_empty() && type_total != network_total {
        debug!(network_total, type_total, "transaction type counts do not match network counts");
    }

    let mut total_co2_kg = 0.0;
    let mut total_energy_kwh = 0.0;
    let mut per_network = BTreeMap::new();

    for (network, &count) in network_distribution {
        let lookup = table.lookup_network(network);
        let default_factor = lookup.is_defaulted();
        let factor = lookup.into_factor();

        let co2_kg = count as f64 * factor.co2_per_tx_kg * multiplier;
        let energy_kwh = count as f64 * factor.energy_per_tx_kwh * multiplier;

        if !co2_kg.is_finite() {
            return Err(EstimateError::NonFinite {
                network: network.clone(),
                quantity: "CO2",
            });
        }
        if !energy_kwh.is_finite() {
            return Err(EstimateError::NonFinite {
                network: network.clone(),
                quantity: "energy",
            });
        }

        total_co2_kg += co2_kg;
        total_energy_kwh += energy_kwh;

        per_network.insert(
            network.clone(),
            NetworkEmissions {
                transactions: count,
                co2_kg,
                energy_kwh,
                default_factor,
            },
        );
    }

    Ok(EmissionsResult {
        total_co2_kg,
        total_energy_kwh,
        type_multiplier: multiplier,
        per_network,
    })
}

/// Estimate a wallet's carbon footprint.
///
/// `tx_count` only decides the no-activity short-circuit; totals come from
/// the network distribution.
pub fn compute(
    table: &FactorTable,
    tx_count: u64,
    network_distribution: &NetworkDistribution,
    transaction_types: &TransactionTypeDistribution,
) -> Result<CarbonAnalysis, EstimateError> {
    if tx_count == 0 {
        return Ok(CarbonAnalysis::NoActivity);
    }

    let emissions = compute_emissions(table, network_distribution, transaction_types)?;
    let equivalents = equivalents::translate(emissions.total_co2_kg, emissions.total_energy_kwh);
    let strategies = strategies::generate(network_distribution, emissions.total_co2_kg);

    Ok(CarbonAnalysis::Estimated(Footprint {
        transaction_count: tx_count,
        emissions,
        equivalents,
        strategies,
    }))
}
