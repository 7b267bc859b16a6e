//! Centralized constants for the carbon footprint estimator
//!
//! Emission factors for individual networks live in the factor table
//! (see `factors`); this module holds the fixed coefficients that apply
//! regardless of which table is loaded.

// =============================================================================
// Default Factors
// =============================================================================

/// CO2 per transaction used when a network is missing from the factor table (kg)
pub const DEFAULT_CO2_PER_TX_KG: f64 = 0.0001;

/// Energy per transaction used when a network is missing from the factor table (kWh)
pub const DEFAULT_ENERGY_PER_TX_KWH: f64 = 0.0002;

/// Multiplier used when a transaction type is missing from the factor table
pub const DEFAULT_TYPE_MULTIPLIER: f64 = 1.0;

// =============================================================================
// Equivalence Divisors
// =============================================================================

/// CO2 absorbed by an average tree in one year (kg)
pub const TREE_KG_CO2_PER_YEAR: f64 = 21.77;

/// CO2 emitted by an average car per kilometre (kg)
pub const CAR_KG_CO2_PER_KM: f64 = 0.12;

/// Energy for one full smartphone charge (kWh)
pub const SMARTPHONE_CHARGE_KWH: f64 = 0.015;

/// Energy drawn by a 10W LED bulb in one hour (kWh)
pub const LED_BULB_KWH_PER_HOUR: f64 = 0.01;

// =============================================================================
// Reduction Strategies
// =============================================================================

/// Networks that trigger the layer 2 migration recommendation
pub const HIGH_EMISSION_NETWORKS: [&str; 3] = ["ethereum", "bsc", "avalanche"];

/// Share of emissions avoided by moving activity to a layer 2
pub const L2_REDUCTION_PERCENT: u8 = 50;

/// Share of emissions avoided by batching transactions
pub const BATCH_REDUCTION_PERCENT: u8 = 30;

/// Share of emissions avoided by gas optimization
pub const GAS_REDUCTION_PERCENT: u8 = 20;

/// Carbon offset price (USD per metric ton CO2)
pub const OFFSET_USD_PER_TON: f64 = 15.0;

/// Kilograms per metric ton
pub const KG_PER_TON: f64 = 1000.0;

// =============================================================================
// Assessment Thresholds
// =============================================================================

/// Footprints below this are assessed as low (kg CO2, exclusive)
pub const LOW_FOOTPRINT_KG: f64 = 0.1;

/// Footprints below this are assessed as moderate (kg CO2, exclusive)
pub const MODERATE_FOOTPRINT_KG: f64 = 1.0;

// =============================================================================
// File Names
// =============================================================================

/// Emission factor data filename
pub const FACTOR_DATA_FILENAME: &str = "carbon_data.json";

/// Directory searched for the factor data file
pub const FACTOR_DATA_DIR: &str = "data";
