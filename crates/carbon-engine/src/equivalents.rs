//! Everyday equivalents for an emissions total

use serde::Serialize;

use crate::constants;

/// Emissions expressed in relatable units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EquivalenceSet {
    /// Trees needed for one year to absorb the CO2
    pub trees_needed_year: f64,
    /// Kilometres driven in an average car
    pub km_driven: f64,
    /// Full smartphone charges
    pub smartphone_charges: f64,
    /// Hours of a 10W LED bulb
    pub led_bulb_hours: f64,
}

/// Translate CO2 (kg) and energy (kWh) into everyday equivalents
pub fn translate(co2_kg: f64, energy_kwh: f64) -> EquivalenceSet {
    EquivalenceSet {
        trees_needed_year: co2_kg / constants::TREE_KG_CO2_PER_YEAR,
        km_driven: co2_kg / constants::CAR_KG_CO2_PER_KM,
        smartphone_charges: energy_kwh / constants::SMARTPHONE_CHARGE_KWH,
        led_bulb_hours: energy_kwh / constants::LED_BULB_KWH_PER_HOUR,
    }
}
