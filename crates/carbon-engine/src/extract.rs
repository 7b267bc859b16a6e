//! Best-effort extraction of figures from a rendered report
//!
//! For consumers that only hold the markdown text. Matching is keyed on the
//! labels `report` writes; anything that does not match is left empty rather
//! than reported as an error. Prefer the structured `CarbonAnalysis` when it
//! is available.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Maximum number of strategies returned
const MAX_STRATEGIES: usize = 5;

static TOTAL_CO2: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Total CO2 Emissions[*:\s]+([0-9][0-9.,]*)\s*kg").expect("valid regex")
});

static TOTAL_ENERGY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Total Energy Consumed[*:\s]+([0-9][0-9.,]*)\s*kWh").expect("valid regex")
});

static TOTAL_TRANSACTIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Total Transactions(?:\s+Analyzed)?[*:\s]+([0-9][0-9,]*)").expect("valid regex")
});

static NETWORK_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)Emissions by Network(.*?)(?:\n##|\z)").expect("valid regex"));

static NETWORK_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^\s*-\s*([^:\n]+?):\s*([0-9][0-9,]*)\s*txs[^\n]*?([0-9][0-9.,]*)\s*kg\s*CO2(?:,\s*([0-9][0-9.,]*)\s*kWh)?",
    )
    .expect("valid regex")
});

static TREES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\*\*([0-9][0-9.,]*)\*\*\s*trees needed").expect("valid regex")
});

static KM_DRIVEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\*\*([0-9][0-9.,]*)\*\*\s*km driven").expect("valid regex"));

static SMARTPHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\*\*([0-9][0-9.,]*)\*\*\s*smartphone charges").expect("valid regex")
});

static LED_BULB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\*\*([0-9][0-9.,]*)\*\*\s*hours of LED bulb").expect("valid regex")
});

static STRATEGY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*\d+\.\s*\*\*(.+?)\*\*\s*\(Priority:\s*(\w+)\)[ \t]*(?:\r?\n[ \t]*-[ \t]*([^\r\n]+))?")
        .expect("valid regex")
});

/// Per-network figures recovered from the report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedNetwork {
    pub network: String,
    pub transactions: u64,
    pub co2_kg: f64,
    pub energy_kwh: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedEquivalents {
    pub trees_needed_year: Option<f64>,
    pub km_driven: Option<f64>,
    pub smartphone_charges: Option<f64>,
    pub led_bulb_hours: Option<f64>,
}

impl ExtractedEquivalents {
    pub fn is_empty(&self) -> bool {
        self.trees_needed_year.is_none()
            && self.km_driven.is_none()
            && self.smartphone_charges.is_none()
            && self.led_bulb_hours.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedStrategy {
    pub name: String,
    /// Lower-cased priority label as written in the report
    pub priority: String,
    pub description: Option<String>,
}

/// Everything that could be recovered from a report. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedReport {
    pub total_co2_kg: Option<f64>,
    pub total_energy_kwh: Option<f64>,
    pub total_transactions: Option<u64>,
    pub avg_co2_per_tx: Option<f64>,
    pub networks: Vec<ExtractedNetwork>,
    pub equivalents: ExtractedEquivalents,
    pub strategies: Vec<ExtractedStrategy>,
}

impl ExtractedReport {
    pub fn is_empty(&self) -> bool {
        self.total_co2_kg.is_none()
            && self.total_energy_kwh.is_none()
            && self.total_transactions.is_none()
            && self.networks.is_empty()
            && self.equivalents.is_empty()
            && self.strategies.is_empty()
    }
}

fn parse_f64(raw: &str) -> Option<f64> {
    raw.replace(',', "").trim_end_matches('.').parse().ok()
}

fn parse_u64(raw: &str) -> Option<u64> {
    raw.replace(',', "").parse().ok()
}

fn capture_f64(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text).and_then(|c| parse_f64(&c[1]))
}

fn extract_networks(text: &str) -> Vec<ExtractedNetwork> {
    let Some(section) = NETWORK_SECTION.captures(text) else {
        return Vec::new();
    };
    let Some(body) = section.get(1) else {
        return Vec::new();
    };

    NETWORK_LINE
        .captures_iter(body.as_str())
        .filter_map(|c| {
            Some(ExtractedNetwork {
                network: c[1].trim().to_string(),
                transactions: parse_u64(&c[2])?,
                co2_kg: parse_f64(&c[3])?,
                energy_kwh: c.get(4).and_then(|m| parse_f64(m.as_str())),
            })
        })
        .collect()
}

fn extract_strategies(text: &str) -> Vec<ExtractedStrategy> {
    STRATEGY
        .captures_iter(text)
        .map(|c| ExtractedStrategy {
            name: c[1].trim().to_string(),
            priority: c[2].to_lowercase(),
            description: c.get(3).map(|m| m.as_str().trim().to_string()),
        })
        .take(MAX_STRATEGIES)
        .collect()
}

/// Recover structured figures from report text
pub fn extract(text: &str) -> ExtractedReport {
    let total_co2_kg = capture_f64(&TOTAL_CO2, text);
    let total_transactions = TOTAL_TRANSACTIONS
        .captures(text)
        .and_then(|c| parse_u64(&c[1]));

    let avg_co2_per_tx = match (total_co2_kg, total_transactions) {
        (Some(co2), Some(txs)) if co2 > 0.0 && txs > 0 => Some(co2 / txs as f64),
        _ => None,
    };

    ExtractedReport {
        total_co2_kg,
        total_energy_kwh: capture_f64(&TOTAL_ENERGY, text),
        total_transactions,
        avg_co2_per_tx,
        networks: extract_networks(text),
        equivalents: ExtractedEquivalents {
            trees_needed_year: capture_f64(&TREES, text),
            km_driven: capture_f64(&KM_DRIVEN, text),
            smartphone_charges: capture_f64(&SMARTPHONE, text),
            led_bulb_hours: capture_f64(&LED_BULB, text),
        },
        strategies: extract_strategies(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::{self, CarbonAnalysis, NetworkDistribution, TransactionTypeDistribution};
    use crate::factors::FactorTable;
    use crate::report;

    /// Half a unit in the fourth decimal place
    const REPORT_PRECISION: f64 = 5e-5;

    #[test]
    fn test_round_trip_matches_computed_values() {
        let dist: NetworkDistribution = [("ethereum".to_string(), 100), ("polygon".to_string(), 200)]
            .into_iter()
            .collect();
        let result = calculator::compute(&FactorTable::builtin(), 300, &dist, &TransactionTypeDistribution::new());
        let Ok(CarbonAnalysis::Estimated(footprint)) = &result else {
            panic!("expected an estimate");
        };

        let extracted = extract(&report::render(&result));

        let emissions = &footprint.emissions;
        assert!((extracted.total_co2_kg.unwrap() - emissions.total_co2_kg).abs() < REPORT_PRECISION);
        assert!((extracted.total_energy_kwh.unwrap() - emissions.total_energy_kwh).abs() < REPORT_PRECISION);
        assert_eq!(extracted.total_transactions, Some(300));

        assert_eq!(extracted.networks.len(), 2);
        for network in &extracted.networks {
            let original = &emissions.per_network[&network.network.to_lowercase()];
            assert_eq!(network.transactions, original.transactions);
            assert!((network.co2_kg - original.co2_kg).abs() < REPORT_PRECISION);
            assert!((network.energy_kwh.unwrap() - original.energy_kwh).abs() < REPORT_PRECISION);
        }
    }

    #[test]
    fn test_extracts_equivalents_and_strategies() {
        let dist: NetworkDistribution = [("bsc".to_string(), 20_000)].into_iter().collect();
        let result = calculator::compute(
            &FactorTable::builtin(),
            20_000,
            &dist,
            &TransactionTypeDistribution::new(),
        );
        let extracted = extract(&report::render(&result));

        // 20,000 * 0.00012 = 2.4 kg, 4.8 kWh
        assert_eq!(extracted.total_transactions, Some(20_000));
        assert_eq!(extracted.equivalents.trees_needed_year, Some(0.11));
        assert_eq!(extracted.equivalents.km_driven, Some(20.0));
        assert_eq!(extracted.equivalents.smartphone_charges, Some(320.0));
        assert_eq!(extracted.equivalents.led_bulb_hours, Some(480.0));
        assert!((extracted.avg_co2_per_tx.unwrap() - 0.00012).abs() < 1e-9);

        assert_eq!(extracted.networks[0].network, "Bsc");
        assert_eq!(extracted.networks[0].transactions, 20_000);

        let names: Vec<_> = extracted.strategies.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Migrate to Layer 2 Networks",
                "Batch Multiple Transactions",
                "Purchase Carbon Offsets",
                "Optimize Gas Usage",
            ]
        );
        assert_eq!(extracted.strategies[0].priority, "high");
        assert_eq!(
            extracted.strategies[2].description.as_deref(),
            Some("Offset emissions through verified carbon credit programs")
        );
    }

    #[test]
    fn test_no_activity_report_extracts_nothing() {
        let extracted = extract(&report::format_no_activity());
        assert!(extracted.is_empty());
        assert_eq!(extracted.avg_co2_per_tx, None);
    }

    #[test]
    fn test_unrelated_text_is_empty_not_error() {
        assert!(extract("").is_empty());
        assert!(extract("Error calculating carbon footprint: boom").is_empty());
    }

    #[test]
    fn test_partial_report_keeps_matching_fields() {
        let text = "Total CO2 Emissions: 1.2500 kg\nsomething else entirely";
        let extracted = extract(text);
        assert_eq!(extracted.total_co2_kg, Some(1.25));
        assert_eq!(extracted.total_energy_kwh, None);
        assert_eq!(extracted.total_transactions, None);
        assert_eq!(extracted.avg_co2_per_tx, None);
        assert!(extracted.networks.is_empty());
    }

    #[test]
    fn test_network_lines_stop_at_next_section() {
        let text = "## Emissions by Network\n  - Optimism: 1,200 txs → 0.0600 kg CO2, 0.1200 kWh\n\n## Other\n  - Fake: 5 txs → 9.0000 kg CO2\n";
        let extracted = extract(text);
        assert_eq!(
            extracted.networks,
            vec![ExtractedNetwork {
                network: "Optimism".to_string(),
                transactions: 1200,
                co2_kg: 0.06,
                energy_kwh: Some(0.12),
            }]
        );
    }

    #[test]
    fn test_strategies_capped_at_five() {
        let text: String = (1..=7)
            .map(|i| format!("{i}. **Step {i}** (Priority: LOW)\n   - do thing {i}\n"))
            .collect();
        let extracted = extract(&text);
        assert_eq!(extracted.strategies.len(), 5);
        assert_eq!(extracted.strategies[4].name, "Step 5");
        assert_eq!(extracted.strategies[4].description.as_deref(), Some("do thing 5"));
    }
}
