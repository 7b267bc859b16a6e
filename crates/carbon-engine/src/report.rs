//! Markdown report rendering
//!
//! The report is an export artifact. Its headings and the
//! `- Network: N txs → C kg CO2` line shape are also what `extract` reads
//! back, so wording changes here must be mirrored there.

use serde::Serialize;

use crate::calculator::{CarbonAnalysis, EmissionsResult, Footprint};
use crate::constants;
use crate::equivalents::EquivalenceSet;
use crate::error::EstimateError;
use crate::strategies::Strategy;

pub const TITLE: &str = "# Carbon Footprint Analysis";
pub const SUMMARY_HEADING: &str = "## Summary";
pub const CONTEXT_HEADING: &str = "## Environmental Context";
pub const NETWORKS_HEADING: &str = "## Emissions by Network";
pub const STRATEGIES_HEADING: &str = "## Carbon Reduction Strategies";
pub const ASSESSMENT_HEADING: &str = "## Overall Assessment";

const FOOTNOTE: &str =
    "*Data based on post-merge Ethereum (Proof of Stake) and current network emission factors.*";

/// Overall footprint rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Assessment {
    Low,
    Moderate,
    Significant,
}

impl Assessment {
    /// Rate a CO2 total. Both thresholds are exclusive upper bounds.
    pub fn from_co2(co2_kg: f64) -> Self {
        if co2_kg < constants::LOW_FOOTPRINT_KG {
            Assessment::Low
        } else if co2_kg < constants::MODERATE_FOOTPRINT_KG {
            Assessment::Moderate
        } else {
            Assessment::Significant
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Assessment::Low => "Your carbon footprint is relatively low due to minimal transaction activity.",
            Assessment::Moderate => {
                "Your carbon footprint is moderate. Consider implementing L2 migration strategies."
            }
            Assessment::Significant => {
                "Your carbon footprint is significant. Implementing reduction strategies could substantially lower your environmental impact."
            }
        }
    }
}

/// Format an integer with comma thousands separators (1234567 -> "1,234,567")
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Capitalize the first letter of each word and lowercase the rest.
/// Any non-letter starts a new word ("arbitrum-one" -> "Arbitrum-One").
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;
    for ch in name.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

fn network_lines(emissions: &EmissionsResult) -> Vec<String> {
    emissions
        .networks_by_co2()
        .into_iter()
        .map(|(network, data)| {
            format!(
                "  - {}: {} txs → {:.4} kg CO2, {:.4} kWh",
                title_case(network),
                group_thousands(data.transactions),
                data.co2_kg,
                data.energy_kwh
            )
        })
        .collect()
}

fn strategy_lines(strategies: &[Strategy]) -> Vec<String> {
    let mut lines = Vec::new();
    for (idx, strategy) in strategies.iter().enumerate() {
        lines.push(String::new());
        lines.push(format!("{}. **{}** (Priority: {})", idx + 1, strategy.name, strategy.priority));
        lines.push(format!("   - {}", strategy.description));
        if let Some(reduction) = strategy.potential_reduction_kg {
            let percent = strategy.reduction_percent.map(|p| format!(" ({}%)", p)).unwrap_or_default();
            lines.push(format!("   - Potential Reduction: {:.4} kg CO2{}", reduction, percent));
        }
        if let Some(cost) = strategy.cost_usd {
            lines.push(format!("   - Estimated Cost: ${:.2}", cost));
        }
    }
    lines
}

/// Render the full carbon footprint report
pub fn format_report(
    tx_count: u64,
    emissions: &EmissionsResult,
    equivalents: &EquivalenceSet,
    strategies: &[Strategy],
) -> String {
    let co2_kg = emissions.total_co2_kg;
    let mut lines = vec![
        TITLE.to_string(),
        String::new(),
        SUMMARY_HEADING.to_string(),
        format!("- **Total Transactions Analyzed**: {}", group_thousands(tx_count)),
        format!(
            "- **Total CO2 Emissions**: {:.4} kg ({:.6} metric tons)",
            co2_kg,
            co2_kg / constants::KG_PER_TON
        ),
        format!("- **Total Energy Consumed**: {:.4} kWh", emissions.total_energy_kwh),
        String::new(),
        CONTEXT_HEADING.to_string(),
        "Your blockchain activity is equivalent to:".to_string(),
        format!(
            "- 🌳 **{:.2}** trees needed for 1 year to offset",
            equivalents.trees_needed_year
        ),
        format!("- 🚗 **{:.2}** km driven in an average car", equivalents.km_driven),
        format!("- 📱 **{:.0}** smartphone charges", equivalents.smartphone_charges),
        format!("- 💡 **{:.0}** hours of LED bulb usage", equivalents.led_bulb_hours),
        String::new(),
        NETWORKS_HEADING.to_string(),
    ];

    lines.extend(network_lines(emissions));
    lines.push(String::new());
    lines.push(STRATEGIES_HEADING.to_string());
    lines.extend(strategy_lines(strategies));
    lines.push(String::new());
    lines.push(ASSESSMENT_HEADING.to_string());
    lines.push(Assessment::from_co2(co2_kg).message().to_string());
    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(FOOTNOTE.to_string());

    lines.join("\n")
}

/// Render the report for a computed footprint
pub fn format_footprint(footprint: &Footprint) -> String {
    format_report(
        footprint.transaction_count,
        &footprint.emissions,
        &footprint.equivalents,
        &footprint.strategies,
    )
}

/// Render the report for a wallet with no transactions
pub fn format_no_activity() -> String {
    [
        TITLE,
        "",
        SUMMARY_HEADING,
        "No transaction history found for this wallet. Carbon footprint cannot be calculated.",
        "",
        "## Note",
        "This wallet may be:",
        "- A new wallet with no activity",
        "- A holding wallet with minimal transactions",
        "- Using networks not currently tracked",
        "",
        "Environmental impact is minimal to zero based on available data.",
    ]
    .join("\n")
}

pub fn format_error(error: &EstimateError) -> String {
    format!("Error calculating carbon footprint: {}", error)
}

/// Render any analysis outcome, including failures, as displayable text
pub fn render(result: &Result<CarbonAnalysis, EstimateError>) -> String {
    match result {
        Ok(CarbonAnalysis::NoActivity) => format_no_activity(),
        Ok(CarbonAnalysis::Estimated(footprint)) => format_footprint(footprint),
        Err(e) => format_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::{self, NetworkDistribution, TransactionTypeDistribution};
    use crate::factors::FactorTable;

    fn sample_report() -> String {
        let dist: NetworkDistribution = [("ethereum".to_string(), 100), ("polygon".to_string(), 200)]
            .into_iter()
            .collect();
        let result = calculator::compute(&FactorTable::builtin(), 300, &dist, &TransactionTypeDistribution::new());
        render(&result)
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("ethereum"), "Ethereum");
        assert_eq!(title_case("BSC"), "Bsc");
        assert_eq!(title_case("arbitrum-one"), "Arbitrum-One");
        assert_eq!(title_case("polygon zkevm"), "Polygon Zkevm");
    }

    #[test]
    fn test_assessment_thresholds() {
        assert_eq!(Assessment::from_co2(0.0), Assessment::Low);
        assert_eq!(Assessment::from_co2(0.0999), Assessment::Low);
        assert_eq!(Assessment::from_co2(0.1), Assessment::Moderate);
        assert_eq!(Assessment::from_co2(0.9999), Assessment::Moderate);
        assert_eq!(Assessment::from_co2(1.0), Assessment::Significant);
        assert_eq!(Assessment::from_co2(250.0), Assessment::Significant);
    }

    #[test]
    fn test_report_sections_in_order() {
        let report = sample_report();
        let positions: Vec<usize> = [
            TITLE,
            SUMMARY_HEADING,
            CONTEXT_HEADING,
            NETWORKS_HEADING,
            STRATEGIES_HEADING,
            ASSESSMENT_HEADING,
        ]
        .iter()
        .map(|heading| report.find(heading).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(report.ends_with(FOOTNOTE));
    }

    #[test]
    fn test_report_summary_values() {
        let report = sample_report();
        assert!(report.contains("- **Total Transactions Analyzed**: 300"));
        assert!(report.contains("- **Total CO2 Emissions**: 0.0280 kg (0.000028 metric tons)"));
        assert!(report.contains("- **Total Energy Consumed**: 0.0560 kWh"));
        assert!(report.contains("- 🚗 **0.23** km driven in an average car"));
        assert!(report.contains("- 💡 **6** hours of LED bulb usage"));
    }

    #[test]
    fn test_networks_sorted_by_descending_co2() {
        let report = sample_report();
        let polygon = report.find("  - Polygon: 200 txs → 0.0180 kg CO2, 0.0360 kWh").unwrap();
        let ethereum = report.find("  - Ethereum: 100 txs → 0.0100 kg CO2, 0.0200 kWh").unwrap();
        assert!(polygon < ethereum);
    }

    #[test]
    fn test_strategies_numbered_in_generation_order() {
        let report = sample_report();
        assert!(report.contains("1. **Migrate to Layer 2 Networks** (Priority: HIGH)"));
        assert!(report.contains("2. **Batch Multiple Transactions** (Priority: MEDIUM)"));
        assert!(report.contains("3. **Purchase Carbon Offsets** (Priority: MEDIUM)"));
        assert!(report.contains("4. **Optimize Gas Usage** (Priority: LOW)"));
        assert!(report.contains("   - Potential Reduction: 0.0140 kg CO2 (50%)"));
        assert!(report.contains("   - Estimated Cost: $0.00"));
    }

    #[test]
    fn test_low_footprint_assessment_message() {
        let report = sample_report();
        assert!(report.contains(Assessment::Low.message()));
    }

    #[test]
    fn test_thousands_separator_in_report() {
        let dist: NetworkDistribution = [("base".to_string(), 1_500_000)].into_iter().collect();
        let result = calculator::compute(
            &FactorTable::builtin(),
            1_500_000,
            &dist,
            &TransactionTypeDistribution::new(),
        );
        let report = render(&result);
        assert!(report.contains("- **Total Transactions Analyzed**: 1,500,000"));
        assert!(report.contains("  - Base: 1,500,000 txs → 75.0000 kg CO2"));
        assert!(report.contains(Assessment::Significant.message()));
    }

    #[test]
    fn test_no_activity_report() {
        let report = render(&Ok(CarbonAnalysis::NoActivity));
        assert!(report.starts_with(TITLE));
        assert!(report.contains("No transaction history found for this wallet."));
        assert!(!report.contains(NETWORKS_HEADING));
    }

    #[test]
    fn test_error_report() {
        let text = render(&Err(EstimateError::NonFiniteMultiplier));
        assert_eq!(
            text,
            "Error calculating carbon footprint: transaction type multiplier is not a finite number"
        );
    }
}
