//! Console dashboard and CSV export
//!
//! Rendered straight from the structured analysis; nothing here parses the
//! markdown report.

use anyhow::Result;
use carbon_engine::report::{group_thousands, title_case};
use carbon_engine::{Assessment, CarbonAnalysis, EmissionsResult, FactorTable, Footprint, Strategy};
use csv::Writer;
use std::path::Path;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Debug, Tabled)]
pub struct NetworkRow {
    #[tabled(rename = "Network")]
    pub network: String,
    #[tabled(rename = "Transactions")]
    pub transactions: String,
    #[tabled(rename = "CO2 (kg)")]
    pub co2_kg: String,
    #[tabled(rename = "Energy (kWh)")]
    pub energy_kwh: String,
    #[tabled(rename = "Share")]
    pub share: String,
    #[tabled(rename = "Factor")]
    pub factor: &'static str,
}

#[derive(Debug, Tabled)]
struct EquivalentRow {
    #[tabled(rename = "Equivalent")]
    label: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Debug, Tabled)]
pub struct StrategyRow {
    #[tabled(rename = "#")]
    pub rank: usize,
    #[tabled(rename = "Strategy")]
    pub name: String,
    #[tabled(rename = "Priority")]
    pub priority: String,
    #[tabled(rename = "Impact")]
    pub impact: String,
}

#[derive(Debug, Tabled)]
struct FactorRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "CO2/tx (kg)")]
    co2: String,
    #[tabled(rename = "Energy/tx (kWh)")]
    energy: String,
    #[tabled(rename = "Multiplier")]
    multiplier: String,
}

/// Per-network rows, highest emitter first
pub fn network_rows(emissions: &EmissionsResult) -> Vec<NetworkRow> {
    emissions
        .networks_by_co2()
        .into_iter()
        .map(|(network, data)| {
            let share = if emissions.total_co2_kg > 0.0 {
                data.co2_kg / emissions.total_co2_kg * 100.0
            } else {
                0.0
            };
            NetworkRow {
                network: title_case(network),
                transactions: group_thousands(data.transactions),
                co2_kg: format!("{:.4}", data.co2_kg),
                energy_kwh: format!("{:.4}", data.energy_kwh),
                share: format!("{:.1}%", share),
                factor: if data.default_factor { "default" } else { "table" },
            }
        })
        .collect()
}

fn strategy_impact(strategy: &Strategy) -> String {
    match (strategy.potential_reduction_kg, strategy.reduction_percent, strategy.cost_usd) {
        (Some(kg), Some(percent), _) => format!("-{:.4} kg CO2 ({}%)", kg, percent),
        (Some(kg), None, _) => format!("-{:.4} kg CO2", kg),
        (None, _, Some(cost)) => format!("${:.2}", cost),
        (None, _, None) => "-".to_string(),
    }
}

pub fn strategy_rows(strategies: &[Strategy]) -> Vec<StrategyRow> {
    strategies
        .iter()
        .enumerate()
        .map(|(idx, strategy)| StrategyRow {
            rank: idx + 1,
            name: strategy.name.clone(),
            priority: strategy.priority.to_string(),
            impact: strategy_impact(strategy),
        })
        .collect()
}

fn print_footprint(footprint: &Footprint) {
    let emissions = &footprint.emissions;

    println!("\n============================================================");
    println!("                 CARBON FOOTPRINT SUMMARY");
    println!("============================================================\n");

    println!("  Transactions:       {:>14}", group_thousands(footprint.transaction_count));
    println!("  CO2 Emissions:      {:>14.4} kg", emissions.total_co2_kg);
    println!("  Energy Consumed:    {:>14.4} kWh", emissions.total_energy_kwh);
    if emissions.type_multiplier != 1.0 {
        println!("  Type Multiplier:    {:>14.3}x", emissions.type_multiplier);
    }

    println!("\nEMISSIONS BY NETWORK:");
    println!("{}", Table::new(network_rows(emissions)).with(Style::rounded()));

    let eq = &footprint.equivalents;
    let equivalents = [
        EquivalentRow {
            label: "Trees needed for 1 year",
            value: format!("{:.2}", eq.trees_needed_year),
        },
        EquivalentRow {
            label: "Km driven (average car)",
            value: format!("{:.2}", eq.km_driven),
        },
        EquivalentRow {
            label: "Smartphone charges",
            value: format!("{:.0}", eq.smartphone_charges),
        },
        EquivalentRow {
            label: "LED bulb hours",
            value: format!("{:.0}", eq.led_bulb_hours),
        },
    ];
    println!("\nENVIRONMENTAL CONTEXT:");
    println!("{}", Table::new(equivalents).with(Style::rounded()));

    println!("\nREDUCTION STRATEGIES:");
    println!("{}", Table::new(strategy_rows(&footprint.strategies)).with(Style::rounded()));

    println!("\nASSESSMENT:");
    println!("  {}", Assessment::from_co2(emissions.total_co2_kg).message());
    println!("============================================================");
}

/// Print the console dashboard
pub fn print_dashboard(analysis: &CarbonAnalysis) {
    match analysis {
        CarbonAnalysis::NoActivity => {
            println!("No transaction history found for this wallet. Carbon footprint cannot be calculated.");
        }
        CarbonAnalysis::Estimated(footprint) => print_footprint(footprint),
    }
}

/// Print the loaded emission factor table
pub fn print_factor_table(table: &FactorTable) {
    let networks: Vec<_> = table
        .networks()
        .map(|f| FactorRow {
            key: f.network_id.clone(),
            co2: format!("{}", f.co2_per_tx_kg),
            energy: format!("{}", f.energy_per_tx_kwh),
            multiplier: String::new(),
        })
        .collect();
    let types: Vec<_> = table
        .transaction_types()
        .map(|f| FactorRow {
            key: f.type_id.clone(),
            co2: String::new(),
            energy: String::new(),
            multiplier: format!("{}x", f.multiplier),
        })
        .collect();

    println!("NETWORKS:");
    println!("{}", Table::new(networks).with(Style::rounded()));
    println!("\nTRANSACTION TYPES:");
    println!("{}", Table::new(types).with(Style::rounded()));
}

/// Write the per-network breakdown with a TOTAL row
pub fn write_network_csv(path: &Path, emissions: &EmissionsResult) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;

    // Header
    wtr.write_record(["Network", "Transactions", "CO2_kg", "Energy_kWh", "Default_Factor"])?;

    let mut total_transactions = 0u64;
    for (network, data) in emissions.networks_by_co2() {
        total_transactions = total_transactions.saturating_add(data.transactions);
        wtr.write_record([
            network,
            &data.transactions.to_string(),
            &format!("{:.6}", data.co2_kg),
            &format!("{:.6}", data.energy_kwh),
            if data.default_factor { "yes" } else { "no" },
        ])?;
    }

    wtr.write_record([
        "TOTAL",
        &total_transactions.to_string(),
        &format!("{:.6}", emissions.total_co2_kg),
        &format!("{:.6}", emissions.total_energy_kwh),
        "",
    ])?;

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use carbon_engine::{calculator, NetworkDistribution, TransactionTypeDistribution};

    fn footprint(entries: &[(&str, u64)]) -> Footprint {
        let dist: NetworkDistribution = entries.iter().map(|(n, c)| (n.to_string(), *c)).collect();
        let total = dist.values().sum();
        match calculator::compute(&FactorTable::builtin(), total, &dist, &TransactionTypeDistribution::new()) {
            Ok(CarbonAnalysis::Estimated(footprint)) => footprint,
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_network_rows_sorted_with_shares() {
        let fp = footprint(&[("ethereum", 100), ("polygon", 200), ("zora", 50)]);
        let rows = network_rows(&fp.emissions);
        assert_eq!(rows[0].network, "Polygon");
        assert_eq!(rows[0].share, "54.5%");
        assert_eq!(rows[1].network, "Ethereum");
        assert_eq!(rows[2].network, "Zora");
        assert_eq!(rows[2].factor, "default");
        assert_eq!(rows[0].factor, "table");
    }

    #[test]
    fn test_strategy_rows_impact() {
        let fp = footprint(&[("ethereum", 100_000)]);
        let rows = strategy_rows(&fp.strategies);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].priority, "HIGH");
        assert_eq!(rows[0].impact, "-5.0000 kg CO2 (50%)");
        assert_eq!(rows[2].impact, "$0.15");
    }

    #[test]
    fn test_write_network_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("networks.csv");
        let fp = footprint(&[("ethereum", 100), ("polygon", 200)]);
        write_network_csv(&path, &fp.emissions).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "Network,Transactions,CO2_kg,Energy_kWh,Default_Factor");
        assert_eq!(lines[1], "polygon,200,0.018000,0.036000,no");
        assert_eq!(lines[2], "ethereum,100,0.010000,0.020000,no");
        assert_eq!(lines[3], "TOTAL,300,0.028000,0.056000,");
    }
}
