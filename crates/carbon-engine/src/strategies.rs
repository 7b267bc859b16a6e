//! Carbon reduction strategies
//!
//! Strategies come from an ordered list of independent rules. Each rule has a
//! predicate over the wallet's network mix and total emissions, and a builder
//! for the strategy it recommends. List order is display order.

use serde::Serialize;
use std::fmt;

use crate::calculator::NetworkDistribution;
use crate::constants;

/// Recommendation priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    /// Upper-case label used in reports ("HIGH")
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// A recommended action with its estimated impact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Strategy {
    pub name: String,
    pub description: String,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub potential_reduction_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduction_percent: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
}

impl Strategy {
    fn reduction(name: &str, description: &str, priority: Priority, total_co2_kg: f64, percent: u8) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            priority,
            potential_reduction_kg: Some(total_co2_kg * (f64::from(percent) / 100.0)),
            reduction_percent: Some(percent),
            cost_usd: None,
        }
    }
}

/// Inputs visible to every rule
#[derive(Debug, Clone, Copy)]
pub struct StrategyContext<'a> {
    pub network_distribution: &'a NetworkDistribution,
    pub total_co2_kg: f64,
}

/// A predicate paired with the strategy it produces
pub struct Rule {
    pub name: &'static str,
    pub applies: fn(&StrategyContext) -> bool,
    pub build: fn(&StrategyContext) -> Strategy,
}

impl Rule {
    /// Evaluate the rule, returning its strategy if the predicate holds
    pub fn evaluate(&self, ctx: &StrategyContext) -> Option<Strategy> {
        (self.applies)(ctx).then(|| (self.build)(ctx))
    }
}

/// Rules in evaluation (and display) order
pub const RULES: [Rule; 4] = [
    Rule {
        name: "Migrate to Layer 2 Networks",
        applies: uses_high_emission_network,
        build: layer2_migration,
    },
    Rule {
        name: "Batch Multiple Transactions",
        applies: has_any_network,
        build: batch_transactions,
    },
    Rule {
        name: "Purchase Carbon Offsets",
        applies: always,
        build: carbon_offsets,
    },
    Rule {
        name: "Optimize Gas Usage",
        applies: always,
        build: gas_optimization,
    },
];

fn uses_high_emission_network(ctx: &StrategyContext) -> bool {
    ctx.network_distribution
        .keys()
        .any(|network| constants::HIGH_EMISSION_NETWORKS.contains(&network.to_lowercase().as_str()))
}

fn has_any_network(ctx: &StrategyContext) -> bool {
    !ctx.network_distribution.is_empty()
}

fn always(_: &StrategyContext) -> bool {
    true
}

fn layer2_migration(ctx: &StrategyContext) -> Strategy {
    Strategy::reduction(
        "Migrate to Layer 2 Networks",
        "Use L2 networks like Optimism, Arbitrum, or Base for transactions",
        Priority::High,
        ctx.total_co2_kg,
        constants::L2_REDUCTION_PERCENT,
    )
}

fn batch_transactions(ctx: &StrategyContext) -> Strategy {
    Strategy::reduction(
        "Batch Multiple Transactions",
        "Combine multiple operations into single transactions when possible",
        Priority::Medium,
        ctx.total_co2_kg,
        constants::BATCH_REDUCTION_PERCENT,
    )
}

fn carbon_offsets(ctx: &StrategyContext) -> Strategy {
    Strategy {
        name: "Purchase Carbon Offsets".to_string(),
        description: "Offset emissions through verified carbon credit programs".to_string(),
        priority: Priority::Medium,
        potential_reduction_kg: None,
        reduction_percent: None,
        cost_usd: Some((ctx.total_co2_kg / constants::KG_PER_TON) * constants::OFFSET_USD_PER_TON),
    }
}

fn gas_optimization(ctx: &StrategyContext) -> Strategy {
    Strategy::reduction(
        "Optimize Gas Usage",
        "Use gas-efficient contracts and optimal transaction timing",
        Priority::Low,
        ctx.total_co2_kg,
        constants::GAS_REDUCTION_PERCENT,
    )
}

/// Generate reduction strategies for a wallet's network mix
pub fn generate(network_distribution: &NetworkDistribution, total_co2_kg: f64) -> Vec<Strategy> {
    let ctx = StrategyContext {
        network_distribution,
        total_co2_kg,
    };
    RULES.iter().filter_map(|rule| rule.evaluate(&ctx)).collect()
}
