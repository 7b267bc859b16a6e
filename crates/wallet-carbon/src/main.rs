//! Wallet Carbon Footprint
//!
//! Estimates the carbon footprint of a blockchain wallet from its per-network
//! transaction counts and renders a report, dashboard, JSON or CSV.

mod config;
mod constants;
mod dashboard;
mod history;

use anyhow::{Context, Result};
use carbon_engine::{calculator, extract, report, CarbonAnalysis, EstimateError};
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{Config, FileConfig};
use history::HistoryClient;

#[derive(Parser, Debug)]
#[command(name = "wallet-carbon")]
#[command(about = "Carbon footprint reports for blockchain wallets")]
struct Args {
    /// Config file (optional; defaults apply when missing)
    #[arg(short, long, default_value = constants::CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Emission factor data (carbon_data.json)
    #[arg(long, global = true)]
    factors: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Estimate emissions from transaction counts
    Estimate {
        /// Transactions on a network, as NAME=COUNT (repeatable)
        #[arg(long = "network", value_name = "NAME=COUNT", value_parser = parse_count_pair, required = true)]
        networks: Vec<(String, u64)>,

        /// Transactions of a type, as NAME=COUNT (repeatable)
        #[arg(long = "type", value_name = "NAME=COUNT", value_parser = parse_count_pair)]
        types: Vec<(String, u64)>,

        /// Total transaction count (default: sum of network counts)
        #[arg(long)]
        tx_count: Option<u64>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Fetch a wallet's history and estimate its footprint
    Wallet {
        /// Wallet address
        address: String,

        /// Chain to query (repeatable; default from config)
        #[arg(long)]
        chain: Vec<String>,

        /// Transactions to fetch per chain (default from config)
        #[arg(long)]
        limit: Option<u32>,

        /// Read a saved Moralis history response instead of calling the API
        #[arg(long)]
        from_file: Option<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Recover figures from a saved markdown report
    Extract {
        /// Path to the report
        file: PathBuf,
    },

    /// Show the loaded emission factors
    Factors,
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
    format: OutputFormat,

    /// Also write the per-network breakdown to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Markdown,
    Json,
    Dashboard,
}

/// Parse a `NAME=COUNT` pair
fn parse_count_pair(raw: &str) -> Result<(String, u64), String> {
    let (name, count) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=COUNT, got '{}'", raw))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing name in '{}'", raw));
    }

    let count = count
        .trim()
        .parse::<u64>()
        .map_err(|_| format!("count must be a non-negative integer in '{}'", raw))?;

    Ok((name.to_string(), count))
}

/// Merge repeated pairs into a distribution, summing duplicate names
fn to_distribution(pairs: Vec<(String, u64)>) -> BTreeMap<String, u64> {
    let mut dist = BTreeMap::new();
    for (name, count) in pairs {
        let entry = dist.entry(name).or_insert(0u64);
        *entry = entry.saturating_add(count);
    }
    dist
}

/// Explicit count, or the saturating sum of the network counts
fn resolve_tx_count(tx_count: Option<u64>, networks: &BTreeMap<String, u64>) -> u64 {
    tx_count.unwrap_or_else(|| networks.values().fold(0u64, |acc, &c| acc.saturating_add(c)))
}

/// Chain id for a saved history export. An export covers one chain, so any
/// extra `--chain` values are reported and ignored.
fn saved_history_chain(chains: &[String]) -> &'static str {
    let Some((first, rest)) = chains.split_first() else {
        return history::map_chain_name(constants::DEFAULT_CHAIN);
    };
    if !rest.is_empty() {
        warn!(
            "--from-file reads a single chain; using '{}' and ignoring {}",
            first,
            rest.join(", ")
        );
    }
    history::map_chain_name(first)
}

fn init_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let file_config = FileConfig::load_or_default(&args.config)?;
    let config = Config::from_file(
        &file_config,
        args.factors.clone(),
        std::env::var(constants::MORALIS_API_KEY_ENV).ok(),
    );

    match args.command {
        Command::Estimate {
            networks,
            types,
            tx_count,
            output,
        } => {
            let table = config.factor_table();
            let networks = to_distribution(networks);
            let types = to_distribution(types);
            let tx_count = resolve_tx_count(tx_count, &networks);

            let result = calculator::compute(&table, tx_count, &networks, &types);
            emit(&result, &output)
        }

        Command::Wallet {
            address,
            chain,
            limit,
            from_file,
            output,
        } => run_wallet(&config, address, chain, limit, from_file, &output).await,

        Command::Extract { file } => {
            let text =
                std::fs::read_to_string(&file).with_context(|| format!("Failed to read report: {}", file.display()))?;
            let extracted = extract::extract(&text);
            if extracted.is_empty() {
                info!("No carbon figures recognised in {}", file.display());
            }
            println!("{}", serde_json::to_string_pretty(&extracted)?);
            Ok(())
        }

        Command::Factors => {
            dashboard::print_factor_table(&config.factor_table());
            Ok(())
        }
    }
}

/// Fetch (or load) history for each chain, then estimate the combined footprint
async fn run_wallet(
    config: &Config,
    address: String,
    chains: Vec<String>,
    limit: Option<u32>,
    from_file: Option<PathBuf>,
    output: &OutputArgs,
) -> Result<()> {
    let chains = if chains.is_empty() {
        vec![config.default_chain.clone()]
    } else {
        chains
    };
    let limit = limit.unwrap_or(config.history_limit);

    let mut activities = Vec::new();
    if let Some(file) = from_file {
        let response = history::load_history_file(&file)?;
        let chain_id = saved_history_chain(&chains);
        activities.push(history::summarize(&address, chain_id, &response.result));
    } else {
        let mut client = HistoryClient::new(config.moralis_api_key.clone())?;
        for chain in &chains {
            let fetched = client.fetch(&address, chain, limit).await?;
            if fetched.cached {
                info!("[CACHED] {} on {}", address, chain);
            }
            activities.push(fetched.activity);
        }
    }

    if output.format != OutputFormat::Json {
        for activity in &activities {
            println!("{}\n", history::format_activity(activity));
        }
    }

    let combined = history::combine(&activities);
    let table = config.factor_table();
    let result = calculator::compute(
        &table,
        combined.total_transactions,
        &combined.networks,
        &combined.transaction_types,
    );
    emit(&result, output)
}

/// Print the analysis in the requested format and write the optional CSV
fn emit(result: &Result<CarbonAnalysis, EstimateError>, output: &OutputArgs) -> Result<()> {
    match output.format {
        OutputFormat::Markdown => println!("{}", report::render(result)),
        OutputFormat::Json => {
            let json = match result {
                Ok(analysis) => serde_json::to_string_pretty(analysis)?,
                Err(e) => serde_json::to_string_pretty(&serde_json::json!({
                    "status": "error",
                    "message": report::format_error(e),
                }))?,
            };
            println!("{}", json);
        }
        OutputFormat::Dashboard => match result {
            Ok(analysis) => dashboard::print_dashboard(analysis),
            Err(e) => println!("{}", report::format_error(e)),
        },
    }

    if let Some(path) = &output.csv {
        match result {
            Ok(CarbonAnalysis::Estimated(footprint)) => {
                dashboard::write_network_csv(path, &footprint.emissions)?;
                eprintln!("  Generated: {}", path.display());
            }
            _ => info!("No emissions to export, skipping {}", path.display()),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count_pair() {
        assert_eq!(parse_count_pair("ethereum=100"), Ok(("ethereum".to_string(), 100)));
        assert_eq!(parse_count_pair(" Arbitrum One = 7 "), Ok(("Arbitrum One".to_string(), 7)));
        assert!(parse_count_pair("ethereum").is_err());
        assert!(parse_count_pair("=5").is_err());
        assert!(parse_count_pair("ethereum=-3").is_err());
        assert!(parse_count_pair("ethereum=lots").is_err());
    }

    #[test]
    fn test_to_distribution_sums_duplicates() {
        let dist = to_distribution(vec![
            ("ethereum".to_string(), 10),
            ("polygon".to_string(), 4),
            ("ethereum".to_string(), 5),
        ]);
        assert_eq!(dist.len(), 2);
        assert_eq!(dist["ethereum"], 15);
    }

    #[test]
    fn test_cli_parses_estimate() {
        let args = Args::try_parse_from([
            "wallet-carbon",
            "estimate",
            "--network",
            "ethereum=100",
            "--network",
            "polygon=200",
            "--type",
            "swap=50",
            "--format",
            "json",
        ])
        .unwrap();

        match args.command {
            Command::Estimate {
                networks,
                types,
                tx_count,
                output,
            } => {
                assert_eq!(networks.len(), 2);
                assert_eq!(types, vec![("swap".to_string(), 50)]);
                assert_eq!(tx_count, None);
                assert_eq!(output.format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_tx_count_saturates_on_huge_network_counts() {
        let args = Args::try_parse_from([
            "wallet-carbon",
            "estimate",
            "--network",
            "ethereum=18446744073709551615",
            "--network",
            "polygon=1",
        ])
        .unwrap();
        let Command::Estimate { networks, tx_count, .. } = args.command else {
            panic!("expected estimate");
        };

        let networks = to_distribution(networks);
        let tx_count = resolve_tx_count(tx_count, &networks);
        assert_eq!(tx_count, u64::MAX);

        let result = calculator::compute(
            &carbon_engine::FactorTable::builtin(),
            tx_count,
            &networks,
            &carbon_engine::TransactionTypeDistribution::new(),
        );
        assert!(matches!(result, Ok(CarbonAnalysis::Estimated(_))));
    }

    #[test]
    fn test_explicit_tx_count_wins() {
        let networks = to_distribution(vec![("ethereum".to_string(), 10)]);
        assert_eq!(resolve_tx_count(Some(3), &networks), 3);
        assert_eq!(resolve_tx_count(None, &networks), 10);
    }

    #[test]
    fn test_saved_history_uses_first_chain_only() {
        let chains = vec!["matic".to_string(), "bsc".to_string()];
        assert_eq!(saved_history_chain(&chains), "polygon");
        assert_eq!(saved_history_chain(&["Ethereum".to_string()]), "eth");
        assert_eq!(saved_history_chain(&[]), "eth");
    }

    #[test]
    fn test_cli_requires_a_network() {
        assert!(Args::try_parse_from(["wallet-carbon", "estimate"]).is_err());
    }

    #[test]
    fn test_cli_parses_wallet_globals() {
        let args = Args::try_parse_from([
            "wallet-carbon",
            "wallet",
            "0xabc",
            "--chain",
            "polygon",
            "--chain",
            "bsc",
            "--factors",
            "custom.json",
            "-v",
        ])
        .unwrap();

        assert!(args.verbose);
        assert_eq!(args.factors, Some(PathBuf::from("custom.json")));
        assert_eq!(args.config, PathBuf::from(constants::CONFIG_FILE));
        match args.command {
            Command::Wallet { address, chain, output, .. } => {
                assert_eq!(address, "0xabc");
                assert_eq!(chain, vec!["polygon", "bsc"]);
                assert_eq!(output.format, OutputFormat::Markdown);
                assert!(output.csv.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
