//! Carbon footprint estimation for blockchain wallet activity
//!
//! Converts per-network transaction counts into CO2 and energy estimates,
//! everyday equivalents and reduction strategies, and renders the result as
//! a markdown report.
//!
//! ```
//! use carbon_engine::{calculator, report, FactorTable, NetworkDistribution};
//!
//! let table = FactorTable::builtin();
//! let networks: NetworkDistribution = [("ethereum".to_string(), 100)].into_iter().collect();
//! let analysis = calculator::compute(&table, 100, &networks, &Default::default());
//! let text = report::render(&analysis);
//! assert!(text.contains("## Emissions by Network"));
//! ```

pub mod calculator;
pub mod constants;
pub mod equivalents;
pub mod error;
pub mod extract;
pub mod factors;
pub mod report;
pub mod strategies;

pub use calculator::{
    CarbonAnalysis, EmissionsResult, Footprint, NetworkDistribution, NetworkEmissions, TransactionTypeDistribution,
};
pub use equivalents::EquivalenceSet;
pub use error::{EstimateError, FactorError};
pub use extract::ExtractedReport;
pub use factors::{FactorLookup, FactorTable, NetworkEmissionFactor, TransactionTypeFactor};
pub use report::Assessment;
pub use strategies::{Priority, Strategy};
