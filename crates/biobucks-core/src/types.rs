use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BioBucksError;
use crate::BioBucksResult;

/// Dollar amounts: costs, revenue, cash flows. Record inputs in $M are scaled
/// up before they land here.
pub type Money = Decimal;

/// Fractions in [0, 1] for shares, margins, probabilities and the WACC.
/// Record percentages are divided by 100 on the way in.
pub type Rate = Decimal;

/// Time in years, fractional where phases end mid-year.
pub type Years = Decimal;

/// Result envelope returned by every top-level calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    /// Inputs as actually used, after defaulting and unit conversion
    pub assumptions: serde_json::Value,
    /// Inputs that were recovered from rather than rejected
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Wrap a result with its methodology, assumptions and run metadata.
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Convert a record percentage (e.g. `12.5`) to a fraction.
pub fn percent_to_rate(percent: Decimal) -> Rate {
    percent / Decimal::ONE_HUNDRED
}

/// Convert a record amount in millions of dollars to dollars.
pub fn millions_to_money(millions: Decimal) -> BioBucksResult<Money> {
    millions
        .checked_mul(Decimal::from(1_000_000u32))
        .ok_or_else(|| BioBucksError::overflow(format!("{millions} million")))
}
