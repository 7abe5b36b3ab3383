use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// A stored valuation as supplied by the viewer's storage layer.
///
/// Every section is optional; a missing section resolves to defaults. Unknown
/// sections and fields are ignored so records carrying extra narrative
/// (sources, rationale, units) deserialize cleanly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_overview: Option<AssetOverview>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_parameters: Option<MarketParameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub development_timeline: Option<DevelopmentTimeline>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_trial_costs: Option<PhaseParameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability_of_success: Option<PhaseParameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_parameters: Option<FinancialParameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RecordMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetOverview {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub therapeutic_area: Option<String>,
    /// Free-text stage label, e.g. "Phase II Ready"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_development_stage: Option<String>,
    /// Older records carry the stage under this name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_development_phase: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_addressable_market: Option<Parameter>,
    /// Percent of TAM captured at peak
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_market_share: Option<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_to_peak_adoption: Option<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_pricing: Option<Parameter>,
    /// Years after approval at which exclusivity ends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss_of_exclusivity: Option<Parameter>,
    #[serde(
        default,
        rename = "yearsToDeclinePostLOE",
        skip_serializing_if = "Option::is_none"
    )]
    pub years_to_decline_post_loe: Option<Parameter>,
    /// Percent of peak share retained after generic entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_market_share: Option<Parameter>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevelopmentTimeline {
    #[serde(default, rename = "phaseIDuration", skip_serializing_if = "Option::is_none")]
    pub phase_i_duration: Option<Parameter>,
    #[serde(default, rename = "phaseIIDuration", skip_serializing_if = "Option::is_none")]
    pub phase_ii_duration: Option<Parameter>,
    #[serde(default, rename = "phaseIIIDuration", skip_serializing_if = "Option::is_none")]
    pub phase_iii_duration: Option<Parameter>,
    #[serde(default, rename = "approvalDuration", skip_serializing_if = "Option::is_none")]
    pub approval_duration: Option<Parameter>,
}

/// Per-phase values keyed the way both `clinicalTrialCosts` and
/// `probabilityOfSuccess` are stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseParameters {
    #[serde(default, rename = "phaseI", skip_serializing_if = "Option::is_none")]
    pub phase_i: Option<Parameter>,
    #[serde(default, rename = "phaseII", skip_serializing_if = "Option::is_none")]
    pub phase_ii: Option<Parameter>,
    #[serde(default, rename = "phaseIII", skip_serializing_if = "Option::is_none")]
    pub phase_iii: Option<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval: Option<Parameter>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialParameters {
    /// COGS as percent of revenue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_of_goods_sold: Option<Parameter>,
    /// Operating expenses as percent of revenue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_expenses: Option<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<Parameter>,
    /// WACC, percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<Parameter>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_date: Option<String>,
}

impl RecordMetadata {
    /// Calendar date of `generatedDate`, accepting either `YYYY-MM-DD` or an
    /// RFC 3339 timestamp.
    pub fn generated_on(&self) -> Option<NaiveDate> {
        let raw = self.generated_date.as_deref()?.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
    }
}

/// A leaf parameter. Stored records wrap values as `{"value": ..., ...}`;
/// anything else is kept verbatim so a malformed leaf never fails the whole
/// record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Parameter {
    Wrapped {
        #[serde(default)]
        value: Option<Value>,
    },
    Bare(Value),
}

impl Parameter {
    pub fn new(value: impl Into<Value>) -> Self {
        Parameter::Wrapped {
            value: Some(value.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Parameter extraction
// ---------------------------------------------------------------------------

/// Why a parameter fell back to its default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamIssue {
    #[error("not provided")]
    Absent,
    #[error("has no 'value' field")]
    NoValue,
    #[error("value {raw} is not numeric")]
    Unparseable { raw: String },
    #[error("value {raw} is outside the supported decimal range")]
    OutOfRange { raw: String },
}

/// Extract a numeric parameter, substituting `default` on any failure.
pub fn param_value(param: Option<&Parameter>, default: Decimal) -> Decimal {
    read_param(param).unwrap_or(default)
}

/// Extract a numeric parameter, reporting why extraction failed.
pub fn read_param(param: Option<&Parameter>) -> Result<Decimal, ParamIssue> {
    let value = match param {
        None => return Err(ParamIssue::Absent),
        Some(Parameter::Bare(_)) | Some(Parameter::Wrapped { value: None }) => {
            return Err(ParamIssue::NoValue)
        }
        Some(Parameter::Wrapped { value: Some(v) }) => v,
    };
    parse_value(value).ok_or_else(|| {
        let raw = value.to_string();
        match value {
            // Already a number, so only the magnitude can be at fault
            Value::Number(_) => ParamIssue::OutOfRange { raw },
            _ => ParamIssue::Unparseable { raw },
        }
    })
}

/// Parse a JSON number or numeric-looking string.
pub fn parse_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_numeric_text(s),
        _ => None,
    }
}

const CURRENCY_SYMBOLS: &[char] = &[
    '$', '€', '£', '¥', '₹', '₩', '₽', '₣', '₺', '₪', '₫', '₴', '₦', '₱', '฿', '¢',
];

/// Parse formatted text such as `" $1,250.5 "`. Commas and currency symbols
/// are dropped anywhere in the string; only surrounding whitespace is trimmed.
pub fn parse_numeric_text(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != ',' && !CURRENCY_SYMBOLS.contains(c))
        .collect();
    parse_decimal(cleaned.trim())
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}
