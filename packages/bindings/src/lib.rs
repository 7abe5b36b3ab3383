use napi::Result as NapiResult;
use napi_derive::napi;
use serde_json::json;

use biobucks_core::valuation::{self, Phase, Stage, ValuationRecord};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_record(record_json: &str) -> NapiResult<ValuationRecord> {
    serde_json::from_str(record_json).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Asset DCF
// ---------------------------------------------------------------------------

/// Full envelope: result, methodology, resolved assumptions, warnings.
#[napi]
pub fn calculate_asset_dcf(record_json: String) -> NapiResult<String> {
    let record = parse_record(&record_json)?;
    let output = valuation::calculate_asset_dcf(&record).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Bare year-by-year projection.
#[napi]
pub fn project_asset(record_json: String) -> NapiResult<String> {
    let record = parse_record(&record_json)?;
    let result = valuation::project(&record).map_err(to_napi_error)?;
    serde_json::to_string(&result).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

#[napi]
pub fn resolve_stage(label: String) -> NapiResult<String> {
    let stage = Stage::resolve(&label).map_err(to_napi_error)?;
    let modeled: Vec<&str> = stage.remaining_phases().into_iter().map(Phase::label).collect();
    let out = json!({
        "stage": stage.label(),
        "ordinal": stage.ordinal(),
        "modeledPhases": modeled,
    });
    serde_json::to_string(&out).map_err(to_napi_error)
}
