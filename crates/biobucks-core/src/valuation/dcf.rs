use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::BioBucksError;
use crate::time_value::discount_factor;
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Years};
use crate::BioBucksResult;

use super::assumptions::AssetAssumptions;
use super::cash_flow::{commercial_year, development_year};
use super::record::ValuationRecord;
use super::risk::{development_risk_phase, RiskProfile, COMMERCIAL_RISK_PHASE};

/// Longest projection accepted, in years after year 0.
pub const MAX_PROJECTION_YEARS: u32 = 200;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Projection for a single year of the asset model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearProjection {
    pub year: u32,
    pub label: String,
    /// Dominant development phase or commercial life-cycle stage
    pub stage: String,
    pub development_costs: Money,
    pub revenue: Money,
    pub cogs: Money,
    pub opex: Money,
    pub ebit: Money,
    pub tax: Money,
    pub fcf: Money,
    #[serde(rename = "riskAdjustedFCF")]
    pub risk_adjusted_fcf: Money,
    /// Which part of the PoS cascade weighted this year
    pub risk_phase: String,
    pub discount_factor: Rate,
    pub present_value: Money,
}

/// Output of the asset DCF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DcfResult {
    /// Year-by-year projections, year 0 first
    pub years: Vec<YearProjection>,
    /// Sum of all present values
    pub npv: Money,
    #[serde(rename = "cumulativePoS")]
    pub cumulative_pos: Rate,
    pub wacc: Rate,
    pub years_to_approval: Years,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project a stored valuation record into a risk-adjusted DCF.
///
/// Pure: identical records give identical results.
pub fn project(record: &ValuationRecord) -> BioBucksResult<DcfResult> {
    let resolved = AssetAssumptions::resolve(record)?;
    project_assumptions(&resolved.assumptions)
}

/// Run the projection, wrapped with the resolved assumptions, any absorbed
/// input warnings, and timing metadata.
pub fn calculate_asset_dcf(
    record: &ValuationRecord,
) -> BioBucksResult<ComputationOutput<DcfResult>> {
    let start = Instant::now();

    let resolved = AssetAssumptions::resolve(record)?;
    let mut warnings = resolved.warnings;
    let output = project_assumptions(&resolved.assumptions)?;

    if output.cumulative_pos.is_zero() {
        warnings.push(
            "Cumulative probability of success is zero; commercial cash flows carry no value"
                .into(),
        );
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Risk-adjusted biotech asset DCF (phase-weighted PoS)",
        &resolved.assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Run the projection over already-resolved assumptions.
pub fn project_assumptions(assumptions: &AssetAssumptions) -> BioBucksResult<DcfResult> {
    let schedule = assumptions.schedule()?;
    let risk = RiskProfile::new(assumptions.probabilities());
    let wacc = assumptions.financial.wacc;
    let years_to_approval = schedule.years_to_approval;
    let horizon = projection_horizon(assumptions, years_to_approval)?;

    let mut years = Vec::with_capacity(horizon as usize + 1);
    for year in 0..=horizon {
        let y = Decimal::from(year);

        let (cash_flow, risk_adjusted_fcf, risk_phase) = if y < years_to_approval {
            let overlaps = schedule.overlaps(year);
            let cf = development_year(&schedule, &overlaps, &assumptions.stage_label)?;
            let risked = risk.development_cash_flow(&schedule, &overlaps)?;
            (cf, risked, development_risk_phase(year, &schedule))
        } else {
            let cf = commercial_year(
                y - years_to_approval,
                &assumptions.market,
                &assumptions.financial,
            )?;
            let risked = risk.commercial_cash_flow(cf.fcf);
            (cf, risked, COMMERCIAL_RISK_PHASE)
        };

        let discount_factor = discount_factor(wacc, year)?;
        let present_value = risk_adjusted_fcf
            .checked_mul(discount_factor)
            .ok_or_else(|| BioBucksError::overflow(format!("present value in year {year}")))?;

        years.push(YearProjection {
            year,
            label: year_label(year),
            stage: cash_flow.stage,
            development_costs: cash_flow.development_costs,
            revenue: cash_flow.revenue,
            cogs: cash_flow.cogs,
            opex: cash_flow.opex,
            ebit: cash_flow.ebit,
            tax: cash_flow.tax,
            fcf: cash_flow.fcf,
            risk_adjusted_fcf,
            risk_phase: risk_phase.to_string(),
            discount_factor,
            present_value,
        });
    }

    let npv = years
        .iter()
        .try_fold(Decimal::ZERO, |acc, y| acc.checked_add(y.present_value))
        .ok_or_else(|| BioBucksError::overflow("NPV"))?;

    Ok(DcfResult {
        years,
        npv,
        cumulative_pos: risk.cumulative_pos(),
        wacc,
        years_to_approval,
    })
}

/// Final year index of the projection.
///
/// Loss of exclusivity is measured from approval but is added here as if it
/// were a duration, so the horizon runs `ceil(approval + LOE + decline)`.
pub fn projection_horizon(
    assumptions: &AssetAssumptions,
    years_to_approval: Years,
) -> BioBucksResult<u32> {
    let too_long = |span: String| BioBucksError::InvalidInput {
        field: "projection horizon".into(),
        reason: format!("{span} years exceeds the {MAX_PROJECTION_YEARS}-year projection limit"),
    };

    let span = years_to_approval
        .checked_add(assumptions.market.loss_of_exclusivity)
        .and_then(|v| v.checked_add(assumptions.market.years_to_decline))
        .ok_or_else(|| too_long("approval + LOE + decline".into()))?;

    span.ceil()
        .to_u32()
        .filter(|h| *h <= MAX_PROJECTION_YEARS)
        .ok_or_else(|| too_long(span.to_string()))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn year_label(year: u32) -> String {
    if year == 0 {
        "Current year".to_string()
    } else {
        format!("Year {year}")
    }
}
