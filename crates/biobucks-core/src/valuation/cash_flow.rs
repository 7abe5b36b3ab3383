use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BioBucksError;
use crate::types::{Money, Rate, Years};
use crate::BioBucksResult;

use super::assumptions::{FinancialAssumptions, MarketAssumptions};
use super::timeline::{Phase, PhaseOverlap, PhaseSchedule};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Position of a post-approval year on the product life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommercialStage {
    MarketRamp,
    PeakSales,
    PostLoeDecline,
    GenericCompetition,
}

impl CommercialStage {
    /// Classify `t` years after approval.
    pub fn at(t: Years, market: &MarketAssumptions) -> Self {
        let loe = market.loss_of_exclusivity;
        if t < market.years_to_peak {
            CommercialStage::MarketRamp
        } else if t <= loe {
            CommercialStage::PeakSales
        } else if t <= loe + market.years_to_decline {
            CommercialStage::PostLoeDecline
        } else {
            CommercialStage::GenericCompetition
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CommercialStage::MarketRamp => "Market Ramp",
            CommercialStage::PeakSales => "Peak Sales",
            CommercialStage::PostLoeDecline => "Post-LOE Decline",
            CommercialStage::GenericCompetition => "Generic Competition",
        }
    }

    /// Share of the addressable market captured `t` years after approval.
    pub fn market_share(self, t: Years, market: &MarketAssumptions) -> BioBucksResult<Rate> {
        let peak = market.peak_market_share;
        let overflow = || BioBucksError::overflow(format!("{} market share", self.label()));
        match self {
            CommercialStage::MarketRamp => {
                if market.years_to_peak > Decimal::ZERO {
                    peak.checked_mul(t + Decimal::ONE)
                        .and_then(|v| v.checked_div(market.years_to_peak))
                        .ok_or_else(overflow)
                } else {
                    Ok(peak)
                }
            }
            CommercialStage::PeakSales => Ok(peak),
            CommercialStage::PostLoeDecline => {
                let progress = if market.years_to_decline > Decimal::ZERO {
                    (t - market.loss_of_exclusivity)
                        .checked_div(market.years_to_decline)
                        .ok_or_else(overflow)?
                } else {
                    Decimal::ONE
                };
                (Decimal::ONE - market.terminal_market_share)
                    .checked_mul(progress)
                    .and_then(|eroded| peak.checked_mul(Decimal::ONE - eroded))
                    .ok_or_else(overflow)
            }
            CommercialStage::GenericCompetition => peak
                .checked_mul(market.terminal_market_share)
                .ok_or_else(overflow),
        }
    }
}

/// Un-risked financial line items for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCashFlow {
    pub stage: String,
    pub development_costs: Money,
    pub revenue: Money,
    pub cogs: Money,
    pub opex: Money,
    pub ebit: Money,
    pub tax: Money,
    pub fcf: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Phase occupying the largest share of the bucket. Ties go to the earlier
/// phase.
pub fn primary_phase(overlaps: &[PhaseOverlap]) -> Option<Phase> {
    let mut best: Option<&PhaseOverlap> = None;
    for overlap in overlaps {
        if best.map_or(true, |b| overlap.fraction > b.fraction) {
            best = Some(overlap);
        }
    }
    best.map(|b| b.phase)
}

/// Development-year cash flow: phase costs pro-rated by overlap.
///
/// `fallback_stage` labels a bucket with no active phase.
pub fn development_year(
    schedule: &PhaseSchedule,
    overlaps: &[PhaseOverlap],
    fallback_stage: &str,
) -> BioBucksResult<RawCashFlow> {
    let mut development_costs = Decimal::ZERO;
    for o in overlaps {
        development_costs = schedule
            .annual_cost(o.phase)
            .checked_mul(o.fraction)
            .and_then(|cost| development_costs.checked_add(cost))
            .ok_or_else(|| BioBucksError::overflow("development cost"))?;
    }

    let stage = primary_phase(overlaps)
        .map(|p| p.label().to_string())
        .unwrap_or_else(|| fallback_stage.to_string());

    Ok(RawCashFlow {
        stage,
        development_costs,
        revenue: Decimal::ZERO,
        cogs: Decimal::ZERO,
        opex: Decimal::ZERO,
        ebit: -development_costs,
        tax: Decimal::ZERO,
        fcf: -development_costs,
    })
}

/// Commercial-year cash flow `years_since_approval` after approval.
pub fn commercial_year(
    years_since_approval: Years,
    market: &MarketAssumptions,
    financial: &FinancialAssumptions,
) -> BioBucksResult<RawCashFlow> {
    let stage = CommercialStage::at(years_since_approval, market);
    let share = stage.market_share(years_since_approval, market)?;

    let revenue = market
        .total_addressable_market
        .checked_mul(share)
        .and_then(|patients| patients.checked_mul(market.annual_pricing))
        .ok_or_else(|| BioBucksError::overflow("revenue"))?;
    let cogs = revenue
        .checked_mul(financial.cogs_rate)
        .ok_or_else(|| BioBucksError::overflow("cost of goods sold"))?;
    let opex = revenue
        .checked_mul(financial.opex_rate)
        .ok_or_else(|| BioBucksError::overflow("operating expenses"))?;
    let ebit = revenue
        .checked_sub(cogs)
        .and_then(|v| v.checked_sub(opex))
        .ok_or_else(|| BioBucksError::overflow("EBIT"))?;
    // Losses carry no tax credit
    let tax = if ebit > Decimal::ZERO {
        ebit.checked_mul(financial.tax_rate)
            .ok_or_else(|| BioBucksError::overflow("tax"))?
    } else {
        Decimal::ZERO
    };
    let fcf = ebit
        .checked_sub(tax)
        .ok_or_else(|| BioBucksError::overflow("free cash flow"))?;

    Ok(RawCashFlow {
        stage: stage.label().to_string(),
        development_costs: Decimal::ZERO,
        revenue,
        cogs,
        opex,
        ebit,
        tax,
        fcf,
    })
}
