use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::BioBucksError;
use crate::types::{millions_to_money, percent_to_rate, Money, Rate, Years};
use crate::BioBucksResult;

use super::record::{read_param, ParamIssue, Parameter, ValuationRecord};
use super::stage::Stage;
use super::timeline::{Phase, PhaseSchedule};

/// Stage assumed when a record names none.
pub const DEFAULT_STAGE_LABEL: &str = "Phase I Ready";

const HUNDRED: Decimal = dec!(100);
const DEFAULT_DISCOUNT_RATE_PCT: Decimal = dec!(10);
const DEFAULT_POS_PCT: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Fully resolved inputs for one projection: every field numeric, every
/// percentage converted to a fraction, completed phases zeroed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetAssumptions {
    pub stage: Stage,
    /// Stage text as written in the record
    pub stage_label: String,
    /// Canonical phase order
    pub phases: [PhaseAssumption; 4],
    pub market: MarketAssumptions,
    pub financial: FinancialAssumptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub therapeutic_area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseAssumption {
    pub phase: Phase,
    /// False once the asset has moved past this phase
    pub modeled: bool,
    pub duration: Years,
    /// Total phase cost in currency units
    pub cost: Money,
    /// Probability of completing the phase, capped to [0, 1]
    pub probability_of_success: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAssumptions {
    pub total_addressable_market: Money,
    pub peak_market_share: Rate,
    pub years_to_peak: Years,
    pub annual_pricing: Money,
    /// Years after approval at which exclusivity ends
    pub loss_of_exclusivity: Years,
    pub years_to_decline: Years,
    /// Fraction of peak share retained once generics are established
    pub terminal_market_share: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialAssumptions {
    pub cogs_rate: Rate,
    pub opex_rate: Rate,
    pub tax_rate: Rate,
    pub wacc: Rate,
}

/// Resolution output: the assumptions plus any non-fatal issues absorbed
/// along the way.
#[derive(Debug, Clone)]
pub struct ResolvedRecord {
    pub assumptions: AssetAssumptions,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl AssetAssumptions {
    /// Turn a loosely-typed record into validated assumptions.
    ///
    /// Missing sections and unparseable values fall back to defaults and are
    /// reported as warnings. An unknown stage label or an explicit negative
    /// value aborts resolution.
    pub fn resolve(record: &ValuationRecord) -> BioBucksResult<ResolvedRecord> {
        let mut reader = FieldReader::default();

        let overview = reader.section("assetOverview", record.asset_overview.as_ref());
        let stage_label = overview
            .current_development_stage
            .filter(|s| !s.is_empty())
            .or(overview.current_development_phase)
            .unwrap_or_else(|| DEFAULT_STAGE_LABEL.to_string());
        let stage = Stage::resolve(&stage_label)?;

        let timeline =
            reader.section("developmentTimeline", record.development_timeline.as_ref());
        let costs = reader.section("clinicalTrialCosts", record.clinical_trial_costs.as_ref());
        let pos = reader.section("probabilityOfSuccess", record.probability_of_success.as_ref());

        let durations = [
            &timeline.phase_i_duration,
            &timeline.phase_ii_duration,
            &timeline.phase_iii_duration,
            &timeline.approval_duration,
        ];
        let phase_costs = [&costs.phase_i, &costs.phase_ii, &costs.phase_iii, &costs.approval];
        let phase_pos = [&pos.phase_i, &pos.phase_ii, &pos.phase_iii, &pos.approval];

        let mut phases = Phase::ALL.map(PhaseAssumption::completed);
        for phase in stage.remaining_phases() {
            let i = phase.index();
            let duration_field = format!("developmentTimeline.{}Duration", phase.key());
            let cost_field = format!("clinicalTrialCosts.{}", phase.key());
            let pos_field = format!("probabilityOfSuccess.{}", phase.key());

            let duration = reader.value(&duration_field, durations[i].as_ref(), Decimal::ZERO);
            let cost = reader.value(&cost_field, phase_costs[i].as_ref(), Decimal::ZERO);
            let pos_pct = reader.value(&pos_field, phase_pos[i].as_ref(), DEFAULT_POS_PCT);

            non_negative(&duration_field, duration)?;
            non_negative(&cost_field, cost)?;
            non_negative(&pos_field, pos_pct)?;
            if pos_pct > HUNDRED {
                reader.warn(format!("{pos_field} of {pos_pct}% capped at 100%"));
            }

            phases[i] = PhaseAssumption {
                phase,
                modeled: true,
                duration,
                cost: millions_to_money(cost)?,
                probability_of_success: percent_to_rate(pos_pct).min(Decimal::ONE),
            };
        }

        let market = reader.market(record)?;
        let financial = reader.financial(record)?;

        let generated_date = match record.metadata.as_ref() {
            Some(meta) if meta.generated_date.is_some() => {
                let date = meta.generated_on();
                if date.is_none() {
                    reader.warn(format!(
                        "metadata.generatedDate '{}' is not a recognised date",
                        meta.generated_date.as_deref().unwrap_or_default()
                    ));
                }
                date
            }
            _ => None,
        };

        let assumptions = AssetAssumptions {
            stage,
            stage_label,
            phases,
            market,
            financial,
            asset_name: overview.asset_name,
            therapeutic_area: overview.therapeutic_area,
            generated_date,
        };

        Ok(ResolvedRecord {
            assumptions,
            warnings: reader.warnings,
        })
    }

    pub fn phase(&self, phase: Phase) -> &PhaseAssumption {
        &self.phases[phase.index()]
    }

    /// Development calendar for the phases still ahead.
    pub fn schedule(&self) -> BioBucksResult<PhaseSchedule> {
        PhaseSchedule::build(
            self.phases.clone().map(|p| p.duration),
            self.phases.clone().map(|p| p.cost),
        )
    }

    /// Per-phase probability of success in canonical order.
    pub fn probabilities(&self) -> [Rate; 4] {
        self.phases.clone().map(|p| p.probability_of_success)
    }
}

impl PhaseAssumption {
    /// A phase the asset has already passed.
    fn completed(phase: Phase) -> Self {
        PhaseAssumption {
            phase,
            modeled: false,
            duration: Decimal::ZERO,
            cost: Decimal::ZERO,
            probability_of_success: Decimal::ONE,
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FieldReader {
    warnings: Vec<String>,
}

impl FieldReader {
    fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }

    fn section<T: Clone + Default>(&mut self, name: &str, section: Option<&T>) -> T {
        match section {
            Some(s) => s.clone(),
            None => {
                self.warn(format!("{name} section missing; defaults applied"));
                T::default()
            }
        }
    }

    fn value(&mut self, field: &str, param: Option<&Parameter>, default: Decimal) -> Decimal {
        match read_param(param) {
            Ok(v) => v,
            Err(ParamIssue::Absent) => default,
            Err(issue) => {
                self.warn(format!("{field} {issue}; using default {default}"));
                default
            }
        }
    }

    fn market(&mut self, record: &ValuationRecord) -> BioBucksResult<MarketAssumptions> {
        let m = self.section("marketParameters", record.market_parameters.as_ref());

        let tam = self.value(
            "marketParameters.totalAddressableMarket",
            m.total_addressable_market.as_ref(),
            Decimal::ZERO,
        );
        let peak_pct = self.value(
            "marketParameters.peakMarketShare",
            m.peak_market_share.as_ref(),
            Decimal::ZERO,
        );
        let years_to_peak = self.value(
            "marketParameters.yearsToPeakAdoption",
            m.years_to_peak_adoption.as_ref(),
            Decimal::ZERO,
        );
        let pricing = self.value(
            "marketParameters.annualPricing",
            m.annual_pricing.as_ref(),
            Decimal::ZERO,
        );
        let loe = self.value(
            "marketParameters.lossOfExclusivity",
            m.loss_of_exclusivity.as_ref(),
            Decimal::ZERO,
        );
        let decline = self.value(
            "marketParameters.yearsToDeclinePostLOE",
            m.years_to_decline_post_loe.as_ref(),
            Decimal::ZERO,
        );
        let terminal_pct = self.value(
            "marketParameters.terminalMarketShare",
            m.terminal_market_share.as_ref(),
            Decimal::ZERO,
        );

        non_negative("marketParameters.totalAddressableMarket", tam)?;
        non_negative("marketParameters.peakMarketShare", peak_pct)?;
        non_negative("marketParameters.yearsToPeakAdoption", years_to_peak)?;
        non_negative("marketParameters.annualPricing", pricing)?;
        non_negative("marketParameters.lossOfExclusivity", loe)?;
        non_negative("marketParameters.yearsToDeclinePostLOE", decline)?;
        non_negative("marketParameters.terminalMarketShare", terminal_pct)?;

        Ok(MarketAssumptions {
            total_addressable_market: tam,
            peak_market_share: percent_to_rate(peak_pct),
            years_to_peak,
            annual_pricing: pricing,
            loss_of_exclusivity: loe,
            years_to_decline: decline,
            terminal_market_share: percent_to_rate(terminal_pct),
        })
    }

    fn financial(&mut self, record: &ValuationRecord) -> BioBucksResult<FinancialAssumptions> {
        let f = self.section("financialParameters", record.financial_parameters.as_ref());

        let cogs = self.value(
            "financialParameters.costOfGoodsSold",
            f.cost_of_goods_sold.as_ref(),
            Decimal::ZERO,
        );
        let opex = self.value(
            "financialParameters.operatingExpenses",
            f.operating_expenses.as_ref(),
            Decimal::ZERO,
        );
        let tax = self.value("financialParameters.taxRate", f.tax_rate.as_ref(), Decimal::ZERO);
        let wacc_pct = self.value(
            "financialParameters.discountRate",
            f.discount_rate.as_ref(),
            DEFAULT_DISCOUNT_RATE_PCT,
        );

        if wacc_pct <= -HUNDRED {
            return Err(BioBucksError::FinancialImpossibility(format!(
                "Discount rate of {wacc_pct}% would discount every future cash flow to infinity"
            )));
        }

        Ok(FinancialAssumptions {
            cogs_rate: percent_to_rate(cogs),
            opex_rate: percent_to_rate(opex),
            tax_rate: percent_to_rate(tax),
            wacc: percent_to_rate(wacc_pct),
        })
    }
}

fn non_negative(field: &str, value: Decimal) -> BioBucksResult<()> {
    if value < Decimal::ZERO {
        return Err(BioBucksError::negative(field));
    }
    Ok(())
}
