use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BioBucksError;
use crate::types::{Money, Rate};
use crate::BioBucksResult;

use super::timeline::{Phase, PhaseOverlap, PhaseSchedule};

pub const COMMERCIAL_RISK_PHASE: &str = "Commercial (full cumulative PoS)";

/// Probability cascade across the development phases.
///
/// A phase's own PoS only gates the phases after it: its cost is paid once
/// the asset reaches it, whether or not the phase then succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    /// Probability of reaching each phase, canonical order
    prior_risk: [Rate; 4],
    cumulative_pos: Rate,
}

impl RiskProfile {
    /// Build from per-phase PoS fractions. Each is clamped to [0, 1] so the
    /// cascade stays a probability.
    pub fn new(pos: [Rate; 4]) -> Self {
        let mut prior_risk = [Decimal::ONE; 4];
        let mut reached = Decimal::ONE;
        for (prior, p) in prior_risk.iter_mut().zip(pos) {
            *prior = reached;
            reached *= p.clamp(Decimal::ZERO, Decimal::ONE);
        }
        RiskProfile {
            prior_risk,
            cumulative_pos: reached,
        }
    }

    /// Probability that the program gets as far as starting `phase`.
    pub fn prior_risk(&self, phase: Phase) -> Rate {
        self.prior_risk[phase.index()]
    }

    /// Probability that every phase succeeds.
    pub fn cumulative_pos(&self) -> Rate {
        self.cumulative_pos
    }

    /// Expected development spend for a bucket, as a negative cash flow.
    pub fn development_cash_flow(
        &self,
        schedule: &PhaseSchedule,
        overlaps: &[PhaseOverlap],
    ) -> BioBucksResult<Money> {
        let mut expected_cost = Decimal::ZERO;
        for o in overlaps {
            expected_cost = schedule
                .annual_cost(o.phase)
                .checked_mul(o.fraction)
                .and_then(|cost| cost.checked_mul(self.prior_risk(o.phase)))
                .and_then(|risked| expected_cost.checked_add(risked))
                .ok_or_else(|| BioBucksError::overflow("risk-adjusted development cost"))?;
        }
        Ok(-expected_cost)
    }

    /// Commercial cash flow materialises only if the whole program succeeds.
    pub fn commercial_cash_flow(&self, fcf: Money) -> Money {
        fcf * self.cumulative_pos
    }
}

/// Describes which part of the cascade weights a development year.
pub fn development_risk_phase(year: u32, schedule: &PhaseSchedule) -> &'static str {
    let y = Decimal::from(year);
    if y < schedule.end(Phase::PhaseI) {
        "Phase I (no prior risk)"
    } else if y < schedule.end(Phase::PhaseII) {
        "Phase II (Phase I PoS applied)"
    } else if y < schedule.end(Phase::PhaseIII) {
        "Phase III (Phase I × II PoS applied)"
    } else if y < schedule.end(Phase::Approval) {
        "Approval (Phase I × II × III PoS applied)"
    } else {
        "Development (full PoS)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_prior_risk_cascade() {
        let r = RiskProfile::new([dec!(0.6), dec!(0.4), dec!(0.5), dec!(0.9)]);
        assert_eq!(r.prior_risk(Phase::PhaseI), Decimal::ONE);
        assert_eq!(r.prior_risk(Phase::PhaseII), dec!(0.6));
        assert_eq!(r.prior_risk(Phase::PhaseIII), dec!(0.24));
        assert_eq!(r.prior_risk(Phase::Approval), dec!(0.12));
        assert_eq!(r.cumulative_pos(), dec!(0.108));
    }

    #[test]
    fn test_cumulative_pos_bounded() {
        let r = RiskProfile::new([dec!(1.5), dec!(2), dec!(1), dec!(1)]);
        assert_eq!(r.cumulative_pos(), Decimal::ONE);
        let r = RiskProfile::new([dec!(-0.5), dec!(1), dec!(1), dec!(1)]);
        assert_eq!(r.cumulative_pos(), Decimal::ZERO);
    }

    #[test]
    fn test_development_cash_flow_weights_by_prior_risk() {
        let schedule = PhaseSchedule::build(
            [dec!(1.5), dec!(2), Decimal::ZERO, Decimal::ZERO],
            [dec!(15000000), dec!(20000000), Decimal::ZERO, Decimal::ZERO],
        )
        .unwrap();
        let risk = RiskProfile::new([dec!(0.5), dec!(0.8), Decimal::ONE, Decimal::ONE]);
        let overlaps = schedule.overlaps(1);
        // 0.5 * 10M * 1.0 + 0.5 * 10M * 0.5
        assert_eq!(
            risk.development_cash_flow(&schedule, &overlaps).unwrap(),
            dec!(-7500000)
        );
    }

    #[test]
    fn test_commercial_cash_flow() {
        let risk = RiskProfile::new([dec!(0.5), dec!(0.5), Decimal::ONE, Decimal::ONE]);
        assert_eq!(risk.commercial_cash_flow(dec!(1000)), dec!(250));
        assert_eq!(risk.commercial_cash_flow(dec!(-1000)), dec!(-250));
    }

    #[test]
    fn test_development_risk_phase_labels() {
        let schedule = PhaseSchedule::build(
            [dec!(1), dec!(1), dec!(1), dec!(1)],
            [Decimal::ZERO; 4],
        )
        .unwrap();
        assert_eq!(development_risk_phase(0, &schedule), "Phase I (no prior risk)");
        assert_eq!(development_risk_phase(1, &schedule), "Phase II (Phase I PoS applied)");
        assert_eq!(
            development_risk_phase(2, &schedule),
            "Phase III (Phase I × II PoS applied)"
        );
        assert_eq!(
            development_risk_phase(3, &schedule),
            "Approval (Phase I × II × III PoS applied)"
        );
        assert_eq!(development_risk_phase(4, &schedule), "Development (full PoS)");
    }

    #[test]
    fn test_risk_phase_skips_completed_phases() {
        let schedule = PhaseSchedule::build(
            [Decimal::ZERO, Decimal::ZERO, dec!(2), dec!(1)],
            [Decimal::ZERO; 4],
        )
        .unwrap();
        assert_eq!(
            development_risk_phase(0, &schedule),
            "Phase III (Phase I × II PoS applied)"
        );
    }
}
