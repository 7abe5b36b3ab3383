use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BioBucksError;
use crate::types::{Money, Years};
use crate::BioBucksResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A clinical development phase, in the order the asset runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    PhaseI,
    PhaseII,
    PhaseIII,
    Approval,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::PhaseI, Phase::PhaseII, Phase::PhaseIII, Phase::Approval];

    pub fn label(self) -> &'static str {
        match self {
            Phase::PhaseI => "Phase I",
            Phase::PhaseII => "Phase II",
            Phase::PhaseIII => "Phase III",
            Phase::Approval => "Approval Process",
        }
    }

    /// Key used for this phase in stored records.
    pub fn key(self) -> &'static str {
        match self {
            Phase::PhaseI => "phaseI",
            Phase::PhaseII => "phaseII",
            Phase::PhaseIII => "phaseIII",
            Phase::Approval => "approval",
        }
    }

    /// Stage ordinal at which this phase is the next one to run.
    pub fn ordinal(self) -> u8 {
        self.index() as u8 + 1
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Phase::PhaseI => 0,
            Phase::PhaseII => 1,
            Phase::PhaseIII => 2,
            Phase::Approval => 3,
        }
    }
}

/// Share of one year bucket spent in a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseOverlap {
    pub phase: Phase,
    /// Fraction of the year in `(0, 1]`
    pub fraction: Years,
}

impl PhaseOverlap {
    pub fn label(&self) -> &'static str {
        self.phase.label()
    }

    pub fn key(&self) -> &'static str {
        self.phase.key()
    }
}

/// Cumulative development calendar for the phases still ahead of the asset.
///
/// End-times are non-decreasing; a zero-duration phase ends where its
/// predecessor does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSchedule {
    durations: [Years; 4],
    ends: [Years; 4],
    annual_costs: [Money; 4],
    pub years_to_approval: Years,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl PhaseSchedule {
    /// Build the schedule from per-phase durations and total costs, both in
    /// canonical phase order. Costs are spread evenly across each phase.
    pub fn build(durations: [Years; 4], total_costs: [Money; 4]) -> BioBucksResult<Self> {
        let mut ends = [Decimal::ZERO; 4];
        let mut elapsed = Decimal::ZERO;
        for (end, duration) in ends.iter_mut().zip(durations) {
            elapsed = elapsed
                .checked_add(duration)
                .ok_or_else(|| BioBucksError::overflow("cumulative development time"))?;
            *end = elapsed;
        }

        let mut annual_costs = [Decimal::ZERO; 4];
        for (phase, ((annual, cost), duration)) in Phase::ALL
            .into_iter()
            .zip(annual_costs.iter_mut().zip(total_costs).zip(durations))
        {
            if duration > Decimal::ZERO {
                *annual = cost.checked_div(duration).ok_or_else(|| {
                    BioBucksError::overflow(format!("{} annual cost", phase.label()))
                })?;
            }
        }

        Ok(PhaseSchedule {
            durations,
            ends,
            annual_costs,
            years_to_approval: elapsed,
        })
    }

    pub fn duration(&self, phase: Phase) -> Years {
        self.durations[phase.index()]
    }

    /// Time at which `phase` completes.
    pub fn end(&self, phase: Phase) -> Years {
        self.ends[phase.index()]
    }

    /// Time at which `phase` begins, i.e. its predecessor's end.
    pub fn start(&self, phase: Phase) -> Years {
        match phase.index() {
            0 => Decimal::ZERO,
            i => self.ends[i - 1],
        }
    }

    pub fn annual_cost(&self, phase: Phase) -> Money {
        self.annual_costs[phase.index()]
    }

    /// Phases active during the bucket `[year, year + 1)`, with the fraction
    /// of the year each one occupies. Only positive overlaps are returned, in
    /// canonical order.
    pub fn overlaps(&self, year: u32) -> Vec<PhaseOverlap> {
        let year_start = Decimal::from(year);
        let year_end = year_start + Decimal::ONE;

        Phase::ALL
            .into_iter()
            .filter_map(|phase| {
                let start = self.start(phase);
                let end = self.end(phase);
                if self.duration(phase) <= Decimal::ZERO || year_start >= end || year_end <= start {
                    return None;
                }
                let fraction = year_end.min(end) - year_start.max(start);
                (fraction > Decimal::ZERO).then_some(PhaseOverlap { phase, fraction })
            })
            .collect()
    }
}
