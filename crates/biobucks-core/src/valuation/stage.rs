use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BioBucksError;
use crate::BioBucksResult;

use super::timeline::Phase;

/// Where the asset currently sits in its development path.
///
/// Ordered: `Preclinical < PhaseI < ... < Approved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    Preclinical,
    PhaseI,
    PhaseII,
    PhaseIII,
    Registration,
    Approved,
}

/// Accepted labels (lower-case) for each stage.
const STAGE_SYNONYMS: &[(&str, Stage)] = &[
    ("preclinical ready", Stage::Preclinical),
    ("preclinical", Stage::Preclinical),
    ("discovery", Stage::Preclinical),
    ("phase i ready", Stage::PhaseI),
    ("phase i", Stage::PhaseI),
    ("phase 1 ready", Stage::PhaseI),
    ("phase 1", Stage::PhaseI),
    ("phase ii ready", Stage::PhaseII),
    ("phase ii", Stage::PhaseII),
    ("phase 2 ready", Stage::PhaseII),
    ("phase 2", Stage::PhaseII),
    ("phase iii ready", Stage::PhaseIII),
    ("phase iii", Stage::PhaseIII),
    ("phase 3 ready", Stage::PhaseIII),
    ("phase 3", Stage::PhaseIII),
    ("registration ready", Stage::Registration),
    ("approval", Stage::Registration),
    ("approved", Stage::Approved),
];

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Preclinical,
        Stage::PhaseI,
        Stage::PhaseII,
        Stage::PhaseIII,
        Stage::Registration,
        Stage::Approved,
    ];

    /// Map a free-text label onto a stage, ignoring case and surrounding
    /// whitespace.
    pub fn resolve(label: &str) -> BioBucksResult<Stage> {
        let key = label.trim().to_lowercase();
        STAGE_SYNONYMS
            .iter()
            .find(|(synonym, _)| *synonym == key)
            .map(|(_, stage)| *stage)
            .ok_or_else(|| BioBucksError::UnresolvedStage {
                label: label.to_string(),
            })
    }

    pub fn ordinal(self) -> u8 {
        match self {
            Stage::Preclinical => 0,
            Stage::PhaseI => 1,
            Stage::PhaseII => 2,
            Stage::PhaseIII => 3,
            Stage::Registration => 4,
            Stage::Approved => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Preclinical => "Preclinical",
            Stage::PhaseI => "Phase I",
            Stage::PhaseII => "Phase II",
            Stage::PhaseIII => "Phase III",
            Stage::Registration => "Registration",
            Stage::Approved => "Approved",
        }
    }

    /// True when `phase` is still ahead of (or is) the current stage and so
    /// belongs in the projection. Completed phases carry no duration, cost,
    /// or risk.
    pub fn models(self, phase: Phase) -> bool {
        self.ordinal() <= phase.ordinal()
    }

    /// Phases still to be run, in canonical order.
    pub fn remaining_phases(self) -> Vec<Phase> {
        Phase::ALL.into_iter().filter(|p| self.models(*p)).collect()
    }
}

impl FromStr for Stage {
    type Err = BioBucksError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::resolve(s)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
