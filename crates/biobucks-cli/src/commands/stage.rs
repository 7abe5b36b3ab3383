use clap::Args;
use serde_json::{json, Value};

use biobucks_core::valuation::{Phase, Stage};

/// Arguments for stage resolution
#[derive(Args)]
pub struct StageArgs {
    /// Free-text stage label, e.g. "Phase 2 Ready"
    pub label: String,
}

pub fn run_stage(args: StageArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let stage = Stage::resolve(&args.label)?;
    Ok(describe(stage, &args.label))
}

fn describe(stage: Stage, label: &str) -> Value {
    let (modeled, completed): (Vec<Phase>, Vec<Phase>) =
        Phase::ALL.into_iter().partition(|p| stage.models(*p));
    let labels = |phases: Vec<Phase>| -> Vec<&'static str> {
        phases.into_iter().map(Phase::label).collect()
    };

    json!({
        "label": label,
        "stage": stage.label(),
        "ordinal": stage.ordinal(),
        "modeledPhases": labels(modeled),
        "completedPhases": labels(completed),
    })
}
