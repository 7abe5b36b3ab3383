use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use biobucks_core::valuation::{self, Parameter, ValuationRecord};

use crate::input;

/// Arguments for the asset DCF
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct DcfArgs {
    /// Path to a JSON valuation record (otherwise read from stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Override the record's current development stage (e.g. "Phase II Ready")
    #[arg(long)]
    pub stage: Option<String>,

    /// Override the discount rate, in percent (e.g. 12.5)
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Print the bare projection without the methodology/assumptions envelope
    #[arg(long)]
    pub raw: bool,
}

pub fn run_dcf(args: DcfArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut record: ValuationRecord = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("a valuation record is required (use --input or pipe JSON on stdin)".into());
    };

    apply_overrides(&mut record, &args);

    if args.raw {
        let result = valuation::project(&record)?;
        Ok(serde_json::to_value(result)?)
    } else {
        let output = valuation::calculate_asset_dcf(&record)?;
        Ok(serde_json::to_value(output)?)
    }
}

/// Flag overrides take precedence over the stored record.
fn apply_overrides(record: &mut ValuationRecord, args: &DcfArgs) {
    if let Some(ref stage) = args.stage {
        let overview = record.asset_overview.get_or_insert_with(Default::default);
        overview.current_development_stage = Some(stage.clone());
    }

    if let Some(rate) = args.discount_rate {
        let financial = record
            .financial_parameters
            .get_or_insert_with(Default::default);
        financial.discount_rate = Some(Parameter::new(rate.to_string()));
    }
}
