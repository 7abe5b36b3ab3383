use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_scalar, result_object, year_rows};

/// Columns shown for each projected year, with their headers.
const YEAR_COLUMNS: &[(&str, &str)] = &[
    ("label", "Year"),
    ("stage", "Stage"),
    ("developmentCosts", "Dev Costs"),
    ("revenue", "Revenue"),
    ("ebit", "EBIT"),
    ("fcf", "FCF"),
    ("riskAdjustedFCF", "Risk-adj FCF"),
    ("discountFactor", "DF"),
    ("presentValue", "PV"),
];

/// Format output as tables: the year schedule first, then the scalar summary.
pub fn print_table(value: &Value) {
    if let Some(rows) = year_rows(value) {
        print_schedule(rows);
        println!();
    }

    match result_object(value) {
        Some(result) => print_summary(result),
        None => println!("{}", format_scalar(value)),
    }

    if let Some(envelope) = value.as_object() {
        print_envelope_notes(envelope);
    }
}

fn print_schedule(rows: &[Value]) {
    let mut builder = Builder::default();
    builder.push_record(YEAR_COLUMNS.iter().map(|(_, header)| *header));
    for row in rows {
        builder.push_record(
            YEAR_COLUMNS
                .iter()
                .map(|(key, _)| row.get(*key).map(format_cell).unwrap_or_default()),
        );
    }
    println!("{}", Table::from(builder));
}

fn print_summary(result: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in result.iter().filter(|(k, _)| k.as_str() != "years") {
        builder.push_record([key.clone(), format_scalar(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Money columns are printed to whole units; factors keep four places.
fn format_cell(value: &Value) -> String {
    match value.as_f64() {
        Some(n) if n.abs() >= 1000.0 => format!("{:.0}", n),
        Some(n) if value.is_f64() => format!("{:.4}", n),
        _ => format_scalar(value),
    }
}
