pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The projection object, whether or not it is wrapped in the envelope.
pub(crate) fn result_object(value: &Value) -> Option<&Map<String, Value>> {
    let map = value.as_object()?;
    match map.get("result") {
        Some(Value::Object(result)) => Some(result),
        _ => Some(map),
    }
}

/// Rows of the year-by-year schedule, if the output carries one.
pub(crate) fn year_rows(value: &Value) -> Option<&[Value]> {
    result_object(value)?
        .get("years")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
}

/// Scalar render shared by the text formatters.
pub(crate) fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(format_scalar).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_year_rows_found_inside_envelope_and_raw() {
        let raw = json!({"years": [{"year": 0}, {"year": 1}], "npv": 1.5});
        let wrapped = json!({"result": raw.clone(), "warnings": []});
        assert_eq!(year_rows(&raw).map(<[Value]>::len), Some(2));
        assert_eq!(year_rows(&wrapped).map(<[Value]>::len), Some(2));
        assert!(year_rows(&json!({"stage": "Phase I"})).is_none());
    }

    #[test]
    fn test_format_scalar() {
        assert_eq!(format_scalar(&json!("Phase II")), "Phase II");
        assert_eq!(format_scalar(&json!(["Phase I", "Phase II"])), "Phase I, Phase II");
        assert_eq!(format_scalar(&Value::Null), "");
        assert_eq!(format_scalar(&json!(0.25)), "0.25");
    }
}
