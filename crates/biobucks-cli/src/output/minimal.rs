use serde_json::Value;

use super::{format_scalar, result_object};

/// Key answers in priority order: the NPV for a projection, the resolved
/// stage for a stage lookup.
const PRIORITY_KEYS: &[&str] = &["npv", "stage"];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_answer(value));
}

fn minimal_answer(value: &Value) -> String {
    let Some(result) = result_object(value) else {
        return format_scalar(value);
    };

    PRIORITY_KEYS
        .iter()
        .filter_map(|key| result.get(*key))
        .find(|v| !v.is_null())
        .map(format_scalar)
        .or_else(|| {
            result
                .iter()
                .next()
                .map(|(key, val)| format!("{}: {}", key, format_scalar(val)))
        })
        .unwrap_or_default()
}
