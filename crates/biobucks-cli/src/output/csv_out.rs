use serde_json::Value;
use std::io;

use super::{format_scalar, result_object, year_rows};

/// Write output as CSV to stdout: one row per projected year when the output
/// carries a schedule, otherwise `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    if let Some(rows) = year_rows(value) {
        write_rows(&mut wtr, rows);
    } else if let Some(result) = result_object(value) {
        let _ = wtr.write_record(["field", "value"]);
        for (key, val) in result {
            let _ = wtr.write_record([key.as_str(), &format_scalar(val)]);
        }
    } else {
        let _ = wtr.write_record([&format_scalar(value)]);
    }

    let _ = wtr.flush();
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        return;
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    let _ = wtr.write_record(&headers);

    for row in rows.iter().filter_map(Value::as_object) {
        let record: Vec<String> = headers
            .iter()
            .map(|h| row.get(*h).map(format_scalar).unwrap_or_default())
            .collect();
        let _ = wtr.write_record(&record);
    }
}
