use serde_json::Value;
use std::io;

use super::MONTH_COLUMNS;

/// Write output as CSV to stdout.
///
/// A bare projection becomes one row per month. An appraisal envelope
/// becomes two-column field/value rows of the metrics; the embedded cash
/// flows are left to the projection command, which emits proper rows.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            if let Some(Value::Object(result)) = map.get("result") {
                let _ = wtr.write_record(["metric", "value"]);
                for (key, val) in result {
                    if key == "cash_flows" {
                        continue;
                    }
                    match val {
                        Value::Object(nested) => {
                            for (inner, v) in nested {
                                let _ = wtr.write_record([
                                    format!("{key}.{inner}"),
                                    format_csv_value(v),
                                ]);
                            }
                        }
                        _ => {
                            let _ = wtr.write_record([key.clone(), format_csv_value(val)]);
                        }
                    }
                }
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    let _ = wtr.write_record([key.clone(), format_csv_value(val)]);
                }
            }
        }
        Value::Array(arr) => {
            write_month_csv(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_month_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, rows: &[Value]) {
    if rows.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = rows.first() {
        let headers: Vec<&str> = MONTH_COLUMNS
            .iter()
            .copied()
            .filter(|c| first.contains_key(*c))
            .collect();
        let _ = wtr.write_record(&headers);

        for row in rows {
            if let Value::Object(map) = row {
                let record: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&record);
            }
        }
    } else {
        for row in rows {
            let _ = wtr.write_record([&format_csv_value(row)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
