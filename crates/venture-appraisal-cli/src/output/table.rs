use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::MONTH_COLUMNS;

/// Format output as tables using the tabled crate.
///
/// An appraisal envelope renders as a metrics table followed by the monthly
/// cash-flow table; a bare projection renders as the monthly table alone.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_envelope_table(result, map);
            } else {
                print_flat_object(value);
            }
        }
        Value::Array(arr) => print_month_table(arr),
        _ => println!("{}", value),
    }
}

fn print_envelope_table(result: &Value, envelope: &serde_json::Map<String, Value>) {
    if let Value::Object(fields) = result {
        let mut builder = Builder::default();
        builder.push_record(["Metric", "Value"]);
        for (key, val) in fields {
            if key == "cash_flows" {
                continue;
            }
            match val {
                // break_even, totals, assessment flatten to dotted rows
                Value::Object(nested) => {
                    for (inner, v) in nested {
                        builder.push_record([format!("{key}.{inner}"), format_value(v)]);
                    }
                }
                _ => {
                    builder.push_record([key.clone(), format_value(val)]);
                }
            }
        }
        println!("{}", Table::from(builder));

        if let Some(Value::Array(flows)) = fields.get("cash_flows") {
            println!();
            print_month_table(flows);
        }
    } else {
        print_flat_object(&Value::Object(envelope.clone()));
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.clone(), format_value(val)]);
        }
        println!("{}", Table::from(builder));
    }
}

fn print_month_table(rows: &[Value]) {
    if rows.is_empty() {
        println!("(empty)");
        return;
    }

    let headers: Vec<&str> = match rows.first() {
        Some(Value::Object(first)) => MONTH_COLUMNS
            .iter()
            .copied()
            .filter(|c| first.contains_key(*c))
            .collect(),
        _ => {
            for row in rows {
                println!("{}", format_value(row));
            }
            return;
        }
    };

    let mut builder = Builder::default();
    builder.push_record(headers.clone());

    for row in rows {
        if let Value::Object(map) = row {
            let record: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_value).unwrap_or_default())
                .collect();
            builder.push_record(record);
        }
    }

    println!("{}", Table::from(builder));
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
