use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_scalar, nested_tables, result_object};

/// Format output as tables: scalar fields first, then one table per schedule.
pub fn print_table(value: &Value) {
    match result_object(value) {
        Some(result) => {
            print_fields(result);
            for (name, rows) in nested_tables(result) {
                println!("\n{}:", name);
                print_rows(rows);
            }
            print_envelope_notes(value);
        }
        None => match value {
            Value::Object(map) => print_fields(map),
            Value::Array(arr) => print_rows(arr),
            _ => println!("{}", value),
        },
    }
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        if matches!(val, Value::Array(items) if items.first().is_some_and(Value::is_object)) {
            continue;
        }
        builder.push_record([key.as_str(), &format_scalar(val, "—")]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        println!("(empty)");
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(headers.iter().map(String::as_str));
    for item in rows {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h).map(|v| format_scalar(v, "—")).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_envelope_notes(value: &Value) {
    if let Some(Value::Array(warnings)) = value.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = value.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
