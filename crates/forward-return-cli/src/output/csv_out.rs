use serde_json::{Map, Value};
use std::io;

use super::{format_scalar, nested_tables, result_object};

/// Write output as CSV to stdout.
///
/// A result holding screen rows becomes one line per row; anything else is
/// written as `field,value` pairs with the cash-flow schedule omitted.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let written = match result_object(value) {
        Some(result) => match result.get("rows").and_then(Value::as_array) {
            Some(rows) => write_rows(&mut wtr, rows),
            None => write_fields(&mut wtr, result),
        },
        None => match value {
            Value::Object(map) => write_fields(&mut wtr, map),
            Value::Array(arr) => write_rows(&mut wtr, arr),
            _ => wtr.write_record([format_scalar(value, "")]),
        },
    };

    if let Err(e) = written.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        eprintln!("CSV write error: {}", e);
    }
}

fn write_fields<W: io::Write>(
    wtr: &mut csv::Writer<W>,
    map: &Map<String, Value>,
) -> csv::Result<()> {
    let skipped: Vec<&str> = nested_tables(map).into_iter().map(|(name, _)| name).collect();
    wtr.write_record(["field", "value"])?;
    for (key, val) in map {
        if skipped.contains(&key.as_str()) {
            continue;
        }
        wtr.write_record([key.as_str(), &format_scalar(val, "")])?;
    }
    Ok(())
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = rows.first() else {
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    wtr.write_record(&headers)?;
    for item in rows {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(|v| format_scalar(v, "")).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}
