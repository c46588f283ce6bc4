use serde_json::Value;

use super::{format_scalar, result_object};

/// Print just the key answer value from the output.
///
/// An absent IRR prints `—` followed by the reasons, one per line.
pub fn print_minimal(value: &Value) {
    let Some(result) = result_object(value) else {
        println!("{}", format_scalar(value, "null"));
        return;
    };

    if let Some(irr) = result.get("irr") {
        if irr.is_null() {
            println!("—");
            if let Some(Value::Array(warnings)) = value.get("warnings") {
                for w in warnings.iter().filter_map(Value::as_str) {
                    println!("{}", w);
                }
            }
        } else {
            println!("{}", format_scalar(irr, "null"));
        }
        return;
    }

    if let Some(Value::Array(rows)) = result.get("rows") {
        for row in rows {
            let ticker = row.get("ticker").map(|v| format_scalar(v, "")).unwrap_or_default();
            let irr = row.get("irr").map(|v| format_scalar(v, "—")).unwrap_or_default();
            println!("{}\t{}", ticker, irr);
        }
        return;
    }

    for key in ["fiscal_year", "year_fraction"] {
        if let Some(val) = result.get(key) {
            println!("{}: {}", key, format_scalar(val, "null"));
        }
    }
}
