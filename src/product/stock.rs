//! Interpretation of `productBranchStocks`
//!
//! The field is a number for single-branch contexts and a list of per-branch
//! entries otherwise.

use serde_json::Value;

const QUANTITY_FIELDS: [&str; 4] = ["quantity", "amount", "count", "stock"];

/// Whether the stock value signals availability (non-empty, non-zero)
pub fn is_in_stock(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|q| q != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Units in stock, summed over branches when the value is a list
pub fn quantity(value: &Value) -> Option<f64> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(map) => QUANTITY_FIELDS
            .iter()
            .find_map(|field| map.get(*field).and_then(quantity)),
        Value::Array(items) => {
            let counted: Vec<f64> = items.iter().filter_map(quantity).collect();
            if counted.is_empty() {
                if items.is_empty() {
                    Some(0.0)
                } else {
                    None
                }
            } else {
                Some(counted.iter().sum())
            }
        }
    }
}
