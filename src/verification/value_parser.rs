//! Raw value parsing and extraction-tree flattening.
//!
//! OCR providers hand back display strings: `"$1,234.56"`, `"(1,234)"`,
//! `"12.5%"`. The parser normalizes them to signed decimals. The flattener
//! turns an extraction tree into `(dotted.path, value)` pairs so the
//! reconciler can treat every document shape uniformly.

use rust_decimal::Decimal;

use crate::types::FieldValue;

/// Parse a raw OCR or display string into a signed decimal.
///
/// Accepts `$` prefixes, thousands separators, trailing `%` (scaled by
/// 1/100), and accounting-style parenthesized negatives. Returns `None`
/// for anything that is not a clean decimal after stripping.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let mut s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let mut negative = false;
    if s.starts_with('(') && s.ends_with(')') {
        negative = true;
        s = s[1..s.len() - 1].trim();
    }

    let mut percent = false;
    if let Some(stripped) = s.strip_suffix('%') {
        percent = true;
        s = stripped.trim_end();
    }

    let cleaned: String = s.chars().filter(|c| *c != '$' && *c != ',').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    let mut value: Decimal = cleaned.parse().ok()?;
    if negative {
        value = -value;
    }
    if percent {
        value /= Decimal::ONE_HUNDRED;
    }
    Some(value)
}

/// Flatten an extraction tree into `(dotted.path, value)` pairs for every
/// numeric leaf. Array elements use `[i]` index notation, e.g.
/// `scheduleC[0].netProfit_line31`. Non-numeric leaves are skipped.
pub fn flatten_fields(tree: &FieldValue) -> Vec<(String, Decimal)> {
    let mut out = Vec::new();
    walk(tree, String::new(), &mut out);
    out
}

fn walk(node: &FieldValue, path: String, out: &mut Vec<(String, Decimal)>) {
    match node {
        FieldValue::Number(n) => {
            if !path.is_empty() {
                out.push((path, *n));
            }
        }
        FieldValue::Object(map) => {
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                walk(child, child_path, out);
            }
        }
        FieldValue::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                walk(child, format!("{}[{}]", path, i), out);
            }
        }
        FieldValue::Text(_) | FieldValue::Bool(_) | FieldValue::Null => {}
    }
}
