//! Structured-vs-OCR reconciliation.
//!
//! For every meaningful numeric leaf in an extraction, find the OCR
//! key/value that best corroborates it. Agreement within $1.00 counts as
//! a match; everything else surfaces with its difference so downstream
//! review can weigh it.

use rust_decimal::Decimal;

use crate::types::{Comparison, DocType, FieldValue, KvPair, MONEY_TOLERANCE};

use super::field_labels::matches_field;
use super::value_parser::{flatten_fields, parse_amount};

/// Field-name segments that carry no monetary evidence. Zero-value leaves
/// are dropped for the same reason: a zero corroborates nothing.
const METADATA_SEGMENTS: &[&str] = &[
    "page", "confidence", "status", "type", "name", "address", "ein", "ssn", "tin",
    "filingStatus", "taxYear", "year", "month", "businessCode", "accountNumber",
    "routingNumber", "description", "label", "category", "date", "id", "index",
    "count", "unit",
];

fn is_metadata_path(path: &str) -> bool {
    let segment = path.rsplit('.').next().unwrap_or(path);
    // Strip a trailing [i] if the leaf sits directly in an array
    let segment = segment.split('[').next().unwrap_or(segment);
    METADATA_SEGMENTS.contains(&segment)
        || segment.starts_with("metadata_")
        || segment.ends_with("_metadata")
}

/// Reconcile one extraction against its OCR key/value pairs.
///
/// Emits exactly one [`Comparison`] per non-metadata, non-zero numeric
/// leaf. When several OCR keys pass the label matcher, the numerically
/// closest value wins; ties break by earliest page, then original OCR
/// order.
pub fn reconcile(doc_type: DocType, tree: &FieldValue, ocr: &[KvPair]) -> Vec<Comparison> {
    // Pre-parse OCR values once; unparseable values carry no evidence
    let parsed: Vec<(&KvPair, Decimal)> = ocr
        .iter()
        .filter_map(|kv| parse_amount(&kv.value).map(|v| (kv, v)))
        .collect();

    let mut comparisons = Vec::new();

    for (path, structured_value) in flatten_fields(tree) {
        if structured_value.is_zero() || is_metadata_path(&path) {
            continue;
        }

        let mut best: Option<(&KvPair, Decimal, Decimal)> = None;
        for (kv, ocr_value) in &parsed {
            if !matches_field(&path, &kv.key) {
                continue;
            }
            let difference = (structured_value - ocr_value).abs();
            let better = match &best {
                None => true,
                Some((best_kv, _, best_diff)) => {
                    difference < *best_diff
                        || (difference == *best_diff && kv.page < best_kv.page)
                }
            };
            if better {
                best = Some((kv, *ocr_value, difference));
            }
        }

        match best {
            Some((kv, ocr_value, difference)) => {
                comparisons.push(Comparison {
                    field_path: path,
                    structured_value,
                    textract_value: Some(ocr_value),
                    textract_key: Some(kv.key.clone()),
                    matched: difference <= MONEY_TOLERANCE,
                    difference,
                    page: Some(kv.page),
                });
            }
            None => {
                log::debug!("reconcile({}): no OCR label for {}", doc_type, path);
                comparisons.push(Comparison::unmatched(path, structured_value));
            }
        }
    }

    comparisons
}
