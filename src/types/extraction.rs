//! Document, extraction-tree, and OCR key/value types.
//!
//! Extractions are self-describing trees produced by an external LLM
//! extractor. The verification core treats them as opaque: leaves are
//! numbers, strings, or booleans, and interior nodes are objects or
//! arrays. `BTreeMap` keys keep traversal order deterministic so repeated
//! runs flatten to identical path lists.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A node in a structured extraction tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Numeric leaf (monetary amounts, counts, rates)
    Number(Decimal),
    /// Boolean leaf (e.g. a rent-roll unit's `occupied` flag)
    Bool(bool),
    /// Text leaf (names, statuses, addresses)
    Text(String),
    /// Repeated sub-records (Schedule C instances, deposits, units)
    Array(Vec<FieldValue>),
    /// Nested record
    Object(BTreeMap<String, FieldValue>),
    /// Explicit null (fields the extractor saw but could not read)
    Null,
}

impl FieldValue {
    /// Build an object node from key/value pairs.
    pub fn object(entries: impl IntoIterator<Item = (&'static str, FieldValue)>) -> Self {
        FieldValue::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    /// Numeric leaf constructor.
    pub fn num(value: Decimal) -> Self {
        FieldValue::Number(value)
    }

    /// Look up a direct child of an object node.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        match self {
            FieldValue::Object(map) => map.get(name),
            _ => None,
        }
    }

    /// Follow a dotted path through nested objects.
    /// Array traversal is explicit via [`FieldValue::array`].
    pub fn path(&self, dotted: &str) -> Option<&FieldValue> {
        let mut node = self;
        for segment in dotted.split('.') {
            node = node.field(segment)?;
        }
        Some(node)
    }

    /// Numeric value of this node, if it is a number leaf.
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text value of this node, if it is a text leaf.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean value of this node, if it is a bool leaf.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric value at a dotted path.
    pub fn number(&self, dotted: &str) -> Option<Decimal> {
        self.path(dotted)?.as_number()
    }

    /// Text value at a dotted path.
    pub fn text(&self, dotted: &str) -> Option<&str> {
        self.path(dotted)?.as_text()
    }

    /// Array elements at a dotted path.
    pub fn array(&self, dotted: &str) -> Option<&[FieldValue]> {
        match self.path(dotted)? {
            FieldValue::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// One key/value pair extracted by the OCR provider from a document page.
///
/// Keys are raw labels as printed (e.g. `"Line 9"`, `"Ending Balance"`).
/// Values are raw strings that may carry `$`, commas, `%`, or `(n)` for
/// negative amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KvPair {
    pub key: String,
    pub value: String,
    /// Provider confidence in [0, 1]
    pub confidence: Decimal,
    /// 1-based page number
    pub page: u32,
}

impl KvPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>, confidence: Decimal, page: u32) -> Self {
        KvPair {
            key: key.into(),
            value: value.into(),
            confidence,
            page,
        }
    }
}

/// Processing status of an ingested document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Uploaded,
    Processing,
    Extracted,
    Verified,
    Failed,
}

/// A borrower document: ingest metadata plus the OCR result and at most
/// one current extraction. Replacing the extraction is a whole-record swap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub doc_type: super::DocType,
    pub file_name: String,
    pub file_size: u64,
    pub status: DocumentStatus,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub ocr: Vec<KvPair>,
    #[serde(default)]
    pub extraction: Option<FieldValue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn sample_tree() -> FieldValue {
        FieldValue::object([
            (
                "income",
                FieldValue::object([
                    ("wages_line1", FieldValue::num(dec!(185000))),
                    ("agi_line11", FieldValue::num(dec!(193750))),
                ]),
            ),
            (
                "scheduleC",
                FieldValue::Array(vec![FieldValue::object([(
                    "netProfit_line31",
                    FieldValue::num(dec!(42000)),
                )])]),
            ),
        ])
    }

    #[test]
    fn test_path_lookup() {
        let tree = sample_tree();
        assert_eq!(tree.number("income.wages_line1"), Some(dec!(185000)));
        assert_eq!(tree.number("income.missing"), None);
        assert_eq!(tree.array("scheduleC").map(|a| a.len()), Some(1));
    }

    #[test]
    fn test_untagged_round_trip() {
        let tree = sample_tree();
        let json = serde_json::to_string(&tree).unwrap();
        let back: FieldValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back.number("income.agi_line11"), Some(dec!(193750)));
    }

    #[test]
    fn test_deserialize_from_plain_json() {
        let tree: FieldValue =
            serde_json::from_str(r#"{"totalAssets": 448500, "name": "Acme LLC", "active": true}"#)
                .unwrap();
        assert_eq!(tree.number("totalAssets"), Some(dec!(448500)));
        assert_eq!(tree.text("name"), Some("Acme LLC"));
        assert_eq!(tree.path("active").and_then(FieldValue::as_bool), Some(true));
    }
}
