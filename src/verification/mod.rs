//! Document verification core.
//!
//! Every extraction is verified two independent ways:
//!
//! | Stage | Module | Purpose |
//! |-------|----------------|--------------------------------------------------|
//! | V1 | `value_parser` | Normalize raw strings, flatten extraction trees |
//! | V2 | `field_labels` | Map structured field paths to printed OCR labels |
//! | V3 | `reconcile` | Per-field structured-vs-OCR agreement |
//! | V4 | `math_checks` | Closed-form arithmetic invariants per form |
//!
//! The stages are pure functions over read-only inputs; nothing here
//! suspends or touches external capabilities.

pub mod field_labels;
pub mod math_checks;
pub mod reconcile;
pub mod value_parser;

pub use field_labels::matches_field;
pub use math_checks::run_math_checks;
pub use reconcile::reconcile;
pub use value_parser::{flatten_fields, parse_amount};

use serde::{Deserialize, Serialize};

use crate::types::{CreditResult, DocType, FieldValue, KvPair, VerificationReport};

/// Input to the verification core: one extracted document plus its OCR run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub doc_type: DocType,
    pub structured_data: FieldValue,
    #[serde(default)]
    pub ocr: Vec<KvPair>,
}

/// Run both verification paths over one extraction.
///
/// Emits one [`crate::types::Comparison`] per non-metadata non-zero numeric
/// leaf, and the arithmetic invariant set for the document type.
pub fn verify_document(request: &VerificationRequest) -> CreditResult<VerificationReport> {
    log::debug!(
        "verification: {} with {} OCR pairs",
        request.doc_type,
        request.ocr.len()
    );

    let comparisons = reconcile(request.doc_type, &request.structured_data, &request.ocr);
    let math_checks = run_math_checks(request.doc_type, &request.structured_data);

    let report = VerificationReport {
        comparisons,
        math_checks,
    };

    let summary = report.summary();
    log::debug!(
        "verification: {}/{} fields matched, {}/{} checks passed",
        summary.comparisons_matched,
        summary.comparisons_total,
        summary.checks_passed,
        summary.checks_total
    );

    Ok(report)
}
