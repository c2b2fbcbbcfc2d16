//! Arithmetic invariant engine.
//!
//! Every document type carries a curated set of closed-form equations
//! (sums, differences, ratios) evaluated against the structured
//! extraction. Each equation yields one [`MathCheck`]; failures are data,
//! never errors.
//!
//! Skip rule: a derived-subtotal check whose *actual* field is absent or
//! zero is skipped rather than failed — forms legitimately omit lines.
//! Checks documented as mandatory fire regardless.

mod business_returns;
mod form_1040;
mod statements;

use rust_decimal::Decimal;

use crate::types::{DocType, FieldValue, MathCheck};

/// Evaluate the invariant set for one document type.
pub fn run_math_checks(doc_type: DocType, tree: &FieldValue) -> Vec<MathCheck> {
    let checks = match doc_type {
        DocType::Form1040 => form_1040::checks(tree),
        DocType::Form1120 | DocType::Form1120s | DocType::Form1065 => {
            business_returns::checks(doc_type, tree)
        }
        DocType::ScheduleK1 => business_returns::k1_checks(tree),
        DocType::BankStatementChecking | DocType::BankStatementSavings => {
            statements::bank_statement_checks(tree)
        }
        DocType::ProfitAndLoss => statements::profit_and_loss_checks(tree),
        DocType::BalanceSheet => statements::balance_sheet_checks(tree),
        DocType::RentRoll => statements::rent_roll_checks(tree),
        DocType::W2 | DocType::Other => Vec::new(),
    };

    log::debug!(
        "math checks({}): {}/{} passed",
        doc_type,
        checks.iter().filter(|c| c.passed).count(),
        checks.len()
    );
    checks
}

// === Shared tree-reading helpers ===

/// Numeric value at a dotted path, defaulting absent fields to zero.
pub(crate) fn val(tree: &FieldValue, path: &str) -> Decimal {
    tree.number(path).unwrap_or(Decimal::ZERO)
}

/// Whether a numeric leaf exists at the path.
pub(crate) fn has(tree: &FieldValue, path: &str) -> bool {
    tree.number(path).is_some()
}

/// Sum the named direct children of a node, treating absences as zero.
pub(crate) fn sum_fields(node: &FieldValue, fields: &[&str]) -> Decimal {
    fields
        .iter()
        .map(|f| node.number(f).unwrap_or(Decimal::ZERO))
        .sum()
}

/// Sum one numeric field across every element of an array node.
pub(crate) fn sum_array(tree: &FieldValue, array_path: &str, field: &str) -> Decimal {
    tree.array(array_path)
        .map(|items| {
            items
                .iter()
                .map(|item| item.number(field).unwrap_or(Decimal::ZERO))
                .sum()
        })
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_helpers() {
        let tree = FieldValue::object([
            ("a", FieldValue::num(dec!(10))),
            ("b", FieldValue::num(dec!(5))),
            (
                "items",
                FieldValue::Array(vec![
                    FieldValue::object([("amount", FieldValue::num(dec!(1)))]),
                    FieldValue::object([("amount", FieldValue::num(dec!(2)))]),
                ]),
            ),
        ]);
        assert_eq!(val(&tree, "a"), dec!(10));
        assert_eq!(val(&tree, "missing"), dec!(0));
        assert!(has(&tree, "b"));
        assert!(!has(&tree, "items"));
        assert_eq!(sum_fields(&tree, &["a", "b", "missing"]), dec!(15));
        assert_eq!(sum_array(&tree, "items", "amount"), dec!(3));
    }

    #[test]
    fn test_unknown_doc_types_produce_no_checks() {
        let tree = FieldValue::object([("anything", FieldValue::num(dec!(1)))]);
        assert!(run_math_checks(DocType::Other, &tree).is_empty());
        assert!(run_math_checks(DocType::W2, &tree).is_empty());
    }
}
