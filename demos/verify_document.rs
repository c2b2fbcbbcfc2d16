//! Document Verification Example
//!
//! Demonstrates dual-path verification of one extracted document: OCR
//! reconciliation plus the arithmetic invariant checks.
//!
//! Run with: `cargo run --example verify_document`

use rust_decimal_macros::dec;

use credit_engine::prelude::*;
use credit_engine::KvPair;

fn main() {
    println!("=== Credit Engine Verification Example ===\n");

    let structured_data: FieldValue = serde_json::from_value(serde_json::json!({
        "beginningBalance": 14200.10,
        "totalDeposits": 56000,
        "totalWithdrawals": 48250.10,
        "endingBalance": 21950,
        "deposits": [
            {"amount": 31000, "description": "Merchant processing"},
            {"amount": 25000, "description": "Wire in"}
        ],
        "accountNumber": 4417021
    }))
    .expect("valid extraction");

    let ocr = vec![
        KvPair::new("Beginning Balance", "$14,200.10", dec!(0.99), 1),
        KvPair::new("Total Deposits and Credits", "$56,000.00", dec!(0.98), 1),
        KvPair::new("Total Withdrawals and Debits", "$48,250.10", dec!(0.97), 1),
        KvPair::new("Ending Balance", "$21,950.00", dec!(0.99), 2),
    ];

    let request = VerificationRequest {
        doc_type: DocType::BankStatementChecking,
        structured_data,
        ocr,
    };

    let report = verify_document(&request).expect("verification failed");

    println!("Comparisons:");
    for comparison in &report.comparisons {
        println!(
            "  {:<40} structured={:<12} ocr={:<12} matched={}",
            comparison.field_path,
            comparison.structured_value,
            comparison
                .textract_value
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string()),
            comparison.matched,
        );
    }

    println!("\nMath checks:");
    for check in &report.math_checks {
        println!(
            "  [{}] {} (expected {}, actual {})",
            if check.passed { "pass" } else { "FAIL" },
            check.description,
            check.expected,
            check.actual,
        );
    }

    let summary = report.summary();
    println!(
        "\nSummary: {}/{} fields corroborated, {}/{} checks passed",
        summary.comparisons_matched,
        summary.comparisons_total,
        summary.checks_passed,
        summary.checks_total,
    );
}
