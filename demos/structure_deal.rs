//! Deal Structuring Example
//!
//! Demonstrates running a deal through the full structuring pipeline:
//! rules, narrative enhancement, compliance review, and the final check.
//!
//! Run with: `cargo run --example structure_deal`

use rust_decimal_macros::dec;

use credit_engine::prelude::*;
use credit_engine::{catalog, AnalysisSummary, CannedGenerator};

fn main() {
    println!("=== Credit Engine Structuring Example ===\n");

    let analysis = Analysis {
        summary: AnalysisSummary {
            qualifying_income: dec!(540000),
            global_dscr: Some(dec!(1.46)),
            back_end_dti: None,
            months_of_reserves: dec!(8),
            risk_rating: RiskRating::Moderate,
        },
        risk_score: 74,
        risk_flags: vec![],
        income: Default::default(),
        dscr: None,
        dti: None,
        liquidity: Default::default(),
        cash_flow: Default::default(),
        business: None,
    };

    let input = StructureDealInput {
        analysis,
        program: catalog::program(ProgramId::Sba7a).clone(),
        borrower_name: "Harbor Light Bakery LLC".to_string(),
        loan_purpose: Some("Equipment and working capital".to_string()),
        property_address: None,
        requested_amount: dec!(240000),
        requested_rate: None,
        requested_term_months: Some(120),
        property_value: None,
        collateral_value: Some(dec!(400000)),
        state: Some(StateCode::CO),
    };

    println!("Deal Input:");
    println!("  Borrower: {}", input.borrower_name);
    println!("  Program: {}", input.program.name);
    println!("  Requested: ${}", input.requested_amount);
    println!("  Collateral: ${}", input.collateral_value.unwrap_or_default());
    println!();

    let rates = FixedRateSource::default();
    // Stand-in for a live model; a real deployment injects its own generator
    let narrative = CannedGenerator(serde_json::json!({
        "custom_covenants": ["Maintain business checking with lender"],
        "additional_conditions": [],
        "special_terms": [],
        "justification": "Seasoned operator with consistent coverage.",
        "issues": []
    }));

    let output = structure_deal(&input, &Capabilities::new(&rates, &narrative))
        .expect("structuring failed");

    println!("Structured Terms:");
    println!("  Status: {}", output.status);
    println!("  Approved amount: ${}", output.rules.approved_amount);
    println!(
        "  Rate: {}% ({} + {}% spread)",
        output.rules.rate.total_rate * dec!(100),
        output.rules.rate.base_rate_kind,
        output.rules.rate.spread * dec!(100),
    );
    println!("  Term: {} months", output.rules.term_months);
    println!("  Payment: ${}/mo", output.rules.monthly_payment);
    println!("  Total fees: ${}", output.rules.total_fees);
    println!("  Projected DSCR: {:?}", output.rules.projected_dscr_with_proposed_payment);
    println!();

    if !output.rules.eligibility.warnings.is_empty() {
        println!("Warnings:");
        for warning in &output.rules.eligibility.warnings {
            println!("  - {}", warning);
        }
        println!();
    }
    if !output.decline_reasons.is_empty() {
        println!("Decline reasons:");
        for reason in &output.decline_reasons {
            println!("  - {}", reason);
        }
        println!();
    }

    println!("Compliance: {} issue(s), compliant={}", output.compliance.issues.len(), output.compliance.compliant);
    println!("Final check passed: {}", output.final_check.passed);
    println!("Justification: {}", output.enhancement.justification);
}
