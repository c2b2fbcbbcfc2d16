//! Integration tests for the credit engine.
//!
//! These exercise the complete verification and structuring pipelines
//! end to end, including the documented scenarios: clean 1040
//! arithmetic, cross-document wage mismatches, SBA tier caps, state
//! usury blocks, interest-only structures, and the balance sheet
//! fundamental equation.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

use credit_engine::{
    catalog, structure_deal, verify_document, Analysis, AnalysisSummary, Capabilities,
    CannedGenerator, DealStatus, DocType, FieldValue, FixedRateSource, KvPair, ProgramId,
    RiskRating, StateCode, StructureDealInput, VerificationRequest,
};

// === Helpers ===

fn analysis(rating: RiskRating, dscr: Option<Decimal>) -> Analysis {
    Analysis {
        summary: AnalysisSummary {
            qualifying_income: dec!(600000),
            global_dscr: dscr,
            back_end_dti: None,
            months_of_reserves: dec!(9),
            risk_rating: rating,
        },
        risk_score: 78,
        risk_flags: vec![],
        income: Default::default(),
        dscr: None,
        dti: None,
        liquidity: Default::default(),
        cash_flow: Default::default(),
        business: None,
    }
}

fn deal_input(program_id: ProgramId, amount: Decimal, rating: RiskRating) -> StructureDealInput {
    StructureDealInput {
        analysis: analysis(rating, Some(dec!(1.8))),
        program: catalog::program(program_id).clone(),
        borrower_name: "Lakeview Ventures LLC".to_string(),
        loan_purpose: Some("Expansion".to_string()),
        property_address: None,
        requested_amount: amount,
        requested_rate: None,
        requested_term_months: None,
        property_value: None,
        collateral_value: None,
        state: None,
    }
}

/// One canned payload that satisfies both narrative contracts.
fn quiet_narrative() -> CannedGenerator {
    CannedGenerator(json!({
        "custom_covenants": [],
        "additional_conditions": [],
        "special_terms": [],
        "justification": "File supports the requested structure.",
        "issues": []
    }))
}

fn kv(key: &str, value: &str, page: u32) -> KvPair {
    KvPair::new(key, value, dec!(0.97), page)
}

// === Scenario: clean 1040 arithmetic ===

#[test]
fn test_clean_1040_arithmetic() {
    let tree: FieldValue = serde_json::from_value(json!({
        "income": {
            "wages_line1": 185000,
            "taxableInterest_line2b": 3450,
            "ordinaryDividends_line3b": 2800,
            "capitalGain_line7": 8500,
            "totalIncome_line9": 199750,
            "adjustments_line10": 6000,
            "agi_line11": 193750,
            "taxableIncome_line15": 166050
        },
        "deductions": {
            "standardOrItemized_line12": 27700
        }
    }))
    .unwrap();

    let report = verify_document(&VerificationRequest {
        doc_type: DocType::Form1040,
        structured_data: tree,
        ocr: vec![],
    })
    .unwrap();

    assert_eq!(report.math_checks.len(), 3);
    assert!(report.math_checks.iter().all(|c| c.passed), "{:#?}", report.math_checks);
}

// === Scenario: cross-document wage mismatch ===

#[test]
fn test_w2_wage_mismatch_across_documents() {
    // The 1040 claims 150k of wages; its attached W-2 summary shows 120k
    let form_1040: FieldValue = serde_json::from_value(json!({
        "income": { "wages_line1": 150000 },
        "w2Summary": [ { "wages_box1": 120000 } ]
    }))
    .unwrap();

    let report = verify_document(&VerificationRequest {
        doc_type: DocType::Form1040,
        structured_data: form_1040,
        ocr: vec![kv("1  Wages, salaries, tips", "150,000", 1)],
    })
    .unwrap();

    // The arithmetic check fails: $30,000 apart against max($1, 2%) = $3,000
    let wage_check = report
        .math_checks
        .iter()
        .find(|c| c.field_path == "income.wages_line1")
        .unwrap();
    assert!(!wage_check.passed);
    assert_eq!(wage_check.difference, dec!(30000));

    // The OCR agrees with what the 1040 itself printed
    let wage_comparison = report
        .comparisons
        .iter()
        .find(|c| c.field_path == "income.wages_line1")
        .unwrap();
    assert!(wage_comparison.matched);

    // The W-2 side agrees with its own box 1
    let w2: FieldValue = serde_json::from_value(json!({ "wages_box1": 120000 })).unwrap();
    let w2_report = verify_document(&VerificationRequest {
        doc_type: DocType::W2,
        structured_data: w2,
        ocr: vec![kv("Box 1", "120,000.00", 1)],
    })
    .unwrap();
    assert!(w2_report.comparisons[0].matched);
}

// === Scenario: SBA tier cap ===

#[test]
fn test_sba_tier_cap_end_to_end() {
    let rates = FixedRateSource::default();
    let narrative = quiet_narrative();
    let input = deal_input(ProgramId::Sba7a, dec!(200000), RiskRating::High);

    let output = structure_deal(&input, &Capabilities::new(&rates, &narrative)).unwrap();

    // $200k sits in the <=250k tier: spread capped at 6.0% even though
    // high risk would otherwise price at the top of an uncapped range
    assert_eq!(output.rules.rate.spread, dec!(0.06));
    assert_eq!(
        output.rules.rate.total_rate,
        output.rules.rate.base_rate_value + dec!(0.06)
    );
    // Spread lands on the 1/800 grid
    assert_eq!((output.rules.rate.spread * dec!(800)) % dec!(1), dec!(0));
    assert!(output.final_check.passed, "{:#?}", output.final_check.issues);
}

// === Scenario: state usury violation ===

#[test]
fn test_arkansas_usury_blocks_deal() {
    // An inflated index pushes the priced rate above the AR 17% ceiling
    let rates = FixedRateSource {
        sofr: dec!(0.20),
        ..FixedRateSource::default()
    };
    let narrative = quiet_narrative();
    let mut input = deal_input(ProgramId::CommercialCre, dec!(1000000), RiskRating::Low);
    input.state = Some(StateCode::AR);

    let output = structure_deal(&input, &Capabilities::new(&rates, &narrative)).unwrap();

    assert!(!output.compliance.compliant);
    assert_eq!(output.status, DealStatus::NeedsReview);
    assert!(output.decline_reasons.iter().any(|r| r.contains("usury")));
    // The final check mirrors the critical issue and blocks independently
    assert!(!output.final_check.passed);
}

// === Scenario: interest-only line of credit ===

#[test]
fn test_interest_only_line_of_credit() {
    let rates = FixedRateSource::default();
    let narrative = quiet_narrative();
    let input = deal_input(ProgramId::LineOfCredit, dec!(250000), RiskRating::Moderate);

    let output = structure_deal(&input, &Capabilities::new(&rates, &narrative)).unwrap();
    let rules = &output.rules;

    assert!(rules.interest_only);
    assert_eq!(rules.amortization_months, 0);
    let expected = (rules.approved_amount * rules.rate.total_rate / dec!(12)).round_dp(2);
    assert_eq!(rules.monthly_payment, expected);
    assert!(output.final_check.passed, "{:#?}", output.final_check.issues);
}

// === Scenario: balance sheet fundamental ===

#[test]
fn test_balance_sheet_fundamental_equation() {
    let balanced: FieldValue = serde_json::from_value(json!({
        "totalAssets": 448500,
        "totalLiabilities": 131500,
        "totalEquity": 317000,
        "totalLiabilitiesAndEquity": 448500
    }))
    .unwrap();
    let report = verify_document(&VerificationRequest {
        doc_type: DocType::BalanceSheet,
        structured_data: balanced,
        ocr: vec![],
    })
    .unwrap();
    assert!(report.math_checks.iter().all(|c| c.passed));

    let unbalanced: FieldValue = serde_json::from_value(json!({
        "totalAssets": 448500,
        "totalLiabilities": 131500,
        "totalEquity": 316500,
        "totalLiabilitiesAndEquity": 448000
    }))
    .unwrap();
    let report = verify_document(&VerificationRequest {
        doc_type: DocType::BalanceSheet,
        structured_data: unbalanced,
        ocr: vec![],
    })
    .unwrap();
    let fundamental = report
        .math_checks
        .iter()
        .filter(|c| c.field_path == "totalAssets")
        .last()
        .unwrap();
    assert!(!fundamental.passed);
    assert_eq!(fundamental.difference, dec!(500));
}

// === Determinism with stubbed capabilities ===

#[test]
fn test_pipeline_is_deterministic_modulo_stamps() {
    let rates = FixedRateSource::default();
    let narrative = quiet_narrative();
    let input = deal_input(ProgramId::ConventionalBusiness, dec!(500000), RiskRating::Low);

    let first = structure_deal(&input, &Capabilities::new(&rates, &narrative)).unwrap();
    let second = structure_deal(&input, &Capabilities::new(&rates, &narrative)).unwrap();

    // Ids and timestamps are the only nondeterministic fields
    assert_eq!(first.rules, second.rules);
    assert_eq!(first.enhancement, second.enhancement);
    assert_eq!(first.compliance.issues, second.compliance.issues);
    assert_eq!(first.final_check, second.final_check);
    assert_eq!(first.status, second.status);
    assert_eq!(first.decline_reasons, second.decline_reasons);
}

// === Comparison cardinality ===

#[test]
fn test_one_comparison_per_meaningful_leaf() {
    let tree: FieldValue = serde_json::from_value(json!({
        "endingBalance": 21950,
        "beginningBalance": 14200.10,
        "totalDeposits": 56000,
        "totalWithdrawals": 48250.10,
        "accountNumber": 123456789,
        "zeroField": 0
    }))
    .unwrap();

    let report = verify_document(&VerificationRequest {
        doc_type: DocType::BankStatementChecking,
        structured_data: tree,
        ocr: vec![kv("Ending Balance", "21,950.00", 2)],
    })
    .unwrap();

    // accountNumber is metadata, zeroField carries no evidence
    assert_eq!(report.comparisons.len(), 4);
    let matched: Vec<_> = report.comparisons.iter().filter(|c| c.matched).collect();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].field_path, "endingBalance");
}

// === Property tests over the rules engine ===

/// Test-local annuity recomputation, independent of the engine's own
/// closed form.
fn recompute_payment(
    principal: Decimal,
    annual_rate: Decimal,
    amortization_months: u32,
    interest_only: bool,
) -> Decimal {
    if principal <= dec!(0) {
        return dec!(0);
    }
    if interest_only || amortization_months == 0 {
        return (principal * annual_rate / dec!(12)).round_dp(2);
    }
    let n = Decimal::from(amortization_months);
    let r = (annual_rate / dec!(12)).round_dp(4);
    if r.is_zero() {
        return (principal / n).round_dp(2);
    }
    let mut factor = dec!(1);
    for _ in 0..amortization_months {
        factor *= dec!(1) + r;
    }
    (principal * r * factor / (factor - dec!(1))).round_dp(2)
}

fn risk_from_index(index: usize) -> RiskRating {
    match index {
        0 => RiskRating::Low,
        1 => RiskRating::Moderate,
        2 => RiskRating::Elevated,
        _ => RiskRating::High,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_rules_output_invariants(
        program_index in 0usize..10,
        amount_fraction in 0u32..=1000,
        risk_index in 0usize..4,
    ) {
        let program = &catalog::all_programs()[program_index];
        let min = program.structuring.min_loan_amount;
        let max = program.structuring.max_loan_amount.unwrap_or(min * dec!(10));
        let amount = (min + (max - min) * Decimal::from(amount_fraction) / dec!(1000)).round_dp(2);

        let rates = FixedRateSource::default();
        let narrative = quiet_narrative();
        let mut input = deal_input(program.id, amount, risk_from_index(risk_index));
        input.program = program.clone();

        let output = structure_deal(&input, &Capabilities::new(&rates, &narrative)).unwrap();
        let rules = &output.rules;

        // Rate identity within 1 bp
        let identity_gap =
            (rules.rate.total_rate - (rules.rate.base_rate_value + rules.rate.spread)).abs();
        prop_assert!(identity_gap <= dec!(0.0001));

        // Spread lands on the 1/800 grid
        prop_assert_eq!((rules.rate.spread * dec!(800)) % dec!(1), dec!(0));

        // Fee total equals the line-item sum to the cent
        let fee_sum: Decimal = rules.fees.iter().map(|f| f.amount).sum();
        prop_assert!((rules.total_fees - fee_sum).abs() <= dec!(0.01));

        // Payment matches an independent recomputation within $1
        let recomputed = recompute_payment(
            rules.approved_amount,
            rules.rate.total_rate,
            rules.amortization_months,
            rules.interest_only,
        );
        prop_assert!((recomputed - rules.monthly_payment).abs() <= dec!(1));

        // Interest-only structures carry no amortization schedule
        if rules.interest_only {
            prop_assert_eq!(rules.amortization_months, 0);
        }

        // Approved amount never exceeds the request
        prop_assert!(rules.approved_amount <= amount);

        // Status discipline: approval requires a clean file
        if output.status == DealStatus::Approved {
            prop_assert!(output.decline_reasons.is_empty());
            prop_assert!(rules.eligibility.passed);
            prop_assert!(output.final_check.passed);
        }
    }
}
