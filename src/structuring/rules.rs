//! Deterministic rules engine.
//!
//! Every numeric deal term originates here and nowhere else. Eligibility
//! findings accumulate as data; the engine never throws on a weak file.
//!
//! # Algorithm
//! 1. Eligibility (DSCR, DTI, amount range, LTV, risk/reserve warnings)
//! 2. Approved amount and LTV
//! 3. Rate: base index + risk-interpolated spread on the 1/800 grid,
//!    with the SBA 7(a) per-amount tier cap overriding the catalog range
//! 4. Term and amortization
//! 5. Monthly payment (closed form)
//! 6. Fees
//! 7. Covenants and closing conditions
//! 8. Projected DSCR at the proposed payment

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::capabilities::{FixedRateSource, RateSource};
use crate::types::{
    Analysis, Condition, Covenant, CovenantSource, CreditResult, DecimalExt, Eligibility,
    FeeKind, FeeLineItem, LoanProgram, ProgramId, RateQuote, RiskRating, RulesEngineOutput,
};

/// Inputs the rules engine derives a term sheet from.
#[derive(Debug, Clone, Copy)]
pub struct RulesRequest<'a> {
    pub analysis: &'a Analysis,
    pub program: &'a LoanProgram,
    pub requested_amount: Decimal,
    pub requested_rate: Option<Decimal>,
    pub requested_term_months: Option<u32>,
    pub property_value: Option<Decimal>,
    pub collateral_value: Option<Decimal>,
}

/// Run the rules engine.
pub fn run_rules_engine(
    request: &RulesRequest<'_>,
    rates: &dyn RateSource,
) -> CreditResult<RulesEngineOutput> {
    let program = request.program;
    let rules = &program.structuring;

    // === Step 1: Eligibility ===
    let eligibility = evaluate_eligibility(request);

    // === Step 2: Approved amount and LTV ===
    let mut approved_amount = request.requested_amount;
    if let Some(max) = rules.max_loan_amount {
        approved_amount = approved_amount.min(max);
    }
    if let Some(collateral) = request.collateral_value {
        if collateral > Decimal::ZERO {
            approved_amount = approved_amount.min((collateral * rules.max_ltv).round_money());
        }
    }
    let ltv = request.collateral_value.and_then(|collateral| {
        if collateral > Decimal::ZERO {
            Some((approved_amount / collateral).round_payment())
        } else {
            None
        }
    });

    // === Step 3: Rate ===
    let base_rate_value = lookup_base_rate(program, rates);
    let spread = select_spread(program, approved_amount, request.analysis.summary.risk_rating);
    let total_rate = base_rate_value + spread;

    if let Some(requested) = request.requested_rate {
        if requested != total_rate {
            log::debug!(
                "rules: requested rate {} ignored; engine priced {}",
                requested,
                total_rate
            );
        }
    }

    // === Step 4: Term / amortization ===
    let term_months = request
        .requested_term_months
        .unwrap_or(rules.max_term_months)
        .min(rules.max_term_months);
    let amortization_months = if rules.interest_only {
        0
    } else {
        rules.max_amortization_months
    };

    // === Step 5: Monthly payment ===
    let monthly_payment = monthly_payment(
        approved_amount,
        total_rate,
        amortization_months,
        rules.interest_only,
    );

    // === Step 6: Fees ===
    let fees: Vec<FeeLineItem> = program
        .standard_fees
        .iter()
        .map(|fee| FeeLineItem {
            name: fee.name.clone(),
            description: fee.description.clone(),
            amount: match fee.kind {
                FeeKind::Flat => fee.value,
                FeeKind::Percent => (approved_amount * fee.value).round_money(),
            },
        })
        .collect();
    let total_fees: Decimal = fees.iter().map(|f| f.amount).sum();

    // === Step 7: Covenants / conditions ===
    let covenants = program
        .standard_covenants
        .iter()
        .map(|text| Covenant {
            text: text.clone(),
            source: CovenantSource::ProgramStandard,
        })
        .collect();
    let conditions = build_conditions(program);

    // === Step 8: Projected coverage ===
    let qualifying_income = request.analysis.summary.qualifying_income;
    let projected_dscr = if qualifying_income > Decimal::ZERO && monthly_payment > Decimal::ZERO {
        Some((qualifying_income / dec!(12) / monthly_payment).round_payment())
    } else {
        None
    };

    log::debug!(
        "rules({}): approved {} at {} over {} months, payment {}",
        program.id,
        approved_amount,
        total_rate,
        term_months,
        monthly_payment
    );

    Ok(RulesEngineOutput {
        eligibility,
        approved_amount,
        ltv,
        rate: RateQuote {
            base_rate_kind: rules.base_rate,
            base_rate_value,
            spread,
            total_rate,
        },
        term_months,
        amortization_months,
        monthly_payment,
        interest_only: rules.interest_only,
        prepayment_penalty: rules.prepayment_penalty.clone(),
        personal_guaranty: rules.requires_personal_guaranty,
        requires_appraisal: rules.requires_appraisal,
        covenants,
        conditions,
        fees,
        total_fees,
        projected_dscr_with_proposed_payment: projected_dscr,
    })
}

/// Step 1: accumulate failures and warnings; never throw.
fn evaluate_eligibility(request: &RulesRequest<'_>) -> Eligibility {
    let rules = &request.program.structuring;
    let summary = &request.analysis.summary;
    let mut failures = Vec::new();
    let mut warnings = Vec::new();

    // DSCR
    if rules.min_dscr > Decimal::ZERO {
        match summary.global_dscr {
            None => warnings.push(format!(
                "Global DSCR unavailable; program requires at least {:.2}",
                rules.min_dscr
            )),
            Some(dscr) if dscr < rules.min_dscr => failures.push(format!(
                "Global DSCR {:.2} below program minimum {:.2}",
                dscr, rules.min_dscr
            )),
            Some(dscr) if dscr < rules.min_dscr * dec!(1.1) => warnings.push(format!(
                "Limited DSCR cushion: {:.2} against minimum {:.2}",
                dscr, rules.min_dscr
            )),
            Some(_) => {}
        }
    }

    // DTI
    if rules.max_dti > Decimal::ZERO {
        match summary.back_end_dti {
            None => warnings.push(format!(
                "Back-end DTI unavailable; program caps DTI at {:.2}",
                rules.max_dti
            )),
            Some(dti) if dti > rules.max_dti => failures.push(format!(
                "Back-end DTI {:.2} above program maximum {:.2}",
                dti, rules.max_dti
            )),
            Some(dti) if dti > rules.max_dti * dec!(0.9) => warnings.push(format!(
                "Back-end DTI {:.2} near program maximum {:.2}",
                dti, rules.max_dti
            )),
            Some(_) => {}
        }
    }

    // Loan amount range
    if request.requested_amount < rules.min_loan_amount {
        failures.push(format!(
            "Requested amount ${} below program minimum ${}",
            request.requested_amount, rules.min_loan_amount
        ));
    }
    if let Some(max) = rules.max_loan_amount {
        if request.requested_amount > max {
            failures.push(format!(
                "Requested amount ${} above program maximum ${}",
                request.requested_amount, max
            ));
        }
    }

    // LTV against the stated property value
    if let Some(property_value) = request.property_value {
        if property_value > Decimal::ZERO {
            let ltv = request.requested_amount / property_value;
            if ltv > rules.max_ltv {
                failures.push(format!(
                    "LTV {:.2} exceeds program maximum {:.2}",
                    ltv, rules.max_ltv
                ));
            }
        }
    }

    // Soft signals
    if matches!(summary.risk_rating, RiskRating::Elevated | RiskRating::High) {
        warnings.push(format!("Risk rating is {}", summary.risk_rating));
    }
    if summary.months_of_reserves < dec!(3) {
        warnings.push(format!(
            "Reserves of {:.1} months below the 3-month guideline",
            summary.months_of_reserves
        ));
    }

    Eligibility {
        passed: failures.is_empty(),
        failures,
        warnings,
    }
}

/// Look up the program's index. A dead rate feed degrades to the fixed
/// fallback rather than failing the deal.
fn lookup_base_rate(program: &LoanProgram, rates: &dyn RateSource) -> Decimal {
    let kind = program.structuring.base_rate;
    match rates.base_rate(kind) {
        Ok(rate) => rate,
        Err(err) => {
            log::warn!("rules: rate source failed for {} ({}); using fallback", kind, err);
            let fallback = FixedRateSource::default();
            match kind {
                crate::types::BaseRateKind::Prime => fallback.prime,
                crate::types::BaseRateKind::Sofr => fallback.sofr,
                crate::types::BaseRateKind::Treasury => fallback.treasury,
            }
        }
    }
}

/// SBA 7(a) maximum spread over prime, by approved amount.
fn sba_7a_tier_max(approved_amount: Decimal) -> Decimal {
    if approved_amount <= dec!(50000) {
        dec!(0.065)
    } else if approved_amount <= dec!(250000) {
        dec!(0.06)
    } else if approved_amount <= dec!(350000) {
        dec!(0.045)
    } else {
        dec!(0.03)
    }
}

/// Effective spread bounds for a program at a given approved amount.
/// For SBA 7(a) the tier cap overrides the catalog range; the final
/// check re-derives against the same bounds.
pub(crate) fn effective_spread_bounds(
    program: &LoanProgram,
    approved_amount: Decimal,
) -> (Decimal, Decimal) {
    let rules = &program.structuring;
    if program.id == ProgramId::Sba7a {
        (rules.min_spread, sba_7a_tier_max(approved_amount))
    } else {
        (rules.min_spread, rules.max_spread)
    }
}

/// Step 3: risk-interpolated spread, snapped to the 1/800 grid, clamped
/// into the effective bounds so grid rounding can never breach a cap.
fn select_spread(program: &LoanProgram, approved_amount: Decimal, rating: RiskRating) -> Decimal {
    let (min, max) = effective_spread_bounds(program, approved_amount);
    let raw = min + rating.spread_factor() * (max - min);
    raw.round_rate_grid().clamp(min, max)
}

/// Step 5: closed-form monthly payment.
///
/// - Non-positive principal pays nothing.
/// - Interest-only (or zero amortization) pays `P * rate / 12`.
/// - Zero rate amortizes linearly.
/// - Otherwise the standard annuity formula
///   `P * r(1+r)^n / ((1+r)^n - 1)` with `r = rate/12`.
///
/// Intermediate math keeps four decimals; the exposed payment is cents.
pub(crate) fn monthly_payment(
    principal: Decimal,
    annual_rate: Decimal,
    amortization_months: u32,
    interest_only: bool,
) -> Decimal {
    if principal <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    if interest_only || amortization_months == 0 {
        return (principal * annual_rate / dec!(12)).round_payment().round_money();
    }

    let n = Decimal::from(amortization_months);
    let r = (annual_rate / dec!(12)).round_payment();
    if r.is_zero() {
        return (principal / n).round_money();
    }

    let one_plus_r_n = power_decimal(Decimal::ONE + r, amortization_months);
    let payment = principal * r * one_plus_r_n / (one_plus_r_n - Decimal::ONE);
    payment.round_payment().round_money()
}

/// `(1 + r)^n` by square-and-multiply, keeping Decimal precision.
fn power_decimal(base: Decimal, exp: u32) -> Decimal {
    let mut result = Decimal::ONE;
    let mut current = base;
    let mut remaining = exp;

    while remaining > 0 {
        if remaining % 2 == 1 {
            result *= current;
        }
        current *= current;
        remaining /= 2;
    }

    result
}

/// Step 7: closing conditions derived from program flags only.
fn build_conditions(program: &LoanProgram) -> Vec<Condition> {
    let rules = &program.structuring;
    let mut conditions = Vec::new();

    if rules.requires_appraisal {
        conditions.push(Condition::new(
            "Appraisal from an approved appraiser dated within 120 days of closing",
        ));
        conditions.push(Condition::new(
            "Title insurance and hazard insurance naming lender as loss payee",
        ));
        conditions.push(Condition::new(
            "Flood zone determination; flood insurance if in a special hazard area",
        ));
    }
    if rules.requires_personal_guaranty {
        conditions.push(Condition::new(
            "Unconditional personal guaranty from all owners of 20% or more",
        ));
    }
    if matches!(program.id, ProgramId::Sba7a | ProgramId::Sba504) {
        conditions.push(Condition::new(
            "Executed SBA Authorization prior to first disbursement",
        ));
    }
    if !rules.collateral_types.is_empty() {
        conditions.push(Condition::new(
            "UCC-1 filing or mortgage recording perfecting lien on all pledged collateral",
        ));
    }
    conditions.push(Condition::new(
        "Satisfactory BSA/AML identity verification for all borrowers and guarantors",
    ));
    conditions.push(Condition::new(
        "Clear OFAC screening for all borrowers and guarantors",
    ));
    conditions.push(Condition::new(
        "Annual financial reporting per the loan agreement",
    ));

    conditions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::types::{AnalysisSummary, ProgramId};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn analysis(rating: RiskRating, dscr: Option<Decimal>) -> Analysis {
        Analysis {
            summary: AnalysisSummary {
                qualifying_income: dec!(420000),
                global_dscr: dscr,
                back_end_dti: None,
                months_of_reserves: dec!(8),
                risk_rating: rating,
            },
            risk_score: 70,
            risk_flags: vec![],
            income: Default::default(),
            dscr: None,
            dti: None,
            liquidity: Default::default(),
            cash_flow: Default::default(),
            business: None,
        }
    }

    fn request<'a>(
        analysis: &'a Analysis,
        program: &'a LoanProgram,
        amount: Decimal,
    ) -> RulesRequest<'a> {
        RulesRequest {
            analysis,
            program,
            requested_amount: amount,
            requested_rate: None,
            requested_term_months: None,
            property_value: None,
            collateral_value: None,
        }
    }

    #[test]
    fn test_payment_standard_amortization() {
        // $20,000 at 6% over 60 months is about $386.66
        let payment = monthly_payment(dec!(20000), dec!(0.06), 60, false);
        assert!(payment > dec!(386) && payment < dec!(387), "payment {}", payment);
    }

    #[test]
    fn test_payment_zero_rate_is_linear() {
        assert_eq!(monthly_payment(dec!(12000), dec!(0), 60, false), dec!(200));
    }

    #[test]
    fn test_payment_interest_only() {
        // S5: 250,000 * 0.095 / 12
        assert_eq!(monthly_payment(dec!(250000), dec!(0.095), 0, true), dec!(1979.17));
    }

    #[test]
    fn test_payment_non_positive_principal() {
        assert_eq!(monthly_payment(dec!(0), dec!(0.08), 360, false), dec!(0));
        assert_eq!(monthly_payment(dec!(-5), dec!(0.08), 360, false), dec!(0));
    }

    #[test_case(dec!(50000), dec!(0.065); "first tier")]
    #[test_case(dec!(200000), dec!(0.06); "second tier")]
    #[test_case(dec!(350000), dec!(0.045); "third tier")]
    #[test_case(dec!(1000000), dec!(0.03); "above tiers")]
    fn test_sba_tier_caps(amount: Decimal, expected: Decimal) {
        assert_eq!(sba_7a_tier_max(amount), expected);
    }

    #[test]
    fn test_sba_high_risk_spread_respects_tier_cap() {
        // S3: $200k high risk caps at 6.0% over prime
        let analysis = analysis(RiskRating::High, Some(dec!(1.5)));
        let program = catalog::program(ProgramId::Sba7a);
        let output = run_rules_engine(
            &request(&analysis, program, dec!(200000)),
            &FixedRateSource::default(),
        )
        .unwrap();

        assert_eq!(output.rate.spread, dec!(0.06));
        assert_eq!(output.rate.total_rate, dec!(0.135)); // prime 7.5% + 6.0%
        // Grid check: spread is a whole number of 1/800 steps
        assert_eq!(output.rate.spread, output.rate.spread.round_rate_grid());
    }

    #[test]
    fn test_spread_interpolates_by_risk() {
        let program = catalog::program(ProgramId::CommercialCre);
        let low = analysis(RiskRating::Low, Some(dec!(1.6)));
        let high = analysis(RiskRating::High, Some(dec!(1.6)));
        let rates = FixedRateSource::default();

        let low_out =
            run_rules_engine(&request(&low, program, dec!(1000000)), &rates).unwrap();
        let high_out =
            run_rules_engine(&request(&high, program, dec!(1000000)), &rates).unwrap();

        assert_eq!(low_out.rate.spread, dec!(0.0225));
        assert_eq!(high_out.rate.spread, dec!(0.045));
        assert!(low_out.rate.total_rate < high_out.rate.total_rate);
    }

    #[test]
    fn test_eligibility_dscr_failure() {
        let analysis = analysis(RiskRating::Moderate, Some(dec!(1.05)));
        let program = catalog::program(ProgramId::CommercialCre);
        let output = run_rules_engine(
            &request(&analysis, program, dec!(1000000)),
            &FixedRateSource::default(),
        )
        .unwrap();

        assert!(!output.eligibility.passed);
        assert!(output.eligibility.failures[0].contains("1.05"));
    }

    #[test]
    fn test_eligibility_dscr_cushion_warning() {
        // 1.30 against a 1.25 floor: passes with a cushion warning
        let analysis = analysis(RiskRating::Moderate, Some(dec!(1.30)));
        let program = catalog::program(ProgramId::CommercialCre);
        let output = run_rules_engine(
            &request(&analysis, program, dec!(1000000)),
            &FixedRateSource::default(),
        )
        .unwrap();

        assert!(output.eligibility.passed);
        assert!(output
            .eligibility
            .warnings
            .iter()
            .any(|w| w.contains("cushion")));
    }

    #[test]
    fn test_approved_amount_capped_by_collateral() {
        let analysis = analysis(RiskRating::Low, Some(dec!(1.6)));
        let program = catalog::program(ProgramId::CommercialCre);
        let mut req = request(&analysis, program, dec!(1000000));
        req.collateral_value = Some(dec!(1000000));
        let output = run_rules_engine(&req, &FixedRateSource::default()).unwrap();

        // Capped at 75% of collateral, never inflated back up
        assert_eq!(output.approved_amount, dec!(750000));
        assert_eq!(output.ltv, Some(dec!(0.75)));
    }

    #[test]
    fn test_fees_and_totals() {
        let analysis = analysis(RiskRating::Low, Some(dec!(1.6)));
        let program = catalog::program(ProgramId::CommercialCre);
        let output = run_rules_engine(
            &request(&analysis, program, dec!(1000000)),
            &FixedRateSource::default(),
        )
        .unwrap();

        // 1% origination + $4,500 appraisal + $2,800 environmental
        assert_eq!(output.total_fees, dec!(17300));
        let summed: Decimal = output.fees.iter().map(|f| f.amount).sum();
        assert_eq!(output.total_fees, summed);
    }

    #[test]
    fn test_interest_only_program_zeroes_amortization() {
        let analysis = analysis(RiskRating::Moderate, Some(dec!(1.4)));
        let program = catalog::program(ProgramId::LineOfCredit);
        let output = run_rules_engine(
            &request(&analysis, program, dec!(250000)),
            &FixedRateSource::default(),
        )
        .unwrap();

        assert!(output.interest_only);
        assert_eq!(output.amortization_months, 0);
        let expected =
            (output.approved_amount * output.rate.total_rate / dec!(12)).round_money();
        assert_eq!(output.monthly_payment, expected);
    }

    #[test]
    fn test_projected_dscr() {
        let analysis = analysis(RiskRating::Low, Some(dec!(1.6)));
        let program = catalog::program(ProgramId::ConventionalBusiness);
        let output = run_rules_engine(
            &request(&analysis, program, dec!(500000)),
            &FixedRateSource::default(),
        )
        .unwrap();

        let projected = output.projected_dscr_with_proposed_payment.unwrap();
        let expected = (dec!(420000) / dec!(12) / output.monthly_payment).round_payment();
        assert_eq!(projected, expected);
    }

    #[test]
    fn test_failing_rate_source_degrades_to_fallback() {
        struct DeadFeed;
        impl RateSource for DeadFeed {
            fn base_rate(
                &self,
                _kind: crate::types::BaseRateKind,
            ) -> CreditResult<Decimal> {
                Err(crate::types::CreditError::capability("rate_source", "timeout"))
            }
        }

        let analysis = analysis(RiskRating::Low, Some(dec!(1.6)));
        let program = catalog::program(ProgramId::ConventionalBusiness);
        let output =
            run_rules_engine(&request(&analysis, program, dec!(500000)), &DeadFeed).unwrap();

        assert_eq!(output.rate.base_rate_value, dec!(0.075));
    }

    #[test]
    fn test_sba_conditions_include_authorization() {
        let analysis = analysis(RiskRating::Moderate, Some(dec!(1.4)));
        let program = catalog::program(ProgramId::Sba7a);
        let output = run_rules_engine(
            &request(&analysis, program, dec!(300000)),
            &FixedRateSource::default(),
        )
        .unwrap();

        assert!(output
            .conditions
            .iter()
            .any(|c| c.text.contains("SBA Authorization")));
        assert!(output
            .covenants
            .iter()
            .all(|c| c.source == CovenantSource::ProgramStandard));
    }
}
