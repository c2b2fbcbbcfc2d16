//! Final consistency check.
//!
//! Re-derives every number in the rules output from first principles and
//! compares. This stage deliberately ignores the enhancement: prose can
//! never influence whether the math holds. Errors block approval;
//! warnings route the deal to human review.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{
    CheckSeverity, ComplianceResult, FinalCheckIssue, FinalCheckResult, IssueSeverity,
    LoanProgram, RulesEngineOutput, MONEY_TOLERANCE, RATE_TOLERANCE,
};

use super::rules::{effective_spread_bounds, monthly_payment};

/// LTV slack: protects against representation rounding, nothing more.
const LTV_TOLERANCE: Decimal = dec!(0.001);

/// Run the pure-math re-derivation.
pub fn run_final_check(
    rules: &RulesEngineOutput,
    program: &LoanProgram,
    compliance: &ComplianceResult,
) -> FinalCheckResult {
    let mut issues = Vec::new();
    let constraints = &program.structuring;

    // Payment re-derivation
    let recomputed_payment = monthly_payment(
        rules.approved_amount,
        rules.rate.total_rate,
        rules.amortization_months,
        rules.interest_only,
    );
    if (recomputed_payment - rules.monthly_payment).abs() > MONEY_TOLERANCE {
        issues.push(error(
            "monthly_payment",
            recomputed_payment,
            rules.monthly_payment,
            "Stored payment does not match recomputation from principal, rate, and amortization",
        ));
    }

    // Rate identity
    let rate_sum = rules.rate.base_rate_value + rules.rate.spread;
    if (rules.rate.total_rate - rate_sum).abs() > RATE_TOLERANCE {
        issues.push(error(
            "rate.total_rate",
            rate_sum,
            rules.rate.total_rate,
            "Total rate must equal base rate plus spread",
        ));
    }

    // Spread inside the effective program bounds
    let (min_spread, max_spread) = effective_spread_bounds(program, rules.approved_amount);
    if rules.rate.spread < min_spread - RATE_TOLERANCE
        || rules.rate.spread > max_spread + RATE_TOLERANCE
    {
        issues.push(error(
            "rate.spread",
            max_spread,
            rules.rate.spread,
            "Spread is outside the program's effective range",
        ));
    }

    // Approved amount inside the program's loan range
    if rules.approved_amount < constraints.min_loan_amount {
        issues.push(error(
            "approved_amount",
            constraints.min_loan_amount,
            rules.approved_amount,
            "Approved amount is below the program minimum",
        ));
    }
    if let Some(max) = constraints.max_loan_amount {
        if rules.approved_amount > max {
            issues.push(error(
                "approved_amount",
                max,
                rules.approved_amount,
                "Approved amount exceeds the program maximum",
            ));
        }
    }

    // Term and amortization ceilings
    if rules.term_months > constraints.max_term_months {
        issues.push(error(
            "term_months",
            Decimal::from(constraints.max_term_months),
            Decimal::from(rules.term_months),
            "Term exceeds the program maximum",
        ));
    }
    if !rules.interest_only && rules.amortization_months > constraints.max_amortization_months {
        issues.push(error(
            "amortization_months",
            Decimal::from(constraints.max_amortization_months),
            Decimal::from(rules.amortization_months),
            "Amortization exceeds the program maximum",
        ));
    }

    // LTV ceiling
    if let Some(ltv) = rules.ltv {
        if ltv > constraints.max_ltv + LTV_TOLERANCE {
            issues.push(error(
                "ltv",
                constraints.max_ltv,
                ltv,
                "LTV exceeds the program maximum",
            ));
        }
    }

    // Fee total integrity
    let fee_sum: Decimal = rules.fees.iter().map(|f| f.amount).sum();
    if (rules.total_fees - fee_sum).abs() > dec!(0.01) {
        issues.push(error(
            "total_fees",
            fee_sum,
            rules.total_fees,
            "Total fees do not equal the sum of fee line items",
        ));
    }

    // Structural oddities
    if rules.interest_only && rules.amortization_months > 0 {
        issues.push(warning(
            "amortization_months",
            Decimal::ZERO,
            Decimal::from(rules.amortization_months),
            "Interest-only structure carries a non-zero amortization",
        ));
    }

    // Degenerate terms
    if rules.approved_amount <= Decimal::ZERO {
        issues.push(error(
            "approved_amount",
            constraints.min_loan_amount,
            rules.approved_amount,
            "Approved amount is not positive",
        ));
    }
    if rules.rate.total_rate <= Decimal::ZERO {
        issues.push(error(
            "rate.total_rate",
            rules.rate.base_rate_value,
            rules.rate.total_rate,
            "Total rate is not positive",
        ));
    }
    if rules.term_months == 0 {
        issues.push(error(
            "term_months",
            Decimal::from(constraints.max_term_months),
            Decimal::ZERO,
            "Term is zero",
        ));
    }

    // Critical compliance issues block independently of the compliance stage
    for issue in &compliance.issues {
        if issue.severity == IssueSeverity::Critical {
            issues.push(error(
                "compliance",
                Decimal::ZERO,
                Decimal::ONE,
                &format!("Critical compliance issue: {}", issue.description),
            ));
        }
    }

    // Coverage at the proposed payment
    if constraints.min_dscr > Decimal::ZERO {
        if let Some(projected) = rules.projected_dscr_with_proposed_payment {
            if projected < constraints.min_dscr {
                issues.push(warning(
                    "projected_dscr_with_proposed_payment",
                    constraints.min_dscr,
                    projected,
                    "Projected DSCR at the proposed payment is below the program minimum",
                ));
            }
        }
    }

    let passed = !issues.iter().any(|i| i.severity == CheckSeverity::Error);
    log::debug!(
        "final check({}): {} issues, passed={}",
        program.id,
        issues.len(),
        passed
    );

    FinalCheckResult { passed, issues }
}

fn error(field: &str, expected: Decimal, actual: Decimal, message: &str) -> FinalCheckIssue {
    FinalCheckIssue {
        field: field.to_string(),
        expected,
        actual,
        severity: CheckSeverity::Error,
        message: message.to_string(),
    }
}

fn warning(field: &str, expected: Decimal, actual: Decimal, message: &str) -> FinalCheckIssue {
    FinalCheckIssue {
        field: field.to_string(),
        expected,
        actual,
        severity: CheckSeverity::Warning,
        message: message.to_string(),
    }
}
