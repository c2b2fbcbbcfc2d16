//! Compliance review stage.
//!
//! Two layers merged into one issue list: deterministic regulatory
//! checks that always run, and an external narrative review that may
//! degrade to a single "manual review required" warning. The result is
//! non-compliant iff any issue is critical.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use crate::capabilities::NarrativeGenerator;
use crate::types::{
    ComplianceIssue, ComplianceResult, IssueSeverity, LoanProgram, ProgramCategory, ProgramId,
    RulesEngineOutput, StateCode, RATE_TOLERANCE,
};

use super::state_limits;

/// SBA program-wide loan ceiling.
const SBA_MAX_LOAN: Decimal = dec!(5000000);

const REVIEW_SYSTEM_PROMPT: &str = "You are a lending compliance analyst. \
Review the term sheet for regulatory concerns beyond the deterministic \
checks already performed. Respond with a single JSON object: {\"issues\": \
[{\"severity\": \"critical\"|\"warning\"|\"info\", \"regulation\": string, \
\"description\": string, \"recommendation\": string}]}. Return an empty \
issues array if nothing further applies.";

/// Run the compliance review.
pub fn review_compliance(
    rules: &RulesEngineOutput,
    program: &LoanProgram,
    state: Option<StateCode>,
    generator: &dyn NarrativeGenerator,
) -> ComplianceResult {
    let mut issues = Vec::new();
    let mut checks_run = Vec::new();

    check_state_usury(rules, program, state, &mut issues, &mut checks_run);
    check_sba_caps(rules, program, &mut issues, &mut checks_run);
    check_tila_estimate(rules, program, &mut issues, &mut checks_run);
    check_state_disclosures(state, &mut issues, &mut checks_run);
    check_prepayment_penalty(rules, program, &mut issues, &mut checks_run);

    // ECOA fair-lending reminder rides on every review
    checks_run.push("ecoa_reg_b".to_string());
    issues.push(ComplianceIssue {
        severity: IssueSeverity::Info,
        regulation: "ECOA / Regulation B".to_string(),
        description: "Adverse action and fair-lending notice obligations apply to this decision"
            .to_string(),
        recommendation: "Issue compliant notices within required timeframes".to_string(),
    });

    let ai_review_issues = external_review(rules, program, generator);
    issues.extend(ai_review_issues.iter().cloned());

    let compliant = !issues
        .iter()
        .any(|i| i.severity == IssueSeverity::Critical);

    log::debug!(
        "compliance({}): {} issues, compliant={}",
        program.id,
        issues.len(),
        compliant
    );

    ComplianceResult {
        compliant,
        issues,
        deterministic_checks: checks_run,
        ai_review_issues,
        reviewed_at: Utc::now(),
    }
}

fn check_state_usury(
    rules: &RulesEngineOutput,
    program: &LoanProgram,
    state: Option<StateCode>,
    issues: &mut Vec<ComplianceIssue>,
    checks_run: &mut Vec<String>,
) {
    let state = match state {
        Some(state) => state,
        None => return,
    };
    checks_run.push("state_usury".to_string());

    let limits = state_limits::usury_limit(state);
    let is_commercial = program.category != ProgramCategory::Residential;
    let (limit, class) = if is_commercial {
        (limits.commercial, "commercial")
    } else {
        (limits.consumer, "consumer")
    };

    if let Some(limit) = limit {
        if rules.rate.total_rate > limit {
            issues.push(ComplianceIssue {
                severity: IssueSeverity::Critical,
                regulation: format!("{} usury statute", state),
                description: format!(
                    "Total rate {:.2}% exceeds the {} {} usury limit of {:.2}%",
                    rules.rate.total_rate * dec!(100),
                    state,
                    class,
                    limit * dec!(100)
                ),
                recommendation:
                    "Reprice below the statutory ceiling or document an applicable exemption"
                        .to_string(),
            });
        }
    }
}

/// SBA 7(a) per-tier rate allowance over prime (variable-rate loans).
fn sba_7a_rate_allowance(amount: Decimal) -> Decimal {
    if amount <= dec!(50000) {
        dec!(0.065)
    } else if amount <= dec!(250000) {
        dec!(0.06)
    } else {
        dec!(0.0275)
    }
}

fn check_sba_caps(
    rules: &RulesEngineOutput,
    program: &LoanProgram,
    issues: &mut Vec<ComplianceIssue>,
    checks_run: &mut Vec<String>,
) {
    match program.id {
        ProgramId::Sba7a => {
            checks_run.push("sba_7a_caps".to_string());
            if rules.approved_amount > SBA_MAX_LOAN {
                issues.push(ComplianceIssue {
                    severity: IssueSeverity::Critical,
                    regulation: "SBA SOP 50 10".to_string(),
                    description: format!(
                        "Approved amount ${} exceeds the SBA 7(a) maximum of $5,000,000",
                        rules.approved_amount
                    ),
                    recommendation: "Reduce the loan amount or move to conventional financing"
                        .to_string(),
                });
            }

            let allowance = sba_7a_rate_allowance(rules.approved_amount);
            let cap = rules.rate.base_rate_value + allowance;
            if rules.rate.total_rate > cap + RATE_TOLERANCE {
                issues.push(ComplianceIssue {
                    severity: IssueSeverity::Critical,
                    regulation: "SBA SOP 50 10".to_string(),
                    description: format!(
                        "Total rate {:.3}% exceeds the SBA maximum of prime plus {:.2}% for this amount",
                        rules.rate.total_rate * dec!(100),
                        allowance * dec!(100)
                    ),
                    recommendation: "Reprice within the SBA tier allowance".to_string(),
                });
            }
        }
        ProgramId::Sba504 => {
            checks_run.push("sba_504_cap".to_string());
            if rules.approved_amount > SBA_MAX_LOAN {
                issues.push(ComplianceIssue {
                    severity: IssueSeverity::Critical,
                    regulation: "SBA SOP 50 10".to_string(),
                    description: format!(
                        "Approved amount ${} exceeds the SBA 504 maximum of $5,000,000",
                        rules.approved_amount
                    ),
                    recommendation:
                        "Verify eligibility for the $5.5M manufacturing/energy exception before proceeding"
                            .to_string(),
                });
            }
        }
        _ => {}
    }
}

fn check_tila_estimate(
    rules: &RulesEngineOutput,
    program: &LoanProgram,
    issues: &mut Vec<ComplianceIssue>,
    checks_run: &mut Vec<String>,
) {
    if program.category != ProgramCategory::Residential {
        return;
    }
    checks_run.push("tila_apr_estimate".to_string());

    if rules.approved_amount <= Decimal::ZERO || rules.term_months == 0 {
        return;
    }

    // Coarse APR estimate: note rate plus fees annualized over the term.
    // Reg Z Appendix J math is out of scope; this flags gross outliers.
    let years = Decimal::from(rules.term_months) / dec!(12);
    let estimated_apr =
        rules.rate.total_rate + rules.total_fees / rules.approved_amount / years;

    if estimated_apr > rules.rate.total_rate * dec!(1.5) {
        issues.push(ComplianceIssue {
            severity: IssueSeverity::Warning,
            regulation: "TILA / Regulation Z".to_string(),
            description: format!(
                "Estimated APR {:.2}% is more than 1.5x the note rate {:.2}%; fee load is high",
                estimated_apr * dec!(100),
                rules.rate.total_rate * dec!(100)
            ),
            recommendation: "Re-examine the fee structure before disclosure".to_string(),
        });
    }
}

fn check_state_disclosures(
    state: Option<StateCode>,
    issues: &mut Vec<ComplianceIssue>,
    checks_run: &mut Vec<String>,
) {
    let state = match state {
        Some(state) => state,
        None => return,
    };
    checks_run.push("state_disclosures".to_string());

    let disclosures = state_limits::required_disclosures(state);
    if !disclosures.is_empty() {
        issues.push(ComplianceIssue {
            severity: IssueSeverity::Info,
            regulation: format!("{} disclosure requirements", state),
            description: format!("Required disclosures: {}", disclosures.join("; ")),
            recommendation: "Deliver each disclosure before consummation".to_string(),
        });
    }
}

fn check_prepayment_penalty(
    rules: &RulesEngineOutput,
    program: &LoanProgram,
    issues: &mut Vec<ComplianceIssue>,
    checks_run: &mut Vec<String>,
) {
    checks_run.push("prepayment_penalty".to_string());

    let covered = program.regulated_by("dodd-frank") || program.regulated_by("atr");
    if covered && rules.prepayment_penalty.is_some() {
        issues.push(ComplianceIssue {
            severity: IssueSeverity::Warning,
            regulation: "Dodd-Frank / ATR".to_string(),
            description: "Prepayment penalty on a covered mortgage is restricted".to_string(),
            recommendation:
                "Confirm the penalty structure satisfies QM limits or remove it".to_string(),
        });
    }
}

/// External narrative review. Shape failures and capability failures both
/// degrade to one "manual review required" warning.
fn external_review(
    rules: &RulesEngineOutput,
    program: &LoanProgram,
    generator: &dyn NarrativeGenerator,
) -> Vec<ComplianceIssue> {
    let prompt = match serde_json::to_string_pretty(rules) {
        Ok(term_sheet) => format!(
            "Program: {} ({})\nRegulations: {}\n\nTerm sheet:\n{}",
            program.name,
            program.id,
            program.applicable_regulations.join(", "),
            term_sheet
        ),
        Err(_) => return vec![manual_review_warning()],
    };

    match generator.generate_json(REVIEW_SYSTEM_PROMPT, &prompt) {
        Ok(value) => match parse_review_issues(&value) {
            Some(issues) => issues,
            None => {
                log::warn!("compliance: external review returned malformed JSON");
                vec![manual_review_warning()]
            }
        },
        Err(err) => {
            log::warn!("compliance: external review unavailable ({})", err);
            vec![manual_review_warning()]
        }
    }
}

fn parse_review_issues(value: &Value) -> Option<Vec<ComplianceIssue>> {
    let items = value.get("issues")?.as_array()?;
    let mut issues = Vec::with_capacity(items.len());
    for item in items {
        let severity: IssueSeverity =
            serde_json::from_value(item.get("severity")?.clone()).ok()?;
        issues.push(ComplianceIssue {
            severity,
            regulation: item.get("regulation")?.as_str()?.to_string(),
            description: item.get("description")?.as_str()?.to_string(),
            recommendation: item
                .get("recommendation")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        });
    }
    Some(issues)
}

fn manual_review_warning() -> ComplianceIssue {
    ComplianceIssue {
        severity: IssueSeverity::Warning,
        regulation: "Compliance review".to_string(),
        description: "Automated compliance narrative review was unavailable".to_string(),
        recommendation: "Manual compliance review required before closing".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{CannedGenerator, FixedRateSource, UnavailableGenerator};
    use crate::catalog;
    use crate::structuring::rules::{run_rules_engine, RulesRequest};
    use crate::types::{Analysis, AnalysisSummary, RiskRating};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn analysis() -> Analysis {
        Analysis {
            summary: AnalysisSummary {
                qualifying_income: dec!(500000),
                global_dscr: Some(dec!(1.6)),
                back_end_dti: None,
                months_of_reserves: dec!(9),
                risk_rating: RiskRating::Low,
            },
            risk_score: 82,
            risk_flags: vec![],
            income: Default::default(),
            dscr: None,
            dti: None,
            liquidity: Default::default(),
            cash_flow: Default::default(),
            business: None,
        }
    }

    fn rules_for(program_id: ProgramId, amount: Decimal) -> RulesEngineOutput {
        let analysis = analysis();
        run_rules_engine(
            &RulesRequest {
                analysis: &analysis,
                program: catalog::program(program_id),
                requested_amount: amount,
                requested_rate: None,
                requested_term_months: None,
                property_value: None,
                collateral_value: None,
            },
            &FixedRateSource::default(),
        )
        .unwrap()
    }

    fn empty_review() -> CannedGenerator {
        CannedGenerator(json!({"issues": []}))
    }

    #[test]
    fn test_usury_violation_is_critical() {
        // S4: force a 22% rate into Arkansas, a 17% commercial ceiling
        let mut rules = rules_for(ProgramId::CommercialCre, dec!(1000000));
        rules.rate.total_rate = dec!(0.22);
        let program = catalog::program(ProgramId::CommercialCre);

        let result =
            review_compliance(&rules, program, Some(StateCode::AR), &empty_review());
        assert!(!result.compliant);
        let usury = result
            .issues
            .iter()
            .find(|i| i.regulation.contains("usury"))
            .unwrap();
        assert_eq!(usury.severity, IssueSeverity::Critical);
        assert!(usury.description.contains("AR"));
    }

    #[test]
    fn test_compliant_deal_carries_only_info() {
        let rules = rules_for(ProgramId::CommercialCre, dec!(1000000));
        let program = catalog::program(ProgramId::CommercialCre);
        let result =
            review_compliance(&rules, program, Some(StateCode::CO), &empty_review());

        assert!(result.compliant);
        assert!(result
            .issues
            .iter()
            .all(|i| i.severity != IssueSeverity::Critical));
        // ECOA reminder always present
        assert!(result.issues.iter().any(|i| i.regulation.contains("ECOA")));
    }

    #[test]
    fn test_sba_rate_cap_flags_excess() {
        let mut rules = rules_for(ProgramId::Sba7a, dec!(400000));
        // Above $350k the allowance is prime + 2.75%
        rules.rate.total_rate = rules.rate.base_rate_value + dec!(0.04);
        let program = catalog::program(ProgramId::Sba7a);

        let result = review_compliance(&rules, program, None, &empty_review());
        assert!(!result.compliant);
    }

    #[test]
    fn test_sba_amount_cap() {
        let mut rules = rules_for(ProgramId::Sba504, dec!(4000000));
        rules.approved_amount = dec!(5500000);
        let program = catalog::program(ProgramId::Sba504);

        let result = review_compliance(&rules, program, None, &empty_review());
        let cap = result
            .issues
            .iter()
            .find(|i| i.description.contains("SBA 504 maximum"))
            .unwrap();
        assert_eq!(cap.severity, IssueSeverity::Critical);
        assert!(cap.recommendation.contains("5.5M"));
    }

    #[test]
    fn test_tila_estimate_flags_fee_heavy_consumer_loan() {
        let mut rules = rules_for(ProgramId::BankStatement, dec!(200000));
        rules.term_months = 12;
        rules.total_fees = dec!(20000); // 10% of principal over one year
        let program = catalog::program(ProgramId::BankStatement);

        let result = review_compliance(&rules, program, None, &empty_review());
        assert!(result
            .issues
            .iter()
            .any(|i| i.regulation.contains("TILA") && i.severity == IssueSeverity::Warning));
    }

    #[test]
    fn test_disclosure_state_info_issue() {
        let rules = rules_for(ProgramId::ConventionalBusiness, dec!(500000));
        let program = catalog::program(ProgramId::ConventionalBusiness);
        let result =
            review_compliance(&rules, program, Some(StateCode::CA), &empty_review());
        assert!(result
            .issues
            .iter()
            .any(|i| i.severity == IssueSeverity::Info && i.description.contains("SB 1235")));
    }

    #[test]
    fn test_prepayment_warning_on_covered_program() {
        let rules = rules_for(ProgramId::Dscr, dec!(500000));
        let program = catalog::program(ProgramId::Dscr);
        let result = review_compliance(&rules, program, None, &empty_review());
        assert!(result
            .issues
            .iter()
            .any(|i| i.regulation.contains("Dodd-Frank")));
    }

    #[test]
    fn test_external_review_failure_degrades_to_warning() {
        let rules = rules_for(ProgramId::ConventionalBusiness, dec!(500000));
        let program = catalog::program(ProgramId::ConventionalBusiness);
        let result = review_compliance(&rules, program, None, &UnavailableGenerator);

        assert_eq!(result.ai_review_issues.len(), 1);
        assert!(result.ai_review_issues[0]
            .recommendation
            .contains("Manual compliance review"));
        // A warning, not a critical: the deal still routes to review, not decline
        assert!(result.compliant);
    }

    #[test]
    fn test_external_review_issues_merge() {
        let rules = rules_for(ProgramId::ConventionalBusiness, dec!(500000));
        let program = catalog::program(ProgramId::ConventionalBusiness);
        let generator = CannedGenerator(json!({
            "issues": [{
                "severity": "warning",
                "regulation": "UDAAP",
                "description": "Marketing materials reference a teaser rate",
                "recommendation": "Align marketing with the final terms"
            }]
        }));
        let result = review_compliance(&rules, program, None, &generator);
        assert_eq!(result.ai_review_issues.len(), 1);
        assert!(result.issues.iter().any(|i| i.regulation == "UDAAP"));
    }

    #[test]
    fn test_malformed_external_review_degrades() {
        let rules = rules_for(ProgramId::ConventionalBusiness, dec!(500000));
        let program = catalog::program(ProgramId::ConventionalBusiness);
        let generator = CannedGenerator(json!({"issues": [{"severity": "catastrophic"}]}));
        let result = review_compliance(&rules, program, None, &generator);
        assert!(result.ai_review_issues[0]
            .recommendation
            .contains("Manual compliance review"));
    }
}
