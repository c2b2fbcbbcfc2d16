//! Structuring pipeline orchestrator.
//!
//! Runs the four stages strictly in order: rules, enhancement,
//! compliance, final check. The ordering is a correctness requirement:
//! the enhancer can never see the compliance or final-check results, and
//! the final check observes everything before it. Either a complete
//! [`StructureDealOutput`] is produced (possibly with degraded external
//! stages) or a pipeline-level error leaves the deal untouched.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capabilities::Capabilities;
use crate::types::{
    Analysis, CreditError, CreditResult, DealStatus, IssueSeverity, LoanProgram, StateCode,
    StructureDealOutput,
};

use super::compliance::review_compliance;
use super::enhancement::enhance_structure;
use super::final_check::run_final_check;
use super::rules::{run_rules_engine, RulesRequest};

/// Everything the pipeline needs to structure one deal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureDealInput {
    pub analysis: Analysis,
    pub program: LoanProgram,
    pub borrower_name: String,
    #[serde(default)]
    pub loan_purpose: Option<String>,
    #[serde(default)]
    pub property_address: Option<String>,
    pub requested_amount: Decimal,
    #[serde(default)]
    pub requested_rate: Option<Decimal>,
    #[serde(default)]
    pub requested_term_months: Option<u32>,
    #[serde(default)]
    pub property_value: Option<Decimal>,
    #[serde(default)]
    pub collateral_value: Option<Decimal>,
    #[serde(default)]
    pub state: Option<StateCode>,
}

/// Reject inputs whose shape cannot produce a meaningful term sheet.
/// Weak credit is not a validation failure; nonsense is.
pub fn validate_structure_input(input: &StructureDealInput) -> CreditResult<()> {
    if input.borrower_name.trim().is_empty() {
        return Err(CreditError::validation_field(
            "Borrower name is required",
            "borrower_name",
        ));
    }
    if input.requested_amount <= Decimal::ZERO {
        return Err(CreditError::validation_field(
            "Requested amount must be positive",
            "requested_amount",
        ));
    }
    if let Some(value) = input.property_value {
        if value < Decimal::ZERO {
            return Err(CreditError::validation_field(
                "Property value cannot be negative",
                "property_value",
            ));
        }
    }
    if let Some(value) = input.collateral_value {
        if value < Decimal::ZERO {
            return Err(CreditError::validation_field(
                "Collateral value cannot be negative",
                "collateral_value",
            ));
        }
    }
    Ok(())
}

/// Structure one deal end to end.
pub fn structure_deal(
    input: &StructureDealInput,
    capabilities: &Capabilities<'_>,
) -> CreditResult<StructureDealOutput> {
    validate_structure_input(input)?;

    log::info!(
        "structuring: {} requesting {} under {}",
        input.borrower_name,
        input.requested_amount,
        input.program.id
    );

    // Stage 1: deterministic rules
    let rules = run_rules_engine(
        &RulesRequest {
            analysis: &input.analysis,
            program: &input.program,
            requested_amount: input.requested_amount,
            requested_rate: input.requested_rate,
            requested_term_months: input.requested_term_months,
            property_value: input.property_value,
            collateral_value: input.collateral_value,
        },
        capabilities.rates,
    )?;

    // Stage 2: narrative enhancement (prose only, degrades to empty)
    let enhancement = enhance_structure(&rules, &input.analysis, capabilities.narrative);

    // Stage 3: compliance review
    let compliance =
        review_compliance(&rules, &input.program, input.state, capabilities.narrative);

    // Stage 4: independent re-derivation
    let final_check = run_final_check(&rules, &input.program, &compliance);

    // Decline reasons: eligibility failures, critical compliance, check errors
    let mut decline_reasons: Vec<String> = Vec::new();
    decline_reasons.extend(rules.eligibility.failures.iter().cloned());
    decline_reasons.extend(
        compliance
            .issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Critical)
            .map(|i| i.description.clone()),
    );
    decline_reasons.extend(final_check.errors().map(|i| i.message.clone()));

    let has_warnings = !rules.eligibility.warnings.is_empty()
        || compliance
            .issues
            .iter()
            .any(|i| i.severity == IssueSeverity::Warning)
        || final_check.warnings().next().is_some();

    let status = if !decline_reasons.is_empty() || has_warnings {
        DealStatus::NeedsReview
    } else {
        DealStatus::Approved
    };

    log::info!(
        "structuring: {} -> {} ({} decline reasons)",
        input.borrower_name,
        status,
        decline_reasons.len()
    );

    Ok(StructureDealOutput {
        id: Uuid::new_v4(),
        rules,
        enhancement,
        compliance,
        final_check,
        status,
        decline_reasons,
        structured_at: Utc::now(),
    })
}
