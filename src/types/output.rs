//! Verification and structuring results.
//!
//! The numeric/narrative separation is structural here: every number a
//! deal carries lives in `RulesEngineOutput`, and `AiEnhancement` has no
//! numeric field at all. The final check re-derives the numbers without
//! looking at the enhancement.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use super::{BaseRateKind, MONEY_TOLERANCE};

// ============================================================================
// VERIFICATION OUTPUTS
// ============================================================================

/// One structured-vs-OCR field reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Dotted path of the structured field, e.g. `income.totalIncome_line9`
    pub field_path: String,
    pub structured_value: Decimal,
    /// Best OCR value found, parsed; `None` when no OCR key matched
    pub textract_value: Option<Decimal>,
    /// Raw OCR key the value came from
    pub textract_key: Option<String>,
    pub matched: bool,
    /// `|structured - ocr|`, or `|structured|` when nothing matched
    pub difference: Decimal,
    #[serde(default)]
    pub page: Option<u32>,
}

impl Comparison {
    /// A comparison for a field no OCR key matched.
    pub fn unmatched(field_path: String, structured_value: Decimal) -> Self {
        Comparison {
            field_path,
            structured_value,
            textract_value: None,
            textract_key: None,
            matched: false,
            difference: structured_value.abs(),
            page: None,
        }
    }
}

/// One arithmetic-invariant evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathCheck {
    pub field_path: String,
    pub description: String,
    pub expected: Decimal,
    pub actual: Decimal,
    pub difference: Decimal,
    pub passed: bool,
}

impl MathCheck {
    /// Evaluate `actual` against `expected` with an absolute tolerance.
    pub fn absolute(
        field_path: impl Into<String>,
        description: impl Into<String>,
        expected: Decimal,
        actual: Decimal,
        tolerance: Decimal,
    ) -> Self {
        let difference = (actual - expected).abs();
        MathCheck {
            field_path: field_path.into(),
            description: description.into(),
            expected,
            actual,
            difference,
            passed: difference <= tolerance,
        }
    }

    /// Evaluate with tolerance `max($1, relative * |expected|)`.
    pub fn relative(
        field_path: impl Into<String>,
        description: impl Into<String>,
        expected: Decimal,
        actual: Decimal,
        relative: Decimal,
    ) -> Self {
        let tolerance = (expected.abs() * relative).max(MONEY_TOLERANCE);
        Self::absolute(field_path, description, expected, actual, tolerance)
    }
}

/// Aggregated pass/fail counts for a verification run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub comparisons_total: usize,
    pub comparisons_matched: usize,
    /// Matched / total, as a fraction; 1 when there were no comparisons
    pub comparison_match_rate: Decimal,
    pub checks_total: usize,
    pub checks_passed: usize,
    pub check_pass_rate: Decimal,
}

/// Output of the verification core for one extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub comparisons: Vec<Comparison>,
    pub math_checks: Vec<MathCheck>,
}

impl VerificationReport {
    pub fn summary(&self) -> VerificationSummary {
        let comparisons_total = self.comparisons.len();
        let comparisons_matched = self.comparisons.iter().filter(|c| c.matched).count();
        let checks_total = self.math_checks.len();
        let checks_passed = self.math_checks.iter().filter(|c| c.passed).count();

        let rate = |num: usize, den: usize| {
            if den == 0 {
                Decimal::ONE
            } else {
                Decimal::from(num as u64) / Decimal::from(den as u64)
            }
        };

        VerificationSummary {
            comparisons_total,
            comparisons_matched,
            comparison_match_rate: rate(comparisons_matched, comparisons_total),
            checks_total,
            checks_passed,
            check_pass_rate: rate(checks_passed, checks_total),
        }
    }
}

// ============================================================================
// RULES ENGINE OUTPUT
// ============================================================================

/// Eligibility result: accumulated, never thrown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Eligibility {
    pub passed: bool,
    pub failures: Vec<String>,
    pub warnings: Vec<String>,
}

/// The priced rate, decomposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    pub base_rate_kind: BaseRateKind,
    pub base_rate_value: Decimal,
    pub spread: Decimal,
    pub total_rate: Decimal,
}

/// Where a covenant came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CovenantSource {
    ProgramStandard,
    Custom,
}

/// A loan covenant carried on the term sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Covenant {
    pub text: String,
    pub source: CovenantSource,
}

/// A closing condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
}

impl Condition {
    pub fn new(text: impl Into<String>) -> Self {
        Condition { text: text.into() }
    }
}

/// A computed fee line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeLineItem {
    pub name: String,
    pub description: String,
    pub amount: Decimal,
}

/// Every numeric deal term, owned by the deterministic rules engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesEngineOutput {
    pub eligibility: Eligibility,
    pub approved_amount: Decimal,
    pub ltv: Option<Decimal>,
    pub rate: RateQuote,
    pub term_months: u32,
    pub amortization_months: u32,
    pub monthly_payment: Decimal,
    pub interest_only: bool,
    pub prepayment_penalty: Option<String>,
    pub personal_guaranty: bool,
    pub requires_appraisal: bool,
    pub covenants: Vec<Covenant>,
    pub conditions: Vec<Condition>,
    pub fees: Vec<FeeLineItem>,
    pub total_fees: Decimal,
    pub projected_dscr_with_proposed_payment: Option<Decimal>,
}

// ============================================================================
// ENHANCEMENT / COMPLIANCE / FINAL CHECK
// ============================================================================

/// Narrative-only enhancement. No numeric fields, by construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiEnhancement {
    #[serde(default)]
    pub custom_covenants: Vec<String>,
    #[serde(default)]
    pub additional_conditions: Vec<String>,
    #[serde(default)]
    pub special_terms: Vec<String>,
    #[serde(default)]
    pub justification: String,
}

impl AiEnhancement {
    /// Degraded enhancement used when the narrative generator is down.
    pub fn unavailable() -> Self {
        AiEnhancement {
            justification: "unavailable - rules engine only".to_string(),
            ..Default::default()
        }
    }
}

/// Compliance issue severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumString,
    Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IssueSeverity {
    Critical,
    Warning,
    Info,
}

/// One regulatory finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceIssue {
    pub severity: IssueSeverity,
    pub regulation: String,
    pub description: String,
    pub recommendation: String,
}

/// Merged compliance review output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResult {
    /// `false` iff any issue is critical
    pub compliant: bool,
    /// Deterministic + external review issues, merged
    pub issues: Vec<ComplianceIssue>,
    /// Names of the deterministic checks that ran
    pub deterministic_checks: Vec<String>,
    /// The external narrative review's issues, kept separately as well
    pub ai_review_issues: Vec<ComplianceIssue>,
    pub reviewed_at: DateTime<Utc>,
}

impl ComplianceResult {
    pub fn has_critical(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.severity == IssueSeverity::Critical)
    }
}

/// Final-check issue severity. Errors block approval; warnings route to review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CheckSeverity {
    Error,
    Warning,
}

/// One final-check inconsistency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalCheckIssue {
    pub field: String,
    pub expected: Decimal,
    pub actual: Decimal,
    pub severity: CheckSeverity,
    pub message: String,
}

/// Result of the pure-math re-derivation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalCheckResult {
    pub passed: bool,
    pub issues: Vec<FinalCheckIssue>,
}

impl FinalCheckResult {
    pub fn errors(&self) -> impl Iterator<Item = &FinalCheckIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == CheckSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &FinalCheckIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == CheckSeverity::Warning)
    }
}

// ============================================================================
// STRUCTURED DEAL OUTPUT
// ============================================================================

/// Terminal pipeline status. There is no auto-decline: anything short of a
/// clean approval surfaces as `NeedsReview` with populated reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DealStatus {
    Approved,
    NeedsReview,
}

/// Complete structuring pipeline output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureDealOutput {
    pub id: Uuid,
    pub rules: RulesEngineOutput,
    pub enhancement: AiEnhancement,
    pub compliance: ComplianceResult,
    pub final_check: FinalCheckResult,
    pub status: DealStatus,
    pub decline_reasons: Vec<String>,
    pub structured_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_math_check_absolute() {
        let check =
            MathCheck::absolute("totalAssets", "fundamental", dec!(448500), dec!(448000), dec!(1));
        assert!(!check.passed);
        assert_eq!(check.difference, dec!(500));

        let check =
            MathCheck::absolute("totalAssets", "fundamental", dec!(448500), dec!(448500.50), dec!(1));
        assert!(check.passed);
    }

    #[test]
    fn test_math_check_relative_floor() {
        // Relative tolerance never shrinks below $1
        let check = MathCheck::relative("wages", "w2 sum", dec!(10), dec!(10.80), dec!(0.02));
        assert!(check.passed);
        // 2% of 150000 = 3000; a 30000 gap fails
        let check = MathCheck::relative("wages", "w2 sum", dec!(150000), dec!(120000), dec!(0.02));
        assert!(!check.passed);
    }

    #[test]
    fn test_verification_summary_rates() {
        let report = VerificationReport {
            comparisons: vec![
                Comparison::unmatched("a".into(), dec!(100)),
                Comparison {
                    field_path: "b".into(),
                    structured_value: dec!(50),
                    textract_value: Some(dec!(50)),
                    textract_key: Some("B".into()),
                    matched: true,
                    difference: dec!(0),
                    page: Some(1),
                },
            ],
            math_checks: vec![],
        };
        let summary = report.summary();
        assert_eq!(summary.comparisons_matched, 1);
        assert_eq!(summary.comparison_match_rate, dec!(0.5));
        assert_eq!(summary.check_pass_rate, Decimal::ONE);
    }

    #[test]
    fn test_unavailable_enhancement_is_empty() {
        let enh = AiEnhancement::unavailable();
        assert!(enh.custom_covenants.is_empty());
        assert!(enh.additional_conditions.is_empty());
        assert!(enh.special_terms.is_empty());
        assert_eq!(enh.justification, "unavailable - rules engine only");
    }
}
