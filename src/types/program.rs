//! Loan program definitions.
//!
//! A `LoanProgram` is the immutable record shape served by the catalog.
//! It is the only place numerical deal parameters originate; the rules
//! engine reads these fields and derives every number in its output from
//! them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::{BaseRateKind, DocType, StateCode};

/// Canonical program identifiers. The catalog is closed over this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProgramId {
    #[serde(rename = "sba_7a")]
    #[strum(serialize = "sba_7a")]
    Sba7a,
    #[serde(rename = "sba_504")]
    #[strum(serialize = "sba_504")]
    Sba504,
    CommercialCre,
    Dscr,
    BankStatement,
    ConventionalBusiness,
    LineOfCredit,
    EquipmentFinancing,
    Bridge,
    CryptoCollateral,
}

/// Broad program classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProgramCategory {
    Commercial,
    Residential,
    Specialty,
}

/// A document the program requires or accepts, with how many years back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocRequirement {
    pub doc_type: DocType,
    /// Number of years of history, e.g. 2 for two years of returns
    pub years: u32,
}

impl DocRequirement {
    pub fn new(doc_type: DocType, years: u32) -> Self {
        DocRequirement { doc_type, years }
    }
}

/// Fee calculation basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FeeKind {
    /// `value` is a fraction of the approved amount
    Percent,
    /// `value` is a flat dollar amount
    Flat,
}

/// A standard fee charged by the program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeDef {
    pub kind: FeeKind,
    pub value: Decimal,
    pub name: String,
    pub description: String,
}

impl FeeDef {
    pub fn percent(name: &str, value: Decimal, description: &str) -> Self {
        FeeDef {
            kind: FeeKind::Percent,
            value,
            name: name.to_string(),
            description: description.to_string(),
        }
    }

    pub fn flat(name: &str, value: Decimal, description: &str) -> Self {
        FeeDef {
            kind: FeeKind::Flat,
            value,
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

/// A state-specific note attached to a program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRule {
    pub state: StateCode,
    pub note: String,
}

/// The numeric constraints the rules engine enforces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuringRules {
    /// Maximum loan-to-value, as a fraction (0.75 = 75%)
    pub max_ltv: Decimal,
    /// Minimum DSCR; 0 disables the check
    pub min_dscr: Decimal,
    /// Maximum back-end DTI; 0 disables the check
    pub max_dti: Decimal,
    pub base_rate: BaseRateKind,
    /// Lowest spread the program prices at
    pub min_spread: Decimal,
    /// Highest spread the program prices at
    pub max_spread: Decimal,
    pub max_term_months: u32,
    pub max_amortization_months: u32,
    pub min_loan_amount: Decimal,
    #[serde(default)]
    pub max_loan_amount: Option<Decimal>,
    /// Prepayment penalty structure, e.g. "5-4-3-2-1 declining"
    #[serde(default)]
    pub prepayment_penalty: Option<String>,
    pub requires_appraisal: bool,
    pub requires_personal_guaranty: bool,
    #[serde(default)]
    pub collateral_types: Vec<String>,
    pub interest_only: bool,
}

/// An immutable loan program record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanProgram {
    pub id: ProgramId,
    pub name: String,
    pub description: String,
    pub category: ProgramCategory,
    pub required_documents: Vec<DocRequirement>,
    #[serde(default)]
    pub optional_documents: Vec<DocRequirement>,
    pub structuring: StructuringRules,
    #[serde(default)]
    pub applicable_regulations: Vec<String>,
    #[serde(default)]
    pub state_specific_rules: Vec<StateRule>,
    #[serde(default)]
    pub standard_covenants: Vec<String>,
    #[serde(default)]
    pub standard_fees: Vec<FeeDef>,
    #[serde(default)]
    pub required_output_docs: Vec<String>,
    #[serde(default)]
    pub compliance_checks: Vec<String>,
    pub late_fee_percent: Decimal,
    pub late_fee_grace_days: u32,
}

impl LoanProgram {
    /// Check a requested amount against the program's loan range.
    pub fn is_amount_in_range(&self, amount: Decimal) -> bool {
        if amount < self.structuring.min_loan_amount {
            return false;
        }
        if let Some(max) = self.structuring.max_loan_amount {
            if amount > max {
                return false;
            }
        }
        true
    }

    /// Whether the program's regulation list names a given regulation.
    pub fn regulated_by(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.applicable_regulations
            .iter()
            .any(|r| r.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_program_id_wire_names() {
        assert_eq!(serde_json::to_string(&ProgramId::Sba7a).unwrap(), "\"sba_7a\"");
        assert_eq!(serde_json::to_string(&ProgramId::Sba504).unwrap(), "\"sba_504\"");
        assert_eq!(
            serde_json::to_string(&ProgramId::CommercialCre).unwrap(),
            "\"commercial_cre\""
        );
        assert_eq!(ProgramId::Sba7a.to_string(), "sba_7a");
        assert_eq!("crypto_collateral".parse::<ProgramId>().unwrap(), ProgramId::CryptoCollateral);
    }
}
