//! Type definitions for the credit engine.
//!
//! This module contains all the core data structures used throughout
//! the verification and structuring pipelines.
//!
//! # Module Organization
//!
//! - `extraction` - Document, extraction tree, and OCR key/value types
//! - `analysis` - Upstream credit-analysis input types
//! - `program` - Loan program definitions (the catalog record shape)
//! - `output` - Verification and structuring results

pub mod analysis;
pub mod extraction;
pub mod output;
pub mod program;

pub use analysis::{
    Analysis, AnalysisSummary, BusinessReport, CashFlowReport, DebtItem, DscrReport, DtiReport,
    FlagSeverity, IncomeReport, IncomeSource, LargeDeposit, LiquidityAccount, LiquidityReport,
    RevenueYear, RiskFlag,
};
pub use extraction::{Document, DocumentStatus, FieldValue, KvPair};
pub use output::{
    AiEnhancement, CheckSeverity, Comparison, ComplianceIssue, ComplianceResult, Condition,
    Covenant, CovenantSource, DealStatus, Eligibility, FeeLineItem, FinalCheckIssue,
    FinalCheckResult, IssueSeverity, MathCheck, RateQuote, RulesEngineOutput, StructureDealOutput,
    VerificationReport, VerificationSummary,
};
pub use program::{
    DocRequirement, FeeDef, FeeKind, LoanProgram, ProgramCategory, ProgramId, StateRule,
    StructuringRules,
};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// Absolute money tolerance for equation and payment checks ($1.00).
pub const MONEY_TOLERANCE: Decimal = dec!(1.00);

/// Relative tolerance for ratio / sum-vs-subtotal checks (2%).
pub const RELATIVE_TOLERANCE: Decimal = dec!(0.02);

/// Rate tolerance for final-check rederivation (1 basis point).
pub const RATE_TOLERANCE: Decimal = dec!(0.0001);

/// Document types recognized by the verification core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DocType {
    Form1040,
    Form1120,
    Form1120s,
    Form1065,
    ScheduleK1,
    W2,
    BankStatementChecking,
    BankStatementSavings,
    ProfitAndLoss,
    BalanceSheet,
    RentRoll,
    Other,
}

impl DocType {
    /// Whether this type is a bank statement (checking or savings).
    pub fn is_bank_statement(&self) -> bool {
        matches!(
            self,
            DocType::BankStatementChecking | DocType::BankStatementSavings
        )
    }

    /// Whether this type is a business income tax return.
    pub fn is_business_return(&self) -> bool {
        matches!(self, DocType::Form1120 | DocType::Form1120s | DocType::Form1065)
    }
}

/// US State codes (50 states + DC + territories)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum StateCode {
    AL, AK, AZ, AR, CA, CO, CT, DE, DC, FL,
    GA, HI, ID, IL, IN, IA, KS, KY, LA, ME,
    MD, MA, MI, MN, MS, MO, MT, NE, NV, NH,
    NJ, NM, NY, NC, ND, OH, OK, OR, PA, RI,
    SC, SD, TN, TX, UT, VT, VA, WA, WV, WI,
    WY, PR, VI, GU, AS, MP,
}

impl StateCode {
    /// Convert from string slice
    pub fn from_str_opt(s: &str) -> Option<Self> {
        s.trim().to_uppercase().parse().ok()
    }
}

/// Borrower risk rating from the upstream credit analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskRating {
    Low,
    Moderate,
    Elevated,
    High,
}

impl RiskRating {
    /// Interpolation factor for spread selection within a program's range.
    /// Low prices at the bottom of the range, high at the top.
    pub fn spread_factor(&self) -> Decimal {
        match self {
            RiskRating::Low => dec!(0),
            RiskRating::Moderate => dec!(0.33),
            RiskRating::Elevated => dec!(0.67),
            RiskRating::High => dec!(1),
        }
    }
}

/// Index kinds a program can price against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BaseRateKind {
    Prime,
    Sofr,
    Treasury,
}

/// Common error type for credit-engine operations.
///
/// Domain findings (failed math checks, eligibility failures, compliance
/// issues, final-check issues) are NOT errors: they travel as data on the
/// normal output path. Only invalid input shape, capability failures the
/// caller must see, and internal logic errors surface here.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum CreditError {
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    #[error("Calculation error in stage {stage}: {message}")]
    Calculation { message: String, stage: String },

    #[error("External capability {capability} failed: {message}")]
    Capability { capability: String, message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CreditError {
    pub fn validation(message: impl Into<String>) -> Self {
        CreditError::Validation {
            message: message.into(),
            field: None,
        }
    }

    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        CreditError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn calculation(message: impl Into<String>, stage: impl Into<String>) -> Self {
        CreditError::Calculation {
            message: message.into(),
            stage: stage.into(),
        }
    }

    pub fn capability(capability: impl Into<String>, message: impl Into<String>) -> Self {
        CreditError::Capability {
            capability: capability.into(),
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        CreditError::Serialization {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CreditError::Internal {
            message: message.into(),
        }
    }
}

/// Result type alias for credit-engine operations
pub type CreditResult<T> = Result<T, CreditError>;

/// Decimal extension trait for financial calculations
pub trait DecimalExt {
    /// Round to 2 decimal places using banker's rounding
    fn round_money(self) -> Decimal;
    /// Round to 4 decimal places; used for intermediate payment math
    fn round_payment(self) -> Decimal;
    /// Snap a rate to the standard 1/800 pricing grid (0.125% increments)
    fn round_rate_grid(self) -> Decimal;
}

impl DecimalExt for Decimal {
    fn round_money(self) -> Decimal {
        self.round_dp(2)
    }

    fn round_payment(self) -> Decimal {
        self.round_dp(4)
    }

    fn round_rate_grid(self) -> Decimal {
        (self * dec!(800)).round() / dec!(800)
    }
}
