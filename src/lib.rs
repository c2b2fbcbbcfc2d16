//! # Credit Engine
//!
//! A pure Rust engine for borrower document verification, deterministic
//! loan structuring, and credit memo generation. Provides:
//!
//! - **Verification** - dual-path reconciliation of structured extractions
//!   against raw OCR key/values, plus closed-form arithmetic invariants
//!   for tax and financial forms
//! - **Structuring** - a deterministic rules engine that owns every
//!   numeric deal term, followed by narrative enhancement, compliance
//!   review, and an independent final re-check
//! - **Credit memos** - a deterministic, paginated rich-text report
//!   assembled from the verified analysis
//!
//! ## Architecture
//!
//! The structuring pipeline runs four stages strictly in order:
//!
//! ```text
//! Input -> S1: Rules       (deterministic; owns all numbers)
//!       -> S2: Enhancement (narrative generator; prose only)
//!       -> S3: Compliance  (deterministic checks + AI review)
//!       -> S4: Final check (pure-math re-derivation)
//!       -> Output (approved | needs_review, with decline reasons)
//! ```
//!
//! Numbers and narrative are separated structurally: the enhancement
//! type has no numeric fields, and the final check recomputes every
//! number without consulting it. External capabilities (the rate source
//! and the narrative generator) are injected traits; every failure mode
//! degrades to a reviewable output instead of an error.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use credit_engine::prelude::*;
//!
//! let rates = FixedRateSource::default();
//! let narrative = UnavailableGenerator;
//! let output = structure_deal(&input, &Capabilities::new(&rates, &narrative))?;
//!
//! println!("Status: {}", output.status);
//! println!("Payment: {}/mo", output.rules.monthly_payment);
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

// Core modules
pub mod capabilities;
pub mod catalog;
pub mod engine;
pub mod memo;
pub mod structuring;
pub mod types;
pub mod verification;

// Re-export commonly used types
pub use types::{
    // Document / extraction types
    Document, DocumentStatus, DocType, FieldValue, KvPair,

    // Analysis types
    Analysis, AnalysisSummary, FlagSeverity, RiskFlag, RiskRating,

    // Program types
    BaseRateKind, DocRequirement, FeeDef, FeeKind, LoanProgram, ProgramCategory, ProgramId,
    StructuringRules,

    // Verification outputs
    Comparison, MathCheck, VerificationReport, VerificationSummary,

    // Structuring outputs
    AiEnhancement, ComplianceIssue, ComplianceResult, DealStatus, Eligibility, FinalCheckIssue,
    FinalCheckResult, IssueSeverity, RateQuote, RulesEngineOutput, StructureDealOutput,

    // Common types
    CreditError, CreditResult, DecimalExt, StateCode,
};

// Re-export pipeline surface
pub use capabilities::{
    Capabilities, CannedGenerator, FixedRateSource, NarrativeGenerator, RateSource,
    UnavailableGenerator,
};
pub use engine::{
    engine_info, engine_version, generate_credit_memo, structure_deal, structure_deal_json,
    validate_structure_input, verify_document, verify_document_json, EngineInfo,
};
pub use memo::{build_credit_memo, DocumentInventoryEntry, MemoInput};
pub use structuring::{RulesRequest, StructureDealInput};
pub use verification::VerificationRequest;

/// Prelude module for convenient imports
pub mod prelude {
    //! Commonly used types and traits.
    //!
    //! ```rust,ignore
    //! use credit_engine::prelude::*;
    //! ```

    pub use crate::capabilities::{
        Capabilities, FixedRateSource, NarrativeGenerator, RateSource, UnavailableGenerator,
    };
    pub use crate::engine::{structure_deal, verify_document};
    pub use crate::types::{
        Analysis, CreditError, CreditResult, DealStatus, DocType, FieldValue, KvPair,
        LoanProgram, ProgramId, RiskRating, StateCode, StructureDealOutput,
    };
    pub use crate::structuring::StructureDealInput;
    pub use crate::verification::VerificationRequest;

    pub use rust_decimal::Decimal;
    pub use rust_decimal_macros::dec;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_library_exports() {
        let _doc_type = DocType::Form1040;
        let _status = DealStatus::NeedsReview;
        let _value = FieldValue::num(dec!(100));
        let _program = catalog::program(ProgramId::Sba7a);
    }

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let _doc_type = DocType::BalanceSheet;
        let _rates = FixedRateSource::default();
    }

    #[test]
    fn test_engine_version() {
        let version = engine_version();
        assert!(!version.is_empty());
        assert!(version.contains('.'));
    }
}
