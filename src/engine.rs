//! Main engine entry points.
//!
//! Thin wrappers over the verification and structuring cores, plus
//! JSON-string variants for FFI-style embedding where the host passes
//! serialized inputs and wants serialized outputs back.

use crate::capabilities::{Capabilities, FixedRateSource, UnavailableGenerator};
use crate::memo::{build_credit_memo, MemoInput};
use crate::structuring::{self, StructureDealInput};
use crate::types::{CreditResult, StructureDealOutput, VerificationReport};
use crate::verification::{self, VerificationRequest};

/// Verify one extracted document against its OCR result.
pub fn verify_document(request: &VerificationRequest) -> CreditResult<VerificationReport> {
    verification::verify_document(request)
}

/// Structure one deal through rules, enhancement, compliance, and the
/// final check.
pub fn structure_deal(
    input: &StructureDealInput,
    capabilities: &Capabilities<'_>,
) -> CreditResult<StructureDealOutput> {
    structuring::structure_deal(input, capabilities)
}

/// Validate a structuring input without running the pipeline.
pub fn validate_structure_input(input: &StructureDealInput) -> CreditResult<()> {
    structuring::validate_structure_input(input)
}

/// Generate the credit memo bytes for a completed analysis.
pub fn generate_credit_memo(input: &MemoInput) -> CreditResult<Vec<u8>> {
    build_credit_memo(input)
}

/// Verify a document from JSON input, returning JSON output.
pub fn verify_document_json(request_json: &str) -> Result<String, String> {
    let request: VerificationRequest = serde_json::from_str(request_json)
        .map_err(|e| format!("Failed to parse verification request: {}", e))?;

    let report = verify_document(&request).map_err(|e| format!("Verification error: {}", e))?;

    serde_json::to_string(&report).map_err(|e| format!("Failed to serialize report: {}", e))
}

/// Structure a deal from JSON input, returning JSON output.
///
/// Uses the fixed fallback rate source and no narrative generator; the
/// pipeline degrades the narrative stages accordingly. Hosts that have
/// live capabilities should call [`structure_deal`] directly.
pub fn structure_deal_json(input_json: &str) -> Result<String, String> {
    let input: StructureDealInput = serde_json::from_str(input_json)
        .map_err(|e| format!("Failed to parse structuring input: {}", e))?;

    let rates = FixedRateSource::default();
    let narrative = UnavailableGenerator;
    let output = structure_deal(&input, &Capabilities::new(&rates, &narrative))
        .map_err(|e| format!("Structuring error: {}", e))?;

    serde_json::to_string(&output).map_err(|e| format!("Failed to serialize output: {}", e))
}

/// Get engine version information.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Get engine build information.
pub fn engine_info() -> EngineInfo {
    EngineInfo {
        version: env!("CARGO_PKG_VERSION"),
        name: env!("CARGO_PKG_NAME"),
    }
}

/// Engine build information
#[derive(Debug, Clone)]
pub struct EngineInfo {
    pub version: &'static str,
    pub name: &'static str,
}
