//! External capability ports.
//!
//! The engine is pure except for two injected seams: the rate source the
//! rules engine prices against, and the narrative generator backing the
//! enhancement and compliance-review stages. Both are trait objects so
//! tests can substitute deterministic stubs; both may block internally
//! (their deadline policy is their own), and both are treated as
//! possibly-failing on every call.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{BaseRateKind, CreditError, CreditResult};

/// Source of current index rates. Implementations may cache; the rules
/// engine treats every lookup as possibly expensive.
pub trait RateSource {
    fn base_rate(&self, kind: BaseRateKind) -> CreditResult<Decimal>;
}

/// Fixed fallback rates for environments with no live rate feed.
#[derive(Debug, Clone)]
pub struct FixedRateSource {
    pub prime: Decimal,
    pub sofr: Decimal,
    pub treasury: Decimal,
}

impl Default for FixedRateSource {
    fn default() -> Self {
        FixedRateSource {
            prime: dec!(0.075),
            sofr: dec!(0.053),
            treasury: dec!(0.043),
        }
    }
}

impl RateSource for FixedRateSource {
    fn base_rate(&self, kind: BaseRateKind) -> CreditResult<Decimal> {
        Ok(match kind {
            BaseRateKind::Prime => self.prime,
            BaseRateKind::Sofr => self.sofr,
            BaseRateKind::Treasury => self.treasury,
        })
    }
}

/// JSON-producing narrative generator (an LLM in production). The caller
/// owns schema validation; implementations just return whatever JSON the
/// model produced.
pub trait NarrativeGenerator {
    fn generate_json(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> CreditResult<serde_json::Value>;
}

/// Generator stub for environments with no model configured. Every call
/// fails, which the pipeline degrades around.
#[derive(Debug, Clone, Default)]
pub struct UnavailableGenerator;

impl NarrativeGenerator for UnavailableGenerator {
    fn generate_json(&self, _system: &str, _user: &str) -> CreditResult<serde_json::Value> {
        Err(CreditError::capability(
            "narrative_generator",
            "no generator configured",
        ))
    }
}

/// Generator that returns one canned JSON value on every call. Used by
/// tests and demos to keep pipeline runs deterministic.
#[derive(Debug, Clone)]
pub struct CannedGenerator(pub serde_json::Value);

impl NarrativeGenerator for CannedGenerator {
    fn generate_json(&self, _system: &str, _user: &str) -> CreditResult<serde_json::Value> {
        Ok(self.0.clone())
    }
}

/// The capability bundle the structuring pipeline runs against.
#[derive(Clone, Copy)]
pub struct Capabilities<'a> {
    pub rates: &'a dyn RateSource,
    pub narrative: &'a dyn NarrativeGenerator,
}

impl<'a> Capabilities<'a> {
    pub fn new(rates: &'a dyn RateSource, narrative: &'a dyn NarrativeGenerator) -> Self {
        Capabilities { rates, narrative }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fixed_rates() {
        let rates = FixedRateSource::default();
        assert_eq!(rates.base_rate(BaseRateKind::Prime).unwrap(), dec!(0.075));
        assert_eq!(rates.base_rate(BaseRateKind::Sofr).unwrap(), dec!(0.053));
        assert_eq!(rates.base_rate(BaseRateKind::Treasury).unwrap(), dec!(0.043));
    }

    #[test]
    fn test_unavailable_generator_fails() {
        let gen = UnavailableGenerator;
        assert!(gen.generate_json("s", "u").is_err());
    }

    #[test]
    fn test_canned_generator_round_trips() {
        let gen = CannedGenerator(serde_json::json!({"justification": "solid file"}));
        let value = gen.generate_json("s", "u").unwrap();
        assert_eq!(value["justification"], "solid file");
    }
}
