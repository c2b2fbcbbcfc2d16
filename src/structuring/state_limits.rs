//! State-level rate limits and disclosure requirements.
//!
//! Compiled-in tables consulted by the deterministic compliance checks.
//! States without an entry either have no general usury ceiling for the
//! loan class or exempt licensed commercial lenders; those produce no
//! finding. Limits are annual rates as fractions.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::StateCode;

/// Statutory rate ceilings for a state, split by loan class.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsuryLimit {
    pub commercial: Option<Decimal>,
    pub consumer: Option<Decimal>,
}

/// Look up the applicable usury ceilings for a state.
pub fn usury_limit(state: StateCode) -> UsuryLimit {
    use StateCode::*;
    match state {
        // Constitutional ceiling applies across loan classes
        AR => UsuryLimit {
            commercial: Some(dec!(0.17)),
            consumer: Some(dec!(0.17)),
        },
        NY => UsuryLimit {
            // Criminal usury reaches corporate borrowers
            commercial: Some(dec!(0.25)),
            consumer: Some(dec!(0.16)),
        },
        TX => UsuryLimit {
            commercial: Some(dec!(0.18)),
            consumer: Some(dec!(0.18)),
        },
        FL => UsuryLimit {
            commercial: Some(dec!(0.25)),
            consumer: Some(dec!(0.18)),
        },
        CA => UsuryLimit {
            commercial: None,
            consumer: Some(dec!(0.10)),
        },
        MI => UsuryLimit {
            commercial: Some(dec!(0.25)),
            consumer: Some(dec!(0.07)),
        },
        MN => UsuryLimit {
            commercial: None,
            consumer: Some(dec!(0.08)),
        },
        NJ => UsuryLimit {
            commercial: Some(dec!(0.30)),
            consumer: Some(dec!(0.16)),
        },
        PA => UsuryLimit {
            commercial: None,
            consumer: Some(dec!(0.06)),
        },
        VT => UsuryLimit {
            commercial: Some(dec!(0.12)),
            consumer: Some(dec!(0.12)),
        },
        WA => UsuryLimit {
            commercial: None,
            consumer: Some(dec!(0.12)),
        },
        _ => UsuryLimit::default(),
    }
}

/// Commercial-financing disclosure regimes, by state.
pub fn required_disclosures(state: StateCode) -> &'static [&'static str] {
    use StateCode::*;
    match state {
        CA => &["California Commercial Financing Disclosure (SB 1235)"],
        NY => &["New York Commercial Finance Disclosure Law"],
        UT => &["Utah Commercial Financing Registration and Disclosure"],
        VA => &["Virginia Sales-Based Financing Disclosure"],
        CT => &["Connecticut Commercial Financing Disclosure"],
        GA => &["Georgia Commercial Financing Disclosure"],
        FL => &["Florida Commercial Financing Disclosure"],
        _ => &[],
    }
}
