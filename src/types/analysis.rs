//! Upstream credit-analysis input types.
//!
//! The analysis is produced by an upstream stage and consumed read-only by
//! the rules engine and the credit memo builder. Sub-reports that an
//! analysis may legitimately lack (DSCR for consumer files, business
//! financials for wage earners) are optional.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::RiskRating;

/// Headline numbers the rules engine keys off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Annual qualifying income
    pub qualifying_income: Decimal,
    /// Global debt service coverage ratio, when computable
    #[serde(default)]
    pub global_dscr: Option<Decimal>,
    /// Back-end debt-to-income ratio, when computable
    #[serde(default)]
    pub back_end_dti: Option<Decimal>,
    /// Liquid reserves expressed in months of proposed debt service
    pub months_of_reserves: Decimal,
    pub risk_rating: RiskRating,
}

/// Severity buckets for analyst risk flags, in render order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumString,
    Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FlagSeverity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

/// A risk flag raised by the upstream analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFlag {
    pub severity: FlagSeverity,
    pub title: String,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub recommendation: Option<String>,
}

/// One qualifying income source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeSource {
    pub name: String,
    /// e.g. "W-2 wages", "Schedule C", "Rental"
    pub category: String,
    pub annual_amount: Decimal,
}

/// Income sub-report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeReport {
    #[serde(default)]
    pub sources: Vec<IncomeSource>,
    #[serde(default)]
    pub total_annual: Decimal,
    /// Year-over-year direction, e.g. "increasing", "stable", "declining"
    #[serde(default)]
    pub trend: Option<String>,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// Debt service coverage sub-report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DscrReport {
    pub net_operating_income: Decimal,
    pub annual_debt_service: Decimal,
    #[serde(default)]
    pub global_dscr: Option<Decimal>,
    /// Analyst rating string, e.g. "strong", "adequate", "weak"
    pub rating: String,
}

/// One recurring obligation in the DTI detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtItem {
    pub creditor: String,
    pub monthly_payment: Decimal,
    #[serde(default)]
    pub balance: Option<Decimal>,
}

/// Debt-to-income sub-report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DtiReport {
    #[serde(default)]
    pub debt_items: Vec<DebtItem>,
    pub total_monthly_debt: Decimal,
    pub gross_monthly_income: Decimal,
    #[serde(default)]
    pub back_end_dti: Option<Decimal>,
    pub rating: String,
}

/// One liquid account backing the reserves figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityAccount {
    pub institution: String,
    pub account_type: String,
    pub balance: Decimal,
}

/// Liquidity sub-report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiquidityReport {
    #[serde(default)]
    pub accounts: Vec<LiquidityAccount>,
    #[serde(default)]
    pub total_liquid: Decimal,
    #[serde(default)]
    pub months_of_reserves: Decimal,
    #[serde(default)]
    pub rating: Option<String>,
}

/// A deposit large enough to warrant sourcing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LargeDeposit {
    /// Statement date as printed, e.g. "2024-03-14"
    pub date: String,
    pub amount: Decimal,
    #[serde(default)]
    pub source: Option<String>,
}

/// Bank-statement cash flow sub-report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowReport {
    #[serde(default)]
    pub avg_monthly_deposits: Decimal,
    #[serde(default)]
    pub avg_monthly_withdrawals: Decimal,
    #[serde(default)]
    pub net_monthly_cash_flow: Decimal,
    #[serde(default)]
    pub large_deposits: Vec<LargeDeposit>,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// Revenue history entry for the business sub-report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueYear {
    pub year: i32,
    pub revenue: Decimal,
    pub net_income: Decimal,
}

/// Business financials sub-report (absent for wage-earner files).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessReport {
    pub business_name: String,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub years_in_business: Option<u32>,
    #[serde(default)]
    pub revenue_by_year: Vec<RevenueYear>,
    #[serde(default)]
    pub gross_margin: Option<Decimal>,
    #[serde(default)]
    pub net_margin: Option<Decimal>,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// The full credit analysis consumed by structuring and the memo builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub summary: AnalysisSummary,
    /// Composite risk score, 0 (worst) to 100 (best)
    pub risk_score: u8,
    #[serde(default)]
    pub risk_flags: Vec<RiskFlag>,
    #[serde(default)]
    pub income: IncomeReport,
    #[serde(default)]
    pub dscr: Option<DscrReport>,
    #[serde(default)]
    pub dti: Option<DtiReport>,
    #[serde(default)]
    pub liquidity: LiquidityReport,
    #[serde(default)]
    pub cash_flow: CashFlowReport,
    #[serde(default)]
    pub business: Option<BusinessReport>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_minimal_analysis_deserializes() {
        let json = r#"{
            "summary": {
                "qualifying_income": "240000",
                "global_dscr": "1.42",
                "months_of_reserves": "6",
                "risk_rating": "moderate"
            },
            "risk_score": 72
        }"#;
        let analysis: Analysis = serde_json::from_str(json).unwrap();
        assert_eq!(analysis.summary.global_dscr, Some(dec!(1.42)));
        assert_eq!(analysis.summary.back_end_dti, None);
        assert!(analysis.business.is_none());
        assert!(analysis.risk_flags.is_empty());
    }

    #[test]
    fn test_flag_severity_order() {
        // Render order for the memo risk section
        assert!(FlagSeverity::Critical < FlagSeverity::High);
        assert!(FlagSeverity::High < FlagSeverity::Medium);
        assert!(FlagSeverity::Low < FlagSeverity::Info);
    }
}
