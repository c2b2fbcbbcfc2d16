//! Business return invariants: Forms 1120, 1120S, and 1065, their
//! Schedule L balance sheets, and the Schedule K-1 informational check.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{DocType, FieldValue, MathCheck, MONEY_TOLERANCE};

use super::{has, sum_fields, val};

/// Partner share tolerance: half a percentage point across all partners.
const SHARE_TOLERANCE: Decimal = dec!(0.5);

/// Schedule L asset component lines.
const SCHEDULE_L_ASSETS: &[&str] = &[
    "cash",
    "tradeNotes",
    "inventories",
    "governmentObligations",
    "taxExemptSecurities",
    "otherCurrentAssets",
    "loansToShareholders",
    "mortgageLoans",
    "otherInvestments",
    "buildingsAndDepreciation",
    "depletableAssets",
    "land",
    "intangibleAssets",
    "otherAssets",
];

pub(super) fn checks(doc_type: DocType, tree: &FieldValue) -> Vec<MathCheck> {
    let mut checks = Vec::new();

    income_block_checks(doc_type, tree, &mut checks);
    bottom_line_checks(doc_type, tree, &mut checks);
    if doc_type == DocType::Form1065 {
        partner_share_checks(tree, &mut checks);
    }
    schedule_l_checks(tree, &mut checks);

    checks
}

/// Lines 1a-1c, gross profit, and total income. The top block is shared
/// across all three forms; only the extra income lines differ.
fn income_block_checks(doc_type: DocType, tree: &FieldValue, checks: &mut Vec<MathCheck>) {
    let balance_1c = val(tree, "income.balanceAfterReturns_1c");
    if !balance_1c.is_zero() {
        checks.push(MathCheck::absolute(
            "income.balanceAfterReturns_1c",
            "Line 1c equals gross receipts minus returns and allowances",
            val(tree, "income.grossReceipts_1a") - val(tree, "income.returnsAllowances_1b"),
            balance_1c,
            MONEY_TOLERANCE,
        ));
    }

    let gross_profit = val(tree, "income.grossProfit_line3");
    if !gross_profit.is_zero() {
        checks.push(MathCheck::absolute(
            "income.grossProfit_line3",
            "Gross profit equals line 1c minus cost of goods sold",
            balance_1c - val(tree, "income.cogs_line2"),
            gross_profit,
            MONEY_TOLERANCE,
        ));
    }

    let total_income = val(tree, "income.totalIncome");
    if !total_income.is_zero() {
        let income = tree.path("income").unwrap_or(tree);
        let extra_lines: &[&str] = match doc_type {
            DocType::Form1120 => &[
                "dividends_line4",
                "interest_line5",
                "grossRents_line6",
                "grossRoyalties_line7",
                "capitalGain_line8",
                "netGain_line9",
                "otherIncome_line10",
            ],
            DocType::Form1120s => &["netGain_line4", "otherIncome_line5"],
            _ => &[
                "ordinaryIncomeFromPartnerships_line4",
                "netFarmProfit_line5",
                "netGain_line6",
                "otherIncome_line7",
            ],
        };
        checks.push(MathCheck::absolute(
            "income.totalIncome",
            "Total income equals gross profit plus the remaining income lines",
            gross_profit + sum_fields(income, extra_lines),
            total_income,
            MONEY_TOLERANCE,
        ));
    }
}

fn bottom_line_checks(doc_type: DocType, tree: &FieldValue, checks: &mut Vec<MathCheck>) {
    let total_income = val(tree, "income.totalIncome");
    let total_deductions = val(tree, "deductions.totalDeductions");

    match doc_type {
        DocType::Form1120 => {
            let before_nol = val(tree, "income.taxableIncomeBeforeNOL");
            if !before_nol.is_zero() {
                checks.push(MathCheck::absolute(
                    "income.taxableIncomeBeforeNOL",
                    "Taxable income before NOL equals total income minus deductions",
                    total_income - total_deductions,
                    before_nol,
                    MONEY_TOLERANCE,
                ));
            }
            let taxable = val(tree, "income.taxableIncome_line30");
            if !taxable.is_zero() {
                checks.push(MathCheck::absolute(
                    "income.taxableIncome_line30",
                    "Taxable income (line 30) nets NOL and special deductions",
                    before_nol
                        - val(tree, "deductions.nol_line29a")
                        - val(tree, "deductions.specialDeductions_line29b"),
                    taxable,
                    MONEY_TOLERANCE,
                ));
            }
        }
        _ => {
            let obi = val(tree, "income.ordinaryBusinessIncome");
            if !obi.is_zero() {
                checks.push(MathCheck::absolute(
                    "income.ordinaryBusinessIncome",
                    "Ordinary business income equals total income minus deductions",
                    total_income - total_deductions,
                    obi,
                    MONEY_TOLERANCE,
                ));
            }
        }
    }
}

/// 1065 partner profit/loss shares must each sum to 100%.
fn partner_share_checks(tree: &FieldValue, checks: &mut Vec<MathCheck>) {
    let partners = match tree.array("partners") {
        Some(p) if !p.is_empty() => p,
        _ => return,
    };

    for (field, label) in [
        ("profitSharePercent", "profit"),
        ("lossSharePercent", "loss"),
    ] {
        if !partners.iter().any(|p| p.number(field).is_some()) {
            continue;
        }
        let total: Decimal = partners
            .iter()
            .map(|p| p.number(field).unwrap_or(Decimal::ZERO))
            .sum();
        checks.push(MathCheck::absolute(
            format!("partners[*].{}", field),
            format!("Partner {} shares sum to 100%", label),
            dec!(100),
            total,
            SHARE_TOLERANCE,
        ));
    }
}

/// Schedule L: per-period asset rollup and the fundamental equation.
fn schedule_l_checks(tree: &FieldValue, checks: &mut Vec<MathCheck>) {
    let schedule_l = match tree.path("scheduleL") {
        Some(node) => node,
        None => return,
    };

    for period in ["beginningOfYear", "endOfYear"] {
        let node = match schedule_l.field(period) {
            Some(node) => node,
            None => continue,
        };
        let prefix = format!("scheduleL.{}", period);

        let total_assets = val(node, "totalAssets");
        let component_sum = sum_fields(node, SCHEDULE_L_ASSETS);
        if !component_sum.is_zero() && !total_assets.is_zero() {
            checks.push(MathCheck::absolute(
                format!("{}.totalAssets", prefix),
                "Total assets equal the sum of asset components",
                component_sum,
                total_assets,
                MONEY_TOLERANCE,
            ));
        }

        // Fundamental: assets equal liabilities plus equity, mandatory
        // whenever the totals were extracted
        if has(node, "totalAssets") {
            let liabilities_and_equity = if has(node, "totalLiabilitiesAndEquity") {
                val(node, "totalLiabilitiesAndEquity")
            } else if has(node, "totalLiabilities") || has(node, "totalEquity") {
                val(node, "totalLiabilities") + val(node, "totalEquity")
            } else {
                continue;
            };
            checks.push(MathCheck::absolute(
                format!("{}.totalAssets", prefix),
                "Balance sheet balances: assets equal liabilities plus equity",
                liabilities_and_equity,
                total_assets,
                MONEY_TOLERANCE,
            ));
        }
    }
}

/// Schedule K-1 distributions-to-ordinary-income ratio. Informational:
/// the wide tolerance keeps it from ever gating a file on its own.
pub(super) fn k1_checks(tree: &FieldValue) -> Vec<MathCheck> {
    let ordinary = val(tree, "ordinaryIncome_box1");
    let distributions = val(tree, "distributions_box19");
    if ordinary.is_zero() {
        return Vec::new();
    }

    let ratio = distributions / ordinary;
    vec![MathCheck::absolute(
        "distributions_box19",
        "Distributions to ordinary income ratio (informational)",
        Decimal::ONE,
        ratio,
        Decimal::ONE,
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn form_1120s() -> FieldValue {
        FieldValue::object([
            (
                "income",
                FieldValue::object([
                    ("grossReceipts_1a", FieldValue::num(dec!(1200000))),
                    ("returnsAllowances_1b", FieldValue::num(dec!(20000))),
                    ("balanceAfterReturns_1c", FieldValue::num(dec!(1180000))),
                    ("cogs_line2", FieldValue::num(dec!(480000))),
                    ("grossProfit_line3", FieldValue::num(dec!(700000))),
                    ("otherIncome_line5", FieldValue::num(dec!(15000))),
                    ("totalIncome", FieldValue::num(dec!(715000))),
                    ("ordinaryBusinessIncome", FieldValue::num(dec!(215000))),
                ]),
            ),
            (
                "deductions",
                FieldValue::object([("totalDeductions", FieldValue::num(dec!(500000)))]),
            ),
        ])
    }

    #[test]
    fn test_1120s_income_chain() {
        let checks = checks(DocType::Form1120s, &form_1120s());
        assert_eq!(checks.len(), 4);
        assert!(checks.iter().all(|c| c.passed), "{:#?}", checks);
    }

    #[test]
    fn test_partner_shares_must_total_100() {
        let tree = FieldValue::object([(
            "partners",
            FieldValue::Array(vec![
                FieldValue::object([("profitSharePercent", FieldValue::num(dec!(60)))]),
                FieldValue::object([("profitSharePercent", FieldValue::num(dec!(35)))]),
            ]),
        )]);
        let checks = checks(DocType::Form1065, &tree);
        assert_eq!(checks.len(), 1);
        assert!(!checks[0].passed);
        assert_eq!(checks[0].actual, dec!(95));
    }

    #[test]
    fn test_partner_shares_within_half_point() {
        let tree = FieldValue::object([(
            "partners",
            FieldValue::Array(vec![
                FieldValue::object([("profitSharePercent", FieldValue::num(dec!(33.3)))]),
                FieldValue::object([("profitSharePercent", FieldValue::num(dec!(33.3)))]),
                FieldValue::object([("profitSharePercent", FieldValue::num(dec!(33.3)))]),
            ]),
        )]);
        let checks = checks(DocType::Form1065, &tree);
        assert!(checks[0].passed);
    }

    #[test]
    fn test_schedule_l_fundamental() {
        let tree = FieldValue::object([(
            "scheduleL",
            FieldValue::object([(
                "endOfYear",
                FieldValue::object([
                    ("totalAssets", FieldValue::num(dec!(900000))),
                    ("totalLiabilities", FieldValue::num(dec!(400000))),
                    ("totalEquity", FieldValue::num(dec!(480000))),
                ]),
            )]),
        )]);
        let checks = checks(DocType::Form1120, &tree);
        assert_eq!(checks.len(), 1);
        assert!(!checks[0].passed);
        assert_eq!(checks[0].difference, dec!(20000));
    }

    #[test]
    fn test_k1_informational_always_passes_in_range() {
        let tree = FieldValue::object([
            ("ordinaryIncome_box1", FieldValue::num(dec!(80000))),
            ("distributions_box19", FieldValue::num(dec!(120000))),
        ]);
        let checks = k1_checks(&tree);
        assert_eq!(checks.len(), 1);
        assert!(checks[0].passed);
    }
}
