//! Statement invariants: bank statements, P&Ls, balance sheets, rent rolls.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{FieldValue, MathCheck, MONEY_TOLERANCE, RELATIVE_TOLERANCE};

use super::{has, sum_fields, val};

pub(super) fn bank_statement_checks(tree: &FieldValue) -> Vec<MathCheck> {
    let mut checks = Vec::new();

    // Mandatory whenever either balance was extracted: the statement
    // must reconcile even when one side reads zero.
    if has(tree, "beginningBalance") || has(tree, "endingBalance") {
        let expected = val(tree, "beginningBalance") + val(tree, "totalDeposits")
            - val(tree, "totalWithdrawals");
        checks.push(MathCheck::absolute(
            "endingBalance",
            "Ending balance equals beginning balance plus deposits minus withdrawals",
            expected,
            val(tree, "endingBalance"),
            MONEY_TOLERANCE,
        ));
    }

    let total_deposits = val(tree, "totalDeposits");
    if !total_deposits.is_zero() {
        if let Some(deposits) = tree.array("deposits") {
            if !deposits.is_empty() {
                let sum: Decimal = deposits
                    .iter()
                    .map(|d| d.number("amount").unwrap_or(Decimal::ZERO))
                    .sum();
                checks.push(MathCheck::relative(
                    "totalDeposits",
                    "Itemized deposits approximately sum to total deposits",
                    total_deposits,
                    sum,
                    RELATIVE_TOLERANCE,
                ));
            }
        }
    }

    let total_withdrawals = val(tree, "totalWithdrawals");
    if !total_withdrawals.is_zero() {
        if let Some(withdrawals) = tree.array("withdrawals") {
            if !withdrawals.is_empty() {
                // Withdrawals may be extracted as negatives; magnitude is
                // what reconciles against the stated total
                let sum: Decimal = withdrawals
                    .iter()
                    .map(|w| w.number("amount").unwrap_or(Decimal::ZERO).abs())
                    .sum();
                checks.push(MathCheck::relative(
                    "totalWithdrawals",
                    "Itemized withdrawals approximately sum to total withdrawals",
                    total_withdrawals,
                    sum,
                    RELATIVE_TOLERANCE,
                ));
            }
        }
    }

    checks
}

pub(super) fn profit_and_loss_checks(tree: &FieldValue) -> Vec<MathCheck> {
    let mut checks = Vec::new();

    let net_revenue = val(tree, "netRevenue");
    let gross_profit = val(tree, "grossProfit");
    if !gross_profit.is_zero() {
        checks.push(MathCheck::absolute(
            "grossProfit",
            "Gross profit equals net revenue minus COGS",
            net_revenue - val(tree, "cogs"),
            gross_profit,
            MONEY_TOLERANCE,
        ));
    }

    let operating_income = val(tree, "operatingIncome");
    if !operating_income.is_zero() {
        checks.push(MathCheck::absolute(
            "operatingIncome",
            "Operating income equals gross profit minus operating expenses",
            gross_profit - val(tree, "operatingExpenses"),
            operating_income,
            MONEY_TOLERANCE,
        ));
    }

    let net_income = val(tree, "netIncome");
    if !net_income.is_zero() {
        checks.push(MathCheck::absolute(
            "netIncome",
            "Net income nets other income/expense and income tax",
            operating_income + val(tree, "otherIncomeExpense") - val(tree, "incomeTaxExpense"),
            net_income,
            MONEY_TOLERANCE,
        ));
    }

    // Gross margin is a ratio; relative tolerance only
    let gross_margin = val(tree, "grossMargin");
    if !gross_margin.is_zero() && !net_revenue.is_zero() {
        let expected = gross_profit / net_revenue;
        let tolerance = expected.abs() * RELATIVE_TOLERANCE;
        checks.push(MathCheck::absolute(
            "grossMargin",
            "Gross margin equals gross profit over net revenue",
            expected,
            gross_margin,
            tolerance,
        ));
    }

    // Line-item rollups, 2% relative
    if let Some(items) = tree.array("operatingExpenseItems") {
        if !items.is_empty() && !val(tree, "operatingExpenses").is_zero() {
            let sum: Decimal = items
                .iter()
                .map(|i| i.number("amount").unwrap_or(Decimal::ZERO))
                .sum();
            checks.push(MathCheck::relative(
                "operatingExpenses",
                "Expense line items approximately sum to operating expenses",
                val(tree, "operatingExpenses"),
                sum,
                RELATIVE_TOLERANCE,
            ));
        }
    }
    if let Some(items) = tree.array("revenueItems") {
        if !items.is_empty() && !net_revenue.is_zero() {
            let sum: Decimal = items
                .iter()
                .map(|i| i.number("amount").unwrap_or(Decimal::ZERO))
                .sum();
            checks.push(MathCheck::relative(
                "netRevenue",
                "Revenue line items approximately sum to net revenue",
                net_revenue,
                sum,
                RELATIVE_TOLERANCE,
            ));
        }
    }

    add_back_checks(tree, net_income, &mut checks);

    checks
}

/// Seller-discretionary add-backs: the adjusted bottom line the income
/// analysis consumes.
fn add_back_checks(tree: &FieldValue, net_income: Decimal, checks: &mut Vec<MathCheck>) {
    let add_backs = match tree.path("addBacks") {
        Some(node) => node,
        None => return,
    };

    let one_time: Decimal = add_backs
        .array("oneTimeExpenses")
        .map(|items| {
            items
                .iter()
                .map(|i| i.number("amount").unwrap_or(Decimal::ZERO))
                .sum()
        })
        .unwrap_or(Decimal::ZERO);

    let total_add_backs = val(add_backs, "totalAddBacks");
    if !total_add_backs.is_zero() {
        let expected = sum_fields(
            add_backs,
            &["depreciation", "amortization", "interest", "ownerCompensation"],
        ) + one_time;
        checks.push(MathCheck::absolute(
            "addBacks.totalAddBacks",
            "Total add-backs sum depreciation, amortization, interest, owner comp, and one-time expenses",
            expected,
            total_add_backs,
            MONEY_TOLERANCE,
        ));
    }

    let adjusted = val(add_backs, "adjustedNetIncome");
    if !adjusted.is_zero() {
        checks.push(MathCheck::absolute(
            "addBacks.adjustedNetIncome",
            "Adjusted net income equals net income plus total add-backs",
            net_income + total_add_backs,
            adjusted,
            MONEY_TOLERANCE,
        ));
    }
}

pub(super) fn balance_sheet_checks(tree: &FieldValue) -> Vec<MathCheck> {
    let mut checks = Vec::new();

    // Component rollups fire only when the components were extracted;
    // totals-only balance sheets still get the fundamental equation
    let total_assets = val(tree, "totalAssets");
    let asset_components =
        val(tree, "totalCurrentAssets") + val(tree, "netFixedAssets") + val(tree, "otherAssets");
    if !total_assets.is_zero() && !asset_components.is_zero() {
        checks.push(MathCheck::absolute(
            "totalAssets",
            "Total assets equal current assets plus net fixed assets plus other assets",
            asset_components,
            total_assets,
            MONEY_TOLERANCE,
        ));
    }

    let total_liabilities = val(tree, "totalLiabilities");
    let liability_components =
        val(tree, "totalCurrentLiabilities") + val(tree, "totalLongTermLiabilities");
    if !total_liabilities.is_zero() && !liability_components.is_zero() {
        checks.push(MathCheck::absolute(
            "totalLiabilities",
            "Total liabilities equal current plus long-term liabilities",
            liability_components,
            total_liabilities,
            MONEY_TOLERANCE,
        ));
    }

    let tle = val(tree, "totalLiabilitiesAndEquity");
    if !tle.is_zero() {
        checks.push(MathCheck::absolute(
            "totalLiabilitiesAndEquity",
            "Total liabilities and equity equals the sum of its parts",
            total_liabilities + val(tree, "totalEquity"),
            tle,
            MONEY_TOLERANCE,
        ));
    }

    // Fundamental equation: mandatory whenever both totals exist
    if has(tree, "totalAssets") && has(tree, "totalLiabilitiesAndEquity") {
        checks.push(MathCheck::absolute(
            "totalAssets",
            "Balance sheet balances: assets equal liabilities and equity",
            tle,
            total_assets,
            MONEY_TOLERANCE,
        ));
    }

    let net_fixed = val(tree, "netFixedAssets");
    if !net_fixed.is_zero() && has(tree, "propertyEquipment") {
        checks.push(MathCheck::absolute(
            "netFixedAssets",
            "Net fixed assets equal property and equipment minus accumulated depreciation",
            val(tree, "propertyEquipment") - val(tree, "accumulatedDepreciation"),
            net_fixed,
            MONEY_TOLERANCE,
        ));
    }

    checks
}

pub(super) fn rent_roll_checks(tree: &FieldValue) -> Vec<MathCheck> {
    let mut checks = Vec::new();

    let units = tree.array("units").unwrap_or(&[]);

    // A unit counts as occupied unless it says otherwise
    let occupied_rent: Decimal = units
        .iter()
        .filter(|u| unit_is_occupied(u))
        .map(|u| u.number("monthlyRent").unwrap_or(Decimal::ZERO))
        .sum();

    let total_monthly = val(tree, "totalMonthlyRent");
    if !total_monthly.is_zero() && !units.is_empty() {
        checks.push(MathCheck::absolute(
            "totalMonthlyRent",
            "Total monthly rent equals the sum over occupied units",
            occupied_rent,
            total_monthly,
            MONEY_TOLERANCE,
        ));
    }

    let total_annual = val(tree, "totalAnnualRent");
    if !total_annual.is_zero() {
        checks.push(MathCheck::absolute(
            "totalAnnualRent",
            "Total annual rent is twelve times monthly rent",
            total_monthly * dec!(12),
            total_annual,
            MONEY_TOLERANCE,
        ));
    }

    let total_units = val(tree, "totalUnits");
    let occupied_units = val(tree, "occupiedUnits");
    let occupancy_rate = val(tree, "occupancyRate");
    if !occupancy_rate.is_zero() && !total_units.is_zero() {
        let expected = occupied_units / total_units;
        let tolerance = expected.abs() * RELATIVE_TOLERANCE;
        checks.push(MathCheck::absolute(
            "occupancyRate",
            "Occupancy rate equals occupied units over total units",
            expected,
            occupancy_rate,
            tolerance,
        ));
    }

    // Unit counts must balance exactly
    if has(tree, "totalUnits") && (has(tree, "occupiedUnits") || has(tree, "vacantUnits")) {
        checks.push(MathCheck::absolute(
            "totalUnits",
            "Occupied plus vacant units equals total units",
            occupied_units + val(tree, "vacantUnits"),
            total_units,
            Decimal::ZERO,
        ));
    }

    checks
}

fn unit_is_occupied(unit: &FieldValue) -> bool {
    if let Some(status) = unit.text("status") {
        return status.eq_ignore_ascii_case("occupied");
    }
    if let Some(occupied) = unit.path("occupied").and_then(FieldValue::as_bool) {
        return occupied;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bank_statement_reconciles() {
        let tree = FieldValue::object([
            ("beginningBalance", FieldValue::num(dec!(14200.10))),
            ("totalDeposits", FieldValue::num(dec!(56000))),
            ("totalWithdrawals", FieldValue::num(dec!(48250.10))),
            ("endingBalance", FieldValue::num(dec!(21950))),
        ]);
        let checks = bank_statement_checks(&tree);
        assert_eq!(checks.len(), 1);
        assert!(checks[0].passed);
    }

    #[test]
    fn test_bank_statement_mandatory_even_with_zero_ending() {
        let tree = FieldValue::object([
            ("beginningBalance", FieldValue::num(dec!(5000))),
            ("totalWithdrawals", FieldValue::num(dec!(2000))),
            ("endingBalance", FieldValue::num(dec!(0))),
        ]);
        let checks = bank_statement_checks(&tree);
        assert_eq!(checks.len(), 1);
        assert!(!checks[0].passed);
        assert_eq!(checks[0].expected, dec!(3000));
    }

    #[test]
    fn test_deposit_itemization_within_two_percent() {
        let tree = FieldValue::object([
            ("beginningBalance", FieldValue::num(dec!(0))),
            ("totalDeposits", FieldValue::num(dec!(100000))),
            ("totalWithdrawals", FieldValue::num(dec!(100000))),
            ("endingBalance", FieldValue::num(dec!(0))),
            (
                "deposits",
                FieldValue::Array(vec![
                    FieldValue::object([("amount", FieldValue::num(dec!(60000)))]),
                    FieldValue::object([("amount", FieldValue::num(dec!(41500)))]),
                ]),
            ),
        ]);
        let checks = bank_statement_checks(&tree);
        let itemized = checks.iter().find(|c| c.field_path == "totalDeposits").unwrap();
        // $1,500 over on a $2,000 tolerance
        assert!(itemized.passed);
    }

    #[test]
    fn test_pnl_chain_and_add_backs() {
        let tree = FieldValue::object([
            ("netRevenue", FieldValue::num(dec!(850000))),
            ("cogs", FieldValue::num(dec!(340000))),
            ("grossProfit", FieldValue::num(dec!(510000))),
            ("operatingExpenses", FieldValue::num(dec!(390000))),
            ("operatingIncome", FieldValue::num(dec!(120000))),
            ("otherIncomeExpense", FieldValue::num(dec!(-5000))),
            ("incomeTaxExpense", FieldValue::num(dec!(28000))),
            ("netIncome", FieldValue::num(dec!(87000))),
            ("grossMargin", FieldValue::num(dec!(0.60))),
            (
                "addBacks",
                FieldValue::object([
                    ("depreciation", FieldValue::num(dec!(22000))),
                    ("amortization", FieldValue::num(dec!(3000))),
                    ("interest", FieldValue::num(dec!(11000))),
                    ("ownerCompensation", FieldValue::num(dec!(90000))),
                    (
                        "oneTimeExpenses",
                        FieldValue::Array(vec![FieldValue::object([
                            ("amount", FieldValue::num(dec!(7500))),
                        ])]),
                    ),
                    ("totalAddBacks", FieldValue::num(dec!(133500))),
                    ("adjustedNetIncome", FieldValue::num(dec!(220500))),
                ]),
            ),
        ]);
        let checks = profit_and_loss_checks(&tree);
        assert_eq!(checks.len(), 6);
        assert!(checks.iter().all(|c| c.passed), "{:#?}", checks);
    }

    #[test]
    fn test_balance_sheet_fundamental_failure() {
        let tree = FieldValue::object([
            ("totalAssets", FieldValue::num(dec!(448500))),
            ("totalLiabilities", FieldValue::num(dec!(131500))),
            ("totalEquity", FieldValue::num(dec!(316500))),
            ("totalLiabilitiesAndEquity", FieldValue::num(dec!(448000))),
        ]);
        let checks = balance_sheet_checks(&tree);
        let fundamental = checks
            .iter()
            .filter(|c| c.field_path == "totalAssets")
            .last()
            .unwrap();
        assert!(!fundamental.passed);
        assert_eq!(fundamental.difference, dec!(500));
    }

    #[test]
    fn test_balance_sheet_fundamental_passes() {
        let tree = FieldValue::object([
            ("totalAssets", FieldValue::num(dec!(448500))),
            ("totalLiabilities", FieldValue::num(dec!(131500))),
            ("totalEquity", FieldValue::num(dec!(317000))),
            ("totalLiabilitiesAndEquity", FieldValue::num(dec!(448500))),
        ]);
        let checks = balance_sheet_checks(&tree);
        assert!(checks.iter().all(|c| c.passed), "{:#?}", checks);
    }

    #[test]
    fn test_rent_roll_occupancy() {
        let tree = FieldValue::object([
            (
                "units",
                FieldValue::Array(vec![
                    FieldValue::object([
                        ("monthlyRent", FieldValue::num(dec!(1500))),
                        ("status", FieldValue::Text("occupied".into())),
                    ]),
                    FieldValue::object([
                        ("monthlyRent", FieldValue::num(dec!(1400))),
                        ("status", FieldValue::Text("vacant".into())),
                    ]),
                    FieldValue::object([("monthlyRent", FieldValue::num(dec!(1600)))]),
                ]),
            ),
            ("totalMonthlyRent", FieldValue::num(dec!(3100))),
            ("totalAnnualRent", FieldValue::num(dec!(37200))),
            ("totalUnits", FieldValue::num(dec!(3))),
            ("occupiedUnits", FieldValue::num(dec!(2))),
            ("vacantUnits", FieldValue::num(dec!(1))),
        ]);
        let checks = rent_roll_checks(&tree);
        assert_eq!(checks.len(), 3);
        assert!(checks.iter().all(|c| c.passed), "{:#?}", checks);
    }

    #[test]
    fn test_rent_roll_unit_count_exact() {
        let tree = FieldValue::object([
            ("totalUnits", FieldValue::num(dec!(10))),
            ("occupiedUnits", FieldValue::num(dec!(8))),
            ("vacantUnits", FieldValue::num(dec!(1))),
        ]);
        let checks = rent_roll_checks(&tree);
        let count = checks.iter().find(|c| c.field_path == "totalUnits").unwrap();
        assert!(!count.passed);
    }
}
