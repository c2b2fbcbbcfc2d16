//! Form 1040 invariants, including Schedule C and Schedule E attachments.

use rust_decimal::Decimal;

use crate::types::{FieldValue, MathCheck, MONEY_TOLERANCE, RELATIVE_TOLERANCE};

use super::{has, sum_array, sum_fields, val};

/// Schedule C Part II expense lines summed against line 28.
const SCHEDULE_C_EXPENSES: &[&str] = &[
    "advertising",
    "carAndTruck",
    "commissions",
    "contractLabor",
    "depletion",
    "depreciation_line13",
    "employeeBenefits",
    "insurance",
    "interestMortgage",
    "interestOther",
    "legal",
    "officeExpense",
    "pensionPlans",
    "rent",
    "repairs",
    "supplies",
    "taxes",
    "travel",
    "meals",
    "utilities",
    "wages",
    "otherExpenses",
];

/// Schedule E per-property expense lines.
const SCHEDULE_E_EXPENSES: &[&str] = &[
    "advertising",
    "auto",
    "cleaning",
    "commissions",
    "insurance",
    "legal",
    "managementFees",
    "mortgageInterest",
    "otherInterest",
    "repairs",
    "supplies",
    "taxes",
    "utilities",
    "depreciation",
    "other",
];

pub(super) fn checks(tree: &FieldValue) -> Vec<MathCheck> {
    let mut checks = Vec::new();

    // Line 9: total income is the sum of lines 1-8
    let total_income = val(tree, "income.totalIncome_line9");
    if !total_income.is_zero() {
        let expected = sum_fields(
            tree.path("income").unwrap_or(tree),
            &[
                "wages_line1",
                "taxableInterest_line2b",
                "ordinaryDividends_line3b",
                "taxableIra_line4b",
                "taxablePensions_line5b",
                "taxableSocialSecurity_line6b",
                "capitalGain_line7",
                "otherIncome_line8",
            ],
        );
        checks.push(MathCheck::absolute(
            "income.totalIncome_line9",
            "Total income (line 9) equals the sum of lines 1-8",
            expected,
            total_income,
            MONEY_TOLERANCE,
        ));
    }

    // Line 11: AGI = total income - adjustments
    let agi = val(tree, "income.agi_line11");
    if !agi.is_zero() {
        checks.push(MathCheck::absolute(
            "income.agi_line11",
            "AGI (line 11) equals line 9 minus line 10",
            total_income - val(tree, "income.adjustments_line10"),
            agi,
            MONEY_TOLERANCE,
        ));
    }

    // Line 15: taxable income, only when the line is present at all
    if has(tree, "income.taxableIncome_line15") {
        let expected = agi
            - val(tree, "deductions.standardOrItemized_line12")
            - val(tree, "deductions.qbi_line13a");
        checks.push(MathCheck::absolute(
            "income.taxableIncome_line15",
            "Taxable income (line 15) equals AGI minus deductions",
            expected,
            val(tree, "income.taxableIncome_line15"),
            MONEY_TOLERANCE,
        ));
    }

    // Refund / amount owed, each only when that outcome is claimed
    let total_tax = val(tree, "tax.totalTax_line24");
    let total_payments = val(tree, "tax.totalPayments_line33");
    let overpaid = val(tree, "tax.overpaid_line34");
    if !overpaid.is_zero() {
        checks.push(MathCheck::absolute(
            "tax.overpaid_line34",
            "Overpayment (line 34) equals payments minus total tax",
            total_payments - total_tax,
            overpaid,
            MONEY_TOLERANCE,
        ));
    }
    let amount_owed = val(tree, "tax.amountOwed_line37");
    if !amount_owed.is_zero() {
        checks.push(MathCheck::absolute(
            "tax.amountOwed_line37",
            "Amount owed (line 37) equals total tax minus payments",
            total_tax - total_payments,
            amount_owed,
            MONEY_TOLERANCE,
        ));
    }

    // W-2 wages roll up to line 1, within max($1, 2%)
    let wages_line1 = val(tree, "income.wages_line1");
    let w2_count = tree.array("w2Summary").map(|a| a.len()).unwrap_or(0);
    if w2_count > 0 && !wages_line1.is_zero() {
        let w2_sum = sum_array(tree, "w2Summary", "wages_box1");
        checks.push(MathCheck::relative(
            "income.wages_line1",
            "W-2 Box 1 wages approximately match line 1",
            wages_line1,
            w2_sum,
            RELATIVE_TOLERANCE,
        ));
    }

    // Attached schedules
    if let Some(instances) = tree.array("scheduleC") {
        for (i, instance) in instances.iter().enumerate() {
            schedule_c_checks(instance, i, &mut checks);
        }
    }
    if let Some(properties) = tree.array("scheduleE.properties") {
        for (i, property) in properties.iter().enumerate() {
            schedule_e_checks(property, i, &mut checks);
        }
    }

    checks
}

fn schedule_c_checks(instance: &FieldValue, index: usize, checks: &mut Vec<MathCheck>) {
    let prefix = format!("scheduleC[{}]", index);

    let gross_profit = val(instance, "grossProfit_line5");
    if !gross_profit.is_zero() {
        checks.push(MathCheck::absolute(
            format!("{}.grossProfit_line5", prefix),
            "Gross profit (line 5) equals receipts minus COGS",
            val(instance, "grossReceipts_line1") - val(instance, "cogs_line4"),
            gross_profit,
            MONEY_TOLERANCE,
        ));
    }

    if has(instance, "grossIncome_line7") {
        checks.push(MathCheck::absolute(
            format!("{}.grossIncome_line7", prefix),
            "Gross income (line 7) equals gross profit plus other income",
            gross_profit + val(instance, "otherIncome_line6"),
            val(instance, "grossIncome_line7"),
            MONEY_TOLERANCE,
        ));
    }

    let net_profit = val(instance, "netProfit_line31");
    if !net_profit.is_zero() {
        checks.push(MathCheck::absolute(
            format!("{}.netProfit_line31", prefix),
            "Net profit (line 31) equals gross income minus total expenses",
            val(instance, "grossIncome_line7") - val(instance, "totalExpenses_line28"),
            net_profit,
            MONEY_TOLERANCE,
        ));
    }

    // Expense detail only fires when any line item was extracted
    let expense_sum = sum_fields(instance, SCHEDULE_C_EXPENSES);
    if expense_sum > Decimal::ZERO {
        checks.push(MathCheck::absolute(
            format!("{}.totalExpenses_line28", prefix),
            "Part II expense lines sum to total expenses (line 28)",
            expense_sum,
            val(instance, "totalExpenses_line28"),
            MONEY_TOLERANCE,
        ));
    }
}

fn schedule_e_checks(property: &FieldValue, index: usize, checks: &mut Vec<MathCheck>) {
    let prefix = format!("scheduleE.properties[{}]", index);

    let net_rental = val(property, "netRentalIncome");
    if !net_rental.is_zero() {
        checks.push(MathCheck::absolute(
            format!("{}.netRentalIncome", prefix),
            "Net rental income equals rents received minus total expenses",
            val(property, "rentsReceived") - val(property, "totalExpenses"),
            net_rental,
            MONEY_TOLERANCE,
        ));
    }

    let expense_sum = sum_fields(property, SCHEDULE_E_EXPENSES);
    if expense_sum > Decimal::ZERO {
        checks.push(MathCheck::absolute(
            format!("{}.totalExpenses", prefix),
            "Rental expense lines sum to total expenses",
            expense_sum,
            val(property, "totalExpenses"),
            MONEY_TOLERANCE,
        ));
    }
}
