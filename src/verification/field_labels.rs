//! Field-path to OCR-label matching.
//!
//! Three strategies, tried in order; the first positive wins:
//!
//! 1. Tax-form label dictionary: static per-path label sets (IRS line
//!    numbers and printed captions), normalized-containment tested
//!    against the OCR key.
//! 2. Fuzzy phrase map: common financial-statement phrasings mapped to
//!    field-name tokens, for the non-tax documents.
//! 3. Direct substring: the last path segment itself against the key,
//!    when long enough to be meaningful.
//!
//! Ambiguity is fine here: when several OCR keys pass for one field, the
//! reconciler breaks ties by numeric closeness.

/// Lowercase and strip every non-alphanumeric character.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// Replace concrete array indices with `[]` so dictionary keys can be
/// written once per repeated section (`scheduleC[].netProfit_line31`).
fn strip_indices(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '[' {
            while let Some(&d) = chars.peek() {
                chars.next();
                if d == ']' {
                    break;
                }
            }
            out.push_str("[]");
        } else {
            out.push(c);
        }
    }
    out
}

fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// IRS-form label dictionary. Keys are index-stripped field paths; values
/// are the labels those amounts print under.
const TAX_FORM_LABELS: &[(&str, &[&str])] = &[
    // Form 1040
    ("income.wages_line1", &["1", "line 1", "wages"]),
    ("income.taxableInterest_line2b", &["2b", "taxable interest"]),
    ("income.ordinaryDividends_line3b", &["3b", "ordinary dividends"]),
    ("income.taxableIra_line4b", &["4b", "ira distributions"]),
    ("income.taxablePensions_line5b", &["5b", "pensions and annuities"]),
    ("income.taxableSocialSecurity_line6b", &["6b", "social security benefits"]),
    ("income.capitalGain_line7", &["7", "capital gain"]),
    ("income.otherIncome_line8", &["8", "other income"]),
    ("income.totalIncome_line9", &["9", "line 9", "total income"]),
    ("income.adjustments_line10", &["10", "adjustments to income"]),
    ("income.agi_line11", &["11", "adjusted gross income"]),
    ("deductions.standardOrItemized_line12", &["12", "standard deduction", "itemized deductions"]),
    ("deductions.qbi_line13a", &["13a", "qualified business income"]),
    ("income.taxableIncome_line15", &["15", "taxable income"]),
    ("tax.totalTax_line24", &["24", "total tax"]),
    ("tax.totalPayments_line33", &["33", "total payments"]),
    ("tax.overpaid_line34", &["34", "overpaid", "overpayment"]),
    ("tax.amountOwed_line37", &["37", "amount you owe"]),
    // W-2 summary carried on personal returns
    ("w2Summary[].wages_box1", &["box 1", "wages tips other comp"]),
    ("w2Summary[].federalWithholding_box2", &["box 2", "federal income tax withheld"]),
    // Schedule C
    ("scheduleC[].grossReceipts_line1", &["1", "gross receipts"]),
    ("scheduleC[].cogs_line4", &["4", "cost of goods sold"]),
    ("scheduleC[].grossProfit_line5", &["5", "gross profit"]),
    ("scheduleC[].otherIncome_line6", &["6", "other income"]),
    ("scheduleC[].grossIncome_line7", &["7", "gross income"]),
    ("scheduleC[].totalExpenses_line28", &["28", "total expenses"]),
    ("scheduleC[].netProfit_line31", &["31", "net profit", "net profit or loss"]),
    // Schedule E
    ("scheduleE.properties[].rentsReceived", &["3", "rents received"]),
    ("scheduleE.properties[].totalExpenses", &["20", "total expenses"]),
    ("scheduleE.properties[].netRentalIncome", &["21", "income or loss"]),
    // Business returns (1120 / 1120S / 1065 share the top block)
    ("income.grossReceipts_1a", &["1a", "gross receipts or sales"]),
    ("income.returnsAllowances_1b", &["1b", "returns and allowances"]),
    ("income.balanceAfterReturns_1c", &["1c", "balance"]),
    ("income.cogs_line2", &["2", "cost of goods sold"]),
    ("income.grossProfit_line3", &["3", "gross profit"]),
    ("income.totalIncome", &["total income"]),
    ("deductions.totalDeductions", &["total deductions"]),
    ("income.taxableIncomeBeforeNOL", &["28", "taxable income before"]),
    ("income.taxableIncome_line30", &["30", "taxable income"]),
    ("income.ordinaryBusinessIncome", &["ordinary business income"]),
    // Schedule K-1
    ("ordinaryIncome_box1", &["1", "ordinary business income"]),
    ("distributions_box19", &["19", "distributions"]),
];

/// A fuzzy mapping row: OCR phrasings on the left, field-name tokens on
/// the right.
struct FuzzyRow {
    ocr_phrases: &'static [&'static str],
    field_tokens: &'static [&'static str],
}

/// Phrase map for the non-tax documents (bank statements, P&Ls, balance
/// sheets, rent rolls).
const FUZZY_ROWS: &[FuzzyRow] = &[
    FuzzyRow {
        ocr_phrases: &["total deposits", "deposits and credits"],
        field_tokens: &["totaldeposits"],
    },
    FuzzyRow {
        ocr_phrases: &["total withdrawals", "withdrawals and debits"],
        field_tokens: &["totalwithdrawals"],
    },
    FuzzyRow {
        ocr_phrases: &["beginning balance", "opening balance", "previous balance"],
        field_tokens: &["beginningbalance", "openingbalance"],
    },
    FuzzyRow {
        ocr_phrases: &["ending balance", "closing balance", "new balance"],
        field_tokens: &["endingbalance", "closingbalance"],
    },
    FuzzyRow {
        ocr_phrases: &["net revenue", "total revenue", "gross revenue", "total sales"],
        field_tokens: &["revenue", "netrevenue", "totalrevenue", "grossrevenue"],
    },
    FuzzyRow {
        ocr_phrases: &["cost of goods sold", "cost of sales", "cogs"],
        field_tokens: &["cogs", "costofgoodssold"],
    },
    FuzzyRow {
        ocr_phrases: &["gross profit"],
        field_tokens: &["grossprofit"],
    },
    FuzzyRow {
        ocr_phrases: &["operating expenses", "total operating expenses"],
        field_tokens: &["operatingexpenses"],
    },
    FuzzyRow {
        ocr_phrases: &["operating income", "income from operations"],
        field_tokens: &["operatingincome"],
    },
    FuzzyRow {
        ocr_phrases: &["net income", "net profit", "net earnings"],
        field_tokens: &["netincome", "adjustednetincome"],
    },
    FuzzyRow {
        ocr_phrases: &["total assets"],
        field_tokens: &["totalassets"],
    },
    FuzzyRow {
        ocr_phrases: &["total liabilities"],
        field_tokens: &["totalliabilities"],
    },
    FuzzyRow {
        ocr_phrases: &["total equity", "shareholders equity", "owners equity", "members equity"],
        field_tokens: &["totalequity", "equity"],
    },
    FuzzyRow {
        ocr_phrases: &["liabilities and equity", "liabilities and stockholders equity"],
        field_tokens: &["totalliabilitiesandequity"],
    },
    FuzzyRow {
        ocr_phrases: &["accumulated depreciation"],
        field_tokens: &["accumulateddepreciation"],
    },
    FuzzyRow {
        ocr_phrases: &["property and equipment", "fixed assets"],
        field_tokens: &["propertyequipment", "netfixedassets"],
    },
    FuzzyRow {
        ocr_phrases: &["total monthly rent", "monthly rent"],
        field_tokens: &["totalmonthlyrent", "monthlyrent"],
    },
    FuzzyRow {
        ocr_phrases: &["total annual rent", "annual rent"],
        field_tokens: &["totalannualrent", "annualrent"],
    },
    FuzzyRow {
        ocr_phrases: &["occupancy"],
        field_tokens: &["occupancyrate", "occupiedunits"],
    },
    FuzzyRow {
        ocr_phrases: &["depreciation"],
        field_tokens: &["depreciation"],
    },
    FuzzyRow {
        ocr_phrases: &["amortization"],
        field_tokens: &["amortization"],
    },
    FuzzyRow {
        ocr_phrases: &["interest expense", "interest"],
        field_tokens: &["interest", "interestexpense"],
    },
];

/// Decide whether an OCR key plausibly labels a structured field.
pub fn matches_field(field_path: &str, ocr_key: &str) -> bool {
    let norm_key = normalize(ocr_key);
    if norm_key.is_empty() {
        return false;
    }

    // Strategy 1: tax-form label dictionary
    let generic_path = strip_indices(field_path);
    if let Some((_, labels)) = TAX_FORM_LABELS.iter().find(|(p, _)| *p == generic_path) {
        if labels.iter().any(|label| norm_key.contains(&normalize(label))) {
            return true;
        }
    }

    // Strategy 2: fuzzy phrase map
    let segment = normalize(last_segment(&generic_path));
    for row in FUZZY_ROWS {
        let phrase_hit = row
            .ocr_phrases
            .iter()
            .any(|p| norm_key.contains(&normalize(p)));
        if !phrase_hit {
            continue;
        }
        let token_hit = row.field_tokens.iter().any(|t| {
            let t = normalize(t);
            segment.contains(&t) || t.contains(&segment)
        });
        if token_hit {
            return true;
        }
    }

    // Strategy 3: direct substring
    if segment.len() >= 4 && (norm_key.contains(&segment) || segment.contains(&norm_key)) {
        return true;
    }

    false
}
