//! Credit memo assembly.
//!
//! Deterministic layout in a fixed section order:
//!
//! 1. Title page (page break after)
//! 2. Borrower summary table
//! 3. Executive summary
//! 4. Financial ratios with rating-colored cells
//! 5. Income analysis
//! 6. DTI detail
//! 7. Cash flow analysis
//! 8. Business analysis (omitted when absent)
//! 9. Risk assessment (score callout + sorted flags)
//! 10. Verification summary
//! 11. Document inventory
//! 12. Disclaimer
//!
//! Everything on the page derives from the inputs; no external
//! generation happens here.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{
    Analysis, CreditResult, DecimalExt, DocType, DocumentStatus, FlagSeverity,
    VerificationSummary,
};

use super::document::{Callout, Cell, MemoDocument, Row, Table, TextRun};
use super::render;
use super::style;

/// One row of the document inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInventoryEntry {
    pub file_name: String,
    pub doc_type: DocType,
    #[serde(default)]
    pub year: Option<i32>,
    pub status: DocumentStatus,
}

impl From<&crate::types::Document> for DocumentInventoryEntry {
    fn from(document: &crate::types::Document) -> Self {
        DocumentInventoryEntry {
            file_name: document.file_name.clone(),
            doc_type: document.doc_type,
            year: document.year,
            status: document.status,
        }
    }
}

/// Everything the memo renders from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoInput {
    pub borrower_name: String,
    #[serde(default)]
    pub loan_purpose: Option<String>,
    pub requested_amount: Decimal,
    #[serde(default)]
    pub analyst_name: Option<String>,
    /// Supplied by the caller so identical inputs render identical bytes
    pub prepared_on: NaiveDate,
    pub analysis: Analysis,
    #[serde(default)]
    pub verification: Option<VerificationSummary>,
    #[serde(default)]
    pub documents: Vec<DocumentInventoryEntry>,
}

/// Build the credit memo and render it to bytes.
pub fn build_credit_memo(input: &MemoInput) -> CreditResult<Vec<u8>> {
    let doc = assemble(input);
    log::debug!(
        "memo: {} blocks for {}",
        doc.blocks.len(),
        input.borrower_name
    );
    Ok(render::render(&doc))
}

fn assemble(input: &MemoInput) -> MemoDocument {
    let mut doc = MemoDocument {
        header_text: format!("{} - CONFIDENTIAL", input.borrower_name),
        footer_text: "CONFIDENTIAL".to_string(),
        blocks: Vec::new(),
    };

    title_page(&mut doc, input);
    borrower_summary(&mut doc, input);
    executive_summary(&mut doc, input);
    financial_ratios(&mut doc, &input.analysis);
    income_analysis(&mut doc, &input.analysis);
    dti_detail(&mut doc, &input.analysis);
    cash_flow_analysis(&mut doc, &input.analysis);
    business_analysis(&mut doc, &input.analysis);
    risk_assessment(&mut doc, &input.analysis);
    verification_summary(&mut doc, input.verification.as_ref());
    document_inventory(&mut doc, &input.documents);
    disclaimer(&mut doc);

    doc
}

// === Section 1 ===
fn title_page(doc: &mut MemoDocument, input: &MemoInput) {
    doc.heading(0, "CREDIT MEMORANDUM");
    doc.paragraph(vec![TextRun::bold(input.borrower_name.as_str()).with_size(16)]);
    doc.paragraph(vec![
        TextRun::plain("Requested amount: "),
        TextRun::bold(format_money(input.requested_amount)),
    ]);
    if let Some(purpose) = &input.loan_purpose {
        doc.paragraph(vec![
            TextRun::plain("Purpose: "),
            TextRun::plain(purpose.clone()),
        ]);
    }
    doc.paragraph(vec![
        TextRun::plain("Prepared: "),
        TextRun::plain(input.prepared_on.format("%B %e, %Y").to_string()),
    ]);
    if let Some(analyst) = &input.analyst_name {
        doc.paragraph(vec![
            TextRun::plain("Analyst: "),
            TextRun::plain(analyst.clone()),
        ]);
    }
    let rating = input.analysis.summary.risk_rating.to_string();
    doc.paragraph(vec![
        TextRun::plain("Risk rating: "),
        TextRun::colored(rating.as_str(), style::rating_color(&rating)).with_bold(),
    ]);
    doc.callout(Callout {
        border: style::NAVY,
        fill: style::PALE_BLUE,
        lines: vec![vec![TextRun::bold(
            "CONFIDENTIAL - Prepared for internal credit committee use only. \
             Do not distribute outside the institution.",
        )]],
    });
    doc.page_break();
}

// === Section 2 ===
fn borrower_summary(doc: &mut MemoDocument, input: &MemoInput) {
    doc.heading(1, "Borrower Summary");
    let summary = &input.analysis.summary;
    let mut rows = vec![
        summary_row("Borrower", &input.borrower_name),
        summary_row("Requested amount", &format_money(input.requested_amount)),
        summary_row(
            "Qualifying income (annual)",
            &format_money(summary.qualifying_income),
        ),
        summary_row("Months of reserves", &format_number(summary.months_of_reserves, 1)),
        summary_row("Risk score", &input.analysis.risk_score.to_string()),
    ];
    if let Some(purpose) = &input.loan_purpose {
        rows.insert(1, summary_row("Loan purpose", purpose));
    }
    doc.table(Table::new(vec![1, 2], rows));
}

fn summary_row(label: &str, value: &str) -> Row {
    Row::new(vec![Cell::bold(label), Cell::text(value)])
}

// === Section 3 ===
fn executive_summary(doc: &mut MemoDocument, input: &MemoInput) {
    doc.heading(1, "Executive Summary");
    let summary = &input.analysis.summary;

    let mut opening = format!(
        "{} has requested {} in financing. The file carries a {} risk rating \
         with a composite score of {} out of 100.",
        input.borrower_name,
        format_money(input.requested_amount),
        summary.risk_rating,
        input.analysis.risk_score,
    );
    if let Some(purpose) = &input.loan_purpose {
        opening.push_str(&format!(" Stated purpose: {}.", purpose));
    }
    doc.paragraph(vec![TextRun::plain(opening)]);

    let mut coverage = format!(
        "Qualifying income is {} annually with {} months of liquid reserves.",
        format_money(summary.qualifying_income),
        format_number(summary.months_of_reserves, 1),
    );
    if let Some(dscr) = summary.global_dscr {
        coverage.push_str(&format!(" Global debt service coverage stands at {}.", format_number(dscr, 2)));
    }
    if let Some(dti) = summary.back_end_dti {
        coverage.push_str(&format!(
            " Back-end debt-to-income is {}%.",
            format_number(dti * dec!(100), 1)
        ));
    }
    doc.paragraph(vec![TextRun::plain(coverage)]);

    let flags = &input.analysis.risk_flags;
    if !flags.is_empty() {
        let critical = flags
            .iter()
            .filter(|f| matches!(f.severity, FlagSeverity::Critical | FlagSeverity::High))
            .count();
        doc.paragraph(vec![TextRun::plain(format!(
            "The analysis raised {} risk flag(s), {} of which are high severity or above; \
             see the risk assessment section for detail.",
            flags.len(),
            critical,
        ))]);
    }
}

// === Section 4 ===
fn financial_ratios(doc: &mut MemoDocument, analysis: &Analysis) {
    doc.heading(1, "Financial Ratios");
    let summary = &analysis.summary;
    let mut rows = vec![Row::header(vec![
        Cell::text("Ratio"),
        Cell::text("Value"),
        Cell::text("Assessment"),
    ])];

    if let Some(dscr) = summary.global_dscr {
        let rating = analysis
            .dscr
            .as_ref()
            .map(|d| d.rating.clone())
            .unwrap_or_else(|| default_dscr_rating(dscr));
        rows.push(ratio_row("Global DSCR", &format_number(dscr, 2), &rating));
    }
    if let Some(dti) = summary.back_end_dti {
        let rating = analysis
            .dti
            .as_ref()
            .map(|d| d.rating.clone())
            .unwrap_or_else(|| default_dti_rating(dti));
        rows.push(ratio_row(
            "Back-end DTI",
            &format!("{}%", format_number(dti * dec!(100), 1)),
            &rating,
        ));
    }
    let reserves_rating = analysis
        .liquidity
        .rating
        .clone()
        .unwrap_or_else(|| default_reserves_rating(summary.months_of_reserves));
    rows.push(ratio_row(
        "Months of reserves",
        &format_number(summary.months_of_reserves, 1),
        &reserves_rating,
    ));

    doc.table(Table::new(vec![2, 1, 2], rows));
}

fn ratio_row(name: &str, value: &str, rating: &str) -> Row {
    let color = style::rating_color(rating);
    Row::new(vec![
        Cell::text(name),
        Cell::money(value),
        Cell {
            runs: vec![TextRun::colored(rating, color).with_bold()],
            fill: None,
            align: super::document::Align::Center,
        },
    ])
}

fn default_dscr_rating(dscr: Decimal) -> String {
    if dscr >= dec!(1.5) {
        "strong".into()
    } else if dscr >= dec!(1.25) {
        "good".into()
    } else if dscr >= dec!(1.1) {
        "adequate".into()
    } else {
        "weak".into()
    }
}

fn default_dti_rating(dti: Decimal) -> String {
    if dti <= dec!(0.36) {
        "strong".into()
    } else if dti <= dec!(0.43) {
        "acceptable".into()
    } else if dti <= dec!(0.5) {
        "marginal".into()
    } else {
        "poor".into()
    }
}

fn default_reserves_rating(months: Decimal) -> String {
    if months >= dec!(6) {
        "strong".into()
    } else if months >= dec!(3) {
        "adequate".into()
    } else {
        "below guideline".into()
    }
}

// === Section 5 ===
fn income_analysis(doc: &mut MemoDocument, analysis: &Analysis) {
    doc.heading(1, "Income Analysis");
    let income = &analysis.income;

    if income.sources.is_empty() {
        doc.paragraph(vec![TextRun::colored(
            "No income source detail provided.",
            style::GRAY,
        )]);
    } else {
        let mut rows = vec![Row::header(vec![
            Cell::text("Source"),
            Cell::text("Category"),
            Cell::text("Annual amount"),
        ])];
        for source in &income.sources {
            rows.push(Row::new(vec![
                Cell::text(source.name.as_str()),
                Cell::text(source.category.as_str()),
                Cell::money(format_money(source.annual_amount)),
            ]));
        }
        rows.push(Row::new(vec![
            Cell::bold("Total"),
            Cell::text(""),
            Cell::money(format_money(income.total_annual)).filled(style::LIGHT_GRAY),
        ]));
        doc.table(Table::new(vec![2, 2, 1], rows));
    }

    if let Some(trend) = &income.trend {
        doc.paragraph(vec![
            TextRun::plain("Trend: "),
            TextRun::bold(trend.clone()),
        ]);
    }
    bullet_notes(doc, &income.notes);
}

// === Section 6 ===
fn dti_detail(doc: &mut MemoDocument, analysis: &Analysis) {
    doc.heading(1, "Debt-to-Income Detail");
    let dti = match &analysis.dti {
        Some(dti) => dti,
        None => {
            doc.paragraph(vec![TextRun::colored(
                "DTI analysis not applicable to this file.",
                style::GRAY,
            )]);
            return;
        }
    };

    let mut rows = vec![Row::header(vec![
        Cell::text("Creditor"),
        Cell::text("Monthly payment"),
        Cell::text("Balance"),
    ])];
    for item in &dti.debt_items {
        rows.push(Row::new(vec![
            Cell::text(item.creditor.as_str()),
            Cell::money(format_money(item.monthly_payment)),
            Cell::money(
                item.balance
                    .map(format_money)
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]));
    }
    rows.push(Row::new(vec![
        Cell::bold("Total monthly debt"),
        Cell::money(format_money(dti.total_monthly_debt)).filled(style::LIGHT_GRAY),
        Cell::text(""),
    ]));
    rows.push(Row::new(vec![
        Cell::bold("Gross monthly income"),
        Cell::money(format_money(dti.gross_monthly_income)),
        Cell::text(""),
    ]));
    doc.table(Table::new(vec![2, 1, 1], rows));

    doc.paragraph(vec![
        TextRun::plain("Assessment: "),
        TextRun::colored(dti.rating.as_str(), style::rating_color(&dti.rating)).with_bold(),
    ]);
}

// === Section 7 ===
fn cash_flow_analysis(doc: &mut MemoDocument, analysis: &Analysis) {
    doc.heading(1, "Cash Flow Analysis");
    let cash_flow = &analysis.cash_flow;

    doc.table(Table::new(
        vec![2, 1],
        vec![
            summary_row(
                "Average monthly deposits",
                &format_money(cash_flow.avg_monthly_deposits),
            ),
            summary_row(
                "Average monthly withdrawals",
                &format_money(cash_flow.avg_monthly_withdrawals),
            ),
            summary_row(
                "Net monthly cash flow",
                &format_money(cash_flow.net_monthly_cash_flow),
            ),
        ],
    ));

    if !cash_flow.large_deposits.is_empty() {
        doc.paragraph(vec![TextRun::bold("Large deposits requiring sourcing")]);
        let mut rows = vec![Row::header(vec![
            Cell::text("Date"),
            Cell::text("Amount"),
            Cell::text("Source"),
        ])];
        for deposit in &cash_flow.large_deposits {
            rows.push(Row::new(vec![
                Cell::text(deposit.date.as_str()),
                Cell::money(format_money(deposit.amount)),
                Cell::text(deposit.source.clone().unwrap_or_else(|| "unsourced".into())),
            ]));
        }
        doc.table(Table::new(vec![1, 1, 2], rows));
    }
    bullet_notes(doc, &cash_flow.notes);
}

// === Section 8 (omitted when absent) ===
fn business_analysis(doc: &mut MemoDocument, analysis: &Analysis) {
    let business = match &analysis.business {
        Some(business) => business,
        None => return,
    };
    doc.heading(1, "Business Analysis");

    let mut intro = business.business_name.clone();
    if let Some(entity) = &business.entity_type {
        intro.push_str(&format!(" ({})", entity));
    }
    if let Some(years) = business.years_in_business {
        intro.push_str(&format!(", {} years in business", years));
    }
    doc.paragraph(vec![TextRun::plain(intro)]);

    if !business.revenue_by_year.is_empty() {
        let mut rows = vec![Row::header(vec![
            Cell::text("Year"),
            Cell::text("Revenue"),
            Cell::text("Net income"),
        ])];
        for year in &business.revenue_by_year {
            rows.push(Row::new(vec![
                Cell::text(year.year.to_string()),
                Cell::money(format_money(year.revenue)),
                Cell::money(format_money(year.net_income)),
            ]));
        }
        doc.table(Table::new(vec![1, 2, 2], rows));
    }

    let mut margins = Vec::new();
    if let Some(gross) = business.gross_margin {
        margins.push(format!("gross margin {}%", format_number(gross * dec!(100), 1)));
    }
    if let Some(net) = business.net_margin {
        margins.push(format!("net margin {}%", format_number(net * dec!(100), 1)));
    }
    if !margins.is_empty() {
        doc.paragraph(vec![TextRun::plain(format!("Margins: {}.", margins.join(", ")))]);
    }
    bullet_notes(doc, &business.notes);
}

// === Section 9 ===
fn risk_assessment(doc: &mut MemoDocument, analysis: &Analysis) {
    doc.heading(1, "Risk Assessment");

    let score = analysis.risk_score;
    let score_color = if score >= 75 {
        style::GREEN
    } else if score >= 50 {
        style::AMBER
    } else {
        style::RED
    };
    doc.callout(Callout {
        border: score_color,
        fill: style::LIGHT_GRAY,
        lines: vec![vec![
            TextRun::plain("Composite risk score: "),
            TextRun::colored(format!("{} / 100", score), score_color)
                .with_bold()
                .with_size(14),
        ]],
    });

    if analysis.risk_flags.is_empty() {
        doc.paragraph(vec![TextRun::plain("No risk flags were raised.")]);
        return;
    }

    let mut flags: Vec<_> = analysis.risk_flags.iter().collect();
    flags.sort_by_key(|f| f.severity);

    for flag in flags {
        let badge = style::flag_color(flag.severity);
        let mut lines = vec![
            vec![
                TextRun::colored(flag.severity.to_string().to_uppercase(), badge).with_bold(),
                TextRun::bold(format!("  {}", flag.title)),
                TextRun::colored(format!("  [{}]", flag.category), style::GRAY),
            ],
            vec![TextRun::plain(flag.description.as_str())],
        ];
        if let Some(recommendation) = &flag.recommendation {
            lines.push(vec![
                TextRun::bold("Recommendation: "),
                TextRun::plain(recommendation.clone()),
            ]);
        }
        doc.callout(Callout {
            border: badge,
            fill: style::flag_fill(flag.severity),
            lines,
        });
    }
}

// === Section 10 ===
fn verification_summary(doc: &mut MemoDocument, summary: Option<&VerificationSummary>) {
    doc.heading(1, "Verification Summary");
    let summary = match summary {
        Some(summary) => summary,
        None => {
            doc.paragraph(vec![TextRun::colored(
                "No verification results were available for this file.",
                style::GRAY,
            )]);
            return;
        }
    };

    let comparison_rate = summary.comparison_match_rate;
    let check_rate = summary.check_pass_rate;
    doc.table(Table::new(
        vec![2, 1, 1],
        vec![
            Row::header(vec![
                Cell::text("Verification path"),
                Cell::text("Passed"),
                Cell::text("Rate"),
            ]),
            Row::new(vec![
                Cell::text("OCR cross-check"),
                Cell::money(format!(
                    "{} / {}",
                    summary.comparisons_matched, summary.comparisons_total
                )),
                rate_cell(comparison_rate),
            ]),
            Row::new(vec![
                Cell::text("Arithmetic checks"),
                Cell::money(format!("{} / {}", summary.checks_passed, summary.checks_total)),
                rate_cell(check_rate),
            ]),
        ],
    ));
}

fn rate_cell(rate: Decimal) -> Cell {
    let percent = (rate * dec!(100)).round_money();
    Cell {
        runs: vec![
            TextRun::colored(format!("{}%", format_number(percent, 1)), style::pass_rate_color(rate))
                .with_bold(),
        ],
        fill: None,
        align: super::document::Align::Center,
    }
}

// === Section 11 ===
fn document_inventory(doc: &mut MemoDocument, documents: &[DocumentInventoryEntry]) {
    doc.heading(1, "Document Inventory");
    if documents.is_empty() {
        doc.paragraph(vec![TextRun::colored("No documents on file.", style::GRAY)]);
        return;
    }

    let mut rows = vec![Row::header(vec![
        Cell::text("File"),
        Cell::text("Type"),
        Cell::text("Year"),
        Cell::text("Status"),
    ])];
    for entry in documents {
        rows.push(Row::new(vec![
            Cell::text(entry.file_name.as_str()),
            Cell::text(entry.doc_type.to_string()),
            Cell::text(
                entry
                    .year
                    .map(|y| y.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::text(format!("{:?}", entry.status).to_lowercase()),
        ]));
    }
    doc.table(Table::new(vec![3, 2, 1, 1], rows));
}

// === Section 12 ===
fn disclaimer(doc: &mut MemoDocument) {
    doc.callout(Callout {
        border: style::GRAY,
        fill: style::LIGHT_GRAY,
        lines: vec![vec![TextRun::plain(
            "This memorandum was prepared from borrower-provided documents and \
             third-party data for credit evaluation purposes. Figures are subject \
             to verification at closing. This document does not constitute a \
             commitment to lend.",
        )
        .with_italic()]],
    });
}

// === Formatting helpers ===

fn bullet_notes(doc: &mut MemoDocument, notes: &[String]) {
    for note in notes {
        doc.paragraph(vec![TextRun::plain(format!("\u{2022} {}", note))]);
    }
}

/// `$1,234,567.89`, parenthesized when negative.
pub(crate) fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_money().abs();
    let text = rounded.to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), format!("{:0<2}", f)),
        None => (text, "00".to_string()),
    };

    let mut grouped = String::new();
    for (count, c) in int_part.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();

    if amount < Decimal::ZERO {
        format!("(${}.{})", grouped, frac_part)
    } else {
        format!("${}.{}", grouped, frac_part)
    }
}

/// Fixed-precision number without currency dressing.
pub(crate) fn format_number(value: Decimal, places: u32) -> String {
    value.round_dp(places).to_string()
}
