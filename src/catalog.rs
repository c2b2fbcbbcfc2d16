//! Loan program catalog.
//!
//! The closed registry of program records. Built once, shared
//! process-wide, never mutated: this is the only place numerical deal
//! parameters originate. Program-specific behavior elsewhere (SBA tier
//! caps, SBA compliance caps) pattern-matches on [`ProgramId`].

use rust_decimal_macros::dec;
use std::sync::OnceLock;

use crate::types::{
    BaseRateKind, DocRequirement, DocType, FeeDef, LoanProgram, ProgramCategory, ProgramId,
    StructuringRules,
};

static CATALOG: OnceLock<Vec<LoanProgram>> = OnceLock::new();

/// All programs, in canonical order.
pub fn all_programs() -> &'static [LoanProgram] {
    CATALOG.get_or_init(build_catalog)
}

/// Look up one program by id. The catalog is closed over [`ProgramId`],
/// so every id resolves.
pub fn program(id: ProgramId) -> &'static LoanProgram {
    all_programs()
        .iter()
        .find(|p| p.id == id)
        .expect("catalog covers every ProgramId")
}

fn build_catalog() -> Vec<LoanProgram> {
    vec![
        sba_7a(),
        sba_504(),
        commercial_cre(),
        dscr(),
        bank_statement(),
        conventional_business(),
        line_of_credit(),
        equipment_financing(),
        bridge(),
        crypto_collateral(),
    ]
}

fn business_tax_docs(years: u32) -> Vec<DocRequirement> {
    vec![
        DocRequirement::new(DocType::Form1120s, years),
        DocRequirement::new(DocType::Form1065, years),
        DocRequirement::new(DocType::Form1040, years),
    ]
}

fn sba_7a() -> LoanProgram {
    LoanProgram {
        id: ProgramId::Sba7a,
        name: "SBA 7(a)".to_string(),
        description: "SBA-guaranteed general purpose small business loan".to_string(),
        category: ProgramCategory::Commercial,
        required_documents: business_tax_docs(3),
        optional_documents: vec![
            DocRequirement::new(DocType::ProfitAndLoss, 1),
            DocRequirement::new(DocType::BalanceSheet, 1),
            DocRequirement::new(DocType::BankStatementChecking, 1),
        ],
        structuring: StructuringRules {
            max_ltv: dec!(0.90),
            min_dscr: dec!(1.15),
            max_dti: dec!(0),
            base_rate: BaseRateKind::Prime,
            // The published range; the per-amount tier cap overrides it
            min_spread: dec!(0.0),
            max_spread: dec!(0.03),
            max_term_months: 300,
            max_amortization_months: 300,
            min_loan_amount: dec!(25000),
            max_loan_amount: Some(dec!(5000000)),
            prepayment_penalty: Some("3-2-1 declining, terms of 15 years or more".to_string()),
            requires_appraisal: true,
            requires_personal_guaranty: true,
            collateral_types: vec![
                "business assets".to_string(),
                "commercial real estate".to_string(),
            ],
            interest_only: false,
        },
        applicable_regulations: vec![
            "SBA SOP 50 10".to_string(),
            "ECOA / Regulation B".to_string(),
            "BSA/AML".to_string(),
        ],
        state_specific_rules: vec![],
        standard_covenants: vec![
            "Provide annual business and personal tax returns within 120 days of fiscal year end"
                .to_string(),
            "Maintain hazard insurance on all pledged collateral".to_string(),
            "No additional indebtedness over $50,000 without lender consent".to_string(),
        ],
        standard_fees: vec![
            FeeDef::percent("SBA guaranty fee", dec!(0.03), "SBA guaranty fee on guaranteed portion"),
            FeeDef::flat("Packaging fee", dec!(2500), "Loan packaging and processing"),
        ],
        required_output_docs: vec![
            "Authorization and Loan Agreement".to_string(),
            "Note".to_string(),
            "Unconditional Guarantee (SBA Form 148)".to_string(),
        ],
        compliance_checks: vec![
            "sba_7a_caps".to_string(),
            "state_usury".to_string(),
            "ofac".to_string(),
        ],
        late_fee_percent: dec!(0.05),
        late_fee_grace_days: 10,
    }
}

fn sba_504() -> LoanProgram {
    LoanProgram {
        id: ProgramId::Sba504,
        name: "SBA 504".to_string(),
        description: "SBA fixed-asset financing through a certified development company"
            .to_string(),
        category: ProgramCategory::Commercial,
        required_documents: business_tax_docs(3),
        optional_documents: vec![DocRequirement::new(DocType::BalanceSheet, 2)],
        structuring: StructuringRules {
            max_ltv: dec!(0.90),
            min_dscr: dec!(1.25),
            max_dti: dec!(0),
            base_rate: BaseRateKind::Treasury,
            min_spread: dec!(0.015),
            max_spread: dec!(0.03),
            max_term_months: 300,
            max_amortization_months: 300,
            min_loan_amount: dec!(125000),
            max_loan_amount: Some(dec!(5000000)),
            prepayment_penalty: Some("Declining over first 10 years".to_string()),
            requires_appraisal: true,
            requires_personal_guaranty: true,
            collateral_types: vec![
                "commercial real estate".to_string(),
                "heavy equipment".to_string(),
            ],
            interest_only: false,
        },
        applicable_regulations: vec![
            "SBA SOP 50 10".to_string(),
            "ECOA / Regulation B".to_string(),
        ],
        state_specific_rules: vec![],
        standard_covenants: vec![
            "Occupy at least 51% of the financed property".to_string(),
            "Provide annual financial statements within 120 days of fiscal year end".to_string(),
        ],
        standard_fees: vec![
            FeeDef::percent("CDC processing fee", dec!(0.015), "Certified development company fee"),
            FeeDef::flat("Closing fee", dec!(2500), "Document preparation and closing"),
        ],
        required_output_docs: vec!["Note".to_string(), "Deed of Trust".to_string()],
        compliance_checks: vec!["sba_504_cap".to_string(), "state_usury".to_string()],
        late_fee_percent: dec!(0.05),
        late_fee_grace_days: 15,
    }
}

fn commercial_cre() -> LoanProgram {
    LoanProgram {
        id: ProgramId::CommercialCre,
        name: "Commercial Real Estate".to_string(),
        description: "Permanent financing for income-producing commercial property".to_string(),
        category: ProgramCategory::Commercial,
        required_documents: vec![
            DocRequirement::new(DocType::RentRoll, 1),
            DocRequirement::new(DocType::Form1065, 2),
            DocRequirement::new(DocType::BalanceSheet, 1),
        ],
        optional_documents: vec![DocRequirement::new(DocType::ProfitAndLoss, 2)],
        structuring: StructuringRules {
            max_ltv: dec!(0.75),
            min_dscr: dec!(1.25),
            max_dti: dec!(0),
            base_rate: BaseRateKind::Sofr,
            min_spread: dec!(0.0225),
            max_spread: dec!(0.045),
            max_term_months: 120,
            max_amortization_months: 300,
            min_loan_amount: dec!(250000),
            max_loan_amount: Some(dec!(15000000)),
            prepayment_penalty: Some("5-4-3-2-1 declining".to_string()),
            requires_appraisal: true,
            requires_personal_guaranty: true,
            collateral_types: vec!["commercial real estate".to_string()],
            interest_only: false,
        },
        applicable_regulations: vec![
            "ECOA / Regulation B".to_string(),
            "FIRREA appraisal rules".to_string(),
            "BSA/AML".to_string(),
        ],
        state_specific_rules: vec![],
        standard_covenants: vec![
            "Maintain minimum DSCR of 1.25x, tested annually".to_string(),
            "Provide annual operating statements and rent rolls".to_string(),
            "No secondary financing without lender consent".to_string(),
        ],
        standard_fees: vec![
            FeeDef::percent("Origination fee", dec!(0.01), "Lender origination"),
            FeeDef::flat("Appraisal fee", dec!(4500), "Third-party appraisal"),
            FeeDef::flat("Environmental report", dec!(2800), "Phase I environmental"),
        ],
        required_output_docs: vec![
            "Loan Agreement".to_string(),
            "Promissory Note".to_string(),
            "Mortgage / Deed of Trust".to_string(),
            "Assignment of Leases and Rents".to_string(),
        ],
        compliance_checks: vec!["state_usury".to_string(), "flood_determination".to_string()],
        late_fee_percent: dec!(0.05),
        late_fee_grace_days: 10,
    }
}

fn dscr() -> LoanProgram {
    LoanProgram {
        id: ProgramId::Dscr,
        name: "DSCR Investor".to_string(),
        description: "Rental property loan qualified on property cash flow".to_string(),
        category: ProgramCategory::Residential,
        required_documents: vec![
            DocRequirement::new(DocType::RentRoll, 1),
            DocRequirement::new(DocType::BankStatementChecking, 1),
        ],
        optional_documents: vec![DocRequirement::new(DocType::Form1040, 1)],
        structuring: StructuringRules {
            max_ltv: dec!(0.80),
            min_dscr: dec!(1.10),
            max_dti: dec!(0),
            base_rate: BaseRateKind::Treasury,
            min_spread: dec!(0.025),
            max_spread: dec!(0.055),
            max_term_months: 360,
            max_amortization_months: 360,
            min_loan_amount: dec!(100000),
            max_loan_amount: Some(dec!(3000000)),
            prepayment_penalty: Some("3-2-1 declining".to_string()),
            requires_appraisal: true,
            requires_personal_guaranty: false,
            collateral_types: vec!["residential investment property".to_string()],
            interest_only: false,
        },
        applicable_regulations: vec![
            "ECOA / Regulation B".to_string(),
            "Dodd-Frank ATR (business purpose exemption)".to_string(),
        ],
        state_specific_rules: vec![],
        standard_covenants: vec![
            "Maintain property insurance naming lender as mortgagee".to_string(),
            "Property taxes current at all times".to_string(),
        ],
        standard_fees: vec![
            FeeDef::percent("Origination fee", dec!(0.015), "Lender origination"),
            FeeDef::flat("Appraisal fee", dec!(650), "1007 rent schedule appraisal"),
        ],
        required_output_docs: vec!["Note".to_string(), "Security Instrument".to_string()],
        compliance_checks: vec!["state_usury".to_string(), "prepayment_penalty".to_string()],
        late_fee_percent: dec!(0.05),
        late_fee_grace_days: 15,
    }
}

fn bank_statement() -> LoanProgram {
    LoanProgram {
        id: ProgramId::BankStatement,
        name: "Bank Statement".to_string(),
        description: "Self-employed borrower program qualified on deposit history".to_string(),
        category: ProgramCategory::Residential,
        required_documents: vec![
            DocRequirement::new(DocType::BankStatementChecking, 1),
            DocRequirement::new(DocType::BankStatementSavings, 1),
        ],
        optional_documents: vec![DocRequirement::new(DocType::ProfitAndLoss, 1)],
        structuring: StructuringRules {
            max_ltv: dec!(0.80),
            min_dscr: dec!(0),
            max_dti: dec!(0.50),
            base_rate: BaseRateKind::Treasury,
            min_spread: dec!(0.03),
            max_spread: dec!(0.06),
            max_term_months: 360,
            max_amortization_months: 360,
            min_loan_amount: dec!(150000),
            max_loan_amount: Some(dec!(3500000)),
            prepayment_penalty: None,
            requires_appraisal: true,
            requires_personal_guaranty: false,
            collateral_types: vec!["residential real estate".to_string()],
            interest_only: false,
        },
        applicable_regulations: vec![
            "TILA / Regulation Z".to_string(),
            "ECOA / Regulation B".to_string(),
            "Dodd-Frank ATR".to_string(),
        ],
        state_specific_rules: vec![],
        standard_covenants: vec!["Owner occupancy certified annually if applicable".to_string()],
        standard_fees: vec![
            FeeDef::percent("Origination fee", dec!(0.02), "Lender origination"),
            FeeDef::flat("Underwriting fee", dec!(1295), "Underwriting and processing"),
        ],
        required_output_docs: vec![
            "Note".to_string(),
            "Deed of Trust".to_string(),
            "TILA Disclosures".to_string(),
        ],
        compliance_checks: vec![
            "state_usury".to_string(),
            "tila_apr".to_string(),
            "state_disclosures".to_string(),
        ],
        late_fee_percent: dec!(0.04),
        late_fee_grace_days: 15,
    }
}

fn conventional_business() -> LoanProgram {
    LoanProgram {
        id: ProgramId::ConventionalBusiness,
        name: "Conventional Business Term Loan".to_string(),
        description: "Bank-held term loan for established operating companies".to_string(),
        category: ProgramCategory::Commercial,
        required_documents: business_tax_docs(2),
        optional_documents: vec![
            DocRequirement::new(DocType::ProfitAndLoss, 1),
            DocRequirement::new(DocType::BalanceSheet, 1),
        ],
        structuring: StructuringRules {
            max_ltv: dec!(0.80),
            min_dscr: dec!(1.20),
            max_dti: dec!(0),
            base_rate: BaseRateKind::Prime,
            min_spread: dec!(0.01),
            max_spread: dec!(0.035),
            max_term_months: 120,
            max_amortization_months: 120,
            min_loan_amount: dec!(50000),
            max_loan_amount: Some(dec!(2000000)),
            prepayment_penalty: None,
            requires_appraisal: false,
            requires_personal_guaranty: true,
            collateral_types: vec!["business assets".to_string()],
            interest_only: false,
        },
        applicable_regulations: vec!["ECOA / Regulation B".to_string(), "BSA/AML".to_string()],
        state_specific_rules: vec![],
        standard_covenants: vec![
            "Maintain primary depository relationship with lender".to_string(),
            "Provide annual reviewed financial statements".to_string(),
        ],
        standard_fees: vec![FeeDef::percent("Origination fee", dec!(0.01), "Lender origination")],
        required_output_docs: vec![
            "Business Loan Agreement".to_string(),
            "Note".to_string(),
            "Commercial Guaranty".to_string(),
        ],
        compliance_checks: vec!["state_usury".to_string(), "ofac".to_string()],
        late_fee_percent: dec!(0.05),
        late_fee_grace_days: 10,
    }
}

fn line_of_credit() -> LoanProgram {
    LoanProgram {
        id: ProgramId::LineOfCredit,
        name: "Business Line of Credit".to_string(),
        description: "Revolving working-capital line, interest-only draws".to_string(),
        category: ProgramCategory::Commercial,
        required_documents: vec![
            DocRequirement::new(DocType::BankStatementChecking, 1),
            DocRequirement::new(DocType::ProfitAndLoss, 1),
        ],
        optional_documents: vec![DocRequirement::new(DocType::BalanceSheet, 1)],
        structuring: StructuringRules {
            max_ltv: dec!(0.80),
            min_dscr: dec!(1.10),
            max_dti: dec!(0),
            base_rate: BaseRateKind::Prime,
            min_spread: dec!(0.005),
            max_spread: dec!(0.035),
            max_term_months: 24,
            max_amortization_months: 0,
            min_loan_amount: dec!(25000),
            max_loan_amount: Some(dec!(1000000)),
            prepayment_penalty: None,
            requires_appraisal: false,
            requires_personal_guaranty: true,
            collateral_types: vec![
                "accounts receivable".to_string(),
                "inventory".to_string(),
            ],
            interest_only: true,
        },
        applicable_regulations: vec!["ECOA / Regulation B".to_string(), "UCC Article 9".to_string()],
        state_specific_rules: vec![],
        standard_covenants: vec![
            "Annual clean-up period of 30 consecutive days".to_string(),
            "Borrowing base certificate due monthly".to_string(),
        ],
        standard_fees: vec![
            FeeDef::percent("Commitment fee", dec!(0.005), "Annual commitment fee"),
            FeeDef::flat("Documentation fee", dec!(500), "Line documentation"),
        ],
        required_output_docs: vec![
            "Revolving Credit Agreement".to_string(),
            "Note".to_string(),
        ],
        compliance_checks: vec!["state_usury".to_string()],
        late_fee_percent: dec!(0.05),
        late_fee_grace_days: 10,
    }
}

fn equipment_financing() -> LoanProgram {
    LoanProgram {
        id: ProgramId::EquipmentFinancing,
        name: "Equipment Financing".to_string(),
        description: "Term financing secured by the purchased equipment".to_string(),
        category: ProgramCategory::Commercial,
        required_documents: vec![
            DocRequirement::new(DocType::BankStatementChecking, 1),
            DocRequirement::new(DocType::Form1120s, 2),
        ],
        optional_documents: vec![DocRequirement::new(DocType::ProfitAndLoss, 1)],
        structuring: StructuringRules {
            max_ltv: dec!(1.00),
            min_dscr: dec!(1.15),
            max_dti: dec!(0),
            base_rate: BaseRateKind::Prime,
            min_spread: dec!(0.015),
            max_spread: dec!(0.05),
            max_term_months: 84,
            max_amortization_months: 84,
            min_loan_amount: dec!(25000),
            max_loan_amount: Some(dec!(1500000)),
            prepayment_penalty: None,
            requires_appraisal: false,
            requires_personal_guaranty: true,
            collateral_types: vec!["titled equipment".to_string(), "machinery".to_string()],
            interest_only: false,
        },
        applicable_regulations: vec!["ECOA / Regulation B".to_string(), "UCC Article 9".to_string()],
        state_specific_rules: vec![],
        standard_covenants: vec![
            "Equipment maintained per manufacturer specifications".to_string(),
            "Physical damage insurance with lender loss payee".to_string(),
        ],
        standard_fees: vec![
            FeeDef::percent("Origination fee", dec!(0.0125), "Lender origination"),
            FeeDef::flat("UCC filing fee", dec!(150), "Lien filing"),
        ],
        required_output_docs: vec![
            "Equipment Finance Agreement".to_string(),
            "UCC-1 Financing Statement".to_string(),
        ],
        compliance_checks: vec!["state_usury".to_string()],
        late_fee_percent: dec!(0.05),
        late_fee_grace_days: 10,
    }
}

fn bridge() -> LoanProgram {
    LoanProgram {
        id: ProgramId::Bridge,
        name: "Bridge".to_string(),
        description: "Short-term interest-only financing pending stabilization or sale"
            .to_string(),
        category: ProgramCategory::Specialty,
        required_documents: vec![
            DocRequirement::new(DocType::RentRoll, 1),
            DocRequirement::new(DocType::BalanceSheet, 1),
        ],
        optional_documents: vec![DocRequirement::new(DocType::BankStatementChecking, 1)],
        structuring: StructuringRules {
            max_ltv: dec!(0.70),
            min_dscr: dec!(0),
            max_dti: dec!(0),
            base_rate: BaseRateKind::Sofr,
            min_spread: dec!(0.04),
            max_spread: dec!(0.08),
            max_term_months: 24,
            max_amortization_months: 0,
            min_loan_amount: dec!(500000),
            max_loan_amount: Some(dec!(20000000)),
            prepayment_penalty: None,
            requires_appraisal: true,
            requires_personal_guaranty: true,
            collateral_types: vec!["commercial real estate".to_string()],
            interest_only: true,
        },
        applicable_regulations: vec![
            "ECOA / Regulation B".to_string(),
            "FIRREA appraisal rules".to_string(),
        ],
        state_specific_rules: vec![],
        standard_covenants: vec![
            "Exit strategy milestones reported quarterly".to_string(),
            "Interest reserve maintained at six months of debt service".to_string(),
        ],
        standard_fees: vec![
            FeeDef::percent("Origination fee", dec!(0.02), "Lender origination"),
            FeeDef::percent("Exit fee", dec!(0.01), "Due at payoff"),
        ],
        required_output_docs: vec!["Loan Agreement".to_string(), "Note".to_string()],
        compliance_checks: vec!["state_usury".to_string()],
        late_fee_percent: dec!(0.05),
        late_fee_grace_days: 5,
    }
}

fn crypto_collateral() -> LoanProgram {
    LoanProgram {
        id: ProgramId::CryptoCollateral,
        name: "Crypto-Collateralized".to_string(),
        description: "Interest-only loan secured by custodied digital assets".to_string(),
        category: ProgramCategory::Specialty,
        required_documents: vec![DocRequirement::new(DocType::BankStatementChecking, 1)],
        optional_documents: vec![DocRequirement::new(DocType::Form1040, 1)],
        structuring: StructuringRules {
            max_ltv: dec!(0.50),
            min_dscr: dec!(0),
            max_dti: dec!(0),
            base_rate: BaseRateKind::Sofr,
            min_spread: dec!(0.05),
            max_spread: dec!(0.09),
            max_term_months: 12,
            max_amortization_months: 0,
            min_loan_amount: dec!(50000),
            max_loan_amount: Some(dec!(5000000)),
            prepayment_penalty: None,
            requires_appraisal: false,
            requires_personal_guaranty: false,
            collateral_types: vec!["BTC".to_string(), "ETH".to_string()],
            interest_only: true,
        },
        applicable_regulations: vec![
            "BSA/AML".to_string(),
            "ECOA / Regulation B".to_string(),
            "State money transmission rules".to_string(),
        ],
        state_specific_rules: vec![],
        standard_covenants: vec![
            "Collateral maintained in qualified custody at all times".to_string(),
            "Margin call at 65% LTV; liquidation at 80% LTV".to_string(),
        ],
        standard_fees: vec![FeeDef::percent("Origination fee", dec!(0.02), "Lender origination")],
        required_output_docs: vec![
            "Loan and Security Agreement".to_string(),
            "Custody Control Agreement".to_string(),
        ],
        compliance_checks: vec!["state_usury".to_string(), "ofac".to_string()],
        late_fee_percent: dec!(0.05),
        late_fee_grace_days: 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_catalog_is_closed_over_program_ids() {
        let programs = all_programs();
        assert_eq!(programs.len(), 10);
        for id in [
            ProgramId::Sba7a,
            ProgramId::Sba504,
            ProgramId::CommercialCre,
            ProgramId::Dscr,
            ProgramId::BankStatement,
            ProgramId::ConventionalBusiness,
            ProgramId::LineOfCredit,
            ProgramId::EquipmentFinancing,
            ProgramId::Bridge,
            ProgramId::CryptoCollateral,
        ] {
            assert_eq!(program(id).id, id);
        }
    }

    #[test]
    fn test_spread_ranges_are_ordered() {
        for p in all_programs() {
            assert!(
                p.structuring.min_spread <= p.structuring.max_spread,
                "{} spread range inverted",
                p.id
            );
        }
    }

    #[test]
    fn test_interest_only_programs_have_no_amortization() {
        for p in all_programs() {
            if p.structuring.interest_only {
                assert_eq!(p.structuring.max_amortization_months, 0, "{}", p.id);
            }
        }
    }

    #[test]
    fn test_loan_ranges_are_sane() {
        for p in all_programs() {
            assert!(p.structuring.min_loan_amount > rust_decimal::Decimal::ZERO);
            if let Some(max) = p.structuring.max_loan_amount {
                assert!(max > p.structuring.min_loan_amount, "{}", p.id);
            }
        }
    }

    #[test]
    fn test_every_program_prices_and_charges() {
        for p in all_programs() {
            assert!(!p.standard_fees.is_empty(), "{} has no fees", p.id);
            assert!(!p.standard_covenants.is_empty(), "{} has no covenants", p.id);
        }
    }
}
