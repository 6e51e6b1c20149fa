//! Affordability gate: a loan may not exceed half of what the applicant's
//! disposable monthly income adds up to over the loan term.

use super::contracts::fields;
use super::models::FormData;

/// Share of disposable income over the term that may go towards the loan.
pub const AFFORDABILITY_RATIO: f64 = 0.5;

pub const UNAFFORDABLE_MESSAGE: &str =
    "Loan amount is not affordable with the declared income. Please reduce the loan amount or restart.";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AffordabilityInput {
    pub loan_amount: f64,
    pub terms_months: f64,
    pub monthly_salary: f64,
    pub additional_income: f64,
    pub mortgage: f64,
    pub other_credits: f64,
}

impl AffordabilityInput {
    /// Loan amount and term come from the data collected so far, income and
    /// obligations from the financial step being submitted. Missing values
    /// count as zero.
    pub fn gather(accumulated: &FormData, submission: &FormData) -> Self {
        Self {
            loan_amount: accumulated.number(fields::LOAN_AMOUNT).unwrap_or(0.0),
            terms_months: accumulated.number(fields::TERMS).unwrap_or(0.0),
            monthly_salary: submission.number(fields::MONTHLY_SALARY).unwrap_or(0.0),
            additional_income: submission.number(fields::ADDITIONAL_INCOME).unwrap_or(0.0),
            mortgage: submission.number(fields::MORTGAGE).unwrap_or(0.0),
            other_credits: submission.number(fields::OTHER_CREDITS).unwrap_or(0.0),
        }
    }

    pub fn disposable_income(&self) -> f64 {
        self.monthly_salary + self.additional_income - self.mortgage - self.other_credits
    }

    pub fn max_affordable_loan(&self) -> f64 {
        self.disposable_income() * self.terms_months * AFFORDABILITY_RATIO
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Affordability {
    Approved,
    Rejected { reason: String, max_loan: f64 },
}

impl Affordability {
    pub fn is_approved(&self) -> bool {
        matches!(self, Affordability::Approved)
    }
}

pub fn evaluate(input: &AffordabilityInput) -> Affordability {
    let max_loan = input.max_affordable_loan();
    if max_loan >= input.loan_amount {
        Affordability::Approved
    } else {
        Affordability::Rejected {
            reason: UNAFFORDABLE_MESSAGE.to_string(),
            max_loan,
        }
    }
}
