use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown calculator '{0}'")]
pub struct UnknownCalculator(pub String);

/// Section of the site a calculator belongs to. Forms the first path
/// segment of both the page and the API route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Mortgage,
    Investment,
    Debt,
    Tax,
    Specialized,
    Budget,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mortgage => "mortgage",
            Self::Investment => "investment",
            Self::Debt => "debt",
            Self::Tax => "tax",
            Self::Specialized => "specialized",
            Self::Budget => "budget",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CalculatorKey {
    Repayment,
    RentVsBuy,
    Refinance,
    Affordability,
    CompoundInterest,
    Retirement401k,
    Sip,
    Fire,
    StudentLoan,
    CreditCard,
    AutoLoan,
    PersonalLoan,
    TakeHomePay,
    Freelance,
    CapitalGains,
    Inflation,
    RuleOf72,
    LatteFactor,
    Budget,
}

impl CalculatorKey {
    /// Every calculator in site order.
    pub const ALL: [CalculatorKey; 19] = [
        Self::Repayment,
        Self::RentVsBuy,
        Self::Refinance,
        Self::Affordability,
        Self::CompoundInterest,
        Self::Retirement401k,
        Self::Sip,
        Self::Fire,
        Self::StudentLoan,
        Self::CreditCard,
        Self::AutoLoan,
        Self::PersonalLoan,
        Self::TakeHomePay,
        Self::Freelance,
        Self::CapitalGains,
        Self::Inflation,
        Self::RuleOf72,
        Self::LatteFactor,
        Self::Budget,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Self::Repayment => "repayment",
            Self::RentVsBuy => "rent-vs-buy",
            Self::Refinance => "refinance",
            Self::Affordability => "affordability",
            Self::CompoundInterest => "compound-interest",
            Self::Retirement401k => "401k-pension",
            Self::Sip => "sip",
            Self::Fire => "fire",
            Self::StudentLoan => "student-loan",
            Self::CreditCard => "credit-card",
            Self::AutoLoan => "auto-loan",
            Self::PersonalLoan => "personal-loan",
            Self::TakeHomePay => "take-home-pay",
            Self::Freelance => "freelance",
            Self::CapitalGains => "capital-gains",
            Self::Inflation => "inflation",
            Self::RuleOf72 => "rule-of-72",
            Self::LatteFactor => "latte-factor",
            Self::Budget => "budget",
        }
    }

    pub fn domain(&self) -> Domain {
        match self {
            Self::Repayment | Self::RentVsBuy | Self::Refinance | Self::Affordability => {
                Domain::Mortgage
            }
            Self::CompoundInterest | Self::Retirement401k | Self::Sip | Self::Fire => {
                Domain::Investment
            }
            Self::StudentLoan | Self::CreditCard | Self::AutoLoan | Self::PersonalLoan => {
                Domain::Debt
            }
            Self::TakeHomePay | Self::Freelance | Self::CapitalGains => Domain::Tax,
            Self::Inflation | Self::RuleOf72 | Self::LatteFactor => Domain::Specialized,
            Self::Budget => Domain::Budget,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Repayment => "Mortgage Repayment",
            Self::RentVsBuy => "Rent vs Buy",
            Self::Refinance => "Mortgage Refinance",
            Self::Affordability => "Home Affordability",
            Self::CompoundInterest => "Compound Interest",
            Self::Retirement401k => "401(k) / Pension",
            Self::Sip => "SIP Calculator",
            Self::Fire => "FIRE Number",
            Self::StudentLoan => "Student Loan Refinance",
            Self::CreditCard => "Credit Card Payoff",
            Self::AutoLoan => "Auto Loan vs Lease",
            Self::PersonalLoan => "Personal Loan Eligibility",
            Self::TakeHomePay => "Take-Home Pay",
            Self::Freelance => "Freelance Tax",
            Self::CapitalGains => "Capital Gains Tax",
            Self::Inflation => "Inflation Calculator",
            Self::RuleOf72 => "Rule of 72",
            Self::LatteFactor => "Latte Factor",
            Self::Budget => "Budget Planner",
        }
    }

    /// Route the calculation service answers on, e.g. `/api/mortgage/repayment`.
    pub fn api_path(&self) -> String {
        format!("/api{}", self.page_path())
    }

    /// Page the calculator form lives on, e.g. `/mortgage/repayment`. The
    /// budget planner is its own section and sits directly at `/budget`.
    pub fn page_path(&self) -> String {
        match self.domain() {
            Domain::Budget => format!("/{}", self.slug()),
            domain => format!("/{}/{}", domain.as_str(), self.slug()),
        }
    }
}

impl fmt::Display for CalculatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for CalculatorKey {
    type Err = UnknownCalculator;

    /// Accepts the bare slug (`rent-vs-buy`) or the page path
    /// (`/mortgage/rent-vs-buy`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_matches('/');
        let slug = wanted.rsplit('/').next().unwrap_or(wanted);
        Self::ALL
            .into_iter()
            .find(|key| key.slug().eq_ignore_ascii_case(slug))
            .ok_or_else(|| UnknownCalculator(s.to_string()))
    }
}
