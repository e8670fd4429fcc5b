use serde::Deserialize;

use super::{Calculator, require};
use crate::api::CalculationError;
use crate::calculations::{loan_payment, months_in, months_to_payoff};
use crate::format;
use crate::models::presets::{PERSONAL_LOAN_ROUGH_APR, STUDENT_LOAN_UNDERGRAD_RATE, US_CC_AVG_APR};
use crate::models::{
    CalculatorKey, ChartKind, ChartSpec, Dataset, DisplayModel, Emphasis, FieldSpec, FormInput,
    LineItem, PreviewEstimate, ShapeContext, Table, Tone,
};

// =============================================================================
// Student loan refinance
// =============================================================================

pub struct StudentLoan;

const STUDENT_LOAN_FIELDS: &[FieldSpec] = &[
    FieldSpec::number("loan_balance", "Loan balance", 35_000.0),
    FieldSpec::number("current_rate", "Current rate (%)", STUDENT_LOAN_UNDERGRAD_RATE),
    FieldSpec::choice(
        "loan_type",
        "Loan type",
        "custom",
        &["undergrad", "grad", "parent_plus", "custom"],
    ),
    FieldSpec::number("current_term_years", "Current term (years)", 10.0),
    FieldSpec::number("new_rate", "New rate (%)", 5.0),
    FieldSpec::number("new_term_years", "New term (years)", 10.0),
    FieldSpec::number("income", "Annual income", 60_000.0),
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StudentLoanResponse {
    pub current_monthly: f64,
    pub new_monthly: f64,
    pub monthly_savings: f64,
    pub total_interest_current: f64,
    pub total_interest_new: f64,
    pub lifetime_savings: f64,
    pub breakeven_months: Option<f64>,
    pub idr_monthly: f64,
    #[serde(default)]
    pub federal_benefits_warning: String,
}

impl Calculator for StudentLoan {
    type Response = StudentLoanResponse;

    fn key(&self) -> CalculatorKey {
        CalculatorKey::StudentLoan
    }

    fn schema(&self) -> &'static [FieldSpec] {
        STUDENT_LOAN_FIELDS
    }

    fn preview(
        &self,
        input: &FormInput,
    ) -> Option<PreviewEstimate> {
        let balance = input.number("loan_balance");
        if balance <= 0.0 {
            return None;
        }
        let months = (input.number("new_term_years") * 12.0).trunc() as i64;
        let payment = loan_payment(balance, input.number("new_rate"), months)?;
        PreviewEstimate::currency("New monthly payment", payment)
    }

    fn shape(
        &self,
        r: &StudentLoanResponse,
        ctx: &ShapeContext,
    ) -> DisplayModel {
        let savings_emphasis = if r.lifetime_savings >= 0.0 {
            Emphasis::Positive
        } else {
            Emphasis::Negative
        };
        DisplayModel::new()
            .headline("New monthly payment", ctx.money(r.new_monthly))
            .headline("Monthly savings", ctx.money(r.monthly_savings))
            .line("Current payment", ctx.money(r.current_monthly), Emphasis::Normal)
            .line("Interest, current loan", ctx.money0(r.total_interest_current), Emphasis::Muted)
            .line("Interest, refinanced", ctx.money0(r.total_interest_new), Emphasis::Muted)
            .line("Lifetime savings", ctx.money0(r.lifetime_savings), savings_emphasis)
            .line(
                "Breakeven",
                r.breakeven_months
                    .map(format::months)
                    .unwrap_or_else(|| "Immediate (no closing costs)".to_string()),
                Emphasis::Normal,
            )
            .line("Income-driven payment (est.)", ctx.money(r.idr_monthly), Emphasis::Normal)
            .chart(
                ChartSpec::new(
                    "student-loan-interest",
                    ChartKind::Bar,
                    vec!["Current".to_string(), "Refinanced".to_string()],
                )
                .dataset(Dataset::new(
                    "Total interest",
                    vec![r.total_interest_current, r.total_interest_new],
                )),
            )
            .note(Tone::Warning, r.federal_benefits_warning.clone())
    }
}

// =============================================================================
// Credit card payoff
// =============================================================================

pub struct CreditCard;

const CREDIT_CARD_FIELDS: &[FieldSpec] = &[
    FieldSpec::number("balance", "Card balance", 8_000.0),
    FieldSpec::number("apr", "APR (%)", US_CC_AVG_APR),
    FieldSpec::number("minimum_pct", "Minimum payment (% of balance)", 2.0),
    FieldSpec::number("minimum_floor", "Minimum payment floor", 25.0),
    FieldSpec::number("extra_payment", "Extra monthly payment", 100.0),
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PayoffSummary {
    pub months_to_payoff: f64,
    pub total_interest: f64,
    pub total_paid: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PayoffWithExtra {
    pub months_to_payoff: f64,
    pub total_interest: f64,
    pub total_paid: f64,
    pub interest_saved: f64,
    pub months_saved: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CardMonth {
    pub month: i64,
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreditCardResponse {
    pub minimum_only: PayoffSummary,
    pub with_extra: PayoffWithExtra,
    #[serde(default)]
    pub monthly_schedule: Vec<CardMonth>,
}

impl Calculator for CreditCard {
    type Response = CreditCardResponse;

    fn key(&self) -> CalculatorKey {
        CalculatorKey::CreditCard
    }

    fn schema(&self) -> &'static [FieldSpec] {
        CREDIT_CARD_FIELDS
    }

    /// Payoff time at the first month's payment (minimum plus extra) held
    /// fixed.
    fn preview(
        &self,
        input: &FormInput,
    ) -> Option<PreviewEstimate> {
        let balance = input.number("balance");
        let minimum = (balance * input.number("minimum_pct") / 100.0).max(input.number("minimum_floor"));
        let payment = minimum + input.number("extra_payment");
        let months = months_to_payoff(balance, input.number("apr"), payment)?;
        PreviewEstimate::months("Payoff time", months)
    }

    fn shape(
        &self,
        r: &CreditCardResponse,
        ctx: &ShapeContext,
    ) -> DisplayModel {
        let schedule = &r.monthly_schedule;
        let labels = schedule.iter().map(|m| m.month.to_string()).collect();
        DisplayModel::new()
            .headline("Payoff time", format::months(r.with_extra.months_to_payoff))
            .headline("Interest saved", ctx.money(r.with_extra.interest_saved))
            .line("Minimum only: time", format::months(r.minimum_only.months_to_payoff), Emphasis::Normal)
            .line("Minimum only: interest", ctx.money(r.minimum_only.total_interest), Emphasis::Negative)
            .line("Minimum only: total paid", ctx.money(r.minimum_only.total_paid), Emphasis::Muted)
            .line("With extra: interest", ctx.money(r.with_extra.total_interest), Emphasis::Normal)
            .line("With extra: total paid", ctx.money(r.with_extra.total_paid), Emphasis::Muted)
            .line("Time saved", format::months(r.with_extra.months_saved), Emphasis::Positive)
            .table(Table::windowed(
                "Payment schedule",
                &["Month", "Payment", "Interest", "Principal", "Balance"],
                schedule,
                |row| {
                    vec![
                        row.month.to_string(),
                        ctx.money(row.payment),
                        ctx.money(row.interest),
                        ctx.money(row.principal),
                        ctx.money(row.balance),
                    ]
                },
            ))
            .chart(
                ChartSpec::new("credit-card-balance", ChartKind::Line, labels)
                    .dataset(Dataset::new("Balance", schedule.iter().map(|m| m.balance).collect())),
            )
    }
}

// =============================================================================
// Auto loan vs lease
// =============================================================================

pub struct AutoLoan;

const AUTO_LOAN_FIELDS: &[FieldSpec] = &[
    FieldSpec::number("vehicle_price", "Vehicle price", 35_000.0),
    FieldSpec::number("down_payment", "Down payment", 5_000.0),
    FieldSpec::number("loan_rate", "Loan rate (%)", 7.0),
    FieldSpec::integer("loan_term_months", "Loan term (months)", 60),
    FieldSpec::number("residual_value_pct", "Residual value (%)", 55.0),
    FieldSpec::number("money_factor", "Money factor", 0.00125),
    FieldSpec::integer("lease_term_months", "Lease term (months)", 36),
    FieldSpec::number("trade_in_value", "Trade-in value", 0.0),
    FieldSpec::number("sales_tax_rate", "Sales tax (%)", 8.0),
];

/// Price less down payment and trade-in, plus sales tax on the full price.
fn financed_amount(input: &FormInput) -> f64 {
    let price = input.number("vehicle_price");
    price - input.number("down_payment") - input.number("trade_in_value")
        + price * input.number("sales_tax_rate") / 100.0
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoanOption {
    pub monthly_payment: f64,
    pub total_paid: f64,
    pub total_interest: f64,
    pub equity_at_end: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LeaseOption {
    pub monthly_payment: f64,
    pub total_paid: f64,
    pub residual_value: f64,
    pub equiv_apr: f64,
    pub buyout_option: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoanLeaseComparison {
    pub cheaper_option: String,
    pub difference: f64,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AutoLoanResponse {
    pub loan: LoanOption,
    pub lease: LeaseOption,
    pub comparison: LoanLeaseComparison,
}

impl Calculator for AutoLoan {
    type Response = AutoLoanResponse;

    fn key(&self) -> CalculatorKey {
        CalculatorKey::AutoLoan
    }

    fn schema(&self) -> &'static [FieldSpec] {
        AUTO_LOAN_FIELDS
    }

    fn validate(
        &self,
        input: &FormInput,
    ) -> Result<(), CalculationError> {
        require(financed_amount(input) > 0.0, "Financed amount must be positive")
    }

    fn preview(
        &self,
        input: &FormInput,
    ) -> Option<PreviewEstimate> {
        let financed = financed_amount(input);
        if financed <= 0.0 {
            return None;
        }
        let payment = loan_payment(
            financed,
            input.number("loan_rate"),
            input.integer("loan_term_months"),
        )?;
        PreviewEstimate::currency("Loan payment", payment)
    }

    fn shape(
        &self,
        r: &AutoLoanResponse,
        ctx: &ShapeContext,
    ) -> DisplayModel {
        let rows = [
            ("Monthly payment", ctx.money(r.loan.monthly_payment), ctx.money(r.lease.monthly_payment)),
            ("Total paid", ctx.money0(r.loan.total_paid), ctx.money0(r.lease.total_paid)),
            (
                "Interest / APR",
                ctx.money0(r.loan.total_interest),
                format::percent(r.lease.equiv_apr, 2),
            ),
            ("Value at end", ctx.money0(r.loan.equity_at_end), format::PLACEHOLDER.to_string()),
            ("Buyout price", format::PLACEHOLDER.to_string(), ctx.money0(r.lease.buyout_option)),
        ];
        DisplayModel::new()
            .headline("Cheaper option", r.comparison.cheaper_option.clone())
            .headline("Difference", ctx.money0(r.comparison.difference))
            .line("Loan payment", ctx.money(r.loan.monthly_payment), Emphasis::Normal)
            .line("Lease payment", ctx.money(r.lease.monthly_payment), Emphasis::Normal)
            .line("Lease residual value", ctx.money0(r.lease.residual_value), Emphasis::Muted)
            .table(Table::full("Loan vs lease", &["", "Loan", "Lease"], &rows, |(label, loan, lease)| {
                vec![label.to_string(), loan.clone(), lease.clone()]
            }))
            .chart(
                ChartSpec::new(
                    "auto-loan-total",
                    ChartKind::Bar,
                    vec!["Loan".to_string(), "Lease".to_string()],
                )
                .dataset(Dataset::new("Total paid", vec![r.loan.total_paid, r.lease.total_paid])),
            )
            .note(Tone::Info, r.comparison.recommendation.clone())
    }
}

// =============================================================================
// Personal loan eligibility
// =============================================================================

pub struct PersonalLoan;

const PERSONAL_LOAN_FIELDS: &[FieldSpec] = &[
    FieldSpec::number("loan_amount", "Loan amount", 15_000.0),
    FieldSpec::number("annual_income", "Annual income", 60_000.0),
    FieldSpec::number("monthly_debts", "Monthly debt payments", 500.0),
    FieldSpec::integer("credit_score", "Credit score", 700),
    FieldSpec::integer("term_years", "Term (years)", 3),
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApprovalFactors {
    pub credit_score: String,
    pub dti: String,
    pub income: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PersonalLoanResponse {
    pub eligibility: String,
    pub estimated_apr_low: f64,
    pub estimated_apr_high: f64,
    pub estimated_monthly_low: f64,
    pub estimated_monthly_high: f64,
    pub dti_ratio: f64,
    pub credit_tier: String,
    pub approval_factors: ApprovalFactors,
}

fn factor_emphasis(rating: &str) -> Emphasis {
    match rating {
        "Strong" | "Good" => Emphasis::Positive,
        "Weak" | "High" | "Low" => Emphasis::Negative,
        _ => Emphasis::Normal,
    }
}

impl Calculator for PersonalLoan {
    type Response = PersonalLoanResponse;

    fn key(&self) -> CalculatorKey {
        CalculatorKey::PersonalLoan
    }

    fn schema(&self) -> &'static [FieldSpec] {
        PERSONAL_LOAN_FIELDS
    }

    fn preview(
        &self,
        input: &FormInput,
    ) -> Option<PreviewEstimate> {
        let amount = input.number("loan_amount");
        if amount <= 0.0 {
            return None;
        }
        let payment = loan_payment(
            amount,
            PERSONAL_LOAN_ROUGH_APR,
            months_in(input.integer("term_years")),
        )?;
        PreviewEstimate::currency("Rough monthly payment", payment)
    }

    fn shape(
        &self,
        r: &PersonalLoanResponse,
        ctx: &ShapeContext,
    ) -> DisplayModel {
        let factors = &r.approval_factors;
        let (tone, verdict) = match r.eligibility.as_str() {
            "LIKELY" => (Tone::Success, "You are likely to qualify at competitive rates."),
            "POSSIBLE" => (Tone::Info, "You may qualify, though rates could be higher."),
            _ => (Tone::Warning, "Approval is unlikely; consider lowering debt or improving credit first."),
        };
        DisplayModel::new()
            .headline("Eligibility", r.eligibility.clone())
            .headline(
                "Estimated APR",
                format!(
                    "{} to {}",
                    format::percent(r.estimated_apr_low, 1),
                    format::percent(r.estimated_apr_high, 1)
                ),
            )
            .line(
                "Monthly payment",
                format!(
                    "{} to {}",
                    ctx.money(r.estimated_monthly_low),
                    ctx.money(r.estimated_monthly_high)
                ),
                Emphasis::Normal,
            )
            .line("Debt-to-income", format::percent(r.dti_ratio, 1), Emphasis::Normal)
            .line("Credit tier", r.credit_tier.clone(), Emphasis::Muted)
            .lines([
                LineItem::with("Credit score", factors.credit_score.clone(), factor_emphasis(&factors.credit_score)),
                LineItem::with("DTI", factors.dti.clone(), factor_emphasis(&factors.dti)),
                LineItem::with("Income", factors.income.clone(), factor_emphasis(&factors.income)),
            ])
            .note(tone, verdict)
    }
}
