use serde::Deserialize;

use super::{Calculator, column, require, year_labels};
use crate::api::CalculationError;
use crate::calculations::{loan_payment, months_in};
use crate::format;
use crate::models::presets::{HOUSING_FRONT_END_RATIO, US_MORTGAGE_30YR};
use crate::models::{
    CalculatorKey, ChartKind, ChartSpec, Dataset, DisplayModel, Emphasis, FieldSpec, FormInput,
    PreviewEstimate, ShapeContext, Table, Tone,
};

/// Whole months in `years`, truncated.
fn term_months(years: f64) -> i64 {
    (years * 12.0).trunc() as i64
}

// =============================================================================
// Repayment
// =============================================================================

pub struct Repayment;

const REPAYMENT_FIELDS: &[FieldSpec] = &[
    FieldSpec::number("principal", "Loan amount", 300_000.0),
    FieldSpec::number("annual_rate", "Interest rate (%)", US_MORTGAGE_30YR),
    FieldSpec::number("term_years", "Term (years)", 30.0),
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AmortizationRow {
    pub month: i64,
    pub payment: f64,
    pub principal: f64,
    pub interest: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct YearSummary {
    pub year: i64,
    pub principal_paid: f64,
    pub interest_paid: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RepaymentResponse {
    pub monthly_payment: f64,
    pub total_paid: f64,
    pub total_interest: f64,
    pub effective_rate: f64,
    #[serde(default)]
    pub amortization_table: Vec<AmortizationRow>,
    #[serde(default)]
    pub summary_by_year: Vec<YearSummary>,
}

impl Calculator for Repayment {
    type Response = RepaymentResponse;

    fn key(&self) -> CalculatorKey {
        CalculatorKey::Repayment
    }

    fn schema(&self) -> &'static [FieldSpec] {
        REPAYMENT_FIELDS
    }

    fn preview(
        &self,
        input: &FormInput,
    ) -> Option<PreviewEstimate> {
        let principal = input.number("principal");
        if principal <= 0.0 {
            return None;
        }
        let payment = loan_payment(
            principal,
            input.number("annual_rate"),
            term_months(input.number("term_years")),
        )?;
        PreviewEstimate::currency("Monthly payment", payment)
    }

    fn shape(
        &self,
        r: &RepaymentResponse,
        ctx: &ShapeContext,
    ) -> DisplayModel {
        let years = &r.summary_by_year;
        DisplayModel::new()
            .headline("Monthly payment", ctx.money(r.monthly_payment))
            .line("Total paid", ctx.money(r.total_paid), Emphasis::Normal)
            .line("Total interest", ctx.money(r.total_interest), Emphasis::Negative)
            .line("Interest rate", format::percent(r.effective_rate, 2), Emphasis::Muted)
            .table(Table::windowed(
                "Amortization schedule",
                &["Month", "Payment", "Principal", "Interest", "Balance"],
                &r.amortization_table,
                |row| {
                    vec![
                        row.month.to_string(),
                        ctx.money(row.payment),
                        ctx.money(row.principal),
                        ctx.money(row.interest),
                        ctx.money(row.balance),
                    ]
                },
            ))
            .table(Table::windowed(
                "Yearly summary",
                &["Year", "Principal", "Interest", "Balance"],
                years,
                |row| {
                    vec![
                        row.year.to_string(),
                        ctx.money(row.principal_paid),
                        ctx.money(row.interest_paid),
                        ctx.money(row.balance),
                    ]
                },
            ))
            .chart(
                ChartSpec::new("repayment-yearly", ChartKind::Bar, year_labels(years, |y| y.year))
                    .dataset(
                        Dataset::new("Principal", column(years, |y| y.principal_paid))
                            .stacked("paid"),
                    )
                    .dataset(
                        Dataset::new("Interest", column(years, |y| y.interest_paid)).stacked("paid"),
                    ),
            )
            .chart(
                ChartSpec::new(
                    "repayment-split",
                    ChartKind::Doughnut,
                    vec!["Principal".to_string(), "Interest".to_string()],
                )
                .dataset(Dataset::new(
                    "Total paid",
                    vec![r.total_paid - r.total_interest, r.total_interest],
                )),
            )
    }
}

// =============================================================================
// Rent vs buy
// =============================================================================

pub struct RentVsBuy;

const RENT_VS_BUY_FIELDS: &[FieldSpec] = &[
    FieldSpec::number("home_price", "Home price", 400_000.0),
    FieldSpec::number("down_payment_pct", "Down payment (%)", 20.0),
    FieldSpec::number("mortgage_rate", "Mortgage rate (%)", US_MORTGAGE_30YR),
    FieldSpec::integer("term_years", "Term (years)", 30),
    FieldSpec::number("annual_home_growth", "Home appreciation (%/yr)", 4.0),
    FieldSpec::number("monthly_rent", "Monthly rent", 2_000.0),
    FieldSpec::number("annual_rent_increase", "Rent increase (%/yr)", 3.0),
    FieldSpec::number("investment_return", "Investment return (%/yr)", 7.0),
    FieldSpec::number("property_tax_rate", "Property tax (%/yr)", 1.2),
    FieldSpec::number("maintenance_pct", "Maintenance (%/yr)", 1.0),
    FieldSpec::number("insurance_monthly", "Insurance (monthly)", 150.0),
    FieldSpec::integer("years", "Horizon (years)", 10),
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RentBuyYear {
    pub year: i64,
    pub buy_net_worth: f64,
    pub rent_net_worth: f64,
    pub cumulative_buy_cost: f64,
    pub cumulative_rent_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RentVsBuyResponse {
    pub breakeven_year: Option<i64>,
    pub buy_net_worth_at_horizon: f64,
    pub rent_net_worth_at_horizon: f64,
    pub recommendation: String,
    #[serde(default)]
    pub yearly_comparison: Vec<RentBuyYear>,
}

impl Calculator for RentVsBuy {
    type Response = RentVsBuyResponse;

    fn key(&self) -> CalculatorKey {
        CalculatorKey::RentVsBuy
    }

    fn schema(&self) -> &'static [FieldSpec] {
        RENT_VS_BUY_FIELDS
    }

    fn validate(
        &self,
        input: &FormInput,
    ) -> Result<(), CalculationError> {
        require(input.number("home_price") > 0.0, "Home price must be positive")
    }

    fn preview(
        &self,
        input: &FormInput,
    ) -> Option<PreviewEstimate> {
        let price = input.number("home_price");
        if price <= 0.0 {
            return None;
        }
        let financed = price * (1.0 - input.number("down_payment_pct") / 100.0);
        let payment = loan_payment(
            financed,
            input.number("mortgage_rate"),
            months_in(input.integer("term_years")),
        )?;
        PreviewEstimate::currency("Monthly mortgage payment", payment)
    }

    fn shape(
        &self,
        r: &RentVsBuyResponse,
        ctx: &ShapeContext,
    ) -> DisplayModel {
        let years = &r.yearly_comparison;
        let (verdict, tone) = match r.recommendation.as_str() {
            "BUY" => ("Buying builds more wealth over this horizon.", Tone::Success),
            "RENT" => ("Renting and investing the difference comes out ahead.", Tone::Success),
            _ => ("Buying and renting end up roughly even.", Tone::Info),
        };
        let breakeven = r
            .breakeven_year
            .map(|y| format!("Year {y}"))
            .unwrap_or_else(|| "Not within horizon".to_string());

        DisplayModel::new()
            .headline("Recommendation", r.recommendation.clone())
            .headline("Breakeven", breakeven)
            .line("Net worth if buying", ctx.money0(r.buy_net_worth_at_horizon), Emphasis::Normal)
            .line("Net worth if renting", ctx.money0(r.rent_net_worth_at_horizon), Emphasis::Normal)
            .line(
                "Difference",
                ctx.money0((r.buy_net_worth_at_horizon - r.rent_net_worth_at_horizon).abs()),
                Emphasis::Strong,
            )
            .table(Table::windowed(
                "Year by year",
                &["Year", "Buy net worth", "Rent net worth", "Buy cost", "Rent cost"],
                years,
                |row| {
                    vec![
                        row.year.to_string(),
                        ctx.money0(row.buy_net_worth),
                        ctx.money0(row.rent_net_worth),
                        ctx.money0(row.cumulative_buy_cost),
                        ctx.money0(row.cumulative_rent_cost),
                    ]
                },
            ))
            .chart(
                ChartSpec::new("rent-buy-net-worth", ChartKind::Line, year_labels(years, |y| y.year))
                    .dataset(Dataset::new("Buy", column(years, |y| y.buy_net_worth)))
                    .dataset(Dataset::new("Rent", column(years, |y| y.rent_net_worth))),
            )
            .note(tone, verdict)
    }
}

// =============================================================================
// Refinance
// =============================================================================

pub struct Refinance;

const REFINANCE_FIELDS: &[FieldSpec] = &[
    FieldSpec::number("current_balance", "Current balance", 250_000.0),
    FieldSpec::number("current_rate", "Current rate (%)", 7.0),
    FieldSpec::number("current_remaining_years", "Years remaining", 25.0),
    FieldSpec::number("new_rate", "New rate (%)", 6.0),
    FieldSpec::number("new_term_years", "New term (years)", 30.0),
    FieldSpec::number("closing_costs", "Closing costs", 4_000.0),
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RefinanceResponse {
    pub current_monthly: f64,
    pub new_monthly: f64,
    pub monthly_savings: f64,
    pub breakeven_months: Option<f64>,
    pub total_interest_current: f64,
    pub total_interest_new: f64,
    pub net_savings: f64,
    pub recommendation: String,
}

impl Calculator for Refinance {
    type Response = RefinanceResponse;

    fn key(&self) -> CalculatorKey {
        CalculatorKey::Refinance
    }

    fn schema(&self) -> &'static [FieldSpec] {
        REFINANCE_FIELDS
    }

    fn preview(
        &self,
        input: &FormInput,
    ) -> Option<PreviewEstimate> {
        let balance = input.number("current_balance");
        if balance <= 0.0 {
            return None;
        }
        let current = loan_payment(
            balance,
            input.number("current_rate"),
            term_months(input.number("current_remaining_years")),
        )?;
        let new = loan_payment(
            balance,
            input.number("new_rate"),
            term_months(input.number("new_term_years")),
        )?;
        PreviewEstimate::currency("Monthly savings", current - new)
    }

    fn shape(
        &self,
        r: &RefinanceResponse,
        ctx: &ShapeContext,
    ) -> DisplayModel {
        let savings_emphasis = if r.monthly_savings >= 0.0 {
            Emphasis::Positive
        } else {
            Emphasis::Negative
        };
        let breakeven = r
            .breakeven_months
            .map(format::months)
            .unwrap_or_else(|| format::PLACEHOLDER.to_string());
        let model = DisplayModel::new()
            .headline("Monthly savings", ctx.money(r.monthly_savings))
            .headline("Recommendation", r.recommendation.clone())
            .line("Current payment", ctx.money(r.current_monthly), Emphasis::Normal)
            .line("New payment", ctx.money(r.new_monthly), Emphasis::Normal)
            .line("Monthly difference", ctx.money(r.monthly_savings), savings_emphasis)
            .line("Breakeven", breakeven, Emphasis::Normal)
            .line("Interest, current loan", ctx.money0(r.total_interest_current), Emphasis::Muted)
            .line("Interest, new loan", ctx.money0(r.total_interest_new), Emphasis::Muted)
            .line("Net savings", ctx.money0(r.net_savings), Emphasis::Strong)
            .chart(
                ChartSpec::new(
                    "refinance-interest",
                    ChartKind::Bar,
                    vec!["Current loan".to_string(), "New loan".to_string()],
                )
                .dataset(Dataset::new(
                    "Total interest",
                    vec![r.total_interest_current, r.total_interest_new],
                )),
            );
        if r.recommendation == "REFINANCE" {
            model.note(Tone::Success, "Refinancing pays for its closing costs before the current loan ends.")
        } else {
            model.note(Tone::Info, "Staying with the current loan costs less overall.")
        }
    }
}

// =============================================================================
// Affordability
// =============================================================================

pub struct Affordability;

const AFFORDABILITY_FIELDS: &[FieldSpec] = &[
    FieldSpec::number("gross_annual_income", "Gross annual income", 100_000.0),
    FieldSpec::number("monthly_debts", "Monthly debt payments", 500.0),
    FieldSpec::number("down_payment", "Down payment", 60_000.0),
    FieldSpec::number("annual_rate", "Interest rate (%)", US_MORTGAGE_30YR),
    FieldSpec::integer("term_years", "Term (years)", 30),
    FieldSpec::number("property_tax_rate", "Property tax (%/yr)", 1.2),
    FieldSpec::number("insurance_monthly", "Insurance (monthly)", 150.0),
    FieldSpec::number("hoa_monthly", "HOA (monthly)", 0.0),
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AffordabilityResponse {
    pub max_home_price_28pct: f64,
    pub max_home_price_36pct: f64,
    pub max_home_price: f64,
    pub max_monthly_piti: f64,
    pub monthly_income: f64,
    pub current_dti: f64,
    pub dti_status: String,
}

impl Calculator for Affordability {
    type Response = AffordabilityResponse;

    fn key(&self) -> CalculatorKey {
        CalculatorKey::Affordability
    }

    fn schema(&self) -> &'static [FieldSpec] {
        AFFORDABILITY_FIELDS
    }

    fn preview(
        &self,
        input: &FormInput,
    ) -> Option<PreviewEstimate> {
        let income = input.number("gross_annual_income");
        if income <= 0.0 {
            return None;
        }
        PreviewEstimate::currency("Max housing payment", income / 12.0 * HOUSING_FRONT_END_RATIO)
    }

    fn shape(
        &self,
        r: &AffordabilityResponse,
        ctx: &ShapeContext,
    ) -> DisplayModel {
        let dti_emphasis = match r.dti_status.as_str() {
            "GOOD" => Emphasis::Positive,
            "HIGH" => Emphasis::Negative,
            _ => Emphasis::Normal,
        };
        let model = DisplayModel::new()
            .headline("You can afford", ctx.money0(r.max_home_price))
            .line("Max price (28% rule)", ctx.money0(r.max_home_price_28pct), Emphasis::Normal)
            .line("Max price (36% rule)", ctx.money0(r.max_home_price_36pct), Emphasis::Normal)
            .line("Max monthly PITI", ctx.money(r.max_monthly_piti), Emphasis::Normal)
            .line("Monthly income", ctx.money(r.monthly_income), Emphasis::Muted)
            .line(
                "Debt-to-income",
                format!("{} ({})", format::percent(r.current_dti, 1), r.dti_status),
                dti_emphasis,
            )
            .chart(
                ChartSpec::new(
                    "affordability-limits",
                    ChartKind::Bar,
                    vec!["28% rule".to_string(), "36% rule".to_string()],
                )
                .dataset(Dataset::new(
                    "Max home price",
                    vec![r.max_home_price_28pct, r.max_home_price_36pct],
                )),
            );
        match r.dti_status.as_str() {
            "HIGH" => model.note(
                Tone::Warning,
                "Your existing debts are high relative to income; lenders may limit what you can borrow.",
            ),
            "CAUTION" => model.note(Tone::Info, "Your debt-to-income ratio is near common lender limits."),
            _ => model,
        }
    }
}
