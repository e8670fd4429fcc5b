use serde::Deserialize;

use super::{Calculator, column, require, year_labels};
use crate::api::CalculationError;
use crate::calculations::{RuleOf, future_value_due, months_in, rule_of};
use crate::format;
use crate::models::presets::{DAYS_PER_MONTH, DEFAULT_INFLATION, DEFAULT_INVESTMENT_RETURN};
use crate::models::{
    CalculatorKey, ChartKind, ChartSpec, Dataset, DisplayModel, Emphasis, FieldSpec, FormInput,
    PreviewEstimate, ShapeContext, Table, Tone,
};

// =============================================================================
// Inflation
// =============================================================================

pub struct Inflation;

const INFLATION_FIELDS: &[FieldSpec] = &[
    FieldSpec::number("amount", "Amount", 100.0),
    FieldSpec::integer("start_year", "Start year", 2000),
    FieldSpec::integer("end_year", "End year", 2024),
    FieldSpec::choice("region", "Region", "US", &["US", "EU", "IN"]),
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InflationYear {
    pub year: i64,
    pub value: f64,
    pub cpi_index: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InflationResponse {
    pub original_amount: f64,
    pub adjusted_amount: f64,
    pub cumulative_inflation_pct: f64,
    pub avg_annual_rate: f64,
    pub purchasing_power_lost: f64,
    #[serde(default)]
    pub yearly_values: Vec<InflationYear>,
}

impl Calculator for Inflation {
    type Response = InflationResponse;

    fn key(&self) -> CalculatorKey {
        CalculatorKey::Inflation
    }

    fn schema(&self) -> &'static [FieldSpec] {
        INFLATION_FIELDS
    }

    fn currency(
        &self,
        input: &FormInput,
    ) -> Option<&'static str> {
        match input.text("region") {
            "US" => Some("USD"),
            "EU" => Some("EUR"),
            "IN" => Some("INR"),
            _ => None,
        }
    }

    fn validate(
        &self,
        input: &FormInput,
    ) -> Result<(), CalculationError> {
        require(
            input.integer("start_year") < input.integer("end_year"),
            "Start year must be before end year",
        )
    }

    fn shape(
        &self,
        r: &InflationResponse,
        ctx: &ShapeContext,
    ) -> DisplayModel {
        let rows = &r.yearly_values;
        DisplayModel::new()
            .headline("Adjusted amount", ctx.money(r.adjusted_amount))
            .line("Original amount", ctx.money(r.original_amount), Emphasis::Normal)
            .line(
                "Cumulative inflation",
                format::percent(r.cumulative_inflation_pct, 2),
                Emphasis::Normal,
            )
            .line("Average annual rate", format::percent(r.avg_annual_rate, 2), Emphasis::Muted)
            .line(
                "Purchasing power lost",
                ctx.money(r.purchasing_power_lost),
                Emphasis::Negative,
            )
            .table(Table::windowed(
                "Value by year",
                &["Year", "Value", "CPI"],
                rows,
                |y| vec![y.year.to_string(), ctx.money(y.value), format::number(y.cpi_index, 1)],
            ))
            .chart(
                ChartSpec::new(
                    "inflation-value",
                    ChartKind::Line,
                    rows.iter().map(|y| y.year.to_string()).collect(),
                )
                .dataset(Dataset::new("Equivalent value", column(rows, |y| y.value))),
            )
    }
}

// =============================================================================
// Rule of 72
// =============================================================================

pub struct RuleOf72;

const RULE_OF_72_FIELDS: &[FieldSpec] = &[
    FieldSpec::choice("mode", "Solve for", "rate_to_years", &["rate_to_years", "years_to_rate"]),
    FieldSpec::number("value", "Rate (%) or years", 8.0),
];

/// One rule's answer: years when solving from a rate, a rate otherwise.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RuleAnswer {
    pub years: Option<f64>,
    pub rate: Option<f64>,
}

impl RuleAnswer {
    pub fn text(&self) -> String {
        match (self.years, self.rate) {
            (Some(years), _) => years_text(years),
            (None, Some(rate)) => format::percent(rate, 2),
            (None, None) => format::PLACEHOLDER.to_string(),
        }
    }

    fn value(&self) -> Option<f64> {
        self.years.or(self.rate)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExactMultiples {
    pub double: Option<f64>,
    pub triple: Option<f64>,
    pub quad: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RuleOf72Response {
    pub rule_72: RuleAnswer,
    pub rule_114: RuleAnswer,
    pub rule_144: RuleAnswer,
    #[serde(default)]
    pub exact: ExactMultiples,
    #[serde(default)]
    pub description: String,
    /// Echo of the rate when solving for years.
    pub rate_pct: Option<f64>,
    /// Echo of the horizon when solving for a rate.
    pub years: Option<f64>,
}

impl RuleOf72Response {
    fn solves_for_years(&self) -> bool {
        self.rate_pct.is_some() || self.rule_72.years.is_some()
    }

    fn exact_text(
        &self,
        value: Option<f64>,
    ) -> String {
        match value {
            Some(v) if self.solves_for_years() => years_text(v),
            Some(v) => format::percent(v, 3),
            None => format::PLACEHOLDER.to_string(),
        }
    }
}

fn years_text(years: f64) -> String {
    format!("{} years", format::number(years, 2))
}

impl Calculator for RuleOf72 {
    type Response = RuleOf72Response;

    fn key(&self) -> CalculatorKey {
        CalculatorKey::RuleOf72
    }

    fn schema(&self) -> &'static [FieldSpec] {
        RULE_OF_72_FIELDS
    }

    fn validate(
        &self,
        input: &FormInput,
    ) -> Result<(), CalculationError> {
        require(input.number("value") > 0.0, "Value must be positive")
    }

    fn preview(
        &self,
        input: &FormInput,
    ) -> Option<PreviewEstimate> {
        let estimate = rule_of(RuleOf::Seventy2, input.number("value"))?;
        if input.text("mode") == "years_to_rate" {
            PreviewEstimate::percent("Required return", estimate)
        } else {
            PreviewEstimate::years("Years to double", estimate)
        }
    }

    fn shape(
        &self,
        r: &RuleOf72Response,
        _ctx: &ShapeContext,
    ) -> DisplayModel {
        let rows = [
            ("Double", "72", &r.rule_72, r.exact.double),
            ("Triple", "114", &r.rule_114, r.exact.triple),
            ("Quadruple", "144", &r.rule_144, r.exact.quad),
        ];
        let headline = if r.solves_for_years() {
            "Years to double"
        } else {
            "Return needed to double"
        };
        let unit = if r.solves_for_years() { "Years" } else { "Rate (%)" };

        DisplayModel::new()
            .headline(headline, r.rule_72.text())
            .line("Exact", r.exact_text(r.exact.double), Emphasis::Muted)
            .line("Rule of 114 (triple)", r.rule_114.text(), Emphasis::Normal)
            .line("Rule of 144 (quadruple)", r.rule_144.text(), Emphasis::Normal)
            .table(Table::full(
                "Rule vs exact",
                &["Multiple", "Rule", "Estimate", "Exact"],
                &rows,
                |(multiple, rule, answer, exact)| {
                    vec![
                        multiple.to_string(),
                        rule.to_string(),
                        answer.text(),
                        r.exact_text(*exact),
                    ]
                },
            ))
            .chart(
                ChartSpec::new(
                    "rule-of-72-compare",
                    ChartKind::Bar,
                    rows.iter().map(|(multiple, ..)| multiple.to_string()).collect(),
                )
                .dataset(Dataset::new(
                    format!("Rule ({unit})"),
                    rows.iter().map(|(_, _, a, _)| a.value().unwrap_or(0.0)).collect(),
                ))
                .dataset(Dataset::new(
                    format!("Exact ({unit})"),
                    rows.iter().map(|(.., e)| e.unwrap_or(0.0)).collect(),
                )),
            )
            .note(Tone::Info, r.description.trim().to_string())
    }
}

// =============================================================================
// Latte factor
// =============================================================================

pub struct LatteFactor;

const LATTE_FIELDS: &[FieldSpec] = &[
    FieldSpec::number("daily_expense", "Daily expense", 5.0),
    FieldSpec::number("annual_return", "Annual return (%)", DEFAULT_INVESTMENT_RETURN),
    FieldSpec::integer("years", "Years", 30),
    FieldSpec::number("inflation_rate", "Inflation (%)", DEFAULT_INFLATION),
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LatteYear {
    pub year: i64,
    pub saved: f64,
    pub invested: f64,
    pub real_value: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LatteFactorResponse {
    pub daily_expense: f64,
    pub monthly_expense: f64,
    pub annual_expense: f64,
    pub invested_value_nominal: f64,
    pub invested_value_real: f64,
    pub total_invested: f64,
    pub investment_gain: f64,
    #[serde(default)]
    pub yearly_projection: Vec<LatteYear>,
}

impl Calculator for LatteFactor {
    type Response = LatteFactorResponse;

    fn key(&self) -> CalculatorKey {
        CalculatorKey::LatteFactor
    }

    fn schema(&self) -> &'static [FieldSpec] {
        LATTE_FIELDS
    }

    fn preview(
        &self,
        input: &FormInput,
    ) -> Option<PreviewEstimate> {
        let fv = future_value_due(
            0.0,
            input.number("daily_expense") * DAYS_PER_MONTH,
            input.number("annual_return") / 1200.0,
            months_in(input.integer("years")),
        );
        PreviewEstimate::currency("If invested instead", fv)
    }

    fn shape(
        &self,
        r: &LatteFactorResponse,
        ctx: &ShapeContext,
    ) -> DisplayModel {
        let rows = &r.yearly_projection;
        DisplayModel::new()
            .headline("If invested instead", ctx.money(r.invested_value_nominal))
            .headline("In today's money", ctx.money(r.invested_value_real))
            .line("Daily spend", ctx.money(r.daily_expense), Emphasis::Normal)
            .line("Monthly spend", ctx.money(r.monthly_expense), Emphasis::Normal)
            .line("Yearly spend", ctx.money(r.annual_expense), Emphasis::Normal)
            .line("Total spent", ctx.money(r.total_invested), Emphasis::Negative)
            .line("Growth forgone", ctx.money(r.investment_gain), Emphasis::Positive)
            .table(Table::windowed(
                "Projection by year",
                &["Year", "Spent", "Invested", "Real value"],
                rows,
                |y| {
                    vec![
                        y.year.to_string(),
                        ctx.money0(y.saved),
                        ctx.money0(y.invested),
                        ctx.money0(y.real_value),
                    ]
                },
            ))
            .chart(
                ChartSpec::new("latte-growth", ChartKind::Line, year_labels(rows, |y| y.year))
                    .dataset(Dataset::new("Spent", column(rows, |y| y.saved)))
                    .dataset(Dataset::new("Invested", column(rows, |y| y.invested)))
                    .dataset(Dataset::new("Inflation-adjusted", column(rows, |y| y.real_value))),
            )
    }
}
