use serde::Deserialize;

use super::{Calculator, column, require, year_labels};
use crate::api::CalculationError;
use crate::calculations::{future_value, future_value_due, months_in};
use crate::format;
use crate::models::presets::{
    DEFAULT_INFLATION, DEFAULT_INVESTMENT_RETURN, FIRE_SAFE_WITHDRAWAL_RATE, SIP_NIFTY50_RETURN,
    US_401K_EMPLOYEE_LIMIT,
};
use crate::models::{
    CalculatorKey, ChartKind, ChartSpec, Dataset, DisplayModel, Emphasis, FieldSpec, FormInput,
    PreviewEstimate, ShapeContext, Table, Tone,
};

// =============================================================================
// Compound interest
// =============================================================================

pub struct CompoundInterest;

const COMPOUND_FIELDS: &[FieldSpec] = &[
    FieldSpec::number("principal", "Initial deposit", 10_000.0),
    FieldSpec::number("monthly_addition", "Monthly contribution", 200.0),
    FieldSpec::number("annual_rate", "Annual return (%)", DEFAULT_INVESTMENT_RETURN),
    FieldSpec::integer("years", "Years", 20),
    FieldSpec::choice(
        "compound_freq",
        "Compounding",
        "monthly",
        &["annually", "semi", "quarterly", "monthly", "daily"],
    ),
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompoundYear {
    pub year: i64,
    pub balance: f64,
    pub contributed: f64,
    pub interest: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompoundInterestResponse {
    pub final_balance: f64,
    pub total_contributed: f64,
    pub total_interest: f64,
    pub effective_apy: f64,
    #[serde(default)]
    pub yearly_breakdown: Vec<CompoundYear>,
}

impl Calculator for CompoundInterest {
    type Response = CompoundInterestResponse;

    fn key(&self) -> CalculatorKey {
        CalculatorKey::CompoundInterest
    }

    fn schema(&self) -> &'static [FieldSpec] {
        COMPOUND_FIELDS
    }

    fn preview(
        &self,
        input: &FormInput,
    ) -> Option<PreviewEstimate> {
        let fv = future_value(
            input.number("principal"),
            input.number("monthly_addition"),
            input.number("annual_rate") / 1200.0,
            months_in(input.integer("years")),
        );
        PreviewEstimate::currency("Estimated balance", fv)
    }

    fn shape(
        &self,
        r: &CompoundInterestResponse,
        ctx: &ShapeContext,
    ) -> DisplayModel {
        let years = &r.yearly_breakdown;
        DisplayModel::new()
            .headline("Final balance", ctx.money(r.final_balance))
            .line("Total contributed", ctx.money(r.total_contributed), Emphasis::Normal)
            .line("Interest earned", ctx.money(r.total_interest), Emphasis::Positive)
            .line("Effective APY", format::percent(r.effective_apy, 4), Emphasis::Muted)
            .table(Table::windowed(
                "Growth by year",
                &["Year", "Balance", "Contributed", "Interest"],
                years,
                |row| {
                    vec![
                        row.year.to_string(),
                        ctx.money(row.balance),
                        ctx.money(row.contributed),
                        ctx.money(row.interest),
                    ]
                },
            ))
            .chart(
                ChartSpec::new("compound-growth", ChartKind::Bar, year_labels(years, |y| y.year))
                    .dataset(
                        Dataset::new("Contributed", column(years, |y| y.contributed))
                            .stacked("balance"),
                    )
                    .dataset(
                        Dataset::new("Interest", column(years, |y| y.interest)).stacked("balance"),
                    ),
            )
    }
}

// =============================================================================
// 401(k) / pension
// =============================================================================

pub struct Retirement401k;

const RETIREMENT_FIELDS: &[FieldSpec] = &[
    FieldSpec::integer("current_age", "Current age", 30),
    FieldSpec::integer("retirement_age", "Retirement age", 65),
    FieldSpec::number("current_balance", "Current balance", 25_000.0),
    FieldSpec::number("annual_salary", "Annual salary", 75_000.0),
    FieldSpec::number("contribution_pct", "Your contribution (%)", 10.0),
    FieldSpec::number("employer_match_pct", "Employer match (%)", 3.0),
    FieldSpec::number("employer_match_limit", "Match limit (% of salary)", 6.0),
    FieldSpec::number("expected_return", "Expected return (%)", DEFAULT_INVESTMENT_RETURN),
    FieldSpec::number("inflation_rate", "Inflation (%)", DEFAULT_INFLATION),
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RetirementYear {
    pub year: i64,
    pub age: i64,
    pub balance: f64,
    pub real_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Retirement401kResponse {
    pub years_to_retirement: i64,
    pub annual_employee_contribution: f64,
    pub annual_employer_contribution: f64,
    pub total_annual_contribution: f64,
    #[serde(default)]
    pub irs_limit_warning: bool,
    pub projected_balance: f64,
    pub projected_balance_real: f64,
    pub monthly_income_4pct: f64,
    pub monthly_income_real: f64,
    #[serde(default)]
    pub yearly_growth: Vec<RetirementYear>,
}

impl Calculator for Retirement401k {
    type Response = Retirement401kResponse;

    fn key(&self) -> CalculatorKey {
        CalculatorKey::Retirement401k
    }

    fn schema(&self) -> &'static [FieldSpec] {
        RETIREMENT_FIELDS
    }

    fn validate(
        &self,
        input: &FormInput,
    ) -> Result<(), CalculationError> {
        require(
            input.integer("retirement_age") > input.integer("current_age"),
            "Retirement age must be greater than current age",
        )
    }

    fn preview(
        &self,
        input: &FormInput,
    ) -> Option<PreviewEstimate> {
        let years = input
            .integer("retirement_age")
            .saturating_sub(input.integer("current_age"));
        if years <= 0 {
            return None;
        }
        let employee = (input.number("annual_salary") * input.number("contribution_pct") / 100.0)
            .min(US_401K_EMPLOYEE_LIMIT);
        let fv = future_value(
            input.number("current_balance"),
            employee / 12.0,
            input.number("expected_return") / 1200.0,
            months_in(years),
        );
        PreviewEstimate::currency("Projected balance", fv)
    }

    fn shape(
        &self,
        r: &Retirement401kResponse,
        ctx: &ShapeContext,
    ) -> DisplayModel {
        let years = &r.yearly_growth;
        let labels = years.iter().map(|y| format!("Age {}", y.age)).collect();
        let model = DisplayModel::new()
            .headline("Projected balance", ctx.money0(r.projected_balance))
            .headline("In today's dollars", ctx.money0(r.projected_balance_real))
            .line("Years to retirement", r.years_to_retirement.to_string(), Emphasis::Normal)
            .line("Your contribution / yr", ctx.money(r.annual_employee_contribution), Emphasis::Normal)
            .line("Employer match / yr", ctx.money(r.annual_employer_contribution), Emphasis::Positive)
            .line("Total / yr", ctx.money(r.total_annual_contribution), Emphasis::Strong)
            .line("Monthly income (4% rule)", ctx.money(r.monthly_income_4pct), Emphasis::Normal)
            .line("Monthly income, today's dollars", ctx.money(r.monthly_income_real), Emphasis::Muted)
            .table(Table::windowed(
                "Balance by year",
                &["Year", "Age", "Balance", "Today's dollars"],
                years,
                |row| {
                    vec![
                        row.year.to_string(),
                        row.age.to_string(),
                        ctx.money0(row.balance),
                        ctx.money0(row.real_balance),
                    ]
                },
            ))
            .chart(
                ChartSpec::new("retirement-growth", ChartKind::Line, labels)
                    .dataset(Dataset::new("Nominal", column(years, |y| y.balance)))
                    .dataset(Dataset::new("Today's dollars", column(years, |y| y.real_balance))),
            );
        if r.irs_limit_warning {
            model.note(
                Tone::Warning,
                format!(
                    "Your contribution exceeds the {} IRS employee limit; the excess is not counted.",
                    format::currency(US_401K_EMPLOYEE_LIMIT, "USD", 0)
                ),
            )
        } else {
            model
        }
    }
}

// =============================================================================
// SIP
// =============================================================================

pub struct Sip;

const SIP_FIELDS: &[FieldSpec] = &[
    FieldSpec::number("monthly_investment", "Monthly investment", 5_000.0),
    FieldSpec::number("annual_return", "Expected return (%)", SIP_NIFTY50_RETURN),
    FieldSpec::integer("years", "Years", 10),
    FieldSpec::number("step_up_pct", "Annual step-up (%)", 0.0),
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SipYear {
    pub year: i64,
    pub invested: f64,
    pub value: f64,
    pub returns: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SipResponse {
    pub total_invested: f64,
    pub estimated_returns: f64,
    pub final_amount: f64,
    pub absolute_return_pct: f64,
    pub wealth_ratio: f64,
    #[serde(default)]
    pub yearly_breakdown: Vec<SipYear>,
}

impl Calculator for Sip {
    type Response = SipResponse;

    fn key(&self) -> CalculatorKey {
        CalculatorKey::Sip
    }

    fn schema(&self) -> &'static [FieldSpec] {
        SIP_FIELDS
    }

    fn currency(
        &self,
        _input: &FormInput,
    ) -> Option<&'static str> {
        Some("INR")
    }

    fn preview(
        &self,
        input: &FormInput,
    ) -> Option<PreviewEstimate> {
        let fv = future_value_due(
            0.0,
            input.number("monthly_investment"),
            input.number("annual_return") / 1200.0,
            months_in(input.integer("years")),
        );
        PreviewEstimate::currency("Estimated value", fv)
    }

    fn shape(
        &self,
        r: &SipResponse,
        ctx: &ShapeContext,
    ) -> DisplayModel {
        let years = &r.yearly_breakdown;
        DisplayModel::new()
            .headline("Final amount", ctx.money0(r.final_amount))
            .line("Total invested", ctx.money0(r.total_invested), Emphasis::Normal)
            .line("Estimated returns", ctx.money0(r.estimated_returns), Emphasis::Positive)
            .line("Absolute return", format::percent(r.absolute_return_pct, 2), Emphasis::Normal)
            .line("Wealth ratio", format!("{}x", format::number(r.wealth_ratio, 2)), Emphasis::Muted)
            .table(Table::windowed(
                "Year by year",
                &["Year", "Invested", "Value", "Returns"],
                years,
                |row| {
                    vec![
                        row.year.to_string(),
                        ctx.money0(row.invested),
                        ctx.money0(row.value),
                        ctx.money0(row.returns),
                    ]
                },
            ))
            .chart(
                ChartSpec::new("sip-growth", ChartKind::Bar, year_labels(years, |y| y.year))
                    .dataset(Dataset::new("Invested", column(years, |y| y.invested)).stacked("value"))
                    .dataset(Dataset::new("Returns", column(years, |y| y.returns)).stacked("value")),
            )
            .chart(
                ChartSpec::new(
                    "sip-split",
                    ChartKind::Doughnut,
                    vec!["Invested".to_string(), "Returns".to_string()],
                )
                .dataset(Dataset::new(
                    "Final amount",
                    vec![r.total_invested, r.estimated_returns],
                )),
            )
    }
}

// =============================================================================
// FIRE
// =============================================================================

pub struct Fire;

const FIRE_FIELDS: &[FieldSpec] = &[
    FieldSpec::integer("current_age", "Current age", 30),
    FieldSpec::number("annual_expenses", "Annual expenses", 40_000.0),
    FieldSpec::number("current_savings", "Current savings", 50_000.0),
    FieldSpec::number("annual_savings", "Annual savings", 20_000.0),
    FieldSpec::number("expected_return", "Expected return (%)", DEFAULT_INVESTMENT_RETURN),
    FieldSpec::number("safe_withdrawal_rate", "Safe withdrawal rate (%)", FIRE_SAFE_WITHDRAWAL_RATE),
    FieldSpec::number("inflation_rate", "Inflation (%)", DEFAULT_INFLATION),
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FireYear {
    pub year: i64,
    pub age: i64,
    pub balance: f64,
    pub fire_target: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FireResponse {
    pub fire_number: f64,
    pub years_to_fire: Option<i64>,
    pub fire_age: Option<i64>,
    pub current_progress_pct: f64,
    pub monthly_expenses: f64,
    #[serde(default)]
    pub yearly_projection: Vec<FireYear>,
}

impl Calculator for Fire {
    type Response = FireResponse;

    fn key(&self) -> CalculatorKey {
        CalculatorKey::Fire
    }

    fn schema(&self) -> &'static [FieldSpec] {
        FIRE_FIELDS
    }

    fn preview(
        &self,
        input: &FormInput,
    ) -> Option<PreviewEstimate> {
        let expenses = input.number("annual_expenses");
        let swr = input.number("safe_withdrawal_rate");
        if expenses <= 0.0 || swr <= 0.0 {
            return None;
        }
        PreviewEstimate::currency("FIRE number", expenses / (swr / 100.0))
    }

    fn shape(
        &self,
        r: &FireResponse,
        ctx: &ShapeContext,
    ) -> DisplayModel {
        let years = &r.yearly_projection;
        let (years_text, age_text) = match (r.years_to_fire, r.fire_age) {
            (Some(y), Some(age)) => (format!("{y} years"), age.to_string()),
            _ => ("Not within 70 years".to_string(), format::PLACEHOLDER.to_string()),
        };
        let model = DisplayModel::new()
            .headline("FIRE number", ctx.money0(r.fire_number))
            .headline("Years to FIRE", years_text)
            .line("FIRE age", age_text, Emphasis::Normal)
            .line("Progress so far", format::percent(r.current_progress_pct, 1), Emphasis::Positive)
            .line("Monthly expenses", ctx.money(r.monthly_expenses), Emphasis::Muted)
            .table(Table::windowed(
                "Projection",
                &["Year", "Age", "Portfolio", "Target"],
                years,
                |row| {
                    vec![
                        row.year.to_string(),
                        row.age.to_string(),
                        ctx.money0(row.balance),
                        ctx.money0(row.fire_target),
                    ]
                },
            ))
            .chart(
                ChartSpec::new("fire-projection", ChartKind::Line, year_labels(years, |y| y.year))
                    .dataset(Dataset::new("Portfolio", column(years, |y| y.balance)))
                    .dataset(Dataset::new("FIRE target", column(years, |y| y.fire_target))),
            );
        if r.years_to_fire.is_none() {
            model.note(
                Tone::Warning,
                "At this savings rate the portfolio does not reach the inflation-adjusted target.",
            )
        } else {
            model
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::models::{FieldValue, TableRow};

    // =========================================================================
    // compound interest
    // =========================================================================

    #[test]
    fn compound_preview_is_ordinary_annuity() {
        let input = FormInput::defaults(COMPOUND_FIELDS);

        let preview = CompoundInterest.preview(&input).unwrap();

        assert!((preview.value - 144_572.72).abs() < 0.01);
    }

    #[test]
    fn compound_preview_zero_rate_sums_deposits() {
        let mut input = FormInput::defaults(COMPOUND_FIELDS);
        input.set("annual_rate", FieldValue::Number(0.0));

        let preview = CompoundInterest.preview(&input).unwrap();

        assert_eq!(preview.value, 10_000.0 + 200.0 * 240.0);
    }

    #[test]
    fn compound_preview_survives_extreme_years() {
        let mut input = FormInput::defaults(COMPOUND_FIELDS);

        input.set("years", FieldValue::Integer(i64::MAX));
        assert_eq!(CompoundInterest.preview(&input), None);

        input.set("years", FieldValue::Integer(i64::MIN));
        assert_eq!(CompoundInterest.preview(&input).unwrap().value, 10_000.0);
    }

    #[test]
    fn compound_shape_stacks_contributions_and_interest() {
        let response: CompoundInterestResponse = serde_json::from_value(json!({
            "final_balance": 144572.72,
            "total_contributed": 58000.0,
            "total_interest": 86572.72,
            "effective_apy": 7.229,
            "yearly_breakdown": (1..=20).map(|y| json!({
                "year": y, "balance": 1000.0 * y as f64,
                "contributed": 600.0 * y as f64, "interest": 400.0 * y as f64
            })).collect::<Vec<_>>()
        }))
        .unwrap();

        let model = CompoundInterest.shape(&response, &ShapeContext::default());

        assert_eq!(model.headlines[0].value, "$144,572.72");
        assert_eq!(model.breakdown[2].value, "7.2290%");
        assert_eq!(model.tables[0].rows[5], TableRow::Elided { hidden: 12 });
        assert_eq!(model.charts[0].labels.len(), 20);
        assert!(model.charts[0].is_stacked());
    }

    // =========================================================================
    // 401(k)
    // =========================================================================

    #[test]
    fn retirement_requires_later_retirement_age() {
        let mut input = FormInput::defaults(RETIREMENT_FIELDS);
        input.set("retirement_age", FieldValue::Integer(30));

        assert_eq!(
            Retirement401k.validate(&input),
            Err(CalculationError::Validation(
                "Retirement age must be greater than current age".to_string()
            ))
        );
        assert_eq!(Retirement401k.preview(&input), None);
    }

    #[test]
    fn retirement_preview_caps_employee_contribution() {
        let mut input = FormInput::defaults(RETIREMENT_FIELDS);
        input.set("annual_salary", FieldValue::Number(400_000.0));
        input.set("current_balance", FieldValue::Number(0.0));
        input.set("expected_return", FieldValue::Number(0.0));
        input.set("current_age", FieldValue::Integer(64));

        let preview = Retirement401k.preview(&input).unwrap();

        assert!((preview.value - US_401K_EMPLOYEE_LIMIT).abs() < 1e-6);
    }

    #[test]
    fn retirement_preview_survives_extreme_ages() {
        for (field, age) in [("current_age", i64::MIN), ("retirement_age", i64::MIN)] {
            let mut input = FormInput::defaults(RETIREMENT_FIELDS);
            input.set(field, FieldValue::Integer(age));

            assert_eq!(Retirement401k.preview(&input), None, "{field}={age}");
        }
    }

    fn retirement_response(irs_limit_warning: bool) -> Retirement401kResponse {
        Retirement401kResponse {
            years_to_retirement: 35,
            annual_employee_contribution: 7_500.0,
            annual_employer_contribution: 2_250.0,
            total_annual_contribution: 9_750.0,
            irs_limit_warning,
            projected_balance: 1_700_000.0,
            projected_balance_real: 740_000.0,
            monthly_income_4pct: 5_666.67,
            monthly_income_real: 2_466.67,
            yearly_growth: vec![RetirementYear {
                year: 1,
                age: 31,
                balance: 36_700.0,
                real_balance: 36_000.0,
            }],
        }
    }

    #[test]
    fn retirement_shape_labels_chart_by_age() {
        let model = Retirement401k.shape(&retirement_response(false), &ShapeContext::default());

        assert_eq!(model.headlines[0].value, "$1,700,000");
        assert_eq!(model.charts[0].labels, vec!["Age 31".to_string()]);
        assert!(model.notes.is_empty());
    }

    #[test]
    fn retirement_shape_warns_over_limit() {
        let model = Retirement401k.shape(&retirement_response(true), &ShapeContext::default());

        assert_eq!(model.notes[0].tone, Tone::Warning);
        assert!(model.notes[0].text.contains("$23,500"));
    }

    // =========================================================================
    // SIP
    // =========================================================================

    #[test]
    fn sip_is_shown_in_rupees() {
        assert_eq!(Sip.currency(&FormInput::defaults(SIP_FIELDS)), Some("INR"));
    }

    #[test]
    fn sip_preview_is_annuity_due() {
        let input = FormInput::defaults(SIP_FIELDS);

        let preview = Sip.preview(&input).unwrap();

        assert!((preview.value - 1_161_695.38).abs() < 0.01);
    }

    #[test]
    fn sip_shape_uses_lakh_grouping() {
        let response = SipResponse {
            total_invested: 600_000.0,
            estimated_returns: 561_695.38,
            final_amount: 1_161_695.38,
            absolute_return_pct: 93.62,
            wealth_ratio: 1.94,
            yearly_breakdown: Vec::new(),
        };

        let model = Sip.shape(&response, &ShapeContext::new("INR"));

        assert_eq!(model.headlines[0].value, "₹11,61,695");
        assert_eq!(model.breakdown[3].value, "1.94x");
        assert_eq!(model.charts[1].datasets[0].values, vec![600_000.0, 561_695.38]);
    }

    // =========================================================================
    // FIRE
    // =========================================================================

    #[test]
    fn fire_preview_divides_by_withdrawal_rate() {
        let input = FormInput::defaults(FIRE_FIELDS);

        assert_eq!(Fire.preview(&input).unwrap().value, 1_000_000.0);
    }

    #[test]
    fn fire_preview_zero_withdrawal_rate_is_unavailable() {
        let mut input = FormInput::defaults(FIRE_FIELDS);
        input.set("safe_withdrawal_rate", FieldValue::Number(0.0));

        assert_eq!(Fire.preview(&input), None);
    }

    #[test]
    fn fire_shape_when_target_never_reached() {
        let response: FireResponse = serde_json::from_value(json!({
            "fire_number": 1000000.0,
            "years_to_fire": null,
            "fire_age": null,
            "current_progress_pct": 5.0,
            "monthly_expenses": 3333.33,
            "yearly_projection": []
        }))
        .unwrap();

        let model = Fire.shape(&response, &ShapeContext::default());

        assert_eq!(model.headlines[1].value, "Not within 70 years");
        assert_eq!(model.breakdown[0].value, "—");
        assert_eq!(model.notes[0].tone, Tone::Warning);
    }

    #[test]
    fn fire_shape_when_reached() {
        let response: FireResponse = serde_json::from_value(json!({
            "fire_number": 1000000.0,
            "years_to_fire": 22,
            "fire_age": 52,
            "current_progress_pct": 5.0,
            "monthly_expenses": 3333.33,
            "yearly_projection": [{"year": 1, "age": 31, "balance": 73000.0, "fire_target": 1025000.0}]
        }))
        .unwrap();

        let model = Fire.shape(&response, &ShapeContext::default());

        assert_eq!(model.headlines[1].value, "22 years");
        assert_eq!(model.breakdown[0].value, "52");
        assert!(model.notes.is_empty());
    }
}
