//! Tax calculators. The service returns a different breakdown per country,
//! so each response keeps the country-specific fields optional and an
//! explicit mapping turns whichever are present into ordered line items.

use serde::Deserialize;

use super::Calculator;
use crate::format;
use crate::models::{
    CalculatorKey, ChartKind, ChartSpec, Dataset, DisplayModel, Emphasis, FieldSpec, FormInput,
    LineItem, PreviewEstimate, ShapeContext, Table, Tone,
};

const COUNTRIES: &[&str] = &["US", "UK", "IN"];
const US_STATES: &[&str] = &[
    "CA", "NY", "NJ", "MA", "IL", "TX", "FL", "WA", "NV", "AK", "other",
];

/// Currency a tax country reports in.
pub fn country_currency(country: &str) -> Option<&'static str> {
    match country.trim().to_ascii_uppercase().as_str() {
        "US" => Some("USD"),
        "UK" => Some("GBP"),
        "IN" => Some("INR"),
        _ => None,
    }
}

/// Line items for the amounts that are present, in the given order.
fn present_lines(
    ctx: &ShapeContext,
    rows: &[(&str, Option<f64>, Emphasis)],
) -> Vec<LineItem> {
    rows.iter()
        .filter_map(|(label, value, emphasis)| {
            value.map(|v| LineItem::with(*label, ctx.money(v), *emphasis))
        })
        .collect()
}

// =============================================================================
// Take-home pay
// =============================================================================

pub struct TakeHomePay;

const TAKE_HOME_FIELDS: &[FieldSpec] = &[
    FieldSpec::number("gross_income", "Gross annual income", 75_000.0),
    FieldSpec::choice("country", "Country", "US", COUNTRIES),
    FieldSpec::choice("filing_status", "Filing status", "single", &["single", "mfj", "hoh"]),
    FieldSpec::choice("state", "State", "other", US_STATES),
    FieldSpec::choice("pay_frequency", "Pay frequency", "annual", &["annual", "monthly", "biweekly"]),
    FieldSpec::choice("regime", "Tax regime (India)", "new", &["new", "old"]),
];

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PayBreakdown {
    // US
    pub federal_tax: Option<f64>,
    pub state_tax: Option<f64>,
    pub social_security: Option<f64>,
    pub medicare: Option<f64>,
    // UK and India
    pub income_tax: Option<f64>,
    pub national_insurance: Option<f64>,
    pub surcharge: Option<f64>,
    pub cess: Option<f64>,
}

impl PayBreakdown {
    /// Present components as `(label, amount)` in display order.
    pub fn components(&self) -> Vec<(&'static str, f64)> {
        [
            ("Federal income tax", self.federal_tax),
            ("State income tax", self.state_tax),
            ("Social Security", self.social_security),
            ("Medicare", self.medicare),
            ("Income tax", self.income_tax),
            ("National Insurance", self.national_insurance),
            ("Surcharge", self.surcharge),
            ("Health & education cess", self.cess),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.map(|v| (label, v)))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BracketApplied {
    pub bracket: String,
    pub rate: f64,
    pub tax: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TakeHomePayResponse {
    pub gross_annual: f64,
    pub total_tax: f64,
    pub effective_rate: f64,
    pub marginal_rate: f64,
    pub take_home_annual: f64,
    pub take_home_per_period: f64,
    #[serde(default)]
    pub breakdown: PayBreakdown,
    #[serde(default)]
    pub tax_brackets_applied: Vec<BracketApplied>,
}

/// Ordered tax lines for a take-home breakdown.
pub fn take_home_lines(
    breakdown: &PayBreakdown,
    ctx: &ShapeContext,
) -> Vec<LineItem> {
    breakdown
        .components()
        .into_iter()
        .map(|(label, value)| LineItem::with(label, ctx.money(value), Emphasis::Negative))
        .collect()
}

impl Calculator for TakeHomePay {
    type Response = TakeHomePayResponse;

    fn key(&self) -> CalculatorKey {
        CalculatorKey::TakeHomePay
    }

    fn schema(&self) -> &'static [FieldSpec] {
        TAKE_HOME_FIELDS
    }

    fn currency(
        &self,
        input: &FormInput,
    ) -> Option<&'static str> {
        country_currency(input.text("country"))
    }

    fn shape(
        &self,
        r: &TakeHomePayResponse,
        ctx: &ShapeContext,
    ) -> DisplayModel {
        let components = r.breakdown.components();
        let mut labels: Vec<String> = vec!["Take-home".to_string()];
        let mut values = vec![r.take_home_annual];
        for (label, value) in &components {
            labels.push(label.to_string());
            values.push(*value);
        }

        DisplayModel::new()
            .headline("Take-home pay (annual)", ctx.money(r.take_home_annual))
            .headline("Per pay period", ctx.money(r.take_home_per_period))
            .line("Gross income", ctx.money(r.gross_annual), Emphasis::Normal)
            .lines(take_home_lines(&r.breakdown, ctx))
            .line("Total tax", ctx.money(r.total_tax), Emphasis::Strong)
            .line("Effective rate", format::percent(r.effective_rate, 2), Emphasis::Muted)
            .line("Marginal rate", format::percent(r.marginal_rate, 1), Emphasis::Muted)
            .table(Table::full(
                "Brackets applied",
                &["Bracket", "Rate", "Tax"],
                &r.tax_brackets_applied,
                |b| vec![b.bracket.clone(), format::percent(b.rate, 1), ctx.money(b.tax)],
            ))
            .chart(
                ChartSpec::new("take-home-split", ChartKind::Doughnut, labels)
                    .dataset(Dataset::new("Gross income", values)),
            )
    }
}

// =============================================================================
// Freelance
// =============================================================================

pub struct Freelance;

const FREELANCE_FIELDS: &[FieldSpec] = &[
    FieldSpec::number("gross_revenue", "Gross revenue", 90_000.0),
    FieldSpec::number("business_expenses", "Business expenses", 10_000.0),
    FieldSpec::choice("country", "Country", "US", COUNTRIES),
    FieldSpec::choice("filing_status", "Filing status", "single", &["single", "mfj", "hoh"]),
    FieldSpec::choice("state", "State", "other", US_STATES),
    FieldSpec::flag("presumptive_scheme", "Presumptive scheme (India 44ADA)", false),
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdvanceTaxInstallment {
    pub due: String,
    /// Cumulative share of the year's tax due by this date.
    pub pct: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FreelanceResponse {
    pub net_profit: f64,
    pub taxable_income: f64,
    pub income_tax: f64,
    pub self_employment_tax: f64,
    pub total_tax: f64,
    pub effective_rate: f64,
    pub take_home: f64,
    pub quarterly_estimate: f64,
    #[serde(default)]
    pub quarterly_due_dates: Vec<String>,
    // US
    pub se_tax_deduction: Option<f64>,
    pub state_tax: Option<f64>,
    // UK
    pub uk_class2_nic: Option<f64>,
    pub uk_class4_nic: Option<f64>,
    // India
    #[serde(default)]
    pub india_advance_tax_schedule: Vec<AdvanceTaxInstallment>,
    pub presumptive_scheme_used: Option<bool>,
}

/// Ordered tax lines for a freelance result. Country extras appear only
/// when the service sent them.
pub fn freelance_lines(
    r: &FreelanceResponse,
    ctx: &ShapeContext,
) -> Vec<LineItem> {
    let has_nic = r.uk_class2_nic.is_some() || r.uk_class4_nic.is_some();
    let se_tax = if has_nic || r.self_employment_tax == 0.0 {
        None
    } else {
        Some(r.self_employment_tax)
    };
    present_lines(
        ctx,
        &[
            ("Net profit", Some(r.net_profit), Emphasis::Normal),
            ("SE tax deduction", r.se_tax_deduction, Emphasis::Muted),
            ("Taxable income", Some(r.taxable_income), Emphasis::Normal),
            ("Income tax", Some(r.income_tax), Emphasis::Negative),
            ("Self-employment tax", se_tax, Emphasis::Negative),
            ("State tax", r.state_tax, Emphasis::Negative),
            ("Class 2 NIC", r.uk_class2_nic, Emphasis::Negative),
            ("Class 4 NIC", r.uk_class4_nic, Emphasis::Negative),
            ("Total tax", Some(r.total_tax), Emphasis::Strong),
        ],
    )
}

impl Calculator for Freelance {
    type Response = FreelanceResponse;

    fn key(&self) -> CalculatorKey {
        CalculatorKey::Freelance
    }

    fn schema(&self) -> &'static [FieldSpec] {
        FREELANCE_FIELDS
    }

    fn currency(
        &self,
        input: &FormInput,
    ) -> Option<&'static str> {
        country_currency(input.text("country"))
    }

    fn preview(
        &self,
        input: &FormInput,
    ) -> Option<PreviewEstimate> {
        PreviewEstimate::currency(
            "Net profit",
            input.number("gross_revenue") - input.number("business_expenses"),
        )
    }

    fn shape(
        &self,
        r: &FreelanceResponse,
        ctx: &ShapeContext,
    ) -> DisplayModel {
        let schedule = if r.india_advance_tax_schedule.is_empty() {
            Table::full(
                "Estimated payments",
                &["Due", "Amount"],
                &r.quarterly_due_dates,
                |due| vec![due.clone(), ctx.money(r.quarterly_estimate)],
            )
        } else {
            Table::full(
                "Advance tax schedule",
                &["Due", "Cumulative", "Amount"],
                &r.india_advance_tax_schedule,
                |i| vec![i.due.clone(), format::percent(i.pct, 0), ctx.money(i.amount)],
            )
        };
        let model = DisplayModel::new()
            .headline("Take-home", ctx.money(r.take_home))
            .headline("Total tax", ctx.money(r.total_tax))
            .lines(freelance_lines(r, ctx))
            .line("Effective rate", format::percent(r.effective_rate, 2), Emphasis::Muted)
            .line("Per installment", ctx.money(r.quarterly_estimate), Emphasis::Normal)
            .table(schedule)
            .chart(
                ChartSpec::new(
                    "freelance-split",
                    ChartKind::Doughnut,
                    vec!["Take-home".to_string(), "Tax".to_string()],
                )
                .dataset(Dataset::new("Net profit", vec![r.take_home, r.total_tax])),
            );
        if r.presumptive_scheme_used == Some(true) {
            model.note(Tone::Info, "Presumptive taxation applied: 50% of receipts treated as profit.")
        } else {
            model
        }
    }
}

// =============================================================================
// Capital gains
// =============================================================================

pub struct CapitalGains;

const CAPITAL_GAINS_FIELDS: &[FieldSpec] = &[
    FieldSpec::choice("country", "Country", "US", COUNTRIES),
    FieldSpec::choice("asset_type", "Asset type", "equity", &["equity", "property", "other"]),
    FieldSpec::number("purchase_price", "Purchase price", 10_000.0),
    FieldSpec::number("sale_price", "Sale price", 15_000.0),
    FieldSpec::number("holding_months", "Holding period (months)", 13.0),
    FieldSpec::number("annual_income", "Annual income", 75_000.0),
    FieldSpec::choice("filing_status", "Filing status", "single", &["single", "mfj"]),
];

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GainsBreakdown {
    pub gross_gain: Option<f64>,
    pub exemption: Option<f64>,
    pub taxable_gain: Option<f64>,
    // US
    pub capital_gains_tax: Option<f64>,
    pub niit: Option<f64>,
    // UK
    pub tax: Option<f64>,
    // India
    pub base_tax: Option<f64>,
    pub cess: Option<f64>,
    pub total_tax: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CapitalGainsResponse {
    pub gain: f64,
    pub is_long_term: bool,
    pub tax_rate: f64,
    pub tax_owed: f64,
    pub net_proceeds: f64,
    pub classification: String,
    #[serde(default)]
    pub regime_notes: String,
    #[serde(default)]
    pub breakdown: GainsBreakdown,
}

/// Ordered lines for a capital gains breakdown.
pub fn gains_lines(
    b: &GainsBreakdown,
    ctx: &ShapeContext,
) -> Vec<LineItem> {
    // A zero exemption is the US default and says nothing.
    let exemption = b.exemption.filter(|e| *e != 0.0);
    present_lines(
        ctx,
        &[
            ("Gross gain", b.gross_gain, Emphasis::Normal),
            ("Exemption", exemption, Emphasis::Positive),
            ("Taxable gain", b.taxable_gain, Emphasis::Normal),
            ("Capital gains tax", b.capital_gains_tax, Emphasis::Negative),
            ("Net investment income tax", b.niit, Emphasis::Negative),
            ("Tax", b.tax, Emphasis::Negative),
            ("Base tax", b.base_tax, Emphasis::Negative),
            ("Cess", b.cess, Emphasis::Negative),
            ("Total tax", b.total_tax, Emphasis::Strong),
        ],
    )
}

impl Calculator for CapitalGains {
    type Response = CapitalGainsResponse;

    fn key(&self) -> CalculatorKey {
        CalculatorKey::CapitalGains
    }

    fn schema(&self) -> &'static [FieldSpec] {
        CAPITAL_GAINS_FIELDS
    }

    fn currency(
        &self,
        input: &FormInput,
    ) -> Option<&'static str> {
        country_currency(input.text("country"))
    }

    fn preview(
        &self,
        input: &FormInput,
    ) -> Option<PreviewEstimate> {
        PreviewEstimate::currency(
            "Gain",
            input.number("sale_price") - input.number("purchase_price"),
        )
    }

    fn shape(
        &self,
        r: &CapitalGainsResponse,
        ctx: &ShapeContext,
    ) -> DisplayModel {
        let term = if r.is_long_term { "Long-term" } else { "Short-term" };
        DisplayModel::new()
            .headline("Tax owed", ctx.money(r.tax_owed))
            .headline("Net proceeds", ctx.money(r.net_proceeds))
            .line("Gain", ctx.money(r.gain), Emphasis::Normal)
            .line("Holding", format!("{term} ({})", r.classification), Emphasis::Normal)
            .line("Tax rate", format::percent(r.tax_rate, 1), Emphasis::Muted)
            .lines(gains_lines(&r.breakdown, ctx))
            .chart(
                ChartSpec::new(
                    "capital-gains-split",
                    ChartKind::Doughnut,
                    vec!["Kept".to_string(), "Tax".to_string()],
                )
                .dataset(Dataset::new("Gain", vec![r.net_proceeds, r.tax_owed])),
            )
            .note(Tone::Info, r.regime_notes.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::models::{FieldValue, TableRow};

    fn labels(lines: &[LineItem]) -> Vec<&str> {
        lines.iter().map(|l| l.label.as_str()).collect()
    }

    // =========================================================================
    // currency selection
    // =========================================================================

    #[test]
    fn country_picks_currency() {
        let mut input = FormInput::defaults(TAKE_HOME_FIELDS);
        assert_eq!(TakeHomePay.currency(&input), Some("USD"));

        input.set("country", FieldValue::Text("UK".to_string()));
        assert_eq!(TakeHomePay.currency(&input), Some("GBP"));

        input.set("country", FieldValue::Text("IN".to_string()));
        assert_eq!(Freelance.currency(&input), Some("INR"));

        input.set("country", FieldValue::Text("DE".to_string()));
        assert_eq!(CapitalGains.currency(&input), None);
    }

    // =========================================================================
    // take-home pay
    // =========================================================================

    #[test]
    fn take_home_has_no_preview() {
        assert_eq!(TakeHomePay.preview(&FormInput::defaults(TAKE_HOME_FIELDS)), None);
    }

    #[test]
    fn us_breakdown_lines_in_order() {
        let breakdown: PayBreakdown = serde_json::from_value(json!({
            "federal_tax": 8114.0, "state_tax": 3750.0,
            "social_security": 4650.0, "medicare": 1087.5
        }))
        .unwrap();

        let lines = take_home_lines(&breakdown, &ShapeContext::default());

        assert_eq!(
            labels(&lines),
            vec!["Federal income tax", "State income tax", "Social Security", "Medicare"]
        );
        assert_eq!(lines[0].value, "$8,114.00");
    }

    #[test]
    fn uk_breakdown_lines() {
        let breakdown: PayBreakdown = serde_json::from_value(json!({
            "income_tax": 12486.0, "national_insurance": 3310.6
        }))
        .unwrap();

        let lines = take_home_lines(&breakdown, &ShapeContext::new("GBP"));

        assert_eq!(labels(&lines), vec!["Income tax", "National Insurance"]);
        assert_eq!(lines[1].value, "£3,310.60");
    }

    #[test]
    fn india_take_home_shape() {
        let response: TakeHomePayResponse = serde_json::from_value(json!({
            "gross_annual": 1500000.0,
            "total_tax": 97500.0,
            "effective_rate": 6.5,
            "marginal_rate": 15.0,
            "take_home_annual": 1402500.0,
            "take_home_per_period": 116875.0,
            "breakdown": {"income_tax": 93750.0, "surcharge": 0.0, "cess": 3750.0},
            "tax_brackets_applied": [
                {"bracket": "₹0 – ₹400,000", "rate": 0.0, "tax": 0.0},
                {"bracket": "₹400,000 – ₹800,000", "rate": 5.0, "tax": 20000.0}
            ]
        }))
        .unwrap();

        let model = TakeHomePay.shape(&response, &ShapeContext::new("INR"));

        assert_eq!(model.headlines[0].value, "₹14,02,500.00");
        assert_eq!(
            labels(&model.breakdown),
            vec![
                "Gross income",
                "Income tax",
                "Surcharge",
                "Health & education cess",
                "Total tax",
                "Effective rate",
                "Marginal rate"
            ]
        );
        assert_eq!(model.tables[0].rows.len(), 2);
        assert_eq!(model.charts[0].labels.len(), 4);
    }

    // =========================================================================
    // freelance
    // =========================================================================

    #[test]
    fn freelance_preview_is_net_profit() {
        let input = FormInput::defaults(FREELANCE_FIELDS);

        assert_eq!(Freelance.preview(&input).unwrap().value, 80_000.0);
    }

    #[test]
    fn freelance_us_lines_include_se_tax() {
        let response: FreelanceResponse = serde_json::from_value(json!({
            "net_profit": 80000.0, "taxable_income": 59348.0, "income_tax": 8500.0,
            "self_employment_tax": 11304.0, "se_tax_deduction": 5652.0, "state_tax": 3717.4,
            "total_tax": 23521.4, "effective_rate": 29.4, "take_home": 56478.6,
            "quarterly_estimate": 5880.35,
            "quarterly_due_dates": ["April 15", "June 15", "September 15", "January 15"]
        }))
        .unwrap();

        let model = Freelance.shape(&response, &ShapeContext::default());

        assert_eq!(
            labels(&freelance_lines(&response, &ShapeContext::default())),
            vec![
                "Net profit",
                "SE tax deduction",
                "Taxable income",
                "Income tax",
                "Self-employment tax",
                "State tax",
                "Total tax"
            ]
        );
        assert_eq!(model.tables[0].rows.len(), 4);
        assert_eq!(
            model.tables[0].rows[0],
            TableRow::Cells(vec!["April 15".to_string(), "$5,880.35".to_string()])
        );
    }

    #[test]
    fn freelance_uk_lines_show_nic_instead_of_se_tax() {
        let response: FreelanceResponse = serde_json::from_value(json!({
            "net_profit": 80000.0, "taxable_income": 67430.0, "income_tax": 19432.0,
            "uk_class2_nic": 179.0, "uk_class4_nic": 2605.0, "self_employment_tax": 2784.0,
            "total_tax": 22216.0, "effective_rate": 27.77, "take_home": 57784.0,
            "quarterly_estimate": 11108.0, "quarterly_due_dates": ["January 31", "July 31"]
        }))
        .unwrap();

        let lines = freelance_lines(&response, &ShapeContext::new("GBP"));

        assert_eq!(
            labels(&lines),
            vec!["Net profit", "Taxable income", "Income tax", "Class 2 NIC", "Class 4 NIC", "Total tax"]
        );
    }

    #[test]
    fn freelance_india_uses_advance_tax_schedule() {
        let response: FreelanceResponse = serde_json::from_value(json!({
            "net_profit": 800000.0, "taxable_income": 400000.0, "income_tax": 0.0,
            "self_employment_tax": 0, "total_tax": 0.0, "effective_rate": 0.0,
            "take_home": 800000.0, "quarterly_estimate": 0.0,
            "india_advance_tax_schedule": [
                {"due": "June 15", "pct": 15, "amount": 0.0},
                {"due": "September 15", "pct": 45, "amount": 0.0},
                {"due": "December 15", "pct": 75, "amount": 0.0},
                {"due": "March 15", "pct": 100, "amount": 0.0}
            ],
            "quarterly_due_dates": ["June 15", "September 15", "December 15", "March 15"],
            "presumptive_scheme_used": true
        }))
        .unwrap();

        let model = Freelance.shape(&response, &ShapeContext::new("INR"));

        assert_eq!(model.tables[0].title, "Advance tax schedule");
        assert_eq!(
            model.tables[0].rows[1],
            TableRow::Cells(vec!["September 15".to_string(), "45%".to_string(), "₹0.00".to_string()])
        );
        assert_eq!(model.notes[0].tone, Tone::Info);
        assert!(!labels(&model.breakdown).contains(&"Self-employment tax"));
    }

    // =========================================================================
    // capital gains
    // =========================================================================

    #[test]
    fn capital_gains_preview_is_gain() {
        let input = FormInput::defaults(CAPITAL_GAINS_FIELDS);

        assert_eq!(CapitalGains.preview(&input).unwrap().value, 5_000.0);
    }

    #[test]
    fn capital_gains_us_shape() {
        let response: CapitalGainsResponse = serde_json::from_value(json!({
            "gain": 5000.0, "is_long_term": true, "tax_rate": 15.0, "tax_owed": 750.0,
            "net_proceeds": 4250.0, "classification": "LTCG",
            "regime_notes": "LTCG. NIIT: $0.00",
            "breakdown": {"gross_gain": 5000.0, "exemption": 0, "taxable_gain": 5000.0,
                          "capital_gains_tax": 750.0, "niit": 0.0, "total_tax": 750.0}
        }))
        .unwrap();

        let model = CapitalGains.shape(&response, &ShapeContext::default());

        assert_eq!(model.breakdown[1].value, "Long-term (LTCG)");
        assert_eq!(
            labels(&gains_lines(&response.breakdown, &ShapeContext::default())),
            vec![
                "Gross gain",
                "Taxable gain",
                "Capital gains tax",
                "Net investment income tax",
                "Total tax"
            ]
        );
        assert_eq!(model.notes[0].text, "LTCG. NIIT: $0.00");
    }

    #[test]
    fn capital_gains_india_lines_show_exemption_and_cess() {
        let breakdown: GainsBreakdown = serde_json::from_value(json!({
            "gross_gain": 200000.0, "exemption": 125000.0, "taxable_gain": 75000.0,
            "base_tax": 9375.0, "cess": 375.0, "total_tax": 9750.0
        }))
        .unwrap();

        let lines = gains_lines(&breakdown, &ShapeContext::new("INR"));

        assert_eq!(
            labels(&lines),
            vec!["Gross gain", "Exemption", "Taxable gain", "Base tax", "Cess", "Total tax"]
        );
        assert_eq!(lines[1].emphasis, Emphasis::Positive);
    }
}
