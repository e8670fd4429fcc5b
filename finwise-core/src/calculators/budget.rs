use std::collections::BTreeMap;

use serde::Deserialize;

use super::{Calculator, require};
use crate::api::CalculationError;
use crate::format;
use crate::models::{
    CalculatorKey, ChartKind, ChartSpec, Dataset, DisplayModel, Emphasis, FieldSpec, FormInput,
    PreviewEstimate, ShapeContext, Table, Tone,
};

/// Where an expense line counts when a method splits spending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Need,
    Want,
    Saving,
    Debt,
}

impl Bucket {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Need => "Needs",
            Self::Want => "Wants",
            Self::Saving => "Savings",
            Self::Debt => "Debt",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Expense {
    field: FieldSpec,
    bucket: Bucket,
}

const fn expense(
    name: &'static str,
    label: &'static str,
    default: f64,
    bucket: Bucket,
) -> Expense {
    Expense {
        field: FieldSpec::number(name, label, default),
        bucket,
    }
}

const INCOME_FIELDS: &[FieldSpec] = &[
    FieldSpec::number("inc_primary", "Primary Salary / Wages", 5_000.0),
    FieldSpec::number("inc_secondary", "Secondary Job / Part-time", 0.0),
    FieldSpec::number("inc_freelance", "Freelance / Self-employed", 0.0),
    FieldSpec::number("inc_rental", "Rental Income", 0.0),
    FieldSpec::number("inc_dividends", "Dividends / Interest", 0.0),
    FieldSpec::number("inc_government", "Government Benefits", 0.0),
    FieldSpec::number("inc_other", "Other Income", 0.0),
];

const EXPENSES: &[Expense] = &[
    expense("housing_rent", "Rent / Mortgage", 1_500.0, Bucket::Need),
    expense("housing_hoa", "HOA / Strata Fees", 0.0, Bucket::Need),
    expense("housing_insurance", "Home / Renters Insurance", 0.0, Bucket::Need),
    expense("housing_maintenance", "Maintenance & Repairs", 0.0, Bucket::Need),
    expense("util_electricity", "Electricity", 120.0, Bucket::Need),
    expense("util_gas", "Gas / Heating", 0.0, Bucket::Need),
    expense("util_water", "Water / Sewage", 0.0, Bucket::Need),
    expense("util_internet", "Internet", 60.0, Bucket::Need),
    expense("util_phone", "Mobile Phone", 50.0, Bucket::Need),
    expense("trans_car_payment", "Car Payment / Lease", 0.0, Bucket::Need),
    expense("trans_fuel", "Fuel / Gas", 150.0, Bucket::Need),
    expense("trans_car_insurance", "Car Insurance", 100.0, Bucket::Need),
    expense("trans_maintenance", "Car Maintenance", 0.0, Bucket::Need),
    expense("trans_public", "Public Transport", 0.0, Bucket::Need),
    expense("trans_rideshare", "Ride-share / Taxi", 0.0, Bucket::Want),
    expense("trans_parking", "Parking / Tolls", 0.0, Bucket::Need),
    expense("food_groceries", "Groceries", 450.0, Bucket::Need),
    expense("food_dining", "Dining Out / Takeaway", 200.0, Bucket::Want),
    expense("food_work_lunch", "Work Lunches / Coffee", 0.0, Bucket::Want),
    expense("health_insurance", "Health Insurance", 250.0, Bucket::Need),
    expense("health_prescriptions", "Prescriptions / OTC", 0.0, Bucket::Need),
    expense("health_dental", "Dental / Vision", 0.0, Bucket::Need),
    expense("health_gym", "Gym / Fitness", 0.0, Bucket::Want),
    expense("health_therapy", "Therapy / Counselling", 0.0, Bucket::Need),
    expense("ins_life", "Life Insurance", 0.0, Bucket::Need),
    expense("ins_disability", "Disability Insurance", 0.0, Bucket::Need),
    expense("debt_student", "Student Loan Payment", 0.0, Bucket::Debt),
    expense("debt_credit_card", "Credit Card Payment", 150.0, Bucket::Debt),
    expense("debt_personal", "Personal Loan Payment", 0.0, Bucket::Debt),
    expense("debt_other", "Other Debt Payment", 0.0, Bucket::Debt),
    expense("sav_emergency", "Emergency Fund", 200.0, Bucket::Saving),
    expense("sav_retirement", "Retirement (401k/IRA)", 400.0, Bucket::Saving),
    expense("sav_investments", "Stocks / Index Funds", 0.0, Bucket::Saving),
    expense("sav_house", "House / Property Fund", 0.0, Bucket::Saving),
    expense("sav_education", "Education Fund (529)", 0.0, Bucket::Saving),
    expense("sav_other", "Other Savings Goal", 0.0, Bucket::Saving),
    expense("pers_clothing", "Clothing & Shoes", 80.0, Bucket::Want),
    expense("pers_grooming", "Hair / Personal Care", 0.0, Bucket::Want),
    expense("ent_streaming", "Streaming & Subscriptions", 30.0, Bucket::Want),
    expense("ent_hobbies", "Hobbies & Sports", 0.0, Bucket::Want),
    expense("ent_events", "Events / Concerts", 0.0, Bucket::Want),
    expense("ent_gaming", "Gaming", 0.0, Bucket::Want),
    expense("ent_books", "Books / Magazines", 0.0, Bucket::Want),
    expense("ent_travel", "Travel & Vacations", 0.0, Bucket::Want),
    expense("fam_childcare", "Childcare / Daycare", 0.0, Bucket::Need),
    expense("fam_school", "School / Tuition Fees", 0.0, Bucket::Need),
    expense("fam_allowance", "Children's Allowance", 0.0, Bucket::Want),
    expense("fam_pets", "Pets (food, vet, etc.)", 0.0, Bucket::Want),
    expense("give_charity", "Charity / Donations", 0.0, Bucket::Want),
    expense("give_gifts", "Gifts (birthdays, etc.)", 0.0, Bucket::Want),
    expense("edu_courses", "Online Courses / Training", 0.0, Bucket::Want),
    expense("other_misc", "Miscellaneous", 60.0, Bucket::Want),
];

const FIELD_COUNT: usize = INCOME_FIELDS.len() + EXPENSES.len();

/// Income fields first, then every expense line in category order.
static BUDGET_FIELDS: [FieldSpec; FIELD_COUNT] = budget_fields();

const fn budget_fields() -> [FieldSpec; FIELD_COUNT] {
    let mut fields = [FieldSpec::number("", "", 0.0); FIELD_COUNT];
    let mut i = 0;
    while i < INCOME_FIELDS.len() {
        fields[i] = INCOME_FIELDS[i];
        i += 1;
    }
    let mut j = 0;
    while j < EXPENSES.len() {
        fields[i + j] = EXPENSES[j].field;
        j += 1;
    }
    fields
}

/// Sum of `fields`, counting negative amounts as zero.
fn total(
    input: &FormInput,
    fields: impl Iterator<Item = &'static FieldSpec>,
) -> f64 {
    fields.map(|f| input.number(f.name).max(0.0)).sum()
}

fn total_income(input: &FormInput) -> f64 {
    total(input, INCOME_FIELDS.iter())
}

fn total_expenses(input: &FormInput) -> f64 {
    total(input, EXPENSES.iter().map(|e| &e.field))
}

// =============================================================================
// Response
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BudgetIncome {
    pub total: f64,
    #[serde(default)]
    pub breakdown: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExpenseAmount {
    pub key: String,
    pub label: String,
    pub bucket: Bucket,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BudgetExpenses {
    pub total: f64,
    pub needs: f64,
    pub wants: f64,
    pub savings: f64,
    pub debt: f64,
    /// Largest first.
    #[serde(default)]
    pub breakdown: Vec<ExpenseAmount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodStatus {
    OnTrack,
    Over,
    Under,
}

impl MethodStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::OnTrack => "On track",
            Self::Over => "Over",
            Self::Under => "Under",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BudgetEnvelope {
    pub name: String,
    pub bucket: Bucket,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReverseStep {
    pub step: i64,
    pub label: String,
    pub amount: f64,
}

/// One budgeting method's verdict. Each method reports only the parts that
/// apply to it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BudgetMethod {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub allocated: BTreeMap<String, f64>,
    #[serde(default)]
    pub actual: BTreeMap<String, f64>,
    #[serde(default)]
    pub status: BTreeMap<String, MethodStatus>,
    pub unassigned: Option<f64>,
    pub committed_pct: Option<f64>,
    #[serde(default)]
    pub envelopes: Vec<BudgetEnvelope>,
    pub total_envelopes: Option<f64>,
    #[serde(default)]
    pub steps: Vec<ReverseStep>,
    pub guilt_free_spending: Option<f64>,
    pub surplus_after: f64,
}

impl BudgetMethod {
    /// The one figure that sums the method up.
    fn summary(
        &self,
        ctx: &ShapeContext,
    ) -> String {
        if let Some(unassigned) = self.unassigned {
            format!("Unassigned {}", ctx.money(unassigned))
        } else if let Some(pct) = self.committed_pct {
            format!("Committed {} of income", format::percent(pct, 1))
        } else if let Some(spending) = self.guilt_free_spending {
            format!("Guilt-free spending {}", ctx.money(spending))
        } else if let Some(total) = self.total_envelopes {
            format!("{} in envelopes", ctx.money(total))
        } else if !self.status.is_empty() {
            let on_track = self
                .status
                .values()
                .filter(|s| **s == MethodStatus::OnTrack)
                .count();
            format!("{on_track} of {} on track", self.status.len())
        } else {
            format::PLACEHOLDER.to_string()
        }
    }

    /// Status keys in the order the method lists its targets.
    fn tracked(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.status.keys().map(String::as_str).collect();
        keys.sort_by_key(|k| {
            ALLOCATION_ORDER
                .iter()
                .position(|o| o == k)
                .unwrap_or(ALLOCATION_ORDER.len())
        });
        keys
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BudgetHealth {
    pub savings_rate_pct: f64,
    pub savings_rate_status: String,
    pub housing_ratio_pct: f64,
    pub housing_ratio_status: String,
    pub debt_to_income_pct: f64,
    pub dti_status: String,
    pub emergency_fund_target_3mo: f64,
    pub emergency_fund_target_6mo: f64,
    pub fire_number: f64,
    /// `None` while nothing is being saved.
    pub years_to_fire: Option<f64>,
    pub monthly_surplus: f64,
    pub surplus_status: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BudgetResponse {
    pub income: BudgetIncome,
    pub expenses: BudgetExpenses,
    #[serde(default)]
    pub methods: BTreeMap<String, BudgetMethod>,
    pub health: BudgetHealth,
    pub monthly_surplus: f64,
    pub annual_surplus: f64,
}

/// Method keys in display order.
const METHOD_ORDER: [&str; 6] = ["50_30_20", "80_20", "zero_based", "60_solution", "envelope", "reverse"];

const ALLOCATION_ORDER: [&str; 9] = [
    "needs",
    "wants",
    "savings",
    "everything_else",
    "committed",
    "retirement",
    "long_term",
    "short_term",
    "fun",
];

/// `everything_else` -> `Everything else`.
fn allocation_label(key: &str) -> String {
    let words = key.replace('_', " ");
    let mut chars = words.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => words,
    }
}

fn rating_emphasis(status: &str) -> Emphasis {
    match status {
        "excellent" | "good" => Emphasis::Positive,
        "low" | "high" => Emphasis::Negative,
        _ => Emphasis::Normal,
    }
}

fn rated(
    pct: f64,
    status: &str,
) -> String {
    format!("{} ({status})", format::percent(pct, 1))
}

// =============================================================================
// Budget planner
// =============================================================================

pub struct Budget;

impl Calculator for Budget {
    type Response = BudgetResponse;

    fn key(&self) -> CalculatorKey {
        CalculatorKey::Budget
    }

    fn schema(&self) -> &'static [FieldSpec] {
        &BUDGET_FIELDS
    }

    fn validate(
        &self,
        input: &FormInput,
    ) -> Result<(), CalculationError> {
        require(total_income(input) > 0.0, "Total income must be greater than zero")
    }

    fn preview(
        &self,
        input: &FormInput,
    ) -> Option<PreviewEstimate> {
        let income = total_income(input);
        if income <= 0.0 {
            return None;
        }
        PreviewEstimate::currency("Monthly surplus", income - total_expenses(input))
    }

    fn shape(
        &self,
        r: &BudgetResponse,
        ctx: &ShapeContext,
    ) -> DisplayModel {
        let e = &r.expenses;
        let h = &r.health;
        let methods: Vec<&BudgetMethod> = METHOD_ORDER
            .iter()
            .filter_map(|key| r.methods.get(*key))
            .collect();

        let mut model = DisplayModel::new()
            .headline("Monthly surplus", ctx.money(r.monthly_surplus))
            .headline("Annual surplus", ctx.money(r.annual_surplus))
            .line("Total income", ctx.money(r.income.total), Emphasis::Strong)
            .line("Total expenses", ctx.money(e.total), Emphasis::Strong)
            .line("Needs", ctx.money(e.needs), Emphasis::Normal)
            .line("Wants", ctx.money(e.wants), Emphasis::Normal)
            .line("Savings", ctx.money(e.savings), Emphasis::Positive)
            .line("Debt repayments", ctx.money(e.debt), Emphasis::Negative)
            .line(
                "Savings rate",
                rated(h.savings_rate_pct, &h.savings_rate_status),
                rating_emphasis(&h.savings_rate_status),
            )
            .line(
                "Housing ratio",
                rated(h.housing_ratio_pct, &h.housing_ratio_status),
                rating_emphasis(&h.housing_ratio_status),
            )
            .line(
                "Debt-to-income",
                rated(h.debt_to_income_pct, &h.dti_status),
                rating_emphasis(&h.dti_status),
            )
            .line("Emergency fund (3 months)", ctx.money(h.emergency_fund_target_3mo), Emphasis::Muted)
            .line("Emergency fund (6 months)", ctx.money(h.emergency_fund_target_6mo), Emphasis::Muted)
            .line("FIRE number", ctx.money0(h.fire_number), Emphasis::Normal)
            .line(
                "Years to FIRE",
                h.years_to_fire
                    .map(|y| format!("{} years", format::number(y, 1)))
                    .unwrap_or_else(|| format::PLACEHOLDER.to_string()),
                Emphasis::Normal,
            )
            .table(Table::full(
                "Budgeting methods",
                &["Method", "Verdict", "How it works"],
                &methods,
                |m| vec![m.name.clone(), m.summary(ctx), m.description.clone()],
            ));

        for method in methods.iter().filter(|m| !m.status.is_empty()) {
            model = model.table(Table::full(
                method.name.clone(),
                &["Bucket", "Target", "Actual", "Status"],
                &method.tracked(),
                |key| {
                    vec![
                        allocation_label(key),
                        ctx.money_opt(method.allocated.get(*key).copied()),
                        ctx.money_opt(method.actual.get(*key).copied()),
                        method
                            .status
                            .get(*key)
                            .map(|s| s.label().to_string())
                            .unwrap_or_else(|| format::PLACEHOLDER.to_string()),
                    ]
                },
            ));
        }

        for method in methods.iter().filter(|m| !m.envelopes.is_empty()) {
            model = model.table(Table::windowed(
                method.name.clone(),
                &["Envelope", "Bucket", "Amount"],
                &method.envelopes,
                |env| vec![env.name.clone(), env.bucket.label().to_string(), ctx.money(env.amount)],
            ));
        }
        for method in methods.iter().filter(|m| !m.steps.is_empty()) {
            model = model.table(Table::full(
                method.name.clone(),
                &["Step", "Action", "Amount"],
                &method.steps,
                |s| vec![s.step.to_string(), s.label.clone(), ctx.money(s.amount)],
            ));
        }

        model = model
            .table(Table::windowed(
                "Expenses by category",
                &["Category", "Bucket", "Amount"],
                &e.breakdown,
                |x| vec![x.label.clone(), x.bucket.label().to_string(), ctx.money(x.amount)],
            ))
            .chart(
                ChartSpec::new(
                    "budget-buckets",
                    ChartKind::Doughnut,
                    [Bucket::Need, Bucket::Want, Bucket::Saving, Bucket::Debt]
                        .iter()
                        .map(|b| b.label().to_string())
                        .collect(),
                )
                .dataset(Dataset::new(
                    "Monthly spending",
                    vec![e.needs, e.wants, e.savings, e.debt],
                )),
            );

        if let Some(rule) = r.methods.get("50_30_20") {
            let keys = rule.tracked();
            model = model.chart(
                ChartSpec::new(
                    "budget-50-30-20",
                    ChartKind::Bar,
                    keys.iter().map(|k| allocation_label(k)).collect(),
                )
                .dataset(Dataset::new(
                    "Target",
                    keys.iter().map(|k| rule.allocated.get(*k).copied().unwrap_or(0.0)).collect(),
                ))
                .dataset(Dataset::new(
                    "Actual",
                    keys.iter().map(|k| rule.actual.get(*k).copied().unwrap_or(0.0)).collect(),
                )),
            );
        }

        match h.surplus_status.as_str() {
            "deficit" => model.note(
                Tone::Warning,
                format!("Spending exceeds income by {} a month.", ctx.money(-r.monthly_surplus)),
            ),
            "balanced" => model.note(Tone::Info, "Income and expenses balance exactly."),
            _ => model.note(
                Tone::Success,
                format!("{} a month is left after every expense.", ctx.money(r.monthly_surplus)),
            ),
        }
    }
}
