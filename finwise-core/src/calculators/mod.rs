//! One declarative contract per calculator and the registry that holds them.
//!
//! A [`Calculator`] states its input schema, local validation, preview
//! estimate, display currency and how its typed response is shaped for
//! display. Everything generic (payload building, decoding, the HTTP call)
//! is written once against the object-safe [`DynCalculator`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::CalculationError;
use crate::models::{
    CalculatorKey, DisplayModel, FieldSpec, FormInput, Payload, PreviewEstimate, ShapeContext,
    UnknownCalculator, build_payload,
};

mod budget;
mod debt;
mod investment;
mod mortgage;
mod specialized;
mod tax;

pub use budget::Budget;
pub use debt::{AutoLoan, CreditCard, PersonalLoan, StudentLoan};
pub use investment::{CompoundInterest, Fire, Retirement401k, Sip};
pub use mortgage::{Affordability, Refinance, RentVsBuy, Repayment};
pub use specialized::{Inflation, LatteFactor, RuleOf72};
pub use tax::{CapitalGains, Freelance, TakeHomePay};

pub trait Calculator: Send + Sync + 'static {
    /// The `data` object of a successful response.
    type Response: DeserializeOwned;

    fn key(&self) -> CalculatorKey;

    fn schema(&self) -> &'static [FieldSpec];

    /// Currency the result is shown in when it depends on the form (a
    /// country or region choice). `None` uses the session default.
    fn currency(
        &self,
        _input: &FormInput,
    ) -> Option<&'static str> {
        None
    }

    /// Checks that must pass before anything is sent.
    fn validate(
        &self,
        _input: &FormInput,
    ) -> Result<(), CalculationError> {
        Ok(())
    }

    fn preview(
        &self,
        _input: &FormInput,
    ) -> Option<PreviewEstimate> {
        None
    }

    fn shape(
        &self,
        response: &Self::Response,
        ctx: &ShapeContext,
    ) -> DisplayModel;
}

/// Type-erased view of a [`Calculator`].
pub trait DynCalculator: Send + Sync {
    fn key(&self) -> CalculatorKey;

    fn schema(&self) -> &'static [FieldSpec];

    fn currency(
        &self,
        input: &FormInput,
    ) -> Option<&'static str>;

    fn validate(
        &self,
        input: &FormInput,
    ) -> Result<(), CalculationError>;

    fn preview(
        &self,
        input: &FormInput,
    ) -> Option<PreviewEstimate>;

    fn payload(
        &self,
        input: &FormInput,
    ) -> Payload;

    /// Decodes a response `data` object and shapes it.
    fn shape_value(
        &self,
        data: Value,
        ctx: &ShapeContext,
    ) -> Result<DisplayModel, CalculationError>;
}

/// Wraps a [`Calculator`] so it can be stored behind `dyn DynCalculator`.
pub struct Registered<C>(pub C);

impl<C: Calculator> DynCalculator for Registered<C> {
    fn key(&self) -> CalculatorKey {
        self.0.key()
    }

    fn schema(&self) -> &'static [FieldSpec] {
        self.0.schema()
    }

    fn currency(
        &self,
        input: &FormInput,
    ) -> Option<&'static str> {
        self.0.currency(input)
    }

    fn validate(
        &self,
        input: &FormInput,
    ) -> Result<(), CalculationError> {
        self.0.validate(input)
    }

    fn preview(
        &self,
        input: &FormInput,
    ) -> Option<PreviewEstimate> {
        self.0.preview(input)
    }

    fn payload(
        &self,
        input: &FormInput,
    ) -> Payload {
        build_payload(self.0.schema(), input)
    }

    fn shape_value(
        &self,
        data: Value,
        ctx: &ShapeContext,
    ) -> Result<DisplayModel, CalculationError> {
        let response: C::Response = serde_json::from_value(data).map_err(|e| {
            CalculationError::Decode(format!("{} response: {e}", self.0.key()))
        })?;
        Ok(self.0.shape(&response, ctx))
    }
}

/// Shape context for one submission: the calculator's own currency when it
/// has one, otherwise `default_currency`.
pub fn shape_context(
    calculator: &dyn DynCalculator,
    input: &FormInput,
    default_currency: &str,
) -> ShapeContext {
    ShapeContext::new(calculator.currency(input).unwrap_or(default_currency))
}

/// Registry of calculator contracts, keyed by [`CalculatorKey`].
///
/// Built once at startup and handed to whatever mounts forms; nothing looks
/// calculators up from a global.
#[derive(Default)]
pub struct CalculatorRegistry {
    calculators: BTreeMap<CalculatorKey, Arc<dyn DynCalculator>>,
}

impl CalculatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a calculator. A calculator with the same key is replaced.
    pub fn register<C: Calculator>(
        &mut self,
        calculator: C,
    ) {
        self.register_dyn(Arc::new(Registered(calculator)));
    }

    pub fn register_dyn(
        &mut self,
        calculator: Arc<dyn DynCalculator>,
    ) {
        self.calculators.insert(calculator.key(), calculator);
    }

    /// # Errors
    /// [`UnknownCalculator`] when nothing is registered for `key`.
    pub fn get(
        &self,
        key: CalculatorKey,
    ) -> Result<Arc<dyn DynCalculator>, UnknownCalculator> {
        self.calculators
            .get(&key)
            .cloned()
            .ok_or_else(|| UnknownCalculator(key.slug().to_string()))
    }

    /// Looks a calculator up by slug or page path.
    pub fn lookup(
        &self,
        name: &str,
    ) -> Result<Arc<dyn DynCalculator>, UnknownCalculator> {
        let key: CalculatorKey = name.parse()?;
        self.get(key).map_err(|_| UnknownCalculator(name.to_string()))
    }

    /// Registered keys in site order.
    pub fn keys(&self) -> Vec<CalculatorKey> {
        self.calculators.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.calculators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calculators.is_empty()
    }
}

/// Registry holding every calculator.
pub fn default_registry() -> CalculatorRegistry {
    let mut registry = CalculatorRegistry::new();
    registry.register(Repayment);
    registry.register(RentVsBuy);
    registry.register(Refinance);
    registry.register(Affordability);
    registry.register(CompoundInterest);
    registry.register(Retirement401k);
    registry.register(Sip);
    registry.register(Fire);
    registry.register(StudentLoan);
    registry.register(CreditCard);
    registry.register(AutoLoan);
    registry.register(PersonalLoan);
    registry.register(TakeHomePay);
    registry.register(Freelance);
    registry.register(CapitalGains);
    registry.register(Inflation);
    registry.register(RuleOf72);
    registry.register(LatteFactor);
    registry.register(Budget);
    registry
}

// Shared by the calculator modules.

/// Chart axis labels for a `year` column.
fn year_labels<T>(
    rows: &[T],
    year: impl Fn(&T) -> i64,
) -> Vec<String> {
    rows.iter().map(|r| format!("Year {}", year(r))).collect()
}

fn column<T>(
    rows: &[T],
    value: impl Fn(&T) -> f64,
) -> Vec<f64> {
    rows.iter().map(value).collect()
}

fn require(
    condition: bool,
    message: &str,
) -> Result<(), CalculationError> {
    if condition {
        Ok(())
    } else {
        Err(CalculationError::Validation(message.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::models::{FieldKind, RawForm};

    /// Preview for the schema defaults with `field` replaced by `text`.
    fn preview_with(
        calc: &dyn DynCalculator,
        field: &str,
        text: &str,
    ) -> Option<PreviewEstimate> {
        let raw: RawForm = [(field.to_string(), text.to_string())].into_iter().collect();
        calc.preview(&FormInput::read(calc.schema(), &raw))
    }

    #[test]
    fn default_registry_holds_every_calculator() {
        let registry = default_registry();

        assert_eq!(registry.keys(), CalculatorKey::ALL.to_vec());
        for key in CalculatorKey::ALL {
            assert_eq!(registry.get(key).unwrap().key(), key);
        }
    }

    #[test]
    fn new_registry_is_empty() {
        let registry = CalculatorRegistry::new();

        assert!(registry.is_empty());
        assert!(matches!(
            registry.get(CalculatorKey::Sip),
            Err(UnknownCalculator(name)) if name == "sip"
        ));
    }

    #[test]
    fn duplicate_registration_replaces_previous() {
        let mut registry = CalculatorRegistry::new();
        registry.register(Repayment);
        registry.register(Repayment);

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lookup_accepts_page_path() {
        let registry = default_registry();

        let calc = registry.lookup("/debt/credit-card").unwrap();

        assert_eq!(calc.key(), CalculatorKey::CreditCard);
        assert_eq!(registry.lookup("/budget").unwrap().key(), CalculatorKey::Budget);
        assert!(registry.lookup("net-worth").is_err());
    }

    #[test]
    fn every_schema_has_unique_field_names() {
        for key in CalculatorKey::ALL {
            let calc = default_registry().get(key).unwrap();
            let mut names: Vec<_> = calc.schema().iter().map(|f| f.name).collect();
            let total = names.len();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), total, "{key} has duplicate fields");
        }
    }

    #[test]
    fn every_default_form_validates() {
        let registry = default_registry();
        for key in CalculatorKey::ALL {
            let calc = registry.get(key).unwrap();
            let input = FormInput::defaults(calc.schema());
            assert_eq!(calc.validate(&input), Ok(()), "{key}");
        }
    }

    #[test]
    fn previews_stay_finite_for_degenerate_inputs() {
        let registry = default_registry();
        for key in CalculatorKey::ALL {
            let calc = registry.get(key).unwrap();
            let numeric = calc
                .schema()
                .iter()
                .filter(|f| matches!(f.kind, FieldKind::Number { .. } | FieldKind::Integer { .. }));
            for field in numeric {
                for text in ["0", "-5", "1e300", "-1e300"] {
                    if let Some(preview) = preview_with(&*calc, field.name, text) {
                        assert!(preview.value.is_finite(), "{key} {}={text}", field.name);
                    }
                }
            }
        }
    }

    #[test]
    fn degenerate_key_quantities_have_no_preview() {
        let registry = default_registry();
        let cases = [
            (CalculatorKey::Repayment, "principal"),
            (CalculatorKey::Repayment, "term_years"),
            (CalculatorKey::RentVsBuy, "home_price"),
            (CalculatorKey::RentVsBuy, "term_years"),
            (CalculatorKey::Refinance, "current_balance"),
            (CalculatorKey::Refinance, "current_remaining_years"),
            (CalculatorKey::Refinance, "new_term_years"),
            (CalculatorKey::Affordability, "gross_annual_income"),
            (CalculatorKey::Fire, "safe_withdrawal_rate"),
            (CalculatorKey::StudentLoan, "loan_balance"),
            (CalculatorKey::StudentLoan, "new_term_years"),
            (CalculatorKey::CreditCard, "balance"),
            (CalculatorKey::AutoLoan, "loan_term_months"),
            (CalculatorKey::PersonalLoan, "loan_amount"),
            (CalculatorKey::PersonalLoan, "term_years"),
            (CalculatorKey::RuleOf72, "value"),
            (CalculatorKey::Budget, "inc_primary"),
        ];
        for (key, field) in cases {
            let calc = registry.get(key).unwrap();
            for text in ["0", "-1"] {
                assert_eq!(preview_with(&*calc, field, text), None, "{key} {field}={text}");
            }
        }
    }

    #[test]
    fn shape_value_reports_decode_error() {
        let calc = default_registry().get(CalculatorKey::Repayment).unwrap();

        let result = calc.shape_value(json!({"monthly_payment": "lots"}), &ShapeContext::default());

        assert!(matches!(result, Err(CalculationError::Decode(msg)) if msg.starts_with("repayment")));
    }

    #[test]
    fn shape_context_prefers_calculator_currency() {
        let registry = default_registry();
        let sip = registry.get(CalculatorKey::Sip).unwrap();
        let fire = registry.get(CalculatorKey::Fire).unwrap();

        let sip_ctx = shape_context(&*sip, &FormInput::defaults(sip.schema()), "USD");
        let fire_ctx = shape_context(&*fire, &FormInput::defaults(fire.schema()), "GBP");

        assert_eq!(sip_ctx.currency, "INR");
        assert_eq!(fire_ctx.currency, "GBP");
    }
}
