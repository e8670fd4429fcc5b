use serde_json::{Map, Number, Value};

use super::form_input::{FieldValue, FormInput};

/// JSON object posted to the calculation service.
pub type Payload = Map<String, Value>;

/// How a single form field is read and serialized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// Free numeric input; unparsable text reads as 0.
    Number { default: f64 },
    /// Whole number; fractional input is truncated toward zero.
    Integer { default: i64 },
    /// One of a fixed set of strings. Blank input falls back to `default`.
    Choice {
        default: &'static str,
        options: &'static [&'static str],
    },
    /// Checkbox.
    Flag { default: bool },
}

/// A named input on a calculator form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// Request field name, also the form field name.
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn number(
        name: &'static str,
        label: &'static str,
        default: f64,
    ) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Number { default },
        }
    }

    pub const fn integer(
        name: &'static str,
        label: &'static str,
        default: i64,
    ) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Integer { default },
        }
    }

    pub const fn choice(
        name: &'static str,
        label: &'static str,
        default: &'static str,
        options: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Choice { default, options },
        }
    }

    pub const fn flag(
        name: &'static str,
        label: &'static str,
        default: bool,
    ) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Flag { default },
        }
    }

    /// The value the form is pre-filled with.
    pub fn default_value(&self) -> FieldValue {
        match self.kind {
            FieldKind::Number { default } => FieldValue::Number(default),
            FieldKind::Integer { default } => FieldValue::Integer(default),
            FieldKind::Choice { default, .. } => FieldValue::Text(default.to_string()),
            FieldKind::Flag { default } => FieldValue::Flag(default),
        }
    }
}

fn to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Number(n) => Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or_else(|| Value::from(0.0)),
        FieldValue::Integer(i) => Value::from(*i),
        FieldValue::Text(s) => Value::from(s.as_str()),
        FieldValue::Flag(b) => Value::Bool(*b),
    }
}

/// Serializes every schema field of `input`. Fields absent from `input` are sent
/// with their default; non-finite numbers are sent as 0.
pub fn build_payload(
    schema: &[FieldSpec],
    input: &FormInput,
) -> Payload {
    schema
        .iter()
        .map(|spec| {
            let value = input
                .get(spec.name)
                .map(to_json)
                .unwrap_or_else(|| to_json(&spec.default_value()));
            (spec.name.to_string(), value)
        })
        .collect()
}
