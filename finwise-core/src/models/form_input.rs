use std::collections::BTreeMap;
use std::fmt;

use super::schema::{FieldKind, FieldSpec};

/// Raw form state: field name to the text currently typed into it.
pub type RawForm = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Integer(i64),
    Text(String),
    Flag(bool),
}

impl FieldValue {
    /// Numeric view of the value. Text and flags read as 0.
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Number(n) => *n,
            Self::Integer(i) => *i as f64,
            Self::Text(_) | Self::Flag(_) => 0.0,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Text(s) => f.write_str(s),
            Self::Flag(b) => write!(f, "{b}"),
        }
    }
}

/// Typed values for every field of one calculator form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormInput {
    values: BTreeMap<String, FieldValue>,
}

/// Strips thousands separators and surrounding whitespace.
fn normalize_numeric_input(s: &str) -> String {
    s.trim().replace(',', "")
}

fn parse_number(s: &str) -> f64 {
    let normalized = normalize_numeric_input(s);
    if normalized.is_empty() {
        return 0.0;
    }
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        Ok(_) => 0.0,
        Err(e) => {
            tracing::debug!(input = %s, "unparsable number, reading as 0: {}", e);
            0.0
        }
    }
}

fn parse_integer(s: &str) -> i64 {
    parse_number(s).trunc() as i64
}

fn parse_flag(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "true" | "on" | "yes" | "1" | "checked"
    )
}

impl FormInput {
    /// Reads raw form text through `schema`.
    ///
    /// Fields missing from `raw` take the schema default. Present fields are
    /// parsed leniently: numbers default to 0, integers truncate toward zero,
    /// blank choices fall back to the default. Fields not in the schema are
    /// ignored.
    pub fn read(
        schema: &[FieldSpec],
        raw: &RawForm,
    ) -> Self {
        let values = schema
            .iter()
            .map(|spec| {
                let value = match raw.get(spec.name) {
                    None => spec.default_value(),
                    Some(text) => match spec.kind {
                        FieldKind::Number { .. } => FieldValue::Number(parse_number(text)),
                        FieldKind::Integer { .. } => FieldValue::Integer(parse_integer(text)),
                        FieldKind::Choice { default, .. } => {
                            let trimmed = text.trim();
                            if trimmed.is_empty() {
                                FieldValue::Text(default.to_string())
                            } else {
                                FieldValue::Text(trimmed.to_string())
                            }
                        }
                        FieldKind::Flag { .. } => FieldValue::Flag(parse_flag(text)),
                    },
                };
                (spec.name.to_string(), value)
            })
            .collect();
        Self { values }
    }

    /// Schema defaults only.
    pub fn defaults(schema: &[FieldSpec]) -> Self {
        Self::read(schema, &RawForm::new())
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn set(
        &mut self,
        name: &str,
        value: FieldValue,
    ) {
        self.values.insert(name.to_string(), value);
    }

    /// Numeric field value, 0 when absent.
    pub fn number(
        &self,
        name: &str,
    ) -> f64 {
        self.get(name).map(FieldValue::as_f64).unwrap_or(0.0)
    }

    /// Integer field value, 0 when absent. Numbers are truncated.
    pub fn integer(
        &self,
        name: &str,
    ) -> i64 {
        match self.get(name) {
            Some(FieldValue::Integer(i)) => *i,
            Some(FieldValue::Number(n)) if n.is_finite() => n.trunc() as i64,
            _ => 0,
        }
    }

    /// Choice field value, empty when absent.
    pub fn text(
        &self,
        name: &str,
    ) -> &str {
        match self.get(name) {
            Some(FieldValue::Text(s)) => s,
            _ => "",
        }
    }

    pub fn flag(
        &self,
        name: &str,
    ) -> bool {
        matches!(self.get(name), Some(FieldValue::Flag(true)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
