use crate::format;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewUnit {
    Currency,
    Years,
    Months,
    Percent,
}

/// Instant client-side approximation shown before the server answers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewEstimate {
    pub label: &'static str,
    pub value: f64,
    pub unit: PreviewUnit,
}

impl PreviewEstimate {
    /// `None` when `value` is not finite.
    pub fn new(
        label: &'static str,
        value: f64,
        unit: PreviewUnit,
    ) -> Option<Self> {
        value.is_finite().then_some(Self { label, value, unit })
    }

    pub fn currency(
        label: &'static str,
        value: f64,
    ) -> Option<Self> {
        Self::new(label, value, PreviewUnit::Currency)
    }

    pub fn years(
        label: &'static str,
        value: f64,
    ) -> Option<Self> {
        Self::new(label, value, PreviewUnit::Years)
    }

    pub fn months(
        label: &'static str,
        value: f64,
    ) -> Option<Self> {
        Self::new(label, value, PreviewUnit::Months)
    }

    pub fn percent(
        label: &'static str,
        value: f64,
    ) -> Option<Self> {
        Self::new(label, value, PreviewUnit::Percent)
    }

    /// Formatted value only.
    pub fn value_text(
        &self,
        currency_code: &str,
    ) -> String {
        match self.unit {
            PreviewUnit::Currency => format::currency(self.value, currency_code, 2),
            PreviewUnit::Years => format!("{} years", format::number(self.value, 1)),
            PreviewUnit::Months => format::months(self.value),
            PreviewUnit::Percent => format::percent(self.value, 2),
        }
    }
}

/// Text for the single preview field. An unavailable estimate shows the
/// placeholder.
pub fn render_preview(
    estimate: Option<&PreviewEstimate>,
    currency_code: &str,
) -> String {
    match estimate {
        Some(e) => format!("{}: {}", e.label, e.value_text(currency_code)),
        None => format::PLACEHOLDER.to_string(),
    }
}
