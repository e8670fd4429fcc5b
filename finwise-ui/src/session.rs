//! One calculator form: its raw field text, live preview, submit control
//! and results panel.
//!
//! A session is shared behind an `Arc` between the input loop, the preview
//! debouncer and an in-flight submission. Locks are never held across an
//! await.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use finwise_core::api::{CalculationApi, CalculationError, calculate};
use finwise_core::calculators::{DynCalculator, shape_context};
use finwise_core::models::{
    CalculatorKey, FieldSpec, FormInput, PreviewEstimate, RawForm, ShapeContext, render_preview,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::render::ResultsPanel;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("unknown field '{field}' for {calculator}")]
    UnknownField {
        calculator: CalculatorKey,
        field: String,
    },
}

/// What happened to a submit request.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The result is on the panel.
    Rendered,
    /// The form changed while the request was in flight; the response was
    /// discarded.
    Stale,
    /// A request was already in flight; nothing was sent.
    Busy,
    /// The panel shows the warning for this error.
    Failed(CalculationError),
}

/// Clears the busy flag on every exit path.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct FormSession {
    calculator: Arc<dyn DynCalculator>,
    api: Arc<dyn CalculationApi>,
    default_currency: String,
    fields: Mutex<RawForm>,
    panel: Mutex<ResultsPanel>,
    generation: AtomicU64,
    busy: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FormSession {
    pub fn new(
        calculator: Arc<dyn DynCalculator>,
        api: Arc<dyn CalculationApi>,
        default_currency: impl Into<String>,
    ) -> Self {
        Self {
            calculator,
            api,
            default_currency: default_currency.into(),
            fields: Mutex::new(RawForm::new()),
            panel: Mutex::new(ResultsPanel::new()),
            generation: AtomicU64::new(0),
            busy: AtomicBool::new(false),
        }
    }

    pub fn key(&self) -> CalculatorKey {
        self.calculator.key()
    }

    pub fn schema(&self) -> &'static [FieldSpec] {
        self.calculator.schema()
    }

    /// Stores the raw text for `name` and invalidates any in-flight
    /// submission.
    pub fn set_field(
        &self,
        name: &str,
        value: &str,
    ) -> Result<(), FormError> {
        self.set_fields(&[(name, value)])
    }

    /// Applies every edit or none: one unknown name rejects the lot.
    pub fn set_fields(
        &self,
        edits: &[(&str, &str)],
    ) -> Result<(), FormError> {
        if let Some((name, _)) = edits
            .iter()
            .find(|(name, _)| !self.schema().iter().any(|f| f.name == *name))
        {
            return Err(FormError::UnknownField {
                calculator: self.key(),
                field: name.to_string(),
            });
        }
        if edits.is_empty() {
            return Ok(());
        }
        {
            let mut fields = lock(&self.fields);
            for (name, value) in edits {
                fields.insert(name.to_string(), value.to_string());
            }
        }
        self.invalidate();
        Ok(())
    }

    /// The form as currently typed, with defaults for untouched fields.
    pub fn input(&self) -> FormInput {
        FormInput::read(self.schema(), &lock(&self.fields))
    }

    pub fn shape_context(&self) -> ShapeContext {
        shape_context(
            self.calculator.as_ref(),
            &self.input(),
            &self.default_currency,
        )
    }

    pub fn preview(&self) -> Option<PreviewEstimate> {
        self.calculator.preview(&self.input())
    }

    /// Preview line for the current inputs; the placeholder when there is
    /// no estimate.
    pub fn preview_text(&self) -> String {
        let input = self.input();
        let ctx = shape_context(self.calculator.as_ref(), &input, &self.default_currency);
        let estimate = self.calculator.preview(&input);
        debug!(calculator = %self.key(), ?estimate, "preview");
        render_preview(estimate.as_ref(), &ctx.currency)
    }

    /// Advances the generation so a response already in flight is dropped
    /// when it arrives.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// True while a submission is in flight and the submit control is
    /// disabled.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Validates, posts and renders the current form.
    pub async fn submit(&self) -> SubmitOutcome {
        let key = self.key();
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            debug!(calculator = %key, "submit ignored while a request is in flight");
            return SubmitOutcome::Busy;
        };

        let token = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let input = self.input();
        let ctx = shape_context(self.calculator.as_ref(), &input, &self.default_currency);
        info!(calculator = %key, token, "submitting");

        let result = calculate(
            self.api.as_ref(),
            self.calculator.as_ref(),
            &input,
            &ctx,
        )
        .await;

        if self.generation() != token {
            info!(calculator = %key, token, "discarding stale response");
            return SubmitOutcome::Stale;
        }

        let mut panel = lock(&self.panel);
        match result {
            Ok(model) => {
                panel.show_result(model, &ctx.currency);
                info!(calculator = %key, "result rendered");
                SubmitOutcome::Rendered
            }
            Err(error) => {
                warn!(calculator = %key, %error, "calculation failed");
                panel.show_error(&error);
                SubmitOutcome::Failed(error)
            }
        }
    }

    pub fn render_panel(&self) -> String {
        lock(&self.panel).render()
    }

    pub fn warning(&self) -> Option<String> {
        lock(&self.panel).warning().map(str::to_string)
    }

    pub fn dismiss_warning(&self) -> bool {
        lock(&self.panel).dismiss_warning()
    }

    /// Number of charts currently drawn on the panel.
    pub fn live_charts(&self) -> usize {
        lock(&self.panel).charts().len()
    }

    /// `(name, label, value)` for every field as the form currently reads it.
    pub fn describe_fields(&self) -> Vec<(&'static str, &'static str, String)> {
        let input = self.input();
        self.schema()
            .iter()
            .map(|f| {
                let value = input.get(f.name).map(ToString::to_string).unwrap_or_default();
                (f.name, f.label, value)
            })
            .collect()
    }
}
