//! Startup wiring and the command front ends built on [`FormSession`].

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use finwise_core::api::CalculationApi;
use finwise_core::calculators::CalculatorRegistry;
use finwise_core::models::UnknownCalculator;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

use crate::config::UiConfig;
use crate::debounce::Debouncer;
use crate::session::{FormError, FormSession, SubmitOutcome};
use crate::utils::{Assignment, ParseAssignmentError, parse_assignments};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    UnknownCalculator(#[from] UnknownCalculator),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Assignment(#[from] ParseAssignmentError),
}

/// Everything a front end needs: the calculators, the service and the
/// settings. Built once by [`bootstrap`].
pub struct App {
    registry: CalculatorRegistry,
    api: Arc<dyn CalculationApi>,
    config: UiConfig,
}

/// Wires the registry and the service together. Nothing is looked up from
/// globals after this point.
pub fn bootstrap(
    registry: CalculatorRegistry,
    api: Arc<dyn CalculationApi>,
    config: UiConfig,
) -> App {
    info!(
        calculators = registry.len(),
        base_url = %config.api.base_url,
        "bootstrapped"
    );
    App {
        registry,
        api,
        config,
    }
}

impl App {
    pub fn config(&self) -> &UiConfig {
        &self.config
    }

    /// One line per calculator: key, title and API route.
    pub fn catalog(&self) -> String {
        self.registry
            .keys()
            .into_iter()
            .map(|key| format!("{:<18} {:<28} {}\n", key.slug(), key.title(), key.api_path()))
            .collect()
    }

    /// A fresh form for the calculator named by slug or page path.
    pub fn session(
        &self,
        name: &str,
    ) -> Result<Arc<FormSession>, AppError> {
        let calculator = self.registry.lookup(name)?;
        Ok(Arc::new(FormSession::new(
            calculator,
            Arc::clone(&self.api),
            self.config.ui.currency.clone(),
        )))
    }

    /// Opens a form and fills it from `name=value` arguments.
    pub fn session_with(
        &self,
        name: &str,
        args: &[String],
    ) -> Result<Arc<FormSession>, AppError> {
        let session = self.session(name)?;
        let mut assignments = Vec::new();
        for arg in args {
            assignments.extend(parse_assignments(arg)?);
        }
        apply(&session, &assignments)?;
        Ok(session)
    }

    /// Preview line for a form filled from `args`.
    pub fn preview(
        &self,
        name: &str,
        args: &[String],
    ) -> Result<String, AppError> {
        let session = self.session_with(name, args)?;
        Ok(format!("{}: {}", session.key().title(), session.preview_text()))
    }

    /// Submits a form filled from `args` and returns the outcome with the
    /// rendered panel.
    pub async fn calculate(
        &self,
        name: &str,
        args: &[String],
    ) -> Result<(SubmitOutcome, String), AppError> {
        let session = self.session_with(name, args)?;
        let outcome = session.submit().await;
        Ok((outcome, session.render_panel()))
    }
}

fn apply(
    session: &FormSession,
    assignments: &[Assignment],
) -> Result<(), FormError> {
    let edits: Vec<(&str, &str)> = assignments
        .iter()
        .map(|a| (a.name.as_str(), a.value.as_str()))
        .collect();
    session.set_fields(&edits)
}

// =============================================================================
// Interactive form
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command<'a> {
    Submit,
    Show,
    Dismiss,
    Help,
    Quit,
    Blank,
    Edit(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "" => Self::Blank,
            "submit" => Self::Submit,
            "show" => Self::Show,
            "dismiss" => Self::Dismiss,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => Self::Edit(line),
        }
    }
}

const HELP: &str = "\
field=value ...  edit fields (preview updates after a pause)
submit           calculate with the service
show             list the form's fields
dismiss          clear the warning
quit             leave";

fn emit<W: Write>(
    out: &Mutex<W>,
    text: &str,
) -> io::Result<()> {
    let mut out = out.lock().unwrap_or_else(PoisonError::into_inner);
    writeln!(out, "{text}")?;
    out.flush()
}

/// Reads commands from `input` until `quit` or end of input. Field edits
/// reschedule the debounced preview; a preview still pending at exit is
/// printed before returning.
pub async fn run_interactive<R, W>(
    session: Arc<FormSession>,
    debounce: std::time::Duration,
    input: R,
    out: Arc<Mutex<W>>,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send + 'static,
{
    let preview_session = Arc::clone(&session);
    let preview_out = Arc::clone(&out);
    let debouncer = Debouncer::new(debounce, move |()| {
        let line = format!("preview  {}", preview_session.preview_text());
        if let Err(e) = emit(&preview_out, &line) {
            warn!(error = %e, "cannot write preview");
        }
    });

    emit(&out, &format!("{} (type 'help' for commands)", session.key().title()))?;
    emit(&out, &format!("preview  {}", session.preview_text()))?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Blank => {}
            Command::Quit => break,
            Command::Help => emit(&out, HELP)?,
            Command::Show => {
                for (name, label, value) in session.describe_fields() {
                    emit(&out, &format!("{name:<22} {value:<14} {label}"))?;
                }
            }
            Command::Dismiss => {
                if !session.dismiss_warning() {
                    emit(&out, "no warning to dismiss")?;
                }
            }
            Command::Submit => match session.submit().await {
                SubmitOutcome::Busy => emit(&out, "a calculation is already running")?,
                SubmitOutcome::Stale => emit(&out, "form changed, result discarded")?,
                SubmitOutcome::Rendered | SubmitOutcome::Failed(_) => {
                    emit(&out, session.render_panel().trim_end())?;
                }
            },
            Command::Edit(text) => match parse_assignments(text)
                .map_err(AppError::from)
                .and_then(|list| apply(&session, &list).map_err(AppError::from))
            {
                Ok(()) => debouncer.call(()),
                Err(e) => emit(&out, &format!("error: {e}"))?,
            },
        }
    }

    debouncer.finish().await;
    Ok(())
}
