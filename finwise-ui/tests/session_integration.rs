use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use finwise_core::api::{CalculationApi, CalculationError, Envelope, GENERIC_FALLBACK};
use finwise_core::default_registry;
use finwise_core::models::{CalculatorKey, Payload};
use finwise_ui::config::UiConfig;
use finwise_ui::{FormSession, SubmitOutcome, bootstrap, run_interactive};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::sync::Notify;

fn rule_of_72_data() -> Value {
    json!({
        "rule_72": {"years": 9.0},
        "rule_114": {"years": 14.25},
        "rule_144": {"years": 18.0},
        "exact": {"double": 9.006, "triple": 14.275, "quad": 18.013},
        "description": "At 8.0% annual return, money doubles in ~9.0 years.",
        "rate_pct": 8.0
    })
}

/// Answers every request with the same result, counting calls. When gated,
/// each answer waits for [`StubApi::release`].
struct StubApi {
    reply: Result<Envelope, CalculationError>,
    gate: Option<Notify>,
    calls: AtomicUsize,
}

impl StubApi {
    fn answering(reply: Result<Envelope, CalculationError>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            gate: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn gated(reply: Result<Envelope, CalculationError>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            gate: Some(Notify::new()),
            calls: AtomicUsize::new(0),
        })
    }

    fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CalculationApi for StubApi {
    async fn post(
        &self,
        _key: CalculatorKey,
        _payload: &Payload,
    ) -> Result<Envelope, CalculationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.reply.clone()
    }
}

fn rule_of_72_session(api: Arc<StubApi>) -> Arc<FormSession> {
    let calculator = default_registry().get(CalculatorKey::RuleOf72).unwrap();
    Arc::new(FormSession::new(calculator, api, "USD"))
}

async fn until(condition: impl Fn() -> bool) {
    while !condition() {
        tokio::task::yield_now().await;
    }
}

fn spawn_submit(session: &Arc<FormSession>) -> tokio::task::JoinHandle<SubmitOutcome> {
    let session = Arc::clone(session);
    tokio::spawn(async move { session.submit().await })
}

// =============================================================================
// Submit control
// =============================================================================

#[tokio::test]
async fn submit_while_in_flight_is_ignored() {
    let api = StubApi::gated(Ok(Envelope::success(rule_of_72_data())));
    let session = rule_of_72_session(Arc::clone(&api));

    let first = spawn_submit(&session);
    until(|| api.calls() == 1).await;

    assert!(session.is_busy());
    assert_eq!(session.submit().await, SubmitOutcome::Busy);

    api.release();
    assert_eq!(first.await.unwrap(), SubmitOutcome::Rendered);
    assert!(!session.is_busy());
    assert_eq!(api.calls(), 1);
}

#[tokio::test]
async fn control_is_released_after_every_error_kind() {
    let failures = [
        Ok(Envelope::failure("Value must be positive")),
        Ok(Envelope::failure("")),
        Err(CalculationError::Transport {
            status: None,
            message: "connection refused".to_string(),
        }),
        Ok(Envelope::success(json!({"unexpected": true}))),
    ];

    for reply in failures {
        let session = rule_of_72_session(StubApi::answering(reply));

        let outcome = session.submit().await;

        assert!(matches!(outcome, SubmitOutcome::Failed(_)), "{outcome:?}");
        assert!(!session.is_busy());
        assert!(session.warning().is_some());
    }
}

#[tokio::test]
async fn infrastructure_errors_show_generic_message() {
    let session = rule_of_72_session(StubApi::answering(Err(CalculationError::Transport {
        status: Some(502),
        message: "bad gateway".to_string(),
    })));

    session.submit().await;

    assert_eq!(session.warning(), Some(GENERIC_FALLBACK.to_string()));
}

// =============================================================================
// Stale responses
// =============================================================================

#[tokio::test]
async fn response_after_edit_is_discarded() {
    let api = StubApi::gated(Ok(Envelope::success(rule_of_72_data())));
    let session = rule_of_72_session(Arc::clone(&api));

    let first = spawn_submit(&session);
    until(|| api.calls() == 1).await;
    session.set_field("value", "9").unwrap();
    api.release();

    assert_eq!(first.await.unwrap(), SubmitOutcome::Stale);
    assert_eq!(session.render_panel(), "");
    assert_eq!(session.live_charts(), 0);
    assert!(!session.is_busy());

    api.release();
    assert_eq!(session.submit().await, SubmitOutcome::Rendered);
    assert!(session.render_panel().contains("Years to double"));
}

#[tokio::test]
async fn explicit_invalidate_discards_in_flight_response() {
    let api = StubApi::gated(Err(CalculationError::Rejected("late".to_string())));
    let session = rule_of_72_session(Arc::clone(&api));

    let first = spawn_submit(&session);
    until(|| api.calls() == 1).await;
    session.invalidate();
    api.release();

    assert_eq!(first.await.unwrap(), SubmitOutcome::Stale);
    assert_eq!(session.warning(), None);
}

// =============================================================================
// Charts
// =============================================================================

#[tokio::test]
async fn repeated_submits_keep_one_chart_per_canvas() {
    let session = rule_of_72_session(StubApi::answering(Ok(Envelope::success(rule_of_72_data()))));

    for _ in 0..3 {
        assert_eq!(session.submit().await, SubmitOutcome::Rendered);
        assert_eq!(session.live_charts(), 1);
    }
}

// =============================================================================
// Front ends
// =============================================================================

#[tokio::test]
async fn catalog_lists_every_calculator() {
    let app = bootstrap(
        default_registry(),
        StubApi::answering(Ok(Envelope::success(json!({})))),
        UiConfig::default(),
    );

    let catalog = app.catalog();

    assert_eq!(catalog.lines().count(), 19);
    assert!(catalog.contains("/api/specialized/rule-of-72"));
    assert!(catalog.contains("/api/budget"));
}

#[tokio::test]
async fn preview_command_fills_form_from_arguments() {
    let app = bootstrap(
        default_registry(),
        StubApi::answering(Ok(Envelope::success(json!({})))),
        UiConfig::default(),
    );

    let line = app
        .preview("rule-of-72", &["value=12".to_string()])
        .unwrap();

    assert_eq!(line, "Rule of 72: Years to double: 6.0 years");
    assert!(app.preview("rule-of-73", &[]).is_err());
    assert!(app.preview("rule-of-72", &["colour=red".to_string()]).is_err());
}

#[tokio::test]
async fn calculate_command_renders_panel() {
    let app = bootstrap(
        default_registry(),
        StubApi::answering(Ok(Envelope::success(rule_of_72_data()))),
        UiConfig::default(),
    );

    let (outcome, panel) = app.calculate("/specialized/rule-of-72", &[]).await.unwrap();

    assert_eq!(outcome, SubmitOutcome::Rendered);
    assert!(panel.starts_with("Years to double: 9.00 years"));
}

#[tokio::test(start_paused = true)]
async fn interactive_session_edits_submits_and_previews() {
    let session = rule_of_72_session(StubApi::answering(Ok(Envelope::success(rule_of_72_data()))));
    let out = Arc::new(Mutex::new(Vec::<u8>::new()));
    let input: &[u8] = b"value=12\nsubmit\nshow\nbogus\ndismiss\nquit\nvalue=1\n";

    run_interactive(
        Arc::clone(&session),
        Duration::from_millis(250),
        input,
        Arc::clone(&out),
    )
    .await
    .unwrap();

    let text = String::from_utf8(out.lock().unwrap().clone()).unwrap();
    assert!(text.starts_with("Rule of 72 (type 'help' for commands)\n"));
    assert!(text.contains("preview  Years to double: 9.0 years"));
    assert!(text.contains("Years to double: 9.00 years"));
    assert!(text.contains(&format!("{:<22} {:<14} {}", "value", "12", "Rate (%) or years")));
    assert!(text.contains("error: expected name=value, found 'bogus'"));
    assert!(text.contains("no warning to dismiss"));
    assert!(text.contains("preview  Years to double: 6.0 years"));
    assert_eq!(session.input().number("value"), 12.0);
}

#[tokio::test(start_paused = true)]
async fn interactive_edit_with_unknown_field_is_all_or_nothing() {
    let session = rule_of_72_session(StubApi::answering(Ok(Envelope::success(rule_of_72_data()))));
    let out = Arc::new(Mutex::new(Vec::<u8>::new()));
    let input: &[u8] = b"value=9 colour=red\nquit\n";

    run_interactive(
        Arc::clone(&session),
        Duration::from_millis(250),
        input,
        Arc::clone(&out),
    )
    .await
    .unwrap();

    let text = String::from_utf8(out.lock().unwrap().clone()).unwrap();
    assert!(text.contains("error: unknown field 'colour' for rule-of-72"));
    assert_eq!(session.input().number("value"), 8.0);
}
