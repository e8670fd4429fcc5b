//! `reqwest` transport for the calculation service.
//!
//! Every calculator posts its payload as JSON to
//! `base_url + /api/<domain>/<calculator>` and gets an envelope back. The
//! service answers validation failures with `422` and a normal
//! `ok: false` envelope, so the body is read as an envelope whatever the
//! status; only a body that is not an envelope turns the status into an
//! error.

use std::time::Duration;

use async_trait::async_trait;
use finwise_core::api::{CalculationApi, CalculationError, Envelope};
use finwise_core::models::{CalculatorKey, Payload};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

/// Longest body excerpt carried in a transport error.
const BODY_EXCERPT: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Origin of the calculation service, without a trailing `/api`.
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Calculation service reached over HTTP. One attempt per request.
#[derive(Debug, Clone)]
pub struct HttpCalculationApi {
    client: Client,
    config: ApiConfig,
}

impl HttpCalculationApi {
    pub fn new(config: ApiConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(
        client: Client,
        config: ApiConfig,
    ) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Full endpoint URL for `key`.
    pub fn url_for(
        &self,
        key: CalculatorKey,
    ) -> String {
        format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            key.api_path()
        )
    }
}

#[async_trait]
impl CalculationApi for HttpCalculationApi {
    async fn post(
        &self,
        key: CalculatorKey,
        payload: &Payload,
    ) -> Result<Envelope, CalculationError> {
        let url = self.url_for(key);
        debug!(calculator = %key, %url, "sending calculation request");

        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                warn!(calculator = %key, error = %e, "calculation request failed");
                transport(None, e.to_string())
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| transport(Some(status), e.to_string()))?;

        decode_envelope(status, &body).inspect_err(|e| {
            warn!(calculator = %key, status = status.as_u16(), error = %e, "unusable response");
        })
    }
}

/// Reads `body` as an envelope. A body that is not one is a transport
/// failure on an error status and a decode failure otherwise.
pub fn decode_envelope(
    status: StatusCode,
    body: &[u8],
) -> Result<Envelope, CalculationError> {
    match serde_json::from_slice::<Envelope>(body) {
        Ok(envelope) => Ok(envelope),
        Err(_) if !status.is_success() => Err(transport(Some(status), excerpt(body))),
        Err(e) => Err(CalculationError::Decode(e.to_string())),
    }
}

fn transport(
    status: Option<StatusCode>,
    message: String,
) -> CalculationError {
    CalculationError::Transport {
        status: status.map(|s| s.as_u16()),
        message,
    }
}

fn excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return "empty response body".to_string();
    }
    match text.char_indices().nth(BODY_EXCERPT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn url_joins_base_and_route() {
        let api = HttpCalculationApi::new(ApiConfig {
            base_url: "http://calc.local/".to_string(),
            timeout_seconds: 5,
        });

        assert_eq!(
            api.url_for(CalculatorKey::RuleOf72),
            "http://calc.local/api/specialized/rule-of-72"
        );
        assert_eq!(
            api.url_for(CalculatorKey::Repayment),
            "http://calc.local/api/mortgage/repayment"
        );
        assert_eq!(api.url_for(CalculatorKey::Budget), "http://calc.local/api/budget");
    }

    #[test]
    fn envelope_is_read_on_error_status() {
        let body = json!({"ok": false, "error": "Home price must be positive"}).to_string();

        let envelope = decode_envelope(StatusCode::UNPROCESSABLE_ENTITY, body.as_bytes()).unwrap();

        assert_eq!(
            envelope.into_data(),
            Err(CalculationError::Rejected(
                "Home price must be positive".to_string()
            ))
        );
    }

    #[test]
    fn non_envelope_on_error_status_is_transport() {
        let result = decode_envelope(StatusCode::BAD_GATEWAY, b"<html>Bad Gateway</html>");

        assert_eq!(
            result,
            Err(CalculationError::Transport {
                status: Some(502),
                message: "<html>Bad Gateway</html>".to_string(),
            })
        );
    }

    #[test]
    fn non_envelope_on_success_is_decode() {
        let result = decode_envelope(StatusCode::OK, b"not json");

        assert!(matches!(result, Err(CalculationError::Decode(_))));
    }

    #[test]
    fn excerpt_truncates_long_bodies() {
        let long = "x".repeat(500);

        let text = excerpt(long.as_bytes());

        assert_eq!(text.len(), BODY_EXCERPT + 3);
        assert!(text.ends_with("..."));
        assert_eq!(excerpt(b"   "), "empty response body");
    }
}
