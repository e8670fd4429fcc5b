use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Shown when the service rejects a request without saying why.
pub const GENERIC_FALLBACK: &str = "Calculation failed. Please check your inputs and try again.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalculationError {
    /// Local check failed; nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// The service answered `ok: false`.
    #[error("{0}")]
    Rejected(String),

    /// The request never produced an envelope.
    #[error("transport error{}: {message}", status_suffix(.status))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The body or its `data` did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl CalculationError {
    /// Text for the inline warning. Transport and decode details stay in
    /// the logs.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Validation(msg) | Self::Rejected(msg) => msg,
            Self::Transport { .. } | Self::Decode(_) => GENERIC_FALLBACK,
        }
    }
}

/// `{ ok, data?, error? }` wrapper around every service response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    pub fn success(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Unwraps the `data` payload.
    ///
    /// # Errors
    /// * [`CalculationError::Rejected`] when `ok` is false, carrying the
    ///   server message or [`GENERIC_FALLBACK`] if it is absent or blank.
    /// * [`CalculationError::Decode`] when `ok` is true but `data` is absent.
    pub fn into_data(self) -> Result<Value, CalculationError> {
        if !self.ok {
            let message = self
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| GENERIC_FALLBACK.to_string());
            return Err(CalculationError::Rejected(message));
        }
        match self.data {
            Some(Value::Null) | None => Err(CalculationError::Decode(
                "successful response carried no data".to_string(),
            )),
            Some(data) => Ok(data),
        }
    }
}
