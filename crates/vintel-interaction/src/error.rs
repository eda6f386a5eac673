//! Mapping of transport-level failures onto `VintelError`.

use reqwest::{Response, StatusCode};
use serde::Deserialize;
use vintel_core::VintelError;

/// `{success: false, error|message: string}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Timeouts and connection failures become retryable `Network` errors.
/// Body decode failures are not retried.
pub fn from_reqwest(err: reqwest::Error) -> VintelError {
    if err.is_decode() {
        return VintelError::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        };
    }
    if let Some(status) = err.status() {
        return VintelError::server(status.as_u16(), "");
    }
    if err.is_timeout() {
        return VintelError::network(format!("request timed out: {}", err));
    }
    VintelError::network(err.to_string())
}

/// Extracts the user-facing message from an error response body.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .map(|m| m.trim().to_string())
        .unwrap_or_default()
}

/// Turns a non-success response into `VintelError::Server`.
pub async fn server_error(response: Response) -> VintelError {
    let status: StatusCode = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body);
    tracing::debug!(
        "[HttpBackend] {} {}: {}",
        status.as_u16(),
        response_reason(status),
        if message.is_empty() { "<no message>" } else { &message }
    );
    VintelError::server(status.as_u16(), message)
}

fn response_reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("")
}
