//! Response interceptor pipeline.
//!
//! Every call made by [`crate::client::ApiClient`] funnels its outcome
//! through this module exactly once, in this order:
//!
//! 1. transport failure, no response → [`ErrorKind::Network`]
//! 2. failing HTTP status → [`ErrorKind::Server`], detail extracted from the body
//! 3. success status, payload not JSON or failing its guard → [`ErrorKind::Schema`]
//!
//! Failures raised while building a request (before anything is sent) come
//! out as [`ErrorKind::Validation`].
//!
//! [`ErrorKind::Network`]: crate::error::ErrorKind::Network
//! [`ErrorKind::Server`]: crate::error::ErrorKind::Server
//! [`ErrorKind::Schema`]: crate::error::ErrorKind::Schema
//! [`ErrorKind::Validation`]: crate::error::ErrorKind::Validation

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::error::{ApiResult, ClassifiedError};

/// Classify a `reqwest` error raised before a response arrived.
pub fn classify_transport(err: &reqwest::Error, timeout: Duration) -> ClassifiedError {
    let classified = if err.is_builder() {
        ClassifiedError::validation(format!("invalid request: {}", err))
    } else if err.is_timeout() {
        ClassifiedError::network(format!(
            "request timed out after {}s",
            timeout.as_secs_f64()
        ))
    } else if err.is_connect() {
        ClassifiedError::network(format!("could not reach backend: {}", err))
    } else {
        ClassifiedError::network(format!("request failed: {}", err))
    };
    tracing::warn!(kind = %classified.kind, error = %err, "transport failure");
    classified
}

/// Pull a human-readable detail out of an error body.
///
/// Understands the shapes backends commonly send:
/// - `{"detail": "..."}`
/// - `{"detail": [{"msg": "..."}, ...]}` (request validation errors)
/// - `{"error": {"message": "..."}}`
/// - `{"message": "..."}`
pub fn extract_detail(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;

    let detail = match json.get("detail") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Array(items)) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        _ => None,
    };

    detail
        .or_else(|| {
            json.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .or_else(|| json.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|s| !s.trim().is_empty())
}

/// Classify a response that arrived with a failing status.
pub fn classify_status(status: StatusCode, body: &str) -> ClassifiedError {
    let message = extract_detail(body)
        .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
    let classified = ClassifiedError::server(status.as_u16(), message);
    tracing::warn!(
        status = status.as_u16(),
        message = %classified.message,
        "backend returned an error status"
    );
    classified
}

/// Read a response and run steps 1–2 of the pipeline, yielding the raw JSON
/// payload on success. An empty body reads as `null`.
pub async fn intercept(
    outcome: Result<reqwest::Response, reqwest::Error>,
    timeout: Duration,
) -> ApiResult<Value> {
    let response = outcome.map_err(|e| classify_transport(&e, timeout))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| classify_transport(&e, timeout))?;

    if !status.is_success() {
        return Err(classify_status(status, &body));
    }

    parse_payload(&body)
}

/// Parse a success body as JSON.
pub fn parse_payload(body: &str) -> ApiResult<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| {
        tracing::warn!(error = %e, "response body is not JSON");
        ClassifiedError::schema(format!("response is not valid JSON: {}", e))
    })
}

/// Step 3: check `payload` against `guard` and build the typed result.
pub fn conform<T: DeserializeOwned>(
    endpoint: &str,
    payload: Value,
    guard: fn(&Value) -> bool,
) -> ApiResult<T> {
    if !guard(&payload) {
        tracing::warn!(endpoint, "response failed shape guard");
        return Err(ClassifiedError::schema(format!(
            "unexpected response shape from {}",
            endpoint
        )));
    }
    serde_json::from_value(payload).map_err(|e| {
        tracing::warn!(endpoint, error = %e, "response could not be decoded");
        ClassifiedError::schema(format!("malformed response from {}: {}", endpoint, e))
    })
}
