use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use std::time::Duration;

pub const USER_AGENT: &str = concat!("nephranet/", env!("CARGO_PKG_VERSION"));
pub const TIMEOUT: Duration = Duration::from_secs(10);

pub fn client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        HeaderValue::from_static(USER_AGENT),
    );

    Client::builder()
        .default_headers(headers)
        .timeout(TIMEOUT)
        .build()
        .context("failed to build HTTP client")
}

/// Passes successful responses through; otherwise fails with the status and
/// whatever message the service put in the body.
pub fn ensure_success(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(status_error(action, status, &body))
}

fn status_error(action: &str, status: StatusCode, body: &str) -> anyhow::Error {
    match error_message(body) {
        Some(message) => anyhow!("{action} failed ({status}): {message}"),
        None => anyhow!("{action} failed ({status})"),
    }
}

/// PostgREST uses `message`, the auth service uses `msg` or `error_description`.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_messages_from_known_error_shapes() {
        assert_eq!(
            error_message(r#"{"code":"42501","message":"permission denied for table"}"#).as_deref(),
            Some("permission denied for table")
        );
        assert_eq!(
            error_message(r#"{"code":400,"msg":"User already registered"}"#).as_deref(),
            Some("User already registered")
        );
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
                .as_deref(),
            Some("Invalid login credentials")
        );
    }

    #[test]
    fn status_errors_name_action_status_and_message() {
        let err = status_error(
            "sign in",
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );
        assert_eq!(
            err.to_string(),
            "sign in failed (400 Bad Request): Invalid login credentials"
        );

        let err = status_error("list readings", StatusCode::BAD_GATEWAY, "<html>502</html>");
        assert_eq!(err.to_string(), "list readings failed (502 Bad Gateway)");
    }

    #[test]
    fn non_json_bodies_have_no_message() {
        assert_eq!(error_message("<html>502</html>"), None);
        assert_eq!(error_message(r#"{"status":500}"#), None);
    }
}
