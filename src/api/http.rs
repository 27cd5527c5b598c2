//! HTTP utilities for Pipedream REST API calls

use crate::error::{ProviderError, Result};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
pub(crate) fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut cut = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Raw response: status plus the full body text
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub url: String,
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    /// Parse the body as JSON
    pub fn json(&self) -> Result<Value> {
        serde_json::from_str(&self.body).map_err(|e| {
            tracing::error!(
                "Invalid JSON from {} ({}): {}",
                self.url,
                self.status,
                sanitize_for_log(&self.body)
            );
            ProviderError::malformed(&self.url, format!("body is not valid JSON ({})", e))
        })
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }
}

/// HTTP client wrapper for Pipedream API calls
///
/// Status codes are returned to the caller, never turned into errors here:
/// each lifecycle operation decides which statuses matter.
#[derive(Clone)]
pub struct ApiHttpClient {
    client: Client,
}

impl ApiHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("pipedream-provider/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    async fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<ApiResponse> {
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method.clone(), url);

        if let Some(body) = body {
            let encoded = serde_json::to_vec(body).map_err(ProviderError::Serialization)?;
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(encoded);
        }

        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!("{} {} -> {}", method, url, status);
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            tracing::warn!("API returned {}: {}", status, sanitize_for_log(&body));
        }

        Ok(ApiResponse {
            url: url.to_string(),
            status,
            body,
        })
    }

    /// Make a GET request
    pub async fn get(&self, url: &str) -> Result<ApiResponse> {
        self.send(Method::GET, url, None).await
    }

    /// Make a POST request with a JSON body
    pub async fn post(&self, url: &str, body: &Value) -> Result<ApiResponse> {
        self.send(Method::POST, url, Some(body)).await
    }

    /// Make a PUT request with a JSON body
    pub async fn put(&self, url: &str, body: &Value) -> Result<ApiResponse> {
        self.send(Method::PUT, url, Some(body)).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &str) -> Result<ApiResponse> {
        self.send(Method::DELETE, url, None).await
    }
}

/// Format a provider error for display
/// Security: avoids echoing raw response bodies to the terminal
pub fn format_api_error(error: &ProviderError) -> String {
    match error {
        ProviderError::Transport(e) if e.is_connect() => {
            "Could not connect to the Pipedream API. Check the API URL and your network.".to_string()
        }
        ProviderError::Transport(e) if e.is_timeout() => {
            "Request to the Pipedream API timed out.".to_string()
        }
        ProviderError::Transport(_) => {
            "Request failed. Check your network connection and try again.".to_string()
        }
        ProviderError::MalformedResponse { reason, .. } => {
            let sanitized: String = reason
                .chars()
                .filter(|c| c.is_ascii_graphic() || *c == ' ')
                .take(80)
                .collect();
            format!("Unexpected response from the Pipedream API: {}", sanitized)
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "a".repeat(500);
        let out = sanitize_for_log(&body);
        assert!(out.starts_with(&"a".repeat(MAX_LOG_BODY_LENGTH)));
        assert!(out.contains("500 bytes total"));
    }

    #[test]
    fn test_sanitize_strips_control_chars() {
        assert_eq!(sanitize_for_log("line1\nline2\t!"), "line1line2!");
    }

    #[test]
    fn test_sanitize_respects_char_boundaries() {
        let body = format!("{}é{}", "a".repeat(MAX_LOG_BODY_LENGTH - 1), "b".repeat(10));
        let out = sanitize_for_log(&body);
        assert!(out.contains("truncated"));
    }

    #[test]
    fn test_json_error_is_malformed_response() {
        let response = ApiResponse {
            url: "http://localhost/workflows/x".to_string(),
            status: StatusCode::OK,
            body: "<html>".to_string(),
        };
        let err = response.json().unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse { .. }));
    }

    #[test]
    fn test_format_malformed_error() {
        let err = ProviderError::malformed("http://x", "missing or malformed id");
        assert_eq!(
            format_api_error(&err),
            "Unexpected response from the Pipedream API: missing or malformed id"
        );
    }

    #[test]
    fn test_format_local_error_passthrough() {
        let err = ProviderError::MissingAttribute("name".to_string());
        assert_eq!(format_api_error(&err), "missing required attribute: name");
    }
}
