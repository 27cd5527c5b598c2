//! Pipedream Client
//!
//! Binds the HTTP transport to an API base URL and builds resource URLs.

use super::http::{ApiHttpClient, ApiResponse};
use crate::error::{ProviderError, Result};
use serde_json::Value;
use url::Url;

/// Default Pipedream REST API base URL
pub const DEFAULT_API_URL: &str = "https://api.pipedream.com/v1";

/// Main Pipedream client
#[derive(Clone)]
pub struct PipedreamClient {
    pub http: ApiHttpClient,
    base_url: Url,
}

impl PipedreamClient {
    /// Create a new client for the given API base URL
    pub fn new(base_url: &str) -> Result<Self> {
        let http = ApiHttpClient::new()?;
        Self::with_http(http, base_url)
    }

    /// Create a client around an existing HTTP transport
    pub fn with_http(http: ApiHttpClient, base_url: &str) -> Result<Self> {
        Ok(Self {
            http,
            base_url: parse_base_url(base_url)?,
        })
    }

    /// The configured base URL
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Build a collection URL, e.g. `<base>/workflows`
    pub fn collection_url(&self, endpoint: &str) -> String {
        self.url_with_segments(&[endpoint])
    }

    /// Build an item URL, e.g. `<base>/workflows/<id>`
    ///
    /// The identifier is percent-encoded as a single path segment. `.` and
    /// `..` are rejected: URL path normalization would drop them and address
    /// the collection instead of the item.
    pub fn item_url(&self, endpoint: &str, id: &str) -> Result<String> {
        if matches!(id, "" | "." | "..") {
            return Err(ProviderError::InvalidIdentifier(id.to_string()));
        }
        Ok(self.url_with_segments(&[endpoint, id]))
    }

    fn url_with_segments(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        // parse_base_url rejects cannot-be-a-base URLs, so this always succeeds
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.into()
    }

    pub async fn get(&self, url: &str) -> Result<ApiResponse> {
        self.http.get(url).await
    }

    pub async fn post(&self, url: &str, body: &Value) -> Result<ApiResponse> {
        self.http.post(url, body).await
    }

    pub async fn put(&self, url: &str, body: &Value) -> Result<ApiResponse> {
        self.http.put(url, body).await
    }

    pub async fn delete(&self, url: &str) -> Result<ApiResponse> {
        self.http.delete(url).await
    }
}

/// Validate an API base URL
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let invalid = |reason: &str| ProviderError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot carry path segments"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("URL must not have a query or fragment"));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> PipedreamClient {
        PipedreamClient::new(base).unwrap()
    }

    #[test]
    fn test_collection_url() {
        let c = client(DEFAULT_API_URL);
        assert_eq!(
            c.collection_url("workflows"),
            "https://api.pipedream.com/v1/workflows"
        );
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        let c = client("https://api.pipedream.com/v1/");
        assert_eq!(
            c.item_url("workflows", "abc123").unwrap(),
            "https://api.pipedream.com/v1/workflows/abc123"
        );
    }

    #[test]
    fn test_root_base_url() {
        let c = client("http://127.0.0.1:8080");
        assert_eq!(c.collection_url("workflows"), "http://127.0.0.1:8080/workflows");
    }

    #[test]
    fn test_item_url_encodes_identifier() {
        let c = client(DEFAULT_API_URL);
        assert_eq!(
            c.item_url("workflows", "a/b c").unwrap(),
            "https://api.pipedream.com/v1/workflows/a%2Fb%20c"
        );
    }

    #[test]
    fn test_item_url_rejects_dot_segments() {
        let c = client(DEFAULT_API_URL);
        for id in [".", "..", ""] {
            let err = c.item_url("workflows", id).unwrap_err();
            assert!(matches!(err, ProviderError::InvalidIdentifier(ref got) if got == id));
        }
        assert_eq!(
            c.item_url("workflows", "...").unwrap(),
            "https://api.pipedream.com/v1/workflows/..."
        );
    }

    #[test]
    fn test_rejects_bad_base_urls() {
        assert!(parse_base_url("not a url").is_err());
        assert!(parse_base_url("ftp://example.com").is_err());
        assert!(parse_base_url("mailto:someone@example.com").is_err());
        assert!(parse_base_url("https://example.com/v1?x=1").is_err());
    }
}
