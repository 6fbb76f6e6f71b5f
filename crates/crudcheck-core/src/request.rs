//! Request factory
//!
//! Builds pre-configured outbound requests from a base URL and a fixed set of
//! default headers. Construction performs no I/O; the caller picks the verb and
//! path and sends.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{HarnessError, HarnessResult};

/// Declared content type of every request
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Produces request descriptors sharing a base URL and default headers
#[derive(Debug, Clone)]
pub struct RequestFactory {
    client: Client,
    base_url: String,
    default_headers: HeaderMap,
}

impl RequestFactory {
    /// Create a factory with its own HTTP client.
    ///
    /// The client has no request timeout: a hung call blocks its sequence.
    pub fn new<'h, I>(base_url: impl Into<String>, default_headers: I) -> HarnessResult<Self>
    where
        I: IntoIterator<Item = (&'h str, &'h str)>,
    {
        let client = Client::builder().build()?;
        Self::with_client(client, base_url, default_headers)
    }

    /// Create a factory around an existing client
    pub fn with_client<'h, I>(
        client: Client,
        base_url: impl Into<String>,
        default_headers: I,
    ) -> HarnessResult<Self>
    where
        I: IntoIterator<Item = (&'h str, &'h str)>,
    {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(HarnessError::Configuration(
                "Base URL must not be empty".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        for (name, value) in default_headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                HarnessError::Configuration(format!("Invalid header name '{}': {}", name, e))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                HarnessError::Configuration(format!("Invalid value for header '{}': {}", name, e))
            })?;
            headers.insert(name, value);
        }

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_headers: headers,
        })
    }

    /// Build a request descriptor carrying `payload` as its body.
    ///
    /// An empty payload means no body.
    pub fn build_request(&self, payload: &str) -> RequestSpec<'_> {
        let mut headers = self.default_headers.clone();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

        RequestSpec {
            client: &self.client,
            base_url: &self.base_url,
            headers,
            body: (!payload.is_empty()).then(|| payload.to_string()),
        }
    }
}

/// A request ready for a verb and a path
#[derive(Debug)]
pub struct RequestSpec<'a> {
    client: &'a Client,
    base_url: &'a str,
    headers: HeaderMap,
    body: Option<String>,
}

impl<'a> RequestSpec<'a> {
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Absolute URL for `path`
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Apply verb and path
    pub fn request(self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url_for(path);
        let builder = self.client.request(method, url).headers(self.headers);
        match self.body {
            Some(body) => builder.body(body),
            None => builder,
        }
    }

    /// Apply verb and path, send, and read the whole response
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn send(self, method: Method, path: &str) -> HarnessResult<ApiResponse> {
        let response = self.request(method, path).send().await?;
        let response = ApiResponse::read(response).await?;
        debug!(status = response.status.as_u16(), "Response received");
        Ok(response)
    }
}

/// A fully read HTTP response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

impl ApiResponse {
    /// Drain a `reqwest` response
    pub async fn read(response: reqwest::Response) -> HarnessResult<Self> {
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let body = response.text().await?;

        Ok(Self {
            status,
            content_type,
            body,
        })
    }

    /// Whether the declared content type is JSON
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or("").trim() == JSON_CONTENT_TYPE)
            .unwrap_or(false)
    }

    /// Parse the body as JSON
    pub fn json(&self) -> HarnessResult<Value> {
        serde_json::from_str(&self.body).map_err(|e| {
            HarnessError::MalformedResponse(format!(
                "Body is not valid JSON ({}): {}",
                e,
                truncate(&self.body, 200)
            ))
        })
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
