//! REST transport for the portal backend
//!
//! Builds every request the same way: `{backend_url}{path}`, a JSON content
//! type, and the stored bearer token when one exists. Non-2xx responses are
//! turned into `ApiError::Status` using the body's `error` field when present.

use std::fmt;
use std::str::FromStr;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::ApiError;
use crate::auth::TokenStore;
use crate::config::ClientConfig;

/// Error body the backend sends with failed requests
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// HTTP methods that change server-side state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationMethod {
    Post,
    Put,
    Patch,
    Delete,
}

impl MutationMethod {
    pub fn as_method(self) -> Method {
        match self {
            MutationMethod::Post => Method::POST,
            MutationMethod::Put => Method::PUT,
            MutationMethod::Patch => Method::PATCH,
            MutationMethod::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for MutationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_method().as_str())
    }
}

impl FromStr for MutationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "POST" => Ok(MutationMethod::Post),
            "PUT" => Ok(MutationMethod::Put),
            "PATCH" => Ok(MutationMethod::Patch),
            "DELETE" => Ok(MutationMethod::Delete),
            other => Err(format!("unsupported mutation method: {}", other)),
        }
    }
}

/// Uncached client for the backend REST API
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Backend base URL without a trailing slash
    base_url: String,
    /// Where the bearer token lives; `None` sends no Authorization header
    tokens: Option<TokenStore>,
}

impl ApiClient {
    /// Creates a new ApiClient with a default HTTP client
    pub fn new(config: &ClientConfig, tokens: Option<TokenStore>) -> Self {
        Self::with_client(Client::new(), config, tokens)
    }

    /// Creates a new ApiClient with a custom HTTP client
    pub fn with_client(http_client: Client, config: &ClientConfig, tokens: Option<TokenStore>) -> Self {
        Self {
            http_client,
            base_url: config.backend_url.clone(),
            tokens,
        }
    }

    /// Full URL for a backend path
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Issues a GET for `path`
    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, path, None).await
    }

    /// Sends a single request and returns the parsed JSON body
    ///
    /// # Returns
    /// * `Ok(Value)` - the response body, or `Value::Null` for an empty body
    /// * `Err(ApiError::Status)` - for non-2xx responses
    /// * `Err(ApiError)` - for transport, token, or decode failures
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let url = self.url_for(path);
        debug!(%method, %url, "sending request");

        let mut request = self
            .http_client
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = self.bearer_token()? {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_builder() {
                ApiError::InvalidUrl(url.clone())
            } else {
                ApiError::from(e)
            }
        })?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let err = error_from_body(status, &bytes);
            warn!(%method, %url, status = status.as_u16(), error = %err, "request failed");
            return Err(err);
        }

        parse_body(&bytes)
    }

    fn bearer_token(&self) -> Result<Option<String>, ApiError> {
        match &self.tokens {
            Some(store) => store.load().map_err(|e| ApiError::Token(e.to_string())),
            None => Ok(None),
        }
    }
}

/// Builds the error for a non-2xx response
///
/// Uses the body's `error` field when the body is JSON and has one, and
/// `HTTP <status>` otherwise.
fn error_from_body(status: StatusCode, body: &[u8]) -> ApiError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    ApiError::Status {
        status: status.as_u16(),
        message,
    }
}

/// Parses a success body; empty bodies (e.g. 204) become `null`
fn parse_body(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(body)?)
}
