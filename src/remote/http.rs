//! Blocking HTTP implementation of the REST collaborators.

use super::{AssetUploader, RemoteClient};
use crate::config::{HttpSettings, ReachmeConfig};
use crate::models::Asset;
use crate::{Error, Result};
use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder, multipart};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::{Duration, Instant};

/// Longest server error body quoted in an error message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// REST client for the `ReachMe` API.
pub struct HttpClient {
    /// Base URL without trailing slash.
    base_url: String,
    /// Bearer token of the signed-in creator.
    token: Option<SecretString>,
    /// HTTP client with connection pooling.
    client: Client,
}

impl HttpClient {
    /// Creates an anonymous client with default timeouts.
    #[must_use]
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self::with_client(base_url, build_http_client(HttpSettings::default()))
    }

    /// Creates an anonymous client around a preconfigured `reqwest` client.
    #[must_use]
    pub fn with_client(base_url: impl AsRef<str>, client: Client) -> Self {
        Self {
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            token: None,
            client,
        }
    }

    /// Creates a client from configuration, authenticated if a token is set.
    #[must_use]
    pub fn from_config(config: &ReachmeConfig) -> Self {
        let mut client = Self::with_client(&config.api_url, build_http_client(config.http));
        client.token.clone_from(&config.api_token);
        client
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    /// Drops the bearer token (public pages need none).
    #[must_use]
    pub fn without_token(mut self) -> Self {
        self.token = None;
        self
    }

    /// Whether requests carry a bearer token.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Returns the absolute URL for an API path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Sends a request and decodes the JSON body, if any.
    fn execute(
        &self,
        method: &'static str,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<Option<Value>> {
        let start = Instant::now();
        let request_error = |status: Option<u16>, cause: String| Error::Request {
            method,
            path: path.to_string(),
            status,
            cause,
        };

        let response = builder
            .send()
            .map_err(|e| request_error(e.status().map(|s| s.as_u16()), e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| request_error(Some(status.as_u16()), e.to_string()))?;

        metrics::histogram!("http_request_duration_ms", "method" => method)
            .record(start.elapsed().as_secs_f64() * 1000.0);
        tracing::debug!(method, path, status = status.as_u16(), "API response");

        if !status.is_success() {
            return Err(request_error(
                Some(status.as_u16()),
                error_message(status.as_u16(), &body),
            ));
        }

        parse_body(&body).map_err(|e| {
            request_error(Some(status.as_u16()), format!("invalid JSON response: {e}"))
        })
    }
}

impl RemoteClient for HttpClient {
    fn name(&self) -> &'static str {
        "http"
    }

    fn get(&self, path: &str) -> Result<Value> {
        let body = self.execute("GET", path, self.request(Method::GET, path))?;
        Ok(body.unwrap_or_default())
    }

    fn post(&self, path: &str, body: &Value) -> Result<Option<Value>> {
        self.execute("POST", path, self.request(Method::POST, path).json(body))
    }

    fn put(&self, path: &str, body: &Value) -> Result<Option<Value>> {
        self.execute("PUT", path, self.request(Method::PUT, path).json(body))
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.execute("DELETE", path, self.request(Method::DELETE, path))?;
        Ok(())
    }
}

impl AssetUploader for HttpClient {
    fn upload(&self, asset: &Asset) -> Result<String> {
        const UPLOAD_PATH: &str = "/upload";

        let part = multipart::Part::bytes(asset.bytes.clone())
            .file_name(asset.file_name.clone())
            .mime_str(&asset.content_type)
            .map_err(|e| Error::Validation(format!("invalid content type: {e}")))?;
        let form = multipart::Form::new().part("image", part);

        let body = self.execute(
            "POST",
            UPLOAD_PATH,
            self.request(Method::POST, UPLOAD_PATH).multipart(form),
        )?;
        body.as_ref()
            .and_then(|value| value.get("url"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::Request {
                method: "POST",
                path: UPLOAD_PATH.to_string(),
                status: None,
                cause: "upload response has no url".to_string(),
            })
    }
}

/// Builds a blocking HTTP client with configured timeouts.
#[must_use]
pub fn build_http_client(settings: HttpSettings) -> Client {
    let mut builder = Client::builder()
        .user_agent(format!("Reachme/{}", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(4);
    if settings.timeout_ms > 0 {
        builder = builder.timeout(Duration::from_millis(settings.timeout_ms));
    }
    if settings.connect_timeout_ms > 0 {
        builder = builder.connect_timeout(Duration::from_millis(settings.connect_timeout_ms));
    }

    builder.build().unwrap_or_else(|err| {
        tracing::warn!("Failed to build HTTP client: {err}");
        Client::new()
    })
}

/// Extracts the server's message from an error response.
///
/// The API answers errors with `{"error": "..."}`; anything else is quoted.
fn error_message(status: u16, body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let message = parsed.as_ref().and_then(|value| {
        value
            .get("error")
            .or_else(|| value.get("message"))
            .and_then(Value::as_str)
    });
    match message {
        Some(message) => format!("HTTP {status}: {message}"),
        None if body.trim().is_empty() => format!("HTTP {status}"),
        None => {
            let quoted: String = body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect();
            format!("HTTP {status}: {quoted}")
        },
    }
}

fn parse_body(body: &str) -> serde_json::Result<Option<Value>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(body).map(Some)
}
