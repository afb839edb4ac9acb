//! Blocking JSON client with bounded retries.

use reqwest::Method;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("partdb-kicad/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid base URL '{0}'")]
    InvalidUrl(String),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{method} {url} failed with status {status}: {body}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("response is missing '{0}'")]
    MissingKey(&'static str),

    #[error(transparent)]
    Record(#[from] crate::records::RecordError),
}

/// Retry behaviour for transient failures.
///
/// Responses with a status in `status_forcelist` and connect/timeout errors
/// are retried up to `total` times. Before retry `n` (1-based) the client
/// sleeps `backoff_factor * 2^(n-1)`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub total: u32,
    pub backoff_factor: Duration,
    pub status_forcelist: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            total: 3,
            backoff_factor: Duration::from_secs(1),
            status_forcelist: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            total: 0,
            ..Self::default()
        }
    }

    pub fn is_retryable(&self, status: StatusCode) -> bool {
        self.status_forcelist.contains(&status.as_u16())
    }

    pub fn backoff(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(16);
        self.backoff_factor.saturating_mul(1u32 << exp)
    }
}

pub struct ApiClientBuilder {
    base_url: String,
    bearer: Option<String>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ApiClientBuilder {
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn build(self) -> Result<ApiClient, ApiError> {
        let base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidUrl(self.base_url));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.bearer {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(self.timeout)
            .build()?;

        Ok(ApiClient {
            base_url,
            client,
            retry: self.retry,
        })
    }
}

/// JSON API client sharing one connection pool across requests.
pub struct ApiClient {
    base_url: String,
    client: Client,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn builder(base_url: impl Into<String>) -> ApiClientBuilder {
        ApiClientBuilder {
            base_url: base_url.into(),
            bearer: None,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    pub fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        self.send(Method::GET, endpoint, query, None)
    }

    pub fn post(&self, endpoint: &str, body: &Value) -> Result<Value, ApiError> {
        self.send(Method::POST, endpoint, &[], Some(body))
    }

    pub fn put(&self, endpoint: &str, body: &Value) -> Result<Value, ApiError> {
        self.send(Method::PUT, endpoint, &[], Some(body))
    }

    pub fn patch(&self, endpoint: &str, body: &Value) -> Result<Value, ApiError> {
        self.send(Method::PATCH, endpoint, &[], Some(body))
    }

    pub fn delete(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.send(Method::DELETE, endpoint, &[], None)
    }

    fn send(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let url = self.build_url(endpoint);
        let mut retries = 0;

        loop {
            let mut request = self.client.request(method.clone(), &url);
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let reason = match request.send() {
                Ok(response) if self.retry.is_retryable(response.status()) => {
                    if retries >= self.retry.total {
                        return handle_response(&method, &url, response);
                    }
                    format!("status {}", response.status())
                }
                Ok(response) => return handle_response(&method, &url, response),
                Err(e) if (e.is_connect() || e.is_timeout()) && retries < self.retry.total => {
                    e.to_string()
                }
                Err(e) => return Err(e.into()),
            };

            retries += 1;
            let delay = self.retry.backoff(retries);
            log::warn!(
                "{method} {url}: {reason}, retry {retries}/{} in {delay:?}",
                self.retry.total
            );
            std::thread::sleep(delay);
        }
    }
}

fn handle_response(method: &Method, url: &str, response: Response) -> Result<Value, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(ApiError::Status {
            method: method.clone(),
            url: url.to_string(),
            status,
            body,
        });
    }
    if status == StatusCode::NO_CONTENT {
        return Ok(Value::Object(Default::default()));
    }

    let text = response.text()?;
    serde_json::from_str(&text).map_err(|source| ApiError::Decode {
        url: url.to_string(),
        source,
    })
}
