//! Remote service boundary.
//!
//! Every call to the fitness-tracking service goes through [`Transport`].
//! Responses are classified up front into success, rate-limited or
//! permanent failure so callers decide what to retry by inspecting the
//! value rather than by catching errors.

use crate::config::ApiConfig;
use crate::{Error, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

/// HTTP method used by the service
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

/// A request against the service, relative to its base URL
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Put,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

/// Classified response
#[derive(Clone, Debug, PartialEq)]
pub enum ApiResponse {
    /// 2xx with its JSON body (`Null` when empty)
    Success(Value),
    /// 429 Too Many Requests
    RateLimited { retry_after: Option<Duration> },
    /// Any other non-success status
    Failure { status: u16, body: String },
}

impl ApiResponse {
    /// Unwrap a response that is not retried (reads)
    pub fn into_result(self) -> Result<Value> {
        match self {
            ApiResponse::Success(value) => Ok(value),
            ApiResponse::RateLimited { .. } => Err(Error::Remote {
                status: StatusCode::TOO_MANY_REQUESTS.as_u16(),
                body: "rate limited".into(),
            }),
            ApiResponse::Failure { status, body } => Err(Error::Remote { status, body }),
        }
    }
}

/// Sends requests to the service
///
/// `Err` is reserved for transport failures (connection, timeout); HTTP
/// status outcomes come back as [`ApiResponse`].
pub trait Transport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        (**self).send(request)
    }
}

/// Blocking HTTP transport with a static `api-key` header
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport from configuration
    ///
    /// Fails with a configuration error when no credential is set.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let api_key = config.require_api_key()?;

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| Error::Config(format!("api_key is not a valid header value: {}", e)))?;
        headers.insert("api-key", key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.url(&request.path);
        let builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
        };
        let builder = builder.query(&request.query);
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let response = builder.send()?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = parse_retry_after(response.headers().get(RETRY_AFTER));
            tracing::warn!("{:?} {} rate limited", request.method, url);
            return Ok(ApiResponse::RateLimited { retry_after });
        }

        let text = response.text()?;
        if !status.is_success() {
            tracing::warn!("{:?} {} {} {}", request.method, status.as_u16(), url, text);
            return Ok(ApiResponse::Failure {
                status: status.as_u16(),
                body: text,
            });
        }

        tracing::debug!("{:?} {} {}", request.method, status.as_u16(), url);
        let value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };
        Ok(ApiResponse::Success(value))
    }
}

/// Retry-After in delta-seconds form; HTTP dates are ignored
fn parse_retry_after(value: Option<&HeaderValue>) -> Option<Duration> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
}
