//! Shared HTTP plumbing for the commits API and webhook delivery

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Proxy, StatusCode};
use std::fmt;
use std::time::Duration;

/// Why an HTTP exchange produced no usable result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpFailure {
    /// Connection, DNS, TLS or timeout error
    Transport(String),
    /// Server answered with something other than 200
    Status(u16),
    /// Response body did not match the expected shape
    Decode(String),
}

impl HttpFailure {
    pub fn from_status(status: StatusCode) -> Self {
        HttpFailure::Status(status.as_u16())
    }

    pub fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            HttpFailure::Transport(format!("request timed out: {}", error))
        } else {
            HttpFailure::Transport(error.to_string())
        }
    }
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpFailure::Transport(reason) => write!(f, "transport error: {}", reason),
            HttpFailure::Status(code) => write!(f, "unexpected HTTP status {}", code),
            HttpFailure::Decode(reason) => write!(f, "invalid response body: {}", reason),
        }
    }
}

/// Client for the read-only commits API
pub fn api_client(user_agent: &str, timeout: Duration) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(user_agent)
            .with_context(|| format!("Invalid user agent: {}", user_agent))?,
    );

    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .context("Failed to create API HTTP client")
}

/// Client for webhook delivery, optionally routed through a proxy
pub fn webhook_client(proxy: Option<&str>, timeout: Duration) -> Result<Client> {
    let mut builder = Client::builder().timeout(timeout);

    if let Some(proxy_url) = proxy {
        let proxy = Proxy::all(proxy_url)
            .with_context(|| format!("Invalid proxy url: {}", proxy_url))?;
        builder = builder.proxy(proxy);
    }

    builder.build().context("Failed to create webhook HTTP client")
}
