//! # overql HTTP transport
//!
//! Blocking HTTP implementation of [`overql_core::Transport`].
//!
//! ## ⚠️ Internal Implementation Detail
//!
//! **This crate is an internal implementation detail of overql.**
//!
//! Users should depend on the main [`overql`](https://crates.io/crates/overql) crate,
//! which re-exports everything needed from here.
//!
//! One program per call, no retries. Non-2xx replies are reported as
//! [`TransportError::Status`] with the body attached.

#![warn(missing_docs)]
#![warn(clippy::all)]

use overql_core::{Error, RawResponse, Result, Transport, TransportError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Public Overpass interpreter endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://overpass-api.de/api/interpreter";

/// How the program is sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    /// Program in the `data` query parameter
    Get,
    /// Program as the raw request body
    #[default]
    Post,
}

/// HTTP transport configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Interpreter URL
    pub endpoint: String,
    /// Request method
    pub method: HttpMethod,
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
    /// Value of the User-Agent header
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            method: HttpMethod::Post,
            timeout_secs: 180, // matches the server-side default
            user_agent: concat!("overql/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    /// Use another interpreter URL
    pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the request method
    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the request timeout in seconds
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the User-Agent header
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Sends programs to an Overpass endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    config: HttpConfig,
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Build a transport and its HTTP client.
    pub fn new(config: HttpConfig) -> Result<Self> {
        if config.endpoint.is_empty() {
            return Err(Error::InvalidArgument(
                "HTTP endpoint cannot be empty".to_string(),
            ));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| Error::InvalidArgument(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Transport for the public endpoint with default options.
    pub fn with_defaults() -> Result<Self> {
        Self::new(HttpConfig::default())
    }

    /// Configuration in use
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }
}

impl Transport for HttpTransport {
    fn submit(&self, program: &str) -> std::result::Result<RawResponse, TransportError> {
        debug!(
            endpoint = %self.config.endpoint,
            method = ?self.config.method,
            bytes = program.len(),
            "submitting program"
        );

        let request = match self.config.method {
            HttpMethod::Get => self
                .client
                .get(&self.config.endpoint)
                .query(&[("data", program)]),
            HttpMethod::Post => self
                .client
                .post(&self.config.endpoint)
                .body(program.to_string()),
        };

        let response = request.send().map_err(|e| {
            warn!(error = %e, endpoint = %self.config.endpoint, "request failed");
            TransportError::Connection(e.to_string())
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .map_err(|e| TransportError::Body(e.to_string()))?;

        if !(200..300).contains(&status) {
            warn!(status, bytes = body.len(), "endpoint rejected program");
            return Err(TransportError::Status { code: status, body });
        }

        info!(status, bytes = body.len(), "response received");
        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.endpoint, "http://overpass-api.de/api/interpreter");
        assert_eq!(config.method, HttpMethod::Post);
        assert_eq!(config.timeout_secs, 180);
        assert!(config.user_agent.starts_with("overql/"));
    }

    #[test]
    fn test_config_builders() {
        let config = HttpConfig::default()
            .with_endpoint("http://localhost:12345/api/interpreter")
            .with_method(HttpMethod::Get)
            .with_timeout_secs(5)
            .with_user_agent("tests");
        assert_eq!(config.endpoint, "http://localhost:12345/api/interpreter");
        assert_eq!(config.method, HttpMethod::Get);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.user_agent, "tests");
    }

    #[test]
    fn test_config_from_json() {
        let config: HttpConfig =
            serde_json::from_str(r#"{"method":"get","timeout_secs":30}"#).unwrap();
        assert_eq!(config.method, HttpMethod::Get);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        let config = HttpConfig::default().with_endpoint("");
        assert!(matches!(
            HttpTransport::new(config),
            Err(Error::InvalidArgument(_))
        ));
    }
}
