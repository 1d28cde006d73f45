//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building HTTP clients with the configured headers and timeout
//! - GET requests that decode the body as JSON
//! - Error classification (transport failure vs. undecodable body)
//!
//! Retrying is not done here; callers wrap requests in a [`Backoff`](super::Backoff).

use crate::config::ApiConfig;
use crate::HarvestError;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Anything that can answer a GET with a JSON document
///
/// Shared by every worker thread of a run.
pub trait JsonSource: Send + Sync {
    fn get_json(&self, url: &Url) -> Result<Value, HarvestError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The API configuration (headers and request timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(HarvestError)` - A header could not be encoded or the client failed to build
pub fn build_http_client(config: &ApiConfig) -> Result<Client, HarvestError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| HarvestError::InvalidHeader(name.clone()))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| HarvestError::InvalidHeader(format!("{}: {}", name, value)))?;
        headers.insert(header_name, header_value);
    }

    let timeout = config.timeout();
    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(HarvestError::from)
}

/// Blocking HTTP implementation of [`JsonSource`]
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(config: &ApiConfig) -> Result<Self, HarvestError> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }
}

impl JsonSource for HttpSource {
    fn get_json(&self, url: &Url) -> Result<Value, HarvestError> {
        let http_error = |source| HarvestError::Http {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(http_error)?;
        let body = response.text().map_err(http_error)?;

        serde_json::from_str(&body).map_err(|source| HarvestError::Json {
            url: url.to_string(),
            source,
        })
    }
}
