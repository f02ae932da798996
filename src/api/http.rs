//! Native transport on top of the blocking `reqwest` client.
//!
//! The native host drives one query at a time with `pollster`, so blocking
//! inside the returned future is fine there.

use std::time::Duration;

use super::transport::{HttpResponse, Transport, TransportError, join_url};

/// Blocking HTTP client bound to a base URL.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("areapop/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn finish(response: reqwest::blocking::Response) -> Result<HttpResponse, TransportError> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| TransportError::network(format!("Failed to read response: {}", e)))?;
        Ok(HttpResponse { status, body })
    }
}

impl Transport for ReqwestTransport {
    async fn post_json(&self, path: &str, body: &str) -> Result<HttpResponse, TransportError> {
        let url = join_url(&self.base_url, path);
        log::debug!("🌐 POST {}", url);
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .map_err(|e| TransportError::network(format!("POST {} failed: {}", url, e)))?;
        Self::finish(response)
    }

    async fn get(&self, path: &str) -> Result<HttpResponse, TransportError> {
        let url = join_url(&self.base_url, path);
        log::debug!("🌐 GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| TransportError::network(format!("GET {} failed: {}", url, e)))?;
        Self::finish(response)
    }
}
