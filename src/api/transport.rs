//! HTTP transport seam.
//!
//! The core only needs "POST a JSON body" and "GET a path". Hosts plug in a
//! concrete client: blocking `reqwest` on native, `fetch` in the browser.

use std::future::Future;

/// Raw HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to build request: {0}")]
    Request(String),
}

impl TransportError {
    pub fn network(msg: impl std::fmt::Display) -> Self {
        Self::Network(msg.to_string())
    }

    pub fn request(msg: impl std::fmt::Display) -> Self {
        Self::Request(msg.to_string())
    }
}

/// Asynchronous HTTP client. Futures are not required to be `Send`; the
/// core runs on a single event loop.
pub trait Transport {
    /// POST `body` (JSON text) to `path`.
    fn post_json(
        &self,
        path: &str,
        body: &str,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>>;

    /// GET `path`.
    fn get(&self, path: &str) -> impl Future<Output = Result<HttpResponse, TransportError>>;
}

/// Join a base URL and an endpoint path.
pub fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
