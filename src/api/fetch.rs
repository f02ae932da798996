//! Browser transport using the `fetch` API.

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, Response};

use super::transport::{HttpResponse, Transport, TransportError, join_url};

/// `fetch`-based client bound to a base URL (empty for same-origin).
#[derive(Debug, Clone, Default)]
pub struct FetchTransport {
    base_url: String,
}

impl FetchTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    async fn send(
        &self,
        method: &str,
        path: &str,
        body: Option<&str>,
    ) -> Result<HttpResponse, TransportError> {
        let url = join_url(&self.base_url, path);
        log::debug!("🌐 {} {}", method, url);

        let init = RequestInit::new();
        init.set_method(method);
        if let Some(body) = body {
            let headers = Headers::new().map_err(js_request_error)?;
            headers
                .set("Content-Type", "application/json")
                .map_err(js_request_error)?;
            init.set_headers(&headers);
            init.set_body(&JsValue::from_str(body));
        }

        let request = Request::new_with_str_and_init(&url, &init).map_err(js_request_error)?;
        let window =
            web_sys::window().ok_or_else(|| TransportError::request("No window object available"))?;

        let value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_network_error)?;
        let response: Response = value.dyn_into().map_err(js_network_error)?;

        let status = response.status();
        let text = response.text().map_err(js_network_error)?;
        let body = JsFuture::from(text)
            .await
            .map_err(js_network_error)?
            .as_string()
            .unwrap_or_default();

        Ok(HttpResponse { status, body })
    }
}

fn js_request_error(e: JsValue) -> TransportError {
    TransportError::request(format!("{:?}", e))
}

fn js_network_error(e: JsValue) -> TransportError {
    TransportError::network(format!("{:?}", e))
}

impl Transport for FetchTransport {
    async fn post_json(&self, path: &str, body: &str) -> Result<HttpResponse, TransportError> {
        self.send("POST", path, Some(body)).await
    }

    async fn get(&self, path: &str) -> Result<HttpResponse, TransportError> {
        self.send("GET", path, None).await
    }
}
