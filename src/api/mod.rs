//! Backend API: wire bodies and the HTTP transport seam.

#[cfg(target_arch = "wasm32")]
mod fetch;
#[cfg(not(target_arch = "wasm32"))]
mod http;
mod transport;
mod wire;

#[cfg(target_arch = "wasm32")]
pub use fetch::FetchTransport;
#[cfg(not(target_arch = "wasm32"))]
pub use http::ReqwestTransport;
#[cfg(test)]
pub(crate) use transport::scripted;
pub use transport::{HttpResponse, Transport, TransportError, join_url};
pub use wire::{
    AnalysisResponse, BoundaryDecodeError, BoundaryWire, CircleData, ErrorBody, PolygonData,
    RegionRequest, ShapeRequest,
};
