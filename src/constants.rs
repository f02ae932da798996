//! Global constants for the areapop client

/// Tessellation segments sent with every circle query
pub const CIRCLE_SEGMENTS: u32 = 32;

/// Largest circle radius the backend accepts (50 km)
pub const MAX_CIRCLE_RADIUS_M: f64 = 50_000.0;

/// Minimum number of vertices for a polygon selection
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Mean Earth radius used for great-circle distances
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Default namespace prefix for boundary cache keys
pub const DEFAULT_CACHE_NAMESPACE: &str = "boundary_";

/// Default byte quota for the in-memory store (roughly a browser's 5 MB session quota)
pub const DEFAULT_MEMORY_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Backend endpoint defaults.
pub mod endpoint {
    /// Backend origin. The browser build talks to the page's own origin.
    #[cfg(target_arch = "wasm32")]
    pub const DEFAULT_BASE_URL: &str = "";
    /// Backend origin for the native client (local dev server)
    #[cfg(not(target_arch = "wasm32"))]
    pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

    /// Drawn-shape analysis
    pub const ANALYZE: &str = "/analyze";
    /// Region population and boundary lookup
    pub const REGION: &str = "/getRegionPop";
    /// Static administrative hierarchy document
    pub const HIERARCHY: &str = "/static/korea_admin_tree.json";
}
