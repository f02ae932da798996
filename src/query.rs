//! Query orchestration: validation, requests, boundary caching and
//! supersession.
//!
//! A query runs in two steps so UI events can interleave:
//!
//! 1. [`QueryOrchestrator::begin`] validates the selection and issues a new
//!    token, superseding every earlier one.
//! 2. [`QueryOrchestrator::execute`] performs the request and reports whether
//!    the token was still current when the response arrived.
//!
//! The orchestrator is `!Send` and uses `Cell`/`RefCell`; no borrow is held
//! across an `.await`.

use std::cell::{Cell, RefCell};

use serde::Serialize;
use web_time::Instant;

use crate::api::{
    AnalysisResponse, ErrorBody, HttpResponse, RegionRequest, ShapeRequest, Transport,
    TransportError,
};
use crate::cache::{BoundaryCache, CacheStats, EvictionPolicy, KeyValueStore, OldestHalf};
use crate::constants::endpoint;
use crate::model::{AgeDistribution, BoundaryGeometry, RegionPath, Selection, SelectionError};

/// Backend endpoint paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub analyze: String,
    pub region: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            analyze: endpoint::ANALYZE.to_string(),
            region: endpoint::REGION.to_string(),
        }
    }
}

/// Statistics for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub selection: Selection,
    pub total_population: u64,
    pub total_households: u64,
    pub age_distribution: AgeDistribution,
    pub analysis_area_sqm: Option<f64>,
    /// Region boundary (region queries only)
    pub boundary: Option<BoundaryGeometry>,
    /// Whether `boundary` came from the cache
    pub boundary_from_cache: bool,
}

/// Query failures.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Rejected locally, no request was made
    #[error(transparent)]
    InvalidInput(#[from] SelectionError),

    /// The request never produced a response
    #[error("Request failed: {0}")]
    Transport(#[from] TransportError),

    /// The backend reported a failure
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// The response body could not be decoded
    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl QueryError {
    /// Build a backend error from a non-2xx response.
    fn from_status(response: &HttpResponse) -> Self {
        let message = serde_json::from_str::<ErrorBody>(&response.body)
            .ok()
            .and_then(|body| body.detail_text())
            .unwrap_or_else(|| format!("HTTP error! status: {}", response.status));
        Self::Backend {
            status: response.status,
            message,
        }
    }
}

/// A query that has been issued but not yet executed.
#[derive(Debug, Clone)]
pub struct PendingQuery {
    token: u64,
    selection: Selection,
    issued_at: Instant,
}

impl PendingQuery {
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }
}

/// Result of [`QueryOrchestrator::execute`].
#[derive(Debug)]
pub enum QueryOutcome {
    /// The token was still current when the response arrived
    Completed {
        token: u64,
        result: Result<QueryResult, QueryError>,
    },
    /// A newer query was issued meanwhile; the response was discarded
    Superseded { token: u64 },
}

impl QueryOutcome {
    pub fn token(&self) -> u64 {
        match self {
            QueryOutcome::Completed { token, .. } | QueryOutcome::Superseded { token } => *token,
        }
    }
}

/// Runs queries against the backend and owns the boundary cache.
pub struct QueryOrchestrator<T, S, E = OldestHalf> {
    transport: T,
    endpoints: Endpoints,
    cache: RefCell<BoundaryCache<S, E>>,
    latest: Cell<u64>,
}

impl<T: Transport, S: KeyValueStore, E: EvictionPolicy> QueryOrchestrator<T, S, E> {
    pub fn new(transport: T, cache: BoundaryCache<S, E>) -> Self {
        Self {
            transport,
            endpoints: Endpoints::default(),
            cache: RefCell::new(cache),
            latest: Cell::new(0),
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Token of the most recently issued query.
    pub fn latest_token(&self) -> u64 {
        self.latest.get()
    }

    pub fn is_current(&self, token: u64) -> bool {
        self.latest.get() == token
    }

    /// Invalidate every in-flight query.
    pub fn supersede(&self) {
        self.latest.set(self.latest.get() + 1);
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.borrow().stats()
    }

    /// Remove every cached boundary. Returns the number removed.
    pub fn clear_cache(&self) -> usize {
        self.cache.borrow_mut().clear_all()
    }

    /// Validate `selection` and issue a new token.
    ///
    /// Invalid input issues no token and leaves in-flight queries current.
    pub fn begin(&self, selection: Selection) -> Result<PendingQuery, QueryError> {
        selection.validate()?;
        self.supersede();
        let token = self.latest.get();
        log::debug!("📡 Query #{} issued ({})", token, selection.kind_name());
        Ok(PendingQuery {
            token,
            selection,
            issued_at: Instant::now(),
        })
    }

    /// Perform the request for `pending`.
    pub async fn execute(&self, pending: PendingQuery) -> QueryOutcome {
        let PendingQuery {
            token,
            selection,
            issued_at,
        } = pending;

        let result = self.run(selection).await;
        let elapsed = issued_at.elapsed();

        if !self.is_current(token) {
            log::debug!("⏭️ Query #{} superseded after {:?}, discarding", token, elapsed);
            return QueryOutcome::Superseded { token };
        }

        match &result {
            Ok(r) => log::info!(
                "✅ Query #{} done in {:?}: {} people",
                token,
                elapsed,
                r.total_population
            ),
            Err(e) => log::error!("❌ Query #{} failed: {}", token, e),
        }
        QueryOutcome::Completed { token, result }
    }

    async fn run(&self, selection: Selection) -> Result<QueryResult, QueryError> {
        let body = match &selection {
            Selection::Circle {
                center,
                radius_m,
                segments,
            } => ShapeRequest::circle(*center, *radius_m, *segments),
            Selection::Polygon { vertices } => ShapeRequest::polygon(vertices),
            Selection::Region { path } => {
                let path = path.clone();
                return self.run_region(selection, &path).await;
            }
        };

        let response = self
            .post(&self.endpoints.analyze, &serde_json::to_string(&body)?)
            .await?;
        Ok(QueryResult {
            total_population: response.total_population,
            total_households: response.total_households,
            age_distribution: response.age_distribution,
            analysis_area_sqm: response.analysis_area_sqm,
            boundary: None,
            boundary_from_cache: false,
            selection,
        })
    }

    async fn run_region(
        &self,
        selection: Selection,
        path: &RegionPath,
    ) -> Result<QueryResult, QueryError> {
        let key = self.cache.borrow().key_for(path);
        let cached = self.cache.borrow_mut().get(&key);
        if cached.is_some() {
            log::debug!("💾 Using cached boundary for {}", path.label());
        }

        let body = serde_json::to_string(&RegionRequest::from(path))?;
        let response = self.post(&self.endpoints.region, &body).await?;

        let fresh = response.boundary.and_then(|wire| {
            BoundaryGeometry::try_from(wire)
                .map_err(|e| log::warn!("⚠️ Ignoring boundary for {}: {}", path.label(), e))
                .ok()
        });

        let (boundary, boundary_from_cache) = match (cached, fresh) {
            (Some(cached), _) => (Some(cached), true),
            (None, Some(fresh)) => {
                self.cache.borrow_mut().put(&key, &fresh);
                (Some(fresh), false)
            }
            (None, None) => (None, false),
        };

        Ok(QueryResult {
            total_population: response.total_population,
            total_households: response.total_households,
            age_distribution: response.age_distribution,
            analysis_area_sqm: response.analysis_area_sqm,
            boundary,
            boundary_from_cache,
            selection,
        })
    }

    async fn post(&self, path: &str, body: &str) -> Result<AnalysisResponse, QueryError> {
        let response = self.transport.post_json(path, body).await?;
        if !response.is_success() {
            return Err(QueryError::from_status(&response));
        }
        let decoded: AnalysisResponse = serde_json::from_str(&response.body)?;
        if let Some(message) = decoded.reported_error() {
            return Err(QueryError::Backend {
                status: response.status,
                message: message.to_string(),
            });
        }
        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::scripted::ScriptedTransport;
    use crate::cache::MemoryStore;
    use crate::geo::LatLng;
    use serde_json::json;

    type TestOrchestrator = QueryOrchestrator<ScriptedTransport, MemoryStore>;

    fn orchestrator() -> TestOrchestrator {
        QueryOrchestrator::new(ScriptedTransport::new(), BoundaryCache::new(MemoryStore::new()))
    }

    fn circle() -> Selection {
        Selection::Circle {
            center: LatLng::new(37.5, 127.0),
            radius_m: 1000.0,
            segments: 32,
        }
    }

    fn stats_body() -> serde_json::Value {
        json!({
            "total_population": 1200,
            "total_households": 500,
            "age_distribution": {"20대": 700, "10대": 500},
            "analysis_area_sqm": 3141592.0
        })
    }

    fn region_body(lng: f64) -> serde_json::Value {
        json!({
            "total_population": 9_000_000,
            "total_households": 4_000_000,
            "age_distribution": {"30대": 9_000_000},
            "boundary": {
                "type": "Polygon",
                "coordinates": [[[lng, 37.4], [lng + 0.2, 37.4], [lng + 0.2, 37.6]]],
                "centroid": {"lat": 37.5, "lng": lng + 0.1}
            }
        })
    }

    fn query(orch: &TestOrchestrator, selection: Selection) -> QueryOutcome {
        let pending = orch.begin(selection).expect("valid selection");
        pollster::block_on(orch.execute(pending))
    }

    fn completed(outcome: QueryOutcome) -> Result<QueryResult, QueryError> {
        match outcome {
            QueryOutcome::Completed { result, .. } => result,
            QueryOutcome::Superseded { token } => panic!("query #{token} unexpectedly superseded"),
        }
    }

    #[test]
    fn test_circle_query_posts_shape_body() {
        let orch = orchestrator();
        orch.transport().reply(200, stats_body());

        let result = completed(query(&orch, circle())).expect("succeeds");
        assert_eq!(result.total_population, 1200);
        assert_eq!(result.analysis_area_sqm, Some(3141592.0));
        assert!(result.boundary.is_none());

        let calls = orch.transport().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path, "/analyze");
        let body: serde_json::Value =
            serde_json::from_str(calls[0].body.as_deref().unwrap_or("")).expect("json body");
        assert_eq!(body["type"], "circle");
        assert_eq!(body["data"]["segments"], 32);
    }

    #[test]
    fn test_invalid_polygon_makes_no_request() {
        let orch = orchestrator();
        let polygon = Selection::Polygon {
            vertices: vec![LatLng::new(37.0, 127.0), LatLng::new(37.1, 127.0)],
        };
        assert!(matches!(
            orch.begin(polygon),
            Err(QueryError::InvalidInput(SelectionError::TooFewVertices(2)))
        ));
        assert_eq!(orch.latest_token(), 0);
        assert!(orch.transport().calls().is_empty());
    }

    #[test]
    fn test_superseded_response_is_discarded() {
        let orch = orchestrator();
        orch.transport().reply(200, stats_body()).reply(200, stats_body());

        let first = orch.begin(circle()).expect("valid");
        let second = orch.begin(circle()).expect("valid");

        let outcome = pollster::block_on(orch.execute(second));
        assert!(matches!(outcome, QueryOutcome::Completed { token: 2, result: Ok(_) }));

        let outcome = pollster::block_on(orch.execute(first));
        assert!(matches!(outcome, QueryOutcome::Superseded { token: 1 }));
    }

    #[test]
    fn test_backend_detail_is_surfaced() {
        let orch = orchestrator();
        orch.transport()
            .reply(422, json!({"detail": "반경은 50km를 초과할 수 없습니다"}))
            .reply(500, json!({}))
            .reply(200, json!({"error": true, "message": "해당 지역 데이터가 없습니다"}));

        let err = completed(query(&orch, circle())).expect_err("fails");
        assert_eq!(err.to_string(), "반경은 50km를 초과할 수 없습니다");

        let err = completed(query(&orch, circle())).expect_err("fails");
        assert!(matches!(err, QueryError::Backend { status: 500, .. }));
        assert_eq!(err.to_string(), "HTTP error! status: 500");

        let err = completed(query(&orch, circle())).expect_err("fails");
        assert_eq!(err.to_string(), "해당 지역 데이터가 없습니다");
    }

    #[test]
    fn test_transport_failure() {
        let orch = orchestrator();
        orch.transport()
            .reply_raw(Err(TransportError::network("connection refused")));
        let err = completed(query(&orch, circle())).expect_err("fails");
        assert!(matches!(err, QueryError::Transport(_)));
    }

    #[test]
    fn test_region_boundary_cached_then_reused() {
        let orch = orchestrator();
        orch.transport()
            .reply(200, region_body(126.9))
            .reply(200, region_body(120.0));
        let seoul = || Selection::Region {
            path: RegionPath::sido("Seoul"),
        };

        let first = completed(query(&orch, seoul())).expect("succeeds");
        assert!(!first.boundary_from_cache);
        assert_eq!(orch.cache_stats().count, 1);

        let second = completed(query(&orch, seoul())).expect("succeeds");
        assert!(second.boundary_from_cache);
        // Cached boundary wins over the fresh one
        assert_eq!(second.boundary, first.boundary);
        assert_eq!(orch.cache_stats().hits, 1);

        // Statistics are always requested
        assert_eq!(orch.transport().calls().len(), 2);
        assert_eq!(orch.transport().calls()[1].path, "/getRegionPop");
    }

    #[test]
    fn test_superseded_region_boundary_still_cached() {
        let orch = orchestrator();
        orch.transport().reply(200, region_body(126.9));

        let pending = orch
            .begin(Selection::Region {
                path: RegionPath::sigungu("Seoul", "Gangnam"),
            })
            .expect("valid");
        orch.supersede();

        let outcome = pollster::block_on(orch.execute(pending));
        assert!(matches!(outcome, QueryOutcome::Superseded { .. }));
        assert_eq!(orch.cache_stats().keys, vec!["boundary_sigungu_Seoul_Gangnam"]);
    }

    #[test]
    fn test_unsupported_boundary_is_dropped() {
        let orch = orchestrator();
        orch.transport().reply(
            200,
            json!({
                "total_population": 1,
                "total_households": 1,
                "age_distribution": {},
                "boundary": {"type": "Point", "coordinates": [127.0, 37.0]}
            }),
        );
        let result = completed(query(
            &orch,
            Selection::Region {
                path: RegionPath::sido("Seoul"),
            },
        ))
        .expect("succeeds");
        assert!(result.boundary.is_none());
        assert_eq!(orch.cache_stats().count, 0);
    }
}
