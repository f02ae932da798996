//! Scenario tests for the map session.
//!
//! Each test drives a [`MapSession`] through UI events against a scripted
//! transport and an in-memory cache, running async steps with `pollster`.

mod ordering_tests;

use serde_json::json;

use super::{MapSession, Presenter};
use crate::api::scripted::ScriptedTransport;
use crate::cache::{BoundaryCache, MemoryStore};
use crate::query::{PendingQuery, QueryOrchestrator};
use crate::report::AnalysisReport;

type TestSession = MapSession<ScriptedTransport, MemoryStore>;

/// Presenter that records every call.
#[derive(Debug, Default)]
struct RecordingPresenter {
    loading: usize,
    reports: Vec<AnalysisReport>,
    errors: Vec<String>,
}

impl Presenter for RecordingPresenter {
    fn show_loading(&mut self) {
        self.loading += 1;
    }

    fn show_analysis(&mut self, report: &AnalysisReport) {
        self.reports.push(report.clone());
    }

    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

fn session() -> TestSession {
    MapSession::new(QueryOrchestrator::new(
        ScriptedTransport::new(),
        BoundaryCache::new(MemoryStore::new()),
    ))
}

/// Execute `pending` and apply the outcome. Returns whether it was applied.
fn run(session: &mut TestSession, pending: PendingQuery, presenter: &mut RecordingPresenter) -> bool {
    let orchestrator = session.orchestrator();
    let outcome = pollster::block_on(orchestrator.execute(pending));
    session.apply_outcome(outcome, presenter)
}

fn stats_body(population: u64) -> serde_json::Value {
    json!({
        "total_population": population,
        "total_households": population / 2,
        "age_distribution": {"30대": population / 2, "10세 미만": population - population / 2},
        "analysis_area_sqm": 3_141_592.0
    })
}

const TREE: &str = r#"{
    "Seoul": {"Jongno": ["Sajik"], "Gangnam": ["Sinsa", "Yeoksam 1"]},
    "Busan": {"Haeundae": ["U 1"]}
}"#;

fn region_body(population: u64) -> serde_json::Value {
    json!({
        "total_population": population,
        "total_households": population / 2,
        "age_distribution": {"40대": population},
        "boundary": {
            "type": "ST_MultiPolygon",
            "coordinates": [[[[127.0, 37.4], [127.1, 37.4], [127.1, 37.5], [127.0, 37.4]]]],
            "centroid": {"lat": 37.45, "lng": 127.05}
        }
    })
}
