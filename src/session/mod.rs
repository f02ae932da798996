//! Map session: wires the mode controller, the query orchestrator and the
//! result presenter together.
//!
//! Hosts feed UI events in and get [`PendingQuery`] values back. Running a
//! query is left to the host so it can await [`QueryOrchestrator::execute`]
//! without holding the session borrowed:
//!
//! ```ignore
//! let pending = session.handle_draw_event(event, &mut presenter);
//! if let Some(pending) = pending {
//!     let outcome = session.orchestrator().execute(pending).await;
//!     session.apply_outcome(outcome, &mut presenter);
//! }
//! ```

use std::rc::Rc;

use serde::Serialize;

use crate::api::Transport;
use crate::cache::{CacheStats, EvictionPolicy, KeyValueStore, OldestHalf};
use crate::capture::{
    CaptureError, CaptureOutput, DrawEvent, FinishedShape, PolygonPreview, RadiusLabel,
};
use crate::mode::{ModeController, ModeEffect, RenderedBoundary};
use crate::model::{DrawingMode, RegionLevel, Selection, SelectionMode};
use crate::query::{PendingQuery, QueryOrchestrator, QueryOutcome};
use crate::region::{AdminHierarchy, HierarchyError, RegionError};
use crate::report::{AGE_TABLE_COLUMNS, AgeTableSelection, AnalysisReport, format_sum};

#[cfg(test)]
mod tests;

/// Result panel sink. Every user-visible failure goes through `show_error`.
pub trait Presenter {
    fn show_loading(&mut self);

    fn show_analysis(&mut self, report: &AnalysisReport);

    fn show_error(&mut self, message: &str);
}

/// Region selector state for rendering the three dropdowns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSnapshot {
    pub loaded: bool,
    pub loading: bool,
    pub provinces: Vec<String>,
    pub districts: Vec<String>,
    pub subdistricts: Vec<String>,
    pub district_enabled: bool,
    pub subdistrict_enabled: bool,
    pub level: Option<RegionLevel>,
    pub label: Option<String>,
    pub can_query: bool,
    pub button_text: String,
}

/// Everything a host needs to draw the map overlays and controls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlaySnapshot {
    pub mode: SelectionMode,
    pub tool: DrawingMode,
    pub live_label: Option<RadiusLabel>,
    pub polygon: Option<PolygonPreview>,
    pub finished: Option<FinishedShape>,
    pub boundary: Option<RenderedBoundary>,
    pub region: RegionSnapshot,
}

/// One interactive map session.
pub struct MapSession<T, S, E = OldestHalf> {
    modes: ModeController,
    orchestrator: Rc<QueryOrchestrator<T, S, E>>,
    report: Option<AnalysisReport>,
    table: AgeTableSelection,
}

impl<T: Transport, S: KeyValueStore, E: EvictionPolicy> MapSession<T, S, E> {
    pub fn new(orchestrator: QueryOrchestrator<T, S, E>) -> Self {
        Self {
            modes: ModeController::new(),
            orchestrator: Rc::new(orchestrator),
            report: None,
            table: AgeTableSelection::new(),
        }
    }

    /// Shared handle for running [`PendingQuery`] values.
    pub fn orchestrator(&self) -> Rc<QueryOrchestrator<T, S, E>> {
        Rc::clone(&self.orchestrator)
    }

    pub fn modes(&self) -> &ModeController {
        &self.modes
    }

    /// Last report shown, if any.
    pub fn report(&self) -> Option<&AnalysisReport> {
        self.report.as_ref()
    }

    pub fn select_tool(&mut self, tool: DrawingMode) {
        self.modes.select_tool(tool);
    }

    /// Switch top-level mode. In-flight queries are superseded so a late
    /// result from the previous mode is never shown. Re-selecting the active
    /// mode does nothing.
    pub fn switch_mode(&mut self, mode: SelectionMode) -> Option<ModeEffect> {
        if mode == self.modes.mode() {
            return None;
        }
        self.orchestrator.supersede();
        self.modes.switch_top_level_mode(mode)
    }

    /// Report a hierarchy load. Failures are shown to the user.
    pub fn hierarchy_loaded(
        &mut self,
        result: Result<AdminHierarchy, HierarchyError>,
        presenter: &mut impl Presenter,
    ) {
        if let Err(e) = self.modes.hierarchy_loaded(result) {
            presenter.show_error(&format!("행정구역 데이터를 불러오지 못했습니다: {}", e));
        }
    }

    /// Feed a drawing event. A finished shape starts a query.
    pub fn handle_draw_event(
        &mut self,
        event: DrawEvent,
        presenter: &mut impl Presenter,
    ) -> Option<PendingQuery> {
        match self.modes.handle_draw_event(event) {
            CaptureOutput::Finished(selection) => self.begin_query(selection, presenter),
            CaptureOutput::Rejected(e @ CaptureError::TooFewVertices(_)) => {
                presenter.show_error(&e.to_string());
                None
            }
            CaptureOutput::Rejected(e) => {
                log::debug!("📝 Shape discarded: {}", e);
                None
            }
            _ => None,
        }
    }

    pub fn select_province(&mut self, name: Option<&str>) -> Result<(), RegionError> {
        self.modes.select_province(name)
    }

    pub fn select_district(&mut self, name: Option<&str>) -> Result<(), RegionError> {
        self.modes.select_district(name)
    }

    pub fn select_subdistrict(&mut self, name: Option<&str>) -> Result<(), RegionError> {
        self.modes.select_subdistrict(name)
    }

    /// Query the currently selected region.
    pub fn query_region(&mut self, presenter: &mut impl Presenter) -> Option<PendingQuery> {
        if self.modes.mode() != SelectionMode::Region {
            presenter.show_error(&RegionError::Inactive.to_string());
            return None;
        }
        match self.modes.region().selection() {
            Ok(selection) => self.begin_query(selection, presenter),
            Err(e) => {
                presenter.show_error(&e.to_string());
                None
            }
        }
    }

    /// Validate and issue a query for `selection`.
    pub fn begin_query(
        &mut self,
        selection: Selection,
        presenter: &mut impl Presenter,
    ) -> Option<PendingQuery> {
        match self.orchestrator.begin(selection) {
            Ok(pending) => {
                presenter.show_loading();
                Some(pending)
            }
            Err(e) => {
                presenter.show_error(&e.to_string());
                None
            }
        }
    }

    /// Apply a finished query. Returns `false` when the outcome was stale.
    pub fn apply_outcome(&mut self, outcome: QueryOutcome, presenter: &mut impl Presenter) -> bool {
        let (token, result) = match outcome {
            QueryOutcome::Completed { token, result } => (token, result),
            QueryOutcome::Superseded { .. } => return false,
        };
        if !self.orchestrator.is_current(token) {
            log::debug!("⏭️ Dropping stale result #{}", token);
            return false;
        }

        match result {
            Ok(result) => {
                if let Selection::Region { path } = &result.selection {
                    // A region result always replaces the previous outline
                    self.modes.clear_boundary();
                    if let Some(boundary) = &result.boundary {
                        self.modes
                            .show_boundary(RenderedBoundary::new(path.clone(), boundary.clone()));
                    }
                }
                let report = AnalysisReport::from_result(&result);
                self.table.clear();
                presenter.show_analysis(&report);
                self.report = Some(report);
            }
            Err(e) => presenter.show_error(&e.to_string()),
        }
        true
    }

    /// Start an age-table drag at `cell`.
    pub fn table_press(&mut self, cell: usize) {
        self.table.press(cell);
    }

    pub fn table_hover(&mut self, cell: usize) {
        let cells = self
            .report
            .as_ref()
            .map(|r| r.age_rows.len() * AGE_TABLE_COLUMNS)
            .unwrap_or(0);
        self.table.hover(cell, cells);
    }

    pub fn table_release(&mut self) {
        self.table.release();
    }

    pub fn table_clear(&mut self) {
        self.table.clear();
    }

    pub fn table_selection(&self) -> &[usize] {
        self.table.selected()
    }

    /// Formatted sum of the selected cells, if it should be shown.
    pub fn table_summary(&self) -> Option<String> {
        let report = self.report.as_ref()?;
        self.table.summary(&report.age_rows).map(format_sum)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.orchestrator.cache_stats()
    }

    pub fn clear_cache(&self) -> usize {
        self.orchestrator.clear_cache()
    }

    pub fn snapshot(&self) -> OverlaySnapshot {
        let region = self.modes.region();
        OverlaySnapshot {
            mode: self.modes.mode(),
            tool: self.modes.tool(),
            live_label: self.modes.capture().live_label().copied(),
            polygon: self.modes.capture().polygon_preview(),
            finished: self.modes.capture().finished().cloned(),
            boundary: self.modes.boundary().cloned(),
            region: RegionSnapshot {
                loaded: region.is_loaded(),
                loading: self.modes.is_hierarchy_loading(),
                provinces: owned(region.province_options()),
                districts: owned(region.district_options()),
                subdistricts: owned(region.subdistrict_options()),
                district_enabled: region.district_enabled(),
                subdistrict_enabled: region.subdistrict_enabled(),
                level: region.level(),
                label: region.label(),
                can_query: region.can_query(),
                button_text: region.button_text(),
            },
        }
    }
}

fn owned(names: Vec<&str>) -> Vec<String> {
    names.into_iter().map(str::to_string).collect()
}
