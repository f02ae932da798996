//! Browser host: a `wasm-bindgen` facade over [`MapSession`].
//!
//! The JavaScript map layer forwards pointer and control events here and
//! re-renders from [`AreaPop::snapshot`]. Panel updates are delivered through
//! three callbacks after the session borrow is released, so callbacks may call
//! back into the facade.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Function;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::api::FetchTransport;
use crate::cache::BoundaryCache;
use crate::capture::DrawEvent;
use crate::config::AppConfig;
use crate::geo::LatLng;
use crate::mode::ModeEffect;
use crate::model::{DrawingMode, SelectionMode};
use crate::query::{PendingQuery, QueryOrchestrator};
use crate::region::fetch_hierarchy;
use crate::report::AnalysisReport;
use crate::session::{MapSession, Presenter};
use crate::web_storage::SessionStorage;

type BrowserSession = MapSession<FetchTransport, SessionStorage>;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    let config = AppConfig::load_from_local_storage().unwrap_or_default();
    let level = config
        .preferences
        .log_level
        .to_level_filter()
        .to_level()
        .unwrap_or(log::Level::Error);
    if console_log::init_with_level(level).is_err() {
        web_sys::console::warn_1(&"areapop: logger already initialised".into());
    }
    log::info!("🚀 areapop {} starting", env!("CARGO_PKG_VERSION"));
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

enum PanelEvent {
    Loading,
    Analysis(AnalysisReport),
    Error(String),
}

/// Collects panel updates while the session is borrowed.
#[derive(Default)]
struct QueuedPresenter {
    events: Vec<PanelEvent>,
}

impl Presenter for QueuedPresenter {
    fn show_loading(&mut self) {
        self.events.push(PanelEvent::Loading);
    }

    fn show_analysis(&mut self, report: &AnalysisReport) {
        self.events.push(PanelEvent::Analysis(report.clone()));
    }

    fn show_error(&mut self, message: &str) {
        self.events.push(PanelEvent::Error(message.to_string()));
    }
}

/// JavaScript panel callbacks.
#[derive(Clone)]
struct Callbacks {
    on_loading: Function,
    on_analysis: Function,
    on_error: Function,
}

impl Callbacks {
    fn flush(&self, presenter: QueuedPresenter) {
        for event in presenter.events {
            let result = match event {
                PanelEvent::Loading => self.on_loading.call0(&JsValue::NULL),
                PanelEvent::Analysis(report) => match serde_wasm_bindgen::to_value(&report) {
                    Ok(value) => self.on_analysis.call1(&JsValue::NULL, &value),
                    Err(e) => Err(e.into()),
                },
                PanelEvent::Error(message) => self
                    .on_error
                    .call1(&JsValue::NULL, &JsValue::from_str(&message)),
            };
            if let Err(e) = result {
                log::error!("❌ Panel callback failed: {:?}", e);
            }
        }
    }
}

#[wasm_bindgen]
pub struct AreaPop {
    session: Rc<RefCell<BrowserSession>>,
    callbacks: Callbacks,
    hierarchy_path: String,
}

impl AreaPop {
    /// Run `f` against the session, then deliver queued panel updates.
    fn with_session<R>(
        &self,
        f: impl FnOnce(&mut BrowserSession, &mut QueuedPresenter) -> R,
    ) -> R {
        let mut presenter = QueuedPresenter::default();
        let result = f(&mut self.session.borrow_mut(), &mut presenter);
        self.callbacks.flush(presenter);
        result
    }

    fn spawn_query(&self, pending: Option<PendingQuery>) {
        let Some(pending) = pending else {
            return;
        };
        let session = Rc::clone(&self.session);
        let callbacks = self.callbacks.clone();
        let orchestrator = session.borrow().orchestrator();

        spawn_local(async move {
            let outcome = orchestrator.execute(pending).await;
            let mut presenter = QueuedPresenter::default();
            session.borrow_mut().apply_outcome(outcome, &mut presenter);
            callbacks.flush(presenter);
        });
    }

    fn load_hierarchy(&self) {
        let session = Rc::clone(&self.session);
        let callbacks = self.callbacks.clone();
        let orchestrator = session.borrow().orchestrator();
        let path = self.hierarchy_path.clone();

        spawn_local(async move {
            let result = fetch_hierarchy(orchestrator.transport(), &path).await;
            let mut presenter = QueuedPresenter::default();
            session.borrow_mut().hierarchy_loaded(result, &mut presenter);
            callbacks.flush(presenter);
        });
    }

    fn draw(&self, event: DrawEvent) {
        let pending = self.with_session(|session, presenter| {
            session.handle_draw_event(event, presenter)
        });
        self.spawn_query(pending);
    }
}

#[wasm_bindgen]
impl AreaPop {
    /// Create a session. `base_url` overrides the configured backend origin.
    #[wasm_bindgen(constructor)]
    pub fn new(
        on_loading: Function,
        on_analysis: Function,
        on_error: Function,
        base_url: Option<String>,
    ) -> Result<AreaPop, JsValue> {
        let config = AppConfig::load_from_local_storage().unwrap_or_default();
        let base_url = base_url.unwrap_or_else(|| config.api.base_url.clone());

        let store = SessionStorage::open().map_err(js_error)?;
        let cache = BoundaryCache::new(store)
            .with_namespace(config.cache.namespace.clone())
            .with_max_entries(config.cache.max_entries);
        let orchestrator = QueryOrchestrator::new(FetchTransport::new(base_url), cache)
            .with_endpoints(config.api.endpoints());

        Ok(AreaPop {
            session: Rc::new(RefCell::new(MapSession::new(orchestrator))),
            callbacks: Callbacks {
                on_loading,
                on_analysis,
                on_error,
            },
            hierarchy_path: config.api.hierarchy_path,
        })
    }

    /// Select a drawing tool: `"none"`, `"circle"` or `"polygon"`.
    #[wasm_bindgen(js_name = selectTool)]
    pub fn select_tool(&self, tool: JsValue) -> Result<(), JsValue> {
        let tool: DrawingMode = serde_wasm_bindgen::from_value(tool)?;
        self.session.borrow_mut().select_tool(tool);
        Ok(())
    }

    /// Switch top-level mode: `"drawing"` or `"region"`.
    #[wasm_bindgen(js_name = switchMode)]
    pub fn switch_mode(&self, mode: JsValue) -> Result<(), JsValue> {
        let mode: SelectionMode = serde_wasm_bindgen::from_value(mode)?;
        let effect = self.session.borrow_mut().switch_mode(mode);
        if effect == Some(ModeEffect::LoadHierarchy) {
            self.load_hierarchy();
        }
        Ok(())
    }

    #[wasm_bindgen(js_name = drawStart)]
    pub fn draw_start(&self, lat: f64, lng: f64) {
        self.draw(DrawEvent::Start(LatLng::new(lat, lng)));
    }

    #[wasm_bindgen(js_name = drawProgress)]
    pub fn draw_progress(&self, lat: f64, lng: f64) {
        self.draw(DrawEvent::Progress(LatLng::new(lat, lng)));
    }

    #[wasm_bindgen(js_name = drawVertex)]
    pub fn draw_vertex(&self, lat: f64, lng: f64) {
        self.draw(DrawEvent::Vertex(LatLng::new(lat, lng)));
    }

    #[wasm_bindgen(js_name = drawEnd)]
    pub fn draw_end(&self) {
        self.draw(DrawEvent::End);
    }

    #[wasm_bindgen(js_name = drawCancel)]
    pub fn draw_cancel(&self) {
        self.draw(DrawEvent::Cancel);
    }

    #[wasm_bindgen(js_name = removeShape)]
    pub fn remove_shape(&self) {
        self.draw(DrawEvent::Remove);
    }

    #[wasm_bindgen(js_name = selectProvince)]
    pub fn select_province(&self, name: Option<String>) -> Result<(), JsValue> {
        self.session
            .borrow_mut()
            .select_province(name.as_deref())
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = selectDistrict)]
    pub fn select_district(&self, name: Option<String>) -> Result<(), JsValue> {
        self.session
            .borrow_mut()
            .select_district(name.as_deref())
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = selectSubdistrict)]
    pub fn select_subdistrict(&self, name: Option<String>) -> Result<(), JsValue> {
        self.session
            .borrow_mut()
            .select_subdistrict(name.as_deref())
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = queryRegion)]
    pub fn query_region(&self) {
        let pending = self.with_session(|session, presenter| session.query_region(presenter));
        self.spawn_query(pending);
    }

    #[wasm_bindgen(js_name = tablePress)]
    pub fn table_press(&self, cell: usize) {
        self.session.borrow_mut().table_press(cell);
    }

    #[wasm_bindgen(js_name = tableHover)]
    pub fn table_hover(&self, cell: usize) {
        self.session.borrow_mut().table_hover(cell);
    }

    #[wasm_bindgen(js_name = tableRelease)]
    pub fn table_release(&self) {
        self.session.borrow_mut().table_release();
    }

    #[wasm_bindgen(js_name = tableClear)]
    pub fn table_clear(&self) {
        self.session.borrow_mut().table_clear();
    }

    #[wasm_bindgen(js_name = tableSelection)]
    pub fn table_selection(&self) -> Vec<usize> {
        self.session.borrow().table_selection().to_vec()
    }

    /// Formatted sum of the selected age cells, if one should be shown.
    #[wasm_bindgen(js_name = tableSummary)]
    pub fn table_summary(&self) -> Option<String> {
        self.session.borrow().table_summary()
    }

    /// Current overlays and controls as a plain JS object.
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.session.borrow().snapshot())?)
    }

    #[wasm_bindgen(js_name = cacheStats)]
    pub fn cache_stats(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.session.borrow().cache_stats())?)
    }

    #[wasm_bindgen(js_name = clearCache)]
    pub fn clear_cache(&self) -> usize {
        self.session.borrow().clear_cache()
    }
}
