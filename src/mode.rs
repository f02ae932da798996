//! Mode controller: the single owner of tool and top-level mode state.
//!
//! Every transition goes through [`ModeController`] methods. Each overlay has
//! exactly one owner: the capture owns the radius label and finished shape,
//! the boundary layer owns the rendered region boundary.

use serde::Serialize;

use crate::capture::{CaptureOutput, DrawEvent, GeometryCapture};
use crate::geo::LatLng;
use crate::model::{BoundaryGeometry, DrawingMode, RegionPath, SelectionMode};
use crate::region::{AdminHierarchy, HierarchyError, RegionError, RegionSelector};

/// A region boundary shown on the map, with the view it should focus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedBoundary {
    pub path: RegionPath,
    pub geometry: BoundaryGeometry,
    /// Map center (the boundary centroid)
    pub focus: LatLng,
    /// Map zoom level for the path's tier
    pub zoom: u8,
}

impl RenderedBoundary {
    pub fn new(path: RegionPath, geometry: BoundaryGeometry) -> Self {
        let zoom = path.level().map_zoom();
        Self {
            focus: geometry.centroid,
            path,
            geometry,
            zoom,
        }
    }
}

/// Region boundary overlay.
#[derive(Debug, Clone, Default)]
pub struct BoundaryLayer {
    current: Option<RenderedBoundary>,
}

impl BoundaryLayer {
    pub fn current(&self) -> Option<&RenderedBoundary> {
        self.current.as_ref()
    }

    fn show(&mut self, boundary: RenderedBoundary) {
        self.current = Some(boundary);
    }

    fn clear(&mut self) {
        self.current = None;
    }
}

/// Work the host must perform after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEffect {
    /// Fetch the administrative hierarchy and report back through
    /// [`ModeController::hierarchy_loaded`]
    LoadHierarchy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum HierarchyStatus {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
}

/// Owns the drawing tool, the top-level mode and the per-mode state.
#[derive(Debug, Default)]
pub struct ModeController {
    mode: SelectionMode,
    tool: DrawingMode,
    capture: GeometryCapture,
    region: RegionSelector,
    boundary: BoundaryLayer,
    hierarchy: HierarchyStatus,
}

impl ModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn tool(&self) -> DrawingMode {
        self.tool
    }

    /// Whether the toolbar should mark `tool` as active.
    pub fn is_tool_active(&self, tool: DrawingMode) -> bool {
        tool.is_drawing_tool() && self.tool == tool
    }

    pub fn capture(&self) -> &GeometryCapture {
        &self.capture
    }

    pub fn region(&self) -> &RegionSelector {
        &self.region
    }

    pub fn boundary(&self) -> Option<&RenderedBoundary> {
        self.boundary.current()
    }

    pub fn is_hierarchy_loading(&self) -> bool {
        self.hierarchy == HierarchyStatus::Loading
    }

    /// Activate a drawing tool.
    ///
    /// Cancels any in-progress shape and clears the finished one. Ignored
    /// outside drawing mode.
    pub fn select_tool(&mut self, tool: DrawingMode) {
        if self.mode != SelectionMode::Drawing {
            log::debug!("🔧 Ignoring tool {} outside drawing mode", tool.name());
            return;
        }
        self.capture.reset();
        self.set_tool(tool);
        log::debug!("🔧 Tool: {}", tool.name());
    }

    /// Deactivate the drawing tool and discard any in-progress shape.
    pub fn reset_tools(&mut self) {
        self.capture.cancel();
        self.set_tool(DrawingMode::None);
    }

    fn set_tool(&mut self, tool: DrawingMode) {
        self.tool = tool;
        self.capture.set_tool(tool);
    }

    /// Switch between drawing and region mode.
    ///
    /// The other mode's overlays are torn down first. Returns
    /// [`ModeEffect::LoadHierarchy`] when entering region mode with no
    /// hierarchy loaded or loading.
    pub fn switch_top_level_mode(&mut self, mode: SelectionMode) -> Option<ModeEffect> {
        log::debug!("🔀 Switching to {:?} mode", mode);
        match mode {
            SelectionMode::Region => {
                self.reset_tools();
                self.capture.clear_finished();
                self.mode = SelectionMode::Region;

                if self.hierarchy == HierarchyStatus::NotLoaded {
                    self.hierarchy = HierarchyStatus::Loading;
                    return Some(ModeEffect::LoadHierarchy);
                }
                None
            }
            SelectionMode::Drawing => {
                self.boundary.clear();
                self.reset_tools();
                self.mode = SelectionMode::Drawing;
                None
            }
        }
    }

    /// Report the result of a [`ModeEffect::LoadHierarchy`].
    ///
    /// A failure clears the loading flag so the next switch retries.
    pub fn hierarchy_loaded(
        &mut self,
        result: Result<AdminHierarchy, HierarchyError>,
    ) -> Result<(), HierarchyError> {
        match result {
            Ok(hierarchy) => {
                self.region.set_hierarchy(hierarchy);
                self.hierarchy = HierarchyStatus::Loaded;
                Ok(())
            }
            Err(e) => {
                log::warn!("⚠️ Region hierarchy load failed: {}", e);
                self.hierarchy = HierarchyStatus::NotLoaded;
                Err(e)
            }
        }
    }

    /// Forward a drawing event to the capture (drawing mode only).
    ///
    /// Cancelling or removing a shape resets the tool.
    pub fn handle_draw_event(&mut self, event: DrawEvent) -> CaptureOutput {
        if self.mode != SelectionMode::Drawing {
            return CaptureOutput::Ignored;
        }
        let output = self.capture.handle(event);
        if matches!(output, CaptureOutput::Cancelled | CaptureOutput::Removed) {
            self.reset_tools();
        }
        output
    }

    pub fn select_province(&mut self, name: Option<&str>) -> Result<(), RegionError> {
        self.ensure_region_mode()?;
        self.region.select_province(name)
    }

    pub fn select_district(&mut self, name: Option<&str>) -> Result<(), RegionError> {
        self.ensure_region_mode()?;
        self.region.select_district(name)
    }

    pub fn select_subdistrict(&mut self, name: Option<&str>) -> Result<(), RegionError> {
        self.ensure_region_mode()?;
        self.region.select_subdistrict(name)
    }

    fn ensure_region_mode(&self) -> Result<(), RegionError> {
        match self.mode {
            SelectionMode::Region => Ok(()),
            SelectionMode::Drawing => Err(RegionError::Inactive),
        }
    }

    /// Remove the rendered boundary, if any.
    pub fn clear_boundary(&mut self) {
        if let Some(previous) = self.boundary.current() {
            log::debug!("🗺️ Clearing boundary for {}", previous.path.label());
        }
        self.boundary.clear();
    }

    /// Replace the rendered boundary. Ignored outside region mode.
    pub fn show_boundary(&mut self, boundary: RenderedBoundary) -> bool {
        if self.mode != SelectionMode::Region {
            log::debug!("🗺️ Dropping boundary for {} outside region mode", boundary.path.label());
            return false;
        }
        log::debug!(
            "🗺️ Showing boundary for {} ({} rings)",
            boundary.path.label(),
            boundary.geometry.rings.len()
        );
        self.boundary.show(boundary);
        true
    }
}
