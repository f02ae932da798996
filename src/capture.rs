//! Geometry capture: turns drawing-tool events into finished selections.
//!
//! One shape is captured at a time. A circle is `Start` (center), any number
//! of `Progress` events (live radius) and `End`. A polygon is `Start` (first
//! vertex), `Vertex` per click and `End`.
//!
//! The capture owns two overlays: the transient live-radius label shown while
//! dragging and the finished shape (with its persisted radius label). Both are
//! torn down only through [`GeometryCapture::cancel`],
//! [`GeometryCapture::clear_finished`] or [`GeometryCapture::reset`].

use serde::Serialize;

use crate::constants::{CIRCLE_SEGMENTS, MIN_POLYGON_VERTICES};
use crate::geo::LatLng;
use crate::model::{DrawingMode, Selection};

/// Raw events from the map's drawing tool.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawEvent {
    /// Pointer pressed: circle center or first polygon vertex
    Start(LatLng),
    /// Pointer moved
    Progress(LatLng),
    /// Polygon vertex clicked
    Vertex(LatLng),
    /// Shape completed
    End,
    /// Drawing aborted (e.g. Escape)
    Cancel,
    /// Finished shape removed by the user
    Remove,
}

/// Radius text overlay anchored at a circle's center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadiusLabel {
    pub center: LatLng,
    /// Radius rounded to whole meters, for display only
    pub meters: u64,
}

impl RadiusLabel {
    pub fn new(center: LatLng, radius_m: f64) -> Self {
        Self {
            center,
            meters: radius_m.round().max(0.0) as u64,
        }
    }

    /// Display text, e.g. "반경 1000m".
    pub fn text(&self) -> String {
        format!("반경 {}m", self.meters)
    }
}

/// A completed shape still shown on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinishedShape {
    pub selection: Selection,
    /// Persisted radius label (circles only)
    pub radius_label: Option<RadiusLabel>,
}

/// Vertices placed so far and the current pointer position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolygonPreview {
    pub vertices: Vec<LatLng>,
    pub pointer: Option<LatLng>,
}

/// Why an `End` event produced no selection.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CaptureError {
    /// Polygon closed with too few vertices
    #[error("Polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    /// Circle ended before any pointer movement
    #[error("Circle radius is undefined")]
    RadiusUndefined,
}

/// Result of feeding one event to the capture.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutput {
    /// Event had no effect
    Ignored,
    /// A new shape was started
    Started,
    /// Live radius changed; transient overlay updated
    LiveRadius(RadiusLabel),
    /// Polygon vertex appended; holds the vertex count
    VertexAdded(usize),
    /// Shape finished
    Finished(Selection),
    /// Shape rejected on `End`
    Rejected(CaptureError),
    /// In-progress shape discarded
    Cancelled,
    /// Finished shape removed
    Removed,
}

/// In-progress shape.
#[derive(Debug, Clone, Default, PartialEq)]
enum CaptureState {
    #[default]
    Idle,
    Circle {
        center: LatLng,
        radius_m: Option<f64>,
    },
    Polygon {
        vertices: Vec<LatLng>,
        pointer: Option<LatLng>,
    },
}

/// Drawing capture for the active tool.
#[derive(Debug, Default)]
pub struct GeometryCapture {
    tool: DrawingMode,
    state: CaptureState,
    live_label: Option<RadiusLabel>,
    finished: Option<FinishedShape>,
}

impl GeometryCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tool the capture is currently driven by.
    pub fn tool(&self) -> DrawingMode {
        self.tool
    }

    /// Change the tool. Only the mode controller calls this, after tearing
    /// down whatever the previous tool left behind.
    pub(crate) fn set_tool(&mut self, tool: DrawingMode) {
        self.tool = tool;
    }

    /// Check if a shape is being drawn.
    pub fn is_capturing(&self) -> bool {
        self.state != CaptureState::Idle
    }

    /// Transient radius label, shown only while dragging a circle.
    pub fn live_label(&self) -> Option<&RadiusLabel> {
        self.live_label.as_ref()
    }

    /// Last finished shape, if still shown.
    pub fn finished(&self) -> Option<&FinishedShape> {
        self.finished.as_ref()
    }

    /// Polygon being drawn, for the rubber-band overlay.
    pub fn polygon_preview(&self) -> Option<PolygonPreview> {
        match &self.state {
            CaptureState::Polygon { vertices, pointer } => Some(PolygonPreview {
                vertices: vertices.clone(),
                pointer: *pointer,
            }),
            _ => None,
        }
    }

    /// Feed one drawing-tool event.
    pub fn handle(&mut self, event: DrawEvent) -> CaptureOutput {
        match event {
            DrawEvent::Start(point) => self.start(point),
            DrawEvent::Progress(point) => self.progress(point),
            DrawEvent::Vertex(point) => self.add_vertex(point),
            DrawEvent::End => self.end(),
            DrawEvent::Cancel => {
                self.cancel();
                CaptureOutput::Cancelled
            }
            DrawEvent::Remove => {
                self.clear_finished();
                CaptureOutput::Removed
            }
        }
    }

    fn start(&mut self, point: LatLng) -> CaptureOutput {
        if self.tool == DrawingMode::None {
            return CaptureOutput::Ignored;
        }
        if self.is_capturing() {
            log::debug!("✏️ Restarting capture at ({:.5}, {:.5})", point.lat, point.lng);
        }
        // A new shape replaces whatever was drawn before
        self.cancel();
        self.clear_finished();

        self.state = match self.tool {
            DrawingMode::None => CaptureState::Idle,
            DrawingMode::Circle => CaptureState::Circle {
                center: point,
                radius_m: None,
            },
            DrawingMode::Polygon => CaptureState::Polygon {
                vertices: vec![point],
                pointer: None,
            },
        };
        log::debug!(
            "✏️ Started {} at ({:.5}, {:.5})",
            self.tool.name(),
            point.lat,
            point.lng
        );
        CaptureOutput::Started
    }

    fn progress(&mut self, point: LatLng) -> CaptureOutput {
        match &mut self.state {
            CaptureState::Idle => CaptureOutput::Ignored,
            CaptureState::Circle { center, radius_m } => {
                let radius = center.distance_to(&point);
                *radius_m = Some(radius);
                let label = RadiusLabel::new(*center, radius);
                self.live_label = Some(label);
                CaptureOutput::LiveRadius(label)
            }
            CaptureState::Polygon { pointer, .. } => {
                *pointer = Some(point);
                CaptureOutput::Ignored
            }
        }
    }

    fn add_vertex(&mut self, point: LatLng) -> CaptureOutput {
        match &mut self.state {
            CaptureState::Polygon { vertices, .. } => {
                vertices.push(point);
                CaptureOutput::VertexAdded(vertices.len())
            }
            _ => CaptureOutput::Ignored,
        }
    }

    fn end(&mut self) -> CaptureOutput {
        let state = std::mem::take(&mut self.state);
        self.live_label = None;

        match state {
            CaptureState::Idle => CaptureOutput::Ignored,
            CaptureState::Circle { center, radius_m } => {
                let Some(radius_m) = radius_m else {
                    log::debug!("📝 Circle ended without a radius");
                    return CaptureOutput::Rejected(CaptureError::RadiusUndefined);
                };
                let selection = Selection::Circle {
                    center,
                    radius_m,
                    segments: CIRCLE_SEGMENTS,
                };
                self.finished = Some(FinishedShape {
                    selection: selection.clone(),
                    radius_label: Some(RadiusLabel::new(center, radius_m)),
                });
                log::info!("✅ Circle finished: radius {:.1} m", radius_m);
                CaptureOutput::Finished(selection)
            }
            CaptureState::Polygon { vertices, .. } => {
                if vertices.len() < MIN_POLYGON_VERTICES {
                    log::debug!("📝 Polygon needs at least 3 points, got {}", vertices.len());
                    return CaptureOutput::Rejected(CaptureError::TooFewVertices(vertices.len()));
                }
                let selection = Selection::Polygon { vertices };
                self.finished = Some(FinishedShape {
                    selection: selection.clone(),
                    radius_label: None,
                });
                log::info!("✅ Polygon finished");
                CaptureOutput::Finished(selection)
            }
        }
    }

    /// Discard the in-progress shape and its transient overlay.
    pub fn cancel(&mut self) {
        self.state = CaptureState::Idle;
        self.live_label = None;
    }

    /// Remove the finished shape overlay.
    pub fn clear_finished(&mut self) {
        self.finished = None;
    }

    /// Tear down everything this capture shows.
    pub fn reset(&mut self) {
        self.cancel();
        self.clear_finished();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::destination;

    fn capture_with(tool: DrawingMode) -> GeometryCapture {
        let mut capture = GeometryCapture::new();
        capture.set_tool(tool);
        capture
    }

    #[test]
    fn test_circle_radius_matches_distance() {
        let mut capture = capture_with(DrawingMode::Circle);
        let center = LatLng::new(37.50, 127.00);
        let edge = destination(center, 90.0, 1000.0);

        assert_eq!(capture.handle(DrawEvent::Start(center)), CaptureOutput::Started);
        let live = capture.handle(DrawEvent::Progress(edge));
        assert!(matches!(live, CaptureOutput::LiveRadius(l) if l.meters == 1000));
        assert!(capture.live_label().is_some());

        let CaptureOutput::Finished(Selection::Circle {
            center: c,
            radius_m,
            segments,
        }) = capture.handle(DrawEvent::End)
        else {
            panic!("expected a finished circle");
        };
        assert_eq!(c, center);
        assert_eq!(segments, 32);
        assert!((radius_m - center.distance_to(&edge)).abs() < 1e-9);
        assert!((radius_m - 1000.0).abs() / 1000.0 < 0.01);

        // Transient label replaced by the persisted one
        assert!(capture.live_label().is_none());
        let finished = capture.finished().expect("finished shape");
        assert_eq!(finished.radius_label.map(|l| l.meters), Some(1000));
    }

    #[test]
    fn test_radius_is_last_progress_distance() {
        let mut capture = capture_with(DrawingMode::Circle);
        let center = LatLng::new(37.5, 127.0);
        capture.handle(DrawEvent::Start(center));
        capture.handle(DrawEvent::Progress(destination(center, 0.0, 500.0)));
        capture.handle(DrawEvent::Progress(destination(center, 0.0, 250.4)));

        match capture.handle(DrawEvent::End) {
            CaptureOutput::Finished(Selection::Circle { radius_m, .. }) => {
                // Unrounded in the selection, rounded only on the label
                assert!((radius_m - 250.4).abs() < 0.01);
                assert_eq!(capture.finished().and_then(|f| f.radius_label).map(|l| l.meters), Some(250));
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn test_circle_without_progress_is_rejected() {
        let mut capture = capture_with(DrawingMode::Circle);
        capture.handle(DrawEvent::Start(LatLng::new(37.5, 127.0)));
        assert_eq!(
            capture.handle(DrawEvent::End),
            CaptureOutput::Rejected(CaptureError::RadiusUndefined)
        );
        assert!(capture.finished().is_none());
    }

    #[test]
    fn test_progress_before_start_is_ignored() {
        let mut capture = capture_with(DrawingMode::Circle);
        assert_eq!(
            capture.handle(DrawEvent::Progress(LatLng::new(37.5, 127.0))),
            CaptureOutput::Ignored
        );
        assert!(capture.live_label().is_none());
        assert_eq!(capture.handle(DrawEvent::End), CaptureOutput::Ignored);
    }

    #[test]
    fn test_restart_discards_prior_state() {
        let mut capture = capture_with(DrawingMode::Circle);
        let first = LatLng::new(37.5, 127.0);
        let second = LatLng::new(35.0, 129.0);
        capture.handle(DrawEvent::Start(first));
        capture.handle(DrawEvent::Progress(destination(first, 90.0, 300.0)));
        capture.handle(DrawEvent::Start(second));
        assert!(capture.live_label().is_none());

        capture.handle(DrawEvent::Progress(destination(second, 90.0, 100.0)));
        match capture.handle(DrawEvent::End) {
            CaptureOutput::Finished(Selection::Circle { center, .. }) => assert_eq!(center, second),
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn test_polygon_finishes_in_drawn_order() {
        let mut capture = capture_with(DrawingMode::Polygon);
        let a = LatLng::new(37.0, 127.0);
        let b = LatLng::new(37.0, 127.1);
        let c = LatLng::new(37.1, 127.1);
        capture.handle(DrawEvent::Start(a));
        capture.handle(DrawEvent::Progress(LatLng::new(37.05, 127.05)));
        assert_eq!(capture.handle(DrawEvent::Vertex(b)), CaptureOutput::VertexAdded(2));
        assert_eq!(capture.handle(DrawEvent::Vertex(c)), CaptureOutput::VertexAdded(3));

        assert_eq!(
            capture.handle(DrawEvent::End),
            CaptureOutput::Finished(Selection::Polygon {
                vertices: vec![a, b, c]
            })
        );
    }

    #[test]
    fn test_polygon_with_two_vertices_is_rejected() {
        let mut capture = capture_with(DrawingMode::Polygon);
        capture.handle(DrawEvent::Start(LatLng::new(37.0, 127.0)));
        capture.handle(DrawEvent::Vertex(LatLng::new(37.0, 127.1)));
        assert_eq!(
            capture.handle(DrawEvent::End),
            CaptureOutput::Rejected(CaptureError::TooFewVertices(2))
        );
        assert!(capture.finished().is_none());
        assert!(!capture.is_capturing());
    }

    #[test]
    fn test_cancel_discards_in_progress_and_label() {
        let mut capture = capture_with(DrawingMode::Circle);
        let center = LatLng::new(37.5, 127.0);
        capture.handle(DrawEvent::Start(center));
        capture.handle(DrawEvent::Progress(destination(center, 90.0, 100.0)));
        assert_eq!(capture.handle(DrawEvent::Cancel), CaptureOutput::Cancelled);
        assert!(!capture.is_capturing());
        assert!(capture.live_label().is_none());
        assert_eq!(capture.handle(DrawEvent::End), CaptureOutput::Ignored);
    }

    #[test]
    fn test_remove_clears_finished_only() {
        let mut capture = capture_with(DrawingMode::Circle);
        let center = LatLng::new(37.5, 127.0);
        capture.handle(DrawEvent::Start(center));
        capture.handle(DrawEvent::Progress(destination(center, 90.0, 100.0)));
        capture.handle(DrawEvent::End);
        assert!(capture.finished().is_some());

        assert_eq!(capture.handle(DrawEvent::Remove), CaptureOutput::Removed);
        assert!(capture.finished().is_none());
        assert_eq!(capture.tool(), DrawingMode::Circle);
    }

    #[test]
    fn test_events_without_tool_are_ignored() {
        let mut capture = GeometryCapture::new();
        assert_eq!(
            capture.handle(DrawEvent::Start(LatLng::new(37.5, 127.0))),
            CaptureOutput::Ignored
        );
        assert!(!capture.is_capturing());
    }

    #[test]
    fn test_start_without_tool_keeps_finished_shape() {
        let mut capture = capture_with(DrawingMode::Circle);
        let center = LatLng::new(37.5, 127.0);
        capture.handle(DrawEvent::Start(center));
        capture.handle(DrawEvent::Progress(destination(center, 90.0, 100.0)));
        capture.handle(DrawEvent::End);
        capture.set_tool(DrawingMode::None);

        assert_eq!(capture.handle(DrawEvent::Start(center)), CaptureOutput::Ignored);
        let finished = capture.finished().expect("finished shape survives");
        assert_eq!(finished.radius_label.map(|l| l.meters), Some(100));
    }

    #[test]
    fn test_polygon_preview_tracks_pointer() {
        let mut capture = capture_with(DrawingMode::Polygon);
        assert!(capture.polygon_preview().is_none());

        let a = LatLng::new(37.0, 127.0);
        let pointer = LatLng::new(37.02, 127.03);
        capture.handle(DrawEvent::Start(a));
        capture.handle(DrawEvent::Progress(pointer));
        assert_eq!(
            capture.polygon_preview(),
            Some(PolygonPreview {
                vertices: vec![a],
                pointer: Some(pointer),
            })
        );

        capture.handle(DrawEvent::Cancel);
        assert!(capture.polygon_preview().is_none());
    }

    #[test]
    fn test_label_text() {
        let label = RadiusLabel::new(LatLng::new(37.5, 127.0), 999.6);
        assert_eq!(label.text(), "반경 1000m");
    }
}
