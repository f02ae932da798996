//! Administrative boundary geometry.

use serde::{Deserialize, Serialize};

use crate::geo::{LatLng, close_ring, is_closed};

/// Geometry type of a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryKind {
    Polygon,
    MultiPolygon,
}

/// Boundary of an administrative region.
///
/// `rings` holds the outer ring of each polygon part: one ring for a
/// `Polygon`, one per part for a `MultiPolygon`. Every ring is closed.
/// Once cached a geometry is never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryGeometry {
    pub kind: GeometryKind,
    pub rings: Vec<Vec<LatLng>>,
    pub centroid: LatLng,
}

impl BoundaryGeometry {
    /// Create a boundary, closing any open rings and dropping empty ones.
    pub fn new(kind: GeometryKind, rings: Vec<Vec<LatLng>>, centroid: LatLng) -> Self {
        let rings = rings
            .into_iter()
            .filter(|ring| !ring.is_empty())
            .map(close_ring)
            .collect();
        Self {
            kind,
            rings,
            centroid,
        }
    }

    /// Total number of vertices over all rings.
    pub fn vertex_count(&self) -> usize {
        self.rings.iter().map(Vec::len).sum()
    }

    /// Check the closed-ring invariant.
    pub fn rings_closed(&self) -> bool {
        self.rings.iter().all(|ring| is_closed(ring))
    }
}
