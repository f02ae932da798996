//! Request and response bodies exchanged with the population backend.

use serde::{Deserialize, Serialize};

use crate::geo::LatLng;
use crate::model::{AgeDistribution, BoundaryGeometry, GeometryKind, RegionLevel, RegionPath};

/// Circle payload for `/analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleData {
    pub center_lng: f64,
    pub center_lat: f64,
    /// Radius in meters, unrounded
    pub radius: f64,
    pub segments: u32,
}

/// Polygon payload for `/analyze`: `[lng, lat]` pairs in drawn order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonData {
    pub coordinates: Vec<[f64; 2]>,
}

/// Body of `POST /analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ShapeRequest {
    Circle(CircleData),
    Polygon(PolygonData),
}

impl ShapeRequest {
    pub fn circle(center: LatLng, radius_m: f64, segments: u32) -> Self {
        Self::Circle(CircleData {
            center_lng: center.lng,
            center_lat: center.lat,
            radius: radius_m,
            segments,
        })
    }

    pub fn polygon(vertices: &[LatLng]) -> Self {
        Self::Polygon(PolygonData {
            coordinates: vertices.iter().map(|v| v.to_lng_lat()).collect(),
        })
    }
}

/// Body of `POST /getRegionPop`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRequest {
    pub sido: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sigungu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dong: Option<String>,
    pub level: RegionLevel,
}

impl From<&RegionPath> for RegionRequest {
    fn from(path: &RegionPath) -> Self {
        Self {
            sido: path.province().to_string(),
            sigungu: path.district().map(str::to_string),
            dong: path.subdistrict().map(str::to_string),
            level: path.level(),
        }
    }
}

/// Successful (2xx) body of both endpoints.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub total_population: u64,
    #[serde(default)]
    pub total_households: u64,
    #[serde(default)]
    pub age_distribution: AgeDistribution,
    #[serde(default)]
    pub analysis_area_sqm: Option<f64>,
    #[serde(default)]
    pub boundary: Option<BoundaryWire>,
    /// Set by the backend for failures reported with a 2xx status
    #[serde(default)]
    pub error: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AnalysisResponse {
    /// Backend-reported failure message, if this body is one.
    pub fn reported_error(&self) -> Option<&str> {
        match self.error {
            Some(true) => Some(self.message.as_deref().unwrap_or("Unknown backend error")),
            _ => None,
        }
    }
}

/// Non-2xx body. FastAPI puts a string or a validation error list in `detail`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// `detail` as display text: strings verbatim, anything else as compact JSON.
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Boundary as sent by the backend: GeoJSON-style coordinates plus centroid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryWire {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: serde_json::Value,
    #[serde(default)]
    pub centroid: Option<LatLng>,
}

/// Why a boundary body could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum BoundaryDecodeError {
    #[error("Unsupported geometry type '{0}'")]
    UnsupportedType(String),

    #[error("Malformed boundary coordinates: {0}")]
    MalformedCoordinates(#[from] serde_json::Error),

    #[error("Boundary has no rings")]
    Empty,
}

type Ring = Vec<[f64; 2]>;

impl TryFrom<BoundaryWire> for BoundaryGeometry {
    type Error = BoundaryDecodeError;

    /// Keep the outer ring of each polygon part.
    fn try_from(wire: BoundaryWire) -> Result<Self, Self::Error> {
        let (kind, parts): (GeometryKind, Vec<Vec<Ring>>) = match wire.kind.as_str() {
            "Polygon" => (
                GeometryKind::Polygon,
                vec![serde_json::from_value(wire.coordinates)?],
            ),
            "ST_MultiPolygon" | "MultiPolygon" => (
                GeometryKind::MultiPolygon,
                serde_json::from_value(wire.coordinates)?,
            ),
            other => return Err(BoundaryDecodeError::UnsupportedType(other.to_string())),
        };

        let rings: Vec<Vec<LatLng>> = parts
            .into_iter()
            .filter_map(|part| part.into_iter().next())
            .map(|ring| ring.into_iter().map(LatLng::from_lng_lat).collect())
            .collect();

        let Some(first) = rings.iter().find(|ring| !ring.is_empty()) else {
            return Err(BoundaryDecodeError::Empty);
        };
        let centroid = wire.centroid.unwrap_or_else(|| ring_mean(first));

        Ok(BoundaryGeometry::new(kind, rings, centroid))
    }
}

impl From<&BoundaryGeometry> for BoundaryWire {
    fn from(geometry: &BoundaryGeometry) -> Self {
        let ring_json = |ring: &Vec<LatLng>| -> Vec<[f64; 2]> {
            ring.iter().map(|p| p.to_lng_lat()).collect()
        };
        let (kind, coordinates) = match geometry.kind {
            GeometryKind::Polygon => (
                "Polygon",
                serde_json::json!(geometry.rings.iter().map(ring_json).collect::<Vec<_>>()),
            ),
            GeometryKind::MultiPolygon => (
                "ST_MultiPolygon",
                serde_json::json!(
                    geometry
                        .rings
                        .iter()
                        .map(|ring| vec![ring_json(ring)])
                        .collect::<Vec<_>>()
                ),
            ),
        };
        Self {
            kind: kind.to_string(),
            coordinates,
            centroid: Some(geometry.centroid),
        }
    }
}

fn ring_mean(ring: &[LatLng]) -> LatLng {
    let n = ring.len() as f64;
    let (lat, lng) = ring
        .iter()
        .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));
    LatLng::new(lat / n, lng / n)
}
