//! Selection types: drawing tools, top-level modes and finished selections.

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_CIRCLE_RADIUS_M, MIN_POLYGON_VERTICES};
use crate::geo::LatLng;

/// Drawing sub-tools. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawingMode {
    /// No drawing tool selected
    #[default]
    None,
    /// Circle tool (center + drag radius)
    Circle,
    /// Polygon tool (click vertices)
    Polygon,
}

impl DrawingMode {
    /// Get the display name for this tool.
    pub fn name(&self) -> &'static str {
        match self {
            DrawingMode::None => "None",
            DrawingMode::Circle => "Circle",
            DrawingMode::Polygon => "Polygon",
        }
    }

    /// Tools that can be marked active in the toolbar.
    pub fn tools() -> &'static [DrawingMode] {
        &[DrawingMode::Circle, DrawingMode::Polygon]
    }

    /// Check if this is an actual drawing tool (not None).
    pub fn is_drawing_tool(&self) -> bool {
        !matches!(self, DrawingMode::None)
    }
}

/// Top-level selection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Freehand circle/polygon drawing
    #[default]
    Drawing,
    /// Administrative region lookup
    Region,
}

/// Administrative tier of a region query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionLevel {
    /// Province (시/도)
    Sido,
    /// District (시/군/구)
    Sigungu,
    /// Sub-district (행정동)
    Dong,
}

impl RegionLevel {
    /// Wire name of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionLevel::Sido => "sido",
            RegionLevel::Sigungu => "sigungu",
            RegionLevel::Dong => "dong",
        }
    }

    /// Map zoom level used when focusing a boundary of this tier.
    pub fn map_zoom(&self) -> u8 {
        match self {
            RegionLevel::Sido => 10,
            RegionLevel::Sigungu => 7,
            RegionLevel::Dong => 5,
        }
    }
}

impl std::fmt::Display for RegionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Administrative path: province, then optional district and sub-district.
///
/// A sub-district can only be present together with its district.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionPath {
    sido: String,
    sigungu: Option<String>,
    dong: Option<String>,
}

impl RegionPath {
    /// Province-level path.
    pub fn sido(sido: impl Into<String>) -> Self {
        Self {
            sido: sido.into(),
            sigungu: None,
            dong: None,
        }
    }

    /// District-level path.
    pub fn sigungu(sido: impl Into<String>, sigungu: impl Into<String>) -> Self {
        Self {
            sido: sido.into(),
            sigungu: Some(sigungu.into()),
            dong: None,
        }
    }

    /// Sub-district-level path.
    pub fn dong(
        sido: impl Into<String>,
        sigungu: impl Into<String>,
        dong: impl Into<String>,
    ) -> Self {
        Self {
            sido: sido.into(),
            sigungu: Some(sigungu.into()),
            dong: Some(dong.into()),
        }
    }

    pub fn province(&self) -> &str {
        &self.sido
    }

    pub fn district(&self) -> Option<&str> {
        self.sigungu.as_deref()
    }

    pub fn subdistrict(&self) -> Option<&str> {
        self.dong.as_deref()
    }

    /// Deepest level present in the path.
    pub fn level(&self) -> RegionLevel {
        if self.dong.is_some() {
            RegionLevel::Dong
        } else if self.sigungu.is_some() {
            RegionLevel::Sigungu
        } else {
            RegionLevel::Sido
        }
    }

    /// Names in order, province first.
    pub fn names(&self) -> Vec<&str> {
        std::iter::once(self.sido.as_str())
            .chain(self.sigungu.as_deref())
            .chain(self.dong.as_deref())
            .collect()
    }

    /// Human-readable label, e.g. "Seoul Gangnam".
    pub fn label(&self) -> String {
        self.names().join(" ")
    }
}

/// A finalized spatial query input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Selection {
    /// Drawn circle.
    Circle {
        center: LatLng,
        radius_m: f64,
        segments: u32,
    },
    /// Drawn polygon, vertices in drawing order.
    Polygon { vertices: Vec<LatLng> },
    /// Administrative region.
    Region { path: RegionPath },
}

impl Selection {
    /// Short kind name used in logs and report titles.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Selection::Circle { .. } => "circle",
            Selection::Polygon { .. } => "polygon",
            Selection::Region { .. } => "region",
        }
    }

    /// Validate the selection before any request is issued.
    pub fn validate(&self) -> Result<(), SelectionError> {
        match self {
            Selection::Circle {
                center, radius_m, ..
            } => {
                if !center.is_valid() {
                    return Err(SelectionError::InvalidCoordinate(*center));
                }
                if !radius_m.is_finite() || *radius_m <= 0.0 || *radius_m > MAX_CIRCLE_RADIUS_M {
                    return Err(SelectionError::RadiusOutOfRange(*radius_m));
                }
                Ok(())
            }
            Selection::Polygon { vertices } => {
                if vertices.len() < MIN_POLYGON_VERTICES {
                    return Err(SelectionError::TooFewVertices(vertices.len()));
                }
                match vertices.iter().find(|v| !v.is_valid()) {
                    Some(bad) => Err(SelectionError::InvalidCoordinate(*bad)),
                    None => Ok(()),
                }
            }
            Selection::Region { path } => {
                if path.province().trim().is_empty() {
                    return Err(SelectionError::NoProvince);
                }
                Ok(())
            }
        }
    }
}

/// Locally detected invalid input. No request is issued for these.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectionError {
    /// Polygon needs at least three vertices
    #[error("Polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    /// Circle radius must be positive and at most 50 km
    #[error("Radius must be greater than 0 m and at most 50000 m, got {0}")]
    RadiusOutOfRange(f64),

    /// Coordinate outside WGS84 range
    #[error("Invalid coordinate: ({}, {})", .0.lat, .0.lng)]
    InvalidCoordinate(LatLng),

    /// Region query attempted without a province
    #[error("Select a province first")]
    NoProvince,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_level_and_label() {
        let path = RegionPath::sigungu("Seoul", "Gangnam");
        assert_eq!(path.level(), RegionLevel::Sigungu);
        assert_eq!(path.label(), "Seoul Gangnam");
        assert_eq!(path.names(), vec!["Seoul", "Gangnam"]);

        let path = RegionPath::dong("Seoul", "Gangnam", "Yeoksam 1");
        assert_eq!(path.level(), RegionLevel::Dong);
        assert_eq!(path.label(), "Seoul Gangnam Yeoksam 1");
    }

    #[test]
    fn test_level_serialization() {
        assert_eq!(
            serde_json::to_string(&RegionLevel::Sigungu).ok(),
            Some("\"sigungu\"".to_string())
        );
        assert_eq!(RegionLevel::Sido.map_zoom(), 10);
        assert_eq!(RegionLevel::Sigungu.map_zoom(), 7);
        assert_eq!(RegionLevel::Dong.map_zoom(), 5);
    }

    #[test]
    fn test_polygon_validation() {
        let two = Selection::Polygon {
            vertices: vec![LatLng::new(37.0, 127.0), LatLng::new(37.1, 127.0)],
        };
        assert_eq!(two.validate(), Err(SelectionError::TooFewVertices(2)));

        let three = Selection::Polygon {
            vertices: vec![
                LatLng::new(37.0, 127.0),
                LatLng::new(37.1, 127.0),
                LatLng::new(37.1, 127.1),
            ],
        };
        assert!(three.validate().is_ok());
    }

    #[test]
    fn test_circle_validation() {
        let circle = |radius_m| Selection::Circle {
            center: LatLng::new(37.5, 127.0),
            radius_m,
            segments: 32,
        };
        assert!(circle(1000.0).validate().is_ok());
        assert!(circle(0.0).validate().is_err());
        assert!(circle(50_001.0).validate().is_err());
        assert!(circle(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_region_validation() {
        let empty = Selection::Region {
            path: RegionPath::sido("  "),
        };
        assert_eq!(empty.validate(), Err(SelectionError::NoProvince));
    }

    #[test]
    fn test_drawing_mode_defaults() {
        assert_eq!(DrawingMode::default(), DrawingMode::None);
        assert!(!DrawingMode::None.is_drawing_tool());
        assert_eq!(DrawingMode::tools().len(), 2);
        assert_eq!(SelectionMode::default(), SelectionMode::Drawing);
    }
}
