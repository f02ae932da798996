//! Cascading administrative region selection.
//!
//! The hierarchy is a static tree `province -> district -> [subdistrict]`,
//! read once from JSON. Option lists keep the document order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::api::{Transport, TransportError};
use crate::model::{RegionLevel, RegionPath, Selection, SelectionError};

/// Static administrative tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdminHierarchy {
    provinces: IndexMap<String, IndexMap<String, Vec<String>>>,
}

impl AdminHierarchy {
    /// Parse `{province: {district: [subdistrict, ...]}}`.
    pub fn from_json(json: &str) -> Result<Self, HierarchyError> {
        let hierarchy: Self = serde_json::from_str(json)?;
        if hierarchy.provinces.is_empty() {
            return Err(HierarchyError::Empty);
        }
        Ok(hierarchy)
    }

    pub fn provinces(&self) -> impl Iterator<Item = &str> {
        self.provinces.keys().map(String::as_str)
    }

    pub fn districts(&self, province: &str) -> impl Iterator<Item = &str> {
        self.provinces
            .get(province)
            .into_iter()
            .flat_map(|districts| districts.keys().map(String::as_str))
    }

    pub fn subdistricts(&self, province: &str, district: &str) -> impl Iterator<Item = &str> {
        self.provinces
            .get(province)
            .and_then(|districts| districts.get(district))
            .into_iter()
            .flat_map(|names| names.iter().map(String::as_str))
    }

    pub fn province_count(&self) -> usize {
        self.provinces.len()
    }

    fn has_province(&self, province: &str) -> bool {
        self.provinces.contains_key(province)
    }

    fn has_district(&self, province: &str, district: &str) -> bool {
        self.provinces
            .get(province)
            .is_some_and(|districts| districts.contains_key(district))
    }

    fn has_subdistrict(&self, province: &str, district: &str, subdistrict: &str) -> bool {
        self.subdistricts(province, district)
            .any(|name| name == subdistrict)
    }
}

/// Fetch and parse the hierarchy from `path`.
pub async fn fetch_hierarchy<T: Transport>(
    transport: &T,
    path: &str,
) -> Result<AdminHierarchy, HierarchyError> {
    let response = transport.get(path).await?;
    if !response.is_success() {
        return Err(HierarchyError::Status(response.status));
    }
    AdminHierarchy::from_json(&response.body)
}

/// Errors loading the administrative hierarchy.
#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    #[error("Failed to parse region hierarchy: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Region hierarchy is empty")]
    Empty,

    #[error("Failed to fetch region hierarchy: {0}")]
    Fetch(#[from] TransportError),

    #[error("Region hierarchy request failed with status {0}")]
    Status(u16),
}

/// Rejected region choices. The selector state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegionError {
    #[error("Unknown {level} '{name}'")]
    UnknownRegion { level: RegionLevel, name: String },

    #[error("Choose a {0} first")]
    ParentNotSelected(RegionLevel),

    #[error("Region selection is only available in region mode")]
    Inactive,
}

impl RegionError {
    fn unknown(level: RegionLevel, name: &str) -> Self {
        Self::UnknownRegion {
            level,
            name: name.to_string(),
        }
    }
}

/// Three-level cascading selector.
#[derive(Debug, Clone, Default)]
pub struct RegionSelector {
    hierarchy: Option<AdminHierarchy>,
    sido: Option<String>,
    sigungu: Option<String>,
    dong: Option<String>,
}

impl RegionSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the loaded hierarchy. Resets any previous choice.
    pub fn set_hierarchy(&mut self, hierarchy: AdminHierarchy) {
        log::info!("🗺️ Region hierarchy loaded: {} provinces", hierarchy.province_count());
        self.hierarchy = Some(hierarchy);
        self.reset();
    }

    pub fn is_loaded(&self) -> bool {
        self.hierarchy.is_some()
    }

    /// Clear every level.
    pub fn reset(&mut self) {
        self.sido = None;
        self.sigungu = None;
        self.dong = None;
    }

    /// Choose a province, or `None` for "no province".
    ///
    /// Resets district and sub-district.
    pub fn select_province(&mut self, name: Option<&str>) -> Result<(), RegionError> {
        if let Some(name) = name {
            let known = self
                .hierarchy
                .as_ref()
                .is_some_and(|h| h.has_province(name));
            if !known {
                return Err(RegionError::unknown(RegionLevel::Sido, name));
            }
        }
        self.sido = name.map(str::to_string);
        self.sigungu = None;
        self.dong = None;
        log::debug!("🗺️ Province: {:?}", self.sido);
        Ok(())
    }

    /// Choose a district, or `None` for "no district". Resets sub-district.
    pub fn select_district(&mut self, name: Option<&str>) -> Result<(), RegionError> {
        let Some(sido) = self.sido.as_deref() else {
            return Err(RegionError::ParentNotSelected(RegionLevel::Sido));
        };
        if let Some(name) = name {
            let known = self
                .hierarchy
                .as_ref()
                .is_some_and(|h| h.has_district(sido, name));
            if !known {
                return Err(RegionError::unknown(RegionLevel::Sigungu, name));
            }
        }
        self.sigungu = name.map(str::to_string);
        self.dong = None;
        log::debug!("🗺️ District: {:?}", self.sigungu);
        Ok(())
    }

    /// Choose a sub-district, or `None` for "no sub-district".
    pub fn select_subdistrict(&mut self, name: Option<&str>) -> Result<(), RegionError> {
        let (Some(sido), Some(sigungu)) = (self.sido.as_deref(), self.sigungu.as_deref()) else {
            return Err(RegionError::ParentNotSelected(RegionLevel::Sigungu));
        };
        if let Some(name) = name {
            let known = self
                .hierarchy
                .as_ref()
                .is_some_and(|h| h.has_subdistrict(sido, sigungu, name));
            if !known {
                return Err(RegionError::unknown(RegionLevel::Dong, name));
            }
        }
        self.dong = name.map(str::to_string);
        log::debug!("🗺️ Sub-district: {:?}", self.dong);
        Ok(())
    }

    pub fn province_options(&self) -> Vec<&str> {
        self.hierarchy
            .as_ref()
            .map(|h| h.provinces().collect())
            .unwrap_or_default()
    }

    /// Districts of the chosen province; empty when none is chosen.
    pub fn district_options(&self) -> Vec<&str> {
        match (&self.hierarchy, &self.sido) {
            (Some(h), Some(sido)) => h.districts(sido).collect(),
            _ => Vec::new(),
        }
    }

    /// Sub-districts of the chosen district; empty when none is chosen.
    pub fn subdistrict_options(&self) -> Vec<&str> {
        match (&self.hierarchy, &self.sido, &self.sigungu) {
            (Some(h), Some(sido), Some(sigungu)) => h.subdistricts(sido, sigungu).collect(),
            _ => Vec::new(),
        }
    }

    pub fn district_enabled(&self) -> bool {
        self.sido.is_some()
    }

    pub fn subdistrict_enabled(&self) -> bool {
        self.sigungu.is_some()
    }

    /// A query needs at least a province.
    pub fn can_query(&self) -> bool {
        self.sido.is_some()
    }

    /// Current choice as a path, if a province is chosen.
    pub fn path(&self) -> Option<RegionPath> {
        let sido = self.sido.as_deref()?;
        Some(match (self.sigungu.as_deref(), self.dong.as_deref()) {
            (Some(sigungu), Some(dong)) => RegionPath::dong(sido, sigungu, dong),
            (Some(sigungu), None) => RegionPath::sigungu(sido, sigungu),
            _ => RegionPath::sido(sido),
        })
    }

    /// Deepest chosen level.
    pub fn level(&self) -> Option<RegionLevel> {
        self.path().map(|path| path.level())
    }

    /// Chosen names joined with spaces.
    pub fn label(&self) -> Option<String> {
        self.path().map(|path| path.label())
    }

    /// Query button text.
    pub fn button_text(&self) -> String {
        match self.label() {
            Some(label) => format!("{label} 조회"),
            None => "조회".to_string(),
        }
    }

    /// Region selection for the current choice.
    pub fn selection(&self) -> Result<Selection, SelectionError> {
        let path = self.path().ok_or(SelectionError::NoProvince)?;
        Ok(Selection::Region { path })
    }
}
