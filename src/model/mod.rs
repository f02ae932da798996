//! Data models for the selection core.

mod age;
mod boundary;
mod selection;

pub use age::{AgeBucket, AgeDistribution, AgeEntry};
pub use boundary::{BoundaryGeometry, GeometryKind};
pub use selection::{
    DrawingMode, RegionLevel, RegionPath, Selection, SelectionError, SelectionMode,
};
