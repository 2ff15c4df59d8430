//! GeoPackage container reader
//!
//! This crate opens GeoPackage (SQLite) containers from in-memory byte
//! payloads, enumerates their layers and loads layer records together with
//! decoded geometry blob headers.

pub mod geometry;
pub mod magic;
pub mod reader;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use geometry::{Envelope, GeometryHeader};
pub use reader::GeoPackageReader;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GpkgError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Not a SQLite database ({0} bytes, missing 'SQLite format 3' header)")]
    NotSqlite(usize),

    #[error("Missing table: {0}")]
    MissingTable(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
}

pub type GpkgResult<T> = Result<T, GpkgError>;

/// Capability to open a geospatial container held in memory
pub trait ContainerReader: Send + Sync {
    /// Open the container backed by `payload`
    fn open(&self, payload: &[u8]) -> GpkgResult<Box<dyn Container>>;

    /// Human-readable format name
    fn format_name(&self) -> &'static str;
}

/// An opened container
pub trait Container {
    /// Enumerate layers in container order
    fn layers(&self) -> GpkgResult<Vec<LayerInfo>>;

    /// Load every record of a layer
    fn read_layer(&self, layer: &LayerInfo) -> GpkgResult<LayerRecords>;
}

/// Kind of content a layer holds, as declared in `gpkg_contents`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerKind {
    Features,
    Attributes,
}

impl LayerKind {
    pub fn from_data_type(data_type: &str) -> Option<Self> {
        match data_type {
            "features" => Some(LayerKind::Features),
            "attributes" => Some(LayerKind::Attributes),
            _ => None,
        }
    }
}

/// Layer metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerInfo {
    pub name: String,
    pub kind: LayerKind,
    pub geometry_column: Option<String>,
    pub geometry_type: Option<String>,
}

impl LayerInfo {
    pub fn features(name: impl Into<String>, geometry_column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: LayerKind::Features,
            geometry_column: Some(geometry_column.into()),
            geometry_type: None,
        }
    }

    pub fn attributes(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: LayerKind::Attributes,
            geometry_column: None,
            geometry_type: None,
        }
    }
}

/// A single record: identifier plus decoded geometry header
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub id: i64,
    /// `None` when the geometry value is SQL NULL
    pub geometry: Option<GeometryHeader>,
}

/// All records loaded from one layer
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRecords {
    pub layer_name: String,
    pub geometry_column: Option<String>,
    pub attribute_columns: Vec<String>,
    pub records: Vec<FeatureRecord>,
}

impl LayerRecords {
    /// True when the layer has a geometry column with at least one non-null value
    pub fn has_geometry(&self) -> bool {
        self.geometry_column.is_some() && self.records.iter().any(|r| r.geometry.is_some())
    }

    /// Keep only the first `limit` records
    pub fn truncate(&mut self, limit: usize) {
        self.records.truncate(limit);
    }

    /// Record identifiers in encounter order
    pub fn identifiers(&self) -> Vec<i64> {
        self.records.iter().map(|r| r.id).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
