//! Error taxonomy for crosswalk construction.

use thiserror::Error;

use crate::types::ZoneId;

/// Every fatal condition the pipeline can hit. None of these are recovered from:
/// a run either produces a complete crosswalk or nothing.
#[derive(Debug, Error)]
pub enum CrosswalkError {
    /// No column of the layer matched any of the accepted aliases.
    #[error("[{layer}] no column matches {field} aliases {aliases:?} (columns: {columns:?})")]
    IdentifierNotFound {
        layer: String,
        field: &'static str,
        aliases: Vec<String>,
        columns: Vec<String>,
    },

    /// A detected identifier column is empty for some row.
    #[error("[{layer}] row {row} has no value in column {column:?}")]
    MissingAttribute { layer: String, column: String, row: usize },

    /// Coordinate reference systems could not be determined or reconciled.
    #[error("[{layer}] projection error: {reason}")]
    Projection { layer: String, reason: String },

    /// An invalid polygon was encountered; geometries are never repaired.
    #[error("invalid geometry for {zone}: {reason}")]
    Geometry { zone: String, reason: String },

    /// A resolved coarse zone has no entry in the region reference table.
    #[error("coarse zone {coarse_id} has no region mapping for key {key:?}")]
    UnknownRegion { coarse_id: ZoneId, key: String },

    /// Post-assembly invariant violation; nothing is written.
    #[error("incomplete coverage at {zone}: {reason}")]
    IncompleteCoverage { zone: String, reason: String },

    /// Tie resolution failed to produce a single winner. Indicates a logic defect.
    #[error("ambiguous assignment for medium zone {medium_id}: candidates {candidates:?}")]
    AmbiguousAssignment { medium_id: ZoneId, candidates: Vec<ZoneId> },

    /// The fallback policy forbids nearest-zone assignment and no candidate survived.
    #[error("medium zone {medium_id} overlaps no coarse zone and fallback is disabled")]
    NoCandidate { medium_id: ZoneId },

    /// Invalid configuration or reference table contents.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("shapefile error: {0}")]
    Shapefile(#[from] shapefile::Error),

    #[error("table error: {0}")]
    Table(#[from] polars::error::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CrosswalkError {
    /// Creates a geometry error for a named zone.
    pub fn geometry(zone: impl ToString, reason: impl Into<String>) -> Self {
        Self::Geometry { zone: zone.to_string(), reason: reason.into() }
    }

    /// Creates a projection error for a named layer.
    pub fn projection(layer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Projection { layer: layer.into(), reason: reason.into() }
    }

    /// Creates a coverage error for a named zone.
    pub fn coverage(zone: impl ToString, reason: impl Into<String>) -> Self {
        Self::IncompleteCoverage { zone: zone.to_string(), reason: reason.into() }
    }
}

pub type Result<T, E = CrosswalkError> = std::result::Result<T, E>;
