//! Typed errors for dataset loading, queries, and per-geometry checks.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced to callers of the resolver.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// Non-finite or out-of-range coordinates, a missing subject, a bad radius
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The neighborhood dataset could not be read or decoded
    #[error("neighborhood dataset unavailable: {0}")]
    DataUnavailable(#[from] DatasetError),
}

/// Reasons the neighborhood dataset could not be produced.
///
/// Any of these means no neighborhoods are served at all; a partial set
/// would make containment queries silently wrong.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Source file missing or unreadable
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source is not a GeoJSON FeatureCollection
    #[error("failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),

    /// Feature has neither a code nor a name property
    #[error("feature {index} has no code or name property")]
    MissingIdentity { index: usize },

    /// Feature has no geometry
    #[error("feature {index} has no geometry")]
    MissingGeometry { index: usize },

    /// Feature geometry is not a Polygon or MultiPolygon
    #[error("feature {index} has unsupported geometry type {kind}")]
    UnsupportedGeometry { index: usize, kind: String },

    /// A position with fewer than two ordinates
    #[error("feature {index} has a position with fewer than two ordinates")]
    InvalidPosition { index: usize },

    /// Two features share one code
    #[error("duplicate neighborhood code: {0}")]
    DuplicateCode(String),

    /// Collection decoded but holds no features
    #[error("dataset contains no neighborhoods")]
    Empty,
}

/// A geometric test could not be evaluated for one neighborhood.
///
/// Never fatal: the test is skipped for that neighborhood only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("{code}: geometry is empty")]
    Empty { code: String },

    #[error("{code}: ring has {len} positions, need at least 4")]
    DegenerateRing { code: String, len: usize },

    #[error("{code}: geometry has non-finite coordinates")]
    NonFinite { code: String },

    #[error("{code}: polygon has zero area")]
    ZeroArea { code: String },

    #[error("{code}: centroid could not be computed")]
    NoCentroid { code: String },

    #[error("{code}: buffer produced no polygons")]
    BufferCollapsed { code: String },
}

/// Result type alias for resolver operations.
pub type ResolverResult<T> = std::result::Result<T, ResolverError>;

/// Result type alias for per-geometry checks.
pub type GeometryResult<T> = std::result::Result<T, GeometryError>;
