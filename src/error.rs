//! Error types for microstructure generation and modification

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while generating, persisting or modifying a microstructure
#[derive(Debug, Error)]
pub enum MicrostructureError {
    /// A parameter was rejected before any computation ran
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter
        name: &'static str,
        /// What was wrong with it, including the rejected value
        reason: String,
    },

    /// The Delaunay/Voronoi construction rejected its input
    #[error("tessellation failed: {0}")]
    Tessellation(String),

    /// No snapshot exists at the given path
    #[error("snapshot not found: {}", path.display())]
    SnapshotNotFound { path: PathBuf },

    /// Reading or writing the snapshot file failed
    #[error("snapshot i/o failed for {}: {source}", path.display())]
    SnapshotIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot file is not valid JSON or misses required fields
    #[error("malformed snapshot {}: {source}", path.display())]
    SnapshotParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The snapshot could not be rendered as JSON
    #[error("snapshot could not be encoded: {0}")]
    SnapshotEncode(#[source] serde_json::Error),

    /// The snapshot was written by an incompatible schema version
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedSnapshotVersion { found: u32, expected: u32 },

    /// The snapshot parsed but its contents contradict each other
    #[error("inconsistent snapshot: {0}")]
    InconsistentSnapshot(String),
}

impl MicrostructureError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        MicrostructureError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Result type alias for microstructure operations
pub type Result<T> = std::result::Result<T, MicrostructureError>;
