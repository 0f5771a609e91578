//! Structured error types for gridgeom.
//!
//! Snapshot validation failures are reported as errors so callers can
//! reject the update and keep the previous geometry; they are never panics.

/// All errors that can occur while loading or querying grid geometry.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    /// Malformed run-length encoding for a sizes list.
    #[error("invalid run encoding: {0}")]
    RunEncoding(String),

    /// Malformed boolean run-length encoding (hidden/filtered flags).
    #[error("invalid flag encoding: {0}")]
    FlagEncoding(String),

    /// Malformed outline (group) encoding.
    #[error("invalid outline encoding: {0}")]
    OutlineEncoding(String),

    /// Snapshot rejected before any state was committed.
    #[error("snapshot rejected: {0}")]
    Snapshot(String),

    /// Two run lists that must share an index domain do not.
    #[error("domain mismatch: one list ends at {left}, the other at {right}")]
    DomainMismatch { left: i64, right: i64 },

    /// JSON transport error from serde_json.
    #[error("JSON parsing: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GeometryError>;
