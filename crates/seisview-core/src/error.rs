//! Error types for seisview.

use thiserror::Error;

use crate::axis::Axis;

/// The main error type for seisview operations.
#[derive(Error, Debug)]
pub enum SeisviewError {
    /// An index along an axis fell outside the volume.
    ///
    /// Slicing APIs clamp instead of returning this; only strict accessors surface it.
    #[error("index {index} out of range for axis {axis} (length {len})")]
    OutOfRangeIndex { axis: Axis, index: i64, len: usize },

    /// Reading from the backing storage failed.
    #[error("storage I/O error: {0}")]
    StorageIo(#[from] std::io::Error),

    /// A pick id was decoded that has no live owner.
    #[error("pick id {0} has no live entity")]
    StalePickId(u32),

    /// A pick id was registered twice while still alive.
    #[error("pick id {0} is already registered")]
    DuplicatePickId(u32),

    /// Every encodable pick id is in use.
    #[error("pick id space exhausted")]
    PickIdSpaceExhausted,

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rendering error.
    #[error("render error: {0}")]
    Render(String),
}

/// A specialized Result type for seisview operations.
pub type Result<T> = std::result::Result<T, SeisviewError>;
