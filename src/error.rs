use thiserror::Error;

use crate::engine::EngineError;

/// Convenient result alias for the routing core.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when the analyzer has no sampled points to score.
    #[error("cannot analyze an empty path")]
    EmptyPath,

    /// Raised when the initial direct route request fails.
    #[error("routing engine unavailable: {source}")]
    RoutingEngineUnavailable {
        #[source]
        source: EngineError,
    },

    /// Raised when a zone record cannot be turned into a catalog entry.
    #[error("invalid safety zone {name}: {reason}")]
    InvalidZone { name: String, reason: String },

    /// Raised when a coordinate is non-finite or out of range.
    #[error("invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate { lat: f64, lng: f64 },

    /// Wrapper for zone data decoding errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
