//! Error types shared by the resolution pipeline.

use thiserror::Error;

/// Errors that abort a resolution.
///
/// An empty upstream answer is not an error: it is reported as `None` by the
/// feature client and the ranker.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported spatial reference: {wkid}")]
    UnsupportedReference { wkid: u32 },

    #[error("projection failed: {0}")]
    Projection(String),

    #[error("feature service {url} unavailable: {reason}")]
    UpstreamUnavailable { url: String, reason: String },

    #[error("malformed feature: {0}")]
    MalformedFeature(String),

    #[error("buffer distance must be a positive number of meters, got {0}")]
    InvalidBuffer(f64),

    #[error("invalid bounding box: {0}")]
    InvalidBoundingBox(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why a best-effort attribute lookup produced no value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Unknown {
    /// The attribute service faulted; the reason is kept for logging.
    #[error("service unavailable: {0}")]
    Unavailable(String),
    /// The service answered with no features at all.
    #[error("no candidates returned")]
    NoCandidates,
    /// Features came back but none matched the street by name.
    #[error("no candidate matched by name")]
    NoMatch,
    /// The winning candidate lacked the requested field.
    #[error("matched candidate lacks the field")]
    MissingField,
    /// No query geometry could be built from the street.
    #[error("no query geometry: {0}")]
    Geometry(String),
}

/// Outcome of a derived-attribute lookup.
pub type AttributeResult<T> = std::result::Result<T, Unknown>;
