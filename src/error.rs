use std::path::PathBuf;

use crate::gaps::Gap;

/// Result type for the pure planning core and the timestamp persistence layer
pub type CoreResult<T> = std::result::Result<T, PausecutError>;

/// Error types for the planning core
///
/// The core is deterministic, so none of these are retryable: the caller
/// either fixes its input (re-transcribe, delete the timestamp file, change
/// the threshold) or gives up.
#[derive(thiserror::Error, Debug)]
pub enum PausecutError {
    /// Word data violates ordering/bounds invariants beyond automatic repair
    #[error("malformed transcript: {0}")]
    MalformedTranscript(String),

    /// Persisted timestamp document failed structural validation
    #[error("invalid timestamp file {}: {reason}", path.display())]
    InvalidTimestampFile { path: PathBuf, reason: String },

    /// A tunable was rejected at entry (e.g. non-positive max_gap)
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The planned keep set is empty; the whole video would be discarded.
    /// Carries the detected gaps so the caller can report what was cut.
    #[error("no content remaining: all {} detected gap(s) cover the entire video", gaps.len())]
    NoContentRemaining { gaps: Vec<Gap> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
