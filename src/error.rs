use std::io;

/// A score event payload that could not be turned into a [`ScoreEvent`].
///
/// Decode failures are never fatal: the ingest loop logs them, counts them,
/// and moves on to the next message without touching either store.
///
/// [`ScoreEvent`]: crate::ScoreEvent
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The payload was empty or whitespace only.
    #[error("empty score event payload")]
    Empty,

    /// The payload was not a JSON object with `studentId`, `exam` and `score`.
    #[error("malformed score event: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors surfaced by the stores, the query service and the ingest loop.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// No event has ever referenced this student.
    #[error("student '{0}' not found")]
    StudentNotFound(String),

    /// No event has ever referenced this exam (or the id is not an integer).
    #[error("exam '{0}' not found")]
    ExamNotFound(String),

    /// The event source has ended. The ingest loop treats this as a clean stop.
    #[error("upstream event source closed")]
    UpstreamClosed,

    #[error("event source read failed: {0}")]
    Io(#[from] io::Error),

    #[error("serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Returns `true` for the query-miss variants.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::StudentNotFound(_) | Error::ExamNotFound(_))
    }
}
