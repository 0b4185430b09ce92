use thiserror::Error;

/// Unified error type for everything between the microphone and the result
/// list. Variants map to the distinct ways a search can fail as seen by the
/// user; transport and decode failures keep the underlying message for the
/// console.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The platform refused microphone access
    #[error("microphone permission denied")]
    PermissionDenied,

    /// No usable input/output device, or the device rejected our stream
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A search was attempted with no recorded or loaded audio
    #[error("no audio to search with")]
    EmptyInput,

    /// Network failure or a non-success status from the service
    #[error("transport error: {0}")]
    TransportError(String),

    /// The response matched none of the known service variants
    #[error("failed to decode search response: {0}")]
    DecodeError(String),

    /// Page fetch requested past the end of the ranking
    #[error("page start {cursor} is past the end of the ranking ({len} entries)")]
    OutOfRange { cursor: usize, len: usize },

    /// A file handed to the ingest path failed validation
    #[error("invalid input file: {0}")]
    InvalidInput(String),

    /// Local file I/O failed (ingest read, export write)
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::TransportError(err.to_string())
    }
}
