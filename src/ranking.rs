use std::sync::Arc;

/// One entry of the ranking returned by the similarity service.
///
/// The ordering is the server's (descending similarity); the client carries
/// it through untouched and never re-sorts. `id` is unique within a single
/// response and doubles as the display name; `source_locator` is whatever
/// key the service wants back when audio is fetched for this entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchEntry {
    pub id: String,
    /// Similarity in 0..1, higher = more similar
    pub score: f32,
    pub source_locator: String,
}

/// Resolved audio for one ranking entry. Shared cheaply between the result
/// store, the playback thread, and export; the bytes live until the last
/// holder drops them (new search, shutdown).
#[derive(Debug, Clone)]
pub struct AudioHandle {
    pub bytes: Arc<Vec<u8>>,
    pub mime: String,
}

impl AudioHandle {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes: Arc::new(bytes),
            mime: mime.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A ranking entry that has been materialized with playable audio.
/// Only entries inside a fetched page window ever get one of these.
#[derive(Debug, Clone)]
pub struct MaterializedResult {
    pub entry: MatchEntry,
    pub audio: AudioHandle,
}

impl MaterializedResult {
    pub fn new(entry: MatchEntry, audio: AudioHandle) -> Self {
        Self { entry, audio }
    }
}

/// Health report from the remote service
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(default)]
    pub reference_files: usize,
    #[serde(default)]
    pub timestamp: Option<String>,
}
