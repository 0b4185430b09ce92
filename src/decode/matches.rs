//! Vector-store variant: the service fronts a vector database and returns
//! `{ matches: [{ id, score, metadata: { file_path } }] }`. Field names are
//! remapped into [`MatchEntry`]; audio is resolved through the batch
//! endpoint keyed by `metadata.file_path`.

use serde::Deserialize;

use crate::error::SearchError;
use crate::ranking::MatchEntry;

#[derive(Debug, Deserialize)]
struct MatchMetadata {
    file_path: String,
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    id: String,
    score: f32,
    metadata: MatchMetadata,
}

#[derive(Debug, Deserialize)]
struct MatchesBody {
    matches: Vec<RawMatch>,
}

pub fn decode(value: serde_json::Value) -> Result<Vec<MatchEntry>, SearchError> {
    let body: MatchesBody = serde_json::from_value(value)
        .map_err(|e| SearchError::DecodeError(format!("malformed matches body: {}", e)))?;

    Ok(body
        .matches
        .into_iter()
        .map(|m| MatchEntry {
            id: m.id,
            score: m.score,
            source_locator: m.metadata.file_path,
        })
        .collect())
}
