//! Plain JSON ranking variant: the body carries the ranking directly, under
//! either the `ranked_sounds` or the older `ranking` key. Audio for these
//! entries is resolved separately through the batch endpoint.

use serde::Deserialize;

use crate::error::SearchError;
use crate::ranking::MatchEntry;

#[derive(Debug, Deserialize)]
struct RankedSound {
    filename: String,
    similarity: f32,
}

#[derive(Debug, Deserialize)]
struct RankingBody {
    #[serde(alias = "ranking")]
    ranked_sounds: Vec<RankedSound>,
}

/// Decode a `ranked_sounds`/`ranking` body into match entries, preserving
/// server order. The filename is both the display id and the locator the
/// batch audio endpoint accepts.
pub fn decode(value: serde_json::Value) -> Result<Vec<MatchEntry>, SearchError> {
    let body: RankingBody = serde_json::from_value(value)
        .map_err(|e| SearchError::DecodeError(format!("malformed ranking body: {}", e)))?;

    Ok(body
        .ranked_sounds
        .into_iter()
        .map(|sound| MatchEntry {
            id: sound.filename.clone(),
            score: sound.similarity,
            source_locator: sound.filename,
        })
        .collect())
}
