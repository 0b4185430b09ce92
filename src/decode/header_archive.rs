//! Header + archive variant: the ranking rides base64-encoded in the
//! `X-Rankings-Data` response header while the body is a gzipped tar archive
//! holding one audio file per ranking entry, keyed by entry filename. This
//! is the only variant that ships audio inline with the search reply.

use std::collections::HashMap;
use std::io::Read;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::read::GzDecoder;

use super::{plain_json, DecodedSearch, ResponseVariant};
use crate::error::SearchError;

pub fn decode(header: &str, body: &[u8]) -> Result<DecodedSearch, SearchError> {
    let ranking_json = BASE64
        .decode(header)
        .map_err(|e| SearchError::DecodeError(format!("rankings header is not base64: {}", e)))?;

    let value: serde_json::Value = serde_json::from_slice(&ranking_json).map_err(|e| {
        SearchError::DecodeError(format!("rankings header is not valid JSON: {}", e))
    })?;
    let ranking = plain_json::decode(value)?;

    let inline_audio = unpack_archive(body)?;

    Ok(DecodedSearch {
        variant: ResponseVariant::HeaderArchive,
        ranking,
        inline_audio: Some(inline_audio),
    })
}

/// Unpack the gzipped tar body into a filename -> bytes map. Entry paths are
/// flattened to their final component so archives with a wrapping directory
/// still key by the ranking's filenames.
fn unpack_archive(body: &[u8]) -> Result<HashMap<String, Vec<u8>>, SearchError> {
    let mut archive = tar::Archive::new(GzDecoder::new(body));
    let mut files = HashMap::new();

    let entries = archive
        .entries()
        .map_err(|e| SearchError::DecodeError(format!("response body is not a tar archive: {}", e)))?;

    for entry in entries {
        let mut entry =
            entry.map_err(|e| SearchError::DecodeError(format!("corrupt archive entry: {}", e)))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let name = entry
            .path()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()));
        let Some(name) = name else { continue };

        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| SearchError::DecodeError(format!("failed to read '{}': {}", name, e)))?;
        files.insert(name, bytes);
    }

    Ok(files)
}
