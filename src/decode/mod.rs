//! Search-response decoding
//!
//! The similarity service has shipped three incompatible response shapes
//! across deployments, with no version negotiation. This module unifies them
//! behind a single decoding interface with one implementation per variant,
//! selected by inspecting the response headers and content type:
//!
//! - plain JSON: the ranking is carried directly in the body
//! - header + archive: a base64 JSON ranking rides in a response header and
//!   the body is a compressed archive of per-entry audio files
//! - matches: a vector-store shape (`matches` / `metadata.file_path`) that
//!   needs field renaming into [`MatchEntry`]
//!
//! Sniffing between variants is local recovery, never an error; only a body
//! that matches none of them surfaces as [`SearchError::DecodeError`].

pub mod header_archive;
pub mod matches;
pub mod plain_json;

use std::collections::HashMap;
use std::fmt;

use crate::error::SearchError;
use crate::ranking::MatchEntry;

/// Response header carrying the base64-encoded ranking in the archive variant
pub const RANKINGS_HEADER: &str = "X-Rankings-Data";

/// Which service response shape a search reply was decoded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseVariant {
    /// Ranking JSON directly in the body
    PlainJson,
    /// Ranking in a response header, per-entry audio archived in the body
    HeaderArchive,
    /// Vector-store `matches` shape requiring field renaming
    Matches,
}

impl fmt::Display for ResponseVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseVariant::PlainJson => write!(f, "plain_json"),
            ResponseVariant::HeaderArchive => write!(f, "header_archive"),
            ResponseVariant::Matches => write!(f, "matches"),
        }
    }
}

/// Outcome of decoding one search response, independent of variant.
///
/// `inline_audio` is populated only by the archive variant; the other two
/// leave it `None` and audio is resolved through the batch endpoint.
#[derive(Debug)]
pub struct DecodedSearch {
    pub variant: ResponseVariant,
    pub ranking: Vec<MatchEntry>,
    pub inline_audio: Option<HashMap<String, Vec<u8>>>,
}

/// Decode a search response into a ranking, picking the variant from the
/// response metadata. The ranking comes back in server order; callers must
/// not re-sort it.
pub fn decode_search(
    content_type: &str,
    rankings_header: Option<&str>,
    body: &[u8],
) -> Result<DecodedSearch, SearchError> {
    if let Some(header) = rankings_header {
        return header_archive::decode(header, body);
    }

    let looks_like_json =
        content_type.contains("json") || body.first().is_some_and(|b| *b == b'{');
    if !looks_like_json {
        return Err(SearchError::DecodeError(format!(
            "unrecognized response (content type '{}', no {} header)",
            content_type, RANKINGS_HEADER
        )));
    }

    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| SearchError::DecodeError(format!("response is not valid JSON: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| SearchError::DecodeError("response JSON is not an object".to_string()))?;

    if object.contains_key("matches") {
        let ranking = matches::decode(value)?;
        Ok(DecodedSearch {
            variant: ResponseVariant::Matches,
            ranking,
            inline_audio: None,
        })
    } else if object.contains_key("ranked_sounds") || object.contains_key("ranking") {
        let ranking = plain_json::decode(value)?;
        Ok(DecodedSearch {
            variant: ResponseVariant::PlainJson,
            ranking,
            inline_audio: None,
        })
    } else {
        Err(SearchError::DecodeError(
            "response JSON carries neither a ranking nor matches".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_body_selects_plain_decoder() {
        let body = br#"{"ranked_sounds": [{"filename": "kick.ogg", "similarity": 0.9}]}"#;
        let decoded = decode_search("application/json", None, body).unwrap();
        assert_eq!(decoded.variant, ResponseVariant::PlainJson);
        assert_eq!(decoded.ranking.len(), 1);
        assert!(decoded.inline_audio.is_none());
    }

    #[test]
    fn matches_shape_selects_matches_decoder() {
        let body = br#"{"matches": [{"id": "m1", "score": 0.8, "metadata": {"file_path": "lib/m1.ogg"}}]}"#;
        let decoded = decode_search("application/json", None, body).unwrap();
        assert_eq!(decoded.variant, ResponseVariant::Matches);
        assert_eq!(decoded.ranking[0].source_locator, "lib/m1.ogg");
    }

    #[test]
    fn json_without_content_type_is_still_sniffed() {
        let body = br#"{"ranking": [{"filename": "a.ogg", "similarity": 0.5}]}"#;
        let decoded = decode_search("application/octet-stream", None, body).unwrap();
        assert_eq!(decoded.variant, ResponseVariant::PlainJson);
    }

    #[test]
    fn unknown_shape_is_a_decode_error() {
        let body = br#"{"error": "no reference files initialized"}"#;
        let err = decode_search("application/json", None, body).unwrap_err();
        assert!(matches!(err, SearchError::DecodeError(_)));
    }

    #[test]
    fn non_json_without_header_is_a_decode_error() {
        let err = decode_search("application/gzip", None, &[0x1f, 0x8b, 0x08]).unwrap_err();
        assert!(matches!(err, SearchError::DecodeError(_)));
    }
}
