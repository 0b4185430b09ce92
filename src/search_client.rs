use std::collections::HashMap;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};

use crate::clip::{mime_for_name, QueryClip};
use crate::config::{SearchConfig, ServiceConfig};
use crate::decode::{decode_search, ResponseVariant, RANKINGS_HEADER};
use crate::error::SearchError;
use crate::ranking::{AudioHandle, MatchEntry, MaterializedResult, ServiceHealth};

/// What one successful search produced: the full ranking (metadata only) and
/// the first page already materialized with playable audio, so the result
/// list never shows rows that cannot be played.
pub struct SearchOutcome {
    pub variant: ResponseVariant,
    pub ranking: Vec<MatchEntry>,
    pub first_page: Vec<MaterializedResult>,
}

/// Stateless HTTP client against the similarity service. Safe to share and
/// re-enter; single-flight policy is the caller's concern, not this one's.
pub struct SearchClient {
    http: reqwest::Client,
    base_url: String,
    page_size: usize,
    upload_field: String,
}

impl SearchClient {
    pub fn new(service: &ServiceConfig, search: &SearchConfig) -> Result<Self, SearchError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(service.connect_timeout_secs))
            .timeout(Duration::from_secs(service.request_timeout_secs))
            .build()
            .map_err(|e| SearchError::TransportError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: service.base_url.trim_end_matches('/').to_string(),
            page_size: search.page_size,
            upload_field: search.upload_field.clone(),
        })
    }

    /// Upload the clip and decode the ranked response, whichever shape the
    /// deployment speaks. The ranking comes back in the server's order and
    /// the first `page_size` entries arrive with resolved audio.
    pub async fn search(&self, clip: &QueryClip) -> Result<SearchOutcome, SearchError> {
        if clip.is_empty() {
            return Err(SearchError::EmptyInput);
        }

        let part = Part::bytes(clip.bytes.clone())
            .file_name(clip.filename.clone())
            .mime_str(&clip.mime)
            .map_err(|e| SearchError::InvalidInput(format!("bad clip MIME type: {}", e)))?;
        let form = Form::new().part(self.upload_field.clone(), part);

        let response = self
            .http
            .post(format!("{}/search", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::TransportError(format!(
                "search returned status {}",
                status
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let rankings_header = response
            .headers()
            .get(RANKINGS_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = read_body(response).await?;
        let decoded = decode_search(&content_type, rankings_header.as_deref(), &body)?;

        let first_page = if decoded.ranking.is_empty() {
            Vec::new()
        } else {
            let window = page_window(&decoded.ranking, 0, self.page_size)?;
            match &decoded.inline_audio {
                Some(files) => materialize_from_archive(window, files)?,
                None => self.materialize_from_batch(window).await?,
            }
        };

        Ok(SearchOutcome {
            variant: decoded.variant,
            ranking: decoded.ranking,
            first_page,
        })
    }

    /// Materialize `ranking[cursor..cursor+page_size)` with playable audio,
    /// in one batched retrieval. Idempotent for identical arguments: the
    /// same entries come back, with freshly resolved handles.
    pub async fn fetch_page(
        &self,
        ranking: &[MatchEntry],
        cursor: usize,
        page_size: usize,
    ) -> Result<Vec<MaterializedResult>, SearchError> {
        let window = page_window(ranking, cursor, page_size)?;
        self.materialize_from_batch(window).await
    }

    /// Probe the service; failures surface as transport errors
    pub async fn health(&self) -> Result<ServiceHealth, SearchError> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::TransportError(format!(
                "health check returned status {}",
                status
            )));
        }

        response
            .json::<ServiceHealth>()
            .await
            .map_err(|e| SearchError::DecodeError(format!("malformed health response: {}", e)))
    }

    async fn materialize_from_batch(
        &self,
        window: &[MatchEntry],
    ) -> Result<Vec<MaterializedResult>, SearchError> {
        let locators: Vec<&str> = window.iter().map(|e| e.source_locator.as_str()).collect();
        let buffers = self.fetch_audio_batch(&locators).await?;
        align_batch(window, buffers)
    }

    /// Batch audio retrieval: one GET with the comma-joined locator list,
    /// answered by an ordered JSON array of byte buffers positionally
    /// aligned with the request.
    async fn fetch_audio_batch(&self, locators: &[&str]) -> Result<Vec<Vec<u8>>, SearchError> {
        let response = self
            .http
            .get(format!("{}/fetch_audio", self.base_url))
            .query(&[("filepaths", locators.join(","))])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::TransportError(format!(
                "audio fetch returned status {}",
                status
            )));
        }

        response
            .json::<Vec<Vec<u8>>>()
            .await
            .map_err(|e| SearchError::DecodeError(format!("malformed audio batch: {}", e)))
    }
}

/// The page window `ranking[cursor..cursor+page_size)`, clamped at the tail.
/// A cursor at or past the end is the caller's bug surfaced as `OutOfRange`;
/// the pagination control is supposed to be disabled there.
pub fn page_window(
    ranking: &[MatchEntry],
    cursor: usize,
    page_size: usize,
) -> Result<&[MatchEntry], SearchError> {
    if cursor >= ranking.len() {
        return Err(SearchError::OutOfRange {
            cursor,
            len: ranking.len(),
        });
    }
    let end = (cursor + page_size).min(ranking.len());
    Ok(&ranking[cursor..end])
}

/// Pair each window entry with its positionally aligned buffer
fn align_batch(
    window: &[MatchEntry],
    buffers: Vec<Vec<u8>>,
) -> Result<Vec<MaterializedResult>, SearchError> {
    if buffers.len() != window.len() {
        return Err(SearchError::DecodeError(format!(
            "audio batch returned {} buffers for {} entries",
            buffers.len(),
            window.len()
        )));
    }

    Ok(window
        .iter()
        .zip(buffers)
        .map(|(entry, bytes)| {
            let mime = mime_for_name(&entry.source_locator);
            MaterializedResult::new(entry.clone(), AudioHandle::new(bytes, mime))
        })
        .collect())
}

/// Resolve window audio from an unpacked archive, keyed by entry id with the
/// locator's final path component as fallback
fn materialize_from_archive(
    window: &[MatchEntry],
    files: &HashMap<String, Vec<u8>>,
) -> Result<Vec<MaterializedResult>, SearchError> {
    window
        .iter()
        .map(|entry| {
            let bytes = files.get(&entry.id).or_else(|| {
                let basename = entry.source_locator.rsplit('/').next()?;
                files.get(basename)
            });
            match bytes {
                Some(bytes) => {
                    let mime = mime_for_name(&entry.id);
                    Ok(MaterializedResult::new(
                        entry.clone(),
                        AudioHandle::new(bytes.clone(), mime),
                    ))
                }
                None => Err(SearchError::DecodeError(format!(
                    "archive is missing audio for '{}'",
                    entry.id
                ))),
            }
        })
        .collect()
}

async fn read_body(response: reqwest::Response) -> Result<Vec<u8>, SearchError> {
    let mut stream = response.bytes_stream();
    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| SearchError::TransportError(e.to_string()))?;
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SearchConfig, ServiceConfig};

    #[tokio::test]
    async fn searching_with_an_empty_clip_fails_before_any_request() {
        let client = SearchClient::new(&ServiceConfig::default(), &SearchConfig::default()).unwrap();
        let clip = QueryClip::new(Vec::new(), "audio/wav", "user_input.wav");
        assert!(matches!(
            client.search(&clip).await,
            Err(SearchError::EmptyInput)
        ));
    }

    fn ranking(n: usize) -> Vec<MatchEntry> {
        (0..n)
            .map(|i| MatchEntry {
                id: format!("sound_{i}.ogg"),
                score: 1.0 - i as f32 * 0.03,
                source_locator: format!("library/sound_{i}.ogg"),
            })
            .collect()
    }

    #[test]
    fn page_window_walks_25_entries_in_pages_of_10() {
        let full = ranking(25);
        assert_eq!(page_window(&full, 0, 10).unwrap().len(), 10);
        assert_eq!(page_window(&full, 10, 10).unwrap().len(), 10);

        let tail = page_window(&full, 20, 10).unwrap();
        assert_eq!(tail.len(), 5);
        assert_eq!(tail[0].id, "sound_20.ogg");

        assert!(matches!(
            page_window(&full, 25, 10),
            Err(SearchError::OutOfRange { cursor: 25, len: 25 })
        ));
    }

    #[test]
    fn page_window_is_deterministic_for_identical_arguments() {
        let full = ranking(12);
        let first = page_window(&full, 4, 4).unwrap();
        let second = page_window(&full, 4, 4).unwrap();
        let ids = |w: &[MatchEntry]| w.iter().map(|e| (e.id.clone(), e.score)).collect::<Vec<_>>();
        assert_eq!(ids(first), ids(second));
    }

    #[test]
    fn empty_ranking_is_out_of_range_at_cursor_zero() {
        assert!(matches!(
            page_window(&[], 0, 10),
            Err(SearchError::OutOfRange { cursor: 0, len: 0 })
        ));
    }

    #[test]
    fn align_batch_pairs_positionally() {
        let full = ranking(3);
        let buffers = vec![vec![1], vec![2], vec![3]];
        let materialized = align_batch(&full, buffers).unwrap();
        assert_eq!(materialized.len(), 3);
        assert_eq!(*materialized[1].audio.bytes, vec![2]);
        assert_eq!(materialized[1].entry.id, "sound_1.ogg");
        assert_eq!(materialized[0].audio.mime, "audio/ogg");
    }

    #[test]
    fn align_batch_rejects_count_mismatch() {
        let full = ranking(3);
        let buffers = vec![vec![1], vec![2]];
        assert!(matches!(
            align_batch(&full, buffers),
            Err(SearchError::DecodeError(_))
        ));
    }

    #[test]
    fn archive_materialization_falls_back_to_locator_basename() {
        let full = ranking(2);
        let mut files = HashMap::new();
        files.insert("sound_0.ogg".to_string(), vec![10]);
        // Keyed by basename of the locator rather than the id
        files.insert("sound_1.ogg".to_string(), vec![20]);

        let materialized = materialize_from_archive(&full, &files).unwrap();
        assert_eq!(*materialized[0].audio.bytes, vec![10]);
        assert_eq!(*materialized[1].audio.bytes, vec![20]);
    }

    #[test]
    fn archive_materialization_reports_missing_audio() {
        let full = ranking(2);
        let mut files = HashMap::new();
        files.insert("sound_0.ogg".to_string(), vec![10]);

        assert!(matches!(
            materialize_from_archive(&full, &files),
            Err(SearchError::DecodeError(_))
        ));
    }
}
