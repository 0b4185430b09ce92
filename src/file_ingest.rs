use std::fs;
use std::path::Path;

use crate::clip::{mime_for_name, QueryClip};
use crate::error::SearchError;

/// Upper bound on uploads, mirroring the service's own validation
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// File extensions the service accepts
const ALLOWED_EXTENSIONS: [&str; 3] = ["ogg", "wav", "mp3"];

/// Load an audio file from disk as the query clip, the alternate input path
/// next to microphone capture. Validation mirrors what the service enforces
/// on its side so obviously doomed uploads fail locally.
pub fn load_clip(path: impl AsRef<Path>) -> Result<QueryClip, SearchError> {
    let path = path.as_ref();

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| SearchError::InvalidInput(format!("{} has no filename", path.display())))?;

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(SearchError::InvalidInput(format!(
            "'{}' is not a supported audio format (expected .ogg, .wav or .mp3)",
            filename
        )));
    }

    let metadata = fs::metadata(path).map_err(|e| {
        SearchError::InvalidInput(format!("cannot read {}: {}", path.display(), e))
    })?;
    if metadata.len() > MAX_UPLOAD_BYTES {
        return Err(SearchError::InvalidInput(format!(
            "'{}' is {} bytes, over the {} byte upload limit",
            filename,
            metadata.len(),
            MAX_UPLOAD_BYTES
        )));
    }

    let bytes = fs::read(path)?;
    if bytes.is_empty() {
        return Err(SearchError::InvalidInput(format!("'{}' is empty", filename)));
    }

    let mime = mime_for_name(&filename);
    Ok(QueryClip::new(bytes, mime, filename))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("soundseek_ingest_{}_{}", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_a_valid_ogg() {
        let path = temp_file("clip.ogg", b"OggS fake");
        let clip = load_clip(&path).unwrap();
        assert_eq!(clip.mime, "audio/ogg");
        assert_eq!(clip.filename, path.file_name().unwrap().to_string_lossy());
        assert!(!clip.is_empty());
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn rejects_unsupported_extension() {
        let path = temp_file("notes.txt", b"hello");
        let err = load_clip(&path).unwrap_err();
        assert!(matches!(err, SearchError::InvalidInput(_)));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn rejects_empty_file() {
        let path = temp_file("silent.wav", b"");
        let err = load_clip(&path).unwrap_err();
        assert!(matches!(err, SearchError::InvalidInput(_)));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn rejects_missing_file() {
        let err = load_clip("/nonexistent/clip.ogg").unwrap_err();
        assert!(matches!(err, SearchError::InvalidInput(_)));
    }
}
