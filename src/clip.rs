/// A finalized query clip: the opaque audio payload handed to the search
/// client, together with the MIME type and filename the multipart upload
/// carries. Produced by capture or file ingest; replaced wholesale when the
/// user records or loads something new.
#[derive(Debug, Clone)]
pub struct QueryClip {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub filename: String,
}

impl QueryClip {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
            filename: filename.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

/// MIME type for an audio filename, by extension. Falls back to a generic
/// byte stream for anything the service is not known to serve.
pub fn mime_for_name(name: &str) -> &'static str {
    let extension = name.rsplit('.').next().unwrap_or_default();
    match extension.to_ascii_lowercase().as_str() {
        "ogg" => "audio/ogg",
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_follows_extension() {
        assert_eq!(mime_for_name("kick.ogg"), "audio/ogg");
        assert_eq!(mime_for_name("loop.adg.OGG"), "audio/ogg");
        assert_eq!(mime_for_name("take.wav"), "audio/wav");
        assert_eq!(mime_for_name("song.mp3"), "audio/mpeg");
        assert_eq!(mime_for_name("mystery"), "application/octet-stream");
    }
}
