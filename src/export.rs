use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SearchError;
use crate::ranking::MaterializedResult;

/// Write a materialized result's audio to `output_dir`, named by the entry's
/// identifier. An existing file is never clobbered; the new copy gets a
/// timestamp prefix instead.
pub fn save_result(
    result: &MaterializedResult,
    output_dir: impl AsRef<Path>,
) -> Result<PathBuf, SearchError> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;

    let name = safe_filename(&result.entry.id, &result.audio.mime);
    let mut target = output_dir.join(&name);
    if target.exists() {
        let stamped = format!("{}-{}", chrono::Local::now().format("%Y%m%d-%H%M%S"), name);
        target = output_dir.join(stamped);
    }

    fs::write(&target, result.audio.bytes.as_ref())?;
    Ok(target)
}

/// Reduce an entry id to a bare filename (ids can carry library paths) and
/// make sure it ends in an extension matching the audio's MIME type.
fn safe_filename(id: &str, mime: &str) -> String {
    let base = id
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("result");

    if base.contains('.') {
        return base.to_string();
    }

    let extension = match mime {
        "audio/ogg" => "ogg",
        "audio/wav" => "wav",
        "audio/mpeg" => "mp3",
        _ => "bin",
    };
    format!("{}.{}", base, extension)
}
