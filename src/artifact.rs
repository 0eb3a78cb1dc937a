//! Thin I/O wrappers around the finished artifact: the "download" and
//! "share" collaborator surfaces. Everything here is outside the core
//! pipeline and touches only a completed [`GeneratedVideo`].

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::catalog::GeneratedVideo;
use crate::foundation::error::VitrineResult;

/// Conventional file extension for the artifact's negotiated mime.
fn extension_for_mime(mime: &str) -> &'static str {
    if mime.starts_with("video/webm") {
        "webm"
    } else {
        "mp4"
    }
}

/// Write the artifact into `dir` as `{id}.{ext}` and return the path.
pub fn download(video: &GeneratedVideo, dir: &Path) -> VitrineResult<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory '{}'", dir.display()))?;
    let path = dir.join(format!(
        "{}.{}",
        video.id,
        extension_for_mime(&video.mime_type)
    ));
    std::fs::write(&path, &video.bytes)
        .with_context(|| format!("failed to write artifact '{}'", path.display()))?;
    Ok(path)
}

/// Reference string handed to a platform share surface, or copied to the
/// clipboard when no share surface is available.
pub fn share_reference(video: &GeneratedVideo) -> String {
    format!(
        "{} ({}, {:.1}s, {} bytes)",
        video.id, video.mime_type, video.duration_secs, video.byte_size
    )
}
