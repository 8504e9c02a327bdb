//! Bundling: collapses a multi-file send into one uploadable blob.
//!
//! A single file is never wrapped; two or more files become a
//! `files_<timestamp>.zip` archive with each input stored under its
//! original name.

use std::io::{Cursor, Write};

use chrono::Utc;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// DEFLATE level for multi-file archives (0-9 scale).
const COMPRESSION_LEVEL: i64 = 6;

/// Errors from bundling.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("no input files")]
    NoFiles,

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file queued for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct InputFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Collapses `files` into the single blob that gets uploaded.
///
/// One input passes through unchanged. Several inputs produce one zip
/// archive whose entries carry the original file names.
pub fn bundle(mut files: Vec<InputFile>) -> Result<InputFile, BundleError> {
    match files.len() {
        0 => Err(BundleError::NoFiles),
        1 => Ok(files.remove(0)),
        _ => {
            let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
            let options = SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(COMPRESSION_LEVEL));

            for file in &files {
                writer.start_file(file.name.as_str(), options)?;
                writer.write_all(&file.bytes)?;
            }

            let cursor = writer.finish()?;
            Ok(InputFile {
                name: format!("files_{}.zip", Utc::now().timestamp_millis()),
                bytes: cursor.into_inner(),
                content_type: "application/zip".to_string(),
            })
        }
    }
}

/// Guesses a content type from a file name's extension.
///
/// Unknown extensions fall back to `application/octet-stream`.
pub fn content_type_for(name: &str) -> &'static str {
    let ext = std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("txt") | Some("md") | Some("log") => "text/plain",
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("gz") => "application/gzip",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("mp3") => "audio/mpeg",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}
