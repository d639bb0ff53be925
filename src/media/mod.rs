/// Photo ingestion module
///
/// This module handles:
/// - Reading picked files into raw bytes
/// - Decoding and downscaling previews and list thumbnails
/// - Exporting a photo's bytes to a file (share)

pub mod ingest;
pub mod thumbnail;

pub use ingest::{load_image, IngestedImage, MediaRef};
pub use thumbnail::{render_thumbnails, Preview};

use std::path::Path;

/// Suggested file name for exporting a photo, e.g. "Sunset Beach.jpg".
/// The extension follows the bytes, not the original file.
pub fn export_file_name(name: &str, photo: &[u8]) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let stem = if stem.is_empty() { "photo".to_string() } else { stem };

    let extension = image::guess_format(photo)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("bin");

    format!("{}.{}", stem, extension)
}

/// Write a photo's bytes to `path` (the share action)
pub async fn export_photo(photo: Vec<u8>, path: impl AsRef<Path>) -> std::io::Result<()> {
    tokio::fs::write(path, photo).await
}
