/// Picked-file loader
///
/// Reads the bytes behind a media reference and decodes a preview
/// on the blocking pool. The raw bytes are what gets persisted; the
/// preview is only for display.

use std::path::{Path, PathBuf};
use tokio::task;
use tracing::{debug, warn};

use super::thumbnail::{render_preview, Preview, PREVIEW_SIZE};
use crate::state::error::ImageLoadError;

/// Opaque handle to a file chosen in the picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef(PathBuf);

impl MediaRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// Bytes of a picked photo plus its decoded preview, if it decoded
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedImage {
    pub bytes: Vec<u8>,
    pub preview: Option<Preview>,
}

/// Load a picked photo.
///
/// Fails with [`ImageLoadError::NoData`] if the file is empty. Bytes that
/// do not decode still succeed, with `preview` left unset.
pub async fn load_image(media: MediaRef) -> Result<IngestedImage, ImageLoadError> {
    let bytes = tokio::fs::read(media.path())
        .await
        .map_err(|e| ImageLoadError::Read(e.to_string()))?;

    if bytes.is_empty() {
        return Err(ImageLoadError::NoData);
    }

    // Spawn blocking because decoding and resizing are CPU-intensive
    let (bytes, preview) = task::spawn_blocking(move || {
        let preview = render_preview(&bytes, PREVIEW_SIZE);
        (bytes, preview)
    })
    .await
    .map_err(|e| ImageLoadError::Read(format!("Task join error: {}", e)))?;

    match &preview {
        Some(p) => debug!(
            "🖼️  Loaded {} ({} bytes, preview {}x{})",
            media.path().display(),
            bytes.len(),
            p.width,
            p.height
        ),
        None => warn!(
            "⚠️  {} is not a decodable image, keeping raw bytes",
            media.path().display()
        ),
    }

    Ok(IngestedImage { bytes, preview })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::thumbnail::png_bytes;

    #[tokio::test]
    async fn test_load_valid_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beach.png");
        let bytes = png_bytes(32, 16);
        std::fs::write(&path, &bytes).unwrap();

        let loaded = load_image(MediaRef::new(&path)).await.unwrap();
        assert_eq!(loaded.bytes, bytes);
        let preview = loaded.preview.unwrap();
        assert_eq!((preview.width, preview.height), (32, 16));
    }

    #[tokio::test]
    async fn test_empty_file_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.jpg");
        std::fs::write(&path, b"").unwrap();

        let result = load_image(MediaRef::new(&path)).await;
        assert_eq!(result, Err(ImageLoadError::NoData));
    }

    #[tokio::test]
    async fn test_undecodable_bytes_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"\xFF\xD8 truncated").unwrap();

        let loaded = load_image(MediaRef::new(&path)).await.unwrap();
        assert_eq!(loaded.bytes, b"\xFF\xD8 truncated".to_vec());
        assert!(loaded.preview.is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_read_error() {
        let result = load_image(MediaRef::new("/nonexistent/path.jpg")).await;
        assert!(matches!(result, Err(ImageLoadError::Read(_))));
    }
}
