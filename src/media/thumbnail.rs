use image::imageops::FilterType;
use tracing::warn;
use uuid::Uuid;

/// Longest edge of the add/edit screen preview
pub const PREVIEW_SIZE: u32 = 512;

/// Longest edge of list row thumbnails
pub const THUMBNAIL_SIZE: u32 = 64;

/// A decoded, downscaled image ready for display (RGBA8, row-major)
#[derive(Clone, PartialEq)]
pub struct Preview {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for Preview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preview")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Decode `bytes` and shrink them to fit a `max_size` square.
/// Returns None if the bytes are not an image format we can decode.
pub fn render_preview(bytes: &[u8], max_size: u32) -> Option<Preview> {
    let img = image::load_from_memory(bytes).ok()?;

    // Never upscale small images
    let img = if img.width() > max_size || img.height() > max_size {
        img.resize(max_size, max_size, FilterType::Lanczos3)
    } else {
        img
    };

    let rgba = img.to_rgba8();
    Some(Preview {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}

/// List row thumbnail
pub fn render_thumbnail(bytes: &[u8]) -> Option<Preview> {
    render_preview(bytes, THUMBNAIL_SIZE)
}

/// Render list thumbnails on the blocking pool. Photos that do not decode
/// are left out.
pub async fn render_thumbnails(photos: Vec<(Uuid, Vec<u8>)>) -> Vec<(Uuid, Preview)> {
    let rendered = tokio::task::spawn_blocking(move || {
        photos
            .into_iter()
            .filter_map(|(id, bytes)| render_thumbnail(&bytes).map(|preview| (id, preview)))
            .collect()
    })
    .await;

    match rendered {
        Ok(thumbnails) => thumbnails,
        Err(e) => {
            warn!("Thumbnail rendering failed: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 80, 40, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("encode test png");
    out.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_fits_bounds() {
        let preview = render_preview(&png_bytes(1000, 500), PREVIEW_SIZE).unwrap();
        assert_eq!(preview.width, 512);
        assert_eq!(preview.height, 256);
        assert_eq!(preview.rgba.len(), (512 * 256 * 4) as usize);
    }

    #[test]
    fn test_small_images_are_not_upscaled() {
        let preview = render_thumbnail(&png_bytes(10, 20)).unwrap();
        assert_eq!((preview.width, preview.height), (10, 20));
    }

    #[tokio::test]
    async fn test_render_thumbnails_skips_undecodable() {
        let good = Uuid::new_v4();
        let bad = Uuid::new_v4();
        let thumbnails =
            render_thumbnails(vec![(good, png_bytes(200, 100)), (bad, vec![0, 1, 2])]).await;

        assert_eq!(thumbnails.len(), 1);
        assert_eq!(thumbnails[0].0, good);
        assert_eq!((thumbnails[0].1.width, thumbnails[0].1.height), (64, 32));
    }

    #[test]
    fn test_garbage_does_not_decode() {
        assert!(render_preview(b"definitely not an image", PREVIEW_SIZE).is_none());
    }
}
