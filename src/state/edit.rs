/// Editing an existing photo
///
/// An edit replaces the name and, optionally, the image bytes of a stored
/// record. The id and the date it was added never change.

use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::data::PhotoRecord;
use super::error::{ImageLoadError, StoreResult};
use super::library::Library;
use crate::media::{load_image, IngestedImage, MediaRef, Preview};

/// Apply an edit to `record` and read the result back.
///
/// A blank `new_name` keeps the current name. Returns None if the record
/// was deleted in the meantime.
pub fn edit_photo(
    library: &Library,
    record: &PhotoRecord,
    new_name: &str,
    new_bytes: Option<&[u8]>,
) -> StoreResult<Option<PhotoRecord>> {
    let name = match new_name.trim() {
        "" => record.name.as_str(),
        trimmed => trimmed,
    };

    if !library.update_photo(record.id, name, new_bytes)? {
        warn!("Photo {} vanished before it could be edited", record.id);
        return Ok(None);
    }

    info!("✏️  Updated photo \"{}\"", name);
    library.get_photo(record.id)
}

/// Replacement image finished loading
#[derive(Debug, Clone)]
pub struct EditEvent {
    record_id: Uuid,
    seq: u64,
    result: Result<IngestedImage, ImageLoadError>,
}

/// State of the edit screen
#[derive(Debug, Clone)]
pub struct EditSession {
    record: PhotoRecord,
    pub name: String,
    new_bytes: Option<Arc<Vec<u8>>>,
    new_preview: Option<Arc<Preview>>,
    pub error: Option<String>,
    seq: u64,
}

impl EditSession {
    pub fn new(record: PhotoRecord) -> Self {
        Self {
            name: record.name.clone(),
            record,
            new_bytes: None,
            new_preview: None,
            error: None,
            seq: 0,
        }
    }

    pub fn record(&self) -> &PhotoRecord {
        &self.record
    }

    pub fn new_preview(&self) -> Option<&Preview> {
        self.new_preview.as_deref()
    }

    pub fn has_new_photo(&self) -> bool {
        self.new_bytes.is_some()
    }

    /// Something to save: a name, or a replacement photo
    pub fn can_save(&self) -> bool {
        !self.name.trim().is_empty() || self.new_bytes.is_some()
    }

    pub fn on_name_changed(&mut self, name: String) {
        self.name = name;
    }

    /// Load a replacement photo. Only the latest pick is kept.
    pub fn on_media_selected(&mut self, media: MediaRef) -> BoxFuture<'static, EditEvent> {
        self.seq += 1;
        let seq = self.seq;
        let record_id = self.record.id;
        async move {
            EditEvent {
                record_id,
                seq,
                result: load_image(media).await,
            }
        }
        .boxed()
    }

    pub fn apply(&mut self, event: EditEvent) {
        if event.record_id != self.record.id || event.seq != self.seq {
            return;
        }
        match event.result {
            Ok(image) => {
                self.new_bytes = Some(Arc::new(image.bytes));
                self.new_preview = image.preview.map(Arc::new);
                self.error = None;
            }
            Err(e) => {
                warn!("Error loading image: {}", e);
                self.error = Some(e.to_string());
            }
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Write the edit. Returns the stored record, or None if it was deleted.
    pub fn commit(&self, library: &Library) -> StoreResult<Option<PhotoRecord>> {
        edit_photo(
            library,
            &self.record,
            &self.name,
            self.new_bytes.as_ref().map(|bytes| bytes.as_slice()),
        )
    }
}
