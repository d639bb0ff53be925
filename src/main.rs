use iced::widget::image::Handle;
use iced::{Element, Task, Theme};
use rfd::FileDialog;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

mod config;
mod geo;
mod media;
mod state;
mod ui;

use config::{Config, GeocoderConfig};
use geo::gateway::reverse_geocode;
use geo::{FixedLocation, Geocoder, Locality, NominatimClient};
use media::{export_file_name, export_photo, render_thumbnails, MediaRef, Preview};
use state::data::{Coordinate, PhotoRecord};
use state::draft::{DraftEvent, DraftSnapshot, Phase};
use state::edit::{EditEvent, EditSession};
use state::library::Library;
use state::workflow::{Effect, PhotoEntry, Request, Services};
use ui::detail::{DetailMode, DetailState};

/// Image types offered in the picker
const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "heic", "gif", "webp", "bmp", "tiff"];

/// Main application state
struct NameSnap {
    /// The photo catalogue
    library: Library,
    /// The add-photo flow
    entry: PhotoEntry,
    draft_updates: watch::Receiver<DraftSnapshot>,
    /// What the add-photo screens render
    draft_view: DraftSnapshot,
    geocoder: Arc<dyn Geocoder>,
    /// Every stored record, reloaded after each mutation
    photos: Vec<PhotoRecord>,
    thumbnails: HashMap<Uuid, Handle>,
    search: String,
    pending_delete: Option<Uuid>,
    /// Preview of the draft's picked photo
    draft_preview: Option<Handle>,
    show_map_picker: bool,
    detail: Option<DetailState>,
    detail_image: Option<Handle>,
    edit: Option<EditSession>,
    edit_preview: Option<Handle>,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    // List
    SearchChanged(String),
    AddPhoto,
    OpenDetail(Uuid),
    RequestDelete(Uuid),
    ConfirmDelete,
    CancelDelete,
    ThumbnailsReady(Vec<(Uuid, Preview)>),

    // Add photo
    PickPhoto,
    NameChanged(String),
    AddressChanged(String),
    UseAddress,
    SuggestionPicked(usize),
    OpenMapPicker,
    CloseMapPicker,
    MapTapped(Coordinate),
    MapZoom(f32),
    SavePhoto,
    CancelAdd,
    DismissError,
    /// An add-photo request finished
    Draft(DraftEvent),

    // Detail
    BackToList,
    DetailModeSelected(DetailMode),
    DetailZoom(f32),
    DetailZoomReset,
    DetailAddress(Uuid, Locality),
    SharePhoto,
    ShareComplete(Result<PathBuf, String>),

    // Edit
    EditPhoto,
    EditPickPhoto,
    EditNameChanged(String),
    EditLoaded(EditEvent),
    EditSave,
    EditCancel,
    EditDismissError,
}

fn handle_from_preview(preview: &Preview) -> Handle {
    Handle::from_rgba(preview.width, preview.height, preview.rgba.clone())
}

fn pick_image(title: &str) -> Option<MediaRef> {
    FileDialog::new()
        .set_title(title)
        .add_filter("Images", &IMAGE_EXTENSIONS)
        .pick_file()
        .map(MediaRef::new)
}

fn run(request: Option<Request>) -> Task<Message> {
    match request {
        Some(request) => Task::perform(request, Message::Draft),
        None => Task::none(),
    }
}

/// Build the Nominatim client. An unusable configured User-Agent falls
/// back to the default one.
fn geocoder_client(config: &GeocoderConfig) -> NominatimClient {
    match NominatimClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            warn!("⚠️  Geocoder configuration rejected ({}), using defaults", e);
            let fallback = GeocoderConfig {
                user_agent: GeocoderConfig::default().user_agent,
                ..config.clone()
            };
            NominatimClient::new(&fallback).expect("Failed to initialize HTTP client")
        }
    }
}

impl NameSnap {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let config = Config::load().unwrap_or_else(|e| {
            warn!("⚠️  {}; using default configuration", e);
            Config::default()
        });

        // The app cannot function without its catalogue
        let library = match &config.database_path {
            Some(path) => Library::open(path.clone()),
            None => Library::new(),
        }
        .expect("Failed to initialize database. Check permissions and disk space.");

        let photo_count = library.photo_count().unwrap_or(0);
        info!(
            "📷 NameSnap initialized with {} photos ({})",
            photo_count,
            library.path().display()
        );

        let client = Arc::new(geocoder_client(&config.geocoder));
        let geocoder: Arc<dyn Geocoder> = client.clone();
        let services = Services {
            geocoder: Arc::clone(&geocoder),
            search: client,
            location: Arc::new(FixedLocation::new(config.location.coordinate())),
        };
        let entry = PhotoEntry::new(
            services,
            config.map.default_region(),
            Duration::from_millis(config.geocoder.debounce_ms),
        );

        let draft_updates = entry.subscribe();

        let mut app = NameSnap {
            library,
            entry,
            draft_updates,
            draft_view: DraftSnapshot::default(),
            geocoder,
            photos: Vec::new(),
            thumbnails: HashMap::new(),
            search: String::new(),
            pending_delete: None,
            draft_preview: None,
            show_map_picker: false,
            detail: None,
            detail_image: None,
            edit: None,
            edit_preview: None,
            status: String::new(),
        };

        let task = app.reload();
        app.status = format!("Ready. {} photos in library.", photo_count);

        (app, task)
    }

    /// Re-read the catalogue and render any missing thumbnails
    fn reload(&mut self) -> Task<Message> {
        match self.library.get_all_photos() {
            Ok(photos) => self.photos = photos,
            Err(e) => {
                error!("Failed to load photos: {}", e);
                self.status = format!("⚠️  Failed to load photos: {}", e);
                return Task::none();
            }
        }

        self.thumbnails
            .retain(|id, _| self.photos.iter().any(|photo| photo.id == *id));

        let missing: Vec<(Uuid, Vec<u8>)> = self
            .photos
            .iter()
            .filter(|photo| !self.thumbnails.contains_key(&photo.id))
            .map(|photo| (photo.id, photo.photo.clone()))
            .collect();

        if missing.is_empty() {
            Task::none()
        } else {
            Task::perform(render_thumbnails(missing), Message::ThumbnailsReady)
        }
    }

    fn record(&self, id: Uuid) -> Option<&PhotoRecord> {
        self.photos.iter().find(|photo| photo.id == id)
    }

    fn detail_record(&self) -> Option<&PhotoRecord> {
        self.detail.as_ref().and_then(|detail| self.record(detail.record_id()))
    }

    fn close_detail(&mut self) {
        self.detail = None;
        self.detail_image = None;
        self.edit = None;
        self.edit_preview = None;
    }

    fn apply_effect(&mut self, effect: Effect) -> Task<Message> {
        match effect {
            Effect::None => Task::none(),
            Effect::Request(request) => Task::perform(request, Message::Draft),
            Effect::BackfillCity { id, city } => match self.library.set_city(id, Some(&city)) {
                Ok(true) => {
                    info!("🏙️  Added city {} to photo {}", city, id);
                    self.reload()
                }
                Ok(false) => Task::none(),
                Err(e) => {
                    error!("Failed to store city for {}: {}", id, e);
                    Task::none()
                }
            },
        }
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        let task = self.handle(message);
        self.sync_draft();
        task
    }

    /// Pick up the workflow's latest snapshot, if it published one
    fn sync_draft(&mut self) {
        if !self.draft_updates.has_changed().unwrap_or(false) {
            return;
        }
        let snapshot = self.draft_updates.borrow_and_update().clone();

        let same_preview = match (&snapshot.draft.preview, &self.draft_view.draft.preview) {
            (Some(new), Some(old)) => Arc::ptr_eq(new, old),
            (None, None) => true,
            _ => false,
        };
        if !same_preview {
            self.draft_preview = snapshot.draft.preview.as_deref().map(handle_from_preview);
        }
        self.draft_view = snapshot;
    }

    fn handle(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::SearchChanged(search) => {
                self.search = search;
                Task::none()
            }
            Message::AddPhoto => {
                self.entry.start_adding();
                self.show_map_picker = false;
                Task::none()
            }
            Message::OpenDetail(id) => {
                if let Some(record) = self.record(id).cloned() {
                    self.detail = Some(DetailState::new(&record));
                    self.detail_image = Some(Handle::from_bytes(record.photo));
                }
                Task::none()
            }
            Message::RequestDelete(id) => {
                self.pending_delete = Some(id);
                Task::none()
            }
            Message::ConfirmDelete => {
                let Some(record) = self.pending_delete.take().and_then(|id| self.record(id).cloned())
                else {
                    return Task::none();
                };

                match self.entry.delete(&self.library, &record) {
                    Ok(_) => {
                        self.status = format!("🗑️  Deleted \"{}\"", record.name);
                        if self.detail.as_ref().map(DetailState::record_id) == Some(record.id) {
                            self.close_detail();
                        }
                        self.reload()
                    }
                    Err(e) => {
                        error!("Failed to delete {}: {}", record.id, e);
                        self.status = format!("⚠️  Failed to delete photo: {}", e);
                        Task::none()
                    }
                }
            }
            Message::CancelDelete => {
                self.pending_delete = None;
                Task::none()
            }
            Message::ThumbnailsReady(thumbnails) => {
                for (id, preview) in thumbnails {
                    self.thumbnails.insert(id, handle_from_preview(&preview));
                }
                Task::none()
            }

            Message::PickPhoto => match pick_image("Select Photo") {
                Some(media) => run(self.entry.on_media_selected(media)),
                None => Task::none(),
            },
            Message::NameChanged(name) => {
                self.entry.on_name_changed(name);
                Task::none()
            }
            Message::AddressChanged(address) => run(self.entry.on_address_changed(address)),
            Message::UseAddress => run(self.entry.on_address_confirmed()),
            Message::SuggestionPicked(index) => run(self.entry.on_suggestion_selected(index)),
            Message::OpenMapPicker => {
                self.show_map_picker = true;
                Task::none()
            }
            Message::CloseMapPicker => {
                self.show_map_picker = false;
                Task::none()
            }
            Message::MapTapped(coordinate) => run(self.entry.on_map_tap(coordinate)),
            Message::MapZoom(delta) => {
                // Positive deltas zoom in
                let region = self.entry.region().zoomed(2f64.powf(-(delta as f64)));
                self.entry.on_region_changed(region);
                Task::none()
            }
            Message::SavePhoto => match self.entry.save(&self.library) {
                Ok(Some(record)) => {
                    self.status = format!("✅ Saved \"{}\"", record.name);
                        self.show_map_picker = false;
                    self.reload()
                }
                Ok(None) => Task::none(),
                Err(e) => {
                    error!("Failed to save photo: {}", e);
                    Task::none()
                }
            },
            Message::CancelAdd => {
                self.entry.cancel();
                self.show_map_picker = false;
                Task::none()
            }
            Message::DismissError => {
                self.entry.dismiss_error();
                Task::none()
            }
            Message::Draft(event) => {
                let effect = self.entry.apply(event);
                self.apply_effect(effect)
            }

            Message::BackToList => {
                self.close_detail();
                Task::none()
            }
            Message::DetailModeSelected(mode) => {
                let Some(detail) = self.detail.as_mut() else {
                    return Task::none();
                };
                let id = detail.record_id();
                match detail.select_mode(mode) {
                    Some(coordinate) => Task::perform(
                        reverse_geocode(self.geocoder.as_ref(), coordinate),
                        move |locality| Message::DetailAddress(id, locality),
                    ),
                    None => Task::none(),
                }
            }
            Message::DetailZoom(delta) => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.zoom_by(delta);
                }
                Task::none()
            }
            Message::DetailZoomReset => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.zoom_reset();
                }
                Task::none()
            }
            Message::DetailAddress(id, locality) => {
                if let Some(detail) = self.detail.as_mut().filter(|d| d.record_id() == id) {
                    detail.set_address(locality.display_text());
                }
                Task::none()
            }
            Message::SharePhoto => {
                let Some(record) = self.detail_record() else {
                    return Task::none();
                };
                let target = FileDialog::new()
                    .set_title("Share Photo")
                    .set_file_name(export_file_name(&record.name, &record.photo))
                    .save_file();

                match target {
                    Some(path) => {
                        let bytes = record.photo.clone();
                        Task::perform(
                            async move {
                                let result = export_photo(bytes, &path).await;
                                result.map(|_| path).map_err(|e| e.to_string())
                            },
                            Message::ShareComplete,
                        )
                    }
                    None => Task::none(),
                }
            }
            Message::ShareComplete(result) => {
                match result {
                    Ok(path) => {
                        info!("📤 Exported photo to {}", path.display());
                        self.status = format!("📤 Exported to {}", path.display());
                    }
                    Err(e) => {
                        error!("Failed to export photo: {}", e);
                        self.status = format!("⚠️  Failed to export photo: {}", e);
                    }
                }
                Task::none()
            }

            Message::EditPhoto => {
                if let Some(record) = self.detail_record().cloned() {
                    self.edit = Some(EditSession::new(record));
                    self.edit_preview = None;
                }
                Task::none()
            }
            Message::EditPickPhoto => {
                let Some(session) = self.edit.as_mut() else {
                    return Task::none();
                };
                match pick_image("Replace Photo") {
                    Some(media) => Task::perform(session.on_media_selected(media), Message::EditLoaded),
                    None => Task::none(),
                }
            }
            Message::EditNameChanged(name) => {
                if let Some(session) = self.edit.as_mut() {
                    session.on_name_changed(name);
                }
                Task::none()
            }
            Message::EditLoaded(event) => {
                if let Some(session) = self.edit.as_mut() {
                    session.apply(event);
                    self.edit_preview = session.new_preview().map(handle_from_preview);
                }
                Task::none()
            }
            Message::EditSave => {
                let Some(session) = self.edit.as_mut() else {
                    return Task::none();
                };
                if !session.can_save() {
                    return Task::none();
                }

                match session.commit(&self.library) {
                    Ok(Some(record)) => {
                        self.status = format!("✏️  Updated \"{}\"", record.name);
                        self.thumbnails.remove(&record.id);
                        self.detail_image = Some(Handle::from_bytes(record.photo.clone()));
                        self.edit = None;
                        self.edit_preview = None;
                        self.reload()
                    }
                    Ok(None) => {
                        self.status = "⚠️  That photo no longer exists".to_string();
                        self.close_detail();
                        self.reload()
                    }
                    Err(e) => {
                        error!("Failed to edit photo: {}", e);
                        session.error = Some(format!("Failed to save changes: {}", e));
                        Task::none()
                    }
                }
            }
            Message::EditCancel => {
                self.edit = None;
                self.edit_preview = None;
                Task::none()
            }
            Message::EditDismissError => {
                if let Some(session) = self.edit.as_mut() {
                    session.dismiss_error();
                }
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let snapshot = &self.draft_view;
        if snapshot.phase != Phase::Idle {
            let region = snapshot.region.unwrap_or_else(|| self.entry.region());
            return if self.show_map_picker {
                ui::entry::map_picker_view(&snapshot.draft, region)
            } else {
                ui::entry::add_view(&snapshot.draft, snapshot.phase, self.draft_preview.as_ref())
            };
        }

        if let Some(record) = self.detail_record() {
            if let Some(session) = &self.edit {
                return ui::entry::edit_view(
                    session,
                    self.edit_preview.as_ref(),
                    self.detail_image.as_ref(),
                );
            }
            if let Some(detail) = &self.detail {
                return ui::detail::view(record, detail, self.detail_image.as_ref());
            }
        }

        let pending_delete = self.pending_delete.and_then(|id| self.record(id));
        ui::list::view(
            &self.photos,
            &self.thumbnails,
            &self.search,
            pending_delete,
            &self.status,
        )
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "namesnap=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    iced::application("NameSnap", NameSnap::update, NameSnap::view)
        .theme(NameSnap::theme)
        .centered()
        .run_with(NameSnap::new)
}
