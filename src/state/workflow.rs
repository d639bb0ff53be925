/// Photo-entry workflow
///
/// Drives one draft from `start_adding()` to `save()` or `cancel()`.
/// Intents that need I/O return a [`Request`]: a future the caller runs on
/// its executor and whose [`DraftEvent`] comes back through [`PhotoEntry::apply`].
/// Every request carries the generation of the draft that issued it and
/// results for an older generation are ignored.

use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::data::{Coordinate, PhotoRecord, Region};
use super::draft::{Draft, DraftEvent, DraftSnapshot, LookupOrigin, Phase};
use super::error::StoreResult;
use super::library::Library;
use crate::geo::gateway::{forward_geocode, reverse_geocode};
use crate::geo::{AddressCompleter, AddressSearch, Geocoder, Locality, LocationProvider};
use crate::media::{load_image, MediaRef};

pub type Request = BoxFuture<'static, DraftEvent>;

/// What the caller should do after applying an event
pub enum Effect {
    None,
    /// Run this follow-up request
    Request(Request),
    /// A city arrived for a draft that was already saved
    BackfillCity { id: Uuid, city: String },
}

/// External services the workflow talks to
#[derive(Clone)]
pub struct Services {
    pub geocoder: Arc<dyn Geocoder>,
    pub search: Arc<dyn AddressSearch>,
    pub location: Arc<dyn LocationProvider>,
}

/// Which draft became which record, and where it was placed
#[derive(Debug, Clone, Copy)]
struct SavedDraft {
    generation: u64,
    id: Uuid,
    location: Option<Coordinate>,
}

pub struct PhotoEntry {
    phase: Phase,
    generation: u64,
    draft: Draft,
    region: Region,
    default_region: Region,
    services: Services,
    completer: AddressCompleter,
    /// The most recent save, for late cities
    last_saved: Option<SavedDraft>,
    notifier: watch::Sender<DraftSnapshot>,
}

impl PhotoEntry {
    pub fn new(services: Services, default_region: Region, debounce: Duration) -> Self {
        let completer = AddressCompleter::new(Arc::clone(&services.search), debounce);
        let (notifier, _) = watch::channel(DraftSnapshot::default());

        Self {
            phase: Phase::Idle,
            generation: 0,
            draft: Draft::default(),
            region: default_region,
            default_region,
            services,
            completer,
            last_saved: None,
            notifier,
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Whether the add-photo screen should be showing
    pub fn is_active(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Receive a snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<DraftSnapshot> {
        self.notifier.subscribe()
    }

    fn publish(&self) {
        self.notifier.send_replace(DraftSnapshot {
            phase: self.phase,
            generation: self.generation,
            draft: self.draft.clone(),
            region: Some(self.region),
        });
    }

    /// Discard the draft and invalidate everything in flight
    fn reset(&mut self) {
        self.generation += 1;
        self.draft = Draft::default();
        self.region = self.default_region;
        self.completer.reset();
        self.phase = Phase::Idle;
    }

    /// Begin a new draft
    pub fn start_adding(&mut self) {
        self.reset();

        self.services.location.start();
        if let Some(here) = self.services.location.last_known() {
            self.region = Region::new(here, self.default_region.span_degrees);
        }

        self.phase = Phase::Editing;
        debug!("📝 Started draft {}", self.generation);
        self.publish();
    }

    /// The user picked a file
    pub fn on_media_selected(&mut self, media: MediaRef) -> Option<Request> {
        if !self.is_active() {
            return None;
        }

        self.draft.media = Some(media.clone());
        self.publish();

        let generation = self.generation;
        Some(
            async move {
                DraftEvent::ImageLoaded {
                    generation,
                    result: load_image(media).await,
                }
            }
            .boxed(),
        )
    }

    pub fn on_name_changed(&mut self, name: String) {
        if !self.is_active() {
            return;
        }
        self.draft.name = name;
        self.publish();
    }

    /// Address text edited; drives the autocomplete list
    pub fn on_address_changed(&mut self, address: String) -> Option<Request> {
        if !self.is_active() {
            return None;
        }

        let pending = self.completer.update_query(&address);
        self.draft.address = address;
        if pending.is_none() {
            self.draft.suggestions.clear();
        }
        self.publish();

        let generation = self.generation;
        pending.map(|batch| {
            batch
                .map(move |batch| DraftEvent::Suggestions { generation, batch })
                .boxed()
        })
    }

    /// "Use Address": resolve the typed address
    pub fn on_address_confirmed(&mut self) -> Option<Request> {
        if !self.is_active() || self.draft.address.trim().is_empty() {
            return None;
        }
        Some(self.lookup(LookupOrigin::UseAddress))
    }

    /// A row of the suggestion list was picked
    pub fn on_suggestion_selected(&mut self, index: usize) -> Option<Request> {
        let suggestion = self.draft.suggestions.get(index)?.clone();

        self.draft.address = suggestion.address_text();
        self.draft.suggestions.clear();
        self.completer.reset();
        self.publish();

        Some(self.lookup(LookupOrigin::Suggestion))
    }

    /// A point was picked on the map
    pub fn on_map_tap(&mut self, coordinate: Coordinate) -> Option<Request> {
        if !self.is_active() {
            return None;
        }

        self.set_coordinate(coordinate);
        self.publish();

        Some(self.reverse(coordinate, true))
    }

    /// Pan/zoom of the map picker
    pub fn on_region_changed(&mut self, region: Region) {
        self.region = region;
        self.publish();
    }

    fn set_coordinate(&mut self, coordinate: Coordinate) {
        self.draft.coordinate = Some(coordinate);
        self.draft.location_label = None;
        self.draft.city = None;
    }

    fn lookup(&self, origin: LookupOrigin) -> Request {
        let generation = self.generation;
        let lookup = forward_geocode(self.services.geocoder.as_ref(), &self.draft.address);
        async move {
            DraftEvent::AddressResolved {
                generation,
                origin,
                result: lookup.await,
            }
        }
        .boxed()
    }

    fn reverse(&self, coordinate: Coordinate, fill_address: bool) -> Request {
        let generation = self.generation;
        let lookup = reverse_geocode(self.services.geocoder.as_ref(), coordinate);
        async move {
            DraftEvent::LocalityResolved {
                generation,
                coordinate,
                locality: lookup.await,
                fill_address,
            }
        }
        .boxed()
    }

    /// Apply the result of a request
    pub fn apply(&mut self, event: DraftEvent) -> Effect {
        if event.generation() != self.generation || !self.is_active() {
            return self.apply_stale(event);
        }

        let effect = match event {
            DraftEvent::ImageLoaded { result, .. } => {
                match result {
                    Ok(image) => {
                        self.draft.image_bytes = Some(Arc::new(image.bytes));
                        self.draft.preview = image.preview.map(Arc::new);
                        self.draft.error = None;
                        if self.phase == Phase::ErrorDisplayed {
                            self.phase = Phase::Editing;
                        }
                    }
                    Err(e) => self.show_error(e.to_string()),
                }
                Effect::None
            }
            DraftEvent::AddressResolved { origin, result, .. } => match result {
                Ok(coordinate) => {
                    info!("📍 Address resolved to {}", coordinate);
                    self.set_coordinate(coordinate);
                    self.region.center = coordinate;
                    Effect::Request(self.reverse(coordinate, false))
                }
                Err(e) => {
                    match origin {
                        LookupOrigin::UseAddress => self.show_error(e.to_string()),
                        LookupOrigin::Suggestion => warn!("Suggestion lookup failed: {}", e),
                    }
                    Effect::None
                }
            },
            DraftEvent::LocalityResolved {
                coordinate,
                locality,
                fill_address,
                ..
            } => {
                // A newer tap or lookup owns the coordinate now
                if self.draft.coordinate == Some(coordinate) {
                    self.draft.location_label = Some(locality.display_text());
                    self.draft.city = locality.city();
                    if fill_address {
                        if let Locality::Resolved(placemark) = &locality {
                            self.draft.address = placemark.formatted_address();
                        }
                    }
                }
                Effect::None
            }
            DraftEvent::Suggestions { batch, .. } => {
                if let Some(suggestions) = self.completer.accept(batch) {
                    self.draft.suggestions = suggestions;
                }
                Effect::None
            }
        };

        self.publish();
        effect
    }

    /// Results for a draft that is gone. The only one still useful is a
    /// city for the record that draft became, looked up for the very
    /// coordinate that record was saved with.
    fn apply_stale(&self, event: DraftEvent) -> Effect {
        if let DraftEvent::LocalityResolved {
            generation,
            coordinate,
            locality,
            ..
        } = &event
        {
            if let (Some(saved), Some(city)) = (self.last_saved, locality.city()) {
                if saved.generation == *generation && saved.location == Some(*coordinate) {
                    return Effect::BackfillCity { id: saved.id, city };
                }
            }
        }
        debug!("Ignoring result for stale draft {}", event.generation());
        Effect::None
    }

    fn show_error(&mut self, message: String) {
        warn!("⚠️  {}", message);
        self.draft.error = Some(message);
        self.phase = Phase::ErrorDisplayed;
    }

    /// The user acknowledged the error
    pub fn dismiss_error(&mut self) {
        self.draft.error = None;
        if self.phase == Phase::ErrorDisplayed {
            self.phase = Phase::Editing;
        }
        self.publish();
    }

    /// Persist the draft.
    ///
    /// Without a name or image bytes this does nothing and returns
    /// `Ok(None)`. On a store failure the draft stays open with the error.
    pub fn save(&mut self, library: &Library) -> StoreResult<Option<PhotoRecord>> {
        if !self.is_active() || !self.draft.can_save() {
            debug!("Save ignored: draft incomplete");
            return Ok(None);
        }
        let Some(bytes) = self.draft.image_bytes.clone() else {
            return Ok(None);
        };

        self.phase = Phase::Saving;
        self.publish();

        let record = PhotoRecord::new(self.draft.name.trim(), Vec::clone(&bytes))
            .with_location(self.draft.coordinate)
            .with_city(self.draft.city.clone());

        match library.insert_photo(&record) {
            Ok(()) => {
                self.last_saved = Some(SavedDraft {
                    generation: self.generation,
                    id: record.id,
                    location: record.location,
                });
                self.reset();
                self.publish();
                Ok(Some(record))
            }
            Err(e) => {
                self.show_error(format!("Failed to save photo: {}", e));
                self.publish();
                Err(e)
            }
        }
    }

    /// Throw the draft away
    pub fn cancel(&mut self) {
        self.reset();
        self.publish();
    }

    /// Remove a record. Already removed is not an error.
    pub fn delete(&self, library: &Library, record: &PhotoRecord) -> StoreResult<bool> {
        let removed = library.delete_photo(record.id)?;
        if removed {
            info!("🗑️  Deleted photo \"{}\"", record.name);
        } else {
            debug!("Photo {} was already gone", record.id);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::gateway::fake::FakeGeocoder;
    use crate::geo::gateway::Placemark;
    use crate::geo::{FixedLocation, Suggestion};
    use crate::media::thumbnail::png_bytes;
    use crate::state::data::compare_names;
    use crate::state::error::{GeocodeError, ImageLoadError};

    const SF: Coordinate = Coordinate {
        latitude: 37.7749,
        longitude: -122.4194,
    };

    fn entry_with(fake: &Arc<FakeGeocoder>, location: Option<Coordinate>) -> PhotoEntry {
        let services = Services {
            geocoder: fake.clone(),
            search: fake.clone(),
            location: Arc::new(FixedLocation::new(location)),
        };
        PhotoEntry::new(services, Region::new(SF, 0.1), Duration::ZERO)
    }

    fn entry(fake: &Arc<FakeGeocoder>) -> PhotoEntry {
        entry_with(fake, None)
    }

    async fn pick_image(entry: &mut PhotoEntry, dir: &tempfile::TempDir) {
        let path = dir.path().join("photo.png");
        std::fs::write(&path, png_bytes(8, 8)).unwrap();
        let request = entry.on_media_selected(MediaRef::new(&path)).unwrap();
        let event = request.await;
        assert!(matches!(entry.apply(event), Effect::None));
    }

    async fn run(entry: &mut PhotoEntry, request: Request) {
        let mut effect = entry.apply(request.await);
        while let Effect::Request(next) = effect {
            effect = entry.apply(next.await);
        }
    }

    #[tokio::test]
    async fn test_beach_without_address() {
        let fake = FakeGeocoder::new();
        let library = Library::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut entry = entry(&fake);

        entry.start_adding();
        pick_image(&mut entry, &dir).await;
        entry.on_name_changed("Beach".into());

        let saved = entry.save(&library).unwrap().unwrap();
        assert_eq!(saved.name, "Beach");

        let photos = library.get_all_photos().unwrap();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].name, "Beach");
        assert_eq!(photos[0].location, None);
        assert_eq!(photos[0].city, None);
        assert_eq!(entry.phase(), Phase::Idle);
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn test_forward_geocoded_address_is_saved() {
        let resolved = Coordinate::new(37.4220, -122.0841);
        let fake = FakeGeocoder::resolving(resolved);
        fake.set_reverse(Ok(vec![Placemark {
            coordinate: Some(resolved),
            locality: Some("Mountain View".into()),
            ..Default::default()
        }]));
        let library = Library::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut entry = entry(&fake);

        entry.start_adding();
        pick_image(&mut entry, &dir).await;
        entry.on_name_changed("Campus".into());
        // Zero-length debounce still issues a suggestion request
        if let Some(request) = entry.on_address_changed("1600 Amphitheatre Parkway".into()) {
            run(&mut entry, request).await;
        }

        let request = entry.on_address_confirmed().unwrap();
        run(&mut entry, request).await;
        assert_eq!(entry.region().center, resolved);

        let saved = entry.save(&library).unwrap().unwrap();
        let stored = library.get_photo(saved.id).unwrap().unwrap();
        assert_eq!(stored.location, Some(resolved));
        assert_eq!(stored.city.as_deref(), Some("Mountain View"));
    }

    #[tokio::test]
    async fn test_reverse_failure_does_not_block_save() {
        let fake = FakeGeocoder::new();
        fake.set_reverse(Err(GeocodeError::Service("network down".into())));
        let library = Library::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut entry = entry(&fake);

        entry.start_adding();
        pick_image(&mut entry, &dir).await;
        entry.on_name_changed("Bridge".into());

        let request = entry.on_map_tap(SF).unwrap();
        run(&mut entry, request).await;
        assert_eq!(entry.draft().location_label.as_deref(), Some("Address unavailable"));
        assert_eq!(entry.draft().error, None);

        let saved = entry.save(&library).unwrap().unwrap();
        let stored = library.get_photo(saved.id).unwrap().unwrap();
        assert_eq!(stored.location, Some(SF));
        assert_eq!(stored.city, None);
    }

    #[tokio::test]
    async fn test_map_tap_fills_address() {
        let fake = FakeGeocoder::new();
        fake.set_reverse(Ok(vec![Placemark {
            coordinate: Some(SF),
            name: Some("City Hall".into()),
            locality: Some("San Francisco".into()),
            administrative_area: Some("California".into()),
            country: Some("United States".into()),
        }]));
        let mut entry = entry(&fake);

        entry.start_adding();
        let request = entry.on_map_tap(SF).unwrap();
        run(&mut entry, request).await;

        assert_eq!(
            entry.draft().address,
            "City Hall, San Francisco, California, United States"
        );
        assert_eq!(entry.draft().city.as_deref(), Some("San Francisco"));
    }

    #[tokio::test]
    async fn test_save_is_noop_without_preconditions() {
        let fake = FakeGeocoder::new();
        let library = Library::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut entry = entry(&fake);

        // Idle
        assert!(entry.save(&library).unwrap().is_none());

        // Name but no bytes
        entry.start_adding();
        entry.on_name_changed("Beach".into());
        assert!(entry.save(&library).unwrap().is_none());

        // Bytes but blank name
        entry.on_name_changed("   ".into());
        pick_image(&mut entry, &dir).await;
        assert!(entry.save(&library).unwrap().is_none());

        assert_eq!(library.photo_count().unwrap(), 0);
        assert_eq!(entry.phase(), Phase::Editing);
    }

    #[tokio::test]
    async fn test_cancel_restores_fresh_draft() {
        let fake = FakeGeocoder::resolving(SF);
        fake.set_suggestions(Ok(vec![Suggestion::new("Main St", "Springfield")]));
        let dir = tempfile::tempdir().unwrap();
        let mut entry = entry(&fake);

        entry.start_adding();
        let fresh = entry.draft().clone();

        pick_image(&mut entry, &dir).await;
        entry.on_name_changed("Beach".into());
        let request = entry.on_address_changed("Main".into()).unwrap();
        run(&mut entry, request).await;
        assert_eq!(entry.draft().suggestions.len(), 1);
        let request = entry.on_map_tap(SF).unwrap();
        run(&mut entry, request).await;

        entry.cancel();
        assert_eq!(entry.phase(), Phase::Idle);
        assert_eq!(entry.draft(), &fresh);
        assert_eq!(entry.draft(), &Draft::default());

        entry.start_adding();
        assert_eq!(entry.draft(), &fresh);
    }

    #[tokio::test]
    async fn test_results_for_cancelled_draft_are_ignored() {
        let fake = FakeGeocoder::resolving(SF);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.png");
        std::fs::write(&path, png_bytes(4, 4)).unwrap();
        let mut entry = entry(&fake);

        entry.start_adding();
        let _ = entry.on_address_changed("Somewhere".into());
        let image = entry.on_media_selected(MediaRef::new(&path)).unwrap();
        let lookup = entry.on_address_confirmed().unwrap();

        entry.cancel();
        entry.start_adding();

        assert!(matches!(entry.apply(image.await), Effect::None));
        assert!(matches!(entry.apply(lookup.await), Effect::None));
        assert_eq!(entry.draft(), &Draft::default());
    }

    #[tokio::test]
    async fn test_late_city_is_backfilled_after_save() {
        let fake = FakeGeocoder::new();
        fake.set_reverse(Ok(vec![Placemark {
            locality: Some("San Francisco".into()),
            ..Default::default()
        }]));
        let library = Library::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut entry = entry(&fake);

        entry.start_adding();
        pick_image(&mut entry, &dir).await;
        entry.on_name_changed("Ferry".into());
        let reverse = entry.on_map_tap(SF).unwrap();

        let saved = entry.save(&library).unwrap().unwrap();
        assert_eq!(saved.city, None);

        match entry.apply(reverse.await) {
            Effect::BackfillCity { id, city } => {
                assert_eq!(id, saved.id);
                assert_eq!(city, "San Francisco");
                library.set_city(id, Some(&city)).unwrap();
            }
            _ => panic!("expected a city backfill"),
        }
        let stored = library.get_photo(saved.id).unwrap().unwrap();
        assert_eq!(stored.city.as_deref(), Some("San Francisco"));
    }

    #[tokio::test]
    async fn test_late_city_for_an_earlier_tap_is_not_backfilled() {
        let new_york = Coordinate::new(40.7128, -74.0060);
        let city_at = |city: &str| {
            Ok(vec![Placemark {
                locality: Some(city.into()),
                ..Default::default()
            }])
        };
        let fake = FakeGeocoder::new();
        let library = Library::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut entry = entry(&fake);

        entry.start_adding();
        pick_image(&mut entry, &dir).await;
        entry.on_name_changed("Skyline".into());

        fake.set_reverse(city_at("New York"));
        let first_tap = entry.on_map_tap(new_york).unwrap();
        fake.set_reverse(city_at("San Francisco"));
        let second_tap = entry.on_map_tap(SF).unwrap();
        run(&mut entry, second_tap).await;
        assert_eq!(entry.draft().city.as_deref(), Some("San Francisco"));

        let saved = entry.save(&library).unwrap().unwrap();
        assert_eq!(saved.location, Some(SF));

        assert!(matches!(entry.apply(first_tap.await), Effect::None));
        let stored = library.get_photo(saved.id).unwrap().unwrap();
        assert_eq!(stored.location, Some(SF));
        assert_eq!(stored.city.as_deref(), Some("San Francisco"));
    }

    #[tokio::test]
    async fn test_store_failure_keeps_draft_open() {
        let fake = FakeGeocoder::new();
        let library = Library::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut entry = entry(&fake);

        entry.start_adding();
        pick_image(&mut entry, &dir).await;
        entry.on_name_changed("Harbour".into());

        library.drop_blob_table();
        assert!(entry.save(&library).is_err());

        assert_eq!(entry.phase(), Phase::ErrorDisplayed);
        assert_eq!(entry.draft().name, "Harbour");
        assert!(entry.draft().image_bytes.is_some());
        assert!(entry
            .draft()
            .error
            .as_deref()
            .is_some_and(|e| e.starts_with("Failed to save photo")));
        assert_eq!(library.photo_count().unwrap(), 0);

        entry.dismiss_error();
        assert_eq!(entry.phase(), Phase::Editing);
        assert!(entry.draft().can_save());
    }

    #[tokio::test]
    async fn test_image_error_is_shown_and_dismissed() {
        let fake = FakeGeocoder::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.jpg");
        std::fs::write(&path, b"").unwrap();
        let mut entry = entry(&fake);

        entry.start_adding();
        let request = entry.on_media_selected(MediaRef::new(&path)).unwrap();
        entry.apply(request.await);

        assert_eq!(entry.phase(), Phase::ErrorDisplayed);
        assert_eq!(
            entry.draft().error.as_deref(),
            Some(ImageLoadError::NoData.to_string().as_str())
        );

        entry.dismiss_error();
        assert_eq!(entry.phase(), Phase::Editing);
        assert_eq!(entry.draft().error, None);
    }

    #[tokio::test]
    async fn test_use_address_failure_is_shown_but_suggestion_failure_is_not() {
        let fake = FakeGeocoder::new();
        fake.set_suggestions(Ok(vec![Suggestion::new("Atlantis", "")]));
        let mut entry = entry(&fake);

        entry.start_adding();
        let request = entry.on_address_changed("Atlan".into()).unwrap();
        run(&mut entry, request).await;

        let request = entry.on_suggestion_selected(0).unwrap();
        assert_eq!(entry.draft().address, "Atlantis");
        assert!(entry.draft().suggestions.is_empty());
        run(&mut entry, request).await;
        assert_eq!(entry.draft().error, None);
        assert_eq!(entry.phase(), Phase::Editing);

        let request = entry.on_address_confirmed().unwrap();
        run(&mut entry, request).await;
        assert_eq!(entry.draft().error.as_deref(), Some("Location not found"));
        assert_eq!(entry.phase(), Phase::ErrorDisplayed);
    }

    #[tokio::test]
    async fn test_blank_address_clears_suggestions_immediately() {
        let fake = FakeGeocoder::new();
        fake.set_suggestions(Ok(vec![Suggestion::new("Main St", "")]));
        let mut entry = entry(&fake);

        entry.start_adding();
        let pending = entry.on_address_changed("Main".into()).unwrap();
        run(&mut entry, pending).await;
        assert_eq!(entry.draft().suggestions.len(), 1);

        assert!(entry.on_address_changed(String::new()).is_none());
        assert!(entry.draft().suggestions.is_empty());
        assert!(entry.on_address_confirmed().is_none());
    }

    #[tokio::test]
    async fn test_start_adding_centres_on_device_location() {
        let fake = FakeGeocoder::new();
        let here = Coordinate::new(48.8566, 2.3522);
        let mut entry = entry_with(&fake, Some(here));

        entry.start_adding();
        assert_eq!(entry.region().center, here);

        entry.cancel();
        assert_eq!(entry.region().center, SF);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let fake = FakeGeocoder::new();
        let mut entry = entry(&fake);
        let mut updates = entry.subscribe();

        entry.start_adding();
        entry.on_name_changed("Beach".into());

        assert!(updates.has_changed().unwrap());
        let snapshot = updates.borrow_and_update().clone();
        assert_eq!(snapshot.phase, Phase::Editing);
        assert_eq!(snapshot.draft.name, "Beach");
        assert_eq!(snapshot.generation, 1);
    }

    #[tokio::test]
    async fn test_delete_missing_record_is_noop() {
        let fake = FakeGeocoder::new();
        let library = Library::open_in_memory().unwrap();
        let entry = entry(&fake);

        let kept = PhotoRecord::new("Kept", vec![1]);
        library.insert_photo(&kept).unwrap();
        let ghost = PhotoRecord::new("Ghost", vec![2]);

        assert!(!entry.delete(&library, &ghost).unwrap());
        assert_eq!(library.photo_count().unwrap(), 1);
        assert!(entry.delete(&library, &kept).unwrap());
        assert_eq!(library.photo_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_saved_records_list_in_name_order() {
        let fake = FakeGeocoder::new();
        let library = Library::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut entry = entry(&fake);

        for name in ["mango", "Apple", "banana"] {
            entry.start_adding();
            pick_image(&mut entry, &dir).await;
            entry.on_name_changed(name.into());
            entry.save(&library).unwrap();
        }

        let names: Vec<String> = library
            .get_all_photos()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        let mut expected = names.clone();
        expected.sort_by(|a, b| compare_names(a, b));
        assert_eq!(names, expected);
        assert_eq!(names, vec!["Apple", "banana", "mango"]);
    }
}
