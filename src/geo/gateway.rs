/// Geocoding gateway
///
/// The traits here are the seam to whatever geocoding service is
/// configured. The free functions wrap them with the app's rules:
/// forward lookups fail loudly, reverse lookups never fail.

use futures::future::{self, BoxFuture, FutureExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::state::data::Coordinate;
use crate::state::error::GeocodeError;

/// Text shown when a coordinate cannot be turned into an address
pub const ADDRESS_UNAVAILABLE: &str = "Address unavailable";

pub type GeoFuture<T> = BoxFuture<'static, Result<T, GeocodeError>>;

/// A geocoder result
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Placemark {
    pub coordinate: Option<Coordinate>,
    pub name: Option<String>,
    pub locality: Option<String>,
    pub administrative_area: Option<String>,
    pub country: Option<String>,
}

impl Placemark {
    /// "name, locality, administrative area, country", skipping blanks
    pub fn formatted_address(&self) -> String {
        [
            &self.name,
            &self.locality,
            &self.administrative_area,
            &self.country,
        ]
        .into_iter()
        .flatten()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// One autocomplete row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub title: String,
    pub subtitle: String,
}

impl Suggestion {
    pub fn new(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
        }
    }

    /// Address text to put in the field when this suggestion is picked
    pub fn address_text(&self) -> String {
        if self.subtitle.is_empty() {
            self.title.clone()
        } else {
            format!("{}, {}", self.title, self.subtitle)
        }
    }
}

/// Outcome of a reverse lookup, which always produces something to show
#[derive(Debug, Clone, PartialEq)]
pub enum Locality {
    Resolved(Placemark),
    Unavailable,
}

impl Locality {
    pub fn display_text(&self) -> String {
        match self {
            Locality::Resolved(placemark) => {
                let text = placemark.formatted_address();
                if text.is_empty() {
                    ADDRESS_UNAVAILABLE.to_string()
                } else {
                    text
                }
            }
            Locality::Unavailable => ADDRESS_UNAVAILABLE.to_string(),
        }
    }

    /// The city to store on a record, if one was resolved
    pub fn city(&self) -> Option<String> {
        match self {
            Locality::Resolved(placemark) => placemark
                .locality
                .as_ref()
                .filter(|city| !city.trim().is_empty())
                .cloned(),
            Locality::Unavailable => None,
        }
    }
}

/// Service that resolves addresses and coordinates
pub trait Geocoder: Send + Sync {
    fn geocode_address(&self, address: &str) -> GeoFuture<Vec<Placemark>>;
    fn reverse_geocode(&self, coordinate: Coordinate) -> GeoFuture<Vec<Placemark>>;
}

/// Identifies one autocomplete query. It stops being current as soon as
/// a newer query (or a reset) replaces it.
#[derive(Debug, Clone)]
pub struct QueryTicket {
    seq: u64,
    latest: Arc<AtomicU64>,
}

impl QueryTicket {
    pub fn new(seq: u64, latest: Arc<AtomicU64>) -> Self {
        Self { seq, latest }
    }

    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.seq
    }
}

/// Service that completes partial addresses.
///
/// Implementations that queue requests should check `ticket` once they
/// are ready to send, and skip the request if it is no longer current.
pub trait AddressSearch: Send + Sync {
    fn complete(&self, fragment: &str, ticket: QueryTicket) -> GeoFuture<Vec<Suggestion>>;
}

/// Resolve an address to the coordinate of the first candidate.
///
/// Blank input is rejected without contacting the service.
pub fn forward_geocode(geocoder: &dyn Geocoder, address: &str) -> GeoFuture<Coordinate> {
    let address = address.trim();
    if address.is_empty() {
        return future::ready(Err(GeocodeError::EmptyAddress)).boxed();
    }

    debug!("🔎 Geocoding \"{}\"", address);
    let lookup = geocoder.geocode_address(address);
    async move {
        let placemarks = lookup.await?;
        placemarks
            .into_iter()
            .find_map(|p| p.coordinate)
            .ok_or(GeocodeError::NotFound)
    }
    .boxed()
}

/// Resolve a coordinate to a locality, degrading to
/// [`Locality::Unavailable`] on any failure
pub fn reverse_geocode(geocoder: &dyn Geocoder, coordinate: Coordinate) -> BoxFuture<'static, Locality> {
    let lookup = geocoder.reverse_geocode(coordinate);
    async move {
        match lookup.await {
            Ok(placemarks) => match placemarks.into_iter().next() {
                Some(placemark) => Locality::Resolved(placemark),
                None => Locality::Unavailable,
            },
            Err(e) => {
                warn!("Reverse geocoding error for {}: {}", coordinate, e);
                Locality::Unavailable
            }
        }
    }
    .boxed()
}


#[cfg(test)]
mod tests {
    use super::fake::FakeGeocoder;
    use super::*;

    fn sf() -> Placemark {
        Placemark {
            coordinate: Some(Coordinate::new(37.7749, -122.4194)),
            name: Some("Market Street".into()),
            locality: Some("San Francisco".into()),
            administrative_area: Some("California".into()),
            country: Some("United States".into()),
        }
    }

    #[tokio::test]
    async fn test_forward_rejects_blank_without_calling() {
        let geocoder = FakeGeocoder::new();
        let result = forward_geocode(&*geocoder, "   ").await;
        assert_eq!(result, Err(GeocodeError::EmptyAddress));
        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_forward_returns_first_candidate() {
        let coordinate = Coordinate::new(37.4220, -122.0841);
        let geocoder = FakeGeocoder::resolving(coordinate);
        let result = forward_geocode(&*geocoder, "1600 Amphitheatre Parkway").await;
        assert_eq!(result, Ok(coordinate));
    }

    #[tokio::test]
    async fn test_forward_empty_result_is_not_found() {
        let geocoder = FakeGeocoder::new();
        let result = forward_geocode(&*geocoder, "Nowhere at all").await;
        assert_eq!(result, Err(GeocodeError::NotFound));
    }

    #[tokio::test]
    async fn test_reverse_failure_degrades_to_placeholder() {
        let geocoder = FakeGeocoder::new();
        let locality = reverse_geocode(&*geocoder, Coordinate::new(37.7749, -122.4194)).await;
        assert_eq!(locality, Locality::Unavailable);
        assert_eq!(locality.display_text(), ADDRESS_UNAVAILABLE);
        assert_eq!(locality.city(), None);
    }

    #[tokio::test]
    async fn test_reverse_success() {
        let geocoder = FakeGeocoder::new();
        geocoder.set_reverse(Ok(vec![sf()]));
        let locality = reverse_geocode(&*geocoder, Coordinate::new(37.7749, -122.4194)).await;
        assert_eq!(
            locality.display_text(),
            "Market Street, San Francisco, California, United States"
        );
        assert_eq!(locality.city().as_deref(), Some("San Francisco"));
    }

    #[test]
    fn test_ticket_goes_stale_when_superseded() {
        let latest = Arc::new(AtomicU64::new(3));
        let ticket = QueryTicket::new(3, Arc::clone(&latest));
        assert!(ticket.is_current());

        latest.fetch_add(1, Ordering::SeqCst);
        assert!(!ticket.is_current());
    }

    #[test]
    fn test_formatted_address_skips_blanks() {
        let placemark = Placemark {
            name: Some("".into()),
            locality: Some("Lisbon".into()),
            country: Some("Portugal".into()),
            ..Default::default()
        };
        assert_eq!(placemark.formatted_address(), "Lisbon, Portugal");
    }

    #[test]
    fn test_suggestion_address_text() {
        assert_eq!(
            Suggestion::new("1600 Amphitheatre Pkwy", "Mountain View, CA").address_text(),
            "1600 Amphitheatre Pkwy, Mountain View, CA"
        );
        assert_eq!(Suggestion::new("Paris", "").address_text(), "Paris");
    }
}
