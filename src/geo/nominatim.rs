//! Nominatim (OpenStreetMap) geocoding client
//!
//! Implements both [`Geocoder`] and [`AddressSearch`] against the
//! `/search` and `/reverse` JSON endpoints. The public instance allows one
//! request per second, which the client enforces itself.

use futures::future::FutureExt;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::gateway::{AddressSearch, GeoFuture, Geocoder, Placemark, QueryTicket, Suggestion};
use crate::config::GeocoderConfig;
use crate::state::data::Coordinate;
use crate::state::error::GeocodeError;

const RATE_LIMIT_MS: u64 = 1000;

/// Rate limiter enforcing a minimum interval between requests
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with rate limit
    async fn wait(&self) {
        self.wait_unless_stale(None).await;
    }

    /// Wait for a slot on behalf of `ticket`.
    ///
    /// Returns false, without taking the slot, if the ticket went stale
    /// while queued or while waiting out the interval.
    async fn wait_unless_stale(&self, ticket: Option<&QueryTicket>) -> bool {
        let still_wanted = || ticket.map_or(true, QueryTicket::is_current);

        let mut last = self.last_request.lock().await;
        if !still_wanted() {
            return false;
        }

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }
        if !still_wanted() {
            return false;
        }

        *last = Some(Instant::now());
        true
    }
}

/// One entry of a Nominatim `jsonv2` response
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Address,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    house_number: Option<String>,
    road: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    hamlet: Option<String>,
    municipality: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl Place {
    fn coordinate(&self) -> Option<Coordinate> {
        let latitude = self.lat.parse().ok()?;
        let longitude = self.lon.parse().ok()?;
        Some(Coordinate::new(latitude, longitude))
    }

    /// Short label: the place's own name, else its street address,
    /// else the first segment of the display name
    fn title(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        match (&self.address.house_number, &self.address.road) {
            (Some(number), Some(road)) => return format!("{} {}", number, road),
            (None, Some(road)) => return road.clone(),
            _ => {}
        }
        self.display_name
            .split(", ")
            .next()
            .unwrap_or_default()
            .to_string()
    }

    fn locality(&self) -> Option<String> {
        let a = &self.address;
        a.city
            .clone()
            .or_else(|| a.town.clone())
            .or_else(|| a.village.clone())
            .or_else(|| a.hamlet.clone())
            .or_else(|| a.municipality.clone())
    }

    fn into_placemark(self) -> Placemark {
        Placemark {
            coordinate: self.coordinate(),
            name: Some(self.title()),
            locality: self.locality(),
            administrative_area: self.address.state.clone(),
            country: self.address.country.clone(),
        }
    }

    fn into_suggestion(self) -> Suggestion {
        let title = self.title();
        let subtitle = subtitle_for(&self.display_name, &title);
        Suggestion { title, subtitle }
    }
}

/// Everything in `display_name` after the segments already covered by `title`
fn subtitle_for(display_name: &str, title: &str) -> String {
    let segments: Vec<&str> = display_name.split(", ").collect();
    let skip = if segments.first() == Some(&title) {
        1
    } else if segments.len() >= 2 && format!("{} {}", segments[0], segments[1]) == title {
        // "1600, Amphitheatre Parkway, ..." titled "1600 Amphitheatre Parkway"
        2
    } else {
        0
    };
    segments[skip.min(segments.len())..].join(", ")
}

fn parse_places(body: &str) -> Result<Vec<Place>, GeocodeError> {
    serde_json::from_str(body).map_err(|e| GeocodeError::Service(format!("Parse error: {}", e)))
}

/// Parse a `/search` response into placemarks
pub(crate) fn parse_search(body: &str) -> Result<Vec<Placemark>, GeocodeError> {
    Ok(parse_places(body)?
        .into_iter()
        .map(Place::into_placemark)
        .collect())
}

/// Parse a `/search` response into autocomplete rows
pub(crate) fn parse_suggestions(body: &str) -> Result<Vec<Suggestion>, GeocodeError> {
    Ok(parse_places(body)?
        .into_iter()
        .map(Place::into_suggestion)
        .collect())
}

/// Parse a `/reverse` response. "Unable to geocode" is an empty result.
pub(crate) fn parse_reverse(body: &str) -> Result<Vec<Placemark>, GeocodeError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| GeocodeError::Service(format!("Parse error: {}", e)))?;

    if value.get("error").is_some() {
        return Ok(Vec::new());
    }

    let place: Place = serde_json::from_value(value)
        .map_err(|e| GeocodeError::Service(format!("Parse error: {}", e)))?;
    Ok(vec![place.into_placemark()])
}

/// Nominatim API client
#[derive(Clone)]
pub struct NominatimClient {
    http_client: reqwest::Client,
    base_url: String,
    suggestion_limit: usize,
    rate_limiter: Arc<RateLimiter>,
}

impl NominatimClient {
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GeocodeError::Service(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            suggestion_limit: config.suggestion_limit,
            rate_limiter: Arc::new(RateLimiter::new(RATE_LIMIT_MS)),
        })
    }

    async fn get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<String, GeocodeError> {
        self.rate_limiter.wait().await;
        self.send(endpoint, query).await
    }

    /// Like [`NominatimClient::get`], but gives up with None if `ticket`
    /// is superseded before its turn comes
    async fn get_if_current(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        ticket: &QueryTicket,
    ) -> Result<Option<String>, GeocodeError> {
        if !self.rate_limiter.wait_unless_stale(Some(ticket)).await {
            tracing::debug!("Skipping superseded {} request", endpoint);
            return Ok(None);
        }
        self.send(endpoint, query).await.map(Some)
    }

    async fn send(&self, endpoint: &str, query: &[(&str, String)]) -> Result<String, GeocodeError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(url = %url, "Querying geocoder");

        let response = self
            .http_client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| GeocodeError::Service(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Service(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        response
            .text()
            .await
            .map_err(|e| GeocodeError::Service(e.to_string()))
    }

    fn search_query(q: String, limit: usize) -> [(&'static str, String); 4] {
        [
            ("q", q),
            ("format", "jsonv2".to_string()),
            ("addressdetails", "1".to_string()),
            ("limit", limit.to_string()),
        ]
    }
}

impl Geocoder for NominatimClient {
    fn geocode_address(&self, address: &str) -> GeoFuture<Vec<Placemark>> {
        let this = self.clone();
        let address = address.to_string();
        async move {
            let body = this.get("search", &Self::search_query(address, 1)).await?;
            parse_search(&body)
        }
        .boxed()
    }

    fn reverse_geocode(&self, coordinate: Coordinate) -> GeoFuture<Vec<Placemark>> {
        let this = self.clone();
        async move {
            let body = this
                .get(
                    "reverse",
                    &[
                        ("lat", coordinate.latitude.to_string()),
                        ("lon", coordinate.longitude.to_string()),
                        ("format", "jsonv2".to_string()),
                        ("addressdetails", "1".to_string()),
                    ],
                )
                .await?;
            parse_reverse(&body)
        }
        .boxed()
    }
}

impl AddressSearch for NominatimClient {
    fn complete(&self, fragment: &str, ticket: QueryTicket) -> GeoFuture<Vec<Suggestion>> {
        let this = self.clone();
        let fragment = fragment.to_string();
        async move {
            let query = Self::search_query(fragment, this.suggestion_limit);
            match this.get_if_current("search", &query, &ticket).await? {
                Some(body) => parse_suggestions(&body),
                // Nobody is waiting for this list any more
                None => Ok(Vec::new()),
            }
        }
        .boxed()
    }
}
