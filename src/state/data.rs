/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the database layer, the workflow and the UI layer.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use uuid::Uuid;

/// A point on the globe in decimal degrees
///
/// Latitude and longitude always travel together, so a record can
/// never hold only one half of a location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

/// Visible area of a map: a center plus the number of degrees
/// shown across each axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub center: Coordinate,
    pub span_degrees: f64,
}

impl Region {
    pub fn new(center: Coordinate, span_degrees: f64) -> Self {
        Self { center, span_degrees }
    }

    /// Convert a position inside a `width` x `height` surface into a coordinate.
    ///
    /// The surface is an equirectangular projection of the region: the
    /// top edge is the northern bound, the left edge the western bound.
    pub fn coordinate_at(&self, x: f32, y: f32, width: f32, height: f32) -> Coordinate {
        let fx = if width > 0.0 { (x / width) as f64 } else { 0.5 };
        let fy = if height > 0.0 { (y / height) as f64 } else { 0.5 };

        let latitude = self.center.latitude + (0.5 - fy) * self.span_degrees;
        let longitude = self.center.longitude + (fx - 0.5) * self.span_degrees;

        Coordinate::new(latitude.clamp(-90.0, 90.0), wrap_longitude(longitude))
    }

    /// Inverse of [`Region::coordinate_at`]
    pub fn position_of(&self, coordinate: Coordinate, width: f32, height: f32) -> (f32, f32) {
        let fx = (coordinate.longitude - self.center.longitude) / self.span_degrees + 0.5;
        let fy = 0.5 - (coordinate.latitude - self.center.latitude) / self.span_degrees;
        ((fx as f32) * width, (fy as f32) * height)
    }

    /// Zoom by a factor (< 1.0 zooms in), keeping the span within sane limits
    pub fn zoomed(&self, factor: f64) -> Self {
        Self {
            center: self.center,
            span_degrees: (self.span_degrees * factor).clamp(0.001, 180.0),
        }
    }
}

fn wrap_longitude(longitude: f64) -> f64 {
    let wrapped = (longitude + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && longitude > 0.0 {
        180.0
    } else {
        wrapped
    }
}

/// Represents a single named photo in the library
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRecord {
    /// Unique ID, generated at creation
    pub id: Uuid,
    /// User-supplied name, never empty
    pub name: String,
    /// Raw image bytes as imported
    pub photo: Vec<u8>,
    /// When the photo was added to the library
    pub date_added: DateTime<Utc>,
    /// Where the photo was taken, if known
    pub location: Option<Coordinate>,
    /// Locality resolved by reverse geocoding
    pub city: Option<String>,
}

impl PhotoRecord {
    /// Create a new record dated now
    pub fn new(name: impl Into<String>, photo: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            photo,
            date_added: Utc::now(),
            location: None,
            city: None,
        }
    }

    pub fn with_location(mut self, location: Option<Coordinate>) -> Self {
        self.location = location;
        self
    }

    pub fn with_city(mut self, city: Option<String>) -> Self {
        self.city = city;
        self
    }

    /// Text for the list row's city line
    pub fn city_label(&self) -> String {
        match &self.city {
            Some(city) => format!("City: {}", city),
            None => "City: Location not available".to_string(),
        }
    }
}

/// Locale-aware ordering for names.
///
/// Primary order ignores case and accents ("élan" sits with "elan"),
/// accents break the first tie and case the second, with lowercase
/// sorting before uppercase.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let primary = a
        .chars()
        .flat_map(char::to_lowercase)
        .map(base_letter)
        .cmp(b.chars().flat_map(char::to_lowercase).map(base_letter));

    primary
        .then_with(|| {
            a.chars()
                .flat_map(char::to_lowercase)
                .cmp(b.chars().flat_map(char::to_lowercase))
        })
        .then_with(|| {
            for (ca, cb) in a.chars().zip(b.chars()) {
                if ca != cb {
                    return match (ca.is_lowercase(), cb.is_lowercase()) {
                        (true, false) => Ordering::Less,
                        (false, true) => Ordering::Greater,
                        _ => ca.cmp(&cb),
                    };
                }
            }
            a.len().cmp(&b.len())
        })
}

/// Strip the accent from common Latin letters (input already lowercase)
fn base_letter(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'æ' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'č' | 'ĉ' | 'ċ' => 'c',
        'ď' | 'đ' => 'd',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => 'e',
        'ğ' | 'ĝ' | 'ġ' | 'ģ' => 'g',
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => 'i',
        'ł' | 'ľ' | 'ļ' | 'ĺ' => 'l',
        'ñ' | 'ń' | 'ň' | 'ņ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' | 'œ' => 'o',
        'ř' | 'ŕ' => 'r',
        'ß' | 'ś' | 'š' | 'ş' => 's',
        'ť' | 'ţ' => 't',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => 'u',
        'ý' | 'ÿ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}

/// Case-insensitive substring match; an empty needle matches everything
pub fn name_matches(name: &str, needle: &str) -> bool {
    let needle = needle.trim();
    needle.is_empty() || name.to_lowercase().contains(&needle.to_lowercase())
}
