/// Location services
///
/// - Geocoding gateway traits and rules (gateway.rs)
/// - Nominatim HTTP client (nominatim.rs)
/// - Address autocomplete sequencing (completer.rs)
/// - Device position source (location.rs)

pub mod completer;
pub mod gateway;
pub mod location;
pub mod nominatim;

pub use completer::{AddressCompleter, SuggestionBatch};
pub use gateway::{AddressSearch, Geocoder, Locality, Suggestion};
pub use location::{FixedLocation, LocationProvider};
pub use nominatim::NominatimClient;
