//! Application configuration
//!
//! Loaded from TOML at `$NAMESNAP_CONFIG`, falling back to
//! `<config dir>/namesnap/config.toml`. Every key is optional.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::state::data::{Coordinate, Region};

pub const CONFIG_ENV: &str = "NAMESNAP_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Overrides the catalogue location
    pub database_path: Option<PathBuf>,
    pub geocoder: GeocoderConfig,
    pub map: MapConfig,
    pub location: LocationConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub base_url: String,
    /// Nominatim's usage policy requires an identifying User-Agent
    pub user_agent: String,
    pub suggestion_limit: usize,
    /// Quiet period before an autocomplete query is sent
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub default_latitude: f64,
    pub default_longitude: f64,
    pub span_degrees: f64,
}

/// Fixed device position; desktops rarely have a GPS
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("NameSnap/", env!("CARGO_PKG_VERSION")).to_string(),
            suggestion_limit: 5,
            debounce_ms: 250,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_latitude: 37.7749,
            default_longitude: -122.4194,
            span_degrees: 0.1,
        }
    }
}

impl MapConfig {
    pub fn default_region(&self) -> Region {
        Region::new(
            Coordinate::new(self.default_latitude, self.default_longitude),
            self.span_degrees,
        )
    }
}

impl LocationConfig {
    /// Both halves or nothing
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => None,
        }
    }
}

impl Config {
    /// Load from the configured location. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("namesnap");
        path.push("config.toml");
        path
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("⚙️  Loaded config from {}", path.display());
        Ok(config)
    }
}
