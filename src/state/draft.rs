/// Transient state of one "add photo" interaction
///
/// Nothing here is persisted. The workflow owns the only mutable copy;
/// the UI reads snapshots and sends intents back.

use std::sync::Arc;

use super::data::{Coordinate, Region};
use super::error::{GeocodeError, ImageLoadError};
use crate::geo::{Locality, Suggestion, SuggestionBatch};
use crate::media::{IngestedImage, MediaRef, Preview};

/// Where the add-photo flow currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Editing,
    Saving,
    /// An error is on screen; dismissing it returns to `Editing`
    ErrorDisplayed,
}

/// The in-progress photo entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub media: Option<MediaRef>,
    /// Bytes exactly as read from the picked file
    pub image_bytes: Option<Arc<Vec<u8>>>,
    /// Decoded preview; unset when the bytes did not decode
    pub preview: Option<Arc<Preview>>,
    pub name: String,
    pub address: String,
    pub coordinate: Option<Coordinate>,
    /// Reverse-geocoded text for `coordinate`
    pub location_label: Option<String>,
    pub city: Option<String>,
    pub suggestions: Vec<Suggestion>,
    pub error: Option<String>,
}

impl Draft {
    /// Save needs a name and image bytes, nothing else
    pub fn can_save(&self) -> bool {
        !self.name.trim().is_empty() && self.image_bytes.is_some()
    }
}

/// What observers receive after every change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftSnapshot {
    pub phase: Phase,
    pub generation: u64,
    pub draft: Draft,
    pub region: Option<Region>,
}

/// Which action asked for a forward lookup.
/// Only an explicit "Use Address" reports failures to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOrigin {
    UseAddress,
    Suggestion,
}

/// Completion of an asynchronous request, tagged with the draft
/// generation that issued it
#[derive(Debug, Clone)]
pub enum DraftEvent {
    ImageLoaded {
        generation: u64,
        result: Result<IngestedImage, ImageLoadError>,
    },
    AddressResolved {
        generation: u64,
        origin: LookupOrigin,
        result: Result<Coordinate, GeocodeError>,
    },
    LocalityResolved {
        generation: u64,
        coordinate: Coordinate,
        locality: Locality,
        /// Map taps also write the address text
        fill_address: bool,
    },
    Suggestions {
        generation: u64,
        batch: SuggestionBatch,
    },
}

impl DraftEvent {
    pub fn generation(&self) -> u64 {
        match self {
            DraftEvent::ImageLoaded { generation, .. }
            | DraftEvent::AddressResolved { generation, .. }
            | DraftEvent::LocalityResolved { generation, .. }
            | DraftEvent::Suggestions { generation, .. } => *generation,
        }
    }
}
