/// Error types for the photo workflow
///
/// Each collaborator fails with its own enum so the workflow can decide
/// which failures reach the user and which are only logged.

use thiserror::Error;

/// Failure to turn a picked file into image bytes
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ImageLoadError {
    #[error("No image data found.")]
    NoData,

    #[error("Failed to read image: {0}")]
    Read(String),
}

/// Failure of a forward (address → coordinate) lookup
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeocodeError {
    #[error("Enter an address first")]
    EmptyAddress,

    #[error("Location not found")]
    NotFound,

    #[error("Failed to find location: {0}")]
    Service(String),
}

/// Failure to commit to or read from the photo catalogue
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Failed to create data directory: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
