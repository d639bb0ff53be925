/// Device position source
///
/// `start()` is the equivalent of asking the OS for location updates.
/// It is best-effort: nothing waits on it and a provider with no fix
/// simply reports `None`.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use crate::state::data::Coordinate;

pub trait LocationProvider: Send + Sync {
    /// Begin (or keep) receiving position updates
    fn start(&self);

    /// Most recent known position
    fn last_known(&self) -> Option<Coordinate>;
}

/// Position taken from configuration
#[derive(Debug, Default)]
pub struct FixedLocation {
    coordinate: Option<Coordinate>,
    started: AtomicBool,
}

impl FixedLocation {
    pub fn new(coordinate: Option<Coordinate>) -> Self {
        Self {
            coordinate,
            started: AtomicBool::new(false),
        }
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Relaxed)
    }
}

impl LocationProvider for FixedLocation {
    fn start(&self) {
        if !self.started.swap(true, Ordering::Relaxed) {
            debug!("📍 Location updates started ({:?})", self.coordinate);
        }
    }

    fn last_known(&self) -> Option<Coordinate> {
        if self.is_started() {
            self.coordinate
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_fix_before_start() {
        let provider = FixedLocation::new(Some(Coordinate::new(1.0, 2.0)));
        assert_eq!(provider.last_known(), None);
        provider.start();
        provider.start();
        assert!(provider.is_started());
        assert_eq!(provider.last_known(), Some(Coordinate::new(1.0, 2.0)));
    }

    #[test]
    fn test_unconfigured_provider_has_no_fix() {
        let provider = FixedLocation::default();
        provider.start();
        assert_eq!(provider.last_known(), None);
    }
}
