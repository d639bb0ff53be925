/// Address autocomplete
///
/// Every call to [`AddressCompleter::update_query`] supersedes the previous
/// query. Each request is tagged with a sequence number and only the newest
/// one is accepted, so a slow response for "1600 Amph" can never overwrite
/// the list for "1600 Amphitheatre".

use futures::future::{BoxFuture, FutureExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::gateway::{AddressSearch, QueryTicket, Suggestion};
use crate::state::error::GeocodeError;

/// Result of one autocomplete request
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionBatch {
    seq: u64,
    /// None when the query was superseded during the debounce
    result: Option<Result<Vec<Suggestion>, GeocodeError>>,
}

pub struct AddressCompleter {
    source: Arc<dyn AddressSearch>,
    debounce: Duration,
    latest: Arc<AtomicU64>,
}

impl AddressCompleter {
    pub fn new(source: Arc<dyn AddressSearch>, debounce: Duration) -> Self {
        Self {
            source,
            debounce,
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Replace the active query.
    ///
    /// Returns None for blank text: the caller clears its list at once.
    pub fn update_query(&self, text: &str) -> Option<BoxFuture<'static, SuggestionBatch>> {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;

        let fragment = text.trim().to_string();
        if fragment.is_empty() {
            return None;
        }

        let source = Arc::clone(&self.source);
        let latest = Arc::clone(&self.latest);
        let debounce = self.debounce;

        Some(
            async move {
                if !debounce.is_zero() {
                    tokio::time::sleep(debounce).await;
                }
                if latest.load(Ordering::SeqCst) != seq {
                    return SuggestionBatch { seq, result: None };
                }

                let ticket = QueryTicket::new(seq, latest);
                let result = source.complete(&fragment, ticket).await;
                SuggestionBatch {
                    seq,
                    result: Some(result),
                }
            }
            .boxed(),
        )
    }

    /// Drop whatever is in flight
    pub fn reset(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    /// The new suggestion list, if `batch` is current and succeeded.
    /// Search failures are only logged.
    pub fn accept(&self, batch: SuggestionBatch) -> Option<Vec<Suggestion>> {
        if batch.seq != self.latest.load(Ordering::SeqCst) {
            debug!("Dropping stale suggestions (query {})", batch.seq);
            return None;
        }

        match batch.result? {
            Ok(suggestions) => Some(suggestions),
            Err(e) => {
                warn!("Completer error: {}", e);
                None
            }
        }
    }
}
