mod cache;
mod view;

pub use cache::TimedCache;
pub use view::*;

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::storage::{ReviewStore, StoreError, SubmissionRecord};

/// Read side of the store for the admin view.
///
/// Loads go through a time-boxed cache; new submissions show up once the
/// window lapses or after `refresh`.
pub struct Dashboard {
    store: Arc<ReviewStore>,
    cache: TimedCache<Vec<SubmissionRecord>>,
}

impl Dashboard {
    pub fn new(store: Arc<ReviewStore>, ttl: Duration) -> Self {
        Self {
            store,
            cache: TimedCache::new(ttl),
        }
    }

    pub fn records(&self) -> Result<Arc<Vec<SubmissionRecord>>, StoreError> {
        self.cache.get_or_try_load(|| {
            debug!("Reloading reviews from {}", self.store.path().display());
            self.store.load_all()
        })
    }

    pub fn refresh(&self) {
        self.cache.invalidate();
    }

    /// Empties the store and drops anything cached from it.
    pub fn clear_all(&self) -> Result<(), StoreError> {
        let result = self.store.clear();
        self.cache.invalidate();
        if result.is_ok() {
            warn!("All reviews cleared from the dashboard");
        }
        result
    }
}
