use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct CacheEntry<T> {
    value: Arc<T>,
    created_at: Instant,
}

/// Single-value cache that is fresh for a fixed window after it was filled.
pub struct TimedCache<T> {
    ttl: Duration,
    entry: Mutex<Option<CacheEntry<T>>>,
}

impl<T> TimedCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: Mutex::new(None),
        }
    }

    /// The cached value while fresh, otherwise the result of `load`, which is
    /// cached only on success.
    pub fn get_or_try_load<E>(&self, load: impl FnOnce() -> Result<T, E>) -> Result<Arc<T>, E> {
        let mut entry = self
            .entry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(cached) = entry.as_ref() {
            if cached.created_at.elapsed() < self.ttl {
                return Ok(cached.value.clone());
            }
        }

        let value = Arc::new(load()?);
        *entry = Some(CacheEntry {
            value: value.clone(),
            created_at: Instant::now(),
        });
        Ok(value)
    }

    pub fn invalidate(&self) {
        *self
            .entry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}
