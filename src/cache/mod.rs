//! Time-bounded image cache keyed by ship fingerprint
//!
//! Entries are valid while `now - created_at < ttl`. Reads never evict; a
//! separately owned [`SweepHandle`] removes stale entries on a fixed period.
//!
//! | Age            | `get`      | after `sweep` |
//! |----------------|------------|---------------|
//! | `< ttl`        | hit        | kept          |
//! | `>= ttl`       | miss       | removed       |

mod sweep;

pub use sweep::SweepHandle;

use crate::clock::Clock;
use crate::image::ShipImage;
use crate::ship::Fingerprint;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// A cached image and when it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub image: ShipImage,
    pub created_at: DateTime<Utc>,
}

/// In-memory image cache shared by all callers of one service
#[derive(Debug)]
pub struct ImageCache {
    entries: Mutex<HashMap<Fingerprint, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ImageCache {
    /// Create an empty cache
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Return the cached image if it is younger than the TTL
    pub fn get(&self, key: &Fingerprint) -> Option<ShipImage> {
        let now = self.clock.now();
        let entries = self.lock();
        let entry = entries.get(key)?;

        if now - entry.created_at >= self.ttl {
            debug!("Cache entry {} is stale", key.short());
            return None;
        }

        Some(entry.image.clone())
    }

    /// Insert or overwrite an entry stamped with the current time
    pub fn put(&self, key: Fingerprint, image: ShipImage) {
        let entry = CacheEntry {
            image,
            created_at: self.clock.now(),
        };
        debug!("Caching image for {}", key.short());
        self.lock().insert(key, entry);
    }

    /// Drop every entry at or past the TTL, returning how many were removed
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| now - entry.created_at < self.ttl);
        let removed = before - entries.len();

        if removed > 0 {
            debug!("Swept {} stale cache entries", removed);
        }
        removed
    }

    /// Remove everything
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of stored entries, stale ones included
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Fingerprint, CacheEntry>> {
        // A panic while holding the lock cannot leave a half-written entry
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
