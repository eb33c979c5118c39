//! Bounded, time-limited cache of the highest-importance index entries.
//!
//! An explicit cache object with an injected clock, constructed once per
//! process and passed by reference to query handlers. Stale entries are
//! refreshed on next access, never served.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use versedb_core::config::IndexCacheSettings;
use versedb_core::types::IndexEntry;

/// Injected time source so staleness is testable without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct Slot {
    entries: Vec<IndexEntry>,
    loaded_at: Instant,
}

pub struct HotEntryCache {
    capacity: usize,
    ttl: Duration,
    clock: Box<dyn Clock>,
    slot: Mutex<Option<Slot>>,
}

impl HotEntryCache {
    pub fn new(settings: &IndexCacheSettings) -> Self {
        Self::with_clock(settings, Box::new(SystemClock))
    }

    pub fn with_clock(settings: &IndexCacheSettings, clock: Box<dyn Clock>) -> Self {
        Self {
            capacity: settings.capacity,
            ttl: Duration::from_secs(settings.ttl_secs),
            clock,
            slot: Mutex::new(None),
        }
    }

    /// A snapshot of the cached entries, or `None` when empty or stale.
    pub fn get(&self) -> Option<Vec<IndexEntry>> {
        let guard = self.slot.lock().ok()?;
        let slot = guard.as_ref()?;
        if self.clock.now().duration_since(slot.loaded_at) > self.ttl {
            return None;
        }
        Some(slot.entries.clone())
    }

    /// Install the top entries by importance, bounded by capacity.
    pub fn fill(&self, mut entries: Vec<IndexEntry>) {
        entries.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.frequency.cmp(&a.frequency))
                .then_with(|| a.term.cmp(&b.term))
        });
        entries.truncate(self.capacity);
        if let Ok(mut guard) = self.slot.lock() {
            *guard = Some(Slot {
                entries,
                loaded_at: self.clock.now(),
            });
        }
    }

    /// Drop whatever is cached (called after an index rebuild).
    pub fn clear(&self) {
        if let Ok(mut guard) = self.slot.lock() {
            *guard = None;
        }
    }
}
