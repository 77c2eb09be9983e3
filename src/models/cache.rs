use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::models::payload::Records;
use crate::utils::clock::{Clock, SystemClock};

/// Dashboard endpoints are considered fresh for 30 seconds.
pub const DEFAULT_TTL: Duration = Duration::from_millis(30_000);

/// Shared handle to a fetched record set. Cache hits hand out clones of the
/// same `Arc`, never copies of the records.
pub type Payload = Arc<Records>;

#[derive(Debug, Clone)]
pub struct CachedPayload {
    pub data: Payload,
    pub fetched_at: Instant,
    pub ttl: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Fresh,
    Stale,
}

impl std::fmt::Display for CacheState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CacheState::Empty => "empty",
            CacheState::Fresh => "fresh",
            CacheState::Stale => "stale",
        };
        f.write_str(label)
    }
}

/// Holds at most one payload for one endpoint.
///
/// The lock is only taken for the duration of a pointer read or swap, never
/// across an await, so overlapping fetches simply race to `set` and the last
/// one to complete wins.
pub struct CacheStore {
    entry: RwLock<Option<CachedPayload>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entry: RwLock::new(None),
            ttl,
            clock,
        }
    }

    /// Current payload and how long ago it was fetched.
    pub fn get(&self) -> Option<(CachedPayload, Duration)> {
        let entry = self.read().clone()?;
        let age = self.clock.now().saturating_duration_since(entry.fetched_at);
        Some((entry, age))
    }

    /// Replace the stored payload, stamping it with the current time.
    pub fn set(&self, data: Payload) {
        let cached = CachedPayload {
            data,
            fetched_at: self.clock.now(),
            ttl: self.ttl,
        };
        *self.entry.write().unwrap_or_else(|e| e.into_inner()) = Some(cached);
    }

    pub fn is_fresh(&self) -> bool {
        self.state() == CacheState::Fresh
    }

    pub fn state(&self) -> CacheState {
        match self.get() {
            None => CacheState::Empty,
            Some((_, age)) if age < self.ttl => CacheState::Fresh,
            Some(_) => CacheState::Stale,
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<CachedPayload>> {
        self.entry.read().unwrap_or_else(|e| e.into_inner())
    }
}
