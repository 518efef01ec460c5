//! Fixed-window request counting per client key.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;

use crate::metrics::RATE_LIMIT_KEYS;

// Rate limit entry - tracks requests per IP/key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_start: Instant,
}

impl RateLimitEntry {
    pub fn first(now: Instant) -> Self {
        Self {
            count: 1,
            window_start: now,
        }
    }

    fn expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.window_start) > window
    }
}

/// Storage for rate limit records, keyed by client key.
///
/// The default [`update`](RateLimitStore::update) is a plain get followed by a
/// set, so two concurrent requests for the same key can both read the old
/// count. Stores that can lock a key should override it.
pub trait RateLimitStore: Send + Sync {
    fn get(&self, key: &str) -> Option<RateLimitEntry>;

    fn set(&self, key: &str, entry: RateLimitEntry);

    /// Drops every record whose window has elapsed, returning how many went.
    fn evict_expired(&self, now: Instant, window: Duration) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<RateLimitEntry>) -> RateLimitEntry,
    ) -> RateLimitEntry {
        let next = apply(self.get(key));
        self.set(key, next);
        next
    }
}

/// In-process store. Updates hold the shard lock for the key, so the
/// read-modify-write is atomic.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, RateLimitEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimitStore for MemoryStore {
    fn get(&self, key: &str) -> Option<RateLimitEntry> {
        self.entries.get(key).map(|e| *e)
    }

    fn set(&self, key: &str, entry: RateLimitEntry) {
        self.entries.insert(key.to_string(), entry);
    }

    fn evict_expired(&self, now: Instant, window: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.expired(now, window));
        before.saturating_sub(self.entries.len())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<RateLimitEntry>) -> RateLimitEntry,
    ) -> RateLimitEntry {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let next = apply(Some(*occupied.get()));
                *occupied.get_mut() = next;
                next
            }
            Entry::Vacant(vacant) => {
                let next = apply(None);
                vacant.insert(next);
                next
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { count: u32 },
    Limited { count: u32 },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, max_requests: u32, window: Duration) -> Self {
        Self {
            store,
            max_requests,
            window,
        }
    }

    pub fn in_memory(max_requests: u32, window: Duration) -> Self {
        Self::new(Arc::new(MemoryStore::new()), max_requests, window)
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn tracked_keys(&self) -> usize {
        self.store.len()
    }

    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    /// Counts one request for `key` at `now`. The count keeps rising while a
    /// client is limited and only drops back to 1 once the window expires.
    pub fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let window = self.window;
        let entry = self.store.update(key, &mut |current: Option<RateLimitEntry>| match current {
            Some(entry) if !entry.expired(now, window) => RateLimitEntry {
                count: entry.count.saturating_add(1),
                ..entry
            },
            // first request, or the window is over
            _ => RateLimitEntry::first(now),
        });

        if entry.count > self.max_requests {
            RateDecision::Limited { count: entry.count }
        } else {
            RateDecision::Allowed { count: entry.count }
        }
    }

    pub fn evict_expired(&self) -> usize {
        self.store.evict_expired(Instant::now(), self.window)
    }
}

// Sweeper - drops stale records so the store does not grow without bound
pub async fn sweeper(limiter: RateLimiter, every: Duration) {
    let mut interval = interval(every);

    tracing::info!(interval = ?every, "rate limit sweeper started");

    loop {
        interval.tick().await;

        let removed = limiter.evict_expired();
        let remaining = limiter.tracked_keys();
        RATE_LIMIT_KEYS.set(remaining as f64);

        if removed > 0 {
            tracing::debug!(removed, remaining, "evicted expired rate limit records");
        }
    }
}
