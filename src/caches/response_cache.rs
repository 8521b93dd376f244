//! Response body cache.
//!
//! Maps a fully-built request URL to the raw body the server returned for it.
//! Entries are bounded by count (every entry costs one unit, whatever the body
//! size) and expire a fixed time after insertion.
//!
//! `get` and `set` hold a shared lock for their whole duration; `clear` holds
//! the exclusive side, so a clear never interleaves with a lookup or a store.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use bytes::Bytes;
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use thiserror::Error;

// =============================================================================
// Configuration
// =============================================================================

/// Default maximum number of cached bodies.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Default time-to-live of a cached body.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Default size above which bodies are never cached.
pub const DEFAULT_MAX_BODY_SIZE: u64 = 100 * 1024 * 1024; // 100MB

/// Configuration for the response cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries.
    pub capacity: usize,
    /// Absolute lifetime of an entry, measured from insertion.
    pub ttl: Duration,
    /// Bodies larger than this many bytes bypass the cache.
    pub max_body_size: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            ttl: DEFAULT_CACHE_TTL,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised while building a cache. There are no runtime cache errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("invalid cache capacity: {0}")]
    InvalidCapacity(usize),

    #[error("invalid cache ttl: {0:?}")]
    InvalidTtl(Duration),
}

// =============================================================================
// ResponseCache
// =============================================================================

struct CachedBody {
    body: Bytes,
    inserted: Instant,
}

/// Hit/miss counters for a [`ResponseCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// A bounded, time-limited map from request URL to response body.
pub struct ResponseCache {
    clear_lock: RwLock<()>,
    entries: Mutex<LruCache<String, CachedBody>>,
    ttl: Duration,
    max_body_size: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    /// Build a cache from its configuration.
    pub fn new(config: &CacheConfig) -> Result<Self, CacheError> {
        let capacity =
            NonZeroUsize::new(config.capacity).ok_or(CacheError::InvalidCapacity(config.capacity))?;
        if config.ttl.is_zero() {
            return Err(CacheError::InvalidTtl(config.ttl));
        }

        Ok(Self {
            clear_lock: RwLock::new(()),
            entries: Mutex::new(LruCache::new(capacity)),
            ttl: config.ttl,
            max_body_size: config.max_body_size,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// The size above which bodies are not stored.
    pub fn max_body_size(&self) -> u64 {
        self.max_body_size
    }

    /// Look up the body stored under `key`.
    ///
    /// Expired entries are dropped on the way out and reported as misses.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let _shared = self.clear_lock.read();
        let mut entries = self.entries.lock();

        let expired = entries
            .peek(key)
            .is_some_and(|cached| cached.inserted.elapsed() >= self.ttl);
        if expired {
            entries.pop(key);
        }
        let found = entries.get(key).map(|cached| cached.body.clone());

        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Store `body` under `key`, evicting the least recently used entry when full.
    ///
    /// Returns false if the body exceeds the size threshold and was not stored.
    pub fn set(&self, key: impl Into<String>, body: Bytes) -> bool {
        if body.len() as u64 > self.max_body_size {
            return false;
        }

        let _shared = self.clear_lock.read();
        self.entries.lock().put(
            key.into(),
            CachedBody {
                body,
                inserted: Instant::now(),
            },
        );
        true
    }

    /// Drop every entry, regardless of age.
    pub fn clear(&self) {
        let _exclusive = self.clear_lock.write();
        self.entries.lock().clear();
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
