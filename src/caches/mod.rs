//! Caches for remote repository responses.
//!
//! The [`ResponseCache`] sits between the command pipeline and the network.
//! It stores raw response bodies keyed by the canonical request URL, so that a
//! directory walk that lists the same parent several times only pays for the
//! first listing.

mod response_cache;

pub use response_cache::{
    CacheConfig, CacheError, CacheStats, ResponseCache, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL,
    DEFAULT_MAX_BODY_SIZE,
};
