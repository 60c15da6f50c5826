// ABOUTME: Cache abstraction layer for best-effort pipeline memoization
// ABOUTME: Pluggable backend support (in-memory, Redis) with deterministic request-derived keys
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

/// Cache factory for backend selection
pub mod factory;
/// In-memory cache implementation
pub mod memory;
/// Redis cache implementation
pub mod redis;

use crate::constants::cache::{DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CLEANUP_INTERVAL_SECS};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;

/// Cache provider trait for pluggable backend implementations
///
/// Callers treat every operation as best-effort: a failed read or write
/// degrades to a cache miss at the call site and never fails the pipeline.
#[async_trait::async_trait]
pub trait CacheProvider: Send + Sync + Clone {
    /// Create new cache instance with configuration
    ///
    /// # Errors
    ///
    /// Returns an error if cache initialization fails
    async fn new(config: CacheConfig) -> AppResult<Self>
    where
        Self: Sized;

    /// Store value in cache with TTL
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or storage fails
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Duration,
    ) -> AppResult<()>;

    /// Retrieve value from cache
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails
    async fn get<T: for<'de> Deserialize<'de>>(&self, key: &CacheKey) -> AppResult<Option<T>>;

    /// Remove single cache entry
    ///
    /// # Errors
    ///
    /// Returns an error if invalidation fails
    async fn invalidate(&self, key: &CacheKey) -> AppResult<()>;

    /// Remove all cache entries matching pattern (e.g., "scrape:*")
    ///
    /// # Errors
    ///
    /// Returns an error if pattern invalidation fails
    async fn invalidate_pattern(&self, pattern: &str) -> AppResult<u64>;

    /// Check if key exists in cache
    ///
    /// # Errors
    ///
    /// Returns an error if existence check fails
    async fn exists(&self, key: &CacheKey) -> AppResult<bool>;

    /// Get remaining TTL for key
    ///
    /// # Errors
    ///
    /// Returns an error if TTL check fails
    async fn ttl(&self, key: &CacheKey) -> AppResult<Option<Duration>>;

    /// Verify cache backend is healthy
    ///
    /// # Errors
    ///
    /// Returns an error if health check fails
    async fn health_check(&self) -> AppResult<()>;

    /// Clear all cache entries (for testing/admin)
    ///
    /// # Errors
    ///
    /// Returns an error if clear operation fails
    async fn clear_all(&self) -> AppResult<()>;
}

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries (for in-memory cache)
    pub max_entries: usize,
    /// Redis connection URL (for Redis cache)
    pub redis_url: Option<String>,
    /// Cleanup interval for expired entries
    pub cleanup_interval: Duration,
    /// Enable background cleanup task (false in tests to avoid runtime conflicts)
    pub enable_background_cleanup: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            redis_url: None,
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
            enable_background_cleanup: true,
        }
    }
}

/// A namespaced cache key derived from a request payload
///
/// The digest is order-independent: the payload is serialized as canonical
/// JSON (object keys sorted) before hashing, so semantically identical
/// requests collide regardless of field order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Logical namespace, e.g. "scrape" or "single"
    pub prefix: String,
    /// First 16 hex characters of the SHA-256 of the canonical payload
    pub digest: String,
}

impl CacheKey {
    /// Derive a deterministic key from a serializable payload
    ///
    /// # Errors
    ///
    /// Returns an error if the payload fails to serialize
    pub fn from_payload<T: Serialize>(prefix: &str, payload: &T) -> AppResult<Self> {
        // serde_json's default Map is a BTreeMap, so converting through
        // Value yields sorted object keys at every nesting level.
        let canonical = serde_json::to_value(payload)
            .and_then(|value| serde_json::to_string(&value))
            .map_err(|e| AppError::serialization(format!("Cache key payload: {e}")))?;

        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let digest = hex::encode(hasher.finalize());

        Ok(Self {
            prefix: prefix.to_owned(),
            digest: digest[..16].to_owned(),
        })
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.prefix, self.digest)
    }
}

/// Derive the string form of a deterministic cache key in one step
///
/// # Errors
///
/// Returns an error if the payload fails to serialize
pub fn generate_cache_key<T: Serialize>(prefix: &str, payload: &T) -> AppResult<String> {
    Ok(CacheKey::from_payload(prefix, payload)?.to_string())
}
