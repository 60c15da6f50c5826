// ABOUTME: Cache factory selecting between Redis and in-memory backends
// ABOUTME: Falls back to in-memory when Redis is unconfigured or unreachable
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

use super::{memory::InMemoryCache, redis::RedisCache, CacheConfig, CacheKey, CacheProvider};
use crate::config::environment::CacheSettings;
use crate::errors::AppResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone)]
enum CacheBackend {
    Memory(InMemoryCache),
    Redis(RedisCache),
}

/// Unified cache interface over the configured backend
///
/// Redis is used when a URL is configured and reachable at startup; otherwise
/// the service degrades to a per-instance in-memory cache rather than failing.
#[derive(Clone)]
pub struct Cache {
    backend: CacheBackend,
}

impl Cache {
    /// Create new cache instance based on configuration
    ///
    /// # Errors
    ///
    /// Returns an error if in-memory cache initialization fails
    pub async fn new(config: CacheConfig) -> AppResult<Self> {
        if config.redis_url.is_some() {
            match RedisCache::new(config.clone()).await {
                Ok(redis) => {
                    return Ok(Self {
                        backend: CacheBackend::Redis(redis),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Redis cache unavailable, falling back to in-memory cache"
                    );
                }
            }
        }

        tracing::info!(
            "Initializing in-memory cache (max entries: {})",
            config.max_entries
        );
        let memory = InMemoryCache::new(config).await?;
        Ok(Self {
            backend: CacheBackend::Memory(memory),
        })
    }

    /// Create cache from resolved settings
    ///
    /// # Errors
    ///
    /// Returns an error if cache initialization fails
    pub async fn from_settings(settings: &CacheSettings) -> AppResult<Self> {
        let config = CacheConfig {
            max_entries: settings.max_entries,
            redis_url: settings.redis_url.clone(),
            cleanup_interval: Duration::from_secs(settings.cleanup_interval_secs),
            enable_background_cleanup: true,
        };

        Self::new(config).await
    }

    /// Whether the active backend is Redis
    #[must_use]
    pub const fn is_distributed(&self) -> bool {
        matches!(self.backend, CacheBackend::Redis(_))
    }

    /// Store value in cache with TTL
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or storage fails
    pub async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Duration,
    ) -> AppResult<()> {
        match &self.backend {
            CacheBackend::Memory(c) => c.set(key, value, ttl).await,
            CacheBackend::Redis(c) => c.set(key, value, ttl).await,
        }
    }

    /// Retrieve value from cache
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails
    pub async fn get<T: for<'de> Deserialize<'de>>(&self, key: &CacheKey) -> AppResult<Option<T>> {
        match &self.backend {
            CacheBackend::Memory(c) => c.get(key).await,
            CacheBackend::Redis(c) => c.get(key).await,
        }
    }

    /// Remove single cache entry
    ///
    /// # Errors
    ///
    /// Returns an error if invalidation fails
    pub async fn invalidate(&self, key: &CacheKey) -> AppResult<()> {
        match &self.backend {
            CacheBackend::Memory(c) => c.invalidate(key).await,
            CacheBackend::Redis(c) => c.invalidate(key).await,
        }
    }

    /// Remove all cache entries matching pattern
    ///
    /// # Errors
    ///
    /// Returns an error if pattern invalidation fails
    pub async fn invalidate_pattern(&self, pattern: &str) -> AppResult<u64> {
        match &self.backend {
            CacheBackend::Memory(c) => c.invalidate_pattern(pattern).await,
            CacheBackend::Redis(c) => c.invalidate_pattern(pattern).await,
        }
    }

    /// Check if key exists in cache
    ///
    /// # Errors
    ///
    /// Returns an error if existence check fails
    pub async fn exists(&self, key: &CacheKey) -> AppResult<bool> {
        match &self.backend {
            CacheBackend::Memory(c) => c.exists(key).await,
            CacheBackend::Redis(c) => c.exists(key).await,
        }
    }

    /// Get remaining TTL for key
    ///
    /// # Errors
    ///
    /// Returns an error if TTL check fails
    pub async fn ttl(&self, key: &CacheKey) -> AppResult<Option<Duration>> {
        match &self.backend {
            CacheBackend::Memory(c) => c.ttl(key).await,
            CacheBackend::Redis(c) => c.ttl(key).await,
        }
    }

    /// Verify cache backend is healthy
    ///
    /// # Errors
    ///
    /// Returns an error if health check fails
    pub async fn health_check(&self) -> AppResult<()> {
        match &self.backend {
            CacheBackend::Memory(c) => c.health_check().await,
            CacheBackend::Redis(c) => c.health_check().await,
        }
    }

    /// Clear all cache entries
    ///
    /// # Errors
    ///
    /// Returns an error if clear operation fails
    pub async fn clear_all(&self) -> AppResult<()> {
        match &self.backend {
            CacheBackend::Memory(c) => c.clear_all().await,
            CacheBackend::Redis(c) => c.clear_all().await,
        }
    }
}
