// ABOUTME: Application constants and default configuration values
// ABOUTME: Centralizes batch sizes, retry budgets, cache tuning, and service names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

//! Application-wide constants

/// Service identity strings
pub mod service_names {
    /// Service name for structured logging
    pub const ELICIT_SERVER: &str = "elicit-server";
}

/// Cascade classification defaults
pub mod pipeline {
    /// Number of comments sent to an inference endpoint per request
    pub const DEFAULT_BATCH_SIZE: usize = 32;

    /// Decimal places kept on classifier confidence scores.
    /// Rounding keeps downstream comparisons and cache keys deterministic.
    pub const CONFIDENCE_DECIMALS: u32 = 4;
}

/// Requirement synthesis defaults
pub mod synthesis {
    /// Maximum attempts against the generative engine before giving up
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// Sampling temperature for requirement generation
    pub const TEMPERATURE: f32 = 0.7;

    /// Token budget for bulk generation (many detailed requirements)
    pub const BULK_MAX_TOKENS: u32 = 16_000;

    /// Token budget for single-comment generation
    pub const SINGLE_MAX_TOKENS: u32 = 1_000;

    /// Default id when the engine omits one on the single-comment path
    pub const DEFAULT_REQUIREMENT_ID: &str = "NFR-001";
}

/// Review scraping defaults
pub mod scraping {
    /// Reviews requested per page from the store feed
    pub const PAGE_SIZE: usize = 100;

    /// Maximum pages fetched per scrape before giving up
    pub const MAX_PAGE_ATTEMPTS: u32 = 10;

    /// Pause between page requests, in seconds
    pub const PAGE_PAUSE_SECS: u64 = 2;

    /// Default review language
    pub const DEFAULT_LANG: &str = "es";

    /// Default review country
    pub const DEFAULT_COUNTRY: &str = "pe";
}

/// Cache configuration defaults
pub mod cache {
    /// Maximum entries for the in-memory backend
    pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 1_000;

    /// Background cleanup interval for expired entries, in seconds
    pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300;

    /// Namespace prefix for all cache keys
    pub const CACHE_KEY_PREFIX: &str = "elicit:";

    /// TTL for memoized scrape results, in seconds
    pub const TTL_SCRAPE_SECS: u64 = 3_600;

    /// TTL for memoized single-comment results, in seconds
    pub const TTL_SINGLE_COMMENT_SECS: u64 = 3_600;
}
