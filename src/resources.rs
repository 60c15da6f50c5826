// ABOUTME: Shared server resources constructed once and injected into routes
// ABOUTME: Holds configuration, cache and the pipeline components behind their seams

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

use crate::cache::factory::Cache;
use crate::config::ServerConfig;
use crate::inference::TextClassifier;
use crate::llm::ChatProvider;
use crate::pipeline::CascadeFilter;
use crate::scraper::{ReviewPageFetcher, ReviewScraper};
use crate::synthesis::RequirementSynthesizer;
use std::sync::Arc;

/// Long-lived resources shared across request handlers
///
/// Constructed once at startup and passed as `Arc<ServerResources>` through
/// the router state. Provider seams take trait objects so tests can inject
/// stubs for the classifier, the chat backend and the review fetcher.
pub struct ServerResources {
    /// Resolved server configuration
    pub config: ServerConfig,
    /// Best-effort response cache
    pub cache: Cache,
    /// Two-stage classification cascade
    pub cascade: CascadeFilter,
    /// Requirement synthesizer
    pub synthesizer: RequirementSynthesizer,
    /// Review collector
    pub scraper: ReviewScraper,
}

impl ServerResources {
    /// Assemble resources from configuration and provider implementations
    #[must_use]
    pub fn new(
        config: ServerConfig,
        classifier: Arc<dyn TextClassifier>,
        chat_provider: Arc<dyn ChatProvider>,
        fetcher: Arc<dyn ReviewPageFetcher>,
        cache: Cache,
    ) -> Self {
        Self {
            config,
            cache,
            cascade: CascadeFilter::new(classifier),
            synthesizer: RequirementSynthesizer::new(chat_provider),
            scraper: ReviewScraper::new(fetcher),
        }
    }
}
