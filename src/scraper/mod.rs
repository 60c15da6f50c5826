// ABOUTME: Play Store review collection with pagination, dedup and rating filter
// ABOUTME: Fetcher trait seam keeps the wire protocol separate from collection logic

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

/// Play Store batchexecute wire fetcher
pub mod play_store;

use crate::constants::scraping::{MAX_PAGE_ATTEMPTS, PAGE_PAUSE_SECS, PAGE_SIZE};
use crate::errors::AppResult;
use crate::models::ReviewRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Review ordering requested from the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Newest reviews first
    #[default]
    Recientes,
    /// Store relevance ranking
    Relevantes,
}

impl SortOrder {
    /// Wire name as it appears in requests and stats
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recientes => "recientes",
            Self::Relevantes => "relevantes",
        }
    }
}

/// Review as it comes off the wire, before filtering
#[derive(Debug, Clone)]
pub struct RawReview {
    /// Store-assigned review identifier
    pub id: String,
    /// Reviewer display name, empty when withheld
    pub author: String,
    /// Review text, empty when the user left only a rating
    pub text: String,
    /// Star rating 1-5
    pub rating: u8,
    /// Review date, `YYYY-MM-DD`
    pub date: String,
}

/// One page of reviews plus the continuation token for the next page
pub type ReviewPage = (Vec<RawReview>, Option<String>);

/// Wire seam for fetching one page of store reviews
#[async_trait::async_trait]
pub trait ReviewPageFetcher: Send + Sync {
    /// Fetch up to `count` reviews, continuing from `token` when present
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or an unparseable store response
    async fn fetch_page(
        &self,
        app_id: &str,
        lang: &str,
        country: &str,
        sort: SortOrder,
        count: usize,
        token: Option<&str>,
    ) -> AppResult<ReviewPage>;
}

/// Collection statistics reported alongside scraped reviews
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeStats {
    /// Reviews inspected across all pages, before any filtering
    #[serde(rename = "total_comentarios_revisados")]
    pub total_reviewed: u64,
    /// Reviews dropped because their id was already seen
    #[serde(rename = "duplicados_evitados")]
    pub duplicates_skipped: u64,
    /// Pages fetched
    #[serde(rename = "paginas_procesadas")]
    pub pages_processed: u32,
    /// Rating ceiling applied (reviews above it are dropped)
    #[serde(rename = "filtro_estrellas")]
    pub rating_ceiling: u8,
    /// Sort order used
    #[serde(rename = "criterio_busqueda")]
    pub sort: SortOrder,
    /// Store country
    #[serde(rename = "pais")]
    pub country: String,
    /// Review language
    #[serde(rename = "idioma")]
    pub language: String,
}

/// Result of one scraping run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeOutcome {
    /// Negative reviews, deduplicated, at most the requested count
    pub reviews: Vec<ReviewRecord>,
    /// Number of reviews returned
    pub total_found: usize,
    /// Collection statistics
    pub stats: ScrapeStats,
}

/// Review collector over a page fetcher
///
/// Paginates until the target count is reached, the page budget is spent, or
/// the store stops returning continuation tokens. A page failure ends the run
/// with whatever was collected so far.
pub struct ReviewScraper {
    fetcher: Arc<dyn ReviewPageFetcher>,
    page_pause: Duration,
}

impl ReviewScraper {
    /// Create a scraper with the standard inter-page pause
    #[must_use]
    pub fn new(fetcher: Arc<dyn ReviewPageFetcher>) -> Self {
        Self {
            fetcher,
            page_pause: Duration::from_secs(PAGE_PAUSE_SECS),
        }
    }

    /// Override the inter-page pause (tests use zero)
    #[must_use]
    pub const fn with_page_pause(mut self, pause: Duration) -> Self {
        self.page_pause = pause;
        self
    }

    /// Collect negative reviews for an app
    ///
    /// Keeps reviews with rating at or below `rating_ceiling`, deduplicated by
    /// review id, up to `max_count` entries.
    ///
    /// # Errors
    ///
    /// Returns an error only when the first page fails; later page failures
    /// degrade to a shorter result
    pub async fn scrape_negative_reviews(
        &self,
        app_id: &str,
        max_count: usize,
        rating_ceiling: u8,
        sort: SortOrder,
        lang: &str,
        country: &str,
    ) -> AppResult<ScrapeOutcome> {
        info!(
            app_id,
            max_count,
            rating_ceiling,
            sort = sort.as_str(),
            "Starting review collection"
        );

        let mut collected: Vec<ReviewRecord> = Vec::new();
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut total_reviewed: u64 = 0;
        let mut duplicates_skipped: u64 = 0;
        let mut pages_processed: u32 = 0;
        let mut token: Option<String> = None;

        while collected.len() < max_count && pages_processed < MAX_PAGE_ATTEMPTS {
            let page = self
                .fetcher
                .fetch_page(app_id, lang, country, sort, PAGE_SIZE, token.as_deref())
                .await;

            let (reviews, next_token) = match page {
                Ok(page) => page,
                Err(e) => {
                    if pages_processed == 0 {
                        return Err(e);
                    }
                    warn!(page = pages_processed + 1, error = %e, "Page fetch failed, stopping collection");
                    break;
                }
            };

            if reviews.is_empty() {
                info!("No more reviews available");
                break;
            }

            for raw in &reviews {
                total_reviewed += 1;

                if raw.rating > rating_ceiling {
                    continue;
                }
                if !seen_ids.insert(raw.id.clone()) {
                    duplicates_skipped += 1;
                    continue;
                }

                collected.push(ReviewRecord {
                    id: raw.id.clone(),
                    text: raw.text.clone(),
                    rating: raw.rating,
                    date: raw.date.clone(),
                    author: if raw.author.is_empty() {
                        "Usuario anónimo".to_owned()
                    } else {
                        raw.author.clone()
                    },
                });
            }

            pages_processed += 1;
            info!(
                page = pages_processed,
                collected = collected.len(),
                target = max_count,
                "Page processed"
            );

            token = next_token;
            if token.is_none() {
                info!("Store returned no continuation token");
                break;
            }

            if collected.len() < max_count && !self.page_pause.is_zero() {
                tokio::time::sleep(self.page_pause).await;
            }
        }

        collected.truncate(max_count);
        let total_found = collected.len();

        info!(total_found, "Review collection complete");

        Ok(ScrapeOutcome {
            reviews: collected,
            total_found,
            stats: ScrapeStats {
                total_reviewed,
                duplicates_skipped,
                pages_processed,
                rating_ceiling,
                sort,
                country: country.to_owned(),
                language: lang.to_owned(),
            },
        })
    }
}
