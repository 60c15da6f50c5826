// ABOUTME: Integration tests for review collection: dedup, rating filter, pagination
// ABOUTME: Uses a scripted page fetcher so no store traffic happens

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

mod common;

use anyhow::Result;
use common::{raw_review, StubFetcher};
use elicit_server::scraper::{RawReview, ReviewScraper, SortOrder};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn scraper(fetcher: Arc<StubFetcher>) -> ReviewScraper {
    ReviewScraper::new(fetcher).with_page_pause(Duration::ZERO)
}

#[tokio::test]
async fn collects_negative_reviews_across_pages() -> Result<()> {
    let fetcher = Arc::new(StubFetcher::new(vec![
        (
            vec![raw_review("a", 1, "no funciona"), raw_review("b", 2, "se cae")],
            Some("tok-1".to_owned()),
        ),
        (vec![raw_review("c", 3, "lento")], None),
    ]));
    let scraper = scraper(fetcher.clone());

    let outcome = scraper
        .scrape_negative_reviews("com.example.app", 10, 3, SortOrder::Recientes, "es", "pe")
        .await?;

    assert_eq!(outcome.total_found, 3);
    assert_eq!(
        outcome.reviews.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
        vec!["a", "b", "c"]
    );
    assert_eq!(outcome.stats.pages_processed, 2);
    assert_eq!(outcome.stats.total_reviewed, 3);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn reviews_above_the_rating_ceiling_are_dropped() -> Result<()> {
    let fetcher = Arc::new(StubFetcher::new(vec![(
        vec![
            raw_review("a", 1, "no funciona"),
            raw_review("b", 4, "casi bien"),
            raw_review("c", 5, "excelente"),
        ],
        None,
    )]));
    let scraper = scraper(fetcher);

    let outcome = scraper
        .scrape_negative_reviews("com.example.app", 10, 3, SortOrder::Recientes, "es", "pe")
        .await?;

    assert_eq!(outcome.total_found, 1);
    assert_eq!(outcome.reviews[0].id, "a");
    assert_eq!(outcome.stats.total_reviewed, 3);
    assert_eq!(outcome.stats.rating_ceiling, 3);
    Ok(())
}

#[tokio::test]
async fn duplicate_ids_are_skipped_and_counted() -> Result<()> {
    let fetcher = Arc::new(StubFetcher::new(vec![
        (
            vec![raw_review("a", 1, "no funciona")],
            Some("tok-1".to_owned()),
        ),
        (
            vec![raw_review("a", 1, "no funciona"), raw_review("b", 2, "se cae")],
            None,
        ),
    ]));
    let scraper = scraper(fetcher);

    let outcome = scraper
        .scrape_negative_reviews("com.example.app", 10, 3, SortOrder::Recientes, "es", "pe")
        .await?;

    assert_eq!(outcome.total_found, 2);
    assert_eq!(outcome.stats.duplicates_skipped, 1);
    Ok(())
}

#[tokio::test]
async fn collection_stops_at_the_requested_count() -> Result<()> {
    let page: Vec<RawReview> = (0..100)
        .map(|i| raw_review(&format!("r{i}"), 1, "malo"))
        .collect();
    let fetcher = Arc::new(StubFetcher::new(vec![
        (page.clone(), Some("tok-1".to_owned())),
        (
            (100..200)
                .map(|i| raw_review(&format!("r{i}"), 1, "malo"))
                .collect(),
            Some("tok-2".to_owned()),
        ),
    ]));
    let scraper = scraper(fetcher.clone());

    let outcome = scraper
        .scrape_negative_reviews("com.example.app", 150, 3, SortOrder::Recientes, "es", "pe")
        .await?;

    assert_eq!(outcome.total_found, 150);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn empty_page_ends_the_run() -> Result<()> {
    let fetcher = Arc::new(StubFetcher::new(vec![(
        Vec::new(),
        Some("tok-1".to_owned()),
    )]));
    let scraper = scraper(fetcher.clone());

    let outcome = scraper
        .scrape_negative_reviews("com.example.app", 10, 3, SortOrder::Recientes, "es", "pe")
        .await?;

    assert_eq!(outcome.total_found, 0);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn missing_continuation_token_ends_the_run() -> Result<()> {
    let fetcher = Arc::new(StubFetcher::new(vec![(
        vec![raw_review("a", 1, "no funciona")],
        None,
    )]));
    let scraper = scraper(fetcher.clone());

    let outcome = scraper
        .scrape_negative_reviews("com.example.app", 10, 3, SortOrder::Recientes, "es", "pe")
        .await?;

    assert_eq!(outcome.total_found, 1);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn page_budget_caps_the_run() -> Result<()> {
    // Every page yields one filtered-out review and a fresh token; the run
    // must stop at the page budget instead of looping forever
    let pages: Vec<_> = (0..20)
        .map(|i| {
            (
                vec![raw_review(&format!("p{i}"), 5, "excelente")],
                Some(format!("tok-{i}")),
            )
        })
        .collect();
    let fetcher = Arc::new(StubFetcher::new(pages));
    let scraper = scraper(fetcher.clone());

    let outcome = scraper
        .scrape_negative_reviews("com.example.app", 10, 3, SortOrder::Recientes, "es", "pe")
        .await?;

    assert_eq!(outcome.total_found, 0);
    assert_eq!(outcome.stats.pages_processed, 10);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 10);
    Ok(())
}

#[tokio::test]
async fn anonymous_author_gets_a_fallback_name() -> Result<()> {
    let mut review = raw_review("a", 1, "no funciona");
    review.author = String::new();
    let fetcher = Arc::new(StubFetcher::new(vec![(vec![review], None)]));
    let scraper = scraper(fetcher);

    let outcome = scraper
        .scrape_negative_reviews("com.example.app", 10, 3, SortOrder::Recientes, "es", "pe")
        .await?;

    assert_eq!(outcome.reviews[0].author, "Usuario anónimo");
    Ok(())
}

#[tokio::test]
async fn stats_echo_the_request_parameters() -> Result<()> {
    let fetcher = Arc::new(StubFetcher::new(vec![(
        vec![raw_review("a", 1, "no funciona")],
        None,
    )]));
    let scraper = scraper(fetcher);

    let outcome = scraper
        .scrape_negative_reviews("com.example.app", 10, 2, SortOrder::Relevantes, "es", "pe")
        .await?;

    assert_eq!(outcome.stats.sort, SortOrder::Relevantes);
    assert_eq!(outcome.stats.country, "pe");
    assert_eq!(outcome.stats.language, "es");
    assert_eq!(outcome.stats.rating_ceiling, 2);
    Ok(())
}
