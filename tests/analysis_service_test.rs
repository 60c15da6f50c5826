// ABOUTME: Integration tests for the bulk analysis flow end to end over stubs
// ABOUTME: Covers pipeline statistics, synthesis degradation and response caching

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

mod common;

use anyhow::Result;
use common::{
    raw_review, test_resources, ScriptedTurn, StubChatProvider, StubClassifier, StubFetcher,
};
use elicit_server::scraper::SortOrder;
use elicit_server::services::analysis::{AnalysisJob, AnalysisService};
use std::sync::atomic::Ordering;
use std::sync::Arc;

const BULK_RESPONSE: &str = r#"{
    "requisitos": [
        {
            "id": "NFR-001",
            "categoria": "autenticidad",
            "requisito": "El servicio de autenticación deberá validar credenciales en menos de 2 segundos.",
            "prioridad": "Alta",
            "justificacion": "Usuarios reportan fallos de inicio de sesión",
            "criterios_aceptacion": ["El servicio deberá responder en menos de 2 segundos en el 95% de los casos"],
            "comentarios_relacionados": 2
        }
    ]
}"#;

fn job() -> AnalysisJob {
    AnalysisJob {
        app_id: "com.example.app".to_owned(),
        max_reviews: 100,
        max_rating: 3,
        sort: SortOrder::Recientes,
        model: None,
    }
}

#[tokio::test]
async fn pipeline_reports_statistics_and_requirements() -> Result<()> {
    let relevant = ["no puedo entrar con mi huella", "la app expone mis datos"];
    let classifier = Arc::new(StubClassifier::new(&relevant, "autenticidad", 0.9));
    let provider = Arc::new(StubChatProvider::always(BULK_RESPONSE));
    let fetcher = Arc::new(StubFetcher::new(vec![(
        vec![
            raw_review("a", 1, relevant[0]),
            raw_review("b", 2, relevant[1]),
            raw_review("c", 1, "muy lenta la interfaz"),
        ],
        None,
    )]));
    let resources = test_resources(classifier, provider, fetcher).await;
    let service = AnalysisService::new(resources);

    let response = service.analyze_app(&job()).await?;

    assert!(response.success);
    assert_eq!(response.app_id, "com.example.app");
    assert_eq!(response.total_reviews, 2);
    assert_eq!(response.stats.pre_filter_count, 3);
    assert_eq!(response.stats.relevant_count, 2);
    assert_eq!(response.stats.relevance_rate, 0.6667);
    assert_eq!(
        response.stats.category_distribution.get("autenticidad"),
        Some(&2)
    );
    let document = response.requirements.expect("requirements document");
    assert!(document.has_requirements());
    assert_eq!(document.summary.total_requirements, 1);
    Ok(())
}

#[tokio::test]
async fn synthesis_failure_degrades_to_classification_only() -> Result<()> {
    let relevant = ["no puedo entrar con mi huella"];
    let classifier = Arc::new(StubClassifier::new(&relevant, "autenticidad", 0.9));
    let provider = Arc::new(StubChatProvider::new(vec![ScriptedTurn::Fail(
        "gateway timeout".to_owned(),
    )]));
    let fetcher = Arc::new(StubFetcher::new(vec![(
        vec![raw_review("a", 1, relevant[0])],
        None,
    )]));
    let resources = test_resources(classifier, provider, fetcher).await;
    let service = AnalysisService::new(resources);

    let response = service.analyze_app(&job()).await?;

    assert!(response.success);
    assert_eq!(response.total_reviews, 1);
    assert!(response.requirements.is_none());
    Ok(())
}

#[tokio::test]
async fn no_relevant_reviews_yields_a_diagnostic_document_without_generator_calls() -> Result<()> {
    let classifier = Arc::new(StubClassifier::new(&[], "autenticidad", 0.9));
    let provider = Arc::new(StubChatProvider::always(BULK_RESPONSE));
    let fetcher = Arc::new(StubFetcher::new(vec![(
        vec![raw_review("a", 1, "muy lenta la interfaz")],
        None,
    )]));
    let resources = test_resources(classifier.clone(), provider.clone(), fetcher).await;
    let service = AnalysisService::new(resources);

    let response = service.analyze_app(&job()).await?;

    assert_eq!(response.total_reviews, 0);
    assert_eq!(response.stats.relevance_rate, 0.0);
    let document = response.requirements.expect("diagnostic document");
    assert!(!document.has_requirements());
    assert_eq!(classifier.multiclass_calls.load(Ordering::SeqCst), 0);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn repeated_job_is_served_from_cache() -> Result<()> {
    let relevant = ["no puedo entrar con mi huella"];
    let classifier = Arc::new(StubClassifier::new(&relevant, "autenticidad", 0.9));
    let provider = Arc::new(StubChatProvider::always(BULK_RESPONSE));
    let fetcher = Arc::new(StubFetcher::new(vec![(
        vec![raw_review("a", 1, relevant[0])],
        None,
    )]));
    let resources = test_resources(classifier.clone(), provider, fetcher.clone()).await;
    let service = AnalysisService::new(resources);

    let first = service.analyze_app(&job()).await?;
    let second = service.analyze_app(&job()).await?;

    assert_eq!(first.total_reviews, second.total_reviews);
    assert_eq!(first.stats.relevance_rate, second.stats.relevance_rate);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(classifier.binary_calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn different_job_parameters_miss_the_cache() -> Result<()> {
    let relevant = ["no puedo entrar con mi huella"];
    let classifier = Arc::new(StubClassifier::new(&relevant, "autenticidad", 0.9));
    let provider = Arc::new(StubChatProvider::always(BULK_RESPONSE));
    let fetcher = Arc::new(StubFetcher::new(vec![
        (vec![raw_review("a", 1, relevant[0])], None),
        (vec![raw_review("a", 1, relevant[0])], None),
    ]));
    let resources = test_resources(classifier, provider, fetcher.clone()).await;
    let service = AnalysisService::new(resources);

    service.analyze_app(&job()).await?;
    let mut other = job();
    other.max_rating = 2;
    service.analyze_app(&other).await?;

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn first_page_failure_fails_the_run() -> Result<()> {
    struct FailingFetcher;

    #[async_trait::async_trait]
    impl elicit_server::scraper::ReviewPageFetcher for FailingFetcher {
        async fn fetch_page(
            &self,
            _app_id: &str,
            _lang: &str,
            _country: &str,
            _sort: SortOrder,
            _count: usize,
            _token: Option<&str>,
        ) -> elicit_server::errors::AppResult<elicit_server::scraper::ReviewPage> {
            Err(elicit_server::errors::AppError::external_service(
                "play_store",
                "connection refused",
            ))
        }
    }

    let scraper = elicit_server::scraper::ReviewScraper::new(Arc::new(FailingFetcher))
        .with_page_pause(std::time::Duration::ZERO);
    let result = scraper
        .scrape_negative_reviews("com.example.app", 10, 3, SortOrder::Recientes, "es", "pe")
        .await;

    assert!(result.is_err());
    Ok(())
}
