// ABOUTME: Shared test doubles: scripted classifier, chat provider and page fetcher
// ABOUTME: Call counters let tests assert short-circuit behavior

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

use elicit_server::cache::factory::Cache;
use elicit_server::cache::CacheConfig;
use elicit_server::config::environment::{
    CacheSettings, GeneratorConfig, InferenceConfig, ScraperConfig,
};
use elicit_server::config::{Environment, LogLevel, ServerConfig};
use elicit_server::errors::{AppError, AppResult};
use elicit_server::inference::{
    BinaryBatch, CategoryBatch, CategoryPrediction, ClassifierModelId, TextClassifier,
};
use elicit_server::llm::{ChatProvider, ChatRequest, ChatResponse};
use elicit_server::resources::ServerResources;
use elicit_server::scraper::{RawReview, ReviewPage, ReviewPageFetcher, SortOrder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Classifier whose verdicts are scripted per comment text
///
/// Texts listed in `relevant` pass the binary filter; every multiclass call
/// returns `category` with `confidence`. Call counts are tracked for
/// short-circuit assertions.
pub struct StubClassifier {
    pub relevant: Vec<String>,
    pub category: String,
    pub confidence: f64,
    pub binary_calls: AtomicUsize,
    pub multiclass_calls: AtomicUsize,
    pub multiclass_inputs: Mutex<Vec<Vec<String>>>,
    pub fail_binary: bool,
    pub fail_multiclass: bool,
}

impl StubClassifier {
    pub fn new(relevant: &[&str], category: &str, confidence: f64) -> Self {
        Self {
            relevant: relevant.iter().map(ToString::to_string).collect(),
            category: category.to_owned(),
            confidence,
            binary_calls: AtomicUsize::new(0),
            multiclass_calls: AtomicUsize::new(0),
            multiclass_inputs: Mutex::new(Vec::new()),
            fail_binary: false,
            fail_multiclass: false,
        }
    }

    pub fn failing_binary() -> Self {
        let mut stub = Self::new(&[], "autenticidad", 0.9);
        stub.fail_binary = true;
        stub
    }

    pub fn failing_multiclass(relevant: &[&str]) -> Self {
        let mut stub = Self::new(relevant, "autenticidad", 0.9);
        stub.fail_multiclass = true;
        stub
    }
}

#[async_trait::async_trait]
impl TextClassifier for StubClassifier {
    async fn classify_binary(&self, texts: &[String]) -> BinaryBatch {
        self.binary_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_binary {
            return BinaryBatch::failed(texts.len(), "scripted failure".to_owned());
        }

        BinaryBatch {
            flags: texts.iter().map(|t| self.relevant.contains(t)).collect(),
            failure: None,
        }
    }

    async fn classify_multiclass(
        &self,
        texts: &[String],
        _model: Option<ClassifierModelId>,
    ) -> CategoryBatch {
        self.multiclass_calls.fetch_add(1, Ordering::SeqCst);
        self.multiclass_inputs
            .lock()
            .expect("stub lock")
            .push(texts.to_vec());

        if self.fail_multiclass {
            return CategoryBatch::failed(texts.len(), "scripted failure".to_owned());
        }

        CategoryBatch {
            predictions: texts
                .iter()
                .map(|_| CategoryPrediction {
                    label: self.category.clone(),
                    score: self.confidence,
                })
                .collect(),
            failure: None,
        }
    }
}

/// One scripted chat provider turn
pub enum ScriptedTurn {
    /// Respond with this content
    Reply(String),
    /// Fail the call in transport
    Fail(String),
}

/// Chat provider that replays a scripted sequence of turns
pub struct StubChatProvider {
    turns: Mutex<Vec<ScriptedTurn>>,
    pub calls: AtomicUsize,
}

impl StubChatProvider {
    pub fn new(turns: Vec<ScriptedTurn>) -> Self {
        Self {
            turns: Mutex::new(turns),
            calls: AtomicUsize::new(0),
        }
    }

    /// Provider that replies with the same content on every call
    pub fn always(content: &str) -> Self {
        Self::new(vec![ScriptedTurn::Reply(content.to_owned())])
    }
}

#[async_trait::async_trait]
impl ChatProvider for StubChatProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn default_model(&self) -> &'static str {
        "stub-model"
    }

    async fn complete(&self, _request: &ChatRequest) -> AppResult<ChatResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut turns = self.turns.lock().expect("stub lock");
        let turn = if turns.len() > 1 {
            turns.remove(0)
        } else {
            match turns.first() {
                Some(ScriptedTurn::Reply(content)) => ScriptedTurn::Reply(content.clone()),
                Some(ScriptedTurn::Fail(reason)) => ScriptedTurn::Fail(reason.clone()),
                None => ScriptedTurn::Fail("script exhausted".to_owned()),
            }
        };
        drop(turns);

        match turn {
            ScriptedTurn::Reply(content) => Ok(ChatResponse {
                content,
                model: "stub-model".to_owned(),
                usage: None,
                finish_reason: Some("stop".to_owned()),
            }),
            ScriptedTurn::Fail(reason) => Err(AppError::external_service("stub", reason)),
        }
    }
}

/// Fetcher serving pre-built pages in order
pub struct StubFetcher {
    pages: Mutex<Vec<ReviewPage>>,
    pub calls: AtomicUsize,
}

impl StubFetcher {
    pub fn new(pages: Vec<ReviewPage>) -> Self {
        Self {
            pages: Mutex::new(pages),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl ReviewPageFetcher for StubFetcher {
    async fn fetch_page(
        &self,
        _app_id: &str,
        _lang: &str,
        _country: &str,
        _sort: SortOrder,
        _count: usize,
        _token: Option<&str>,
    ) -> AppResult<ReviewPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut pages = self.pages.lock().expect("stub lock");
        if pages.is_empty() {
            return Ok((Vec::new(), None));
        }
        Ok(pages.remove(0))
    }
}

/// Build a raw review with the given id and rating
pub fn raw_review(id: &str, rating: u8, text: &str) -> RawReview {
    RawReview {
        id: id.to_owned(),
        author: "Usuario".to_owned(),
        text: text.to_owned(),
        rating,
        date: "2025-01-15".to_owned(),
    }
}

/// Minimal config for resource assembly in tests
pub fn test_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        log_level: LogLevel::Info,
        environment: Environment::Testing,
        cors_origins: Vec::new(),
        inference: InferenceConfig { hf_token: None },
        generator: GeneratorConfig {
            openrouter_api_key: None,
        },
        scraper: ScraperConfig {
            lang: "es".to_owned(),
            country: "pe".to_owned(),
        },
        cache: CacheSettings {
            redis_url: None,
            max_entries: 100,
            cleanup_interval_secs: 300,
        },
    }
}

/// Assemble resources around the given stubs with an in-memory cache
pub async fn test_resources(
    classifier: Arc<StubClassifier>,
    provider: Arc<StubChatProvider>,
    fetcher: Arc<StubFetcher>,
) -> Arc<ServerResources> {
    let cache = Cache::new(CacheConfig {
        max_entries: 100,
        redis_url: None,
        cleanup_interval: std::time::Duration::from_secs(300),
        enable_background_cleanup: false,
    })
    .await
    .expect("in-memory cache");

    Arc::new(ServerResources::new(
        test_config(),
        classifier,
        provider,
        fetcher,
        cache,
    ))
}
