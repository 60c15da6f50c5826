// ABOUTME: Main server binary wiring configuration, providers and the HTTP server
// ABOUTME: Fails fast on missing credentials before accepting any traffic

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

use anyhow::{Context, Result};
use elicit_server::cache::factory::Cache;
use elicit_server::config::ServerConfig;
use elicit_server::inference::huggingface::HfInferenceClient;
use elicit_server::llm::openrouter::OpenRouterProvider;
use elicit_server::logging;
use elicit_server::resources::ServerResources;
use elicit_server::scraper::play_store::PlayStoreFetcher;
use elicit_server::server;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_from_env().context("Failed to initialize logging")?;

    let config = ServerConfig::from_env().context("Failed to load configuration")?;

    let hf_token = config
        .inference
        .hf_token
        .clone()
        .context("HF_TOKEN is required for the classification endpoints")?;
    let classifier =
        HfInferenceClient::new(hf_token).context("Failed to build inference client")?;

    let openrouter_key = config
        .generator
        .openrouter_api_key
        .clone()
        .context("OPENROUTER_API_KEY is required for requirement synthesis")?;
    let chat_provider = OpenRouterProvider::new(openrouter_key);

    let fetcher = PlayStoreFetcher::new().context("Failed to build store fetcher")?;

    let cache = Cache::from_settings(&config.cache)
        .await
        .context("Failed to initialize cache")?;

    info!(port = config.http_port, "Starting Flash Elicit server");

    let resources = Arc::new(ServerResources::new(
        config,
        Arc::new(classifier),
        Arc::new(chat_provider),
        Arc::new(fetcher),
        cache,
    ));

    server::serve(resources).await?;

    Ok(())
}
