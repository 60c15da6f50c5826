// ABOUTME: Main library entry point for the Flash Elicit analysis server
// ABOUTME: Scrapes app store reviews and elicits ISO 25010 security requirements from them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

#![deny(unsafe_code)]

//! # Flash Elicit Server
//!
//! HTTP service that turns negative Google Play reviews into non-functional
//! security requirements.
//!
//! ## Pipeline
//!
//! 1. **Scraping**: negative reviews are collected from the Play Store with
//!    pagination and dedup
//! 2. **Relevance filter**: a binary classifier drops reviews unrelated to
//!    security
//! 3. **Categorization**: survivors are assigned one of six ISO 25010
//!    security categories with a confidence score
//! 4. **Synthesis**: a chat completion model drafts ISO 29148 style
//!    requirements from the classified reviews
//!
//! Results can be exported as a PDF report, and full responses are memoized
//! in a pluggable cache (in-memory or Redis).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use elicit_server::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Flash Elicit server configured for port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Cache abstraction with in-memory and Redis backends
pub mod cache;
/// Configuration management
pub mod config;
/// Shared constants
pub mod constants;
/// Error types and HTTP error mapping
pub mod errors;
/// Text classification providers
pub mod inference;
/// Chat completion providers and prompts
pub mod llm;
/// Structured logging setup
pub mod logging;
/// Wire data model
pub mod models;
/// Classification cascade
pub mod pipeline;
/// PDF report rendering
pub mod report;
/// Shared server resources
pub mod resources;
/// HTTP route handlers
pub mod routes;
/// Review scraping
pub mod scraper;
/// HTTP server assembly
pub mod server;
/// Orchestration services
pub mod services;
/// Requirement synthesis
pub mod synthesis;
