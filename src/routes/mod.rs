// ABOUTME: HTTP route modules for the analysis API
// ABOUTME: Each module exposes a XxxRoutes struct with a routes() constructor

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

/// Scraping and classification endpoints
pub mod analysis;
/// Health and readiness endpoints
pub mod health;
