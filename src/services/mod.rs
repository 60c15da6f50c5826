// ABOUTME: Service layer orchestrating the scrape, classify and synthesize pipeline
// ABOUTME: Routes stay thin; all multi-step flows live here

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

/// Full-pipeline and single-comment analysis flows
pub mod analysis;
