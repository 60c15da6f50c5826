// ABOUTME: Configuration management module
// ABOUTME: Environment-driven server configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

/// Environment-based configuration management
pub mod environment;

pub use environment::{Environment, LogLevel, ServerConfig};
