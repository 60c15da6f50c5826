// ABOUTME: Core domain types for reviews, classifications, and synthesized requirements
// ABOUTME: Wire format keeps the original Spanish field names via serde renames
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

//! Domain model for the elicitation pipeline
//!
//! Every stage produces a fresh immutable value: a [`ReviewRecord`] becomes a
//! [`ClassifiedReview`] through the cascade, classified groups feed the
//! synthesizer, and the result is a [`RequirementsDocument`] whose
//! [`Summary`] is always recomputed from the parsed requirement list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A raw review fetched from the store feed
///
/// Uniqueness is enforced by `id` across a scrape session; the adapter
/// suppresses duplicates before they reach the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Source-provided unique review id
    #[serde(rename = "id_original")]
    pub id: String,
    /// Review text
    #[serde(rename = "comentario")]
    pub text: String,
    /// Star rating, 1..=5
    #[serde(rename = "calificacion")]
    pub rating: u8,
    /// Review date, YYYY-MM-DD
    #[serde(rename = "fecha")]
    pub date: String,
    /// Reviewer display name
    #[serde(rename = "usuario")]
    pub author: String,
}

/// A review that survived the binary relevance filter, with its category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedReview {
    /// The underlying review
    #[serde(flatten)]
    pub review: ReviewRecord,
    /// Assigned category from the active model's label vocabulary
    #[serde(rename = "categoria")]
    pub category: String,
    /// Engine-reported top-1 confidence, rounded to 4 decimal places
    #[serde(rename = "confianza")]
    pub confidence: f64,
}

/// Requirement priority, relative to the analyzed batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "Alta")]
    High,
    #[serde(rename = "Media")]
    Medium,
    #[serde(rename = "Baja")]
    Low,
}

impl Priority {
    /// Wire name of the priority
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::High => "Alta",
            Self::Medium => "Media",
            Self::Low => "Baja",
        }
    }
}

/// A synthesized non-functional requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    /// Sequence id, "NFR-NNN", unique within a document
    pub id: String,
    /// Category from the classifier's label vocabulary
    #[serde(rename = "categoria")]
    pub category: String,
    /// Requirement statement in ISO 29148 phrasing
    #[serde(rename = "requisito")]
    pub statement: String,
    /// Batch-relative priority
    #[serde(rename = "prioridad")]
    pub priority: Priority,
    /// Justification grounded in the source comments
    #[serde(rename = "justificacion")]
    pub justification: String,
    /// Verifiable acceptance criteria, non-empty
    #[serde(rename = "criterios_aceptacion")]
    pub acceptance_criteria: Vec<String>,
    /// Number of comments that motivated this requirement
    #[serde(rename = "comentarios_relacionados")]
    pub related_comment_count: u32,
}

/// Aggregate statistics over a requirement list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(rename = "total_requisitos")]
    pub total_requirements: u32,
    /// Requirement count per category; `BTreeMap` keeps output deterministic
    #[serde(rename = "por_categoria")]
    pub by_category: BTreeMap<String, u32>,
    #[serde(rename = "prioridad_alta")]
    pub priority_high: u32,
    #[serde(rename = "prioridad_media")]
    pub priority_medium: u32,
    #[serde(rename = "prioridad_baja")]
    pub priority_low: u32,
}

impl Summary {
    /// Compute aggregates deterministically from a requirement list.
    ///
    /// The generative engine also reports a summary, but it is never
    /// trusted; this is the only constructor used for parsed documents.
    #[must_use]
    pub fn compute(requirements: &[Requirement]) -> Self {
        let mut by_category = BTreeMap::new();
        let mut priority_high = 0;
        let mut priority_medium = 0;
        let mut priority_low = 0;

        for requirement in requirements {
            *by_category.entry(requirement.category.clone()).or_insert(0) += 1;
            match requirement.priority {
                Priority::High => priority_high += 1,
                Priority::Medium => priority_medium += 1,
                Priority::Low => priority_low += 1,
            }
        }

        Self {
            total_requirements: requirements.len() as u32,
            by_category,
            priority_high,
            priority_medium,
            priority_low,
        }
    }
}

/// A full requirements document, either parsed or a failure artifact
///
/// `error` and `raw_response` are populated only when synthesis failed to
/// produce a parseable document; in that case `requirements` is empty and
/// the summary is zeroed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementsDocument {
    #[serde(rename = "requisitos")]
    pub requirements: Vec<Requirement>,
    #[serde(rename = "resumen")]
    pub summary: Summary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl RequirementsDocument {
    /// Build a document from parsed requirements, recomputing the summary
    #[must_use]
    pub fn from_requirements(requirements: Vec<Requirement>) -> Self {
        let summary = Summary::compute(&requirements);
        Self {
            requirements,
            summary,
            error: None,
            raw_response: None,
        }
    }

    /// Build an empty document carrying a diagnostic error
    #[must_use]
    pub fn failure(error: impl Into<String>, raw_response: Option<String>) -> Self {
        Self {
            requirements: Vec::new(),
            summary: Summary::default(),
            error: Some(error.into()),
            raw_response,
        }
    }

    /// Whether this document carries at least one requirement
    #[must_use]
    pub fn has_requirements(&self) -> bool {
        !self.requirements.is_empty()
    }
}
