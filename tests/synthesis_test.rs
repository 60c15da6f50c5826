// ABOUTME: Integration tests for requirement synthesis retry and parsing behavior
// ABOUTME: Covers empty input, fence stripping, parse failure and transport failure

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

mod common;

use anyhow::Result;
use common::{ScriptedTurn, StubChatProvider};
use elicit_server::models::{ClassifiedReview, Priority, ReviewRecord};
use elicit_server::synthesis::RequirementSynthesizer;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn classified(text: &str, category: &str) -> ClassifiedReview {
    ClassifiedReview {
        review: ReviewRecord {
            id: "r1".to_owned(),
            text: text.to_owned(),
            rating: 1,
            date: "2025-01-15".to_owned(),
            author: "Usuario".to_owned(),
        },
        category: category.to_owned(),
        confidence: 0.92,
    }
}

const VALID_BULK_RESPONSE: &str = r#"{
    "requisitos": [
        {
            "id": "NFR-001",
            "categoria": "autenticidad",
            "requisito": "El servicio de autenticación deberá validar credenciales en menos de 2 segundos.",
            "prioridad": "Alta",
            "justificacion": "Usuarios reportan fallos de inicio de sesión",
            "criterios_aceptacion": ["El servicio deberá responder en menos de 2 segundos en el 95% de los casos"],
            "comentarios_relacionados": 3
        },
        {
            "id": "NFR-002",
            "categoria": "resistencia",
            "requisito": "El módulo de sesión deberá mantener disponibilidad del 99.5% en horario de 8:00 a 20:00.",
            "prioridad": "Media",
            "justificacion": "Caídas reportadas en horario laboral",
            "criterios_aceptacion": ["El módulo deberá registrar la disponibilidad cada 24 horas"],
            "comentarios_relacionados": 1
        }
    ],
    "resumen": {
        "total_requisitos": 99,
        "por_categoria": {"autenticidad": 99},
        "prioridad_alta": 99,
        "prioridad_media": 0,
        "prioridad_baja": 0
    }
}"#;

#[tokio::test]
async fn empty_input_returns_diagnostic_without_calls() -> Result<()> {
    let provider = Arc::new(StubChatProvider::always("{}"));
    let synthesizer = RequirementSynthesizer::new(provider.clone());

    let document = synthesizer.generate_requirements(&[]).await?;

    assert!(!document.has_requirements());
    assert!(document.error.is_some());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn summary_is_recomputed_from_parsed_requirements() -> Result<()> {
    let provider = Arc::new(StubChatProvider::always(VALID_BULK_RESPONSE));
    let synthesizer = RequirementSynthesizer::new(provider);

    let reviews = vec![classified("no puedo entrar", "autenticidad")];
    let document = synthesizer.generate_requirements(&reviews).await?;

    // The engine-reported summary claims 99 requirements; the parsed list wins
    assert_eq!(document.summary.total_requirements, 2);
    assert_eq!(document.summary.priority_high, 1);
    assert_eq!(document.summary.priority_medium, 1);
    assert_eq!(document.summary.priority_low, 0);
    assert_eq!(document.summary.by_category.get("autenticidad"), Some(&1));
    assert_eq!(document.summary.by_category.get("resistencia"), Some(&1));
    assert_eq!(
        document.summary.total_requirements as usize,
        document.requirements.len()
    );
    Ok(())
}

#[tokio::test]
async fn fenced_response_is_parsed() -> Result<()> {
    let fenced = format!("```json\n{VALID_BULK_RESPONSE}\n```");
    let provider = Arc::new(StubChatProvider::always(&fenced));
    let synthesizer = RequirementSynthesizer::new(provider);

    let reviews = vec![classified("no puedo entrar", "autenticidad")];
    let document = synthesizer.generate_requirements(&reviews).await?;

    assert_eq!(document.requirements.len(), 2);
    assert_eq!(document.requirements[0].priority, Priority::High);
    Ok(())
}

#[tokio::test]
async fn persistent_parse_failure_returns_diagnostic_document() -> Result<()> {
    let provider = Arc::new(StubChatProvider::always("esto no es JSON"));
    let synthesizer = RequirementSynthesizer::new(provider.clone());

    let reviews = vec![classified("no puedo entrar", "autenticidad")];
    let document = synthesizer.generate_requirements(&reviews).await?;

    assert!(!document.has_requirements());
    assert!(document.error.is_some());
    assert_eq!(document.raw_response.as_deref(), Some("esto no es JSON"));
    assert_eq!(document.summary.total_requirements, 0);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test]
async fn parse_failure_recovers_on_retry() -> Result<()> {
    let provider = Arc::new(StubChatProvider::new(vec![
        ScriptedTurn::Reply("basura".to_owned()),
        ScriptedTurn::Reply(VALID_BULK_RESPONSE.to_owned()),
    ]));
    let synthesizer = RequirementSynthesizer::new(provider.clone());

    let reviews = vec![classified("no puedo entrar", "autenticidad")];
    let document = synthesizer.generate_requirements(&reviews).await?;

    assert_eq!(document.requirements.len(), 2);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn transport_failure_on_final_attempt_is_an_error() -> Result<()> {
    let provider = Arc::new(StubChatProvider::new(vec![ScriptedTurn::Fail(
        "connection refused".to_owned(),
    )]));
    let synthesizer = RequirementSynthesizer::new(provider.clone());

    let reviews = vec![classified("no puedo entrar", "autenticidad")];
    let result = synthesizer.generate_requirements(&reviews).await;

    assert!(result.is_err());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test]
async fn transport_failure_recovers_before_final_attempt() -> Result<()> {
    let provider = Arc::new(StubChatProvider::new(vec![
        ScriptedTurn::Fail("timeout".to_owned()),
        ScriptedTurn::Reply(VALID_BULK_RESPONSE.to_owned()),
    ]));
    let synthesizer = RequirementSynthesizer::new(provider);

    let reviews = vec![classified("no puedo entrar", "autenticidad")];
    let document = synthesizer.generate_requirements(&reviews).await?;

    assert_eq!(document.requirements.len(), 2);
    Ok(())
}

#[tokio::test]
async fn single_requirement_parses_and_defaults() -> Result<()> {
    let response = r#"{
        "categoria": "autenticidad",
        "requisito": "El servicio de login deberá responder en menos de 2 segundos.",
        "prioridad": "Alta",
        "justificacion": "Basado en el comentario del usuario",
        "criterios_aceptacion": ["El servicio deberá registrar cada intento fallido"]
    }"#;
    let provider = Arc::new(StubChatProvider::always(response));
    let synthesizer = RequirementSynthesizer::new(provider);

    let requirement = synthesizer
        .generate_single_requirement("No puedo iniciar sesión", "autenticidad", 0.95, 1)
        .await?;

    assert_eq!(requirement.id, "NFR-001");
    assert_eq!(requirement.related_comment_count, 1);
    assert_eq!(requirement.priority, Priority::High);
    Ok(())
}

#[tokio::test]
async fn single_requirement_parse_failure_is_an_error() -> Result<()> {
    let provider = Arc::new(StubChatProvider::always("no json aquí"));
    let synthesizer = RequirementSynthesizer::new(provider.clone());

    let result = synthesizer
        .generate_single_requirement("No puedo iniciar sesión", "autenticidad", 0.95, 1)
        .await;

    assert!(result.is_err());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    Ok(())
}
