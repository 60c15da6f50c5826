// ABOUTME: Prompt construction for non-functional requirement synthesis
// ABOUTME: Spanish-language prompts enforcing the ISO/IEC/IEEE 29148 drafting rubric

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

use crate::models::ClassifiedReview;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Human-readable description of each ISO 25010 security category
#[must_use]
pub fn category_description(category: &str) -> &'static str {
    match category {
        "autenticidad" => "Verificación de identidad y autenticación",
        "confidencialidad" => "Privacidad y protección de datos",
        "integridad" => "Prevención de corrupción o modificación no autorizada de datos",
        "no_repudio" => "Trazabilidad y responsabilidad de acciones",
        "resistencia" => "Disponibilidad y robustez del sistema",
        "responsabilidad" => "Auditoría y rendición de cuentas",
        _ => "Seguridad general",
    }
}

const RUBRIC_HEADER: &str = r#"Eres un experto en ingeniería de requisitos especializado en requisitos No Funcionales (NFR) basados en ISO 25010 y experto en la norma ISO/IEC/IEEE 29148 y en redacción de Requisitos No Funcionales (RNF) claros, verificables y medibles.

Tu tarea es analizar comentarios de usuarios de una aplicación móvil que han sido clasificados en categorías de seguridad según ISO 25010, y generar requisitos No Funcionales específicos, medibles y accionables.

**Categorías ISO 25010 de Seguridad:**
- autenticidad: Verificación de identidad y autenticación
- confidencialidad: Privacidad y protección de datos
- integridad: Prevención de corrupción o modificación no autorizada de datos
- no_repudio: Trazabilidad y responsabilidad de acciones
- resistencia: Disponibilidad y robustez del sistema
- responsabilidad: Auditoría y rendición de cuentas

**Comentarios clasificados por categoría:**
"#;

const RUBRIC_INSTRUCTIONS: &str = r#"

**Instrucciones:**

Analiza los comentarios y genera requisitos No Funcionales siguiendo estos principios:

1. **CANTIDAD DE REQUISITOS:** Decide tú mismo cuántos requisitos generar basándote en:
   - La cantidad de problemas únicos identificados
   - La diversidad de temas mencionados
   - La severidad de los problemas reportados
   - Agrupa comentarios similares, pero crea requisitos separados si abordan problemas diferentes

2. **GRANULARIDAD:**
   - Si múltiples comentarios mencionan el MISMO problema específico → Crea 1 requisito
   - Si los comentarios mencionan problemas RELACIONADOS pero DIFERENTES → Crea requisitos separados
   - NO fuerces un número mínimo o máximo, genera los que sean necesarios

3. **PRIORIDAD (DINÁMICA):**
   Asigna prioridad de forma RELATIVA basándote en:

   - **Alta**: Requisitos que agrupan la MAYOR cantidad de comentarios relacionados en tu análisis
   - **Media**: Requisitos con cantidad MODERADA de comentarios relacionados
   - **Baja**: Requisitos con MENOR cantidad de comentarios relacionados
   **IMPORTANTE:** La prioridad es RELATIVA al conjunto de datos que estás analizando.

4. **REDACCIÓN SEGÚN ISO/IEC/IEEE 29148 (OBLIGATORIO):**

   Cada requisito DEBE seguir esta estructura sintáctica:

   ✅ **Fórmula:** [Artefacto técnico específico] + DEBERÁ + [restricción/condición técnica] + [métrica cuantificable]

   **Reglas obligatorias:**

   a) **Usar SIEMPRE el verbo modal "deberá"** (no "debe", "debería", "podría")
      - Define obligatoriedad y verificabilidad

   b) **Identificar UN artefacto técnico específico** (no usar "el sistema" genéricamente)
      - ✅ Ejemplos válidos: "El servicio de autenticación", "La pantalla de login", "El módulo de pagos"
      - ❌ Evitar: "El sistema", "La aplicación", "El software"

   c) **Incluir métricas CUANTIFICABLES Y OBSERVABLES:**
      - Tiempos: < 2 segundos, < 100 ms, en menos de 3 segundos
      - Porcentajes: 99.9% de disponibilidad, tasa de error < 1%
      - Límites: hasta 1000 usuarios concurrentes, máximo 5 intentos
      - Estándares: WCAG 2.1 AA, ISO 27001, HTTPS/TLS 1.3
      - Frecuencias: durante horario de 8:00-20:00, cada 24 horas

   d) **PROHIBIDO usar palabras VAGAS o SUBJETIVAS:**
      - ❌ rápido, lento, fácil, intuitivo, eficiente, óptimo, adecuado, moderno, amigable, robusto
      - ✅ Reemplazar por métricas observables

   e) **Criterio SMART obligatorio:**
      - **S**pecífico: Artefacto y contexto definidos
      - **M**edible: Métrica cuantificable incluida
      - **A**lcanzable: Técnicamente posible
      - **R**elevante: Contribuye a la calidad del sistema
      - **T**emporal: Incluir frecuencia, duración o ventana temporal cuando aplique

   **Ejemplos de requisitos CORRECTOS según ISO 29148:**

   ✅ "El servicio de autenticación biométrica deberá responder en menos de 2 segundos bajo carga de hasta 500 usuarios concurrentes."

   ✅ "La pantalla de consulta de saldo deberá estar disponible el 99.5% del tiempo durante el horario de 8:00 a 20:00."

   ✅ "El módulo de recuperación de contraseña deberá enviar el código de verificación en menos de 30 segundos."

   ✅ "La interfaz web de transferencias deberá cumplir con el estándar WCAG 2.1 nivel AA para accesibilidad."

   **Ejemplos de requisitos INCORRECTOS:**

   ❌ "El sistema debe ser rápido" → Vago, sin métrica, sin artefacto específico
   ❌ "La app deberá tener buena seguridad" → Subjetivo, no medible
   ❌ "Debe cargar eficientemente" → Sin sujeto, palabra prohibida, sin métrica

5. **CONTEXTO OPERATIVO (cuando aplique):**
   - Especificar condiciones: "bajo carga de X usuarios", "durante horario laboral", "en Chrome/Firefox/Safari"

**Formato de respuesta (JSON):**

```json
{
  "requisitos": [
    {
      "id": "NFR-001",
      "categoria": "autenticidad",
      "requisito": "El servicio de autenticación biométrica deberá validar la identidad del usuario en menos de 2 segundos con una tasa de error menor al 1% bajo carga de hasta 500 usuarios concurrentes.",
      "prioridad": "Alta",
      "justificacion": "45 usuarios reportan problemas con el inicio de sesión por huella digital, siendo el problema más frecuente en esta categoría, con calificaciones promedio de 1.2★",
      "criterios_aceptacion": [
        "El servicio deberá soportar autenticación por huella digital y reconocimiento facial",
        "El tiempo de respuesta deberá ser menor a 2 segundos en el 95% de los casos",
        "El servicio deberá proporcionar fallback a contraseña en caso de fallo biométrico en menos de 1 segundo"
      ],
      "comentarios_relacionados": 45
    }
  ],
  "resumen": {
    "total_requisitos": 0,
    "por_categoria": {},
    "prioridad_alta": 0,
    "prioridad_media": 0,
    "prioridad_baja": 0
  }
}
```

**IMPORTANTE:**
- Responde ÚNICAMENTE con el JSON, sin texto adicional antes o después.
- TODOS los requisitos y criterios de aceptación DEBEN usar "deberá" y seguir la norma ISO 29148.
- EVITA requisitos vagos, subjetivos o sin métricas cuantificables.
- La prioridad debe ser RELATIVA al dataset actual, no usar límites absolutos.
- Genera tantos requisitos como sean necesarios para cubrir todos los problemas identificados.
"#;

/// Build the bulk synthesis prompt from classified reviews
///
/// Reviews are grouped by category so the model sees the per-category volume
/// it needs for relative prioritization. `BTreeMap` keeps category order
/// stable across runs, which keeps the derived cache keys stable too.
#[must_use]
pub fn build_bulk_prompt(reviews: &[ClassifiedReview]) -> String {
    let mut by_category: BTreeMap<&str, Vec<&ClassifiedReview>> = BTreeMap::new();
    for review in reviews {
        by_category
            .entry(review.category.as_str())
            .or_default()
            .push(review);
    }

    let mut prompt = String::from(RUBRIC_HEADER);

    for (category, items) in &by_category {
        let _ = write!(
            prompt,
            "\n### {} ({} comentarios)\n",
            category.to_uppercase(),
            items.len()
        );
        for (i, item) in items.iter().enumerate() {
            let _ = writeln!(
                prompt,
                "{}. \"{}\" (Confianza: {:.2}, Rating: {}★)",
                i + 1,
                item.review.text,
                item.confidence,
                item.review.rating
            );
        }
    }

    prompt.push_str(RUBRIC_INSTRUCTIONS);
    prompt
}

/// Build the synthesis prompt for a single classified comment
#[must_use]
pub fn build_single_comment_prompt(
    comment: &str,
    category: &str,
    confidence: f64,
    rating: u8,
) -> String {
    let category_desc = category_description(category);

    format!(
        r#"Eres un experto en ingeniería de requisitos especializado en requisitos No Funcionales (NFR) basados en ISO 25010.

Tu tarea es analizar UN comentario de usuario de una aplicación móvil que ha sido clasificado en una categoría de seguridad según ISO 25010, y generar UN requisito No Funcional específico, medible y accionable.

**Comentario del usuario:**
- Texto: "{comment}"
- Calificación: {rating}★
- Categoría ISO 25010: {category} ({category_desc})
- Confianza de clasificación: {confidence:.2}

**Instrucciones:**

Genera UN requisito No Funcional siguiendo la norma ISO/IEC/IEEE 29148:

1. **REDACCIÓN OBLIGATORIA según ISO 29148:**

   ✅ **Fórmula:** [Artefacto técnico específico] + DEBERÁ + [restricción/condición técnica] + [métrica cuantificable]

   **Reglas obligatorias:**

   a) **Usar SIEMPRE el verbo modal "deberá"** (no "debe", "debería", "podría")

   b) **Identificar UN artefacto técnico específico** (no usar "el sistema" genéricamente)
      - ✅ Ejemplos: "El servicio de autenticación", "La pantalla de login", "El módulo de pagos"
      - ❌ Evitar: "El sistema", "La aplicación"

   c) **Incluir métricas CUANTIFICABLES:**
      - Tiempos: < 2 segundos, < 100 ms
      - Porcentajes: 99.9% disponibilidad, tasa de error < 1%
      - Límites: hasta 1000 usuarios, máximo 5 intentos
      - Estándares: WCAG 2.1 AA, HTTPS/TLS 1.3

   d) **PROHIBIDO usar palabras VAGAS:**
      - ❌ rápido, lento, fácil, intuitivo, eficiente, óptimo, adecuado
      - ✅ Usar métricas observables

   e) **Criterio SMART:**
      - Específico, Medible, Alcanzable, Relevante, Temporal

2. **Ejemplos CORRECTOS:**
   ✅ "El servicio de autenticación biométrica deberá responder en menos de 2 segundos bajo carga de 500 usuarios."
   ✅ "El módulo de recuperación de contraseña deberá enviar el código en menos de 30 segundos."

3. **Criterios de aceptación:**
   - TODOS deben usar "deberá" y seguir la misma estructura
   - Deben ser verificables y medibles

**Formato de respuesta (JSON):**

```json
{{
  "id": "NFR-001",
  "categoria": "{category}",
  "requisito": "[Artefacto técnico] deberá [acción] [métrica cuantificable]",
  "prioridad": "Alta|Media|Baja",
  "justificacion": "Basado en el comentario del usuario: [explicación del problema identificado]",
  "criterios_aceptacion": [
    "[Artefacto] deberá [criterio medible 1]",
    "[Artefacto] deberá [criterio medible 2]",
    "[Artefacto] deberá [criterio medible 3]"
  ],
  "comentarios_relacionados": 1
}}
```

**IMPORTANTE:**
- Responde ÚNICAMENTE con el JSON, sin texto adicional.
- TODOS los requisitos y criterios DEBEN usar "deberá" y seguir ISO 29148.
- EVITA requisitos vagos, subjetivos o sin métricas cuantificables.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassifiedReview, ReviewRecord};

    fn review(comment: &str, category: &str, confidence: f64, rating: u8) -> ClassifiedReview {
        ClassifiedReview {
            review: ReviewRecord {
                id: "r1".to_owned(),
                text: comment.to_owned(),
                rating,
                date: "2025-01-15".to_owned(),
                author: "Ana".to_owned(),
            },
            category: category.to_owned(),
            confidence,
        }
    }

    #[test]
    fn bulk_prompt_groups_by_category() {
        let reviews = vec![
            review("No puedo entrar con mi huella", "autenticidad", 0.97, 1),
            review("La app se cae todo el tiempo", "resistencia", 0.88, 2),
            review("Me pide la huella dos veces", "autenticidad", 0.91, 2),
        ];

        let prompt = build_bulk_prompt(&reviews);
        assert!(prompt.contains("### AUTENTICIDAD (2 comentarios)"));
        assert!(prompt.contains("### RESISTENCIA (1 comentarios)"));
        assert!(prompt.contains("(Confianza: 0.97, Rating: 1★)"));
    }

    #[test]
    fn bulk_prompt_demands_json_only_response() {
        let prompt = build_bulk_prompt(&[review("texto", "integridad", 0.5, 3)]);
        assert!(prompt.contains("Responde ÚNICAMENTE con el JSON"));
        assert!(prompt.contains("deberá"));
    }

    #[test]
    fn single_prompt_embeds_comment_and_category() {
        let prompt =
            build_single_comment_prompt("No puedo iniciar sesión", "autenticidad", 0.955, 1);
        assert!(prompt.contains("\"No puedo iniciar sesión\""));
        assert!(prompt.contains("autenticidad (Verificación de identidad y autenticación)"));
        assert!(prompt.contains("Confianza de clasificación: 0.95"));
    }

    #[test]
    fn unknown_category_falls_back_to_generic_description() {
        assert_eq!(category_description("error"), "Seguridad general");
    }
}
