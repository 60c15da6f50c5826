// ABOUTME: PDF rendering for generated requirements documents
// ABOUTME: Cover page, executive summary, per-requirement sections and methodology appendix

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

use crate::errors::{AppError, AppResult};
use crate::models::RequirementsDocument;
use chrono::{DateTime, Utc};
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Point, Pt, TextItem,
};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const BODY_FONT_SIZE: f32 = 10.0;
const HEADING_FONT_SIZE: f32 = 14.0;
const TITLE_FONT_SIZE: f32 = 20.0;
const LINE_HEIGHT_MM: f32 = 5.5;
const WRAP_COLUMNS: usize = 92;

/// Display name of an ISO 25010 security category
#[must_use]
pub fn category_display_name(category: &str) -> String {
    match category {
        "autenticidad" => "Seguridad - Autenticidad".to_owned(),
        "confidencialidad" => "Seguridad - Confidencialidad".to_owned(),
        "integridad" => "Seguridad - Integridad".to_owned(),
        "no_repudio" => "Seguridad - No Repudio".to_owned(),
        "resistencia" => "Seguridad - Resistencia".to_owned(),
        "responsabilidad" => "Seguridad - Responsabilidad".to_owned(),
        other => {
            let mut chars = other.chars();
            chars.next().map_or_else(String::new, |c| {
                c.to_uppercase().collect::<String>() + chars.as_str()
            })
        }
    }
}

/// Context rendered on the cover page
#[derive(Debug, Clone)]
pub struct ReportContext {
    /// Store identifier of the analyzed application
    pub app_id: String,
    /// When the requirements were generated
    pub generated_at: DateTime<Utc>,
    /// How many scraped comments fed the analysis
    pub total_comments_analyzed: u64,
}

/// One line of laid-out text with its size and heading weight
#[derive(Debug, Clone)]
struct Line {
    text: String,
    size: f32,
    bold: bool,
}

impl Line {
    fn body(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            size: BODY_FONT_SIZE,
            bold: false,
        }
    }

    fn heading(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            size: HEADING_FONT_SIZE,
            bold: true,
        }
    }

    fn title(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            size: TITLE_FONT_SIZE,
            bold: true,
        }
    }

    fn blank() -> Self {
        Self::body("")
    }
}

/// Greedy word wrap at a fixed column width
fn wrap_text(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_owned();
        } else if current.chars().count() + 1 + word.chars().count() <= columns {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_owned();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn push_wrapped(lines: &mut Vec<Line>, text: &str) {
    for wrapped in wrap_text(text, WRAP_COLUMNS) {
        lines.push(Line::body(wrapped));
    }
}

fn cover_lines(document: &RequirementsDocument, ctx: &ReportContext) -> Vec<Line> {
    let mut lines = Vec::new();
    for _ in 0..8 {
        lines.push(Line::blank());
    }
    lines.push(Line::title("Requisitos No Funcionales"));
    lines.push(Line::title("Generados Automáticamente"));
    lines.push(Line::blank());
    lines.push(Line::blank());
    lines.push(Line::body(format!("Aplicación: {}", ctx.app_id)));
    lines.push(Line::body(format!(
        "Fecha de generación: {}",
        ctx.generated_at.format("%d/%m/%Y %H:%M")
    )));
    lines.push(Line::body(format!(
        "Comentarios analizados: {}",
        ctx.total_comments_analyzed
    )));
    lines.push(Line::body(format!(
        "Requisitos generados: {}",
        document.summary.total_requirements
    )));
    lines.push(Line::blank());
    lines.push(Line::blank());
    lines.push(Line::body("Generado por Flash Elicit"));
    lines.push(Line::body(
        "Sistema de Elicitación de Requisitos basado en ISO 25010",
    ));
    lines
}

fn summary_lines(document: &RequirementsDocument) -> Vec<Line> {
    let summary = &document.summary;
    let mut lines = vec![Line::heading("Resumen Ejecutivo"), Line::blank()];

    push_wrapped(
        &mut lines,
        &format!(
            "Este documento presenta {} requisitos No Funcionales generados automáticamente \
             a partir del análisis de comentarios negativos de usuarios en Google Play Store. \
             Los requisitos se clasifican según las categorías de seguridad de la norma ISO 25010.",
            summary.total_requirements
        ),
    );
    lines.push(Line::blank());

    lines.push(Line::heading("Distribución por Categoría ISO 25010"));
    for (category, count) in &summary.by_category {
        lines.push(Line::body(format!(
            "  {}: {} requisitos",
            category_display_name(category),
            count
        )));
    }
    lines.push(Line::blank());

    lines.push(Line::heading("Distribución por Prioridad"));
    lines.push(Line::body(format!("  Alta: {}", summary.priority_high)));
    lines.push(Line::body(format!("  Media: {}", summary.priority_medium)));
    lines.push(Line::body(format!("  Baja: {}", summary.priority_low)));
    lines
}

fn requirement_lines(document: &RequirementsDocument) -> Vec<Line> {
    let mut lines = vec![Line::heading("Requisitos No Funcionales"), Line::blank()];

    for requirement in &document.requirements {
        lines.push(Line::heading(format!(
            "{} - {} [{}]",
            requirement.id,
            category_display_name(&requirement.category),
            requirement.priority.as_str()
        )));
        push_wrapped(&mut lines, &requirement.statement);
        lines.push(Line::blank());

        push_wrapped(
            &mut lines,
            &format!("Justificación: {}", requirement.justification),
        );
        lines.push(Line::body(format!(
            "Comentarios relacionados: {}",
            requirement.related_comment_count
        )));

        if !requirement.acceptance_criteria.is_empty() {
            lines.push(Line::body("Criterios de aceptación:"));
            for criterion in &requirement.acceptance_criteria {
                push_wrapped(&mut lines, &format!("  - {criterion}"));
            }
        }
        lines.push(Line::blank());
    }
    lines
}

fn appendix_lines() -> Vec<Line> {
    let mut lines = vec![Line::heading("Apéndice: Metodología"), Line::blank()];

    push_wrapped(
        &mut lines,
        "Los requisitos No Funcionales presentados en este documento fueron generados \
         automáticamente mediante el siguiente proceso:",
    );
    lines.push(Line::blank());
    push_wrapped(
        &mut lines,
        "1. Extracción de Comentarios: se recopilaron comentarios negativos de Google Play Store.",
    );
    push_wrapped(
        &mut lines,
        "2. Filtrado Binario: un modelo BERT entrenado en español filtró los comentarios \
         relevantes para seguridad.",
    );
    push_wrapped(
        &mut lines,
        "3. Clasificación Multiclase: los comentarios relevantes se clasificaron en 6 categorías \
         de seguridad según ISO 25010: autenticidad, confidencialidad, integridad, no repudio, \
         resistencia y responsabilidad.",
    );
    push_wrapped(
        &mut lines,
        "4. Generación de Requisitos: un modelo de lenguaje sintetizó los comentarios \
         clasificados en requisitos No Funcionales específicos, medibles y accionables.",
    );
    lines.push(Line::blank());
    push_wrapped(
        &mut lines,
        "Nota: estos requisitos deben ser revisados y refinados por expertos en el dominio \
         antes de su implementación.",
    );
    lines
}

/// Lay lines out into pages of ops
fn paginate(lines: &[Line]) -> Vec<PdfPage> {
    let usable_height = PAGE_HEIGHT_MM - 2.0 * MARGIN_MM;
    let mut pages = Vec::new();
    let mut ops: Vec<Op> = Vec::new();
    let mut cursor_mm = 0.0_f32;

    let flush = |ops: &mut Vec<Op>, pages: &mut Vec<PdfPage>| {
        if !ops.is_empty() {
            pages.push(PdfPage::new(
                Mm(PAGE_WIDTH_MM),
                Mm(PAGE_HEIGHT_MM),
                std::mem::take(ops),
            ));
        }
    };

    for line in lines {
        if cursor_mm + LINE_HEIGHT_MM > usable_height {
            flush(&mut ops, &mut pages);
            cursor_mm = 0.0;
        }

        if !line.text.is_empty() {
            let font = if line.bold {
                BuiltinFont::HelveticaBold
            } else {
                BuiltinFont::Helvetica
            };
            let y_mm = PAGE_HEIGHT_MM - MARGIN_MM - cursor_mm;

            ops.push(Op::StartTextSection);
            ops.push(Op::SetTextCursor {
                pos: Point {
                    x: Mm(MARGIN_MM).into(),
                    y: Mm(y_mm).into(),
                },
            });
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(line.size),
                font,
            });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(line.text.clone())],
                font,
            });
            ops.push(Op::EndTextSection);
        }

        cursor_mm += LINE_HEIGHT_MM * (line.size / BODY_FONT_SIZE);
    }

    flush(&mut ops, &mut pages);
    pages
}

/// Render a requirements document as a PDF
///
/// # Errors
///
/// Returns an error when the document holds no requirements
pub fn render_requirements_pdf(
    document: &RequirementsDocument,
    ctx: &ReportContext,
) -> AppResult<Vec<u8>> {
    if !document.has_requirements() {
        return Err(AppError::invalid_input(
            "Cannot render a PDF for a document without requirements",
        ));
    }

    let mut lines = cover_lines(document, ctx);
    lines.push(Line::blank());
    lines.extend(summary_lines(document));
    lines.push(Line::blank());
    lines.extend(requirement_lines(document));
    lines.extend(appendix_lines());

    let pages = paginate(&lines);
    let mut warnings = Vec::new();
    let bytes = PdfDocument::new("Requisitos No Funcionales")
        .with_pages(pages)
        .save(&PdfSaveOptions::default(), &mut warnings);

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, Requirement, RequirementsDocument};

    fn sample_document() -> RequirementsDocument {
        RequirementsDocument::from_requirements(vec![Requirement {
            id: "NFR-001".to_owned(),
            category: "autenticidad".to_owned(),
            statement: "El servicio de autenticación biométrica deberá responder en menos de 2 \
                        segundos bajo carga de hasta 500 usuarios concurrentes."
                .to_owned(),
            priority: Priority::High,
            justification: "Múltiples usuarios reportan fallos de inicio de sesión".to_owned(),
            acceptance_criteria: vec![
                "El servicio deberá soportar huella digital y reconocimiento facial".to_owned(),
            ],
            related_comment_count: 12,
        }])
    }

    fn context() -> ReportContext {
        ReportContext {
            app_id: "com.example.bank".to_owned(),
            generated_at: Utc::now(),
            total_comments_analyzed: 250,
        }
    }

    #[test]
    fn renders_pdf_bytes_with_header() {
        let bytes = render_requirements_pdf(&sample_document(), &context()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn rejects_document_without_requirements() {
        let empty = RequirementsDocument::from_requirements(Vec::new());
        let result = render_requirements_pdf(&empty, &context());
        assert!(result.is_err());
    }

    #[test]
    fn wraps_long_text_at_column_width() {
        let text = "palabra ".repeat(40);
        let wrapped = wrap_text(&text, 30);
        assert!(wrapped.len() > 1);
        assert!(wrapped.iter().all(|l| l.chars().count() <= 30));
    }

    #[test]
    fn known_categories_get_display_names() {
        assert_eq!(
            category_display_name("no_repudio"),
            "Seguridad - No Repudio"
        );
        assert_eq!(category_display_name("error"), "Error");
    }
}
