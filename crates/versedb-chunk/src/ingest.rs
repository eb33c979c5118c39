//! Multi-strategy normalization of raw sources into document payloads.
//!
//! Source formats vary, so normalization is an ordered list of strategies,
//! each a pure function from raw source to payload, tried in sequence until
//! one yields a non-empty valid result.

use serde::Deserialize;
use tracing::debug;

use versedb_core::error::{Error, Result};
use versedb_core::types::Meta;

use crate::payload::{DocumentPayload, SectionPayload};

/// A raw document as delivered by the (external) ingest source.
#[derive(Debug, Clone)]
pub struct RawSource {
    pub name: String,
    pub category: String,
    pub content: String,
    pub metadata: Meta,
}

pub trait IngestStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Attempt to normalize the source. `None` means "not my format" or
    /// "nothing usable here"; the next strategy gets a turn.
    fn normalize(&self, source: &RawSource) -> Option<DocumentPayload>;
}

/// Try each strategy in order; the first non-empty payload wins. The winning
/// strategy's name is recorded in the payload metadata.
pub fn normalize_source(
    source: &RawSource,
    strategies: &[Box<dyn IngestStrategy>],
) -> Result<DocumentPayload> {
    for strategy in strategies {
        if let Some(mut payload) = strategy.normalize(source) {
            if payload.sections.is_empty() {
                continue;
            }
            debug!(source = %source.name, strategy = strategy.name(), "normalized source");
            payload
                .metadata
                .insert("strategy".to_string(), strategy.name().to_string());
            return Ok(payload);
        }
    }
    Err(Error::Ingest(format!(
        "no strategy produced a payload for '{}'",
        source.name
    )))
}

/// The default strategy order: structured JSON, heading-delimited text, then
/// the whole text as one section.
pub fn default_strategies() -> Vec<Box<dyn IngestStrategy>> {
    vec![
        Box::new(JsonSections),
        Box::new(HeadingSections),
        Box::new(WholeText),
    ]
}

fn base_payload(source: &RawSource) -> DocumentPayload {
    let mut payload = DocumentPayload::new(source.name.clone());
    payload.category = source.category.clone();
    payload.metadata = source.metadata.clone();
    payload
}

// ---------------------------------------------------------------------------
// JSON sections
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct JsonDocument {
    title: Option<String>,
    base_reference: Option<String>,
    #[serde(default)]
    languages: Vec<String>,
    #[serde(default)]
    sections: Vec<JsonSection>,
}

#[derive(Debug, Deserialize)]
struct JsonSection {
    reference: Option<String>,
    #[serde(default)]
    primary: Paragraphs,
    #[serde(default)]
    secondary: Paragraphs,
}

/// Sections may carry text as a single string or as a paragraph array.
#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum Paragraphs {
    #[default]
    Missing,
    One(String),
    Many(Vec<String>),
}

impl Paragraphs {
    fn into_vec(self) -> Vec<String> {
        match self {
            Paragraphs::Missing => Vec::new(),
            Paragraphs::One(s) => vec![s],
            Paragraphs::Many(v) => v,
        }
    }
}

/// Structured payloads: a JSON object with an ordered `sections` array.
pub struct JsonSections;

impl IngestStrategy for JsonSections {
    fn name(&self) -> &'static str {
        "json-sections"
    }

    fn normalize(&self, source: &RawSource) -> Option<DocumentPayload> {
        let parsed: JsonDocument = serde_json::from_str(&source.content).ok()?;
        let mut payload = base_payload(source);
        if let Some(title) = parsed.title {
            payload.title = title;
        }
        if let Some(base) = parsed.base_reference {
            payload.base_reference = base;
        }
        if !parsed.languages.is_empty() {
            payload.languages = parsed.languages;
        }
        payload.sections = parsed
            .sections
            .into_iter()
            .map(|s| SectionPayload {
                reference: s.reference,
                primary: s.primary.into_vec(),
                secondary: s.secondary.into_vec(),
            })
            .filter(|s| s.primary.iter().any(|p| !p.trim().is_empty()))
            .collect();
        (!payload.sections.is_empty()).then_some(payload)
    }
}

// ---------------------------------------------------------------------------
// Heading-delimited plain text
// ---------------------------------------------------------------------------

/// Plain text split on markdown-style `#` headings; each heading starts a new
/// section and becomes its reference slug.
pub struct HeadingSections;

impl IngestStrategy for HeadingSections {
    fn name(&self) -> &'static str {
        "heading-sections"
    }

    fn normalize(&self, source: &RawSource) -> Option<DocumentPayload> {
        let mut sections: Vec<SectionPayload> = Vec::new();
        let mut current_ref: Option<String> = None;
        let mut current_body: Vec<String> = Vec::new();

        let close = |reference: Option<String>, body: &mut Vec<String>, out: &mut Vec<SectionPayload>| {
            let text = body.join("\n").trim().to_string();
            body.clear();
            if !text.is_empty() {
                out.push(SectionPayload {
                    reference,
                    primary: text.split("\n\n").map(str::to_string).collect(),
                    secondary: Vec::new(),
                });
            }
        };

        for line in source.content.lines() {
            if let Some(heading) = line.strip_prefix('#') {
                close(current_ref.take(), &mut current_body, &mut sections);
                current_ref = Some(slugify(heading.trim_start_matches('#').trim()));
            } else {
                current_body.push(line.to_string());
            }
        }
        close(current_ref.take(), &mut current_body, &mut sections);

        // Without at least one real heading this is not our format.
        if sections.len() < 2 && !sections.iter().any(|s| s.reference.is_some()) {
            return None;
        }
        let mut payload = base_payload(source);
        payload.sections = sections;
        Some(payload)
    }
}

fn slugify(text: &str) -> String {
    let slug: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let slug = slug.trim_matches('_').to_string();
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

// ---------------------------------------------------------------------------
// Whole-text fallback
// ---------------------------------------------------------------------------

/// Last resort: the entire trimmed content as one unnamed section.
pub struct WholeText;

impl IngestStrategy for WholeText {
    fn name(&self) -> &'static str {
        "whole-text"
    }

    fn normalize(&self, source: &RawSource) -> Option<DocumentPayload> {
        let trimmed = source.content.trim();
        if trimmed.is_empty() {
            return None;
        }
        let mut payload = base_payload(source);
        payload.sections = vec![SectionPayload {
            reference: None,
            primary: trimmed.split("\n\n").map(str::to_string).collect(),
            secondary: Vec::new(),
        }];
        Some(payload)
    }
}
