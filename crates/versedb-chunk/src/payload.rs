//! Normalized ingest payloads handed to the chunker.

use serde::{Deserialize, Serialize};
use versedb_core::types::Meta;

/// One structural section of a source document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionPayload {
    /// Explicit reference for the section (e.g., "chapter2"). When absent the
    /// chunker derives a positional one so references stay deterministic.
    pub reference: Option<String>,
    /// Primary-language paragraphs, in order.
    pub primary: Vec<String>,
    /// Optional secondary-language paragraphs for the same section.
    pub secondary: Vec<String>,
}

impl SectionPayload {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            reference: None,
            primary: vec![text.into()],
            secondary: Vec::new(),
        }
    }
}

/// A full document as delivered by the ingest source, normalized into an
/// ordered list of sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentPayload {
    /// Unique document name; doubles as the chunk id prefix.
    pub name: String,
    pub title: String,
    pub category: String,
    /// Base reference all chunk references derive from (defaults to `name`).
    pub base_reference: String,
    /// Languages present, primary first.
    pub languages: Vec<String>,
    pub sections: Vec<SectionPayload>,
    pub metadata: Meta,
}

impl DocumentPayload {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            base_reference: name.clone(),
            name,
            category: "/misc".to_string(),
            languages: vec!["en".to_string()],
            sections: Vec::new(),
            metadata: Meta::new(),
        }
    }

    pub fn with_sections(mut self, sections: Vec<SectionPayload>) -> Self {
        self.sections = sections;
        self
    }
}
