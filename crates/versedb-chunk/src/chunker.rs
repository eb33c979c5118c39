//! Hierarchical token-bounded chunking with controlled overlap.
//!
//! A section that fits within `target_tokens * tolerance` becomes one chunk.
//! Oversized sections split by paragraph, then by sentence; a running buffer
//! accumulates units and flushes before the target budget would be exceeded,
//! never mid-unit. The only permitted budget violation is a single indivisible
//! sentence larger than the cap, which is emitted alone and logged.

use tracing::warn;

use versedb_core::config::ChunkingSettings;
use versedb_core::error::{Error, Result};
use versedb_core::tokens::estimate_tokens;
use versedb_core::types::{Chunk, Document, Meta};

use crate::payload::{DocumentPayload, SectionPayload};
use crate::tagger::ThemeTagger;

/// Sentence terminators covering Latin punctuation and the Devanagari danda.
const SENTENCE_TERMINATORS: [char; 5] = ['.', '!', '?', '\u{0964}', '\u{0965}'];

/// Everything produced by chunking one document.
#[derive(Debug, Clone)]
pub struct ChunkingOutcome {
    pub document: Document,
    pub chunks: Vec<Chunk>,
    /// Sections skipped because they were empty or whitespace-only.
    pub skipped_sections: usize,
    /// Chunks that exceed the budget cap because a single sentence did.
    pub overflow_chunks: usize,
}

pub struct Chunker {
    settings: ChunkingSettings,
    tagger: ThemeTagger,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(ChunkingSettings::default())
    }
}

impl Chunker {
    pub fn new(settings: ChunkingSettings) -> Self {
        Self {
            settings,
            tagger: ThemeTagger::default(),
        }
    }

    pub fn with_tagger(mut self, tagger: ThemeTagger) -> Self {
        self.tagger = tagger;
        self
    }

    /// Budget cap: sections within this stay whole; only indivisible
    /// sentences may exceed it.
    fn cap(&self) -> usize {
        (self.settings.target_tokens as f32 * self.settings.tolerance) as usize
    }

    /// Chunk one document payload into an ordered, reference-stable chunk set.
    ///
    /// A document yielding zero chunks is a logged warning, not an error, so a
    /// batch run over many documents keeps going.
    pub fn chunk_document(&self, payload: &DocumentPayload) -> Result<ChunkingOutcome> {
        if payload.name.trim().is_empty() {
            return Err(Error::Ingest("document payload has no name".to_string()));
        }

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut skipped_sections = 0usize;
        let mut overflow_chunks = 0usize;

        for (section_idx, section) in payload.sections.iter().enumerate() {
            let section_ref = section
                .reference
                .clone()
                .unwrap_or_else(|| format!("sec{}", section_idx + 1));
            let primary = section.primary.join("\n\n");
            let primary = primary.trim();
            if primary.is_empty() {
                warn!(
                    document = %payload.name,
                    section = %section_ref,
                    "skipping empty section"
                );
                skipped_sections += 1;
                continue;
            }

            let section_tokens = estimate_tokens(primary);
            if section_tokens <= self.cap() {
                let chunk = self.emit_chunk(
                    payload,
                    section,
                    &section_ref,
                    1,
                    chunks.len(),
                    primary.to_string(),
                    true,
                );
                chunks.push(chunk);
            } else {
                overflow_chunks +=
                    self.split_section(payload, section, &section_ref, primary, &mut chunks);
            }
        }

        if chunks.is_empty() {
            warn!(document = %payload.name, "document produced zero chunks");
        }

        self.apply_overlap(&mut chunks);

        let document = Document {
            name: payload.name.clone(),
            title: payload.title.clone(),
            category: payload.category.clone(),
            languages: payload.languages.clone(),
            total_chunks: chunks.len(),
            metadata: payload.metadata.clone(),
        };

        Ok(ChunkingOutcome {
            document,
            chunks,
            skipped_sections,
            overflow_chunks,
        })
    }

    /// Split an oversized section by paragraph, then by sentence, flushing the
    /// running buffer before the target budget would be exceeded. Returns the
    /// number of overflow chunks emitted.
    fn split_section(
        &self,
        payload: &DocumentPayload,
        section: &SectionPayload,
        section_ref: &str,
        primary: &str,
        chunks: &mut Vec<Chunk>,
    ) -> usize {
        let target = self.settings.target_tokens;
        let mut overflow = 0usize;
        let mut buffer: Vec<String> = Vec::new();
        let mut buffer_tokens = 0usize;
        let mut ordinal = 1usize;

        let flush =
            |buffer: &mut Vec<String>, buffer_tokens: &mut usize, ordinal: &mut usize, chunks: &mut Vec<Chunk>| {
                if buffer.is_empty() {
                    return;
                }
                let content = buffer.join("\n\n");
                let chunk = self.emit_chunk(
                    payload,
                    section,
                    section_ref,
                    *ordinal,
                    chunks.len(),
                    content,
                    false,
                );
                chunks.push(chunk);
                *ordinal += 1;
                buffer.clear();
                *buffer_tokens = 0;
            };

        for paragraph in primary.split("\n\n") {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }
            let para_tokens = estimate_tokens(paragraph);

            let units: Vec<(String, usize)> = if para_tokens <= target {
                vec![(paragraph.to_string(), para_tokens)]
            } else {
                split_sentences(paragraph)
                    .into_iter()
                    .map(|s| {
                        let t = estimate_tokens(&s);
                        (s, t)
                    })
                    .collect()
            };

            for (unit, unit_tokens) in units {
                if unit_tokens > self.cap() {
                    // Indivisible sentence larger than the cap: emit alone.
                    flush(&mut buffer, &mut buffer_tokens, &mut ordinal, chunks);
                    warn!(
                        document = %payload.name,
                        section = %section_ref,
                        tokens = unit_tokens,
                        cap = self.cap(),
                        "indivisible sentence exceeds chunk budget"
                    );
                    let chunk = self.emit_chunk(
                        payload,
                        section,
                        section_ref,
                        ordinal,
                        chunks.len(),
                        unit,
                        false,
                    );
                    chunks.push(chunk);
                    ordinal += 1;
                    overflow += 1;
                    continue;
                }
                // The +1 accounts for the joining separator.
                if !buffer.is_empty() && buffer_tokens + unit_tokens + 1 > target {
                    flush(&mut buffer, &mut buffer_tokens, &mut ordinal, chunks);
                }
                buffer_tokens += unit_tokens + usize::from(!buffer.is_empty());
                buffer.push(unit);
            }
        }
        flush(&mut buffer, &mut buffer_tokens, &mut ordinal, chunks);
        overflow
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_chunk(
        &self,
        payload: &DocumentPayload,
        section: &SectionPayload,
        section_ref: &str,
        section_ordinal: usize,
        position: usize,
        content: String,
        complete_section: bool,
    ) -> Chunk {
        let token_count = estimate_tokens(&content);
        let themes = self.tagger.themes(&content);
        let keywords = self.tagger.keywords(&content);
        let summary = summarize(&content);

        // Secondary text alignment is only known for whole sections; sub-splits
        // carry no secondary rendering.
        let secondary_content = if complete_section && !section.secondary.is_empty() {
            Some(section.secondary.join("\n\n"))
        } else {
            None
        };

        let mut metadata = Meta::new();
        metadata.insert("section".to_string(), section_ref.to_string());
        if let Some(path) = payload.metadata.get("source_path") {
            metadata.insert("source_path".to_string(), path.clone());
        }

        Chunk {
            id: format!("{}:{}", payload.name, position),
            document: payload.name.clone(),
            position,
            content,
            secondary_content,
            // Deterministic: base reference + section + ordinal, never random,
            // so reprocessing unchanged input is reference-stable.
            exact_reference: format!(
                "{}:{}:{}",
                payload.base_reference, section_ref, section_ordinal
            ),
            token_count,
            summary,
            themes,
            keywords,
            embedding: None,
            complete_section,
            metadata,
        }
    }

    /// Prefix each chunk (after the first) with the trailing ~overlap% of its
    /// predecessor's original content. Overlap is clamped to the receiver's
    /// remaining headroom under the budget cap and counts toward its token
    /// total. Not applied to single-chunk documents.
    fn apply_overlap(&self, chunks: &mut [Chunk]) {
        if chunks.len() < 2 || self.settings.overlap_percent <= 0.0 {
            return;
        }
        let originals: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        for i in 1..chunks.len() {
            let prev = &originals[i - 1];
            let want = (estimate_tokens(prev) as f32 * self.settings.overlap_percent).round()
                as usize;
            // Separator rounding eats one token of headroom.
            let headroom = self.cap().saturating_sub(chunks[i].token_count + 1);
            let take = want.min(headroom);
            if take == 0 {
                continue;
            }
            let overlap = trailing_tokens(prev, take);
            if overlap.is_empty() {
                continue;
            }
            chunks[i].content = format!("{}\n\n{}", overlap, chunks[i].content);
            chunks[i].token_count = estimate_tokens(&chunks[i].content);
        }
    }
}

/// Split text into sentences, keeping terminators attached. Handles Latin
/// terminators and the Devanagari danda/double danda.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        current.push(c);
        if SENTENCE_TERMINATORS.contains(&c) {
            // Pull trailing terminators and closers into the same sentence.
            while let Some(&next) = chars.peek() {
                if SENTENCE_TERMINATORS.contains(&next) || matches!(next, '"' | '\'' | ')') {
                    current.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            let sentence = current.trim();
            if !sentence.is_empty() {
                out.push(sentence.to_string());
            }
            current.clear();
        }
    }
    let tail = current.trim();
    if !tail.is_empty() {
        out.push(tail.to_string());
    }
    out
}

/// Trailing portion of `content` estimated at `tokens`, snapped forward to a
/// whitespace boundary so no word is cut. Returns the whole content when it is
/// smaller than the requested window.
fn trailing_tokens(content: &str, tokens: usize) -> &str {
    let chars_wanted = tokens * 4;
    let total_chars = content.chars().count();
    if total_chars <= chars_wanted {
        return content;
    }
    let mut start = content.len();
    let mut seen = 0usize;
    for (idx, _) in content.char_indices().rev() {
        start = idx;
        seen += 1;
        if seen >= chars_wanted {
            break;
        }
    }
    let tail = &content[start..];
    match tail.find(char::is_whitespace) {
        Some(ws) => tail[ws..].trim_start(),
        None => tail,
    }
}

/// Heuristic chunk summary: the leading sentence, bounded in length. A stand-in
/// for an external summarizer, good enough for result listings.
fn summarize(content: &str) -> String {
    let first = split_sentences(content)
        .into_iter()
        .next()
        .unwrap_or_default();
    const MAX: usize = 160;
    if first.chars().count() <= MAX {
        return first;
    }
    let truncated: String = first.chars().take(MAX - 3).collect();
    format!("{}...", truncated.trim_end())
}
