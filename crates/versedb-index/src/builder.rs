//! Derives the full index entry table from a chunk set.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use versedb_core::types::{Chunk, ChunkId, IndexEntry, IndexType};

/// Caps in the importance formula: frequency saturates at 10 occurrences,
/// document spread at 5 distinct documents.
const FREQUENCY_SATURATION: f32 = 10.0;
const SPREAD_SATURATION: f32 = 5.0;

/// How many co-occurring themes an entry cross-references.
const MAX_CROSS_REFS: usize = 3;

/// Continuous [0,1] importance weight.
///
/// A term recurring across many independent documents outweighs one that is
/// merely frequent within a single document, to avoid single-source bias.
pub fn importance_score(frequency: usize, distinct_documents: usize) -> f32 {
    let freq_part = (frequency as f32 / FREQUENCY_SATURATION).min(1.0);
    let spread_part = (distinct_documents as f32 / SPREAD_SATURATION).min(1.0);
    (0.7 * freq_part + 0.3 * spread_part).clamp(0.0, 1.0)
}

#[derive(Default)]
struct Accumulator {
    chunk_ids: BTreeSet<ChunkId>,
    documents: BTreeSet<String>,
    frequency: usize,
    secondary_term: Option<String>,
}

/// Build one entry per distinct `(term, index_type)` pair from the full chunk
/// set. Deterministic: identical input yields identical entries and scores,
/// and duplicates cannot accumulate because accumulation is keyed on the pair.
pub fn build_entries(chunks: &[Chunk], titles: &HashMap<String, String>) -> Vec<IndexEntry> {
    let mut acc: BTreeMap<(IndexType, String), Accumulator> = BTreeMap::new();
    // (theme a, theme b) co-occurrence counts for cross-references.
    let mut co_occur: BTreeMap<(String, String), usize> = BTreeMap::new();

    for chunk in chunks {
        for theme in &chunk.themes {
            let slot = acc
                .entry((IndexType::Theme, theme.to_lowercase()))
                .or_default();
            slot.chunk_ids.insert(chunk.id.clone());
            slot.documents.insert(chunk.document.clone());
            slot.frequency += 1;
            for other in &chunk.themes {
                if other != theme {
                    *co_occur
                        .entry((theme.to_lowercase(), other.to_lowercase()))
                        .or_insert(0) += 1;
                }
            }
        }
        for keyword in &chunk.keywords {
            let slot = acc
                .entry((IndexType::Keyword, keyword.to_lowercase()))
                .or_default();
            slot.chunk_ids.insert(chunk.id.clone());
            slot.documents.insert(chunk.document.clone());
            slot.frequency += 1;
        }
        // Book routing: both the document name and its display title alias
        // every chunk of the document.
        let mut aliases = vec![chunk.document.to_lowercase()];
        if let Some(title) = titles.get(&chunk.document) {
            let title = title.to_lowercase();
            if title != aliases[0] {
                aliases.push(title);
            }
        }
        for alias in aliases {
            let slot = acc.entry((IndexType::BookAlias, alias)).or_default();
            slot.chunk_ids.insert(chunk.id.clone());
            slot.documents.insert(chunk.document.clone());
            slot.frequency += 1;
            if slot.secondary_term.is_none() {
                slot.secondary_term = chunk
                    .metadata
                    .get("secondary_title")
                    .cloned();
            }
        }
    }

    acc.into_iter()
        .map(|((index_type, term), slot)| {
            let cross_refs = if index_type == IndexType::Theme {
                let mut related: Vec<(&String, &usize)> = co_occur
                    .iter()
                    .filter(|((a, _), _)| *a == term)
                    .map(|((_, b), count)| (b, count))
                    .collect();
                related.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
                related
                    .into_iter()
                    .take(MAX_CROSS_REFS)
                    .map(|(other, count)| (other.clone(), count.to_string()))
                    .collect()
            } else {
                HashMap::new()
            };

            IndexEntry {
                index_type,
                importance: importance_score(slot.frequency, slot.documents.len()),
                term,
                secondary_term: slot.secondary_term,
                chunk_ids: slot.chunk_ids.into_iter().collect(),
                documents: slot.documents.into_iter().collect(),
                frequency: slot.frequency,
                cross_refs,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_document_spread_beats_raw_frequency() {
        // 20 occurrences in 1 document vs 10 occurrences across 5 documents.
        let single_source = importance_score(20, 1);
        let spread = importance_score(10, 5);
        assert!(spread > single_source);
    }

    #[test]
    fn importance_is_clamped() {
        assert!(importance_score(0, 0).abs() < f32::EPSILON);
        assert!((importance_score(1000, 1000) - 1.0).abs() < f32::EPSILON);
    }
}
