//! Pure fusion arithmetic: priority-weighted stream union and budget walk.

use std::collections::{BTreeMap, HashMap};

use versedb_core::config::FusionSettings;
use versedb_core::types::{Chunk, ChunkId, Provenance, RankedResult, SearchHit};

/// A fused candidate before chunk materialization.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: ChunkId,
    pub score: f32,
    pub provenance: Vec<Provenance>,
}

/// Priority-weighted union of the three result streams.
///
/// Vector hits enter at full weight. An index-routed chunk already present
/// gains a fixed boost; one seen only by routing enters at a lower base score,
/// since routing is a coarser signal than similarity. Theme hits do the same
/// with smaller constants. Ties break on chunk id so identical inputs always
/// fuse identically.
pub fn merge_streams(
    vector: Vec<SearchHit>,
    index: Vec<SearchHit>,
    theme: Vec<SearchHit>,
    settings: &FusionSettings,
) -> Vec<Candidate> {
    let mut union: BTreeMap<ChunkId, Candidate> = BTreeMap::new();
    for hit in vector {
        union.entry(hit.id.clone()).or_insert(Candidate {
            id: hit.id,
            score: hit.score,
            provenance: vec![Provenance::Vector],
        });
    }
    absorb(
        &mut union,
        index,
        Provenance::MasterIndex,
        settings.index_boost,
        settings.index_base,
    );
    absorb(
        &mut union,
        theme,
        Provenance::Theme,
        settings.theme_boost,
        settings.theme_base,
    );

    let mut candidates: Vec<Candidate> = union.into_values().collect();
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    candidates
}

fn absorb(
    union: &mut BTreeMap<ChunkId, Candidate>,
    hits: Vec<SearchHit>,
    source: Provenance,
    boost: f32,
    base: f32,
) {
    for hit in hits {
        if let Some(existing) = union.get_mut(&hit.id) {
            existing.score += boost;
            if !existing.provenance.contains(&source) {
                existing.provenance.push(source);
            }
        } else {
            union.insert(
                hit.id.clone(),
                Candidate {
                    id: hit.id,
                    score: base,
                    provenance: vec![source],
                },
            );
        }
    }
}

/// Walk the ranked candidates in score order, selecting chunks until the
/// token budget or the absolute chunk cap is reached. The walk stops at the
/// first chunk that would push the running total past the budget, so the
/// selected sum never exceeds it. Candidate ids without a backing chunk are
/// stale index references and are skipped.
pub fn select_within_budget(
    candidates: Vec<Candidate>,
    chunks: &mut HashMap<ChunkId, Chunk>,
    settings: &FusionSettings,
) -> Vec<RankedResult> {
    let mut selected = Vec::new();
    let mut spent = 0usize;
    for candidate in candidates {
        if selected.len() >= settings.max_chunks {
            break;
        }
        let Some(chunk) = chunks.remove(&candidate.id) else {
            continue;
        };
        if spent + chunk.token_count > settings.token_budget {
            break;
        }
        spent += chunk.token_count;
        selected.push(RankedResult {
            chunk,
            score: candidate.score,
            provenance: candidate.provenance,
        });
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, score: f32, source: Provenance) -> SearchHit {
        SearchHit {
            id: id.to_string(),
            score,
            source,
        }
    }

    #[test]
    fn boost_beats_single_stream() {
        let settings = FusionSettings::default();
        let both = merge_streams(
            vec![hit("a", 0.6, Provenance::Vector)],
            vec![hit("a", 0.8, Provenance::MasterIndex)],
            vec![],
            &settings,
        );
        let vector_only = merge_streams(vec![hit("a", 0.6, Provenance::Vector)], vec![], vec![], &settings);
        let index_only = merge_streams(vec![], vec![hit("a", 0.8, Provenance::MasterIndex)], vec![], &settings);

        assert!(both[0].score > vector_only[0].score);
        assert!(both[0].score > index_only[0].score);
        assert_eq!(
            both[0].provenance,
            vec![Provenance::Vector, Provenance::MasterIndex]
        );
    }

    #[test]
    fn routing_enters_below_similarity_weight() {
        let settings = FusionSettings::default();
        let merged = merge_streams(
            vec![],
            vec![hit("routed", 0.95, Provenance::MasterIndex)],
            vec![hit("themed", 0.95, Provenance::Theme)],
            &settings,
        );
        let routed = merged.iter().find(|c| c.id == "routed").unwrap();
        let themed = merged.iter().find(|c| c.id == "themed").unwrap();
        // Stream-local scores are discarded for routing-only chunks.
        assert!((routed.score - settings.index_base).abs() < 1e-6);
        assert!((themed.score - settings.theme_base).abs() < 1e-6);
    }

    #[test]
    fn ties_break_on_chunk_id() {
        let settings = FusionSettings::default();
        let merged = merge_streams(
            vec![
                hit("z", 0.5, Provenance::Vector),
                hit("a", 0.5, Provenance::Vector),
            ],
            vec![],
            vec![],
            &settings,
        );
        assert_eq!(merged[0].id, "a");
        assert_eq!(merged[1].id, "z");
    }
}
