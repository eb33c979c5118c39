use versedb_chunk::payload::{DocumentPayload, SectionPayload};
use versedb_chunk::Chunker;
use versedb_core::config::ChunkingSettings;
use versedb_core::tokens::estimate_tokens;

fn small_settings() -> ChunkingSettings {
    ChunkingSettings {
        target_tokens: 100,
        overlap_percent: 0.15,
        tolerance: 1.2,
    }
}

fn paragraph(label: &str, sentences: usize) -> String {
    (0..sentences)
        .map(|i| format!("The {label} passage number {i} speaks of duty and devotion."))
        .collect::<Vec<_>>()
        .join(" ")
}

fn payload_with_sections(sections: Vec<SectionPayload>) -> DocumentPayload {
    let mut p = DocumentPayload::new("gita");
    p.title = "Bhagavad Gita".to_string();
    p.category = "/scripture/gita".to_string();
    p.sections = sections;
    p
}

/// The largest string that is both a suffix of `prev` and a prefix of `next`.
fn shared_overlap_len(prev: &str, next: &str) -> usize {
    let max = prev.len().min(next.len());
    let mut best = 0;
    for len in 1..=max {
        if !next.is_char_boundary(len) {
            continue;
        }
        if prev.ends_with(&next[..len]) {
            best = len;
        }
    }
    best
}

#[test]
fn small_section_becomes_one_complete_chunk() {
    let chunker = Chunker::new(small_settings());
    let payload = payload_with_sections(vec![SectionPayload {
        reference: Some("ch1".to_string()),
        primary: vec!["A short teaching on duty.".to_string()],
        secondary: vec!["एक छोटा उपदेश।".to_string()],
    }]);

    let outcome = chunker.chunk_document(&payload).expect("chunk");
    assert_eq!(outcome.chunks.len(), 1);
    let chunk = &outcome.chunks[0];
    assert!(chunk.complete_section);
    assert_eq!(chunk.exact_reference, "gita:ch1:1");
    assert_eq!(chunk.id, "gita:0");
    assert_eq!(chunk.token_count, estimate_tokens(&chunk.content));
    assert!(chunk.secondary_content.is_some());
    assert_eq!(outcome.document.total_chunks, 1);
}

#[test]
fn chunks_never_exceed_budget_cap() {
    let settings = small_settings();
    let cap = (settings.target_tokens as f32 * settings.tolerance) as usize;
    let chunker = Chunker::new(settings);

    let big: Vec<String> = (0..40).map(|i| paragraph(&format!("p{i}"), 3)).collect();
    let payload = payload_with_sections(vec![SectionPayload {
        reference: Some("ch1".to_string()),
        primary: big,
        secondary: vec![],
    }]);

    let outcome = chunker.chunk_document(&payload).expect("chunk");
    assert!(outcome.chunks.len() > 2);
    assert_eq!(outcome.overflow_chunks, 0);
    for chunk in &outcome.chunks {
        assert!(
            chunk.token_count <= cap,
            "chunk {} has {} tokens (cap {})",
            chunk.id,
            chunk.token_count,
            cap
        );
        assert!(!chunk.complete_section);
    }
}

#[test]
fn adjacent_chunks_share_verbatim_overlap() {
    let chunker = Chunker::new(small_settings());
    let big: Vec<String> = (0..40).map(|i| paragraph(&format!("p{i}"), 3)).collect();
    let payload = payload_with_sections(vec![SectionPayload {
        reference: None,
        primary: big,
        secondary: vec![],
    }]);

    let outcome = chunker.chunk_document(&payload).expect("chunk");
    assert!(outcome.chunks.len() >= 2);
    for pair in outcome.chunks.windows(2) {
        let shared = shared_overlap_len(&pair[0].content, &pair[1].content);
        assert!(
            shared > 0,
            "chunks {} and {} share no overlap",
            pair[0].id,
            pair[1].id
        );
    }
}

#[test]
fn single_chunk_documents_get_no_overlap_prefix() {
    let chunker = Chunker::new(small_settings());
    let text = "Only one small passage here.";
    let payload = payload_with_sections(vec![SectionPayload::from_text(text)]);
    let outcome = chunker.chunk_document(&payload).expect("chunk");
    assert_eq!(outcome.chunks.len(), 1);
    assert_eq!(outcome.chunks[0].content, text);
}

#[test]
fn reprocessing_unchanged_input_is_reference_stable() {
    let chunker = Chunker::new(small_settings());
    let big: Vec<String> = (0..20).map(|i| paragraph(&format!("p{i}"), 4)).collect();
    let payload = payload_with_sections(vec![
        SectionPayload {
            reference: Some("ch1".to_string()),
            primary: big.clone(),
            secondary: vec![],
        },
        SectionPayload {
            reference: Some("ch2".to_string()),
            primary: big,
            secondary: vec![],
        },
    ]);

    let first = chunker.chunk_document(&payload).expect("chunk");
    let second = chunker.chunk_document(&payload).expect("chunk");
    assert_eq!(first.chunks.len(), second.chunks.len());
    for (a, b) in first.chunks.iter().zip(second.chunks.iter()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.exact_reference, b.exact_reference);
        assert_eq!(a.content, b.content);
    }
}

#[test]
fn empty_sections_are_skipped_not_fatal() {
    let chunker = Chunker::new(small_settings());
    let payload = payload_with_sections(vec![
        SectionPayload::from_text("   \n \n  "),
        SectionPayload::from_text("A real passage about prayer."),
    ]);
    let outcome = chunker.chunk_document(&payload).expect("chunk");
    assert_eq!(outcome.skipped_sections, 1);
    assert_eq!(outcome.chunks.len(), 1);
}

#[test]
fn document_with_only_empty_sections_yields_zero_chunks() {
    let chunker = Chunker::new(small_settings());
    let payload = payload_with_sections(vec![SectionPayload::from_text("  ")]);
    let outcome = chunker.chunk_document(&payload).expect("chunk");
    assert!(outcome.chunks.is_empty());
    assert_eq!(outcome.document.total_chunks, 0);
}

#[test]
fn indivisible_sentence_overflows_and_is_counted() {
    let settings = small_settings();
    let cap = (settings.target_tokens as f32 * settings.tolerance) as usize;
    let chunker = Chunker::new(settings);

    // One enormous sentence with no terminator anywhere before the end.
    let monster = format!("{} end.", "unbroken chant ".repeat(200));
    let payload = payload_with_sections(vec![
        SectionPayload {
            reference: Some("ch1".to_string()),
            primary: vec![monster, paragraph("after", 2)],
            secondary: vec![],
        },
    ]);

    let outcome = chunker.chunk_document(&payload).expect("chunk");
    assert_eq!(outcome.overflow_chunks, 1);
    assert!(outcome.chunks.iter().any(|c| c.token_count > cap));
}

#[test]
fn chunks_carry_themes_keywords_and_summary() {
    let chunker = Chunker::new(small_settings());
    let payload = payload_with_sections(vec![SectionPayload::from_text(
        "Through devotion and worship the seeker finds liberation. \
         Welcome salvation through steady devotion.",
    )]);
    let outcome = chunker.chunk_document(&payload).expect("chunk");
    let chunk = &outcome.chunks[0];
    assert!(chunk.themes.contains(&"devotion".to_string()));
    assert!(chunk.themes.contains(&"liberation".to_string()));
    assert!(chunk.keywords.contains(&"devotion".to_string()));
    assert!(!chunk.summary.is_empty());
}
