//! Per-chunk thematic metadata: theme labels from a configurable lexicon and
//! keyword labels from a stopword-filtered frequency pass.

use std::collections::HashMap;

/// Maximum keyword labels attached to a chunk.
const MAX_KEYWORDS: usize = 8;

/// Minimum word length considered for keyword extraction.
const MIN_KEYWORD_LEN: usize = 4;

const STOPWORDS: &[&str] = &[
    "about", "after", "again", "all", "and", "are", "because", "been", "before", "being", "but",
    "came", "can", "come", "could", "did", "does", "doing", "done", "down", "each", "even",
    "every", "for", "from", "had", "has", "have", "her", "here", "him", "his", "how", "into",
    "its", "just", "like", "made", "make", "many", "more", "most", "much", "not", "now", "one",
    "only", "other", "our", "out", "over", "said", "same", "shall", "she", "should", "some",
    "such", "than", "that", "the", "thee", "their", "them", "then", "there", "these", "they",
    "this", "those", "thou", "through", "thus", "thy", "unto", "upon", "very", "was", "were",
    "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would",
    "you", "your",
];

/// Assigns theme labels by matching a theme -> trigger-terms lexicon against
/// chunk text, and extracts keyword labels by term frequency.
///
/// The default lexicon covers recurring themes of the corpus; callers can
/// supply their own mapping when ingesting other material.
#[derive(Debug, Clone)]
pub struct ThemeTagger {
    lexicon: Vec<(String, Vec<String>)>,
}

impl Default for ThemeTagger {
    fn default() -> Self {
        Self::new(default_lexicon())
    }
}

impl ThemeTagger {
    pub fn new(lexicon: Vec<(String, Vec<String>)>) -> Self {
        Self { lexicon }
    }

    /// Theme labels whose trigger terms occur in the text, in lexicon order.
    pub fn themes(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        self.lexicon
            .iter()
            .filter(|(_, triggers)| {
                triggers
                    .iter()
                    .any(|t| words.iter().any(|w| *w == t.as_str()))
            })
            .map(|(theme, _)| theme.clone())
            .collect()
    }

    /// Top keyword labels by frequency, ties broken alphabetically so the
    /// output is deterministic for identical input.
    pub fn keywords(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for word in lowered.split(|c: char| !c.is_alphanumeric()) {
            if word.chars().count() < MIN_KEYWORD_LEN || STOPWORDS.contains(&word) {
                continue;
            }
            *counts.entry(word).or_insert(0) += 1;
        }
        let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
            .into_iter()
            .take(MAX_KEYWORDS)
            .map(|(w, _)| w.to_string())
            .collect()
    }
}

/// Built-in theme lexicon for the scripture corpus.
pub fn default_lexicon() -> Vec<(String, Vec<String>)> {
    let entries: &[(&str, &[&str])] = &[
        ("dharma", &["dharma", "duty", "righteousness", "virtue"]),
        ("karma", &["karma", "action", "deeds", "consequence"]),
        ("devotion", &["bhakti", "devotion", "worship", "prayer", "surrender"]),
        ("liberation", &["moksha", "liberation", "salvation", "nirvana"]),
        ("soul", &["atman", "soul", "spirit", "self"]),
        ("meditation", &["meditation", "dhyana", "contemplation", "stillness"]),
        ("wisdom", &["wisdom", "knowledge", "jnana", "understanding"]),
        ("compassion", &["compassion", "mercy", "karuna", "kindness"]),
        ("faith", &["faith", "belief", "trust", "shraddha"]),
        ("creation", &["creation", "creator", "genesis", "origin"]),
    ];
    entries
        .iter()
        .map(|(theme, triggers)| {
            (
                (*theme).to_string(),
                triggers.iter().map(|t| (*t).to_string()).collect(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn themes_match_whole_words_only() {
        let tagger = ThemeTagger::default();
        let themes = tagger.themes("The warrior asked about his duty and his karma.");
        assert!(themes.contains(&"dharma".to_string()));
        assert!(themes.contains(&"karma".to_string()));
        // "selfless" must not trigger the "self" lexeme of the soul theme.
        let themes = tagger.themes("A selfless act.");
        assert!(!themes.contains(&"soul".to_string()));
    }

    #[test]
    fn keywords_are_deterministic_and_stopword_free() {
        let tagger = ThemeTagger::default();
        let text = "righteousness battle battle warrior warrior warrior the that with";
        let kw = tagger.keywords(text);
        assert_eq!(kw.first().map(String::as_str), Some("warrior"));
        assert!(kw.contains(&"battle".to_string()));
        assert!(!kw.contains(&"that".to_string()));
        assert_eq!(kw, tagger.keywords(text));
    }
}
