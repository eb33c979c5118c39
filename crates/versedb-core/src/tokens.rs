//! Token estimation shared by the chunker and the fusion budget walk.

/// Approximate token count as `ceil(chars / 4)`.
///
/// This is a heuristic, not a tokenizer: downstream budget logic must treat
/// it as an estimate with roughly +/-20% error on natural language, which is
/// why the chunker applies a tolerance factor on top of its target size.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}
