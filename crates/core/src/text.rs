use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

static CLEANER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{Nd}\s]+").expect("valid tokenizer regex"));

pub fn tokenize(input: &str) -> Vec<String> {
    let normalized = CLEANER.replace_all(input, " ").to_lowercase();

    normalized
        .split_whitespace()
        .map(|token| token.to_string())
        .collect()
}

pub fn is_blank(input: &str) -> bool {
    input.trim().is_empty()
}

/// Grapheme-safe truncation for log fields.
pub fn preview(input: &str, max_graphemes: usize) -> String {
    let trimmed = input.trim();
    match trimmed.grapheme_indices(true).nth(max_graphemes) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
