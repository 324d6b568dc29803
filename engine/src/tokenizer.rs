use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
}

/// Tokenize text into (term, position) using NFKC normalization and
/// lowercasing. Positions are 1-based token ordinals across the whole text,
/// which is what the phrase matcher's adjacency check expects.
pub fn tokenize(text: &str) -> Vec<(String, u32)> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    let mut tokens = Vec::new();
    for (pos, mat) in RE.find_iter(&normalized).enumerate() {
        tokens.push((mat.as_str().to_string(), pos as u32 + 1));
    }
    tokens
}

/// Query-side variant: the terms only, in order.
pub fn tokenize_terms(text: &str) -> Vec<String> {
    tokenize(text).into_iter().map(|(term, _)| term).collect()
}
