use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Lowercases and collapses whitespace runs to a single space.
pub fn normalize_sentence(sentence: &str) -> String {
    WHITESPACE_RUN
        .replace_all(sentence.trim(), " ")
        .to_lowercase()
}

pub fn strip_punctuation(text: &str) -> String {
    PUNCTUATION.replace_all(text, "").into_owned()
}

/// True when `needle` occurs in `haystack` once punctuation is removed from both.
/// Occurrences immediately preceded by `excluded_prefix` do not count.
pub fn is_loosely_contained(needle: &str, haystack: &str, excluded_prefix: Option<&str>) -> bool {
    let needle = strip_punctuation(needle);
    let haystack = strip_punctuation(haystack);
    if needle.is_empty() {
        return true;
    }

    haystack
        .match_indices(needle.as_str())
        .any(|(start, _)| !preceded_by(&haystack, start, excluded_prefix))
}

/// Whether `text[..position]` ends with `prefix`.
pub fn preceded_by(text: &str, position: usize, prefix: Option<&str>) -> bool {
    match prefix {
        Some(prefix) => text[..position].ends_with(prefix),
        None => false,
    }
}

/// Levenshtein similarity scaled to 0-100, where 100 means identical.
pub fn edit_distance_score(a: &str, b: &str) -> f64 {
    let distance = strsim::levenshtein(a, b);
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return if distance == 0 { 100.0 } else { 0.0 };
    }
    100.0 * (1.0 - distance as f64 / max_len as f64)
}

/// Numbers with thousands separators ("3,217") count as numeric.
pub fn is_numeric_token(token: &str) -> bool {
    token.replace(',', "").parse::<f64>().is_ok()
}

/// Drops whitespace-separated numeric tokens from the end of `text`.
pub fn strip_trailing_numbers(text: &str) -> String {
    let mut parts: Vec<&str> = text.split_whitespace().collect();
    while parts.last().is_some_and(|p| is_numeric_token(p)) {
        parts.pop();
    }
    parts.join(" ")
}

pub fn char_set(text: &str) -> BTreeSet<char> {
    text.chars().collect()
}

/// Renders a float without representation noise: at most six decimals, no trailing zeros.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.6}", value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Parses a numeric literal after removing `$`, thousands separators and whitespace.
pub fn parse_amount(literal: &str) -> Option<f64> {
    let cleaned: String = literal
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
