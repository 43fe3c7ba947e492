//! Hashtag token handling.
//!
//! Hashtags live only in the dedicated `hashtags` field. This module
//! coerces model-supplied tags into `#word` form and keeps the article body
//! free of tag tokens that were not already in the source.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// `#` followed by letters, digits or underscores, wherever it occurs.
/// Numeric HTML entities (`&#39;`) are matched as a whole so they can be
/// skipped; `C#` has no tag body and never matches.
static HASHTAG_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&#\d+;|#[\p{L}\p{N}_]+").expect("hashtag pattern is valid")
});

/// All hashtag tokens in `text`, in order of appearance.
pub fn find_tokens(text: &str) -> Vec<String> {
    HASHTAG_TOKEN
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|t| t.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Coerce a model-supplied tag into `#word` form.
///
/// Leading `#`s and whitespace are dropped, inner spaces and punctuation
/// are removed. Returns `None` when nothing usable remains.
pub fn coerce(tag: &str) -> Option<String> {
    let body: String = tag
        .trim()
        .trim_start_matches('#')
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if body.is_empty() {
        None
    } else {
        Some(format!("#{}", body))
    }
}

/// Coerce every tag and drop empties and case-insensitive duplicates,
/// keeping first-seen order.
pub fn normalize(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .filter_map(|t| coerce(t))
        .filter(|t| seen.insert(t.to_lowercase()))
        .collect()
}

/// Drop trailing lines that hold nothing but hashtag tokens, a common way
/// models "sign off" an article despite instructions.
pub fn strip_trailing_tag_lines(article: &str) -> String {
    let mut lines: Vec<&str> = article.trim_end().lines().collect();
    while let Some(last) = lines.last() {
        let trimmed = last.trim();
        if trimmed.is_empty() || is_tag_only_line(trimmed) {
            lines.pop();
        } else {
            break;
        }
    }
    lines.join("\n")
}

fn is_tag_only_line(line: &str) -> bool {
    line.split_whitespace()
        .all(|word| word.starts_with('#') && coerce(word).is_some())
}

/// Hashtag tokens in `article` that do not occur verbatim in `allowed`.
pub fn stray_tokens(article: &str, allowed: &[String]) -> Vec<String> {
    find_tokens(article)
        .into_iter()
        .filter(|t| !allowed.iter().any(|a| a == t))
        .collect()
}
