//! String cleanup shared by the text and table paths.
//!
//! Both functions are pure and idempotent: running them on their own output returns the
//! same string.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Technical abbreviations common in datasheet tables, matched as whole words with an
/// optional trailing period.
static ABBREVIATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(typ|min|max|nom)\b(\.)?").expect("Abbreviation regex pattern is valid and should compile")
});

/// Collapse every whitespace run to a single space and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clean recognized page text.
///
/// Trims, collapses whitespace, then drops single-character tokens unless they are a
/// digit. OCR output on scanned datasheets is full of stray marks (`|`, `.`, `'`) that
/// survive as one-character tokens.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace()
        .filter(|word| word.chars().count() > 1 || word.chars().all(|c| c.is_ascii_digit()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Clean a single table cell and expand technical abbreviations.
///
/// `TYP`, `MIN`, `MAX` and `NOM` (any case, optional trailing period) become `typical`,
/// `minimum`, `maximum` and `nominal`. Matching is word-bounded, so `MINIMUM`, `maxi` or
/// `typical` are left untouched. A period directly followed by a letter or digit
/// separates two tokens and is kept (`MIN.MAX` -> `minimum.maximum`).
pub fn normalize_cell(text: &str) -> String {
    let collapsed = collapse_whitespace(text);
    if collapsed.is_empty() {
        return collapsed;
    }

    ABBREVIATION_PATTERN
        .replace_all(&collapsed, |caps: &Captures<'_>| {
            let expanded = match caps[1].to_ascii_lowercase().as_str() {
                "typ" => "typical",
                "min" => "minimum",
                "max" => "maximum",
                _ => "nominal",
            };
            let separator = caps.get(2).is_some()
                && caps
                    .get(0)
                    .and_then(|m| collapsed[m.end()..].chars().next())
                    .is_some_and(char::is_alphanumeric);
            if separator {
                format!("{}.", expanded)
            } else {
                expanded.to_string()
            }
        })
        .into_owned()
}

/// True for the null markers table backends emit for empty grid positions.
pub fn is_placeholder_cell(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") || trimmed.eq_ignore_ascii_case("none")
}

/// Truncate to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
