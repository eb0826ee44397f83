//! `Requires Plugins` header extraction.
//!
//! Plugin main files open with a comment block of `Field: value` lines. This
//! module finds the `Requires Plugins` field in that block and turns its
//! comma-separated value into validated slugs.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::constants::HEADER_SCAN_LIMIT;
use crate::slug::is_valid_slug;

static REQUIRES_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^[ \t/*#@]*Requires Plugins:(.*)$").expect("header pattern is a valid regex")
});

/// Extract the raw `Requires Plugins` value from a plugin file's leading text.
///
/// Only the first [`HEADER_SCAN_LIMIT`] bytes are searched. A trailing `*/`
/// and surrounding whitespace are stripped. Returns an empty string when the
/// field is absent.
pub fn read_requires_field(content: &str) -> String {
    let head = truncate_at_char_boundary(content, HEADER_SCAN_LIMIT);

    REQUIRES_FIELD
        .captures(head)
        .and_then(|caps| caps.get(1))
        .map(|m| cleanup_header_value(m.as_str()))
        .unwrap_or_default()
}

fn cleanup_header_value(value: &str) -> String {
    let value = value.trim();
    let value = value.strip_suffix("*/").unwrap_or(value);
    value.trim().to_string()
}

/// Parse a `Requires Plugins` value into parent slugs.
///
/// Each entry is trimmed, passed through `substitute` (which may swap a
/// premium slug for its free equivalent or the other way round) and then
/// validated. Invalid entries are dropped. The result is deduplicated and
/// sorted.
///
/// # Examples
///
/// ```rust
/// use slimload::detect::header::parse_requires;
///
/// let parents = parse_requires("woocommerce, Elementor, acf ", &|s: &str| s.to_string());
/// assert_eq!(parents, vec!["acf", "woocommerce"]);
/// ```
pub fn parse_requires(field: &str, substitute: &dyn Fn(&str) -> String) -> Vec<String> {
    field
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(substitute)
        .filter(|slug| {
            let valid = is_valid_slug(slug);
            if !valid {
                tracing::debug!("Dropping invalid slug '{}' from Requires Plugins header", slug);
            }
            valid
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Slice `text` to at most `limit` bytes without splitting a UTF-8 sequence.
pub(crate) fn truncate_at_char_boundary(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
