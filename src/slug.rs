//! Slug normalization and validation.
//!
//! A slug is the canonical short name of an installed plugin. Every other
//! module keys its data by slug, so anything entering the dependency graph
//! passes through [`is_valid_slug`] first.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::constants::{LEGACY_PLUGIN_FILE, LEGACY_PLUGIN_SLUG};

static SLUG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("slug pattern is a valid regex")
});

/// Derive the slug of a plugin from its file identifier.
///
/// - `hello.php` maps to `hello-dolly` (legacy exception)
/// - `dir/main.php` maps to `dir`
/// - `single-file.php` maps to `single-file`
///
/// Never fails. An empty identifier yields an empty slug, which
/// [`is_valid_slug`] rejects.
///
/// # Examples
///
/// ```rust
/// use slimload::slug::get_plugin_slug;
///
/// assert_eq!(get_plugin_slug("elementor/elementor.php"), "elementor");
/// assert_eq!(get_plugin_slug("hello.php"), "hello-dolly");
/// assert_eq!(get_plugin_slug("standalone-plugin.php"), "standalone-plugin");
/// ```
pub fn get_plugin_slug(path: &str) -> String {
    if path == LEGACY_PLUGIN_FILE {
        return LEGACY_PLUGIN_SLUG.to_string();
    }

    if let Some((dir, _)) = path.split_once(['/', '\\']) {
        return dir.to_string();
    }

    match path.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => path.to_string(),
    }
}

/// Check a string against the slug grammar `^[a-z0-9]+(-[a-z0-9]+)*$`.
///
/// Rejects uppercase, leading or trailing hyphens, doubled hyphens, the
/// empty string and anything outside `[a-z0-9-]`.
pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_PATTERN.is_match(slug)
}

/// Keep the valid slugs of `candidates`, deduplicated and sorted.
pub fn sanitize_slugs<I, S>(candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    candidates
        .into_iter()
        .filter(|s| is_valid_slug(s.as_ref()))
        .map(|s| s.as_ref().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_from_nested_path() {
        assert_eq!(get_plugin_slug("elementor/elementor.php"), "elementor");
        assert_eq!(get_plugin_slug("woocommerce/includes/deep.php"), "woocommerce");
        assert_eq!(get_plugin_slug("akismet\\akismet.php"), "akismet");
    }

    #[test]
    fn test_slug_from_single_file() {
        assert_eq!(get_plugin_slug("standalone-plugin.php"), "standalone-plugin");
        assert_eq!(get_plugin_slug("no-extension"), "no-extension");
    }

    #[test]
    fn test_legacy_slug() {
        assert_eq!(get_plugin_slug("hello.php"), "hello-dolly");
        // Only the bare filename is special
        assert_eq!(get_plugin_slug("hello/hello.php"), "hello");
    }

    #[test]
    fn test_empty_path_yields_invalid_slug() {
        let slug = get_plugin_slug("");
        assert!(slug.is_empty());
        assert!(!is_valid_slug(&slug));
    }

    #[test]
    fn test_valid_slugs() {
        for slug in ["a", "woocommerce", "elementor-pro", "acf-5", "123", "a-b-c"] {
            assert!(is_valid_slug(slug), "{slug} should be valid");
        }
    }

    #[test]
    fn test_invalid_slugs() {
        for slug in ["", "Elementor", "-lead", "trail-", "double--hyphen", "under_score", "dot.php", "sp ace"]
        {
            assert!(!is_valid_slug(slug), "{slug:?} should be invalid");
        }
    }

    #[test]
    fn test_sanitize_slugs() {
        let cleaned = sanitize_slugs(["zeta", "Alpha", "alpha", "zeta", "bad--slug", "beta"]);
        assert_eq!(cleaned, vec!["alpha", "beta", "zeta"]);
    }
}
