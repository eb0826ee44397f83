//! Static text scan of plugin source for ecosystem fingerprints.
//!
//! Three fixed lookup tables map well-known class/function names, constants
//! and hook prefixes to the plugin that defines them. A plugin whose source
//! mentions one of them is assumed to build on that plugin. Nothing is
//! executed or parsed; the scan is purely textual and bounded by
//! [`CODE_SCAN_LIMIT`](crate::constants::CODE_SCAN_LIMIT).

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use super::header::truncate_at_char_boundary;
use crate::constants::CODE_SCAN_LIMIT;

/// Class and function names defined by well-known plugins.
pub const KNOWN_SYMBOLS: &[(&str, &str)] = &[
    ("WooCommerce", "woocommerce"),
    ("WC_Payment_Gateway", "woocommerce"),
    ("wc_get_product", "woocommerce"),
    ("Elementor\\Plugin", "elementor"),
    ("Elementor\\Widget_Base", "elementor"),
    ("ElementorPro\\Plugin", "elementor-pro"),
    ("acf_add_local_field_group", "advanced-custom-fields"),
    ("get_field", "advanced-custom-fields"),
    ("GFForms", "gravityforms"),
    ("GFAPI", "gravityforms"),
    ("Easy_Digital_Downloads", "easy-digital-downloads"),
    ("buddypress", "buddypress"),
    ("bbpress", "bbpress"),
    ("WPSEO_Options", "wordpress-seo"),
    ("Jetpack", "jetpack"),
    ("SitePress", "sitepress-multilingual-cms"),
];

/// Version and path constants defined by well-known plugins.
pub const KNOWN_CONSTANTS: &[(&str, &str)] = &[
    ("WC_VERSION", "woocommerce"),
    ("WC_PLUGIN_FILE", "woocommerce"),
    ("ELEMENTOR_VERSION", "elementor"),
    ("ELEMENTOR_PATH", "elementor"),
    ("ELEMENTOR_PRO_VERSION", "elementor-pro"),
    ("ACF_VERSION", "advanced-custom-fields"),
    ("GF_MIN_WP_VERSION", "gravityforms"),
    ("EDD_VERSION", "easy-digital-downloads"),
    ("BP_PLUGIN_DIR", "buddypress"),
    ("WPSEO_VERSION", "wordpress-seo"),
    ("JETPACK__VERSION", "jetpack"),
    ("ICL_SITEPRESS_VERSION", "sitepress-multilingual-cms"),
];

/// Hook name prefixes owned by well-known plugins.
pub const KNOWN_HOOK_PREFIXES: &[(&str, &str)] = &[
    ("woocommerce_", "woocommerce"),
    ("wc_", "woocommerce"),
    ("elementor/", "elementor"),
    ("elementor_pro/", "elementor-pro"),
    ("acf/", "advanced-custom-fields"),
    ("gform_", "gravityforms"),
    ("edd_", "easy-digital-downloads"),
    ("bp_", "buddypress"),
    ("bbp_", "bbpress"),
    ("wpseo_", "wordpress-seo"),
    ("jetpack_", "jetpack"),
    ("wpml_", "sitepress-multilingual-cms"),
];

struct WordTable {
    patterns: Vec<(Regex, &'static str)>,
}

impl WordTable {
    fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        let patterns = entries
            .iter()
            .map(|(word, slug)| {
                let pattern = format!(r"(?:^|[^A-Za-z0-9_]){}(?:$|[^A-Za-z0-9_])", regex::escape(word));
                (Regex::new(&pattern).expect("escaped table entry is a valid regex"), *slug)
            })
            .collect();
        Self {
            patterns,
        }
    }

    fn matches<'t>(&'t self, text: &'t str) -> impl Iterator<Item = &'static str> + 't {
        self.patterns.iter().filter(|(re, _)| re.is_match(text)).map(|(_, slug)| *slug)
    }
}

static SYMBOL_TABLE: LazyLock<WordTable> = LazyLock::new(|| WordTable::new(KNOWN_SYMBOLS));
static CONSTANT_TABLE: LazyLock<WordTable> = LazyLock::new(|| WordTable::new(KNOWN_CONSTANTS));

static HOOK_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:add_action|add_filter|do_action|apply_filters|remove_action|remove_filter)\s*\(\s*['"]([^'"]+)['"]"#)
        .expect("hook call pattern is a valid regex")
});

/// Which table produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScanTable {
    /// [`KNOWN_SYMBOLS`]
    Symbol,
    /// [`KNOWN_CONSTANTS`]
    Constant,
    /// [`KNOWN_HOOK_PREFIXES`]
    HookPrefix,
}

/// Scan source text and return every slug a table hit points at, sorted.
pub fn scan_source(content: &str) -> Vec<String> {
    scan_source_detailed(content).into_iter().map(|(_, slug)| slug).collect::<BTreeSet<_>>().into_iter().collect()
}

/// Like [`scan_source`] but keeps track of the table behind each hit.
pub fn scan_source_detailed(content: &str) -> BTreeSet<(ScanTable, String)> {
    let text = truncate_at_char_boundary(content, CODE_SCAN_LIMIT);
    let mut hits = BTreeSet::new();

    for slug in SYMBOL_TABLE.matches(text) {
        hits.insert((ScanTable::Symbol, slug.to_string()));
    }
    for slug in CONSTANT_TABLE.matches(text) {
        hits.insert((ScanTable::Constant, slug.to_string()));
    }
    for caps in HOOK_CALL.captures_iter(text) {
        let hook = &caps[1];
        for (prefix, slug) in KNOWN_HOOK_PREFIXES {
            if hook.starts_with(prefix) {
                hits.insert((ScanTable::HookPrefix, (*slug).to_string()));
            }
        }
    }

    hits
}
