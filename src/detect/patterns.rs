//! Slug naming-convention rules.
//!
//! Add-ons tend to be named after the plugin they extend
//! (`woocommerce-gateway-stripe`, `elementor-addons`,
//! `payments-for-woocommerce`). Each rule pairs a regex over the plugin's
//! own slug with the parent it implies. The rule table is fixed.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Ordered `(pattern, parent)` rules.
pub const SLUG_RULES: &[(&str, &str)] = &[
    (r"^woocommerce-", "woocommerce"),
    (r"^woo-", "woocommerce"),
    (r"^wc-", "woocommerce"),
    (r"-for-woocommerce$", "woocommerce"),
    (r"-woocommerce$", "woocommerce"),
    (r"^elementor-", "elementor"),
    (r"-for-elementor(-|$)", "elementor"),
    (r"^acf-", "advanced-custom-fields"),
    (r"^advanced-custom-fields-", "advanced-custom-fields"),
    (r"^gravityforms.+", "gravityforms"),
    (r"^gf-", "gravityforms"),
    (r"^edd-", "easy-digital-downloads"),
    (r"^easy-digital-downloads-", "easy-digital-downloads"),
    (r"^buddypress-", "buddypress"),
    (r"^bp-", "buddypress"),
    (r"^bbpress-", "bbpress"),
    (r"^bbp-", "bbpress"),
    (r"^wordpress-seo-", "wordpress-seo"),
    (r"^wpseo-", "wordpress-seo"),
    (r"^wpml-", "sitepress-multilingual-cms"),
    (r"^jetpack-", "jetpack"),
];

struct SlugRule {
    pattern: Regex,
    parent: &'static str,
}

static RULES: LazyLock<Vec<SlugRule>> = LazyLock::new(|| {
    SLUG_RULES
        .iter()
        .map(|(pattern, parent)| SlugRule {
            pattern: Regex::new(pattern).expect("slug rule is a valid regex"),
            parent: *parent,
        })
        .collect()
});

/// Parents implied by the naming of `slug`, sorted.
///
/// A rule never yields `slug` itself, so an ecosystem root does not depend on
/// itself.
///
/// # Examples
///
/// ```rust
/// use slimload::detect::patterns::match_slug;
///
/// assert_eq!(match_slug("woocommerce-gateway-stripe"), vec!["woocommerce"]);
/// assert!(match_slug("woocommerce").is_empty());
/// ```
pub fn match_slug(slug: &str) -> Vec<String> {
    RULES
        .iter()
        .filter(|rule| rule.parent != slug && rule.pattern.is_match(slug))
        .map(|rule| rule.parent.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_rules() {
        assert_eq!(match_slug("elementor-pro"), vec!["elementor"]);
        assert_eq!(match_slug("acf-extended"), vec!["advanced-custom-fields"]);
        assert_eq!(match_slug("wc-vendors"), vec!["woocommerce"]);
        assert_eq!(match_slug("gravityformsstripe"), vec!["gravityforms"]);
    }

    #[test]
    fn test_suffix_rules() {
        assert_eq!(match_slug("payments-for-woocommerce"), vec!["woocommerce"]);
        assert_eq!(match_slug("essential-addons-for-elementor-lite"), vec!["elementor"]);
    }

    #[test]
    fn test_root_never_depends_on_itself() {
        for root in ["woocommerce", "elementor", "gravityforms", "jetpack", "bbpress"] {
            assert!(match_slug(root).is_empty(), "{root} matched a rule");
        }
    }

    #[test]
    fn test_multiple_rules_union() {
        assert_eq!(match_slug("elementor-widgets-for-woocommerce"), vec!["elementor", "woocommerce"]);
    }

    #[test]
    fn test_unrelated_slug() {
        assert!(match_slug("contact-form-7").is_empty());
        assert!(match_slug("akismet").is_empty());
    }
}
