//! Curated ecosystem table.
//!
//! Maps an ecosystem root to the add-ons known to require it. The table only
//! ever confirms relationships for children that are actually active; it
//! never invents an edge for an absent plugin.

use std::collections::BTreeSet;

/// Root slug and its known children.
pub const KNOWN_ECOSYSTEMS: &[(&str, &[&str])] = &[
    (
        "woocommerce",
        &[
            "woocommerce-payments",
            "woocommerce-subscriptions",
            "woocommerce-memberships",
            "woocommerce-gateway-stripe",
            "woocommerce-services",
            "woocommerce-pdf-invoices-packing-slips",
            "woocommerce-multilingual",
            "woo-gutenberg-products-block",
            "wpseo-woocommerce",
        ],
    ),
    (
        "elementor",
        &[
            "elementor-pro",
            "essential-addons-for-elementor-lite",
            "header-footer-elementor",
            "premium-addons-for-elementor",
            "the-plus-addons-for-elementor-page-builder",
        ],
    ),
    ("advanced-custom-fields", &["acf-extended", "acf-to-rest-api"]),
    ("easy-digital-downloads", &["edd-recurring", "edd-software-licensing"]),
    ("buddypress", &["bp-better-messages", "buddypress-docs"]),
    ("bbpress", &["bbp-style-pack"]),
    ("wordpress-seo", &["wordpress-seo-premium", "wpseo-woocommerce"]),
    ("gravityforms", &["gravityformsstripe", "gravityformspaypal", "gravityformsmailchimp"]),
    (
        "sitepress-multilingual-cms",
        &["wpml-string-translation", "wpml-media-translation", "woocommerce-multilingual"],
    ),
];

/// Roots listing `slug` as a known child, sorted.
pub fn ecosystem_parents(slug: &str) -> Vec<String> {
    KNOWN_ECOSYSTEMS
        .iter()
        .filter(|(root, children)| *root != slug && children.contains(&slug))
        .map(|(root, _)| (*root).to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Every `(child, root)` edge of the table whose child is in `active`.
pub fn ecosystem_edges(active: &BTreeSet<String>) -> Vec<(String, String)> {
    let mut edges = Vec::new();
    for (root, children) in KNOWN_ECOSYSTEMS {
        for child in children.iter().filter(|c| active.contains(**c)) {
            edges.push(((*child).to_string(), (*root).to_string()));
        }
    }
    edges.sort();
    edges
}
