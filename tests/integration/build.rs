//! Map construction from a plugins directory on disk.

use anyhow::Result;
use std::collections::BTreeSet;

use slimload::cache::MemoryStore;
use slimload::config::SlimConfig;
use slimload::graph::{CircularPair, DependencySource};
use slimload::host::{FsPluginHost, PluginHost};
use slimload::manager::DependencyManager;

use crate::common::sample_site;

#[test]
fn test_discovers_installed_plugins() -> Result<()> {
    let fixture = sample_site()?;
    let host = FsPluginHost::new(&fixture.plugins_dir, None);

    let plugins = host.active_plugins()?;
    assert!(plugins.contains(&"woocommerce/woocommerce.php".to_string()));
    assert!(plugins.contains(&"hello.php".to_string()));
    assert!(!plugins.iter().any(|p| p.ends_with("uninstall.php")));
    assert_eq!(plugins.len(), 8);
    Ok(())
}

#[test]
fn test_every_evidence_source_contributes() -> Result<()> {
    let fixture = sample_site()?;
    let host = FsPluginHost::new(&fixture.plugins_dir, None);
    let mut manager = DependencyManager::new(host, MemoryStore::new());

    let map = manager.get_dependency_map()?;

    // Header, with the invalid entry dropped
    assert!(map.has_edge("shop-addon", "woocommerce"));
    assert_eq!(map.dependencies_of("shop-addon").count(), 1);
    // Code scan
    let gateway = map.get("my-gateway").expect("gateway record");
    assert_eq!(gateway.evidence.get("woocommerce"), Some(&DependencySource::Code));
    // Pattern and ecosystem agree on elementor-pro
    assert!(map.has_edge("elementor-pro", "elementor"));

    let woo = map.get("woocommerce").expect("woocommerce record");
    assert!(woo.plugins_depending.contains("shop-addon"));
    assert!(woo.plugins_depending.contains("my-gateway"));
    assert!(woo.depends_on.is_empty());
    Ok(())
}

#[test]
fn test_cycle_detected_and_flagged() -> Result<()> {
    let fixture = sample_site()?;
    let host = FsPluginHost::new(&fixture.plugins_dir, None);
    let mut manager = DependencyManager::new(host, MemoryStore::new());

    let circular = manager.circular_dependencies()?;
    assert_eq!(circular.len(), 1);
    assert!(circular.contains(&CircularPair::new("cycle-a", "cycle-b")));

    let map = manager.get_dependency_map()?;
    for slug in ["cycle-a", "cycle-b"] {
        let record = map.get(slug).expect("cycle record");
        assert!(record.has_circular);
        assert!(record.circular_with.is_some());
    }
    Ok(())
}

#[test]
fn test_resolution_over_disk_map() -> Result<()> {
    let fixture = sample_site()?;
    let host = FsPluginHost::new(&fixture.plugins_dir, None);
    let mut manager = DependencyManager::new(host, MemoryStore::new());
    let active = manager.active_slugs()?;

    let resolved = manager.resolve_dependencies(["shop-addon"], &active, false)?;
    assert_eq!(resolved, BTreeSet::from(["shop-addon".to_string(), "woocommerce".to_string()]));

    let with_reverse = manager.resolve_dependencies(["woocommerce"], &active, true)?;
    assert!(with_reverse.contains("my-gateway"));
    assert!(with_reverse.contains("shop-addon"));
    assert!(!with_reverse.contains("elementor"));

    // The circular edge is never followed
    let cyclic = manager.resolve_dependencies(["cycle-a"], &active, false)?;
    assert_eq!(cyclic, BTreeSet::from(["cycle-a".to_string()]));
    Ok(())
}

#[test]
fn test_inactive_plugins_are_excluded() -> Result<()> {
    let fixture = sample_site()?;
    let host = FsPluginHost::new(
        &fixture.plugins_dir,
        Some(vec!["shop-addon/shop-addon.php".to_string(), "elementor/elementor.php".to_string()]),
    );
    let mut manager = DependencyManager::new(host, MemoryStore::new());
    let active = manager.active_slugs()?;
    assert_eq!(active.len(), 2);

    let map = manager.get_dependency_map()?;
    assert!(map.has_edge("shop-addon", "woocommerce"));
    assert!(!map.contains("my-gateway"));

    // Forward edges are followed regardless of activity
    let resolved = manager.resolve_dependencies(["shop-addon"], &active, false)?;
    assert!(resolved.contains("woocommerce"));

    let reverse = manager.resolve_dependencies(["woocommerce"], &active, true)?;
    assert_eq!(reverse, BTreeSet::from(["shop-addon".to_string(), "woocommerce".to_string()]));
    Ok(())
}

#[test]
fn test_declared_dependencies_from_config() -> Result<()> {
    let fixture = sample_site()?;
    let path = fixture.write_config("[declared]\nshop-addon = [\"elementor\"]\n")?;
    let config = SlimConfig::load_from(&path)?;

    let mut manager = DependencyManager::new(config.plugin_host(), MemoryStore::new());
    if let Some(authority) = config.authority() {
        manager = manager.with_authority(authority);
    }

    let map = manager.get_dependency_map()?;
    let record = map.get("shop-addon").expect("declared record");
    assert_eq!(record.source, DependencySource::WpCore);
    // Heuristics never touch an authoritative record
    assert!(record.depends_on.contains("elementor"));
    assert!(!record.depends_on.contains("woocommerce"));
    Ok(())
}

#[test]
fn test_slug_substitution_from_config() -> Result<()> {
    let fixture = sample_site()?;
    fixture.add_plugin("shop-pro/shop-pro.php", "Shop Pro", Some("woo"), "")?;
    let path = fixture.write_config("[slug_substitutions]\nwoo = \"woocommerce\"\n")?;
    let config = SlimConfig::load_from(&path)?;

    let mut manager =
        DependencyManager::new(config.plugin_host(), MemoryStore::new()).with_hooks(config.hooks());

    let map = manager.get_dependency_map()?;
    assert!(map.has_edge("shop-pro", "woocommerce"));
    assert!(!map.contains("woo"));
    Ok(())
}
