//! File store persistence, cache reuse and invalidation.

use anyhow::Result;
use std::fs;

use slimload::cache::{FileStore, KeyValueStore};
use slimload::constants::{CUSTOM_DEPENDENCIES_KEY, DEPENDENCY_MAP_KEY, VERSION_KEY};
use slimload::host::FsPluginHost;
use slimload::manager::{DependencyManager, ENGINE_VERSION};
use slimload::test_utils::PluginFixture;

use crate::common::sample_site;

fn open(fixture: &PluginFixture) -> DependencyManager<FsPluginHost, FileStore> {
    DependencyManager::new(
        FsPluginHost::new(&fixture.plugins_dir, None),
        FileStore::new(&fixture.state_dir),
    )
}

#[test]
fn test_map_survives_process_boundary() -> Result<()> {
    let fixture = sample_site()?;
    let built = open(&fixture).get_dependency_map()?;

    let map_file = fixture.state_dir.join(format!("{DEPENDENCY_MAP_KEY}.json"));
    assert!(map_file.is_file());

    // Editing a plugin file without changing the active list keeps the
    // fingerprint, so the second manager serves the stored map
    fs::write(fixture.plugins_dir.join("shop-addon/shop-addon.php"), "<?php\n/**\n * Plugin Name: Shop Addon\n */\n")?;
    let map = open(&fixture).get_dependency_map()?;
    assert_eq!(map, built);
    assert!(map.has_edge("shop-addon", "woocommerce"));
    Ok(())
}

#[test]
fn test_active_set_change_rebuilds() -> Result<()> {
    let fixture = sample_site()?;
    let before = open(&fixture).get_dependency_map()?;
    assert!(!before.contains("late-addon"));

    fixture.add_plugin("late-addon/late-addon.php", "Late Addon", Some("woocommerce"), "")?;
    let after = open(&fixture).get_dependency_map()?;
    assert!(after.has_edge("late-addon", "woocommerce"));
    Ok(())
}

#[test]
fn test_malformed_store_blob_is_rebuilt() -> Result<()> {
    let fixture = sample_site()?;
    fs::create_dir_all(&fixture.state_dir)?;
    fs::write(fixture.state_dir.join(format!("{DEPENDENCY_MAP_KEY}.json")), "{ not json")?;

    let map = open(&fixture).get_dependency_map()?;
    assert!(map.has_edge("shop-addon", "woocommerce"));

    let raw = FileStore::new(&fixture.state_dir).get(DEPENDENCY_MAP_KEY)?.expect("rewritten blob");
    assert!(serde_json::from_str::<serde_json::Value>(&raw).is_ok());
    Ok(())
}

#[test]
fn test_custom_edits_survive_invalidation() -> Result<()> {
    let fixture = sample_site()?;

    let mut manager = open(&fixture);
    assert!(manager.add_custom_dependency("hello-dolly", "elementor")?);
    assert!(manager.remove_custom_dependency("elementor-pro", "elementor")?);
    manager.invalidate();

    let store = FileStore::new(&fixture.state_dir);
    assert!(store.get(CUSTOM_DEPENDENCIES_KEY)?.is_some());

    let map = open(&fixture).build_dependency_map()?;
    assert!(map.has_edge("hello-dolly", "elementor"));
    assert!(!map.has_edge("elementor-pro", "elementor"));
    Ok(())
}

#[test]
fn test_cycle_closing_edit_rejected_and_not_persisted() -> Result<()> {
    let fixture = sample_site()?;
    let mut manager = open(&fixture);

    assert!(!manager.add_custom_dependency("woocommerce", "shop-addon")?);
    assert!(!manager.get_dependency_map()?.has_edge("woocommerce", "shop-addon"));
    assert!(FileStore::new(&fixture.state_dir).get(CUSTOM_DEPENDENCIES_KEY)?.is_none());
    Ok(())
}

#[test]
fn test_version_change_invalidates_store() -> Result<()> {
    let fixture = sample_site()?;
    open(&fixture).get_dependency_map()?;

    let store = FileStore::new(&fixture.state_dir);
    store.set(VERSION_KEY, "0.0.1")?;

    let mut manager = open(&fixture);
    assert!(manager.check_version());
    assert!(store.get(DEPENDENCY_MAP_KEY)?.is_none());
    assert_eq!(manager.cache().stored_version().as_deref(), Some(ENGINE_VERSION));

    // Same version again: nothing to do
    assert!(!manager.check_version());
    Ok(())
}
