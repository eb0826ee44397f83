//! Common fixtures for slimload integration tests.
//!
//! [`sample_site`] lays out a small plugins directory covering every
//! evidence source; [`slimload_cmd`] runs the binary against a fixture.

// Not every helper is used by every test module
#![allow(dead_code)]

use anyhow::Result;
use assert_cmd::Command;
use slimload::test_utils::PluginFixture;

/// Plugins directory exercising headers, code scans, patterns, the
/// ecosystem table, a cycle and the legacy single-file plugin.
pub fn sample_site() -> Result<PluginFixture> {
    let fixture = PluginFixture::new()?;

    fixture.add_plugin("woocommerce/woocommerce.php", "WooCommerce", None, "define( 'WC_VERSION', '9.1.0' );\n")?;
    fixture.add_plugin(
        "my-gateway/my-gateway.php",
        "My Gateway",
        None,
        "class My_Gateway extends WC_Payment_Gateway {}\n",
    )?;
    fixture.add_plugin("shop-addon/shop-addon.php", "Shop Addon", Some("woocommerce, Not Valid"), "")?;
    fixture.add_plugin("elementor/elementor.php", "Elementor", None, "")?;
    fixture.add_plugin("elementor-pro/elementor-pro.php", "Elementor Pro", None, "")?;
    fixture.add_plugin("cycle-a/cycle-a.php", "Cycle A", Some("cycle-b"), "")?;
    fixture.add_plugin("cycle-b/cycle-b.php", "Cycle B", Some("cycle-a"), "")?;
    fixture.add_plugin("hello.php", "Hello Dolly", None, "")?;
    // Helper files inside a plugin directory are not plugins
    std::fs::write(fixture.plugins_dir.join("woocommerce/uninstall.php"), "<?php\n")?;

    Ok(fixture)
}

/// `slimload` invocation reading the fixture's configuration file.
pub fn slimload_cmd(fixture: &PluginFixture) -> Result<Command> {
    let config = fixture.write_config("")?;
    let mut cmd = Command::cargo_bin("slimload")?;
    cmd.current_dir(fixture.path())
        .env("NO_COLOR", "1")
        .env_remove("SLIMLOAD_CONFIG")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config);
    Ok(cmd)
}
