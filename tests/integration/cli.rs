//! Command-line behaviour and output formats.

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

use crate::common::{sample_site, slimload_cmd};

fn json_output(cmd: &mut Command) -> Result<Value> {
    let output = cmd.output()?;
    assert!(output.status.success(), "command failed: {}", String::from_utf8_lossy(&output.stderr));
    Ok(serde_json::from_slice(&output.stdout)?)
}

#[test]
fn test_slug_needs_no_configuration() -> Result<()> {
    let mut cmd = Command::cargo_bin("slimload")?;
    cmd.env_remove("SLIMLOAD_CONFIG")
        .args(["slug", "elementor/elementor.php"])
        .assert()
        .success()
        .stdout("elementor\n");

    let mut cmd = Command::cargo_bin("slimload")?;
    cmd.args(["slug", "hello.php"]).assert().success().stdout("hello-dolly\n");
    Ok(())
}

#[test]
fn test_slug_rejects_invalid_identifier() -> Result<()> {
    let mut cmd = Command::cargo_bin("slimload")?;
    cmd.env("NO_COLOR", "1")
        .args(["slug", "Bad_Plugin/Bad_Plugin.php"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid plugin slug"));
    Ok(())
}

#[test]
fn test_map_text_output() -> Result<()> {
    let fixture = sample_site()?;
    slimload_cmd(&fixture)?
        .arg("map")
        .assert()
        .success()
        .stdout(predicate::str::contains("shop-addon"))
        .stdout(predicate::str::contains("depends on: woocommerce"))
        .stdout(predicate::str::contains("[circular with cycle-"));
    Ok(())
}

#[test]
fn test_map_json_output() -> Result<()> {
    let fixture = sample_site()?;
    let value = json_output(slimload_cmd(&fixture)?.args(["--format", "json", "map"]))?;

    let addon = &value["shop-addon"];
    assert_eq!(addon["depends_on"], serde_json::json!(["woocommerce"]));
    assert!(value["woocommerce"]["plugins_depending"].as_array().is_some_and(|a| a.len() == 2));
    Ok(())
}

#[test]
fn test_resolve_prints_seed_and_dependencies() -> Result<()> {
    let fixture = sample_site()?;
    slimload_cmd(&fixture)?
        .args(["resolve", "elementor-pro"])
        .assert()
        .success()
        .stdout(predicate::str::contains("elementor-pro\n"))
        .stdout(predicate::str::contains("elementor (dependency)"));
    Ok(())
}

#[test]
fn test_resolve_json_with_reverse() -> Result<()> {
    let fixture = sample_site()?;
    let value = json_output(slimload_cmd(&fixture)?.args(["-f", "json", "resolve", "woocommerce", "--reverse"]))?;

    let plugins: Vec<&str> = value["plugins"]
        .as_array()
        .expect("plugins array")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(plugins, vec!["my-gateway", "shop-addon", "woocommerce"]);
    assert_eq!(value["truncated"], false);
    Ok(())
}

#[test]
fn test_resolve_rejects_invalid_slug() -> Result<()> {
    let fixture = sample_site()?;
    slimload_cmd(&fixture)?
        .args(["resolve", "Not A Slug"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid plugin slug"));
    Ok(())
}

#[test]
fn test_cycles_listing() -> Result<()> {
    let fixture = sample_site()?;
    slimload_cmd(&fixture)?
        .arg("cycles")
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 1 circular dependencies"))
        .stdout(predicate::str::contains("cycle-a <-> cycle-b"));
    Ok(())
}

#[test]
fn test_add_dep_round_trip_through_store() -> Result<()> {
    let fixture = sample_site()?;
    slimload_cmd(&fixture)?
        .args(["add-dep", "hello-dolly", "elementor"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added dependency hello-dolly -> elementor"));

    // A rebuild replays the stored edit
    slimload_cmd(&fixture)?.arg("rebuild").assert().success();
    let value = json_output(slimload_cmd(&fixture)?.args(["--format", "json", "map"]))?;
    assert_eq!(value["hello-dolly"]["depends_on"], serde_json::json!(["elementor"]));
    assert_eq!(value["hello-dolly"]["evidence"]["elementor"], "custom");
    Ok(())
}

#[test]
fn test_add_dep_refuses_cycle() -> Result<()> {
    let fixture = sample_site()?;
    slimload_cmd(&fixture)?
        .args(["add-dep", "woocommerce", "my-gateway"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Refused dependency"));
    Ok(())
}

#[test]
fn test_remove_dep_of_missing_edge_fails() -> Result<()> {
    let fixture = sample_site()?;
    slimload_cmd(&fixture)?
        .args(["remove-dep", "elementor", "woocommerce"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No dependency elementor -> woocommerce"));
    Ok(())
}

#[test]
fn test_rebuild_statistics_json() -> Result<()> {
    let fixture = sample_site()?;
    let value = json_output(slimload_cmd(&fixture)?.args(["--format", "json", "rebuild"]))?;

    assert_eq!(value["circular_count"], 1);
    assert!(value["total_relationships"].as_u64().unwrap_or(0) >= 4);
    assert!(value["by_evidence"]["code"].as_u64().unwrap_or(0) >= 1);
    Ok(())
}

#[test]
fn test_inspect_shows_evidence() -> Result<()> {
    let fixture = sample_site()?;
    slimload_cmd(&fixture)?
        .args(["inspect", "my-gateway"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Slug: my-gateway"))
        .stdout(predicate::str::contains("code"))
        .stdout(predicate::str::contains("woocommerce"));
    Ok(())
}

#[test]
fn test_inspect_suggests_close_slug() -> Result<()> {
    let fixture = sample_site()?;
    slimload_cmd(&fixture)?
        .args(["inspect", "elementr"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Did you mean: elementor"));
    Ok(())
}

#[test]
fn test_invalidate_clears_store() -> Result<()> {
    let fixture = sample_site()?;
    slimload_cmd(&fixture)?.arg("build").assert().success();
    let map_file = fixture.state_dir.join("slimload_dependency_map.json");
    assert!(map_file.exists());

    slimload_cmd(&fixture)?
        .arg("invalidate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dependency map cache cleared"));
    assert!(!map_file.exists());
    Ok(())
}

#[test]
fn test_missing_config_file_fails() -> Result<()> {
    let fixture = sample_site()?;
    let mut cmd = Command::cargo_bin("slimload")?;
    cmd.env("NO_COLOR", "1")
        .arg("--config")
        .arg(fixture.path().join("absent.toml"))
        .arg("map")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
    Ok(())
}

#[test]
fn test_missing_plugins_dir_fails() -> Result<()> {
    let fixture = sample_site()?;
    std::fs::remove_dir_all(&fixture.plugins_dir)?;
    slimload_cmd(&fixture)?
        .arg("map")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Plugins directory not found"));
    Ok(())
}
