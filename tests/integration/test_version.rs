//! Integration tests for `shipwright version`

use crate::helpers::{TestWorkspace, run_shipwright, run_shipwright_ok};
use anyhow::Result;

#[test]
fn exact_tag_yields_that_version() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.tag("v1.2.3")?;

  let stdout = run_shipwright_ok(&ws.path, &["version"])?;
  assert!(stdout.contains("1.2.3"), "expected tag version in: {}", stdout);
  assert!(!stdout.contains("dirty"));

  Ok(())
}

#[test]
fn commits_past_tag_add_distance_and_hash() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.tag("v0.5.0")?;
  ws.write_file("src/lib.rs", "pub fn f() {}")?;
  ws.commit("Add lib")?;

  let stdout = run_shipwright_ok(&ws.path, &["version", "--json"])?;
  let json: serde_json::Value = serde_json::from_str(&stdout)?;
  let version = json["version"].as_str().unwrap();

  assert!(version.starts_with("0.5.0-1-g"), "unexpected version: {}", version);
  assert!(!json["commit"].as_str().unwrap().is_empty());

  Ok(())
}

#[test]
fn dirty_worktree_appends_suffix() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.tag("v0.1.0")?;
  ws.write_file("uncommitted.txt", "changes")?;

  let stdout = run_shipwright_ok(&ws.path, &["version", "--json"])?;
  let json: serde_json::Value = serde_json::from_str(&stdout)?;

  assert!(json["dirty"].as_bool().unwrap());
  assert!(json["version"].as_str().unwrap().ends_with("-dirty"));

  Ok(())
}

#[test]
fn explicit_set_wins_over_tags() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.tag("v9.9.9")?;

  let stdout = run_shipwright_ok(&ws.path, &["version", "--set", "v2.0.0", "--json"])?;
  let json: serde_json::Value = serde_json::from_str(&stdout)?;

  assert_eq!(json["version"].as_str().unwrap(), "2.0.0");
  // Commit metadata is still derived from the repository
  assert!(!json["commit"].as_str().unwrap().is_empty());

  Ok(())
}

#[test]
fn untagged_repo_fails_without_explicit_version() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_shipwright(&ws.path, &["version"])?;
  assert!(!output.status.success());
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("no tag or commit history"), "stderr: {}", stderr);

  Ok(())
}

#[test]
fn config_explicit_version_is_used() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("shipwright.toml", "[version]\nexplicit = \"v3.1.4\"\n")?;

  let stdout = run_shipwright_ok(&ws.path, &["version"])?;
  assert!(stdout.contains("3.1.4"));

  Ok(())
}
