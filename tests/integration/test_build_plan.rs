//! Integration tests for `shipwright build --dry-run`

use crate::helpers::{TestWorkspace, run_shipwright, run_shipwright_ok};
use anyhow::Result;

#[test]
fn dry_run_shows_default_variant() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let stdout = run_shipwright_ok(&ws.path, &["build", "--dry-run"])?;
  assert!(stdout.contains("DRY RUN"));
  assert!(stdout.contains("race: false"));
  assert!(stdout.contains("alpine:3.20"));

  Ok(())
}

#[test]
fn dry_run_reflects_flags_and_base_image() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let stdout = run_shipwright_ok(
    &ws.path,
    &[
      "build",
      "--dry-run",
      "--race",
      "--trace",
      "--base-image",
      "ubuntu",
      "--platform",
      "linux/arm64",
    ],
  )?;

  assert!(stdout.contains("race: true"));
  assert!(stdout.contains("trace: true"));
  assert!(stdout.contains("ubuntu"));
  assert!(stdout.contains("linux/arm64"));

  Ok(())
}

#[test]
fn invalid_platform_is_rejected() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_shipwright(&ws.path, &["build", "--dry-run", "--platform", "linux"])?;
  assert!(!output.status.success());
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("invalid platform"), "stderr: {}", stderr);

  Ok(())
}

#[test]
fn dry_run_counts_configured_overlays() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file(
    "shipwright.toml",
    r#"
[[modules]]
path = "sdk/go"
generated = "generated/go"

[[modules]]
path = "sdk/python"
generated = "generated/python"
"#,
  )?;

  let stdout = run_shipwright_ok(&ws.path, &["build", "--dry-run", "--codegen"])?;
  assert!(stdout.contains("2 module(s)"), "stdout: {}", stdout);

  Ok(())
}
