//! Integration tests for `shipwright publish` tag handling
//!
//! Packaging and registry interaction are covered by unit tests with a
//! recording registry; here we cover the tag-derivation surface, which fails
//! before any external tool is invoked.

use crate::helpers::{TestWorkspace, run_shipwright};
use anyhow::Result;

#[test]
fn live_publish_requires_a_tag() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_shipwright(&ws.path, &["publish"])?;
  assert!(!output.status.success());
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("--tag"), "stderr: {}", stderr);

  Ok(())
}

#[test]
fn foreign_tag_is_rejected() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_shipwright(&ws.path, &["publish", "--dry-run", "--tag", "v1.2.3"])?;
  assert!(!output.status.success());
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("helm/chart/v"), "stderr: {}", stderr);

  Ok(())
}

#[test]
fn non_semver_tag_is_rejected() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_shipwright(&ws.path, &["publish", "--dry-run", "--tag", "helm/chart/vnot-semver"])?;
  assert!(!output.status.success());
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("invalid version"), "stderr: {}", stderr);

  Ok(())
}
