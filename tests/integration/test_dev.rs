//! Integration tests for `shipwright dev` (dry-run plan)

use crate::helpers::{TestWorkspace, run_shipwright_ok};
use anyhow::Result;

#[test]
fn dev_defaults_to_a_plan() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let stdout = run_shipwright_ok(&ws.path, &["dev"])?;
  assert!(stdout.contains("DRY RUN"));
  assert!(stdout.contains("tcp://localhost:8080"));
  assert!(stdout.contains("--apply"));

  Ok(())
}

#[test]
fn dev_plan_mounts_the_target_directory() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("playground/keep.txt", "x")?;

  let target = ws.path.join("playground");
  let stdout = run_shipwright_ok(&ws.path, &["dev", "--target", target.to_str().unwrap()])?;
  assert!(stdout.contains("playground"));
  assert!(stdout.contains("/mnt/target"));

  Ok(())
}
