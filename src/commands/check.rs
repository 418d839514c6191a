//! `shipwright check` - Run the staged verification pipeline
//!
//! Fixed stage order: docs lint, engine lint, full test suite, CLI publish
//! dry-run smoke test. The first failing stage halts the run and the
//! remaining stages are reported as skipped.
//!
//! Supports:
//! - `--no-fail-fast` to let the test suite run all groups before reporting
//! - `--parallelism <n>` concurrent test groups within the test stage
//! - `--timeout <secs>` per test group
//! - `--race` for race-instrumented test execution

use crate::core::context::OrchestratorContext;
use crate::core::error::{ResultExt, ShipResult};
use crate::pipeline::{CheckOptions, PipelineRunner, StageStatus, default_stages};
use std::time::Duration;

/// Run the check command
pub fn run_check(
  ctx: &OrchestratorContext,
  fail_fast: bool,
  parallelism: usize,
  timeout_secs: Option<u64>,
  race: bool,
  json: bool,
) -> ShipResult<()> {
  let options = CheckOptions {
    fail_fast,
    parallelism,
    timeout: timeout_secs.map(Duration::from_secs),
    race,
  };

  let stages = default_stages(ctx);

  if !json {
    println!("🔍 Check Pipeline");
    println!("════════════════════════════════════════");
    for stage in &stages {
      println!("  {}", stage.name());
    }
    println!();
  }

  let report = PipelineRunner::run(&stages, &options, &ctx.cancel);

  if json {
    let rendered = serde_json::to_string_pretty(&report.stages).context("Failed to serialize check report")?;
    println!("{}", rendered);
  } else {
    for outcome in &report.stages {
      match outcome.status {
        StageStatus::Passed => println!("✅ {} ({} ms)", outcome.stage, outcome.duration_ms),
        StageStatus::Failed => println!(
          "❌ {} ({} ms): {}",
          outcome.stage,
          outcome.duration_ms,
          outcome.error.as_deref().unwrap_or("unknown error")
        ),
        StageStatus::Skipped => println!("⏭  {} (skipped)", outcome.stage),
      }
    }
  }

  report.into_result().map(|_| ())
}
