//! Staged verification pipeline: docs lint, engine lint, test suite, smoke test
//!
//! Stages execute strictly sequentially in a fixed order; later stages assume
//! earlier stages' invariants hold (the test suite runs against lint-clean
//! code). The first failing stage halts the pipeline, the remaining stages
//! are recorded as Skipped, and the stage's own error surfaces wrapped only
//! with the stage name.
//!
//! TODO: run independent stages concurrently and aggregate failures instead
//! of failing fast on the first one.

use crate::build::PlatformSpec;
use crate::core::config::SdkConfig;
use crate::core::context::{CancelToken, OrchestratorContext};
use crate::core::error::{ShipError, ShipResult, SmokeTestError, StageError};
use crate::ui::progress::GroupProgress;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

/// Options for one `check` run
#[derive(Debug, Clone)]
pub struct CheckOptions {
  /// Stop the test suite at its first failing test group
  pub fail_fast: bool,

  /// Concurrent test groups within the test stage
  pub parallelism: usize,

  /// Per-test-group timeout
  pub timeout: Option<Duration>,

  /// Race-instrumented test execution
  pub race: bool,
}

impl Default for CheckOptions {
  fn default() -> Self {
    Self {
      fail_fast: true,
      parallelism: 4,
      timeout: None,
      race: false,
    }
  }
}

/// Outcome of one stage, ordered by execution order
#[derive(Debug, Clone, Serialize)]
pub struct StageOutcome {
  pub stage: &'static str,
  pub status: StageStatus,
  pub error: Option<String>,
  pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
  Passed,
  Failed,
  Skipped,
}

/// One named pipeline stage
pub trait Stage {
  fn name(&self) -> &'static str;
  fn run(&self, options: &CheckOptions, cancel: &CancelToken) -> ShipResult<()>;
}

/// Result of a pipeline run: per-stage outcomes plus the first failure
pub struct PipelineReport {
  pub stages: Vec<StageOutcome>,
  failure: Option<StageError>,
}

impl PipelineReport {
  pub fn passed(&self) -> bool {
    self.failure.is_none()
  }

  /// Convert into the caller-facing result: the first failing stage's error,
  /// wrapped with stage identity, or the ordered outcomes on success.
  pub fn into_result(self) -> ShipResult<Vec<StageOutcome>> {
    match self.failure {
      Some(err) => Err(ShipError::Stage(err)),
      None => Ok(self.stages),
    }
  }
}

/// Sequences the fixed verification stages with fail-fast semantics
pub struct PipelineRunner;

impl PipelineRunner {
  /// Run `stages` in order, stopping at the first failure.
  ///
  /// Every stage gets exactly one outcome: Passed, Failed, or - for stages
  /// after the first failure - Skipped.
  pub fn run(stages: &[Box<dyn Stage>], options: &CheckOptions, cancel: &CancelToken) -> PipelineReport {
    let mut outcomes = Vec::with_capacity(stages.len());
    let mut failure: Option<StageError> = None;

    for stage in stages {
      if failure.is_some() {
        outcomes.push(StageOutcome {
          stage: stage.name(),
          status: StageStatus::Skipped,
          error: None,
          duration_ms: 0,
        });
        continue;
      }

      let start = Instant::now();
      let result = cancel.checkpoint().and_then(|_| stage.run(options, cancel));
      let duration_ms = start.elapsed().as_millis() as u64;

      match result {
        Ok(()) => {
          outcomes.push(StageOutcome {
            stage: stage.name(),
            status: StageStatus::Passed,
            error: None,
            duration_ms,
          });
        }
        Err(err) => {
          outcomes.push(StageOutcome {
            stage: stage.name(),
            status: StageStatus::Failed,
            error: Some(err.to_string()),
            duration_ms,
          });
          failure = Some(StageError {
            stage: stage.name(),
            source: Box::new(err),
          });
        }
      }
    }

    PipelineReport {
      stages: outcomes,
      failure,
    }
  }
}

/// The fixed stage list for `shipwright check`
pub fn default_stages(ctx: &OrchestratorContext) -> Vec<Box<dyn Stage>> {
  vec![
    Box::new(CommandStage {
      name: "docs-lint",
      command: vec!["markdownlint".to_string(), "docs".to_string()],
      cwd: ctx.root.clone(),
    }),
    Box::new(CommandStage {
      name: "engine-lint",
      command: vec!["golangci-lint".to_string(), "run".to_string(), "./...".to_string()],
      cwd: ctx.root.clone(),
    }),
    Box::new(TestSuiteStage {
      sdks: ctx.config.sdks.clone(),
      root: ctx.root.clone(),
    }),
    Box::new(SmokeTestStage {
      command: vec![
        ctx.config.build.cli_binary.clone(),
        "publish".to_string(),
        "--dry-run".to_string(),
      ],
      cwd: ctx.root.clone(),
      expected_platform: ctx.host.clone(),
    }),
  ]
}

/// A stage that runs one opaque subprocess and passes on exit code 0
pub struct CommandStage {
  pub name: &'static str,
  pub command: Vec<String>,
  pub cwd: PathBuf,
}

impl Stage for CommandStage {
  fn name(&self) -> &'static str {
    self.name
  }

  fn run(&self, _options: &CheckOptions, _cancel: &CancelToken) -> ShipResult<()> {
    // The timeout option governs test groups only, never lint subprocesses
    run_group_command(&self.command, &self.cwd, None).map_err(ShipError::message)
  }
}

/// Full test suite: one test group per SDK, up to `parallelism` concurrent
pub struct TestSuiteStage {
  pub sdks: Vec<SdkConfig>,
  pub root: PathBuf,
}

impl TestSuiteStage {
  /// One (name, command, cwd) group per SDK, with option-driven flags applied
  fn test_groups(&self, options: &CheckOptions) -> Vec<(String, Vec<String>, PathBuf)> {
    self
      .sdks
      .iter()
      .filter(|sdk| !sdk.test_command.is_empty())
      .map(|sdk| {
        let mut command = sdk.test_command.clone();
        // Race instrumentation is a go toolchain flag
        if options.race && command.first().map(String::as_str) == Some("go") {
          command.push("-race".to_string());
        }
        (sdk.name.clone(), command, self.root.join(&sdk.path))
      })
      .collect()
  }
}

impl Stage for TestSuiteStage {
  fn name(&self) -> &'static str {
    "test-suite"
  }

  fn run(&self, options: &CheckOptions, cancel: &CancelToken) -> ShipResult<()> {
    let pool = rayon::ThreadPoolBuilder::new()
      .num_threads(options.parallelism.max(1))
      .build()
      .map_err(|e| ShipError::message(format!("failed to build test pool: {}", e)))?;

    let groups = self.test_groups(options);

    let progress = GroupProgress::new(groups.len(), "Running test groups");
    let run_group = |(name, command, cwd): &(String, Vec<String>, PathBuf)| -> Result<(), String> {
      if cancel.is_cancelled() {
        return Err(format!("{}: cancelled before dispatch", name));
      }
      let result = run_group_command(command, cwd, options.timeout).map_err(|e| format!("{}: {}", name, e));
      progress.inc();
      result
    };

    let failures: Vec<String> = pool.install(|| {
      if options.fail_fast {
        // Short-circuits remaining groups at the first failure
        match groups.par_iter().try_for_each(|g| run_group(g)) {
          Ok(()) => Vec::new(),
          Err(e) => vec![e],
        }
      } else {
        groups.par_iter().filter_map(|g| run_group(g).err()).collect()
      }
    });

    if failures.is_empty() {
      Ok(())
    } else {
      Err(ShipError::message(format!(
        "{} test group(s) failed: {}",
        failures.len(),
        failures.join("; ")
      )))
    }
  }
}

/// CLI publish dry-run smoke test
///
/// Runs the CLI's publish in dry-run mode and verifies its probe output
/// reports the expected execution platform.
pub struct SmokeTestStage {
  pub command: Vec<String>,
  pub cwd: PathBuf,
  pub expected_platform: PlatformSpec,
}

impl Stage for SmokeTestStage {
  fn name(&self) -> &'static str {
    "cli-publish-smoke"
  }

  fn run(&self, _options: &CheckOptions, _cancel: &CancelToken) -> ShipResult<()> {
    let (program, args) = self
      .command
      .split_first()
      .ok_or_else(|| ShipError::message("smoke test command is empty"))?;

    let output = Command::new(program)
      .args(args)
      .current_dir(&self.cwd)
      .output()
      .map_err(|e| ShipError::message(format!("failed to execute {}: {}", program, e)))?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(ShipError::message(format!(
        "{} exited with {}: {}",
        program,
        output.status,
        stderr.trim()
      )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let expected = self.expected_platform.to_string();
    if !stdout.contains(&expected) {
      return Err(ShipError::SmokeTest(SmokeTestError {
        expected,
        actual: stdout.trim().to_string(),
      }));
    }

    Ok(())
  }
}

/// Run one subprocess, enforcing an optional timeout by polling
fn run_group_command(command: &[String], cwd: &Path, timeout: Option<Duration>) -> Result<(), String> {
  let (program, args) = command.split_first().ok_or_else(|| "empty command".to_string())?;

  let mut child = Command::new(program)
    .args(args)
    .current_dir(cwd)
    .spawn()
    .map_err(|e| format!("failed to execute {}: {}", program, e))?;

  let deadline = timeout.map(|t| Instant::now() + t);

  loop {
    match child.try_wait() {
      Ok(Some(status)) => {
        if status.success() {
          return Ok(());
        }
        return Err(format!("{} exited with code {}", program, status.code().unwrap_or(-1)));
      }
      Ok(None) => {
        if let Some(deadline) = deadline
          && Instant::now() >= deadline
        {
          let _ = child.kill();
          let _ = child.wait();
          return Err(format!("{} timed out", program));
        }
        std::thread::sleep(Duration::from_millis(50));
      }
      Err(e) => return Err(format!("failed to wait for {}: {}", program, e)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Mutex;
  use std::sync::atomic::{AtomicUsize, Ordering};

  /// Stage double with a scripted result
  struct ScriptedStage {
    name: &'static str,
    fail: bool,
    executions: AtomicUsize,
    log: std::sync::Arc<Mutex<Vec<&'static str>>>,
  }

  impl ScriptedStage {
    fn passing(name: &'static str, log: std::sync::Arc<Mutex<Vec<&'static str>>>) -> Box<dyn Stage> {
      Box::new(Self {
        name,
        fail: false,
        executions: AtomicUsize::new(0),
        log,
      })
    }

    fn failing(name: &'static str, log: std::sync::Arc<Mutex<Vec<&'static str>>>) -> Box<dyn Stage> {
      Box::new(Self {
        name,
        fail: true,
        executions: AtomicUsize::new(0),
        log,
      })
    }
  }

  impl Stage for ScriptedStage {
    fn name(&self) -> &'static str {
      self.name
    }

    fn run(&self, _options: &CheckOptions, _cancel: &CancelToken) -> ShipResult<()> {
      self.executions.fetch_add(1, Ordering::SeqCst);
      self.log.lock().unwrap().push(self.name);
      if self.fail {
        Err(ShipError::message(format!("{} blew up", self.name)))
      } else {
        Ok(())
      }
    }
  }

  fn log() -> std::sync::Arc<Mutex<Vec<&'static str>>> {
    std::sync::Arc::new(Mutex::new(Vec::new()))
  }

  #[test]
  fn all_passing_stages_run_in_order() {
    let log = log();
    let stages = vec![
      ScriptedStage::passing("docs-lint", log.clone()),
      ScriptedStage::passing("engine-lint", log.clone()),
      ScriptedStage::passing("test-suite", log.clone()),
      ScriptedStage::passing("cli-publish-smoke", log.clone()),
    ];

    let report = PipelineRunner::run(&stages, &CheckOptions::default(), &CancelToken::new());
    assert!(report.passed());

    let outcomes = report.into_result().unwrap();
    assert!(outcomes.iter().all(|o| o.status == StageStatus::Passed));
    assert_eq!(
      *log.lock().unwrap(),
      vec!["docs-lint", "engine-lint", "test-suite", "cli-publish-smoke"]
    );
  }

  #[test]
  fn failing_second_stage_skips_the_rest() {
    let log = log();
    let stages = vec![
      ScriptedStage::passing("docs-lint", log.clone()),
      ScriptedStage::failing("engine-lint", log.clone()),
      ScriptedStage::passing("test-suite", log.clone()),
      ScriptedStage::passing("cli-publish-smoke", log.clone()),
    ];

    let report = PipelineRunner::run(&stages, &CheckOptions::default(), &CancelToken::new());
    assert!(!report.passed());

    assert_eq!(report.stages[0].status, StageStatus::Passed);
    assert_eq!(report.stages[1].status, StageStatus::Failed);
    assert_eq!(report.stages[2].status, StageStatus::Skipped);
    assert_eq!(report.stages[3].status, StageStatus::Skipped);

    // Stages 3 and 4 never executed
    assert_eq!(*log.lock().unwrap(), vec!["docs-lint", "engine-lint"]);

    let err = report.into_result().unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("engine-lint"));
    assert!(msg.contains("blew up"));
  }

  #[test]
  fn cancelled_pipeline_starts_no_stage() {
    let log = log();
    let stages = vec![
      ScriptedStage::passing("docs-lint", log.clone()),
      ScriptedStage::passing("engine-lint", log.clone()),
    ];

    let token = CancelToken::new();
    token.cancel();
    let report = PipelineRunner::run(&stages, &CheckOptions::default(), &token);

    assert!(!report.passed());
    assert_eq!(report.stages[0].status, StageStatus::Failed);
    assert_eq!(report.stages[1].status, StageStatus::Skipped);
    assert!(log.lock().unwrap().is_empty());
  }

  #[test]
  fn default_stage_order_is_fixed() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = OrchestratorContext::build(tmp.path()).unwrap();
    let stages = default_stages(&ctx);
    let names: Vec<_> = stages.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["docs-lint", "engine-lint", "test-suite", "cli-publish-smoke"]);
  }

  #[test]
  fn test_suite_race_flag_only_touches_go_groups() {
    let stage = TestSuiteStage {
      sdks: vec![
        SdkConfig {
          name: "go".to_string(),
          path: PathBuf::from("sdk/go"),
          test_command: vec!["go".to_string(), "test".to_string(), "./...".to_string()],
        },
        SdkConfig {
          name: "python".to_string(),
          path: PathBuf::from("sdk/python"),
          test_command: vec!["pytest".to_string()],
        },
      ],
      root: PathBuf::from("."),
    };

    let options = CheckOptions {
      race: true,
      ..CheckOptions::default()
    };
    let groups = stage.test_groups(&options);

    let (_, go_cmd, _) = groups.iter().find(|(name, _, _)| name == "go").unwrap();
    assert_eq!(go_cmd.last().map(String::as_str), Some("-race"));
    let (_, py_cmd, _) = groups.iter().find(|(name, _, _)| name == "python").unwrap();
    assert!(!py_cmd.contains(&"-race".to_string()));

    // Without the flag the go command is untouched
    let plain = stage.test_groups(&CheckOptions::default());
    let (_, go_plain, _) = plain.iter().find(|(name, _, _)| name == "go").unwrap();
    assert!(!go_plain.contains(&"-race".to_string()));
  }

  #[test]
  fn test_suite_runs_groups_and_reports_the_failing_one() {
    let tmp = tempfile::tempdir().unwrap();
    let stage = TestSuiteStage {
      sdks: vec![
        SdkConfig {
          name: "ok".to_string(),
          path: PathBuf::from("."),
          test_command: vec!["true".to_string()],
        },
        SdkConfig {
          name: "bad".to_string(),
          path: PathBuf::from("."),
          test_command: vec!["false".to_string()],
        },
      ],
      root: tmp.path().to_path_buf(),
    };

    let options = CheckOptions {
      fail_fast: false,
      ..CheckOptions::default()
    };
    let err = stage.run(&options, &CancelToken::new()).unwrap_err();
    assert!(err.to_string().contains("bad"));
  }

  #[test]
  fn lint_stages_ignore_the_test_timeout() {
    let tmp = tempfile::tempdir().unwrap();
    let stage = CommandStage {
      name: "docs-lint",
      command: vec!["sleep".to_string(), "0.2".to_string()],
      cwd: tmp.path().to_path_buf(),
    };

    let options = CheckOptions {
      timeout: Some(Duration::from_millis(20)),
      ..CheckOptions::default()
    };
    assert!(stage.run(&options, &CancelToken::new()).is_ok());
  }

  #[test]
  fn run_group_command_reports_nonzero_exit() {
    let tmp = tempfile::tempdir().unwrap();
    let err = run_group_command(&["false".to_string()], tmp.path(), None).unwrap_err();
    assert!(err.contains("exited with code"));
  }

  #[test]
  fn run_group_command_enforces_timeout() {
    let tmp = tempfile::tempdir().unwrap();
    let err = run_group_command(
      &["sleep".to_string(), "5".to_string()],
      tmp.path(),
      Some(Duration::from_millis(100)),
    )
    .unwrap_err();
    assert!(err.contains("timed out"));
  }
}
