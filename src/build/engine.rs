//! Build-engine capability: the black box that turns a recipe into a blob
//!
//! The orchestrator never builds container images itself. It hands a
//! [`BuildRecipe`] to a [`BuildEngine`] and gets back the path of the built
//! binary. Production uses [`DockerEngine`] (system docker via subprocess,
//! same isolation style as SystemGit); tests inject recording doubles.

use crate::build::PlatformSpec;
use crate::core::context::CancelToken;
use serde::Serialize;
use std::path::PathBuf;
use std::process::Command;

/// Everything the external build engine needs for one sub-build
#[derive(Debug, Clone, Serialize)]
pub struct BuildRecipe {
  /// Sub-build name ("engine" or "cli")
  pub name: String,

  /// Build base image
  pub base_image: String,

  /// Target platform for the produced binary
  pub platform: PlatformSpec,

  /// Composed source tree the build consumes
  pub source: PathBuf,

  /// Compiler/tool flags (race, trace, output name)
  pub build_args: Vec<String>,

  /// Name of the binary the build must produce
  pub output: String,
}

/// Capability interface for the external build engine
pub trait BuildEngine: Send + Sync {
  /// Build the recipe, returning the path of the produced binary.
  ///
  /// Errors carry only the underlying cause; the caller attaches the failing
  /// stage name.
  fn build(&self, recipe: &BuildRecipe, cancel: &CancelToken) -> Result<PathBuf, String>;
}

/// Production engine shelling out to system docker
pub struct DockerEngine {
  /// Directory build outputs are extracted into
  scratch_dir: PathBuf,
}

impl DockerEngine {
  pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
    Self {
      scratch_dir: scratch_dir.into(),
    }
  }

  /// Docker command with an isolated environment (same policy as git_cmd)
  fn docker_cmd(&self) -> Command {
    let mut cmd = Command::new("docker");
    cmd.env_clear();
    for var in ["PATH", "HOME", "DOCKER_HOST", "DOCKER_CONFIG"] {
      if let Ok(value) = std::env::var(var) {
        cmd.env(var, value);
      }
    }
    cmd
  }
}

impl BuildEngine for DockerEngine {
  fn build(&self, recipe: &BuildRecipe, cancel: &CancelToken) -> Result<PathBuf, String> {
    if cancel.is_cancelled() {
      return Err("build cancelled before dispatch".to_string());
    }

    let dest = self.scratch_dir.join(&recipe.name);
    std::fs::create_dir_all(&dest).map_err(|e| format!("failed to create scratch dir: {}", e))?;

    let mut cmd = self.docker_cmd();
    cmd
      .arg("buildx")
      .arg("build")
      .arg("--platform")
      .arg(recipe.platform.to_string())
      .arg("--build-arg")
      .arg(format!("BASE_IMAGE={}", recipe.base_image))
      .arg("--build-arg")
      .arg(format!("BUILD_ARGS={}", recipe.build_args.join(" ")))
      .arg("--output")
      .arg(format!("type=local,dest={}", dest.display()))
      .arg(&recipe.source);

    let output = cmd.output().map_err(|e| format!("failed to execute docker buildx: {}", e))?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(format!("docker buildx exited with {}: {}", output.status, stderr.trim()));
    }

    let binary = dest.join(&recipe.output);
    if !binary.is_file() {
      return Err(format!("build produced no '{}' binary", recipe.output));
    }

    Ok(binary)
  }
}

#[cfg(test)]
use std::path::Path;

/// Recording double: captures every recipe, produces placeholder blobs
#[cfg(test)]
pub struct RecordingEngine {
  blob_dir: PathBuf,
  fail_name: Option<(String, String)>,
  recorded: std::sync::Mutex<Vec<BuildRecipe>>,
}

#[cfg(test)]
impl RecordingEngine {
  /// Engine where every sub-build succeeds
  pub fn succeeding(blob_dir: &Path) -> Self {
    Self {
      blob_dir: blob_dir.to_path_buf(),
      fail_name: None,
      recorded: std::sync::Mutex::new(Vec::new()),
    }
  }

  /// Engine failing recipes named `name` with `cause`, succeeding otherwise
  pub fn failing_for(blob_dir: &Path, name: &str, cause: &str) -> Self {
    Self {
      blob_dir: blob_dir.to_path_buf(),
      fail_name: Some((name.to_string(), cause.to_string())),
      recorded: std::sync::Mutex::new(Vec::new()),
    }
  }

  /// Recipes captured so far, in dispatch order per sub-build
  pub fn recipes(&self) -> Vec<BuildRecipe> {
    self.recorded.lock().unwrap().clone()
  }
}

#[cfg(test)]
impl BuildEngine for RecordingEngine {
  fn build(&self, recipe: &BuildRecipe, cancel: &CancelToken) -> Result<PathBuf, String> {
    if cancel.is_cancelled() {
      return Err("build cancelled before dispatch".to_string());
    }

    self.recorded.lock().unwrap().push(recipe.clone());

    if let Some((name, cause)) = &self.fail_name
      && name == &recipe.name
    {
      return Err(cause.clone());
    }

    let blob = self.blob_dir.join(format!("{}-blob", recipe.name));
    std::fs::write(&blob, format!("blob for {}", recipe.name)).map_err(|e| e.to_string())?;
    Ok(blob)
  }
}
