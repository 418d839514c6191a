//! Variant-specific artifact builds: engine container image and CLI binary
//!
//! A `BuildVariant` fully determines the output for a given composed source
//! tree. The actual container build is delegated to a [`engine::BuildEngine`]
//! capability so tests can substitute recording doubles and production can
//! shell out to docker.

pub mod archive;
pub mod engine;

use crate::core::config::BuildConfig;
use crate::core::context::CancelToken;
use crate::core::error::{BuildError, ShipResult};
use engine::{BuildEngine, BuildRecipe};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};

/// Operating system the engine artifact always targets: engine artifacts are
/// server-side regardless of the requested platform.
pub const SERVER_OS: &str = "linux";

/// Target platform as OS + architecture
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformSpec {
  pub os: String,
  pub arch: String,
}

impl PlatformSpec {
  pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
    Self {
      os: os.into(),
      arch: arch.into(),
    }
  }

  /// Parse an "os/arch" platform string
  pub fn parse(spec: &str) -> ShipResult<Self> {
    let Some((os, arch)) = spec.split_once('/') else {
      return Err(crate::core::error::ShipError::message(format!(
        "invalid platform '{}': expected os/arch (e.g. linux/amd64)",
        spec
      )));
    };
    if os.is_empty() || arch.is_empty() {
      return Err(crate::core::error::ShipError::message(format!(
        "invalid platform '{}': os and arch must be non-empty",
        spec
      )));
    }
    Ok(Self::new(os, arch))
  }

  /// Platform the orchestrator itself executes on
  pub fn host() -> Self {
    let arch = match std::env::consts::ARCH {
      "x86_64" => "amd64",
      "aarch64" => "arm64",
      other => other,
    };
    Self::new(std::env::consts::OS, arch)
  }

  /// Same architecture with the OS forced to the server execution OS
  pub fn for_server(&self) -> Self {
    Self::new(SERVER_OS, self.arch.clone())
  }

  pub fn is_windows(&self) -> bool {
    self.os == "windows"
  }
}

impl fmt::Display for PlatformSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.os, self.arch)
  }
}

/// One combination of platform and build feature flags
///
/// Immutable value: the `with_*` constructors return modified copies. Two
/// variants with identical fields produce identical recipes (and therefore
/// identical recipe digests).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct BuildVariant {
  /// Requested platform; host platform when unset
  pub platform: Option<PlatformSpec>,

  /// Race-instrumented compilation of the engine binary
  pub race: bool,

  /// Build-time tracing instrumentation
  pub trace: bool,

  /// Alternate build base image (e.g. GPU-capable images)
  pub base_image_override: Option<String>,
}

impl BuildVariant {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_platform(mut self, platform: PlatformSpec) -> Self {
    self.platform = Some(platform);
    self
  }

  pub fn with_race(mut self, race: bool) -> Self {
    self.race = race;
    self
  }

  pub fn with_trace(mut self, trace: bool) -> Self {
    self.trace = trace;
    self
  }

  pub fn with_base_image(mut self, image: impl Into<String>) -> Self {
    self.base_image_override = Some(image.into());
    self
  }
}

/// What a build produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
  EngineImage,
  CliBinary,
}

/// One built artifact with its declared platform
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
  pub kind: ArtifactKind,
  pub platform: PlatformSpec,
  pub path: PathBuf,
}

/// Result of one variant build: both artifacts or nothing
#[derive(Debug, Clone, Serialize)]
pub struct BuildOutput {
  pub engine: Artifact,
  pub cli: Artifact,

  /// sha256 over the engine recipe; identical variants yield identical digests
  pub recipe_digest: String,
}

/// Builds the engine and CLI artifacts for one variant
pub struct ArtifactBuilder<'a> {
  engine: &'a dyn BuildEngine,
  config: BuildConfig,
  host: PlatformSpec,
  out_dir: PathBuf,
}

impl<'a> ArtifactBuilder<'a> {
  pub fn new(engine: &'a dyn BuildEngine, config: BuildConfig, host: PlatformSpec, out_dir: impl Into<PathBuf>) -> Self {
    Self {
      engine,
      config,
      host,
      out_dir: out_dir.into(),
    }
  }

  /// Build the engine and CLI artifacts for `variant` from `source`.
  ///
  /// Engine and CLI sub-builds are dispatched together and may run
  /// concurrently; the call returns only when both complete. Either failure
  /// discards the other's result - no partial artifacts are returned.
  ///
  /// Idempotent for identical `(variant, source)` pairs, modulo the delegated
  /// engine's own nondeterminism.
  pub fn build(&self, variant: &BuildVariant, source: &Path, cancel: &CancelToken) -> ShipResult<BuildOutput> {
    cancel.checkpoint()?;

    let requested = variant.platform.clone().unwrap_or_else(|| self.host.clone());
    let engine_platform = requested.for_server();

    let engine_recipe = self.engine_recipe(variant, source, &engine_platform);
    let cli_recipe = self.cli_recipe(variant, source, &requested);
    let digest = recipe_digest(&engine_recipe);

    let (engine_result, cli_result) = rayon::join(
      || self.engine.build(&engine_recipe, cancel),
      || self.engine.build(&cli_recipe, cancel),
    );

    let engine_blob = engine_result.map_err(|cause| BuildError {
      stage: "engine".to_string(),
      cause,
    })?;
    let cli_blob = cli_result.map_err(|cause| BuildError {
      stage: "cli".to_string(),
      cause,
    })?;

    std::fs::create_dir_all(&self.out_dir)?;

    let archive_path = self
      .out_dir
      .join(format!("engine-{}-{}.tar.gz", engine_platform.os, engine_platform.arch));
    archive::write_engine_archive(&engine_blob, &archive_path).map_err(|e| BuildError {
      stage: "archive".to_string(),
      cause: e.to_string(),
    })?;

    let cli_path = self.out_dir.join(cli_binary_name(&self.config.cli_binary, &requested));
    std::fs::copy(&cli_blob, &cli_path)?;

    Ok(BuildOutput {
      engine: Artifact {
        kind: ArtifactKind::EngineImage,
        platform: engine_platform,
        path: archive_path,
      },
      cli: Artifact {
        kind: ArtifactKind::CliBinary,
        platform: requested,
        path: cli_path,
      },
      recipe_digest: digest,
    })
  }

  fn engine_recipe(&self, variant: &BuildVariant, source: &Path, platform: &PlatformSpec) -> BuildRecipe {
    let base_image = variant
      .base_image_override
      .clone()
      .unwrap_or_else(|| self.config.base_image.clone());

    let mut build_args = vec!["-o".to_string(), self.config.engine_binary.clone()];
    if variant.race {
      build_args.push("-race".to_string());
    }
    if variant.trace {
      build_args.push("-tags=trace".to_string());
    }

    BuildRecipe {
      name: "engine".to_string(),
      base_image,
      platform: platform.clone(),
      source: source.to_path_buf(),
      build_args,
      output: self.config.engine_binary.clone(),
    }
  }

  fn cli_recipe(&self, variant: &BuildVariant, source: &Path, platform: &PlatformSpec) -> BuildRecipe {
    let base_image = variant
      .base_image_override
      .clone()
      .unwrap_or_else(|| self.config.base_image.clone());

    let mut build_args = vec!["-o".to_string(), self.config.cli_binary.clone()];
    if variant.trace {
      build_args.push("-tags=trace".to_string());
    }

    BuildRecipe {
      name: "cli".to_string(),
      base_image,
      platform: platform.clone(),
      source: source.to_path_buf(),
      build_args,
      output: cli_binary_name(&self.config.cli_binary, platform),
    }
  }
}

/// CLI executable name per target OS convention
pub fn cli_binary_name(base: &str, platform: &PlatformSpec) -> String {
  if platform.is_windows() {
    format!("{}.exe", base)
  } else {
    base.to_string()
  }
}

/// sha256 digest over a recipe's canonical JSON encoding
pub fn recipe_digest(recipe: &BuildRecipe) -> String {
  let encoded = serde_json::to_vec(recipe).unwrap_or_default();
  let mut hasher = Sha256::new();
  hasher.update(&encoded);
  let digest = hasher.finalize();
  digest.iter().map(|b| format!("{:02x}", b)).collect()
}
