//! Chart packaging and registry publishing
//!
//! Release tagging is independent of source-version derivation: the package
//! version comes from stripping the configured release-tag prefix off the
//! triggering tag, never from git describe. Publishing runs login → push →
//! logout in strict order, with logout attempted as best-effort cleanup when
//! the push fails.

use crate::core::config::ChartConfig;
use crate::core::context::CancelToken;
use crate::core::error::{PublishError, ShipError, ShipResult};
use crate::version::strip_leading_v;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Registry credential reference; never printed in logs or Debug output
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
  pub fn new(value: impl Into<String>) -> Self {
    Self(value.into())
  }

  pub(crate) fn reveal(&self) -> &str {
    &self.0
  }
}

impl fmt::Debug for Secret {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Secret(***)")
  }
}

/// One packaged, immutable distributable unit
#[derive(Debug, Clone, Serialize)]
pub struct PackageUnit {
  pub version: String,
  pub path: PathBuf,

  /// When the unit was packaged
  pub packaged_at: DateTime<Utc>,
}

/// Capability interface over the chart packaging/publishing tool
///
/// Every operation returns only the underlying cause on failure; the packager
/// maps causes to [`PublishError`] steps.
pub trait ChartRegistry: Send + Sync {
  /// Package the chart source at `version` into `dest_dir`, returning the
  /// package file path.
  fn package(&self, chart_source: &Path, version: &str, dest_dir: &Path) -> Result<PathBuf, String>;

  /// Authenticate against `registry` as `username`
  fn login(&self, registry: &str, username: &str, credentials: &Secret) -> Result<(), String>;

  /// Push a package, keyed by (chart name, version); conflicts are the
  /// registry's own behavior - no existence pre-check happens here.
  fn push(&self, package: &Path, registry: &str) -> Result<(), String>;

  /// End the registry session
  fn logout(&self, registry: &str) -> Result<(), String>;
}

/// Production registry shelling out to system helm
pub struct HelmRegistry;

impl HelmRegistry {
  fn helm_cmd(&self) -> Command {
    let mut cmd = Command::new("helm");
    cmd.env_clear();
    for var in ["PATH", "HOME", "HELM_REGISTRY_CONFIG", "XDG_CONFIG_HOME", "XDG_CACHE_HOME"] {
      if let Ok(value) = std::env::var(var) {
        cmd.env(var, value);
      }
    }
    cmd
  }

  fn run(&self, cmd: &mut Command, what: &str) -> Result<Vec<u8>, String> {
    let output = cmd.output().map_err(|e| format!("failed to execute {}: {}", what, e))?;
    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(format!("{} exited with {}: {}", what, output.status, stderr.trim()));
    }
    Ok(output.stdout)
  }
}

impl ChartRegistry for HelmRegistry {
  fn package(&self, chart_source: &Path, version: &str, dest_dir: &Path) -> Result<PathBuf, String> {
    std::fs::create_dir_all(dest_dir).map_err(|e| format!("failed to create package dir: {}", e))?;

    let mut cmd = self.helm_cmd();
    cmd
      .arg("package")
      .arg(chart_source)
      .arg("--version")
      .arg(version)
      .arg("--app-version")
      .arg(version)
      .arg("--destination")
      .arg(dest_dir);
    let stdout = self.run(&mut cmd, "helm package")?;

    // helm prints "Successfully packaged chart and saved it to: <path>"
    let text = String::from_utf8_lossy(&stdout);
    let path = text
      .rsplit_once(": ")
      .map(|(_, p)| PathBuf::from(p.trim()))
      .filter(|p| p.is_file());

    match path {
      Some(p) => Ok(p),
      None => Err("helm package reported no output file".to_string()),
    }
  }

  fn login(&self, registry: &str, username: &str, credentials: &Secret) -> Result<(), String> {
    use std::io::Write;
    use std::process::Stdio;

    // helm prompts interactively without an explicit --username
    let mut cmd = self.helm_cmd();
    cmd
      .arg("registry")
      .arg("login")
      .arg(registry)
      .arg("--username")
      .arg(username)
      .arg("--password-stdin")
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| format!("failed to spawn helm login: {}", e))?;
    if let Some(stdin) = child.stdin.as_mut() {
      stdin
        .write_all(credentials.reveal().as_bytes())
        .map_err(|e| format!("failed to write credentials: {}", e))?;
    }
    let output = child.wait_with_output().map_err(|e| format!("helm login failed: {}", e))?;
    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(format!("helm registry login exited with {}: {}", output.status, stderr.trim()));
    }
    Ok(())
  }

  fn push(&self, package: &Path, registry: &str) -> Result<(), String> {
    let mut cmd = self.helm_cmd();
    cmd.arg("push").arg(package).arg(format!("oci://{}", registry));
    self.run(&mut cmd, "helm push").map(|_| ())
  }

  fn logout(&self, registry: &str) -> Result<(), String> {
    let mut cmd = self.helm_cmd();
    cmd.arg("registry").arg("logout").arg(registry);
    self.run(&mut cmd, "helm registry logout").map(|_| ())
  }
}

/// Packages the chart and publishes it to the configured registry
pub struct ReleasePackager<'a> {
  registry: &'a dyn ChartRegistry,
  config: ChartConfig,
  out_dir: PathBuf,
}

impl<'a> ReleasePackager<'a> {
  pub fn new(registry: &'a dyn ChartRegistry, config: ChartConfig, out_dir: impl Into<PathBuf>) -> Self {
    Self {
      registry,
      config,
      out_dir: out_dir.into(),
    }
  }

  /// Derive the package version from a release tag.
  ///
  /// Strips the configured tag prefix, then one leading "v", and validates
  /// the remainder as semver. `"helm/chart/vv1.2.3"` with prefix
  /// `"helm/chart/v"` yields `"1.2.3"`.
  pub fn version_from_tag(&self, tag: &str) -> ShipResult<String> {
    let stripped = tag.strip_prefix(&self.config.tag_prefix).ok_or_else(|| {
      ShipError::Publish(PublishError::BadTag {
        tag: tag.to_string(),
        prefix: self.config.tag_prefix.clone(),
      })
    })?;

    let version = strip_leading_v(stripped);
    semver::Version::parse(version)
      .map_err(|e| ShipError::message(format!("tag '{}' carries invalid version '{}': {}", tag, version, e)))?;

    Ok(version.to_string())
  }

  /// Package the chart source into a distributable unit
  pub fn package(&self, chart_source: &Path, version: &str) -> ShipResult<PackageUnit> {
    let path = self
      .registry
      .package(chart_source, version, &self.out_dir)
      .map_err(|cause| ShipError::Publish(PublishError::Package { cause }))?;

    Ok(PackageUnit {
      version: version.to_string(),
      path,
      packaged_at: Utc::now(),
    })
  }

  /// Publish a packaged unit.
  ///
  /// Dry run never touches the registry. Live publishing requires
  /// credentials and runs login → push → logout in strict order. When the
  /// push fails after a successful login, logout is still attempted once;
  /// its own failure is logged but the push error is what surfaces.
  pub fn publish(&self, unit: &PackageUnit, credentials: Option<&Secret>, dry_run: bool, cancel: &CancelToken) -> ShipResult<()> {
    if dry_run {
      println!("DRY RUN: would push {} v{} to {}", self.config.name, unit.version, self.config.registry);
      return Ok(());
    }

    let credentials = credentials.ok_or(ShipError::Publish(PublishError::MissingCredentials))?;

    cancel.checkpoint()?;

    self
      .registry
      .login(&self.config.registry, &self.config.username, credentials)
      .map_err(|cause| ShipError::Publish(PublishError::Login { cause }))?;

    if let Err(cause) = self.registry.push(&unit.path, &self.config.registry) {
      // Best-effort cleanup: the session was opened, close it before surfacing
      if let Err(logout_cause) = self.registry.logout(&self.config.registry) {
        eprintln!("⚠️  registry logout failed after push error: {}", logout_cause);
      }
      return Err(ShipError::Publish(PublishError::Push { cause }));
    }

    self
      .registry
      .logout(&self.config.registry)
      .map_err(|cause| ShipError::Publish(PublishError::Logout { cause }))?;

    Ok(())
  }
}
