use crate::core::error::{ConfigError, ShipError, ShipResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for shipwright
/// Searched in order: shipwright.toml, .shipwright.toml, .config/shipwright.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipConfig {
  #[serde(default)]
  pub version: VersionConfig,
  #[serde(default)]
  pub build: BuildConfig,
  #[serde(default)]
  pub chart: ChartConfig,
  #[serde(default)]
  pub modules: Vec<ModuleConfig>,
  #[serde(default)]
  pub sdks: Vec<SdkConfig>,
}

/// Version derivation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionConfig {
  /// Explicit version override; takes precedence over git describe
  #[serde(default)]
  pub explicit: Option<String>,

  /// Tag glob passed to git describe (default: "v*")
  #[serde(default = "default_tag_match")]
  pub tag_match: String,
}

fn default_tag_match() -> String {
  "v*".to_string()
}

impl Default for VersionConfig {
  fn default() -> Self {
    Self {
      explicit: None,
      tag_match: default_tag_match(),
    }
  }
}

/// Build settings shared by all variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
  /// Default base image for engine builds
  #[serde(default = "default_base_image")]
  pub base_image: String,

  /// Engine binary name inside the image
  #[serde(default = "default_engine_binary")]
  pub engine_binary: String,

  /// CLI binary base name (".exe" appended for windows targets)
  #[serde(default = "default_cli_binary")]
  pub cli_binary: String,

  /// Environment variable holding forwarded docker credentials
  #[serde(default = "default_credential_env")]
  pub credential_env: String,
}

fn default_base_image() -> String {
  "alpine:3.20".to_string()
}

fn default_engine_binary() -> String {
  "engine".to_string()
}

fn default_cli_binary() -> String {
  "shipctl".to_string()
}

fn default_credential_env() -> String {
  "SHIPWRIGHT_REGISTRY_TOKEN".to_string()
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      base_image: default_base_image(),
      engine_binary: default_engine_binary(),
      cli_binary: default_cli_binary(),
      credential_env: default_credential_env(),
    }
  }
}

/// Chart packaging and publishing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
  /// Chart name (package files are "<name>-<version>.tgz")
  #[serde(default = "default_chart_name")]
  pub name: String,

  /// Path to the chart source within the workspace
  #[serde(default = "default_chart_path")]
  pub path: PathBuf,

  /// Release-tag prefix stripped to derive the package version
  /// e.g. "helm/chart/v" so tag "helm/chart/v1.2.3" releases version 1.2.3
  #[serde(default = "default_tag_prefix")]
  pub tag_prefix: String,

  /// OCI registry the chart is pushed to
  #[serde(default = "default_registry")]
  pub registry: String,

  /// Username for registry login (the token comes from the environment)
  #[serde(default = "default_registry_username")]
  pub username: String,
}

fn default_chart_name() -> String {
  "engine".to_string()
}

fn default_chart_path() -> PathBuf {
  PathBuf::from("helm/engine")
}

fn default_tag_prefix() -> String {
  "helm/chart/v".to_string()
}

fn default_registry() -> String {
  "ghcr.io/shipwright-dev".to_string()
}

fn default_registry_username() -> String {
  "shipwright".to_string()
}

impl Default for ChartConfig {
  fn default() -> Self {
    Self {
      name: default_chart_name(),
      path: default_chart_path(),
      tag_prefix: default_tag_prefix(),
      registry: default_registry(),
      username: default_registry_username(),
    }
  }
}

/// One sub-module whose generated code overlays the raw tree
///
/// The list is a fixed enumeration: adding a new sub-module means adding an
/// entry here. TODO: discover modules by scanning for module manifests instead
/// of maintaining this list by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
  /// Path of the sub-module within the project tree
  pub path: PathBuf,

  /// Directory holding the generated content for that path
  pub generated: PathBuf,
}

/// One SDK with its lint/test entry points (invoked as opaque subprocesses)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdkConfig {
  /// SDK name ("go", "python", "typescript", ...)
  pub name: String,

  /// Path of the SDK within the project tree
  pub path: PathBuf,

  /// Test command, run from the SDK path
  #[serde(default)]
  pub test_command: Vec<String>,
}

impl ShipConfig {
  /// Load configuration from the workspace root
  ///
  /// Falls back to defaults when no file exists; commands that require an
  /// explicit config should use [`ShipConfig::load_required`].
  pub fn load(workspace_root: &Path) -> ShipResult<Self> {
    match Self::find_config_file(workspace_root) {
      Some(path) => Self::parse_file(&path),
      None => Ok(Self::default_config()),
    }
  }

  /// Load configuration, failing when no shipwright.toml exists
  pub fn load_required(workspace_root: &Path) -> ShipResult<Self> {
    let path = Self::find_config_file(workspace_root).ok_or_else(|| {
      ShipError::Config(ConfigError::NotFound {
        root: workspace_root.to_path_buf(),
      })
    })?;
    Self::parse_file(&path)
  }

  fn parse_file(path: &Path) -> ShipResult<Self> {
    let content =
      fs::read_to_string(path).map_err(|e| ShipError::Config(ConfigError::Invalid { cause: e.to_string() }))?;
    let config: ShipConfig =
      toml_edit::de::from_str(&content).map_err(|e| ShipError::Config(ConfigError::Invalid { cause: e.to_string() }))?;
    config.validate()?;
    Ok(config)
  }

  fn find_config_file(root: &Path) -> Option<PathBuf> {
    let candidates = ["shipwright.toml", ".shipwright.toml", ".config/shipwright.toml"];
    candidates.iter().map(|c| root.join(c)).find(|p| p.is_file())
  }

  fn default_config() -> Self {
    Self {
      version: VersionConfig::default(),
      build: BuildConfig::default(),
      chart: ChartConfig::default(),
      modules: Vec::new(),
      sdks: Vec::new(),
    }
  }

  /// Validate configuration invariants
  pub fn validate(&self) -> ShipResult<()> {
    if let Some(ref explicit) = self.version.explicit
      && explicit.is_empty()
    {
      return Err(ShipError::Config(ConfigError::Invalid {
        cause: "version.explicit must be non-empty when set".to_string(),
      }));
    }

    for module in &self.modules {
      if module.path.as_os_str().is_empty() {
        return Err(ShipError::Config(ConfigError::Invalid {
          cause: "module path must be non-empty".to_string(),
        }));
      }
      if module.path.is_absolute() {
        return Err(ShipError::Config(ConfigError::Invalid {
          cause: format!("module path '{}' must be workspace-relative", module.path.display()),
        }));
      }
    }

    if self.chart.tag_prefix.is_empty() {
      return Err(ShipError::Config(ConfigError::Invalid {
        cause: "chart.tag_prefix must be non-empty".to_string(),
      }));
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_when_no_file() {
    let tmp = tempfile::tempdir().unwrap();
    let config = ShipConfig::load(tmp.path()).unwrap();
    assert_eq!(config.chart.tag_prefix, "helm/chart/v");
    assert_eq!(config.chart.username, "shipwright");
    assert_eq!(config.build.cli_binary, "shipctl");
    assert!(config.modules.is_empty());
  }

  #[test]
  fn load_required_fails_without_file() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(ShipConfig::load_required(tmp.path()).is_err());
  }

  #[test]
  fn parses_modules_and_sdks() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(
      tmp.path().join("shipwright.toml"),
      r#"
[[modules]]
path = "sdk/go"
generated = "generated/go"

[[sdks]]
name = "go"
path = "sdk/go"
test_command = ["go", "test", "./..."]

[chart]
name = "mychart"
username = "robot"
"#,
    )
    .unwrap();

    let config = ShipConfig::load(tmp.path()).unwrap();
    assert_eq!(config.modules.len(), 1);
    assert_eq!(config.modules[0].path, PathBuf::from("sdk/go"));
    assert_eq!(config.sdks[0].test_command[0], "go");
    assert_eq!(config.chart.name, "mychart");
    assert_eq!(config.chart.username, "robot");
  }

  #[test]
  fn rejects_absolute_module_path() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(
      tmp.path().join("shipwright.toml"),
      r#"
[[modules]]
path = "/abs/path"
generated = "generated/go"
"#,
    )
    .unwrap();

    assert!(ShipConfig::load(tmp.path()).is_err());
  }
}
