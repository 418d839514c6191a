//! Error types for shipwright operations
//!
//! Every component surfaces a dedicated error kind so callers can react to the
//! failing concern (version derivation, tree composition, artifact builds,
//! chart publishing, pipeline stages) without string-matching messages.

use std::fmt;
use std::path::PathBuf;

/// Result alias used throughout shipwright
pub type ShipResult<T> = Result<T, ShipError>;

/// Top-level error for all shipwright operations
#[derive(Debug)]
pub enum ShipError {
  /// Version derivation failures
  Version(VersionError),

  /// Source-tree composition failures
  Composition(CompositionError),

  /// Delegated build-engine failures
  Build(BuildError),

  /// Chart packaging/publishing failures
  Publish(PublishError),

  /// A verification pipeline stage failed
  Stage(StageError),

  /// Smoke-test probe reported unexpected output
  SmokeTest(SmokeTestError),

  /// Git subprocess failures
  Git(GitError),

  /// Configuration load/validation failures
  Config(ConfigError),

  /// Orchestration was cancelled by the caller
  Cancelled,

  /// Generic error with a message (IO wrappers, subprocess spawn failures)
  Message(String),
}

/// No version is derivable and none was supplied
#[derive(Debug)]
pub enum VersionError {
  /// Repository has no reachable tag or commit history
  NoRepoMetadata,
}

/// A configured module path cannot be composed
#[derive(Debug)]
pub enum CompositionError {
  /// Module path listed in config is absent from the base tree
  MissingModule { path: PathBuf },

  /// One overlay path is a prefix of another (composition would be order-dependent)
  NestedOverlays { outer: PathBuf, inner: PathBuf },

  /// Overlay's generated tree does not contain the module path
  MissingGeneratedTree { path: PathBuf },
}

/// Delegated build/compile/image failure
#[derive(Debug)]
pub struct BuildError {
  /// Which sub-build failed ("engine", "cli", "archive")
  pub stage: String,

  /// Underlying cause reported by the build engine
  pub cause: String,
}

/// Registry publish failures, carrying which step failed
#[derive(Debug)]
pub enum PublishError {
  /// Live publish requested without credentials
  MissingCredentials,

  /// Registry login failed; nothing further was executed
  Login { cause: String },

  /// Chart packaging failed
  Package { cause: String },

  /// Push failed after a successful login (logout was still attempted)
  Push { cause: String },

  /// Logout failed with no prior error to preserve
  Logout { cause: String },

  /// Tag does not carry the configured release prefix
  BadTag { tag: String, prefix: String },
}

/// Wraps a pipeline stage's underlying error with stage identity
#[derive(Debug)]
pub struct StageError {
  pub stage: &'static str,
  pub source: Box<ShipError>,
}

/// Test-stage probe did not report the expected platform
#[derive(Debug)]
pub struct SmokeTestError {
  pub expected: String,
  pub actual: String,
}

/// Git subprocess failures
#[derive(Debug)]
pub enum GitError {
  /// Path is not inside a git repository
  RepoNotFound { path: PathBuf },

  /// A git command exited non-zero
  CommandFailed { command: String, stderr: String },
}

/// Configuration failures
#[derive(Debug)]
pub enum ConfigError {
  /// No shipwright.toml found in any search location
  NotFound { root: PathBuf },

  /// TOML parse or schema error
  Invalid { cause: String },
}

impl ShipError {
  /// Create a generic message error
  pub fn message(msg: impl Into<String>) -> Self {
    ShipError::Message(msg.into())
  }

  /// Process exit code for this error
  pub fn exit_code(&self) -> i32 {
    match self {
      ShipError::Cancelled => 130,
      _ => 1,
    }
  }
}

impl fmt::Display for ShipError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ShipError::Version(e) => write!(f, "version error: {}", e),
      ShipError::Composition(e) => write!(f, "composition error: {}", e),
      ShipError::Build(e) => write!(f, "build error: {}", e),
      ShipError::Publish(e) => write!(f, "publish error: {}", e),
      ShipError::Stage(e) => write!(f, "stage '{}' failed: {}", e.stage, e.source),
      ShipError::SmokeTest(e) => write!(
        f,
        "smoke test failed: expected platform '{}', engine reported '{}'",
        e.expected, e.actual
      ),
      ShipError::Git(e) => write!(f, "git error: {}", e),
      ShipError::Config(e) => write!(f, "config error: {}", e),
      ShipError::Cancelled => write!(f, "operation cancelled"),
      ShipError::Message(msg) => write!(f, "{}", msg),
    }
  }
}

impl fmt::Display for VersionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VersionError::NoRepoMetadata => {
        write!(f, "no tag or commit history discoverable and no explicit version given")
      }
    }
  }
}

impl fmt::Display for CompositionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CompositionError::MissingModule { path } => {
        write!(f, "module path '{}' does not exist in the base tree", path.display())
      }
      CompositionError::NestedOverlays { outer, inner } => {
        write!(
          f,
          "overlay path '{}' is nested under '{}'; overlay paths must be disjoint",
          inner.display(),
          outer.display()
        )
      }
      CompositionError::MissingGeneratedTree { path } => {
        write!(f, "generated tree has no content for module path '{}'", path.display())
      }
    }
  }
}

impl fmt::Display for BuildError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} build failed: {}", self.stage, self.cause)
  }
}

impl fmt::Display for PublishError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PublishError::MissingCredentials => {
        write!(f, "live publish requires registry credentials (use --dry-run to skip)")
      }
      PublishError::Login { cause } => write!(f, "registry login failed: {}", cause),
      PublishError::Package { cause } => write!(f, "chart packaging failed: {}", cause),
      PublishError::Push { cause } => write!(f, "chart push failed: {}", cause),
      PublishError::Logout { cause } => write!(f, "registry logout failed: {}", cause),
      PublishError::BadTag { tag, prefix } => {
        write!(f, "tag '{}' does not start with release prefix '{}'", tag, prefix)
      }
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::RepoNotFound { path } => {
        write!(f, "'{}' is not inside a git repository", path.display())
      }
      GitError::CommandFailed { command, stderr } => {
        write!(f, "{} failed: {}", command, stderr.trim())
      }
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { root } => {
        write!(f, "no shipwright.toml found under '{}'", root.display())
      }
      ConfigError::Invalid { cause } => write!(f, "invalid shipwright.toml: {}", cause),
    }
  }
}

impl std::error::Error for ShipError {}

impl From<VersionError> for ShipError {
  fn from(e: VersionError) -> Self {
    ShipError::Version(e)
  }
}

impl From<CompositionError> for ShipError {
  fn from(e: CompositionError) -> Self {
    ShipError::Composition(e)
  }
}

impl From<BuildError> for ShipError {
  fn from(e: BuildError) -> Self {
    ShipError::Build(e)
  }
}

impl From<PublishError> for ShipError {
  fn from(e: PublishError) -> Self {
    ShipError::Publish(e)
  }
}

impl From<GitError> for ShipError {
  fn from(e: GitError) -> Self {
    ShipError::Git(e)
  }
}

impl From<ConfigError> for ShipError {
  fn from(e: ConfigError) -> Self {
    ShipError::Config(e)
  }
}

impl From<std::io::Error> for ShipError {
  fn from(e: std::io::Error) -> Self {
    ShipError::Message(format!("io error: {}", e))
  }
}

/// Extension trait to attach context to fallible operations
pub trait ResultExt<T> {
  /// Wrap the error with a contextual message
  fn context(self, msg: &str) -> ShipResult<T>;
}

impl<T, E: fmt::Display> ResultExt<T> for Result<T, E> {
  fn context(self, msg: &str) -> ShipResult<T> {
    self.map_err(|e| ShipError::Message(format!("{}: {}", msg, e)))
  }
}

/// Print an error to stderr with its chain of detail
pub fn print_error(err: &ShipError) {
  eprintln!("❌ Error: {}", err);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn stage_error_preserves_underlying_message() {
    let inner = ShipError::Build(BuildError {
      stage: "engine".to_string(),
      cause: "compile failed".to_string(),
    });
    let wrapped = ShipError::Stage(StageError {
      stage: "engine-lint",
      source: Box::new(inner),
    });
    let msg = wrapped.to_string();
    assert!(msg.contains("engine-lint"));
    assert!(msg.contains("compile failed"));
  }

  #[test]
  fn context_wraps_message() {
    let r: Result<(), std::io::Error> = Err(std::io::Error::other("boom"));
    let err = r.context("reading chart").unwrap_err();
    assert!(err.to_string().contains("reading chart"));
    assert!(err.to_string().contains("boom"));
  }
}
