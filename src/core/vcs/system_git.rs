//! System git backend - zero dependencies, maximum performance
//!
//! Uses git plumbing commands for all version-metadata reads. Optimized for:
//! - Single subprocess call per query
//! - Safe subprocess execution (isolated environment)
//! - Read-only operation (version derivation never mutates the repo)

use super::DescribeInfo;
use crate::core::error::{GitError, ResultExt, ShipError, ShipResult};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Git backend using system git (zero crate dependencies)
pub struct SystemGit {
  /// Repository working directory
  pub(crate) repo_path: PathBuf,

  /// Working tree root
  pub(crate) work_tree: PathBuf,
}

impl SystemGit {
  /// Open a git repository
  ///
  /// This performs ONE subprocess call to get the repository metadata.
  pub fn open(path: &Path) -> ShipResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(ShipError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(ShipError::message(format!("Failed to open git repository: {}", stderr)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let work_tree = stdout.trim();

    Ok(Self {
      repo_path: path.to_path_buf(),
      work_tree: PathBuf::from(work_tree),
    })
  }

  /// Get HEAD commit SHA
  pub fn head_commit(&self) -> ShipResult<String> {
    let output = self
      .git_cmd()
      .args(["rev-parse", "HEAD"])
      .output()
      .context("Failed to get HEAD commit")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(ShipError::Git(GitError::CommandFailed {
        command: "git rev-parse HEAD".to_string(),
        stderr: stderr.to_string(),
      }));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Whether the working tree has uncommitted changes
  pub fn is_dirty(&self) -> ShipResult<bool> {
    let output = self
      .git_cmd()
      .args(["status", "--porcelain"])
      .output()
      .context("Failed to get working tree status")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(ShipError::Git(GitError::CommandFailed {
        command: "git status --porcelain".to_string(),
        stderr: stderr.to_string(),
      }));
    }

    Ok(!output.stdout.is_empty())
  }

  /// Describe HEAD against the nearest tag matching `tag_match`
  ///
  /// Returns None when no matching tag is reachable (fresh repos, shallow
  /// clones without tags). Distance is 0 when HEAD is exactly on the tag.
  pub fn describe(&self, tag_match: &str) -> ShipResult<Option<DescribeInfo>> {
    let output = self
      .git_cmd()
      .args(["describe", "--tags", "--long", "--match", tag_match])
      .output()
      .context("Failed to run git describe")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      // No tag reachable is an expected state, not a failure
      if stderr.contains("No names found") || stderr.contains("cannot describe") || stderr.contains("No tags can describe") {
        return Ok(None);
      }
      return Err(ShipError::Git(GitError::CommandFailed {
        command: "git describe".to_string(),
        stderr: stderr.to_string(),
      }));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_describe(stdout.trim()))
  }

  /// Working tree root (convenience)
  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.repo_path);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    // Force safe behavior (override user config)
    cmd.arg("-c").arg("protocol.version=2");
    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII

    cmd
  }
}

/// Parse `git describe --long` output: `<tag>-<distance>-g<hash>`
///
/// Tags may themselves contain '-' so the split runs from the right.
fn parse_describe(raw: &str) -> Option<DescribeInfo> {
  let (rest, hash_part) = raw.rsplit_once('-')?;
  let hash = hash_part.strip_prefix('g')?.to_string();
  let (tag, distance_part) = rest.rsplit_once('-')?;
  let distance = distance_part.parse::<u64>().ok()?;

  if tag.is_empty() || hash.is_empty() {
    return None;
  }

  Some(DescribeInfo {
    tag: tag.to_string(),
    distance,
    hash,
  })
}
