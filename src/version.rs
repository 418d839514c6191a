//! Canonical version derivation for an orchestration session
//!
//! One `VersionInfo` is resolved per session and shared read-only by every
//! downstream consumer (artifact builds embed it, package metadata records
//! it). An explicit override always wins over derived values.

use crate::core::error::{ShipResult, VersionError};
use crate::core::vcs::SystemGit;
use serde::Serialize;

/// Immutable version identity for one orchestration session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
  /// Semantic version, leading "v" stripped
  pub version: String,

  /// HEAD commit SHA, empty when no repository metadata is available
  pub commit: String,

  /// Whether the working tree had uncommitted changes
  pub dirty: bool,
}

/// Derive a canonical `VersionInfo` from repository metadata and an optional
/// explicit override.
///
/// - An explicit non-empty version is used verbatim (minus one leading "v");
///   commit/dirty are still read from the repository when one is available.
/// - Otherwise standard describe semantics apply: exact tag yields that
///   version, else `<tag>-<distance>-g<hash>`, suffixed `-dirty` when the
///   working tree has uncommitted changes.
///
/// Read-only: never mutates the repository.
pub fn resolve(git: Option<&SystemGit>, explicit: Option<&str>, tag_match: &str) -> ShipResult<VersionInfo> {
  if let Some(v) = explicit
    && !v.is_empty()
  {
    let (commit, dirty) = match git {
      Some(g) => (g.head_commit().unwrap_or_default(), g.is_dirty().unwrap_or(false)),
      None => (String::new(), false),
    };
    return Ok(VersionInfo {
      version: strip_leading_v(v).to_string(),
      commit,
      dirty,
    });
  }

  let git = git.ok_or(VersionError::NoRepoMetadata)?;
  let described = git.describe(tag_match)?.ok_or(VersionError::NoRepoMetadata)?;
  let commit = git.head_commit()?;
  let dirty = git.is_dirty()?;

  let tag = strip_leading_v(&described.tag);
  let mut version = if described.distance == 0 {
    tag.to_string()
  } else {
    format!("{}-{}-g{}", tag, described.distance, described.hash)
  };

  if dirty {
    version.push_str("-dirty");
  }

  Ok(VersionInfo { version, commit, dirty })
}

/// Strip one optional leading "v" from a version string
pub fn strip_leading_v(version: &str) -> &str {
  version.strip_prefix('v').unwrap_or(version)
}
