pub mod system_git;

pub use system_git::SystemGit;

/// Raw `git describe` output split into its components
#[derive(Debug, Clone)]
pub struct DescribeInfo {
  /// Nearest reachable tag (leading "v" retained)
  pub tag: String,

  /// Commits since the tag (0 when HEAD is exactly on the tag)
  pub distance: u64,

  /// Abbreviated commit hash
  pub hash: String,
}
