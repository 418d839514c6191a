//! `shipwright version` - Resolve and print the canonical session version
//!
//! Supports:
//! - `--set <version>` to override derivation entirely
//! - `--json` for machine-readable output

use crate::core::context::OrchestratorContext;
use crate::core::error::{ResultExt, ShipResult};
use crate::core::vcs::SystemGit;
use crate::version;

/// Run the version command
pub fn run_version(ctx: &OrchestratorContext, set: Option<String>, json: bool) -> ShipResult<()> {
  let git = SystemGit::open(ctx.workspace_root()).ok();
  let explicit = set.or_else(|| ctx.config.version.explicit.clone());

  let info = version::resolve(git.as_ref(), explicit.as_deref(), &ctx.config.version.tag_match)?;

  if json {
    let rendered = serde_json::to_string_pretty(&info).context("Failed to serialize version info")?;
    println!("{}", rendered);
    return Ok(());
  }

  println!("📦 Version: {}", info.version);
  if !info.commit.is_empty() {
    println!("   Commit:  {}", info.commit);
  }
  if info.dirty {
    println!("   ⚠️  Working tree has uncommitted changes");
  }

  Ok(())
}
