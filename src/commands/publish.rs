//! `shipwright publish` - Package the chart and publish it to the registry
//!
//! The package version comes from the triggering release tag (prefix
//! stripped), not from git describe: release tagging and source-version
//! derivation are independent trigger contexts.
//!
//! Supports:
//! - `--tag <tag>` the release tag (required for live publishing)
//! - `--dry-run` to package without any registry interaction
//!
//! Credentials for live publishing are read from the environment variable
//! named by `build.credential_env` in shipwright.toml.

use crate::core::context::OrchestratorContext;
use crate::core::error::{ResultExt, ShipError, ShipResult};
use crate::release::{HelmRegistry, ReleasePackager, Secret};

/// Fallback version for tagless dry runs (smoke tests, local packaging)
const DEV_VERSION: &str = "0.0.0-dev";

/// Run the publish command
pub fn run_publish(ctx: &OrchestratorContext, tag: Option<String>, dry_run: bool, json: bool) -> ShipResult<()> {
  let registry = HelmRegistry;
  let scratch = crate::commands::build::scratch_dir(ctx);
  let packager = ReleasePackager::new(&registry, ctx.config.chart.clone(), scratch.join("charts"));

  let version = match tag {
    Some(ref tag) => packager.version_from_tag(tag)?,
    None if dry_run => DEV_VERSION.to_string(),
    None => {
      return Err(ShipError::message(
        "live publishing requires --tag (the tag-triggered release flow provides it)",
      ));
    }
  };

  let chart_source = ctx.root.join(&ctx.config.chart.path);
  let unit = packager.package(&chart_source, &version)?;

  let credentials = if dry_run {
    None
  } else {
    let env_var = &ctx.config.build.credential_env;
    match std::env::var(env_var) {
      Ok(token) if !token.is_empty() => Some(Secret::new(token)),
      _ => None,
    }
  };

  packager.publish(&unit, credentials.as_ref(), dry_run, &ctx.cancel)?;

  if json {
    let rendered = serde_json::to_string_pretty(&unit).context("Failed to serialize package unit")?;
    println!("{}", rendered);
    return Ok(());
  }

  println!("📦 Packaged {} v{}", ctx.config.chart.name, unit.version);
  println!("   {}", unit.path.display());
  // Execution platform, probed by the check pipeline's smoke stage
  println!("   platform: {}", ctx.host);
  if dry_run {
    println!("   (dry run: registry untouched)");
  } else {
    println!("✅ Pushed to {}", ctx.config.chart.registry);
  }

  Ok(())
}
