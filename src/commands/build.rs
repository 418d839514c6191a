//! `shipwright build` - Build the engine and CLI artifacts for one variant
//!
//! Supports:
//! - `--platform <os/arch>` to cross-target (default: host platform)
//! - `--race` / `--trace` feature flags (additive, combinable)
//! - `--base-image <image>` to swap the build base (e.g. GPU images)
//! - `--codegen` to apply the generated sub-module overlays first
//! - `--dry-run` to show the plan without executing

use crate::build::engine::DockerEngine;
use crate::build::{ArtifactBuilder, BuildVariant, PlatformSpec};
use crate::compose::{self, ModuleOverlay};
use crate::core::context::OrchestratorContext;
use crate::core::error::{ResultExt, ShipResult};
use std::path::{Path, PathBuf};

/// Variant flags shared by build and export
pub struct BuildArgs {
  pub platform: Option<String>,
  pub race: bool,
  pub trace: bool,
  pub base_image: Option<String>,
  pub codegen: bool,
}

impl BuildArgs {
  pub fn to_variant(&self) -> ShipResult<BuildVariant> {
    let mut variant = BuildVariant::new().with_race(self.race).with_trace(self.trace);
    if let Some(ref spec) = self.platform {
      variant = variant.with_platform(PlatformSpec::parse(spec)?);
    }
    if let Some(ref image) = self.base_image {
      variant = variant.with_base_image(image.clone());
    }
    Ok(variant)
  }
}

/// Run the build command
pub fn run_build(ctx: &OrchestratorContext, args: BuildArgs, dry_run: bool, json: bool) -> ShipResult<()> {
  let variant = args.to_variant()?;
  let scratch = scratch_dir(ctx);

  if dry_run {
    println!("DRY RUN: Would build variant:");
    println!(
      "  platform: {}",
      variant.platform.clone().unwrap_or_else(|| ctx.host.clone())
    );
    println!("  race: {}  trace: {}", variant.race, variant.trace);
    println!(
      "  base image: {}",
      variant
        .base_image_override
        .clone()
        .unwrap_or_else(|| ctx.config.build.base_image.clone())
    );
    if args.codegen {
      println!("  overlays: {} module(s)", ctx.config.modules.len());
    }
    return Ok(());
  }

  let source = composed_source(ctx, args.codegen, &scratch)?;

  let engine = DockerEngine::new(scratch.join("blobs"));
  let builder = ArtifactBuilder::new(&engine, ctx.config.build.clone(), ctx.host.clone(), scratch.join("dist"));
  let output = builder.build(&variant, &source, &ctx.cancel)?;

  if json {
    let rendered = serde_json::to_string_pretty(&output).context("Failed to serialize build output")?;
    println!("{}", rendered);
    return Ok(());
  }

  println!("✅ Build complete");
  println!("  🧱 engine: {} ({})", output.engine.path.display(), output.engine.platform);
  println!("  🔧 cli:    {} ({})", output.cli.path.display(), output.cli.platform);
  println!("  recipe digest: {}", output.recipe_digest);

  Ok(())
}

/// Compose the effective source tree, applying overlays when requested
pub fn composed_source(ctx: &OrchestratorContext, codegen: bool, scratch: &Path) -> ShipResult<PathBuf> {
  if !codegen {
    return Ok(ctx.root.clone());
  }

  let overlays = ModuleOverlay::from_config(&ctx.root, &ctx.config.modules);
  compose::compose(&ctx.root, &overlays, &scratch.join("staging"), &ctx.cancel)
}

/// Scratch directory for blobs, staging trees and dist output
pub fn scratch_dir(ctx: &OrchestratorContext) -> PathBuf {
  ctx.root.join("target").join("shipwright")
}
