//! `shipwright export` - Build and export artifacts into a directory
//!
//! The export directory ends up containing exactly one compressed engine
//! archive and one CLI executable named per target OS convention.

use crate::build::engine::DockerEngine;
use crate::build::ArtifactBuilder;
use crate::commands::build::{BuildArgs, composed_source, scratch_dir};
use crate::core::context::OrchestratorContext;
use crate::core::error::{ResultExt, ShipError, ShipResult};
use crate::ui::progress::StageProgress;
use std::path::{Path, PathBuf};

/// Run the export command
pub fn run_export(ctx: &OrchestratorContext, args: BuildArgs, out: PathBuf, json: bool) -> ShipResult<()> {
  let variant = args.to_variant()?;
  let scratch = scratch_dir(ctx);

  std::fs::create_dir_all(&out).context("Failed to create export directory")?;

  let mut progress = StageProgress::new(3, format!("Exporting to {}", out.display()));

  let source = composed_source(ctx, args.codegen, &scratch)?;
  progress.inc();

  let engine = DockerEngine::new(scratch.join("blobs"));
  let builder = ArtifactBuilder::new(&engine, ctx.config.build.clone(), ctx.host.clone(), &out);
  let output = builder.build(&variant, &source, &ctx.cancel)?;
  progress.inc();

  verify_export_dir(&out)?;
  progress.inc();

  if json {
    let rendered = serde_json::to_string_pretty(&output).context("Failed to serialize export output")?;
    println!("{}", rendered);
    return Ok(());
  }

  println!("✅ Export complete: {}", out.display());
  println!("  🧱 {}", output.engine.path.file_name().unwrap_or_default().to_string_lossy());
  println!("  🔧 {}", output.cli.path.file_name().unwrap_or_default().to_string_lossy());

  Ok(())
}

/// The export contract: exactly one engine archive, exactly one CLI executable
fn verify_export_dir(out: &Path) -> ShipResult<()> {
  let mut archives = 0;
  let mut binaries = 0;

  for entry in std::fs::read_dir(out).context("Failed to read export directory")? {
    let entry = entry.context("Failed to read export entry")?;
    let name = entry.file_name().to_string_lossy().to_string();
    if name.ends_with(".tar.gz") {
      archives += 1;
    } else if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
      binaries += 1;
    }
  }

  if archives != 1 || binaries != 1 {
    return Err(ShipError::message(format!(
      "export directory must contain exactly one engine archive and one CLI binary, found {} archive(s) and {} file(s)",
      archives, binaries
    )));
  }

  Ok(())
}
