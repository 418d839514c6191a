//! `shipwright dev` - Stand up an interactive engine environment
//!
//! Builds the current variant, starts an engine container with the target
//! directory mounted and the CLI injected, and prints the environment
//! variables that point a client at the fresh engine endpoint.
//!
//! Default is a dry-run plan; `--apply` actually starts the container.

use crate::build::engine::DockerEngine;
use crate::build::ArtifactBuilder;
use crate::commands::build::{BuildArgs, composed_source, scratch_dir};
use crate::core::context::OrchestratorContext;
use crate::core::error::{ResultExt, ShipError, ShipResult};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Mount point of the target directory inside the engine container
const TARGET_MOUNT: &str = "/mnt/target";

/// Engine endpoint published on the host
const ENGINE_PORT: u16 = 8080;

/// Run the dev command
pub fn run_dev(ctx: &OrchestratorContext, args: BuildArgs, target: Option<PathBuf>, apply: bool) -> ShipResult<()> {
  let target = target.unwrap_or_else(|| ctx.root.clone());
  let scratch = scratch_dir(ctx);

  if !apply {
    println!("DRY RUN: Would start a dev environment:");
    println!("  mount: {} -> {}", target.display(), TARGET_MOUNT);
    println!("  engine endpoint: tcp://localhost:{}", ENGINE_PORT);
    println!("  injected CLI: {}", ctx.config.build.cli_binary);
    println!("\nRe-run with --apply to start it");
    return Ok(());
  }

  let variant = args.to_variant()?;
  let source = composed_source(ctx, args.codegen, &scratch)?;

  let engine = DockerEngine::new(scratch.join("blobs"));
  let builder = ArtifactBuilder::new(&engine, ctx.config.build.clone(), ctx.host.clone(), scratch.join("dev"));
  let output = builder.build(&variant, &source, &ctx.cancel)?;

  ctx.cancel.checkpoint()?;

  let container_id = start_engine_container(ctx, &target, &output.engine.path)?;

  println!("✅ Dev environment running ({})", &container_id[..12.min(container_id.len())]);
  println!("\nExport these to point a client at it:");
  println!("  export SHIPWRIGHT_ENGINE_ENDPOINT=tcp://localhost:{}", ENGINE_PORT);
  println!("  export SHIPWRIGHT_CLI={}", output.cli.path.display());
  println!("  export SHIPWRIGHT_TARGET={}", TARGET_MOUNT);

  Ok(())
}

/// Start the engine container with the target directory mounted
fn start_engine_container(ctx: &OrchestratorContext, target: &Path, engine_archive: &Path) -> ShipResult<String> {
  let mut cmd = Command::new("docker");
  cmd.env_clear();
  for var in ["PATH", "HOME", "DOCKER_HOST", "DOCKER_CONFIG"] {
    if let Ok(value) = std::env::var(var) {
      cmd.env(var, value);
    }
  }

  cmd
    .arg("run")
    .arg("-d")
    .arg("--rm")
    .arg("-p")
    .arg(format!("{}:{}", ENGINE_PORT, ENGINE_PORT))
    .arg("-v")
    .arg(format!("{}:{}", target.display(), TARGET_MOUNT))
    .arg("-v")
    .arg(format!("{}:/opt/engine.tar.gz:ro", engine_archive.display()))
    .arg(&ctx.config.build.base_image)
    .arg("sh")
    .arg("-c")
    .arg("tar -xzf /opt/engine.tar.gz -C /usr/local/bin && exec engine --listen 0.0.0.0:8080");

  let output = cmd.output().context("Failed to execute docker run")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    return Err(ShipError::message(format!("failed to start engine container: {}", stderr.trim())));
  }

  Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
