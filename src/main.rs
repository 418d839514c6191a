mod build;
mod commands;
mod compose;
mod core;
mod pipeline;
mod release;
mod ui;
mod version;

use crate::commands::build::BuildArgs;
use crate::core::error::{ShipError, print_error};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Release and build orchestration for the engine, CLI, SDKs and chart
#[derive(Parser)]
#[command(name = "shipwright")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct ShipCli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Resolve and print the canonical version for this checkout
  Version {
    /// Override derivation with an explicit version
    #[arg(long)]
    set: Option<String>,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Build the engine and CLI artifacts for one variant
  Build {
    /// Target platform as os/arch (default: host platform)
    #[arg(long)]
    platform: Option<String>,
    /// Race-instrumented engine compilation
    #[arg(long)]
    race: bool,
    /// Build-time tracing instrumentation
    #[arg(long)]
    trace: bool,
    /// Alternate build base image (experimental, e.g. GPU images)
    #[arg(long)]
    base_image: Option<String>,
    /// Apply generated sub-module overlays before building
    #[arg(long)]
    codegen: bool,
    /// Show the build plan without executing
    #[arg(long)]
    dry_run: bool,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Build and export artifacts into a directory
  Export {
    /// Export directory
    #[arg(long)]
    out: PathBuf,
    /// Target platform as os/arch (default: host platform)
    #[arg(long)]
    platform: Option<String>,
    /// Race-instrumented engine compilation
    #[arg(long)]
    race: bool,
    /// Build-time tracing instrumentation
    #[arg(long)]
    trace: bool,
    /// Alternate build base image (experimental, e.g. GPU images)
    #[arg(long)]
    base_image: Option<String>,
    /// Apply generated sub-module overlays before building
    #[arg(long)]
    codegen: bool,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Run the staged verification pipeline (lint, test, smoke)
  Check {
    /// Let the test suite run all groups before reporting failures
    #[arg(long)]
    no_fail_fast: bool,
    /// Concurrent test groups within the test stage
    #[arg(long, default_value_t = 4)]
    parallelism: usize,
    /// Per-test-group timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
    /// Race-instrumented test execution
    #[arg(long)]
    race: bool,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Package the chart and publish it to the registry
  Publish {
    /// Release tag (e.g. helm/chart/v1.2.3); required for live publishing
    #[arg(long)]
    tag: Option<String>,
    /// Package only; never touch the registry
    #[arg(long)]
    dry_run: bool,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Stand up an interactive engine environment
  Dev {
    /// Directory to mount into the engine (default: workspace root)
    #[arg(long)]
    target: Option<PathBuf>,
    /// Apply generated sub-module overlays before building
    #[arg(long)]
    codegen: bool,
    /// Actually start the environment (default: dry-run plan)
    #[arg(long)]
    apply: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = ShipCli::parse();

  let workspace_root = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => {
      eprintln!("Error: Failed to get current directory: {}", e);
      std::process::exit(1);
    }
  };

  // Build session context once (loads config, captures host platform)
  let ctx = match crate::core::context::OrchestratorContext::build(&workspace_root) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let result = match cli.command {
    Commands::Version { set, json } => commands::run_version(&ctx, set, json),

    Commands::Build {
      platform,
      race,
      trace,
      base_image,
      codegen,
      dry_run,
      json,
    } => commands::run_build(
      &ctx,
      BuildArgs {
        platform,
        race,
        trace,
        base_image,
        codegen,
      },
      dry_run,
      json,
    ),

    Commands::Export {
      out,
      platform,
      race,
      trace,
      base_image,
      codegen,
      json,
    } => commands::run_export(
      &ctx,
      BuildArgs {
        platform,
        race,
        trace,
        base_image,
        codegen,
      },
      out,
      json,
    ),

    Commands::Check {
      no_fail_fast,
      parallelism,
      timeout,
      race,
      json,
    } => commands::run_check(&ctx, !no_fail_fast, parallelism, timeout, race, json),

    Commands::Publish { tag, dry_run, json } => commands::run_publish(&ctx, tag, dry_run, json),

    Commands::Dev { target, codegen, apply } => commands::run_dev(
      &ctx,
      BuildArgs {
        platform: None,
        race: false,
        trace: false,
        base_image: None,
        codegen,
      },
      target,
      apply,
    ),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ShipError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code());
}
