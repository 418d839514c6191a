//! CLI commands for shipwright
//!
//! This module contains all user-facing command implementations:
//!
//! ## Inspection
//! - **version**: Resolve and print the canonical session version
//!
//! ## Builds
//! - **build**: Build engine + CLI artifacts for one variant
//! - **export**: Build and export artifacts into a directory (dev export)
//!
//! ## Verification
//! - **check**: Run the staged verification pipeline with fail-fast
//!
//! ## Releases
//! - **publish**: Package the chart and publish it to the registry
//!
//! ## Development
//! - **dev**: Stand up an interactive engine environment
//!
//! All commands accept `&OrchestratorContext` to avoid redundant config loads.

pub mod build;
pub mod check;
pub mod dev;
pub mod export;
pub mod publish;
pub mod version;

pub use build::run_build;
pub use check::run_check;
pub use dev::run_dev;
pub use export::run_export;
pub use publish::run_publish;
pub use version::run_version;
