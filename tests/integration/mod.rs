//! Integration tests for the shipwright CLI
//!
//! Tests exercise the built binary against throwaway git workspaces. Stages
//! and builds that need external engines (docker, helm) are covered by unit
//! tests with recording doubles; here we cover the git-backed version flow
//! and the dry-run surfaces.

mod helpers;
mod test_build_plan;
mod test_dev;
mod test_publish;
mod test_version;
