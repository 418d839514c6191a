//! Unified orchestration context - build once, pass everywhere
//!
//! # Design
//!
//! OrchestratorContext eliminates redundant config/metadata loads by building
//! all session-level data once in main.rs, then passing by reference to all
//! commands. It also carries the cancellation token that every long-running
//! operation checks before dispatching external work.

use crate::build::PlatformSpec;
use crate::core::config::ShipConfig;
use crate::core::error::{ShipError, ShipResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Caller-provided cancellation handle
///
/// Checked before each stage, overlay and build dispatch. Cancellation does
/// not roll back external side effects already performed (a completed registry
/// login stays open - known gap).
#[derive(Clone, Default)]
pub struct CancelToken {
  cancelled: Arc<AtomicBool>,
}

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  /// Request cancellation; all pending dispatches observe it
  pub fn cancel(&self) {
    self.cancelled.store(true, Ordering::SeqCst);
  }

  pub fn is_cancelled(&self) -> bool {
    self.cancelled.load(Ordering::SeqCst)
  }

  /// Fail with [`ShipError::Cancelled`] when cancellation was requested
  pub fn checkpoint(&self) -> ShipResult<()> {
    if self.is_cancelled() {
      Err(ShipError::Cancelled)
    } else {
      Ok(())
    }
  }
}

/// Unified orchestration context containing all shared session-level data.
///
/// Built once at startup, passed by reference to all commands and operations.
#[derive(Clone)]
pub struct OrchestratorContext {
  /// Workspace root directory (absolute path)
  pub root: PathBuf,

  /// Shipwright configuration (shipwright.toml, or defaults)
  /// Wrapped in Arc for efficient sharing
  pub config: Arc<ShipConfig>,

  /// Platform the orchestrator itself executes on
  pub host: PlatformSpec,

  /// Cancellation token propagated to all dispatched operations
  pub cancel: CancelToken,
}

impl OrchestratorContext {
  /// Build the context from a workspace root.
  ///
  /// Loads shipwright.toml (falling back to defaults) and captures the host
  /// platform. Cheap enough to do unconditionally for every command.
  pub fn build(workspace_root: &Path) -> ShipResult<Self> {
    let root = workspace_root.to_path_buf();
    let config = Arc::new(ShipConfig::load(&root)?);

    Ok(Self {
      root,
      config,
      host: PlatformSpec::host(),
      cancel: CancelToken::new(),
    })
  }

  /// Get workspace root as Path reference (convenience)
  pub fn workspace_root(&self) -> &Path {
    &self.root
  }
}
