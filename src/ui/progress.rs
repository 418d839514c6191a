//! Progress indicators for long-running operations
//!
//! Uses `linya` for allocation-free, concurrency-optimized progress bars.
//! One bar per pipeline run or export; test groups draw against a shared
//! `Progress` behind a mutex.

use linya::{Bar, Progress};
use std::sync::{Arc, Mutex};

/// Progress bar over the fixed pipeline stage list
pub struct StageProgress {
  progress: Progress,
  bar: Bar,
}

impl StageProgress {
  /// Create a new progress bar for a pipeline run
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self { progress, bar }
  }

  /// Advance past one completed stage
  pub fn inc(&mut self) {
    self.progress.inc_and_draw(&self.bar, 1);
  }
}

/// Shared progress bar for concurrent test groups
#[derive(Clone)]
pub struct GroupProgress {
  progress: Arc<Mutex<Progress>>,
  bar: Arc<Bar>,
}

impl GroupProgress {
  /// Create a new progress bar for `total` test groups
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self {
      progress: Arc::new(Mutex::new(progress)),
      bar: Arc::new(bar),
    }
  }

  /// Mark one group finished; safe to call from rayon workers
  pub fn inc(&self) {
    if let Ok(mut progress) = self.progress.lock() {
      progress.inc_and_draw(&self.bar, 1);
    }
  }
}
