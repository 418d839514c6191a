//! Source-tree composition: overlay generated sub-module trees onto a base tree
//!
//! The composed tree is the effective source downstream builds consume. By
//! default (no overlays) composition is the identity and the base tree is
//! returned untouched; overlay application is opt-in via the module list in
//! shipwright.toml.
//!
//! Overlay paths must be pairwise non-nested. Replacements are then
//! independent and order among overlays is irrelevant.

use crate::core::config::ModuleConfig;
use crate::core::context::CancelToken;
use crate::core::error::{CompositionError, ResultExt, ShipResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Associates a sub-tree path within the project with the generated content
/// that must replace the raw content at that path.
#[derive(Debug, Clone)]
pub struct ModuleOverlay {
  /// Workspace-relative path of the sub-module
  pub path: PathBuf,

  /// Directory holding the generated content for that path
  pub generated: PathBuf,
}

impl ModuleOverlay {
  pub fn new(path: impl Into<PathBuf>, generated: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      generated: generated.into(),
    }
  }

  /// Build the overlay list from the fixed module enumeration in config
  ///
  /// Generated paths are resolved relative to the base tree.
  pub fn from_config(base: &Path, modules: &[ModuleConfig]) -> Vec<ModuleOverlay> {
    modules
      .iter()
      .map(|m| ModuleOverlay::new(&m.path, base.join(&m.generated)))
      .collect()
  }
}

/// Compose the effective source tree by applying `overlays` onto `base`.
///
/// - Empty overlays: returns `base` unchanged (identity fast path, no copy).
/// - Otherwise: materializes `base` into `staging` and replaces each overlay
///   path's sub-tree with the overlay's generated content.
///
/// Fails with [`CompositionError::MissingModule`] when a listed module path
/// does not exist in `base`, and [`CompositionError::NestedOverlays`] when
/// two overlay paths nest (replacement would become order-dependent).
pub fn compose(base: &Path, overlays: &[ModuleOverlay], staging: &Path, cancel: &CancelToken) -> ShipResult<PathBuf> {
  if overlays.is_empty() {
    return Ok(base.to_path_buf());
  }

  validate_overlays(base, overlays)?;

  let composed = staging.join("composed");
  if composed.exists() {
    fs::remove_dir_all(&composed).context("Failed to clear staging directory")?;
  }
  copy_tree(base, &composed)?;

  for overlay in overlays {
    cancel.checkpoint()?;

    let target = composed.join(&overlay.path);
    if target.exists() {
      fs::remove_dir_all(&target).context("Failed to remove raw module content")?;
    }
    copy_tree(&overlay.generated, &target)?;
  }

  Ok(composed)
}

fn validate_overlays(base: &Path, overlays: &[ModuleOverlay]) -> ShipResult<()> {
  for overlay in overlays {
    if !base.join(&overlay.path).is_dir() {
      return Err(
        CompositionError::MissingModule {
          path: overlay.path.clone(),
        }
        .into(),
      );
    }
    if !overlay.generated.is_dir() {
      return Err(
        CompositionError::MissingGeneratedTree {
          path: overlay.path.clone(),
        }
        .into(),
      );
    }
  }

  for (i, a) in overlays.iter().enumerate() {
    for b in overlays.iter().skip(i + 1) {
      if a.path.starts_with(&b.path) || b.path.starts_with(&a.path) {
        let (outer, inner) = if a.path.starts_with(&b.path) {
          (b.path.clone(), a.path.clone())
        } else {
          (a.path.clone(), b.path.clone())
        };
        return Err(CompositionError::NestedOverlays { outer, inner }.into());
      }
    }
  }

  Ok(())
}

/// Recursively copy a directory tree, skipping `.git`
///
/// Symlinks are recreated as links (not followed): the composed tree must
/// match the base byte-for-byte outside the overlay paths, links included.
fn copy_tree(from: &Path, to: &Path) -> ShipResult<()> {
  fs::create_dir_all(to).context("Failed to create target directory")?;

  for entry in fs::read_dir(from).context("Failed to read source directory")? {
    let entry = entry.context("Failed to read directory entry")?;
    let file_type = entry.file_type().context("Failed to stat directory entry")?;
    let name = entry.file_name();

    if name == ".git" {
      continue;
    }

    let src = entry.path();
    let dst = to.join(&name);

    if file_type.is_symlink() {
      let target = fs::read_link(&src).context("Failed to read symlink")?;
      recreate_symlink(&target, &dst)?;
    } else if file_type.is_dir() {
      copy_tree(&src, &dst)?;
    } else {
      fs::copy(&src, &dst).context("Failed to copy file")?;
    }
  }

  Ok(())
}

#[cfg(unix)]
fn recreate_symlink(target: &Path, dst: &Path) -> ShipResult<()> {
  std::os::unix::fs::symlink(target, dst).context("Failed to recreate symlink")
}

#[cfg(not(unix))]
fn recreate_symlink(_target: &Path, dst: &Path) -> ShipResult<()> {
  Err(crate::core::error::ShipError::message(format!(
    "cannot recreate symlink at '{}' on this platform",
    dst.display()
  )))
}
