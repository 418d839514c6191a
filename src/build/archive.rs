//! Engine artifact archiving
//!
//! The engine binary ships as a gzip tar archive. Consumers of the archive
//! include tooling that predates zstd support, so the compression scheme is
//! deliberately gzip.

use crate::core::error::{ResultExt, ShipResult};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::path::Path;

/// Write `binary` into a gzip tar archive at `dest`
///
/// The archive contains the binary under its file name at the archive root.
pub fn write_engine_archive(binary: &Path, dest: &Path) -> ShipResult<()> {
  let file = File::create(dest).context("Failed to create engine archive")?;
  let encoder = GzEncoder::new(file, Compression::default());
  let mut builder = tar::Builder::new(encoder);

  let name = binary
    .file_name()
    .ok_or_else(|| crate::core::error::ShipError::message("engine binary path has no file name"))?;

  builder
    .append_path_with_name(binary, name)
    .context("Failed to append engine binary to archive")?;

  let encoder = builder.into_inner().context("Failed to finish archive")?;
  encoder.finish().context("Failed to finish gzip stream")?;

  Ok(())
}
