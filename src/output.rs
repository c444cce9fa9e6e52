//! Atomic output files.
//!
//! Data is written to a temporary file next to the destination and renamed
//! into place only after the write succeeded, so a failed run never leaves a
//! partial file behind.

use crate::error::LabelError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Bytes already written and synced to a temporary file beside `path`.
///
/// Nothing appears at `path` until [`StagedFile::commit`]. Dropping the
/// value removes the temporary file.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    temp: NamedTempFile,
}

fn output_error(path: &Path, source: std::io::Error) -> LabelError {
    LabelError::Output {
        path: path.to_path_buf(),
        source,
    }
}

/// Write `bytes` next to `path`, creating missing parent directories.
pub fn stage_file(path: &Path, bytes: &[u8]) -> Result<StagedFile, LabelError> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| output_error(path, e))?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| output_error(path, e))?;
    temp.write_all(bytes).map_err(|e| output_error(path, e))?;
    temp.as_file().sync_all().map_err(|e| output_error(path, e))?;

    Ok(StagedFile {
        path: path.to_path_buf(),
        temp,
    })
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rename the temporary file onto the destination.
    pub fn commit(self) -> Result<(), LabelError> {
        let StagedFile { path, temp } = self;
        temp.persist(&path)
            .map_err(|e| output_error(&path, e.error))?;
        Ok(())
    }
}

/// Write `bytes` to `path`, creating missing parent directories.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), LabelError> {
    stage_file(path, bytes)?.commit()
}
