//! Placement and naming of output files.
//!
//! Every crop or sample writes exactly one new file into the scratch
//! directory, named `<prefix><random>.jpg`. The engine never deletes these
//! files; their lifecycle belongs to whoever asked for them.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const DEFAULT_PREFIX: &str = "image_crop_";
const OUTPUT_SUFFIX: &str = ".jpg";

#[derive(Debug, Clone)]
pub struct ScratchDir {
    dir: PathBuf,
    prefix: String,
}

impl ScratchDir {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Create a new, uniquely named, empty output file.
    ///
    /// The file is removed again if the handle is dropped without
    /// [`NamedTempFile::keep`], so a failed encode leaves nothing behind.
    pub fn create_output(&self) -> io::Result<NamedTempFile> {
        tempfile::Builder::new()
            .prefix(&self.prefix)
            .suffix(OUTPUT_SUFFIX)
            .tempfile_in(&self.dir)
    }

    /// Make sure the directory exists and accepts new files.
    pub fn check_access(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        // Dropped immediately, which deletes it.
        tempfile::Builder::new()
            .prefix(".probe-")
            .tempfile_in(&self.dir)?;
        Ok(())
    }
}
