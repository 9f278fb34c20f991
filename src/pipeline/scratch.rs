//! Scratch-file handling for the file-backed compression flow.
//!
//! Candidate output is staged at a deterministic sibling path
//! (`{output}.crunch-tmp`) and either promoted onto the destination with an
//! atomic rename or deleted. Candidates run sequentially, so a single scratch
//! path per output never sees two writers. The `Drop` impl removes anything
//! left behind when a comparison errors out mid-flight.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CrunchError;

pub const SCRATCH_SUFFIX: &str = ".crunch-tmp";

/// A staged output file that must be promoted or discarded.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    armed: bool,
}

impl ScratchFile {
    /// The deterministic scratch path for a destination.
    pub fn path_for(output: &Path) -> PathBuf {
        let mut name = output.as_os_str().to_os_string();
        name.push(SCRATCH_SUFFIX);
        PathBuf::from(name)
    }

    /// Writes the staged bytes, replacing any stale scratch content.
    pub fn write(output: &Path, bytes: &[u8]) -> Result<Self, CrunchError> {
        let path = Self::path_for(output);
        fs::write(&path, bytes)?;
        Ok(ScratchFile { path, armed: true })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Moves the staged file onto the destination (atomic on the same
    /// filesystem, since the scratch path is a sibling).
    pub fn promote(mut self, destination: &Path) -> Result<(), CrunchError> {
        fs::rename(&self.path, destination)?;
        self.armed = false;
        Ok(())
    }

    /// Deletes the staged file.
    pub fn discard(mut self) -> Result<(), CrunchError> {
        fs::remove_file(&self.path)?;
        self.armed = false;
        Ok(())
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.armed {
            let _ = fs::remove_file(&self.path);
        }
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
