//! Removal of previously rendered output

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{EngineError, Result};
use crate::report::Reporter;

/// Clears a directory before rendering into it
pub trait OutputCleaner {
    fn clean(&self, dir: &Path) -> Result<()>;
}

/// Recursively deletes the directory; a missing directory is not an error
#[derive(Debug, Clone, Default)]
pub struct DirCleaner {
    reporter: Reporter,
}

impl DirCleaner {
    pub fn new(reporter: Reporter) -> Self {
        Self { reporter }
    }
}

impl OutputCleaner for DirCleaner {
    fn clean(&self, dir: &Path) -> Result<()> {
        self.reporter
            .step(format!("removing folder {}", dir.display()));

        match fs::remove_dir_all(dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(dir = %dir.display(), "nothing to clean");
                Ok(())
            }
            Err(source) => Err(EngineError::Io {
                action: "remove",
                path: dir.to_path_buf(),
                source,
            }),
        }
    }
}
