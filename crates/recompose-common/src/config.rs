//! Output configuration for the recompose front ends.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{COMPOSE_FILE_CANDIDATES, DEFAULT_OUTPUT_FILE};

/// Where a rendered compose document goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Destination file used when `write` is set.
    pub path: PathBuf,
    /// Write to `path` instead of standard output.
    pub write: bool,
}

impl OutputConfig {
    /// Creates a configuration targeting `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, write: bool) -> Self {
        Self {
            path: path.into(),
            write,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            write: false,
        }
    }
}

/// Returns the first well-known compose file that exists in `dir`.
pub fn discover_compose_file(dir: &Path) -> Option<PathBuf> {
    COMPOSE_FILE_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}
