//! Reading and writing compose documents for CLI commands.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use recompose_common::config::OutputConfig;
use recompose_common::error::{RecomposeError, Result};
use recompose_core::Diagnostic;

/// Reads an existing compose file. A missing file reads as empty, which
/// starts a new document.
///
/// # Errors
///
/// Returns [`RecomposeError::Io`] for any other read failure.
pub fn read_existing(path: &Path) -> Result<Vec<u8>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(source) => Err(RecomposeError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `rendered` to the configured file, or to stdout.
///
/// # Errors
///
/// Returns [`RecomposeError::Io`] if the output cannot be written.
pub fn emit(config: &OutputConfig, rendered: &[u8]) -> Result<()> {
    if config.write {
        std::fs::write(&config.path, rendered).map_err(|source| RecomposeError::Io {
            path: config.path.clone(),
            source,
        })?;
        tracing::debug!(path = %config.path.display(), bytes = rendered.len(), "wrote compose file");
        return Ok(());
    }

    io::stdout()
        .lock()
        .write_all(rendered)
        .map_err(|source| RecomposeError::Io {
            path: PathBuf::from("<stdout>"),
            source,
        })
}

/// Diagnostic sink used by every command: logs at `warn`.
pub fn log_diagnostic(diagnostic: Diagnostic) {
    tracing::warn!("{diagnostic}");
}
