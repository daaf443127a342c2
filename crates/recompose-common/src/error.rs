//! Unified error type for the recompose workspace.
//!
//! Every stage of the translation pipeline reports failures through
//! [`RecomposeError`]. The pipeline stops at the first error; there is no
//! partial-document recovery.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum RecomposeError {
    /// The invocation contained nothing after the run-command prefix.
    #[error("empty docker command")]
    EmptyInput,

    /// A quoted region was opened but never closed.
    #[error("quotes did not terminate")]
    UnterminatedQuote,

    /// A value-taking flag was the last token of the invocation.
    #[error("flag \"{flag}\" is missing an argument")]
    MissingFlagArgument {
        /// Flag name as written, without leading dashes.
        flag: String,
    },

    /// A flag value does not fit the flag's value kind.
    #[error("invalid value \"{value}\" for flag \"{flag}\": {reason}")]
    InvalidFlagValue {
        /// Flag name.
        flag: String,
        /// Offending value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A mount or ulimit specification contains a malformed clause.
    #[error("invalid specification \"{spec}\": {message}")]
    InvalidCompositeSpec {
        /// The full composite value.
        spec: String,
        /// Description of the malformed clause.
        message: String,
    },

    /// A composite value has fewer or more sub-fields than its format allows.
    #[error("incomplete specification \"{spec}\": expected {expected}")]
    UnterminatedComposite {
        /// The full composite value.
        spec: String,
        /// The expected shape.
        expected: &'static str,
    },

    /// Flag parsing consumed every token, leaving no image reference.
    #[error("no image specified")]
    MissingImage,

    /// An existing compose document is valid YAML but not compose-shaped.
    #[error("invalid compose document: {message}")]
    InvalidDocument {
        /// Description of the structural problem.
        message: String,
    },

    /// An existing compose document could not be parsed as YAML.
    #[error("failed to parse compose document: {source}")]
    Yaml {
        /// Underlying YAML scanner error.
        #[from]
        source: yaml_rust2::ScanError,
    },

    /// A target path runs through a node of the wrong structural kind.
    #[error("cannot write to \"{path}\": an existing node has a different shape")]
    ConflictingPath {
        /// Dotted path of the conflicting node.
        path: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, RecomposeError>;
