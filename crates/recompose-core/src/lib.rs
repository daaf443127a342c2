//! # recompose-core
//!
//! Translates a `docker run` invocation into a compose document.
//!
//! Handles:
//! - **Parser**: Shell-style tokenizing, flag/value pairing, and the
//!   `--mount`/`--ulimit` value formats.
//! - **Registry**: The static table of flags and their compose targets.
//! - **Builder**: Writing flag values into a service mapping.
//! - **Document**: The ordered document tree, YAML loading, and rendering.
//! - **Translator**: The entry point tying the pipeline together.
//!
//! ```
//! use recompose_core::Translator;
//!
//! let compose = Translator::new("docker run -i -t --rm alpine")?.parse()?;
//! assert!(compose.render_string().contains("tty: true"));
//! # Ok::<(), recompose_common::error::RecomposeError>(())
//! ```

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod builder;
pub mod diagnostics;
pub mod document;
pub mod image;
pub mod parser;
pub mod registry;
pub mod translator;

pub use diagnostics::{Diagnostic, DiagnosticSink};
pub use translator::{Compose, Translator};
