//! Non-fatal findings reported while translating.
//!
//! The engine never logs user-facing warnings itself. Callers pass a
//! [`DiagnosticSink`] to [`crate::Translator::parse_with`] and decide what
//! to do with each [`Diagnostic`].

use std::fmt;

/// Something worth telling the user that did not stop translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The flag is not in the registry and was ignored.
    UnknownFlag {
        /// Flag name as written.
        flag: String,
    },
    /// The flag is recognized but has no compose equivalent.
    UnsupportedFlag {
        /// Flag name as written.
        flag: String,
    },
    /// An existing service with the same name was overwritten.
    ServiceReplaced {
        /// Service name.
        name: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFlag { flag } => write!(f, "unknown flag '{flag}' ignored"),
            Self::UnsupportedFlag { flag } => {
                write!(f, "flag '{flag}' has no compose equivalent and was ignored")
            }
            Self::ServiceReplaced { name } => write!(f, "service '{name}' was replaced"),
        }
    }
}

/// Receiver of [`Diagnostic`]s.
pub trait DiagnosticSink {
    /// Records one diagnostic.
    fn report(&mut self, diagnostic: Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: FnMut(Diagnostic),
{
    fn report(&mut self, diagnostic: Diagnostic) {
        self(diagnostic);
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl DiagnosticSink for Discard {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}
