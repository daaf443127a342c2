//! Entry point: one `docker run` invocation in, one compose service out.

use recompose_common::constants::{COMMAND_KEY, IMAGE_KEY, RUN_PREFIXES};
use recompose_common::error::{RecomposeError, Result};

use crate::builder::Builder;
use crate::diagnostics::{Diagnostic, DiagnosticSink, Discard};
use crate::document::{Document, NodeId};
use crate::image::{self, Trailing};
use crate::parser::lexer::tokenize;
use crate::parser::FlagStream;
use crate::registry::registry;

/// A tokenized invocation waiting to be translated into a document.
///
/// Created with [`Translator::new`] for a fresh document or
/// [`Translator::append_service`] to add to an existing one; consumed by
/// [`Translator::parse`].
#[derive(Debug)]
pub struct Translator {
    doc: Document,
    tokens: Vec<String>,
    service_name: Option<String>,
}

impl Translator {
    /// Prepares a translation into a new document.
    ///
    /// A leading `docker run`, `docker container run`, or `podman run` is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`RecomposeError::UnterminatedQuote`] for an unbalanced quote
    /// and [`RecomposeError::EmptyInput`] when nothing is left after the
    /// command prefix.
    pub fn new(invocation: &str) -> Result<Self> {
        Ok(Self {
            doc: Document::new(),
            tokens: invocation_tokens(invocation)?,
            service_name: None,
        })
    }

    /// Prepares a translation that adds a service to `existing`, a
    /// previously rendered document. Empty `existing` bytes start a new one.
    ///
    /// # Errors
    ///
    /// Fails like [`Translator::new`] for the invocation, and with
    /// [`RecomposeError::Yaml`] or [`RecomposeError::InvalidDocument`] when
    /// `existing` is not a compose document.
    pub fn append_service(existing: &[u8], invocation: &str) -> Result<Self> {
        let tokens = invocation_tokens(invocation)?;
        Ok(Self {
            doc: Document::from_yaml(existing)?,
            tokens,
            service_name: None,
        })
    }

    /// Uses `name` for the service instead of deriving it from the image.
    /// An empty name keeps the derived one.
    pub fn set_service_name(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.service_name = (!name.is_empty()).then_some(name);
        self
    }

    /// Translates the invocation, ignoring diagnostics.
    ///
    /// # Errors
    ///
    /// Returns the first flag, value, or document error encountered.
    pub fn parse(self) -> Result<Compose> {
        self.parse_with(&mut Discard)
    }

    /// Translates the invocation, reporting non-fatal findings to `sink`.
    ///
    /// # Errors
    ///
    /// Returns the first flag, value, or document error encountered; the
    /// document is discarded in that case.
    pub fn parse_with(self, sink: &mut dyn DiagnosticSink) -> Result<Compose> {
        let Self {
            mut doc,
            tokens,
            service_name,
        } = self;
        tracing::debug!(tokens = tokens.len(), "translating invocation");

        let registry = registry();
        let mut stream = FlagStream::new(tokens, registry);
        let mut flags = Vec::new();
        while let Some(flag) = stream.next_flag()? {
            flags.push(flag);
        }
        let trailing = image::resolve(stream.into_remaining())?;
        let name = service_name.unwrap_or_else(|| image::service_name(&trailing.image));

        let service = doc.add_mapping();
        {
            let mut builder = Builder::new(&mut doc, registry, service, &name);
            for flag in &flags {
                builder.apply(&flag.name, &flag.value, sink)?;
            }
        }
        attach_trailing(&mut doc, service, trailing)?;

        let services = doc.services();
        if doc.insert(services, &name, service)?.is_some() {
            tracing::debug!(service = %name, "replacing existing service");
            sink.report(Diagnostic::ServiceReplaced { name: name.clone() });
        }

        let rendered = doc.to_yaml_string();
        tracing::debug!(service = %name, flags = flags.len(), "translated invocation");
        Ok(Compose {
            doc,
            service_name: name,
            rendered,
        })
    }
}

/// A translated document, ready to be written out.
#[derive(Debug, Clone)]
pub struct Compose {
    doc: Document,
    service_name: String,
    rendered: String,
}

impl Compose {
    /// The rendered YAML as bytes.
    pub fn render(&self) -> &[u8] {
        self.rendered.as_bytes()
    }

    /// The rendered YAML.
    pub fn render_string(&self) -> &str {
        &self.rendered
    }

    /// Name of the service added by this translation.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// The document tree.
    pub const fn document(&self) -> &Document {
        &self.doc
    }
}

fn invocation_tokens(invocation: &str) -> Result<Vec<String>> {
    let mut tokens = tokenize(invocation)?;
    let prefix_len = RUN_PREFIXES
        .iter()
        .find(|prefix| {
            tokens.len() >= prefix.len() && tokens.iter().zip(prefix.iter()).all(|(t, p)| t == p)
        })
        .map_or(0, |prefix| prefix.len());
    let tokens = tokens.split_off(prefix_len);
    if tokens.is_empty() {
        return Err(RecomposeError::EmptyInput);
    }
    Ok(tokens)
}

fn attach_trailing(doc: &mut Document, service: NodeId, trailing: Trailing) -> Result<()> {
    let image = doc.add_scalar(trailing.image);
    let _ = doc.insert(service, IMAGE_KEY, image)?;

    if !trailing.command.is_empty() {
        let command = doc.add_sequence();
        for arg in trailing.command {
            let arg = doc.add_scalar(arg);
            doc.push(command, arg)?;
        }
        let _ = doc.insert(service, COMMAND_KEY, command)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_strips_run_prefixes() {
        for invocation in [
            "docker run alpine",
            "docker container run alpine",
            "podman run alpine",
            "alpine",
        ] {
            let compose = Translator::new(invocation)
                .expect("should tokenize")
                .parse()
                .expect("should parse");
            assert_eq!(compose.service_name(), "alpine", "{invocation}");
        }
    }

    #[test]
    fn new_rejects_empty_invocation() {
        assert!(matches!(Translator::new(""), Err(RecomposeError::EmptyInput)));
        assert!(matches!(
            Translator::new("  docker run "),
            Err(RecomposeError::EmptyInput)
        ));
    }

    #[test]
    fn new_rejects_unterminated_quote_before_parsing() {
        assert!(matches!(
            Translator::new("docker run --name 'web alpine"),
            Err(RecomposeError::UnterminatedQuote)
        ));
    }

    #[test]
    fn parse_without_image_is_an_error() {
        let result = Translator::new("docker run -i -t").expect("tokenize").parse();
        assert!(matches!(result, Err(RecomposeError::MissingImage)));
    }

    #[test]
    fn set_service_name_overrides_derived_name() {
        let mut translator = Translator::new("docker run nginx:1.25").expect("tokenize");
        let _ = translator.set_service_name("frontend");
        let compose = translator.parse().expect("parse");
        assert_eq!(compose.service_name(), "frontend");
        assert_eq!(compose.document().service_names(), vec!["frontend"]);
    }

    #[test]
    fn set_service_name_ignores_empty_name() {
        let mut translator = Translator::new("docker run nginx:1.25").expect("tokenize");
        let _ = translator.set_service_name("");
        assert_eq!(translator.parse().expect("parse").service_name(), "nginx");
    }

    #[test]
    fn parse_with_reports_diagnostics() {
        let mut seen: Vec<Diagnostic> = Vec::new();
        let _ = Translator::new("docker run --rm --brand-new x alpine")
            .expect("tokenize")
            .parse_with(&mut seen)
            .expect("parse");
        assert_eq!(
            seen,
            vec![
                Diagnostic::UnsupportedFlag { flag: "rm".into() },
                Diagnostic::UnknownFlag { flag: "brand-new".into() },
            ]
        );
    }

    #[test]
    fn render_and_render_string_agree() {
        let compose = Translator::new("docker run alpine")
            .expect("tokenize")
            .parse()
            .expect("parse");
        assert_eq!(compose.render(), compose.render_string().as_bytes());
    }
}
