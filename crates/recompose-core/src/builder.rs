//! Applies resolved flags to a service mapping.
//!
//! Each flag's target path template is walked segment by segment, creating
//! intermediate mappings on demand. The node a path segment resolves to is
//! remembered in an anchor cache so repeated flags (several `-p`) keep
//! appending to the same sequence.

use std::collections::HashMap;

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::char,
    combinator::{all_consuming, opt, recognize, verify},
    multi::many1,
    sequence::pair,
};
use recompose_common::error::{RecomposeError, Result};

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::document::{Document, Node, NodeId};
use crate::parser::mount::MountSpec;
use crate::parser::parse_bool;
use crate::parser::ulimit::Ulimit;
use crate::registry::{Collection, FlagDescriptor, FlagRegistry, ValueKind};

/// Terminal segment whose key comes from the value itself.
const VAR_SEGMENT: &str = "$var";

/// Segment replaced by the active service name.
const SERVICE_SEGMENT: &str = "$service";

/// Prefix anchoring a segment at the document root.
const ROOT_MARKER: char = '^';

/// Writes flag values into one service of a [`Document`].
#[derive(Debug)]
pub struct Builder<'a> {
    doc: &'a mut Document,
    registry: &'a FlagRegistry,
    service: NodeId,
    service_name: &'a str,
    anchors: HashMap<String, NodeId>,
}

impl<'a> Builder<'a> {
    /// Creates a builder writing into the mapping `service`, which is
    /// addressed as `service_name` by `$service` segments.
    pub fn new(
        doc: &'a mut Document,
        registry: &'a FlagRegistry,
        service: NodeId,
        service_name: &'a str,
    ) -> Self {
        Self {
            doc,
            registry,
            service,
            service_name,
            anchors: HashMap::new(),
        }
    }

    /// Applies one flag.
    ///
    /// Unknown flags and flags without a compose equivalent are reported to
    /// `sink` and otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RecomposeError::InvalidFlagValue`] when the value does not
    /// fit the flag's kind, the micro-parser errors for `--mount` and
    /// `--ulimit`, and [`RecomposeError::ConflictingPath`] when the target
    /// path runs into an existing node of the wrong shape.
    pub fn apply(&mut self, name: &str, value: &str, sink: &mut dyn DiagnosticSink) -> Result<()> {
        let Some(&descriptor) = self.registry.lookup(name) else {
            tracing::debug!(flag = %name, "ignoring unknown flag");
            sink.report(Diagnostic::UnknownFlag { flag: name.to_owned() });
            return Ok(());
        };
        if descriptor.is_unsupported() {
            tracing::debug!(flag = %name, "ignoring flag without compose equivalent");
            sink.report(Diagnostic::UnsupportedFlag { flag: name.to_owned() });
            return Ok(());
        }
        self.write(name, descriptor, value)
    }

    fn write(&mut self, name: &str, descriptor: FlagDescriptor, value: &str) -> Result<()> {
        let kind = descriptor.kind;
        let segments: Vec<&str> = descriptor.target.split('.').collect();
        let Some((&last, parents)) = segments.split_last() else {
            return Ok(());
        };

        let mut node = self.service;
        let mut path = String::new();

        for (i, &segment) in parents.iter().enumerate() {
            let (key, from_root) = self.resolve_segment(segment);
            if from_root {
                node = self.doc.root();
            }
            extend_path(&mut path, &key, from_root);

            // The segment right before `$var` holds the collection itself.
            let shape = if i + 1 == parents.len() && last == VAR_SEGMENT {
                kind.collection()
            } else {
                Collection::Mapping
            };
            node = self.child(node, &key, &path, shape)?;
        }

        if last == VAR_SEGMENT {
            return self.write_entry(node, &path, kind, value);
        }

        let (key, from_root) = self.resolve_segment(last);
        if from_root {
            node = self.doc.root();
        }
        if kind.is_collection() {
            extend_path(&mut path, &key, from_root);
            let holder = self.child(node, &key, &path, kind.collection())?;
            return self.write_entry(holder, &path, kind, value);
        }

        let text = normalize(name, kind, value)?;
        let scalar = self.doc.add_scalar(text);
        let _ = self
            .doc
            .insert(node, &key, scalar)
            .map_err(|_| RecomposeError::ConflictingPath { path: descriptor.target.into() })?;
        Ok(())
    }

    /// Strips the root marker and substitutes `$service`.
    fn resolve_segment(&self, segment: &str) -> (String, bool) {
        let (segment, from_root) = match segment.strip_prefix(ROOT_MARKER) {
            Some(rest) => (rest, true),
            None => (segment, false),
        };
        let key = if segment == SERVICE_SEGMENT {
            self.service_name.to_owned()
        } else {
            segment.to_owned()
        };
        (key, from_root)
    }

    /// Returns the child `key` of `parent`, creating it with `shape` if it
    /// does not exist yet.
    fn child(&mut self, parent: NodeId, key: &str, path: &str, shape: Collection) -> Result<NodeId> {
        if let Some(&id) = self.anchors.get(path) {
            return Ok(id);
        }

        let conflict = || RecomposeError::ConflictingPath { path: path.to_owned() };
        let id = match self.doc.get(parent, key) {
            Some(existing) => {
                let fits = matches!(
                    (self.doc.node(existing), shape),
                    (Node::Mapping(_), Collection::Mapping) | (Node::Sequence(_), Collection::Sequence)
                );
                if !fits {
                    return Err(conflict());
                }
                existing
            }
            None => {
                let id = match shape {
                    Collection::Mapping => self.doc.add_mapping(),
                    Collection::Sequence => self.doc.add_sequence(),
                };
                let _ = self.doc.insert(parent, key, id).map_err(|_| conflict())?;
                id
            }
        };

        let _ = self.anchors.insert(path.to_owned(), id);
        Ok(id)
    }

    /// Adds one value to the collection `holder`.
    fn write_entry(&mut self, holder: NodeId, path: &str, kind: ValueKind, value: &str) -> Result<()> {
        let conflict =
            |_: RecomposeError| RecomposeError::ConflictingPath { path: path.to_owned() };
        match kind {
            ValueKind::StringMap => {
                let (key, entry) = value.split_once('=').unwrap_or((value, ""));
                let scalar = self.doc.add_scalar(entry);
                let _ = self.doc.insert(holder, key, scalar).map_err(conflict)?;
            }
            ValueKind::LimitPairMap => {
                let limit = Ulimit::parse(value)?;
                let node = limit.to_node(self.doc);
                let _ = self.doc.insert(holder, &limit.name, node).map_err(conflict)?;
            }
            ValueKind::MountSpec => {
                let node = MountSpec::parse(value)?.to_node(self.doc);
                self.doc.push(holder, node).map_err(conflict)?;
            }
            _ => {
                let scalar = self.doc.add_scalar(value);
                self.doc.push(holder, scalar).map_err(conflict)?;
            }
        }
        Ok(())
    }
}

/// Appends `key` to the anchor path, restarting it at the root if asked.
fn extend_path(path: &mut String, key: &str, from_root: bool) {
    if from_root {
        path.clear();
        path.push(ROOT_MARKER);
    } else if !path.is_empty() {
        path.push('.');
    }
    path.push_str(key);
}

/// Validates a scalar value against its kind and returns the text to emit.
fn normalize(flag: &str, kind: ValueKind, value: &str) -> Result<String> {
    let invalid = |reason: &str| RecomposeError::InvalidFlagValue {
        flag: flag.to_owned(),
        value: value.to_owned(),
        reason: reason.to_owned(),
    };

    match kind {
        ValueKind::Boolean => parse_bool(value)
            .map(|b| b.to_string())
            .ok_or_else(|| invalid("expected a boolean")),
        ValueKind::Integer => value
            .parse::<i64>()
            .map(|_| value.to_owned())
            .map_err(|_| invalid("expected an integer")),
        ValueKind::Float => value
            .parse::<f64>()
            .map(|_| value.to_owned())
            .map_err(|_| invalid("expected a number")),
        ValueKind::Duration => {
            if value.parse::<u64>().is_ok() {
                Ok(format!("{value}s"))
            } else if is_duration(value) {
                Ok(value.to_owned())
            } else {
                Err(invalid("expected a duration such as 30s or 1m30s"))
            }
        }
        _ => Ok(value.to_owned()),
    }
}

/// One `<number><unit>` pair, e.g. `1.5h`.
fn duration_part(input: &str) -> IResult<&str, &str> {
    let number = verify(
        recognize(pair(
            take_while(|c: char| c.is_ascii_digit()),
            opt(pair(char('.'), take_while(|c: char| c.is_ascii_digit()))),
        )),
        |digits: &str| digits.chars().any(|c| c.is_ascii_digit()),
    );
    let unit = alt((
        tag("ns"),
        tag("us"),
        tag("\u{b5}s"),
        tag("\u{3bc}s"),
        tag("ms"),
        tag("s"),
        tag("m"),
        tag("h"),
    ));
    recognize(pair(number, unit)).parse(input)
}

fn is_duration(value: &str) -> bool {
    all_consuming(many1(duration_part)).parse(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::registry;

    fn build(flags: &[(&str, &str)]) -> (Document, NodeId) {
        let mut doc = Document::new();
        let service = doc.add_mapping();
        let mut sink: Vec<Diagnostic> = Vec::new();
        {
            let mut builder = Builder::new(&mut doc, registry(), service, "web");
            for (name, value) in flags {
                builder.apply(name, value, &mut sink).expect("should apply");
            }
        }
        (doc, service)
    }

    fn keys(doc: &Document, map: NodeId) -> Vec<String> {
        match doc.node(map) {
            Node::Mapping(entries) => entries.iter().map(|(k, _)| k.clone()).collect(),
            other => panic!("expected mapping, got {}", other.kind_name()),
        }
    }

    fn items(doc: &Document, seq: NodeId) -> Vec<String> {
        match doc.node(seq) {
            Node::Sequence(items) => items
                .iter()
                .map(|id| doc.scalar_value(*id).unwrap_or_default().to_owned())
                .collect(),
            other => panic!("expected sequence, got {}", other.kind_name()),
        }
    }

    fn scalar<'d>(doc: &'d Document, map: NodeId, path: &str) -> Option<&'d str> {
        let node = path
            .split('.')
            .try_fold(map, |node, key| doc.get(node, key))?;
        doc.scalar_value(node)
    }

    #[test]
    fn apply_boolean_writes_normalized_scalar() {
        let (doc, svc) = build(&[("t", "T"), ("interactive", "0")]);
        assert_eq!(scalar(&doc, svc, "tty"), Some("true"));
        assert_eq!(scalar(&doc, svc, "stdin_open"), Some("false"));
    }

    #[test]
    fn apply_repeated_list_flag_appends_in_order() {
        let (doc, svc) = build(&[("p", "8080:80"), ("publish", "8081:80"), ("p", "8080:80")]);
        let ports = doc.get(svc, "ports").expect("ports");
        assert_eq!(items(&doc, ports), vec!["8080:80", "8081:80", "8080:80"]);
    }

    #[test]
    fn apply_string_map_splits_on_first_equals() {
        let (doc, svc) = build(&[("e", "A=b=c"), ("env", "EMPTY"), ("e", "A=d")]);
        let env = doc.get(svc, "environment").expect("environment");
        assert_eq!(keys(&doc, env), vec!["A", "EMPTY"]);
        assert_eq!(scalar(&doc, env, "A"), Some("d"));
        assert_eq!(scalar(&doc, env, "EMPTY"), Some(""));
    }

    #[test]
    fn apply_nested_paths_share_intermediate_mappings() {
        let (doc, svc) = build(&[
            ("log-driver", "json-file"),
            ("log-opt", "max-size=10m"),
            ("cpus", "1.5"),
            ("memory", "512m"),
        ]);
        assert_eq!(keys(&doc, svc), vec!["logging", "deploy"]);
        let logging = doc.get(svc, "logging").expect("logging");
        assert_eq!(keys(&doc, logging), vec!["driver", "options"]);
        assert_eq!(scalar(&doc, svc, "logging.options.max-size"), Some("10m"));
        assert_eq!(scalar(&doc, svc, "deploy.resources.limits.cpus"), Some("1.5"));
        assert_eq!(scalar(&doc, svc, "deploy.resources.limits.memory"), Some("512m"));
    }

    #[test]
    fn apply_repeated_scalar_overwrites_in_place() {
        let (doc, svc) = build(&[("u", "root"), ("hostname", "box"), ("user", "app")]);
        assert_eq!(keys(&doc, svc), vec!["user", "hostname"]);
        assert_eq!(scalar(&doc, svc, "user"), Some("app"));
    }

    #[test]
    fn apply_ulimit_keys_by_name() {
        let (doc, svc) = build(&[("ulimit", "nofile=1024:2048"), ("ulimit", "nproc=-1:-1")]);
        let ulimits = doc.get(svc, "ulimits").expect("ulimits");
        assert_eq!(keys(&doc, ulimits), vec!["nofile", "nproc"]);
        assert_eq!(scalar(&doc, svc, "ulimits.nofile.soft"), Some("1024"));
        assert_eq!(scalar(&doc, svc, "ulimits.nproc.hard"), Some("-1"));
    }

    #[test]
    fn apply_mount_appends_to_volumes_list() {
        let (doc, svc) = build(&[
            ("v", "/data:/data:ro"),
            ("mount", "type=bind,source=/tmp,target=/tmp,readonly"),
        ]);
        let Node::Sequence(volumes) = doc.node(doc.get(svc, "volumes").expect("volumes")) else {
            panic!("expected sequence");
        };
        assert_eq!(volumes.len(), 2);
        assert_eq!(doc.scalar_value(volumes[0]), Some("/data:/data:ro"));
        assert_eq!(keys(&doc, volumes[1]), vec!["type", "source", "target", "readonly"]);
    }

    #[test]
    fn apply_duration_adds_seconds_to_bare_integers() {
        let (doc, svc) = build(&[("health-interval", "30"), ("health-timeout", "1m30s")]);
        assert_eq!(scalar(&doc, svc, "healthcheck.interval"), Some("30s"));
        assert_eq!(scalar(&doc, svc, "healthcheck.timeout"), Some("1m30s"));
    }

    #[test]
    fn apply_reports_unknown_and_unsupported_flags() {
        let mut doc = Document::new();
        let service = doc.add_mapping();
        let mut sink: Vec<Diagnostic> = Vec::new();
        let mut builder = Builder::new(&mut doc, registry(), service, "web");
        builder.apply("brand-new", "x", &mut sink).expect("ignored");
        builder.apply("rm", "true", &mut sink).expect("ignored");
        drop(builder);
        assert_eq!(
            sink,
            vec![
                Diagnostic::UnknownFlag { flag: "brand-new".into() },
                Diagnostic::UnsupportedFlag { flag: "rm".into() },
            ]
        );
        assert!(keys(&doc, service).is_empty());
    }

    #[test]
    fn apply_rejects_bad_values() {
        let mut doc = Document::new();
        let service = doc.add_mapping();
        let mut builder = Builder::new(&mut doc, registry(), service, "web");
        let mut sink: Vec<Diagnostic> = Vec::new();
        for (flag, value) in [
            ("tty", "maybe"),
            ("cpu-shares", "lots"),
            ("cpus", "two"),
            ("health-interval", "soon"),
        ] {
            assert!(
                matches!(
                    builder.apply(flag, value, &mut sink),
                    Err(RecomposeError::InvalidFlagValue { .. })
                ),
                "{flag}={value} should be rejected"
            );
        }
    }

    #[test]
    fn apply_surfaces_micro_parser_errors() {
        let mut doc = Document::new();
        let service = doc.add_mapping();
        let mut builder = Builder::new(&mut doc, registry(), service, "web");
        let mut sink: Vec<Diagnostic> = Vec::new();
        assert!(matches!(
            builder.apply("ulimit", "nofile=1:2:3", &mut sink),
            Err(RecomposeError::UnterminatedComposite { .. })
        ));
        assert!(matches!(
            builder.apply("mount", "type=bind,ro", &mut sink),
            Err(RecomposeError::InvalidCompositeSpec { .. })
        ));
    }

    #[test]
    fn apply_conflicting_existing_node_is_an_error() {
        let mut doc = Document::new();
        let service = doc.add_mapping();
        let text = doc.add_scalar("8080:80");
        let _ = doc.insert(service, "ports", text).expect("insert");
        let mut builder = Builder::new(&mut doc, registry(), service, "web");
        let mut sink: Vec<Diagnostic> = Vec::new();
        assert!(matches!(
            builder.apply("p", "80:80", &mut sink),
            Err(RecomposeError::ConflictingPath { path }) if path == "ports"
        ));
    }

    #[test]
    fn root_and_service_segments_resolve_against_the_document() {
        let mut doc = Document::new();
        let service = doc.add_mapping();
        let descriptor = FlagDescriptor {
            kind: ValueKind::StringList,
            target: "^networks.$service.aliases.$var",
        };
        let mut builder = Builder::new(&mut doc, registry(), service, "web");
        builder.write("alias", descriptor, "a").expect("write");
        builder.write("alias", descriptor, "b").expect("write");
        drop(builder);
        let aliases = doc.lookup_path("networks.web.aliases").expect("aliases");
        assert_eq!(items(&doc, aliases), vec!["a", "b"]);
        assert!(keys(&doc, service).is_empty());
    }

    #[test]
    fn is_duration_follows_go_grammar() {
        for ok in ["1s", "1m30s", "1.5h", "300ms", "10us", "2\u{b5}s", ".5s"] {
            assert!(is_duration(ok), "{ok} should be accepted");
        }
        for bad in ["", "s", "1", "1x", "1s ", "-", "1.s.s"] {
            assert!(!is_duration(bad), "{bad} should be rejected");
        }
    }
}
