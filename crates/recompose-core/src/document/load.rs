//! Rebuilding a [`Document`] from existing compose YAML.
//!
//! The input is read as parser events rather than resolved values, so every
//! scalar keeps the text and quoting it was written with (`0x10` stays
//! `0x10`) and tags such as `!reset` stay on their node. Aliases are
//! expanded into copies of the anchored node.

use std::collections::HashMap;
use std::vec::IntoIter;

use recompose_common::constants::{SERVICES_KEY, VERSION_KEY};
use recompose_common::error::{RecomposeError, Result};
use yaml_rust2::parser::{Event, EventReceiver, Parser, Tag};
use yaml_rust2::scanner::TScalarStyle;

use super::{Document, Node, NodeId, ScalarStyle};

/// Plain scalars that read back as null.
const NULL_LITERALS: &[&str] = &["null", "Null", "NULL", "~"];

/// Collects parser events so the tree can be built with `?` propagation.
#[derive(Default)]
struct EventLog(Vec<Event>);

impl EventReceiver for EventLog {
    fn on_event(&mut self, ev: Event) {
        self.0.push(ev);
    }
}

pub(super) fn from_yaml(bytes: &[u8]) -> Result<Document> {
    let text = std::str::from_utf8(bytes).map_err(|err| invalid(format!("not UTF-8: {err}")))?;

    let mut log = EventLog::default();
    Parser::new(text.chars()).load(&mut log, false)?;

    Loader {
        events: log.0.into_iter(),
        doc: Document::with_root(),
        anchors: HashMap::new(),
    }
    .document()
}

fn invalid(message: impl Into<String>) -> RecomposeError {
    RecomposeError::InvalidDocument {
        message: message.into(),
    }
}

struct Loader {
    events: IntoIter<Event>,
    doc: Document,
    anchors: HashMap<usize, NodeId>,
}

impl Loader {
    fn next_event(&mut self) -> Result<Event> {
        self.events
            .next()
            .ok_or_else(|| invalid("unexpected end of document"))
    }

    fn document(mut self) -> Result<Document> {
        let first = loop {
            match self.next_event()? {
                Event::StreamStart | Event::DocumentStart | Event::Nothing => {}
                event => break event,
            }
        };

        match first {
            // Whitespace or comments only.
            Event::StreamEnd => return Ok(Document::new()),
            Event::MappingStart(..) => {}
            _ => return Err(invalid("top level is not a mapping")),
        }

        let root = self.doc.root();
        while let Some(key) = self.key()? {
            let mut id = self.node()?;
            if key == VERSION_KEY {
                self.quote_version(id);
            } else if key == SERVICES_KEY {
                id = self.services(id)?;
            }
            self.doc.push_entry(root, &key, id);
        }

        if self.doc.get(root, SERVICES_KEY).is_none() {
            let services = self.doc.add_mapping();
            self.doc.push_entry(root, SERVICES_KEY, services);
        }
        Ok(self.doc)
    }

    /// Reads the next mapping key, or `None` at the end of the mapping.
    fn key(&mut self) -> Result<Option<String>> {
        match self.next_event()? {
            Event::MappingEnd => Ok(None),
            Event::Scalar(value, ..) => Ok(Some(value)),
            Event::Alias(anchor) => {
                let id = self.anchored(anchor)?;
                self.doc
                    .scalar_value(id)
                    .map(|value| Some(value.to_owned()))
                    .ok_or_else(|| invalid("mapping keys must be scalars"))
            }
            _ => Err(invalid("mapping keys must be scalars")),
        }
    }

    fn node(&mut self) -> Result<NodeId> {
        let event = self.next_event()?;
        self.node_from(event)
    }

    fn node_from(&mut self, event: Event) -> Result<NodeId> {
        let (id, anchor) = match event {
            Event::Scalar(value, style, anchor, tag) => {
                let id = self.scalar(value, style);
                self.tag(id, tag.as_ref());
                (id, anchor)
            }
            Event::SequenceStart(anchor, tag) => {
                let mut items = Vec::new();
                loop {
                    match self.next_event()? {
                        Event::SequenceEnd => break,
                        event => items.push(self.node_from(event)?),
                    }
                }
                let id = self.doc.alloc(Node::Sequence(items));
                self.tag(id, tag.as_ref());
                (id, anchor)
            }
            Event::MappingStart(anchor, tag) => {
                let mut entries = Vec::new();
                while let Some(key) = self.key()? {
                    entries.push((key, self.node()?));
                }
                let id = self.doc.alloc(Node::Mapping(entries));
                self.tag(id, tag.as_ref());
                (id, anchor)
            }
            Event::Alias(anchor) => {
                let source = self.anchored(anchor)?;
                return Ok(copy_subtree(&mut self.doc, source));
            }
            _ => return Err(invalid("unexpected YAML structure")),
        };

        if anchor != 0 {
            let _ = self.anchors.insert(anchor, id);
        }
        Ok(id)
    }

    fn scalar(&mut self, value: String, style: TScalarStyle) -> NodeId {
        match style {
            // `key:` with nothing after it.
            TScalarStyle::Plain if value.is_empty() => self.doc.add_scalar("null"),
            TScalarStyle::Plain => self.doc.add_scalar(value),
            TScalarStyle::SingleQuoted => {
                self.doc.add_scalar_styled(value, ScalarStyle::SingleQuoted)
            }
            _ => self.doc.add_scalar_styled(value, ScalarStyle::DoubleQuoted),
        }
    }

    fn tag(&mut self, id: NodeId, tag: Option<&Tag>) {
        if let Some(tag) = tag {
            self.doc.set_tag(id, tag_text(tag));
        }
    }

    fn anchored(&self, anchor: usize) -> Result<NodeId> {
        self.anchors
            .get(&anchor)
            .copied()
            .ok_or_else(|| invalid("alias refers to an unknown anchor"))
    }

    /// The version is always rendered quoted, even if it was written plain.
    fn quote_version(&mut self, id: NodeId) {
        match self.doc.node_mut(id) {
            Node::Scalar(scalar) if scalar.style == ScalarStyle::Plain => {
                scalar.style = ScalarStyle::DoubleQuoted;
            }
            _ => {}
        }
    }

    fn services(&mut self, id: NodeId) -> Result<NodeId> {
        let is_null = match self.doc.node(id) {
            Node::Mapping(_) => return Ok(id),
            Node::Scalar(scalar) => {
                scalar.style == ScalarStyle::Plain && NULL_LITERALS.contains(&scalar.value.as_str())
            }
            Node::Sequence(_) => false,
        };
        if is_null {
            Ok(self.doc.add_mapping())
        } else {
            Err(invalid("\"services\" is not a mapping"))
        }
    }
}

/// Writes a tag the way it is spelled in a document.
fn tag_text(tag: &Tag) -> String {
    match tag.handle.as_str() {
        "!" => format!("!{}", tag.suffix),
        "!!" | "tag:yaml.org,2002:" => format!("!!{}", tag.suffix),
        "" => format!("!<{}>", tag.suffix),
        handle => format!("!<{handle}{}>", tag.suffix),
    }
}

fn copy_subtree(doc: &mut Document, id: NodeId) -> NodeId {
    let node = match doc.node(id).clone() {
        Node::Scalar(scalar) => Node::Scalar(scalar),
        Node::Sequence(items) => Node::Sequence(
            items
                .into_iter()
                .map(|item| copy_subtree(doc, item))
                .collect(),
        ),
        Node::Mapping(entries) => Node::Mapping(
            entries
                .into_iter()
                .map(|(key, child)| (key, copy_subtree(doc, child)))
                .collect(),
        ),
    };
    let tag = doc.tag(id).map(str::to_owned);
    let copy = doc.alloc(node);
    if let Some(tag) = tag {
        doc.set_tag(copy, tag);
    }
    copy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(input: &str) -> String {
        from_yaml(input.as_bytes())
            .expect("should load")
            .to_yaml_string()
    }

    #[test]
    fn empty_bytes_start_a_fresh_document() {
        let doc = from_yaml(b"  \n").expect("should load");
        assert_eq!(doc.to_yaml_string(), Document::new().to_yaml_string());
    }

    #[test]
    fn comment_only_input_starts_a_fresh_document() {
        let doc = from_yaml(b"# nothing yet\n").expect("should load");
        assert_eq!(doc.to_yaml_string(), Document::new().to_yaml_string());
    }

    #[test]
    fn load_preserves_key_order() {
        let input = b"version: \"3.8\"\nservices:\n  web:\n    image: nginx\n  db:\n    image: postgres\n";
        let doc = from_yaml(input).expect("should load");
        assert_eq!(doc.service_names(), vec!["web", "db"]);
    }

    #[test]
    fn load_keeps_scalar_text_and_quoting() {
        let input = r#"version: "3.8"
services:
    web:
        environment:
            HEX: 0x10
            EXP: 1e3
            OCT: 0o17
            FRACTION: .5
            YES: True
            PORT: "5432"
            QUOTED: 'x y'
            STAR: '*ref'
            EMPTY:
"#;
        let expected = input.replace("EMPTY:\n", "EMPTY: null\n");
        assert_eq!(round_trip(input), expected);
    }

    #[test]
    fn load_keeps_tags() {
        let input = r#"services:
    web:
        ports: !reset []
        environment: !override
            A: "1"
        volumes:
            - !override
              target: /data
        user: !!str 1000
"#;
        assert_eq!(round_trip(input), input);
    }

    #[test]
    fn load_quotes_plain_version() {
        assert_eq!(
            round_trip("version: 3.8\nservices: {}\n"),
            "version: \"3.8\"\nservices: {}\n"
        );
    }

    #[test]
    fn load_block_scalars_become_double_quoted() {
        let input = "services:\n    web:\n        entrypoint: |\n            echo hi\n";
        assert_eq!(
            round_trip(input),
            "services:\n    web:\n        entrypoint: \"echo hi\\n\"\n"
        );
    }

    #[test]
    fn load_expands_aliases() {
        let input = "x-base: &base\n    image: nginx\nservices:\n    web: *base\n";
        let doc = from_yaml(input.as_bytes()).expect("should load");
        let image = doc.lookup_path("services.web.image").expect("image");
        assert_eq!(doc.scalar_value(image), Some("nginx"));
        assert_ne!(
            doc.lookup_path("services.web"),
            doc.lookup_path("x-base"),
            "alias should be a copy"
        );
    }

    #[test]
    fn load_adds_missing_services() {
        let doc = from_yaml(b"networks:\n  front: {}\n").expect("should load");
        assert!(doc.get(doc.root(), "services").is_some());
        assert!(doc.service_names().is_empty());
    }

    #[test]
    fn load_accepts_null_services() {
        let doc = from_yaml(b"services:\n").expect("should load");
        assert!(doc.service_names().is_empty());
        let doc = from_yaml(b"services: ~\n").expect("should load");
        assert!(doc.service_names().is_empty());
    }

    #[test]
    fn load_rejects_non_mapping_top_level() {
        let result = from_yaml(b"- a\n- b\n");
        assert!(matches!(result, Err(RecomposeError::InvalidDocument { .. })));
    }

    #[test]
    fn load_rejects_sequence_services() {
        let result = from_yaml(b"services:\n  - web\n");
        assert!(matches!(result, Err(RecomposeError::InvalidDocument { .. })));
    }

    #[test]
    fn load_rejects_quoted_null_services() {
        let result = from_yaml(b"services: \"null\"\n");
        assert!(matches!(result, Err(RecomposeError::InvalidDocument { .. })));
    }

    #[test]
    fn load_rejects_malformed_yaml() {
        let result = from_yaml(b"services: [unclosed\n");
        assert!(matches!(result, Err(RecomposeError::Yaml { .. })));
    }

    #[test]
    fn load_rejects_invalid_utf8() {
        let result = from_yaml(b"services:\n  \xff: {}\n");
        assert!(matches!(result, Err(RecomposeError::InvalidDocument { .. })));
    }
}
