//! Block-style YAML rendering with four-space indentation.
//!
//! Mapping keys come out in insertion order. Sequence items sit one level
//! deeper than their key, and a mapping inside a sequence item starts on
//! the dash line with its remaining keys aligned under the first. A tagged
//! collection starts on the line after its tag instead.

use std::fmt::Write;

use super::{Document, Node, NodeId, Scalar, ScalarStyle};

const INDENT: usize = 4;

/// Width of the `- ` marker in front of a sequence item.
const DASH: usize = 2;

pub(super) fn render(doc: &Document) -> String {
    let mut emitter = Emitter {
        doc,
        out: String::new(),
    };
    match doc.node(doc.root()) {
        Node::Mapping(entries) if !entries.is_empty() => emitter.mapping(entries, 0, false),
        _ => emitter.out.push_str("{}\n"),
    }
    emitter.out
}

struct Emitter<'a> {
    doc: &'a Document,
    out: String,
}

impl Emitter<'_> {
    fn pad(&mut self, indent: usize) {
        self.out.extend(std::iter::repeat_n(' ', indent));
    }

    fn mapping(&mut self, entries: &[(String, NodeId)], indent: usize, inline_first: bool) {
        for (i, (key, child)) in entries.iter().enumerate() {
            if i > 0 || !inline_first {
                self.pad(indent);
            }
            write_plain_or_quoted(&mut self.out, key);
            self.out.push(':');
            self.after_key(*child, indent);
        }
    }

    fn sequence(&mut self, items: &[NodeId], indent: usize, inline_first: bool) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 || !inline_first {
                self.pad(indent);
            }
            self.out.push_str("- ");
            self.item(*item, indent + DASH);
        }
    }

    fn after_key(&mut self, id: NodeId, indent: usize) {
        let doc = self.doc;
        if let Some(tag) = doc.tag(id) {
            self.out.push(' ');
            self.out.push_str(tag);
        }
        match doc.node(id) {
            Node::Scalar(scalar) => {
                self.out.push(' ');
                write_scalar(&mut self.out, scalar);
                self.out.push('\n');
            }
            Node::Sequence(items) if items.is_empty() => self.out.push_str(" []\n"),
            Node::Mapping(entries) if entries.is_empty() => self.out.push_str(" {}\n"),
            Node::Sequence(items) => {
                self.out.push('\n');
                self.sequence(items, indent + INDENT, false);
            }
            Node::Mapping(entries) => {
                self.out.push('\n');
                self.mapping(entries, indent + INDENT, false);
            }
        }
    }

    fn item(&mut self, id: NodeId, column: usize) {
        let doc = self.doc;
        let tagged = match doc.tag(id) {
            Some(tag) => {
                self.out.push_str(tag);
                true
            }
            None => false,
        };
        let gap = if tagged { " " } else { "" };

        match doc.node(id) {
            Node::Scalar(scalar) => {
                self.out.push_str(gap);
                write_scalar(&mut self.out, scalar);
                self.out.push('\n');
            }
            Node::Sequence(items) if items.is_empty() => {
                self.out.push_str(gap);
                self.out.push_str("[]\n");
            }
            Node::Mapping(entries) if entries.is_empty() => {
                self.out.push_str(gap);
                self.out.push_str("{}\n");
            }
            Node::Sequence(items) => {
                if tagged {
                    self.out.push('\n');
                }
                self.sequence(items, column, !tagged);
            }
            Node::Mapping(entries) => {
                if tagged {
                    self.out.push('\n');
                }
                self.mapping(entries, column, !tagged);
            }
        }
    }
}

fn write_scalar(out: &mut String, scalar: &Scalar) {
    match scalar.style {
        ScalarStyle::Plain => write_plain_or_quoted(out, &scalar.value),
        ScalarStyle::SingleQuoted if !scalar.value.chars().any(char::is_control) => {
            write_single_quoted(out, &scalar.value);
        }
        ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted => {
            write_double_quoted(out, &scalar.value);
        }
    }
}

fn write_plain_or_quoted(out: &mut String, value: &str) {
    if value.is_empty() || value.chars().any(char::is_control) {
        write_double_quoted(out, value);
    } else if needs_quotes(value) {
        write_single_quoted(out, value);
    } else {
        out.push_str(value);
    }
}

/// Returns `true` if `value` cannot be written as a plain scalar without
/// being read back differently.
fn needs_quotes(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return true;
    };
    let second = chars.next();

    if first.is_whitespace() || value.ends_with(char::is_whitespace) {
        return true;
    }
    if "!&*{}[]|>'\"%@`,#".contains(first) {
        return true;
    }
    if "-?:".contains(first) && second.is_none_or(char::is_whitespace) {
        return true;
    }
    value.contains(": ") || value.contains(" #") || value.ends_with(':')
}

fn write_single_quoted(out: &mut String, value: &str) {
    out.push('\'');
    out.push_str(&value.replace('\'', "''"));
    out.push('\'');
}

fn write_double_quoted(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(value: &str) -> String {
        let mut out = String::new();
        write_plain_or_quoted(&mut out, value);
        out
    }

    #[test]
    fn plain_scalars_stay_plain() {
        assert_eq!(plain("alpine"), "alpine");
        assert_eq!(plain("8080:80"), "8080:80");
        assert_eq!(plain("-c"), "-c");
        assert_eq!(plain("-1"), "-1");
        assert_eq!(plain("udp://"), "udp://");
        assert_eq!(plain("true"), "true");
        assert_eq!(plain("/tmp:/tmp:ro"), "/tmp:/tmp:ro");
    }

    #[test]
    fn ambiguous_scalars_are_single_quoted() {
        assert_eq!(plain("{{.Name}}/{{.ID}}"), "'{{.Name}}/{{.ID}}'");
        assert_eq!(plain("-"), "'-'");
        assert_eq!(plain("a: b"), "'a: b'");
        assert_eq!(plain("it's #1"), "'it''s #1'");
        assert_eq!(plain(" padded"), "' padded'");
        assert_eq!(plain("*ref"), "'*ref'");
    }

    #[test]
    fn empty_and_control_characters_are_double_quoted() {
        assert_eq!(plain(""), "\"\"");
        assert_eq!(plain("a\nb"), "\"a\\nb\"");
        assert_eq!(plain("bell\u{7}"), "\"bell\\u0007\"");
    }

    #[test]
    fn render_nested_structures() {
        let mut doc = Document::new();
        let services = doc.services();
        let svc = doc.add_mapping();
        let _ = doc.insert(services, "web", svc).expect("insert");

        let ports = doc.add_sequence();
        let port = doc.add_scalar("80:80");
        doc.push(ports, port).expect("push");
        let _ = doc.insert(svc, "ports", ports).expect("insert");

        let volumes = doc.add_sequence();
        let mount = doc.add_mapping();
        let kind = doc.add_scalar("bind");
        let source = doc.add_scalar("/tmp");
        let bind = doc.add_mapping();
        let propagation = doc.add_scalar("rprivate");
        let _ = doc.insert(mount, "type", kind).expect("insert");
        let _ = doc.insert(mount, "source", source).expect("insert");
        let _ = doc.insert(bind, "propagation", propagation).expect("insert");
        let _ = doc.insert(mount, "bind", bind).expect("insert");
        doc.push(volumes, mount).expect("push");
        let _ = doc.insert(svc, "volumes", volumes).expect("insert");

        let empty = doc.add_sequence();
        let _ = doc.insert(svc, "dns", empty).expect("insert");

        let expected = r#"version: "3.8"
services:
    web:
        ports:
            - 80:80
        volumes:
            - type: bind
              source: /tmp
              bind:
                  propagation: rprivate
        dns: []
"#;
        assert_eq!(doc.to_yaml_string(), expected);
    }

    #[test]
    fn render_tags_in_front_of_nodes() {
        let mut doc = Document::new();
        let services = doc.services();
        let svc = doc.add_mapping();
        let _ = doc.insert(services, "web", svc).expect("insert");

        let ports = doc.add_sequence();
        doc.set_tag(ports, "!reset".into());
        let _ = doc.insert(svc, "ports", ports).expect("insert");

        let env = doc.add_mapping();
        let value = doc.add_scalar_styled("x y", ScalarStyle::SingleQuoted);
        let _ = doc.insert(env, "A", value).expect("insert");
        doc.set_tag(env, "!override".into());
        let _ = doc.insert(svc, "environment", env).expect("insert");

        let volumes = doc.add_sequence();
        let mount = doc.add_mapping();
        let target = doc.add_scalar("/data");
        let _ = doc.insert(mount, "target", target).expect("insert");
        doc.set_tag(mount, "!override".into());
        doc.push(volumes, mount).expect("push");
        let text = doc.add_scalar("1");
        doc.set_tag(text, "!!str".into());
        doc.push(volumes, text).expect("push");
        let _ = doc.insert(svc, "volumes", volumes).expect("insert");

        let expected = r#"version: "3.8"
services:
    web:
        ports: !reset []
        environment: !override
            A: 'x y'
        volumes:
            - !override
              target: /data
            - !!str 1
"#;
        assert_eq!(doc.to_yaml_string(), expected);
    }

    #[test]
    fn single_quoted_style_falls_back_for_control_characters() {
        let mut out = String::new();
        write_scalar(
            &mut out,
            &Scalar {
                value: "a\nb".into(),
                style: ScalarStyle::SingleQuoted,
            },
        );
        assert_eq!(out, "\"a\\nb\"");
    }

    #[test]
    fn render_empty_services() {
        assert_eq!(
            Document::new().to_yaml_string(),
            "version: \"3.8\"\nservices: {}\n"
        );
    }
}
