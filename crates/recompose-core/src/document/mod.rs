//! Ordered YAML-like document tree stored in an arena.
//!
//! Nodes live in a flat `Vec` and refer to each other by [`NodeId`].
//! Mapping entries keep insertion order, which is the order they are
//! emitted in. Replacing an entry leaves the old subtree unreachable in the
//! arena; the arena is dropped with the document. Tags such as `!reset`
//! are kept beside the tree and written in front of their node.

use std::collections::HashMap;

mod emit;
mod load;

use recompose_common::constants::{COMPOSE_VERSION, SERVICES_KEY, VERSION_KEY};
use recompose_common::error::{RecomposeError, Result};

/// Handle to a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// How a scalar is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalarStyle {
    /// Plain when unambiguous, single-quoted otherwise.
    #[default]
    Plain,
    /// Always single-quoted, unless the text holds control characters.
    SingleQuoted,
    /// Always double-quoted.
    DoubleQuoted,
}

/// A leaf value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar {
    /// Text of the value.
    pub value: String,
    /// Output style.
    pub style: ScalarStyle,
}

/// One node of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Leaf value.
    Scalar(Scalar),
    /// Ordered list of children.
    Sequence(Vec<NodeId>),
    /// Ordered `(key, child)` pairs with unique keys.
    Mapping(Vec<(String, NodeId)>),
}

impl Node {
    /// Short name of the node's structural kind.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
        }
    }
}

/// A compose document: a root mapping holding `version` and `services`.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    tags: HashMap<NodeId, String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty compose document with the pinned version.
    pub fn new() -> Self {
        let mut doc = Self::with_root();
        let version = doc.add_scalar_styled(COMPOSE_VERSION, ScalarStyle::DoubleQuoted);
        let services = doc.add_mapping();
        doc.push_entry(doc.root, VERSION_KEY, version);
        doc.push_entry(doc.root, SERVICES_KEY, services);
        doc
    }

    /// Rebuilds a document from previously rendered YAML.
    ///
    /// Input holding only whitespace or comments produces a fresh document.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not YAML or the top level is not a
    /// mapping with a mapping-valued `services` key.
    pub fn from_yaml(bytes: &[u8]) -> Result<Self> {
        load::from_yaml(bytes)
    }

    fn with_root() -> Self {
        Self {
            nodes: vec![Node::Mapping(Vec::new())],
            root: NodeId(0),
            tags: HashMap::new(),
        }
    }

    /// The root mapping.
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Tag written in front of the node, such as `!reset`.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.tags.get(&id).map(String::as_str)
    }

    fn set_tag(&mut self, id: NodeId, tag: String) {
        let _ = self.tags.insert(id, tag);
    }

    /// Returns the node behind `id`.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Allocates a plain scalar.
    pub fn add_scalar(&mut self, value: impl Into<String>) -> NodeId {
        self.add_scalar_styled(value, ScalarStyle::Plain)
    }

    /// Allocates a scalar with an explicit output style.
    pub fn add_scalar_styled(&mut self, value: impl Into<String>, style: ScalarStyle) -> NodeId {
        self.alloc(Node::Scalar(Scalar {
            value: value.into(),
            style,
        }))
    }

    /// Allocates an empty sequence.
    pub fn add_sequence(&mut self) -> NodeId {
        self.alloc(Node::Sequence(Vec::new()))
    }

    /// Allocates an empty mapping.
    pub fn add_mapping(&mut self) -> NodeId {
        self.alloc(Node::Mapping(Vec::new()))
    }

    /// Looks up `key` in the mapping `map`.
    pub fn get(&self, map: NodeId, key: &str) -> Option<NodeId> {
        match self.node(map) {
            Node::Mapping(entries) => entries
                .iter()
                .find_map(|(k, child)| (k == key).then_some(*child)),
            _ => None,
        }
    }

    /// Sets `key` in the mapping `map`, replacing an existing entry in place
    /// or appending a new one. Returns the replaced child, if any.
    ///
    /// # Errors
    ///
    /// Returns [`RecomposeError::ConflictingPath`] if `map` is not a mapping.
    pub fn insert(&mut self, map: NodeId, key: &str, child: NodeId) -> Result<Option<NodeId>> {
        let Node::Mapping(entries) = self.node_mut(map) else {
            return Err(RecomposeError::ConflictingPath { path: key.into() });
        };
        if let Some(slot) = entries.iter_mut().find(|(k, _)| k == key) {
            let previous = slot.1;
            slot.1 = child;
            return Ok(Some(previous));
        }
        entries.push((key.to_owned(), child));
        Ok(None)
    }

    /// Appends `child` to the sequence `seq`.
    ///
    /// # Errors
    ///
    /// Returns [`RecomposeError::ConflictingPath`] if `seq` is not a sequence.
    pub fn push(&mut self, seq: NodeId, child: NodeId) -> Result<()> {
        let Node::Sequence(items) = self.node_mut(seq) else {
            return Err(RecomposeError::ConflictingPath {
                path: "<sequence>".into(),
            });
        };
        items.push(child);
        Ok(())
    }

    /// Appends an entry to a mapping known to be freshly built.
    fn push_entry(&mut self, map: NodeId, key: &str, child: NodeId) {
        if let Node::Mapping(entries) = self.node_mut(map) {
            entries.push((key.to_owned(), child));
        }
    }

    /// The `services` mapping.
    ///
    /// Every constructor guarantees it exists.
    pub fn services(&self) -> NodeId {
        self.get(self.root, SERVICES_KEY).unwrap_or(self.root)
    }

    /// Names of the services, in document order.
    pub fn service_names(&self) -> Vec<&str> {
        match self.node(self.services()) {
            Node::Mapping(entries) => entries.iter().map(|(k, _)| k.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// Text of the scalar behind `id`, if it is one.
    pub fn scalar_value(&self, id: NodeId) -> Option<&str> {
        match self.node(id) {
            Node::Scalar(scalar) => Some(&scalar.value),
            _ => None,
        }
    }

    /// Follows a dotted path of mapping keys from the root.
    pub fn lookup_path(&self, path: &str) -> Option<NodeId> {
        path.split('.')
            .try_fold(self.root, |node, key| self.get(node, key))
    }

    /// Renders the document as YAML text.
    pub fn to_yaml_string(&self) -> String {
        emit::render(self)
    }
}
