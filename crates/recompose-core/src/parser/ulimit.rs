//! `--ulimit` parsing.
//!
//! Format: `name=soft:hard`, e.g. `nofile=1024:2048`. Both limits are
//! required and may be negative (`memlock=-1:-1`).

use recompose_common::error::{RecomposeError, Result};

use crate::document::{Document, NodeId};

/// A parsed `--ulimit` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ulimit {
    /// Limit name, used as the map key in compose.
    pub name: String,
    /// Soft limit.
    pub soft: i64,
    /// Hard limit.
    pub hard: i64,
}

impl Ulimit {
    /// Parses a `--ulimit` value.
    ///
    /// # Errors
    ///
    /// Returns [`RecomposeError::UnterminatedComposite`] when the value is
    /// not `name=` followed by exactly two colon-separated parts, and
    /// [`RecomposeError::InvalidCompositeSpec`] when the name is empty or a
    /// limit is not an integer.
    pub fn parse(spec: &str) -> Result<Self> {
        let incomplete = || RecomposeError::UnterminatedComposite {
            spec: spec.to_owned(),
            expected: "name=soft:hard",
        };
        let invalid = |message: String| RecomposeError::InvalidCompositeSpec {
            spec: spec.to_owned(),
            message,
        };

        let (name, limits) = spec.split_once('=').ok_or_else(incomplete)?;
        let parts: Vec<&str> = limits.split(':').collect();
        let [soft, hard] = parts.as_slice() else {
            return Err(incomplete());
        };
        if name.is_empty() {
            return Err(invalid("ulimit name is empty".into()));
        }

        let limit = |raw: &str| {
            raw.parse::<i64>()
                .map_err(|_| invalid(format!("limit \"{raw}\" is not an integer")))
        };

        Ok(Self {
            name: name.to_owned(),
            soft: limit(*soft)?,
            hard: limit(*hard)?,
        })
    }

    /// Builds the `{ soft, hard }` mapping for this limit.
    pub fn to_node(&self, doc: &mut Document) -> NodeId {
        let node = doc.add_mapping();
        let soft = doc.add_scalar(self.soft.to_string());
        let hard = doc.add_scalar(self.hard.to_string());
        // `node` is a fresh mapping; insertion cannot conflict.
        let _ = doc.insert(node, "soft", soft);
        let _ = doc.insert(node, "hard", hard);
        node
    }
}
