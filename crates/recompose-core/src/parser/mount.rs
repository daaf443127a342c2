//! `--mount` specification parsing.
//!
//! Format: comma-separated `key=value` clauses, e.g.
//! `type=bind,source=/tmp,target=/tmp,readonly`. Keys are looked up in a
//! fixed field table; unknown keys are rejected.

use recompose_common::error::{RecomposeError, Result};

use crate::document::{Document, NodeId};
use crate::parser::parse_bool;

/// Destination of a mount clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Type,
    Source,
    Target,
    ReadOnly,
    Consistency,
    BindPropagation,
    BindCreateHostPath,
    BindSelinux,
    VolumeNoCopy,
    TmpfsSize,
    TmpfsMode,
}

/// `(input key, accepted aliases, field)`.
const FIELDS: &[(&str, &[&str], Field)] = &[
    ("type", &[], Field::Type),
    ("source", &["src"], Field::Source),
    ("target", &["destination", "dst"], Field::Target),
    ("readonly", &[], Field::ReadOnly),
    ("consistency", &[], Field::Consistency),
    ("bind-propagation", &[], Field::BindPropagation),
    ("bind-create-host-path", &[], Field::BindCreateHostPath),
    ("bind-selinux", &[], Field::BindSelinux),
    ("volume-nocopy", &[], Field::VolumeNoCopy),
    ("tmpfs-size", &[], Field::TmpfsSize),
    ("tmpfs-mode", &[], Field::TmpfsMode),
];

fn field_for(key: &str) -> Option<Field> {
    FIELDS
        .iter()
        .find(|(name, aliases, _)| *name == key || aliases.contains(&key))
        .map(|&(_, _, field)| field)
}

/// Bind-specific mount options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindOptions {
    /// Mount propagation mode (`rprivate`, `shared`, ...).
    pub propagation: Option<String>,
    /// Create the host path if it does not exist.
    pub create_host_path: Option<bool>,
    /// SELinux relabeling (`z` or `Z`).
    pub selinux: Option<String>,
}

/// Volume-specific mount options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeOptions {
    /// Disable copying data from the container path on creation.
    pub nocopy: Option<bool>,
}

/// Tmpfs-specific mount options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TmpfsOptions {
    /// Size of the tmpfs mount.
    pub size: Option<String>,
    /// File mode of the tmpfs mount.
    pub mode: Option<String>,
}

/// A parsed `--mount` value. Absent fields are left out of the output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountSpec {
    /// Mount type (`bind`, `volume`, `tmpfs`, ...).
    pub kind: Option<String>,
    /// Host path or volume name.
    pub source: Option<String>,
    /// Path inside the container.
    pub target: Option<String>,
    /// Mount read-only.
    pub read_only: Option<bool>,
    /// Consistency requirement (`consistent`, `cached`, `delegated`).
    pub consistency: Option<String>,
    /// Bind options.
    pub bind: BindOptions,
    /// Volume options.
    pub volume: VolumeOptions,
    /// Tmpfs options.
    pub tmpfs: TmpfsOptions,
}

impl MountSpec {
    /// Parses a `--mount` value.
    ///
    /// Empty clauses, such as the one left by a trailing comma, are skipped.
    /// A clause without `=` is only valid as the bare `readonly` keyword.
    ///
    /// # Errors
    ///
    /// Returns [`RecomposeError::InvalidCompositeSpec`] for an empty
    /// specification, an unknown key, a bare clause other than `readonly`, or
    /// a non-boolean value for a boolean option.
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = |message: String| RecomposeError::InvalidCompositeSpec {
            spec: spec.to_owned(),
            message,
        };

        let mut mount = Self::default();
        let mut seen_clause = false;

        for clause in spec.split(',').filter(|clause| !clause.is_empty()) {
            seen_clause = true;
            let Some((key, value)) = clause.split_once('=') else {
                if clause == "readonly" {
                    mount.read_only = Some(true);
                    continue;
                }
                return Err(invalid(format!("option \"{clause}\" requires a value")));
            };

            let field =
                field_for(key).ok_or_else(|| invalid(format!("unknown mount option \"{key}\"")))?;
            let flag = || {
                parse_bool(value)
                    .ok_or_else(|| invalid(format!("option \"{key}\" expects a boolean")))
            };
            let text = || Some(value.to_owned());

            match field {
                Field::Type => mount.kind = text(),
                Field::Source => mount.source = text(),
                Field::Target => mount.target = text(),
                Field::ReadOnly => mount.read_only = Some(flag()?),
                Field::Consistency => mount.consistency = text(),
                Field::BindPropagation => mount.bind.propagation = text(),
                Field::BindCreateHostPath => mount.bind.create_host_path = Some(flag()?),
                Field::BindSelinux => mount.bind.selinux = text(),
                Field::VolumeNoCopy => mount.volume.nocopy = Some(flag()?),
                Field::TmpfsSize => mount.tmpfs.size = text(),
                Field::TmpfsMode => mount.tmpfs.mode = text(),
            }
        }

        if !seen_clause {
            return Err(invalid("no mount options given".into()));
        }
        Ok(mount)
    }

    /// Builds the compose long-syntax volume entry for this mount.
    pub fn to_node(&self, doc: &mut Document) -> NodeId {
        let node = doc.add_mapping();
        put_text(doc, node, "type", self.kind.as_deref());
        put_text(doc, node, "source", self.source.as_deref());
        put_text(doc, node, "target", self.target.as_deref());
        put_bool(doc, node, "readonly", self.read_only);
        put_text(doc, node, "consistency", self.consistency.as_deref());

        if self.bind != BindOptions::default() {
            let bind = doc.add_mapping();
            put_text(doc, bind, "propagation", self.bind.propagation.as_deref());
            put_bool(doc, bind, "create_host_path", self.bind.create_host_path);
            put_text(doc, bind, "selinux", self.bind.selinux.as_deref());
            put_child(doc, node, "bind", bind);
        }
        if self.volume != VolumeOptions::default() {
            let volume = doc.add_mapping();
            put_bool(doc, volume, "nocopy", self.volume.nocopy);
            put_child(doc, node, "volume", volume);
        }
        if self.tmpfs != TmpfsOptions::default() {
            let tmpfs = doc.add_mapping();
            put_text(doc, tmpfs, "size", self.tmpfs.size.as_deref());
            put_text(doc, tmpfs, "mode", self.tmpfs.mode.as_deref());
            put_child(doc, node, "tmpfs", tmpfs);
        }
        node
    }
}

fn put_child(doc: &mut Document, map: NodeId, key: &str, child: NodeId) {
    // `map` was allocated as a mapping just above; insertion cannot conflict.
    let _ = doc.insert(map, key, child);
}

fn put_text(doc: &mut Document, map: NodeId, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        let child = doc.add_scalar(value);
        put_child(doc, map, key, child);
    }
}

fn put_bool(doc: &mut Document, map: NodeId, key: &str, value: Option<bool>) {
    if let Some(value) = value {
        let child = doc.add_scalar(value.to_string());
        put_child(doc, map, key, child);
    }
}
