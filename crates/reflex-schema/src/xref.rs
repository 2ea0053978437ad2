//! Reference identity for schema entities.
//!
//! Every entity acquires a [`UidReference`] when it is constructed. The
//! handle never changes for the lifetime of the entity and is what the
//! renderer uses to cross-link mentions of it. An [`XrefTable`] indexes the
//! handles of a whole model so that collisions are caught and handles can be
//! resolved back to the entity they name.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SchemaError};

/// The kind of entity a reference handle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Metadata,
    Mask,
    BitOrValue,
    Register,
    PayloadMember,
    InputPin,
    OutputPin,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Metadata => write!(f, "metadata"),
            EntityKind::Mask => write!(f, "mask"),
            EntityKind::BitOrValue => write!(f, "bit-or-value"),
            EntityKind::Register => write!(f, "register"),
            EntityKind::PayloadMember => write!(f, "payload-member"),
            EntityKind::InputPin => write!(f, "input-pin"),
            EntityKind::OutputPin => write!(f, "output-pin"),
        }
    }
}

/// A stable, unique reference handle owned by one entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UidReference {
    uid: Uuid,
    kind: EntityKind,
    label: String,
}

impl UidReference {
    /// Acquire a fresh handle for an entity of `kind` named `label`.
    pub fn acquire(kind: EntityKind, label: impl Into<String>) -> Self {
        Self {
            uid: Uuid::new_v4(),
            kind,
            label: label.into(),
        }
    }

    /// Rebuild a handle with a known identifier.
    pub fn with_uid(uid: Uuid, kind: EntityKind, label: impl Into<String>) -> Self {
        Self {
            uid,
            kind,
            label: label.into(),
        }
    }

    pub fn uid(&self) -> Uuid {
        self.uid
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Default display label (the owning entity's name).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Anchor identifier shared by references and pointers.
    pub fn anchor(&self) -> String {
        self.uid.to_string()
    }

    /// Render a hyperlinked mention of the entity.
    pub fn render_reference(&self, label: Option<&str>) -> String {
        let label = label.unwrap_or(&self.label);
        format!("[{label}](#{})", self.anchor())
    }

    /// Render the raw locator token the references point at.
    pub fn render_pointer(&self, label: Option<&str>) -> String {
        let label = label.unwrap_or(&self.label);
        format!("<a id=\"{}\">{label}</a>", self.anchor())
    }
}

impl fmt::Display for UidReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uid)
    }
}

/// What an [`XrefTable`] remembers about a handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XrefEntry {
    pub kind: EntityKind,
    pub name: String,
}

/// Index of every reference handle in a model.
#[derive(Debug, Clone, Default)]
pub struct XrefTable {
    entries: BTreeMap<Uuid, XrefEntry>,
    order: Vec<Uuid>,
}

impl XrefTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a handle.
    ///
    /// Recording the same handle for the same entity again is a no-op; a
    /// different entity under an existing identifier is a collision.
    pub fn insert(&mut self, reference: &UidReference) -> Result<()> {
        let entry = XrefEntry {
            kind: reference.kind(),
            name: reference.label().to_string(),
        };
        match self.entries.get(&reference.uid()) {
            Some(existing) if *existing == entry => Ok(()),
            Some(_) => Err(SchemaError::DuplicateReference {
                uid: reference.uid(),
            }),
            None => {
                self.entries.insert(reference.uid(), entry);
                self.order.push(reference.uid());
                Ok(())
            }
        }
    }

    pub fn get(&self, uid: &Uuid) -> Option<&XrefEntry> {
        self.entries.get(uid)
    }

    pub fn contains(&self, uid: &Uuid) -> bool {
        self.entries.contains_key(uid)
    }

    /// Handles of a given kind and name, in insertion order.
    pub fn find(&self, kind: EntityKind, name: &str) -> Vec<Uuid> {
        self.iter()
            .filter(|(_, entry)| entry.kind == kind && entry.name == name)
            .map(|(uid, _)| uid)
            .collect()
    }

    /// All handles in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Uuid, &XrefEntry)> {
        self.order.iter().map(|uid| (*uid, &self.entries[uid]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
