//! The schema descriptor tree.
//!
//! Registration turns declarations into this tree: one [`RootInfo`] per root,
//! groups and maps as interior [`Node`]s, and leaves as [`LeafDescriptor`]s
//! stored once in the definition and referenced by [`LeafId`]. The pattern
//! index maps dotted patterns to the same ids.

use serde::{Deserialize, Serialize};

use crate::types::{ConfigPhase, ValueType};
use crate::value::Value;

/// Index of a leaf in its [`ConfigDefinition`](crate::ConfigDefinition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeafId(pub(crate) usize);

/// Index of a map-entry template in its definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub(crate) usize);

/// Conversion rule of a leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeafKind {
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Object(ValueType),
    ObjectList(ValueType),
    OptionalObject(ValueType),
}

/// One step from a root group down to a leaf's slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// Descend into the group attribute with this identifier.
    Field(String),
    /// Descend into the map entry keyed by the name segment at `segment`
    /// (counted after the namespace), creating it from `entry` if missing.
    MapKey { segment: usize, entry: EntryId },
}

#[derive(Debug, Clone)]
pub struct LeafDescriptor {
    /// Attribute identifier; empty for leaves that are map values.
    pub ident: String,
    /// Dotted pattern relative to the namespace, e.g. `server.regions.{*}.label`.
    pub pattern: String,
    pub kind: LeafKind,
    /// Canonical default string.
    pub default: String,
    /// `default` converted once at registration.
    pub default_value: Value,
    pub doc: Option<String>,
    pub runtime_overridable: bool,
    /// Containing name of the owning root.
    pub root: String,
    pub path: Vec<PathStep>,
}

impl LeafDescriptor {
    pub fn has_wildcard(&self) -> bool {
        self.path.iter().any(|step| matches!(step, PathStep::MapKey { .. }))
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Group(GroupNode),
    Map(MapNode),
    Leaf(LeafId),
}

#[derive(Debug, Clone)]
pub struct GroupNode {
    pub type_name: String,
    /// Attributes in declaration order, keyed by identifier.
    pub fields: Vec<(String, Node)>,
}

#[derive(Debug, Clone)]
pub struct MapNode {
    pub value: Box<Node>,
}

/// A registered root.
#[derive(Debug, Clone)]
pub struct RootInfo {
    pub type_name: String,
    pub containing_name: String,
    /// External dotted-key prefix.
    pub root_name: String,
    pub phase: ConfigPhase,
    pub group: GroupNode,
}
