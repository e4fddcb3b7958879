//! The configuration definition: descriptor tree plus pattern index.
//!
//! A definition is created empty, populated through
//! [`register_root`](ConfigDefinition::register_root), and read-only from then
//! on. It is a pure container of roots; it has no leaf values of its own and
//! offers no operation that would accept one.

use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use rustc_hash::FxHasher;

use crate::convert;
use crate::descriptor::{EntryId, LeafDescriptor, LeafId, Node, RootInfo};
use crate::error::BindError;
use crate::name::NameIterator;
use crate::pattern::PatternMap;
use crate::value::{Group, Value};

#[derive(Debug, Default)]
pub struct ConfigDefinition {
    pub(crate) roots: IndexMap<String, RootInfo>,
    pub(crate) leaves: Vec<LeafDescriptor>,
    pub(crate) entries: Vec<Value>,
    pub(crate) leaf_patterns: PatternMap<LeafId>,
}

impl ConfigDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered roots in registration order.
    pub fn roots(&self) -> impl Iterator<Item = &RootInfo> {
        self.roots.values()
    }

    pub fn root(&self, containing_name: &str) -> Option<&RootInfo> {
        self.roots.get(containing_name)
    }

    pub fn root_by_type(&self, type_name: &str) -> Option<&RootInfo> {
        self.roots.values().find(|r| r.type_name == type_name)
    }

    pub fn leaf(&self, id: LeafId) -> &LeafDescriptor {
        &self.leaves[id.0]
    }

    pub fn leaves(&self) -> impl Iterator<Item = (LeafId, &LeafDescriptor)> {
        self.leaves.iter().enumerate().map(|(i, l)| (LeafId(i), l))
    }

    pub fn leaf_patterns(&self) -> &PatternMap<LeafId> {
        &self.leaf_patterns
    }

    /// Match the remaining segments of `name` (namespace already consumed).
    pub fn match_leaf(&self, name: &NameIterator<'_>) -> Option<(LeafId, &LeafDescriptor)> {
        self.leaf_patterns
            .match_name(name)
            .map(|&id| (id, self.leaf(id)))
    }

    pub(crate) fn entry(&self, id: EntryId) -> &Value {
        &self.entries[id.0]
    }

    /// Walk the whole pattern index and convert every leaf's default once
    /// more, returning how many leaves were checked.
    ///
    /// Registration already converts defaults; this re-checks the index as a
    /// whole, so a definition assembled from several crates can be verified in
    /// one pass before it is compiled or shipped.
    pub fn preload_defaults(&self) -> Result<usize, BindError> {
        fn walk(
            definition: &ConfigDefinition,
            map: &PatternMap<LeafId>,
            count: &mut usize,
        ) -> Result<(), BindError> {
            if let Some(&id) = map.matched() {
                let leaf = definition.leaf(id);
                convert::convert(&leaf.kind, &leaf.default).map_err(|reason| {
                    BindError::InvalidDefault {
                        key: leaf.pattern.clone(),
                        reason,
                    }
                })?;
                *count += 1;
            }
            for name in map.child_names() {
                if let Some(child) = map.child(name) {
                    walk(definition, child, count)?;
                }
            }
            Ok(())
        }

        let mut count = 0;
        walk(self, &self.leaf_patterns, &mut count)?;
        Ok(count)
    }

    /// Default-initialized value of a descriptor node. Maps start empty.
    pub fn default_value(&self, node: &Node) -> Value {
        match node {
            Node::Group(group) => Value::Group(self.default_group(group)),
            Node::Map(_) => Value::Map(Default::default()),
            Node::Leaf(id) => self.leaf(*id).default_value.clone(),
        }
    }

    pub(crate) fn default_group(&self, node: &crate::descriptor::GroupNode) -> Group {
        let mut group = Group::new(&node.type_name);
        for (ident, child) in &node.fields {
            group.accept(ident, self.default_value(child));
        }
        group
    }

    /// Stable hash of everything that shapes materialization: roots, their
    /// phases, and each leaf's pattern, kind, default and path.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        for root in self.roots.values() {
            root.containing_name.hash(&mut hasher);
            root.root_name.hash(&mut hasher);
            root.type_name.hash(&mut hasher);
            root.phase.hash(&mut hasher);
        }
        for leaf in &self.leaves {
            leaf.pattern.hash(&mut hasher);
            leaf.kind.hash(&mut hasher);
            leaf.default.hash(&mut hasher);
            leaf.runtime_overridable.hash(&mut hasher);
            leaf.path.hash(&mut hasher);
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{file_root, server_root};

    fn definition() -> ConfigDefinition {
        let mut def = ConfigDefinition::new();
        def.register_root(server_root()).unwrap();
        def.register_root(file_root()).unwrap();
        def
    }

    #[test]
    fn roots_in_registration_order() {
        let def = definition();
        let names: Vec<&str> = def.roots().map(|r| r.containing_name.as_str()).collect();
        assert_eq!(names, vec!["server", "file"]);
        assert_eq!(def.root_by_type("FileConfig").unwrap().root_name, "log.file");
        assert!(def.root("missing").is_none());
    }

    #[test]
    fn match_leaf_by_name() {
        let def = definition();
        let mut name = NameIterator::new("app.server.threads");
        name.next();
        let (_, leaf) = def.match_leaf(&name).unwrap();
        assert_eq!(leaf.pattern, "server.threads");
        assert_eq!(leaf.default, "10");
    }

    #[test]
    fn preload_defaults_visits_every_leaf() {
        let def = definition();
        assert_eq!(def.preload_defaults().unwrap(), def.leaves().count());
    }

    #[test]
    fn default_group_mirrors_tree() {
        let def = definition();
        let root = def.root("server").unwrap();
        let group = def.default_group(&root.group);
        assert_eq!(group.get("threads"), Some(&Value::Int(10)));
        assert_eq!(group.get("regions"), Some(&Value::Map(Default::default())));
    }

    #[test]
    fn fingerprint_changes_with_schema() {
        let mut def = ConfigDefinition::new();
        let empty = def.fingerprint();
        def.register_root(server_root()).unwrap();
        let one = def.fingerprint();
        assert_ne!(empty, one);
        assert_eq!(one, {
            let mut again = ConfigDefinition::new();
            again.register_root(server_root()).unwrap();
            again.fingerprint()
        });
    }
}
