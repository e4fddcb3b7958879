//! Schema registration: declarations in, descriptor tree and patterns out.
//!
//! Each attribute gets an effective name (from its [`ItemName`] directive) and
//! an effective default (declared, or `"false"` / `"0"` / `""` by type), then
//! is dispatched on its [`Shape`]. Everything a root contributes is collected
//! first and committed only when the whole root validated, so a failed
//! registration leaves the definition untouched.

use std::collections::HashSet;

use tracing::debug;

use crate::convert;
use crate::definition::ConfigDefinition;
use crate::descriptor::{
    EntryId, GroupNode, LeafDescriptor, LeafId, LeafKind, MapNode, Node, PathStep, RootInfo,
};
use crate::error::BindError;
use crate::pattern::{PatternMap, WILDCARD};
use crate::schema::{self, FieldDecl, GroupDecl, RootDecl, Shape};
use crate::types::{ConfigPhase, DefaultValue, ItemName, Primitive, ValueType};
use crate::value::Value;

impl ConfigDefinition {
    /// Register a configuration root.
    ///
    /// Fails with a schema error (see [`BindError::is_schema_error`]) when the
    /// root or any attribute below it is malformed, or when a name or pattern
    /// collides with one already registered. On failure nothing is registered.
    pub fn register_root(&mut self, decl: RootDecl) -> Result<(), BindError> {
        let type_name = decl.group.type_name.clone();
        if decl.group.is_group {
            return Err(BindError::GroupAsRoot { type_name });
        }

        let containing_name = schema::containing_name(&type_name);
        let root_name = match &decl.name {
            ItemName::Parent => return Err(BindError::RootInheritsParent { type_name }),
            ItemName::ElementName => containing_name.clone(),
            ItemName::HyphenatedElementName => schema::hyphenated_root_name(&type_name),
            ItemName::Explicit(name) => name.clone(),
        };
        if self.roots.contains_key(&containing_name) {
            return Err(BindError::DuplicateRoot {
                name: containing_name,
                type_name,
            });
        }
        if self.roots.values().any(|r| r.root_name == root_name) {
            return Err(BindError::DuplicateRoot {
                name: root_name,
                type_name,
            });
        }

        let mut pass = Registration {
            existing: &self.leaf_patterns,
            root: &containing_name,
            phase: decl.phase,
            leaf_base: self.leaves.len(),
            entry_base: self.entries.len(),
            leaves: Vec::new(),
            entries: Vec::new(),
            seen: HashSet::new(),
        };
        let key: Vec<String> = root_name.split('.').map(str::to_string).collect();
        let group = pass.group(&decl.group, &key, &[], false)?;
        let Registration {
            leaves, entries, ..
        } = pass;

        let leaf_count = leaves.len();
        for leaf in leaves {
            let id = LeafId(self.leaves.len());
            self.leaf_patterns.insert(&leaf.pattern, id)?;
            self.leaves.push(leaf);
        }
        self.entries.extend(entries);
        self.roots.insert(
            containing_name.clone(),
            RootInfo {
                type_name,
                containing_name: containing_name.clone(),
                root_name: root_name.clone(),
                phase: decl.phase,
                group,
            },
        );

        debug!(
            root = %containing_name,
            external = %root_name,
            phase = ?decl.phase,
            leaves = leaf_count,
            "registered configuration root",
        );
        Ok(())
    }
}

/// State of one root's registration, committed by the caller on success.
struct Registration<'d> {
    existing: &'d PatternMap<LeafId>,
    root: &'d str,
    phase: ConfigPhase,
    leaf_base: usize,
    entry_base: usize,
    leaves: Vec<LeafDescriptor>,
    entries: Vec<Value>,
    seen: HashSet<String>,
}

impl Registration<'_> {
    fn group(
        &mut self,
        decl: &GroupDecl,
        base: &[String],
        path: &[PathStep],
        overridable: bool,
    ) -> Result<GroupNode, BindError> {
        let mut node = GroupNode {
            type_name: decl.type_name.clone(),
            fields: Vec::with_capacity(decl.fields.len()),
        };

        for field in &decl.fields {
            let label = format!("{}.{}", decl.type_name, field.ident);
            let overridable = overridable || field.runtime_overridable;
            if field.runtime_overridable && !self.phase.is_read_at_main() {
                return Err(BindError::OverridableOutsideRuntime { field: label });
            }

            let key = sub_key(base, field);
            let mut field_path = path.to_vec();
            field_path.push(PathStep::Field(field.ident.clone()));

            let child = match &field.shape {
                Shape::Group(group) => {
                    if field.default.is_supplied() {
                        return Err(BindError::GroupDefault { field: label });
                    }
                    Node::Group(self.group(group, &key, &field_path, overridable)?)
                }
                Shape::Primitive(primitive) => {
                    let (kind, canonical) = primitive_kind(*primitive, &label)?;
                    let default = field.default.or_canonical(canonical);
                    self.leaf(field, &key, kind, default, field_path, overridable)?
                }
                Shape::Map { key: map_key, value } => {
                    let value = map_value(map_key.as_ref(), value.as_deref(), &label)?;
                    Node::Map(self.map(value, &key, &field_path, field, &label, overridable)?)
                }
                Shape::List(element) => {
                    let element = element.clone().ok_or(BindError::NotParameterized {
                        field: label,
                        shape: "List",
                    })?;
                    // An undeclared list default is the empty list, whatever the element type.
                    let default = field.default.or_canonical("");
                    let kind = LeafKind::ObjectList(element);
                    self.leaf(field, &key, kind, default, field_path, overridable)?
                }
                Shape::Optional(element) => {
                    let element = element.clone().ok_or(BindError::NotParameterized {
                        field: label,
                        shape: "Optional",
                    })?;
                    let default = field.default.or_canonical("");
                    let kind = LeafKind::OptionalObject(element);
                    self.leaf(field, &key, kind, default, field_path, overridable)?
                }
                Shape::Object(ty) => {
                    let default = object_default(&field.default, ty);
                    let kind = LeafKind::Object(ty.clone());
                    self.leaf(field, &key, kind, default, field_path, overridable)?
                }
            };
            node.fields.push((field.ident.clone(), child));
        }

        Ok(node)
    }

    fn map(
        &mut self,
        value: &Shape,
        base: &[String],
        path: &[PathStep],
        field: &FieldDecl,
        label: &str,
        overridable: bool,
    ) -> Result<MapNode, BindError> {
        let mut key = base.to_vec();
        key.push(WILDCARD.to_string());

        // Reserve the entry template now; it is filled once the value node exists.
        let entry = EntryId(self.entry_base + self.entries.len());
        self.entries.push(Value::Unset);
        let mut entry_path = path.to_vec();
        entry_path.push(PathStep::MapKey {
            segment: base.len(),
            entry,
        });

        let value_node = match value {
            Shape::Map { key: map_key, value } => {
                let nested = map_value(map_key.as_ref(), value.as_deref(), label)?;
                Node::Map(self.map(nested, &key, &entry_path, field, label, overridable)?)
            }
            Shape::Group(group) => Node::Group(self.group(group, &key, &entry_path, overridable)?),
            Shape::List(element) => {
                let element = element.clone().ok_or(BindError::NotParameterized {
                    field: label.to_string(),
                    shape: "List",
                })?;
                let kind = LeafKind::ObjectList(element);
                self.map_leaf(field, &key, kind, entry_path, overridable)?
            }
            Shape::Optional(_) => {
                return Err(BindError::OptionalMapValue {
                    field: label.to_string(),
                });
            }
            Shape::Primitive(primitive) => {
                let ty = match primitive {
                    Primitive::Boolean => ValueType::Boolean,
                    Primitive::Int => ValueType::Integer,
                    Primitive::Long => ValueType::Long,
                    Primitive::Float => ValueType::Float,
                    Primitive::Double => ValueType::Double,
                    other => {
                        return Err(BindError::UnsupportedPrimitive {
                            field: label.to_string(),
                            primitive: other.name(),
                        });
                    }
                };
                self.map_leaf(field, &key, LeafKind::Object(ty), entry_path, overridable)?
            }
            Shape::Object(ty) => {
                let kind = LeafKind::Object(ty.clone());
                self.map_leaf(field, &key, kind, entry_path, overridable)?
            }
        };

        let template = self.default_of(&value_node);
        self.entries[entry.0 - self.entry_base] = template;
        Ok(MapNode {
            value: Box::new(value_node),
        })
    }

    /// A leaf that is itself a map value. Its default is always empty.
    fn map_leaf(
        &mut self,
        field: &FieldDecl,
        key: &[String],
        kind: LeafKind,
        path: Vec<PathStep>,
        overridable: bool,
    ) -> Result<Node, BindError> {
        let value_field = FieldDecl {
            ident: String::new(),
            ..field.clone()
        };
        self.leaf(&value_field, key, kind, String::new(), path, overridable)
    }

    fn leaf(
        &mut self,
        field: &FieldDecl,
        key: &[String],
        kind: LeafKind,
        default: String,
        path: Vec<PathStep>,
        overridable: bool,
    ) -> Result<Node, BindError> {
        let pattern = key.join(".");
        if self.existing.contains(&pattern) || !self.seen.insert(pattern.clone()) {
            return Err(BindError::DuplicatePattern { pattern });
        }
        let default_value =
            convert::convert(&kind, &default).map_err(|reason| BindError::InvalidDefault {
                key: pattern.clone(),
                reason,
            })?;

        let id = LeafId(self.leaf_base + self.leaves.len());
        self.leaves.push(LeafDescriptor {
            ident: field.ident.clone(),
            pattern,
            kind,
            default,
            default_value,
            doc: field.doc.clone(),
            runtime_overridable: overridable,
            root: self.root.to_string(),
            path,
        });
        Ok(Node::Leaf(id))
    }

    /// Default value of a node built during this pass.
    fn default_of(&self, node: &Node) -> Value {
        match node {
            Node::Group(group) => {
                let mut value = crate::value::Group::new(&group.type_name);
                for (ident, child) in &group.fields {
                    value.accept(ident, self.default_of(child));
                }
                Value::Group(value)
            }
            Node::Map(_) => Value::Map(Default::default()),
            Node::Leaf(id) => self.leaves[id.0 - self.leaf_base].default_value.clone(),
        }
    }
}

/// Key segments of `field` under `base`. `Parent` adds nothing.
fn sub_key(base: &[String], field: &FieldDecl) -> Vec<String> {
    let mut key = base.to_vec();
    match &field.name {
        ItemName::Parent => {}
        ItemName::ElementName => key.push(field.ident.clone()),
        ItemName::HyphenatedElementName => key.push(schema::hyphenate(&field.ident)),
        ItemName::Explicit(name) => key.extend(name.split('.').map(str::to_string)),
    }
    key
}

fn primitive_kind(
    primitive: Primitive,
    label: &str,
) -> Result<(LeafKind, &'static str), BindError> {
    match primitive {
        Primitive::Boolean => Ok((LeafKind::Boolean, "false")),
        Primitive::Int => Ok((LeafKind::Int, "0")),
        Primitive::Long => Ok((LeafKind::Long, "0")),
        Primitive::Float => Ok((LeafKind::Float, "0")),
        Primitive::Double => Ok((LeafKind::Double, "0")),
        other => Err(BindError::UnsupportedPrimitive {
            field: label.to_string(),
            primitive: other.name(),
        }),
    }
}

/// Validate a map declaration and return its value shape.
fn map_value<'s>(
    key: Option<&ValueType>,
    value: Option<&'s Shape>,
    label: &str,
) -> Result<&'s Shape, BindError> {
    match (key, value) {
        (Some(ValueType::String), Some(value)) => Ok(value),
        (Some(ValueType::String), None) | (None, _) => Err(BindError::NotParameterized {
            field: label.to_string(),
            shape: "Map",
        }),
        (Some(_), _) => Err(BindError::MapKeyNotString {
            field: label.to_string(),
        }),
    }
}

fn object_default(default: &DefaultValue, ty: &ValueType) -> String {
    let canonical = match ty {
        ValueType::Boolean => "false",
        ty if ty.is_numeric() => "0",
        _ => "",
    };
    default.or_canonical(canonical)
}
