//! Building the realized object graph from a definition.
//!
//! Two strategies sit behind [`Materializer`]: the [`Interpreter`] walks the
//! descriptor tree on every call, while a [`ConstructionPlan`] is compiled once
//! into a flat list of operations with every default already converted, and can
//! be saved as JSON and replayed on later starts without walking the schema
//! again. Both produce equal graphs.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::definition::ConfigDefinition;
use crate::descriptor::{GroupNode, Node, RootInfo};
use crate::error::BindError;
use crate::extract;
use crate::types::{ConfigPhase, MaterializePhase};
use crate::value::{Group, Value};

/// A strategy that produces default-initialized roots for a definition.
pub trait Materializer {
    fn materialize(
        &self,
        definition: &ConfigDefinition,
        phase: MaterializePhase,
    ) -> Result<RealizedConfig, BindError>;
}

/// Walks the descriptor tree directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpreter;

impl Materializer for Interpreter {
    fn materialize(
        &self,
        definition: &ConfigDefinition,
        phase: MaterializePhase,
    ) -> Result<RealizedConfig, BindError> {
        let mut config = RealizedConfig::default();
        for root in definition.roots() {
            if !phase.includes(root.phase) {
                continue;
            }
            config.store(root, definition.default_group(&root.group));
        }
        debug!(roots = config.roots.len(), ?phase, "interpreted configuration roots");
        Ok(config)
    }
}

/// One step of a compiled root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanOp {
    /// Start a nested group stored under `field` of the current group.
    Enter { field: String, type_name: String },
    /// Store a pre-converted default into `field` of the current group.
    Set { field: String, value: Value },
    /// Finish the current nested group.
    Exit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootPlan {
    pub containing_name: String,
    pub type_name: String,
    pub phase: ConfigPhase,
    pub ops: Vec<PlanOp>,
}

/// A compiled, replayable recipe for the default graph of a definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionPlan {
    fingerprint: u64,
    roots: Vec<RootPlan>,
}

impl ConstructionPlan {
    /// Compile every root of `definition`, whatever its phase; the phase
    /// filter is applied when the plan runs.
    pub fn compile(definition: &ConfigDefinition) -> Self {
        let roots = definition
            .roots()
            .map(|root| {
                let mut ops = Vec::new();
                compile_group(definition, &root.group, &mut ops);
                RootPlan {
                    containing_name: root.containing_name.clone(),
                    type_name: root.type_name.clone(),
                    phase: root.phase,
                    ops,
                }
            })
            .collect();
        Self {
            fingerprint: definition.fingerprint(),
            roots,
        }
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn roots(&self) -> &[RootPlan] {
        &self.roots
    }

    pub fn to_json(&self) -> Result<String, BindError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, BindError> {
        Ok(serde_json::from_str(json)?)
    }
}

fn compile_group(definition: &ConfigDefinition, group: &GroupNode, ops: &mut Vec<PlanOp>) {
    for (field, node) in &group.fields {
        match node {
            Node::Group(nested) => {
                ops.push(PlanOp::Enter {
                    field: field.clone(),
                    type_name: nested.type_name.clone(),
                });
                compile_group(definition, nested, ops);
                ops.push(PlanOp::Exit);
            }
            other => ops.push(PlanOp::Set {
                field: field.clone(),
                value: definition.default_value(other),
            }),
        }
    }
}

impl Materializer for ConstructionPlan {
    fn materialize(
        &self,
        definition: &ConfigDefinition,
        phase: MaterializePhase,
    ) -> Result<RealizedConfig, BindError> {
        if self.fingerprint != definition.fingerprint() {
            return Err(BindError::StalePlan);
        }

        let mut config = RealizedConfig::default();
        for plan in &self.roots {
            if !phase.includes(plan.phase) {
                continue;
            }
            let info = definition
                .root(&plan.containing_name)
                .ok_or_else(|| BindError::UnknownRoot(plan.type_name.clone()))?;
            config.store(info, run_ops(info, &plan.ops)?);
        }
        debug!(roots = config.roots.len(), ?phase, "replayed construction plan");
        Ok(config)
    }
}

/// Replay `ops` against the descriptor tree of `root`. A stored plan is
/// outside data, so every step is checked: groups must nest and close, and each
/// attribute must exist in the schema with the same kind and appear once.
fn run_ops(root: &RootInfo, ops: &[PlanOp]) -> Result<Group, BindError> {
    let malformed = |reason: String| BindError::MalformedPlan {
        root: root.type_name.clone(),
        reason,
    };
    let mut stack: Vec<(&str, Group, &GroupNode)> =
        vec![("", Group::new(&root.type_name), &root.group)];

    for op in ops {
        let Some((_, group, node)) = stack.last_mut() else {
            return Err(malformed("operation after the root was closed".into()));
        };
        let node = *node;
        match op {
            PlanOp::Enter { field, type_name } => {
                let nested = match schema_field(node, field) {
                    Some(Node::Group(nested)) if nested.type_name == *type_name => nested,
                    _ => return Err(malformed(format!("no group {type_name} at '{field}'"))),
                };
                if group.get(field).is_some() {
                    return Err(malformed(format!("'{field}' is set twice")));
                }
                stack.push((field.as_str(), Group::new(type_name), nested));
            }
            PlanOp::Set { field, value } => {
                if !matches!(schema_field(node, field), Some(Node::Leaf(_) | Node::Map(_))) {
                    let reason = format!("no attribute '{field}' in {}", node.type_name);
                    return Err(malformed(reason));
                }
                if group.get(field).is_some() {
                    return Err(malformed(format!("'{field}' is set twice")));
                }
                group.accept(field, value.clone());
            }
            PlanOp::Exit => {
                if stack.len() < 2 {
                    return Err(malformed("exit without a matching enter".into()));
                }
                if let Some((field, finished, node)) = stack.pop() {
                    check_complete(&finished, node).map_err(malformed)?;
                    if let Some((_, parent, _)) = stack.last_mut() {
                        parent.accept(field, Value::Group(finished));
                    }
                }
            }
        }
    }

    match stack.pop() {
        Some((_, group, node)) if stack.is_empty() => {
            check_complete(&group, node).map_err(malformed)?;
            Ok(group)
        }
        _ => Err(malformed("enter without a matching exit".into())),
    }
}

fn schema_field<'n>(node: &'n GroupNode, field: &str) -> Option<&'n Node> {
    node.fields
        .iter()
        .find(|(ident, _)| ident == field)
        .map(|(_, child)| child)
}

fn check_complete(group: &Group, node: &GroupNode) -> Result<(), String> {
    match node.fields.iter().find(|(ident, _)| group.get(ident).is_none()) {
        Some((ident, _)) => Err(format!("'{ident}' of {} is never set", node.type_name)),
        None => Ok(()),
    }
}

/// The realized roots of one run.
///
/// A pure container: roots are stored by containing name and looked up by
/// declared type name. It accepts no leaf values itself; the loader writes
/// into the groups it holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RealizedConfig {
    roots: IndexMap<String, Group>,
    by_type: IndexMap<String, String>,
    loaded: BTreeMap<String, String>,
}

impl RealizedConfig {
    fn store(&mut self, info: &RootInfo, group: Group) {
        debug_assert!(
            !self.roots.contains_key(&info.containing_name),
            "root {} stored twice",
            info.containing_name
        );
        self.by_type
            .insert(info.type_name.clone(), info.containing_name.clone());
        self.roots.insert(info.containing_name.clone(), group);
    }

    /// Root by containing name.
    pub fn get(&self, containing_name: &str) -> Option<&Group> {
        self.roots.get(containing_name)
    }

    pub(crate) fn get_mut(&mut self, containing_name: &str) -> Option<&mut Group> {
        self.roots.get_mut(containing_name)
    }

    /// Realized roots in registration order, keyed by containing name.
    pub fn roots(&self) -> impl Iterator<Item = (&str, &Group)> {
        self.roots.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Root by declared type name.
    pub fn realized_instance(&self, type_name: &str) -> Result<&Group, BindError> {
        self.by_type
            .get(type_name)
            .and_then(|name| self.roots.get(name))
            .ok_or_else(|| BindError::UnknownRoot(type_name.to_string()))
    }

    /// Description of the root whose realized group is `instance`, by identity.
    pub fn instance_info<'d>(
        &self,
        definition: &'d ConfigDefinition,
        instance: &Group,
    ) -> Option<&'d RootInfo> {
        self.roots
            .iter()
            .find(|(_, group)| std::ptr::eq(*group, instance))
            .and_then(|(name, _)| definition.root(name))
    }

    /// Deserialize the root of `type_name` into `T`.
    ///
    /// Field identifiers become keys and absent values are left out, so
    /// `Option` fields come back as `None`. String leaves are parsed into the
    /// field's own type, which is how untyped introspected leaves bind.
    pub fn root<T: DeserializeOwned>(&self, type_name: &str) -> Result<T, BindError> {
        let group = self.realized_instance(type_name)?;
        extract::from_table(group.to_table()).map_err(|e| BindError::Extract {
            type_name: type_name.to_string(),
            reason: e.to_string(),
        })
    }

    /// Every property the loader applied, by full name, with its literal value.
    pub fn loaded_properties(&self) -> &BTreeMap<String, String> {
        &self.loaded
    }

    pub(crate) fn record(&mut self, name: &str, value: &str) {
        self.loaded.insert(name.to_string(), value.to_string());
    }
}
