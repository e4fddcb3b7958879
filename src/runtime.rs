//! Frozen configuration and runtime-overridable cells.
//!
//! Once loading is done the realized graph is frozen behind an [`Arc`] and
//! never mutated again. Attributes declared runtime-overridable get their own
//! [`RuntimeCell`], one per concrete property name, which the runtime pass
//! ([`Loader::re_resolve`](crate::Loader::re_resolve)) can swap atomically
//! while readers keep going.

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::debug;

use crate::definition::ConfigDefinition;
use crate::descriptor::{LeafId, PathStep};
use crate::materialize::RealizedConfig;
use crate::name::quote_segment;
use crate::pattern::WILDCARD;
use crate::value::{Group, Value};

/// The current value of one runtime-overridable property.
///
/// Clones share the same slot.
#[derive(Debug, Clone)]
pub struct RuntimeCell {
    leaf: LeafId,
    value: Arc<ArcSwap<Value>>,
}

impl RuntimeCell {
    fn new(leaf: LeafId, value: Value) -> Self {
        Self {
            leaf,
            value: Arc::new(ArcSwap::from_pointee(value)),
        }
    }

    pub fn leaf(&self) -> LeafId {
        self.leaf
    }

    /// Latest stored value.
    pub fn get(&self) -> Arc<Value> {
        self.value.load_full()
    }

    pub(crate) fn set(&self, value: Value) {
        self.value.store(Arc::new(value));
    }
}

/// A read-only realized configuration plus its runtime cells.
#[derive(Debug, Clone)]
pub struct FrozenConfig {
    config: Arc<RealizedConfig>,
    cells: BTreeMap<String, RuntimeCell>,
}

impl FrozenConfig {
    pub fn config(&self) -> &Arc<RealizedConfig> {
        &self.config
    }

    /// Cell for a concrete property name without the namespace, e.g.
    /// `server.regions.us-east.weight`.
    pub fn cell(&self, name: &str) -> Option<&RuntimeCell> {
        self.cells.get(name)
    }

    /// Every cell, ordered by name.
    pub fn cells(&self) -> impl Iterator<Item = (&str, &RuntimeCell)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl RealizedConfig {
    /// Freeze the graph and create a cell for each runtime-overridable leaf.
    ///
    /// Wildcard leaves get one cell per map entry realized at this point,
    /// seeded with the loaded value. Entries that first appear later are not
    /// tracked.
    pub fn freeze(self, definition: &ConfigDefinition) -> FrozenConfig {
        let mut cells = BTreeMap::new();
        for (id, leaf) in definition.leaves() {
            if !leaf.runtime_overridable {
                continue;
            }
            let Some(root) = self.get(&leaf.root) else {
                continue;
            };
            let mut found = Vec::new();
            collect(root, &leaf.path, &mut Vec::new(), &mut found);
            for (keys, value) in found {
                cells.insert(concrete_name(&leaf.pattern, &keys), RuntimeCell::new(id, value));
            }
        }

        debug!(cells = cells.len(), "froze realized configuration");
        FrozenConfig {
            config: Arc::new(self),
            cells,
        }
    }
}

/// Gather the values at the end of `path`, with the map keys taken on the way.
fn collect(
    group: &Group,
    path: &[PathStep],
    keys: &mut Vec<String>,
    out: &mut Vec<(Vec<String>, Value)>,
) {
    if let Some((PathStep::Field(ident), rest)) = path.split_first()
        && let Some(slot) = group.get(ident)
    {
        collect_value(slot, rest, keys, out);
    }
}

fn collect_value(
    slot: &Value,
    path: &[PathStep],
    keys: &mut Vec<String>,
    out: &mut Vec<(Vec<String>, Value)>,
) {
    match (path.first(), slot) {
        (None, value) => out.push((keys.clone(), value.clone())),
        (Some(PathStep::Field(_)), Value::Group(group)) => collect(group, path, keys, out),
        (Some(PathStep::MapKey { .. }), Value::Map(map)) => {
            for (key, entry) in map {
                keys.push(key.clone());
                collect_value(entry, &path[1..], keys, out);
                keys.pop();
            }
        }
        _ => {}
    }
}

/// Substitute `keys` for the wildcards of `pattern`, in order.
fn concrete_name(pattern: &str, keys: &[String]) -> String {
    let mut keys = keys.iter();
    pattern
        .split('.')
        .map(|segment| match segment {
            WILDCARD => keys
                .next()
                .map(|key| quote_segment(key))
                .unwrap_or_else(|| segment.to_string()),
            literal => literal.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}
