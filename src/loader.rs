//! Applying discovered properties to realized roots.
//!
//! The loader walks a [`PropertySource`] in order. Names outside its namespace
//! are collected as unmatched; namespaced names are matched against each
//! target definition's pattern index, converted, and written into the
//! matching target's realized graph. A namespaced name nothing matches is
//! logged and reported unless it is on the exception list.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::convert;
use crate::definition::ConfigDefinition;
use crate::descriptor::{LeafDescriptor, PathStep};
use crate::error::BindError;
use crate::materialize::RealizedConfig;
use crate::name::NameIterator;
use crate::runtime::FrozenConfig;
use crate::source::PropertySource;
use crate::value::{Group, Value};

/// Names under the namespace that are known to be consumed elsewhere.
const DEFAULT_EXCEPTIONS: &[&str] = &[
    "live-reload.password",
    "live-reload.url",
    "debug.generated-classes-dir",
    "debug.reflection",
];

/// One definition together with the realized graph it loads into.
pub struct LoadTarget<'a> {
    pub definition: &'a ConfigDefinition,
    pub config: &'a mut RealizedConfig,
}

impl<'a> LoadTarget<'a> {
    pub fn new(definition: &'a ConfigDefinition, config: &'a mut RealizedConfig) -> Self {
        Self { definition, config }
    }
}

/// What a load pass did not apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Names outside the namespace.
    pub unmatched: BTreeSet<String>,
    /// Names inside the namespace that matched no pattern and no exception,
    /// in source order.
    pub unrecognized: Vec<String>,
    /// Number of properties written.
    pub applied: usize,
}

#[derive(Debug, Clone)]
pub struct Loader {
    namespace: String,
    exceptions: BTreeSet<String>,
}

impl Default for Loader {
    /// Namespace `app` with the default exception list.
    fn default() -> Self {
        Self::new("app").with_default_exceptions()
    }
}

impl Loader {
    /// A loader for names under `namespace`, with no exceptions.
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            exceptions: BTreeSet::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn exceptions(&self) -> impl Iterator<Item = &str> {
        self.exceptions.iter().map(String::as_str)
    }

    /// Add the names that tooling reads under the namespace without a schema
    /// (live-reload credentials, debug dump switches).
    pub fn with_default_exceptions(mut self) -> Self {
        for name in DEFAULT_EXCEPTIONS {
            self.exceptions.insert(format!("{}.{name}", self.namespace));
        }
        self
    }

    /// Never report the full property `name` as unrecognized.
    pub fn except(mut self, name: &str) -> Self {
        self.exceptions.insert(name.to_string());
        self
    }

    /// Load one definition's realized roots from `source`.
    pub fn load_into(
        &self,
        source: &dyn PropertySource,
        definition: &ConfigDefinition,
        config: &mut RealizedConfig,
    ) -> Result<LoadReport, BindError> {
        self.load(source, &mut [LoadTarget::new(definition, config)])
    }

    /// Apply every property of `source` to the first target whose definition
    /// matches it.
    ///
    /// An empty value restores the leaf's default. A conversion failure aborts
    /// the pass and names the offending key; properties applied before it stay
    /// applied.
    pub fn load(
        &self,
        source: &dyn PropertySource,
        targets: &mut [LoadTarget<'_>],
    ) -> Result<LoadReport, BindError> {
        let mut report = LoadReport::default();

        for property in source.property_names() {
            let mut name = NameIterator::new(property);
            if !name.next_segment_equals(&self.namespace) {
                report.unmatched.insert(property.to_string());
                continue;
            }
            name.next();

            let raw = source.value(property).unwrap_or_default();
            let mut matched = false;
            for target in targets.iter_mut() {
                let definition = target.definition;
                let Some((_, leaf)) = definition.match_leaf(&name) else {
                    continue;
                };
                matched = true;
                let Some(root) = target.config.get_mut(&leaf.root) else {
                    debug!(
                        key = property,
                        root = %leaf.root,
                        "root not materialized in this phase, skipping",
                    );
                    break;
                };
                let value = leaf_value(leaf, property, raw)?;
                if place(definition, root, &leaf.path, &name, value).is_none() {
                    warn!(key = property, "realized graph does not follow the schema, skipping");
                    break;
                }
                target.config.record(property, raw);
                report.applied += 1;
                break;
            }

            if !matched {
                if self.exceptions.contains(property) {
                    continue;
                }
                warn!(key = property, "Unrecognized configuration key");
                report.unrecognized.push(property.to_string());
            }
        }

        debug!(
            applied = report.applied,
            unmatched = report.unmatched.len(),
            unrecognized = report.unrecognized.len(),
            "loaded configuration properties",
        );
        Ok(report)
    }

    /// Refresh the runtime cells of `frozen` from `source`.
    ///
    /// Each cell's property is read again (absent or empty restores the
    /// default) and stored atomically. Returns the full names whose value
    /// changed. The frozen graph itself is not touched.
    pub fn re_resolve(
        &self,
        source: &dyn PropertySource,
        definition: &ConfigDefinition,
        frozen: &FrozenConfig,
    ) -> Result<Vec<String>, BindError> {
        let mut changed = Vec::new();
        for (relative, cell) in frozen.cells() {
            let full = format!("{}.{relative}", self.namespace);
            let leaf = definition.leaf(cell.leaf());
            let value = leaf_value(leaf, &full, source.value(&full).unwrap_or_default())?;
            if *cell.get() != value {
                debug!(key = %full, "runtime value changed");
                cell.set(value);
                changed.push(full);
            }
        }
        Ok(changed)
    }
}

/// Convert `raw` for `leaf`; empty means the default.
fn leaf_value(leaf: &LeafDescriptor, name: &str, raw: &str) -> Result<Value, BindError> {
    if raw.is_empty() {
        return Ok(leaf.default_value.clone());
    }
    convert::convert(&leaf.kind, raw).map_err(|reason| BindError::Conversion {
        key: name.to_string(),
        value: raw.to_string(),
        reason,
    })
}

/// Write `value` at the end of `path` below `group`, creating map entries from
/// their templates. Map keys are read from `name`, whose cursor sits just after
/// the namespace. `None` means the graph does not have the schema's shape.
fn place(
    definition: &ConfigDefinition,
    group: &mut Group,
    path: &[PathStep],
    name: &NameIterator<'_>,
    value: Value,
) -> Option<()> {
    let (PathStep::Field(ident), rest) = path.split_first()? else {
        return None;
    };
    place_value(definition, group.field_mut(ident)?, rest, name, value)
}

fn place_value(
    definition: &ConfigDefinition,
    slot: &mut Value,
    path: &[PathStep],
    name: &NameIterator<'_>,
    value: Value,
) -> Option<()> {
    match path.first() {
        None => {
            *slot = value;
            Some(())
        }
        Some(PathStep::Field(_)) => match slot {
            Value::Group(group) => place(definition, group, path, name, value),
            _ => None,
        },
        Some(PathStep::MapKey { segment, entry }) => {
            let Value::Map(map) = slot else {
                return None;
            };
            let key = name.segment(name.position() + segment)?;
            let child = map
                .entry(key.to_string())
                .or_insert_with(|| definition.entry(*entry).clone());
            place_value(definition, child, &path[1..], name, value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{definition, server_root};
    use crate::materialize::{Interpreter, Materializer};
    use crate::source::MapSource;
    use crate::types::MaterializePhase;

    fn realized(def: &ConfigDefinition) -> RealizedConfig {
        Interpreter.materialize(def, MaterializePhase::Build).unwrap()
    }

    fn load(pairs: &[(&str, &str)]) -> (RealizedConfig, LoadReport) {
        let def = definition();
        let mut config = realized(&def);
        let source: MapSource = pairs.iter().copied().collect();
        let report = Loader::default().load_into(&source, &def, &mut config).unwrap();
        (config, report)
    }

    fn server(config: &RealizedConfig) -> &Group {
        config.realized_instance("ServerConfig").unwrap()
    }

    #[test]
    fn override_replaces_default() {
        let (config, report) = load(&[("app.server.threads", "20")]);
        assert_eq!(server(&config).get("threads"), Some(&Value::Int(20)));
        assert_eq!(report.applied, 1);
        assert_eq!(
            config.loaded_properties().get("app.server.threads").map(String::as_str),
            Some("20")
        );
    }

    #[test]
    fn empty_value_restores_default() {
        let (config, _) = load(&[("app.server.threads", "")]);
        assert_eq!(server(&config).get("threads"), Some(&Value::Int(10)));
        assert_eq!(
            config.loaded_properties().get("app.server.threads").map(String::as_str),
            Some("")
        );
    }

    #[test]
    fn outside_namespace_is_unmatched() {
        let (config, report) = load(&[("other.server.threads", "1"), ("server.threads", "2")]);
        assert_eq!(
            report.unmatched.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["other.server.threads", "server.threads"]
        );
        assert!(report.unrecognized.is_empty());
        assert_eq!(server(&config).get("threads"), Some(&Value::Int(10)));
    }

    #[test]
    fn unknown_key_is_unrecognized() {
        let (config, report) = load(&[("app.server.unknown", "5"), ("app.server.threads", "7")]);
        assert_eq!(report.unrecognized, vec!["app.server.unknown"]);
        assert_eq!(server(&config).get("threads"), Some(&Value::Int(7)));
        assert!(!config.loaded_properties().contains_key("app.server.unknown"));
    }

    #[test]
    fn default_exceptions_are_silent() {
        let (_, report) = load(&[
            ("app.live-reload.password", "secret"),
            ("app.debug.reflection", "true"),
        ]);
        assert!(report.unrecognized.is_empty());
        assert!(report.unmatched.is_empty());
    }

    #[test]
    fn custom_exception() {
        let def = definition();
        let mut config = realized(&def);
        let source: MapSource = [("app.tooling.token", "x"), ("app.debug.reflection", "true")]
            .into_iter()
            .collect();
        let report = Loader::new("app")
            .except("app.tooling.token")
            .load_into(&source, &def, &mut config)
            .unwrap();
        assert_eq!(report.unrecognized, vec!["app.debug.reflection"]);
    }

    #[test]
    fn map_entry_created_from_template() {
        let (config, _) = load(&[("app.server.regions.us-east.label", "east")]);
        let regions = server(&config).get("regions").and_then(Value::as_map).unwrap();
        let region = regions["us-east"].as_group().unwrap();
        assert_eq!(region.type_name(), "RegionConfig");
        assert_eq!(region.get("label"), Some(&Value::String("east".into())));
        assert_eq!(region.get("weight"), Some(&Value::Int(1)));
    }

    #[test]
    fn quoted_map_key_keeps_its_dots() {
        let (config, _) = load(&[("app.server.regions.\"eu.west\".weight", "3")]);
        let regions = server(&config).get("regions").and_then(Value::as_map).unwrap();
        let region = regions["eu.west"].as_group().unwrap();
        assert_eq!(region.get("weight"), Some(&Value::Int(3)));
    }

    #[test]
    fn explicit_root_name_and_nested_group() {
        let (config, _) = load(&[
            ("app.log.file.enable", "true"),
            ("app.log.file.rotation.max-file-size", "10M"),
        ]);
        let file = config.get("file").unwrap();
        assert_eq!(file.get("enable"), Some(&Value::Bool(true)));
        let rotation = file.get("rotation").and_then(Value::as_group).unwrap();
        assert_eq!(
            rotation.get("max_file_size").and_then(Value::as_present),
            Some(&Value::MemorySize(10 << 20))
        );
    }

    #[test]
    fn conversion_error_names_key() {
        let def = definition();
        let mut config = realized(&def);
        let source: MapSource = [("app.server.threads", "many")].into_iter().collect();
        let err = Loader::default()
            .load_into(&source, &def, &mut config)
            .unwrap_err();
        assert!(matches!(
            err,
            BindError::Conversion { key, value, .. } if key == "app.server.threads" && value == "many"
        ));
    }

    #[test]
    fn unplaced_value_is_not_counted() {
        let def = definition();
        let mut config = realized(&def);
        config
            .get_mut("server")
            .unwrap()
            .accept("regions", Value::Unset);
        let source: MapSource = [("app.server.regions.eu.label", "eu")].into_iter().collect();
        let report = Loader::default().load_into(&source, &def, &mut config).unwrap();
        assert_eq!(report.applied, 0);
        assert!(report.unrecognized.is_empty());
        assert!(config.loaded_properties().is_empty());
        assert_eq!(server(&config).get("regions"), Some(&Value::Unset));
    }

    #[test]
    fn first_matching_target_wins() {
        let def = definition();
        let mut other = ConfigDefinition::new();
        other.register_root(server_root()).unwrap();

        let mut first = realized(&def);
        let mut second = realized(&other);
        let source: MapSource = [("app.server.threads", "30")].into_iter().collect();
        Loader::default()
            .load(
                &source,
                &mut [LoadTarget::new(&def, &mut first), LoadTarget::new(&other, &mut second)],
            )
            .unwrap();

        assert_eq!(server(&first).get("threads"), Some(&Value::Int(30)));
        assert_eq!(server(&second).get("threads"), Some(&Value::Int(10)));
        assert!(second.loaded_properties().is_empty());
    }

    #[test]
    fn runtime_phase_skips_build_root_properties() {
        let def = definition();
        let mut config = Interpreter.materialize(&def, MaterializePhase::Runtime).unwrap();
        let source: MapSource = [("app.package.kind", "native")].into_iter().collect();
        let report = Loader::default().load_into(&source, &def, &mut config).unwrap();
        assert!(report.unrecognized.is_empty());
        assert_eq!(report.applied, 0);
    }

    #[test]
    fn other_namespace() {
        let def = definition();
        let mut config = realized(&def);
        let source: MapSource = [("svc.server.threads", "4"), ("app.server.threads", "5")]
            .into_iter()
            .collect();
        let report = Loader::new("svc").load_into(&source, &def, &mut config).unwrap();
        assert_eq!(server(&config).get("threads"), Some(&Value::Int(4)));
        assert!(report.unmatched.contains("app.server.threads"));
    }
}
