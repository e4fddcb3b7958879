//! Property sources: where raw `name = value` pairs come from.
//!
//! The engine consumes a single, already-prioritized view of string properties
//! through [`PropertySource`]. [`MapSource`] is the bundled implementation and
//! can be filled by hand, from a TOML document, or from environment variables.
//! Reading files or the process environment is left to the caller; the
//! adapters take content that has already been read.

use indexmap::IndexMap;
use toml::{Table, Value};

use crate::error::BindError;
use crate::name::quote_segment;

/// A flat view of `name → string` properties.
pub trait PropertySource {
    /// Every known property name, in source order.
    fn property_names(&self) -> Box<dyn Iterator<Item = &str> + '_>;

    fn value(&self, name: &str) -> Option<&str>;
}

/// An ordered in-memory property map. Inserting an existing name replaces its
/// value but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapSource {
    properties: IndexMap<String, String>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Flatten a TOML document into dotted names.
    ///
    /// Tables nest, keys containing `.` are quoted, and arrays become
    /// comma-separated lists with literal commas escaped as `\,`.
    ///
    /// `[app.server]\nthreads = 20` → `app.server.threads = "20"`
    pub fn from_toml(content: &str) -> Result<Self, BindError> {
        let table: Table = toml::from_str(content)?;
        let mut source = Self::new();
        flatten_table(&table, "", &mut source);
        Ok(source)
    }

    /// Map environment variables matching `{PREFIX}__*` to property names.
    ///
    /// Double underscore `__` separates segments and single `_` becomes `-`,
    /// all lower-cased: `APP__SERVER__MAX_THREADS` → `app.server.max-threads`.
    ///
    /// Takes an iterator so tests can pass synthetic data instead of
    /// `std::env::vars()`.
    pub fn from_env(prefix: &str, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let needle = format!("{prefix}__");
        let namespace = prefix.to_lowercase();
        let mut source = Self::new();

        for (key, value) in vars {
            let Some(rest) = key.strip_prefix(&needle) else {
                continue;
            };
            if rest.is_empty() || rest.split("__").any(str::is_empty) {
                continue;
            }
            let name = std::iter::once(namespace.clone())
                .chain(rest.split("__").map(|s| s.to_lowercase().replace('_', "-")))
                .collect::<Vec<_>>()
                .join(".");
            source.insert(name, value);
        }

        source
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut source = Self::new();
        for (name, value) in iter {
            source.insert(name, value);
        }
        source
    }
}

impl PropertySource for MapSource {
    fn property_names(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.properties.keys().map(String::as_str))
    }

    fn value(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}

fn flatten_table(table: &Table, prefix: &str, out: &mut MapSource) {
    for (key, value) in table {
        let segment = quote_segment(key);
        let name = if prefix.is_empty() {
            segment
        } else {
            format!("{prefix}.{segment}")
        };
        match value {
            Value::Table(nested) => flatten_table(nested, &name, out),
            Value::Array(items) => {
                let joined = items
                    .iter()
                    .map(|item| scalar_string(item).replace(',', "\\,"))
                    .collect::<Vec<_>>()
                    .join(",");
                out.insert(name, joined);
            }
            scalar => out.insert(name, scalar_string(scalar)),
        }
    }
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Datetime(dt) => dt.to_string(),
        other => other.to_string(),
    }
}
