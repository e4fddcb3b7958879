//! The realized object graph.
//!
//! Roots and nested groups materialize as [`Group`]s, maps as string-keyed
//! [`Value::Map`]s, leaves as scalar, list or optional values. A group is the
//! only node that accepts leaf values; the containers above it
//! ([`RealizedConfig`](crate::RealizedConfig)) never do.

use std::collections::BTreeMap;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Path(PathBuf),
    MemorySize(u64),
    List(Vec<Value>),
    Optional(Option<Box<Value>>),
    /// An object leaf with no value: a non-string type whose default is empty.
    Unset,
    Group(Group),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer value of an `Int` or `Long` leaf.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(i64::from(*i)),
            Value::Long(l) => Some(*l),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(f64::from(*f)),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&std::path::Path> {
        match self {
            Value::Path(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_memory_size(&self) -> Option<u64> {
        match self {
            Value::MemorySize(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// The wrapped value of a present optional.
    pub fn as_present(&self) -> Option<&Value> {
        match self {
            Value::Optional(Some(v)) => Some(v),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Value::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// `true` for `Unset` and absent optionals.
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Unset | Value::Optional(None))
    }

    /// TOML form of the value; `None` for absent values, which are left out of
    /// tables so that `Option` fields deserialize as `None`.
    pub fn to_toml(&self) -> Option<toml::Value> {
        let value = match self {
            Value::Bool(b) => toml::Value::Boolean(*b),
            Value::Int(i) => toml::Value::Integer(i64::from(*i)),
            Value::Long(l) => toml::Value::Integer(*l),
            Value::Float(f) => toml::Value::Float(f64::from(*f)),
            Value::Double(d) => toml::Value::Float(*d),
            Value::String(s) => toml::Value::String(s.clone()),
            Value::Path(p) => toml::Value::String(p.to_string_lossy().into_owned()),
            Value::MemorySize(n) => toml::Value::Integer(i64::try_from(*n).unwrap_or(i64::MAX)),
            Value::List(items) => {
                toml::Value::Array(items.iter().filter_map(Value::to_toml).collect())
            }
            Value::Optional(inner) => return inner.as_deref().and_then(Value::to_toml),
            Value::Unset => return None,
            Value::Group(g) => toml::Value::Table(g.to_table()),
            Value::Map(m) => toml::Value::Table(
                m.iter()
                    .filter_map(|(k, v)| v.to_toml().map(|v| (k.clone(), v)))
                    .collect(),
            ),
        };
        Some(value)
    }
}

/// A realized group: its declared type and attribute values in declaration
/// order, keyed by attribute identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    type_name: String,
    fields: IndexMap<String, Value>,
}

impl Group {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            fields: IndexMap::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, ident: &str) -> Option<&Value> {
        self.fields.get(ident)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Accept a value into attribute `ident`, replacing what was there.
    pub fn accept(&mut self, ident: &str, value: Value) {
        self.fields.insert(ident.to_string(), value);
    }

    pub(crate) fn field_mut(&mut self, ident: &str) -> Option<&mut Value> {
        self.fields.get_mut(ident)
    }

    /// The group as a TOML table, absent values omitted.
    pub fn to_table(&self) -> toml::Table {
        self.fields
            .iter()
            .filter_map(|(k, v)| v.to_toml().map(|v| (k.clone(), v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Group {
        let mut rotation = Group::new("RotationConfig");
        rotation.accept("max_backup_index", Value::Int(1));
        rotation.accept("file_suffix", Value::Optional(None));

        let mut file = Group::new("FileConfig");
        file.accept("enable", Value::Bool(false));
        file.accept("path", Value::Path("app.log".into()));
        file.accept("rotation", Value::Group(rotation));
        file
    }

    #[test]
    fn accessors() {
        let g = sample();
        assert_eq!(g.type_name(), "FileConfig");
        assert_eq!(g.get("enable").and_then(Value::as_bool), Some(false));
        let rotation = g.get("rotation").and_then(Value::as_group).unwrap();
        assert_eq!(rotation.get("max_backup_index").and_then(Value::as_i64), Some(1));
        assert!(rotation.get("file_suffix").unwrap().is_absent());
    }

    #[test]
    fn fields_keep_declaration_order() {
        let group = sample();
        let names: Vec<&str> = group.fields().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["enable", "path", "rotation"]);
    }

    #[test]
    fn accept_replaces_value() {
        let mut g = sample();
        g.accept("enable", Value::Bool(true));
        assert_eq!(g.get("enable"), Some(&Value::Bool(true)));
    }

    #[test]
    fn table_omits_absent_values() {
        let table = sample().to_table();
        assert_eq!(table["path"].as_str(), Some("app.log"));
        let rotation = table["rotation"].as_table().unwrap();
        assert!(!rotation.contains_key("file_suffix"));
        assert_eq!(rotation["max_backup_index"].as_integer(), Some(1));
    }

    #[test]
    fn map_and_list_to_toml() {
        let mut map = BTreeMap::new();
        map.insert("us-east".to_string(), Value::List(vec![Value::Long(1), Value::Long(2)]));
        let toml = Value::Map(map).to_toml().unwrap();
        let list = toml["us-east"].as_array().unwrap();
        assert_eq!(list.len(), 2);
    }
}
