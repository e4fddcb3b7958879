//! Declarative schema input.
//!
//! A schema is plain data: a [`RootDecl`] wraps a [`GroupDecl`] whose
//! [`FieldDecl`]s each carry a [`Shape`] plus naming and default metadata.
//! Declarations can be written by hand with the builder methods below or
//! derived from a confique struct (see [`introspect`](crate::introspect)).
//!
//! ```
//! use confbind::schema::{FieldDecl, GroupDecl, RootDecl, Shape};
//! use confbind::types::{ConfigPhase, Primitive, ValueType};
//!
//! let region = GroupDecl::group("RegionConfig")
//!     .field(FieldDecl::new("label", Shape::Object(ValueType::String)));
//!
//! let server = RootDecl::new(
//!     GroupDecl::new("ServerConfig")
//!         .field(FieldDecl::new("threads", Shape::Primitive(Primitive::Int)).default("10"))
//!         .field(FieldDecl::new("regions", Shape::map_of(Shape::Group(region)))),
//! )
//! .phase(ConfigPhase::RunTime);
//! # let _ = server;
//! ```

use crate::types::{ConfigPhase, DefaultValue, ItemName, Primitive, ValueType};

/// A top-level configuration root.
#[derive(Debug, Clone, PartialEq)]
pub struct RootDecl {
    pub group: GroupDecl,
    pub name: ItemName,
    pub phase: ConfigPhase,
}

impl RootDecl {
    pub fn new(group: GroupDecl) -> Self {
        Self {
            group,
            name: ItemName::default(),
            phase: ConfigPhase::default(),
        }
    }

    pub fn named(mut self, name: ItemName) -> Self {
        self.name = name;
        self
    }

    pub fn phase(mut self, phase: ConfigPhase) -> Self {
        self.phase = phase;
        self
    }
}

/// A statically shaped set of attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupDecl {
    pub type_name: String,
    /// Declared as a reusable group. Such types cannot also be roots.
    pub is_group: bool,
    pub fields: Vec<FieldDecl>,
}

impl GroupDecl {
    /// A type meant to be registered as a root.
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            is_group: false,
            fields: Vec::new(),
        }
    }

    /// A type declared as a nested group.
    pub fn group(type_name: &str) -> Self {
        Self {
            is_group: true,
            ..Self::new(type_name)
        }
    }

    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }
}

/// One attribute of a group.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub ident: String,
    pub name: ItemName,
    pub default: DefaultValue,
    pub shape: Shape,
    pub runtime_overridable: bool,
    pub doc: Option<String>,
}

impl FieldDecl {
    pub fn new(ident: &str, shape: Shape) -> Self {
        Self {
            ident: ident.to_string(),
            name: ItemName::default(),
            default: DefaultValue::NoDefault,
            shape,
            runtime_overridable: false,
            doc: None,
        }
    }

    pub fn named(mut self, name: ItemName) -> Self {
        self.name = name;
        self
    }

    pub fn default(mut self, value: &str) -> Self {
        self.default = DefaultValue::from(value);
        self
    }

    /// Mark the attribute as re-resolvable after the process has started.
    pub fn runtime_overridable(mut self) -> Self {
        self.runtime_overridable = true;
        self
    }

    pub fn doc(mut self, doc: &str) -> Self {
        self.doc = Some(doc.to_string());
        self
    }
}

/// The declared shape of an attribute.
///
/// `None` type parameters model raw, non-parameterized declarations, which the
/// registrar rejects where a parameter is required.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Group(GroupDecl),
    Primitive(Primitive),
    Map {
        key: Option<ValueType>,
        value: Option<Box<Shape>>,
    },
    List(Option<ValueType>),
    Optional(Option<ValueType>),
    Object(ValueType),
}

impl Shape {
    /// A string-keyed map of `value`.
    pub fn map_of(value: Shape) -> Self {
        Shape::Map {
            key: Some(ValueType::String),
            value: Some(Box::new(value)),
        }
    }

    pub fn list_of(element: ValueType) -> Self {
        Shape::List(Some(element))
    }

    pub fn optional_of(element: ValueType) -> Self {
        Shape::Optional(Some(element))
    }
}

/// Split a name into camel humps. `_` and `-` separate humps and are dropped;
/// runs of capitals stay together (`HTTPServer` → `HTTP`, `Server`).
pub fn camel_humps(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut humps = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' {
            if !current.is_empty() {
                humps.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary {
                humps.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        humps.push(current);
    }
    humps
}

/// `maxBackupIndex` / `max_backup_index` → `max-backup-index`.
pub fn hyphenate(ident: &str) -> String {
    camel_humps(ident)
        .iter()
        .map(|hump| hump.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Internal identifier of a root: `HttpServerConfig` → `httpServer`.
pub fn containing_name(type_name: &str) -> String {
    let mut humps = root_humps(type_name);
    if let Some(first) = humps.first_mut() {
        *first = first.to_lowercase();
    }
    humps.concat()
}

/// Hyphenated external name of a root: `HttpServerConfig` → `http-server`.
pub fn hyphenated_root_name(type_name: &str) -> String {
    root_humps(type_name)
        .iter()
        .map(|hump| hump.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

fn root_humps(type_name: &str) -> Vec<String> {
    let simple = type_name.rsplit("::").next().unwrap_or(type_name);
    let mut humps = camel_humps(simple);
    let is_suffix = |h: &String| {
        h.eq_ignore_ascii_case("config") || h.eq_ignore_ascii_case("configuration")
    };
    if humps.len() > 1 && humps.last().is_some_and(is_suffix) {
        humps.pop();
    }
    humps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humps_split_camel_case() {
        assert_eq!(camel_humps("maxBackupIndex"), vec!["max", "Backup", "Index"]);
        assert_eq!(camel_humps("HTTPServer"), vec!["HTTP", "Server"]);
        assert_eq!(camel_humps("max_backup_index"), vec!["max", "backup", "index"]);
    }

    #[test]
    fn hyphenate_camel_and_snake() {
        assert_eq!(hyphenate("maxBackupIndex"), "max-backup-index");
        assert_eq!(hyphenate("rotate_on_boot"), "rotate-on-boot");
        assert_eq!(hyphenate("threads"), "threads");
    }

    #[test]
    fn containing_name_strips_config_suffix() {
        assert_eq!(containing_name("ServerConfig"), "server");
        assert_eq!(containing_name("HttpServerConfiguration"), "httpServer");
        assert_eq!(containing_name("my_app::log::FileConfig"), "file");
        assert_eq!(containing_name("Config"), "config");
    }

    #[test]
    fn hyphenated_root_name_strips_suffix() {
        assert_eq!(hyphenated_root_name("HttpServerConfig"), "http-server");
        assert_eq!(hyphenated_root_name("Datasource"), "datasource");
    }

    #[test]
    fn builders_set_metadata() {
        let field = FieldDecl::new("threads", Shape::Primitive(Primitive::Int))
            .default("10")
            .named(ItemName::ElementName)
            .runtime_overridable()
            .doc("Worker threads.");
        assert_eq!(field.default, DefaultValue::from("10"));
        assert_eq!(field.name, ItemName::ElementName);
        assert!(field.runtime_overridable);
        assert_eq!(field.doc.as_deref(), Some("Worker threads."));

        let root = RootDecl::new(GroupDecl::new("ServerConfig").field(field))
            .phase(ConfigPhase::RunTime);
        assert_eq!(root.phase, ConfigPhase::RunTime);
        assert_eq!(root.name, ItemName::HyphenatedElementName);
        assert!(!root.group.is_group);
        assert!(GroupDecl::group("RegionConfig").is_group);
    }
}
