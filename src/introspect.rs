//! Derive schema declarations from confique config structs.
//!
//! A `#[derive(confique::Config)]` struct already carries everything the
//! registrar needs in its static [`Meta`]: field names, doc comments, nesting,
//! optionality and default expressions. This module walks that metadata and
//! produces a [`RootDecl`], so a struct can serve as the schema without a
//! hand-written declaration.
//!
//! Leaf types are inferred from the default expression since confique does not
//! record Rust types. Leaves without a default are plain strings; the typed
//! extraction through [`RealizedConfig::root`](crate::RealizedConfig::root)
//! parses them into the real field type.

use confique::meta::{Expr, FieldKind, LeafKind, Meta};

use crate::error::BindError;
use crate::schema::{FieldDecl, GroupDecl, RootDecl, Shape};
use crate::types::{ItemName, Primitive, ValueType};

/// The root declaration for config struct `C`.
pub fn root_from_config<C: confique::Config>() -> Result<RootDecl, BindError> {
    Ok(RootDecl::new(group_from_meta(&C::META)?))
}

/// Walk `meta` into a group declaration. Nested structs become groups and
/// leaf names are used verbatim as key segments.
pub fn group_from_meta(meta: &Meta) -> Result<GroupDecl, BindError> {
    let mut group = GroupDecl::new(meta.name);
    for field in meta.fields {
        let label = format!("{}.{}", meta.name, field.name);
        let mut decl = match &field.kind {
            FieldKind::Nested { meta, .. } => {
                let mut nested = group_from_meta(meta)?;
                nested.is_group = true;
                FieldDecl::new(field.name, Shape::Group(nested))
            }
            FieldKind::Leaf { kind, .. } => leaf_decl(field.name, kind, &label)?,
        };
        decl = decl.named(ItemName::ElementName);
        if !field.doc.is_empty() {
            let doc: Vec<&str> = field.doc.iter().map(|line| line.trim()).collect();
            decl = decl.doc(&doc.join("\n"));
        }
        group = group.field(decl);
    }
    Ok(group)
}

fn leaf_decl(name: &str, kind: &LeafKind, label: &str) -> Result<FieldDecl, BindError> {
    match kind {
        LeafKind::Optional => Ok(FieldDecl::new(name, Shape::optional_of(ValueType::String))),
        LeafKind::Required { default: None } => {
            Ok(FieldDecl::new(name, Shape::Object(ValueType::String)))
        }
        LeafKind::Required { default: Some(expr) } => {
            let (shape, default) = from_default(expr, label)?;
            Ok(FieldDecl::new(name, shape).default(&default))
        }
    }
}

/// Shape and default string implied by a default expression.
fn from_default(expr: &Expr, label: &str) -> Result<(Shape, String), BindError> {
    let unsupported = || BindError::InvalidDefault {
        key: label.to_string(),
        reason: "map defaults cannot be bound to a single property".into(),
    };
    match expr {
        Expr::Bool(b) => Ok((Shape::Primitive(Primitive::Boolean), b.to_string())),
        Expr::Integer(i) => Ok((Shape::Primitive(Primitive::Long), i.to_string())),
        Expr::Float(f) => Ok((Shape::Primitive(Primitive::Double), f.to_string())),
        Expr::Str(s) => Ok((Shape::Object(ValueType::String), s.to_string())),
        Expr::Array(items) => {
            let rendered = items
                .iter()
                .map(|item| scalar(item).map(|s| s.replace(',', "\\,")))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| BindError::InvalidDefault {
                    key: label.to_string(),
                    reason: "list defaults must hold scalars".into(),
                })?;
            Ok((Shape::list_of(ValueType::String), rendered.join(",")))
        }
        _ => Err(unsupported()),
    }
}

fn scalar(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Bool(b) => Some(b.to_string()),
        Expr::Integer(i) => Some(i.to_string()),
        Expr::Float(f) => Some(f.to_string()),
        Expr::Str(s) => Some(s.to_string()),
        _ => None,
    }
}
