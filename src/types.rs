//! Passive metadata attached to schema declarations.
//!
//! These enums are the vocabulary a schema author uses to describe naming,
//! defaulting, phases and value types. The registrar reads them; nothing here
//! has behavior beyond small classification helpers.

use serde::{Deserialize, Serialize};

/// When a configuration root is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigPhase {
    /// Resolved during the build only; never visible at run time.
    #[default]
    BuildTime,
    /// Resolved during the build and visible at run time, but fixed.
    BuildAndRunTimeFixed,
    /// Visible at run time and read again when the process starts. Only roots
    /// in this phase may carry runtime-overridable attributes.
    RunTime,
}

impl ConfigPhase {
    pub fn is_available_at_run(self) -> bool {
        matches!(self, ConfigPhase::BuildAndRunTimeFixed | ConfigPhase::RunTime)
    }

    pub fn is_read_at_main(self) -> bool {
        matches!(self, ConfigPhase::RunTime)
    }
}

/// How an attribute (or root) derives the segment it contributes to its key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ItemName {
    /// Use the parent's key without consuming a segment.
    Parent,
    /// Use the attribute identifier verbatim.
    ElementName,
    /// Use the hyphenated attribute identifier (`maxBackupIndex` →
    /// `max-backup-index`).
    #[default]
    HyphenatedElementName,
    /// Use this name. It may contain dots, in which case it contributes
    /// several segments.
    Explicit(String),
}

/// A declared default, distinct from an explicitly empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DefaultValue {
    #[default]
    NoDefault,
    Value(String),
}

impl DefaultValue {
    pub fn is_supplied(&self) -> bool {
        matches!(self, DefaultValue::Value(_))
    }

    /// The supplied default, or `canonical` when none was given.
    pub fn or_canonical(&self, canonical: &str) -> String {
        match self {
            DefaultValue::Value(v) => v.clone(),
            DefaultValue::NoDefault => canonical.to_string(),
        }
    }
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        DefaultValue::Value(value.to_string())
    }
}

/// Primitive attribute shapes. Only `Boolean`, `Int`, `Long`, `Float` and
/// `Double` are bindable; the rest exist so schemas declaring them can be
/// rejected with a precise error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Byte,
    Short,
    Char,
}

impl Primitive {
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Char => "char",
        }
    }
}

/// Element type of object, list and optional leaves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    String,
    Boolean,
    Integer,
    Long,
    Float,
    Double,
    Path,
    /// A byte count written as `<n>[KMGTPE]` with binary multiples.
    MemorySize,
    /// One of a fixed set of names. Matching ignores case and treats `-` and
    /// `_` alike; the declared spelling is stored.
    Enum(Vec<String>),
}

impl ValueType {
    /// Numeric types default to `"0"` when no default is declared.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ValueType::Integer | ValueType::Long | ValueType::Float | ValueType::Double
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::Long => "long",
            ValueType::Float => "float",
            ValueType::Double => "double",
            ValueType::Path => "path",
            ValueType::MemorySize => "memory size",
            ValueType::Enum(_) => "enum",
        }
    }
}

/// Which roots a materializer builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializePhase {
    /// Every registered root.
    Build,
    /// Only roots whose phase is available at run time.
    Runtime,
}

impl MaterializePhase {
    pub fn includes(self, phase: ConfigPhase) -> bool {
        match self {
            MaterializePhase::Build => true,
            MaterializePhase::Runtime => phase.is_available_at_run(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_availability() {
        assert!(!ConfigPhase::BuildTime.is_available_at_run());
        assert!(ConfigPhase::BuildAndRunTimeFixed.is_available_at_run());
        assert!(ConfigPhase::RunTime.is_available_at_run());
        assert!(ConfigPhase::RunTime.is_read_at_main());
        assert!(!ConfigPhase::BuildAndRunTimeFixed.is_read_at_main());
    }

    #[test]
    fn runtime_materialization_skips_build_only_roots() {
        assert!(MaterializePhase::Build.includes(ConfigPhase::BuildTime));
        assert!(!MaterializePhase::Runtime.includes(ConfigPhase::BuildTime));
        assert!(MaterializePhase::Runtime.includes(ConfigPhase::RunTime));
    }

    #[test]
    fn no_default_differs_from_empty_default() {
        assert_ne!(DefaultValue::NoDefault, DefaultValue::from(""));
        assert_eq!(DefaultValue::NoDefault.or_canonical("0"), "0");
        assert_eq!(DefaultValue::from("").or_canonical("0"), "");
    }

    #[test]
    fn memory_size_is_not_numeric() {
        assert!(ValueType::Long.is_numeric());
        assert!(!ValueType::MemorySize.is_numeric());
        assert!(!ValueType::String.is_numeric());
    }
}
