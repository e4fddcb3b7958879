use thiserror::Error;

/// Every failure the engine can report.
///
/// Schema errors come out of registration and abort the build before anything
/// is materialized. Conversion errors name the offending property. Unknown
/// namespaced keys are not errors at all; the loader reports them in its
/// [`LoadReport`](crate::LoadReport).
#[derive(Debug, Error)]
pub enum BindError {
    // -- schema ---------------------------------------------------------------
    #[error("Duplicate configuration root name \"{name}\" (declared by {type_name})")]
    DuplicateRoot { name: String, type_name: String },

    #[error("Duplicate configuration pattern \"{pattern}\"")]
    DuplicatePattern { pattern: String },

    #[error("Roots cannot be declared as groups: {type_name}")]
    GroupAsRoot { type_name: String },

    #[error("Root cannot inherit parent name because it has no parent: {type_name}")]
    RootInheritsParent { type_name: String },

    #[error("Unsupported primitive field type '{primitive}' at {field}")]
    UnsupportedPrimitive {
        field: String,
        primitive: &'static str,
    },

    #[error("Map key must be a string at {field}")]
    MapKeyNotString { field: String },

    #[error("{shape} must be parameterized at {field}")]
    NotParameterized { field: String, shape: &'static str },

    #[error("Optionals are not allowed as a map value type at {field}")]
    OptionalMapValue { field: String },

    #[error("Unsupported default value on group field {field}")]
    GroupDefault { field: String },

    #[error("Invalid default value for '{key}': {reason}")]
    InvalidDefault { key: String, reason: String },

    #[error("Field {field} is runtime-overridable but its root is not read at runtime")]
    OverridableOutsideRuntime { field: String },

    // -- loading --------------------------------------------------------------
    #[error("Invalid value '{value}' for '{key}': {reason}")]
    Conversion {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Failed to parse property source: {0}")]
    SourceParse(#[from] toml::de::Error),

    #[error("Invalid property definition '{0}' (expected name=value)")]
    InvalidDefinition(String),

    // -- materialization ------------------------------------------------------
    #[error("Unknown root type: {0}")]
    UnknownRoot(String),

    #[error("Construction plan was compiled from a different schema; recompile it")]
    StalePlan,

    #[error("Malformed construction plan: {0}")]
    PlanFormat(#[from] serde_json::Error),

    #[error("Construction plan for {root} does not fit its schema: {reason}")]
    MalformedPlan { root: String, reason: String },

    #[error("Cannot extract root {type_name}: {reason}")]
    Extract { type_name: String, reason: String },
}

impl BindError {
    /// Whether this error was raised by schema registration.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            BindError::DuplicateRoot { .. }
                | BindError::DuplicatePattern { .. }
                | BindError::GroupAsRoot { .. }
                | BindError::RootInheritsParent { .. }
                | BindError::UnsupportedPrimitive { .. }
                | BindError::MapKeyNotString { .. }
                | BindError::NotParameterized { .. }
                | BindError::OptionalMapValue { .. }
                | BindError::GroupDefault { .. }
                | BindError::InvalidDefault { .. }
                | BindError::OverridableOutsideRuntime { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_root_formats_correctly() {
        let err = BindError::DuplicateRoot {
            name: "server".into(),
            type_name: "ServerConfig".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("\"server\""));
        assert!(msg.contains("ServerConfig"));
        assert!(err.is_schema_error());
    }

    #[test]
    fn conversion_formats_key_and_value() {
        let err = BindError::Conversion {
            key: "app.server.threads".into(),
            value: "many".into(),
            reason: "invalid integer".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("app.server.threads"));
        assert!(msg.contains("many"));
        assert!(!err.is_schema_error());
    }

    #[test]
    fn unknown_root_is_not_schema_error() {
        let err = BindError::UnknownRoot("LogConfig".into());
        assert!(err.to_string().contains("LogConfig"));
        assert!(!err.is_schema_error());
    }
}
