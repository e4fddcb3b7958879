//! String → typed value conversion, keyed by leaf kind.
//!
//! Every raw property value is a string. The leaf kind decides how it is read:
//! primitives parse strictly, object leaves read an empty string as "no
//! value", lists split on unescaped commas, optionals read an empty string as
//! absent.

use std::path::PathBuf;

use crate::descriptor::LeafKind;
use crate::types::ValueType;
use crate::value::Value;

/// Convert `raw` according to `kind`. The error is a human-readable reason;
/// callers attach the property name.
pub fn convert(kind: &LeafKind, raw: &str) -> Result<Value, String> {
    match kind {
        LeafKind::Boolean => parse_bool(raw).map(Value::Bool),
        LeafKind::Int => parse_number(raw, "integer").map(Value::Int),
        LeafKind::Long => parse_number(raw, "long").map(Value::Long),
        LeafKind::Float => parse_number(raw, "float").map(Value::Float),
        LeafKind::Double => parse_number(raw, "double").map(Value::Double),
        LeafKind::Object(ValueType::String) => Ok(Value::String(raw.to_string())),
        LeafKind::Object(_) if raw.is_empty() => Ok(Value::Unset),
        LeafKind::Object(ty) => convert_scalar(ty, raw),
        LeafKind::ObjectList(ty) => split_list(raw)
            .iter()
            .map(|item| convert_scalar(ty, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        LeafKind::OptionalObject(_) if raw.is_empty() => Ok(Value::Optional(None)),
        LeafKind::OptionalObject(ty) => {
            convert_scalar(ty, raw).map(|v| Value::Optional(Some(Box::new(v))))
        }
    }
}

/// Convert a single non-empty element of type `ty`.
pub fn convert_scalar(ty: &ValueType, raw: &str) -> Result<Value, String> {
    match ty {
        ValueType::String => Ok(Value::String(raw.to_string())),
        ValueType::Boolean => parse_bool(raw).map(Value::Bool),
        ValueType::Integer => parse_number(raw, "integer").map(Value::Int),
        ValueType::Long => parse_number(raw, "long").map(Value::Long),
        ValueType::Float => parse_number(raw, "float").map(Value::Float),
        ValueType::Double => parse_number(raw, "double").map(Value::Double),
        ValueType::Path => Ok(Value::Path(PathBuf::from(raw))),
        ValueType::MemorySize => parse_memory_size(raw).map(Value::MemorySize),
        ValueType::Enum(variants) => parse_enum(raw, variants).map(Value::String),
    }
}

/// Parse a boolean from common string representations.
pub fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" => Ok(true),
        "false" | "0" | "no" | "n" | "off" => Ok(false),
        _ => Err(format!(
            "invalid boolean: '{value}' (expected true/false, yes/no, on/off, 1/0)"
        )),
    }
}

fn parse_number<N: std::str::FromStr>(value: &str, what: &str) -> Result<N, String> {
    value
        .trim()
        .parse::<N>()
        .map_err(|_| format!("invalid {what}: '{value}'"))
}

/// Parse `<n>[BKMGTPE]` (case-insensitive, binary multiples) into bytes.
pub fn parse_memory_size(value: &str) -> Result<u64, String> {
    let trimmed = value.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, suffix) = trimmed.split_at(split);
    let invalid = || format!("invalid memory size: '{value}'");

    if digits.is_empty() {
        return Err(invalid());
    }
    let shift = match suffix.to_ascii_uppercase().as_str() {
        "" | "B" => 0,
        "K" => 10,
        "M" => 20,
        "G" => 30,
        "T" => 40,
        "P" => 50,
        "E" => 60,
        _ => return Err(invalid()),
    };
    let amount: u64 = digits.parse().map_err(|_| invalid())?;
    amount
        .checked_mul(1u64 << shift)
        .ok_or_else(|| format!("memory size out of range: '{value}'"))
}

fn parse_enum(value: &str, variants: &[String]) -> Result<String, String> {
    let wanted = normalize_variant(value.trim());
    variants
        .iter()
        .find(|v| normalize_variant(v) == wanted)
        .cloned()
        .ok_or_else(|| format!("'{value}' is not one of: {}", variants.join(", ")))
}

fn normalize_variant(s: &str) -> String {
    s.chars()
        .map(|c| if c == '_' { '-' } else { c.to_ascii_lowercase() })
        .collect()
}

/// Split a list value on commas. `\,` is a literal comma; empty items are
/// dropped.
pub fn split_list(raw: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&',') => {
                current.push(',');
                chars.next();
            }
            ',' => items.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    items.push(current);
    items.retain(|item| !item.is_empty());
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_parse() {
        assert_eq!(convert(&LeafKind::Boolean, "TRUE").unwrap(), Value::Bool(true));
        assert_eq!(convert(&LeafKind::Int, "20").unwrap(), Value::Int(20));
        assert_eq!(convert(&LeafKind::Long, "-5").unwrap(), Value::Long(-5));
        assert_eq!(convert(&LeafKind::Double, "1.5").unwrap(), Value::Double(1.5));
        assert_eq!(convert(&LeafKind::Float, "0").unwrap(), Value::Float(0.0));
    }

    #[test]
    fn primitive_rejects_garbage() {
        let err = convert(&LeafKind::Int, "many").unwrap_err();
        assert!(err.contains("many"));
        assert!(convert(&LeafKind::Boolean, "maybe").is_err());
    }

    #[test]
    fn int_overflow_rejected() {
        assert!(convert(&LeafKind::Int, "3000000000").is_err());
        assert!(convert(&LeafKind::Long, "3000000000").is_ok());
    }

    #[test]
    fn empty_object_is_unset_unless_string() {
        assert_eq!(
            convert(&LeafKind::Object(ValueType::String), "").unwrap(),
            Value::String(String::new())
        );
        assert_eq!(
            convert(&LeafKind::Object(ValueType::Path), "").unwrap(),
            Value::Unset
        );
    }

    #[test]
    fn optional_empty_is_absent() {
        assert_eq!(
            convert(&LeafKind::OptionalObject(ValueType::MemorySize), "").unwrap(),
            Value::Optional(None)
        );
        assert_eq!(
            convert(&LeafKind::OptionalObject(ValueType::MemorySize), "10M").unwrap(),
            Value::Optional(Some(Box::new(Value::MemorySize(10 * 1024 * 1024))))
        );
    }

    #[test]
    fn list_splits_on_unescaped_commas() {
        assert_eq!(split_list("a,b\\,c,,d"), vec!["a", "b,c", "d"]);
        assert!(split_list("").is_empty());
        assert_eq!(
            convert(&LeafKind::ObjectList(ValueType::Integer), "1,2,3").unwrap(),
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn list_element_error_propagates() {
        assert!(convert(&LeafKind::ObjectList(ValueType::Integer), "1,x").is_err());
    }

    #[test]
    fn memory_sizes() {
        assert_eq!(parse_memory_size("512").unwrap(), 512);
        assert_eq!(parse_memory_size("1k").unwrap(), 1024);
        assert_eq!(parse_memory_size("2G").unwrap(), 2 << 30);
        assert!(parse_memory_size("10X").is_err());
        assert!(parse_memory_size("M").is_err());
        assert!(parse_memory_size("100000E").is_err());
    }

    #[test]
    fn enum_matching_ignores_case_and_separator() {
        let levels = ValueType::Enum(vec!["ALL".into(), "DEBUG_FINE".into()]);
        assert_eq!(
            convert_scalar(&levels, "debug-fine").unwrap(),
            Value::String("DEBUG_FINE".into())
        );
        let err = convert_scalar(&levels, "loud").unwrap_err();
        assert!(err.contains("ALL"));
    }
}
