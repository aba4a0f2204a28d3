//! Structured values
//!
//! Refreshed resource state is held as a closed, dynamically typed tree.
//! Every node carries enough shape information (see [`Type`]) to be unified
//! with a sibling of a different but convertible shape.
//!
//! # Module Structure
//!
//! - [`convert`] - Type unification and value conversion
//! - [`list`] - List construction with element unification

mod convert;
mod list;

pub use convert::{convert, unify, ConvertError};
pub use list::{list_to_value, try_list_to_value};

use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::collections::BTreeMap;
use std::fmt;

/// Shape of a [`Value`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// Shape of a null; unifies with every other type
    Dynamic,
    Bool,
    Number,
    String,
    List(Box<Type>),
    /// String-keyed collection with one element type
    Map(Box<Type>),
    /// Fixed attribute set, each attribute with its own type
    Object(BTreeMap<String, Type>),
}

impl Type {
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Bool | Type::Number | Type::String)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Dynamic => write!(f, "dynamic"),
            Type::Bool => write!(f, "bool"),
            Type::Number => write!(f, "number"),
            Type::String => write!(f, "string"),
            Type::List(elem) => write!(f, "list({})", elem),
            Type::Map(elem) => write!(f, "map({})", elem),
            Type::Object(attrs) => {
                write!(f, "object({{")?;
                for (i, (name, ty)) in attrs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, ty)?;
                }
                write!(f, "}})")
            }
        }
    }
}

/// One node of a resource state tree
///
/// JSON objects deserialize as [`Value::Object`]; [`Value::Map`] only appears
/// when a value is converted to a map type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<Value>),
    Object(BTreeMap<String, Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// An object from (name, value) pairs
    pub fn object<K, I>(attrs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(attrs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// A list of strings, without unification
    pub fn string_list<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        Value::List(items.into_iter().map(|s| Value::String(s.into())).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Map(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Attributes of an object, or entries of a map
    pub fn as_attrs(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(attrs) | Value::Map(attrs) => Some(attrs),
            _ => None,
        }
    }

    /// Look up a child by attribute name, map key, or list index
    pub fn attr(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(attrs) | Value::Map(attrs) => attrs.get(name),
            Value::List(items) => name.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// True if the child exists and is not null
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some_and(|v| !v.is_null())
    }

    /// Compute the shape of this value
    ///
    /// Lists and maps whose elements do not unify report a dynamic element
    /// type.
    pub fn ty(&self) -> Type {
        match self {
            Value::Null => Type::Dynamic,
            Value::Bool(_) => Type::Bool,
            Value::Number(_) => Type::Number,
            Value::String(_) => Type::String,
            Value::List(items) => {
                let types: Vec<Type> = items.iter().map(Value::ty).collect();
                Type::List(Box::new(unify(&types).unwrap_or(Type::Dynamic)))
            }
            Value::Map(entries) => {
                let types: Vec<Type> = entries.values().map(Value::ty).collect();
                Type::Map(Box::new(unify(&types).unwrap_or(Type::Dynamic)))
            }
            Value::Object(attrs) => Type::Object(
                attrs
                    .iter()
                    .map(|(name, value)| (name.clone(), value.ty()))
                    .collect(),
            ),
        }
    }
}

/// Renders strings verbatim, integers without a fraction, other numbers with
/// six decimals, and composites as compact JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::String(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) if n.is_i64() || n.is_u64() => write!(f, "{}", n),
            Value::Number(n) => match n.as_f64() {
                Some(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
                    write!(f, "{}", v as i64)
                }
                Some(v) => write!(f, "{:.6}", v),
                None => write!(f, "{}", n),
            },
            Value::List(_) | Value::Object(_) | Value::Map(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                write!(f, "{}", json)
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(attrs) => Value::Object(
                attrs
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_objects_become_objects() {
        let value = Value::from(json!({"name": "web", "ports": [80, 443]}));
        assert!(matches!(value, Value::Object(_)));
        assert_eq!(value.attr("name"), Some(&Value::from("web")));
        assert_eq!(value.attr("ports").and_then(|p| p.attr("1")), Some(&Value::from(443)));
    }

    #[test]
    fn test_deserialize_matches_from_json() {
        let doc = json!({"a": null, "b": [true, "x"], "c": {"d": 1.5}});
        let parsed: Value = serde_json::from_value(doc.clone()).unwrap();
        assert_eq!(parsed, Value::from(doc));
    }

    #[test]
    fn test_has_attr_ignores_nulls() {
        let value = Value::from(json!({"present": "yes", "missing": null}));
        assert!(value.has_attr("present"));
        assert!(!value.has_attr("missing"));
        assert!(!value.has_attr("absent"));
    }

    #[test]
    fn test_display_numbers() {
        assert_eq!(Value::from(42).to_string(), "42");
        assert_eq!(Value::from(json!(3.0)).to_string(), "3");
        assert_eq!(Value::from(json!(2.5)).to_string(), "2.500000");
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn test_object_type_lists_attributes() {
        let value = Value::from(json!({"name": "a", "size": 1}));
        let Type::Object(attrs) = value.ty() else {
            panic!("expected object type");
        };
        assert_eq!(attrs.get("name"), Some(&Type::String));
        assert_eq!(attrs.get("size"), Some(&Type::Number));
    }

    #[test]
    fn test_type_display() {
        let ty = Type::List(Box::new(Type::Object(BTreeMap::from([(
            "name".to_string(),
            Type::String,
        )]))));
        assert_eq!(ty.to_string(), "list(object({name: string}))");
    }
}
