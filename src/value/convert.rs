//! Type unification and value conversion

use super::{Type, Value};
use serde_json::Number;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Failure to bring a value or a set of shapes to a common type
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConvertError {
    #[error("{path}: cannot convert {from} to {to}")]
    Incompatible {
        path: String,
        from: String,
        to: String,
    },

    #[error("{path}: unexpected attribute \"{attr}\"")]
    UnexpectedAttribute { path: String, attr: String },

    #[error("no common type for [{0}]")]
    NoCommonType(String),
}

/// Compute the least upper bound of a set of types
///
/// Nulls ([`Type::Dynamic`]) unify with everything. Strings absorb numbers
/// and bools. Objects unify to an object carrying the union of their
/// attributes; objects mixed with maps unify to a map. Returns `None` when
/// the shapes cannot be reconciled.
pub fn unify(types: &[Type]) -> Option<Type> {
    let concrete: Vec<&Type> = types.iter().filter(|t| **t != Type::Dynamic).collect();
    let Some(first) = concrete.first() else {
        return Some(Type::Dynamic);
    };

    if concrete.iter().all(|t| t == first) {
        return Some((*first).clone());
    }

    if concrete.iter().all(|t| t.is_primitive()) {
        return unify_primitives(&concrete);
    }

    if concrete.iter().all(|t| matches!(t, Type::Object(_))) {
        return unify_objects(&concrete);
    }

    if concrete
        .iter()
        .all(|t| matches!(t, Type::Object(_) | Type::Map(_)))
    {
        return unify_as_map(&concrete);
    }

    if concrete.iter().all(|t| matches!(t, Type::List(_))) {
        let elems: Vec<Type> = concrete
            .iter()
            .filter_map(|t| match t {
                Type::List(elem) => Some((**elem).clone()),
                _ => None,
            })
            .collect();
        return unify(&elems).map(|elem| Type::List(Box::new(elem)));
    }

    None
}

fn unify_primitives(types: &[&Type]) -> Option<Type> {
    if types.contains(&&Type::String) {
        return Some(Type::String);
    }
    // number and bool have no common representation
    None
}

fn unify_objects(types: &[&Type]) -> Option<Type> {
    let names: BTreeSet<&String> = types
        .iter()
        .filter_map(|t| match t {
            Type::Object(attrs) => Some(attrs.keys()),
            _ => None,
        })
        .flatten()
        .collect();

    let mut unified = BTreeMap::new();
    for name in names {
        let attr_types: Vec<Type> = types
            .iter()
            .filter_map(|t| match t {
                Type::Object(attrs) => attrs.get(name).cloned(),
                _ => None,
            })
            .collect();
        unified.insert(name.clone(), unify(&attr_types)?);
    }
    Some(Type::Object(unified))
}

fn unify_as_map(types: &[&Type]) -> Option<Type> {
    let mut elems = Vec::new();
    for ty in types {
        match ty {
            Type::Map(elem) => elems.push((**elem).clone()),
            Type::Object(attrs) => elems.extend(attrs.values().cloned()),
            _ => return None,
        }
    }
    unify(&elems).map(|elem| Type::Map(Box::new(elem)))
}

/// Convert a value to the given type
///
/// Nulls convert to any type. Object targets fill absent attributes with
/// null and reject attributes the target does not declare.
pub fn convert(value: &Value, ty: &Type) -> Result<Value, ConvertError> {
    convert_at(value, ty, "")
}

pub(super) fn convert_at(value: &Value, ty: &Type, path: &str) -> Result<Value, ConvertError> {
    match (value, ty) {
        (Value::Null, _) | (_, Type::Dynamic) => Ok(value.clone()),
        (Value::String(_), Type::String)
        | (Value::Number(_), Type::Number)
        | (Value::Bool(_), Type::Bool) => Ok(value.clone()),
        (Value::Number(n), Type::String) => Ok(Value::String(n.to_string())),
        (Value::Bool(b), Type::String) => Ok(Value::String(b.to_string())),
        (Value::String(s), Type::Number) => serde_json::from_str::<Number>(s.trim())
            .map(Value::Number)
            .map_err(|_| incompatible(value, ty, path)),
        (Value::String(s), Type::Bool) => match s.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(incompatible(value, ty, path)),
        },
        (Value::List(items), Type::List(elem)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| convert_at(item, elem, &format!("{}[{}]", path, i)))
            .collect::<Result<Vec<_>, ConvertError>>()
            .map(Value::List),
        (Value::Object(entries) | Value::Map(entries), Type::Map(elem)) => entries
            .iter()
            .map(|(k, v)| Ok((k.clone(), convert_at(v, elem, &format!("{}.{}", path, k))?)))
            .collect::<Result<BTreeMap<_, _>, ConvertError>>()
            .map(Value::Map),
        (Value::Object(entries) | Value::Map(entries), Type::Object(attrs)) => {
            if let Some(extra) = entries.keys().find(|k| !attrs.contains_key(*k)) {
                return Err(ConvertError::UnexpectedAttribute {
                    path: path.to_string(),
                    attr: extra.clone(),
                });
            }
            attrs
                .iter()
                .map(|(name, attr_ty)| {
                    let converted = match entries.get(name) {
                        Some(v) => convert_at(v, attr_ty, &format!("{}.{}", path, name))?,
                        None => Value::Null,
                    };
                    Ok((name.clone(), converted))
                })
                .collect::<Result<BTreeMap<_, _>, ConvertError>>()
                .map(Value::Object)
        }
        _ => Err(incompatible(value, ty, path)),
    }
}

fn incompatible(value: &Value, ty: &Type, path: &str) -> ConvertError {
    ConvertError::Incompatible {
        path: if path.is_empty() { ".".to_string() } else { path.to_string() },
        from: value.ty().to_string(),
        to: ty.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object_type(attrs: &[(&str, Type)]) -> Type {
        Type::Object(
            attrs
                .iter()
                .map(|(name, ty)| (name.to_string(), ty.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_unify_identical() {
        assert_eq!(unify(&[Type::Number, Type::Number]), Some(Type::Number));
        assert_eq!(unify(&[]), Some(Type::Dynamic));
    }

    #[test]
    fn test_unify_null_with_anything() {
        assert_eq!(unify(&[Type::Dynamic, Type::Bool]), Some(Type::Bool));
    }

    #[test]
    fn test_unify_string_absorbs_primitives() {
        assert_eq!(
            unify(&[Type::Number, Type::String, Type::Bool]),
            Some(Type::String)
        );
        assert_eq!(unify(&[Type::Number, Type::Bool]), None);
    }

    #[test]
    fn test_unify_objects_union_attributes() {
        let a = object_type(&[("name", Type::String)]);
        let b = object_type(&[("name", Type::String), ("port", Type::Number)]);
        assert_eq!(
            unify(&[a, b]),
            Some(object_type(&[("name", Type::String), ("port", Type::Number)]))
        );
    }

    #[test]
    fn test_unify_objects_conflicting_attribute() {
        let a = object_type(&[("rules", Type::List(Box::new(Type::String)))]);
        let b = object_type(&[("rules", Type::Bool)]);
        assert_eq!(unify(&[a, b]), None);
    }

    #[test]
    fn test_unify_object_with_map() {
        let a = object_type(&[("env", Type::String)]);
        let b = Type::Map(Box::new(Type::String));
        assert_eq!(unify(&[a, b]), Some(Type::Map(Box::new(Type::String))));
    }

    #[test]
    fn test_convert_fills_missing_attributes() {
        let value = Value::from(json!({"name": "a"}));
        let ty = object_type(&[("name", Type::String), ("port", Type::Number)]);
        let converted = convert(&value, &ty).unwrap();
        assert_eq!(converted, Value::from(json!({"name": "a", "port": null})));
    }

    #[test]
    fn test_convert_rejects_undeclared_attribute() {
        let value = Value::from(json!({"name": "a", "extra": 1}));
        let ty = object_type(&[("name", Type::String)]);
        assert!(matches!(
            convert(&value, &ty),
            Err(ConvertError::UnexpectedAttribute { attr, .. }) if attr == "extra"
        ));
    }

    #[test]
    fn test_convert_primitives() {
        assert_eq!(
            convert(&Value::from(8080), &Type::String).unwrap(),
            Value::from("8080")
        );
        assert_eq!(
            convert(&Value::from("12"), &Type::Number).unwrap(),
            Value::from(12)
        );
        assert!(convert(&Value::from("twelve"), &Type::Number).is_err());
        assert_eq!(
            convert(&Value::from("true"), &Type::Bool).unwrap(),
            Value::from(true)
        );
    }

    #[test]
    fn test_convert_error_reports_path() {
        let value = Value::from(json!({"ports": ["http"]}));
        let ty = object_type(&[("ports", Type::List(Box::new(Type::Number)))]);
        let err = convert(&value, &ty).unwrap_err();
        assert_eq!(
            err,
            ConvertError::Incompatible {
                path: ".ports[0]".to_string(),
                from: "string".to_string(),
                to: "number".to_string(),
            }
        );
    }
}
