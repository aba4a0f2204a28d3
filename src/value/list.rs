//! List construction
//!
//! Provider APIs omit optional nested fields per item, so the elements of one
//! list can arrive with different object shapes. Before a list is built its
//! object elements are converted to their unified type.

use super::convert::convert_at;
use super::{unify, ConvertError, Type, Value};

/// Build a list value from items that share one schema
///
/// An empty input yields an explicit empty list. Object and map items are
/// unified first so every element carries the union of attributes.
///
/// # Panics
///
/// Panics when the items cannot be brought to one type. That means two
/// elements assumed to share a schema do not, which is a defect in the
/// caller rather than data to tolerate.
pub fn list_to_value(items: Vec<Value>) -> Value {
    match try_list_to_value(items) {
        Ok(list) => list,
        Err(e) => panic!("list elements do not share a schema: {}", e),
    }
}

/// Fallible form of [`list_to_value`]
pub fn try_list_to_value(items: Vec<Value>) -> Result<Value, ConvertError> {
    if !items.iter().any(Value::is_composite) {
        return Ok(Value::List(items));
    }

    let types: Vec<Type> = items.iter().map(Value::ty).collect();
    let Some(unified) = unify(&types) else {
        let shapes = types
            .iter()
            .map(Type::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(ConvertError::NoCommonType(shapes));
    };

    tracing::trace!("Unified {} list items to {}", items.len(), unified);

    items
        .iter()
        .enumerate()
        .map(|(i, item)| convert_at(item, &unified, &format!("[{}]", i)))
        .collect::<Result<Vec<_>, ConvertError>>()
        .map(Value::List)
}
