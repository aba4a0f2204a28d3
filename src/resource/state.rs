//! State attribute accessors
//!
//! Read, write, delete, and sort attributes of a resource's refreshed state
//! by name. Writes rebuild the touched composite and reassign it at the root,
//! leaving the previous tree untouched.

use super::Resource;
use crate::value::{list_to_value, try_list_to_value, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Error for two-level writes whose parent block is not there
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttrError {
    #[error("attribute \"{0}\" is not a non-empty list")]
    MissingParent(String),

    #[error("first element of \"{0}\" is not an object")]
    NotComposite(String),
}

impl Resource {
    /// Borrow a non-null root attribute of the refreshed state
    pub fn state_attr(&self, attr: &str) -> Option<&Value> {
        self.instance_state
            .as_ref()
            .and_then(|state| state.attr(attr))
            .filter(|value| !value.is_null())
    }

    pub fn has_state_attr(&self, attr: &str) -> bool {
        self.state_attr(attr).is_some()
    }

    /// String rendering of an attribute, empty when absent
    pub fn get_state_attr(&self, attr: &str) -> String {
        self.state_attr(attr)
            .map(Value::to_string)
            .unwrap_or_default()
    }

    pub fn get_state_attr_slice(&self, attr: &str) -> Vec<Value> {
        self.state_attr(attr)
            .and_then(Value::as_list)
            .map(<[Value]>::to_vec)
            .unwrap_or_default()
    }

    pub fn get_state_attr_map(&self, attr: &str) -> BTreeMap<String, Value> {
        self.state_attr(attr)
            .and_then(Value::as_attrs)
            .cloned()
            .unwrap_or_default()
    }

    /// Set a root attribute, creating the state object if there is none
    pub fn set_state_attr(&mut self, attr: &str, value: Value) {
        let mut attrs = self.root_attrs();
        attrs.insert(attr.to_string(), value);
        self.instance_state = Some(Value::Object(attrs));
    }

    pub fn delete_state_attr(&mut self, attr: &str) {
        if self.instance_state.is_none() {
            return;
        }
        let mut attrs = self.root_attrs();
        attrs.remove(attr);
        self.instance_state = Some(Value::Object(attrs));
    }

    /// Sort a list of strings in place; no-op when the attribute is absent
    pub fn sort_state_attr_string_slice(&mut self, attr: &str) {
        let Some(Value::List(items)) = self.state_attr(attr) else {
            return;
        };
        let sorted = sorted_strings(items);
        self.set_state_attr(attr, list_to_value(sorted));
    }

    /// First element of the list at `first_attr` has a non-null `second_attr`
    pub fn has_state_attr_first_attr(&self, first_attr: &str, second_attr: &str) -> bool {
        self.first_element(first_attr)
            .is_some_and(|element| element.has_attr(second_attr))
    }

    pub fn get_state_attr_first_attr(&self, first_attr: &str, second_attr: &str) -> String {
        self.first_element(first_attr)
            .and_then(|element| element.attr(second_attr))
            .map(Value::to_string)
            .unwrap_or_default()
    }

    pub fn get_state_attr_first_attr_map(
        &self,
        first_attr: &str,
        second_attr: &str,
    ) -> BTreeMap<String, Value> {
        self.first_element(first_attr)
            .and_then(|element| element.attr(second_attr))
            .and_then(Value::as_attrs)
            .cloned()
            .unwrap_or_default()
    }

    /// Set `second_attr` inside the single block at `first_attr`
    ///
    /// The block is rewritten as a one-element list.
    pub fn set_state_attr_first_attr(
        &mut self,
        first_attr: &str,
        second_attr: &str,
        value: Value,
    ) -> Result<(), AttrError> {
        self.update_first_element(first_attr, |attrs| {
            attrs.insert(second_attr.to_string(), value);
        })
    }

    pub fn delete_state_attr_first_attr(
        &mut self,
        first_attr: &str,
        second_attr: &str,
    ) -> Result<(), AttrError> {
        self.update_first_element(first_attr, |attrs| {
            attrs.remove(second_attr);
        })
    }

    /// Sort the string list at `second_attr` inside every element of the
    /// list at `first_attr`
    ///
    /// Elements without `second_attr` are kept as they are. If the elements
    /// no longer share one shape the attribute is left untouched.
    pub fn sort_state_attr_each_attr_string_slice(&mut self, first_attr: &str, second_attr: &str) {
        let Some(Value::List(items)) = self.state_attr(first_attr) else {
            return;
        };

        let items: Vec<Value> = items
            .iter()
            .map(|item| match (item.as_attrs(), item.attr(second_attr)) {
                (Some(attrs), Some(Value::List(inner))) => {
                    let mut attrs = attrs.clone();
                    attrs.insert(second_attr.to_string(), list_to_value(sorted_strings(inner)));
                    Value::Object(attrs)
                }
                _ => item.clone(),
            })
            .collect();

        match try_list_to_value(items) {
            Ok(list) => self.set_state_attr(first_attr, list),
            Err(e) => tracing::warn!(
                "Leaving {}.{} unsorted on {}: {}",
                first_attr,
                second_attr,
                self.address,
                e
            ),
        }
    }

    fn root_attrs(&self) -> BTreeMap<String, Value> {
        self.instance_state
            .as_ref()
            .and_then(Value::as_attrs)
            .cloned()
            .unwrap_or_default()
    }

    fn first_element(&self, first_attr: &str) -> Option<&Value> {
        self.state_attr(first_attr)
            .and_then(Value::as_list)
            .and_then(|items| items.first())
    }

    fn update_first_element(
        &mut self,
        first_attr: &str,
        update: impl FnOnce(&mut BTreeMap<String, Value>),
    ) -> Result<(), AttrError> {
        let element = self
            .first_element(first_attr)
            .ok_or_else(|| AttrError::MissingParent(first_attr.to_string()))?;
        let mut attrs = element
            .as_attrs()
            .cloned()
            .ok_or_else(|| AttrError::NotComposite(first_attr.to_string()))?;

        update(&mut attrs);
        self.set_state_attr(first_attr, list_to_value(vec![Value::Object(attrs)]));
        Ok(())
    }
}

fn sorted_strings(items: &[Value]) -> Vec<Value> {
    let mut strings: Vec<String> = items.iter().map(Value::to_string).collect();
    strings.sort();
    strings.into_iter().map(Value::String).collect()
}
