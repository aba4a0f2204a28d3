//! Post-convert hooks
//!
//! Per-service fixups applied to refreshed state before filtering and
//! emission, for attributes the provider reports in a form the emitted
//! config cannot use as-is.

use crate::resource::Resource;
use crate::value::list_to_value;

/// Fixup applied to every refreshed resource of one type
pub trait PostConvertHook: Send + Sync {
    fn resource_type(&self) -> &str;

    fn post_convert(&self, resource: &mut Resource);
}

/// Make sure a required list attribute is present, even when empty
#[derive(Debug, Clone)]
pub struct EnsureEmptyList {
    resource_type: String,
    attr: String,
}

impl EnsureEmptyList {
    pub fn new(resource_type: &str, attr: &str) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            attr: attr.to_string(),
        }
    }
}

impl PostConvertHook for EnsureEmptyList {
    fn resource_type(&self) -> &str {
        &self.resource_type
    }

    fn post_convert(&self, resource: &mut Resource) {
        if !resource.has_state_attr(&self.attr) {
            resource.set_state_attr(&self.attr, list_to_value(Vec::new()));
        }
    }
}

/// Sort an unordered string set so repeated imports diff cleanly
#[derive(Debug, Clone)]
pub struct SortStringList {
    resource_type: String,
    attr: String,
    nested_attr: Option<String>,
}

impl SortStringList {
    pub fn new(resource_type: &str, attr: &str) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            attr: attr.to_string(),
            nested_attr: None,
        }
    }

    /// Sort `nested_attr` inside every element of the list at `attr`
    pub fn nested(resource_type: &str, attr: &str, nested_attr: &str) -> Self {
        Self {
            nested_attr: Some(nested_attr.to_string()),
            ..Self::new(resource_type, attr)
        }
    }
}

impl PostConvertHook for SortStringList {
    fn resource_type(&self) -> &str {
        &self.resource_type
    }

    fn post_convert(&self, resource: &mut Resource) {
        match &self.nested_attr {
            Some(nested) => resource.sort_state_attr_each_attr_string_slice(&self.attr, nested),
            None => resource.sort_state_attr_string_slice(&self.attr),
        }
    }
}

/// Hooks for the resource types shipped with this tool
pub fn default_hooks() -> Vec<Box<dyn PostConvertHook>> {
    vec![
        // services is required but may be empty
        Box::new(EnsureEmptyList::new(
            "datadog_integration_aws_log_collection",
            "services",
        )),
        Box::new(SortStringList::new(
            "datadog_integration_aws_log_collection",
            "services",
        )),
        Box::new(SortStringList::nested(
            "google_compute_firewall",
            "allow",
            "ports",
        )),
    ]
}

/// Apply every matching hook to every refreshed resource
///
/// Resources without state are skipped; there is nothing to fix up.
pub fn run_hooks(hooks: &[Box<dyn PostConvertHook>], resources: &mut [Resource]) {
    for resource in resources.iter_mut() {
        if resource.instance_state.is_none() {
            continue;
        }
        for hook in hooks {
            if hook.resource_type() == resource.address.resource_type {
                hook.post_convert(resource);
            }
        }
    }
}
