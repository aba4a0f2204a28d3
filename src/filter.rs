//! Resource filters
//!
//! A [`ResourceFilter`] decides whether a resource is kept. It is scoped to a
//! service (or to all services), addresses a value with a dotted attribute
//! path, and either compares the values found there against an accepted set
//! or, with no accepted set, only checks that the path resolves.
//!
//! Paths are walked over the JSON rendering of the refreshed state. Lists
//! fan out: the rest of the path is applied to every element and the
//! results are flattened.

use crate::resource::Resource;
use serde_json::Value as Json;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Path that compares against the import id instead of the state
const ID_PATH: &str = "id";

/// Separator between accepted values in filter expressions
const VALUE_SEPARATOR: &str = ":";

/// Filter for resources
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceFilter {
    /// Service the filter applies to; empty applies to every service
    pub service_name: String,
    /// Dotted attribute path, or `id`
    pub field_path: String,
    /// Accepted values; `None` only checks that the path resolves
    pub acceptable_values: Option<Vec<String>>,
}

impl ResourceFilter {
    pub fn new(
        service_name: &str,
        field_path: &str,
        acceptable_values: Option<Vec<String>>,
    ) -> Self {
        Self {
            service_name: service_name.to_string(),
            field_path: field_path.to_string(),
            acceptable_values,
        }
    }

    pub fn is_applicable(&self, service_name: &str) -> bool {
        self.service_name.is_empty() || self.service_name == service_name
    }

    /// Id filters need no refreshed state and can run right after listing
    pub fn is_initial(&self) -> bool {
        self.field_path == ID_PATH
    }

    /// Decide whether `resource` is kept
    ///
    /// Resources of other services are always kept. A state that cannot be
    /// inspected drops the resource.
    pub fn filter(&self, resource: &Resource) -> bool {
        if !self.is_applicable(resource.service_name()) {
            return true;
        }

        // id is only ever compared against accepted values
        if self.is_initial() {
            return self
                .acceptable_values
                .as_ref()
                .is_some_and(|accepted| accepted.iter().any(|v| *v == resource.import_id));
        }

        let tree = match state_tree(resource) {
            Ok(tree) => tree,
            Err(e) => {
                tracing::warn!("Cannot inspect {}: {}", resource.address, e);
                return false;
            }
        };

        match &self.acceptable_values {
            None => walk_and_check_field(&self.field_path, &tree),
            Some(accepted) => walk_and_get(&self.field_path, &tree)
                .into_iter()
                .any(|leaf| leaf_matches(leaf, accepted)),
        }
    }
}

/// State inspection failure; the resource is dropped
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("resource has no refreshed state")]
    MissingState,

    #[error("state is not representable as JSON: {0}")]
    Convert(#[from] serde_json::Error),
}

fn state_tree(resource: &Resource) -> Result<Json, InspectError> {
    let state = resource
        .instance_state
        .as_ref()
        .ok_or(InspectError::MissingState)?;
    Ok(serde_json::to_value(state)?)
}

/// Collect every non-empty leaf reachable along `path`
pub fn walk_and_get<'a>(path: &str, data: &'a Json) -> Vec<&'a Json> {
    let mut leaves = Vec::new();
    walk(path, data, &mut leaves);
    leaves
}

/// True if `path` resolves to at least one non-empty leaf
pub fn walk_and_check_field(path: &str, data: &Json) -> bool {
    !walk_and_get(path, data).is_empty()
}

fn walk<'a>(path: &str, data: &'a Json, leaves: &mut Vec<&'a Json>) {
    match data {
        Json::Array(items) => {
            for item in items {
                walk(path, item, leaves);
            }
        }
        _ if path.is_empty() => {
            if !is_empty_leaf(data) {
                leaves.push(data);
            }
        }
        Json::Object(attrs) => {
            // keys may themselves contain dots
            if let Some(value) = attrs.get(path) {
                walk("", value, leaves);
                return;
            }
            let (head, rest) = path.split_once('.').unwrap_or((path, ""));
            if let Some(value) = attrs.get(head) {
                walk(rest, value, leaves);
            }
        }
        _ => {}
    }
}

fn is_empty_leaf(value: &Json) -> bool {
    match value {
        Json::Null => true,
        Json::String(s) => s.is_empty(),
        Json::Object(attrs) => attrs.is_empty(),
        _ => false,
    }
}

fn leaf_matches(leaf: &Json, accepted: &[String]) -> bool {
    let rendered = match leaf {
        Json::String(s) => s.clone(),
        Json::Number(n) => n.to_string(),
        Json::Bool(b) => b.to_string(),
        _ => return false,
    };
    accepted.iter().any(|v| *v == rendered)
}

/// Error parsing a filter expression
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterParseError {
    #[error("empty filter expression")]
    Empty,

    #[error("malformed filter part \"{0}\", expected key=value")]
    Malformed(String),

    #[error("unknown filter key \"{0}\", expected Type, Name or Value")]
    UnknownKey(String),

    #[error("filter \"{0}\" has no Name")]
    MissingName(String),
}

/// Parses `Type=<service>;Name=<path>;Value=<v1>:<v2>` or the shorthand
/// `<service>=<id1>:<id2>`
///
/// `Type` may be omitted to match every service; `Value` may be omitted to
/// only require that the path resolves.
impl FromStr for ResourceFilter {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(FilterParseError::Empty);
        }

        let is_structured = s.contains(';')
            || ["Type=", "Name=", "Value="]
                .iter()
                .any(|key| s.starts_with(key));
        if !is_structured {
            let (service, ids) = s
                .split_once('=')
                .ok_or_else(|| FilterParseError::Malformed(s.to_string()))?;
            return Ok(Self::new(service.trim(), ID_PATH, Some(split_values(ids))));
        }

        let mut filter = Self::default();
        let mut has_name = false;
        for part in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| FilterParseError::Malformed(part.to_string()))?;
            match key.trim() {
                "Type" => filter.service_name = value.trim().to_string(),
                "Name" => {
                    filter.field_path = value.trim().to_string();
                    has_name = true;
                }
                "Value" => filter.acceptable_values = Some(split_values(value)),
                other => return Err(FilterParseError::UnknownKey(other.to_string())),
            }
        }

        if !has_name || filter.field_path.is_empty() {
            return Err(FilterParseError::MissingName(s.to_string()));
        }
        Ok(filter)
    }
}

fn split_values(values: &str) -> Vec<String> {
    values
        .split(VALUE_SEPARATOR)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

impl fmt::Display for ResourceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.service_name.is_empty() {
            write!(f, "Type={};", self.service_name)?;
        }
        write!(f, "Name={}", self.field_path)?;
        if let Some(values) = &self.acceptable_values {
            write!(f, ";Value={}", values.join(VALUE_SEPARATOR))?;
        }
        Ok(())
    }
}
