//! Resource entities
//!
//! A [`Resource`] is the unit of work: it is created from seed attributes by
//! a listing source, refreshed into structured state, then post-processed
//! and filtered before emission.
//!
//! # Architecture
//!
//! - [`state`] - Attribute accessors and sorting over the refreshed state
//!
//! # Example
//!
//! ```ignore
//! use tfharvest::resource::Resource;
//!
//! let mut resource = Resource::new_simple(
//!     "123456789012",
//!     "integration_aws_log_collection_123456789012",
//!     "datadog_integration_aws_log_collection",
//!     "datadog",
//!     vec!["services".to_string()],
//! );
//! resource.refresh(&refresher).await;
//! ```

mod state;

pub use state::AttrError;

use crate::refresh::Refresher;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Wait applied before refreshing a resource whose source rejects bursts
pub const SLOW_QUERY_DELAY: Duration = Duration::from_millis(200);

/// Prefix given to local names that would otherwise start with a digit
const NUMERIC_NAME_PREFIX: &str = "tfer--";

/// Resource kind and generated local name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

/// A discovered cloud resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub address: Address,
    /// Refreshed state; `None` until a refresh succeeds
    pub instance_state: Option<Value>,
    /// Identifier used when importing the resource
    pub import_id: String,
    pub provider: String,
    /// Seed attributes used when refreshing
    pub prior_state: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow_empty_values: Vec<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub additional_fields: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub slow_query_required: bool,
}

impl Resource {
    /// Create a resource from listing output
    ///
    /// The identifier is always written to `attributes["id"]` so refresh has
    /// something to key on.
    pub fn new(
        id: &str,
        resource_name: &str,
        resource_type: &str,
        provider: &str,
        mut attributes: BTreeMap<String, String>,
        allow_empty_values: Vec<String>,
        additional_fields: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        attributes.insert("id".to_string(), id.to_string());
        Self {
            address: Address {
                resource_type: resource_type.to_string(),
                name: sanitize_name(resource_name),
            },
            instance_state: None,
            import_id: id.to_string(),
            provider: provider.to_string(),
            prior_state: attributes,
            ignore_keys: Vec::new(),
            allow_empty_values,
            additional_fields,
            slow_query_required: false,
        }
    }

    /// Create a resource with no seed attributes besides its id
    pub fn new_simple(
        id: &str,
        resource_name: &str,
        resource_type: &str,
        provider: &str,
        allow_empty_values: Vec<String>,
    ) -> Self {
        Self::new(
            id,
            resource_name,
            resource_type,
            provider,
            BTreeMap::new(),
            allow_empty_values,
            serde_json::Map::new(),
        )
    }

    /// Service name: the resource type without the `<provider>_` prefix
    pub fn service_name(&self) -> &str {
        let prefix = format!("{}_", self.provider);
        self.address
            .resource_type
            .strip_prefix(prefix.as_str())
            .unwrap_or(&self.address.resource_type)
    }

    /// Most specific stable identifier key present in the seed attributes
    pub fn id_key(&self) -> &'static str {
        if self.prior_state.contains_key("self_link") {
            "self_link"
        } else {
            "id"
        }
    }

    /// Replace the structured state with a fresh copy from the provider
    ///
    /// Failures are logged and leave the current state untouched, so one
    /// resource never aborts a batch. Returns whether the refresh succeeded.
    pub async fn refresh(&mut self, refresher: &dyn Refresher) -> bool {
        if self.slow_query_required {
            tracing::debug!("Throttling refresh of {}", self.address);
            tokio::time::sleep(SLOW_QUERY_DELAY).await;
        }

        match refresher
            .refresh(&self.address, &self.prior_state, &self.import_id)
            .await
        {
            Ok(state) => {
                tracing::debug!("Refreshed {}", self.address);
                self.instance_state = Some(state);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to refresh {}: {}", self.address, e);
                false
            }
        }
    }
}

/// Turn an arbitrary listing name into a valid local name
///
/// Characters outside `[0-9A-Za-z_-]` become `-`; names starting with a
/// digit get the `tfer--` prefix.
pub fn sanitize_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();

    if sanitized.starts_with(|c: char| c.is_ascii_digit()) {
        format!("{}{}", NUMERIC_NAME_PREFIX, sanitized)
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_resource_sets_id_attribute() {
        let resource = Resource::new(
            "abc",
            "web",
            "aws_instance",
            "aws",
            BTreeMap::from([("region".to_string(), "eu-west-1".to_string())]),
            Vec::new(),
            serde_json::Map::new(),
        );
        assert_eq!(resource.prior_state.get("id").map(String::as_str), Some("abc"));
        assert_eq!(resource.prior_state.get("region").map(String::as_str), Some("eu-west-1"));
        assert_eq!(resource.import_id, "abc");
        assert!(resource.instance_state.is_none());
    }

    #[test]
    fn test_new_resource_overrides_stale_id() {
        let resource = Resource::new(
            "fresh",
            "web",
            "aws_instance",
            "aws",
            BTreeMap::from([("id".to_string(), "stale".to_string())]),
            Vec::new(),
            serde_json::Map::new(),
        );
        assert_eq!(resource.prior_state["id"], "fresh");
    }

    #[test]
    fn test_service_name_strips_provider_prefix() {
        let resource = Resource::new_simple(
            "123",
            "integration_aws_log_collection_123",
            "datadog_integration_aws_log_collection",
            "datadog",
            vec!["services".to_string()],
        );
        assert_eq!(resource.service_name(), "integration_aws_log_collection");
    }

    #[test]
    fn test_id_key_prefers_self_link() {
        let mut resource =
            Resource::new_simple("i-1", "vm", "google_compute_instance", "google", Vec::new());
        assert_eq!(resource.id_key(), "id");

        resource.prior_state.insert(
            "self_link".to_string(),
            "https://www.googleapis.com/compute/v1/projects/p/zones/z/instances/vm".to_string(),
        );
        assert_eq!(resource.id_key(), "self_link");
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("my bucket/logs"), "my-bucket-logs");
        assert_eq!(sanitize_name("web_01-a"), "web_01-a");
        assert_eq!(sanitize_name("123456789012"), "tfer--123456789012");
        assert_eq!(sanitize_name(""), "");
    }

    #[test]
    fn test_address_display() {
        let resource = Resource::new_simple("1", "main", "aws_vpc", "aws", Vec::new());
        assert_eq!(resource.address.to_string(), "aws_vpc.main");
    }
}
