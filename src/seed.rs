//! Seed resources
//!
//! Listing output captured to disk: one entry per discovered resource with
//! its identifier and flat seed attributes.

use crate::document::read_document;
use crate::resource::Resource;
use anyhow::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One listed resource as written in a seed file
#[derive(Debug, Clone, Deserialize)]
pub struct SeedResource {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub provider: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub allow_empty_values: Vec<String>,
    #[serde(default)]
    pub ignore_keys: Vec<String>,
    #[serde(default)]
    pub additional_fields: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub slow_query_required: bool,
}

impl From<SeedResource> for Resource {
    fn from(seed: SeedResource) -> Self {
        let mut resource = Resource::new(
            &seed.id,
            &seed.name,
            &seed.resource_type,
            &seed.provider,
            seed.attributes,
            seed.allow_empty_values,
            seed.additional_fields,
        );
        resource.ignore_keys = seed.ignore_keys;
        resource.slow_query_required = seed.slow_query_required;
        resource
    }
}

/// Load seed resources from a JSON or YAML list
pub fn load_seeds(path: &Path) -> Result<Vec<Resource>> {
    let seeds: Vec<SeedResource> = read_document(path)?;
    let resources: Vec<Resource> = seeds.into_iter().map(Resource::from).collect();

    for resource in &resources {
        let prefix = format!("{}_", resource.provider);
        if !resource.address.resource_type.starts_with(&prefix) {
            tracing::warn!(
                "Resource type {} does not start with provider prefix {}",
                resource.address.resource_type,
                prefix
            );
        }
    }

    tracing::info!("Loaded {} seed resources from {:?}", resources.len(), path);
    Ok(resources)
}
