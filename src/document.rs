//! On-disk documents
//!
//! Seed and snapshot files may be written as JSON or YAML; the format is
//! picked from the file extension.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Read and parse a JSON (`.json`) or YAML (`.yaml`/`.yml`) document
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML in {}", path.display()))
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::io::Write;

    #[test]
    fn test_reads_yaml_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "region: eu-west-1\nzone: eu-west-1a").unwrap();

        let doc: BTreeMap<String, String> = read_document(file.path()).unwrap();
        assert_eq!(doc["region"], "eu-west-1");
    }

    #[test]
    fn test_reads_json_otherwise() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"region": "us-east-1"}}"#).unwrap();

        let doc: BTreeMap<String, String> = read_document(file.path()).unwrap();
        assert_eq!(doc["region"], "us-east-1");
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = read_document::<BTreeMap<String, String>>(Path::new("/nonexistent/seeds.json"))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
