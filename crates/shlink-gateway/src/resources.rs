//! Resource collaborators.
//!
//! A [`ResourceProvider`] is only called after the resource access gate has
//! accepted the presented token for the exact location.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::error::{GatewayError, GatewayResult};

/// Returns the payload stored at a data location.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Fetch the resource at `location`; `file` is its last path segment.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ResourceNotFound`] when nothing is stored
    /// there, or [`GatewayError::Resource`] on a provider fault.
    async fn fetch(&self, location: &str, file: &str) -> GatewayResult<Value>;
}

/// Resources keyed by their full location.
#[derive(Debug, Default)]
pub struct MemoryResources {
    entries: DashMap<String, Value>,
}

impl MemoryResources {
    /// Empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` at `location`, returning any previous value.
    pub fn insert(&self, location: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(location.into(), value)
    }
}

#[async_trait]
impl ResourceProvider for MemoryResources {
    async fn fetch(&self, location: &str, _file: &str) -> GatewayResult<Value> {
        self.entries
            .get(location)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| GatewayError::ResourceNotFound(location.to_owned()))
    }
}

/// Serves every file out of one FHIR bundle.
///
/// A file `glucose.json` yields a copy of the bundle whose `entry` list is
/// narrowed to entries mentioning `glucose` (case-insensitive).
#[derive(Debug, Clone)]
pub struct FhirBundleResources {
    bundle: Value,
}

impl FhirBundleResources {
    /// Provider over `bundle`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Resource`] if `bundle` has no `entry` array.
    pub fn new(bundle: Value) -> GatewayResult<Self> {
        if !bundle.get("entry").is_some_and(Value::is_array) {
            return Err(GatewayError::Resource(
                "bundle has no entry array".to_owned(),
            ));
        }
        Ok(Self { bundle })
    }

    fn filtered(&self, file: &str) -> Value {
        let needle = file.trim_end_matches(".json").to_lowercase();
        let mut bundle = self.bundle.clone();
        if let Some(entries) = bundle.get_mut("entry").and_then(Value::as_array_mut) {
            entries.retain(|entry| entry.to_string().to_lowercase().contains(&needle));
        }
        bundle
    }
}

#[async_trait]
impl ResourceProvider for FhirBundleResources {
    async fn fetch(&self, _location: &str, file: &str) -> GatewayResult<Value> {
        Ok(self.filtered(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_resources() {
        let resources = MemoryResources::new();
        resources.insert("https://x/data/a.json", json!({"a": 1}));

        assert_eq!(
            resources.fetch("https://x/data/a.json", "a.json").await.unwrap(),
            json!({"a": 1})
        );
        assert!(matches!(
            resources.fetch("https://x/data/b.json", "b.json").await,
            Err(GatewayError::ResourceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_bundle_filters_by_file_stem() {
        let bundle = json!({
            "resourceType": "Bundle",
            "entry": [
                {"resource": {"code": "Glucose"}},
                {"resource": {"code": "heart-rate"}},
            ]
        });
        let resources = FhirBundleResources::new(bundle).unwrap();

        let filtered = resources.fetch("ignored", "glucose.json").await.unwrap();
        assert_eq!(filtered["resourceType"], "Bundle");
        assert_eq!(filtered["entry"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_bundle_requires_entries() {
        assert!(FhirBundleResources::new(json!({"resourceType": "Bundle"})).is_err());
    }
}
