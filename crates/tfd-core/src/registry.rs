//! Name-indexed registry of resources and data sources.

use std::collections::BTreeMap;

use crate::{
    DataSource, DynamicDataSource, DynamicResource, ProviderError, ProviderResult, Resource,
};

/// Registry keyed by full type name (`<prefix>_<type_name>`).
pub struct Registry<C: ?Sized + Send + Sync> {
    prefix: &'static str,
    resources: BTreeMap<String, Box<dyn DynamicResource<C>>>,
    data_sources: BTreeMap<String, Box<dyn DynamicDataSource<C>>>,
}

impl<C: ?Sized + Send + Sync + 'static> Registry<C> {
    /// Create an empty registry for the given provider prefix.
    #[must_use]
    pub const fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            resources: BTreeMap::new(),
            data_sources: BTreeMap::new(),
        }
    }

    /// Provider type-name prefix.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        self.prefix
    }

    fn full_name(&self, type_name: &str) -> String {
        format!("{}_{type_name}", self.prefix)
    }

    /// Register a resource.
    pub fn register_resource<R: Resource<C> + 'static>(&mut self, resource: R) -> &mut Self {
        let name = self.full_name(<R as Resource<C>>::type_name(&resource));
        self.resources.insert(name, Box::new(resource));
        self
    }

    /// Register a data source.
    pub fn register_data_source<D: DataSource<C> + 'static>(&mut self, source: D) -> &mut Self {
        let name = self.full_name(<D as DataSource<C>>::type_name(&source));
        self.data_sources.insert(name, Box::new(source));
        self
    }

    /// Look up a resource by full type name.
    pub fn resource(&self, name: &str) -> ProviderResult<&dyn DynamicResource<C>> {
        self.resources
            .get(name)
            .map(AsRef::as_ref)
            .ok_or_else(|| ProviderError::UnknownType {
                kind: "resource",
                name: name.to_string(),
            })
    }

    /// Look up a data source by full type name.
    pub fn data_source(&self, name: &str) -> ProviderResult<&dyn DynamicDataSource<C>> {
        self.data_sources
            .get(name)
            .map(AsRef::as_ref)
            .ok_or_else(|| ProviderError::UnknownType {
                kind: "data source",
                name: name.to_string(),
            })
    }

    /// Registered resource type names, sorted.
    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Registered data source type names, sorted.
    pub fn data_source_types(&self) -> impl Iterator<Item = &str> {
        self.data_sources.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use super::*;
    use crate::{Diagnostics, ProviderData, ServiceName};

    impl ServiceName for str {
        const SERVICE: &'static str = "Test";
    }

    struct Counter;

    #[derive(Serialize, Deserialize)]
    struct CounterModel {
        value: i64,
    }

    #[async_trait]
    impl DataSource<str> for Counter {
        type Model = CounterModel;

        fn type_name(&self) -> &'static str {
            "counter"
        }

        async fn read(
            &self,
            data: &ProviderData<str>,
            config: CounterModel,
            _diags: &mut Diagnostics,
        ) -> ProviderResult<CounterModel> {
            let offset = i64::try_from(data.client()?.len()).unwrap_or_default();
            Ok(CounterModel {
                value: config.value + offset,
            })
        }
    }

    #[tokio::test]
    async fn dispatches_by_prefixed_name() {
        let mut registry = Registry::<str>::new("test");
        registry.register_data_source(Counter);

        let data = ProviderData::new(std::sync::Arc::from("abc"));
        let mut diags = Diagnostics::new();
        let out = registry
            .data_source("test_counter")
            .unwrap()
            .read(&data, json!({ "value": 1 }), &mut diags)
            .await
            .unwrap();

        assert_eq!(out, json!({ "value": 4 }));
        assert_eq!(registry.data_source_types().collect::<Vec<_>>(), ["test_counter"]);
    }

    #[tokio::test]
    async fn unknown_type_and_unconfigured_are_errors() {
        let mut registry = Registry::<str>::new("test");
        registry.register_data_source(Counter);

        assert!(matches!(
            registry.resource("test_counter"),
            Err(ProviderError::UnknownType { kind: "resource", .. })
        ));

        let mut diags = Diagnostics::new();
        let err = registry
            .data_source("test_counter")
            .unwrap()
            .read(&ProviderData::unconfigured(), json!({ "value": 1 }), &mut diags)
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::NotConfigured { service: "Test" });
        assert_eq!(err.summary(), "Test Client Not Configured");
    }

    #[tokio::test]
    async fn malformed_config_is_invalid_request() {
        let mut registry = Registry::<str>::new("test");
        registry.register_data_source(Counter);

        let mut diags = Diagnostics::new();
        let err = registry
            .data_source("test_counter")
            .unwrap()
            .read(&ProviderData::unconfigured(), json!({ "value": "x" }), &mut diags)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest { .. }));
    }
}
