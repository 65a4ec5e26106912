//! Resource and data source traits.
//!
//! Implementations work on typed models. The provider host drives them
//! through the type-erased [`DynamicResource`] / [`DynamicDataSource`]
//! wrappers, which exchange `serde_json::Value` state.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{Diagnostics, ProviderError, ProviderResult};

/// Name of the remote service behind a client type, used in diagnostics.
pub trait ServiceName {
    const SERVICE: &'static str;
}

/// Capability object handed to every operation.
///
/// Holds the API client produced by provider configuration. Operations that
/// need the remote API call [`ProviderData::client`]; pure operations (such
/// as color conversion) ignore it.
pub struct ProviderData<C: ?Sized> {
    client: Option<Arc<C>>,
}

impl<C: ?Sized> ProviderData<C> {
    /// Data for a configured provider.
    #[must_use]
    pub const fn new(client: Arc<C>) -> Self {
        Self {
            client: Some(client),
        }
    }

    /// Data for a provider that has not been configured yet.
    #[must_use]
    pub const fn unconfigured() -> Self {
        Self { client: None }
    }

    /// Returns true once a client has been attached.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.client.is_some()
    }
}

impl<C: ?Sized + ServiceName> ProviderData<C> {
    /// Returns the configured client.
    pub fn client(&self) -> ProviderResult<&C> {
        self.client
            .as_deref()
            .ok_or(ProviderError::NotConfigured { service: C::SERVICE })
    }
}

impl<C: ?Sized> Clone for ProviderData<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

impl<C: ?Sized> Default for ProviderData<C> {
    fn default() -> Self {
        Self::unconfigured()
    }
}

impl<C: ?Sized> std::fmt::Debug for ProviderData<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderData")
            .field("configured", &self.is_configured())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Typed traits
// ─────────────────────────────────────────────────────────────────────────────

/// A managed resource with a create/read/update/delete lifecycle.
#[async_trait]
pub trait Resource<C: ?Sized + Send + Sync>: Send + Sync {
    /// Plan and state model.
    type Model: Serialize + DeserializeOwned + Send + Sync;

    /// Type name without the provider prefix (e.g. `channel`).
    fn type_name(&self) -> &'static str;

    /// Create the remote object and return the resulting state.
    async fn create(
        &self,
        data: &ProviderData<C>,
        plan: Self::Model,
        diags: &mut Diagnostics,
    ) -> ProviderResult<Self::Model>;

    /// Refresh state. `Ok(None)` removes the resource from state.
    async fn read(
        &self,
        data: &ProviderData<C>,
        state: Self::Model,
        diags: &mut Diagnostics,
    ) -> ProviderResult<Option<Self::Model>>;

    /// Apply `plan` to an object currently described by `state`.
    async fn update(
        &self,
        data: &ProviderData<C>,
        plan: Self::Model,
        state: Self::Model,
        diags: &mut Diagnostics,
    ) -> ProviderResult<Self::Model>;

    /// Delete the remote object.
    async fn delete(
        &self,
        data: &ProviderData<C>,
        state: Self::Model,
        diags: &mut Diagnostics,
    ) -> ProviderResult<()>;

    /// Build full state from an import ID.
    async fn import(
        &self,
        _data: &ProviderData<C>,
        _id: &str,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<Self::Model> {
        Err(ProviderError::ImportNotSupported {
            type_name: self.type_name().to_string(),
        })
    }
}

/// A read-only data source.
#[async_trait]
pub trait DataSource<C: ?Sized + Send + Sync>: Send + Sync {
    /// Configuration and result model.
    type Model: Serialize + DeserializeOwned + Send + Sync;

    /// Type name without the provider prefix (e.g. `color`).
    fn type_name(&self) -> &'static str;

    /// Resolve the data source from its configuration.
    async fn read(
        &self,
        data: &ProviderData<C>,
        config: Self::Model,
        diags: &mut Diagnostics,
    ) -> ProviderResult<Self::Model>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Type-erased wrappers
// ─────────────────────────────────────────────────────────────────────────────

/// [`Resource`] over JSON values.
#[async_trait]
pub trait DynamicResource<C: ?Sized + Send + Sync>: Send + Sync {
    fn type_name(&self) -> &'static str;

    async fn create(
        &self,
        data: &ProviderData<C>,
        plan: Value,
        diags: &mut Diagnostics,
    ) -> ProviderResult<Value>;

    async fn read(
        &self,
        data: &ProviderData<C>,
        state: Value,
        diags: &mut Diagnostics,
    ) -> ProviderResult<Option<Value>>;

    async fn update(
        &self,
        data: &ProviderData<C>,
        plan: Value,
        state: Value,
        diags: &mut Diagnostics,
    ) -> ProviderResult<Value>;

    async fn delete(
        &self,
        data: &ProviderData<C>,
        state: Value,
        diags: &mut Diagnostics,
    ) -> ProviderResult<()>;

    async fn import(
        &self,
        data: &ProviderData<C>,
        id: &str,
        diags: &mut Diagnostics,
    ) -> ProviderResult<Value>;
}

/// [`DataSource`] over JSON values.
#[async_trait]
pub trait DynamicDataSource<C: ?Sized + Send + Sync>: Send + Sync {
    fn type_name(&self) -> &'static str;

    async fn read(
        &self,
        data: &ProviderData<C>,
        config: Value,
        diags: &mut Diagnostics,
    ) -> ProviderResult<Value>;
}

fn decode<T: DeserializeOwned>(value: Value, what: &str, type_name: &str) -> ProviderResult<T> {
    serde_json::from_value(value).map_err(|e| {
        ProviderError::invalid(
            "Invalid Configuration",
            format!("Unable to decode {what} for {type_name}: {e}"),
        )
    })
}

fn encode<T: Serialize>(model: &T) -> ProviderResult<Value> {
    serde_json::to_value(model).map_err(|e| ProviderError::Internal {
        message: format!("Unable to encode state: {e}"),
    })
}

#[async_trait]
impl<C, R> DynamicResource<C> for R
where
    C: ?Sized + Send + Sync,
    R: Resource<C>,
{
    fn type_name(&self) -> &'static str {
        <Self as Resource<C>>::type_name(self)
    }

    async fn create(
        &self,
        data: &ProviderData<C>,
        plan: Value,
        diags: &mut Diagnostics,
    ) -> ProviderResult<Value> {
        let name = <Self as Resource<C>>::type_name(self);
        let plan = decode(plan, "plan", name)?;
        let state = <Self as Resource<C>>::create(self, data, plan, diags).await?;
        encode(&state)
    }

    async fn read(
        &self,
        data: &ProviderData<C>,
        state: Value,
        diags: &mut Diagnostics,
    ) -> ProviderResult<Option<Value>> {
        let name = <Self as Resource<C>>::type_name(self);
        let state = decode(state, "state", name)?;
        match <Self as Resource<C>>::read(self, data, state, diags).await? {
            Some(state) => encode(&state).map(Some),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        data: &ProviderData<C>,
        plan: Value,
        state: Value,
        diags: &mut Diagnostics,
    ) -> ProviderResult<Value> {
        let name = <Self as Resource<C>>::type_name(self);
        let plan = decode(plan, "plan", name)?;
        let state = decode(state, "state", name)?;
        let state = <Self as Resource<C>>::update(self, data, plan, state, diags).await?;
        encode(&state)
    }

    async fn delete(
        &self,
        data: &ProviderData<C>,
        state: Value,
        diags: &mut Diagnostics,
    ) -> ProviderResult<()> {
        let name = <Self as Resource<C>>::type_name(self);
        let state = decode(state, "state", name)?;
        <Self as Resource<C>>::delete(self, data, state, diags).await
    }

    async fn import(
        &self,
        data: &ProviderData<C>,
        id: &str,
        diags: &mut Diagnostics,
    ) -> ProviderResult<Value> {
        let state = <Self as Resource<C>>::import(self, data, id, diags).await?;
        encode(&state)
    }
}

#[async_trait]
impl<C, D> DynamicDataSource<C> for D
where
    C: ?Sized + Send + Sync,
    D: DataSource<C>,
{
    fn type_name(&self) -> &'static str {
        <Self as DataSource<C>>::type_name(self)
    }

    async fn read(
        &self,
        data: &ProviderData<C>,
        config: Value,
        diags: &mut Diagnostics,
    ) -> ProviderResult<Value> {
        let name = <Self as DataSource<C>>::type_name(self);
        let config = decode(config, "configuration", name)?;
        let result = <Self as DataSource<C>>::read(self, data, config, diags).await?;
        encode(&result)
    }
}
