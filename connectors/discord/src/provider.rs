//! The `discord` provider: configuration and dispatch by type name.

use std::sync::Arc;

use serde_json::Value;
use tfd_core::{Diagnostics, ProviderError, ProviderResult, Registry};
use tfd_telemetry::{default_redact_fields, redact_sensitive};
use tracing::{debug, info, instrument};

use crate::{
    DiscordData,
    api::{DiscordApi, DiscordApiClient},
    config::DiscordConfig,
    data_sources::{
        CategoryDataSource, ChannelDataSource, ChannelsDataSource, ColorDataSource, EmojiDataSource,
        EmojisDataSource, MemberDataSource, MembersDataSource, RoleDataSource, RolesDataSource,
        ServerDataSource, ServersDataSource,
    },
    resources::{
        CategoryResource, ChannelPermissionResource, ChannelResource, EmojiResource,
        EveryoneRoleResource, InviteResource, MessageResource, RoleResource, RoleMemberResource,
        ServerResource, WebhookResource,
    },
};

/// Type-name prefix of every resource and data source.
pub const PROVIDER_PREFIX: &str = "discord";

/// Discord provider.
pub struct DiscordProvider {
    registry: Registry<dyn DiscordApi>,
    data: DiscordData,
}

impl DiscordProvider {
    /// Create an unconfigured provider with every resource and data source registered.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Registry::<dyn DiscordApi>::new(PROVIDER_PREFIX);
        registry
            .register_resource(ServerResource)
            .register_resource(ChannelResource)
            .register_resource(CategoryResource)
            .register_resource(ChannelPermissionResource)
            .register_resource(RoleResource)
            .register_resource(EveryoneRoleResource)
            .register_resource(RoleMemberResource)
            .register_resource(EmojiResource)
            .register_resource(InviteResource)
            .register_resource(MessageResource)
            .register_resource(WebhookResource);
        registry
            .register_data_source(ChannelDataSource)
            .register_data_source(ChannelsDataSource)
            .register_data_source(CategoryDataSource)
            .register_data_source(ServerDataSource)
            .register_data_source(ServersDataSource)
            .register_data_source(RoleDataSource)
            .register_data_source(RolesDataSource)
            .register_data_source(ColorDataSource)
            .register_data_source(MemberDataSource)
            .register_data_source(MembersDataSource)
            .register_data_source(EmojiDataSource)
            .register_data_source(EmojisDataSource);

        Self {
            registry,
            data: DiscordData::unconfigured(),
        }
    }

    /// Use `client` instead of building one from configuration.
    #[must_use]
    pub fn with_client(mut self, client: Arc<dyn DiscordApi>) -> Self {
        self.data = DiscordData::new(client);
        self
    }

    /// Configure the provider from its configuration block.
    ///
    /// # Errors
    ///
    /// Fails when the block is malformed, no token is available, or token
    /// verification is enabled and Discord rejects the token.
    #[instrument(skip_all)]
    pub async fn configure(&mut self, config: Value) -> ProviderResult<()> {
        debug!(config = %redact_sensitive(&config, &default_redact_fields()), "configuring provider");

        let config: DiscordConfig = serde_json::from_value(config).map_err(|e| {
            ProviderError::invalid("Invalid Provider Configuration", format!("Unable to decode provider configuration: {e}"))
        })?;

        let client = DiscordApiClient::new(&config)?;

        if config.verify_token {
            let user = client
                .current_user()
                .await
                .map_err(|e| e.into_provider_error("Unable to Verify Discord Token", "Failed to fetch the bot user"))?;
            info!(user_id = %user.id, username = %user.username, "Discord bot authenticated");
        }

        self.data = DiscordData::new(Arc::new(client));
        info!(api_url = %config.api_url, "Discord provider configured");
        Ok(())
    }

    /// Capability object handed to every operation.
    #[must_use]
    pub const fn data(&self) -> &DiscordData {
        &self.data
    }

    /// Registered resource type names.
    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.registry.resource_types()
    }

    /// Registered data source type names.
    pub fn data_source_types(&self) -> impl Iterator<Item = &str> {
        self.registry.data_source_types()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Dispatch
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a resource of `type_name` from `plan`.
    ///
    /// # Errors
    ///
    /// Fails for unknown types and on any resource error.
    pub async fn create(&self, type_name: &str, plan: Value, diags: &mut Diagnostics) -> ProviderResult<Value> {
        self.registry.resource(type_name)?.create(&self.data, plan, diags).await
    }

    /// Refresh `state`; `None` means the object is gone.
    ///
    /// # Errors
    ///
    /// Fails for unknown types and on any resource error.
    pub async fn read(
        &self,
        type_name: &str,
        state: Value,
        diags: &mut Diagnostics,
    ) -> ProviderResult<Option<Value>> {
        self.registry.resource(type_name)?.read(&self.data, state, diags).await
    }

    /// Apply `plan` over `state`.
    ///
    /// # Errors
    ///
    /// Fails for unknown types and on any resource error.
    pub async fn update(
        &self,
        type_name: &str,
        plan: Value,
        state: Value,
        diags: &mut Diagnostics,
    ) -> ProviderResult<Value> {
        self.registry
            .resource(type_name)?
            .update(&self.data, plan, state, diags)
            .await
    }

    /// Delete the object described by `state`.
    ///
    /// # Errors
    ///
    /// Fails for unknown types and on any resource error.
    pub async fn delete(&self, type_name: &str, state: Value, diags: &mut Diagnostics) -> ProviderResult<()> {
        self.registry.resource(type_name)?.delete(&self.data, state, diags).await
    }

    /// Build state for an existing object from its import ID.
    ///
    /// # Errors
    ///
    /// Fails for unknown types, unsupported imports and malformed IDs.
    pub async fn import(&self, type_name: &str, id: &str, diags: &mut Diagnostics) -> ProviderResult<Value> {
        self.registry.resource(type_name)?.import(&self.data, id, diags).await
    }

    /// Read the data source `type_name`.
    ///
    /// # Errors
    ///
    /// Fails for unknown types and on any data source error.
    pub async fn read_data_source(
        &self,
        type_name: &str,
        config: Value,
        diags: &mut Diagnostics,
    ) -> ProviderResult<Value> {
        self.registry
            .data_source(type_name)?
            .read(&self.data, config, diags)
            .await
    }
}

impl Default for DiscordProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DiscordProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordProvider")
            .field("configured", &self.data.is_configured())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn registers_every_type_under_the_prefix() {
        let provider = DiscordProvider::new();
        let resources: Vec<_> = provider.resource_types().collect();
        assert_eq!(resources.len(), 11);
        assert!(resources.contains(&"discord_channel_permission"));
        assert!(resources.contains(&"discord_everyone_role"));

        let data_sources: Vec<_> = provider.data_source_types().collect();
        assert_eq!(data_sources.len(), 12);
        assert!(data_sources.iter().all(|name| name.starts_with("discord_")));
    }

    #[tokio::test]
    async fn color_works_without_configuration() {
        let provider = DiscordProvider::new();
        let mut diags = Diagnostics::new();
        let out = provider
            .read_data_source("discord_color", json!({ "hex": "#fff" }), &mut diags)
            .await
            .unwrap();
        assert_eq!(out["dec"], 16_777_215);
    }

    #[tokio::test]
    async fn remote_operations_need_configuration() {
        let provider = DiscordProvider::new();
        let mut diags = Diagnostics::new();
        let err = provider
            .read_data_source("discord_roles", json!({ "guild_id": "1" }), &mut diags)
            .await
            .unwrap_err();
        assert_eq!(err.summary(), "Discord Client Not Configured");
    }

    #[tokio::test]
    async fn unknown_type_is_reported() {
        let provider = DiscordProvider::new();
        let err = provider
            .import("discord_thread", "1", &mut Diagnostics::new())
            .await
            .unwrap_err();
        assert_eq!(err.summary(), "Unknown Resource Type");
    }

    #[tokio::test]
    async fn malformed_configuration_is_rejected() {
        let mut provider = DiscordProvider::new();
        let err = provider.configure(json!({ "timeout": "soon" })).await.unwrap_err();
        assert_eq!(err.summary(), "Invalid Provider Configuration");
    }
}
