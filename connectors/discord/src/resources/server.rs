//! `discord_server`: a guild owned by the authenticated user.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfd_core::{Diagnostics, ProviderError, ProviderResult, Resource};
use tracing::info;

use super::{check_length, require, state_id};
use crate::{DiscordData, api::DiscordApi, types::Guild};

const BOT_CREATE_NOTE: &str = "Note: Creating servers requires a user OAuth2 token, not a bot token. \
                               Bot tokens cannot create servers.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerModel {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
}

impl From<Guild> for ServerModel {
    fn from(guild: Guild) -> Self {
        Self {
            id: Some(guild.id),
            name: guild.name,
            icon: guild.icon,
            owner_id: guild.owner_id,
        }
    }
}

fn validate_name(name: &str) -> ProviderResult<&str> {
    let name = require(name, "Missing Server Name", "The name attribute is required.")?;
    check_length(name, 2, 100, "Invalid Server Name", "Server name")?;
    Ok(name)
}

/// Guild resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServerResource;

#[async_trait]
impl Resource<dyn DiscordApi> for ServerResource {
    type Model = ServerModel;

    fn type_name(&self) -> &'static str {
        "server"
    }

    async fn create(
        &self,
        data: &DiscordData,
        plan: ServerModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<ServerModel> {
        let api = data.client()?;
        let name = validate_name(&plan.name)?;

        let guild = api.create_guild(name).await.map_err(|e| {
            e.into_provider_error("Error Creating Server", format!("Unable to create server {name}"))
                .with_note(BOT_CREATE_NOTE)
        })?;

        if guild.id.is_empty() {
            return Err(ProviderError::External {
                summary: "Invalid Server Response".into(),
                detail: format!("Server was created but has no ID. Server name: {name}"),
                status_code: None,
                retryable: false,
            });
        }

        info!(guild_id = %guild.id, "Created Discord server");
        Ok(guild.into())
    }

    async fn read(
        &self,
        data: &DiscordData,
        state: ServerModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<Option<ServerModel>> {
        let api = data.client()?;
        let server_id = state_id(state.id.as_deref(), "Server")?;

        match api.guild(server_id).await {
            Ok(guild) => Ok(Some(guild.into())),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into_provider_error(
                "Error Fetching Server",
                format!("Unable to fetch server {server_id}"),
            )),
        }
    }

    async fn update(
        &self,
        data: &DiscordData,
        plan: ServerModel,
        state: ServerModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<ServerModel> {
        let api = data.client()?;
        let server_id = state_id(state.id.as_deref(), "Server")?;
        let name = validate_name(&plan.name)?;

        let guild = api.edit_guild(server_id, name).await.map_err(|e| {
            e.into_provider_error("Error Updating Server", format!("Unable to update server {server_id}"))
        })?;
        Ok(guild.into())
    }

    async fn delete(
        &self,
        data: &DiscordData,
        state: ServerModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<()> {
        let api = data.client()?;
        let server_id = state_id(state.id.as_deref(), "Server")?;

        match api.delete_guild(server_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into_provider_error(
                "Error Deleting Server",
                format!("Unable to delete server {server_id}"),
            )),
        }
    }

    async fn import(
        &self,
        data: &DiscordData,
        id: &str,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<ServerModel> {
        let api = data.client()?;
        let guild = api
            .guild(id)
            .await
            .map_err(|e| e.into_provider_error("Error Fetching Server", format!("Unable to fetch server {id}")))?;
        Ok(guild.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_names_are_bounded() {
        assert!(validate_name("ab").is_ok());
        assert_eq!(validate_name("a").unwrap_err().summary(), "Invalid Server Name");
        assert_eq!(validate_name("").unwrap_err().summary(), "Missing Server Name");
        assert!(validate_name(&"x".repeat(101)).is_err());
    }
}
