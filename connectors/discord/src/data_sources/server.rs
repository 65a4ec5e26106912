//! `discord_server` and `discord_servers`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfd_core::{DataSource, Diagnostics, ProviderError, ProviderResult};

use super::given;
use crate::{DiscordData, api::DiscordApi, types::Guild};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDataModel {
    pub server_id: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ServerDataSource;

#[async_trait]
impl DataSource<dyn DiscordApi> for ServerDataSource {
    type Model = ServerDataModel;

    fn type_name(&self) -> &'static str {
        "server"
    }

    async fn read(
        &self,
        data: &DiscordData,
        config: ServerDataModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<ServerDataModel> {
        let api = data.client()?;
        let server_id = given(Some(config.server_id.as_str()))
            .ok_or_else(|| ProviderError::invalid("Missing Server ID", "The server_id attribute is required."))?;

        let guild = api
            .guild(server_id)
            .await
            .map_err(|e| e.into_provider_error("Error Fetching Server", format!("Unable to fetch server {server_id}")))?;

        Ok(ServerDataModel {
            server_id: config.server_id.clone(),
            id: Some(guild.id),
            name: Some(guild.name),
            icon: guild.icon,
            owner_id: guild.owner_id,
            features: guild.features,
        })
    }
}

/// One entry of `discord_servers`: a guild the bot belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSummary {
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
    /// Whether the bot owns the guild.
    pub owner: bool,
    /// The bot's permission bits in the guild, as a decimal string.
    pub permissions: Option<String>,
    pub features: Vec<String>,
}

impl From<Guild> for ServerSummary {
    fn from(guild: Guild) -> Self {
        Self {
            id: guild.id,
            name: guild.name,
            icon: guild.icon,
            owner: guild.owner,
            permissions: guild.permissions.map(|bits| bits.to_string()),
            features: guild.features,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServersDataModel {
    #[serde(default)]
    pub servers: Vec<ServerSummary>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ServersDataSource;

#[async_trait]
impl DataSource<dyn DiscordApi> for ServersDataSource {
    type Model = ServersDataModel;

    fn type_name(&self) -> &'static str {
        "servers"
    }

    async fn read(
        &self,
        data: &DiscordData,
        _config: ServersDataModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<ServersDataModel> {
        let guilds = data
            .client()?
            .current_user_guilds()
            .await
            .map_err(|e| e.into_provider_error("Error Fetching Servers", "Unable to list servers for the bot user"))?;

        Ok(ServersDataModel {
            servers: guilds.into_iter().map(ServerSummary::from).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_renders_permissions_as_decimal() {
        let guild: Guild = serde_json::from_value(serde_json::json!({
            "id": "1",
            "name": "Guild",
            "owner": true,
            "permissions": "2147483647",
            "features": ["COMMUNITY"]
        }))
        .unwrap();

        let summary = ServerSummary::from(guild);
        assert!(summary.owner);
        assert_eq!(summary.permissions.as_deref(), Some("2147483647"));
        assert_eq!(summary.features, ["COMMUNITY"]);
    }
}
