//! `discord_role` and `discord_roles`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfd_core::{DataSource, Diagnostics, ProviderError, ProviderResult};

use super::given;
use crate::{DiscordData, api::DiscordApi, types::Role};

async fn guild_roles(api: &dyn DiscordApi, guild_id: &str) -> ProviderResult<Vec<Role>> {
    api.guild_roles(guild_id)
        .await
        .map_err(|e| e.into_provider_error("Error Fetching Roles", format!("Unable to fetch roles for guild {guild_id}")))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDataModel {
    #[serde(default)]
    pub role_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub color: Option<i64>,
    #[serde(default)]
    pub hoist: Option<bool>,
    #[serde(default)]
    pub mentionable: Option<bool>,
    #[serde(default)]
    pub managed: Option<bool>,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub permissions: Option<u64>,
}

impl RoleDataModel {
    fn fill(mut self, role: Role) -> Self {
        self.id = Some(role.id);
        self.name = Some(role.name);
        self.color = Some(role.color);
        self.hoist = Some(role.hoist);
        self.mentionable = Some(role.mentionable);
        self.managed = Some(role.managed);
        self.position = Some(role.position);
        self.permissions = Some(role.permissions);
        self
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RoleDataSource;

#[async_trait]
impl DataSource<dyn DiscordApi> for RoleDataSource {
    type Model = RoleDataModel;

    fn type_name(&self) -> &'static str {
        "role"
    }

    /// Look up by `role_id`, or by `name`, within `guild_id`.
    async fn read(
        &self,
        data: &DiscordData,
        config: RoleDataModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<RoleDataModel> {
        let role_id = given(config.role_id.as_deref());
        let name = given(config.name.as_deref());
        let guild_id = given(config.guild_id.as_deref());

        let guild_id = match (role_id, name, guild_id) {
            (None, None, _) | (None, Some(_), None) => {
                return Err(ProviderError::invalid(
                    "Missing Required Attributes",
                    "Either role_id or both name and guild_id must be provided.",
                ));
            }
            (Some(_), _, None) => {
                return Err(ProviderError::invalid(
                    "Missing Guild ID",
                    "When using role_id, guild_id is also required.",
                ));
            }
            (_, _, Some(guild_id)) => guild_id,
        };

        let roles = guild_roles(data.client()?, guild_id).await?;
        let found = match role_id {
            Some(role_id) => roles.into_iter().find(|r| r.id == role_id),
            None => roles.into_iter().find(|r| Some(r.name.as_str()) == name),
        };

        let role = found.ok_or_else(|| {
            let wanted = role_id.map_or_else(
                || format!("with name '{}'", name.unwrap_or_default()),
                |id| format!("with ID {id}"),
            );
            ProviderError::not_found("Role Not Found", format!("No role {wanted} was found in guild {guild_id}."))
        })?;

        Ok(config.fill(role))
    }
}

/// One entry of `discord_roles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSummary {
    pub id: String,
    pub name: String,
    pub color: i64,
    pub hoist: bool,
    pub mentionable: bool,
    pub managed: bool,
    pub position: i64,
    pub permissions: u64,
}

impl From<Role> for RoleSummary {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
            color: role.color,
            hoist: role.hoist,
            mentionable: role.mentionable,
            managed: role.managed,
            position: role.position,
            permissions: role.permissions,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolesDataModel {
    pub guild_id: String,
    #[serde(default)]
    pub roles: Vec<RoleSummary>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RolesDataSource;

#[async_trait]
impl DataSource<dyn DiscordApi> for RolesDataSource {
    type Model = RolesDataModel;

    fn type_name(&self) -> &'static str {
        "roles"
    }

    async fn read(
        &self,
        data: &DiscordData,
        config: RolesDataModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<RolesDataModel> {
        let api = data.client()?;
        let guild_id = given(Some(config.guild_id.as_str()))
            .ok_or_else(|| ProviderError::invalid("Missing Guild ID", "The guild_id attribute is required."))?;

        let roles = guild_roles(api, guild_id).await?;
        Ok(RolesDataModel {
            roles: roles.into_iter().map(RoleSummary::from).collect(),
            ..config
        })
    }
}
