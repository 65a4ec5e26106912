//! `discord_role`: a guild role other than `@everyone`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfd_core::{Diagnostics, ProviderError, ProviderResult, Resource};
use tracing::info;

use super::{check_length, require, state_id};
use crate::{
    DiscordData,
    api::DiscordApi,
    codec::{import_id, validate_color},
    error::DiscordResult,
    types::{Role, RoleParams},
};

/// Name Discord gives the implicit role whose ID equals the guild ID.
pub(crate) const EVERYONE: &str = "@everyone";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleModel {
    #[serde(default)]
    pub id: Option<String>,
    pub guild_id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<i64>,
    #[serde(default)]
    pub hoist: Option<bool>,
    #[serde(default)]
    pub mentionable: Option<bool>,
    #[serde(default)]
    pub permissions: Option<u64>,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub managed: Option<bool>,
}

impl RoleModel {
    fn from_role(guild_id: &str, role: Role) -> Self {
        Self {
            id: Some(role.id),
            guild_id: guild_id.to_string(),
            name: role.name,
            color: Some(role.color),
            hoist: Some(role.hoist),
            mentionable: Some(role.mentionable),
            permissions: Some(role.permissions),
            position: Some(role.position),
            managed: Some(role.managed),
        }
    }

    /// Validate the plan and build the request body. Unset optional
    /// attributes are left for Discord to default.
    fn params(&self) -> ProviderResult<RoleParams> {
        let name = require(&self.name, "Missing Role Name", "The name attribute is required.")?;
        check_length(name, 1, 100, "Invalid Role Name", "Role name")?;
        if name == EVERYONE {
            return Err(ProviderError::invalid(
                "Invalid Role Name",
                "The @everyone role cannot be managed with discord_role. Use discord_everyone_role \
                 resource instead.",
            ));
        }

        let color = self
            .color
            .map(|c| validate_color(c).map(i64::from))
            .transpose()
            .map_err(|e| ProviderError::invalid("Invalid Color", e.to_string()))?;

        Ok(RoleParams {
            name: Some(name.to_string()),
            color,
            hoist: self.hoist,
            mentionable: self.mentionable,
            permissions: self.permissions,
        })
    }
}

/// Find one role in a guild's role list.
pub(crate) async fn fetch_role(api: &dyn DiscordApi, guild_id: &str, role_id: &str) -> DiscordResult<Option<Role>> {
    Ok(api.guild_roles(guild_id).await?.into_iter().find(|r| r.id == role_id))
}

/// Guild role resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoleResource;

#[async_trait]
impl Resource<dyn DiscordApi> for RoleResource {
    type Model = RoleModel;

    fn type_name(&self) -> &'static str {
        "role"
    }

    async fn create(
        &self,
        data: &DiscordData,
        plan: RoleModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<RoleModel> {
        let api = data.client()?;
        let guild_id = require(&plan.guild_id, "Missing Guild ID", "The guild_id attribute is required.")?;
        let params = plan.params()?;

        let role = api.create_role(guild_id, &params).await.map_err(|e| {
            e.into_provider_error(
                "Error Creating Role",
                format!("Unable to create role {} in guild {guild_id}", plan.name),
            )
        })?;

        if role.id.is_empty() {
            return Err(ProviderError::External {
                summary: "Invalid Role Response".into(),
                detail: format!(
                    "Role was created but has no ID. Role name: {}, Guild ID: {guild_id}",
                    plan.name
                ),
                status_code: None,
                retryable: false,
            });
        }

        info!(role_id = %role.id, guild_id, "Created Discord role");
        Ok(RoleModel::from_role(guild_id, role))
    }

    async fn read(
        &self,
        data: &DiscordData,
        state: RoleModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<Option<RoleModel>> {
        let api = data.client()?;
        let role_id = state_id(state.id.as_deref(), "Role")?;
        let guild_id = require(&state.guild_id, "Missing Guild ID", "The guild ID is missing from state.")?;

        match fetch_role(api, guild_id, role_id).await {
            Ok(role) => Ok(role.map(|role| RoleModel::from_role(guild_id, role))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into_provider_error(
                "Error Fetching Roles",
                format!("Unable to fetch roles for guild {guild_id}"),
            )),
        }
    }

    async fn update(
        &self,
        data: &DiscordData,
        plan: RoleModel,
        state: RoleModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<RoleModel> {
        let api = data.client()?;
        let role_id = state_id(state.id.as_deref(), "Role")?;
        let guild_id = require(&plan.guild_id, "Missing Guild ID", "The guild_id attribute is required.")?;
        let params = plan.params()?;

        let role = api.edit_role(guild_id, role_id, &params).await.map_err(|e| {
            e.into_provider_error(
                "Error Updating Role",
                format!("Unable to update role {role_id} in guild {guild_id}"),
            )
        })?;
        Ok(RoleModel::from_role(guild_id, role))
    }

    async fn delete(
        &self,
        data: &DiscordData,
        state: RoleModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<()> {
        let api = data.client()?;
        let role_id = state_id(state.id.as_deref(), "Role")?;
        let guild_id = require(&state.guild_id, "Missing Guild ID", "The guild ID is missing from state.")?;

        match api.delete_role(guild_id, role_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into_provider_error(
                "Error Deleting Role",
                format!("Unable to delete role {role_id} in guild {guild_id}"),
            )),
        }
    }

    async fn import(
        &self,
        data: &DiscordData,
        id: &str,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<RoleModel> {
        let (guild_id, role_id) = import_id::parse2(id, import_id::ROLE).map_err(|e| {
            ProviderError::from(e).with_note("Use the discord_everyone_role resource for the @everyone role.")
        })?;

        if role_id == guild_id {
            return Err(ProviderError::invalid(
                "Cannot Import @everyone Role",
                "The @everyone role cannot be imported with discord_role. Use discord_everyone_role \
                 resource instead.",
            ));
        }

        let api = data.client()?;
        let role = fetch_role(api, &guild_id, &role_id)
            .await
            .map_err(|e| {
                e.into_provider_error(
                    "Error Fetching Role",
                    format!("Unable to fetch roles for guild {guild_id}"),
                )
            })?
            .ok_or_else(|| {
                ProviderError::not_found(
                    "Role Not Found",
                    format!("Role with ID {role_id} not found in guild {guild_id}"),
                )
            })?;
        Ok(RoleModel::from_role(&guild_id, role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(name: &str) -> RoleModel {
        RoleModel {
            guild_id: "1".into(),
            name: name.into(),
            ..RoleModel::default()
        }
    }

    #[test]
    fn everyone_name_is_reserved() {
        let err = plan("@everyone").params().unwrap_err();
        assert_eq!(err.summary(), "Invalid Role Name");
        assert!(err.detail().contains("discord_everyone_role"));
    }

    #[test]
    fn color_is_range_checked() {
        let mut model = plan("mods");
        model.color = Some(0x00FF_FFFF);
        assert_eq!(model.params().unwrap().color, Some(16_777_215));

        model.color = Some(16_777_216);
        assert_eq!(model.params().unwrap_err().summary(), "Invalid Color");
    }

    #[test]
    fn unset_attributes_are_not_sent() {
        let params = plan("mods").params().unwrap();
        assert_eq!(params.name.as_deref(), Some("mods"));
        assert!(params.hoist.is_none());
        assert!(params.permissions.is_none());
    }
}
