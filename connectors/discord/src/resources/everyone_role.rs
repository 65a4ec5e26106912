//! `discord_everyone_role`: settings of the implicit `@everyone` role.
//!
//! The role always exists, so "create" adopts it and "delete" only forgets
//! it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfd_core::{Diagnostics, ProviderError, ProviderResult, Resource};
use tracing::info;

use super::{require, role::EVERYONE};
use crate::{
    DiscordData,
    api::DiscordApi,
    codec::validate_color,
    error::DiscordError,
    types::{Role, RoleParams},
};

const HIERARCHY_HELP: &str = "To manage the @everyone role, the bot needs:\n\
    1. 'Manage Roles' permission in the server\n\
    2. The bot's role must be higher in the role hierarchy than @everyone\n   \
    - Go to Server Settings → Roles and drag the bot's role ABOVE @everyone";

const GRANT_HELP: &str = "3. When modifying @everyone permissions, the bot must have ALL permissions \
    it's trying to grant\n   \
    - Discord restriction: bots can only grant permissions they themselves possess\n   \
    - Alternative: Grant the bot 'Administrator' permission (gives all permissions)";

const DELETE_NOTE: &str = "The @everyone role cannot be deleted as it is a default role that always \
    exists. Removing from Terraform state only.\n\nNote: The last settings applied by Terraform will \
    remain in Discord. Terraform cannot restore the @everyone role to its previous state because it \
    doesn't know what the state was before Terraform managed it.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EveryoneRoleModel {
    #[serde(default)]
    pub id: Option<String>,
    pub guild_id: String,
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

impl EveryoneRoleModel {
    fn from_role(guild_id: &str, role: Role) -> Self {
        Self {
            id: Some(role.id),
            guild_id: guild_id.to_string(),
            color: Some(role.color),
            hoist: Some(role.hoist),
            mentionable: Some(role.mentionable),
            permissions: Some(role.permissions),
            position: Some(role.position),
            managed: Some(role.managed),
        }
    }

    /// Planned values that differ from `current`.
    fn changes(&self, current: &Role) -> ProviderResult<RoleParams> {
        let color = self
            .color
            .map(|c| validate_color(c).map(i64::from))
            .transpose()
            .map_err(|e| ProviderError::invalid("Invalid Color", e.to_string()))?;

        Ok(RoleParams {
            name: None,
            color: color.filter(|c| *c != current.color),
            hoist: self.hoist.filter(|h| *h != current.hoist),
            mentionable: self.mentionable.filter(|m| *m != current.mentionable),
            permissions: self.permissions.filter(|p| *p != current.permissions),
        })
    }
}

/// The `@everyone` role has the guild's ID; older guilds are matched by name.
fn is_everyone(role: &Role, guild_id: &str) -> bool {
    role.id == guild_id || role.name == EVERYONE
}

async fn find_everyone(api: &dyn DiscordApi, guild_id: &str, summary: &str) -> ProviderResult<Role> {
    let roles = api.guild_roles(guild_id).await.map_err(|e| {
        e.into_provider_error(summary, format!("Unable to fetch roles for guild {guild_id}"))
    })?;
    roles
        .into_iter()
        .find(|role| is_everyone(role, guild_id))
        .ok_or_else(|| {
            ProviderError::not_found(
                "@everyone Role Not Found",
                format!("The @everyone role was not found in guild {guild_id}. This should not happen."),
            )
        })
}

fn update_error(err: DiscordError, guild_id: &str, updating_permissions: bool) -> ProviderError {
    let forbidden = err.status() == Some(403) || err.is_missing_permissions();
    let mut out = err.into_provider_error(
        "Error Updating @everyone Role",
        format!("Unable to update @everyone role in guild {guild_id}"),
    );
    if forbidden {
        out = out.with_note(HIERARCHY_HELP);
        if updating_permissions {
            out = out.with_note(GRANT_HELP);
        }
    }
    out
}

/// Apply the plan to the current `@everyone` role, sending only changed fields.
async fn apply(api: &dyn DiscordApi, plan: &EveryoneRoleModel) -> ProviderResult<EveryoneRoleModel> {
    let guild_id = require(&plan.guild_id, "Missing Guild ID", "The guild_id attribute is required.")?;
    let current = find_everyone(api, guild_id, "Error Fetching @everyone Role").await?;
    let changes = plan.changes(&current)?;

    if changes.is_empty() {
        return Ok(EveryoneRoleModel::from_role(guild_id, current));
    }

    let updating_permissions = changes.permissions.is_some();
    let role = api
        .edit_role(guild_id, &current.id, &changes)
        .await
        .map_err(|e| update_error(e, guild_id, updating_permissions))?;
    info!(guild_id, "Updated @everyone role");
    Ok(EveryoneRoleModel::from_role(guild_id, role))
}

/// `@everyone` role resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct EveryoneRoleResource;

#[async_trait]
impl Resource<dyn DiscordApi> for EveryoneRoleResource {
    type Model = EveryoneRoleModel;

    fn type_name(&self) -> &'static str {
        "everyone_role"
    }

    async fn create(
        &self,
        data: &DiscordData,
        plan: EveryoneRoleModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<EveryoneRoleModel> {
        apply(data.client()?, &plan).await
    }

    async fn read(
        &self,
        data: &DiscordData,
        state: EveryoneRoleModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<Option<EveryoneRoleModel>> {
        let api = data.client()?;
        let guild_id = require(&state.guild_id, "Missing Guild ID", "The guild ID is missing from state.")?;

        match find_everyone(api, guild_id, "Error Fetching Roles").await {
            Ok(role) => Ok(Some(EveryoneRoleModel::from_role(guild_id, role))),
            Err(ProviderError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn update(
        &self,
        data: &DiscordData,
        plan: EveryoneRoleModel,
        _state: EveryoneRoleModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<EveryoneRoleModel> {
        apply(data.client()?, &plan).await
    }

    async fn delete(
        &self,
        _data: &DiscordData,
        _state: EveryoneRoleModel,
        diags: &mut Diagnostics,
    ) -> ProviderResult<()> {
        diags.add_warning("Cannot Delete @everyone Role", DELETE_NOTE);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role() -> Role {
        Role {
            id: "42".into(),
            name: EVERYONE.into(),
            color: 0,
            hoist: false,
            position: 0,
            permissions: 104_324_673,
            managed: false,
            mentionable: false,
        }
    }

    #[test]
    fn only_changed_fields_are_sent() {
        let plan = EveryoneRoleModel {
            guild_id: "42".into(),
            permissions: Some(104_324_673),
            mentionable: Some(true),
            ..EveryoneRoleModel::default()
        };
        let changes = plan.changes(&role()).unwrap();
        assert_eq!(changes.mentionable, Some(true));
        assert!(changes.permissions.is_none());
        assert!(changes.name.is_none());
    }

    #[test]
    fn matches_by_id_or_name() {
        let mut r = role();
        assert!(is_everyone(&r, "42"));
        r.id = "7".into();
        assert!(is_everyone(&r, "42"));
        r.name = "mods".into();
        assert!(!is_everyone(&r, "42"));
    }

    #[test]
    fn forbidden_updates_carry_hierarchy_help() {
        let err = DiscordError::Api {
            status: 403,
            code: 50013,
            message: "Missing Permissions".into(),
            retry_after: None,
        };
        let detail = update_error(err, "42", true).detail();
        assert!(detail.contains("Manage Roles"));
        assert!(detail.contains("Administrator"));
    }
}
