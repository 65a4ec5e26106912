//! `discord_role_member`: one user holding one role.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfd_core::{Diagnostics, ProviderError, ProviderResult, Resource};
use tracing::info;

use super::require;
use crate::{DiscordData, api::DiscordApi, codec::import_id};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMemberModel {
    /// `guild_id:role_id:user_id`
    #[serde(default)]
    pub id: Option<String>,
    pub guild_id: String,
    pub role_id: String,
    pub user_id: String,
}

impl RoleMemberModel {
    fn new(guild_id: &str, role_id: &str, user_id: &str) -> Self {
        Self {
            id: Some(import_id::build(&[guild_id, role_id, user_id])),
            guild_id: guild_id.to_string(),
            role_id: role_id.to_string(),
            user_id: user_id.to_string(),
        }
    }

    fn is_complete(&self) -> bool {
        !self.guild_id.is_empty() && !self.role_id.is_empty() && !self.user_id.is_empty()
    }

    fn require_complete(&self, action: &str) -> ProviderResult<()> {
        if self.is_complete() {
            Ok(())
        } else {
            Err(ProviderError::invalid(
                "Missing Required Fields",
                format!("The guild_id, role_id, and user_id are required to {action} the role membership."),
            ))
        }
    }
}

async fn add(api: &dyn DiscordApi, m: &RoleMemberModel, summary: &str) -> ProviderResult<()> {
    api.add_member_role(&m.guild_id, &m.user_id, &m.role_id)
        .await
        .map_err(|e| {
            e.into_provider_error(
                summary,
                format!(
                    "Unable to add user {} to role {} in guild {}",
                    m.user_id, m.role_id, m.guild_id
                ),
            )
        })?;
    info!(guild_id = %m.guild_id, role_id = %m.role_id, user_id = %m.user_id, "Granted role");
    Ok(())
}

/// Role membership resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoleMemberResource;

#[async_trait]
impl Resource<dyn DiscordApi> for RoleMemberResource {
    type Model = RoleMemberModel;

    fn type_name(&self) -> &'static str {
        "role_member"
    }

    async fn create(
        &self,
        data: &DiscordData,
        plan: RoleMemberModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<RoleMemberModel> {
        let api = data.client()?;
        let guild_id = require(&plan.guild_id, "Missing Guild ID", "The guild_id attribute is required.")?;
        let role_id = require(&plan.role_id, "Missing Role ID", "The role_id attribute is required.")?;
        let user_id = require(&plan.user_id, "Missing User ID", "The user_id attribute is required.")?;

        let model = RoleMemberModel::new(guild_id, role_id, user_id);
        add(api, &model, "Error Adding User to Role").await?;
        Ok(model)
    }

    async fn read(
        &self,
        data: &DiscordData,
        state: RoleMemberModel,
        diags: &mut Diagnostics,
    ) -> ProviderResult<Option<RoleMemberModel>> {
        let api = data.client()?;
        state.require_complete("read")?;
        let RoleMemberModel {
            guild_id,
            role_id,
            user_id,
            ..
        } = &state;

        let member = match api.member(guild_id, user_id).await {
            Ok(member) => member,
            Err(e) if e.is_not_found() => {
                diags.add_warning(
                    "Member Not Found",
                    format!(
                        "Member {user_id} was not found in guild {guild_id}. They may have left the \
                         server. Removing from state."
                    ),
                );
                return Ok(None);
            }
            Err(e) => {
                return Err(e.into_provider_error(
                    "Error Fetching Member",
                    format!("Unable to fetch member {user_id} in guild {guild_id}"),
                ));
            }
        };

        if !member.roles.iter().any(|r| r == role_id) {
            diags.add_warning(
                "Role Membership Not Found",
                format!("User {user_id} does not have role {role_id} in guild {guild_id}. Removing from state."),
            );
            return Ok(None);
        }

        Ok(Some(RoleMemberModel::new(guild_id, role_id, user_id)))
    }

    async fn update(
        &self,
        data: &DiscordData,
        plan: RoleMemberModel,
        state: RoleMemberModel,
        diags: &mut Diagnostics,
    ) -> ProviderResult<RoleMemberModel> {
        let api = data.client()?;

        if state.is_complete() {
            if let Err(e) = api
                .remove_member_role(&state.guild_id, &state.user_id, &state.role_id)
                .await
            {
                diags.add_warning(
                    "Error Removing Old Role Membership",
                    format!(
                        "Unable to remove user {} from role {} in guild {}: {e}. Continuing with new \
                         role assignment.",
                        state.user_id, state.role_id, state.guild_id
                    ),
                );
            }
        }

        let model = RoleMemberModel::new(&plan.guild_id, &plan.role_id, &plan.user_id);
        if model.is_complete() {
            add(api, &model, "Error Adding User to New Role").await?;
        }
        Ok(model)
    }

    async fn delete(
        &self,
        data: &DiscordData,
        state: RoleMemberModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<()> {
        let api = data.client()?;
        state.require_complete("delete")?;

        match api
            .remove_member_role(&state.guild_id, &state.user_id, &state.role_id)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into_provider_error(
                "Error Removing User from Role",
                format!(
                    "Unable to remove user {} from role {} in guild {}",
                    state.user_id, state.role_id, state.guild_id
                ),
            )),
        }
    }

    /// Import only decodes the ID; the following refresh checks membership.
    async fn import(
        &self,
        _data: &DiscordData,
        id: &str,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<RoleMemberModel> {
        let (guild_id, role_id, user_id) = import_id::parse3(id, import_id::ROLE_MEMBER)?;
        Ok(RoleMemberModel::new(&guild_id, &role_id, &user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_joins_all_three_parts() {
        let model = RoleMemberModel::new("1", "2", "3");
        assert_eq!(model.id.as_deref(), Some("1:2:3"));
        assert!(model.is_complete());
    }

    #[tokio::test]
    async fn import_decodes_without_a_client() {
        let mut diags = Diagnostics::new();
        let model = RoleMemberResource
            .import(&DiscordData::unconfigured(), "1:2:3", &mut diags)
            .await
            .unwrap();
        assert_eq!(model.user_id, "3");

        let err = RoleMemberResource
            .import(&DiscordData::unconfigured(), "1:2", &mut diags)
            .await
            .unwrap_err();
        assert_eq!(err.summary(), "Invalid Import ID");
    }
}
