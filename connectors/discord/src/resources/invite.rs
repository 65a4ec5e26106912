//! `discord_invite`: a channel invite.
//!
//! Discord invites cannot be edited. Changing any invite setting deletes the
//! old invite and creates a new one with a new code.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfd_core::{Diagnostics, ProviderError, ProviderResult, Resource};
use tracing::info;

use super::{forbid_change, require};
use crate::{
    DiscordData,
    api::DiscordApi,
    types::{CreateInvite, Invite, format_timestamp},
};

/// Invite lifetime when `max_age` is unset (24 hours).
pub const DEFAULT_MAX_AGE: i64 = 86_400;

/// Longest lifetime Discord accepts (7 days).
pub const MAX_AGE_LIMIT: i64 = 604_800;

pub const MAX_USES_LIMIT: i64 = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteModel {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    pub channel_id: String,
    #[serde(default)]
    pub max_age: Option<i64>,
    #[serde(default)]
    pub max_uses: Option<i64>,
    #[serde(default)]
    pub temporary: Option<bool>,
    #[serde(default)]
    pub unique: Option<bool>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub uses: Option<i64>,
}

impl InviteModel {
    /// Invite code, falling back to `id` for states written before `code`
    /// was tracked.
    fn code(&self) -> ProviderResult<&str> {
        self.code
            .as_deref()
            .or(self.id.as_deref())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ProviderError::invalid("Missing Invite Code", "The invite code is missing from state."))
    }

    /// Validated create body with defaults applied.
    fn settings(&self) -> ProviderResult<CreateInvite> {
        let max_age = self.max_age.unwrap_or(DEFAULT_MAX_AGE);
        if !(0..=MAX_AGE_LIMIT).contains(&max_age) {
            return Err(ProviderError::invalid(
                "Invalid Max Age",
                "max_age must be between 0 and 604800 seconds (0-7 days).",
            ));
        }

        let max_uses = self.max_uses.unwrap_or_default();
        if !(0..=MAX_USES_LIMIT).contains(&max_uses) {
            return Err(ProviderError::invalid("Invalid Max Uses", "max_uses must be between 0 and 100."));
        }

        Ok(CreateInvite {
            max_age,
            max_uses,
            temporary: self.temporary.unwrap_or_default(),
            unique: self.unique.unwrap_or_default(),
        })
    }

    /// State from an invite. `unique` is not echoed by Discord, so it is
    /// carried over from the request.
    fn from_invite(invite: Invite, channel_id: &str, unique: bool) -> Self {
        let channel_id = invite
            .channel
            .as_ref()
            .map_or_else(|| channel_id.to_string(), |c| c.id.clone());
        Self {
            id: Some(invite.code.clone()),
            url: Some(invite_url(&invite.code)),
            code: Some(invite.code),
            channel_id,
            max_age: Some(invite.max_age.unwrap_or_default()),
            max_uses: Some(invite.max_uses.unwrap_or_default()),
            temporary: Some(invite.temporary.unwrap_or_default()),
            unique: Some(unique),
            created_at: invite.created_at.as_deref().map(format_timestamp),
            expires_at: invite.expires_at.as_deref().map(format_timestamp),
            uses: Some(invite.uses.unwrap_or_default()),
        }
    }
}

/// Public join link for an invite code.
#[must_use]
pub fn invite_url(code: &str) -> String {
    format!("https://discord.gg/{code}")
}

async fn create_invite(
    api: &dyn DiscordApi,
    channel_id: &str,
    settings: CreateInvite,
    summary: &str,
) -> ProviderResult<InviteModel> {
    let invite = api.create_invite(channel_id, &settings).await.map_err(|e| {
        e.into_provider_error(summary, format!("Unable to create invite for channel {channel_id}"))
    })?;

    if invite.code.is_empty() {
        return Err(ProviderError::External {
            summary: "Invalid Invite Response".into(),
            detail: format!("Invite was created but has no code. Channel ID: {channel_id}"),
            status_code: None,
            retryable: false,
        });
    }

    info!(code = %invite.code, channel_id, "Created Discord invite");
    Ok(InviteModel::from_invite(invite, channel_id, settings.unique))
}

/// Channel invite resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct InviteResource;

#[async_trait]
impl Resource<dyn DiscordApi> for InviteResource {
    type Model = InviteModel;

    fn type_name(&self) -> &'static str {
        "invite"
    }

    async fn create(
        &self,
        data: &DiscordData,
        plan: InviteModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<InviteModel> {
        let api = data.client()?;
        let channel_id = require(&plan.channel_id, "Missing Channel ID", "The channel_id attribute is required.")?;
        let settings = plan.settings()?;
        create_invite(api, channel_id, settings, "Error Creating Invite").await
    }

    async fn read(
        &self,
        data: &DiscordData,
        state: InviteModel,
        diags: &mut Diagnostics,
    ) -> ProviderResult<Option<InviteModel>> {
        let api = data.client()?;
        let code = state.code()?;

        match api.invite(code).await {
            Ok(invite) => {
                if invite.channel.is_none() && state.channel_id.is_empty() {
                    diags.add_warning(
                        "Missing Channel ID",
                        "Invite response did not include channel information.",
                    );
                }
                Ok(Some(InviteModel::from_invite(
                    invite,
                    &state.channel_id,
                    state.unique.unwrap_or_default(),
                )))
            }
            Err(e) if e.is_not_found() => {
                diags.add_warning(
                    "Invite Not Found",
                    format!(
                        "Invite {code} was not found. It may have been deleted or expired. Removing from state."
                    ),
                );
                Ok(None)
            }
            Err(e) => Err(e.into_provider_error("Error Fetching Invite", format!("Unable to fetch invite {code}"))),
        }
    }

    async fn update(
        &self,
        data: &DiscordData,
        plan: InviteModel,
        state: InviteModel,
        diags: &mut Diagnostics,
    ) -> ProviderResult<InviteModel> {
        let api = data.client()?;
        forbid_change(
            &plan.channel_id,
            &state.channel_id,
            "Cannot Change Channel",
            "Discord invites cannot be moved to a different channel. Delete this invite and create a \
             new one for the new channel.",
        )?;
        let code = state.code()?;

        let wanted = plan.settings()?;
        let current = CreateInvite {
            max_age: state.max_age.unwrap_or(DEFAULT_MAX_AGE),
            max_uses: state.max_uses.unwrap_or_default(),
            temporary: state.temporary.unwrap_or_default(),
            unique: state.unique.unwrap_or_default(),
        };

        let unchanged = wanted.max_age == current.max_age
            && wanted.max_uses == current.max_uses
            && wanted.temporary == current.temporary
            && wanted.unique == current.unique;

        if unchanged {
            let invite = api.invite(code).await.map_err(|e| {
                e.into_provider_error(
                    "Invite Not Found",
                    format!("Invite {code} was not found. It may have been deleted or expired"),
                )
            })?;
            return Ok(InviteModel::from_invite(invite, &plan.channel_id, current.unique));
        }

        if let Err(e) = api.delete_invite(code).await {
            diags.add_warning(
                "Could Not Delete Old Invite",
                format!("Unable to delete old invite {code}: {e}. Continuing with creation of new invite."),
            );
        }
        create_invite(api, &plan.channel_id, wanted, "Error Creating New Invite").await
    }

    async fn delete(
        &self,
        data: &DiscordData,
        state: InviteModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<()> {
        let api = data.client()?;
        let code = state.code()?;

        match api.delete_invite(code).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into_provider_error("Error Deleting Invite", format!("Unable to delete invite {code}"))),
        }
    }

    async fn import(
        &self,
        data: &DiscordData,
        id: &str,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<InviteModel> {
        if id.is_empty() {
            return Err(ProviderError::invalid("Invalid Import ID", "The import ID must be the invite code."));
        }
        let api = data.client()?;
        let invite = api
            .invite(id)
            .await
            .map_err(|e| e.into_provider_error("Error Fetching Invite", format!("Unable to fetch invite {id}")))?;
        Ok(InviteModel::from_invite(invite, "", false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let settings = InviteModel::default().settings().unwrap();
        assert_eq!(settings.max_age, DEFAULT_MAX_AGE);
        assert_eq!(settings.max_uses, 0);
        assert!(!settings.temporary);
    }

    #[test]
    fn limits_are_enforced() {
        let model = InviteModel {
            max_age: Some(MAX_AGE_LIMIT + 1),
            ..InviteModel::default()
        };
        assert_eq!(model.settings().unwrap_err().summary(), "Invalid Max Age");

        let model = InviteModel {
            max_uses: Some(101),
            ..InviteModel::default()
        };
        assert_eq!(model.settings().unwrap_err().summary(), "Invalid Max Uses");

        let model = InviteModel {
            max_age: Some(0),
            max_uses: Some(100),
            ..InviteModel::default()
        };
        assert!(model.settings().is_ok());
    }

    #[test]
    fn code_falls_back_to_id() {
        let model = InviteModel {
            id: Some("abc".into()),
            ..InviteModel::default()
        };
        assert_eq!(model.code().unwrap(), "abc");
        assert!(InviteModel::default().code().is_err());
        assert_eq!(invite_url("abc"), "https://discord.gg/abc");
    }
}
