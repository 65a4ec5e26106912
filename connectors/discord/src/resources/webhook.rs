//! `discord_webhook`: an incoming webhook on a channel.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfd_core::{Diagnostics, ProviderError, ProviderResult, Resource};
use tracing::info;

use super::{check_length, forbid_change, require, state_id};
use crate::{
    DiscordData,
    api::DiscordApi,
    types::{Webhook, WebhookParams},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookModel {
    #[serde(default)]
    pub id: Option<String>,
    pub channel_id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Only returned when the webhook is created; kept from state afterwards.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub guild_id: Option<String>,
    /// ID of the user that created the webhook.
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default, rename = "type")]
    pub webhook_type: Option<i64>,
}

impl WebhookModel {
    /// State from Discord's view. `token` is the best known token and
    /// `avatar` the configured one, used when Discord returns no avatar hash.
    fn from_webhook(webhook: Webhook, token: Option<String>, avatar: Option<String>) -> Self {
        let token = webhook.token.or(token).filter(|t| !t.is_empty());
        Self {
            url: token.as_deref().map(|t| webhook_url(&webhook.id, t)),
            channel_id: webhook.channel_id.unwrap_or_default(),
            name: webhook.name.unwrap_or_default(),
            avatar: webhook.avatar.or(avatar).filter(|a| !a.is_empty()),
            token,
            guild_id: webhook.guild_id,
            user: webhook.user.map(|u| u.id),
            webhook_type: Some(webhook.webhook_type),
            id: Some(webhook.id),
        }
    }
}

/// Execute URL for a webhook.
#[must_use]
pub fn webhook_url(id: &str, token: &str) -> String {
    format!("https://discord.com/api/webhooks/{id}/{token}")
}

fn validate_name(name: &str) -> ProviderResult<&str> {
    let name = require(name, "Missing Webhook Name", "The name attribute is required.")?;
    check_length(name, 1, 80, "Invalid Webhook Name", "Webhook name")?;
    Ok(name)
}

/// Webhook resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebhookResource;

#[async_trait]
impl Resource<dyn DiscordApi> for WebhookResource {
    type Model = WebhookModel;

    fn type_name(&self) -> &'static str {
        "webhook"
    }

    async fn create(
        &self,
        data: &DiscordData,
        plan: WebhookModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<WebhookModel> {
        let api = data.client()?;
        let channel_id = require(&plan.channel_id, "Missing Channel ID", "The channel_id attribute is required.")?;
        let name = validate_name(&plan.name)?;

        let body = WebhookParams {
            name: Some(name.to_string()),
            avatar: plan.avatar.clone().filter(|a| !a.is_empty()),
            channel_id: None,
        };
        let webhook = api.create_webhook(channel_id, &body).await.map_err(|e| {
            e.into_provider_error(
                "Error Creating Webhook",
                format!("Unable to create webhook {name} in channel {channel_id}"),
            )
        })?;

        if webhook.id.is_empty() {
            return Err(ProviderError::External {
                summary: "Invalid Webhook Response".into(),
                detail: format!(
                    "Webhook was created but has no ID. Webhook name: {name}, Channel ID: {channel_id}"
                ),
                status_code: None,
                retryable: false,
            });
        }

        info!(webhook_id = %webhook.id, channel_id, "Created Discord webhook");
        Ok(WebhookModel::from_webhook(webhook, None, plan.avatar))
    }

    async fn read(
        &self,
        data: &DiscordData,
        state: WebhookModel,
        diags: &mut Diagnostics,
    ) -> ProviderResult<Option<WebhookModel>> {
        let api = data.client()?;
        let webhook_id = state_id(state.id.as_deref(), "Webhook")?;

        match api.webhook(webhook_id).await {
            Ok(webhook) => Ok(Some(WebhookModel::from_webhook(webhook, state.token, state.avatar))),
            Err(e) if e.is_not_found() => {
                diags.add_warning(
                    "Webhook Not Found",
                    format!("Webhook {webhook_id} was not found. It may have been deleted. Removing from state."),
                );
                Ok(None)
            }
            Err(e) => Err(e.into_provider_error(
                "Error Fetching Webhook",
                format!("Unable to fetch webhook {webhook_id}"),
            )),
        }
    }

    async fn update(
        &self,
        data: &DiscordData,
        plan: WebhookModel,
        state: WebhookModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<WebhookModel> {
        let api = data.client()?;
        let webhook_id = state_id(state.id.as_deref(), "Webhook")?;
        forbid_change(
            &plan.channel_id,
            &state.channel_id,
            "Cannot Change Channel",
            "Discord webhooks cannot be moved to a different channel. Delete this webhook and create a \
             new one for the new channel.",
        )?;
        let name = validate_name(&plan.name)?;

        let avatar = plan.avatar.clone().or_else(|| state.avatar.clone());
        let body = WebhookParams {
            name: Some(name.to_string()),
            avatar: avatar.clone().filter(|a| !a.is_empty()),
            channel_id: Some(state.channel_id.clone()),
        };
        let webhook = api.edit_webhook(webhook_id, &body).await.map_err(|e| {
            e.into_provider_error("Error Updating Webhook", format!("Unable to update webhook {webhook_id}"))
        })?;
        Ok(WebhookModel::from_webhook(webhook, state.token, plan.avatar))
    }

    async fn delete(
        &self,
        data: &DiscordData,
        state: WebhookModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<()> {
        let api = data.client()?;
        let webhook_id = state_id(state.id.as_deref(), "Webhook")?;

        match api.delete_webhook(webhook_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into_provider_error(
                "Error Deleting Webhook",
                format!("Unable to delete webhook {webhook_id}"),
            )),
        }
    }

    async fn import(
        &self,
        data: &DiscordData,
        id: &str,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<WebhookModel> {
        if id.is_empty() {
            return Err(ProviderError::invalid("Invalid Import ID", "The import ID must be the webhook ID."));
        }
        let api = data.client()?;
        let webhook = api
            .webhook(id)
            .await
            .map_err(|e| e.into_provider_error("Error Fetching Webhook", format!("Unable to fetch webhook {id}")))?;
        Ok(WebhookModel::from_webhook(webhook, None, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn webhook(token: Option<&str>) -> Webhook {
        Webhook {
            id: "9".into(),
            webhook_type: 1,
            guild_id: Some("1".into()),
            channel_id: Some("2".into()),
            user: None,
            name: Some("deploys".into()),
            avatar: None,
            token: token.map(str::to_string),
        }
    }

    #[test]
    fn token_from_state_builds_url() {
        let model = WebhookModel::from_webhook(webhook(None), Some("tok".into()), None);
        assert_eq!(model.url.as_deref(), Some("https://discord.com/api/webhooks/9/tok"));
        assert_eq!(model.token.as_deref(), Some("tok"));

        let model = WebhookModel::from_webhook(webhook(None), None, None);
        assert!(model.url.is_none());
    }

    #[test]
    fn response_token_wins() {
        let model = WebhookModel::from_webhook(webhook(Some("fresh")), Some("old".into()), None);
        assert_eq!(model.token.as_deref(), Some("fresh"));
    }

    #[test]
    fn names_are_bounded() {
        assert!(validate_name(&"x".repeat(80)).is_ok());
        assert_eq!(validate_name(&"x".repeat(81)).unwrap_err().summary(), "Invalid Webhook Name");
    }
}
