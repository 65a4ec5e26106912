//! `discord_message`: a message posted by the bot.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfd_core::{Diagnostics, ProviderError, ProviderResult, Resource};
use tracing::info;

use super::{check_length, forbid_change, require};
use crate::{
    DiscordData,
    api::DiscordApi,
    codec::import_id,
    types::{Message, MessageParams, format_timestamp},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageModel {
    #[serde(default)]
    pub id: Option<String>,
    pub channel_id: String,
    pub content: String,
    #[serde(default)]
    pub tts: Option<bool>,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub edited_at: Option<String>,
    /// ID of the author.
    #[serde(default)]
    pub author: Option<String>,
}

impl MessageModel {
    /// Message ID, preferring `message_id` over `id`.
    fn message_id(&self) -> Option<&str> {
        self.message_id
            .as_deref()
            .or(self.id.as_deref())
            .filter(|id| !id.is_empty())
    }

    /// Both IDs needed to address the message.
    fn address(&self, action: &str) -> ProviderResult<(&str, &str)> {
        match (self.channel_id.as_str(), self.message_id()) {
            (channel_id, Some(message_id)) if !channel_id.is_empty() => Ok((channel_id, message_id)),
            _ => Err(ProviderError::invalid(
                "Missing Channel or Message ID",
                format!("The channel_id and message_id are required to {action} the message."),
            )),
        }
    }

    fn from_message(message: Message, tts: Option<bool>) -> Self {
        Self {
            id: Some(message.id.clone()),
            message_id: Some(message.id),
            channel_id: message.channel_id,
            content: message.content,
            tts,
            timestamp: Some(message.timestamp)
                .filter(|t| !t.is_empty())
                .map(|t| format_timestamp(&t)),
            edited_at: message.edited_timestamp.as_deref().map(format_timestamp),
            author: message.author.map(|a| a.id),
        }
    }
}

fn validate_content(content: &str) -> ProviderResult<&str> {
    let content = require(
        content,
        "Missing Message Content",
        "At least one of content must be provided. The content attribute cannot be empty.",
    )?;
    check_length(content, 1, 2000, "Invalid Message Content", "Message content")?;
    Ok(content)
}

/// Channel message resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct MessageResource;

#[async_trait]
impl Resource<dyn DiscordApi> for MessageResource {
    type Model = MessageModel;

    fn type_name(&self) -> &'static str {
        "message"
    }

    async fn create(
        &self,
        data: &DiscordData,
        plan: MessageModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<MessageModel> {
        let api = data.client()?;
        let channel_id = require(&plan.channel_id, "Missing Channel ID", "The channel_id attribute is required.")?;
        let content = validate_content(&plan.content)?;

        let body = MessageParams {
            content: content.to_string(),
            tts: plan.tts.unwrap_or_default(),
        };
        let message = api.create_message(channel_id, &body).await.map_err(|e| {
            e.into_provider_error("Error Sending Message", format!("Unable to send message to channel {channel_id}"))
        })?;

        if message.id.is_empty() {
            return Err(ProviderError::External {
                summary: "Invalid Message Response".into(),
                detail: format!("Message was sent but has no ID. Channel ID: {channel_id}"),
                status_code: None,
                retryable: false,
            });
        }

        info!(message_id = %message.id, channel_id, "Sent Discord message");
        Ok(MessageModel::from_message(message, plan.tts))
    }

    async fn read(
        &self,
        data: &DiscordData,
        state: MessageModel,
        diags: &mut Diagnostics,
    ) -> ProviderResult<Option<MessageModel>> {
        let api = data.client()?;
        let (channel_id, message_id) = state.address("read")?;

        match api.message(channel_id, message_id).await {
            Ok(message) => Ok(Some(MessageModel::from_message(message, state.tts))),
            Err(e) if e.is_not_found() => {
                diags.add_warning(
                    "Message Not Found",
                    format!(
                        "Message {message_id} was not found in channel {channel_id}. It may have been \
                         deleted. Removing from state."
                    ),
                );
                Ok(None)
            }
            Err(e) => Err(e.into_provider_error(
                "Error Fetching Message",
                format!("Unable to fetch message {message_id} in channel {channel_id}"),
            )),
        }
    }

    async fn update(
        &self,
        data: &DiscordData,
        plan: MessageModel,
        state: MessageModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<MessageModel> {
        let api = data.client()?;
        let (channel_id, message_id) = state.address("update")?;
        forbid_change(
            &plan.channel_id,
            channel_id,
            "Cannot Change Channel",
            "Discord messages cannot be moved to a different channel. Delete this message and create a \
             new one in the new channel.",
        )?;
        let content = validate_content(&plan.content)?;

        let body = MessageParams {
            content: content.to_string(),
            tts: false,
        };
        let message = api.edit_message(channel_id, message_id, &body).await.map_err(|e| {
            e.into_provider_error(
                "Error Updating Message",
                format!("Unable to update message {message_id} in channel {channel_id}"),
            )
        })?;
        Ok(MessageModel::from_message(message, state.tts))
    }

    async fn delete(
        &self,
        data: &DiscordData,
        state: MessageModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<()> {
        let api = data.client()?;
        let (channel_id, message_id) = state.address("delete")?;

        match api.delete_message(channel_id, message_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into_provider_error(
                "Error Deleting Message",
                format!("Unable to delete message {message_id} from channel {channel_id}"),
            )),
        }
    }

    async fn import(
        &self,
        data: &DiscordData,
        id: &str,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<MessageModel> {
        let (channel_id, message_id) = import_id::parse2(id, import_id::MESSAGE)?;
        let api = data.client()?;
        let message = api.message(&channel_id, &message_id).await.map_err(|e| {
            e.into_provider_error(
                "Error Fetching Message",
                format!("Unable to fetch message {message_id} in channel {channel_id}"),
            )
        })?;
        let tts = Some(message.tts);
        Ok(MessageModel::from_message(message, tts))
    }
}
