//! `discord_channel`: a text, voice, media or directory channel (or a
//! category, though `discord_category` is the dedicated resource).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfd_core::{Diagnostics, ProviderError, ProviderResult, Resource};
use tracing::info;

use super::{require, state_id};
use crate::{
    DiscordData,
    api::DiscordApi,
    codec::ChannelType,
    types::{Channel, CreateChannel, EditChannel},
};

/// State of a guild channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelModel {
    #[serde(default)]
    pub id: Option<String>,
    pub guild_id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub channel_type: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
}

impl ChannelModel {
    /// Build state from Discord's view. `position` and `category_id` are only
    /// tracked when the configuration manages them.
    fn from_channel(channel: &Channel, track_position: bool, track_category: bool) -> Self {
        Self {
            id: Some(channel.id.clone()),
            guild_id: channel.guild_id.clone().unwrap_or_default(),
            name: channel.name.clone().unwrap_or_default(),
            channel_type: Some(ChannelType::encode(channel.channel_type).to_string()),
            category_id: channel.parent_id.clone().filter(|_| track_category),
            position: channel.position.filter(|_| track_position),
        }
    }
}

/// Apply a planned position after creation. Failure only warns: the channel
/// exists and deleting it would lose more than a misplaced channel.
pub(super) async fn apply_position(
    api: &dyn DiscordApi,
    channel: Channel,
    position: Option<i64>,
    what: &str,
    diags: &mut Diagnostics,
) -> Channel {
    let Some(position) = position else {
        return channel;
    };

    let edit = EditChannel {
        position: Some(position),
        ..EditChannel::default()
    };
    match api.edit_channel(&channel.id, &edit).await {
        Ok(updated) => updated,
        Err(e) => {
            diags.add_warning(
                format!("Error Setting {what} Position"),
                format!("{what} was created but position could not be set: {e}"),
            );
            channel
        }
    }
}

/// Guild channel resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChannelResource;

#[async_trait]
impl Resource<dyn DiscordApi> for ChannelResource {
    type Model = ChannelModel;

    fn type_name(&self) -> &'static str {
        "channel"
    }

    async fn create(
        &self,
        data: &DiscordData,
        plan: ChannelModel,
        diags: &mut Diagnostics,
    ) -> ProviderResult<ChannelModel> {
        let api = data.client()?;
        let guild_id = require(&plan.guild_id, "Missing Guild ID", "The guild_id attribute is required.")?;
        let name = require(&plan.name, "Missing Channel Name", "The name attribute is required.")?;
        let kind = ChannelType::decode(plan.channel_type.as_deref().unwrap_or_default())?;

        if kind == ChannelType::Category && plan.category_id.is_some() {
            return Err(ProviderError::invalid(
                "Invalid Configuration",
                "Category channels cannot be placed under another category. Remove the \
                 category_id attribute when creating a category channel.",
            ));
        }

        let body = CreateChannel {
            name: name.to_string(),
            channel_type: kind.code(),
            parent_id: plan.category_id.clone(),
            position: None,
        };

        let channel = api.create_channel(guild_id, &body).await.map_err(|e| {
            let err = e.into_provider_error(
                "Error Creating Channel",
                format!("Unable to create channel {name} in guild {guild_id}"),
            );
            if kind == ChannelType::Directory {
                err.with_note("Note: Directory channels are only available in Community servers.")
            } else {
                err
            }
        })?;

        if channel.id.is_empty() {
            return Err(ProviderError::External {
                summary: "Invalid Channel Response".into(),
                detail: format!(
                    "Channel was created but has no ID. Channel name: {name}, Guild ID: {guild_id}"
                ),
                status_code: None,
                retryable: false,
            });
        }

        info!(channel_id = %channel.id, guild_id, kind = %kind, "Created Discord channel");

        let channel = apply_position(api, channel, plan.position, "Channel", diags).await;
        Ok(ChannelModel::from_channel(
            &channel,
            plan.position.is_some(),
            plan.category_id.is_some(),
        ))
    }

    async fn read(
        &self,
        data: &DiscordData,
        state: ChannelModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<Option<ChannelModel>> {
        let api = data.client()?;
        let channel_id = state_id(state.id.as_deref(), "Channel")?;

        match api.channel(channel_id).await {
            Ok(channel) => Ok(Some(ChannelModel::from_channel(
                &channel,
                state.position.is_some(),
                state.category_id.is_some(),
            ))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into_provider_error(
                "Error Fetching Channel",
                format!("Unable to fetch channel {channel_id}"),
            )),
        }
    }

    async fn update(
        &self,
        data: &DiscordData,
        plan: ChannelModel,
        state: ChannelModel,
        diags: &mut Diagnostics,
    ) -> ProviderResult<ChannelModel> {
        let api = data.client()?;
        let channel_id = state_id(state.id.as_deref(), "Channel")?;

        let planned_type = plan.channel_type.as_deref().unwrap_or_default();
        let current_type = state.channel_type.as_deref().unwrap_or_default();
        let same_type = planned_type == current_type
            || matches!(
                (ChannelType::decode(planned_type), ChannelType::decode(current_type)),
                (Ok(a), Ok(b)) if a == b
            );
        if !same_type {
            diags.add_warning(
                "Channel Type Change",
                "Discord does not support changing channel type. The type change will be ignored.",
            );
        }

        let mut edit = EditChannel::default();
        if plan.name != state.name {
            edit.name = Some(plan.name.clone());
        }
        if plan.category_id != state.category_id {
            edit.parent_id = Some(plan.category_id.clone());
        }
        if plan.position != state.position {
            edit.position = plan.position;
        }

        if edit.is_empty() {
            return Ok(ChannelModel {
                id: state.id,
                guild_id: state.guild_id,
                channel_type: state.channel_type,
                ..plan
            });
        }

        let channel = api.edit_channel(channel_id, &edit).await.map_err(|e| {
            e.into_provider_error(
                "Error Updating Channel",
                format!("Unable to update channel {channel_id}"),
            )
        })?;

        Ok(ChannelModel::from_channel(
            &channel,
            plan.position.is_some(),
            plan.category_id.is_some(),
        ))
    }

    async fn delete(
        &self,
        data: &DiscordData,
        state: ChannelModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<()> {
        let api = data.client()?;
        let Some(channel_id) = state.id.as_deref().filter(|id| !id.is_empty()) else {
            return Ok(());
        };

        match api.delete_channel(channel_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into_provider_error(
                "Error Deleting Channel",
                format!("Unable to delete channel {channel_id}"),
            )),
        }
    }

    async fn import(
        &self,
        data: &DiscordData,
        id: &str,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<ChannelModel> {
        let api = data.client()?;
        let channel = api.channel(id).await.map_err(|e| {
            e.into_provider_error("Error Fetching Channel", format!("Unable to fetch channel {id}"))
        })?;
        Ok(ChannelModel::from_channel(&channel, true, true))
    }
}
