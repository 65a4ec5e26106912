//! `discord_category`: a channel of type category.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfd_core::{Diagnostics, ProviderError, ProviderResult, Resource};
use tracing::info;

use super::{channel::apply_position, require, state_id};
use crate::{
    DiscordData,
    api::DiscordApi,
    codec::ChannelType,
    types::{Channel, CreateChannel, EditChannel},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryModel {
    #[serde(default)]
    pub id: Option<String>,
    pub guild_id: String,
    pub name: String,
    #[serde(default)]
    pub position: Option<i64>,
}

impl CategoryModel {
    fn from_channel(channel: &Channel, track_position: bool) -> Self {
        Self {
            id: Some(channel.id.clone()),
            guild_id: channel.guild_id.clone().unwrap_or_default(),
            name: channel.name.clone().unwrap_or_default(),
            position: channel.position.filter(|_| track_position),
        }
    }
}

fn ensure_category(channel: &Channel) -> ProviderResult<()> {
    if channel.channel_type == ChannelType::Category.code() {
        Ok(())
    } else {
        Err(ProviderError::invalid(
            "Invalid Channel Type",
            format!(
                "Channel {} is not a category channel (type: {})",
                channel.id, channel.channel_type
            ),
        ))
    }
}

/// Category channel resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct CategoryResource;

#[async_trait]
impl Resource<dyn DiscordApi> for CategoryResource {
    type Model = CategoryModel;

    fn type_name(&self) -> &'static str {
        "category"
    }

    async fn create(
        &self,
        data: &DiscordData,
        plan: CategoryModel,
        diags: &mut Diagnostics,
    ) -> ProviderResult<CategoryModel> {
        let api = data.client()?;
        let guild_id = require(&plan.guild_id, "Missing Guild ID", "The guild_id attribute is required.")?;
        let name = require(&plan.name, "Missing Category Name", "The name attribute is required.")?;

        let body = CreateChannel {
            name: name.to_string(),
            channel_type: ChannelType::Category.code(),
            parent_id: None,
            position: None,
        };
        let channel = api.create_channel(guild_id, &body).await.map_err(|e| {
            e.into_provider_error(
                "Error Creating Category",
                format!("Unable to create category {name} in guild {guild_id}"),
            )
        })?;

        if channel.id.is_empty() {
            return Err(ProviderError::External {
                summary: "Invalid Category Response".into(),
                detail: format!(
                    "Category was created but has no ID. Category name: {name}, Guild ID: {guild_id}"
                ),
                status_code: None,
                retryable: false,
            });
        }
        ensure_category(&channel)?;
        info!(category_id = %channel.id, guild_id, "Created Discord category");

        let channel = apply_position(api, channel, plan.position, "Category", diags).await;
        Ok(CategoryModel::from_channel(&channel, plan.position.is_some()))
    }

    async fn read(
        &self,
        data: &DiscordData,
        state: CategoryModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<Option<CategoryModel>> {
        let api = data.client()?;
        let category_id = state_id(state.id.as_deref(), "Category")?;

        let channel = match api.channel(category_id).await {
            Ok(channel) => channel,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => {
                return Err(e.into_provider_error(
                    "Error Fetching Category",
                    format!("Unable to fetch category {category_id}"),
                ));
            }
        };
        ensure_category(&channel)?;
        Ok(Some(CategoryModel::from_channel(&channel, state.position.is_some())))
    }

    async fn update(
        &self,
        data: &DiscordData,
        plan: CategoryModel,
        state: CategoryModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<CategoryModel> {
        let api = data.client()?;
        let category_id = state_id(state.id.as_deref(), "Category")?;

        let mut edit = EditChannel::default();
        if plan.name != state.name {
            edit.name = Some(plan.name.clone());
        }
        if plan.position.is_some() && plan.position != state.position {
            edit.position = plan.position;
        }

        if edit.is_empty() {
            return Ok(CategoryModel {
                id: state.id,
                guild_id: state.guild_id,
                ..plan
            });
        }

        let channel = api.edit_channel(category_id, &edit).await.map_err(|e| {
            e.into_provider_error(
                "Error Updating Category",
                format!("Unable to update category {category_id}"),
            )
        })?;
        Ok(CategoryModel::from_channel(&channel, plan.position.is_some()))
    }

    async fn delete(
        &self,
        data: &DiscordData,
        state: CategoryModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<()> {
        let api = data.client()?;
        let Some(category_id) = state.id.as_deref().filter(|id| !id.is_empty()) else {
            return Ok(());
        };

        match api.delete_channel(category_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into_provider_error(
                "Error Deleting Category",
                format!("Unable to delete category {category_id}"),
            )),
        }
    }

    async fn import(
        &self,
        data: &DiscordData,
        id: &str,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<CategoryModel> {
        let api = data.client()?;
        let channel = api.channel(id).await.map_err(|e| {
            e.into_provider_error("Error Fetching Category", format!("Unable to fetch category {id}"))
        })?;
        ensure_category(&channel)?;
        Ok(CategoryModel::from_channel(&channel, true))
    }
}
