//! `discord_channel`, `discord_channels` and `discord_category`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfd_core::{DataSource, Diagnostics, ProviderError, ProviderResult};

use super::given;
use crate::{DiscordData, api::DiscordApi, codec::ChannelType, types::Channel};

async fn fetch_channel(api: &dyn DiscordApi, channel_id: &str, summary: &str, what: &str) -> ProviderResult<Channel> {
    api.channel(channel_id)
        .await
        .map_err(|e| e.into_provider_error(summary, format!("Unable to fetch {what} {channel_id}")))
}

async fn guild_channels(api: &dyn DiscordApi, guild_id: &str, summary: &str) -> ProviderResult<Vec<Channel>> {
    api.guild_channels(guild_id)
        .await
        .map_err(|e| e.into_provider_error(summary, format!("Unable to fetch channels for guild {guild_id}")))
}

fn is_category(channel: &Channel) -> bool {
    channel.channel_type == ChannelType::Category.code()
}

/// First category named `name`.
fn find_category<'a>(channels: &'a [Channel], name: &str, guild_id: &str) -> ProviderResult<&'a Channel> {
    channels
        .iter()
        .find(|c| is_category(c) && c.name.as_deref() == Some(name))
        .ok_or_else(|| {
            ProviderError::not_found(
                "Category Not Found",
                format!("No category channel found with name '{name}' in guild {guild_id}"),
            )
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// discord_channel
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDataModel {
    pub channel_id: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Raw Discord channel type code.
    #[serde(default, rename = "type")]
    pub channel_type: Option<i64>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub guild_id: Option<String>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ChannelDataSource;

#[async_trait]
impl DataSource<dyn DiscordApi> for ChannelDataSource {
    type Model = ChannelDataModel;

    fn type_name(&self) -> &'static str {
        "channel"
    }

    async fn read(
        &self,
        data: &DiscordData,
        config: ChannelDataModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<ChannelDataModel> {
        let api = data.client()?;
        let channel_id = given(Some(config.channel_id.as_str()))
            .ok_or_else(|| ProviderError::invalid("Missing Channel ID", "The channel_id attribute is required."))?;

        let channel = fetch_channel(api, channel_id, "Error Fetching Channel", "channel").await?;
        Ok(ChannelDataModel {
            channel_id: config.channel_id.clone(),
            id: Some(channel.id),
            name: channel.name,
            channel_type: Some(channel.channel_type),
            category_id: channel.parent_id,
            position: channel.position,
            guild_id: channel.guild_id,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// discord_channels
// ─────────────────────────────────────────────────────────────────────────────

/// One entry of `discord_channels`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub channel_type: i64,
    pub category_id: Option<String>,
    pub position: i64,
}

impl From<Channel> for ChannelSummary {
    fn from(channel: Channel) -> Self {
        Self {
            id: channel.id,
            name: channel.name.unwrap_or_default(),
            channel_type: channel.channel_type,
            category_id: channel.parent_id.filter(|p| !p.is_empty()),
            position: channel.position.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelsDataModel {
    pub guild_id: String,
    /// Only list channels under the category with this name.
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub channels: Vec<ChannelSummary>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ChannelsDataSource;

#[async_trait]
impl DataSource<dyn DiscordApi> for ChannelsDataSource {
    type Model = ChannelsDataModel;

    fn type_name(&self) -> &'static str {
        "channels"
    }

    async fn read(
        &self,
        data: &DiscordData,
        config: ChannelsDataModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<ChannelsDataModel> {
        let api = data.client()?;
        let guild_id = given(Some(config.guild_id.as_str()))
            .ok_or_else(|| ProviderError::invalid("Missing Guild ID", "The guild_id attribute is required."))?;

        let channels = guild_channels(api, guild_id, "Error Fetching Channels").await?;

        let selected: Vec<Channel> = match given(config.category_name.as_deref()) {
            Some(name) => {
                let category_id = find_category(&channels, name, guild_id)?.id.clone();
                channels
                    .into_iter()
                    .filter(|c| c.parent_id.as_deref() == Some(category_id.as_str()))
                    .collect()
            }
            None => channels,
        };

        Ok(ChannelsDataModel {
            channels: selected.into_iter().map(ChannelSummary::from).collect(),
            ..config
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// discord_category
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDataModel {
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CategoryDataSource;

#[async_trait]
impl DataSource<dyn DiscordApi> for CategoryDataSource {
    type Model = CategoryDataModel;

    fn type_name(&self) -> &'static str {
        "category"
    }

    /// Look up by `category_id`, or by `name` within `guild_id`.
    async fn read(
        &self,
        data: &DiscordData,
        config: CategoryDataModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<CategoryDataModel> {
        let api = data.client()?;

        let by_id = given(config.category_id.as_deref());
        let by_name = given(config.name.as_deref()).zip(given(config.guild_id.as_deref()));

        let category = match (by_id, by_name) {
            (Some(category_id), _) => {
                let channel = fetch_channel(api, category_id, "Error Fetching Category", "category").await?;
                if !is_category(&channel) {
                    return Err(ProviderError::invalid(
                        "Invalid Channel Type",
                        format!(
                            "Channel {category_id} is not a category channel (type: {})",
                            channel.channel_type
                        ),
                    ));
                }
                channel
            }
            (None, Some((name, guild_id))) => {
                let channels = guild_channels(api, guild_id, "Error Fetching Guild Channels").await?;
                find_category(&channels, name, guild_id)?.clone()
            }
            (None, None) => {
                return Err(ProviderError::invalid(
                    "Missing Required Attributes",
                    "Either category_id must be provided, or both name and guild_id must be provided.",
                ));
            }
        };

        Ok(CategoryDataModel {
            category_id: config.category_id,
            id: Some(category.id),
            name: category.name,
            guild_id: category.guild_id.or(config.guild_id),
            position: category.position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(id: &str, kind: i64, name: &str, parent: Option<&str>) -> Channel {
        Channel {
            id: id.into(),
            channel_type: kind,
            guild_id: Some("g".into()),
            name: Some(name.into()),
            topic: None,
            position: Some(0),
            parent_id: parent.map(str::to_string),
            permission_overwrites: Vec::new(),
        }
    }

    #[test]
    fn category_lookup_ignores_non_categories() {
        let channels = vec![
            channel("1", 0, "general", None),
            channel("2", 4, "general", None),
        ];
        assert_eq!(find_category(&channels, "general", "g").unwrap().id, "2");

        let err = find_category(&channels, "voice", "g").unwrap_err();
        assert_eq!(err.summary(), "Category Not Found");
    }

    #[test]
    fn summary_drops_empty_parent() {
        let summary = ChannelSummary::from(channel("1", 0, "general", Some("")));
        assert_eq!(summary.category_id, None);
    }
}
