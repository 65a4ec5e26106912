//! `discord_emoji` and `discord_emojis`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfd_core::{DataSource, Diagnostics, ProviderError, ProviderResult};

use super::given;
use crate::{DiscordData, api::DiscordApi, types::Emoji};

/// Flattened emoji attributes shared by both data sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiSummary {
    pub id: String,
    pub name: String,
    pub animated: bool,
    pub managed: bool,
    pub require_colons: bool,
    pub available: bool,
    pub roles: Vec<String>,
    /// ID of the user that uploaded the emoji.
    pub user: Option<String>,
}

impl From<Emoji> for EmojiSummary {
    fn from(emoji: Emoji) -> Self {
        Self {
            id: emoji.id.unwrap_or_default(),
            name: emoji.name.unwrap_or_default(),
            animated: emoji.animated,
            managed: emoji.managed,
            require_colons: emoji.require_colons,
            available: emoji.available,
            roles: emoji.roles,
            user: emoji.user.map(|u| u.id),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiDataModel {
    #[serde(default)]
    pub emoji_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub animated: Option<bool>,
    #[serde(default)]
    pub managed: Option<bool>,
    #[serde(default)]
    pub require_colons: Option<bool>,
    #[serde(default)]
    pub available: Option<bool>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EmojiDataSource;

#[async_trait]
impl DataSource<dyn DiscordApi> for EmojiDataSource {
    type Model = EmojiDataModel;

    fn type_name(&self) -> &'static str {
        "emoji"
    }

    /// Look up by `emoji_id`, or by `name`, within `guild_id`.
    async fn read(
        &self,
        data: &DiscordData,
        config: EmojiDataModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<EmojiDataModel> {
        let emoji_id = given(config.emoji_id.as_deref());
        let name = given(config.name.as_deref());
        let guild_id = given(config.guild_id.as_deref());

        let emoji = match (emoji_id, name, guild_id) {
            (Some(_), _, None) => {
                return Err(ProviderError::invalid(
                    "Missing Guild ID",
                    "guild_id is required when using emoji_id.",
                ));
            }
            (Some(emoji_id), _, Some(guild_id)) => data
                .client()?
                .emoji(guild_id, emoji_id)
                .await
                .map_err(|e| {
                    e.into_provider_error(
                        "Error Fetching Emoji",
                        format!("Unable to fetch emoji {emoji_id} in guild {guild_id}"),
                    )
                })?,
            (None, Some(name), Some(guild_id)) => {
                let emojis = list_emojis(data.client()?, guild_id).await?;
                emojis
                    .into_iter()
                    .find(|e| e.name.as_deref() == Some(name))
                    .ok_or_else(|| {
                        ProviderError::not_found(
                            "Emoji Not Found",
                            format!("Emoji with name '{name}' was not found in guild {guild_id}."),
                        )
                    })?
            }
            (None, _, _) => {
                return Err(ProviderError::invalid(
                    "Missing Required Attributes",
                    "Either emoji_id or both name and guild_id must be provided.",
                ));
            }
        };

        let summary = EmojiSummary::from(emoji);
        Ok(EmojiDataModel {
            id: Some(summary.id),
            name: Some(summary.name),
            animated: Some(summary.animated),
            managed: Some(summary.managed),
            require_colons: Some(summary.require_colons),
            available: Some(summary.available),
            roles: summary.roles,
            user: summary.user,
            ..config
        })
    }
}

async fn list_emojis(api: &dyn DiscordApi, guild_id: &str) -> ProviderResult<Vec<Emoji>> {
    api.emojis(guild_id)
        .await
        .map_err(|e| e.into_provider_error("Error Fetching Emojis", format!("Unable to list emojis for guild {guild_id}")))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojisDataModel {
    pub guild_id: String,
    #[serde(default)]
    pub emojis: Vec<EmojiSummary>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EmojisDataSource;

#[async_trait]
impl DataSource<dyn DiscordApi> for EmojisDataSource {
    type Model = EmojisDataModel;

    fn type_name(&self) -> &'static str {
        "emojis"
    }

    async fn read(
        &self,
        data: &DiscordData,
        config: EmojisDataModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<EmojisDataModel> {
        let api = data.client()?;
        let guild_id = given(Some(config.guild_id.as_str()))
            .ok_or_else(|| ProviderError::invalid("Missing Guild ID", "The guild_id attribute is required."))?;

        let emojis = list_emojis(api, guild_id).await?;
        Ok(EmojisDataModel {
            emojis: emojis.into_iter().map(EmojiSummary::from).collect(),
            ..config
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emoji_id_without_guild_is_rejected() {
        let config = EmojiDataModel {
            emoji_id: Some("9".into()),
            ..EmojiDataModel::default()
        };
        let err = EmojiDataSource
            .read(&DiscordData::unconfigured(), config, &mut Diagnostics::new())
            .await
            .unwrap_err();
        assert_eq!(err.summary(), "Missing Guild ID");
    }

    #[tokio::test]
    async fn name_without_guild_is_rejected() {
        let config = EmojiDataModel {
            name: Some("party".into()),
            ..EmojiDataModel::default()
        };
        let err = EmojiDataSource
            .read(&DiscordData::unconfigured(), config, &mut Diagnostics::new())
            .await
            .unwrap_err();
        assert_eq!(err.summary(), "Missing Required Attributes");
    }

    #[test]
    fn summary_keeps_uploader_id_only() {
        let emoji: Emoji = serde_json::from_value(serde_json::json!({
            "id": "9",
            "name": "party",
            "roles": ["3"],
            "user": { "id": "7", "username": "ada" },
            "require_colons": true,
            "available": true
        }))
        .unwrap();
        let summary = EmojiSummary::from(emoji);
        assert_eq!(summary.user.as_deref(), Some("7"));
        assert_eq!(summary.roles, ["3"]);
        assert!(!summary.animated);
    }
}
