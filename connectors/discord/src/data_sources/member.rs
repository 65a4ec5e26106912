//! `discord_member` and `discord_members`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfd_core::{DataSource, Diagnostics, ProviderError, ProviderResult};

use super::given;
use crate::{
    DiscordData,
    api::DiscordApi,
    error::DiscordError,
    types::{Member, User, format_timestamp},
};

/// Upper bound Discord accepts for one member listing page.
pub const MEMBER_LIST_LIMIT: u32 = 1000;

const INTENT_HINT: &str = "Member lookups require the GUILD_MEMBERS privileged intent. To enable it:\n\
    1. Open the Discord Developer Portal and select your application\n\
    2. Go to the Bot section\n\
    3. Under Privileged Gateway Intents, enable SERVER MEMBERS INTENT\n\
    4. Save your changes";

fn member_error(err: DiscordError, summary: &str, context: String) -> ProviderError {
    let needs_intent = err.is_missing_access() || err.is_missing_permissions();
    let err = err.into_provider_error(summary, context);
    if needs_intent { err.with_note(INTENT_HINT) } else { err }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDataModel {
    pub guild_id: String,
    pub user_id: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: Option<bool>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub joined_at: Option<String>,
    #[serde(default)]
    pub premium_since: Option<String>,
    #[serde(default)]
    pub deaf: Option<bool>,
    #[serde(default)]
    pub mute: Option<bool>,
    #[serde(default)]
    pub pending: Option<bool>,
    #[serde(default)]
    pub permissions: Option<u64>,
    #[serde(default)]
    pub communication_disabled_until: Option<String>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MemberDataSource;

#[async_trait]
impl DataSource<dyn DiscordApi> for MemberDataSource {
    type Model = MemberDataModel;

    fn type_name(&self) -> &'static str {
        "member"
    }

    async fn read(
        &self,
        data: &DiscordData,
        config: MemberDataModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<MemberDataModel> {
        let guild_id = given(Some(config.guild_id.as_str()))
            .ok_or_else(|| ProviderError::invalid("Missing Guild ID", "The guild_id attribute is required."))?;
        let user_id = given(Some(config.user_id.as_str()))
            .ok_or_else(|| ProviderError::invalid("Missing User ID", "The user_id attribute is required."))?;

        let member = data.client()?.member(guild_id, user_id).await.map_err(|e| {
            member_error(
                e,
                "Error Fetching Member",
                format!("Unable to fetch member {user_id} in guild {guild_id}"),
            )
        })?;

        let summary = MemberSummary::try_from(member).map_err(|()| {
            ProviderError::invalid(
                "Invalid Member Data",
                format!("Discord returned member {user_id} without user data."),
            )
        })?;

        Ok(MemberDataModel {
            id: Some(summary.id),
            username: Some(summary.username),
            discriminator: summary.discriminator,
            global_name: summary.global_name,
            nickname: summary.nickname,
            avatar: summary.avatar,
            bot: Some(summary.bot),
            roles: summary.roles,
            joined_at: summary.joined_at,
            premium_since: summary.premium_since,
            deaf: Some(summary.deaf),
            mute: Some(summary.mute),
            pending: Some(summary.pending),
            permissions: summary.permissions,
            communication_disabled_until: summary.communication_disabled_until,
            ..config
        })
    }
}

/// One entry of `discord_members`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSummary {
    pub id: String,
    pub username: String,
    pub discriminator: Option<String>,
    pub global_name: Option<String>,
    pub nickname: Option<String>,
    pub avatar: Option<String>,
    pub bot: bool,
    pub roles: Vec<String>,
    pub joined_at: Option<String>,
    pub premium_since: Option<String>,
    pub deaf: bool,
    pub mute: bool,
    pub pending: bool,
    pub permissions: Option<u64>,
    pub communication_disabled_until: Option<String>,
}

/// Fails when the member carries no user object.
impl TryFrom<Member> for MemberSummary {
    type Error = ();

    fn try_from(member: Member) -> Result<Self, ()> {
        let User {
            id,
            username,
            discriminator,
            global_name,
            avatar,
            bot,
        } = member.user.ok_or(())?;

        Ok(Self {
            id,
            username,
            discriminator: discriminator.filter(|d| d != "0"),
            global_name,
            nickname: member.nick,
            avatar: member.avatar.or(avatar),
            bot,
            roles: member.roles,
            joined_at: member.joined_at.as_deref().map(format_timestamp),
            premium_since: member.premium_since.as_deref().map(format_timestamp),
            deaf: member.deaf,
            mute: member.mute,
            pending: member.pending,
            permissions: member.permissions,
            communication_disabled_until: member.communication_disabled_until.as_deref().map(format_timestamp),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembersDataModel {
    pub guild_id: String,
    #[serde(default)]
    pub members: Vec<MemberSummary>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MembersDataSource;

#[async_trait]
impl DataSource<dyn DiscordApi> for MembersDataSource {
    type Model = MembersDataModel;

    fn type_name(&self) -> &'static str {
        "members"
    }

    /// Lists up to [`MEMBER_LIST_LIMIT`] members; members without user data are skipped.
    async fn read(
        &self,
        data: &DiscordData,
        config: MembersDataModel,
        diags: &mut Diagnostics,
    ) -> ProviderResult<MembersDataModel> {
        let guild_id = given(Some(config.guild_id.as_str()))
            .ok_or_else(|| ProviderError::invalid("Missing Guild ID", "The guild_id attribute is required."))?;

        let members = data
            .client()?
            .members(guild_id, MEMBER_LIST_LIMIT)
            .await
            .map_err(|e| {
                member_error(
                    e,
                    "Error Fetching Members",
                    format!("Unable to list members of guild {guild_id}"),
                )
            })?;

        let mut summaries = Vec::with_capacity(members.len());
        for member in members {
            match MemberSummary::try_from(member) {
                Ok(summary) => summaries.push(summary),
                Err(()) => diags.add_warning(
                    "Skipping Member with Nil User",
                    format!("A member of guild {guild_id} was returned without user data."),
                ),
            }
        }

        Ok(MembersDataModel {
            members: summaries,
            ..config
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(json: serde_json::Value) -> Member {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn summary_flattens_user_and_normalizes_timestamps() {
        let summary = MemberSummary::try_from(member(serde_json::json!({
            "user": { "id": "7", "username": "ada", "discriminator": "0", "bot": false },
            "nick": "Ada",
            "roles": ["1", "2"],
            "joined_at": "2024-03-01T12:30:00.123000+00:00",
            "deaf": false,
            "mute": true
        })))
        .unwrap();

        assert_eq!(summary.id, "7");
        assert_eq!(summary.nickname.as_deref(), Some("Ada"));
        assert_eq!(summary.discriminator, None);
        assert_eq!(summary.joined_at.as_deref(), Some("2024-03-01T12:30:00Z"));
        assert!(summary.mute);
    }

    #[test]
    fn summary_requires_user() {
        assert!(MemberSummary::try_from(member(serde_json::json!({ "roles": [] }))).is_err());
    }

    #[test]
    fn access_errors_carry_the_intent_hint() {
        let err = DiscordError::Api {
            status: 403,
            code: 50001,
            message: "Missing Access".into(),
            retry_after: None,
        };
        let err = member_error(err, "Error Fetching Members", "guild 1".into());
        assert_eq!(err.summary(), "Error Fetching Members");
        assert!(err.detail().contains("SERVER MEMBERS INTENT"));

        let err = DiscordError::Api {
            status: 500,
            code: 0,
            message: "oops".into(),
            retry_after: None,
        };
        let err = member_error(err, "Error Fetching Members", "guild 1".into());
        assert!(!err.detail().contains("INTENT"));
    }
}
