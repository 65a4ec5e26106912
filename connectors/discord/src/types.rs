//! Discord API types.
//!
//! Only the fields the provider maps are declared; Discord sends many more
//! and serde ignores them.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Permission bitfields travel as decimal strings; older payloads and our
/// own fixtures sometimes use plain numbers.
pub mod permission_bits {
    use serde::{Deserialize, Deserializer, Serializer, de};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    fn parse<E: de::Error>(raw: Raw) -> Result<u64, E> {
        match raw {
            Raw::Text(s) => s.parse().map_err(E::custom),
            Raw::Number(n) => Ok(n),
        }
    }

    pub fn serialize<S: Serializer>(bits: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(bits)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        parse(Raw::deserialize(deserializer)?)
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        use super::{Raw, parse};

        pub fn serialize<S: Serializer>(bits: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
            match bits {
                Some(bits) => serializer.collect_str(bits),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
            Option::<Raw>::deserialize(deserializer)?
                .map(parse::<D::Error>)
                .transpose()
        }
    }
}

/// Render a Discord ISO-8601 timestamp as RFC 3339 in UTC, second precision.
///
/// Unparseable input is passed through unchanged.
#[must_use]
pub fn format_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| raw.to_string(),
        |ts| ts.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Users and guilds
// ─────────────────────────────────────────────────────────────────────────────

/// Discord user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User ID
    pub id: String,

    /// Username
    pub username: String,

    /// Discriminator (legacy)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,

    /// Global display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_name: Option<String>,

    /// Avatar hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    /// Whether this is a bot
    #[serde(default)]
    pub bot: bool,
}

/// Discord guild (server). Also used for the partial guilds returned by
/// `GET /users/@me/guilds`, which carry `owner` and `permissions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guild {
    /// Guild ID
    pub id: String,

    /// Guild name
    pub name: String,

    /// Icon hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Owner ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,

    /// Whether the current user owns the guild
    #[serde(default)]
    pub owner: bool,

    /// Current user's permissions in the guild
    #[serde(default, with = "permission_bits::option", skip_serializing_if = "Option::is_none")]
    pub permissions: Option<u64>,

    /// Enabled guild features
    #[serde(default)]
    pub features: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Channels
// ─────────────────────────────────────────────────────────────────────────────

/// Per-role or per-member permission exception on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverwrite {
    /// Role or user ID
    pub id: String,

    /// 0 = role, 1 = member
    #[serde(rename = "type")]
    pub kind: u8,

    /// Allowed permission bits
    #[serde(with = "permission_bits")]
    pub allow: u64,

    /// Denied permission bits
    #[serde(with = "permission_bits")]
    pub deny: u64,
}

/// Discord channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    /// Channel ID
    pub id: String,

    /// Channel type
    #[serde(rename = "type")]
    pub channel_type: i64,

    /// Guild ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,

    /// Channel name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Topic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    /// Sorting position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,

    /// Parent category ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Explicit permission overwrites
    #[serde(default)]
    pub permission_overwrites: Vec<PermissionOverwrite>,
}

/// Body of `POST /guilds/{guild.id}/channels`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateChannel {
    pub name: String,
    #[serde(rename = "type")]
    pub channel_type: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
}

/// Body of `PATCH /channels/{channel.id}`. Unset fields are left alone;
/// `parent_id: Some(None)` detaches the channel from its category.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EditChannel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_overwrites: Option<Vec<PermissionOverwrite>>,
}

impl EditChannel {
    /// True when nothing would be sent.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.parent_id.is_none()
            && self.position.is_none()
            && self.permission_overwrites.is_none()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Roles and members
// ─────────────────────────────────────────────────────────────────────────────

/// Discord role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: i64,
    #[serde(default)]
    pub hoist: bool,
    #[serde(default)]
    pub position: i64,
    #[serde(default, with = "permission_bits")]
    pub permissions: u64,
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub mentionable: bool,
}

/// Body of role create and edit calls.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoleParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hoist: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentionable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", with = "permission_bits::option")]
    pub permissions: Option<u64>,
}

impl RoleParams {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.color.is_none()
            && self.hoist.is_none()
            && self.mentionable.is_none()
            && self.permissions.is_none()
    }
}

/// Guild member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nick: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium_since: Option<String>,
    #[serde(default)]
    pub deaf: bool,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub pending: bool,
    #[serde(default, with = "permission_bits::option", skip_serializing_if = "Option::is_none")]
    pub permissions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communication_disabled_until: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Emojis
// ─────────────────────────────────────────────────────────────────────────────

/// Custom guild emoji.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Emoji {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default)]
    pub require_colons: bool,
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub animated: bool,
    #[serde(default)]
    pub available: bool,
}

/// Body of `POST /guilds/{guild.id}/emojis`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateEmoji {
    pub name: String,
    /// `data:<content-type>;base64,<payload>`
    pub image: String,
    pub roles: Vec<String>,
}

/// Body of `PATCH /guilds/{guild.id}/emojis/{emoji.id}`.
#[derive(Debug, Clone, Serialize)]
pub struct EditEmoji {
    pub name: String,
    pub roles: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Invites, messages, webhooks
// ─────────────────────────────────────────────────────────────────────────────

/// Channel summary embedded in an invite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteChannel {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Channel invite, including metadata when Discord provides it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invite {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<InviteChannel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_uses: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporary: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

/// Body of `POST /channels/{channel.id}/invites`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CreateInvite {
    pub max_age: i64,
    pub max_uses: i64,
    pub temporary: bool,
    pub unique: bool,
}

/// Discord message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message ID
    pub id: String,

    /// Channel ID
    pub channel_id: String,

    /// Author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,

    /// Content
    #[serde(default)]
    pub content: String,

    /// Creation timestamp
    #[serde(default)]
    pub timestamp: String,

    /// Last edit timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_timestamp: Option<String>,

    /// Text-to-speech flag
    #[serde(default)]
    pub tts: bool,
}

/// Body of message create and edit calls.
#[derive(Debug, Clone, Serialize)]
pub struct MessageParams {
    pub content: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub tts: bool,
}

/// Channel webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    pub id: String,
    #[serde(rename = "type", default)]
    pub webhook_type: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Body of webhook create and edit calls.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WebhookParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn permissions_accept_strings_and_numbers() {
        let role: Role = serde_json::from_value(json!({
            "id": "1", "name": "mods", "permissions": "1099511627775"
        }))
        .unwrap();
        assert_eq!(role.permissions, 1_099_511_627_775);

        let overwrite: PermissionOverwrite =
            serde_json::from_value(json!({ "id": "2", "type": 1, "allow": 1024, "deny": "0" })).unwrap();
        assert_eq!(overwrite.allow, 1024);
        assert_eq!(serde_json::to_value(&overwrite).unwrap()["allow"], "1024");
    }

    #[test]
    fn edit_channel_can_clear_parent() {
        let body = EditChannel {
            parent_id: Some(None),
            ..EditChannel::default()
        };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({ "parent_id": null }));
        assert!(EditChannel::default().is_empty());
    }

    #[test]
    fn timestamps_render_in_utc() {
        assert_eq!(
            format_timestamp("2024-01-02T03:04:05.678000+00:00"),
            "2024-01-02T03:04:05Z"
        );
        assert_eq!(format_timestamp("2024-01-02T05:04:05+02:00"), "2024-01-02T03:04:05Z");
        assert_eq!(format_timestamp("not a date"), "not a date");
    }

    #[test]
    fn role_params_skip_unset_fields() {
        let body = RoleParams {
            permissions: Some(8),
            ..RoleParams::default()
        };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({ "permissions": "8" }));
    }
}
