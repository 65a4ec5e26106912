//! Test fixtures.
//!
//! Payloads mirror what Discord actually sends: snowflakes and permission
//! bitfields are strings, timestamps carry microseconds and an offset.

// ─────────────────────────────────────────────────────────────────────────────
// Discord Fixtures
// ─────────────────────────────────────────────────────────────────────────────

/// Discord API response bodies.
pub mod discord {
    use serde_json::{Value, json};

    /// Timestamp used by every fixture that needs one.
    pub const TIMESTAMP: &str = "2024-03-01T12:30:00.123000+00:00";

    /// A bot user.
    #[must_use]
    pub fn bot_user(id: &str, username: &str) -> Value {
        json!({
            "id": id,
            "username": username,
            "discriminator": "0",
            "global_name": null,
            "avatar": null,
            "bot": true
        })
    }

    /// A human user.
    #[must_use]
    pub fn user(id: &str, username: &str) -> Value {
        json!({
            "id": id,
            "username": username,
            "discriminator": "0",
            "global_name": username,
            "avatar": "a1b2c3",
            "bot": false
        })
    }

    /// A full guild object.
    #[must_use]
    pub fn guild(id: &str, name: &str, owner_id: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "icon": null,
            "owner_id": owner_id,
            "features": ["COMMUNITY"]
        })
    }

    /// A partial guild from `GET /users/@me/guilds`.
    #[must_use]
    pub fn partial_guild(id: &str, name: &str, owner: bool) -> Value {
        json!({
            "id": id,
            "name": name,
            "icon": null,
            "owner": owner,
            "permissions": "2147483647",
            "features": []
        })
    }

    /// A guild channel of any type.
    #[must_use]
    pub fn channel(id: &str, guild_id: &str, name: &str, kind: i64, parent_id: Option<&str>, position: i64) -> Value {
        json!({
            "id": id,
            "type": kind,
            "guild_id": guild_id,
            "name": name,
            "position": position,
            "parent_id": parent_id,
            "permission_overwrites": []
        })
    }

    /// A top-level text channel.
    #[must_use]
    pub fn text_channel(id: &str, guild_id: &str, name: &str) -> Value {
        channel(id, guild_id, name, 0, None, 0)
    }

    /// A category channel.
    #[must_use]
    pub fn category(id: &str, guild_id: &str, name: &str) -> Value {
        channel(id, guild_id, name, 4, None, 0)
    }

    /// A permission overwrite; `kind` is 0 for roles and 1 for members.
    #[must_use]
    pub fn overwrite(id: &str, kind: u8, allow: u64, deny: u64) -> Value {
        json!({
            "id": id,
            "type": kind,
            "allow": allow.to_string(),
            "deny": deny.to_string()
        })
    }

    /// A text channel carrying `overwrites`.
    #[must_use]
    pub fn channel_with_overwrites(id: &str, guild_id: &str, overwrites: Vec<Value>) -> Value {
        let mut channel = text_channel(id, guild_id, "general");
        channel["permission_overwrites"] = Value::Array(overwrites);
        channel
    }

    /// A role.
    #[must_use]
    pub fn role(id: &str, name: &str, color: i64, position: i64) -> Value {
        json!({
            "id": id,
            "name": name,
            "color": color,
            "hoist": false,
            "position": position,
            "permissions": "104324673",
            "managed": false,
            "mentionable": false
        })
    }

    /// A guild member wrapping `user`.
    #[must_use]
    pub fn member(user: Value, roles: &[&str]) -> Value {
        json!({
            "user": user,
            "nick": null,
            "roles": roles,
            "joined_at": TIMESTAMP,
            "premium_since": null,
            "deaf": false,
            "mute": false,
            "pending": false
        })
    }

    /// A custom emoji.
    #[must_use]
    pub fn emoji(id: &str, name: &str, roles: &[&str]) -> Value {
        json!({
            "id": id,
            "name": name,
            "roles": roles,
            "user": user("7", "uploader"),
            "require_colons": true,
            "managed": false,
            "animated": false,
            "available": true
        })
    }

    /// An invite with metadata.
    #[must_use]
    pub fn invite(code: &str, channel_id: &str, max_age: i64, max_uses: i64) -> Value {
        json!({
            "code": code,
            "channel": { "id": channel_id, "name": "general" },
            "max_age": max_age,
            "max_uses": max_uses,
            "temporary": false,
            "uses": 0,
            "created_at": TIMESTAMP,
            "expires_at": null
        })
    }

    /// A message sent by `author`.
    #[must_use]
    pub fn message(id: &str, channel_id: &str, content: &str, author: Value) -> Value {
        json!({
            "id": id,
            "channel_id": channel_id,
            "author": author,
            "content": content,
            "timestamp": TIMESTAMP,
            "edited_timestamp": null,
            "tts": false
        })
    }

    /// An incoming webhook, including its token.
    #[must_use]
    pub fn webhook(id: &str, channel_id: &str, name: &str, token: Option<&str>) -> Value {
        json!({
            "id": id,
            "type": 1,
            "guild_id": "1",
            "channel_id": channel_id,
            "name": name,
            "avatar": null,
            "token": token,
            "user": bot_user("42", "terraform-bot")
        })
    }
}
