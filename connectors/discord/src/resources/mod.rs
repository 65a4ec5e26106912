//! Managed resources.

mod category;
mod channel;
mod channel_permission;
mod emoji;
mod everyone_role;
mod invite;
mod message;
mod role;
mod role_member;
mod server;
mod webhook;

pub use category::{CategoryModel, CategoryResource};
pub use channel::{ChannelModel, ChannelResource};
pub use channel_permission::{ChannelPermissionModel, ChannelPermissionResource};
pub use emoji::{EmojiModel, EmojiResource, ImageSource};
pub use everyone_role::{EveryoneRoleModel, EveryoneRoleResource};
pub use invite::{InviteModel, InviteResource};
pub use message::{MessageModel, MessageResource};
pub use role::{RoleModel, RoleResource};
pub use role_member::{RoleMemberModel, RoleMemberResource};
pub use server::{ServerModel, ServerResource};
pub use webhook::{WebhookModel, WebhookResource};

use tfd_core::{ProviderError, ProviderResult};

/// Require a non-empty attribute value.
pub(crate) fn require<'a>(value: &'a str, summary: &str, detail: &str) -> ProviderResult<&'a str> {
    if value.trim().is_empty() {
        Err(ProviderError::invalid(summary, detail))
    } else {
        Ok(value)
    }
}

/// Require an ID that was recorded in state.
pub(crate) fn state_id<'a>(id: Option<&'a str>, what: &str) -> ProviderResult<&'a str> {
    id.filter(|id| !id.is_empty()).ok_or_else(|| {
        ProviderError::invalid(
            format!("Missing {what} ID"),
            format!("The {} ID is missing from state.", what.to_ascii_lowercase()),
        )
    })
}

/// Check a character count against inclusive bounds.
pub(crate) fn check_length(
    value: &str,
    min: usize,
    max: usize,
    summary: &str,
    attribute: &str,
) -> ProviderResult<()> {
    let len = value.chars().count();
    if (min..=max).contains(&len) {
        Ok(())
    } else {
        Err(ProviderError::invalid(
            summary,
            format!("{attribute} must be between {min} and {max} characters, got {len}"),
        ))
    }
}

/// Reject changes to attributes that would require a new object.
pub(crate) fn forbid_change(
    planned: &str,
    current: &str,
    summary: &str,
    detail: &str,
) -> ProviderResult<()> {
    if planned == current {
        Ok(())
    } else {
        Err(ProviderError::invalid(summary, detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_rejects_blank() {
        assert!(require("  ", "Missing Guild ID", "The guild_id attribute is required.").is_err());
        assert_eq!(require("1", "x", "y").unwrap(), "1");
    }

    #[test]
    fn state_id_message_names_the_entity() {
        let err = state_id(None, "Channel").unwrap_err();
        assert_eq!(err.summary(), "Missing Channel ID");
        assert_eq!(err.detail(), "The channel ID is missing from state.");
    }

    #[test]
    fn check_length_counts_characters() {
        assert!(check_length("ab", 2, 32, "Invalid Emoji Name", "name").is_ok());
        assert!(check_length("é", 2, 32, "Invalid Emoji Name", "name").is_err());
        let err = check_length("", 1, 100, "Invalid Role Name", "name").unwrap_err();
        assert!(err.detail().contains("between 1 and 100"));
    }
}
