//! `discord_channel_permission`: one permission overwrite on a channel.
//!
//! Discord has no endpoint for a single overwrite in the shape we need, so
//! every write fetches the channel, rewrites its overwrite list and sends
//! the whole list back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfd_core::{Diagnostics, ProviderError, ProviderResult, Resource};
use tracing::{debug, info};

use super::require;
use crate::{
    DiscordData,
    api::DiscordApi,
    codec::{OverwriteKind, import_id},
    types::{Channel, EditChannel, PermissionOverwrite},
};

/// IDs copied from documentation examples. Discord silently drops overwrites
/// for unknown targets, so these are rejected up front.
const PLACEHOLDER_IDS: [&str; 4] = [
    "987654321098765432",
    "123456789012345678",
    "111111111111111111",
    "000000000000000000",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelPermissionModel {
    /// `channel_id:overwrite_id`
    #[serde(default)]
    pub id: Option<String>,
    pub channel_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub overwrite_id: String,
    #[serde(default)]
    pub allow: Option<u64>,
    #[serde(default)]
    pub deny: Option<u64>,
}

impl ChannelPermissionModel {
    fn with_overwrite(channel_id: &str, kind: OverwriteKind, overwrite: &PermissionOverwrite) -> Self {
        Self {
            id: Some(import_id::build(&[channel_id, &overwrite.id])),
            channel_id: channel_id.to_string(),
            kind: kind.to_string(),
            overwrite_id: overwrite.id.clone(),
            allow: Some(overwrite.allow),
            deny: Some(overwrite.deny),
        }
    }

    fn overwrite_kind(&self) -> ProviderResult<OverwriteKind> {
        OverwriteKind::parse(&self.kind).ok_or_else(|| {
            ProviderError::invalid(
                "Invalid Type",
                format!(
                    "Invalid type '{}'. Valid values are: \"role\", \"member\".",
                    self.kind
                ),
            )
        })
    }

    fn desired(&self, kind: OverwriteKind) -> PermissionOverwrite {
        PermissionOverwrite {
            id: self.overwrite_id.clone(),
            kind: kind.code(),
            allow: self.allow.unwrap_or_default(),
            deny: self.deny.unwrap_or_default(),
        }
    }
}

fn find<'a>(channel: &'a Channel, id: &str, kind: OverwriteKind) -> Option<&'a PermissionOverwrite> {
    channel
        .permission_overwrites
        .iter()
        .find(|ow| ow.id == id && ow.kind == kind.code())
}

/// The channel's overwrites without the one for `(id, kind)`.
fn without(channel: &Channel, id: &str, kind: OverwriteKind) -> Vec<PermissionOverwrite> {
    channel
        .permission_overwrites
        .iter()
        .filter(|ow| ow.id != id || ow.kind != kind.code())
        .cloned()
        .collect()
}

async fn fetch_channel(api: &dyn DiscordApi, channel_id: &str) -> ProviderResult<Channel> {
    api.channel(channel_id).await.map_err(|e| {
        e.into_provider_error("Error Fetching Channel", format!("Unable to fetch channel {channel_id}"))
    })
}

/// Replace or append `desired` and return the overwrite Discord reports
/// afterwards, re-fetching the channel once if the edit response omits it.
async fn write_overwrite(
    api: &dyn DiscordApi,
    channel_id: &str,
    kind: OverwriteKind,
    desired: PermissionOverwrite,
    summary: &str,
) -> ProviderResult<Option<PermissionOverwrite>> {
    let channel = fetch_channel(api, channel_id).await?;
    let mut overwrites = without(&channel, &desired.id, kind);
    let overwrite_id = desired.id.clone();
    overwrites.push(desired);

    let edit = EditChannel {
        permission_overwrites: Some(overwrites),
        ..EditChannel::default()
    };
    let updated = api.edit_channel(channel_id, &edit).await.map_err(|e| {
        e.into_provider_error(
            summary,
            format!("Unable to set permission for {kind} {overwrite_id} on channel {channel_id}"),
        )
    })?;

    if let Some(found) = find(&updated, &overwrite_id, kind) {
        return Ok(Some(found.clone()));
    }

    debug!(channel_id, overwrite_id, "Overwrite missing from edit response, re-fetching");
    Ok(api
        .channel(channel_id)
        .await
        .ok()
        .and_then(|channel| find(&channel, &overwrite_id, kind).cloned()))
}

/// Channel permission overwrite resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChannelPermissionResource;

#[async_trait]
impl Resource<dyn DiscordApi> for ChannelPermissionResource {
    type Model = ChannelPermissionModel;

    fn type_name(&self) -> &'static str {
        "channel_permission"
    }

    async fn create(
        &self,
        data: &DiscordData,
        plan: ChannelPermissionModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<ChannelPermissionModel> {
        let api = data.client()?;
        let channel_id = require(&plan.channel_id, "Missing Channel ID", "The channel_id attribute is required.")?;
        require(
            &plan.kind,
            "Missing Type",
            "The type attribute is required. Valid values: \"role\" or \"member\".",
        )?;
        let kind = plan.overwrite_kind()?;
        let overwrite_id = require(
            &plan.overwrite_id,
            "Missing Overwrite ID",
            "The overwrite_id attribute is required.",
        )?;

        if PLACEHOLDER_IDS.contains(&overwrite_id) {
            return Err(ProviderError::invalid(
                "Invalid Overwrite ID",
                format!(
                    "The {kind} ID '{overwrite_id}' is a placeholder. Please provide a valid {kind} ID \
                     from your Discord server. Get the ID by enabling Developer Mode in Discord and \
                     right-clicking the {kind}."
                ),
            ));
        }

        let written = write_overwrite(
            api,
            channel_id,
            kind,
            plan.desired(kind),
            "Error Setting Channel Permission",
        )
        .await?;

        let Some(overwrite) = written else {
            return Err(ProviderError::invalid(
                "Permission Overwrite Not Created",
                format!(
                    "The permission overwrite for {kind} '{overwrite_id}' was not created. This means \
                     the {kind} ID '{overwrite_id}' doesn't exist in your Discord server.\n\nVerify the \
                     {kind} exists in your Discord server and that the bot has permission to view it."
                ),
            ));
        };

        info!(channel_id, overwrite_id, %kind, "Set channel permission overwrite");
        Ok(ChannelPermissionModel::with_overwrite(channel_id, kind, &overwrite))
    }

    async fn read(
        &self,
        data: &DiscordData,
        state: ChannelPermissionModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<Option<ChannelPermissionModel>> {
        let api = data.client()?;
        let channel_id = require(&state.channel_id, "Missing Channel ID", "The channel ID is missing from state.")?;
        let kind = state.overwrite_kind()?;

        let channel = match api.channel(channel_id).await {
            Ok(channel) => channel,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => {
                return Err(e.into_provider_error(
                    "Error Fetching Channel",
                    format!("Unable to fetch channel {channel_id}"),
                ));
            }
        };

        Ok(find(&channel, &state.overwrite_id, kind)
            .map(|ow| ChannelPermissionModel::with_overwrite(channel_id, kind, ow)))
    }

    async fn update(
        &self,
        data: &DiscordData,
        plan: ChannelPermissionModel,
        _state: ChannelPermissionModel,
        diags: &mut Diagnostics,
    ) -> ProviderResult<ChannelPermissionModel> {
        let api = data.client()?;
        let kind = plan.overwrite_kind()?;
        let desired = plan.desired(kind);

        let written = write_overwrite(
            api,
            &plan.channel_id,
            kind,
            desired.clone(),
            "Error Updating Channel Permission",
        )
        .await?;

        let overwrite = written.unwrap_or_else(|| {
            diags.add_warning(
                "Permission Overwrite Not Found in Response",
                format!(
                    "The permission overwrite for {kind} {} was updated successfully, but was not \
                     found in the API response. Using the values that were sent.",
                    plan.overwrite_id
                ),
            );
            desired
        });
        Ok(ChannelPermissionModel::with_overwrite(&plan.channel_id, kind, &overwrite))
    }

    async fn delete(
        &self,
        data: &DiscordData,
        state: ChannelPermissionModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<()> {
        let api = data.client()?;
        let kind = OverwriteKind::parse(&state.kind).unwrap_or(OverwriteKind::Role);

        let channel = match api.channel(&state.channel_id).await {
            Ok(channel) => channel,
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => {
                return Err(e.into_provider_error(
                    "Error Fetching Channel",
                    format!("Unable to fetch channel {}", state.channel_id),
                ));
            }
        };

        let edit = EditChannel {
            permission_overwrites: Some(without(&channel, &state.overwrite_id, kind)),
            ..EditChannel::default()
        };
        api.edit_channel(&state.channel_id, &edit).await.map_err(|e| {
            e.into_provider_error(
                "Error Deleting Channel Permission",
                format!(
                    "Unable to delete permission for {kind} {} on channel {}",
                    state.overwrite_id, state.channel_id
                ),
            )
        })?;
        Ok(())
    }

    async fn import(
        &self,
        data: &DiscordData,
        id: &str,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<ChannelPermissionModel> {
        let key = import_id::parse_channel_permission(id)?;
        let api = data.client()?;
        let channel = fetch_channel(api, &key.channel_id).await?;

        let overwrite = find(&channel, &key.overwrite_id, key.kind).ok_or_else(|| {
            ProviderError::not_found(
                "Permission Overwrite Not Found",
                format!(
                    "Permission overwrite for {} {} on channel {} was not found",
                    key.kind, key.overwrite_id, key.channel_id
                ),
            )
        })?;
        Ok(ChannelPermissionModel::with_overwrite(&key.channel_id, key.kind, overwrite))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(overwrites: Vec<PermissionOverwrite>) -> Channel {
        Channel {
            id: "c".into(),
            channel_type: 0,
            guild_id: None,
            name: None,
            topic: None,
            position: None,
            parent_id: None,
            permission_overwrites: overwrites,
        }
    }

    fn overwrite(id: &str, kind: u8) -> PermissionOverwrite {
        PermissionOverwrite {
            id: id.into(),
            kind,
            allow: 1,
            deny: 0,
        }
    }

    #[test]
    fn matching_uses_both_id_and_kind() {
        let ch = channel(vec![overwrite("1", 1), overwrite("1", 0)]);
        assert_eq!(find(&ch, "1", OverwriteKind::Role).map(|ow| ow.kind), Some(0));

        let rest = without(&ch, "1", OverwriteKind::Member);
        assert_eq!(rest, vec![overwrite("1", 0)]);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let model = ChannelPermissionModel {
            kind: "everyone".into(),
            ..ChannelPermissionModel::default()
        };
        assert_eq!(model.overwrite_kind().unwrap_err().summary(), "Invalid Type");
    }
}
