//! `discord_emoji`: a custom guild emoji.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};
use tfd_core::{Diagnostics, ProviderError, ProviderResult, Resource};
use tracing::{debug, info};

use super::{check_length, forbid_change, require};
use crate::{
    DiscordData,
    api::DiscordApi,
    codec::import_id,
    types::{CreateEmoji, EditEmoji, Emoji},
};

const DEFAULT_CONTENT_TYPE: &str = "image/png";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiModel {
    #[serde(default)]
    pub id: Option<String>,
    pub guild_id: String,
    pub name: String,
    /// Base64 image, optionally as a `data:` URL.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
    #[serde(default)]
    pub animated: Option<bool>,
    #[serde(default)]
    pub managed: Option<bool>,
    #[serde(default)]
    pub require_colons: Option<bool>,
    #[serde(default)]
    pub available: Option<bool>,
    /// ID of the user that uploaded the emoji.
    #[serde(default)]
    pub user: Option<String>,
}

impl EmojiModel {
    /// Merge Discord's view into `self`, keeping the configured image inputs.
    fn refresh(mut self, emoji: Emoji) -> Self {
        self.id = emoji.id;
        if let Some(name) = emoji.name {
            self.name = name;
        }
        self.roles = (!emoji.roles.is_empty()).then_some(emoji.roles);
        self.animated = Some(emoji.animated);
        self.managed = Some(emoji.managed);
        self.require_colons = Some(emoji.require_colons);
        self.available = Some(emoji.available);
        self.user = emoji.user.map(|u| u.id);
        self
    }

    fn address(&self, action: &str) -> ProviderResult<(&str, &str)> {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() && !self.guild_id.is_empty() => Ok((&self.guild_id, id)),
            _ => Err(ProviderError::invalid(
                "Missing Guild or Emoji ID",
                format!("The guild_id and id are required to {action} the emoji."),
            )),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Image sources
// ─────────────────────────────────────────────────────────────────────────────

/// Where emoji image bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Base64 payload, bare or as a `data:<type>;base64,` URL
    Inline(String),
    /// Local file
    Path(PathBuf),
    /// Remote URL fetched over HTTP
    Url(String),
}

impl ImageSource {
    /// The configured source, if any. Empty strings count as unset.
    ///
    /// # Errors
    ///
    /// "Conflicting Image Input" when more than one of `image`, `image_path`
    /// and `image_url` is set.
    pub fn from_model(model: &EmojiModel) -> ProviderResult<Option<Self>> {
        let set = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        let candidates = [
            ("image", set(&model.image).map(Self::Inline)),
            ("image_path", set(&model.image_path).map(|p| Self::Path(PathBuf::from(p)))),
            ("image_url", set(&model.image_url).map(Self::Url)),
        ];

        let mut given = candidates
            .into_iter()
            .filter_map(|(attr, source)| source.map(|s| (attr, s)));
        let Some((first, source)) = given.next() else {
            return Ok(None);
        };
        let rest: Vec<&str> = given.map(|(attr, _)| attr).collect();
        if !rest.is_empty() {
            return Err(ProviderError::invalid(
                "Conflicting Image Input",
                format!(
                    "Only one of image, image_path, or image_url may be set, but {first} and {} \
                     were given.",
                    rest.join(" and ")
                ),
            ));
        }
        Ok(Some(source))
    }

    /// Image bytes and their content type.
    ///
    /// # Errors
    ///
    /// Returns a message suitable for an "Error Reading Image Data" diagnostic.
    pub async fn load(&self, api: &dyn DiscordApi) -> Result<(Vec<u8>, String), String> {
        match self {
            Self::Inline(raw) => {
                let (content_type, payload) = split_data_url(raw);
                let bytes = BASE64_STANDARD
                    .decode(payload.trim())
                    .map_err(|e| format!("invalid base64 image data: {e}"))?;
                Ok((bytes, content_type.to_string()))
            }
            Self::Path(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|e| format!("unable to read image file {}: {e}", path.display()))?;
                Ok((bytes, content_type_for_path(path).to_string()))
            }
            Self::Url(url) => {
                let download = api
                    .download(url)
                    .await
                    .map_err(|e| format!("unable to fetch image from URL {url}: {e}"))?;
                let content_type = download
                    .content_type
                    .filter(|ct| !ct.is_empty())
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
                Ok((download.bytes, content_type))
            }
        }
    }

    /// Load and encode as the `data:` URL Discord expects.
    ///
    /// # Errors
    ///
    /// See [`ImageSource::load`].
    pub async fn to_data_url(&self, api: &dyn DiscordApi) -> Result<String, String> {
        let (bytes, content_type) = self.load(api).await?;
        debug!(len = bytes.len(), content_type, "Encoded emoji image");
        Ok(data_url(&content_type, &bytes))
    }
}

/// `data:<content-type>;base64,<payload>`
#[must_use]
pub fn data_url(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{content_type};base64,{}", BASE64_STANDARD.encode(bytes))
}

/// Split a `data:` URL into content type and payload. Anything else is
/// treated as a bare PNG payload.
fn split_data_url(raw: &str) -> (&str, &str) {
    raw.strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .map_or((DEFAULT_CONTENT_TYPE, raw), |(meta, payload)| {
            let content_type = meta.split(';').next().filter(|ct| !ct.is_empty());
            (content_type.unwrap_or(DEFAULT_CONTENT_TYPE), payload)
        })
}

fn content_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

fn validate_name(name: &str) -> ProviderResult<&str> {
    let name = require(name, "Missing Emoji Name", "The name attribute is required.")?;
    check_length(name, 2, 32, "Invalid Emoji Name", "Emoji name")?;
    Ok(name)
}

/// Custom emoji resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmojiResource;

#[async_trait]
impl Resource<dyn DiscordApi> for EmojiResource {
    type Model = EmojiModel;

    fn type_name(&self) -> &'static str {
        "emoji"
    }

    async fn create(
        &self,
        data: &DiscordData,
        plan: EmojiModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<EmojiModel> {
        let api = data.client()?;
        let guild_id = require(&plan.guild_id, "Missing Guild ID", "The guild_id attribute is required.")?;
        let name = validate_name(&plan.name)?;

        let source = ImageSource::from_model(&plan)?.ok_or_else(|| {
            ProviderError::invalid(
                "Error Reading Image Data",
                "one of image, image_path, or image_url must be provided",
            )
        })?;
        let image = source
            .to_data_url(api)
            .await
            .map_err(|e| ProviderError::invalid("Error Reading Image Data", e))?;

        let body = CreateEmoji {
            name: name.to_string(),
            image,
            roles: plan.roles.clone().unwrap_or_default(),
        };
        let emoji = api.create_emoji(guild_id, &body).await.map_err(|e| {
            e.into_provider_error(
                "Error Creating Emoji",
                format!("Unable to create emoji {name} in guild {guild_id}"),
            )
        })?;

        if emoji.id.as_deref().is_none_or(str::is_empty) {
            return Err(ProviderError::External {
                summary: "Invalid Emoji Response".into(),
                detail: format!("Emoji was created but has no ID. Emoji name: {name}, Guild ID: {guild_id}"),
                status_code: None,
                retryable: false,
            });
        }

        info!(guild_id, name, "Created Discord emoji");
        Ok(plan.refresh(emoji))
    }

    async fn read(
        &self,
        data: &DiscordData,
        state: EmojiModel,
        diags: &mut Diagnostics,
    ) -> ProviderResult<Option<EmojiModel>> {
        let api = data.client()?;
        let (guild_id, emoji_id) = state.address("read")?;

        match api.emoji(guild_id, emoji_id).await {
            Ok(emoji) => Ok(Some(state.refresh(emoji))),
            Err(e) if e.is_not_found() => {
                diags.add_warning(
                    "Emoji Not Found",
                    format!(
                        "Emoji {emoji_id} was not found in guild {guild_id}. It may have been deleted. \
                         Removing from state."
                    ),
                );
                Ok(None)
            }
            Err(e) => Err(e.into_provider_error(
                "Error Fetching Emoji",
                format!("Unable to fetch emoji {emoji_id} in guild {guild_id}"),
            )),
        }
    }

    async fn update(
        &self,
        data: &DiscordData,
        plan: EmojiModel,
        state: EmojiModel,
        diags: &mut Diagnostics,
    ) -> ProviderResult<EmojiModel> {
        let api = data.client()?;
        let (guild_id, emoji_id) = state.address("update")?;
        forbid_change(
            &plan.guild_id,
            guild_id,
            "Cannot Change Guild",
            "Discord emojis cannot be moved to a different guild. Delete this emoji and create a new one \
             in the new guild.",
        )?;
        let name = validate_name(&plan.name)?;

        if ImageSource::from_model(&plan)? != ImageSource::from_model(&state)? {
            diags.add_warning(
                "Emoji Image Not Updated",
                "Discord does not allow replacing an emoji's image. Recreate the emoji to change it.",
            );
        }

        let body = EditEmoji {
            name: name.to_string(),
            roles: plan.roles.clone().unwrap_or_default(),
        };
        let emoji = api.edit_emoji(guild_id, emoji_id, &body).await.map_err(|e| {
            e.into_provider_error(
                "Error Updating Emoji",
                format!("Unable to update emoji {emoji_id} in guild {guild_id}"),
            )
        })?;

        let merged = EmojiModel {
            id: state.id.clone(),
            ..plan
        };
        Ok(merged.refresh(emoji))
    }

    async fn delete(
        &self,
        data: &DiscordData,
        state: EmojiModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<()> {
        let api = data.client()?;
        let (guild_id, emoji_id) = state.address("delete")?;

        match api.delete_emoji(guild_id, emoji_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into_provider_error(
                "Error Deleting Emoji",
                format!("Unable to delete emoji {emoji_id} from guild {guild_id}"),
            )),
        }
    }

    async fn import(
        &self,
        data: &DiscordData,
        id: &str,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<EmojiModel> {
        let (guild_id, emoji_id) = import_id::parse2(id, import_id::EMOJI)?;
        let api = data.client()?;
        let emoji = api.emoji(&guild_id, &emoji_id).await.map_err(|e| {
            e.into_provider_error(
                "Error Fetching Emoji",
                format!("Unable to fetch emoji {emoji_id} in guild {guild_id}"),
            )
        })?;
        let model = EmojiModel {
            guild_id,
            ..EmojiModel::default()
        };
        Ok(model.refresh(emoji))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_urls_keep_their_content_type() {
        assert_eq!(split_data_url("data:image/gif;base64,R0lG"), ("image/gif", "R0lG"));
        assert_eq!(split_data_url("iVBORw0"), ("image/png", "iVBORw0"));
        assert_eq!(data_url("image/png", b"hi"), "data:image/png;base64,aGk=");
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for_path(Path::new("party.JPG")), "image/jpeg");
        assert_eq!(content_type_for_path(Path::new("party.gif")), "image/gif");
        assert_eq!(content_type_for_path(Path::new("party")), "image/png");
    }

    #[test]
    fn exactly_one_image_source() {
        let model = EmojiModel {
            image: Some("aGk=".into()),
            image_path: Some(String::new()),
            ..EmojiModel::default()
        };
        assert_eq!(
            ImageSource::from_model(&model).unwrap(),
            Some(ImageSource::Inline("aGk=".into()))
        );

        let model = EmojiModel {
            image: Some(String::new()),
            image_url: Some("https://cdn.example/x.png".into()),
            ..EmojiModel::default()
        };
        assert!(matches!(
            ImageSource::from_model(&model).unwrap(),
            Some(ImageSource::Url(_))
        ));
        assert_eq!(ImageSource::from_model(&EmojiModel::default()).unwrap(), None);
    }

    #[test]
    fn conflicting_image_sources_are_rejected() {
        let model = EmojiModel {
            image: Some("aGk=".into()),
            image_url: Some("https://cdn.example/x.png".into()),
            ..EmojiModel::default()
        };
        let err = ImageSource::from_model(&model).unwrap_err();
        assert_eq!(err.summary(), "Conflicting Image Input");
        assert!(err.detail().contains("image and image_url"));

        let model = EmojiModel {
            image: Some("aGk=".into()),
            image_path: Some("/tmp/x.png".into()),
            image_url: Some("https://cdn.example/x.png".into()),
            ..EmojiModel::default()
        };
        assert!(
            ImageSource::from_model(&model)
                .unwrap_err()
                .detail()
                .contains("image and image_path and image_url")
        );
    }

    #[test]
    fn names_are_bounded() {
        assert_eq!(validate_name("x").unwrap_err().summary(), "Invalid Emoji Name");
        assert!(validate_name("party_parrot").is_ok());
    }
}
