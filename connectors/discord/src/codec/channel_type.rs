//! Channel type names used in configuration and Discord's numeric codes.

use super::CodecError;

/// Discord guild channel types known to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelType {
    Text,
    Voice,
    Category,
    News,
    Stage,
    Directory,
    Forum,
    Media,
}

impl ChannelType {
    /// Discord's numeric code.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Text => 0,
            Self::Voice => 2,
            Self::Category => 4,
            Self::News => 5,
            Self::Stage => 13,
            Self::Directory => 14,
            Self::Forum => 15,
            Self::Media => 16,
        }
    }

    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            0 => Self::Text,
            2 => Self::Voice,
            4 => Self::Category,
            5 => Self::News,
            13 => Self::Stage,
            14 => Self::Directory,
            15 => Self::Forum,
            16 => Self::Media,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Voice => "voice",
            Self::Category => "category",
            Self::News => "news",
            Self::Stage => "stage",
            Self::Directory => "directory",
            Self::Forum => "forum",
            Self::Media => "media",
        }
    }

    /// Parse a configured type name. Only types a bot may create are accepted.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnsupportedChannelType`] for anything else.
    pub fn decode(name: &str) -> Result<Self, CodecError> {
        match name {
            "" | "text" => Ok(Self::Text),
            "voice" => Ok(Self::Voice),
            "category" => Ok(Self::Category),
            "media" => Ok(Self::Media),
            "directory" => Ok(Self::Directory),
            _ => Err(CodecError::UnsupportedChannelType {
                name: name.to_string(),
            }),
        }
    }

    /// Name for a numeric code read back from Discord. Unknown codes are
    /// reported as `text`.
    #[must_use]
    pub fn encode(code: i64) -> &'static str {
        Self::from_code(code).map_or("text", Self::as_str)
    }
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(super) fn unsupported_message(name: &str) -> String {
    let base = format!(
        "invalid channel type: {name}. Valid values are: text, voice, category, media, directory"
    );
    match name {
        "news" | "stage" | "forum" => format!(
            "{base}. {name} channels exist on Discord but cannot be created by bots \
             (Discord API error 50024); create them manually or with a user OAuth2 token"
        ),
        _ => format!(
            "{base}. Note: news, stage, and forum channels cannot be created by bots"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_creatable_types() {
        assert_eq!(ChannelType::decode("text"), Ok(ChannelType::Text));
        assert_eq!(ChannelType::decode(""), Ok(ChannelType::Text));
        assert_eq!(ChannelType::decode("voice").map(ChannelType::code), Ok(2));
        assert_eq!(ChannelType::decode("category").map(ChannelType::code), Ok(4));
        assert_eq!(ChannelType::decode("media").map(ChannelType::code), Ok(16));
        assert_eq!(ChannelType::decode("directory").map(ChannelType::code), Ok(14));
    }

    #[test]
    fn decode_rejects_bot_restricted_types() {
        let err = ChannelType::decode("stage").unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedChannelType { .. }));
        assert!(err.to_string().contains("50024"));

        let err = ChannelType::decode("Voice").unwrap_err();
        assert!(err.to_string().contains("Valid values are"));
    }

    #[test]
    fn encode_recognizes_read_only_types() {
        assert_eq!(ChannelType::encode(0), "text");
        assert_eq!(ChannelType::encode(5), "news");
        assert_eq!(ChannelType::encode(13), "stage");
        assert_eq!(ChannelType::encode(15), "forum");
        assert_eq!(ChannelType::encode(16), "media");
    }

    #[test]
    fn encode_falls_back_to_text() {
        assert_eq!(ChannelType::encode(1), "text");
        assert_eq!(ChannelType::encode(99), "text");
        assert_eq!(ChannelType::encode(-3), "text");
    }

    #[test]
    fn creatable_types_round_trip() {
        for name in ["text", "voice", "category", "media", "directory"] {
            let ty = ChannelType::decode(name).unwrap();
            assert_eq!(ChannelType::encode(ty.code()), name);
        }
        // news is display-only
        assert!(ChannelType::decode(ChannelType::encode(5)).is_err());
    }
}
