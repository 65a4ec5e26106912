//! Colon-delimited composite identifiers.
//!
//! Resources without a single Discord-issued ID (role memberships,
//! permission overwrites) and resources scoped to a parent (roles, emojis,
//! messages) are imported with IDs like `guild_id:role_id`. Snowflakes never
//! contain `:`, so every parser here rejects a segment that does.

use serde::{Deserialize, Serialize};

use super::CodecError;

/// Shape of a composite ID, used for error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyFormat {
    pub pattern: &'static str,
    pub example: &'static str,
}

pub const ROLE: KeyFormat = KeyFormat {
    pattern: "guild_id:role_id",
    example: "123456789012345678:234567890123456789",
};

pub const EMOJI: KeyFormat = KeyFormat {
    pattern: "guild_id:emoji_id",
    example: "123456789012345678:345678901234567890",
};

pub const MESSAGE: KeyFormat = KeyFormat {
    pattern: "channel_id:message_id",
    example: "123456789012345678:456789012345678901",
};

pub const ROLE_MEMBER: KeyFormat = KeyFormat {
    pattern: "guild_id:role_id:user_id",
    example: "123456789012345678:234567890123456789:567890123456789012",
};

pub const CHANNEL_PERMISSION: KeyFormat = KeyFormat {
    pattern: "channel_id:overwrite_id:type (type is role or member)",
    example: "123456789012345678:234567890123456789:role",
};

impl KeyFormat {
    fn error(self, input: &str) -> CodecError {
        CodecError::InvalidImportId {
            input: input.to_string(),
            format: self.pattern,
            example: self.example,
        }
    }
}

fn is_segment(s: &str) -> bool {
    !s.is_empty() && !s.contains(':')
}

/// Join segments with `:`.
#[must_use]
pub fn build(segments: &[&str]) -> String {
    segments.join(":")
}

/// Split `a:b` on the first colon.
///
/// # Errors
///
/// [`CodecError::InvalidImportId`] unless there are exactly two non-empty
/// segments.
pub fn parse2(input: &str, format: KeyFormat) -> Result<(String, String), CodecError> {
    match input.split_once(':') {
        Some((a, b)) if is_segment(a) && is_segment(b) => Ok((a.to_string(), b.to_string())),
        _ => Err(format.error(input)),
    }
}

/// Split `a:b:c`.
///
/// # Errors
///
/// [`CodecError::InvalidImportId`] unless there are exactly three non-empty
/// segments.
pub fn parse3(input: &str, format: KeyFormat) -> Result<(String, String, String), CodecError> {
    let mut parts = input.split(':');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), Some(c), None) if [a, b, c].iter().all(|s| !s.is_empty()) => {
            Ok((a.to_string(), b.to_string(), c.to_string()))
        }
        _ => Err(format.error(input)),
    }
}

/// Target of a channel permission overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwriteKind {
    Role,
    Member,
}

impl OverwriteKind {
    /// Parse `role` or `member`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "role" => Some(Self::Role),
            "member" => Some(Self::Member),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Role => "role",
            Self::Member => "member",
        }
    }

    /// Discord's numeric overwrite type.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Role => 0,
            Self::Member => 1,
        }
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Role),
            1 => Some(Self::Member),
            _ => None,
        }
    }
}

impl std::fmt::Display for OverwriteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded `channel_id:overwrite_id:type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPermissionKey {
    pub channel_id: String,
    pub overwrite_id: String,
    pub kind: OverwriteKind,
}

impl ChannelPermissionKey {
    /// Render back to the import form.
    #[must_use]
    pub fn to_import_id(&self) -> String {
        build(&[&self.channel_id, &self.overwrite_id, self.kind.as_str()])
    }
}

/// Parse a channel permission import ID.
///
/// The type tag is taken after the last colon and the channel ID before the
/// first; whatever sits between must be a single colon-free segment.
///
/// # Errors
///
/// [`CodecError::InvalidImportId`] for a missing or unknown type tag, an
/// empty segment, or extra colons.
pub fn parse_channel_permission(input: &str) -> Result<ChannelPermissionKey, CodecError> {
    let invalid = || CHANNEL_PERMISSION.error(input);

    let (prefix, tag) = input.rsplit_once(':').ok_or_else(invalid)?;
    let kind = OverwriteKind::parse(tag).ok_or_else(invalid)?;
    let (channel_id, overwrite_id) = prefix.split_once(':').ok_or_else(invalid)?;

    if !is_segment(channel_id) || !is_segment(overwrite_id) {
        return Err(invalid());
    }

    Ok(ChannelPermissionKey {
        channel_id: channel_id.to_string(),
        overwrite_id: overwrite_id.to_string(),
        kind,
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn parse2_splits_guild_and_role() {
        assert_eq!(
            parse2("111:222", ROLE),
            Ok(("111".to_string(), "222".to_string()))
        );
    }

    #[test]
    fn parse2_rejects_malformed_ids() {
        for input in ["", "111", ":222", "111:", "111:222:333"] {
            let err = parse2(input, MESSAGE).unwrap_err();
            assert!(matches!(err, CodecError::InvalidImportId { .. }), "{input}");
        }
        let message = parse2("111", EMOJI).unwrap_err().to_string();
        assert!(message.contains("guild_id:emoji_id"));
        assert!(message.contains("123456789012345678:345678901234567890"));
    }

    #[test]
    fn parse3_requires_three_segments() {
        assert_eq!(
            parse3("1:2:3", ROLE_MEMBER),
            Ok(("1".into(), "2".into(), "3".into()))
        );
        for input in ["1:2", "1:2:3:4", "1::3", "::"] {
            assert!(parse3(input, ROLE_MEMBER).is_err(), "{input}");
        }
    }

    #[test]
    fn channel_permission_variant() {
        let key = parse_channel_permission("100:200:member").unwrap();
        assert_eq!(key.channel_id, "100");
        assert_eq!(key.overwrite_id, "200");
        assert_eq!(key.kind, OverwriteKind::Member);
        assert_eq!(key.to_import_id(), "100:200:member");
    }

    #[test]
    fn channel_permission_rejects_ambiguous_ids() {
        for input in [
            "100:200",
            "100:200:everyone",
            "100:200:300:role",
            ":200:role",
            "100::role",
            "role",
        ] {
            assert!(parse_channel_permission(input).is_err(), "{input}");
        }
    }

    #[test]
    fn overwrite_kind_codes() {
        assert_eq!(OverwriteKind::from_code(OverwriteKind::Role.code()), Some(OverwriteKind::Role));
        assert_eq!(OverwriteKind::from_code(1), Some(OverwriteKind::Member));
        assert_eq!(OverwriteKind::from_code(7), None);
    }

    proptest! {
        #[test]
        fn two_segment_round_trip(a in "[0-9a-z]{1,20}", b in "[0-9a-z]{1,20}") {
            let id = build(&[&a, &b]);
            prop_assert_eq!(parse2(&id, ROLE), Ok((a, b)));
        }

        #[test]
        fn three_segment_round_trip(
            a in "[0-9]{1,20}",
            b in "[0-9]{1,20}",
            c in "[0-9]{1,20}",
        ) {
            let id = build(&[&a, &b, &c]);
            prop_assert_eq!(parse3(&id, ROLE_MEMBER), Ok((a, b, c)));
        }

        #[test]
        fn permission_round_trip(a in "[0-9]{1,20}", b in "[0-9]{1,20}", member in any::<bool>()) {
            let kind = if member { OverwriteKind::Member } else { OverwriteKind::Role };
            let key = ChannelPermissionKey { channel_id: a, overwrite_id: b, kind };
            prop_assert_eq!(parse_channel_permission(&key.to_import_id()), Ok(key));
        }
    }
}
