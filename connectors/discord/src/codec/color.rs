//! Hex and `rgb(...)` color conversion to Discord's 24-bit integer colors.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::CodecError;

/// Largest color Discord accepts (`#FFFFFF`).
pub const MAX_COLOR: u32 = 0x00FF_FFFF;

// Signed digits are captured so that negative components report a range
// error rather than a format error. Whitespace is ASCII only: `\s` would
// also admit `\v` and Unicode spaces.
static RGB_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^rgb[\t\n\f\r ]*\([\t\n\f\r ]*(-?[0-9]+)[\t\n\f\r ]*,[\t\n\f\r ]*(-?[0-9]+)[\t\n\f\r ]*,[\t\n\f\r ]*(-?[0-9]+)[\t\n\f\r ]*\)$",
    )
    .expect("valid RGB pattern")
});

/// Convert `#RRGGBB`, `RRGGBB`, `#RGB` or `RGB` (any case) to a decimal color.
///
/// # Errors
///
/// [`CodecError::InvalidFormat`] for characters outside `0-9A-F`,
/// [`CodecError::InvalidLength`] for anything but 3 or 6 digits. Both echo
/// the digits without `#`, uppercased.
pub fn hex_to_decimal(input: &str) -> Result<u32, CodecError> {
    let digits = input.strip_prefix('#').unwrap_or(input).to_uppercase();
    let invalid_format = |digits: &str| CodecError::InvalidFormat {
        what: "hex color",
        input: digits.to_string(),
        expected: "must contain only 0-9 and A-F",
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid_format(&digits));
    }

    let digits = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits,
        _ => return Err(CodecError::InvalidLength { input: digits }),
    };

    u32::from_str_radix(&digits, 16).map_err(|_| invalid_format(&digits))
}

/// Convert `rgb(R, G, B)` to a decimal color.
///
/// # Errors
///
/// [`CodecError::InvalidFormat`] when the text is not `rgb(R, G, B)`,
/// [`CodecError::OutOfRange`] naming the first component outside `0..=255`.
pub fn rgb_to_decimal(input: &str) -> Result<u32, CodecError> {
    let captures = RGB_PATTERN
        .captures(input)
        .ok_or_else(|| CodecError::InvalidFormat {
            what: "RGB",
            input: input.to_string(),
            expected: "expected format: rgb(R, G, B)",
        })?;

    let mut color = 0u32;
    for (index, component) in ["red", "green", "blue"].into_iter().enumerate() {
        let raw = &captures[index + 1];
        let value = raw
            .parse::<u8>()
            .map_err(|_| CodecError::OutOfRange {
                component,
                value: raw.to_string(),
                min: 0,
                max: 255,
            })?;
        color = (color << 8) | u32::from(value);
    }

    Ok(color)
}

/// Reject colors outside `0..=MAX_COLOR`.
///
/// # Errors
///
/// [`CodecError::OutOfRange`] for negative or too-large values.
pub fn validate_color(value: i64) -> Result<u32, CodecError> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v <= MAX_COLOR)
        .ok_or_else(|| CodecError::OutOfRange {
            component: "color",
            value: value.to_string(),
            min: 0,
            max: MAX_COLOR,
        })
}

/// Exactly one of the two textual color forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorInput {
    Hex(String),
    Rgb(String),
}

/// Why a [`ColorInput`] could not be built from optional attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorInputError {
    Missing,
    Conflicting,
}

impl ColorInputError {
    #[must_use]
    pub const fn summary(self) -> &'static str {
        match self {
            Self::Missing => "Missing Color Input",
            Self::Conflicting => "Conflicting Color Input",
        }
    }

    #[must_use]
    pub const fn detail(self) -> &'static str {
        match self {
            Self::Missing => "Either 'hex' or 'rgb' must be specified.",
            Self::Conflicting => "Only one of 'hex' or 'rgb' can be specified, not both.",
        }
    }
}

impl ColorInput {
    /// Build from the `hex` and `rgb` attributes. Empty strings count as unset.
    ///
    /// # Errors
    ///
    /// When neither or both attributes are set.
    pub fn from_attributes(hex: Option<&str>, rgb: Option<&str>) -> Result<Self, ColorInputError> {
        let hex = hex.filter(|s| !s.is_empty());
        let rgb = rgb.filter(|s| !s.is_empty());
        match (hex, rgb) {
            (Some(hex), None) => Ok(Self::Hex(hex.to_string())),
            (None, Some(rgb)) => Ok(Self::Rgb(rgb.to_string())),
            (None, None) => Err(ColorInputError::Missing),
            (Some(_), Some(_)) => Err(ColorInputError::Conflicting),
        }
    }

    /// Decimal value of this color.
    ///
    /// # Errors
    ///
    /// Propagates the converter's format, length or range error.
    pub fn to_decimal(&self) -> Result<u32, CodecError> {
        match self {
            Self::Hex(hex) => hex_to_decimal(hex),
            Self::Rgb(rgb) => rgb_to_decimal(rgb),
        }
    }
}
