//! Pure conversions between Terraform attribute values and Discord values.
//!
//! Nothing in here performs I/O; every function either returns the
//! converted value or a [`CodecError`] whose message can be shown to the
//! user verbatim.

mod channel_type;
mod color;
pub mod import_id;

use thiserror::Error;
use tfd_core::ProviderError;

pub use channel_type::ChannelType;
pub use color::{ColorInput, ColorInputError, MAX_COLOR, hex_to_decimal, rgb_to_decimal, validate_color};
pub use import_id::{ChannelPermissionKey, OverwriteKind};

/// Conversion failures. None of these are transient.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input does not match the lexical grammar.
    #[error("invalid {what} format: {input} ({expected})")]
    InvalidFormat {
        what: &'static str,
        input: String,
        expected: &'static str,
    },

    /// Hex color is not 3 or 6 digits.
    #[error("invalid hex color length: {input} (must be 3 or 6 characters)")]
    InvalidLength { input: String },

    /// A numeric component is outside its bounds.
    #[error("{component} value must be between {min} and {max}, got: {value}")]
    OutOfRange {
        component: &'static str,
        value: String,
        min: u32,
        max: u32,
    },

    /// A composite import ID does not split into the expected segments.
    #[error("invalid import ID {input:?}: expected format {format} (e.g. {example})")]
    InvalidImportId {
        input: String,
        format: &'static str,
        example: &'static str,
    },

    /// A channel type name outside the creatable set.
    #[error("{}", channel_type::unsupported_message(.name))]
    UnsupportedChannelType { name: String },
}

impl CodecError {
    /// Diagnostic summary for this failure.
    #[must_use]
    pub fn summary(&self) -> &'static str {
        match self {
            Self::InvalidFormat { what: "RGB", .. } => "Invalid RGB Color",
            Self::InvalidFormat { .. } | Self::InvalidLength { .. } => "Invalid Hex Color",
            Self::OutOfRange { .. } => "Invalid Color Value",
            Self::InvalidImportId { .. } => "Invalid Import ID",
            Self::UnsupportedChannelType { .. } => "Invalid Channel Type",
        }
    }
}

impl From<CodecError> for ProviderError {
    fn from(err: CodecError) -> Self {
        Self::invalid(err.summary(), err.to_string())
    }
}
