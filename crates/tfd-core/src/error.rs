//! Provider error types.

use thiserror::Error;

use crate::diagnostics::Diagnostic;

/// Errors surfaced by resource and data source operations.
///
/// Every variant carries enough text to be shown to a Terraform user as a
/// diagnostic without further context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    // ─────────────────────────────────────────────────────────────────────────
    // Request errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("{summary}: {detail}")]
    InvalidRequest { summary: String, detail: String },

    #[error("{service} client not configured")]
    NotConfigured { service: &'static str },

    #[error("Unknown {kind} type: {name}")]
    UnknownType { kind: &'static str, name: String },

    #[error("Import not supported for {type_name}")]
    ImportNotSupported { type_name: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Remote errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("{summary}: {detail}")]
    NotFound { summary: String, detail: String },

    #[error("{summary}: {detail}")]
    External {
        summary: String,
        detail: String,
        status_code: Option<u16>,
        retryable: bool,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Internal errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ProviderError {
    /// Shorthand for an [`InvalidRequest`](Self::InvalidRequest).
    pub fn invalid(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvalidRequest {
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    /// Shorthand for a [`NotFound`](Self::NotFound).
    pub fn not_found(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::NotFound {
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    /// Append a paragraph of guidance to the detail text.
    #[must_use]
    pub fn with_note(mut self, note: impl AsRef<str>) -> Self {
        match &mut self {
            Self::InvalidRequest { detail, .. }
            | Self::NotFound { detail, .. }
            | Self::External { detail, .. } => {
                detail.push_str("\n\n");
                detail.push_str(note.as_ref());
            }
            Self::Internal { message } => {
                message.push_str("\n\n");
                message.push_str(note.as_ref());
            }
            Self::NotConfigured { .. } | Self::UnknownType { .. } | Self::ImportNotSupported { .. } => {}
        }
        self
    }

    /// Returns true if the error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::External { retryable, .. } => *retryable,
            _ => false,
        }
    }

    /// One-line summary for the diagnostic header.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::InvalidRequest { summary, .. }
            | Self::NotFound { summary, .. }
            | Self::External { summary, .. } => summary.clone(),
            Self::NotConfigured { service } => format!("{service} Client Not Configured"),
            Self::UnknownType { kind, .. } => format!("Unknown {} Type", title_case(kind)),
            Self::ImportNotSupported { .. } => "Import Not Supported".into(),
            Self::Internal { .. } => "Internal Provider Error".into(),
        }
    }

    /// Longer explanation for the diagnostic body.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::InvalidRequest { detail, .. }
            | Self::NotFound { detail, .. }
            | Self::External { detail, .. } => detail.clone(),
            Self::NotConfigured { service } => format!(
                "Expected configured {service} client. Please report this issue to the provider \
                 developers."
            ),
            Self::UnknownType { kind, name } => {
                format!("The provider does not implement a {kind} named {name:?}.")
            }
            Self::ImportNotSupported { type_name } => {
                format!("{type_name} cannot be imported.")
            }
            Self::Internal { message } => message.clone(),
        }
    }

    /// Convert to an error diagnostic.
    #[must_use]
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.summary(), self.detail())
    }
}

fn title_case(words: &str) -> String {
    words
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Result type alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;

    #[test]
    fn invalid_request_display_joins_summary_and_detail() {
        let err = ProviderError::invalid("Invalid Role Name", "Role name cannot be '@everyone'");
        assert_eq!(
            err.to_string(),
            "Invalid Role Name: Role name cannot be '@everyone'"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn notes_are_appended_as_paragraphs() {
        let err = ProviderError::invalid("Error Creating Channel", "HTTP 400")
            .with_note("Directory channels are only available in Community servers.");
        assert_eq!(
            err.detail(),
            "HTTP 400\n\nDirectory channels are only available in Community servers."
        );
    }

    #[test]
    fn not_configured_maps_to_error_diagnostic() {
        let diag = ProviderError::NotConfigured { service: "Example" }.to_diagnostic();
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.summary, "Example Client Not Configured");
        assert!(diag.detail.contains("configured Example client"));
    }

    #[test]
    fn unknown_type_summary_is_title_cased() {
        let err = ProviderError::UnknownType {
            kind: "data source",
            name: "example_widget".into(),
        };
        assert_eq!(err.summary(), "Unknown Data Source Type");
        assert_eq!(
            err.detail(),
            "The provider does not implement a data source named \"example_widget\"."
        );
    }

    #[test]
    fn external_retryable_flag_is_preserved() {
        let err = ProviderError::External {
            summary: "Error Reading Channel".into(),
            detail: "HTTP 502".into(),
            status_code: Some(502),
            retryable: true,
        };
        assert!(err.is_retryable());
        assert_eq!(err.summary(), "Error Reading Channel");
    }
}
