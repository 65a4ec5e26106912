//! Assertion helpers for provider results and diagnostics.

use tfd_core::{Diagnostics, ProviderError, ProviderResult, Severity};

// ─────────────────────────────────────────────────────────────────────────────
// Result Assertions
// ─────────────────────────────────────────────────────────────────────────────

/// Assert that a result is successful and return the value.
///
/// # Panics
///
/// Panics if the result is an error.
#[track_caller]
pub fn assert_ok<T: std::fmt::Debug>(result: ProviderResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => panic!("Expected Ok but got: {} - {}", e.summary(), e.detail()),
    }
}

/// Assert that a result failed with the given diagnostic summary and return the error.
///
/// # Panics
///
/// Panics if the result is Ok or the summary differs.
#[track_caller]
pub fn assert_err<T: std::fmt::Debug>(result: ProviderResult<T>, summary: &str) -> ProviderError {
    match result {
        Ok(value) => panic!("Expected error '{summary}' but got Ok({value:?})"),
        Err(e) => {
            assert_eq!(e.summary(), summary, "unexpected error: {}", e.detail());
            e
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Diagnostic Assertions
// ─────────────────────────────────────────────────────────────────────────────

/// Assert that a warning with the given summary was recorded.
///
/// # Panics
///
/// Panics if no such warning exists.
#[track_caller]
pub fn assert_warning(diags: &Diagnostics, summary: &str) {
    assert!(
        diags.warnings().any(|d| d.summary == summary),
        "Expected warning '{summary}' but got: {:?}",
        diags.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that no warnings or errors were recorded.
///
/// # Panics
///
/// Panics if any diagnostic exists.
#[track_caller]
pub fn assert_no_diagnostics(diags: &Diagnostics) {
    assert!(
        diags.is_empty(),
        "Expected no diagnostics but got: {:?}",
        diags
            .iter()
            .map(|d| (matches!(d.severity, Severity::Error), &d.summary))
            .collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assert_err_returns_the_error() {
        let result: ProviderResult<()> = Err(ProviderError::invalid("Invalid Color", "bad"));
        let err = assert_err(result, "Invalid Color");
        assert_eq!(err.detail(), "bad");
    }

    #[test]
    fn warning_lookup_by_summary() {
        let mut diags = Diagnostics::new();
        diags.add_warning("Invite Not Found", "gone");
        assert_warning(&diags, "Invite Not Found");
    }

    #[test]
    #[should_panic(expected = "Expected no diagnostics")]
    fn no_diagnostics_panics_on_warning() {
        let mut diags = Diagnostics::new();
        diags.add_warning("Channel Type Change", "x");
        assert_no_diagnostics(&diags);
    }
}
