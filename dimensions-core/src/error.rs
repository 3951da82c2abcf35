//! Error and diagnostic types for dimension observation.

use thiserror::Error;

/// Result type for fallible dimension operations.
pub type DimensionsResult<T> = Result<T, DimensionsError>;

/// Message reported when no resize observer can be created.
pub const OBSERVER_UNAVAILABLE: &str = "dimensions: the environment doesn't support ResizeObserver, \
     supply a polyfill through Options::polyfill (or the `polyfill` constructor argument in the browser)";

/// Message reported when border-box measurement was requested but the entry lacks it.
pub const BORDER_BOX_UNSUPPORTED: &str = "dimensions: the environment doesn't support borderBoxSize, \
     falling back to contentBoxSize (or contentRect)";

/// Errors and diagnostics produced while observing an element.
///
/// The two observation diagnostics are reported through `tracing` and the
/// optional diagnostic sink, never returned to callers of `observe`.
#[derive(Debug, Error)]
pub enum DimensionsError {
    /// Neither a native resize observer nor a polyfill is available.
    #[error("{}", OBSERVER_UNAVAILABLE)]
    CapabilityUnavailable,

    /// Border-box size requested but missing from the notification record.
    #[error("{}", BORDER_BOX_UNSUPPORTED)]
    BorderBoxUnsupported,

    /// Configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl DimensionsError {
    /// Whether this error is a non-fatal observation diagnostic.
    #[must_use]
    pub const fn is_diagnostic(&self) -> bool {
        matches!(self, Self::CapabilityUnavailable | Self::BorderBoxUnsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_display_fixed_messages() {
        assert_eq!(
            DimensionsError::CapabilityUnavailable.to_string(),
            OBSERVER_UNAVAILABLE
        );
        assert_eq!(
            DimensionsError::BorderBoxUnsupported.to_string(),
            BORDER_BOX_UNSUPPORTED
        );
    }

    #[test]
    fn config_errors_are_not_diagnostics() {
        let err = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        let err = DimensionsError::from(err);
        assert!(!err.is_diagnostic());
        assert!(err.to_string().starts_with("Configuration error"));
        assert!(DimensionsError::BorderBoxUnsupported.is_diagnostic());
    }
}
