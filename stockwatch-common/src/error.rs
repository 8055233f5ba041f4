//! Error types shared across Stockwatch crates.

use thiserror::Error;

/// Result type alias using the Stockwatch error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for configuration and local storage.
///
/// Network failures are not represented here; fetchers return their own
/// typed `FetchError` so callers can log and continue.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persistent storage error (key-value backend)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid input (e.g. a blank ticker symbol)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an error with additional context.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if this is an invalid-input error, looking through context wrappers.
    pub fn is_invalid_input(&self) -> bool {
        match self {
            Self::InvalidInput(_) => true,
            Self::WithContext { source, .. } => source.is_invalid_input(),
            _ => false,
        }
    }
}

/// Extension trait for adding context to any error type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_with_context() {
        let err = Error::Storage("disk full".into());
        let with_ctx = err.with_context("saving watchlist");
        assert!(matches!(
            &with_ctx,
            Error::WithContext { source, .. } if matches!(**source, Error::Storage(_))
        ));
        assert_eq!(
            with_ctx.to_string(),
            "saving watchlist: Storage error: disk full"
        );
    }

    #[test]
    fn test_result_ext_context() {
        let res: std::result::Result<(), serde_json::Error> =
            serde_json::from_str::<()>("{").map(|_| ());
        let err = res.context("decoding symbols").unwrap_err();
        assert!(err.to_string().starts_with("decoding symbols: JSON error"));
        assert!(!err.is_invalid_input());
    }

    #[test]
    fn test_invalid_input_predicate() {
        assert!(Error::InvalidInput("blank".into()).is_invalid_input());
        assert!(!Error::NotFound("x".into()).is_invalid_input());
        assert!(Error::InvalidInput("blank".into())
            .with_context("parsing symbol")
            .is_invalid_input());
    }
}
