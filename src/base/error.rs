use thiserror::Error;

/// Errors surfaced while talking to the host page.
///
/// Malformed options never produce one of these; they are logged and replaced
/// by defaults. Only a missing or failing page environment is an error.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum AttributionError {
    // Page environment
    #[error("No global window object")]
    NoWindow,
    #[error("Window has no document")]
    NoDocument,
    #[error("Document does not expose a cookie store")]
    NoCookieStore,

    // Page reads
    #[error("Failed to read page location: {reason}")]
    Location { reason: String },
    #[error("Failed to read document referrer: {reason}")]
    Referrer { reason: String },
    #[error("Failed to read cookies: {reason}")]
    CookieRead { reason: String },

    // Page writes
    #[error("Failed to write cookie '{name}': {reason}")]
    CookieWrite { name: String, reason: String },

    // Entry point
    #[error("Options could not be read as JSON: {reason}")]
    InvalidOptions { reason: String },
}

impl AttributionError {
    pub fn location(reason: impl Into<String>) -> Self {
        AttributionError::Location {
            reason: reason.into(),
        }
    }

    pub fn referrer(reason: impl Into<String>) -> Self {
        AttributionError::Referrer {
            reason: reason.into(),
        }
    }

    pub fn cookie_read(reason: impl Into<String>) -> Self {
        AttributionError::CookieRead {
            reason: reason.into(),
        }
    }

    pub fn cookie_write(name: impl Into<String>, reason: impl Into<String>) -> Self {
        AttributionError::CookieWrite {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_options(reason: impl Into<String>) -> Self {
        AttributionError::InvalidOptions {
            reason: reason.into(),
        }
    }

    /// True when the page itself is missing, as opposed to a single read or
    /// write failing.
    pub fn is_environment_missing(&self) -> bool {
        matches!(
            self,
            AttributionError::NoWindow
                | AttributionError::NoDocument
                | AttributionError::NoCookieStore
        )
    }
}

impl From<serde_json::Error> for AttributionError {
    fn from(err: serde_json::Error) -> Self {
        AttributionError::invalid_options(err.to_string())
    }
}

