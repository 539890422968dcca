//! Ergonomic error context helpers.
//!
//! Provides extension traits for adding context to `Result` types coming out
//! of the host environment, converting them into context-rich
//! `AttributionError` variants.

use crate::base::error::AttributionError;
use std::fmt::Debug;

/// Extension trait for adding page context to foreign Results.
///
/// Browser bindings report failures as opaque values (`JsValue`), so only
/// their `Debug` rendering is kept.
pub trait PageResultExt<T> {
    /// Add location context to an error.
    fn location_context(self) -> Result<T, AttributionError>;

    /// Add cookie-read context to an error.
    fn cookie_read_context(self) -> Result<T, AttributionError>;

    /// Add cookie-write context to an error.
    ///
    /// # Example
    /// ```ignore
    /// use attrify::base::context::PageResultExt;
    ///
    /// html_document.set_cookie(&line).cookie_write_context("utm_source")?;
    /// // Error: "Failed to write cookie 'utm_source': JsValue(SecurityError ...)"
    /// ```
    fn cookie_write_context(self, name: &str) -> Result<T, AttributionError>;
}

impl<T, E: Debug> PageResultExt<T> for Result<T, E> {
    fn location_context(self) -> Result<T, AttributionError> {
        self.map_err(|e| AttributionError::location(format!("{e:?}")))
    }

    fn cookie_read_context(self) -> Result<T, AttributionError> {
        self.map_err(|e| AttributionError::cookie_read(format!("{e:?}")))
    }

    fn cookie_write_context(self, name: &str) -> Result<T, AttributionError> {
        self.map_err(|e| AttributionError::cookie_write(name, format!("{e:?}")))
    }
}
