//! Base types and error handling.
//!
//! - [`AttributionError`](error::AttributionError): failures reported by the host page
//! - [`PageResultExt`](context::PageResultExt): attach page context to foreign errors

pub mod context;
pub mod error;
