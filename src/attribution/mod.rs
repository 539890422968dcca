//! Campaign attribution capture.
//!
//! One call per page view does the whole job:
//!
//! 1. [`options`]: merge caller options over the defaults
//! 2. [`capture`]: slide the expiration of existing last-touch cookies
//! 3. [`query`]: decode the current query string
//! 4. [`capture`]: write initial-touch cookies once, replace last-touch
//!    params when a new campaign arrives, and set static data values
//!
//! Cookie names are `{prefix}{initialPrefix}{key}` for first touch and
//! `{prefix}{lastPrefix}{key}` for last touch.

pub mod capture;
pub mod merge;
pub mod options;
pub mod query;

#[cfg(target_arch = "wasm32")]
mod wasm;

pub use capture::{capture, read_cookie, CaptureReport, INITIAL_EXPIRY};
pub use options::{CookieScope, Options, Settings, DEFAULT_PARAMS};
pub use query::{parse_query, QueryParams};
