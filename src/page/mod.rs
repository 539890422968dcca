//! The host page, as seen by the attribution routine.
//!
//! Everything the routine needs from its environment goes through
//! [`PageContext`]: the query string, the referrer, the raw cookie string and
//! a way to write one cookie. Swapping the implementation is how the routine
//! runs outside a browser.
//!
//! - [`memory::MemoryPage`]: in-process page backed by a [`CookieJar`](crate::cookies::CookieJar)
//! - `browser::BrowserPage`: the real `window`/`document` (wasm32 only)

#[cfg(target_arch = "wasm32")]
pub mod browser;
pub mod memory;

use crate::base::error::AttributionError;
use cookie::Cookie;
use time::OffsetDateTime;

/// Capability the routine needs from the page it runs in.
pub trait PageContext {
    /// `location.search`, with or without its leading `?`.
    fn query_string(&self) -> Result<String, AttributionError>;

    /// `document.referrer`; empty when the visit had no referrer.
    fn referrer(&self) -> Result<String, AttributionError>;

    /// The raw `document.cookie` string (`a=1; b=2`).
    fn cookie_header(&self) -> Result<String, AttributionError>;

    /// Equivalent of `document.cookie = cookie`. Implementations serialize
    /// with [`Cookie::encoded`] so names and values are percent-encoded.
    fn write_cookie(&self, cookie: &Cookie<'static>) -> Result<(), AttributionError>;

    /// Wall clock used for expiration arithmetic.
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
