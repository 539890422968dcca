//! The real page: `window.location`, `document.referrer`, `document.cookie`.

use crate::base::context::PageResultExt;
use crate::base::error::AttributionError;
use crate::page::PageContext;
use cookie::Cookie;
use time::OffsetDateTime;
use wasm_bindgen::JsCast;
use web_sys::{window, HtmlDocument, Window};

pub struct BrowserPage {
    window: Window,
    document: HtmlDocument,
}

impl BrowserPage {
    /// Bind to the global `window`. Fails outside a document context
    /// (workers, Node without a DOM).
    pub fn current() -> Result<Self, AttributionError> {
        let window = window().ok_or(AttributionError::NoWindow)?;
        let document = window
            .document()
            .ok_or(AttributionError::NoDocument)?
            .dyn_into::<HtmlDocument>()
            .map_err(|_| AttributionError::NoCookieStore)?;

        Ok(Self { window, document })
    }
}

impl PageContext for BrowserPage {
    fn query_string(&self) -> Result<String, AttributionError> {
        self.window.location().search().location_context()
    }

    fn referrer(&self) -> Result<String, AttributionError> {
        Ok(self.document.referrer())
    }

    fn cookie_header(&self) -> Result<String, AttributionError> {
        self.document.cookie().cookie_read_context()
    }

    fn write_cookie(&self, cookie: &Cookie<'static>) -> Result<(), AttributionError> {
        let line = cookie.encoded().to_string();
        self.document
            .set_cookie(&line)
            .cookie_write_context(cookie.name())
    }

    // std's clock is unavailable on wasm32-unknown-unknown
    fn now(&self) -> OffsetDateTime {
        let millis = js_sys::Date::now() as i128;
        OffsetDateTime::from_unix_timestamp_nanos(millis * 1_000_000)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }
}
