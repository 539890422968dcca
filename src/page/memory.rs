//! A page that lives entirely in memory.
//!
//! `MemoryPage` behaves like a browser tab as far as the attribution routine
//! can tell: it has a location that can be navigated, a referrer, a clock and
//! a cookie store that enforces `Domain`/`Path`/`Secure`/expiry. Tests drive
//! it directly; server-side hosts can use it to replay visits.

use crate::base::error::AttributionError;
use crate::cookies::jar::CookieJar;
use crate::page::PageContext;
use cookie::Cookie;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use time::{Duration, OffsetDateTime};
use url::Url;

pub struct MemoryPage {
    location: Mutex<Url>,
    referrer: Mutex<String>,
    clock: Mutex<OffsetDateTime>,
    jar: CookieJar,
    writes: Mutex<Vec<String>>,
}

impl MemoryPage {
    /// Open a page at `href` with no referrer and the clock set to now.
    pub fn new(href: &str) -> Result<Self, AttributionError> {
        let location = Url::parse(href).map_err(|e| AttributionError::location(e.to_string()))?;

        Ok(Self {
            location: Mutex::new(location),
            referrer: Mutex::new(String::new()),
            clock: Mutex::new(OffsetDateTime::now_utc()),
            jar: CookieJar::new(),
            writes: Mutex::new(Vec::new()),
        })
    }

    pub fn with_referrer(self, referrer: impl Into<String>) -> Self {
        *self.referrer.lock().unwrap_or_else(PoisonError::into_inner) = referrer.into();
        self
    }

    pub fn with_now(self, now: OffsetDateTime) -> Self {
        *self.clock.lock().unwrap_or_else(PoisonError::into_inner) = now;
        self
    }

    /// Equivalent of `window.location.href = href`; relative references
    /// resolve against the current location. The cookie store is kept.
    pub fn navigate(&self, href: &str) -> Result<(), AttributionError> {
        let mut location = self.location.lock().unwrap_or_else(PoisonError::into_inner);
        let next = location
            .join(href)
            .map_err(|e| AttributionError::location(e.to_string()))?;
        tracing::debug!(from = %location, to = %next, "page navigated");
        *location = next;
        Ok(())
    }

    pub fn set_referrer(&self, referrer: impl Into<String>) {
        *self.referrer.lock().unwrap_or_else(PoisonError::into_inner) = referrer.into();
    }

    /// Move the page clock forward.
    pub fn advance(&self, by: Duration) {
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        *clock += by;
    }

    pub fn location(&self) -> Url {
        self.location
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn jar(&self) -> &CookieJar {
        &self.jar
    }

    /// Visible cookies, decoded, keyed by name. When a name appears more
    /// than once the first (most specific) one wins.
    pub fn cookie_map(&self) -> BTreeMap<String, String> {
        let header = self.jar.cookie_header_for_url(&self.location(), self.now());
        let mut map = BTreeMap::new();
        for parsed in Cookie::split_parse_encoded(header).flatten() {
            map.entry(parsed.name().to_string())
                .or_insert_with(|| parsed.value().to_string());
        }
        map
    }

    /// Every serialized cookie line written so far, oldest first.
    pub fn writes(&self) -> Vec<String> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent line written for `name`.
    pub fn last_write(&self, name: &str) -> Option<String> {
        let prefix = format!("{name}=");
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|line| line.starts_with(&prefix))
            .cloned()
    }
}

impl PageContext for MemoryPage {
    fn query_string(&self) -> Result<String, AttributionError> {
        Ok(self
            .location
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .query()
            .map(|q| format!("?{q}"))
            .unwrap_or_default())
    }

    fn referrer(&self) -> Result<String, AttributionError> {
        Ok(self
            .referrer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn cookie_header(&self) -> Result<String, AttributionError> {
        Ok(self.jar.cookie_header_for_url(&self.location(), self.now()))
    }

    fn write_cookie(&self, cookie: &Cookie<'static>) -> Result<(), AttributionError> {
        let line = cookie.encoded().to_string();
        if !self.jar.set_cookie_line(&self.location(), &line, self.now()) {
            // Browsers drop rejected cookies without telling the page
            tracing::debug!(line = %line, "cookie ignored by page");
        }
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
        Ok(())
    }

    fn now(&self) -> OffsetDateTime {
        *self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string_includes_question_mark() {
        let page = MemoryPage::new("https://www.lukebussey.com/path/?a=1&b=2").unwrap();
        assert_eq!(page.query_string().unwrap(), "?a=1&b=2");

        let bare = MemoryPage::new("https://www.lukebussey.com/").unwrap();
        assert_eq!(bare.query_string().unwrap(), "");
    }

    #[test]
    fn test_navigate_relative() {
        let page = MemoryPage::new("https://www.lukebussey.com/").unwrap();
        page.navigate("/path/?utm_source=google").unwrap();
        assert_eq!(
            page.location().as_str(),
            "https://www.lukebussey.com/path/?utm_source=google"
        );
    }

    #[test]
    fn test_write_cookie_round_trips_encoded_value() {
        let page = MemoryPage::new("https://www.lukebussey.com/").unwrap();
        let cookie = Cookie::build(("referrer", "https://www.google.com/?q=a b"))
            .path("/")
            .build();
        page.write_cookie(&cookie).unwrap();

        assert_eq!(
            page.cookie_map().get("referrer").map(String::as_str),
            Some("https://www.google.com/?q=a b")
        );
        assert!(page.cookie_header().unwrap().contains("%20"));
    }

    #[test]
    fn test_clock_drives_expiry() {
        let page = MemoryPage::new("https://www.lukebussey.com/").unwrap();
        let cookie = Cookie::build(("utm_source", "google"))
            .path("/")
            .expires(page.now() + Duration::minutes(30))
            .build();
        page.write_cookie(&cookie).unwrap();
        assert!(page.cookie_map().contains_key("utm_source"));

        page.advance(Duration::minutes(31));
        assert!(!page.cookie_map().contains_key("utm_source"));
    }
}
