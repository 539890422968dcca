//! The capture routine: refresh, extract, write.

use crate::attribution::options::{to_cookie_value, Options, Settings};
use crate::attribution::query::{parse_query, QueryParams};
use crate::base::error::AttributionError;
use crate::page::PageContext;
use cookie::Cookie;
use serde_json::Value;
use time::macros::datetime;
use time::OffsetDateTime;

/// Expiry of initial-touch cookies: the last second a signed 32-bit Unix
/// timestamp can represent.
pub const INITIAL_EXPIRY: OffsetDateTime = datetime!(2038-01-19 03:14:07 UTC);

/// Initial value recorded for a tracked param that was absent on first visit.
pub const MISSING_INITIAL_VALUE: &str = "null";

/// What one capture call did to the page's cookies.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureReport {
    pub settings: Settings,
    pub query: QueryParams,
    /// Last-touch cookies whose expiration was pushed forward.
    pub refreshed: Vec<String>,
    /// Initial-touch cookies created.
    pub initial: Vec<String>,
    /// Last-touch cookies created or overwritten.
    pub written: Vec<String>,
    /// Last-touch param cookies cleared because a new campaign arrived.
    pub deleted: Vec<String>,
}

/// Run the attribution routine against `page`.
///
/// `options` is the loose caller object; `None` (or anything that is not a
/// JSON object) means defaults only.
///
/// ```rust
/// use attrify::page::memory::MemoryPage;
/// use serde_json::json;
///
/// let page = MemoryPage::new("https://www.example.com/?utm_source=newsletter")?
///     .with_referrer("https://mail.example.org/");
/// attrify::capture(&page, Some(&json!({ "saveInitial": true })))?;
///
/// let cookies = page.cookie_map();
/// assert_eq!(cookies["utm_source"], "newsletter");
/// assert_eq!(cookies["initial_utm_source"], "newsletter");
/// assert_eq!(cookies["initial_utm_medium"], "null");
/// # Ok::<(), attrify::AttributionError>(())
/// ```
pub fn capture<P>(page: &P, options: Option<&Value>) -> Result<CaptureReport, AttributionError>
where
    P: PageContext + ?Sized,
{
    let referrer = page.referrer()?;
    let settings = Settings::resolve(options, &referrer);
    let expires = settings.timeout.and_then(|timeout| {
        let now = page.now();
        let expires = now.checked_add(timeout);
        if expires.is_none() {
            tracing::warn!(%now, %timeout, "expiration out of range; writing session cookies");
        }
        expires
    });

    let mut writer = CookieWriter {
        page,
        settings: &settings,
        expires,
        refreshed: Vec::new(),
        initial: Vec::new(),
        written: Vec::new(),
        deleted: Vec::new(),
    };

    writer.refresh_expiration()?;

    let query = parse_query(&page.query_string()?);

    writer.capture_initial_params(&query)?;
    writer.capture_last_params(&query)?;
    writer.capture_data()?;

    tracing::debug!(
        refreshed = writer.refreshed.len(),
        initial = writer.initial.len(),
        written = writer.written.len(),
        deleted = writer.deleted.len(),
        "attribution captured"
    );

    let CookieWriter {
        refreshed,
        initial,
        written,
        deleted,
        ..
    } = writer;

    Ok(CaptureReport {
        settings,
        query,
        refreshed,
        initial,
        written,
        deleted,
    })
}

impl Options {
    /// Run the routine with these options.
    pub fn capture<P>(&self, page: &P) -> Result<CaptureReport, AttributionError>
    where
        P: PageContext + ?Sized,
    {
        let raw = serde_json::to_value(self)?;
        capture(page, Some(&raw))
    }
}

/// Find `name` in a `document.cookie` string. The first pair with a
/// non-empty value wins; empty values count as absent.
pub fn read_cookie(header: &str, name: &str) -> Option<String> {
    Cookie::split_parse_encoded(header)
        .flatten()
        .find(|c| c.name() == name && !c.value().is_empty())
        .map(|c| c.value().to_string())
}

struct CookieWriter<'a, P: ?Sized> {
    page: &'a P,
    settings: &'a Settings,
    expires: Option<OffsetDateTime>,
    refreshed: Vec<String>,
    initial: Vec<String>,
    written: Vec<String>,
    deleted: Vec<String>,
}

impl<P: PageContext + ?Sized> CookieWriter<'_, P> {
    fn get(&self, name: &str) -> Result<Option<String>, AttributionError> {
        Ok(read_cookie(&self.page.cookie_header()?, name))
    }

    fn set(
        &self,
        name: &str,
        value: &str,
        expires: Option<OffsetDateTime>,
    ) -> Result<(), AttributionError> {
        let builder = Cookie::build((name.to_string(), value.to_string()));
        let cookie = self.settings.scope.apply(builder, expires).build();
        self.page.write_cookie(&cookie)
    }

    /// Slide existing last-touch cookies forward so a visit without campaign
    /// data still extends the session.
    fn refresh_expiration(&mut self) -> Result<(), AttributionError> {
        let Some(expires) = self.expires else {
            return Ok(());
        };

        let settings = self.settings;
        for key in settings.params.iter().chain(settings.data.keys()) {
            let name = settings.last_name(key);
            if let Some(value) = self.get(&name)? {
                self.set(&name, &value, Some(expires))?;
                tracing::debug!(cookie = %name, %expires, "expiration refreshed");
                self.refreshed.push(name);
            }
        }

        Ok(())
    }

    fn capture_initial_params(&mut self, query: &QueryParams) -> Result<(), AttributionError> {
        if !self.settings.save_initial {
            return Ok(());
        }

        let settings = self.settings;
        for key in &settings.params {
            let value = query.present(key).unwrap_or(MISSING_INITIAL_VALUE);
            self.set_initial_once(key, value)?;
        }

        Ok(())
    }

    /// Any tracked param in the query replaces the whole set of last-touch
    /// params, so old and new campaigns never mix.
    fn capture_last_params(&mut self, query: &QueryParams) -> Result<(), AttributionError> {
        let settings = self.settings;
        let mut removed = false;

        for key in &settings.params {
            let Some(value) = query.present(key) else {
                continue;
            };

            if !removed {
                self.remove_last_params()?;
                removed = true;
            }

            let name = settings.last_name(key);
            self.set(&name, value, self.expires)?;
            tracing::debug!(cookie = %name, value = %value, "last-touch param written");
            self.written.push(name);
        }

        Ok(())
    }

    fn remove_last_params(&mut self) -> Result<(), AttributionError> {
        let settings = self.settings;
        for key in &settings.params {
            let name = settings.last_name(key);
            self.set(&name, "", Some(OffsetDateTime::UNIX_EPOCH))?;
            self.deleted.push(name);
        }
        tracing::debug!(count = self.deleted.len(), "previous campaign cleared");
        Ok(())
    }

    /// Static values are set once per session and survive campaign changes.
    fn capture_data(&mut self) -> Result<(), AttributionError> {
        let settings = self.settings;
        for (key, raw) in &settings.data {
            let Some(value) = to_cookie_value(raw) else {
                tracing::debug!(key = %key, "skipping empty data value");
                continue;
            };

            if settings.save_initial {
                self.set_initial_once(key, &value)?;
            }

            let name = settings.last_name(key);
            if self.get(&name)?.is_none() {
                self.set(&name, &value, self.expires)?;
                tracing::debug!(cookie = %name, value = %value, "data written");
                self.written.push(name);
            }
        }

        Ok(())
    }

    fn set_initial_once(&mut self, key: &str, value: &str) -> Result<(), AttributionError> {
        let name = self.settings.initial_name(key);
        if self.get(&name)?.is_some() {
            return Ok(());
        }

        self.set(&name, value, Some(INITIAL_EXPIRY))?;
        tracing::debug!(cookie = %name, value = %value, "initial-touch written");
        self.initial.push(name);
        Ok(())
    }
}
