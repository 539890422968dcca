use crate::cookies::canonical_cookie::{CanonicalCookie, SameSite};
use cookie::Cookie;
use dashmap::DashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use url::{Host, Url};

/// Maximum cookies per domain (Chromium default).
const MAX_COOKIES_PER_DOMAIN: usize = 50;

/// Maximum total cookies.
/// Chromium uses 3300, but we use a slightly lower limit to keep memory usage predictable.
const MAX_COOKIES_TOTAL: usize = 3000;

/// In-memory cookie store with browser semantics.
/// Modeled after Chromium's `net::CookieMonster`.
///
/// Every time-sensitive call takes `now` explicitly so a page with a fake
/// clock sees a consistent view of expiry.
#[derive(Clone)]
pub struct CookieJar {
    // Store: Map<Domain, List<Cookie>>
    store: Arc<DashMap<String, Vec<CanonicalCookie>>>,
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieJar {
    pub fn new() -> Self {
        Self {
            store: Arc::new(DashMap::new()),
        }
    }

    /// Insert or replace a cookie. A cookie that is already expired at `now`
    /// only removes its existing counterpart, which is how pages delete cookies.
    pub fn set_canonical_cookie(&self, cookie: CanonicalCookie, now: OffsetDateTime) {
        let mut entry = self.store.entry(cookie.domain.clone()).or_default();

        // Remove existing if name/domain/path match
        entry.retain(|c| c.name != cookie.name || c.path != cookie.path);

        if cookie.is_expired(now) {
            tracing::debug!(name = %cookie.name, domain = %cookie.domain, "cookie deleted");
            return;
        }

        // Enforce per-domain limit with LRU eviction
        while entry.len() >= MAX_COOKIES_PER_DOMAIN {
            if let Some(oldest_idx) = entry
                .iter()
                .enumerate()
                .min_by_key(|(_, c)| c.last_access_time)
                .map(|(i, _)| i)
            {
                entry.remove(oldest_idx);
            } else {
                break;
            }
        }

        entry.push(cookie);
        drop(entry); // Release lock before checking global count

        self.enforce_global_limit();
    }

    /// Enforce the global cookie limit by evicting oldest cookies.
    fn enforce_global_limit(&self) {
        while self.total_cookie_count() > MAX_COOKIES_TOTAL {
            let mut oldest: Option<(String, usize, OffsetDateTime)> = None;

            for entry in self.store.iter() {
                let domain = entry.key().clone();
                for (idx, cookie) in entry.value().iter().enumerate() {
                    let dominated = oldest
                        .as_ref()
                        .is_some_and(|(_, _, oldest_time)| cookie.last_access_time < *oldest_time);
                    if oldest.is_none() || dominated {
                        oldest = Some((domain.clone(), idx, cookie.last_access_time));
                    }
                }
            }

            if let Some((domain, idx, _)) = oldest {
                if let Some(mut entry) = self.store.get_mut(&domain) {
                    if idx < entry.len() {
                        entry.remove(idx);
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Get cookies visible to `url` at `now`, ordered the way browsers
    /// serialize them: longest path first, then oldest first.
    pub fn cookies_for_url(&self, url: &Url, now: OffsetDateTime) -> Vec<CanonicalCookie> {
        let mut result = Vec::new();
        let host = url.host_str().unwrap_or("");

        for domain in Self::get_matching_domains(host) {
            if let Some(entry) = self.store.get(&domain) {
                for cookie in entry.iter() {
                    if !Self::domain_matches(&cookie.domain, host, cookie.host_only) {
                        continue;
                    }

                    if !Self::path_matches(&cookie.path, url.path()) {
                        continue;
                    }

                    if cookie.secure && url.scheme() != "https" {
                        continue;
                    }

                    if cookie.is_expired(now) {
                        continue;
                    }

                    result.push(cookie.clone());
                }
            }
        }

        result.sort_by(|a, b| {
            b.path
                .len()
                .cmp(&a.path.len())
                .then_with(|| a.creation_time.cmp(&b.creation_time))
        });

        result
    }

    /// Render the cookies visible to `url` as `document.cookie` would.
    pub fn cookie_header_for_url(&self, url: &Url, now: OffsetDateTime) -> String {
        self.cookies_for_url(url, now)
            .iter()
            .map(CanonicalCookie::pair)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Check if cookie domain matches request host.
    /// Implements RFC 6265 domain matching.
    fn domain_matches(cookie_domain: &str, request_host: &str, host_only: bool) -> bool {
        if host_only {
            return cookie_domain.eq_ignore_ascii_case(request_host);
        }

        let cookie_domain = cookie_domain.trim_start_matches('.');

        if request_host.eq_ignore_ascii_case(cookie_domain) {
            return true;
        }

        if request_host.len() > cookie_domain.len() {
            let split = request_host.len() - cookie_domain.len();
            let suffix = &request_host[split..];
            if suffix.eq_ignore_ascii_case(cookie_domain) {
                return request_host.as_bytes()[split - 1] == b'.';
            }
        }

        false
    }

    /// Check if request path matches cookie path.
    /// Implements RFC 6265 path matching.
    fn path_matches(cookie_path: &str, request_path: &str) -> bool {
        if request_path == cookie_path {
            return true;
        }

        if request_path.starts_with(cookie_path) {
            if cookie_path.ends_with('/') {
                return true;
            }
            return request_path.as_bytes().get(cookie_path.len()) == Some(&b'/');
        }

        false
    }

    /// RFC 6265 section 5.1.4 default-path: the directory of the request path.
    fn default_path(request_path: &str) -> String {
        if !request_path.starts_with('/') {
            return "/".to_string();
        }
        match request_path.rfind('/') {
            Some(0) | None => "/".to_string(),
            Some(idx) => request_path[..idx].to_string(),
        }
    }

    /// Get all domains to check for a given host.
    /// Returns the host itself and all parent domains.
    fn get_matching_domains(host: &str) -> Vec<String> {
        let mut domains = vec![host.to_lowercase()];

        // For "foo.bar.example.com", add "bar.example.com", "example.com"
        let parts: Vec<&str> = host.split('.').collect();
        for i in 1..parts.len().saturating_sub(1) {
            domains.push(parts[i..].join(".").to_lowercase());
        }

        domains
    }

    /// `https`, or a loopback host, which browsers treat as potentially trustworthy.
    fn is_secure_origin(url: &Url) -> bool {
        if url.scheme() == "https" {
            return true;
        }
        match url.host() {
            Some(Host::Domain(d)) => d == "localhost" || d.ends_with(".localhost"),
            Some(Host::Ipv4(ip)) => ip.is_loopback(),
            Some(Host::Ipv6(ip)) => ip.is_loopback(),
            None => false,
        }
    }

    /// Parse a `document.cookie = ...` style line set from `url` and store it.
    ///
    /// Returns `false` when the browser would silently ignore the line:
    /// unparsable, a `Domain` the page may not set, `Secure` from an insecure
    /// origin, `SameSite=None` without `Secure`, or an invalid name prefix.
    pub fn set_cookie_line(&self, url: &Url, cookie_line: &str, now: OffsetDateTime) -> bool {
        let parsed = match Cookie::parse(cookie_line) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(error = %e, line = %cookie_line, "failed to parse cookie");
                return false;
            }
        };

        let host = url.host_str().unwrap_or("").to_lowercase();

        let (domain, host_only) = match parsed.domain() {
            // Chromium strips the leading dot; a domain equal to the host is host-only.
            Some(d) if d.trim_start_matches('.').eq_ignore_ascii_case(&host) => (host.clone(), true),
            Some(d) => {
                let d = d.trim_start_matches('.').to_lowercase();

                // Rejects public suffixes (".com") and foreign domains
                if !crate::cookies::psl::is_valid_cookie_domain(&d, &host) {
                    tracing::debug!(domain = %d, host = %host, "cookie domain rejected");
                    return false;
                }

                (d, false)
            }
            None => (host.clone(), true),
        };

        let path = match parsed.path() {
            Some(p) if p.starts_with('/') => p.to_string(),
            _ => Self::default_path(url.path()),
        };

        // Max-Age wins over Expires
        let expiration_time = match parsed.max_age() {
            Some(max_age) => now.checked_add(max_age),
            None => parsed.expires().and_then(|e| e.datetime()),
        };

        let c = CanonicalCookie {
            name: parsed.name().to_string(),
            value: parsed.value().to_string(),
            domain,
            path,
            creation_time: now,
            expiration_time,
            last_access_time: now,
            secure: parsed.secure().unwrap_or(false),
            http_only: parsed.http_only().unwrap_or(false),
            host_only,
            same_site: SameSite::from(parsed.same_site()),
        };

        let secure_origin = Self::is_secure_origin(url);

        if c.secure && !secure_origin {
            tracing::debug!(name = %c.name, "secure cookie from insecure origin rejected");
            return false;
        }

        if c.same_site == SameSite::NoRestriction && !c.secure {
            tracing::debug!(name = %c.name, "SameSite=None without Secure rejected");
            return false;
        }

        if !c.has_valid_prefix(secure_origin) {
            tracing::debug!(name = %c.name, "cookie prefix rejected");
            return false;
        }

        self.set_canonical_cookie(c, now);
        true
    }

    /// Get total cookie count, including not-yet-purged expired cookies.
    pub fn total_cookie_count(&self) -> usize {
        self.store.iter().map(|e| e.value().len()).sum()
    }

    /// Clear all cookies.
    pub fn clear(&self) {
        self.store.clear();
    }

    /// Iterate over all stored cookies regardless of visibility.
    pub fn iter_all_cookies(&self) -> impl Iterator<Item = CanonicalCookie> + '_ {
        self.store.iter().flat_map(|entry| entry.value().clone())
    }

    /// Find a stored cookie by name, regardless of URL visibility.
    pub fn find(&self, name: &str) -> Option<CanonicalCookie> {
        self.iter_all_cookies().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn make_test_cookie(name: &str, domain: &str, now: OffsetDateTime) -> CanonicalCookie {
        CanonicalCookie {
            name: name.to_string(),
            value: "test_value".to_string(),
            domain: domain.to_string(),
            path: "/".to_string(),
            creation_time: now,
            expiration_time: Some(now + Duration::days(30)),
            last_access_time: now,
            secure: true,
            http_only: false,
            host_only: false,
            same_site: SameSite::Lax,
        }
    }

    #[test]
    fn test_replace_same_name_and_path() {
        let now = OffsetDateTime::now_utc();
        let jar = CookieJar::new();
        jar.set_canonical_cookie(make_test_cookie("utm_source", "example.com", now), now);

        let mut newer = make_test_cookie("utm_source", "example.com", now);
        newer.value = "google".to_string();
        jar.set_canonical_cookie(newer, now);

        assert_eq!(jar.total_cookie_count(), 1);
        assert_eq!(jar.find("utm_source").unwrap().value, "google");
    }

    #[test]
    fn test_expired_write_deletes() {
        let now = OffsetDateTime::now_utc();
        let jar = CookieJar::new();
        jar.set_canonical_cookie(make_test_cookie("utm_source", "example.com", now), now);

        let mut tombstone = make_test_cookie("utm_source", "example.com", now);
        tombstone.expiration_time = Some(OffsetDateTime::UNIX_EPOCH);
        jar.set_canonical_cookie(tombstone, now);

        assert_eq!(jar.total_cookie_count(), 0);
    }

    #[test]
    fn test_per_domain_limit_evicts_oldest() {
        let start = OffsetDateTime::now_utc();
        let jar = CookieJar::new();
        for i in 0..(MAX_COOKIES_PER_DOMAIN + 5) {
            let now = start + Duration::seconds(i as i64);
            jar.set_canonical_cookie(make_test_cookie(&format!("c{i}"), "example.com", now), now);
        }

        assert_eq!(jar.total_cookie_count(), MAX_COOKIES_PER_DOMAIN);
        assert!(jar.find("c0").is_none());
        assert!(jar.find(&format!("c{}", MAX_COOKIES_PER_DOMAIN + 4)).is_some());
    }

    #[test]
    fn test_domain_matches() {
        assert!(CookieJar::domain_matches("example.com", "www.example.com", false));
        assert!(!CookieJar::domain_matches("example.com", "www.example.com", true));
        assert!(!CookieJar::domain_matches("example.com", "badexample.com", false));
    }

    #[test]
    fn test_default_path() {
        assert_eq!(CookieJar::default_path("/path/"), "/path");
        assert_eq!(CookieJar::default_path("/path/page"), "/path");
        assert_eq!(CookieJar::default_path("/"), "/");
        assert_eq!(CookieJar::default_path(""), "/");
    }

    #[test]
    fn test_max_age_overrides_expires() {
        let now = OffsetDateTime::now_utc();
        let jar = CookieJar::new();
        let url = Url::parse("https://example.com/").unwrap();
        assert!(jar.set_cookie_line(
            &url,
            "a=b; Max-Age=60; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            now
        ));

        let stored = jar.find("a").unwrap();
        assert_eq!(stored.expiration_time, Some(now + Duration::seconds(60)));
    }

    #[test]
    fn test_secure_origin() {
        let origin = |u: &str| CookieJar::is_secure_origin(&Url::parse(u).unwrap());
        assert!(origin("https://example.com/"));
        assert!(origin("http://localhost:8080/"));
        assert!(origin("http://127.0.0.1/"));
        assert!(origin("http://[::1]/"));
        assert!(!origin("http://example.com/"));
    }

    #[test]
    fn test_domain_equal_to_host_is_host_only() {
        let now = OffsetDateTime::now_utc();
        let jar = CookieJar::new();
        let url = Url::parse("http://localhost/").unwrap();
        assert!(jar.set_cookie_line(&url, "a=b; Domain=localhost", now));
        assert!(jar.find("a").unwrap().host_only);
    }
}
