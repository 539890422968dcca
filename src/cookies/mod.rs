//! Cookie storage with browser semantics.
//!
//! The attribution routine only ever talks to a page through
//! [`PageContext`](crate::page::PageContext). Outside a real browser something
//! still has to behave like `document.cookie`: honour `Domain`, `Path`,
//! `Secure` and expiry, and delete cookies whose expiry is in the past. That
//! is this module.
//!
//! | Chromium (C++) | attrify (Rust) | Responsibility |
//! |----------------|----------------|----------------|
//! | `net::CookieMonster` | [`CookieJar`](jar::CookieJar) | Cookie store with LRU eviction |
//! | `net::CanonicalCookie` | [`CanonicalCookie`](canonical_cookie::CanonicalCookie) | Single cookie representation |
//! | `net::registry_controlled_domains` | [`psl`] | Public suffix checks |
//!
//! ```rust
//! use attrify::cookies::jar::CookieJar;
//! use time::OffsetDateTime;
//! use url::Url;
//!
//! let jar = CookieJar::new();
//! let url = Url::parse("https://www.example.com/landing/").unwrap();
//! let now = OffsetDateTime::now_utc();
//!
//! jar.set_cookie_line(&url, "utm_source=google; Path=/", now);
//! assert_eq!(jar.cookie_header_for_url(&url, now), "utm_source=google");
//! ```

pub mod canonical_cookie;
pub mod jar;
pub mod psl;

pub use canonical_cookie::CanonicalCookie;
pub use jar::CookieJar;
