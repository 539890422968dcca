//! Public Suffix List (PSL) checks for the `Domain` cookie attribute.
//!
//! A page on `www.example.co.uk` may scope a cookie to `example.co.uk` but
//! never to `co.uk`. Uses Mozilla's Public Suffix List via the `psl` crate.

use psl::{List, Psl};

/// True if `domain` is itself a public suffix (e.g. "com", "co.uk", "github.io").
pub fn is_public_suffix(domain: &str) -> bool {
    let domain_lower = domain.to_lowercase();
    let domain_bytes = domain_lower.as_bytes();

    match List.suffix(domain_bytes) {
        Some(suffix) => suffix.as_bytes() == domain_bytes,
        None => false,
    }
}

/// Check if a page on `url_host` may set a cookie with `Domain=cookie_domain`.
/// The cookie domain must be the host or one of its parents, and must not be
/// a public suffix.
pub fn is_valid_cookie_domain(cookie_domain: &str, url_host: &str) -> bool {
    let cookie_domain = cookie_domain
        .strip_prefix('.')
        .unwrap_or(cookie_domain)
        .to_lowercase();
    let url_host = url_host.to_lowercase();

    if cookie_domain.is_empty() || is_public_suffix(&cookie_domain) {
        return false;
    }

    url_host == cookie_domain || url_host.ends_with(&format!(".{cookie_domain}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_public_suffix() {
        assert!(is_public_suffix("com"));
        assert!(is_public_suffix("CO.UK"));
        assert!(is_public_suffix("github.io"));
        assert!(!is_public_suffix("lukebussey.com"));
    }

    #[test]
    fn test_parent_domain_allowed() {
        assert!(is_valid_cookie_domain(".lukebussey.com", "www.lukebussey.com"));
        assert!(is_valid_cookie_domain("lukebussey.com", "lukebussey.com"));
    }

    #[test]
    fn test_foreign_domain_rejected() {
        assert!(!is_valid_cookie_domain(".notlukebussey.com", "www.lukebussey.com"));
        assert!(!is_valid_cookie_domain("bussey.com", "www.lukebussey.com"));
    }

    #[test]
    fn test_public_suffix_rejected() {
        assert!(!is_valid_cookie_domain(".com", "www.lukebussey.com"));
        assert!(!is_valid_cookie_domain("co.uk", "example.co.uk"));
        assert!(!is_valid_cookie_domain(".", "example.com"));
    }
}
