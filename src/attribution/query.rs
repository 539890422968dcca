//! Query string extraction.

use indexmap::IndexMap;
use url::form_urlencoded;

/// Decoded `key -> value` pairs from the page's query string, in the order
/// each key first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: IndexMap<String, String>,
}

impl QueryParams {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(String::as_str)
    }

    /// The value for `key` only when it is non-empty; `?utm_source=` carries
    /// no campaign data.
    pub fn present(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Parse `location.search` (leading `?` optional, fragment ignored) as
/// `application/x-www-form-urlencoded`. Repeated keys keep the last value
/// at the position of the first.
pub fn parse_query(search: &str) -> QueryParams {
    let search = search.split('#').next().unwrap_or_default();
    let search = search.strip_prefix('?').unwrap_or(search);

    let mut pairs = IndexMap::new();
    if search.is_empty() {
        return QueryParams { pairs };
    }

    for (key, value) in form_urlencoded::parse(search.as_bytes()) {
        pairs.insert(key.into_owned(), value.into_owned());
    }

    QueryParams { pairs }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert!(parse_query("").is_empty());
        assert!(parse_query("?").is_empty());
        assert!(parse_query("#utm_source=x").is_empty());
    }

    #[test]
    fn test_basic_pairs() {
        let q = parse_query("?foo=bar&utm_campaign=test");
        assert_eq!(q.len(), 2);
        assert_eq!(q.get("foo"), Some("bar"));
        assert_eq!(q.get("utm_campaign"), Some("test"));
        assert_eq!(q.get("utm_source"), None);
    }

    #[test]
    fn test_decodes_keys_and_values() {
        let q = parse_query("utm%5Fterm=running+shoes&utm_content=50%25%20off");
        assert_eq!(q.get("utm_term"), Some("running shoes"));
        assert_eq!(q.get("utm_content"), Some("50% off"));
    }

    #[test]
    fn test_last_duplicate_wins() {
        let q = parse_query("utm_source=a&utm_source=b");
        assert_eq!(q.get("utm_source"), Some("b"));
    }

    #[test]
    fn test_iterates_in_query_order() {
        let q = parse_query("zeta=1&alpha=2&zeta=3");
        let pairs: Vec<_> = q.iter().collect();
        assert_eq!(pairs, [("zeta", "3"), ("alpha", "2")]);
    }

    #[test]
    fn test_fragment_is_ignored() {
        let q = parse_query("?utm_source=google#section");
        assert_eq!(q.get("utm_source"), Some("google"));
    }

    #[test]
    fn test_present_skips_empty() {
        let q = parse_query("utm_source=&utm_medium=cpc&flag");
        assert_eq!(q.get("utm_source"), Some(""));
        assert_eq!(q.present("utm_source"), None);
        assert_eq!(q.present("utm_medium"), Some("cpc"));
        assert_eq!(q.present("flag"), None);
    }
}
