//! Options accepted by the capture routine and their resolution.
//!
//! Callers hand over a loose JSON object (see [`Options`] for the typed
//! form). [`Settings::resolve`] merges it over the defaults and reads every
//! field leniently: a value of the wrong type is logged and replaced by the
//! default, never rejected.

use crate::attribution::merge::deep_merge;
use cookie::{CookieBuilder, SameSite};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use time::{Duration, OffsetDateTime};

/// Query keys tracked unless `defaults: false` is passed.
pub const DEFAULT_PARAMS: [&str; 5] = [
    "utm_campaign",
    "utm_source",
    "utm_medium",
    "utm_term",
    "utm_content",
];

/// Stored as the `referrer` data value when the page has no referrer.
pub const DIRECT_REFERRER: &str = "direct";

const DEFAULT_INITIAL_PREFIX: &str = "initial_";
const DEFAULT_PATH: &str = "/";
const DEFAULT_TIMEOUT_MINUTES: u32 = 30;

// =============================================================================
// Caller options
// =============================================================================

/// Partial, caller-supplied options. Unset fields take their defaults.
///
/// ```rust
/// use attrify::Options;
///
/// let options = Options::new()
///     .params(["gclid"])
///     .data("landing", "spring-sale")
///     .save_initial(true)
///     .domain(".example.com");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_initial: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    /// Minutes until last-touch cookies expire; `0` makes them session cookies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the built-in UTM list so only `params` are tracked.
    pub fn without_defaults(mut self) -> Self {
        self.defaults = Some(false);
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Extra query keys to track, in order.
    pub fn params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params
            .get_or_insert_with(Vec::new)
            .extend(params.into_iter().map(Into::into));
        self
    }

    /// Add one static value captured alongside the query parameters.
    pub fn data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn save_initial(mut self, save_initial: bool) -> Self {
        self.save_initial = Some(save_initial);
        self
    }

    pub fn initial_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.initial_prefix = Some(prefix.into());
        self
    }

    pub fn last_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.last_prefix = Some(prefix.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn same_site(mut self, same_site: impl Into<String>) -> Self {
        self.same_site = Some(same_site.into());
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    pub fn timeout_minutes(mut self, minutes: f64) -> Self {
        self.timeout = Some(minutes);
        self
    }
}

// =============================================================================
// Resolved settings
// =============================================================================

/// Attributes shared by every cookie the routine writes.
#[derive(Debug, Clone, PartialEq)]
pub struct CookieScope {
    pub path: Option<String>,
    pub domain: Option<String>,
    pub same_site: Option<SameSite>,
    pub secure: bool,
}

impl CookieScope {
    pub fn apply<'c>(
        &self,
        mut builder: CookieBuilder<'c>,
        expires: Option<OffsetDateTime>,
    ) -> CookieBuilder<'c> {
        if let Some(path) = &self.path {
            builder = builder.path(path.clone());
        }
        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }
        if let Some(same_site) = self.same_site {
            builder = builder.same_site(same_site);
        }
        if self.secure {
            builder = builder.secure(true);
        }
        if let Some(expires) = expires {
            builder = builder.expires(expires);
        }
        builder
    }
}

/// Fully resolved configuration for one capture call.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub prefix: String,
    pub params: Vec<String>,
    pub data: Map<String, Value>,
    pub save_initial: bool,
    pub initial_prefix: String,
    pub last_prefix: String,
    pub scope: CookieScope,
    /// `None` means last-touch cookies are session cookies.
    pub timeout: Option<Duration>,
}

impl Settings {
    /// Merge `options` over the defaults. `referrer` seeds `data.referrer`.
    ///
    /// Anything other than a JSON object counts as "no options".
    pub fn resolve(options: Option<&Value>, referrer: &str) -> Settings {
        let mut merged = Self::defaults(referrer);

        if let Some(Value::Object(caller)) = options {
            if caller.get("defaults") == Some(&Value::Bool(false)) {
                merged["params"] = Value::Array(Vec::new());
            }
            deep_merge(&mut merged, Value::Object(caller.clone()));
        } else if let Some(other) = options.filter(|v| !v.is_null()) {
            tracing::warn!(options = %other, "options are not an object; using defaults");
        }

        Self::from_merged(&merged)
    }

    fn defaults(referrer: &str) -> Value {
        let referrer = if referrer.is_empty() {
            DIRECT_REFERRER
        } else {
            referrer
        };

        json!({
            "defaults": true,
            "prefix": "",
            "saveInitial": false,
            "initialPrefix": DEFAULT_INITIAL_PREFIX,
            "lastPrefix": "",
            "params": DEFAULT_PARAMS,
            "data": { "referrer": referrer },
            "path": DEFAULT_PATH,
            "domain": null,
            "timeout": DEFAULT_TIMEOUT_MINUTES,
            "sameSite": "none",
            "secure": true,
        })
    }

    fn from_merged(merged: &Value) -> Settings {
        let field = |key: &str| merged.get(key).unwrap_or(&Value::Null);

        Settings {
            prefix: read_string("prefix", field("prefix"), ""),
            params: read_params(field("params")),
            data: read_data(field("data")),
            save_initial: is_truthy(field("saveInitial")),
            initial_prefix: read_string(
                "initialPrefix",
                field("initialPrefix"),
                DEFAULT_INITIAL_PREFIX,
            ),
            last_prefix: read_string("lastPrefix", field("lastPrefix"), ""),
            scope: CookieScope {
                path: read_attribute("path", field("path")),
                domain: read_attribute("domain", field("domain")),
                same_site: read_same_site(field("sameSite")),
                secure: is_truthy(field("secure")),
            },
            timeout: read_timeout(field("timeout")),
        }
    }

    /// `{prefix}{lastPrefix}{key}`
    pub fn last_name(&self, key: &str) -> String {
        format!("{}{}{}", self.prefix, self.last_prefix, key)
    }

    /// `{prefix}{initialPrefix}{key}`
    pub fn initial_name(&self, key: &str) -> String {
        format!("{}{}{}", self.prefix, self.initial_prefix, key)
    }
}

// =============================================================================
// Lenient field readers
// =============================================================================

/// JavaScript truthiness.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// JavaScript `String(value)` for the scalars a caller may put in `data`.
/// `null` and the empty string have no string form here: they are never stored.
/// Floats use Rust's `Display`, so exponents JS would print (`1e+21`) come out
/// as plain digits.
pub(crate) fn to_cookie_value(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_to_string(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| to_cookie_value(item).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    };

    (!text.is_empty()).then_some(text)
}

fn number_to_string(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        // f64 Display drops a trailing ".0" the way JS does
        n.as_f64().map(|f| f.to_string()).unwrap_or_default()
    }
}

fn read_string(name: &str, value: &Value, default: &str) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_to_string(n),
        Value::Bool(b) => b.to_string(),
        Value::Null => default.to_string(),
        other => {
            tracing::warn!(option = name, value = %other, "expected a string; using default");
            default.to_string()
        }
    }
}

/// Cookie attributes are omitted when falsy, like `cookie.serialize` does.
fn read_attribute(name: &str, value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::String(_) | Value::Null | Value::Bool(false) => None,
        other => {
            tracing::warn!(option = name, value = %other, "expected a string; attribute omitted");
            None
        }
    }
}

fn read_params(value: &Value) -> Vec<String> {
    let items = match value {
        Value::Array(items) => items,
        Value::Null => return Vec::new(),
        other => {
            tracing::warn!(option = "params", value = %other, "expected an array; no params tracked");
            return Vec::new();
        }
    };

    let mut params: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(key) if !params.contains(key) => params.push(key.clone()),
            Value::String(_) => {}
            other => {
                tracing::warn!(option = "params", value = %other, "ignoring non-string param");
            }
        }
    }
    params
}

fn read_data(value: &Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => {
            tracing::warn!(option = "data", value = %other, "expected an object; no data captured");
            Map::new()
        }
    }
}

fn read_same_site(value: &Value) -> Option<SameSite> {
    match value {
        Value::Bool(true) => Some(SameSite::Strict),
        Value::Bool(false) | Value::Null => None,
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "none" => Some(SameSite::None),
            "lax" => Some(SameSite::Lax),
            "strict" => Some(SameSite::Strict),
            "" => None,
            _ => {
                tracing::warn!(option = "sameSite", value = %s, "unknown SameSite; attribute omitted");
                None
            }
        },
        other => {
            tracing::warn!(option = "sameSite", value = %other, "unknown SameSite; attribute omitted");
            None
        }
    }
}

/// Minutes until expiry. Falsy or non-positive disables expiration.
/// Fractional minutes are kept as seconds (`0.5` is 30 seconds).
fn read_timeout(value: &Value) -> Option<Duration> {
    let minutes = match value {
        Value::Number(n) => n.as_f64(),
        // minutes + true is minutes + 1 in JS
        Value::Bool(true) => Some(1.0),
        Value::String(s) if !s.trim().is_empty() => match s.trim().parse::<f64>() {
            Ok(minutes) => Some(minutes),
            Err(_) => {
                tracing::warn!(option = "timeout", value = %s, "timeout is not a number; expiration disabled");
                None
            }
        },
        Value::Null | Value::Bool(false) | Value::String(_) => None,
        other => {
            tracing::warn!(option = "timeout", value = %other, "timeout is not a number; expiration disabled");
            None
        }
    }?;

    if !minutes.is_finite() || minutes <= 0.0 {
        return None;
    }

    let timeout = Duration::checked_seconds_f64(minutes * 60.0);
    if timeout.is_none() {
        tracing::warn!(option = "timeout", minutes, "timeout out of range; expiration disabled");
    }
    timeout
}
