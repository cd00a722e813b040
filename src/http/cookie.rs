// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Cookie parsing, snapshots and the client cookie jar
//!
//! Two views of cookies live here. [`Cookie`] and [`CookieJar`] model
//! what the server handed out through `Set-Cookie`. [`CookieSource`] is
//! the read-only `document.cookie`-style view that request hooks consume:
//! a single `name=value; name=value` string, reparsed on every request.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use url::Url;

/// Read-only access to the cookies visible to a request.
///
/// Implementations return the string a script would see in
/// `document.cookie`: HttpOnly cookies excluded, pairs joined with `"; "`.
pub trait CookieSource: Send + Sync {
    /// Current cookie string for a request to `url`, or all visible
    /// cookies when no URL is known.
    fn cookie_string(&self, url: Option<&Url>) -> String;
}

/// Immutable cookie string captured once and served for every request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieSnapshot(String);

impl CookieSnapshot {
    pub fn new(cookies: impl Into<String>) -> Self {
        Self(cookies.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CookieSnapshot {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CookieSnapshot {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl CookieSource for CookieSnapshot {
    fn cookie_string(&self, _url: Option<&Url>) -> String {
        self.0.clone()
    }
}

impl<F> CookieSource for F
where
    F: Fn() -> String + Send + Sync,
{
    fn cookie_string(&self, _url: Option<&Url>) -> String {
        self()
    }
}

/// Parse a `Cookie`-header style string into a name/value map.
///
/// Never fails. Segments without `=` or with an empty name are dropped,
/// the first occurrence of a name wins, surrounding double quotes are
/// stripped and values are percent-decoded (the raw value is kept when
/// decoding fails).
pub fn parse_cookie_string(cookies: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();

    for segment in cookies.split(';') {
        let Some((name, value)) = segment.split_once('=') else {
            continue;
        };

        let name = name.trim();
        if name.is_empty() || map.contains_key(name) {
            continue;
        }

        let mut value = value.trim();
        if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
            value = &value[1..value.len() - 1];
        }

        let value = percent_decode(value).unwrap_or_else(|| value.to_string());
        map.insert(name.to_string(), value);
    }

    map
}

/// Look up a single cookie value in a cookie string
pub fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    parse_cookie_string(cookies).remove(name)
}

/// Percent-decode a value. `None` when the result is not UTF-8.
fn percent_decode(s: &str) -> Option<String> {
    percent_decode_str(s)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

/// A single HTTP cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Domain the cookie belongs to (empty matches every host)
    pub domain: String,
    /// Set without a `Domain` attribute: only `domain` itself matches,
    /// not its subdomains
    #[serde(default)]
    pub host_only: bool,
    /// Path the cookie is valid for
    pub path: String,
    /// Expiration time (None = session cookie)
    pub expires: Option<DateTime<Utc>>,
    /// Secure flag (HTTPS only)
    pub secure: bool,
    /// HttpOnly flag (hidden from the cookie string hooks see)
    pub http_only: bool,
    /// SameSite attribute
    pub same_site: SameSite,
}

/// SameSite cookie attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SameSite {
    #[default]
    None,
    Lax,
    Strict,
}

impl Cookie {
    /// Create a new cookie
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            host_only: false,
            path: "/".to_string(),
            expires: None,
            secure: false,
            http_only: false,
            same_site: SameSite::default(),
        }
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Restrict matching to exactly `domain`
    pub fn host_only(mut self, host_only: bool) -> Self {
        self.host_only = host_only;
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    pub fn expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Check if the cookie is expired
    pub fn is_expired(&self) -> bool {
        self.expires.map_or(false, |exp| exp <= Utc::now())
    }

    /// Check if the cookie applies to a request for `url`
    pub fn matches(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or("");
        if !self.domain_matches(host) {
            return false;
        }

        if !path_matches(&self.path, url.path()) {
            return false;
        }

        if self.secure && url.scheme() != "https" {
            return false;
        }

        !self.is_expired()
    }

    fn domain_matches(&self, host: &str) -> bool {
        if self.domain.is_empty() {
            return true;
        }

        if self.host_only {
            return host.eq_ignore_ascii_case(&self.domain);
        }

        domain_matches(host, &self.domain)
    }

    /// Parse a Set-Cookie header value received from `url`
    ///
    /// Returns `None` when the header is malformed or names a `Domain`
    /// the sending host does not belong to.
    pub fn parse(header: &str, url: &Url) -> Option<Self> {
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.trim().split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let host = url.host_str().unwrap_or("").to_lowercase();
        let mut cookie = Cookie::new(name, value.trim());
        cookie.path = default_path(url.path());

        let mut domain_attr = None;
        let mut expires = None;
        let mut max_age = None;

        for part in parts {
            let part = part.trim();
            if let Some((attr, val)) = part.split_once('=') {
                let val = val.trim();
                match attr.trim().to_lowercase().as_str() {
                    "domain" => {
                        let domain = val.trim_start_matches('.').to_lowercase();
                        if !domain.is_empty() {
                            domain_attr = Some(domain);
                        }
                    }
                    "path" if val.starts_with('/') => cookie.path = val.to_string(),
                    "expires" => {
                        if let Ok(dt) = DateTime::parse_from_rfc2822(val) {
                            expires = Some(dt.with_timezone(&Utc));
                        }
                    }
                    "max-age" => {
                        if let Ok(secs) = val.parse::<i64>() {
                            max_age = Some(secs);
                        }
                    }
                    "samesite" => {
                        cookie.same_site = match val.to_lowercase().as_str() {
                            "strict" => SameSite::Strict,
                            "lax" => SameSite::Lax,
                            _ => SameSite::None,
                        };
                    }
                    _ => {}
                }
            } else {
                match part.to_lowercase().as_str() {
                    "secure" => cookie.secure = true,
                    "httponly" => cookie.http_only = true,
                    _ => {}
                }
            }
        }

        match domain_attr {
            Some(domain) if domain_matches(&host, &domain) => cookie.domain = domain,
            Some(_) => return None,
            None => {
                cookie.domain = host;
                cookie.host_only = true;
            }
        }

        // Max-Age wins over Expires wherever it appears
        cookie.expires = match max_age {
            Some(secs) if secs <= 0 => Some(Utc::now()),
            Some(secs) => Utc::now().checked_add_signed(chrono::Duration::seconds(
                secs.min(MAX_AGE_LIMIT_SECS),
            )),
            None => expires,
        };

        Some(cookie)
    }

    /// Convert to cookie header format
    pub fn to_header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Max-Age values are capped at 400 days
const MAX_AGE_LIMIT_SECS: i64 = 400 * 24 * 60 * 60;

/// `host` is `domain` or one of its subdomains
fn domain_matches(host: &str, domain: &str) -> bool {
    let host = host.to_lowercase();
    let domain = domain.trim_start_matches('.').to_lowercase();
    host == domain || host.ends_with(&format!(".{}", domain))
}

/// Cookie path `cookie_path` covers `request_path` (RFC 6265 5.1.4)
fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    if cookie_path == request_path {
        return true;
    }

    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/'))
}

/// Directory of the request path, used when Set-Cookie has no `Path`
fn default_path(request_path: &str) -> String {
    match request_path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => request_path[..idx].to_string(),
    }
}

/// Thread-safe cookie storage shared between a client and its hooks
#[derive(Debug, Clone)]
pub struct CookieJar {
    /// Cookies stored by domain
    cookies: Arc<DashMap<String, Vec<Cookie>>>,
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieJar {
    /// Create a new empty cookie jar
    pub fn new() -> Self {
        Self {
            cookies: Arc::new(DashMap::new()),
        }
    }

    /// Add a cookie, replacing any cookie with the same name and path
    pub fn add(&self, cookie: Cookie) {
        let mut entry = self.cookies.entry(cookie.domain.clone()).or_default();
        entry.retain(|c| c.name != cookie.name || c.path != cookie.path);
        // An already-expired Set-Cookie is how servers delete cookies
        if !cookie.is_expired() {
            entry.push(cookie);
        }
    }

    /// Add a cookie from a Set-Cookie header
    pub fn add_from_header(&self, header: &str, url: &Url) {
        if let Some(cookie) = Cookie::parse(header, url) {
            self.add(cookie);
        }
    }

    /// Add every pair of a `name=value; ...` string as a cookie for `domain`
    pub fn add_cookie_string(&self, cookies: &str, domain: &str) {
        for (name, value) in parse_cookie_string(cookies) {
            self.add(Cookie::new(name, value).domain(domain).host_only(true));
        }
    }

    /// Get all cookies for a URL
    pub fn get_cookies(&self, url: &Url) -> Vec<Cookie> {
        self.remove_expired();

        self.cookies
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|c| c.matches(url))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Get Cookie header value for a URL
    pub fn get_cookie_header(&self, url: &Url) -> Option<String> {
        let cookies = self.get_cookies(url);
        if cookies.is_empty() {
            return None;
        }

        Some(join_cookies(&cookies))
    }

    /// Get all non-HttpOnly cookies for a URL
    pub fn get_js_accessible_cookies(&self, url: &Url) -> Vec<Cookie> {
        self.get_cookies(url)
            .into_iter()
            .filter(|c| !c.http_only)
            .collect()
    }

    /// Find a cookie by name regardless of domain
    pub fn get(&self, name: &str) -> Option<Cookie> {
        self.cookies
            .iter()
            .find_map(|e| e.value().iter().find(|c| c.name == name).cloned())
    }

    fn remove_expired(&self) {
        for mut entry in self.cookies.iter_mut() {
            entry.value_mut().retain(|c| !c.is_expired());
        }
    }

    /// Get total cookie count
    pub fn len(&self) -> usize {
        self.cookies.iter().map(|e| e.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Export all cookies as JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        let all_cookies: Vec<Cookie> = self
            .cookies
            .iter()
            .flat_map(|e| e.value().clone())
            .collect();
        serde_json::to_string(&all_cookies)
    }

    /// Import cookies from JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let cookies: Vec<Cookie> = serde_json::from_str(json)?;
        let jar = CookieJar::new();
        for cookie in cookies {
            jar.add(cookie);
        }
        Ok(jar)
    }
}

impl CookieSource for CookieJar {
    fn cookie_string(&self, url: Option<&Url>) -> String {
        let visible: Vec<Cookie> = match url {
            Some(url) => self.get_js_accessible_cookies(url),
            None => {
                self.remove_expired();
                self.cookies
                    .iter()
                    .flat_map(|e| e.value().clone())
                    .filter(|c| !c.http_only)
                    .collect()
            }
        };

        join_cookies(&visible)
    }
}

fn join_cookies(cookies: &[Cookie]) -> String {
    cookies
        .iter()
        .map(|c| c.to_header_value())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookie_string() {
        let map = parse_cookie_string("mlflow-csrf-token=abc123; other=1");
        assert_eq!(map.get("mlflow-csrf-token").map(String::as_str), Some("abc123"));
        assert_eq!(map.get("other").map(String::as_str), Some("1"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_parse_cookie_string_is_permissive() {
        assert!(parse_cookie_string("").is_empty());
        assert!(parse_cookie_string(";;; ; =orphan; noequals").is_empty());

        let map = parse_cookie_string("garbage; a=1;; =x; b = 2 ");
        assert_eq!(map.get("a").map(String::as_str), Some("1"));
        assert_eq!(map.get("b").map(String::as_str), Some("2"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_parse_cookie_string_first_wins() {
        let map = parse_cookie_string("token=first; token=second");
        assert_eq!(map.get("token").map(String::as_str), Some("first"));
    }

    #[test]
    fn test_parse_cookie_string_decoding() {
        let map = parse_cookie_string(r#"q="quoted"; enc=a%20b%3Dc; bad=100%; half=%E2%82"#);
        assert_eq!(map.get("q").map(String::as_str), Some("quoted"));
        assert_eq!(map.get("enc").map(String::as_str), Some("a b=c"));
        assert_eq!(map.get("bad").map(String::as_str), Some("100%"));
        assert_eq!(map.get("half").map(String::as_str), Some("%E2%82"));
    }

    #[test]
    fn test_value_keeps_embedded_equals() {
        assert_eq!(cookie_value("t=a=b=c", "t").as_deref(), Some("a=b=c"));
        assert_eq!(cookie_value("t=", "t").as_deref(), Some(""));
        assert_eq!(cookie_value("other=1", "t"), None);
    }

    #[test]
    fn test_cookie_parsing() {
        let url = Url::parse("https://example.com/path").unwrap();
        let header = "session=abc123; Domain=example.com; Path=/; Secure; HttpOnly";
        let cookie = Cookie::parse(header, &url).unwrap();

        assert_eq!(cookie.name, "session");
        assert_eq!(cookie.value, "abc123");
        assert_eq!(cookie.domain, "example.com");
        assert_eq!(cookie.path, "/");
        assert!(cookie.secure);
        assert!(cookie.http_only);
    }

    #[test]
    fn test_jar_cookie_string_hides_http_only() {
        let jar = CookieJar::new();
        let url = Url::parse("https://mlflow.example.com/api").unwrap();

        jar.add_from_header("mlflow-csrf-token=t0k; Path=/", &url);
        jar.add_from_header("session=secret; Path=/; HttpOnly", &url);

        assert_eq!(jar.len(), 2);
        assert_eq!(jar.cookie_string(Some(&url)), "mlflow-csrf-token=t0k");
        assert_eq!(jar.cookie_string(None), "mlflow-csrf-token=t0k");
        assert!(jar.get_cookie_header(&url).unwrap().contains("session=secret"));
    }

    #[test]
    fn test_jar_scopes_by_domain() {
        let jar = CookieJar::new();
        jar.add(Cookie::new("mlflow-csrf-token", "abc").domain("mlflow.example.com"));

        let other = Url::parse("https://elsewhere.test/").unwrap();
        assert_eq!(jar.cookie_string(Some(&other)), "");
    }

    #[test]
    fn test_expired_set_cookie_deletes() {
        let jar = CookieJar::new();
        let url = Url::parse("https://example.com/").unwrap();

        jar.add_from_header("mlflow-csrf-token=abc", &url);
        assert!(jar.get("mlflow-csrf-token").is_some());

        jar.add_from_header("mlflow-csrf-token=; Max-Age=0", &url);
        assert!(jar.get("mlflow-csrf-token").is_none());
        assert!(jar.is_empty());
    }

    #[test]
    fn test_foreign_domain_attribute_rejected() {
        let jar = CookieJar::new();
        let attacker = Url::parse("https://attacker.test/").unwrap();
        let victim = Url::parse("https://victim.test/api").unwrap();

        jar.add_from_header(
            "mlflow-csrf-token=planted; Domain=victim.test; Path=/",
            &attacker,
        );

        assert!(jar.is_empty());
        assert_eq!(jar.cookie_string(Some(&victim)), "");
    }

    #[test]
    fn test_parent_domain_attribute_covers_subdomains() {
        let origin = Url::parse("https://tracking.example.com/").unwrap();
        let cookie = Cookie::parse("t=1; Domain=.Example.com", &origin).unwrap();

        assert_eq!(cookie.domain, "example.com");
        assert!(!cookie.host_only);
        assert!(cookie.matches(&Url::parse("https://other.example.com/").unwrap()));
        assert!(!cookie.matches(&Url::parse("https://notexample.com/").unwrap()));
    }

    #[test]
    fn test_host_only_cookie_skips_subdomains() {
        let origin = Url::parse("https://example.com/").unwrap();
        let cookie = Cookie::parse("t=1; Path=/", &origin).unwrap();

        assert!(cookie.host_only);
        assert!(cookie.matches(&origin));
        assert!(!cookie.matches(&Url::parse("https://sub.example.com/").unwrap()));
    }

    #[test]
    fn test_path_match_requires_segment_boundary() {
        let jar = CookieJar::new();
        let origin = Url::parse("https://m.test/api").unwrap();
        jar.add_from_header("mlflow-csrf-token=scoped; Path=/api", &origin);

        let apiary = Url::parse("https://m.test/apiary").unwrap();
        let nested = Url::parse("https://m.test/api/2.0/runs").unwrap();
        assert_eq!(jar.cookie_string(Some(&apiary)), "");
        assert_eq!(jar.cookie_string(Some(&origin)), "mlflow-csrf-token=scoped");
        assert_eq!(jar.cookie_string(Some(&nested)), "mlflow-csrf-token=scoped");

        assert!(path_matches("/", "/anything"));
        assert!(path_matches("/api/", "/api/x"));
        assert!(!path_matches("/api/", "/api"));
    }

    #[test]
    fn test_default_path_is_request_directory() {
        let url = Url::parse("https://m.test/ajax-api/2.0/login").unwrap();
        let cookie = Cookie::parse("t=1", &url).unwrap();
        assert_eq!(cookie.path, "/ajax-api/2.0");

        let root = Url::parse("https://m.test/login").unwrap();
        assert_eq!(Cookie::parse("t=1; Path=relative", &root).unwrap().path, "/");
    }

    #[test]
    fn test_max_age_wins_over_expires() {
        let url = Url::parse("https://m.test/").unwrap();

        let deleted = Cookie::parse(
            "mlflow-csrf-token=old; Max-Age=0; Expires=Wed, 21 Oct 2099 07:28:00 GMT",
            &url,
        )
        .unwrap();
        assert!(deleted.is_expired());

        let kept = Cookie::parse(
            "mlflow-csrf-token=new; Expires=Wed, 21 Oct 2015 07:28:00 GMT; Max-Age=3600",
            &url,
        )
        .unwrap();
        assert!(!kept.is_expired());

        let huge = Cookie::parse("t=1; Max-Age=99999999999999999", &url).unwrap();
        assert!(!huge.is_expired());
    }

    #[test]
    fn test_snapshot_and_closure_sources() {
        let snapshot = CookieSnapshot::from("a=1");
        assert_eq!(snapshot.cookie_string(None), "a=1");

        let closure = || "b=2".to_string();
        assert_eq!(closure.cookie_string(None), "b=2");
    }

    #[test]
    fn test_json_roundtrip_preserves_attributes() {
        let jar = CookieJar::new();
        jar.add(Cookie::new("x", "1").domain("example.com").http_only(true));

        let restored = CookieJar::from_json(&jar.to_json().unwrap()).unwrap();
        let cookie = restored.get("x").unwrap();
        assert!(cookie.http_only);
        assert_eq!(cookie.domain, "example.com");
    }
}
