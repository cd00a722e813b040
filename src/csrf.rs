// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! CSRF token forwarding
//!
//! Servers running behind CSRF-enforcing infrastructure hand the client a
//! `mlflow-csrf-token` cookie. Once [`install`] has registered the hook,
//! every outgoing request reads the current cookies and echoes that token
//! back in an `X-CSRF-Token` header. Without the cookie, requests go out
//! untouched.
//!
//! ```rust
//! use mlflow_csrf::csrf;
//! use mlflow_csrf::http::CookieSnapshot;
//! use mlflow_csrf::network::InterceptorChain;
//! use reqwest::header::HeaderMap;
//!
//! let mut chain = InterceptorChain::new();
//! csrf::install(&mut chain, CookieSnapshot::from("mlflow-csrf-token=abc123; other=1"));
//!
//! let mut headers = HeaderMap::new();
//! chain.process(&mut headers);
//! assert_eq!(headers.get("x-csrf-token").unwrap(), "abc123");
//! ```

use reqwest::header::{HeaderName, HeaderValue};
use url::Url;

use crate::http::{cookie_value, CookieSource};
use crate::network::{HeaderSink, InterceptorChain, RequestInterceptor};

/// Cookie the server sets with the CSRF token
pub const CSRF_COOKIE_NAME: &str = "mlflow-csrf-token";

/// Header the token is echoed back in
pub const CSRF_HEADER_NAME: &str = "X-CSRF-Token";

/// Register the CSRF hook on `chain`, reading cookies from `cookies`.
///
/// Only registers; nothing is sent and nothing can fail. Calling it twice
/// registers two hooks, which set the same header to the same value.
pub fn install(chain: &mut InterceptorChain, cookies: impl CookieSource + 'static) {
    tracing::debug!(
        cookie = CSRF_COOKIE_NAME,
        header = CSRF_HEADER_NAME,
        "Installing CSRF header hook"
    );
    chain.add(CsrfInterceptor::new(cookies));
}

/// Pre-send hook copying the CSRF cookie into the request headers
pub struct CsrfInterceptor<S> {
    cookies: S,
    header: HeaderName,
}

impl<S: CookieSource> CsrfInterceptor<S> {
    pub fn new(cookies: S) -> Self {
        Self {
            cookies,
            header: HeaderName::from_static("x-csrf-token"),
        }
    }

    /// Token that would be attached to a request for `url`.
    ///
    /// Empty tokens count as absent.
    pub fn token(&self, url: Option<&Url>) -> Option<String> {
        let cookies = self.cookies.cookie_string(url);
        cookie_value(&cookies, CSRF_COOKIE_NAME).filter(|token| !token.is_empty())
    }
}

impl<S: CookieSource> RequestInterceptor for CsrfInterceptor<S> {
    fn before_send(&self, request: &mut dyn HeaderSink) {
        let Some(token) = self.token(request.url()) else {
            tracing::debug!("No CSRF cookie, sending request without token");
            return;
        };

        match HeaderValue::from_str(&token) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.set_header(self.header.clone(), value);
                tracing::debug!(header = CSRF_HEADER_NAME, "Attached CSRF token");
            }
            Err(_) => {
                tracing::warn!(
                    cookie = CSRF_COOKIE_NAME,
                    "CSRF cookie is not a valid header value, ignoring it"
                );
            }
        }
    }

    fn name(&self) -> &str {
        "csrf"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{CookieJar, CookieSnapshot, Request};
    use reqwest::header::HeaderMap;

    fn headers_for(cookies: &str) -> HeaderMap {
        let mut chain = InterceptorChain::new();
        install(&mut chain, CookieSnapshot::from(cookies));

        let mut headers = HeaderMap::new();
        chain.process(&mut headers);
        headers
    }

    #[test]
    fn test_token_present_sets_header() {
        let headers = headers_for("mlflow-csrf-token=abc123; other=1");
        assert_eq!(headers.get(CSRF_HEADER_NAME).unwrap(), "abc123");
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_token_missing_sets_nothing() {
        assert!(headers_for("other=1").is_empty());
    }

    #[test]
    fn test_empty_cookie_string_sets_nothing() {
        assert!(headers_for("").is_empty());
    }

    #[test]
    fn test_empty_token_is_absent() {
        assert!(headers_for("mlflow-csrf-token=").is_empty());
        assert!(headers_for("mlflow-csrf-token=\"\"").is_empty());
    }

    #[test]
    fn test_malformed_cookie_string_is_tolerated() {
        assert!(headers_for(";;=;garbage;%%%").is_empty());

        let headers = headers_for("junk; ; mlflow-csrf-token = tok ;=x");
        assert_eq!(headers.get(CSRF_HEADER_NAME).unwrap(), "tok");
    }

    #[test]
    fn test_similar_cookie_names_do_not_match() {
        assert!(headers_for("xmlflow-csrf-token=a; mlflow-csrf-token-old=b").is_empty());
    }

    #[test]
    fn test_token_not_a_header_value_is_skipped() {
        assert!(headers_for("mlflow-csrf-token=a%0Ab").is_empty());
    }

    #[test]
    fn test_header_is_marked_sensitive() {
        let headers = headers_for("mlflow-csrf-token=abc123");
        assert!(headers.get(CSRF_HEADER_NAME).unwrap().is_sensitive());
    }

    #[test]
    fn test_install_registers_without_side_effects() {
        let mut chain = InterceptorChain::new();
        install(&mut chain, CookieSnapshot::default());
        assert_eq!(chain.names(), vec!["csrf"]);
    }

    #[test]
    fn test_install_twice_registers_two_hooks() {
        let mut chain = InterceptorChain::new();
        install(&mut chain, CookieSnapshot::from("mlflow-csrf-token=abc123"));
        install(&mut chain, CookieSnapshot::from("mlflow-csrf-token=abc123"));
        assert_eq!(chain.len(), 2);

        let mut headers = HeaderMap::new();
        chain.process(&mut headers);
        assert_eq!(headers.get_all(CSRF_HEADER_NAME).iter().count(), 1);
        assert_eq!(headers.get(CSRF_HEADER_NAME).unwrap(), "abc123");
    }

    #[test]
    fn test_replaces_stale_header() {
        let mut chain = InterceptorChain::new();
        install(&mut chain, CookieSnapshot::from("mlflow-csrf-token=fresh"));

        let mut req = Request::get("https://mlflow.example.com/ajax-api/2.0/mlflow/runs/search")
            .unwrap()
            .header(CSRF_HEADER_NAME, "stale");
        chain.process(&mut req);
        assert_eq!(req.header_str(CSRF_HEADER_NAME), Some("fresh"));
    }

    #[test]
    fn test_cookie_read_on_every_request() {
        let jar = CookieJar::new();
        let url = Url::parse("https://mlflow.example.com/").unwrap();

        let mut chain = InterceptorChain::new();
        install(&mut chain, jar.clone());

        let mut before = Request::get(url.as_str()).unwrap();
        chain.process(&mut before);
        assert!(!before.headers.contains_key(CSRF_HEADER_NAME));

        jar.add_from_header("mlflow-csrf-token=rotated; Path=/", &url);

        let mut after = Request::get(url.as_str()).unwrap();
        chain.process(&mut after);
        assert_eq!(after.header_str(CSRF_HEADER_NAME), Some("rotated"));
    }

    #[test]
    fn test_http_only_cookie_is_not_visible() {
        let jar = CookieJar::new();
        let url = Url::parse("https://mlflow.example.com/").unwrap();
        jar.add_from_header("mlflow-csrf-token=hidden; HttpOnly", &url);

        let hook = CsrfInterceptor::new(jar);
        assert_eq!(hook.token(Some(&url)), None);
    }

    #[test]
    fn test_token_planted_for_other_host_is_ignored() {
        let jar = CookieJar::new();
        let attacker = Url::parse("https://attacker.test/").unwrap();
        jar.add_from_header(
            "mlflow-csrf-token=planted; Domain=victim.test; Path=/",
            &attacker,
        );

        let hook = CsrfInterceptor::new(jar);
        let victim = Url::parse("https://victim.test/ajax-api/2.0/mlflow/runs/search").unwrap();
        assert_eq!(hook.token(Some(&victim)), None);
    }
}
