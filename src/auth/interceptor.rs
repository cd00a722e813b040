// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Authorization header injection

use reqwest::header::{HeaderValue, AUTHORIZATION};
use url::Url;

use super::creds::HostCreds;
use crate::network::{HeaderSink, RequestInterceptor};

/// Adds `Authorization` to requests bound for the credentials' host
///
/// A token is sent as `Bearer`; otherwise a username and password pair
/// is sent as `Basic`. Requests to other origins, or sinks that do not
/// expose a URL, are left alone.
pub struct CredentialsInterceptor {
    creds: HostCreds,
    authorization: Option<HeaderValue>,
}

impl CredentialsInterceptor {
    pub fn new(creds: HostCreds) -> Self {
        let authorization = authorization_value(&creds);
        if authorization.is_none() && (creds.token.is_some() || creds.username.is_some()) {
            tracing::warn!(
                host = %creds.host,
                "Host credentials incomplete or not a valid header value"
            );
        }

        Self {
            creds,
            authorization,
        }
    }

    /// Whether this interceptor will add a header at all
    pub fn has_credentials(&self) -> bool {
        self.authorization.is_some()
    }
}

fn authorization_value(creds: &HostCreds) -> Option<HeaderValue> {
    let raw = match (&creds.token, &creds.username, &creds.password) {
        (Some(token), _, _) => format!("Bearer {}", token),
        (None, Some(user), Some(pass)) => {
            let encoded = base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                format!("{}:{}", user, pass),
            );
            format!("Basic {}", encoded)
        }
        _ => return None,
    };

    let mut value = HeaderValue::from_str(&raw).ok()?;
    value.set_sensitive(true);
    Some(value)
}

impl RequestInterceptor for CredentialsInterceptor {
    fn should_intercept(&self, url: Option<&Url>) -> bool {
        url.map_or(false, |url| self.creds.is_same_origin(url))
    }

    fn before_send(&self, request: &mut dyn HeaderSink) {
        let Some(ref value) = self.authorization else {
            return;
        };

        // Explicit per-request credentials win
        if request.contains_header(AUTHORIZATION.as_str()) {
            return;
        }

        request.set_header(AUTHORIZATION, value.clone());
    }

    fn priority(&self) -> i32 {
        100 // High priority - run auth injection early
    }

    fn name(&self) -> &str {
        "host-credentials"
    }
}
