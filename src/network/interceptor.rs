// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Pre-send request interceptors
//!
//! An interceptor sees every outgoing request right before it goes on the
//! wire and may rewrite its headers. Hooks run synchronously on the send
//! path, so they must not block.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use url::Url;

use crate::http::Request;

/// Mutable view of an outgoing request's headers
///
/// Implemented for the crate's own [`Request`] and for a bare
/// [`HeaderMap`], so other HTTP clients can drive the same hooks.
pub trait HeaderSink {
    /// Set a header, replacing any existing value
    fn set_header(&mut self, name: HeaderName, value: HeaderValue);

    fn contains_header(&self, name: &str) -> bool;

    /// Target URL, when the sink knows it
    fn url(&self) -> Option<&Url> {
        None
    }

    fn method(&self) -> Option<&Method> {
        None
    }
}

impl HeaderSink for Request {
    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    fn contains_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    fn url(&self) -> Option<&Url> {
        Some(&self.url)
    }

    fn method(&self) -> Option<&Method> {
        Some(&self.method)
    }
}

impl HeaderSink for HeaderMap {
    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.insert(name, value);
    }

    fn contains_header(&self, name: &str) -> bool {
        self.contains_key(name)
    }
}

/// Hook invoked on every outgoing request before it is sent
///
/// # Example
///
/// ```rust
/// use mlflow_csrf::network::{HeaderSink, RequestInterceptor};
/// use reqwest::header::{HeaderName, HeaderValue};
///
/// struct ClientName;
///
/// impl RequestInterceptor for ClientName {
///     fn before_send(&self, request: &mut dyn HeaderSink) {
///         request.set_header(
///             HeaderName::from_static("x-client"),
///             HeaderValue::from_static("mlflow-rs"),
///         );
///     }
/// }
/// ```
pub trait RequestInterceptor: Send + Sync {
    /// Inspect or mutate the request headers
    fn before_send(&self, request: &mut dyn HeaderSink);

    /// Return false to skip this interceptor for a request
    fn should_intercept(&self, url: Option<&Url>) -> bool {
        let _ = url;
        true
    }

    /// Higher priority interceptors run first
    fn priority(&self) -> i32 {
        0
    }

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Ordered set of interceptors run against each request
#[derive(Default, Clone)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("interceptors", &self.names())
            .finish()
    }
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an interceptor
    ///
    /// Registration is not deduplicated: adding the same hook twice runs
    /// it twice.
    pub fn add<I: RequestInterceptor + 'static>(&mut self, interceptor: I) {
        self.add_shared(Arc::new(interceptor));
    }

    /// Register an interceptor that is shared with other chains
    pub fn add_shared(&mut self, interceptor: Arc<dyn RequestInterceptor>) {
        self.interceptors.push(interceptor);
        // Stable sort keeps registration order within a priority
        self.interceptors
            .sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Interceptor names in execution order
    pub fn names(&self) -> Vec<&str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    /// Run every applicable interceptor against the request
    pub fn process(&self, request: &mut dyn HeaderSink) {
        for interceptor in &self.interceptors {
            if !interceptor.should_intercept(request.url()) {
                continue;
            }
            interceptor.before_send(request);
        }
    }
}

/// Logs each request line once the other hooks have run
#[derive(Debug, Default, Clone)]
pub struct RequestLogger {
    /// Only log URLs containing this substring
    pub url_filter: Option<String>,
}

impl RequestInterceptor for RequestLogger {
    fn should_intercept(&self, url: Option<&Url>) -> bool {
        match (&self.url_filter, url) {
            (Some(filter), Some(url)) => url.as_str().contains(filter.as_str()),
            _ => true,
        }
    }

    fn before_send(&self, request: &mut dyn HeaderSink) {
        let method = request.method().map(Method::as_str).unwrap_or("-");
        let url = request.url().map(Url::as_str).unwrap_or("-");
        tracing::info!(
            method,
            url,
            csrf = request.contains_header(crate::csrf::CSRF_HEADER_NAME),
            "Request"
        );
    }

    fn priority(&self) -> i32 {
        -100 // Low priority - see the final headers
    }

    fn name(&self) -> &str {
        "request-logger"
    }
}
