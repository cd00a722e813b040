// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP client layer
//!
//! A reqwest-backed client with its own cookie jar and a chain of
//! pre-send interceptors, plus the cookie parsing the hooks rely on.

mod client;
mod cookie;
mod request;
mod response;

pub use client::{HttpClient, HttpClientConfig};
pub use cookie::{
    cookie_value, parse_cookie_string, Cookie, CookieJar, CookieSnapshot, CookieSource, SameSite,
};
pub use request::Request;
pub use response::Response;

/// Default user agent string
pub const DEFAULT_USER_AGENT: &str = concat!("mlflow-csrf/", env!("CARGO_PKG_VERSION"));
