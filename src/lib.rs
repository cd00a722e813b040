// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # mlflow-csrf - CSRF token forwarding for MLflow clients
//!
//! Lets a client talk to an MLflow tracking server that sits behind
//! CSRF-enforcing infrastructure. The server sets a `mlflow-csrf-token`
//! cookie; a pre-send hook reads it on every request and echoes it in an
//! `X-CSRF-Token` header, so call sites never handle the token.
//!
//! ## Features
//!
//! - CSRF hook: one installer call, header attached whenever the cookie exists
//! - Interceptor seam: hooks run over any [`network::HeaderSink`]
//! - Cookie jar: Set-Cookie capture, `document.cookie`-style views
//! - Host credentials: `MLFLOW_TRACKING_*` environment, provider chain,
//!   Bearer/Basic `Authorization` injection
//!
//! ## Example
//!
//! ```rust,no_run
//! use mlflow_csrf::auth::{HostCredsProvider, HostCredsProviderChain};
//! use mlflow_csrf::{HttpClient, HttpClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let creds = HostCredsProviderChain::from_env().host_creds()?;
//!     let client = HttpClient::with_host_creds(HttpClientConfig::default(), &creds)?;
//!     client.install_csrf();
//!
//!     let response = client
//!         .get(creds.url_for("ajax-api/2.0/mlflow/experiments/search")?)
//!         .await?;
//!     println!("{}", response.status);
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod csrf;
pub mod error;
pub mod http;
pub mod network;

// Re-exports for convenience

// CSRF
pub use csrf::{install, CsrfInterceptor, CSRF_COOKIE_NAME, CSRF_HEADER_NAME};

// Errors
pub use error::{Error, Result};

// HTTP
pub use http::{Cookie, CookieJar, CookieSnapshot, CookieSource, HttpClient, HttpClientConfig};
pub use http::{Request, Response};

// Network
pub use network::{HeaderSink, InterceptorChain, RequestInterceptor, RequestLogger};

// Auth
pub use auth::{CredentialsInterceptor, HostCreds, HostCredsProvider, HostCredsProviderChain};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
