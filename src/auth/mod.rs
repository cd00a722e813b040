// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Tracking server host credentials
//!
//! Resolves which server to talk to and how to authenticate, from the
//! environment or from values supplied in code, and injects the
//! matching `Authorization` header into requests bound for that host.

mod creds;
mod interceptor;

pub use creds::{
    EnvHostCredsProvider, HostCreds, HostCredsProvider, HostCredsProviderChain,
    StaticHostCredsProvider, TRACKING_INSECURE_TLS_ENV, TRACKING_PASSWORD_ENV,
    TRACKING_TOKEN_ENV, TRACKING_URI_ENV, TRACKING_USERNAME_ENV,
};
pub use interceptor::CredentialsInterceptor;
