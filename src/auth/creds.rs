// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Tracking server host and credentials, and where to load them from

use std::fmt;

use url::Url;

use crate::error::{Error, Result};

pub const TRACKING_URI_ENV: &str = "MLFLOW_TRACKING_URI";
pub const TRACKING_USERNAME_ENV: &str = "MLFLOW_TRACKING_USERNAME";
pub const TRACKING_PASSWORD_ENV: &str = "MLFLOW_TRACKING_PASSWORD";
pub const TRACKING_TOKEN_ENV: &str = "MLFLOW_TRACKING_TOKEN";
pub const TRACKING_INSECURE_TLS_ENV: &str = "MLFLOW_TRACKING_INSECURE_TLS";

/// Where the tracking server lives and how to authenticate to it
#[derive(Clone, PartialEq, Eq)]
pub struct HostCreds {
    pub host: Url,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Bearer token, preferred over username/password
    pub token: Option<String>,
    /// Skip TLS certificate verification
    pub no_tls_verify: bool,
}

impl HostCreds {
    /// Credentials-less settings for `host`
    pub fn new(host: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            host: Url::parse(host.as_ref())?,
            username: None,
            password: None,
            token: None,
            no_tls_verify: false,
        })
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn no_tls_verify(mut self, no_tls_verify: bool) -> Self {
        self.no_tls_verify = no_tls_verify;
        self
    }

    /// Resolve an endpoint path below the host, keeping any path prefix
    /// the host URL carries (`https://h/mlflow` + `api/2.0/x` ->
    /// `https://h/mlflow/api/2.0/x`).
    pub fn url_for(&self, path: &str) -> Result<Url> {
        let mut base = self.host.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        Ok(base.join(path.trim_start_matches('/'))?)
    }

    /// Whether `url` points at this host (scheme, host and port)
    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.scheme() == self.host.scheme()
            && url.host_str() == self.host.host_str()
            && url.port_or_known_default() == self.host.port_or_known_default()
    }
}

impl fmt::Debug for HostCreds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostCreds")
            .field("host", &self.host.as_str())
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("no_tls_verify", &self.no_tls_verify)
            .finish()
    }
}

/// Source of [`HostCreds`]
pub trait HostCredsProvider: Send + Sync {
    fn host_creds(&self) -> Result<HostCreds>;

    /// Drop any cached state so the next lookup is fresh
    fn refresh(&self) {}

    fn name(&self) -> &str;
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Reads the `MLFLOW_TRACKING_*` environment variables
pub struct EnvHostCredsProvider {
    lookup: EnvLookup,
}

impl EnvHostCredsProvider {
    /// Provider over the process environment
    pub fn new() -> Self {
        Self::with_lookup(|key| std::env::var(key).ok())
    }

    /// Provider over a custom variable lookup
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
        }
    }

    fn var(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.is_empty())
    }
}

impl Default for EnvHostCredsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl HostCredsProvider for EnvHostCredsProvider {
    fn host_creds(&self) -> Result<HostCreds> {
        let uri = self
            .var(TRACKING_URI_ENV)
            .ok_or_else(|| Error::credentials(format!("{} is not set", TRACKING_URI_ENV)))?;
        let host = Url::parse(&uri)
            .map_err(|e| Error::credentials(format!("{} is invalid: {}", TRACKING_URI_ENV, e)))?;

        Ok(HostCreds {
            host,
            username: self.var(TRACKING_USERNAME_ENV),
            password: self.var(TRACKING_PASSWORD_ENV),
            token: self.var(TRACKING_TOKEN_ENV),
            no_tls_verify: self
                .var(TRACKING_INSECURE_TLS_ENV)
                .map_or(false, |v| v.eq_ignore_ascii_case("true")),
        })
    }

    fn name(&self) -> &str {
        "env"
    }
}

/// Fixed credentials supplied by the caller
#[derive(Debug, Clone)]
pub struct StaticHostCredsProvider {
    creds: HostCreds,
}

impl StaticHostCredsProvider {
    pub fn new(creds: HostCreds) -> Self {
        Self { creds }
    }
}

impl HostCredsProvider for StaticHostCredsProvider {
    fn host_creds(&self) -> Result<HostCreds> {
        Ok(self.creds.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Tries providers in order and returns the first that yields a host
#[derive(Default)]
pub struct HostCredsProviderChain {
    providers: Vec<Box<dyn HostCredsProvider>>,
}

impl HostCredsProviderChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain with the environment provider only
    pub fn from_env() -> Self {
        Self::new().with(EnvHostCredsProvider::new())
    }

    /// Append a provider
    pub fn with<P: HostCredsProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl HostCredsProvider for HostCredsProviderChain {
    fn host_creds(&self) -> Result<HostCreds> {
        let mut failures = Vec::new();

        for provider in &self.providers {
            match provider.host_creds() {
                Ok(creds) => {
                    tracing::debug!(provider = provider.name(), "Loaded host credentials");
                    return Ok(creds);
                }
                Err(e) => {
                    let message = format!("{}: {}", provider.name(), e);
                    tracing::debug!("Unable to load credentials from {}", message);
                    failures.push(message);
                }
            }
        }

        Err(Error::Credentials {
            reason: format!(
                "no provider in the chain returned a host [{}]",
                failures.join(", ")
            ),
            providers: failures,
        })
    }

    fn refresh(&self) {
        for provider in &self.providers {
            provider.refresh();
        }
    }

    fn name(&self) -> &str {
        "chain"
    }
}
