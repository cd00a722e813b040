// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP client implementation

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::Client;

use super::cookie::CookieJar;
use super::request::Request;
use super::response::Response;
use super::DEFAULT_USER_AGENT;
use crate::auth::{CredentialsInterceptor, HostCreds};
use crate::csrf;
use crate::error::{Error, Result};
use crate::network::{InterceptorChain, RequestInterceptor};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// User agent string
    pub user_agent: String,
    /// Default timeout
    pub timeout: Duration,
    /// Maximum redirects to follow
    pub max_redirects: usize,
    /// Accept invalid certificates (dangerous!)
    pub accept_invalid_certs: bool,
    /// Default headers
    pub default_headers: HeaderMap,
    /// Send jar cookies and store Set-Cookie responses
    pub handle_cookies: bool,
    /// Proxy URL
    pub proxy: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("accept", HeaderValue::from_static("application/json"));

        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            max_redirects: 10,
            accept_invalid_certs: false,
            default_headers,
            handle_cookies: true,
            proxy: None,
        }
    }
}

impl HttpClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Skip TLS certificate verification
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Add a default header sent with every request
    pub fn default_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = reqwest::header::HeaderName::try_from(name)
            .map_err(|e| Error::invalid_header(name, e.to_string()))?;
        let value = HeaderValue::try_from(value)
            .map_err(|e| Error::invalid_header(name.as_str(), e.to_string()))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    pub fn handle_cookies(mut self, handle: bool) -> Self {
        self.handle_cookies = handle;
        self
    }

    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }
}

/// HTTP client with a cookie jar and pre-send interceptors
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    cookie_jar: CookieJar,
    interceptors: Arc<RwLock<InterceptorChain>>,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(Policy::limited(config.max_redirects))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .default_headers(config.default_headers.clone());

        if let Some(ref proxy_url) = config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            config,
            cookie_jar: CookieJar::new(),
            interceptors: Arc::new(RwLock::new(InterceptorChain::new())),
        })
    }

    /// Create a client that authenticates against the credentials' host
    pub fn with_host_creds(config: HttpClientConfig, creds: &HostCreds) -> Result<Self> {
        let config = if creds.no_tls_verify {
            tracing::warn!(host = %creds.host, "TLS certificate verification disabled");
            config.accept_invalid_certs(true)
        } else {
            config
        };

        let client = Self::with_config(config)?;
        client.add_interceptor(CredentialsInterceptor::new(creds.clone()));
        Ok(client)
    }

    /// Get the cookie jar
    pub fn cookie_jar(&self) -> &CookieJar {
        &self.cookie_jar
    }

    /// Register a pre-send interceptor
    pub fn add_interceptor<I: RequestInterceptor + 'static>(&self, interceptor: I) {
        self.interceptors.write().add(interceptor);
    }

    /// Forward the jar's CSRF cookie on every request from now on
    pub fn install_csrf(&self) {
        csrf::install(&mut self.interceptors.write(), self.cookie_jar.clone());
    }

    /// Names of the registered interceptors, in execution order
    pub fn interceptor_names(&self) -> Vec<String> {
        self.interceptors
            .read()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Execute a GET request
    pub async fn get(&self, url: impl AsRef<str>) -> Result<Response> {
        self.execute(Request::get(url)?).await
    }

    /// Execute a request
    pub async fn execute(&self, request: Request) -> Result<Response> {
        self.send_prepared(self.prepare(request)).await
    }

    /// Attach jar cookies and run the interceptor chain, without sending.
    ///
    /// Apart from the client's default headers, the returned request carries
    /// what [`send_prepared`](Self::send_prepared) will put on the wire.
    pub fn prepare(&self, mut request: Request) -> Request {
        if self.config.handle_cookies && !request.headers.contains_key("cookie") {
            if let Some(cookie_header) = self.cookie_jar.get_cookie_header(&request.url) {
                if let Ok(value) = HeaderValue::from_str(&cookie_header) {
                    request.headers.insert("cookie", value);
                }
            }
        }

        // Snapshot the chain so no lock is held across the send
        let chain = self.interceptors.read().clone();
        chain.process(&mut request);
        request
    }

    /// Send a request as is and store the cookies the server sets
    pub async fn send_prepared(&self, request: Request) -> Result<Response> {
        let start = Instant::now();

        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        let response_time_ms = start.elapsed().as_millis() as u64;

        let response = Response {
            status,
            headers,
            body,
            url,
            response_time_ms,
        };

        if self.config.handle_cookies {
            for set_cookie in response.set_cookies() {
                self.cookie_jar.add_from_header(set_cookie, &response.url);
            }
        }

        tracing::debug!(
            url = %response.url,
            status = status.as_u16(),
            time_ms = response_time_ms,
            "Response"
        );

        Ok(response)
    }

    /// Execute multiple requests concurrently
    pub async fn execute_all(&self, requests: Vec<Request>) -> Vec<Result<Response>> {
        let futures: Vec<_> = requests.into_iter().map(|r| self.execute(r)).collect();
        futures::future::join_all(futures).await
    }

    /// Get client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}
