// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! mlflow-csrf CLI
//!
//! Shows the CSRF hook at work, offline or against a live server.

use std::env;
use std::process::ExitCode;

use anyhow::Context;
use mlflow_csrf::auth::{HostCredsProvider, HostCredsProviderChain};
use mlflow_csrf::http::CookieSnapshot;
use mlflow_csrf::{
    CsrfInterceptor, HttpClient, HttpClientConfig, Request, RequestLogger, CSRF_COOKIE_NAME,
    CSRF_HEADER_NAME,
};
use reqwest::Method;
use url::Url;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mlflow_csrf=info".parse().unwrap()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    match args[1].as_str() {
        "token" => {
            if args.len() < 3 {
                eprintln!("Usage: mlflow-csrf token <cookie-string>");
                return ExitCode::from(1);
            }
            show_token(&args[2])
        }
        "fetch" => {
            if args.len() < 3 {
                eprintln!("Usage: mlflow-csrf fetch <url> [cookie-string]");
                return ExitCode::from(1);
            }
            match fetch_url(&args[2], args.get(3).map(String::as_str)).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    ExitCode::from(1)
                }
            }
        }
        "--help" | "-h" | "help" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "--version" | "-v" | "version" => {
            println!("mlflow-csrf {}", mlflow_csrf::VERSION);
            ExitCode::SUCCESS
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"mlflow-csrf - CSRF token forwarding for MLflow clients

USAGE:
    mlflow-csrf <COMMAND> [OPTIONS]

COMMANDS:
    token <cookie-string>          Show the header the CSRF hook would attach
    fetch <url> [cookie-string]    GET a URL with the CSRF hook installed
    help                           Show this help message
    version                        Show version information

ENVIRONMENT:
    MLFLOW_TRACKING_URI            Tracking server; enables host credentials
    MLFLOW_TRACKING_TOKEN          Bearer token for the tracking server
    MLFLOW_TRACKING_USERNAME       Basic auth username
    MLFLOW_TRACKING_PASSWORD       Basic auth password
    MLFLOW_TRACKING_INSECURE_TLS   "true" to skip TLS verification

EXAMPLES:
    mlflow-csrf token "mlflow-csrf-token=abc123; other=1"
    mlflow-csrf fetch http://localhost:5000/ajax-api/2.0/mlflow/experiments/search "mlflow-csrf-token=abc123"
"#
    );
}

fn show_token(cookies: &str) -> ExitCode {
    let hook = CsrfInterceptor::new(CookieSnapshot::from(cookies));

    match hook.token(None) {
        Some(token) => println!("{}: {}", CSRF_HEADER_NAME, token),
        None => println!("No {} cookie, no {} header", CSRF_COOKIE_NAME, CSRF_HEADER_NAME),
    }

    ExitCode::SUCCESS
}

async fn fetch_url(url: &str, cookies: Option<&str>) -> anyhow::Result<()> {
    let target = Url::parse(url).with_context(|| format!("invalid URL '{}'", url))?;

    let client = match HostCredsProviderChain::from_env().host_creds() {
        Ok(creds) if creds.is_same_origin(&target) => {
            HttpClient::with_host_creds(HttpClientConfig::default(), &creds)?
        }
        Ok(_) | Err(_) => HttpClient::new()?,
    };

    if let Some(cookies) = cookies {
        client
            .cookie_jar()
            .add_cookie_string(cookies, target.host_str().unwrap_or(""));
    }

    client.install_csrf();
    client.add_interceptor(RequestLogger::default());

    let request = client.prepare(Request::from_url(Method::GET, target));
    let attached = request.headers.contains_key(CSRF_HEADER_NAME);

    println!("Fetching: {}", request.url);
    let response = client.send_prepared(request).await?;

    println!("\n=== Response ===");
    println!("Status: {}", response.status);
    println!("URL: {}", response.url);
    println!("Content-Type: {:?}", response.header("content-type"));
    println!("Size: {} bytes", response.body.len());
    println!("Time: {}ms", response.response_time_ms);
    println!(
        "{}: {}",
        CSRF_HEADER_NAME,
        if attached { "sent" } else { "not sent" }
    );

    Ok(())
}
