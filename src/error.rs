// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Errors raised around the CSRF hook
//!
//! The hook itself never fails. Only transport, URL handling and host
//! credential resolution can.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Header name or value rejected by `http`
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Response body is not UTF-8: {0}")]
    Body(#[from] std::string::FromUtf8Error),

    /// No host credentials could be resolved
    #[error("Unable to load MLflow host credentials: {reason}")]
    Credentials {
        reason: String,
        /// One message per provider that failed, in chain order
        providers: Vec<String>,
    },
}

impl Error {
    pub fn invalid_header(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidHeader {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Credentials error without provider detail
    pub fn credentials(reason: impl Into<String>) -> Self {
        Error::Credentials {
            reason: reason.into(),
            providers: Vec::new(),
        }
    }
}
