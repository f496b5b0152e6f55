// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for Helicon
//!
//! One error enum for the whole crate. Login failures carry the stage that
//! failed along with the HTTP status and raw body so the caller can see
//! exactly what the Service answered.

use std::fmt;

use thiserror::Error;

/// Result type alias for Helicon operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stage of the login flow an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStage {
    /// Flow start (`flow_name=login`)
    Start,
    /// JS instrumentation submission
    Challenge,
    /// Username submission
    Username,
    /// Password submission
    Password,
    /// Session cookie harvest after the password step
    SessionCookies,
}

impl fmt::Display for LoginStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoginStage::Start => "start",
            LoginStage::Challenge => "js challenge",
            LoginStage::Username => "username",
            LoginStage::Password => "password",
            LoginStage::SessionCookies => "session cookies",
        };
        f.write_str(name)
    }
}

/// Main error type for Helicon
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O, DNS or TLS failure while talking to the Service
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The Service's front-end no longer matches the scrape patterns
    #[error("Scrape error: {reason}")]
    Scrape { reason: String, url: Option<String> },

    /// JS instrumentation challenge could not be solved
    #[error("Challenge error: {0}")]
    Challenge(String),

    /// Operation exceeded its deadline
    #[error("Operation timed out after {duration_ms}ms: {operation}")]
    Timeout { operation: String, duration_ms: u64 },

    /// Onboarding endpoint rejected a step, or no session was issued
    #[error("Login failed at {stage}: {reason}")]
    Login {
        stage: LoginStage,
        reason: String,
        status: Option<u16>,
        body: Option<String>,
    },

    /// Secret store unavailable or refused the operation
    #[error("Secret store error: {0}")]
    Store(String),

    /// Stored credential blob exists but is malformed
    #[error("Corrupt credential blob: {0}")]
    CorruptBlob(String),

    /// A Set-Cookie line could not be parsed
    #[error("Cookie parse error in '{raw}': {reason}")]
    CookieParse { raw: String, reason: String },

    /// Authenticated API request returned a non-200 status
    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create a scrape error
    pub fn scrape<S: Into<String>>(reason: S) -> Self {
        Error::Scrape {
            reason: reason.into(),
            url: None,
        }
    }

    /// Create a scrape error tied to the URL that was scraped
    pub fn scrape_at(reason: impl Into<String>, url: impl Into<String>) -> Self {
        Error::Scrape {
            reason: reason.into(),
            url: Some(url.into()),
        }
    }

    /// Create a challenge error
    pub fn challenge<S: Into<String>>(msg: S) -> Self {
        Error::Challenge(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration_ms: u64) -> Self {
        Error::Timeout {
            operation: operation.into(),
            duration_ms,
        }
    }

    /// Create a login error without HTTP context
    pub fn login(stage: LoginStage, reason: impl Into<String>) -> Self {
        Error::Login {
            stage,
            reason: reason.into(),
            status: None,
            body: None,
        }
    }

    /// Create a login error from a rejected onboarding response
    pub fn login_rejected(stage: LoginStage, status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Error::Login {
            stage,
            reason: format!("unexpected status {}, raw body: {}", status, body),
            status: Some(status),
            body: Some(body),
        }
    }

    /// Create a secret store error
    pub fn store<S: Into<String>>(msg: S) -> Self {
        Error::Store(msg.into())
    }

    /// Create a corrupt blob error
    pub fn corrupt_blob<S: Into<String>>(msg: S) -> Self {
        Error::CorruptBlob(msg.into())
    }

    /// Create a cookie parse error
    pub fn cookie_parse(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::CookieParse {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    /// Create an API error
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Error::Api {
            status,
            body: body.into(),
        }
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Check if the caller may retry the same operation
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Timeout { .. } | Error::Transport(_))
    }

    /// Check if the Service answered 401
    ///
    /// For API calls this usually means the anonymous bearer went stale.
    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == Some(401)
    }

    /// Check if a stored session should be discarded in favour of a fresh login
    pub fn is_stale_session(&self) -> bool {
        matches!(
            self,
            Error::Store(_) | Error::CorruptBlob(_) | Error::CookieParse { .. }
        )
    }

    /// Get HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Login { status, .. } => *status,
            Error::Api { status, .. } => Some(*status),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Get the login stage if this is a login error
    pub fn stage(&self) -> Option<LoginStage> {
        match self {
            Error::Login { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Get the raw response body if one was captured
    pub fn body(&self) -> Option<&str> {
        match self {
            Error::Login { body, .. } => body.as_deref(),
            Error::Api { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Helper trait for annotating errors with the login stage they broke
pub trait StageContext<T> {
    /// Tag a non-login error with the failing stage
    fn at_stage(self, stage: LoginStage) -> Result<T>;
}

impl<T> StageContext<T> for Result<T> {
    fn at_stage(self, stage: LoginStage) -> Result<T> {
        self.map_err(|err| match err {
            Error::Serialization(e) => Error::Login {
                stage,
                reason: format!("failed to decode onboarding response: {}", e),
                status: None,
                body: None,
            },
            other => other,
        })
    }
}
