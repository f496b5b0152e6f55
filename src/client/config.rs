// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Client configuration

use std::fmt;
use std::time::Duration;

use tracing::warn;

use crate::error::{Error, Result};
use crate::http::DEFAULT_USER_AGENT;

/// Environment variable holding the account username
pub const ENV_USERNAME: &str = "HELICON_USERNAME";
/// Environment variable holding the account password
pub const ENV_PASSWORD: &str = "HELICON_PASSWORD";
/// Environment variable forcing a fresh login
pub const ENV_FORCE_LOGIN: &str = "HELICON_FORCE_LOGIN";
/// Environment variable overriding the user agent
pub const ENV_USER_AGENT: &str = "HELICON_USER_AGENT";

/// Service endpoints
///
/// Defaults point at the live Service. Tests swap them for a mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Login landing page, scraped for the main script and guest token
    pub login_page: String,
    /// Origin serving the web client bundles
    pub script_host: String,
    /// Onboarding task endpoint
    pub onboarding_task: String,
    /// Origin for GraphQL API calls
    pub api_host: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login_page: "https://x.com/i/flow/login/".to_string(),
            script_host: "https://abs.twimg.com".to_string(),
            onboarding_task: "https://api.x.com/1.1/onboarding/task.json".to_string(),
            api_host: "https://x.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Every endpoint on one origin, with the Service's paths
    pub fn with_base(base: impl AsRef<str>) -> Self {
        let base = base.as_ref().trim_end_matches('/');
        Self {
            login_page: format!("{}/i/flow/login/", base),
            script_host: base.to_string(),
            onboarding_task: format!("{}/1.1/onboarding/task.json", base),
            api_host: base.to_string(),
        }
    }
}

/// Client configuration
#[derive(Clone)]
pub struct Config {
    /// Account username, also the secret store account
    pub username: String,
    /// Account password, never persisted
    pub password: String,
    /// User agent; `None` uses [`DEFAULT_USER_AGENT`]
    pub user_agent: Option<String>,
    /// Log in even if stored credentials load
    pub force_login: bool,
    /// Service endpoints
    pub endpoints: Endpoints,
    /// Timeout for each scrape GET (landing page, bundles, challenge script)
    pub scrape_timeout: Duration,
    /// Hard limit on one challenge evaluation
    pub challenge_timeout: Duration,
    /// How long the challenge may go without publishing its result
    pub challenge_wait: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            user_agent: None,
            force_login: false,
            endpoints: Endpoints::default(),
            scrape_timeout: Duration::from_secs(10),
            challenge_timeout: Duration::from_secs(30),
            challenge_wait: Duration::from_secs(5),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("force_login", &self.force_login)
            .field("endpoints", &self.endpoints)
            .field("scrape_timeout", &self.scrape_timeout)
            .field("challenge_timeout", &self.challenge_timeout)
            .field("challenge_wait", &self.challenge_wait)
            .finish()
    }
}

impl Config {
    /// Create a config for an account
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    /// Read configuration from `HELICON_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = lookup(ENV_USERNAME).unwrap_or_default();
        if username.is_empty() {
            return Err(Error::config(format!(
                "{} environment variable not set, cannot proceed",
                ENV_USERNAME
            )));
        }
        let password = lookup(ENV_PASSWORD).unwrap_or_default();
        if password.is_empty() {
            return Err(Error::config(format!(
                "{} environment variable not set, cannot proceed",
                ENV_PASSWORD
            )));
        }

        let force_login = match lookup(ENV_FORCE_LOGIN).filter(|v| !v.is_empty()) {
            None => false,
            Some(raw) => parse_bool(&raw).unwrap_or_else(|| {
                warn!(received = %raw, "invalid {}, expected bool, defaulting to false", ENV_FORCE_LOGIN);
                false
            }),
        };

        let user_agent = lookup(ENV_USER_AGENT).filter(|v| !v.is_empty());

        Ok(Self {
            user_agent,
            force_login,
            ..Self::new(username, password)
        })
    }

    /// Set user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Force a fresh login
    pub fn force_login(mut self, force: bool) -> Self {
        self.force_login = force;
        self
    }

    /// Set endpoints
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Set scrape timeout
    pub fn scrape_timeout(mut self, timeout: Duration) -> Self {
        self.scrape_timeout = timeout;
        self
    }

    /// Set challenge evaluation timeout
    pub fn challenge_timeout(mut self, timeout: Duration) -> Self {
        self.challenge_timeout = timeout;
        self
    }

    /// Set challenge publish wait
    pub fn challenge_wait(mut self, wait: Duration) -> Self {
        self.challenge_wait = wait;
        self
    }

    /// The user agent in effect
    pub fn effective_user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Check required fields
    pub fn validate(&self) -> Result<()> {
        if self.username.is_empty() {
            return Err(Error::config("username is required"));
        }
        if self.password.is_empty() {
            return Err(Error::config("password is required"));
        }
        Ok(())
    }
}

/// Accepts the usual spellings: 1/0, t/f, true/false in any common case
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
