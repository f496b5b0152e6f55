// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # Helicon - Unofficial X Client
//!
//! Logs a user into X the way the web client does and issues authenticated
//! GraphQL GETs with the resulting session.
//!
//! ## Features
//!
//! - Anonymous bearer and guest token scraped from the web client
//! - JS instrumentation challenge solved in an embedded boa engine, no Chrome
//! - Onboarding login flow with explicit cookie accumulation
//! - Session stored in the OS keyring and reused across runs
//! - Manual anonymous bearer refresh for 401 recovery
//!
//! ## Example
//!
//! ```rust,no_run
//! use helicon::{Config, Helicon};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let helicon = Helicon::new(Config::from_env()?)?;
//!     helicon.authenticate().await?;
//!
//!     let detail = helicon.tweet_detail("20").await?;
//!     println!("{}", detail);
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod js;

// Re-exports for convenience

// Client
pub use client::{Config, Endpoints, Helicon, TweetDetailRequest};

// Auth
pub use auth::{
    FlowState, FrontendScraper, KeyringStore, LoginFlow, MemoryStore, SecretStore,
    SessionCredentials, StoredTokens,
};

// Errors
pub use error::{Error, LoginStage, Result};

// HTTP
pub use http::{Cookie, CookieJar, HttpClient, Request, Response, DEFAULT_USER_AGENT};

// JavaScript
pub use js::{BoaHost, BoaHostConfig, ScriptHost};

/// Helicon version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
