// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Front-end scraping: main bundle URL, anonymous bearer, guest token

use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};

use crate::client::Endpoints;
use crate::error::{Error, Result};
use crate::http::HttpClient;

lazy_static! {
    /// Quoted bearer literal of bounded length
    static ref BEARER_QUOTED: Regex =
        Regex::new(r#""(Bearer [^"\s]{1,256})""#).expect("bearer pattern is valid");
    /// Anything from `Bearer` to the next quote or end of input
    static ref BEARER_LOOSE: Regex =
        Regex::new(r#"Bearer.*?(?:"|\z)"#).expect("loose bearer pattern is valid");
    static ref GUEST_TOKEN: Regex =
        Regex::new(r#"document\.cookie="gt=([0-9]+)"#).expect("guest token pattern is valid");
}

/// What the login landing page yields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bootstrap {
    /// Anonymous bearer, `Bearer ` prefix included
    pub anonymous_bearer: String,
    /// Guest token digits
    pub guest_token: String,
}

/// Extract the anonymous bearer from a client bundle
///
/// The last quoted `"Bearer …"` literal wins; earlier hits are usually
/// constructor fragments. Falls back to the loose pattern when the bundle
/// has no quoted literal at all.
pub fn anonymous_bearer(bundle: &str) -> Result<String> {
    let quoted = BEARER_QUOTED
        .captures_iter(bundle)
        .last()
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    let bearer = match quoted {
        Some(bearer) => bearer,
        None => BEARER_LOOSE
            .find_iter(bundle)
            .last()
            .map(|m| m.as_str().trim_matches('"').to_string())
            .ok_or_else(|| Error::scrape("no Bearer literal in main script"))?,
    };

    if !bearer.starts_with("Bearer ") || bearer.len() <= "Bearer ".len() {
        return Err(Error::scrape(format!(
            "bearer literal has unexpected shape ({} bytes)",
            bearer.len()
        )));
    }
    Ok(bearer)
}

/// Extract the guest token the landing page seeds via `document.cookie`
pub fn guest_token(html: &str) -> Result<String> {
    GUEST_TOKEN
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::scrape("guest token not found in login page"))
}

/// Scraper for the Service's web client
pub struct FrontendScraper {
    http: HttpClient,
    login_page: String,
    timeout: Duration,
    legacy_pattern: Regex,
    modern_pattern: Regex,
}

impl FrontendScraper {
    /// Create a scraper for the given endpoints
    pub fn new(http: HttpClient, endpoints: &Endpoints, timeout: Duration) -> Result<Self> {
        let host = regex::escape(endpoints.script_host.trim_end_matches('/'));
        let pattern = |flavour: &str| {
            Regex::new(&format!(
                r#"src=["']({}/responsive-web/{}/main\.[\w.-]+\.js)["']"#,
                host, flavour
            ))
            .map_err(|e| Error::config(format!("invalid script host pattern: {}", e)))
        };

        Ok(Self {
            http,
            login_page: endpoints.login_page.clone(),
            timeout,
            legacy_pattern: pattern("client-web-legacy")?,
            modern_pattern: pattern("client-web")?,
        })
    }

    /// Locate the main client bundle in the landing page HTML
    ///
    /// The legacy bundle is preferred; the modern one is the fallback.
    pub fn main_script_url(&self, html: &str) -> Result<String> {
        self.legacy_pattern
            .captures(html)
            .or_else(|| self.modern_pattern.captures(html))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| Error::scrape_at("main script not located", self.login_page.clone()))
    }

    /// Fetch the login landing page
    pub async fn landing_page(&self) -> Result<String> {
        let html = self.http.fetch_text(&self.login_page, self.timeout).await?;
        debug!(bytes = html.len(), "login page fetched");
        Ok(html)
    }

    /// Fetch the landing page and return the main bundle URL
    pub async fn find_main_script_url(&self) -> Result<String> {
        let html = self.landing_page().await?;
        self.main_script_url(&html)
    }

    /// Scrape the anonymous bearer from the main bundle
    pub async fn find_anonymous_bearer(&self) -> Result<String> {
        let url = self.find_main_script_url().await?;
        self.bearer_from_bundle(&url).await
    }

    /// Fetch the landing page and return the guest token
    pub async fn find_guest_token(&self) -> Result<String> {
        let html = self.landing_page().await?;
        guest_token(&html)
    }

    /// Bearer and guest token from a single landing page fetch
    pub async fn bootstrap(&self) -> Result<Bootstrap> {
        let html = self.landing_page().await?;
        let url = self.main_script_url(&html)?;
        let guest_token = guest_token(&html)?;
        let anonymous_bearer = self.bearer_from_bundle(&url).await?;
        info!(guest_token_len = guest_token.len(), "anonymous bearer and guest token scraped");
        Ok(Bootstrap {
            anonymous_bearer,
            guest_token,
        })
    }

    async fn bearer_from_bundle(&self, url: &str) -> Result<String> {
        let bundle = self.http.fetch_text(url, self.timeout).await?;
        debug!(url = %url, bytes = bundle.len(), "main script fetched");
        anonymous_bearer(&bundle).map_err(|e| match e {
            Error::Scrape { reason, .. } => Error::scrape_at(reason, url),
            other => other,
        })
    }
}
