// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! JS instrumentation challenge solving

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::js::ScriptHost;

/// Fetches an instrumentation script and runs it through a [`ScriptHost`]
#[derive(Clone)]
pub struct ChallengeSolver {
    http: HttpClient,
    host: Arc<dyn ScriptHost>,
    user_agent: String,
    fetch_timeout: Duration,
    eval_timeout: Duration,
}

impl ChallengeSolver {
    /// Create a solver
    pub fn new(
        http: HttpClient,
        host: Arc<dyn ScriptHost>,
        user_agent: impl Into<String>,
        fetch_timeout: Duration,
        eval_timeout: Duration,
    ) -> Self {
        Self {
            http,
            host,
            user_agent: user_agent.into(),
            fetch_timeout,
            eval_timeout,
        }
    }

    /// Fetch the script at `script_url`
    pub async fn fetch_script(&self, script_url: &str) -> Result<String> {
        let script = self
            .http
            .fetch_text(script_url, self.fetch_timeout)
            .await
            .map_err(|e| match e {
                Error::Scrape { reason, .. } => Error::challenge(format!(
                    "failed to fetch instrumentation script {}: {}",
                    script_url, reason
                )),
                other => other,
            })?;
        debug!(url = %script_url, bytes = script.len(), "instrumentation script fetched");
        Ok(script)
    }

    /// Fetch, evaluate and return the exact payload the script published
    pub async fn solve(&self, script_url: &str) -> Result<String> {
        let script = self.fetch_script(script_url).await?;
        let payload = self.solve_source(&script).await?;
        info!(bytes = payload.len(), "instrumentation challenge solved");
        Ok(payload)
    }

    /// Evaluate an already fetched script
    pub async fn solve_source(&self, script: &str) -> Result<String> {
        let payload = self
            .host
            .evaluate(script, &self.user_agent, self.eval_timeout)
            .await?;

        if payload.is_empty() {
            return Err(Error::challenge("script evaluation returned an empty string"));
        }
        // The payload is forwarded verbatim; it only has to be valid JSON.
        serde_json::from_str::<serde_json::Value>(&payload)
            .map_err(|e| Error::challenge(format!("challenge payload is not JSON: {}", e)))?;
        Ok(payload)
    }
}
