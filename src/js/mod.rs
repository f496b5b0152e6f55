// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! JavaScript host for the instrumentation challenge
//!
//! The login flow only needs one thing from a JS engine: run a script in
//! something that looks like a blank browser page and return what it wrote
//! into the `ui_metrics` field. [`ScriptHost`] is that seam; [`BoaHost`]
//! is the shipped implementation on top of boa_engine.

mod dom;
mod runtime;
mod timers;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use runtime::{run_challenge, BoaHost, BoaHostConfig};
pub use timers::{TimerEntry, TimerQueue};

/// Evaluates an instrumentation script and returns the captured payload
#[async_trait]
pub trait ScriptHost: Send + Sync {
    /// Run `script` as `user_agent`, giving up after `timeout`
    ///
    /// Returns the exact string the script assigned to
    /// `document.getElementsByName('ui_metrics')[0].value`.
    async fn evaluate(&self, script: &str, user_agent: &str, timeout: Duration) -> Result<String>;
}
