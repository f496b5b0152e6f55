// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Authentication against the Service
//!
//! Scraping the anonymous bearer and guest token, solving the JS
//! instrumentation challenge, the onboarding login flow, and persistence
//! of the resulting session.

pub mod challenge;
pub mod flow;
pub mod scrape;
pub mod session;
pub mod store;

pub use challenge::ChallengeSolver;
pub use flow::{FlowState, LoginFlow, SessionCookies, Subtask, TaskResponse};
pub use scrape::{anonymous_bearer, guest_token, Bootstrap, FrontendScraper};
pub use session::SessionCredentials;
pub use store::{KeyringStore, MemoryStore, SecretStore, StoredTokens, SERVICE};
