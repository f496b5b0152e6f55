// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Client facade: configuration, authentication and API calls

mod config;
mod helicon;
pub mod tweet_detail;

pub use config::{Config, Endpoints, ENV_FORCE_LOGIN, ENV_PASSWORD, ENV_USERNAME, ENV_USER_AGENT};
pub use helicon::Helicon;
pub use tweet_detail::{TweetDetailRequest, QUERY_ID};
