// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP layer for Helicon
//!
//! A thin transport over reqwest that surfaces status, headers and the raw
//! `Set-Cookie` lines in the order the server sent them, plus the cookie
//! model used to parse and replay those lines.

mod client;
mod cookie;
mod request;
mod response;

pub use client::{HttpClient, HttpClientConfig};
pub use cookie::{Cookie, CookieJar};
pub use request::Request;
pub use response::Response;

/// Default user agent string (Chrome on macOS)
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36";

/// HTTP header names used against the Service
pub mod headers {
    pub const ACCEPT: &str = "accept";
    pub const AUTHORIZATION: &str = "authorization";
    pub const CONTENT_TYPE: &str = "content-type";
    pub const COOKIE: &str = "cookie";
    pub const SET_COOKIE: &str = "set-cookie";
    pub const USER_AGENT: &str = "user-agent";
    pub const X_CSRF_TOKEN: &str = "x-csrf-token";
    pub const X_GUEST_TOKEN: &str = "x-guest-token";
    pub const X_TWITTER_ACTIVE_USER: &str = "x-twitter-active-user";
    pub const X_TWITTER_AUTH_TYPE: &str = "x-twitter-auth-type";
    pub const X_TWITTER_CLIENT_LANGUAGE: &str = "x-twitter-client-language";
}
