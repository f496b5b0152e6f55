// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Session credentials issued by a completed login

use crate::error::Result;
use crate::http::Cookie;

use super::store::StoredTokens;

/// Everything an authenticated request needs
///
/// `csrf_token` is the `ct0` cookie, echoed as `X-Csrf-Token`. The bearer
/// is the anonymous one scraped from the web client, not a user token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    /// `ct0` cookie
    pub csrf_token: Cookie,
    /// `auth_token` cookie
    pub auth_token: Cookie,
    /// Anonymous bearer, `Bearer ` prefix included
    pub bearer_token: String,
}

impl SessionCredentials {
    /// Build from raw `Set-Cookie` lines and a bearer
    pub fn from_raw(csrf_raw: &str, auth_raw: &str, bearer_token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            csrf_token: Cookie::parse(csrf_raw)?,
            auth_token: Cookie::parse(auth_raw)?,
            bearer_token: bearer_token.into(),
        })
    }

    /// Rebuild from a decoded store blob
    pub fn from_stored(tokens: &StoredTokens) -> Result<Self> {
        Self::from_raw(&tokens.csrf_raw, &tokens.auth_raw, tokens.bearer.clone())
    }

    /// Fields in store order
    pub fn to_stored(&self) -> StoredTokens {
        StoredTokens {
            csrf_raw: self.csrf_token.raw.clone(),
            auth_raw: self.auth_token.raw.clone(),
            bearer: self.bearer_token.clone(),
        }
    }

    /// All three credentials are present
    pub fn is_complete(&self) -> bool {
        !self.csrf_token.value.is_empty()
            && !self.auth_token.value.is_empty()
            && self.bearer_token.starts_with("Bearer ")
    }

    /// Either session cookie has passed its `Expires`
    pub fn is_expired(&self) -> bool {
        self.csrf_token.is_expired() || self.auth_token.is_expired()
    }

    /// `Cookie` header for authenticated API requests
    pub fn cookie_header(&self) -> String {
        format!(
            "auth_token={}; ct0={}",
            self.auth_token.value, self.csrf_token.value
        )
    }
}
