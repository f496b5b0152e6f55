// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Credential persistence in the OS secret store
//!
//! The stored value is one base64 blob holding three fields separated by
//! the ASCII unit separator (0x1F): the raw `ct0` line, the raw
//! `auth_token` line and the anonymous bearer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use keyring::Entry;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Service name every credential is filed under
pub const SERVICE: &str = "helicon";

/// Field separator inside the decoded blob
pub const SEPARATOR: char = '\u{1F}';

/// The three persisted fields, in blob order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTokens {
    /// Raw `Set-Cookie` line for `ct0`
    pub csrf_raw: String,
    /// Raw `Set-Cookie` line for `auth_token`
    pub auth_raw: String,
    /// Anonymous bearer, `Bearer ` prefix included
    pub bearer: String,
}

impl StoredTokens {
    /// Encode into the stored blob
    pub fn encode(&self) -> Result<String> {
        for (name, field) in [
            ("csrf token", &self.csrf_raw),
            ("auth token", &self.auth_raw),
            ("bearer token", &self.bearer),
        ] {
            if field.contains(SEPARATOR) {
                return Err(Error::store(format!(
                    "{} contains the 0x1F separator and cannot be stored",
                    name
                )));
            }
        }
        let joined = [
            self.csrf_raw.as_str(),
            self.auth_raw.as_str(),
            self.bearer.as_str(),
        ]
        .join(&SEPARATOR.to_string());
        Ok(STANDARD.encode(joined))
    }

    /// Decode a stored blob
    pub fn decode(blob: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(blob.trim())
            .map_err(|e| Error::corrupt_blob(format!("failed to decode tokens: {}", e)))?;
        let joined = String::from_utf8(bytes)
            .map_err(|e| Error::corrupt_blob(format!("tokens are not UTF-8: {}", e)))?;

        let parts: Vec<&str> = joined.split(SEPARATOR).collect();
        match parts.as_slice() {
            [csrf, auth, bearer] => Ok(Self {
                csrf_raw: csrf.to_string(),
                auth_raw: auth.to_string(),
                bearer: bearer.to_string(),
            }),
            _ => Err(Error::corrupt_blob(format!(
                "expected 3 parts, got {}",
                parts.len()
            ))),
        }
    }
}

/// Secret store keyed by service and account
pub trait SecretStore: Send + Sync {
    /// Save a blob, overwriting any previous value
    fn save(&self, service: &str, account: &str, blob: &str) -> Result<()>;

    /// Load a blob
    fn load(&self, service: &str, account: &str) -> Result<String>;
}

/// OS keychain via the `keyring` crate
///
/// macOS Keychain, Windows Credential Manager or the Secret Service on Linux.
#[derive(Debug, Clone, Default)]
pub struct KeyringStore;

impl KeyringStore {
    /// Create a new keyring store
    pub fn new() -> Self {
        Self
    }

    fn entry(service: &str, account: &str) -> Result<Entry> {
        Entry::new(service, account).map_err(|e| Error::store(e.to_string()))
    }
}

impl SecretStore for KeyringStore {
    fn save(&self, service: &str, account: &str, blob: &str) -> Result<()> {
        let entry = Self::entry(service, account)?;
        entry.set_password(blob).map_err(|e| {
            warn!(service = %service, account = %account, error = %e, "failed to save tokens");
            Error::store(format!(
                "failed to save tokens under service {} with username {}: {}",
                service, account, e
            ))
        })?;
        debug!(service = %service, account = %account, "tokens saved");
        Ok(())
    }

    fn load(&self, service: &str, account: &str) -> Result<String> {
        let entry = Self::entry(service, account)?;
        match entry.get_password() {
            Ok(blob) => {
                debug!(service = %service, account = %account, "tokens found");
                Ok(blob)
            }
            Err(keyring::Error::NoEntry) => {
                debug!(service = %service, account = %account, "no stored tokens");
                Err(Error::store(format!(
                    "no tokens under service {} with username {}",
                    service, account
                )))
            }
            Err(e) => Err(Error::store(format!(
                "failed to get tokens under service {} with username {}: {}",
                service, account, e
            ))),
        }
    }
}

/// Process-local store, for tests and for callers that manage persistence themselves
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<(String, String), String>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a blob in place without counting it as a save
    pub fn seed(&self, service: &str, account: &str, blob: impl Into<String>) {
        self.entries
            .write()
            .insert((service.to_string(), account.to_string()), blob.into());
    }

    /// Read a blob without going through the trait
    pub fn get(&self, service: &str, account: &str) -> Option<String> {
        self.entries
            .read()
            .get(&(service.to_string(), account.to_string()))
            .cloned()
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl SecretStore for MemoryStore {
    fn save(&self, service: &str, account: &str, blob: &str) -> Result<()> {
        self.seed(service, account, blob);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load(&self, service: &str, account: &str) -> Result<String> {
        self.get(service, account).ok_or_else(|| {
            Error::store(format!(
                "no tokens under service {} with username {}",
                service, account
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> StoredTokens {
        StoredTokens {
            csrf_raw: "ct0=C; Max-Age=21600; Path=/; Domain=.x.com; Secure".to_string(),
            auth_raw: "auth_token=A; Path=/; Domain=.x.com; Secure; HttpOnly".to_string(),
            bearer: "Bearer AAAA".to_string(),
        }
    }

    #[test]
    fn test_blob_round_trip() {
        let original = tokens();
        let blob = original.encode().unwrap();
        assert_eq!(StoredTokens::decode(&blob).unwrap(), original);
    }

    #[test]
    fn test_blob_round_trip_table() {
        let cases = [
            ("", "", ""),
            ("ct0=", "auth_token=", "Bearer "),
            ("ct0=ü€; Path=/", "auth_token=日本; Path=/", "Bearer ÄÖ%3D"),
            ("ct0==;=;; a=b=c", ";;;", "Bearer a=b;c=d%3D%3D"),
            (" ct0=C ; ", "\tauth_token=A", "Bearer\nAAAA"),
        ];
        for (csrf, auth, bearer) in cases {
            let original = StoredTokens {
                csrf_raw: csrf.to_string(),
                auth_raw: auth.to_string(),
                bearer: bearer.to_string(),
            };
            let blob = original.encode().unwrap();
            assert_eq!(StoredTokens::decode(&blob).unwrap(), original, "{:?}", original);
        }
    }

    #[test]
    fn test_blob_layout() {
        let blob = tokens().encode().unwrap();
        let decoded = String::from_utf8(STANDARD.decode(blob).unwrap()).unwrap();
        assert_eq!(
            decoded,
            "ct0=C; Max-Age=21600; Path=/; Domain=.x.com; Secure\u{1F}auth_token=A; Path=/; Domain=.x.com; Secure; HttpOnly\u{1F}Bearer AAAA"
        );
    }

    #[test]
    fn test_decode_wrong_part_count() {
        for raw in ["only-one-part", "a\u{1F}b", "a\u{1F}b\u{1F}c\u{1F}d"] {
            let blob = STANDARD.encode(raw);
            let err = StoredTokens::decode(&blob).unwrap_err();
            assert!(matches!(err, Error::CorruptBlob(_)), "{}", raw);
        }
    }

    #[test]
    fn test_decode_invalid_base64() {
        let err = StoredTokens::decode("!!not base64!!").unwrap_err();
        assert!(matches!(err, Error::CorruptBlob(_)));
    }

    #[test]
    fn test_separator_in_field_rejected() {
        let mut bad = tokens();
        bad.bearer = "Bearer A\u{1F}B".to_string();
        assert!(matches!(bad.encode().unwrap_err(), Error::Store(_)));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(store.load(SERVICE, "alice").is_err());

        store.save(SERVICE, "alice", "blob").unwrap();
        assert_eq!(store.load(SERVICE, "alice").unwrap(), "blob");
        assert!(store.load(SERVICE, "bob").is_err());
        assert_eq!(store.save_count(), 1);
    }
}
