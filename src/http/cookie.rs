// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Cookie model and the ordered jar used during onboarding

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// RFC 1123 past the weekday, without the zone, which is always GMT on the wire
const RFC1123_NAIVE: &str = "%d %b %Y %H:%M:%S";

/// RFC 1123 past the weekday, with a numeric zone offset
const RFC1123Z: &str = "%d %b %Y %H:%M:%S %z";

/// A single `Set-Cookie` line
///
/// `raw` is what gets persisted; everything else is derived from it by
/// [`Cookie::parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// The verbatim `Set-Cookie` line
    pub raw: String,
    /// Cookie name
    pub key: String,
    /// Cookie value
    pub value: String,
    /// Max-Age in seconds
    pub max_age: Option<i64>,
    /// Expiration time (None = session cookie)
    pub expires: Option<DateTime<Utc>>,
    /// Path the cookie is valid for
    pub path: String,
    /// Domain the cookie belongs to
    pub domain: String,
    /// Secure flag (HTTPS only)
    pub secure: bool,
    /// HttpOnly flag, `None` when absent
    pub http_only: Option<bool>,
    /// Partitioned flag, `None` when absent
    pub partitioned: Option<bool>,
    /// SameSite attribute verbatim
    pub same_site: Option<String>,
}

impl Cookie {
    /// Parse a `Set-Cookie` line
    ///
    /// Attribute names are matched case-insensitively. The first segment
    /// that is not a known attribute becomes the key/value pair. An
    /// unparsable `Expires` or `Max-Age` rejects the whole line.
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let mut cookie = Cookie {
            raw: raw.clone(),
            ..Default::default()
        };
        let mut named = false;

        for segment in raw.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (name, value) = match segment.split_once('=') {
                Some((name, value)) => (name.trim(), value.trim()),
                None => (segment, ""),
            };

            match name.to_ascii_lowercase().as_str() {
                "expires" => {
                    cookie.expires = Some(
                        parse_expires(value).ok_or_else(|| {
                            Error::cookie_parse(&raw, format!("cannot parse Expires {}", value))
                        })?,
                    );
                }
                "max-age" => {
                    let seconds = value.parse::<i64>().map_err(|e| {
                        Error::cookie_parse(
                            &raw,
                            format!("cannot parse Max-Age {} as int: {}", value, e),
                        )
                    })?;
                    cookie.max_age = Some(seconds);
                }
                "path" => cookie.path = value.to_string(),
                "domain" => cookie.domain = value.to_string(),
                "secure" => cookie.secure = true,
                "httponly" => cookie.http_only = Some(true),
                "partitioned" => cookie.partitioned = Some(true),
                "samesite" => cookie.same_site = Some(value.to_string()),
                _ if !named => {
                    cookie.key = name.to_string();
                    cookie.value = value.to_string();
                    named = true;
                }
                _ => {}
            }
        }

        if !raw.trim().is_empty() && !named {
            return Err(Error::cookie_parse(&raw, "no name=value pair"));
        }

        Ok(cookie)
    }

    /// Name of the cookie a `Set-Cookie` line carries, without parsing attributes
    pub fn name_of(line: &str) -> &str {
        let first = line.split(';').next().unwrap_or_default();
        first.split_once('=').map_or(first, |(name, _)| name).trim()
    }

    /// Value of the cookie a `Set-Cookie` line carries, without parsing attributes
    pub fn value_of(line: &str) -> &str {
        let first = line.split(';').next().unwrap_or_default();
        first.split_once('=').map_or("", |(_, value)| value).trim()
    }

    /// Check if the cookie is expired
    pub fn is_expired(&self) -> bool {
        self.expires.map_or(false, |exp| exp < Utc::now())
    }

    /// Format as `key=value` for a `Cookie` header
    pub fn to_header_value(&self) -> String {
        format!("{}={}", self.key, self.value)
    }
}

fn parse_expires(value: &str) -> Option<DateTime<Utc>> {
    // The weekday is not checked against the date
    let value = value.split_once(", ").map_or(value, |(_, rest)| rest);
    let trimmed = value
        .strip_suffix(" GMT")
        .or_else(|| value.strip_suffix(" UTC"));
    if let Some(naive) = trimmed {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, RFC1123_NAIVE) {
            return Some(dt.and_utc());
        }
    }
    DateTime::parse_from_str(value, RFC1123Z)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Name-keyed cookie map that replays in insertion order
///
/// Replacing a value keeps the original position, so the outgoing header
/// order only depends on when a name was first seen.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    entries: Vec<(String, String)>,
}

impl CookieJar {
    /// Create an empty jar
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cookie value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Get a cookie value by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Check whether a cookie is known
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Cookie names in replay order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Number of cookies
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the jar is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build the `Cookie` request header
    pub fn header(&self) -> String {
        self.entries
            .iter()
            .map(|(n, v)| format!("{}={}", n, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const CT0: &str =
        "ct0=abc123; Max-Age=21600; Expires=Mon, 19 May 2025 00:42:35 GMT; Path=/; Domain=.x.com; Secure; SameSite=Lax";

    #[test]
    fn test_parse_fields() {
        let cookie = Cookie::parse(CT0).unwrap();
        assert_eq!(cookie.raw, CT0);
        assert_eq!(cookie.key, "ct0");
        assert_eq!(cookie.value, "abc123");
        assert_eq!(cookie.max_age, Some(21600));
        assert_eq!(
            cookie.expires,
            Some(Utc.with_ymd_and_hms(2025, 5, 19, 0, 42, 35).unwrap())
        );
        assert_eq!(cookie.path, "/");
        assert_eq!(cookie.domain, ".x.com");
        assert!(cookie.secure);
        assert_eq!(cookie.http_only, None);
        assert_eq!(cookie.partitioned, None);
        assert_eq!(cookie.same_site.as_deref(), Some("Lax"));
    }

    #[test]
    fn test_parse_fixture_table() {
        let cases: &[(&str, &str, &str, bool, Option<bool>, Option<bool>)] = &[
            ("auth_token=A; Path=/; Domain=.x.com; Secure; HttpOnly", "auth_token", "A", true, Some(true), None),
            ("__cf_bm=x.y-z; path=/; domain=.x.com; HttpOnly; Secure; SameSite=None", "__cf_bm", "x.y-z", true, Some(true), None),
            ("guest_id=v1%3A174; Max-Age=34214400; Path=/; Partitioned", "guest_id", "v1%3A174", false, None, Some(true)),
            ("att=1-abc==; Path=/", "att", "1-abc==", false, None, None),
        ];

        for (raw, key, value, secure, http_only, partitioned) in cases {
            let cookie = Cookie::parse(*raw).unwrap();
            assert_eq!(cookie.key, *key, "{}", raw);
            assert_eq!(cookie.value, *value, "{}", raw);
            assert_eq!(cookie.secure, *secure, "{}", raw);
            assert_eq!(cookie.http_only, *http_only, "{}", raw);
            assert_eq!(cookie.partitioned, *partitioned, "{}", raw);
        }
    }

    #[test]
    fn test_rfc1123_and_rfc1123z_agree() {
        let gmt = Cookie::parse("a=1; Expires=Mon, 19 May 2025 00:42:35 GMT").unwrap();
        let offset = Cookie::parse("a=1; Expires=Mon, 19 May 2025 02:42:35 +0200").unwrap();
        assert!(gmt.expires.is_some());
        assert_eq!(gmt.expires, offset.expires);
    }

    #[test]
    fn test_mismatched_weekday_is_accepted() {
        use chrono::TimeZone;

        let expected = Utc.with_ymd_and_hms(2025, 5, 19, 0, 42, 35).single();
        for raw in [
            "a=1; Expires=Tue, 19 May 2025 00:42:35 GMT",
            "a=1; Expires=Tue, 19 May 2025 00:42:35 +0000",
            "a=1; Expires=Sun, 19 May 2025 00:42:35 UTC",
        ] {
            let cookie = Cookie::parse(raw).unwrap();
            assert_eq!(cookie.expires, expected, "{}", raw);
        }
    }

    #[test]
    fn test_first_unknown_pair_wins() {
        let cookie = Cookie::parse("first=1; second=2; Path=/").unwrap();
        assert_eq!(cookie.key, "first");
        assert_eq!(cookie.value, "1");
    }

    #[test]
    fn test_attribute_names_case_insensitive() {
        let cookie = Cookie::parse("k=v; PATH=/a; DoMaIn=x.com; SECURE; max-AGE=5").unwrap();
        assert_eq!(cookie.path, "/a");
        assert_eq!(cookie.domain, "x.com");
        assert!(cookie.secure);
        assert_eq!(cookie.max_age, Some(5));
    }

    #[test]
    fn test_bad_expires_is_error() {
        let err = Cookie::parse("k=v; Expires=tomorrow").unwrap_err();
        assert!(matches!(err, Error::CookieParse { .. }));
    }

    #[test]
    fn test_bad_max_age_is_error() {
        let err = Cookie::parse("k=v; Max-Age=soon").unwrap_err();
        assert!(matches!(err, Error::CookieParse { .. }));
    }

    #[test]
    fn test_empty_raw_is_empty_cookie() {
        let cookie = Cookie::parse("").unwrap();
        assert!(cookie.key.is_empty());
        assert!(cookie.expires.is_none());
    }

    #[test]
    fn test_name_of() {
        assert_eq!(Cookie::name_of(CT0), "ct0");
        assert_eq!(Cookie::value_of(CT0), "abc123");
        assert_eq!(Cookie::name_of(" auth_token=A"), "auth_token");
        assert_eq!(Cookie::name_of("flag"), "flag");
    }

    #[test]
    fn test_is_expired() {
        let past = Cookie::parse("k=v; Expires=Thu, 01 Jan 2015 00:00:00 GMT").unwrap();
        assert!(past.is_expired());

        let future = Cookie::parse("k=v; Expires=Thu, 01 Jan 2099 00:00:00 GMT").unwrap();
        assert!(!future.is_expired());

        let session = Cookie::parse("k=v").unwrap();
        assert!(!session.is_expired());
    }

    #[test]
    fn test_jar_keeps_insertion_order() {
        let mut jar = CookieJar::new();
        jar.set("gt", "1");
        jar.set("att", "2");
        jar.set("guest_id", "3");
        jar.set("att", "4");

        assert_eq!(jar.header(), "gt=1; att=4; guest_id=3");
        assert_eq!(jar.get("att"), Some("4"));
        assert_eq!(jar.len(), 3);
        assert!(!jar.contains("__cf_bm"));
    }
}
