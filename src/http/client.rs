// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP client implementation

use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::Client;
use tracing::debug;

use super::request::Request;
use super::response::Response;
use super::DEFAULT_USER_AGENT;
use crate::error::{Error, Result};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// User agent string
    pub user_agent: String,
    /// Maximum same-host redirects to follow
    pub max_redirects: usize,
    /// Default headers
    pub default_headers: HeaderMap,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            "accept-language",
            HeaderValue::from_static("en-US,en;q=0.9"),
        );

        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: 10,
            default_headers,
        }
    }
}

/// HTTP transport
///
/// Cookies are never stored or replayed here. Every `Set-Cookie` line is
/// handed back untouched and callers decide what to keep.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .redirect(same_host_redirects(config.max_redirects))
            .default_headers(config.default_headers.clone())
            .build()?;

        Ok(Self { client, config })
    }

    /// Execute a GET request
    pub async fn get(&self, url: impl AsRef<str>) -> Result<Response> {
        self.execute(Request::get(url)?).await
    }

    /// Execute a POST request
    pub async fn post(&self, url: impl AsRef<str>, body: impl Into<Bytes>) -> Result<Response> {
        self.execute(Request::post(url)?.body(body)).await
    }

    /// Execute a GET and require a 200, returning the body as text
    ///
    /// Used for the scrape fetches where anything but 200 means the page
    /// is not what we expect.
    pub async fn fetch_text(&self, url: impl AsRef<str>, timeout: Duration) -> Result<String> {
        let response = self.execute(Request::get(url)?.timeout(timeout)).await?;
        if !response.is_ok() {
            return Err(Error::scrape_at(
                format!("unexpected status {}", response.status),
                response.url_str(),
            ));
        }
        response.text()
    }

    /// Execute a request
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let start = Instant::now();

        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers);

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(e, &request.method, &request.url, request.timeout))?;

        let redirected = response.url() != &request.url;
        let final_url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, &request.method, &request.url, request.timeout))?;
        let response_time = start.elapsed().as_millis() as u64;

        debug!(
            method = %request.method,
            url = %final_url,
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = response_time,
            "request complete"
        );

        Ok(Response::new(status, headers, body, final_url, redirected))
    }

    /// Get client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

/// Timeouts surface as `Error::Timeout` whether they hit while waiting for
/// headers or while reading the body
fn transport_error(
    e: reqwest::Error,
    method: &reqwest::Method,
    url: &url::Url,
    timeout: Option<Duration>,
) -> Error {
    if e.is_timeout() {
        let ms = timeout.map(|t| t.as_millis() as u64).unwrap_or_default();
        Error::timeout(format!("{} {}", method, url), ms)
    } else {
        Error::Transport(e)
    }
}

/// Follow redirects only while they stay on the same host
///
/// A cross-host hop is returned to the caller as the 3xx response itself.
fn same_host_redirects(max: usize) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() >= max {
            return attempt.error("too many redirects");
        }
        let same_host = attempt
            .previous()
            .last()
            .map(|prev| prev.host_str() == attempt.url().host_str())
            .unwrap_or(true);
        if same_host {
            attempt.follow()
        } else {
            attempt.stop()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_client_creation() {
        let client = HttpClient::new().unwrap();
        assert_eq!(client.config().user_agent, DEFAULT_USER_AGENT);
    }

    #[tokio::test]
    async fn test_set_cookie_lines_are_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "a=1; Path=/")
                    .append_header("set-cookie", "b=2; Path=/")
                    .set_body_string("ok"),
            )
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let resp = client.get(format!("{}/page", server.uri())).await.unwrap();

        assert!(resp.is_ok());
        assert_eq!(resp.set_cookies(), vec!["a=1; Path=/", "b=2; Path=/"]);
        assert_eq!(resp.text().unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_fetch_text_rejects_non_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let err = client
            .fetch_text(server.uri(), Duration::from_secs(10))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Scrape { .. }));
    }

    #[tokio::test]
    async fn test_slow_response_maps_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let request = Request::get(format!("{}/slow", server.uri()))
            .unwrap()
            .timeout(Duration::from_millis(200));
        let err = client.execute(request).await.unwrap_err();

        assert!(err.is_timeout());
        assert!(matches!(err, Error::Timeout { duration_ms: 200, .. }));
    }

    #[tokio::test]
    async fn test_cross_host_redirect_is_not_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/away"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", "https://elsewhere.invalid/"),
            )
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let resp = client.get(format!("{}/away", server.uri())).await.unwrap();

        assert!(resp.is_redirect());
        assert!(!resp.redirected);
    }
}
