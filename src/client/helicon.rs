// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Credential facade and authenticated requests

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::config::Config;
use crate::auth::{
    ChallengeSolver, FrontendScraper, KeyringStore, LoginFlow, SecretStore, SessionCredentials,
    StoredTokens, SERVICE,
};
use crate::error::{Error, LoginStage, Result};
use crate::http::{headers, HttpClient, HttpClientConfig, Request};
use crate::js::{BoaHost, BoaHostConfig, ScriptHost};

/// Authenticated client for the Service
///
/// `authenticate()` either loads a stored session or runs the full login,
/// after which [`Helicon::get`] can issue authenticated GETs.
pub struct Helicon {
    config: Config,
    http: HttpClient,
    scraper: FrontendScraper,
    solver: ChallengeSolver,
    store: Arc<dyn SecretStore>,
    session: RwLock<Option<SessionCredentials>>,
}

impl Helicon {
    /// Create a client backed by the OS keyring and the embedded JS engine
    pub fn new(config: Config) -> Result<Self> {
        let host = BoaHost::new(BoaHostConfig {
            wait: config.challenge_wait,
            ..Default::default()
        });
        Self::with_parts(config, Arc::new(KeyringStore::new()), Arc::new(host))
    }

    /// Create a client with explicit store and script host
    pub fn with_parts(
        config: Config,
        store: Arc<dyn SecretStore>,
        host: Arc<dyn ScriptHost>,
    ) -> Result<Self> {
        let http = HttpClient::with_config(HttpClientConfig {
            user_agent: config.effective_user_agent().to_string(),
            ..Default::default()
        })?;
        let scraper = FrontendScraper::new(http.clone(), &config.endpoints, config.scrape_timeout)?;
        let solver = ChallengeSolver::new(
            http.clone(),
            host,
            config.effective_user_agent(),
            config.scrape_timeout,
            config.challenge_timeout,
        );

        Ok(Self {
            config,
            http,
            scraper,
            solver,
            store,
            session: RwLock::new(None),
        })
    }

    /// Get client configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current session, if authenticated
    pub fn session(&self) -> Option<SessionCredentials> {
        self.session.read().clone()
    }

    /// Load the stored session or log in
    ///
    /// A missing, corrupt or expired stored session leads to a full login
    /// whose result overwrites the store.
    pub async fn authenticate(&self) -> Result<SessionCredentials> {
        self.config.validate()?;

        if self.config.force_login {
            info!(username = %self.config.username, "force login requested");
            let session = self.login().await?;
            self.persist(&session)?;
        }

        match self.load() {
            Ok(session) if !session.is_expired() => {
                info!(username = %self.config.username, "using stored session");
                return Ok(self.install(session));
            }
            Ok(_) => info!("stored session expired, logging in"),
            Err(e) if e.is_stale_session() => {
                info!(error = %e, "no usable stored session, logging in");
            }
            Err(e) => return Err(e),
        }

        let session = self.login().await?;
        self.persist(&session)?;
        let session = self.load()?;
        Ok(self.install(session))
    }

    /// Run the login flow, retrying once if the Service drops the session
    pub async fn login(&self) -> Result<SessionCredentials> {
        let mut attempt = 1;
        loop {
            let bootstrap = self.scraper.bootstrap().await?;
            let bearer = bootstrap.anonymous_bearer.clone();

            let mut flow = LoginFlow::new(
                self.http.clone(),
                self.solver.clone(),
                self.config.endpoints.onboarding_task.clone(),
                self.config.effective_user_agent(),
                bootstrap,
            );
            let cookies = flow.run(&self.config.username, &self.config.password).await?;

            if cookies.logged_out() {
                if attempt == 1 {
                    warn!(
                        "we have to execute another login flow, current attempt was successful but logged us out"
                    );
                    attempt += 1;
                    continue;
                }
                return Err(Error::login(
                    LoginStage::SessionCookies,
                    "no session cookies issued",
                ));
            }
            if cookies.auth_raw.is_empty() {
                return Err(Error::login(
                    LoginStage::SessionCookies,
                    "ct0 issued without auth_token",
                ));
            }

            let session =
                SessionCredentials::from_raw(&cookies.csrf_raw, &cookies.auth_raw, bearer)?;
            info!(attempt, "login complete");
            return Ok(session);
        }
    }

    /// Re-scrape the anonymous bearer, keeping the session cookies
    pub async fn refresh_anonymous_bearer(&self) -> Result<String> {
        let mut session = self
            .session()
            .ok_or_else(|| Error::config("not authenticated, call authenticate first"))?;

        let bearer = self.scraper.find_anonymous_bearer().await?;
        let changed = bearer != session.bearer_token;
        session.bearer_token = bearer.clone();
        self.persist(&session)?;
        self.install(session);

        info!(changed, "anonymous bearer refreshed");
        Ok(bearer)
    }

    /// Authenticated GET, returning the body of a 200
    pub async fn get(&self, url: &str) -> Result<Bytes> {
        let session = self
            .session()
            .ok_or_else(|| Error::config("not authenticated, call authenticate first"))?;

        let request = Request::get(url)?
            .header(headers::AUTHORIZATION, &session.bearer_token)?
            .header(headers::X_CSRF_TOKEN, &session.csrf_token.value)?
            .header(headers::X_TWITTER_AUTH_TYPE, "OAuth2Session")?
            .header(headers::X_TWITTER_ACTIVE_USER, "yes")?
            .header(headers::X_TWITTER_CLIENT_LANGUAGE, "en")?
            .header(headers::COOKIE, session.cookie_header())?
            .header(headers::ACCEPT, "*/*")?
            .header(headers::USER_AGENT, self.config.effective_user_agent())?;

        let response = self.http.execute(request).await?;
        if !response.is_ok() {
            warn!(url = %url, status = response.status_code(), "api request rejected");
            return Err(Error::api(response.status_code(), response.text_lossy()));
        }
        Ok(response.body)
    }

    fn load(&self) -> Result<SessionCredentials> {
        let blob = self.store.load(SERVICE, &self.config.username)?;
        let tokens = StoredTokens::decode(&blob)?;
        let session = SessionCredentials::from_stored(&tokens)?;
        if !session.is_complete() {
            return Err(Error::corrupt_blob("stored session is incomplete"));
        }
        Ok(session)
    }

    fn persist(&self, session: &SessionCredentials) -> Result<()> {
        let blob = session.to_stored().encode()?;
        self.store.save(SERVICE, &self.config.username, &blob)?;
        debug!(username = %self.config.username, "session stored");
        Ok(())
    }

    fn install(&self, session: SessionCredentials) -> SessionCredentials {
        *self.session.write() = Some(session.clone());
        session
    }
}
