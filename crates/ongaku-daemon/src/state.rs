//! Shared daemon state.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use ongaku_api::{ApiError, StatusClient};
use ongaku_core::{AppConfig, ChangeDetector, NowPlaying, TokenStore, UserIdentity};
use ongaku_scrape::SiteMatcher;

use crate::bridge::Bridge;

pub struct Daemon {
    pub config: AppConfig,
    pub bridge: Bridge,
    pub matcher: SiteMatcher,
    pub tokens: TokenStore,
    /// Last-reported-track cell behind the status reporter.
    pub detector: Mutex<ChangeDetector>,
    /// What `getNowPlaying` answers with; refreshed by the display loop.
    pub now_playing: RwLock<NowPlaying>,
}

pub type SharedDaemon = Arc<Daemon>;

impl Daemon {
    pub fn new(config: AppConfig, tokens: TokenStore) -> SharedDaemon {
        Arc::new(Self {
            config,
            bridge: Bridge::new(),
            matcher: SiteMatcher::new(),
            tokens,
            detector: Mutex::new(ChangeDetector::new()),
            now_playing: RwLock::new(NowPlaying::default()),
        })
    }

    /// Client carrying the stored bearer token.
    pub fn authed_client(&self) -> Result<StatusClient, ApiError> {
        match self.tokens.load() {
            Some(token) => Ok(StatusClient::with_token(&self.config.backend.origin, token)),
            None => Err(ApiError::Auth("not logged in".into())),
        }
    }

    /// Identity projected from the stored token, if any.
    pub fn identity(&self) -> Option<UserIdentity> {
        self.tokens
            .load()
            .and_then(|token| ongaku_core::decode_identity(&token))
    }
}
