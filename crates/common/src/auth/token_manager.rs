//! Token manager with expiry-aware caching and singleflight refresh.
//!
//! The cached token is the only mutable state shared across workers. Reads
//! go through an `RwLock`; the refresh path is additionally serialized by a
//! `Mutex` so concurrent callers that all observe a missing or near-expired
//! token coalesce into a single token request instead of issuing N.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use dirsync_domain::constants::TOKEN_EXPIRY_MARGIN_SECS;
use dirsync_domain::{Credentials, Result};

use crate::events::{ApiEvent, EventSink};

use super::traits::TokenEndpoint;
use super::types::TokenSet;

/// Owns token acquisition and expiry-aware caching.
pub struct TokenManager<E: TokenEndpoint> {
    endpoint: Arc<E>,
    credentials: Credentials,
    cached: RwLock<Option<TokenSet>>,
    refresh_lock: Mutex<()>,
    margin_seconds: i64,
    events: EventSink,
}

impl<E: TokenEndpoint> TokenManager<E> {
    /// Create a token manager with the default 30 s expiry safety margin.
    #[must_use]
    pub fn new(endpoint: E, credentials: Credentials, events: EventSink) -> Self {
        Self::with_margin(endpoint, credentials, events, TOKEN_EXPIRY_MARGIN_SECS)
    }

    /// Create a token manager with a custom safety margin (tests).
    #[must_use]
    pub fn with_margin(
        endpoint: E,
        credentials: Credentials,
        events: EventSink,
        margin_seconds: i64,
    ) -> Self {
        Self {
            endpoint: Arc::new(endpoint),
            credentials,
            cached: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            margin_seconds,
            events,
        }
    }

    /// Return a valid bearer token, refreshing transparently when the cached
    /// one is absent or within the safety margin of its expiry.
    ///
    /// # Errors
    /// [`dirsync_domain::DirSyncError::Auth`] when the token service rejects
    /// the credentials; [`dirsync_domain::DirSyncError::Network`] when the
    /// endpoint exhausts its retries.
    pub async fn get_token(&self) -> Result<String> {
        if let Some(token) = self.cached_valid().await {
            return Ok(token);
        }

        // Serialize refreshes: whoever wins the lock performs the request,
        // everyone else re-checks the cache after the flight completes.
        let _refresh = self.refresh_lock.lock().await;
        if let Some(token) = self.cached_valid().await {
            debug!("Token refreshed by a concurrent caller, reusing it");
            return Ok(token);
        }

        debug!(environment_id = %self.credentials.environment_id, "Requesting access token");
        let result = self.endpoint.request_token(&self.credentials).await;
        self.events.emit(ApiEvent::AuthAttempt {
            environment_id: self.credentials.environment_id.clone(),
            client_id: self.credentials.client_id.clone(),
            success: result.is_ok(),
        });

        match result {
            Ok(tokens) => {
                info!(expires_in = tokens.expires_in, "Access token obtained");
                let access_token = tokens.access_token.clone();
                *self.cached.write().await = Some(tokens);
                Ok(access_token)
            }
            Err(err) => {
                warn!(error = %err, "Token request failed");
                Err(err)
            }
        }
    }

    /// Drop the cached token (credential change or logout). The next
    /// `get_token` call performs a fresh request.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
        debug!("Cached token invalidated");
    }

    /// Whether a token is currently cached, valid or not.
    pub async fn has_cached_token(&self) -> bool {
        self.cached.read().await.is_some()
    }

    async fn cached_valid(&self) -> Option<String> {
        let cached = self.cached.read().await;
        cached
            .as_ref()
            .filter(|t| !t.is_expired(self.margin_seconds))
            .map(|t| t.access_token.clone())
    }
}
