//! Trait seam between the token manager and the wire.

use async_trait::async_trait;
use dirsync_domain::{Credentials, Result};

use super::types::TokenSet;

/// Executes the client-credentials grant against the remote token service.
///
/// Implemented over HTTP in the infra crate; mocked in tests. Transport
/// failures are reported as [`dirsync_domain::DirSyncError::Network`]
/// (retried by the implementation per the shared policy); a 4xx with an
/// auth-specific body is [`dirsync_domain::DirSyncError::Auth`].
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Request a fresh access token for the given credentials.
    async fn request_token(&self, credentials: &Credentials) -> Result<TokenSet>;
}
