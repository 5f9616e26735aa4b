//! Client-credentials grant over the wire.

use async_trait::async_trait;
use reqwest::Method;

use dirsync_common::{TokenEndpoint, TokenResponse, TokenSet};
use dirsync_domain::{Credentials, DirSyncError, Result};

use crate::http::HttpClient;

/// [`TokenEndpoint`] implementation against the remote token service.
///
/// `POST {auth_base}/{environment_id}/as/token` with HTTP basic auth and a
/// `grant_type=client_credentials` form body. Transport failures and 5xx
/// are retried by the shared [`HttpClient`] policy before surfacing.
pub struct HttpTokenEndpoint {
    http: HttpClient,
    auth_base_url: String,
}

impl HttpTokenEndpoint {
    /// Endpoint against `auth_base_url` (no trailing slash needed).
    #[must_use]
    pub fn new(http: HttpClient, auth_base_url: impl Into<String>) -> Self {
        let auth_base_url = auth_base_url.into().trim_end_matches('/').to_string();
        Self { http, auth_base_url }
    }
}

#[async_trait]
impl TokenEndpoint for HttpTokenEndpoint {
    async fn request_token(&self, credentials: &Credentials) -> Result<TokenSet> {
        let url = format!("{}/{}/as/token", self.auth_base_url, credentials.environment_id);
        let builder = self
            .http
            .request(Method::POST, &url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")]);

        // The token service reports bad credentials as 400/401/403 bodies;
        // all of them mean the same thing to callers.
        let response = self.http.send(builder).await.map_err(|err| match err {
            DirSyncError::Validation(detail) | DirSyncError::Auth(detail) => {
                DirSyncError::Auth(detail)
            }
            other => other,
        })?;

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|err| DirSyncError::Network(format!("invalid token response: {err}")))?;
        Ok(body.into())
    }
}
