//! OAuth 2.0 token types.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// An access token with expiry metadata.
///
/// Owned exclusively by the token manager; the access token string leaves
/// the client boundary only as a transient `Authorization` header value.
#[derive(Debug, Clone)]
pub struct TokenSet {
    /// Bearer access token
    pub access_token: String,
    /// Token type (always "Bearer" for this grant)
    pub token_type: String,
    /// Token lifetime in seconds as granted by the server
    pub expires_in: i64,
    /// Absolute expiration timestamp (UTC), calculated at creation time
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenSet {
    /// Create a token set, computing `expires_at` from `expires_in`.
    #[must_use]
    pub fn new(access_token: String, expires_in: i64) -> Self {
        let expires_at =
            (expires_in > 0).then(|| Utc::now() + chrono::Duration::seconds(expires_in));
        Self { access_token, token_type: "Bearer".to_string(), expires_in, expires_at }
    }

    /// Whether the token is expired or will expire within `threshold_seconds`.
    ///
    /// Tokens without an expiry timestamp are treated as valid.
    #[must_use]
    pub fn is_expired(&self, threshold_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                Utc::now() + chrono::Duration::seconds(threshold_seconds) >= expires_at
            }
            None => false,
        }
    }

    /// Seconds until expiry, if an expiry timestamp is set.
    #[must_use]
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expires_at.map(|expires_at| (expires_at - Utc::now()).num_seconds())
    }
}

/// Token endpoint response body (RFC 6749 client-credentials grant).
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// Granted access token
    pub access_token: String,
    /// Token type, normally "Bearer"
    pub token_type: Option<String>,
    /// Lifetime in seconds
    pub expires_in: Option<i64>,
}

impl From<TokenResponse> for TokenSet {
    fn from(response: TokenResponse) -> Self {
        let mut set = TokenSet::new(response.access_token, response.expires_in.unwrap_or(3600));
        if let Some(token_type) = response.token_type {
            set.token_type = token_type;
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_not_expired() {
        let set = TokenSet::new("tok".into(), 3600);
        assert!(!set.is_expired(30));
        assert!(set.seconds_until_expiry().unwrap_or(0) > 3500);
    }

    #[test]
    fn token_within_margin_counts_as_expired() {
        let set = TokenSet::new("tok".into(), 20);
        assert!(set.is_expired(30));
    }

    #[test]
    fn token_without_expiry_is_valid() {
        let set = TokenSet::new("tok".into(), 0);
        assert!(!set.is_expired(30));
        assert_eq!(set.seconds_until_expiry(), None);
    }

    #[test]
    fn response_defaults_fill_in() {
        let response =
            TokenResponse { access_token: "tok".into(), token_type: None, expires_in: None };
        let set = TokenSet::from(response);
        assert_eq!(set.token_type, "Bearer");
        assert_eq!(set.expires_in, 3600);
    }
}
