//! Client-credentials grant material.

use std::fmt;

/// OAuth2 client credentials for one remote environment.
///
/// Immutable for the lifetime of a session; the caller owns them and passes
/// them by value into the token client. The secret never appears in logs,
/// events, or `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    /// Remote environment identifier
    pub environment_id: String,
    /// OAuth2 client id
    pub client_id: String,
    /// OAuth2 client secret
    pub client_secret: String,
}

impl Credentials {
    /// Bundle credentials for one environment.
    #[must_use]
    pub fn new(
        environment_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            environment_id: environment_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

// Manual impl so the secret cannot leak through `{:?}` formatting.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("environment_id", &self.environment_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}
