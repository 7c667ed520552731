use std::time::Duration;

use tokio::time::Instant;

/// An access token with its renewal material and derived absolute expiry.
///
/// Credentials are issued by an external auth collaborator; the session layer
/// only reads them and asks a [`TokenProvider`](super::TokenProvider) for a
/// replacement when one is close to expiry.
#[derive(Debug, Clone)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Instant,
}

impl Credential {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: Instant::now() + ttl,
        }
    }

    /// Remaining lifetime, zero once expired
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// Whether the credential expires within the given window
    pub fn expires_within(&self, window: Duration) -> bool {
        self.remaining() <= window
    }
}
