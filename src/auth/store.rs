use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use super::{Credential, TokenProvider};
use crate::types::Result;

/// Holds the current credential and funnels every renewal through one
/// reentrancy guard.
///
/// Renewal is requested from several places (connect, the per-frame expiry
/// check, the idle expiry timer, server `auth_warning` hints); a renewal
/// already in flight must not be started twice. Callers that arrive while one
/// is running wait on the guard and then re-check, so at most one provider
/// call happens per expiry.
pub struct CredentialStore {
    provider: Arc<dyn TokenProvider>,
    current: RwLock<Credential>,
    renewal: Mutex<()>,
}

impl CredentialStore {
    pub fn new(initial: Credential, provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            current: RwLock::new(initial),
            renewal: Mutex::new(()),
        }
    }

    pub async fn current(&self) -> Credential {
        self.current.read().await.clone()
    }

    pub async fn expires_at(&self) -> Instant {
        self.current.read().await.expires_at
    }

    /// Returns a credential with more than `buffer` of lifetime left, renewing
    /// through the provider first if the current one is too close to expiry.
    pub async fn ensure_fresh(&self, buffer: Duration) -> Result<Credential> {
        {
            let credential = self.current.read().await;
            if !credential.expires_within(buffer) {
                return Ok(credential.clone());
            }
        }

        let _guard = self.renewal.lock().await;

        // Re-check: a renewal may have completed while we waited on the guard
        let stale = {
            let credential = self.current.read().await;
            if !credential.expires_within(buffer) {
                return Ok(credential.clone());
            }
            credential.clone()
        };

        let renewed = self.provider.renew(&stale).await?;
        tracing::info!(
            remaining_secs = renewed.remaining().as_secs(),
            "credential renewed"
        );
        *self.current.write().await = renewed.clone();
        Ok(renewed)
    }

    /// Renews unconditionally. Used for the single renewal attempt after an
    /// auth-failure close and for server-initiated refresh hints.
    pub async fn force_renew(&self) -> Result<Credential> {
        let _guard = self.renewal.lock().await;
        let stale = self.current.read().await.clone();
        let renewed = self.provider.renew(&stale).await?;
        tracing::info!(
            remaining_secs = renewed.remaining().as_secs(),
            "credential renewed"
        );
        *self.current.write().await = renewed.clone();
        Ok(renewed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
        ttl: Duration,
    }

    impl CountingProvider {
        fn new(ttl: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
                ttl,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
                ttl: Duration::ZERO,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenProvider for CountingProvider {
        async fn renew(&self, current: &Credential) -> Result<Credential> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SessionError::Auth("refresh token revoked".to_string()));
            }
            Ok(Credential::new(
                "renewed-token",
                current.refresh_token.clone(),
                self.ttl,
            ))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_credential_is_not_renewed() {
        let provider = Arc::new(CountingProvider::new(Duration::from_secs(3600)));
        let store = CredentialStore::new(
            Credential::new("tok", None, Duration::from_secs(3600)),
            Arc::clone(&provider) as Arc<dyn TokenProvider>,
        );

        let credential = store.ensure_fresh(Duration::from_secs(60)).await.unwrap();
        assert_eq!(credential.access_token, "tok");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn expiring_credential_is_renewed_once() {
        let provider = Arc::new(CountingProvider::new(Duration::from_secs(3600)));
        let store = CredentialStore::new(
            Credential::new("tok", Some("refresh".to_string()), Duration::from_secs(30)),
            Arc::clone(&provider) as Arc<dyn TokenProvider>,
        );

        let credential = store.ensure_fresh(Duration::from_secs(60)).await.unwrap();
        assert_eq!(credential.access_token, "renewed-token");
        assert_eq!(provider.calls(), 1);

        // now fresh; a second call must not hit the provider again
        store.ensure_fresh(Duration::from_secs(60)).await.unwrap();
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_renewal() {
        let provider = Arc::new(CountingProvider::new(Duration::from_secs(3600)));
        let store = Arc::new(CredentialStore::new(
            Credential::new("tok", Some("refresh".to_string()), Duration::from_secs(10)),
            Arc::clone(&provider) as Arc<dyn TokenProvider>,
        ));

        let a = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.ensure_fresh(Duration::from_secs(60)).await })
        };
        let b = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.ensure_fresh(Duration::from_secs(60)).await })
        };

        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn force_renew_propagates_provider_failure() {
        let provider = Arc::new(CountingProvider::failing());
        let store = CredentialStore::new(
            Credential::new("tok", None, Duration::from_secs(30)),
            Arc::clone(&provider) as Arc<dyn TokenProvider>,
        );

        let err = store.force_renew().await.unwrap_err();
        assert!(matches!(err, SessionError::Auth(_)));
        assert_eq!(provider.calls(), 1);
        // the stale credential stays in place
        assert_eq!(store.current().await.access_token, "tok");
    }
}
