use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use url::Url;

use super::{ClientState, ConnectionManager, SessionClient};
use crate::auth::{Credential, CredentialStore, TokenProvider};
use crate::messaging::Dispatcher;
use crate::types::constants::{
    DEFAULT_EXPIRY_LEAD_SECS, DEFAULT_HEARTBEAT_INTERVAL_MS, DEFAULT_MAX_RECONNECT_ATTEMPTS,
    DEFAULT_QUEUE_CAPACITY, DEFAULT_RECONNECT_BASE_MS, DEFAULT_RECONNECT_CAP_MS,
    DEFAULT_RENEWAL_BUFFER_SECS, DEFAULT_TYPING_DEBOUNCE_MS, DEFAULT_TYPING_EXPIRY_MS,
};
use crate::types::{Result, SessionError};

/// Tuning knobs for a session client.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Room identifier appended to the connection URL for room-scoped sessions
    pub room_id: Option<String>,
    /// Application-level ping interval
    pub heartbeat_interval: Duration,
    /// First reconnect delay; doubles each attempt
    pub reconnect_base: Duration,
    /// Upper bound on the exponential part of the reconnect delay
    pub reconnect_cap: Duration,
    /// Reconnect attempts before giving up for good
    pub max_reconnect_attempts: u32,
    /// Outbound queue capacity while disconnected
    pub queue_capacity: usize,
    /// Minimum credential lifetime required before it is used
    pub renewal_buffer: Duration,
    /// How long before expiry the idle renewal timer fires
    pub expiry_lead: Duration,
    /// Local typing inactivity window before a stop frame is sent
    pub typing_debounce: Duration,
    /// Remote typing entries expire this long after the last typing frame
    pub typing_expiry: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            room_id: None,
            heartbeat_interval: Duration::from_millis(DEFAULT_HEARTBEAT_INTERVAL_MS),
            reconnect_base: Duration::from_millis(DEFAULT_RECONNECT_BASE_MS),
            reconnect_cap: Duration::from_millis(DEFAULT_RECONNECT_CAP_MS),
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            renewal_buffer: Duration::from_secs(DEFAULT_RENEWAL_BUFFER_SECS),
            expiry_lead: Duration::from_secs(DEFAULT_EXPIRY_LEAD_SECS),
            typing_debounce: Duration::from_millis(DEFAULT_TYPING_DEBOUNCE_MS),
            typing_expiry: Duration::from_millis(DEFAULT_TYPING_EXPIRY_MS),
        }
    }
}

/// Builder for [`SessionClient`] that handles validation and wiring.
pub struct SessionBuilder {
    endpoint: String,
    credential: Credential,
    provider: Arc<dyn TokenProvider>,
    options: SessionOptions,
}

impl SessionBuilder {
    /// Create a new builder, validating the endpoint up front
    pub fn new(
        endpoint: impl Into<String>,
        credential: Credential,
        provider: Arc<dyn TokenProvider>,
        options: SessionOptions,
    ) -> Result<Self> {
        let endpoint = endpoint.into();

        let url = Url::parse(&endpoint)?;
        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(SessionError::Connection(format!(
                    "endpoint scheme must be ws or wss, got {other}"
                )));
            }
        }
        if credential.access_token.is_empty() {
            return Err(SessionError::Auth("access token is required".to_string()));
        }

        Ok(Self {
            endpoint,
            credential,
            provider,
            options,
        })
    }

    pub fn build(self) -> SessionClient {
        let state = ClientState::new(self.options.queue_capacity);

        SessionClient {
            endpoint: self.endpoint,
            options: self.options,
            connection: Arc::new(ConnectionManager::new()),
            credentials: Arc::new(CredentialStore::new(self.credential, self.provider)),
            dispatcher: Arc::new(Dispatcher::new()),
            state: Arc::new(RwLock::new(state)),
        }
    }
}
