use std::future::Future;
use std::sync::Arc;

use futures::stream::{SplitStream, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, watch, RwLock};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use super::{ClientState, ConnectionManager, ConnectionState, SessionEvent, SessionOptions};
use crate::auth::CredentialStore;
use crate::infrastructure::{Backoff, HeartbeatManager};
use crate::messaging::{Channel, Dispatcher, EventCallback, FrameType, SubscriptionHandle};
use crate::room::RoomCoordinator;
use crate::types::constants::{is_auth_close, REALTIME_PATH};
use crate::types::{Frame, Result, SessionError};

type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// The realtime session client.
///
/// Owns exactly one logical persistent connection shared by chat, typing
/// indicators, presence, media-state sync and call-signaling relay. The
/// client survives transient network loss through bounded exponential
/// backoff, rotates expiring credentials without dropping the session, and
/// buffers frames sent while briefly disconnected.
///
/// The client is cheap to clone; clones share the same underlying session.
/// Construct one per session at the top level and hand clones (or an
/// [`InterestHandle`]) to consumers, never a freely mutable global.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use telecare_realtime::{Credential, SessionClient, SessionOptions, StaticTokenProvider};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = SessionClient::new(
///     "wss://clinic.example.com/api",
///     Credential::new("access-token", None, Duration::from_secs(3600)),
///     Arc::new(StaticTokenProvider::new("access-token", Duration::from_secs(3600))),
///     SessionOptions::default(),
/// )?;
///
/// client.connect().await?;
/// // ... use the session ...
/// client.disconnect().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SessionClient {
    pub(crate) endpoint: String,
    pub(crate) options: SessionOptions,

    // Connection manager: socket, state, generation counter
    pub(crate) connection: Arc<ConnectionManager>,

    // Credential read/refresh capability
    pub(crate) credentials: Arc<CredentialStore>,

    // Inbound fan-out
    pub(crate) dispatcher: Arc<Dispatcher>,

    // Consolidated mutable state
    pub(crate) state: Arc<RwLock<ClientState>>,
}

impl SessionClient {
    /// Creates a new session client without connecting.
    ///
    /// Call [`connect()`](Self::connect) (or [`acquire()`](Self::acquire)) to
    /// establish the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a valid `ws`/`wss` URL or the
    /// credential carries no access token.
    pub fn new(
        endpoint: impl Into<String>,
        credential: crate::auth::Credential,
        provider: Arc<dyn crate::auth::TokenProvider>,
        options: SessionOptions,
    ) -> Result<Self> {
        super::SessionBuilder::new(endpoint, credential, provider, options)
            .map(|builder| builder.build())
    }

    /// Establishes the WebSocket connection.
    ///
    /// No-op when already connected or connecting. Renews the credential
    /// first if it expires within the configured renewal buffer, then opens
    /// the socket with the token carried out-of-band in the handshake
    /// `Authorization` header rather than in the URL, where it would leak
    /// into access logs.
    ///
    /// On success the reconnect budget is reset, the heartbeat and the
    /// credential expiry timer are started, and any frames queued while
    /// disconnected are flushed in order.
    pub async fn connect(&self) -> Result<()> {
        {
            let state = self.connection.state().await;
            if state == ConnectionState::Connected || state == ConnectionState::Connecting {
                return Ok(());
            }
        }
        self.set_state(ConnectionState::Connecting).await;

        let credential = match self
            .credentials
            .ensure_fresh(self.options.renewal_buffer)
            .await
        {
            Ok(credential) => credential,
            Err(e) => {
                self.set_state(ConnectionState::Disconnected).await;
                return Err(e);
            }
        };

        if let Err(e) = self.open_socket(&credential).await {
            self.set_state(ConnectionState::Disconnected).await;
            return Err(e);
        }
        Ok(())
    }

    /// Gracefully disconnects and cancels all background work.
    ///
    /// This is the single cancellation point: the heartbeat, the expiry
    /// timer, any in-flight reconnect timer and the read loop are all torn
    /// down, the outbound queue is cleared, and events from the old socket
    /// become no-ops. The session ends in [`ConnectionState::Closed`]; a
    /// later `connect()` starts fresh.
    pub async fn disconnect(&self) -> Result<()> {
        if self.connection.state().await == ConnectionState::Closed {
            return Ok(());
        }
        tracing::info!("disconnecting");
        self.set_manual_disconnect(true).await;

        {
            let mut state = self.state.write().await;
            state.tasks.abort_all();
            state.outbound.clear();
        }

        // make any event still in flight from the old socket stale
        self.connection.invalidate();
        self.connection.close().await?;
        self.set_state(ConnectionState::Closed).await;
        Ok(())
    }

    /// Sends a frame, queueing it if the session is not connected.
    ///
    /// Delivery is best-effort fire-and-forget, not exactly-once. Frames
    /// sent while disconnected are buffered (FIFO, bounded) and flushed on
    /// the next successful connect; the only synchronous failure surfaced to
    /// callers is [`SessionError::QueueFull`], which never displaces an
    /// already-queued frame.
    pub async fn send(&self, frame: Frame) -> Result<()> {
        if self.connection.is_connected().await {
            match self.connection.send_frame(&frame).await {
                Ok(()) => return Ok(()),
                Err(SessionError::WebSocket(e)) => {
                    tracing::warn!("send failed, queueing frame for redelivery: {}", e);
                }
                Err(SessionError::NotConnected) => {}
                Err(e) => return Err(e),
            }
        }
        self.state.write().await.outbound.enqueue(frame)
    }

    /// Registers interest in the connection, connecting on the first holder.
    ///
    /// Consumers that need the session up hold the returned handle for their
    /// lifetime; when the last handle drops the client disconnects. This
    /// replaces scattered connect-on-mount/disconnect-on-unmount callsites
    /// with one reference-counted gate.
    pub async fn acquire(&self) -> Result<InterestHandle> {
        let first = {
            let mut state = self.state.write().await;
            state.interest += 1;
            state.interest == 1
        };
        if first {
            if let Err(e) = self.connect().await {
                let mut state = self.state.write().await;
                state.interest = state.interest.saturating_sub(1);
                return Err(e);
            }
        }
        Ok(InterestHandle {
            client: self.clone(),
        })
    }

    /// Creates a room coordinator bound to this session
    pub async fn room(
        &self,
        room_id: impl Into<String>,
        local_user_id: impl Into<String>,
    ) -> Arc<RoomCoordinator> {
        RoomCoordinator::attach(self.clone(), room_id.into(), local_user_id.into()).await
    }

    /// Subscribes a callback to a logical channel
    pub fn subscribe(&self, channel: Channel, callback: EventCallback) -> SubscriptionHandle {
        self.dispatcher.subscribe(channel, callback)
    }

    /// Removes a subscription; idempotent
    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        self.dispatcher.unsubscribe(handle)
    }

    /// The inbound dispatcher
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.is_connected().await
    }

    pub async fn current_state(&self) -> ConnectionState {
        self.connection.state().await
    }

    /// Watch channel following every connection-state transition
    pub async fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state.read().await.state_tx.subscribe()
    }

    /// Stream of discrete session events (reconnects, terminal failures)
    pub async fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.state.read().await.event_tx.subscribe()
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Frames currently buffered for the next flush
    pub async fn queued_frames(&self) -> usize {
        self.state.read().await.outbound.len()
    }

    pub(crate) async fn spawn_task<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.state.write().await.tasks.spawn(future);
    }

    async fn set_state(&self, new_state: ConnectionState) {
        self.connection.set_state(new_state).await;
        self.state.read().await.notify_state(new_state);
    }

    async fn set_manual_disconnect(&self, manual: bool) {
        self.state.write().await.was_manual_disconnect = manual;
    }

    async fn emit(&self, event: SessionEvent) {
        self.state.read().await.emit(event);
    }

    /// Builds the connection URL: base endpoint + realtime path + room
    /// segment. The credential is deliberately absent.
    fn build_endpoint_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint)?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                SessionError::Connection("endpoint cannot be a base URL".to_string())
            })?;
            segments.pop_if_empty().push(REALTIME_PATH);
            if let Some(room_id) = &self.options.room_id {
                segments.push(room_id);
            }
        }
        Ok(url)
    }

    /// Opens a socket with the given credential and wires up the read loop,
    /// heartbeat, expiry timer and queue flush. The caller is responsible
    /// for having set the state to `Connecting`.
    fn open_socket<'a>(
        &'a self,
        credential: &'a crate::auth::Credential,
    ) -> std::pin::Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
        let url = self.build_endpoint_url()?;
        tracing::info!(endpoint = %self.endpoint, "connecting");

        let mut request = url.as_str().into_client_request()?;
        let bearer = format!("Bearer {}", credential.access_token);
        let header = HeaderValue::from_str(&bearer).map_err(|_| {
            SessionError::Auth("access token contains invalid header characters".to_string())
        })?;
        request.headers_mut().insert("Authorization", header);

        let (ws_stream, _response) = connect_async(request).await?;
        let (write_half, read_half) = ws_stream.split();

        let generation = self.connection.next_generation();
        self.connection.set_writer(write_half).await;
        self.spawn_read_task(read_half, generation).await;

        self.set_manual_disconnect(false).await;
        self.set_state(ConnectionState::Connected).await;
        self.start_heartbeat(generation).await;
        self.arm_expiry_timer(generation).await;
        self.flush_outbound().await;

        tracing::info!(generation, "connected");
        Ok(())
        })
    }

    async fn spawn_read_task(&self, mut read_half: WsSource, generation: u64) {
        let client = self.clone();
        self.spawn_task(async move {
            tracing::debug!(generation, "read task started");
            loop {
                let message = match read_half.next().await {
                    Some(message) => message,
                    None => {
                        client.handle_close(generation, None).await;
                        break;
                    }
                };
                if !client.connection.is_current(generation) {
                    tracing::debug!(generation, "read task superseded");
                    break;
                }
                match message {
                    Ok(Message::Text(text)) => client.handle_text(&text, generation).await,
                    Ok(Message::Close(close_frame)) => {
                        let code = close_frame.as_ref().map(|f| u16::from(f.code));
                        match &close_frame {
                            Some(f) => tracing::warn!(
                                code = ?code,
                                reason = %f.reason,
                                "server closed connection"
                            ),
                            None => tracing::warn!("server closed connection without close frame"),
                        }
                        client.handle_close(generation, code).await;
                        break;
                    }
                    Ok(Message::Ping(payload)) => {
                        // transport-level ping; tungstenite answers it itself
                        tracing::debug!(bytes = payload.len(), "transport ping");
                    }
                    Ok(Message::Pong(_)) => {}
                    Ok(Message::Binary(payload)) => {
                        tracing::warn!(bytes = payload.len(), "unexpected binary message");
                    }
                    Ok(Message::Frame(_)) => {}
                    Err(e) => {
                        tracing::error!("WebSocket read error: {}", e);
                        client.handle_close(generation, None).await;
                        break;
                    }
                }
            }
            tracing::debug!(generation, "read task finished");
        })
        .await;
    }

    async fn handle_text(&self, text: &str, generation: u64) {
        let frame = match serde_json::from_str::<Frame>(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("dropping malformed frame: {}", e);
                return;
            }
        };

        match &frame.kind {
            FrameType::Ping => {
                // control echo; must never reach the dispatcher
                if let Err(e) = self.connection.send_frame(&Frame::new(FrameType::Pong)).await {
                    tracing::warn!("pong reply failed: {}", e);
                }
                return;
            }
            FrameType::Pong => return,
            FrameType::AuthWarning => {
                tracing::info!("server signalled upcoming credential expiry");
                let client = self.clone();
                self.spawn_task(async move {
                    match client.credentials.force_renew().await {
                        Ok(_) => client.cycle_connection(generation).await,
                        Err(e) => {
                            tracing::error!("server-hinted credential renewal failed: {}", e);
                        }
                    }
                })
                .await;
            }
            _ => {}
        }

        self.dispatcher.route(&frame);

        // keep the credential ahead of its expiry on busy connections
        if self
            .credentials
            .current()
            .await
            .expires_within(self.options.renewal_buffer)
        {
            let client = self.clone();
            self.spawn_task(async move {
                if let Err(e) = client
                    .credentials
                    .ensure_fresh(client.options.renewal_buffer)
                    .await
                {
                    tracing::warn!("credential renewal failed: {}", e);
                }
            })
            .await;
        }
    }

    /// Reacts to the connection closing. Generation-guarded: a close event
    /// from a superseded socket does nothing.
    pub(crate) async fn handle_close(&self, generation: u64, code: Option<u16>) {
        if !self.connection.is_current(generation) {
            tracing::debug!(generation, "ignoring close from superseded connection");
            return;
        }
        self.connection.clear_writer().await;

        if self.state.read().await.was_manual_disconnect {
            self.set_state(ConnectionState::Closed).await;
            return;
        }

        match code {
            Some(code) if is_auth_close(code) => {
                tracing::warn!(code, "closed for authentication failure; renewing credential");
                match self.credentials.force_renew().await {
                    Ok(credential) => {
                        self.set_state(ConnectionState::Connecting).await;
                        if let Err(e) = self.open_socket(&credential).await {
                            tracing::warn!("reconnect after credential renewal failed: {}", e);
                            self.begin_reconnect().await;
                        }
                    }
                    Err(e) => {
                        // renewal gets exactly one attempt; no backoff loop
                        tracing::error!("credential renewal failed: {}", e);
                        self.set_state(ConnectionState::Closed).await;
                        self.emit(SessionEvent::AuthRequired).await;
                    }
                }
            }
            _ => {
                tracing::warn!(?code, "connection lost");
                self.begin_reconnect().await;
            }
        }
    }

    pub(crate) async fn begin_reconnect(&self) {
        if self.state.read().await.was_manual_disconnect {
            return;
        }
        self.set_state(ConnectionState::Reconnecting).await;
        let client = self.clone();
        self.spawn_task(async move { client.run_reconnect_loop().await })
            .await;
    }

    async fn run_reconnect_loop(&self) {
        let mut backoff = Backoff::new(
            self.options.reconnect_base,
            self.options.reconnect_cap,
            self.options.max_reconnect_attempts,
        );

        loop {
            let delay = match backoff.next_delay() {
                Some(delay) => delay,
                None => {
                    tracing::error!(
                        attempts = backoff.attempt(),
                        "reconnect attempts exhausted; giving up"
                    );
                    self.set_state(ConnectionState::Closed).await;
                    self.emit(SessionEvent::ConnectionLost).await;
                    return;
                }
            };

            let attempt = backoff.attempt();
            self.emit(SessionEvent::Reconnecting { attempt }).await;
            tracing::info!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "scheduling reconnect attempt"
            );
            tokio::time::sleep(delay).await;

            if self.state.read().await.was_manual_disconnect {
                return;
            }

            let result = match self
                .credentials
                .ensure_fresh(self.options.renewal_buffer)
                .await
            {
                Ok(credential) => self.open_socket(&credential).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => {
                    tracing::info!(attempt, "reconnected");
                    return;
                }
                Err(e) => tracing::warn!(attempt, "reconnect attempt failed: {}", e),
            }
        }
    }

    /// Replaces the live connection with one opened under the current
    /// credential. The old socket's events are invalidated before the new
    /// one is opened, so the two never overlap.
    pub(crate) async fn cycle_connection(&self, expected_generation: u64) {
        if !self.connection.is_current(expected_generation) {
            return;
        }
        tracing::info!("cycling connection to pick up renewed credential");
        self.connection.invalidate();
        if let Err(e) = self.connection.close().await {
            tracing::debug!("error closing superseded connection: {}", e);
        }

        let credential = self.credentials.current().await;
        self.set_state(ConnectionState::Connecting).await;
        if let Err(e) = self.open_socket(&credential).await {
            tracing::warn!("connection cycle failed, entering reconnect: {}", e);
            self.begin_reconnect().await;
        }
    }

    async fn start_heartbeat(&self, generation: u64) {
        let heartbeat = HeartbeatManager::new(Arc::downgrade(&self.connection), generation)
            .with_interval(self.options.heartbeat_interval);
        self.spawn_task(heartbeat.run()).await;
    }

    /// Arms a one-shot timer that renews the credential and cycles the
    /// connection shortly before expiry, covering idle connections that
    /// never hit the per-frame check.
    async fn arm_expiry_timer(&self, generation: u64) {
        let expires_at = self.credentials.expires_at().await;
        let deadline = match expires_at.checked_sub(self.options.expiry_lead) {
            Some(deadline) if deadline > Instant::now() => deadline,
            _ => {
                tracing::debug!(
                    "credential lifetime shorter than expiry lead; relying on per-frame checks"
                );
                return;
            }
        };

        let client = self.clone();
        self.spawn_task(async move {
            tokio::time::sleep_until(deadline).await;
            if !client.connection.is_current(generation) {
                return;
            }
            tracing::info!("credential expiry approaching on idle connection; renewing");
            match client.credentials.ensure_fresh(client.options.expiry_lead).await {
                Ok(_) => client.cycle_connection(generation).await,
                Err(e) => tracing::error!("idle credential renewal failed: {}", e),
            }
        })
        .await;
    }

    /// Drains the outbound queue in enqueue order, stopping at the first
    /// failed send and leaving the remainder queued.
    async fn flush_outbound(&self) {
        loop {
            let entry = { self.state.write().await.outbound.pop_front() };
            let Some(entry) = entry else { break };

            if let Err(e) = self.connection.send_frame(&entry.frame).await {
                let remaining = {
                    let mut state = self.state.write().await;
                    state.outbound.requeue_front(entry);
                    state.outbound.len()
                };
                tracing::warn!(remaining, "flush interrupted, frames stay queued: {}", e);
                break;
            }
        }
    }
}

/// RAII registration of interest in the connection.
///
/// Obtained from [`SessionClient::acquire`]; dropping the last handle
/// disconnects the session. Must be dropped inside a tokio runtime.
pub struct InterestHandle {
    client: SessionClient,
}

impl Drop for InterestHandle {
    fn drop(&mut self) {
        let client = self.client.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let last = {
                        let mut state = client.state.write().await;
                        state.interest = state.interest.saturating_sub(1);
                        state.interest == 0
                    };
                    if last {
                        if let Err(e) = client.disconnect().await {
                            tracing::warn!("disconnect on interest release failed: {}", e);
                        }
                    }
                });
            }
            Err(_) => {
                tracing::warn!("interest handle dropped outside a runtime; connection left open");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Credential, StaticTokenProvider, TokenProvider};
    use crate::types::SessionError;
    use async_trait::async_trait;
    use std::time::Duration;

    struct RevokedProvider;

    #[async_trait]
    impl TokenProvider for RevokedProvider {
        async fn renew(&self, _current: &Credential) -> Result<Credential> {
            Err(SessionError::Auth("refresh token revoked".to_string()))
        }
    }

    fn client_with(options: SessionOptions) -> SessionClient {
        SessionClient::new(
            "wss://clinic.example.com/api",
            Credential::new("tok", None, Duration::from_secs(3600)),
            Arc::new(StaticTokenProvider::new("tok", Duration::from_secs(3600))),
            options,
        )
        .unwrap()
    }

    fn chat(text: &str) -> Frame {
        Frame::new(FrameType::ChatMessage).with_payload(serde_json::json!({ "text": text }))
    }

    #[test]
    fn endpoint_url_carries_no_token() {
        let client = client_with(SessionOptions {
            room_id: Some("room-7".to_string()),
            ..Default::default()
        });
        let url = client.build_endpoint_url().unwrap();
        assert_eq!(url.as_str(), "wss://clinic.example.com/api/realtime/room-7");
        assert!(url.query().is_none());
    }

    #[tokio::test]
    async fn send_while_disconnected_queues_in_order() {
        let client = client_with(SessionOptions::default());

        client.send(chat("one")).await.unwrap();
        client.send(chat("two")).await.unwrap();
        client.send(chat("three")).await.unwrap();

        assert_eq!(client.queued_frames().await, 3);
        let mut state = client.state.write().await;
        assert_eq!(state.outbound.pop_front().unwrap().frame, chat("one"));
        assert_eq!(state.outbound.pop_front().unwrap().frame, chat("two"));
        assert_eq!(state.outbound.pop_front().unwrap().frame, chat("three"));
    }

    #[tokio::test]
    async fn queue_overflow_surfaces_to_the_sender() {
        let client = client_with(SessionOptions {
            queue_capacity: 2,
            ..Default::default()
        });

        client.send(chat("one")).await.unwrap();
        client.send(chat("two")).await.unwrap();
        let err = client.send(chat("three")).await.unwrap_err();
        assert!(matches!(err, SessionError::QueueFull));
        assert_eq!(client.queued_frames().await, 2);
    }

    #[tokio::test]
    async fn stale_generation_close_is_ignored() {
        let client = client_with(SessionOptions::default());
        let superseded = client.connection.next_generation();
        client.connection.next_generation();

        client.handle_close(superseded, Some(1006)).await;

        // no state transition happened for the stale event
        assert_eq!(client.current_state().await, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn auth_close_with_failed_renewal_is_terminal_without_backoff() {
        let client = SessionClient::new(
            "wss://clinic.example.com/api",
            Credential::new("tok", None, Duration::from_secs(3600)),
            Arc::new(RevokedProvider),
            SessionOptions::default(),
        )
        .unwrap();
        let mut events = client.events().await;

        let generation = client.connection.next_generation();
        client.handle_close(generation, Some(4001)).await;

        assert_eq!(client.current_state().await, ConnectionState::Closed);

        let mut saw_auth_required = false;
        while let Ok(event) = events.try_recv() {
            assert!(!matches!(event, SessionEvent::Reconnecting { .. }));
            if event == SessionEvent::AuthRequired {
                saw_auth_required = true;
            }
        }
        assert!(saw_auth_required);
        // no reconnect loop was scheduled
        assert!(client.state.read().await.tasks.is_empty());
    }

    #[tokio::test]
    async fn exhausted_reconnects_emit_exactly_one_terminal_event() {
        let client = client_with(SessionOptions {
            max_reconnect_attempts: 0,
            ..Default::default()
        });
        let mut events = client.events().await;

        client.begin_reconnect().await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(client.current_state().await, ConnectionState::Closed);
        let lost = std::iter::from_fn(|| events.try_recv().ok())
            .filter(|event| *event == SessionEvent::ConnectionLost)
            .count();
        assert_eq!(lost, 1);
    }

    #[tokio::test]
    async fn ping_frame_is_answered_and_never_dispatched() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let client = client_with(SessionOptions::default());
        let calls = Arc::new(AtomicUsize::new(0));
        for channel in [
            Channel::Chat,
            Channel::Notification,
            Channel::Presence,
            Channel::Room,
            Channel::Signaling,
            Channel::Lifecycle,
        ] {
            let calls_in_cb = Arc::clone(&calls);
            client.subscribe(
                channel,
                Arc::new(move |_| {
                    calls_in_cb.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }

        let generation = client.connection.next_generation();
        // the pong reply fails (no writer) but routing must still be skipped
        client.handle_text(r#"{"type":"ping"}"#, generation).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
