//! End-to-end tests driving a real session client against an in-process
//! WebSocket server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};

use telecare_realtime::{
    Channel, ConnectionState, Credential, Frame, FrameType, Result, SessionClient, SessionEvent,
    SessionOptions, TokenProvider,
};

const WAIT: Duration = Duration::from_secs(5);

struct CountingProvider {
    calls: AtomicUsize,
    fail: bool,
}

impl CountingProvider {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
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
            return Err(telecare_realtime::SessionError::Auth(
                "refresh token revoked".to_string(),
            ));
        }
        Ok(Credential::new(
            "renewed-token",
            current.refresh_token.clone(),
            Duration::from_secs(3600),
        ))
    }
}

async fn start_listener() -> (String, TcpListener) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("ws://{}", listener.local_addr().unwrap());
    (endpoint, listener)
}

/// Accepts one connection, capturing the Authorization header presented at
/// the handshake.
async fn accept_with_auth(
    listener: &TcpListener,
) -> (WebSocketStream<TcpStream>, Option<String>) {
    let (stream, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    let auth: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let auth_in_cb = Arc::clone(&auth);
    let ws = accept_hdr_async(stream, move |request: &Request, response: Response| {
        *auth_in_cb.lock().unwrap() = request
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        Ok(response)
    })
    .await
    .unwrap();
    let auth = auth.lock().unwrap().clone();
    (ws, auth)
}

async fn next_frame(ws: &mut WebSocketStream<TcpStream>) -> Frame {
    loop {
        let message = timeout(WAIT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection closed")
            .expect("read error");
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).expect("malformed frame from client");
        }
    }
}

fn client_with(
    endpoint: &str,
    credential: Credential,
    provider: Arc<dyn TokenProvider>,
    options: SessionOptions,
) -> SessionClient {
    SessionClient::new(endpoint, credential, provider, options).unwrap()
}

#[tokio::test]
async fn frames_queued_offline_flush_in_order_on_connect() {
    let (endpoint, listener) = start_listener().await;
    let client = client_with(
        &endpoint,
        Credential::new("tok", None, Duration::from_secs(3600)),
        Arc::new(CountingProvider::new()),
        SessionOptions::default(),
    );

    for text in ["one", "two", "three"] {
        client
            .send(
                Frame::new(FrameType::ChatMessage)
                    .with_payload(serde_json::json!({ "text": text })),
            )
            .await
            .unwrap();
    }
    assert_eq!(client.queued_frames().await, 3);

    let server = tokio::spawn(async move {
        let (mut ws, auth) = accept_with_auth(&listener).await;
        let mut texts = Vec::new();
        for _ in 0..3 {
            let frame = next_frame(&mut ws).await;
            assert_eq!(frame.kind, FrameType::ChatMessage);
            texts.push(frame.payload["text"].as_str().unwrap().to_string());
        }
        (auth, texts)
    });

    client.connect().await.unwrap();
    let (auth, texts) = timeout(WAIT, server).await.unwrap().unwrap();

    assert_eq!(auth.as_deref(), Some("Bearer tok"));
    assert_eq!(texts, vec!["one", "two", "three"]);
    assert_eq!(client.queued_frames().await, 0);

    client.disconnect().await.unwrap();
}

#[tokio::test]
async fn ping_gets_one_pong_and_never_reaches_subscribers() {
    let (endpoint, listener) = start_listener().await;
    let client = client_with(
        &endpoint,
        Credential::new("tok", None, Duration::from_secs(3600)),
        Arc::new(CountingProvider::new()),
        SessionOptions::default(),
    );

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

    let server = tokio::spawn(async move {
        let (mut ws, _) = accept_with_auth(&listener).await;
        ws.send(Message::Text(r#"{"type":"ping"}"#.into()))
            .await
            .unwrap();
        let reply = next_frame(&mut ws).await;
        reply
    });

    client.connect().await.unwrap();
    let reply = timeout(WAIT, server).await.unwrap().unwrap();

    assert_eq!(reply.kind, FrameType::Pong);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    client.disconnect().await.unwrap();
}

#[tokio::test]
async fn expiring_credential_is_renewed_before_the_socket_opens() {
    let (endpoint, listener) = start_listener().await;
    let provider = Arc::new(CountingProvider::new());
    // 30s left at connect time, below the 60s renewal buffer
    let client = client_with(
        &endpoint,
        Credential::new("stale-token", Some("refresh".to_string()), Duration::from_secs(30)),
        Arc::clone(&provider) as Arc<dyn TokenProvider>,
        SessionOptions::default(),
    );

    let server = tokio::spawn(async move {
        let (_ws, auth) = accept_with_auth(&listener).await;
        auth
    });

    client.connect().await.unwrap();
    let auth = timeout(WAIT, server).await.unwrap().unwrap();

    // the opened connection used the renewed credential, not the stale one
    assert_eq!(auth.as_deref(), Some("Bearer renewed-token"));
    assert_eq!(provider.calls(), 1);

    client.disconnect().await.unwrap();
}

#[tokio::test]
async fn auth_close_gets_one_renewal_and_no_backoff_when_it_fails() {
    let (endpoint, listener) = start_listener().await;
    let provider = Arc::new(CountingProvider::failing());
    let client = client_with(
        &endpoint,
        Credential::new("tok", None, Duration::from_secs(3600)),
        Arc::clone(&provider) as Arc<dyn TokenProvider>,
        SessionOptions::default(),
    );

    let server = tokio::spawn(async move {
        let (mut ws, _) = accept_with_auth(&listener).await;
        ws.send(Message::Close(Some(CloseFrame {
            code: CloseCode::from(4001),
            reason: "token expired".into(),
        })))
        .await
        .unwrap();
        listener
    });

    let mut events = client.events().await;
    client.connect().await.unwrap();
    let listener = timeout(WAIT, server).await.unwrap().unwrap();

    // wait for the terminal state
    let mut state_changes = client.state_changes().await;
    timeout(WAIT, async {
        while *state_changes.borrow_and_update() != ConnectionState::Closed {
            state_changes.changed().await.unwrap();
        }
    })
    .await
    .expect("client never reached Closed");

    assert_eq!(provider.calls(), 1);

    let mut saw_auth_required = false;
    while let Ok(event) = events.try_recv() {
        assert!(
            !matches!(event, SessionEvent::Reconnecting { .. }),
            "no backoff may be scheduled after a failed auth renewal"
        );
        if event == SessionEvent::AuthRequired {
            saw_auth_required = true;
        }
    }
    assert!(saw_auth_required);

    // and no new connection is attempted
    assert!(
        timeout(Duration::from_millis(300), listener.accept())
            .await
            .is_err(),
        "client reconnected after a terminal auth failure"
    );
}

#[tokio::test]
async fn interest_gate_connects_on_first_holder_and_disconnects_on_last() {
    let (endpoint, listener) = start_listener().await;
    let client = client_with(
        &endpoint,
        Credential::new("tok", None, Duration::from_secs(3600)),
        Arc::new(CountingProvider::new()),
        SessionOptions::default(),
    );

    let server = tokio::spawn(async move {
        let (ws, _) = accept_with_auth(&listener).await;
        // hold the connection open while the client holds interest
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(ws);
    });

    let first = client.acquire().await.unwrap();
    let second = client.acquire().await.unwrap();
    assert!(client.is_connected().await);

    // one holder remains, the connection stays up
    drop(second);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(client.is_connected().await);

    drop(first);
    timeout(WAIT, async {
        while client.current_state().await != ConnectionState::Closed {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("client never disconnected after the last interest was released");

    server.abort();
}

#[tokio::test]
async fn room_events_apply_through_the_wire() {
    let (endpoint, listener) = start_listener().await;
    let client = client_with(
        &endpoint,
        Credential::new("tok", None, Duration::from_secs(3600)),
        Arc::new(CountingProvider::new()),
        SessionOptions {
            room_id: Some("consult-1".to_string()),
            ..Default::default()
        },
    );
    let room = client.room("consult-1", "me").await;

    let server = tokio::spawn(async move {
        let (mut ws, _) = accept_with_auth(&listener).await;
        // the client's join intent arrives first
        let join = next_frame(&mut ws).await;
        assert_eq!(join.kind, FrameType::JoinRoom);

        for payload in [
            serde_json::json!({
                "type": "user_joined",
                "room_id": "consult-1",
                "payload": {"user_id": "u1", "username": "Dr. Ruiz", "role": "clinician"},
            }),
            serde_json::json!({
                "type": "media_state_change",
                "room_id": "consult-1",
                "payload": {"user_id": "u1", "video_enabled": true},
            }),
        ] {
            ws.send(Message::Text(payload.to_string().into()))
                .await
                .unwrap();
        }
        // keep the socket open until the client has seen both frames
        tokio::time::sleep(Duration::from_millis(500)).await;
    });

    client.connect().await.unwrap();
    room.join().await.unwrap();

    timeout(WAIT, async {
        loop {
            if let Some(participant) = room.participant("u1") {
                if participant.media.video_enabled {
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("media change never applied");

    let participant = room.participant("u1").unwrap();
    assert!(participant.media.video_enabled);
    assert!(!participant.media.audio_enabled);
    assert!(!participant.media.screen_sharing);
    assert!(!participant.hand_raised);

    server.await.unwrap();
    client.disconnect().await.unwrap();
}
