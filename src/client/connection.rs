use std::sync::atomic::{AtomicU64, Ordering};

use futures::stream::SplitSink;
use futures::SinkExt;
use tokio::net::TcpStream;
use tokio::sync::RwLock;
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::types::{Frame, Result, SessionError};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Session connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handshake in progress
    Connecting,
    /// Live, authenticated connection
    Connected,
    /// Lost the connection; backoff retries scheduled
    Reconnecting,
    /// No connection and none in progress (initial state)
    Disconnected,
    /// Terminal: intentional disconnect, exhausted retries, or failed
    /// re-authentication. Recovery requires a new `connect()` call.
    Closed,
}

/// Owns the single live WebSocket write half, the connection state, and the
/// generation counter that tags each physical connection.
///
/// At most one underlying connection is live per session. Every physical
/// connection gets a fresh generation number; events carrying a superseded
/// generation are ignored, which is what prevents a stale socket's close or
/// message events from racing a replacement connection.
pub struct ConnectionManager {
    writer: RwLock<Option<WsSink>>,
    state: RwLock<ConnectionState>,
    generation: AtomicU64,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            writer: RwLock::new(None),
            state: RwLock::new(ConnectionState::Disconnected),
            generation: AtomicU64::new(0),
        }
    }

    /// Sets the write sink for a newly opened connection
    pub async fn set_writer(&self, writer: WsSink) {
        let mut guard = self.writer.write().await;
        *guard = Some(writer);
    }

    /// Drops the writer without a close handshake (connection already dead)
    pub async fn clear_writer(&self) {
        let mut guard = self.writer.write().await;
        *guard = None;
    }

    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    pub async fn set_state(&self, new_state: ConnectionState) {
        let mut state = self.state.write().await;
        *state = new_state;
    }

    pub async fn is_connected(&self) -> bool {
        *self.state.read().await == ConnectionState::Connected
    }

    /// Current connection generation
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Allocates the generation for a new physical connection, making every
    /// earlier generation stale
    pub fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Invalidates the current connection's events without opening a new one
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    /// Serializes a frame and sends it over the live connection
    pub async fn send_frame(&self, frame: &Frame) -> Result<()> {
        let json = serde_json::to_string(frame)?;

        let mut guard = self.writer.write().await;
        match guard.as_mut() {
            Some(ws) => {
                ws.send(Message::Text(json.into())).await?;
                Ok(())
            }
            None => Err(SessionError::NotConnected),
        }
    }

    /// Closes the live connection gracefully, if any
    pub async fn close(&self) -> Result<()> {
        let mut guard = self.writer.write().await;
        if let Some(ws) = guard.as_mut() {
            ws.close().await?;
        }
        *guard = None;
        Ok(())
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
