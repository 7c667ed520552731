use tokio::sync::{broadcast, watch};

use super::connection::ConnectionState;
use super::queue::OutboundQueue;
use crate::infrastructure::TaskManager;

/// Discrete session-level events surfaced to consumers.
///
/// Transient reconnects are lightly indicated; the two terminal variants are
/// emitted exactly once and require action from above (a fresh `connect()`
/// or re-authentication).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The connection state changed
    StateChanged(ConnectionState),
    /// A reconnect attempt is scheduled
    Reconnecting { attempt: u32 },
    /// Terminal: reconnect attempts exhausted
    ConnectionLost,
    /// Terminal: credential renewal failed after an auth-failure close
    AuthRequired,
}

/// Consolidated mutable state for a session client.
/// Using a single struct reduces lock contention.
pub struct ClientState {
    /// Frames buffered while disconnected
    pub outbound: OutboundQueue,

    /// Background task handles (read loop, heartbeat, timers)
    pub tasks: TaskManager,

    /// Whether the disconnect was caller-initiated (prevents auto-reconnect)
    pub was_manual_disconnect: bool,

    /// Consumers holding a live interest in the connection
    pub interest: usize,

    /// Sender side of the connection-state watch
    pub state_tx: watch::Sender<ConnectionState>,

    /// Sender side of the session-event stream
    pub event_tx: broadcast::Sender<SessionEvent>,
}

impl ClientState {
    pub fn new(queue_capacity: usize) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let (event_tx, _) = broadcast::channel(64);
        Self {
            outbound: OutboundQueue::new(queue_capacity),
            tasks: TaskManager::new(),
            was_manual_disconnect: false,
            interest: 0,
            state_tx,
            event_tx,
        }
    }

    /// Notify state watchers; lagging or absent receivers are fine
    pub fn notify_state(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
        if self.event_tx.send(SessionEvent::StateChanged(state)).is_err() {
            tracing::trace!(?state, "no event receivers for state change");
        }
    }

    /// Emit a discrete session event
    pub fn emit(&self, event: SessionEvent) {
        if self.event_tx.send(event.clone()).is_err() {
            tracing::debug!(?event, "no event receivers; event dropped");
        }
    }
}
