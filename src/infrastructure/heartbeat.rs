use std::sync::Weak;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};

use crate::client::ConnectionManager;
use crate::messaging::FrameType;
use crate::types::constants::DEFAULT_HEARTBEAT_INTERVAL_MS;
use crate::types::Frame;

/// Sends an application-level `ping` frame on a fixed interval while the
/// connection is up.
///
/// The task is tied to one physical connection generation and exits as soon
/// as that generation is superseded, so a reconnect never leaves two
/// heartbeats running.
pub struct HeartbeatManager {
    interval: Duration,
    connection: Weak<ConnectionManager>,
    generation: u64,
}

impl HeartbeatManager {
    pub fn new(connection: Weak<ConnectionManager>, generation: u64) -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_HEARTBEAT_INTERVAL_MS),
            connection,
            generation,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub async fn run(self) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // the first tick completes immediately; skip it so the first ping
        // waits a full interval after connect
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let connection = match self.connection.upgrade() {
                Some(connection) => connection,
                None => break,
            };
            if !connection.is_current(self.generation) {
                tracing::debug!(generation = self.generation, "heartbeat task superseded");
                break;
            }
            if !connection.is_connected().await {
                continue;
            }

            match connection.send_frame(&Frame::new(FrameType::Ping)).await {
                Ok(()) => tracing::debug!("heartbeat ping sent"),
                Err(e) => tracing::warn!("heartbeat send failed: {}", e),
            }
        }
    }
}
