use std::collections::HashMap;

use tokio::time::Instant;

use super::participant::{MediaState, Participant};
use crate::messaging::SubscriptionHandle;

/// Mutable state for one joined room.
///
/// Owned exclusively by the room coordinator; typing entries map a user id to
/// the instant their indicator expires. An entry whose expiry has passed is
/// logically absent even before the sweep prunes it.
pub struct RoomState {
    pub joined: bool,
    pub participants: HashMap<String, Participant>,
    pub typing: HashMap<String, Instant>,
    pub local_media: MediaState,
    pub local_hand_raised: bool,
    /// Deadline at which the local typing debounce sends a stop frame;
    /// `None` while not typing
    pub typing_deadline: Option<Instant>,
    /// Liveness token for the debounce watcher task. The watcher owns the
    /// strong side; if it was aborted (teardown kills all tasks) the upgrade
    /// fails and the next start_typing spawns a fresh one.
    pub typing_watcher: Option<std::sync::Weak<()>>,
    pub subscriptions: Vec<SubscriptionHandle>,
}

impl RoomState {
    pub fn new() -> Self {
        Self {
            joined: false,
            participants: HashMap::new(),
            typing: HashMap::new(),
            local_media: MediaState::default(),
            local_hand_raised: false,
            typing_deadline: None,
            typing_watcher: None,
            subscriptions: Vec::new(),
        }
    }
}

impl Default for RoomState {
    fn default() -> Self {
        Self::new()
    }
}
