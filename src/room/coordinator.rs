use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Deserialize;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::participant::{ConnectionQuality, MediaStatePatch, Participant};
use super::state::RoomState;
use crate::client::SessionClient;
use crate::messaging::{Channel, FrameType};
use crate::types::constants::TYPING_SWEEP_INTERVAL_MS;
use crate::types::{Frame, Result};

#[derive(Debug, Deserialize)]
struct UserEvent {
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct MediaChangeEvent {
    user_id: String,
    #[serde(flatten)]
    patch: MediaStatePatch,
}

#[derive(Debug, Deserialize)]
struct HandRaiseEvent {
    user_id: String,
    raised: bool,
}

#[derive(Debug, Deserialize)]
struct StatusEvent {
    user_id: String,
    connection_quality: ConnectionQuality,
}

/// Session-scoped room state built on top of the dispatcher: participant
/// presence, per-user typing indicators, media-state sync, hand raises and
/// moderation.
///
/// A coordinator registers its dispatcher subscriptions on creation and
/// removes them when dropped. All frames it sends are scoped to its room;
/// inbound frames carrying a different room id are ignored.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use telecare_realtime::{Credential, SessionClient, SessionOptions, StaticTokenProvider};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let client = SessionClient::new(
/// #     "wss://clinic.example.com/api",
/// #     Credential::new("access-token", None, Duration::from_secs(3600)),
/// #     Arc::new(StaticTokenProvider::new("access-token", Duration::from_secs(3600))),
/// #     SessionOptions::default(),
/// # )?;
/// # client.connect().await?;
/// let room = client.room("consult-123", "user-1").await;
/// room.join().await?;
/// room.set_video(true).await?;
///
/// for participant in room.participants() {
///     println!("{} video={}", participant.user_id, participant.media.video_enabled);
/// }
/// # Ok(())
/// # }
/// ```
pub struct RoomCoordinator {
    room_id: String,
    local_user_id: String,
    client: SessionClient,
    state: Mutex<RoomState>,
}

impl RoomCoordinator {
    pub(crate) async fn attach(
        client: SessionClient,
        room_id: String,
        local_user_id: String,
    ) -> Arc<Self> {
        let coordinator = Arc::new(Self {
            room_id,
            local_user_id,
            client: client.clone(),
            state: Mutex::new(RoomState::new()),
        });

        let weak = Arc::downgrade(&coordinator);
        let room_subscription = client.subscribe(
            Channel::Room,
            Arc::new(move |frame| {
                if let Some(coordinator) = weak.upgrade() {
                    coordinator.apply_room_frame(frame);
                }
            }),
        );
        let weak = Arc::downgrade(&coordinator);
        let presence_subscription = client.subscribe(
            Channel::Presence,
            Arc::new(move |frame| {
                if let Some(coordinator) = weak.upgrade() {
                    coordinator.apply_presence_frame(frame);
                }
            }),
        );
        {
            let mut state = coordinator.state.lock().expect("room state poisoned");
            state.subscriptions.push(room_subscription);
            state.subscriptions.push(presence_subscription);
        }

        // a remote stop frame can be lost with the connection; the sweep and
        // the lazy filter in typing_users are the liveness guarantee
        let weak = Arc::downgrade(&coordinator);
        client
            .spawn_task(async move {
                let mut ticker =
                    time::interval(Duration::from_millis(TYPING_SWEEP_INTERVAL_MS));
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    let Some(coordinator) = weak.upgrade() else { break };
                    let now = Instant::now();
                    coordinator
                        .state
                        .lock()
                        .expect("room state poisoned")
                        .typing
                        .retain(|_, expiry| *expiry > now);
                }
            })
            .await;

        coordinator
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn is_joined(&self) -> bool {
        self.state.lock().expect("room state poisoned").joined
    }

    /// Sends the join intent. The participant set fills up from the server's
    /// `user_joined` events.
    pub async fn join(&self) -> Result<()> {
        if self.is_joined() {
            return Ok(());
        }
        tracing::info!(room_id = %self.room_id, "joining room");
        self.client
            .send(
                Frame::new(FrameType::JoinRoom)
                    .with_room(&self.room_id)
                    .with_payload(serde_json::json!({ "user_id": self.local_user_id })),
            )
            .await?;
        self.state.lock().expect("room state poisoned").joined = true;
        Ok(())
    }

    /// Leaves the room and clears the local participant view
    pub async fn leave(&self) -> Result<()> {
        tracing::info!(room_id = %self.room_id, "leaving room");
        self.client
            .send(
                Frame::new(FrameType::LeaveRoom)
                    .with_room(&self.room_id)
                    .with_payload(serde_json::json!({ "user_id": self.local_user_id })),
            )
            .await?;

        let mut state = self.state.lock().expect("room state poisoned");
        state.joined = false;
        state.participants.clear();
        state.typing.clear();
        state.typing_deadline = None;
        Ok(())
    }

    /// Signals that the local user is typing.
    ///
    /// Each call sends a typing frame and re-arms the inactivity debounce;
    /// once input stops for the debounce window a single stop frame goes out.
    pub async fn start_typing(self: &Arc<Self>) -> Result<()> {
        self.client
            .send(
                Frame::new(FrameType::UserTyping)
                    .with_room(&self.room_id)
                    .with_payload(serde_json::json!({ "user_id": self.local_user_id })),
            )
            .await?;

        let debounce = self.client.options().typing_debounce;
        let token = {
            let mut state = self.state.lock().expect("room state poisoned");
            state.typing_deadline = Some(Instant::now() + debounce);
            let watcher_alive = state
                .typing_watcher
                .as_ref()
                .is_some_and(|watcher| watcher.upgrade().is_some());
            if watcher_alive {
                None
            } else {
                let token = Arc::new(());
                state.typing_watcher = Some(Arc::downgrade(&token));
                Some(token)
            }
        };

        if let Some(token) = token {
            let coordinator = Arc::clone(self);
            self.client
                .spawn_task(async move {
                    let _token = token;
                    loop {
                        let deadline = {
                            coordinator
                                .state
                                .lock()
                                .expect("room state poisoned")
                                .typing_deadline
                        };
                        let Some(deadline) = deadline else { break };

                        if Instant::now() >= deadline {
                            coordinator
                                .state
                                .lock()
                                .expect("room state poisoned")
                                .typing_deadline = None;
                            if let Err(e) = coordinator.send_typing_stop().await {
                                tracing::warn!("typing stop frame failed: {}", e);
                            }
                            break;
                        }
                        time::sleep_until(deadline).await;
                    }
                })
                .await;
        }
        Ok(())
    }

    /// Explicitly stops the local typing indicator
    pub async fn stop_typing(&self) -> Result<()> {
        self.state
            .lock()
            .expect("room state poisoned")
            .typing_deadline = None;
        self.send_typing_stop().await
    }

    async fn send_typing_stop(&self) -> Result<()> {
        self.client
            .send(
                Frame::new(FrameType::UserStoppedTyping)
                    .with_room(&self.room_id)
                    .with_payload(serde_json::json!({ "user_id": self.local_user_id })),
            )
            .await
    }

    pub async fn set_audio(&self, enabled: bool) -> Result<()> {
        let patch = MediaStatePatch {
            audio_enabled: Some(enabled),
            ..Default::default()
        };
        self.state
            .lock()
            .expect("room state poisoned")
            .local_media
            .audio_enabled = enabled;
        self.send_media_patch(patch).await
    }

    pub async fn set_video(&self, enabled: bool) -> Result<()> {
        let patch = MediaStatePatch {
            video_enabled: Some(enabled),
            ..Default::default()
        };
        self.state
            .lock()
            .expect("room state poisoned")
            .local_media
            .video_enabled = enabled;
        self.send_media_patch(patch).await
    }

    pub async fn set_screen_share(&self, enabled: bool) -> Result<()> {
        let patch = MediaStatePatch {
            screen_sharing: Some(enabled),
            ..Default::default()
        };
        self.state
            .lock()
            .expect("room state poisoned")
            .local_media
            .screen_sharing = enabled;
        self.send_media_patch(patch).await
    }

    async fn send_media_patch(&self, patch: MediaStatePatch) -> Result<()> {
        let mut payload = serde_json::to_value(patch)?;
        if let Some(object) = payload.as_object_mut() {
            object.insert(
                "user_id".to_string(),
                serde_json::Value::String(self.local_user_id.clone()),
            );
        }
        self.client
            .send(
                Frame::new(FrameType::MediaStateChange)
                    .with_room(&self.room_id)
                    .with_payload(payload),
            )
            .await
    }

    pub async fn raise_hand(&self, raised: bool) -> Result<()> {
        self.state
            .lock()
            .expect("room state poisoned")
            .local_hand_raised = raised;
        self.client
            .send(
                Frame::new(FrameType::HandRaise)
                    .with_room(&self.room_id)
                    .with_payload(serde_json::json!({
                        "user_id": self.local_user_id,
                        "raised": raised,
                    })),
            )
            .await
    }

    /// Reports the local connection quality to the other participants
    pub async fn report_connection_quality(&self, quality: ConnectionQuality) -> Result<()> {
        self.client
            .send(
                Frame::new(FrameType::UpdateStatus)
                    .with_room(&self.room_id)
                    .with_payload(serde_json::json!({
                        "user_id": self.local_user_id,
                        "connection_quality": quality,
                    })),
            )
            .await
    }

    /// Moderator action: asks the server to remove a participant. The
    /// removed client reacts to the targeted frame itself; the transport
    /// enforces nothing.
    pub async fn kick(&self, user_id: &str) -> Result<()> {
        tracing::info!(room_id = %self.room_id, user_id, "requesting participant removal");
        self.client
            .send(
                Frame::new(FrameType::Kick)
                    .with_room(&self.room_id)
                    .with_recipient(user_id),
            )
            .await
    }

    /// Participants currently joined, in no particular order
    pub fn participants(&self) -> Vec<Participant> {
        self.state
            .lock()
            .expect("room state poisoned")
            .participants
            .values()
            .cloned()
            .collect()
    }

    pub fn participant(&self, user_id: &str) -> Option<Participant> {
        self.state
            .lock()
            .expect("room state poisoned")
            .participants
            .get(user_id)
            .cloned()
    }

    /// Users with a live typing indicator. Expired entries are filtered out
    /// even if the sweep has not pruned them yet.
    pub fn typing_users(&self) -> Vec<String> {
        let now = Instant::now();
        self.state
            .lock()
            .expect("room state poisoned")
            .typing
            .iter()
            .filter(|(_, expiry)| **expiry > now)
            .map(|(user_id, _)| user_id.clone())
            .collect()
    }

    pub fn local_media(&self) -> super::participant::MediaState {
        self.state.lock().expect("room state poisoned").local_media
    }

    fn is_for_other_room(&self, frame: &Frame) -> bool {
        match &frame.room_id {
            Some(room_id) => room_id != &self.room_id,
            None => false,
        }
    }

    fn apply_room_frame(&self, frame: &Frame) {
        if self.is_for_other_room(frame) {
            return;
        }
        match &frame.kind {
            FrameType::UserJoined => {
                match serde_json::from_value::<Participant>(frame.payload.clone()) {
                    Ok(participant) => {
                        tracing::debug!(user_id = %participant.user_id, "participant joined");
                        let mut state = self.state.lock().expect("room state poisoned");
                        state
                            .participants
                            .insert(participant.user_id.clone(), participant);
                    }
                    Err(e) => tracing::warn!("malformed user_joined payload: {}", e),
                }
            }
            FrameType::UserLeft => {
                if let Some(event) = self.parse_payload::<UserEvent>(frame) {
                    tracing::debug!(user_id = %event.user_id, "participant left");
                    let mut state = self.state.lock().expect("room state poisoned");
                    state.participants.remove(&event.user_id);
                    state.typing.remove(&event.user_id);
                }
            }
            FrameType::MediaStateChange => {
                if let Some(event) = self.parse_payload::<MediaChangeEvent>(frame) {
                    let mut state = self.state.lock().expect("room state poisoned");
                    if let Some(participant) = state.participants.get_mut(&event.user_id) {
                        participant.media.apply(&event.patch);
                    }
                }
            }
            FrameType::HandRaise => {
                if let Some(event) = self.parse_payload::<HandRaiseEvent>(frame) {
                    let mut state = self.state.lock().expect("room state poisoned");
                    if let Some(participant) = state.participants.get_mut(&event.user_id) {
                        participant.hand_raised = event.raised;
                    }
                }
            }
            FrameType::UpdateStatus => {
                if let Some(event) = self.parse_payload::<StatusEvent>(frame) {
                    let mut state = self.state.lock().expect("room state poisoned");
                    if let Some(participant) = state.participants.get_mut(&event.user_id) {
                        participant.connection_quality = event.connection_quality;
                    }
                }
            }
            FrameType::Kick => self.apply_kick(frame),
            _ => {}
        }
    }

    fn apply_presence_frame(&self, frame: &Frame) {
        if self.is_for_other_room(frame) {
            return;
        }
        match &frame.kind {
            FrameType::UserTyping => {
                if let Some(event) = self.parse_payload::<UserEvent>(frame) {
                    if event.user_id == self.local_user_id {
                        return;
                    }
                    let expiry = Instant::now() + self.client.options().typing_expiry;
                    self.state
                        .lock()
                        .expect("room state poisoned")
                        .typing
                        .insert(event.user_id, expiry);
                }
            }
            FrameType::UserStoppedTyping => {
                if let Some(event) = self.parse_payload::<UserEvent>(frame) {
                    self.state
                        .lock()
                        .expect("room state poisoned")
                        .typing
                        .remove(&event.user_id);
                }
            }
            _ => {}
        }
    }

    /// A kick addressed to the local user tears the session down; that is a
    /// policy decision made here, above the transport.
    fn apply_kick(&self, frame: &Frame) {
        let target = frame.to_user_id.as_deref();
        if target == Some(self.local_user_id.as_str()) {
            tracing::warn!(room_id = %self.room_id, "removed from room by moderator");
            {
                let mut state = self.state.lock().expect("room state poisoned");
                state.joined = false;
                state.participants.clear();
                state.typing.clear();
                state.typing_deadline = None;
            }
            let client = self.client.clone();
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    if let Err(e) = client.disconnect().await {
                        tracing::warn!("disconnect after kick failed: {}", e);
                    }
                });
            }
        } else if let Some(user_id) = target {
            self.state
                .lock()
                .expect("room state poisoned")
                .participants
                .remove(user_id);
        }
    }

    fn parse_payload<T: serde::de::DeserializeOwned>(&self, frame: &Frame) -> Option<T> {
        match serde_json::from_value(frame.payload.clone()) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!(kind = %frame.kind, "malformed payload: {}", e);
                None
            }
        }
    }
}

impl Drop for RoomCoordinator {
    fn drop(&mut self) {
        // scoped-resource rule: subscriptions registered on attach are
        // released on teardown
        if let Ok(state) = self.state.get_mut() {
            for handle in state.subscriptions.drain(..) {
                self.client.dispatcher().unsubscribe(handle);
            }
        }
    }
}
