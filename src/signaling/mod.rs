//! Stateless relay for call-setup payloads.
//!
//! The peer media path lives outside this crate; offers, answers and ICE
//! candidates pass through here as opaque JSON addressed to a specific peer.
//! Nothing in the payload is inspected or validated.

use std::sync::Arc;

use crate::client::SessionClient;
use crate::messaging::{Channel, FrameType, SubscriptionHandle};
use crate::types::{Frame, Result};

pub struct SignalingRelay {
    client: SessionClient,
}

impl SignalingRelay {
    pub fn new(client: SessionClient) -> Self {
        Self { client }
    }

    pub async fn send_offer(&self, to_user_id: &str, payload: serde_json::Value) -> Result<()> {
        self.relay(FrameType::WebrtcOffer, to_user_id, payload).await
    }

    pub async fn send_answer(&self, to_user_id: &str, payload: serde_json::Value) -> Result<()> {
        self.relay(FrameType::WebrtcAnswer, to_user_id, payload)
            .await
    }

    pub async fn send_ice_candidate(
        &self,
        to_user_id: &str,
        payload: serde_json::Value,
    ) -> Result<()> {
        self.relay(FrameType::WebrtcIceCandidate, to_user_id, payload)
            .await
    }

    /// Hands inbound signaling frames to the media-transport collaborator.
    /// The callback owns interpretation; the relay stays opaque.
    pub fn on_signal(
        &self,
        callback: impl Fn(&Frame) + Send + Sync + 'static,
    ) -> SubscriptionHandle {
        self.client
            .dispatcher()
            .subscribe(Channel::Signaling, Arc::new(callback))
    }

    /// Removes a signaling callback; idempotent
    pub fn off_signal(&self, handle: SubscriptionHandle) {
        self.client.dispatcher().unsubscribe(handle);
    }

    async fn relay(
        &self,
        kind: FrameType,
        to_user_id: &str,
        payload: serde_json::Value,
    ) -> Result<()> {
        self.client
            .send(Frame::new(kind).with_recipient(to_user_id).with_payload(payload))
            .await
    }
}
