use serde::{Deserialize, Serialize};

use crate::messaging::FrameType;

/// One discrete message unit sent or received over the persistent connection.
///
/// Every frame carries a `type` discriminant that determines how it is routed;
/// the payload is an opaque JSON value whose shape depends on the type.
/// `to_user_id` addresses peer-directed frames (signaling, kicks), `room_id`
/// scopes room traffic, and `from_user_id` is filled in by the server on
/// inbound frames.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Frame {
    #[serde(rename = "type")]
    pub kind: FrameType,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_user_id: Option<String>,
}

impl Frame {
    pub fn new(kind: FrameType) -> Self {
        Self {
            kind,
            payload: serde_json::Value::Null,
            room_id: None,
            to_user_id: None,
            from_user_id: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_room(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }

    pub fn with_recipient(mut self, user_id: impl Into<String>) -> Self {
        self.to_user_id = Some(user_id.into());
        self
    }
}
