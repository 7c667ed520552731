use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::types::constants::frame_types;

/// Logical fan-out channels consumers subscribe to.
///
/// A frame type maps to zero or more channels; every callback registered on a
/// matched channel sees the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Chat message frames
    Chat,
    /// Server-pushed notifications (toasts)
    Notification,
    /// Typing indicators and join/leave presence
    Presence,
    /// Room-scoped events (participants, media state, moderation)
    Room,
    /// Opaque call-setup payloads (offer/answer/candidate)
    Signaling,
    /// Connection-level events (connection_success, error, auth_warning)
    Lifecycle,
}

/// Typed frame discriminants
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FrameType {
    Ping,
    Pong,
    JoinRoom,
    LeaveRoom,
    UserTyping,
    UserStoppedTyping,
    ChatMessage,
    MediaStateChange,
    HandRaise,
    UpdateStatus,
    Kick,
    WebrtcOffer,
    WebrtcAnswer,
    WebrtcIceCandidate,
    ConnectionSuccess,
    UserJoined,
    UserLeft,
    Notification,
    Error,
    AuthWarning,
    /// Unrecognized discriminant, preserved verbatim for forward compatibility
    Unknown(String),
}

impl FrameType {
    /// Parse a wire discriminant string
    pub fn parse(s: &str) -> Self {
        match s {
            frame_types::PING => Self::Ping,
            frame_types::PONG => Self::Pong,
            frame_types::JOIN_ROOM => Self::JoinRoom,
            frame_types::LEAVE_ROOM => Self::LeaveRoom,
            frame_types::USER_TYPING => Self::UserTyping,
            frame_types::USER_STOPPED_TYPING => Self::UserStoppedTyping,
            frame_types::CHAT_MESSAGE => Self::ChatMessage,
            frame_types::MEDIA_STATE_CHANGE => Self::MediaStateChange,
            frame_types::HAND_RAISE => Self::HandRaise,
            frame_types::UPDATE_STATUS => Self::UpdateStatus,
            frame_types::KICK => Self::Kick,
            frame_types::WEBRTC_OFFER => Self::WebrtcOffer,
            frame_types::WEBRTC_ANSWER => Self::WebrtcAnswer,
            frame_types::WEBRTC_ICE_CANDIDATE => Self::WebrtcIceCandidate,
            frame_types::CONNECTION_SUCCESS => Self::ConnectionSuccess,
            frame_types::USER_JOINED => Self::UserJoined,
            frame_types::USER_LEFT => Self::UserLeft,
            frame_types::NOTIFICATION => Self::Notification,
            frame_types::ERROR => Self::Error,
            frame_types::AUTH_WARNING => Self::AuthWarning,
            _ => Self::Unknown(s.to_string()),
        }
    }

    /// Wire string for this discriminant
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ping => frame_types::PING,
            Self::Pong => frame_types::PONG,
            Self::JoinRoom => frame_types::JOIN_ROOM,
            Self::LeaveRoom => frame_types::LEAVE_ROOM,
            Self::UserTyping => frame_types::USER_TYPING,
            Self::UserStoppedTyping => frame_types::USER_STOPPED_TYPING,
            Self::ChatMessage => frame_types::CHAT_MESSAGE,
            Self::MediaStateChange => frame_types::MEDIA_STATE_CHANGE,
            Self::HandRaise => frame_types::HAND_RAISE,
            Self::UpdateStatus => frame_types::UPDATE_STATUS,
            Self::Kick => frame_types::KICK,
            Self::WebrtcOffer => frame_types::WEBRTC_OFFER,
            Self::WebrtcAnswer => frame_types::WEBRTC_ANSWER,
            Self::WebrtcIceCandidate => frame_types::WEBRTC_ICE_CANDIDATE,
            Self::ConnectionSuccess => frame_types::CONNECTION_SUCCESS,
            Self::UserJoined => frame_types::USER_JOINED,
            Self::UserLeft => frame_types::USER_LEFT,
            Self::Notification => frame_types::NOTIFICATION,
            Self::Error => frame_types::ERROR,
            Self::AuthWarning => frame_types::AUTH_WARNING,
            Self::Unknown(s) => s,
        }
    }

    /// Channels this frame type fans out to.
    ///
    /// Outbound-only types and the ping/pong control pair map to no channel at
    /// all; join/leave events are visible to both room and presence consumers.
    pub fn channels(&self) -> &'static [Channel] {
        match self {
            Self::ChatMessage => &[Channel::Chat],
            Self::Notification => &[Channel::Notification],
            Self::UserTyping | Self::UserStoppedTyping => &[Channel::Presence],
            Self::UserJoined | Self::UserLeft => &[Channel::Room, Channel::Presence],
            Self::MediaStateChange | Self::HandRaise | Self::UpdateStatus | Self::Kick => {
                &[Channel::Room]
            }
            Self::WebrtcOffer | Self::WebrtcAnswer | Self::WebrtcIceCandidate => {
                &[Channel::Signaling]
            }
            Self::ConnectionSuccess | Self::Error | Self::AuthWarning => &[Channel::Lifecycle],
            Self::Ping | Self::Pong | Self::JoinRoom | Self::LeaveRoom | Self::Unknown(_) => &[],
        }
    }
}

impl From<&str> for FrameType {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl std::fmt::Display for FrameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Serialized as a bare string so `Unknown` round-trips verbatim.
impl Serialize for FrameType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FrameType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}
