use serde::{Deserialize, Serialize};

/// Audio/video/screen-share flags for one participant.
///
/// Locally authoritative for the local user; for remote users the latest
/// received change wins, field by field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaState {
    #[serde(default)]
    pub audio_enabled: bool,
    #[serde(default)]
    pub video_enabled: bool,
    #[serde(default)]
    pub screen_sharing: bool,
}

/// Partial media-state update: only the fields present in the frame are
/// applied, leaving the rest untouched.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MediaStatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_sharing: Option<bool>,
}

impl MediaState {
    /// Last-write-wins per field
    pub fn apply(&mut self, patch: &MediaStatePatch) {
        if let Some(audio_enabled) = patch.audio_enabled {
            self.audio_enabled = audio_enabled;
        }
        if let Some(video_enabled) = patch.video_enabled {
            self.video_enabled = video_enabled;
        }
        if let Some(screen_sharing) = patch.screen_sharing {
            self.screen_sharing = screen_sharing;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Patient,
    Clinician,
    Moderator,
    #[default]
    Observer,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionQuality {
    #[default]
    Unknown,
    Poor,
    Fair,
    Good,
}

/// One participant currently joined to a room.
///
/// Created from a `user_joined` event (media off unless the frame says
/// otherwise), mutated by media/hand-raise/status events, removed on
/// `user_left` or a kick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub role: ParticipantRole,
    #[serde(default)]
    pub media: MediaState,
    #[serde(default)]
    pub hand_raised: bool,
    #[serde(default)]
    pub connection_quality: ConnectionQuality,
}
