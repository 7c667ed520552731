// Room module - participant presence, typing, media sync and moderation
mod coordinator;
mod participant;
mod state;

pub use coordinator::RoomCoordinator;
pub use participant::{
    ConnectionQuality, MediaState, MediaStatePatch, Participant, ParticipantRole,
};
pub use state::RoomState;
