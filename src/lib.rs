//! # telecare-realtime
//!
//! The realtime session layer of a telehealth client: one multiplexed,
//! bidirectional, persistent WebSocket connection shared by chat, typing
//! indicators, presence, media-state sync and call-signaling relay.
//!
//! The session survives network blips with bounded exponential backoff,
//! rotates expiring credentials without dropping the user, buffers frames
//! sent while briefly disconnected, and fans inbound frames out to
//! independently registered consumers.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use telecare_realtime::{
//!     Channel, Credential, SessionClient, SessionOptions, StaticTokenProvider,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SessionClient::new(
//!         "wss://clinic.example.com/api",
//!         Credential::new("access-token", None, Duration::from_secs(3600)),
//!         Arc::new(StaticTokenProvider::new("access-token", Duration::from_secs(3600))),
//!         SessionOptions::default(),
//!     )?;
//!
//!     let _chat = client.subscribe(
//!         Channel::Chat,
//!         Arc::new(|frame| println!("chat: {}", frame.payload)),
//!     );
//!
//!     client.connect().await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod infrastructure;
pub mod messaging;
pub mod room;
pub mod signaling;
pub mod types;

pub use auth::{Credential, CredentialStore, HttpTokenProvider, StaticTokenProvider, TokenProvider};
pub use client::{
    ConnectionState, InterestHandle, SessionBuilder, SessionClient, SessionEvent, SessionOptions,
};
pub use messaging::{Channel, Dispatcher, FrameType, SubscriptionHandle};
pub use room::{
    ConnectionQuality, MediaState, MediaStatePatch, Participant, ParticipantRole, RoomCoordinator,
};
pub use signaling::SignalingRelay;
pub use types::{Frame, Result, SessionError};
