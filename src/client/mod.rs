// Module declarations
mod builder;
mod connection;
mod core;
mod queue;
mod state;

// Public API exports
pub use builder::{SessionBuilder, SessionOptions};
pub use connection::{ConnectionManager, ConnectionState};
pub use self::core::{InterestHandle, SessionClient};
pub use queue::{OutboundQueue, QueuedFrame};
pub use state::{ClientState, SessionEvent};
