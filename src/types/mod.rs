pub mod constants;
pub mod error;
pub mod frame;

pub use constants::*;
pub use error::{Result, SessionError};
pub use frame::Frame;
