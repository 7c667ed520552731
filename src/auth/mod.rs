// Auth module - credential consumption and renewal (issuance lives elsewhere)
mod credential;
mod provider;
mod store;

pub use credential::Credential;
pub use provider::{HttpTokenProvider, StaticTokenProvider, TokenProvider};
pub use store::CredentialStore;
