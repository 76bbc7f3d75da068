//! Authentication for the todo client
//!
//! Token decoding for display, the login session, and the auth endpoints.

mod api;
mod identity;
mod session;

pub use api::{AuthApi, AuthResponse, UserProfile};
pub use identity::{decode_identity, UnverifiedIdentity};
pub use session::{AuthSession, SessionState};
