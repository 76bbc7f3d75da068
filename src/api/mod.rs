//! HTTP access to the todo backend.

mod cancel;
mod client;
mod navigation;
mod request;

pub use cancel::{CancelHandle, PendingRequest};
pub use client::{ApiClient, REFRESH_PATH};
#[cfg(test)]
pub use navigation::MockNavigator;
pub use navigation::{Navigator, TracingNavigator, LOGIN_PATH};
pub use request::{ApiResponse, RequestSpec};
