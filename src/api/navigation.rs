use tracing::warn;

/// Where the user is sent when the session can no longer be recovered.
pub const LOGIN_PATH: &str = "/login";

/// Side effect run when authentication is torn down.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    fn redirect(&self, location: &str);
}

/// Navigator for terminal use: there is no page to leave, so it tells the
/// user to sign in again.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn redirect(&self, location: &str) {
        warn!(location, "Session ended, please log in again");
    }
}
