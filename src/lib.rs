pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod store;
pub mod todos;

use std::sync::Arc;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use api::{ApiClient, CancelHandle, Navigator, PendingRequest, RequestSpec, TracingNavigator};
pub use auth::{AuthApi, AuthSession, SessionState, UnverifiedIdentity};
pub use store::{FileStore, MemoryStore, TokenPair, TokenStore};
pub use todos::{EditScope, TodoService};

/// Everything a front end needs, wired together once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub tokens: TokenStore,
    pub session: AuthSession,
    pub api: ApiClient,
}

impl AppState {
    /// Opens the file-backed token store from `store.path` and restores the session.
    pub fn new(config: Settings) -> Result<Self> {
        let backend = FileStore::open(&config.store.path)?;
        Self::with_parts(config, TokenStore::new(Arc::new(backend)), Arc::new(TracingNavigator))
    }

    pub fn with_parts(
        config: Settings,
        tokens: TokenStore,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let api = ApiClient::new(&config.api, tokens.clone(), navigator.clone())?;
        let session = AuthSession::restore(tokens.clone(), navigator)?;

        Ok(Self {
            config: Arc::new(config),
            tokens,
            session,
            api,
        })
    }

    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.api.clone(), self.session.clone())
    }

    pub fn todos(&self) -> TodoService {
        TodoService::new(self.api.clone())
    }

    /// Services whose requests are all cancelled by `handle`.
    pub fn scoped(&self, handle: &CancelHandle) -> (AuthApi, TodoService) {
        let api = self.api.with_cancel(handle);
        (
            AuthApi::new(api.clone(), self.session.clone()),
            TodoService::new(api),
        )
    }
}
