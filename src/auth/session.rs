use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::identity::{decode_identity, UnverifiedIdentity};
use crate::api::{Navigator, LOGIN_PATH};
use crate::store::{TokenPair, TokenStore};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Initializing,
    Authenticated(UnverifiedIdentity),
    Unauthenticated,
}

impl SessionState {
    pub fn user(&self) -> Option<&UnverifiedIdentity> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

#[derive(Debug)]
struct Snapshot {
    state: SessionState,
    // Access token the state was derived from.
    derived_from: Option<String>,
}

struct Shared {
    snapshot: watch::Sender<Snapshot>,
    state_tx: watch::Sender<SessionState>,
}

impl Shared {
    fn is_loading(&self) -> bool {
        self.snapshot.borrow().state == SessionState::Initializing
    }

    fn apply(&self, token: Option<String>) -> SessionState {
        let state = match token.as_deref().and_then(decode_identity) {
            Some(user) => SessionState::Authenticated(user),
            None => SessionState::Unauthenticated,
        };

        self.snapshot.send_replace(Snapshot {
            state: state.clone(),
            derived_from: token,
        });
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state.clone();
                true
            }
        });
        state
    }
}

/// Login state for one client, handed explicitly to whatever needs it.
///
/// The identity is always derived from the access token in the
/// [`TokenStore`]. Writes through any clone of the store (the HTTP client
/// rotating or clearing the tokens) re-derive it immediately, and a write
/// from outside this process is picked up on the next read.
#[derive(Clone)]
pub struct AuthSession {
    tokens: TokenStore,
    navigator: Arc<dyn Navigator>,
    shared: Arc<Shared>,
}

impl AuthSession {
    /// A session in the `Initializing` state. Call [`AuthSession::initialize`]
    /// before reading it.
    pub fn new(tokens: TokenStore, navigator: Arc<dyn Navigator>) -> Self {
        let (snapshot, _) = watch::channel(Snapshot {
            state: SessionState::Initializing,
            derived_from: None,
        });
        let (state_tx, _) = watch::channel(SessionState::Initializing);
        let shared = Arc::new(Shared { snapshot, state_tx });

        let listener = Arc::downgrade(&shared);
        let registered = tokens.on_change(move |token| {
            let Some(shared) = listener.upgrade() else {
                return;
            };
            if !shared.is_loading() {
                debug!("Token store changed, re-deriving identity");
                shared.apply(token.map(str::to_string));
            }
        });
        if let Err(e) = registered {
            warn!("Session will only see token changes on read: {}", e);
        }

        Self {
            tokens,
            navigator,
            shared,
        }
    }

    /// Builds the session and restores it from the stored access token.
    pub fn restore(tokens: TokenStore, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let session = Self::new(tokens, navigator);
        session.initialize()?;
        Ok(session)
    }

    /// Leaves `Initializing` by decoding the stored access token once.
    /// Does nothing on an already initialised session. Never touches the network.
    pub fn initialize(&self) -> Result<()> {
        if !self.shared.is_loading() {
            return Ok(());
        }

        let token = self.tokens.access_token()?;
        let state = self.shared.apply(token);
        match &state {
            SessionState::Authenticated(user) => {
                info!(user_id = %user.id, "Restored session from stored token")
            }
            _ => debug!("No usable stored session"),
        }
        Ok(())
    }

    pub fn login(&self, access_token: &str, refresh_token: &str) -> Result<()> {
        self.tokens
            .save(&TokenPair::new(access_token, refresh_token))?;

        match self.shared.apply(Some(access_token.to_string())) {
            SessionState::Authenticated(user) => {
                info!(user_id = %user.id, email = %user.email, "Logged in");
            }
            _ => warn!("Login stored tokens but the access token could not be decoded"),
        }
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        self.tokens.clear()?;
        self.shared.apply(None);
        info!("Logged out");
        self.navigator.redirect(LOGIN_PATH);
        Ok(())
    }

    pub fn state(&self) -> Result<SessionState> {
        self.sync()?;
        Ok(self.shared.snapshot.borrow().state.clone())
    }

    pub fn current_user(&self) -> Result<Option<UnverifiedIdentity>> {
        Ok(self.state()?.user().cloned())
    }

    pub fn is_authenticated(&self) -> Result<bool> {
        Ok(self.state()?.is_authenticated())
    }

    pub fn is_loading(&self) -> bool {
        self.shared.is_loading()
    }

    /// Read-only view of state transitions, including the ones caused by
    /// the HTTP client rotating or clearing the tokens.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state_tx.subscribe()
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    // Another process may have written the backing file.
    fn sync(&self) -> Result<()> {
        if self.is_loading() {
            return Ok(());
        }
        let current = self.tokens.access_token()?;
        if self.shared.snapshot.borrow().derived_from != current {
            debug!("Stored access token changed, re-deriving identity");
            self.shared.apply(current);
        }
        Ok(())
    }
}
