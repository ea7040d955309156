use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::storage::SessionStorage;
use crate::api::error::UNEXPECTED_RESPONSE_MESSAGE;

/// Storage key holding the serialized identity JSON
pub const USER_KEY: &str = "user";

/// Storage key holding the raw bearer token
pub const TOKEN_KEY: &str = "token";

/// The signed-in principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
}

impl Identity {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        is_admin: bool,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            is_admin,
        }
    }

    /// First letter of the name, uppercased, for avatars and compact lists
    pub fn initial(&self) -> char {
        self.name
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('?')
    }
}

/// Combined in-memory session state used to drive the UI.
///
/// `identity` and `token` are either both present or both absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub token: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Authenticating,
    Authenticated,
    AuthenticationFailed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Anonymous => write!(f, "Signed out"),
            SessionStatus::Authenticating => write!(f, "Signing in..."),
            SessionStatus::Authenticated => write!(f, "Signed in"),
            SessionStatus::AuthenticationFailed => write!(f, "Sign in failed"),
        }
    }
}

/// Single source of truth for who is logged in.
///
/// All mutation goes through the named actions below. Persistence is
/// best-effort: a failed write is logged and the in-memory transition still
/// happens, so the state is always one of the four well-defined statuses.
pub struct SessionStore<S: SessionStorage> {
    storage: S,
    state: SessionState,
    restored: bool,
}

impl<S: SessionStorage> SessionStore<S> {
    /// Create an anonymous store without reading storage
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            state: SessionState::default(),
            restored: false,
        }
    }

    /// Create a store and restore any persisted session
    pub fn open(storage: S) -> Self {
        let mut store = Self::new(storage);
        store.restore();
        store
    }

    /// Restore the persisted session. Only the first call reads storage.
    ///
    /// Returns true if a session was adopted.
    pub fn restore(&mut self) -> bool {
        if self.restored {
            return self.is_authenticated();
        }
        self.restored = true;

        let stored_user = self.read_entry(USER_KEY);
        let stored_token = self.read_entry(TOKEN_KEY);

        match (stored_user, stored_token) {
            (Some(user_json), Some(token)) => match serde_json::from_str::<Identity>(&user_json) {
                Ok(identity) => {
                    info!(user_id = %identity.id, "Restored persisted session");
                    self.state = SessionState {
                        identity: Some(identity),
                        token: Some(token),
                        loading: false,
                        error: None,
                    };
                    true
                }
                Err(e) => {
                    warn!(error = %e, "Persisted identity is corrupt, discarding session");
                    self.discard_persisted();
                    self.state = SessionState::default();
                    false
                }
            },
            (None, None) => {
                debug!("No persisted session");
                false
            }
            (user, token) => {
                debug!(
                    has_user = user.is_some(),
                    has_token = token.is_some(),
                    "Discarding half of a persisted session"
                );
                self.discard_persisted();
                self.state = SessionState::default();
                false
            }
        }
    }

    /// Mark a login attempt as in flight
    pub fn begin_login(&mut self) {
        self.state.loading = true;
        self.state.error = None;
    }

    /// Adopt a successful login, persisting identity and token together.
    ///
    /// A blank id or token is treated as a failed login, since restore reads
    /// empty entries as missing.
    pub fn login(&mut self, identity: Identity, token: String) {
        if identity.id.trim().is_empty() || token.trim().is_empty() {
            warn!("Refusing to adopt a session without user id or token");
            self.fail_login(UNEXPECTED_RESPONSE_MESSAGE);
            return;
        }
        self.persist_identity(&identity);
        if let Err(e) = self.storage.set(TOKEN_KEY, &token) {
            warn!(error = %e, "Failed to persist token");
        }

        info!(user_id = %identity.id, "Logged in");
        self.state = SessionState {
            identity: Some(identity),
            token: Some(token),
            loading: false,
            error: None,
        };
    }

    /// Record a failed login attempt. The session is reset to anonymous and
    /// the message is kept for display.
    pub fn fail_login(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(error = %message, "Login failed");
        self.discard_persisted();
        self.state = SessionState {
            identity: None,
            token: None,
            loading: false,
            error: Some(message),
        };
    }

    /// Log out. A no-op when already anonymous.
    pub fn logout(&mut self) {
        if self.state.identity.is_none() && self.state.token.is_none() {
            return;
        }
        self.discard_persisted();
        self.state.identity = None;
        self.state.token = None;
        self.state.loading = false;
        info!("Logged out");
    }

    /// Replace the identity (after a profile edit). The token is untouched.
    ///
    /// Ignored while anonymous: there is no token to pair the identity with.
    pub fn update_identity(&mut self, identity: Identity) {
        if !self.is_authenticated() {
            debug!("Ignoring identity update while anonymous");
            return;
        }
        self.persist_identity(&identity);
        self.state.identity = Some(identity);
    }

    pub fn clear_error(&mut self) {
        self.state.error = None;
    }

    // ===== Readers =====

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.state.identity.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.state.token.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.identity.is_some() && self.state.token.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.state.identity.as_ref().map(|i| i.is_admin).unwrap_or(false)
    }

    pub fn status(&self) -> SessionStatus {
        if self.state.loading {
            SessionStatus::Authenticating
        } else if self.is_authenticated() {
            SessionStatus::Authenticated
        } else if self.state.error.is_some() {
            SessionStatus::AuthenticationFailed
        } else {
            SessionStatus::Anonymous
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    // ===== Persistence helpers =====

    /// Read a non-empty entry, treating read failures as absent
    fn read_entry(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(Some(value)) if !value.is_empty() => Some(value),
            Ok(_) => None,
            Err(e) => {
                warn!(key = key, error = %e, "Failed to read persisted session entry");
                None
            }
        }
    }

    fn persist_identity(&mut self, identity: &Identity) {
        match serde_json::to_string(identity) {
            Ok(json) => {
                if let Err(e) = self.storage.set(USER_KEY, &json) {
                    warn!(error = %e, "Failed to persist identity");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize identity"),
        }
    }

    fn discard_persisted(&mut self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key = key, error = %e, "Failed to remove persisted session entry");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
