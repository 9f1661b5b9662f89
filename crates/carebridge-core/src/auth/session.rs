use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::identity::IdentityProvider;
use crate::storage::Persistence;

/// Storage key holding the credential token
pub const TOKEN_KEY: &str = "auth_token";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("Credential token must not be empty")]
    EmptyToken,
}

/// Identity of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
        }
    }

    /// First word of the name, for compact display
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// Coarse session state, without the identity payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum SessionStatus {
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Snapshot of the session. The user only exists in the authenticated state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "user")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Session {
    Unknown,
    Authenticated(User),
    Unauthenticated,
}

impl Session {
    pub fn status(&self) -> SessionStatus {
        match self {
            Session::Unknown => SessionStatus::Unknown,
            Session::Authenticated(_) => SessionStatus::Authenticated,
            Session::Unauthenticated => SessionStatus::Unauthenticated,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Session::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }

    pub fn is_resolving(&self) -> bool {
        matches!(self, Session::Unknown)
    }
}

/// Outcome of reading the persisted token at startup
enum Resolution {
    Resolved(User),
    NoToken,
    /// Token present but the identity provider does not recognize it
    Rejected,
    /// Storage or identity provider failed; token is left in place
    Failed,
}

/// Single source of truth for who is signed in.
///
/// State is published through a `watch` channel so consumers can subscribe to
/// snapshots. The persisted token is only ever written from here.
pub struct SessionStore {
    persistence: Arc<dyn Persistence>,
    identity: Arc<dyn IdentityProvider>,
    state: watch::Sender<Session>,
    initialized: AtomicBool,
    /// Serializes token writes with the state change that accompanies them
    transition: Mutex<()>,
}

impl SessionStore {
    pub fn new(persistence: Arc<dyn Persistence>, identity: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(Session::Unknown);
        Self {
            persistence,
            identity,
            state,
            initialized: AtomicBool::new(false),
            transition: Mutex::new(()),
        }
    }

    /// Resolve the session from the persisted token.
    ///
    /// Runs once per store; later calls return the current status untouched.
    /// A login or logout that lands while resolution is in flight takes
    /// precedence over whatever the stored token resolves to.
    pub async fn initialize(&self) -> SessionStatus {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("Session store already initialized");
            return self.status();
        }

        let resolution = self.resolve_persisted().await;

        let _guard = self.transition.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.state.borrow().is_resolving() {
            debug!(status = ?self.status(), "Session changed during initialization, keeping it");
            return self.status();
        }

        let session = match resolution {
            Resolution::Resolved(user) => {
                info!(user_id = %user.id, "Restored session from stored token");
                Session::Authenticated(user)
            }
            Resolution::Rejected => {
                info!("Stored token not recognized, clearing it");
                if let Err(e) = self.persistence.delete(TOKEN_KEY) {
                    warn!(error = %e, "Failed to clear unrecognized token");
                }
                Session::Unauthenticated
            }
            Resolution::NoToken | Resolution::Failed => Session::Unauthenticated,
        };
        self.state.send_replace(session);
        self.status()
    }

    async fn resolve_persisted(&self) -> Resolution {
        let token = match self.persistence.get(TOKEN_KEY) {
            Ok(Some(token)) if !token.trim().is_empty() => token,
            Ok(_) => {
                debug!("No stored credential token");
                return Resolution::NoToken;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read credential token, treating as signed out");
                return Resolution::Failed;
            }
        };

        match self.identity.resolve(&token).await {
            Ok(Some(user)) => Resolution::Resolved(user),
            Ok(None) => Resolution::Rejected,
            Err(e) => {
                warn!(error = %e, "Identity lookup failed, treating as signed out");
                Resolution::Failed
            }
        }
    }

    /// Sign in with a token obtained by the external auth flow.
    ///
    /// The token is not validated here. Calling again replaces the user.
    pub fn login(&self, token: &str, user: User) -> Result<(), SessionError> {
        if token.trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }

        let _guard = self.transition.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = self.persistence.set(TOKEN_KEY, token) {
            warn!(
                error = %e,
                "Failed to persist credential token, session will not survive restart"
            );
        }
        info!(user_id = %user.id, "Signed in");
        self.state.send_replace(Session::Authenticated(user));
        Ok(())
    }

    /// Sign out. Safe to call when nobody is signed in.
    pub fn logout(&self) {
        let _guard = self.transition.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = self.persistence.delete(TOKEN_KEY) {
            warn!(error = %e, "Failed to clear credential token");
        }
        let previous = self.state.send_replace(Session::Unauthenticated);
        if previous.is_authenticated() {
            info!("Signed out");
        } else {
            debug!(previous = ?previous.status(), "Logout without active session");
        }
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.state.borrow().status()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn is_resolving(&self) -> bool {
        self.state.borrow().is_resolving()
    }

    /// Receive a fresh snapshot every time the session changes
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }
}

// ============================================================================
// Tests
// ============================================================================
