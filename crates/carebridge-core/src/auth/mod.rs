//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `SessionStore`: status and identity derived from a persisted credential token
//! - `IdentityProvider`: the collaborator that turns a token into a `User`
//!
//! The store starts in `Unknown` and resolves once from storage; afterwards it
//! only changes on explicit login/logout.

pub mod identity;
pub mod session;

pub use identity::{IdentityError, IdentityProvider, PlaceholderIdentity};
pub use session::{Session, SessionError, SessionStatus, SessionStore, User, TOKEN_KEY};
