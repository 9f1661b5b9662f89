//! CareBridge core library.
//!
//! This crate holds the stateful part of the CareBridge front end:
//!
//! - `auth`: the session store, identity collaborator and credential token
//! - `guard`: the route guard deciding whether a protected view may render
//! - `routes`: the route table and navigation sets
//! - `notifications`: the timed, insertion-ordered notification queue
//! - `patients`: the in-memory patient registry
//! - `storage`: key/value persistence backends
//! - `config`: application configuration
//!
//! Presentation layers depend on this crate, subscribe to the stores and only
//! mutate them through the documented operations.

pub mod app;
pub mod auth;
pub mod config;
pub mod guard;
pub mod notifications;
pub mod patients;
pub mod routes;
pub mod storage;

pub use app::CareCore;
pub use auth::{
    IdentityError, IdentityProvider, PlaceholderIdentity, Session, SessionError, SessionStatus,
    SessionStore, User,
};
pub use config::{Config, StorageBackend};
pub use guard::{guard, resolve, Destination, GuardDecision};
pub use notifications::{
    Notification, NotificationError, NotificationId, NotificationKind, NotificationQueue,
    DEFAULT_EXPIRY_MS,
};
pub use patients::{Patient, PatientError, PatientRegistry};
pub use routes::{nav_items, NavItem, Route};
pub use storage::{FileStore, KeyringStore, MemoryStore, Persistence, StorageError};
