//! Transient user-facing notifications.
//!
//! `NotificationQueue` keeps notifications in insertion order and gives each
//! one its own cancelable expiry timer. Timer handles are tracked by id and
//! are only reachable through `remove`/`clear_all`.

pub mod queue;

pub use queue::{NotificationQueue, DEFAULT_EXPIRY_MS};

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NotificationError {
    #[error("Notification message must not be empty")]
    EmptyMessage,

    #[error("Expiring notifications need a running Tokio runtime")]
    NoRuntime,
}

/// Unique notification identifier, fixed for the notification's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(Uuid);

impl NotificationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for NotificationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Advisory category. Only affects presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum NotificationKind {
    Success,
    Error,
    #[default]
    Info,
    Warning,
}

impl NotificationKind {
    pub fn label(&self) -> &'static str {
        match self {
            NotificationKind::Success => "Success",
            NotificationKind::Error => "Error",
            NotificationKind::Info => "Info",
            NotificationKind::Warning => "Warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Notification {
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub id: NotificationId,
    pub message: String,
    pub kind: NotificationKind,
    /// Requested lifetime; zero or negative never expires
    pub expiry_ms: i64,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn expires(&self) -> bool {
        self.expiry_ms > 0
    }

    pub fn age_seconds(&self) -> i64 {
        (Utc::now() - self.created_at).num_seconds()
    }

    /// Short relative age for toast lists
    pub fn age_display(&self) -> String {
        let seconds = self.age_seconds();
        if seconds < 5 {
            // Also covers clock skew
            "just now".to_string()
        } else if seconds < 60 {
            format!("{}s ago", seconds)
        } else if seconds < 3600 {
            format!("{}m ago", seconds / 60)
        } else {
            format!("{}h ago", seconds / 3600)
        }
    }
}
