//! Application container wiring the stores together.
//!
//! `CareCore` owns the session store, notification queue and patient
//! registry. Collaborators are passed in at construction so tests can swap
//! them for fakes.

use std::sync::Arc;

use tracing::{debug, info};

use crate::auth::{IdentityProvider, Session, SessionStatus, SessionStore};
use crate::config::Config;
use crate::guard::{self, Destination};
use crate::notifications::NotificationQueue;
use crate::patients::PatientRegistry;
use crate::routes::{self, NavItem, Route};
use crate::storage::Persistence;

pub struct CareCore {
    session: Arc<SessionStore>,
    notifications: Arc<NotificationQueue>,
    patients: PatientRegistry,
}

impl CareCore {
    pub fn new(
        persistence: Arc<dyn Persistence>,
        identity: Arc<dyn IdentityProvider>,
        config: &Config,
    ) -> Self {
        debug!(expiry_ms = config.notification_expiry_ms, "Creating core");
        Self {
            session: Arc::new(SessionStore::new(persistence, identity)),
            notifications: Arc::new(NotificationQueue::with_default_expiry(
                config.notification_expiry_ms,
            )),
            patients: PatientRegistry::new(),
        }
    }

    /// Resolve the session from storage. See `SessionStore::initialize`.
    pub async fn initialize(&self) -> SessionStatus {
        let status = self.session.initialize().await;
        info!(?status, "Session resolved");
        status
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn notifications(&self) -> &Arc<NotificationQueue> {
        &self.notifications
    }

    pub fn patients(&self) -> &PatientRegistry {
        &self.patients
    }

    pub fn patients_mut(&mut self) -> &mut PatientRegistry {
        &mut self.patients
    }

    /// Evaluate the guard for a navigation request
    pub fn navigate(&self, route: Route) -> Destination {
        let destination = guard::resolve(route, &self.session.snapshot());
        debug!(?route, ?destination, "Navigation");
        destination
    }

    /// Navigate by path. Unknown paths fall back to the home page.
    pub fn navigate_path(&self, path: &str) -> Destination {
        self.navigate(Route::from_path(path).unwrap_or(Route::Home))
    }

    /// Header links for the current session
    pub fn nav_items(&self) -> &'static [NavItem] {
        routes::nav_items(self.session.is_authenticated())
    }

    /// Sign out and return where the user should land
    pub fn logout(&self) -> Route {
        self.session.logout();
        Route::Home
    }

    pub fn snapshot(&self) -> Session {
        self.session.snapshot()
    }
}
