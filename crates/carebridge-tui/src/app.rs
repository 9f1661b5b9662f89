//! Application state management for the CareBridge TUI.
//!
//! `App` holds the core stores, the latest snapshots read from them, and the
//! purely visual state (current page, login form, overlays). It only changes
//! the stores through their public operations.

use std::path::PathBuf;

use carebridge_core::guard::Destination;
use carebridge_core::{
    CareCore, Config, NavItem, Notification, NotificationKind, Patient, Route, Session, User,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for the name field.
const MAX_NAME_LENGTH: usize = 50;

/// Maximum length for the email field.
const MAX_EMAIL_LENGTH: usize = 80;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Sample records for the patients page, added one at a time with `a`
const DEMO_PATIENTS: [(&str, u32, Option<&str>); 4] = [
    ("Amara Okafor", 29, Some("Prenatal care")),
    ("Lucia Mendes", 41, None),
    ("Grace Wanjiru", 35, Some("Postnatal follow-up")),
    ("Hana Sato", 52, Some("Hypertension")),
];

// ============================================================================
// UI State Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    LoggingIn,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Focused element in the login dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Name,
    Email,
    Password,
    Button,
}

impl LoginFocus {
    pub fn next(&self) -> Self {
        match self {
            LoginFocus::Name => LoginFocus::Email,
            LoginFocus::Email => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::Name,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            LoginFocus::Name => LoginFocus::Button,
            LoginFocus::Email => LoginFocus::Name,
            LoginFocus::Password => LoginFocus::Email,
            LoginFocus::Button => LoginFocus::Password,
        }
    }
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    pub core: CareCore,
    pub config: Config,
    /// Where to save the config after a login; `None` never writes
    config_path: Option<PathBuf>,

    pub state: AppState,
    pub current_route: Route,
    /// Protected page the user asked for before being sent to login
    pub pending_route: Option<Route>,
    /// Session changed while an overlay was open; re-check the page once it closes
    guard_stale: bool,

    pub login_name: String,
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    pub patient_selection: usize,
    next_demo_patient: usize,

    // Latest snapshots from the stores
    pub session: Session,
    pub notifications: Vec<Notification>,
    session_rx: watch::Receiver<Session>,
    notifications_rx: watch::Receiver<Vec<Notification>>,
}

impl App {
    pub fn new(core: CareCore, config: Config, config_path: Option<PathBuf>) -> Self {
        let session_rx = core.session().subscribe();
        let notifications_rx = core.notifications().subscribe();
        let session = session_rx.borrow().clone();
        let notifications = notifications_rx.borrow().clone();
        let login_email = config.last_email.clone().unwrap_or_default();

        Self {
            core,
            config,
            config_path,

            state: AppState::Normal,
            current_route: Route::Home,
            pending_route: None,
            guard_stale: false,

            login_name: String::new(),
            login_email,
            login_password: String::new(),
            login_focus: LoginFocus::Name,
            login_error: None,

            patient_selection: 0,
            next_demo_patient: 0,

            session,
            notifications,
            session_rx,
            notifications_rx,
        }
    }

    // =========================================================================
    // Store snapshots
    // =========================================================================

    /// Pull fresh snapshots from the stores. Called once per frame.
    pub fn check_updates(&mut self) {
        if self.notifications_rx.has_changed().unwrap_or(false) {
            self.notifications = self.notifications_rx.borrow_and_update().clone();
        }

        if self.session_rx.has_changed().unwrap_or(false) {
            self.session = self.session_rx.borrow_and_update().clone();
            debug!(status = ?self.session.status(), "Session snapshot updated");
            // Re-run the guard for the page on screen
            if self.current_route.is_protected() {
                match self.state {
                    AppState::Normal => self.navigate(self.current_route),
                    AppState::ShowingHelp | AppState::ConfirmingQuit => self.guard_stale = true,
                    AppState::LoggingIn | AppState::Quitting => {}
                }
            }
        }

        if self.guard_stale && self.state == AppState::Normal {
            self.guard_stale = false;
            if self.current_route.is_protected() {
                self.navigate(self.current_route);
            }
        }
    }

    pub fn notification_count(&self) -> usize {
        self.notifications.len()
    }

    pub fn user(&self) -> Option<&User> {
        self.session.user()
    }

    pub fn nav_items(&self) -> &'static [NavItem] {
        carebridge_core::nav_items(self.session.is_authenticated())
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn navigate(&mut self, route: Route) {
        match self.core.navigate(route) {
            Destination::Render(Route::Login) => self.start_login(),
            Destination::Render(route) | Destination::Resolving(route) => {
                self.current_route = route;
            }
            Destination::Redirect { from, .. } => {
                self.pending_route = Some(from);
                self.start_login();
            }
        }
    }

    /// Navigate to the n-th header link (0-based)
    pub fn navigate_nav(&mut self, index: usize) {
        if let Some(item) = self.nav_items().get(index) {
            self.navigate(item.route);
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn start_login(&mut self) {
        if self.session.is_authenticated() {
            self.notify(NotificationKind::Info, "Already signed in");
            return;
        }
        self.state = AppState::LoggingIn;
        self.login_password.clear();
        self.login_error = None;
        self.login_focus = if self.login_name.is_empty() {
            LoginFocus::Name
        } else {
            LoginFocus::Password
        };
    }

    pub fn cancel_login(&mut self) {
        self.state = AppState::Normal;
        self.login_password.clear();
        self.login_error = None;
        self.pending_route = None;
        if self.current_route.is_protected() && !self.session.is_authenticated() {
            self.current_route = Route::Home;
        }
    }

    /// Validate the form and sign in.
    ///
    /// There is no identity provider behind the form, so the token is minted
    /// locally and the password is only checked for presence.
    pub fn submit_login(&mut self) {
        let name = self.login_name.trim().to_string();
        let email = self.login_email.trim().to_string();

        if name.is_empty() {
            self.login_error = Some("Name is required".to_string());
            self.login_focus = LoginFocus::Name;
            return;
        }
        if !is_plausible_email(&email) {
            self.login_error = Some("Enter a valid email address".to_string());
            self.login_focus = LoginFocus::Email;
            return;
        }
        if self.login_password.is_empty() {
            self.login_error = Some("Password is required".to_string());
            self.login_focus = LoginFocus::Password;
            return;
        }

        let token = Uuid::new_v4().to_string();
        let user = User::new(Uuid::new_v4().to_string(), name, email.clone());
        let greeting = format!("Welcome, {}", user.first_name());

        if let Err(e) = self.core.session().login(&token, user) {
            warn!(error = %e, "Login rejected");
            self.login_error = Some(e.to_string());
            return;
        }

        info!("Login completed");
        self.login_password.clear();
        self.login_error = None;
        self.state = AppState::Normal;
        self.remember_email(email);

        // Take the snapshot now so the guard sees the new session immediately
        self.session = self.session_rx.borrow_and_update().clone();
        let target = self.pending_route.take().unwrap_or(Route::Dashboard);
        self.navigate(target);
        self.notify(NotificationKind::Success, &greeting);
    }

    fn remember_email(&mut self, email: String) {
        if self.config.last_email.as_deref() == Some(email.as_str()) {
            return;
        }
        self.config.last_email = Some(email);
        if let Some(ref path) = self.config_path {
            if let Err(e) = self.config.save_to(path) {
                warn!(error = %e, "Failed to save config");
            }
        }
    }

    pub fn logout(&mut self) {
        if !self.session.is_authenticated() {
            self.notify(NotificationKind::Info, "Not signed in");
            return;
        }
        let landing = self.core.logout();
        self.session = self.session_rx.borrow_and_update().clone();
        self.current_route = landing;
        self.notify(NotificationKind::Info, "Signed out");
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    pub fn notify(&mut self, kind: NotificationKind, message: &str) {
        let expiry = self.core.notifications().default_expiry_ms();
        if let Err(e) = self.core.notifications().enqueue(message, kind, expiry) {
            warn!(error = %e, "Failed to show notification");
        }
    }

    pub fn notify_test(&mut self) {
        let count = self.core.notifications().count() + 1;
        self.notify(
            NotificationKind::Info,
            &format!("Test notification #{}", count),
        );
    }

    /// Dismiss the most recent toast
    pub fn dismiss_latest(&mut self) {
        if let Some(latest) = self.core.notifications().latest() {
            self.core.notifications().remove(latest.id);
        }
    }

    pub fn clear_notifications(&mut self) {
        self.core.notifications().clear_all();
    }

    // =========================================================================
    // Patients
    // =========================================================================

    pub fn add_demo_patient(&mut self) {
        let (name, age, condition) = DEMO_PATIENTS[self.next_demo_patient % DEMO_PATIENTS.len()];
        self.next_demo_patient += 1;

        let mut patient = Patient::new(format!("P-{:04}", self.next_demo_patient), name, age);
        if let Some(condition) = condition {
            patient = patient.with_condition(condition);
        }

        match self.core.patients_mut().add(patient) {
            Ok(()) => {
                self.patient_selection = self.core.patients().len().saturating_sub(1);
                self.notify(NotificationKind::Success, &format!("Added {}", name));
            }
            Err(e) => self.notify(NotificationKind::Error, &e.to_string()),
        }
    }

    pub fn remove_selected_patient(&mut self) {
        let Some(patient) = self.core.patients().patients().get(self.patient_selection) else {
            return;
        };
        let (id, name) = (patient.id.clone(), patient.name.clone());
        if self.core.patients_mut().remove(&id) {
            let len = self.core.patients().len();
            self.patient_selection = self.patient_selection.min(len.saturating_sub(1));
            self.notify(NotificationKind::Warning, &format!("Removed {}", name));
        }
    }

    pub fn select_next_patient(&mut self) {
        let len = self.core.patients().len();
        if len > 0 {
            self.patient_selection = (self.patient_selection + 1).min(len - 1);
        }
    }

    pub fn select_prev_patient(&mut self) {
        self.patient_selection = self.patient_selection.saturating_sub(1);
    }
}

// ============================================================================
// Input Validation
// ============================================================================

/// Check if a character is valid for text input (not a control character)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

pub fn can_add_name_char(current_len: usize, c: char) -> bool {
    current_len < MAX_NAME_LENGTH && is_valid_input_char(c)
}

pub fn can_add_email_char(current_len: usize, c: char) -> bool {
    current_len < MAX_EMAIL_LENGTH && is_valid_input_char(c) && !c.is_whitespace()
}

pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

/// Loose shape check: something@something.tld
pub fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .map(|(host, tld)| !host.is_empty() && !tld.is_empty())
                    .unwrap_or(false)
        }
        None => false,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use carebridge_core::{MemoryStore, PlaceholderIdentity, SessionStatus};

    fn test_app() -> App {
        let core = CareCore::new(
            Arc::new(MemoryStore::new()),
            Arc::new(PlaceholderIdentity::default()),
            &Config::default(),
        );
        App::new(core, Config::default(), None)
    }

    fn fill_login(app: &mut App) {
        app.login_name = "Jane Doe".to_string();
        app.login_email = "jane@x.com".to_string();
        app.login_password = "secret".to_string();
    }

    #[tokio::test]
    async fn test_protected_page_while_resolving_shows_placeholder() {
        let mut app = test_app();
        app.navigate(Route::Dashboard);
        assert_eq!(app.current_route, Route::Dashboard);
        assert_eq!(app.state, AppState::Normal);
        assert!(app.session.is_resolving());
    }

    #[tokio::test]
    async fn test_resolution_redirects_to_login() {
        let mut app = test_app();
        app.navigate(Route::Patients);

        app.core.initialize().await;
        app.check_updates();

        assert_eq!(app.session.status(), SessionStatus::Unauthenticated);
        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.pending_route, Some(Route::Patients));
    }

    #[tokio::test]
    async fn test_resolution_waits_for_open_overlay() {
        let mut app = test_app();
        app.navigate(Route::Patients);
        app.state = AppState::ConfirmingQuit;

        app.core.initialize().await;
        app.check_updates();
        assert_eq!(app.state, AppState::ConfirmingQuit);
        assert_eq!(app.current_route, Route::Patients);

        // Declining the quit brings the guard back
        app.state = AppState::Normal;
        app.check_updates();
        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.pending_route, Some(Route::Patients));
    }

    #[tokio::test]
    async fn test_help_overlay_survives_resolution() {
        let mut app = test_app();
        app.navigate(Route::Dashboard);
        app.state = AppState::ShowingHelp;

        app.core.initialize().await;
        app.check_updates();
        assert_eq!(app.state, AppState::ShowingHelp);
    }

    #[tokio::test]
    async fn test_login_returns_to_pending_route() {
        let mut app = test_app();
        app.core.initialize().await;
        app.check_updates();

        app.navigate(Route::Inventory);
        assert_eq!(app.state, AppState::LoggingIn);

        fill_login(&mut app);
        app.submit_login();

        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.current_route, Route::Inventory);
        assert_eq!(app.user().unwrap().name, "Jane Doe");
        assert_eq!(app.config.last_email.as_deref(), Some("jane@x.com"));
        assert!(app.login_password.is_empty());

        app.check_updates();
        assert_eq!(app.notifications.last().unwrap().message, "Welcome, Jane");
    }

    #[tokio::test]
    async fn test_login_validation_errors() {
        let mut app = test_app();
        app.start_login();

        app.submit_login();
        assert_eq!(app.login_error.as_deref(), Some("Name is required"));

        app.login_name = "Jane".to_string();
        app.login_email = "not-an-email".to_string();
        app.submit_login();
        assert_eq!(app.login_focus, LoginFocus::Email);

        app.login_email = "jane@x.com".to_string();
        app.submit_login();
        assert_eq!(app.login_error.as_deref(), Some("Password is required"));
        assert_eq!(app.state, AppState::LoggingIn);
        assert!(!app.core.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_goes_home() {
        let mut app = test_app();
        app.start_login();
        fill_login(&mut app);
        app.submit_login();
        assert_eq!(app.current_route, Route::Dashboard);

        app.logout();
        assert_eq!(app.current_route, Route::Home);
        assert!(!app.session.is_authenticated());
        assert_eq!(app.nav_items()[0].route, Route::Home);
    }

    #[tokio::test]
    async fn test_cancel_login_leaves_protected_page() {
        let mut app = test_app();
        app.core.initialize().await;
        app.check_updates();
        app.current_route = Route::Settings;

        app.navigate(Route::Settings);
        app.cancel_login();
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.current_route, Route::Home);
        assert!(app.pending_route.is_none());
    }

    #[tokio::test]
    async fn test_dismiss_and_clear_notifications() {
        let mut app = test_app();
        app.notify_test();
        app.notify_test();
        app.check_updates();
        assert_eq!(app.notification_count(), 2);

        app.dismiss_latest();
        app.check_updates();
        assert_eq!(app.notifications[0].message, "Test notification #1");
        assert_eq!(app.notification_count(), 1);

        app.clear_notifications();
        app.check_updates();
        assert_eq!(app.notification_count(), 0);
    }

    #[tokio::test]
    async fn test_demo_patients_add_and_remove() {
        let mut app = test_app();
        app.add_demo_patient();
        app.add_demo_patient();
        assert_eq!(app.core.patients().len(), 2);
        assert_eq!(app.patient_selection, 1);

        app.remove_selected_patient();
        assert_eq!(app.core.patients().len(), 1);
        assert_eq!(app.patient_selection, 0);
        assert_eq!(app.core.patients().patients()[0].name, "Amara Okafor");
    }

    #[test]
    fn test_login_focus_cycle() {
        assert_eq!(LoginFocus::Name.next(), LoginFocus::Email);
        assert_eq!(LoginFocus::Button.next(), LoginFocus::Name);
        assert_eq!(LoginFocus::Name.prev(), LoginFocus::Button);
    }

    #[test]
    fn test_is_plausible_email() {
        assert!(is_plausible_email("jane@x.com"));
        assert!(!is_plausible_email("jane"));
        assert!(!is_plausible_email("@x.com"));
        assert!(!is_plausible_email("jane@x"));
        assert!(!is_plausible_email("jane@.com"));
        assert!(!is_plausible_email("a@b@c.com"));
    }

    #[test]
    fn test_can_add_chars() {
        assert!(can_add_name_char(0, 'a'));
        assert!(!can_add_name_char(50, 'a'));
        assert!(!can_add_email_char(0, ' '));
        assert!(can_add_password_char(127, '!'));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\n'));
    }
}
