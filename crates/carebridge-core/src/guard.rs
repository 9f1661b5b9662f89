//! Route guard for protected views.
//!
//! Pure functions of the current session; the navigation layer acts on the
//! returned decision.

use serde::{Deserialize, Serialize};

use crate::auth::Session;
use crate::routes::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum GuardDecision {
    Allow,
    RedirectToLogin,
    /// Session not resolved yet. Show a neutral placeholder, do not redirect.
    Pending,
}

/// Decide whether a protected view may render.
pub fn guard(session: &Session) -> GuardDecision {
    match session {
        Session::Authenticated(_) => GuardDecision::Allow,
        Session::Unauthenticated => GuardDecision::RedirectToLogin,
        Session::Unknown => GuardDecision::Pending,
    }
}

/// Where navigation to a route actually ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Destination {
    Render(Route),
    /// Redirect to the login entry point, remembering where the user was headed
    Redirect { to: Route, from: Route },
    Resolving(Route),
}

impl Destination {
    /// Route the navigation layer should show
    pub fn shown_route(&self) -> Route {
        match self {
            Destination::Render(route) | Destination::Resolving(route) => *route,
            Destination::Redirect { to, .. } => *to,
        }
    }
}

/// Apply the guard to a navigation request. Public routes always render.
pub fn resolve(route: Route, session: &Session) -> Destination {
    if !route.is_protected() {
        return Destination::Render(route);
    }
    match guard(session) {
        GuardDecision::Allow => Destination::Render(route),
        GuardDecision::RedirectToLogin => Destination::Redirect {
            to: Route::Login,
            from: route,
        },
        GuardDecision::Pending => Destination::Resolving(route),
    }
}
