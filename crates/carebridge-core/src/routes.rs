//! Route table for the CareBridge front end.
//!
//! Every destination the navigation layer knows about, whether it sits
//! behind authentication, and the navigation sets shown in the header.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Route {
    Home,
    Login,
    Register,
    ForgotPassword,
    Education,
    FacilityLocator,
    UssdAccess,
    Dashboard,
    Patients,
    Appointments,
    Inventory,
    Analytics,
    Settings,
    Profile,
}

impl Route {
    pub const ALL: [Route; 14] = [
        Route::Home,
        Route::Login,
        Route::Register,
        Route::ForgotPassword,
        Route::Education,
        Route::FacilityLocator,
        Route::UssdAccess,
        Route::Dashboard,
        Route::Patients,
        Route::Appointments,
        Route::Inventory,
        Route::Analytics,
        Route::Settings,
        Route::Profile,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::ForgotPassword => "/forgot-password",
            Route::Education => "/education",
            Route::FacilityLocator => "/facility-locator",
            Route::UssdAccess => "/ussd-access",
            Route::Dashboard => "/dashboard",
            Route::Patients => "/patients",
            Route::Appointments => "/appointments",
            Route::Inventory => "/inventory",
            Route::Analytics => "/analytics",
            Route::Settings => "/settings",
            Route::Profile => "/profile",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Login => "Sign In",
            Route::Register => "Register",
            Route::ForgotPassword => "Forgot Password",
            Route::Education => "Education",
            Route::FacilityLocator => "Find Facilities",
            Route::UssdAccess => "USSD Access",
            Route::Dashboard => "Dashboard",
            Route::Patients => "Patients",
            Route::Appointments => "Appointments",
            Route::Inventory => "Inventory",
            Route::Analytics => "Analytics",
            Route::Settings => "Settings",
            Route::Profile => "Profile",
        }
    }

    /// Whether rendering this route requires a signed-in user
    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            Route::Dashboard
                | Route::Patients
                | Route::Appointments
                | Route::Inventory
                | Route::Analytics
                | Route::Settings
                | Route::Profile
        )
    }

    /// Look up a route by exact path. A trailing slash is tolerated.
    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = match path.trim_end_matches('/') {
            "" => "/",
            p => p,
        };
        Self::ALL.into_iter().find(|r| r.path() == trimmed)
    }

    /// Header link highlighting: "/" only matches itself, anything else
    /// matches by prefix.
    pub fn is_active(&self, current_path: &str) -> bool {
        match self.path() {
            "/" => current_path == "/",
            path => current_path.starts_with(path),
        }
    }
}

/// A header navigation entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub route: Route,
}

pub const PUBLIC_NAV: [NavItem; 4] = [
    NavItem {
        label: "Home",
        route: Route::Home,
    },
    NavItem {
        label: "Education",
        route: Route::Education,
    },
    NavItem {
        label: "Find Facilities",
        route: Route::FacilityLocator,
    },
    NavItem {
        label: "USSD Access",
        route: Route::UssdAccess,
    },
];

pub const PRIVATE_NAV: [NavItem; 5] = [
    NavItem {
        label: "Dashboard",
        route: Route::Dashboard,
    },
    NavItem {
        label: "Patients",
        route: Route::Patients,
    },
    NavItem {
        label: "Appointments",
        route: Route::Appointments,
    },
    NavItem {
        label: "Inventory",
        route: Route::Inventory,
    },
    NavItem {
        label: "Analytics",
        route: Route::Analytics,
    },
];

/// Navigation set for the header. Only a signed-in user sees private links.
pub fn nav_items(authenticated: bool) -> &'static [NavItem] {
    if authenticated {
        &PRIVATE_NAV
    } else {
        &PUBLIC_NAV
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_round_trip() {
        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
    }

    #[test]
    fn test_from_path_trailing_slash_and_unknown() {
        assert_eq!(Route::from_path("/dashboard/"), Some(Route::Dashboard));
        assert_eq!(Route::from_path(""), Some(Route::Home));
        assert_eq!(Route::from_path("/nope"), None);
    }

    #[test]
    fn test_protected_routes() {
        let protected: Vec<Route> = Route::ALL
            .into_iter()
            .filter(Route::is_protected)
            .collect();
        assert_eq!(protected.len(), 7);
        assert!(!Route::Home.is_protected());
        assert!(!Route::Login.is_protected());
        assert!(Route::Profile.is_protected());
    }

    #[test]
    fn test_is_active() {
        assert!(Route::Home.is_active("/"));
        assert!(!Route::Home.is_active("/education"));
        assert!(Route::Patients.is_active("/patients"));
        assert!(Route::Patients.is_active("/patients/42"));
        assert!(!Route::Patients.is_active("/dashboard"));
    }

    #[test]
    fn test_nav_items_by_session() {
        assert_eq!(nav_items(false)[0].route, Route::Home);
        assert!(nav_items(true).iter().all(|item| item.route.is_protected()));
        assert!(nav_items(false).iter().all(|item| !item.route.is_protected()));
    }
}
