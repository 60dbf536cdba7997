use serde::{Deserialize, Serialize};

use crate::models::Role;
use crate::store::SessionSnapshot;

/// The role a route demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiredRole {
    /// Any signed-in user.
    Authenticated,
    Admin,
    Vendor,
}

impl RequiredRole {
    fn matches(self, role: Role) -> bool {
        match self {
            RequiredRole::Authenticated => true,
            RequiredRole::Admin => role == Role::Admin,
            RequiredRole::Vendor => role == Role::Vendor,
        }
    }

    /// The login page appropriate for this route's audience.
    pub fn login_path(self) -> &'static str {
        match self {
            RequiredRole::Authenticated => "/login",
            RequiredRole::Admin => "/admin/login",
            RequiredRole::Vendor => "/vendor/login",
        }
    }
}

/// What the router should do with a guarded route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Initial auth check still in flight; show a placeholder, never
    /// redirect (a redirect here would flash the login page on refresh).
    RenderLoading,
    /// Not signed in: send to the role-appropriate login, carrying the
    /// intended destination so a successful login can return there.
    RedirectToLogin {
        login_path: &'static str,
        return_to: String,
    },
    /// Signed in but the wrong role: show an access-denied view with a link
    /// to the correct login. Not a redirect.
    AccessDenied { login_path: &'static str },
    /// Render the requested page.
    Render,
}

/// Pure decision function consumed before rendering any guarded page.
pub fn evaluate(
    session: &SessionSnapshot,
    required: RequiredRole,
    destination: &str,
) -> GuardDecision {
    if session.loading {
        return GuardDecision::RenderLoading;
    }
    if !session.is_authenticated {
        return GuardDecision::RedirectToLogin {
            login_path: required.login_path(),
            return_to: destination.to_string(),
        };
    }
    match session.role {
        Some(role) if required.matches(role) => GuardDecision::Render,
        _ => GuardDecision::AccessDenied {
            login_path: required.login_path(),
        },
    }
}

/// The single role-based landing page used after login. Pages never issue
/// their own navigation; this mapping is the one place dashboards resolve.
pub fn dashboard_path(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin/dashboard",
        Role::Vendor => "/vendor/dashboard",
        Role::Customer => "/dashboard",
    }
}

/// Where to land after a successful login: the destination carried on the
/// redirect when there was one, otherwise the role's dashboard.
pub fn post_login_destination(role: Role, return_to: Option<&str>) -> String {
    match return_to {
        Some(path) if !path.is_empty() => path.to_string(),
        _ => dashboard_path(role).to_string(),
    }
}
