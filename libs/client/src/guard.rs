//! Route guard for protected views

use crate::{roles::AllowedRoles, session::SessionContext, storage::SessionStorage};

/// Path of the sign-in view
pub const LOGIN_PATH: &str = "/login";

/// Outcome of a navigation check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// No session; `from` is where to return after signing in
    RedirectToLogin { from: String },
    /// Signed in with a role the view does not accept
    Denied,
}

pub struct RouteGuard;

impl RouteGuard {
    /// Decide whether the current session may open `path`
    ///
    /// `None` for `allowed` accepts any signed-in role.
    pub fn check<S: SessionStorage>(
        session: &SessionContext<S>,
        path: &str,
        allowed: Option<&AllowedRoles>,
    ) -> GuardDecision {
        let Some(role) = session.role() else {
            return GuardDecision::RedirectToLogin {
                from: path.to_string(),
            };
        };

        match allowed {
            Some(allowed) if !allowed.permits(role) => GuardDecision::Denied,
            _ => GuardDecision::Allow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{session::Session, storage::MemoryStorage};
    use common::Role;

    fn signed_in(role: Role) -> SessionContext<MemoryStorage> {
        let context = SessionContext::new(MemoryStorage::new());
        context
            .establish(Session {
                token: "t".to_string(),
                role,
                user: None,
            })
            .unwrap();
        context
    }

    #[test]
    fn anonymous_visitors_are_sent_to_login() {
        let context = SessionContext::new(MemoryStorage::new());

        assert_eq!(
            RouteGuard::check(&context, "/listings/42", None),
            GuardDecision::RedirectToLogin {
                from: "/listings/42".to_string()
            }
        );
    }

    #[test]
    fn roles_gate_the_admin_dashboard() {
        let admin_only = AllowedRoles::from(Role::Admin);
        let anyone = AllowedRoles::from([Role::User, Role::Admin]);

        let guest = signed_in(Role::User);
        assert_eq!(
            RouteGuard::check(&guest, "/admin", Some(&admin_only)),
            GuardDecision::Denied
        );
        assert_eq!(
            RouteGuard::check(&guest, "/payment/1", Some(&anyone)),
            GuardDecision::Allow
        );
        assert_eq!(RouteGuard::check(&guest, "/listings", None), GuardDecision::Allow);

        let admin = signed_in(Role::Admin);
        assert_eq!(
            RouteGuard::check(&admin, "/admin", Some(&admin_only)),
            GuardDecision::Allow
        );
    }
}
