use common::Role;

/// Roles a view accepts: a single role or any of a list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedRoles {
    One(Role),
    AnyOf(Vec<Role>),
}

impl AllowedRoles {
    pub fn permits(&self, role: Role) -> bool {
        match self {
            AllowedRoles::One(allowed) => *allowed == role,
            AllowedRoles::AnyOf(allowed) => allowed.contains(&role),
        }
    }
}

impl From<Role> for AllowedRoles {
    fn from(role: Role) -> Self {
        AllowedRoles::One(role)
    }
}

impl From<Vec<Role>> for AllowedRoles {
    fn from(roles: Vec<Role>) -> Self {
        AllowedRoles::AnyOf(roles)
    }
}

impl From<&[Role]> for AllowedRoles {
    fn from(roles: &[Role]) -> Self {
        AllowedRoles::AnyOf(roles.to_vec())
    }
}

impl<const N: usize> From<[Role; N]> for AllowedRoles {
    fn from(roles: [Role; N]) -> Self {
        AllowedRoles::AnyOf(roles.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_role_needs_an_exact_match() {
        let allowed = AllowedRoles::from(Role::Admin);
        assert!(allowed.permits(Role::Admin));
        assert!(!allowed.permits(Role::User));
    }

    #[test]
    fn list_needs_membership() {
        assert!(AllowedRoles::from([Role::User, Role::Admin]).permits(Role::User));
        assert!(!AllowedRoles::from(vec![Role::Admin]).permits(Role::User));
        assert!(!AllowedRoles::AnyOf(Vec::new()).permits(Role::Admin));
    }
}
