//! Privilege levels gating console routes.

use serde::{Deserialize, Serialize};

use crate::Role;

/// Privilege required by a route, or held by a session.
///
/// Variants are declared in ascending order so the derived `Ord` is the
/// privilege order: `Public < Authenticated < Admin`. Holding a level grants
/// every level below it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Privilege {
    /// No privilege required; anyone may render the route.
    Public,
    /// Any logged-in session.
    Authenticated,
    /// Logged-in session holding the admin role.
    Admin,
}

impl Privilege {
    pub const ALL: [Privilege; 3] = [Privilege::Public, Privilege::Authenticated, Privilege::Admin];

    /// Privilege held by an authenticated session with the given role.
    ///
    /// A missing role is treated as the least privileged authenticated level.
    pub fn held_by(role: Option<Role>) -> Self {
        match role {
            Some(Role::Admin) => Privilege::Admin,
            Some(Role::User) | None => Privilege::Authenticated,
        }
    }

    /// Whether holding `self` satisfies a route requiring `required`.
    pub fn satisfies(self, required: Privilege) -> bool {
        self >= required
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Privilege::Public => "public",
            Privilege::Authenticated => "authenticated",
            Privilege::Admin => "admin",
        }
    }
}

impl core::fmt::Display for Privilege {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_total_and_ascending() {
        assert!(Privilege::Public < Privilege::Authenticated);
        assert!(Privilege::Authenticated < Privilege::Admin);
        let mut shuffled = vec![Privilege::Admin, Privilege::Public, Privilege::Authenticated];
        shuffled.sort();
        assert_eq!(shuffled, Privilege::ALL.to_vec());
    }

    #[test]
    fn admin_satisfies_every_level() {
        for required in Privilege::ALL {
            assert!(Privilege::Admin.satisfies(required));
        }
        assert!(!Privilege::Authenticated.satisfies(Privilege::Admin));
        assert!(!Privilege::Public.satisfies(Privilege::Authenticated));
    }

    #[test]
    fn missing_role_holds_least_authenticated_level() {
        assert_eq!(Privilege::held_by(None), Privilege::Authenticated);
        assert_eq!(Privilege::held_by(Some(Role::User)), Privilege::Authenticated);
        assert_eq!(Privilege::held_by(Some(Role::Admin)), Privilege::Admin);
    }
}
