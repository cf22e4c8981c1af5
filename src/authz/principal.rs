use std::fmt;

use serde::Serialize;
use utoipa::ToSchema;

/// Privilege tier derived from a profile's flag pair.
///
/// Ordering follows mutation privilege: `User < Admin < Superadmin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    User,
    Admin,
    Superadmin,
}

impl Tier {
    /// `is_superadmin` wins over `is_admin`.
    pub fn from_flags(is_admin: bool, is_superadmin: bool) -> Self {
        match (is_admin, is_superadmin) {
            (_, true) => Tier::Superadmin,
            (true, false) => Tier::Admin,
            (false, false) => Tier::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::User => "user",
            Tier::Admin => "admin",
            Tier::Superadmin => "superadmin",
        }
    }

    pub fn is_at_least(&self, required: Tier) -> bool {
        *self >= required
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superadmin_flag_dominates() {
        assert_eq!(Tier::from_flags(false, true), Tier::Superadmin);
        assert_eq!(Tier::from_flags(true, true), Tier::Superadmin);
        assert_eq!(Tier::from_flags(true, false), Tier::Admin);
        assert_eq!(Tier::from_flags(false, false), Tier::User);
    }

    #[test]
    fn tiers_are_ordered() {
        assert!(Tier::Superadmin.is_at_least(Tier::Admin));
        assert!(Tier::Admin.is_at_least(Tier::Admin));
        assert!(!Tier::User.is_at_least(Tier::Admin));
    }
}
