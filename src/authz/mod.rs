//! Authorization engine
//!
//! Tiered permission model for profile and task mutation:
//! - `superadmin > admin > user`, derived from the profile flag pair
//! - the superadmin profile is protected from modification and deletion
//! - nobody changes their own role or deletes their own account
//! - only superadmins act on admin accounts or on a superadmin's tasks
//!
//! Every decision is a pure function of the profiles passed in. Handlers
//! resolve the acting principal and the target first, ask the evaluator, and
//! only then touch a repository.

mod evaluator;
mod principal;

pub use evaluator::{PolicyEvaluator, TieredPolicy};
pub use principal::Tier;

use std::fmt;

/// Why an operation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotAuthenticated,
    NotFound,
    ProtectedAccount,
    SelfRoleChange,
    SelfDeletion,
    AdminRequired,
    SuperadminOnly,
    SuperadminTasks,
    NotOwner,
}

impl DenyReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::NotAuthenticated => "not_authenticated",
            DenyReason::NotFound => "not_found",
            DenyReason::ProtectedAccount => "protected_account",
            DenyReason::SelfRoleChange => "self_role_change",
            DenyReason::SelfDeletion => "self_deletion",
            DenyReason::AdminRequired => "admin_required",
            DenyReason::SuperadminOnly => "superadmin_only",
            DenyReason::SuperadminTasks => "superadmin_tasks",
            DenyReason::NotOwner => "not_owner",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            DenyReason::NotAuthenticated => "not authenticated",
            DenyReason::NotFound => "not found",
            DenyReason::ProtectedAccount => "this superadmin account cannot be modified or deleted",
            DenyReason::SelfRoleChange => "you cannot change your own role",
            DenyReason::SelfDeletion => "you cannot delete your own account",
            DenyReason::AdminRequired => "admin privileges required",
            DenyReason::SuperadminOnly => "only superadmins can modify or delete admin accounts",
            DenyReason::SuperadminTasks => "only superadmins can access a superadmin's tasks",
            DenyReason::NotOwner => "you can only access your own tasks",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of an authorization check.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn reason(&self) -> Option<DenyReason> {
        match self {
            Decision::Allow => None,
            Decision::Deny(reason) => Some(*reason),
        }
    }

    /// Converts into a `Result` so handlers can use `?`.
    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(reason),
        }
    }
}
