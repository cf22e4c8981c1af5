use crate::models::profile::{Profile, ProfileUpdate};
use crate::models::task::Task;

use super::principal::Tier;
use super::{Decision, DenyReason};

/// Policy evaluator trait for pluggable authorization logic.
///
/// `actor` is the resolved acting principal's profile; `None` means the
/// request is not authenticated. Absent targets deny with `NotFound`.
pub trait PolicyEvaluator: Send + Sync {
    fn can_modify_profile(
        &self,
        actor: Option<&Profile>,
        target: Option<&Profile>,
        update: &ProfileUpdate,
    ) -> Decision;

    fn can_delete_profile(&self, actor: Option<&Profile>, target: Option<&Profile>) -> Decision;

    fn can_access_user_tasks(&self, actor: Option<&Profile>, owner: Option<&Profile>) -> Decision;

    fn can_mutate_task(
        &self,
        actor: Option<&Profile>,
        task: Option<&Task>,
        owner: Option<&Profile>,
    ) -> Decision;

    fn can_list_profiles(&self, actor: Option<&Profile>) -> Decision;
}

/// Default evaluator implementing the `user < admin < superadmin` model.
///
/// Profile mutation order:
/// 1. protected (superadmin) target -> deny
/// 2. self target -> deny role changes and deletion, allow the rest
/// 3. user-tier actor -> deny
/// 4. admin target and non-superadmin actor -> deny
/// 5. allow
#[derive(Debug, Clone, Copy, Default)]
pub struct TieredPolicy;

impl TieredPolicy {
    pub fn new() -> Self {
        Self
    }

    fn profile_mutation(
        actor: Option<&Profile>,
        target: Option<&Profile>,
        touches_role: bool,
        deleting: bool,
    ) -> Decision {
        let Some(actor) = actor else {
            return Decision::Deny(DenyReason::NotAuthenticated);
        };
        let Some(target) = target else {
            return Decision::Deny(DenyReason::NotFound);
        };

        if target.is_superadmin {
            return Decision::Deny(DenyReason::ProtectedAccount);
        }

        if actor.id == target.id {
            if deleting {
                return Decision::Deny(DenyReason::SelfDeletion);
            }
            if touches_role {
                return Decision::Deny(DenyReason::SelfRoleChange);
            }
            return Decision::Allow;
        }

        let actor_tier = actor.tier();
        if !actor_tier.is_at_least(Tier::Admin) {
            return Decision::Deny(DenyReason::AdminRequired);
        }
        if target.tier().is_at_least(Tier::Admin) && actor_tier != Tier::Superadmin {
            return Decision::Deny(DenyReason::SuperadminOnly);
        }

        Decision::Allow
    }

    fn task_access(actor: Option<&Profile>, owner: Option<&Profile>) -> Decision {
        let Some(actor) = actor else {
            return Decision::Deny(DenyReason::NotAuthenticated);
        };
        let Some(owner) = owner else {
            return Decision::Deny(DenyReason::NotFound);
        };

        let actor_tier = actor.tier();
        if owner.tier() == Tier::Superadmin && actor_tier != Tier::Superadmin {
            return Decision::Deny(DenyReason::SuperadminTasks);
        }
        if actor.id == owner.id || actor_tier.is_at_least(Tier::Admin) {
            return Decision::Allow;
        }

        Decision::Deny(DenyReason::NotOwner)
    }

    fn traced(operation: &'static str, actor: Option<&Profile>, decision: Decision) -> Decision {
        match decision.reason() {
            None => tracing::debug!(
                operation,
                actor_id = ?actor.map(|a| a.id),
                "authorization allowed"
            ),
            Some(reason) => tracing::debug!(
                operation,
                actor_id = ?actor.map(|a| a.id),
                reason = reason.code(),
                "authorization denied"
            ),
        }
        decision
    }
}

impl PolicyEvaluator for TieredPolicy {
    fn can_modify_profile(
        &self,
        actor: Option<&Profile>,
        target: Option<&Profile>,
        update: &ProfileUpdate,
    ) -> Decision {
        let decision = Self::profile_mutation(actor, target, update.touches_role(), false);
        Self::traced("profile.modify", actor, decision)
    }

    fn can_delete_profile(&self, actor: Option<&Profile>, target: Option<&Profile>) -> Decision {
        let decision = Self::profile_mutation(actor, target, true, true);
        Self::traced("profile.delete", actor, decision)
    }

    fn can_access_user_tasks(&self, actor: Option<&Profile>, owner: Option<&Profile>) -> Decision {
        let decision = Self::task_access(actor, owner);
        Self::traced("tasks.access", actor, decision)
    }

    fn can_mutate_task(
        &self,
        actor: Option<&Profile>,
        task: Option<&Task>,
        owner: Option<&Profile>,
    ) -> Decision {
        let decision = match (actor, task, owner) {
            (None, _, _) => Decision::Deny(DenyReason::NotAuthenticated),
            (Some(_), None, _) => Decision::Deny(DenyReason::NotFound),
            (Some(_), Some(task), Some(owner)) if task.owner_id != owner.id => {
                Decision::Deny(DenyReason::NotFound)
            }
            _ => Self::task_access(actor, owner),
        };
        Self::traced("task.mutate", actor, decision)
    }

    fn can_list_profiles(&self, actor: Option<&Profile>) -> Decision {
        let decision = match actor {
            None => Decision::Deny(DenyReason::NotAuthenticated),
            Some(actor) if actor.tier().is_at_least(Tier::Admin) => Decision::Allow,
            Some(_) => Decision::Deny(DenyReason::AdminRequired),
        };
        Self::traced("profiles.list", actor, decision)
    }
}
