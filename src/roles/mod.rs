//! Role tags, the permission evaluator and the admin grant/revoke state
//! machine.
//!
//! Roles are held as a set of string tags on the account row, not a ranked
//! enum; an account may hold several at once and always holds at least
//! [`PortalRole::User`]. The superadmin tag is provisioned out of band and
//! is never granted or revoked here.
//!
//! All functions in this module are pure: they read immutable snapshots and
//! return decisions or full replacement role sets. Persistence of a new set
//! is a single conditional update owned by the caller.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::database::models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PortalRole {
    User,
    Admin,
    Superadmin,
}

impl PortalRole {
    pub const fn as_tag(&self) -> &'static str {
        match self {
            PortalRole::User => "ROLE_PORTAL_USER",
            PortalRole::Admin => "ROLE_PORTAL_ADMIN",
            PortalRole::Superadmin => "ROLE_PORTAL_SUPERADMIN",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ROLE_PORTAL_USER" => Some(PortalRole::User),
            "ROLE_PORTAL_ADMIN" => Some(PortalRole::Admin),
            "ROLE_PORTAL_SUPERADMIN" => Some(PortalRole::Superadmin),
            _ => None,
        }
    }
}

/// Role set for a freshly registered account.
pub fn default_roles() -> Vec<String> {
    vec![PortalRole::User.as_tag().to_string()]
}

pub fn holds(roles: &[String], role: PortalRole) -> bool {
    roles.iter().any(|tag| tag == role.as_tag())
}

/// Admin or superadmin.
pub fn is_privileged(roles: &[String]) -> bool {
    holds(roles, PortalRole::Admin) || holds(roles, PortalRole::Superadmin)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("only a superadmin may manage admin privileges")]
    NotSuperadmin,

    #[error("cannot manage privileges of itself")]
    SelfPrivilege,

    #[error("target already holds admin or superadmin privilege")]
    AlreadyPrivileged,

    #[error("target holds neither admin nor superadmin privilege")]
    NotPrivileged,
}

/// Decide whether `actor` may modify or delete `target`'s account.
///
/// Rules are evaluated in order, first match wins:
/// 1. a superadmin account can only be touched by itself,
/// 2. self-service profile edits are always allowed,
/// 3. unprivileged actors cannot touch other accounts,
/// 4. plain admins cannot act on other admins or superadmins,
/// 5. otherwise allowed.
pub fn can_modify(actor: &User, target: &User) -> bool {
    if holds(&target.roles, PortalRole::Superadmin) && actor.user_id != target.user_id {
        return false;
    }
    if actor.user_id == target.user_id {
        return true;
    }
    if !is_privileged(&actor.roles) {
        return false;
    }
    if !holds(&actor.roles, PortalRole::Superadmin) && is_privileged(&target.roles) {
        return false;
    }
    true
}

/// Compute the replacement role set for granting admin to `target`.
///
/// Rejects rather than silently no-ops when the target is already
/// privileged, so client logic errors surface as conflicts.
pub fn grant_admin(actor: &User, target: &User) -> Result<Vec<String>, RoleError> {
    guard_privilege_change(actor, target)?;
    if is_privileged(&target.roles) {
        return Err(RoleError::AlreadyPrivileged);
    }

    let mut set: BTreeSet<String> = target.roles.iter().cloned().collect();
    set.insert(PortalRole::Admin.as_tag().to_string());
    Ok(set.into_iter().collect())
}

/// Compute the replacement role set for revoking admin from `target`.
///
/// Only the admin tag is stripped: a superadmin who also held admin stays
/// superadmin.
pub fn revoke_admin(actor: &User, target: &User) -> Result<Vec<String>, RoleError> {
    guard_privilege_change(actor, target)?;
    if !is_privileged(&target.roles) {
        return Err(RoleError::NotPrivileged);
    }

    let set: BTreeSet<String> = target
        .roles
        .iter()
        .filter(|tag| tag.as_str() != PortalRole::Admin.as_tag())
        .cloned()
        .collect();
    Ok(set.into_iter().collect())
}

fn guard_privilege_change(actor: &User, target: &User) -> Result<(), RoleError> {
    if !holds(&actor.roles, PortalRole::Superadmin) {
        return Err(RoleError::NotSuperadmin);
    }
    if actor.user_id == target.user_id {
        return Err(RoleError::SelfPrivilege);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn account(roles: &[PortalRole]) -> User {
        User {
            user_id: Uuid::new_v4(),
            name: "test".to_string(),
            email: format!("{}@example.com", Uuid::new_v4()),
            hashed_password: "hash".to_string(),
            roles: roles.iter().map(|r| r.as_tag().to_string()).collect(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn superadmin_target_denied_for_everyone_else() {
        let target = account(&[PortalRole::User, PortalRole::Superadmin]);
        for actor_roles in [
            vec![PortalRole::User],
            vec![PortalRole::User, PortalRole::Admin],
            vec![PortalRole::User, PortalRole::Superadmin],
        ] {
            let actor = account(&actor_roles);
            assert!(!can_modify(&actor, &target));
        }
    }

    #[test]
    fn self_service_allowed_regardless_of_role() {
        for roles in [
            vec![PortalRole::User],
            vec![PortalRole::User, PortalRole::Admin],
            vec![PortalRole::User, PortalRole::Superadmin],
        ] {
            let actor = account(&roles);
            assert!(can_modify(&actor, &actor));
        }
    }

    #[test]
    fn unprivileged_actor_denied_on_others() {
        let actor = account(&[PortalRole::User]);
        let target = account(&[PortalRole::User]);
        assert!(!can_modify(&actor, &target));
    }

    #[test]
    fn admin_cannot_act_on_admin_or_superadmin() {
        let actor = account(&[PortalRole::User, PortalRole::Admin]);
        assert!(!can_modify(&actor, &account(&[PortalRole::User, PortalRole::Admin])));
        assert!(!can_modify(
            &actor,
            &account(&[PortalRole::User, PortalRole::Superadmin])
        ));
        assert!(can_modify(&actor, &account(&[PortalRole::User])));
    }

    #[test]
    fn superadmin_can_act_on_admin() {
        let actor = account(&[PortalRole::User, PortalRole::Superadmin]);
        let target = account(&[PortalRole::User, PortalRole::Admin]);
        assert!(can_modify(&actor, &target));
    }

    #[test]
    fn grant_requires_superadmin_actor() {
        let actor = account(&[PortalRole::User, PortalRole::Admin]);
        let target = account(&[PortalRole::User]);
        assert_eq!(grant_admin(&actor, &target), Err(RoleError::NotSuperadmin));
    }

    #[test]
    fn grant_rejects_self_target() {
        let actor = account(&[PortalRole::User, PortalRole::Superadmin]);
        assert_eq!(grant_admin(&actor, &actor), Err(RoleError::SelfPrivilege));
        assert_eq!(revoke_admin(&actor, &actor), Err(RoleError::SelfPrivilege));
    }

    #[test]
    fn grant_rejects_already_privileged_target() {
        let actor = account(&[PortalRole::User, PortalRole::Superadmin]);
        let admin = account(&[PortalRole::User, PortalRole::Admin]);
        let superadmin = account(&[PortalRole::User, PortalRole::Superadmin]);
        assert_eq!(grant_admin(&actor, &admin), Err(RoleError::AlreadyPrivileged));
        assert_eq!(
            grant_admin(&actor, &superadmin),
            Err(RoleError::AlreadyPrivileged)
        );
    }

    #[test]
    fn grant_adds_admin_tag() {
        let actor = account(&[PortalRole::User, PortalRole::Superadmin]);
        let target = account(&[PortalRole::User]);
        let roles = grant_admin(&actor, &target).unwrap();
        assert!(holds(&roles, PortalRole::Admin));
        assert!(holds(&roles, PortalRole::User));
        assert_eq!(roles.len(), 2);
    }

    #[test]
    fn revoke_rejects_unprivileged_target() {
        let actor = account(&[PortalRole::User, PortalRole::Superadmin]);
        let target = account(&[PortalRole::User]);
        assert_eq!(revoke_admin(&actor, &target), Err(RoleError::NotPrivileged));
    }

    #[test]
    fn revoke_never_strips_superadmin() {
        let actor = account(&[PortalRole::User, PortalRole::Superadmin]);
        let target = account(&[PortalRole::User, PortalRole::Admin, PortalRole::Superadmin]);
        let roles = revoke_admin(&actor, &target).unwrap();
        assert!(!holds(&roles, PortalRole::Admin));
        assert!(holds(&roles, PortalRole::Superadmin));
    }

    #[test]
    fn grant_then_revoke_restores_original_set() {
        let actor = account(&[PortalRole::User, PortalRole::Superadmin]);
        let mut target = account(&[PortalRole::User]);
        let original = {
            let mut r = target.roles.clone();
            r.sort();
            r
        };

        target.roles = grant_admin(&actor, &target).unwrap();
        target.roles = revoke_admin(&actor, &target).unwrap();
        assert_eq!(target.roles, original);
    }

    #[test]
    fn duplicate_tags_collapse() {
        let actor = account(&[PortalRole::User, PortalRole::Superadmin]);
        let mut target = account(&[PortalRole::User]);
        target.roles.push(PortalRole::User.as_tag().to_string());
        let roles = grant_admin(&actor, &target).unwrap();
        assert_eq!(roles.len(), 2);
    }
}
