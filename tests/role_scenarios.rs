//! End-to-end privilege scenarios across the permission evaluator and the
//! grant/revoke state machine.

use chrono::Utc;
use uuid::Uuid;

use mnu_portal::database::models::User;
use mnu_portal::roles::{self, PortalRole, RoleError};

fn account(roles: &[PortalRole]) -> User {
    User {
        user_id: Uuid::new_v4(),
        name: "member".to_string(),
        email: format!("{}@example.com", Uuid::new_v4()),
        hashed_password: "hash".to_string(),
        roles: roles.iter().map(|r| r.as_tag().to_string()).collect(),
        created_at: Utc::now(),
    }
}

#[test]
fn superadmin_promotes_user_but_nobody_self_promotes() {
    let a = account(&[PortalRole::User, PortalRole::Superadmin]);
    let mut b = account(&[PortalRole::User]);

    // A grants admin to B.
    b.roles = roles::grant_admin(&a, &b).unwrap();
    assert!(roles::holds(&b.roles, PortalRole::User));
    assert!(roles::holds(&b.roles, PortalRole::Admin));
    assert_eq!(b.roles.len(), 2);

    // A cannot touch its own privileges.
    assert_eq!(roles::grant_admin(&a, &a), Err(RoleError::SelfPrivilege));

    // Freshly promoted B is still no superadmin, so B cannot promote anyone.
    let c = account(&[PortalRole::User]);
    assert_eq!(roles::grant_admin(&b, &c), Err(RoleError::NotSuperadmin));
}

#[test]
fn demoted_admin_loses_account_management_rights() {
    let superadmin = account(&[PortalRole::User, PortalRole::Superadmin]);
    let mut admin = account(&[PortalRole::User, PortalRole::Admin]);
    let member = account(&[PortalRole::User]);

    assert!(roles::can_modify(&admin, &member));

    admin.roles = roles::revoke_admin(&superadmin, &admin).unwrap();
    assert!(!roles::can_modify(&admin, &member));
    // Self-service continues regardless of demotion.
    assert!(roles::can_modify(&admin, &admin));
}

#[test]
fn privilege_round_trip_is_lossless() {
    let superadmin = account(&[PortalRole::User, PortalRole::Superadmin]);
    let mut target = account(&[PortalRole::User]);
    let original = target.roles.clone();

    target.roles = roles::grant_admin(&superadmin, &target).unwrap();
    target.roles = roles::revoke_admin(&superadmin, &target).unwrap();
    assert_eq!(target.roles, original);
}
