//! Unit tests for principals and scope resolution.

use super::{OwnershipRule, Principal, RequestContext, ScopePredicate, UserId, resolve_scope};
use rstest::rstest;
use std::net::{IpAddr, Ipv4Addr};

#[rstest]
#[case(OwnershipRule::DirectOwner)]
#[case(OwnershipRule::ThroughTask)]
#[case(OwnershipRule::TeamMembership)]
#[case(OwnershipRule::Actor)]
fn regular_user_is_restricted_to_own_rows(#[case] rule: OwnershipRule) {
    let user = UserId::new();
    let scope = resolve_scope(&Principal::user(user, "alice"), rule);

    assert_eq!(scope, ScopePredicate::Restricted { user, rule });
    assert_eq!(scope.restricted_user(), Some(user));
}

#[rstest]
#[case(Principal::staff(UserId::new(), "ops"))]
#[case(Principal::superuser(UserId::new(), "root"))]
fn administrators_are_unrestricted(#[case] principal: Principal) {
    let scope = resolve_scope(&principal, OwnershipRule::ThroughTask);
    assert!(scope.is_unrestricted());
    assert_eq!(scope.restricted_user(), None);
}

#[rstest]
fn restricted_scope_rejects_orphaned_rows() {
    let user = UserId::new();
    let scope = resolve_scope(&Principal::user(user, "alice"), OwnershipRule::DirectOwner);

    assert!(scope.admits_owner(Some(user)));
    assert!(!scope.admits_owner(Some(UserId::new())));
    assert!(!scope.admits_owner(None));
    assert!(ScopePredicate::Unrestricted.admits_owner(None));
}

#[rstest]
fn only_owner_or_admin_can_act_for_a_row() {
    let owner = UserId::new();
    let alice = Principal::user(owner, "alice");
    let bob = Principal::user(UserId::new(), "bob");
    let ops = Principal::staff(UserId::new(), "ops");

    assert!(alice.can_act_for(Some(owner)));
    assert!(!bob.can_act_for(Some(owner)));
    assert!(!bob.can_act_for(None));
    assert!(ops.can_act_for(Some(owner)));
    assert!(ops.can_act_for(None));
}

#[rstest]
fn superuser_implies_staff() {
    let root = Principal::superuser(UserId::new(), "root");
    assert!(root.is_staff());
    assert!(root.is_superuser());
    assert!(!Principal::staff(UserId::new(), "ops").is_superuser());
}

#[rstest]
fn request_context_carries_origin() {
    let origin = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7));
    let context =
        RequestContext::new(Principal::user(UserId::new(), "alice")).with_origin(Some(origin));

    assert_eq!(context.origin(), Some(origin));
    assert_eq!(context.principal().username(), "alice");
}
