//! In-memory integration tests for the audit trail.

use crate::in_memory::helpers::{Cast, cast, create_task, ledger};
use chrono::{Duration, Utc};
use http::StatusCode;
use rstest::rstest;
use std::net::{IpAddr, Ipv4Addr};
use taskledger::{
    app::InMemoryLedger,
    audit::{
        domain::{LogCategory, LogFilter, LogLevel},
        services::{AuditAccessError, AuthEventHook},
    },
    tracker::domain::{Task, TaskDraft},
    transport::audit_error_response,
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn users_read_only_their_own_records(ledger: InMemoryLedger, cast: Cast) {
    create_task(&ledger, &cast.alice, "Alice's task").await.expect("create");
    create_task(&ledger, &cast.bob, "Bob's task").await.expect("create");

    let for_alice = ledger
        .maintenance()
        .list(&cast.alice, LogFilter::default())
        .await
        .expect("alice may list");
    let for_staff = ledger
        .maintenance()
        .list(&cast.staff, LogFilter::default())
        .await
        .expect("staff may list");

    assert_eq!(for_alice.len(), 1);
    assert_eq!(for_alice[0].details(), "User 'alice' created task 'Alice's task'");
    assert_eq!(for_alice[0].origin(), cast.alice.origin());
    assert_eq!(for_staff.len(), 2);
    assert_eq!(for_staff[0].details(), "User 'bob' created task 'Bob's task'");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn records_can_be_searched_and_filtered(ledger: InMemoryLedger, cast: Cast) {
    create_task(&ledger, &cast.alice, "Quarterly budget").await.expect("create");
    ledger
        .pipeline()
        .create::<Task>(&cast.alice, TaskDraft::titled("no"))
        .await
        .expect_err("title too short");

    let budget = ledger
        .maintenance()
        .list(
            &cast.staff,
            LogFilter {
                search: Some("BUDGET".to_owned()),
                ..LogFilter::default()
            },
        )
        .await
        .expect("list");
    let errors = ledger
        .maintenance()
        .list(
            &cast.staff,
            LogFilter {
                category: Some(LogCategory::Error),
                level: Some(LogLevel::Warning),
                ..LogFilter::default()
            },
        )
        .await
        .expect("list");

    assert_eq!(budget.len(), 1);
    assert_eq!(budget[0].action(), "Task Created");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].action(), "Validation Error");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn authentication_events_share_the_trail(ledger: InMemoryLedger, cast: Cast) {
    let origin = Some(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 44)));
    let hook = ledger.auth_events();
    hook.login_failed("alice", origin, "invalid credentials").await;
    hook.login_succeeded(cast.alice.principal().user_id(), "alice", origin)
        .await;
    hook.logged_out(cast.alice.principal().user_id(), "alice", origin)
        .await;

    let security = ledger
        .maintenance()
        .list(
            &cast.staff,
            LogFilter {
                category: Some(LogCategory::Security),
                ..LogFilter::default()
            },
        )
        .await
        .expect("list");

    assert_eq!(security.len(), 3);
    assert!(security.iter().all(|entry| entry.origin() == origin));
    assert_eq!(security[2].actor(), None);
    assert_eq!(security[2].level(), LogLevel::Warning);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn only_superusers_purge_and_refusals_are_recorded(ledger: InMemoryLedger, cast: Cast) {
    create_task(&ledger, &cast.alice, "Old news").await.expect("create");
    let cutoff = Utc::now() + Duration::seconds(1);

    let refused = ledger
        .maintenance()
        .purge(&cast.staff, cutoff)
        .await
        .expect_err("staff may not purge");
    let (status, _) = audit_error_response(&refused);
    let removed = ledger
        .maintenance()
        .purge(&cast.root, cutoff)
        .await
        .expect("superusers may purge");
    let remaining = ledger
        .maintenance()
        .list(&cast.root, LogFilter::default())
        .await
        .expect("list");

    assert!(matches!(refused, AuditAccessError::Forbidden));
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(removed, 2);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].action(), "Audit Log Purged");
}
