//! Audit log persistence against `PostgreSQL`.

use crate::postgres::helpers::{connect, prepared_ledger, superuser, user};
use chrono::{Duration, Utc};
use diesel::connection::SimpleConnection;
use taskledger::{
    audit::domain::{LogCategory, LogFilter},
    tracker::domain::{Task, TaskDraft},
};

#[tokio::test(flavor = "multi_thread")]
async fn operations_leave_a_persistent_trail() {
    let prepared = prepared_ledger().await.expect("setup");
    let alice = user("alice");
    prepared
        .ledger
        .pipeline()
        .create::<Task>(&alice, TaskDraft::titled("Rotate API keys"))
        .await
        .expect("create");
    prepared
        .ledger
        .pipeline()
        .create::<Task>(&alice, TaskDraft::titled("x"))
        .await
        .expect_err("title too short");

    let trail = prepared
        .ledger
        .maintenance()
        .list(&alice, LogFilter::default())
        .await
        .expect("list");
    let errors = prepared
        .ledger
        .maintenance()
        .list(
            &alice,
            LogFilter {
                category: Some(LogCategory::Error),
                ..LogFilter::default()
            },
        )
        .await
        .expect("list");

    assert_eq!(trail.len(), 2);
    assert_eq!(trail[1].details(), "User 'alice' created task 'Rotate API keys'");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].action(), "Validation Error");
}

#[tokio::test(flavor = "multi_thread")]
async fn purge_and_user_removal_rewrite_the_trail() {
    let prepared = prepared_ledger().await.expect("setup");
    let alice = user("alice");
    let root = superuser("root");
    prepared
        .ledger
        .pipeline()
        .create::<Task>(&alice, TaskDraft::titled("Archive invoices"))
        .await
        .expect("create");

    prepared
        .ledger
        .pipeline()
        .on_user_deleted(alice.principal().user_id())
        .await
        .expect("user removal");
    let orphaned = prepared
        .ledger
        .maintenance()
        .list(
            &root,
            LogFilter {
                search: Some("Archive invoices".to_owned()),
                ..LogFilter::default()
            },
        )
        .await
        .expect("list");
    let removed = prepared
        .ledger
        .maintenance()
        .purge(&root, Utc::now() + Duration::seconds(1))
        .await
        .expect("purge");
    let remaining = prepared
        .ledger
        .maintenance()
        .list(&root, LogFilter::default())
        .await
        .expect("list");

    assert_eq!(orphaned.len(), 1);
    assert_eq!(orphaned[0].actor(), None);
    assert!(removed >= 1);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].action(), "Audit Log Purged");
}

#[tokio::test(flavor = "multi_thread")]
async fn stored_records_refuse_direct_edits() {
    let prepared = prepared_ledger().await.expect("setup");
    let alice = user("alice");
    prepared
        .ledger
        .pipeline()
        .create::<Task>(&alice, TaskDraft::titled("Renew certificates"))
        .await
        .expect("create");

    let mut connection = connect(&prepared).expect("connect");
    let rewrite = connection.batch_execute("UPDATE logs SET details = 'edited'");
    let orphan = connection.batch_execute("UPDATE logs SET actor_id = NULL");

    let err = rewrite.expect_err("details are immutable");
    assert!(err.to_string().contains("append-only"), "unexpected error: {err}");
    orphan.expect("clearing the actor is allowed");
}
