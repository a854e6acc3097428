//! Entity store behaviour against `PostgreSQL`.

use crate::postgres::helpers::{prepared_ledger, staff, user};
use taskledger::tracker::{
    domain::{
        History, NoFilter, Task, TaskComment, TaskCommentDraft, TaskDependence,
        TaskDependenceDraft, TaskDraft, TaskFilter, TaskStatus, Team, TeamDraft,
    },
    services::OperationError,
    validation::WriteMode,
};

#[tokio::test(flavor = "multi_thread")]
async fn tasks_are_scoped_to_their_owner() {
    let prepared = prepared_ledger().await.expect("setup");
    let pipeline = prepared.ledger.pipeline();
    let alice = user("alice");
    let bob = user("bob");
    let ops = staff("ops");

    let mine = pipeline
        .create::<Task>(&alice, TaskDraft::titled("Renew certificates"))
        .await
        .expect("create");
    pipeline
        .create::<Task>(&bob, TaskDraft::titled("Order toner"))
        .await
        .expect("create");

    let for_alice = pipeline
        .list::<Task>(&alice, TaskFilter::default(), 0, None)
        .await
        .expect("list");
    let for_ops = pipeline
        .list::<Task>(&ops, TaskFilter::default(), 0, None)
        .await
        .expect("list");
    let foreign = pipeline.retrieve::<Task>(&bob, mine.id()).await;

    assert_eq!(for_alice.total, 1);
    assert_eq!(for_alice.items[0].id(), mine.id());
    assert_eq!(for_ops.total, 2);
    assert!(matches!(foreign, Err(OperationError::NotFound)));
}

#[tokio::test(flavor = "multi_thread")]
async fn updates_and_toggles_write_history() {
    let prepared = prepared_ledger().await.expect("setup");
    let pipeline = prepared.ledger.pipeline();
    let alice = user("alice");
    let task = pipeline
        .create::<Task>(&alice, TaskDraft::titled("Migrate mail server"))
        .await
        .expect("create");

    pipeline
        .update::<Task>(
            &alice,
            task.id(),
            TaskDraft::default().with_status("in_progress"),
            WriteMode::Patch,
        )
        .await
        .expect("patch");
    let toggled = pipeline.toggle(&alice, task.id()).await.expect("toggle");
    let stored = pipeline
        .retrieve::<Task>(&alice, task.id())
        .await
        .expect("retrieve");
    let histories = pipeline
        .list::<History>(&alice, NoFilter, 0, None)
        .await
        .expect("list");

    assert_eq!(toggled, TaskStatus::Completed);
    assert_eq!(stored.status(), TaskStatus::Completed);
    assert_eq!(histories.total, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_task_cascades_to_its_children() {
    let prepared = prepared_ledger().await.expect("setup");
    let pipeline = prepared.ledger.pipeline();
    let alice = user("alice");
    let first = pipeline
        .create::<Task>(&alice, TaskDraft::titled("Draft budget"))
        .await
        .expect("create");
    let second = pipeline
        .create::<Task>(&alice, TaskDraft::titled("Approve budget"))
        .await
        .expect("create");
    pipeline
        .create::<TaskComment>(
            &alice,
            TaskCommentDraft {
                task: Some(first.id()),
                comment: Some("Numbers from finance".to_owned()),
            },
        )
        .await
        .expect("comment");
    pipeline
        .create::<TaskDependence>(
            &alice,
            TaskDependenceDraft {
                task: Some(second.id()),
                dependent_task: Some(first.id()),
            },
        )
        .await
        .expect("dependence");

    pipeline
        .delete::<Task>(&alice, first.id())
        .await
        .expect("delete");

    let comments = pipeline
        .list::<TaskComment>(&alice, NoFilter, 0, None)
        .await
        .expect("list");
    let dependences = pipeline
        .list::<TaskDependence>(&alice, NoFilter, 0, None)
        .await
        .expect("list");

    assert_eq!(comments.total, 0);
    assert_eq!(dependences.total, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn dependence_cycles_and_duplicate_team_names_are_rejected() {
    let prepared = prepared_ledger().await.expect("setup");
    let pipeline = prepared.ledger.pipeline();
    let alice = user("alice");
    let bob = user("bob");
    let first = pipeline
        .create::<Task>(&alice, TaskDraft::titled("Pour foundation"))
        .await
        .expect("create");
    let second = pipeline
        .create::<Task>(&alice, TaskDraft::titled("Frame walls"))
        .await
        .expect("create");
    pipeline
        .create::<TaskDependence>(
            &alice,
            TaskDependenceDraft {
                task: Some(second.id()),
                dependent_task: Some(first.id()),
            },
        )
        .await
        .expect("dependence");
    pipeline
        .create::<Team>(
            &alice,
            TeamDraft {
                name: Some("Builders".to_owned()),
            },
        )
        .await
        .expect("team");

    let cycle = pipeline
        .create::<TaskDependence>(
            &alice,
            TaskDependenceDraft {
                task: Some(first.id()),
                dependent_task: Some(second.id()),
            },
        )
        .await;
    let duplicate = pipeline
        .create::<Team>(
            &bob,
            TeamDraft {
                name: Some("Builders".to_owned()),
            },
        )
        .await;

    assert!(matches!(cycle, Err(OperationError::Rejected(_))));
    assert!(matches!(duplicate, Err(OperationError::Rejected(_))));
}
