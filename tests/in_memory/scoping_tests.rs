//! In-memory integration tests for row-level visibility.

use crate::in_memory::helpers::{Cast, cast, comment_on, create_task, ledger};
use http::StatusCode;
use rstest::rstest;
use serde_json::json;
use taskledger::{
    app::InMemoryLedger,
    tracker::{
        domain::{
            NoFilter, Task, TaskComment, TaskCommentDraft, TaskDraft, TaskFilter, TaskReport,
            TaskReportDraft,
        },
        services::OperationError,
        validation::WriteMode,
    },
    transport::error_response,
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn users_only_list_their_own_tasks(ledger: InMemoryLedger, cast: Cast) {
    create_task(&ledger, &cast.alice, "Alice one").await.expect("create");
    create_task(&ledger, &cast.alice, "Alice two").await.expect("create");
    create_task(&ledger, &cast.bob, "Bob one").await.expect("create");

    let for_alice = ledger
        .pipeline()
        .list::<Task>(&cast.alice, TaskFilter::default(), 0, None)
        .await
        .expect("list");
    let for_bob = ledger
        .pipeline()
        .list::<Task>(&cast.bob, TaskFilter::default(), 0, None)
        .await
        .expect("list");
    let for_staff = ledger
        .pipeline()
        .list::<Task>(&cast.staff, TaskFilter::default(), 0, None)
        .await
        .expect("list");

    assert_eq!(for_alice.total, 2);
    assert_eq!(for_bob.total, 1);
    assert_eq!(for_bob.items[0].title(), "Bob one");
    assert_eq!(for_staff.total, 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn foreign_rows_answer_not_found(ledger: InMemoryLedger, cast: Cast) {
    let task = create_task(&ledger, &cast.alice, "Private plans")
        .await
        .expect("create");

    let err = ledger
        .pipeline()
        .update::<Task>(
            &cast.bob,
            task.id(),
            TaskDraft::titled("Hijacked"),
            WriteMode::Patch,
        )
        .await
        .expect_err("bob cannot see alice's task");
    let unchanged = ledger
        .pipeline()
        .retrieve::<Task>(&cast.alice, task.id())
        .await
        .expect("alice still sees her task");

    assert!(matches!(err, OperationError::NotFound));
    assert_eq!(
        error_response(&err),
        (StatusCode::NOT_FOUND, json!({ "detail": "Not found." }))
    );
    assert_eq!(unchanged.title(), "Private plans");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn comments_follow_the_scope_of_their_task(ledger: InMemoryLedger, cast: Cast) {
    let task = create_task(&ledger, &cast.alice, "Shared review")
        .await
        .expect("create");
    let comment = comment_on(&ledger, &cast.alice, task.id(), "First draft is up")
        .await
        .expect("comment");

    let for_bob = ledger
        .pipeline()
        .list::<TaskComment>(&cast.bob, NoFilter, 0, None)
        .await
        .expect("list");
    let bob_reads = ledger
        .pipeline()
        .retrieve::<TaskComment>(&cast.bob, comment.id)
        .await;
    let staff_reads = ledger
        .pipeline()
        .retrieve::<TaskComment>(&cast.staff, comment.id)
        .await;

    assert_eq!(for_bob.total, 0);
    assert!(matches!(bob_reads, Err(OperationError::NotFound)));
    assert_eq!(staff_reads.expect("staff sees every comment"), comment);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn users_cannot_attach_rows_to_foreign_tasks(ledger: InMemoryLedger, cast: Cast) {
    let task = create_task(&ledger, &cast.alice, "Private plans")
        .await
        .expect("create");

    let err = ledger
        .pipeline()
        .create::<TaskComment>(
            &cast.bob,
            TaskCommentDraft {
                task: Some(task.id()),
                comment: Some("Sneaky comment".to_owned()),
            },
        )
        .await
        .expect_err("bob cannot reference alice's task");

    let OperationError::Rejected(errors) = err else {
        panic!("expected a validation rejection, got {err:?}");
    };
    assert_eq!(
        errors.field("task"),
        [format!("Invalid pk \"{}\" - object does not exist.", task.id())]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reports_belong_to_their_author(ledger: InMemoryLedger, cast: Cast) {
    let draft = TaskReportDraft {
        report_type: Some("weekly".to_owned()),
        date: None,
    };
    let report = ledger
        .pipeline()
        .create::<TaskReport>(&cast.alice, draft)
        .await
        .expect("report is valid");

    let for_alice = ledger
        .pipeline()
        .list::<TaskReport>(&cast.alice, NoFilter, 0, None)
        .await
        .expect("list");
    let for_bob = ledger
        .pipeline()
        .list::<TaskReport>(&cast.bob, NoFilter, 0, None)
        .await
        .expect("list");

    assert_eq!(report.user, Some(cast.alice.principal().user_id()));
    assert_eq!(for_alice.items, [report]);
    assert_eq!(for_bob.total, 0);
}
