//! In-memory integration tests for task lifecycle operations.

use crate::in_memory::helpers::{Cast, cast, create_task, ledger};
use chrono::Utc;
use http::{Method, StatusCode};
use rstest::rstest;
use serde_json::json;
use taskledger::{
    app::InMemoryLedger,
    tracker::{
        domain::{History, NoFilter, PriorityLevel, Task, TaskDraft, TaskFilter, TaskStatus},
        services::OperationError,
        validation::WriteMode,
    },
    transport::{Endpoint, error_response, resolve, success_status, toggle_body},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_walks_from_creation_to_completion(ledger: InMemoryLedger, cast: Cast) {
    let task = create_task(&ledger, &cast.alice, "Write report")
        .await
        .expect("task creation should succeed");

    let started = ledger
        .pipeline()
        .update::<Task>(
            &cast.alice,
            task.id(),
            TaskDraft::default().with_status("in_progress"),
            WriteMode::Patch,
        )
        .await
        .expect("patch should succeed");
    let completed = ledger
        .pipeline()
        .toggle(&cast.alice, task.id())
        .await
        .expect("toggle should succeed");
    let history = ledger
        .pipeline()
        .list::<History>(&cast.alice, NoFilter, 0, None)
        .await
        .expect("history should be listable");

    assert_eq!(started.status(), TaskStatus::InProgress);
    assert_eq!(completed, TaskStatus::Completed);
    assert_eq!(history.total, 2);
    assert_eq!(
        history.items[0].changes,
        "status: 'pending' -> 'in_progress'"
    );
    assert_eq!(
        history.items[1].changes,
        "status: 'in_progress' -> 'completed'"
    );
    assert_eq!(history.items[1].task_name, "Write report");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn replacing_a_task_keeps_absent_optional_fields(ledger: InMemoryLedger, cast: Cast) {
    let task = ledger
        .pipeline()
        .create::<Task>(
            &cast.alice,
            TaskDraft::titled("Plan offsite")
                .with_description("Venue and agenda")
                .with_priority("high"),
        )
        .await
        .expect("task creation should succeed");

    let replaced = ledger
        .pipeline()
        .update::<Task>(
            &cast.alice,
            task.id(),
            TaskDraft::titled("Plan team offsite"),
            WriteMode::Replace,
        )
        .await
        .expect("replace should succeed");

    assert_eq!(replaced.title(), "Plan team offsite");
    assert_eq!(replaced.description(), Some("Venue and agenda"));
    assert_eq!(replaced.priority(), PriorityLevel::High);
    assert_eq!(replaced.created_at(), task.created_at());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn explicit_null_clears_the_due_date(ledger: InMemoryLedger, cast: Cast) {
    let due = Utc::now().date_naive().succ_opt().expect("valid date");
    let task = ledger
        .pipeline()
        .create::<Task>(
            &cast.alice,
            TaskDraft::titled("Book flights").with_due_date(Some(due)),
        )
        .await
        .expect("task creation should succeed");

    let cleared = ledger
        .pipeline()
        .update::<Task>(
            &cast.alice,
            task.id(),
            TaskDraft::default().with_due_date(None),
            WriteMode::Patch,
        )
        .await
        .expect("patch should succeed");

    assert_eq!(task.due_date(), Some(due));
    assert_eq!(cleared.due_date(), None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invalid_tasks_map_to_bad_request_bodies(ledger: InMemoryLedger, cast: Cast) {
    let draft = TaskDraft::titled("Rotate keys")
        .with_status("completed")
        .with_priority("critical");

    let err = ledger
        .pipeline()
        .create::<Task>(&cast.alice, draft)
        .await
        .expect_err("critical tasks cannot start completed");
    let (status, body) = error_response(&err);

    assert!(matches!(err, OperationError::Rejected(_)));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "non_field_errors": ["Critical priority tasks cannot be marked as completed."]
        })
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn routed_toggle_reports_the_new_status(ledger: InMemoryLedger, cast: Cast) {
    let task = create_task(&ledger, &cast.alice, "Water plants")
        .await
        .expect("task creation should succeed");
    let path = format!("/api/tasks/{}/toggle/", task.id());

    let route = resolve(&Method::POST, &path).expect("toggle route should resolve");
    let Endpoint::Toggle(id) = route.endpoint else {
        panic!("expected a toggle endpoint, got {:?}", route.endpoint);
    };
    let status = ledger
        .pipeline()
        .toggle(&cast.alice, id)
        .await
        .expect("toggle should succeed");

    assert_eq!(success_status(route.endpoint), StatusCode::OK);
    assert_eq!(toggle_body(status), json!({ "status": "completed" }));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_lists_filter_by_title_and_status(ledger: InMemoryLedger, cast: Cast) {
    for title in ["Write release notes", "Review release plan", "Order lunch"] {
        create_task(&ledger, &cast.alice, title)
            .await
            .expect("task creation should succeed");
    }
    let lunch = ledger
        .pipeline()
        .list::<Task>(
            &cast.alice,
            TaskFilter {
                search: Some("lunch".to_owned()),
                ..TaskFilter::default()
            },
            0,
            None,
        )
        .await
        .expect("list should succeed");
    ledger
        .pipeline()
        .toggle(&cast.alice, lunch.items[0].id())
        .await
        .expect("toggle should succeed");

    let releases = ledger
        .pipeline()
        .list::<Task>(
            &cast.alice,
            TaskFilter {
                search: Some("RELEASE".to_owned()),
                status: Some(TaskStatus::Pending),
                ..TaskFilter::default()
            },
            0,
            None,
        )
        .await
        .expect("list should succeed");

    let titles: Vec<&str> = releases.items.iter().map(Task::title).collect();
    assert_eq!(titles, ["Write release notes", "Review release plan"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn page_size_is_clamped_to_the_configured_maximum(ledger: InMemoryLedger, cast: Cast) {
    for index in 0..3 {
        create_task(&ledger, &cast.alice, &format!("Chore number {index}"))
            .await
            .expect("task creation should succeed");
    }

    let page = ledger
        .pipeline()
        .list::<Task>(&cast.alice, TaskFilter::default(), 0, Some(0))
        .await
        .expect("list should succeed");

    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 1);
}
