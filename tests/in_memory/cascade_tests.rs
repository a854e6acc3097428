//! In-memory integration tests for deletes and user removal.

use crate::in_memory::helpers::{Cast, cast, comment_on, create_task, ledger};
use http::StatusCode;
use rstest::rstest;
use taskledger::{
    app::InMemoryLedger,
    tracker::{
        domain::{
            EntityKind, History, NoFilter, Task, TaskAttachment, TaskAttachmentDraft,
            TaskComment, TaskDependence, TaskDependenceDraft, TaskFilter, Team, TeamDraft,
            UserTeams, UserTeamsDraft,
        },
        services::OperationError,
    },
    transport::{Endpoint, success_status},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_task_removes_everything_hanging_off_it(ledger: InMemoryLedger, cast: Cast) {
    let doomed = create_task(&ledger, &cast.alice, "Doomed task").await.expect("create");
    let survivor = create_task(&ledger, &cast.alice, "Survivor").await.expect("create");
    let pipeline = ledger.pipeline();
    comment_on(&ledger, &cast.alice, doomed.id(), "Will not last long")
        .await
        .expect("comment");
    pipeline
        .create::<TaskAttachment>(
            &cast.alice,
            TaskAttachmentDraft {
                task: Some(doomed.id()),
                file_name: Some("notes.txt".to_owned()),
                file_path: Some("/uploads/notes.txt".to_owned()),
            },
        )
        .await
        .expect("attachment");
    pipeline
        .create::<TaskDependence>(
            &cast.alice,
            TaskDependenceDraft {
                task: Some(survivor.id()),
                dependent_task: Some(doomed.id()),
            },
        )
        .await
        .expect("dependence");
    pipeline.toggle(&cast.alice, doomed.id()).await.expect("toggle");

    pipeline
        .delete::<Task>(&cast.alice, doomed.id())
        .await
        .expect("owner may delete");

    let comments = pipeline
        .list::<TaskComment>(&cast.staff, NoFilter, 0, None)
        .await
        .expect("list");
    let attachments = pipeline
        .list::<TaskAttachment>(&cast.staff, NoFilter, 0, None)
        .await
        .expect("list");
    let dependences = pipeline
        .list::<TaskDependence>(&cast.staff, NoFilter, 0, None)
        .await
        .expect("list");
    let histories = pipeline
        .list::<History>(&cast.staff, NoFilter, 0, None)
        .await
        .expect("list");
    let tasks = pipeline
        .list::<Task>(&cast.staff, TaskFilter::default(), 0, None)
        .await
        .expect("list");

    assert_eq!(
        success_status(Endpoint::Delete(EntityKind::Task, doomed.id().into_inner())),
        StatusCode::NO_CONTENT
    );
    assert_eq!(comments.total, 0);
    assert_eq!(attachments.total, 0);
    assert_eq!(dependences.total, 0);
    assert_eq!(histories.total, 0);
    assert_eq!(tasks.items, [survivor]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_team_removes_its_memberships(ledger: InMemoryLedger, cast: Cast) {
    let pipeline = ledger.pipeline();
    let team = pipeline
        .create::<Team>(
            &cast.alice,
            TeamDraft {
                name: Some("Short lived".to_owned()),
            },
        )
        .await
        .expect("team");
    pipeline
        .create::<UserTeams>(
            &cast.bob,
            UserTeamsDraft {
                user: None,
                team: Some(team.id),
            },
        )
        .await
        .expect("membership");

    let bob_delete = pipeline.delete::<Team>(&cast.bob, team.id).await;
    pipeline
        .delete::<Team>(&cast.alice, team.id)
        .await
        .expect("owner may delete");

    let memberships = pipeline
        .list::<UserTeams>(&cast.staff, NoFilter, 0, None)
        .await
        .expect("list");
    assert!(matches!(bob_delete, Err(OperationError::NotFound)));
    assert_eq!(memberships.total, 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn removed_users_leave_orphaned_rows_behind(ledger: InMemoryLedger, cast: Cast) {
    let pipeline = ledger.pipeline();
    let alice = cast.alice.principal().user_id();
    let task = create_task(&ledger, &cast.alice, "Long-lived task")
        .await
        .expect("create");
    let comment = comment_on(&ledger, &cast.alice, task.id(), "Still relevant")
        .await
        .expect("comment");
    let team = pipeline
        .create::<Team>(
            &cast.alice,
            TeamDraft {
                name: Some("Founders".to_owned()),
            },
        )
        .await
        .expect("team");
    pipeline
        .create::<UserTeams>(
            &cast.alice,
            UserTeamsDraft {
                user: None,
                team: Some(team.id),
            },
        )
        .await
        .expect("membership");

    pipeline.on_user_deleted(alice).await.expect("removal applies");

    let orphan = pipeline
        .retrieve::<Task>(&cast.staff, task.id())
        .await
        .expect("the task survives");
    let kept_comment = pipeline
        .retrieve::<TaskComment>(&cast.staff, comment.id)
        .await
        .expect("the comment survives");
    let kept_team = pipeline
        .retrieve::<Team>(&cast.staff, team.id)
        .await
        .expect("the team survives");
    let memberships = pipeline
        .list::<UserTeams>(&cast.staff, NoFilter, 0, None)
        .await
        .expect("list");

    assert_eq!(orphan.owner(), None);
    assert_eq!(kept_comment.author, None);
    assert_eq!(kept_team.owner, None);
    assert_eq!(memberships.total, 0);
}
