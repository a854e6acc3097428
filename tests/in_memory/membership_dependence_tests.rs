//! In-memory integration tests for teams, memberships and dependencies.

use crate::in_memory::helpers::{Cast, cast, create_task, ledger};
use rstest::rstest;
use taskledger::{
    app::InMemoryLedger,
    tracker::{
        domain::{
            NoFilter, Task, TaskDependence, TaskDependenceDraft, Team, TeamDraft, UserTeams,
            UserTeamsDraft,
        },
        services::OperationError,
        validation::FieldErrors,
    },
};

fn rejection(err: OperationError) -> FieldErrors {
    match err {
        OperationError::Rejected(errors) => errors,
        other => panic!("expected a validation rejection, got {other:?}"),
    }
}

async fn create_team(ledger: &InMemoryLedger, cast: &Cast, name: &str) -> Team {
    ledger
        .pipeline()
        .create::<Team>(
            &cast.alice,
            TeamDraft {
                name: Some(name.to_owned()),
            },
        )
        .await
        .expect("team should be created")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn team_names_are_unique_across_owners(ledger: InMemoryLedger, cast: Cast) {
    create_team(&ledger, &cast, "Platform").await;

    let err = ledger
        .pipeline()
        .create::<Team>(
            &cast.bob,
            TeamDraft {
                name: Some("Platform".to_owned()),
            },
        )
        .await
        .expect_err("the name is taken");

    assert_eq!(
        rejection(err).field("name"),
        ["team with this name already exists."]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn members_join_once(ledger: InMemoryLedger, cast: Cast) {
    let team = create_team(&ledger, &cast, "Platform").await;
    let join = UserTeamsDraft {
        user: None,
        team: Some(team.id),
    };

    let membership = ledger
        .pipeline()
        .create::<UserTeams>(&cast.bob, join.clone())
        .await
        .expect("bob may join");
    let err = ledger
        .pipeline()
        .create::<UserTeams>(&cast.bob, join)
        .await
        .expect_err("bob is already a member");

    assert_eq!(membership.user, cast.bob.principal().user_id());
    assert_eq!(
        rejection(err).non_field(),
        ["This user is already a member of this team."]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn team_owners_see_and_manage_memberships(ledger: InMemoryLedger, cast: Cast) {
    let team = create_team(&ledger, &cast, "Platform").await;
    let enlisted = ledger
        .pipeline()
        .create::<UserTeams>(
            &cast.alice,
            UserTeamsDraft {
                user: Some(cast.bob.principal().user_id()),
                team: Some(team.id),
            },
        )
        .await
        .expect("owners may add other users");

    let for_owner = ledger
        .pipeline()
        .list::<UserTeams>(&cast.alice, NoFilter, 0, None)
        .await
        .expect("list");
    let for_member = ledger
        .pipeline()
        .list::<UserTeams>(&cast.bob, NoFilter, 0, None)
        .await
        .expect("list");
    let for_staff = ledger
        .pipeline()
        .list::<UserTeams>(&cast.staff, NoFilter, 0, None)
        .await
        .expect("list");

    assert_eq!(for_owner.items, [enlisted.clone()]);
    assert_eq!(for_member.items, [enlisted]);
    assert_eq!(for_staff.total, 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dependencies_stay_acyclic(ledger: InMemoryLedger, cast: Cast) {
    let design = create_task(&ledger, &cast.alice, "Design").await.expect("create");
    let build = create_task(&ledger, &cast.alice, "Build").await.expect("create");
    let ship = create_task(&ledger, &cast.alice, "Ship").await.expect("create");
    let edge = |task: &Task, dependent: &Task| TaskDependenceDraft {
        task: Some(task.id()),
        dependent_task: Some(dependent.id()),
    };

    for (task, dependent) in [(&build, &design), (&ship, &build)] {
        ledger
            .pipeline()
            .create::<TaskDependence>(&cast.alice, edge(task, dependent))
            .await
            .expect("edge is acyclic");
    }
    let cycle = ledger
        .pipeline()
        .create::<TaskDependence>(&cast.alice, edge(&design, &ship))
        .await
        .expect_err("design cannot wait on ship");
    let own = ledger
        .pipeline()
        .create::<TaskDependence>(&cast.alice, edge(&design, &design))
        .await
        .expect_err("tasks cannot wait on themselves");

    assert_eq!(
        rejection(cycle).non_field(),
        ["This dependency would create a cycle."]
    );
    assert_eq!(rejection(own).non_field(), ["A task cannot depend on itself."]);
}
