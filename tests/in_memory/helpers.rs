//! Shared fixtures for in-memory ledger integration tests.

use eyre::WrapErr;
use rstest::fixture;
use taskledger::{
    access::{Principal, RequestContext, UserId},
    app::InMemoryLedger,
    config::ServiceConfig,
    tracker::domain::{Task, TaskComment, TaskCommentDraft, TaskDraft, TaskId},
};
use std::net::{IpAddr, Ipv4Addr};

/// Request contexts for the principals used across the suite.
pub struct Cast {
    /// Regular user.
    pub alice: RequestContext,
    /// Another regular user.
    pub bob: RequestContext,
    /// Staff administrator.
    pub staff: RequestContext,
    /// Superuser.
    pub root: RequestContext,
}

/// Provides a fresh ledger with default settings.
#[fixture]
pub fn ledger() -> InMemoryLedger {
    InMemoryLedger::in_memory(&ServiceConfig::default())
}

/// Provides one context per principal role.
#[fixture]
pub fn cast() -> Cast {
    let office = Some(IpAddr::V4(Ipv4Addr::new(198, 51, 100, 20)));
    Cast {
        alice: RequestContext::new(Principal::user(UserId::new(), "alice")).with_origin(office),
        bob: RequestContext::new(Principal::user(UserId::new(), "bob")),
        staff: RequestContext::new(Principal::staff(UserId::new(), "ops")),
        root: RequestContext::new(Principal::superuser(UserId::new(), "root")),
    }
}

/// Creates a task titled `title` for `context`.
///
/// # Errors
///
/// Returns an error if the pipeline rejects the task.
pub async fn create_task(
    ledger: &InMemoryLedger,
    context: &RequestContext,
    title: &str,
) -> eyre::Result<Task> {
    ledger
        .pipeline()
        .create::<Task>(context, TaskDraft::titled(title))
        .await
        .wrap_err_with(|| format!("creating task {title:?}"))
}

/// Adds a comment to `task` for `context`.
///
/// # Errors
///
/// Returns an error if the pipeline rejects the comment.
pub async fn comment_on(
    ledger: &InMemoryLedger,
    context: &RequestContext,
    task: TaskId,
    text: &str,
) -> eyre::Result<TaskComment> {
    ledger
        .pipeline()
        .create::<TaskComment>(
            context,
            TaskCommentDraft {
                task: Some(task),
                comment: Some(text.to_owned()),
            },
        )
        .await
        .wrap_err("creating comment")
}
