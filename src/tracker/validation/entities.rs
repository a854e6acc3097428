//! Field and cross-field rules per entity type.

use super::{
    FieldErrors, Rejection, ValidationContext,
    rules::{Checker, TextRule, completion_rules, missing_object, present},
};
use crate::access::{ScopePredicate, UserId};
use crate::tracker::{
    domain::{
        Entity, History, HistoryDraft, PriorityLevel, RecordId, RecurrenceType, ReportType, Task,
        TaskAttachment, TaskAttachmentDraft, TaskComment, TaskCommentDraft, TaskContent,
        TaskDependence, TaskDependenceDraft, TaskDraft, TaskId, TaskPriority, TaskPriorityDraft,
        TaskRecurrence, TaskRecurrenceDraft, TaskReport, TaskReportDraft, TaskSchedule,
        TaskScheduleDraft, TaskStatus, Team, TeamDraft, TeamId, UserProfile, UserProfileDraft,
        UserTeams, UserTeamsDraft,
    },
    ports::{Lookup, StoreError},
};
use std::collections::HashSet;

const TITLE: TextRule = TextRule::new("title")
    .min(3, "Title must be at least 3 characters.")
    .max(255);
const DESCRIPTION: TextRule =
    TextRule::new("description").min(3, "Description must be at least 3 characters.");
const COMMENT: TextRule =
    TextRule::new("comment").min(5, "Comment must be at least 5 characters.");
const FILE_NAME: TextRule = TextRule::new("file_name").max(255);
const FILE_PATH: TextRule = TextRule::new("file_path").max(255);
const PRIORITY_NAME: TextRule = TextRule::new("name")
    .min(2, "Priority name must be at least 2 characters.")
    .max(255);
const TASK_NAME: TextRule = TextRule::new("task_name")
    .min(3, "Task name must be at least 3 characters.")
    .max(255);
const CHANGES: TextRule = TextRule::new("changes");
const TEAM_NAME: TextRule = TextRule::new("name").max(255);
const ROLE: TextRule = TextRule::new("role").max(50);

/// Per-entity validation.
///
/// `validate` merges `draft` over `existing` (absent on create), applies
/// every field rule for supplied values, runs cross-field rules against the
/// merged values, performs store-backed checks through `lookup`, and returns
/// the normalized entity ready to persist. All errors are collected before
/// the payload is rejected.
pub trait Validate: Entity {
    /// Validates a write of `draft`.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::Invalid`] with the complete field error set, or
    /// [`Rejection::Store`] when a store-backed check fails to run.
    fn validate<L: Lookup + ?Sized>(
        draft: &Self::Draft,
        existing: Option<&Self>,
        ctx: &ValidationContext<'_>,
        lookup: &mut L,
    ) -> Result<Self, Rejection>;
}

fn parsed<T>(raw: Option<String>, field: &'static str) -> Result<T, Rejection>
where
    T: for<'a> TryFrom<&'a str>,
{
    let value = present(raw, field)?;
    T::try_from(value.as_str()).map_err(|_| {
        Rejection::Invalid(FieldErrors::single(
            field,
            format!("\"{value}\" is not a valid choice."),
        ))
    })
}

fn require_task<L: Lookup + ?Sized>(
    checker: &mut Checker,
    lookup: &mut L,
    field: &'static str,
    task: Option<TaskId>,
    scope: ScopePredicate,
) -> Result<(), StoreError> {
    let Some(task) = task else {
        return Ok(());
    };
    if !lookup.task_exists(task, scope)? {
        checker.errors_mut().add(field, missing_object(task));
    }
    Ok(())
}

fn author_of(existing: Option<Option<UserId>>, ctx: &ValidationContext<'_>) -> Option<UserId> {
    existing.unwrap_or_else(|| Some(ctx.principal().user_id()))
}

impl Validate for Task {
    fn validate<L: Lookup + ?Sized>(
        draft: &TaskDraft,
        existing: Option<&Self>,
        ctx: &ValidationContext<'_>,
        _lookup: &mut L,
    ) -> Result<Self, Rejection> {
        let mut checker = ctx.checker(existing.is_some());
        let stored = existing.map(Self::content);
        let current = stored.as_ref();
        let statuses = TaskStatus::ALL.map(TaskStatus::as_str);
        let priorities = PriorityLevel::ALL.map(PriorityLevel::as_str);

        let title = checker.required_text(
            TITLE,
            draft.title.as_deref(),
            current.map(|content| content.title.as_str()),
        );
        let description = checker.optional_text(
            DESCRIPTION,
            draft.description.as_ref().map(Option::as_deref),
            current.and_then(|content| content.description.as_deref()),
        );
        let status = checker.choice(
            "status",
            "status",
            &statuses,
            draft.status.as_deref(),
            current.map(|content| content.status.as_str()),
            Some(TaskStatus::default().as_str()),
        );
        let priority = checker.choice(
            "priority",
            "priority",
            &priorities,
            draft.priority.as_deref(),
            current.map(|content| content.priority.as_str()),
            Some(PriorityLevel::default().as_str()),
        );
        let due_date = checker.future_date(
            "due_date",
            "Due date cannot be in the past.",
            draft.due_date,
            current.and_then(|content| content.due_date),
        );

        let today = checker.today();
        completion_rules(
            checker.errors_mut(),
            status.as_deref(),
            priority.as_deref(),
            due_date,
            today,
        );
        checker.finish()?;

        let content = TaskContent {
            title: present(title, "title")?,
            description,
            status: parsed(status, "status")?,
            priority: parsed(priority, "priority")?,
            due_date,
        };
        Ok(match existing {
            Some(task) => {
                let mut revised = task.clone();
                revised.revise(content, ctx.now());
                revised
            }
            None => Self::new(ctx.principal().user_id(), content, ctx.now()),
        })
    }
}

/// Computes the result of a completion toggle on `task`.
///
/// Completed tasks reopen as pending; anything else becomes completed,
/// subject to the same completion rules as an ordinary write.
///
/// # Errors
///
/// Returns [`Rejection::Invalid`] when the new state breaks a completion
/// rule.
pub fn toggle_completion(task: &Task, ctx: &ValidationContext<'_>) -> Result<Task, Rejection> {
    let next = task.status().toggled();
    let mut errors = FieldErrors::default();
    completion_rules(
        &mut errors,
        Some(next.as_str()),
        Some(task.priority().as_str()),
        task.due_date(),
        ctx.today(),
    );
    if !errors.is_empty() {
        return Err(Rejection::Invalid(errors));
    }
    let mut toggled = task.clone();
    toggled.set_status(next, ctx.now());
    Ok(toggled)
}

impl Validate for TaskComment {
    fn validate<L: Lookup + ?Sized>(
        draft: &TaskCommentDraft,
        existing: Option<&Self>,
        ctx: &ValidationContext<'_>,
        lookup: &mut L,
    ) -> Result<Self, Rejection> {
        let mut checker = ctx.checker(existing.is_some());
        let task = checker.reference("task", draft.task, existing.map(|row| row.task));
        let comment = checker.required_text(
            COMMENT,
            draft.comment.as_deref(),
            existing.map(|row| row.comment.as_str()),
        );
        require_task(&mut checker, lookup, "task", task, ctx.task_scope())?;
        checker.finish()?;

        Ok(Self {
            id: existing.map_or_else(RecordId::new, |row| row.id),
            task: present(task, "task")?,
            author: author_of(existing.map(|row| row.author), ctx),
            comment: present(comment, "comment")?,
            created_at: existing.map_or(ctx.now(), |row| row.created_at),
            updated_at: ctx.now(),
        })
    }
}

impl Validate for TaskAttachment {
    fn validate<L: Lookup + ?Sized>(
        draft: &TaskAttachmentDraft,
        existing: Option<&Self>,
        ctx: &ValidationContext<'_>,
        lookup: &mut L,
    ) -> Result<Self, Rejection> {
        let mut checker = ctx.checker(existing.is_some());
        let task = checker.reference("task", draft.task, existing.map(|row| row.task));
        let file_name = checker.required_text(
            FILE_NAME,
            draft.file_name.as_deref(),
            existing.map(|row| row.file_name.as_str()),
        );
        let file_path = checker.required_text(
            FILE_PATH,
            draft.file_path.as_deref(),
            existing.map(|row| row.file_path.as_str()),
        );
        require_task(&mut checker, lookup, "task", task, ctx.task_scope())?;
        checker.finish()?;

        Ok(Self {
            id: existing.map_or_else(RecordId::new, |row| row.id),
            task: present(task, "task")?,
            file_name: present(file_name, "file_name")?,
            file_path: present(file_path, "file_path")?,
            created_at: existing.map_or(ctx.now(), |row| row.created_at),
            updated_at: ctx.now(),
        })
    }
}

impl Validate for TaskPriority {
    fn validate<L: Lookup + ?Sized>(
        draft: &TaskPriorityDraft,
        existing: Option<&Self>,
        ctx: &ValidationContext<'_>,
        lookup: &mut L,
    ) -> Result<Self, Rejection> {
        let mut checker = ctx.checker(existing.is_some());
        let task = checker.reference("task", draft.task, existing.map(|row| row.task));
        let name = checker.required_text(
            PRIORITY_NAME,
            draft.name.as_deref(),
            existing.map(|row| row.name.as_str()),
        );
        require_task(&mut checker, lookup, "task", task, ctx.task_scope())?;
        checker.finish()?;

        Ok(Self {
            id: existing.map_or_else(RecordId::new, |row| row.id),
            task: present(task, "task")?,
            name: present(name, "name")?,
            created_at: existing.map_or(ctx.now(), |row| row.created_at),
            updated_at: ctx.now(),
        })
    }
}

impl Validate for TaskSchedule {
    fn validate<L: Lookup + ?Sized>(
        draft: &TaskScheduleDraft,
        existing: Option<&Self>,
        ctx: &ValidationContext<'_>,
        lookup: &mut L,
    ) -> Result<Self, Rejection> {
        let mut checker = ctx.checker(existing.is_some());
        let task = checker.reference("task", draft.task, existing.map(|row| row.task));
        let schedule_date = checker.future_date(
            "schedule_date",
            "Schedule date cannot be in the past.",
            draft.schedule_date,
            existing.and_then(|row| row.schedule_date),
        );
        let reminder_date = checker.future_date(
            "reminder_date",
            "Reminder date cannot be in the past.",
            draft.reminder_date,
            existing.and_then(|row| row.reminder_date),
        );
        require_task(&mut checker, lookup, "task", task, ctx.task_scope())?;
        checker.finish()?;

        Ok(Self {
            id: existing.map_or_else(RecordId::new, |row| row.id),
            task: present(task, "task")?,
            schedule_date,
            reminder_date,
            created_at: existing.map_or(ctx.now(), |row| row.created_at),
            updated_at: ctx.now(),
        })
    }
}

impl Validate for TaskRecurrence {
    fn validate<L: Lookup + ?Sized>(
        draft: &TaskRecurrenceDraft,
        existing: Option<&Self>,
        ctx: &ValidationContext<'_>,
        lookup: &mut L,
    ) -> Result<Self, Rejection> {
        let mut checker = ctx.checker(existing.is_some());
        let kinds = RecurrenceType::ALL.map(RecurrenceType::as_str);
        let task = checker.reference("task", draft.task, existing.map(|row| row.task));
        let recurrence_type = checker.choice(
            "recurrence_type",
            "recurrence type",
            &kinds,
            draft.recurrence_type.as_deref(),
            existing.map(|row| row.recurrence_type.as_str()),
            None,
        );
        require_task(&mut checker, lookup, "task", task, ctx.task_scope())?;
        checker.finish()?;

        Ok(Self {
            id: existing.map_or_else(RecordId::new, |row| row.id),
            task: present(task, "task")?,
            recurrence_type: parsed(recurrence_type, "recurrence_type")?,
            created_at: existing.map_or(ctx.now(), |row| row.created_at),
            updated_at: ctx.now(),
        })
    }
}

/// Returns `true` when `from` already reaches `target` through existing
/// dependency edges, ignoring the edge identified by `except`.
fn reaches<L: Lookup + ?Sized>(
    lookup: &mut L,
    from: TaskId,
    target: TaskId,
    except: Option<RecordId>,
) -> Result<bool, StoreError> {
    let mut frontier = vec![from];
    let mut seen = HashSet::from([from]);
    while let Some(task) = frontier.pop() {
        for next in lookup.dependencies_of(task, except)? {
            if next == target {
                return Ok(true);
            }
            if seen.insert(next) {
                frontier.push(next);
            }
        }
    }
    Ok(false)
}

impl Validate for TaskDependence {
    fn validate<L: Lookup + ?Sized>(
        draft: &TaskDependenceDraft,
        existing: Option<&Self>,
        ctx: &ValidationContext<'_>,
        lookup: &mut L,
    ) -> Result<Self, Rejection> {
        let mut checker = ctx.checker(existing.is_some());
        let except = existing.map(|row| row.id);
        let task = checker.reference("task", draft.task, existing.map(|row| row.task));
        let dependent_task = checker.reference(
            "dependent_task",
            draft.dependent_task,
            existing.map(|row| row.dependent_task),
        );
        let scope = ctx.task_scope();
        require_task(&mut checker, lookup, "task", task, scope)?;
        require_task(&mut checker, lookup, "dependent_task", dependent_task, scope)?;

        if let (Some(task), Some(dependent_task)) = (task, dependent_task) {
            if task == dependent_task {
                checker
                    .errors_mut()
                    .add_non_field("A task cannot depend on itself.");
            } else if lookup.dependence_exists(task, dependent_task, except)? {
                checker
                    .errors_mut()
                    .add_non_field("This dependency already exists.");
            } else if reaches(lookup, dependent_task, task, except)? {
                checker
                    .errors_mut()
                    .add_non_field("This dependency would create a cycle.");
            }
        }
        checker.finish()?;

        Ok(Self {
            id: existing.map_or_else(RecordId::new, |row| row.id),
            task: present(task, "task")?,
            dependent_task: present(dependent_task, "dependent_task")?,
            created_at: existing.map_or(ctx.now(), |row| row.created_at),
            updated_at: ctx.now(),
        })
    }
}

impl Validate for History {
    fn validate<L: Lookup + ?Sized>(
        draft: &HistoryDraft,
        existing: Option<&Self>,
        ctx: &ValidationContext<'_>,
        lookup: &mut L,
    ) -> Result<Self, Rejection> {
        let mut checker = ctx.checker(existing.is_some());
        let task = checker.reference("task", draft.task, existing.map(|row| row.task));
        let task_name = checker.required_text(
            TASK_NAME,
            draft.task_name.as_deref(),
            existing.map(|row| row.task_name.as_str()),
        );
        let changes = checker.required_text(
            CHANGES,
            draft.changes.as_deref(),
            existing.map(|row| row.changes.as_str()),
        );
        require_task(&mut checker, lookup, "task", task, ctx.task_scope())?;
        checker.finish()?;

        Ok(Self {
            id: existing.map_or_else(RecordId::new, |row| row.id),
            task: present(task, "task")?,
            task_name: present(task_name, "task_name")?,
            changes: present(changes, "changes")?,
            updated_at: ctx.now(),
        })
    }
}

impl Validate for TaskReport {
    fn validate<L: Lookup + ?Sized>(
        draft: &TaskReportDraft,
        existing: Option<&Self>,
        ctx: &ValidationContext<'_>,
        _lookup: &mut L,
    ) -> Result<Self, Rejection> {
        let mut checker = ctx.checker(existing.is_some());
        let kinds = ReportType::ALL.map(ReportType::as_str);
        let report_type = checker.choice(
            "report_type",
            "report type",
            &kinds,
            draft.report_type.as_deref(),
            existing.map(|row| row.report_type.as_str()),
            None,
        );
        let date = checker.date(draft.date, existing.and_then(|row| row.date));
        checker.finish()?;

        Ok(Self {
            id: existing.map_or_else(RecordId::new, |row| row.id),
            user: author_of(existing.map(|row| row.user), ctx),
            report_type: parsed(report_type, "report_type")?,
            date,
            created_at: existing.map_or(ctx.now(), |row| row.created_at),
            updated_at: ctx.now(),
        })
    }
}

impl Validate for Team {
    fn validate<L: Lookup + ?Sized>(
        draft: &TeamDraft,
        existing: Option<&Self>,
        ctx: &ValidationContext<'_>,
        lookup: &mut L,
    ) -> Result<Self, Rejection> {
        let mut checker = ctx.checker(existing.is_some());
        let name = checker.required_text(
            TEAM_NAME,
            draft.name.as_deref(),
            existing.map(|row| row.name.as_str()),
        );
        if let Some(candidate) = name.as_deref().filter(|name| !name.is_empty()) {
            if lookup.team_name_taken(candidate, existing.map(|row| row.id))? {
                checker
                    .errors_mut()
                    .add("name", "team with this name already exists.");
            }
        }
        checker.finish()?;

        Ok(Self {
            id: existing.map_or_else(TeamId::new, |row| row.id),
            name: present(name, "name")?,
            owner: author_of(existing.map(|row| row.owner), ctx),
            created_at: existing.map_or(ctx.now(), |row| row.created_at),
            updated_at: ctx.now(),
        })
    }
}

impl Validate for UserTeams {
    fn validate<L: Lookup + ?Sized>(
        draft: &UserTeamsDraft,
        existing: Option<&Self>,
        ctx: &ValidationContext<'_>,
        lookup: &mut L,
    ) -> Result<Self, Rejection> {
        let mut checker = ctx.checker(existing.is_some());
        let principal = ctx.principal();
        let user = draft
            .user
            .or_else(|| existing.map(|row| row.user))
            .unwrap_or_else(|| principal.user_id());
        let team = checker.reference("team", draft.team, existing.map(|row| row.team));

        if let Some(team) = team {
            match lookup.team_owner(team)? {
                None => checker.errors_mut().add("team", missing_object(team)),
                Some(owner) => {
                    let manages_team = principal.can_act_for(owner);
                    if user != principal.user_id() && !manages_team {
                        checker
                            .errors_mut()
                            .add("user", "You can only add other users to teams you own.");
                    }
                }
            }
            if lookup.membership_exists(user, team, existing.map(|row| row.id))? {
                checker
                    .errors_mut()
                    .add_non_field("This user is already a member of this team.");
            }
        }
        checker.finish()?;

        Ok(Self {
            id: existing.map_or_else(RecordId::new, |row| row.id),
            user,
            team: present(team, "team")?,
            created_at: existing.map_or(ctx.now(), |row| row.created_at),
        })
    }
}

impl Validate for UserProfile {
    fn validate<L: Lookup + ?Sized>(
        draft: &UserProfileDraft,
        existing: Option<&Self>,
        ctx: &ValidationContext<'_>,
        lookup: &mut L,
    ) -> Result<Self, Rejection> {
        let mut checker = ctx.checker(existing.is_some());
        let role = checker.optional_text(
            ROLE,
            draft.role.as_ref().map(Option::as_deref),
            existing.and_then(|row| row.role.as_deref()),
        );
        let user = existing.map_or_else(|| ctx.principal().user_id(), |row| row.user);
        if lookup.profile_exists(user, existing.map(|row| row.id))? {
            checker
                .errors_mut()
                .add_non_field("A profile already exists for this user.");
        }
        checker.finish()?;

        Ok(Self {
            id: existing.map_or_else(RecordId::new, |row| row.id),
            user,
            role,
            created_at: existing.map_or(ctx.now(), |row| row.created_at),
            updated_at: ctx.now(),
        })
    }
}
