//! Diesel row models for task tracking persistence.
//!
//! Each table has a single row type used for reads, inserts and updates.
//! Updates write every column, so `None` is stored as `NULL`.

use super::schema::{
    task_attachments, task_comments, task_dependences, task_histories, task_priorities,
    task_recurrences, task_reports, task_schedules, tasks, teams, user_profiles, user_teams,
};
use crate::access::UserId;
use crate::tracker::domain::{
    History, PersistedTask, PriorityLevel, RecordId, RecurrenceType, ReportType, Task,
    TaskAttachment, TaskComment, TaskContent, TaskDependence, TaskId, TaskPriority,
    TaskRecurrence, TaskReport, TaskSchedule, TaskStatus, Team, TeamId, UserProfile, UserTeams,
};
use crate::tracker::ports::StoreError;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// Row model for `tasks`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct TaskRow {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id().into_inner(),
            owner_id: task.owner().map(UserId::into_inner),
            title: task.title().to_owned(),
            description: task.description().map(str::to_owned),
            status: task.status().as_str().to_owned(),
            priority: task.priority().as_str().to_owned(),
            due_date: task.due_date(),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        }
    }
}

impl TryFrom<TaskRow> for Task {
    type Error = StoreError;

    fn try_from(row: TaskRow) -> Result<Self, StoreError> {
        let status = TaskStatus::try_from(row.status.as_str()).map_err(StoreError::persistence)?;
        let priority =
            PriorityLevel::try_from(row.priority.as_str()).map_err(StoreError::persistence)?;
        Ok(Self::from_persisted(PersistedTask {
            id: TaskId::from_uuid(row.id),
            owner: row.owner_id.map(UserId::from_uuid),
            content: TaskContent {
                title: row.title,
                description: row.description,
                status,
                priority,
                due_date: row.due_date,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }
}

/// Row model for `task_comments`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = task_comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct TaskCommentRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub author_id: Option<Uuid>,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&TaskComment> for TaskCommentRow {
    fn from(comment: &TaskComment) -> Self {
        Self {
            id: comment.id.into_inner(),
            task_id: comment.task.into_inner(),
            author_id: comment.author.map(UserId::into_inner),
            comment: comment.comment.clone(),
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

impl TryFrom<TaskCommentRow> for TaskComment {
    type Error = StoreError;

    fn try_from(row: TaskCommentRow) -> Result<Self, StoreError> {
        Ok(Self {
            id: RecordId::from_uuid(row.id),
            task: TaskId::from_uuid(row.task_id),
            author: row.author_id.map(UserId::from_uuid),
            comment: row.comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Row model for `task_attachments`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = task_attachments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskAttachmentRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&TaskAttachment> for TaskAttachmentRow {
    fn from(attachment: &TaskAttachment) -> Self {
        Self {
            id: attachment.id.into_inner(),
            task_id: attachment.task.into_inner(),
            file_name: attachment.file_name.clone(),
            file_path: attachment.file_path.clone(),
            created_at: attachment.created_at,
            updated_at: attachment.updated_at,
        }
    }
}

impl TryFrom<TaskAttachmentRow> for TaskAttachment {
    type Error = StoreError;

    fn try_from(row: TaskAttachmentRow) -> Result<Self, StoreError> {
        Ok(Self {
            id: RecordId::from_uuid(row.id),
            task: TaskId::from_uuid(row.task_id),
            file_name: row.file_name,
            file_path: row.file_path,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Row model for `task_priorities`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = task_priorities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskPriorityRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&TaskPriority> for TaskPriorityRow {
    fn from(priority: &TaskPriority) -> Self {
        Self {
            id: priority.id.into_inner(),
            task_id: priority.task.into_inner(),
            name: priority.name.clone(),
            created_at: priority.created_at,
            updated_at: priority.updated_at,
        }
    }
}

impl TryFrom<TaskPriorityRow> for TaskPriority {
    type Error = StoreError;

    fn try_from(row: TaskPriorityRow) -> Result<Self, StoreError> {
        Ok(Self {
            id: RecordId::from_uuid(row.id),
            task: TaskId::from_uuid(row.task_id),
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Row model for `task_schedules`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = task_schedules)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct TaskScheduleRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub schedule_date: Option<NaiveDate>,
    pub reminder_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&TaskSchedule> for TaskScheduleRow {
    fn from(schedule: &TaskSchedule) -> Self {
        Self {
            id: schedule.id.into_inner(),
            task_id: schedule.task.into_inner(),
            schedule_date: schedule.schedule_date,
            reminder_date: schedule.reminder_date,
            created_at: schedule.created_at,
            updated_at: schedule.updated_at,
        }
    }
}

impl TryFrom<TaskScheduleRow> for TaskSchedule {
    type Error = StoreError;

    fn try_from(row: TaskScheduleRow) -> Result<Self, StoreError> {
        Ok(Self {
            id: RecordId::from_uuid(row.id),
            task: TaskId::from_uuid(row.task_id),
            schedule_date: row.schedule_date,
            reminder_date: row.reminder_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Row model for `task_recurrences`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = task_recurrences)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRecurrenceRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub recurrence_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&TaskRecurrence> for TaskRecurrenceRow {
    fn from(recurrence: &TaskRecurrence) -> Self {
        Self {
            id: recurrence.id.into_inner(),
            task_id: recurrence.task.into_inner(),
            recurrence_type: recurrence.recurrence_type.as_str().to_owned(),
            created_at: recurrence.created_at,
            updated_at: recurrence.updated_at,
        }
    }
}

impl TryFrom<TaskRecurrenceRow> for TaskRecurrence {
    type Error = StoreError;

    fn try_from(row: TaskRecurrenceRow) -> Result<Self, StoreError> {
        Ok(Self {
            id: RecordId::from_uuid(row.id),
            task: TaskId::from_uuid(row.task_id),
            recurrence_type: RecurrenceType::try_from(row.recurrence_type.as_str())
                .map_err(StoreError::persistence)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Row model for `task_dependences`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = task_dependences)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskDependenceRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub dependent_task_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&TaskDependence> for TaskDependenceRow {
    fn from(dependence: &TaskDependence) -> Self {
        Self {
            id: dependence.id.into_inner(),
            task_id: dependence.task.into_inner(),
            dependent_task_id: dependence.dependent_task.into_inner(),
            created_at: dependence.created_at,
            updated_at: dependence.updated_at,
        }
    }
}

impl TryFrom<TaskDependenceRow> for TaskDependence {
    type Error = StoreError;

    fn try_from(row: TaskDependenceRow) -> Result<Self, StoreError> {
        Ok(Self {
            id: RecordId::from_uuid(row.id),
            task: TaskId::from_uuid(row.task_id),
            dependent_task: TaskId::from_uuid(row.dependent_task_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Row model for `task_histories`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = task_histories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct HistoryRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub task_name: String,
    pub changes: String,
    pub updated_at: DateTime<Utc>,
}

impl From<&History> for HistoryRow {
    fn from(history: &History) -> Self {
        Self {
            id: history.id.into_inner(),
            task_id: history.task.into_inner(),
            task_name: history.task_name.clone(),
            changes: history.changes.clone(),
            updated_at: history.updated_at,
        }
    }
}

impl TryFrom<HistoryRow> for History {
    type Error = StoreError;

    fn try_from(row: HistoryRow) -> Result<Self, StoreError> {
        Ok(Self {
            id: RecordId::from_uuid(row.id),
            task: TaskId::from_uuid(row.task_id),
            task_name: row.task_name,
            changes: row.changes,
            updated_at: row.updated_at,
        })
    }
}

/// Row model for `task_reports`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = task_reports)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct TaskReportRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub report_type: String,
    pub report_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&TaskReport> for TaskReportRow {
    fn from(report: &TaskReport) -> Self {
        Self {
            id: report.id.into_inner(),
            user_id: report.user.map(UserId::into_inner),
            report_type: report.report_type.as_str().to_owned(),
            report_date: report.date,
            created_at: report.created_at,
            updated_at: report.updated_at,
        }
    }
}

impl TryFrom<TaskReportRow> for TaskReport {
    type Error = StoreError;

    fn try_from(row: TaskReportRow) -> Result<Self, StoreError> {
        Ok(Self {
            id: RecordId::from_uuid(row.id),
            user: row.user_id.map(UserId::from_uuid),
            report_type: ReportType::try_from(row.report_type.as_str())
                .map_err(StoreError::persistence)?,
            date: row.report_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Row model for `teams`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = teams)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct TeamRow {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Team> for TeamRow {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id.into_inner(),
            name: team.name.clone(),
            owner_id: team.owner.map(UserId::into_inner),
            created_at: team.created_at,
            updated_at: team.updated_at,
        }
    }
}

impl TryFrom<TeamRow> for Team {
    type Error = StoreError;

    fn try_from(row: TeamRow) -> Result<Self, StoreError> {
        Ok(Self {
            id: TeamId::from_uuid(row.id),
            name: row.name,
            owner: row.owner_id.map(UserId::from_uuid),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Row model for `user_teams`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = user_teams)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserTeamsRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub team_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<&UserTeams> for UserTeamsRow {
    fn from(membership: &UserTeams) -> Self {
        Self {
            id: membership.id.into_inner(),
            user_id: membership.user.into_inner(),
            team_id: membership.team.into_inner(),
            created_at: membership.created_at,
        }
    }
}

impl TryFrom<UserTeamsRow> for UserTeams {
    type Error = StoreError;

    fn try_from(row: UserTeamsRow) -> Result<Self, StoreError> {
        Ok(Self {
            id: RecordId::from_uuid(row.id),
            user: UserId::from_uuid(row.user_id),
            team: TeamId::from_uuid(row.team_id),
            created_at: row.created_at,
        })
    }
}

/// Row model for `user_profiles`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = user_profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct UserProfileRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&UserProfile> for UserProfileRow {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id.into_inner(),
            user_id: profile.user.into_inner(),
            role: profile.role.clone(),
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

impl TryFrom<UserProfileRow> for UserProfile {
    type Error = StoreError;

    fn try_from(row: UserProfileRow) -> Result<Self, StoreError> {
        Ok(Self {
            id: RecordId::from_uuid(row.id),
            user: UserId::from_uuid(row.user_id),
            role: row.role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
