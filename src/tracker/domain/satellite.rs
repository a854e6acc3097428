//! Records that hang off a task: comments, attachments, priorities,
//! schedules, recurrences, dependencies, and history, plus user reports.

use super::{Anchor, Entity, EntityKind, NoFilter, ParseChoiceError, RecordId, TaskId, nullable};
use crate::access::UserId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const EXCERPT_CHARS: usize = 40;

fn excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn render_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|value| value.to_string())
}

/// A comment left on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskComment {
    /// Row identifier.
    pub id: RecordId,
    /// Commented task.
    pub task: TaskId,
    /// Author; cleared when the author is deleted.
    pub author: Option<UserId>,
    /// Trimmed comment text.
    pub comment: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Write payload for task comments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaskCommentDraft {
    /// Commented task.
    pub task: Option<TaskId>,
    /// Comment text.
    pub comment: Option<String>,
}

impl Entity for TaskComment {
    const KIND: EntityKind = EntityKind::TaskComment;
    type Id = RecordId;
    type Draft = TaskCommentDraft;
    type Filter = NoFilter;

    fn id(&self) -> RecordId {
        self.id
    }

    fn label(&self) -> String {
        excerpt(&self.comment)
    }

    fn anchor(&self) -> Anchor {
        Anchor::Task(self.task)
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn snapshot(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("task", Some(self.task.to_string())),
            ("comment", Some(self.comment.clone())),
        ]
    }
}

/// Metadata for a file attached to a task. File storage itself lives
/// elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskAttachment {
    /// Row identifier.
    pub id: RecordId,
    /// Owning task.
    pub task: TaskId,
    /// Display file name.
    pub file_name: String,
    /// Storage path.
    pub file_path: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Write payload for task attachments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaskAttachmentDraft {
    /// Owning task.
    pub task: Option<TaskId>,
    /// Display file name.
    pub file_name: Option<String>,
    /// Storage path.
    pub file_path: Option<String>,
}

impl Entity for TaskAttachment {
    const KIND: EntityKind = EntityKind::TaskAttachment;
    type Id = RecordId;
    type Draft = TaskAttachmentDraft;
    type Filter = NoFilter;

    fn id(&self) -> RecordId {
        self.id
    }

    fn label(&self) -> String {
        self.file_name.clone()
    }

    fn anchor(&self) -> Anchor {
        Anchor::Task(self.task)
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn snapshot(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("task", Some(self.task.to_string())),
            ("file_name", Some(self.file_name.clone())),
            ("file_path", Some(self.file_path.clone())),
        ]
    }
}

/// A named priority label attached to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskPriority {
    /// Row identifier.
    pub id: RecordId,
    /// Owning task.
    pub task: TaskId,
    /// Trimmed label.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Write payload for task priority labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaskPriorityDraft {
    /// Owning task.
    pub task: Option<TaskId>,
    /// Label.
    pub name: Option<String>,
}

impl Entity for TaskPriority {
    const KIND: EntityKind = EntityKind::TaskPriority;
    type Id = RecordId;
    type Draft = TaskPriorityDraft;
    type Filter = NoFilter;

    fn id(&self) -> RecordId {
        self.id
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn anchor(&self) -> Anchor {
        Anchor::Task(self.task)
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn snapshot(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("task", Some(self.task.to_string())),
            ("name", Some(self.name.clone())),
        ]
    }
}

/// Planned and reminder dates for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSchedule {
    /// Row identifier.
    pub id: RecordId,
    /// Owning task.
    pub task: TaskId,
    /// Planned work date.
    pub schedule_date: Option<NaiveDate>,
    /// Reminder date.
    pub reminder_date: Option<NaiveDate>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Write payload for task schedules. Date fields distinguish absent from
/// explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaskScheduleDraft {
    /// Owning task.
    pub task: Option<TaskId>,
    /// Planned work date.
    #[serde(deserialize_with = "nullable::deserialize")]
    pub schedule_date: Option<Option<NaiveDate>>,
    /// Reminder date.
    #[serde(deserialize_with = "nullable::deserialize")]
    pub reminder_date: Option<Option<NaiveDate>>,
}

impl Entity for TaskSchedule {
    const KIND: EntityKind = EntityKind::TaskSchedule;
    type Id = RecordId;
    type Draft = TaskScheduleDraft;
    type Filter = NoFilter;

    fn id(&self) -> RecordId {
        self.id
    }

    fn label(&self) -> String {
        format!("schedule for task {}", self.task)
    }

    fn anchor(&self) -> Anchor {
        Anchor::Task(self.task)
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn snapshot(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("task", Some(self.task.to_string())),
            ("schedule_date", render_date(self.schedule_date)),
            ("reminder_date", render_date(self.reminder_date)),
        ]
    }
}

/// How often a recurring task repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceType {
    /// Every day.
    Daily,
    /// Every week.
    Weekly,
    /// Every month.
    Monthly,
    /// Every year.
    Yearly,
}

impl RecurrenceType {
    /// Every recurrence type in canonical order.
    pub const ALL: [Self; 4] = [Self::Daily, Self::Weekly, Self::Monthly, Self::Yearly];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl TryFrom<&str> for RecurrenceType {
    type Error = ParseChoiceError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| ParseChoiceError::new("recurrence_type", value))
    }
}

/// Recurrence rule for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRecurrence {
    /// Row identifier.
    pub id: RecordId,
    /// Owning task.
    pub task: TaskId,
    /// Repeat interval.
    pub recurrence_type: RecurrenceType,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Write payload for task recurrences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaskRecurrenceDraft {
    /// Owning task.
    pub task: Option<TaskId>,
    /// Raw repeat interval.
    pub recurrence_type: Option<String>,
}

impl Entity for TaskRecurrence {
    const KIND: EntityKind = EntityKind::TaskRecurrence;
    type Id = RecordId;
    type Draft = TaskRecurrenceDraft;
    type Filter = NoFilter;

    fn id(&self) -> RecordId {
        self.id
    }

    fn label(&self) -> String {
        self.recurrence_type.as_str().to_owned()
    }

    fn anchor(&self) -> Anchor {
        Anchor::Task(self.task)
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn snapshot(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("task", Some(self.task.to_string())),
            (
                "recurrence_type",
                Some(self.recurrence_type.as_str().to_owned()),
            ),
        ]
    }
}

/// Ordered dependency edge: `task` depends on `dependent_task`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDependence {
    /// Row identifier.
    pub id: RecordId,
    /// Task that has the dependency.
    pub task: TaskId,
    /// Task depended upon.
    pub dependent_task: TaskId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Write payload for task dependencies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaskDependenceDraft {
    /// Task that has the dependency.
    pub task: Option<TaskId>,
    /// Task depended upon.
    pub dependent_task: Option<TaskId>,
}

impl Entity for TaskDependence {
    const KIND: EntityKind = EntityKind::TaskDependence;
    type Id = RecordId;
    type Draft = TaskDependenceDraft;
    type Filter = NoFilter;

    fn id(&self) -> RecordId {
        self.id
    }

    fn label(&self) -> String {
        format!("{} -> {}", self.task, self.dependent_task)
    }

    fn anchor(&self) -> Anchor {
        Anchor::Task(self.task)
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn snapshot(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("task", Some(self.task.to_string())),
            ("dependent_task", Some(self.dependent_task.to_string())),
        ]
    }
}

/// A recorded change to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct History {
    /// Row identifier.
    pub id: RecordId,
    /// Changed task.
    pub task: TaskId,
    /// Task title at the time of the change.
    pub task_name: String,
    /// Rendered change description.
    pub changes: String,
    /// When the change was recorded.
    pub updated_at: DateTime<Utc>,
}

impl History {
    /// Creates a history row for `task`.
    #[must_use]
    pub fn record(
        task: TaskId,
        task_name: String,
        changes: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            task,
            task_name,
            changes,
            updated_at: now,
        }
    }
}

/// Write payload for history rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HistoryDraft {
    /// Changed task.
    pub task: Option<TaskId>,
    /// Task title.
    pub task_name: Option<String>,
    /// Change description.
    pub changes: Option<String>,
}

impl Entity for History {
    const KIND: EntityKind = EntityKind::History;
    type Id = RecordId;
    type Draft = HistoryDraft;
    type Filter = NoFilter;

    fn id(&self) -> RecordId {
        self.id
    }

    fn label(&self) -> String {
        self.task_name.clone()
    }

    fn anchor(&self) -> Anchor {
        Anchor::Task(self.task)
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn snapshot(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("task", Some(self.task.to_string())),
            ("task_name", Some(self.task_name.clone())),
            ("changes", Some(self.changes.clone())),
        ]
    }
}

/// Reporting period of a task report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    /// Daily report.
    Daily,
    /// Weekly report.
    Weekly,
    /// Monthly report.
    Monthly,
    /// Custom period.
    Custom,
}

impl ReportType {
    /// Every report type in canonical order.
    pub const ALL: [Self; 4] = [Self::Daily, Self::Weekly, Self::Monthly, Self::Custom];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Custom => "custom",
        }
    }
}

impl TryFrom<&str> for ReportType {
    type Error = ParseChoiceError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| ParseChoiceError::new("report_type", value))
    }
}

/// A user's task report request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    /// Row identifier.
    pub id: RecordId,
    /// Requesting user; cleared when the user is deleted.
    pub user: Option<UserId>,
    /// Reporting period.
    pub report_type: ReportType,
    /// Report reference date.
    pub date: Option<NaiveDate>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Write payload for task reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaskReportDraft {
    /// Raw reporting period.
    pub report_type: Option<String>,
    /// Reference date.
    #[serde(deserialize_with = "nullable::deserialize")]
    pub date: Option<Option<NaiveDate>>,
}

impl Entity for TaskReport {
    const KIND: EntityKind = EntityKind::TaskReport;
    type Id = RecordId;
    type Draft = TaskReportDraft;
    type Filter = NoFilter;

    fn id(&self) -> RecordId {
        self.id
    }

    fn label(&self) -> String {
        format!("{} report", self.report_type.as_str())
    }

    fn anchor(&self) -> Anchor {
        Anchor::User(self.user)
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn snapshot(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("report_type", Some(self.report_type.as_str().to_owned())),
            ("date", render_date(self.date)),
        ]
    }
}
