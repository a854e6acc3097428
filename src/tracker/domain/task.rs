//! Task aggregate root and related types.

use super::{
    Anchor, ChangeSet, Entity, EntityKind, History, ParseChoiceError, TaskId, nullable,
};
use crate::access::UserId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Task progress status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Work has not started.
    #[default]
    Pending,
    /// Work is under way.
    InProgress,
    /// Work is finished.
    Completed,
    /// Work was abandoned.
    Cancelled,
}

impl TaskStatus {
    /// Every status in canonical order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns the status a completion toggle moves to.
    ///
    /// Completed tasks reopen as pending; anything else becomes completed.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Completed => Self::Pending,
            Self::Pending | Self::InProgress | Self::Cancelled => Self::Completed,
        }
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseChoiceError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| ParseChoiceError::new("status", value))
    }
}

/// Task priority level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityLevel {
    /// Low priority.
    Low,
    /// Medium priority.
    #[default]
    Medium,
    /// High priority.
    High,
    /// Critical priority; such tasks may not be completed.
    Critical,
}

impl PriorityLevel {
    /// Every priority in canonical order.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl TryFrom<&str> for PriorityLevel {
    type Error = ParseChoiceError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == value)
            .ok_or_else(|| ParseChoiceError::new("priority", value))
    }
}

/// Client-editable task fields after validation and normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskContent {
    /// Trimmed title.
    pub title: String,
    /// Trimmed description; `None` when blank.
    pub description: Option<String>,
    /// Progress status.
    pub status: TaskStatus,
    /// Priority level.
    pub priority: PriorityLevel,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    id: TaskId,
    owner: Option<UserId>,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    priority: PriorityLevel,
    due_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTask {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted owner, if the owning user still exists.
    pub owner: Option<UserId>,
    /// Persisted fields.
    pub content: TaskContent,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new task owned by `owner`.
    #[must_use]
    pub fn new(owner: UserId, content: TaskContent, now: DateTime<Utc>) -> Self {
        Self {
            id: TaskId::new(),
            owner: Some(owner),
            title: content.title,
            description: content.description,
            status: content.status,
            priority: content.priority,
            due_date: content.due_date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTask) -> Self {
        Self {
            id: data.id,
            owner: data.owner,
            title: data.content.title,
            description: data.content.description,
            status: data.content.status,
            priority: data.content.priority,
            due_date: data.content.due_date,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning user, if they still exist.
    #[must_use]
    pub const fn owner(&self) -> Option<UserId> {
        self.owner
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the progress status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the priority level.
    #[must_use]
    pub const fn priority(&self) -> PriorityLevel {
        self.priority
    }

    /// Returns the due date, if any.
    #[must_use]
    pub const fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last-update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the editable fields as a content value.
    #[must_use]
    pub fn content(&self) -> TaskContent {
        TaskContent {
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
        }
    }

    /// Replaces the editable fields.
    pub fn revise(&mut self, content: TaskContent, now: DateTime<Utc>) {
        self.title = content.title;
        self.description = content.description;
        self.status = content.status;
        self.priority = content.priority;
        self.due_date = content.due_date;
        self.updated_at = now;
    }

    /// Sets the progress status.
    pub fn set_status(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }

    /// Drops the owner reference after the owning user is deleted.
    pub fn clear_owner(&mut self) {
        self.owner = None;
    }
}

impl Entity for Task {
    const KIND: EntityKind = EntityKind::Task;
    type Id = TaskId;
    type Draft = TaskDraft;
    type Filter = TaskFilter;

    fn id(&self) -> TaskId {
        self.id
    }

    fn label(&self) -> String {
        self.title.clone()
    }

    fn anchor(&self) -> Anchor {
        Anchor::User(self.owner)
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn snapshot(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("title", Some(self.title.clone())),
            ("description", self.description.clone()),
            ("status", Some(self.status.as_str().to_owned())),
            ("priority", Some(self.priority.as_str().to_owned())),
            ("due_date", self.due_date.map(|date| date.to_string())),
        ]
    }

    fn matches(&self, filter: &TaskFilter) -> bool {
        filter.admits(self)
    }

    fn history_entry(&self, changes: &ChangeSet, now: DateTime<Utc>) -> Option<History> {
        if changes.is_empty() {
            return None;
        }
        Some(History::record(
            self.id,
            self.title.clone(),
            changes.to_string(),
            now,
        ))
    }
}

/// Write payload for tasks.
///
/// Status and priority stay raw so that unknown values surface as field
/// errors rather than deserialization failures. `description` and
/// `due_date` distinguish an absent field (`None`) from an explicit `null`
/// (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaskDraft {
    /// Title.
    pub title: Option<String>,
    /// Description.
    #[serde(deserialize_with = "nullable::deserialize")]
    pub description: Option<Option<String>>,
    /// Raw status value.
    pub status: Option<String>,
    /// Raw priority value.
    pub priority: Option<String>,
    /// Due date.
    #[serde(deserialize_with = "nullable::deserialize")]
    pub due_date: Option<Option<NaiveDate>>,
}

impl TaskDraft {
    /// Creates a draft carrying only a title.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(Some(description.into()));
        self
    }

    /// Sets the raw status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets the raw priority.
    #[must_use]
    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    /// Sets the due date; `None` clears it.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// Task list filter.
///
/// `search` matches titles case-insensitively; the due-date bounds are
/// inclusive and exclude tasks without a due date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaskFilter {
    /// Case-insensitive title substring.
    pub search: Option<String>,
    /// Exact status.
    pub status: Option<TaskStatus>,
    /// Exact priority.
    pub priority: Option<PriorityLevel>,
    /// Earliest due date, inclusive.
    pub due_after: Option<NaiveDate>,
    /// Latest due date, inclusive.
    pub due_before: Option<NaiveDate>,
}

impl TaskFilter {
    /// Returns the trimmed search term, ignoring blank input.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    /// Returns `true` when `task` passes every configured criterion.
    #[must_use]
    pub fn admits(&self, task: &Task) -> bool {
        let search_ok = self.search_term().is_none_or(|term| {
            task.title()
                .to_lowercase()
                .contains(&term.to_lowercase())
        });
        let status_ok = self.status.is_none_or(|status| task.status() == status);
        let priority_ok = self
            .priority
            .is_none_or(|priority| task.priority() == priority);
        let after_ok = self
            .due_after
            .is_none_or(|bound| task.due_date().is_some_and(|due| due >= bound));
        let before_ok = self
            .due_before
            .is_none_or(|bound| task.due_date().is_some_and(|due| due <= bound));
        search_ok && status_ok && priority_ok && after_ok && before_ok
    }
}
