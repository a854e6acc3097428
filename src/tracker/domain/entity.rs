//! The entity abstraction shared by every tracked record type.

use super::{ChangeSet, EntityId, History, TaskId, TeamId};
use crate::access::{OwnershipRule, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every record type held by the entity store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// [`super::Task`].
    Task,
    /// [`super::TaskComment`].
    TaskComment,
    /// [`super::TaskAttachment`].
    TaskAttachment,
    /// [`super::TaskPriority`].
    TaskPriority,
    /// [`super::TaskSchedule`].
    TaskSchedule,
    /// [`super::TaskRecurrence`].
    TaskRecurrence,
    /// [`super::TaskDependence`].
    TaskDependence,
    /// [`super::History`].
    History,
    /// [`super::TaskReport`].
    TaskReport,
    /// [`super::Team`].
    Team,
    /// [`super::UserTeams`].
    UserTeams,
    /// [`super::UserProfile`].
    UserProfile,
}

impl EntityKind {
    /// All entity kinds in declaration order.
    pub const ALL: [Self; 12] = [
        Self::Task,
        Self::TaskComment,
        Self::TaskAttachment,
        Self::TaskPriority,
        Self::TaskSchedule,
        Self::TaskRecurrence,
        Self::TaskDependence,
        Self::History,
        Self::TaskReport,
        Self::Team,
        Self::UserTeams,
        Self::UserProfile,
    ];

    /// Returns the canonical machine name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::TaskComment => "task_comment",
            Self::TaskAttachment => "task_attachment",
            Self::TaskPriority => "task_priority",
            Self::TaskSchedule => "task_schedule",
            Self::TaskRecurrence => "task_recurrence",
            Self::TaskDependence => "task_dependence",
            Self::History => "history",
            Self::TaskReport => "task_report",
            Self::Team => "team",
            Self::UserTeams => "user_teams",
            Self::UserProfile => "user_profile",
        }
    }

    /// Returns the human-readable name used in audit records.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Task => "Task",
            Self::TaskComment => "Task Comment",
            Self::TaskAttachment => "Task Attachment",
            Self::TaskPriority => "Task Priority",
            Self::TaskSchedule => "Task Schedule",
            Self::TaskRecurrence => "Task Recurrence",
            Self::TaskDependence => "Task Dependence",
            Self::History => "History",
            Self::TaskReport => "Task Report",
            Self::Team => "Team",
            Self::UserTeams => "User Teams",
            Self::UserProfile => "User Profile",
        }
    }

    /// Returns the URL collection segment for this kind.
    #[must_use]
    pub const fn collection_path(self) -> &'static str {
        match self {
            Self::Task => "tasks",
            Self::TaskComment => "taskcomments",
            Self::TaskAttachment => "taskattachments",
            Self::TaskPriority => "taskpriorities",
            Self::TaskSchedule => "taskschedules",
            Self::TaskRecurrence => "taskrecurrences",
            Self::TaskDependence => "taskdependences",
            Self::History => "histories",
            Self::TaskReport => "taskreports",
            Self::Team => "teams",
            Self::UserTeams => "userteams",
            Self::UserProfile => "userprofiles",
        }
    }

    /// Looks up a kind by its URL collection segment.
    #[must_use]
    pub fn from_collection_path(segment: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.collection_path() == segment)
    }

    /// Returns how rows of this kind tie back to an owning user.
    #[must_use]
    pub const fn ownership(self) -> OwnershipRule {
        match self {
            Self::Task | Self::TaskReport | Self::UserProfile | Self::Team => {
                OwnershipRule::DirectOwner
            }
            Self::TaskComment
            | Self::TaskAttachment
            | Self::TaskPriority
            | Self::TaskSchedule
            | Self::TaskRecurrence
            | Self::TaskDependence
            | Self::History => OwnershipRule::ThroughTask,
            Self::UserTeams => OwnershipRule::TeamMembership,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The reference a scope predicate is evaluated against for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// The row's own owning-user reference.
    User(Option<UserId>),
    /// The task the row hangs off.
    Task(TaskId),
    /// The member and team of a membership row.
    Membership {
        /// Member user.
        user: UserId,
        /// Team joined.
        team: TeamId,
    },
}

/// Placeholder filter for entity types without list filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoFilter;

/// A typed record held by the entity store.
///
/// Implementations declare their identifier, write payload and list filter
/// types together with the statically known field list used to compute
/// before/after diffs.
pub trait Entity: Clone + fmt::Debug + Send + Sync + 'static {
    /// Kind tag for this record type.
    const KIND: EntityKind;

    /// Primary-key type.
    type Id: EntityId;

    /// Client-supplied write payload.
    type Draft: Clone + fmt::Debug + Default + Send + Sync + 'static;

    /// List filter accepted by the store.
    type Filter: Clone + fmt::Debug + Default + Send + Sync + 'static;

    /// Returns the primary key.
    fn id(&self) -> Self::Id;

    /// Returns a short human-readable label for audit records.
    fn label(&self) -> String;

    /// Returns the reference scoping is evaluated against.
    fn anchor(&self) -> Anchor;

    /// Returns the timestamp list ordering is based on.
    fn recorded_at(&self) -> DateTime<Utc>;

    /// Returns the declared fields and their rendered values.
    fn snapshot(&self) -> Vec<(&'static str, Option<String>)>;

    /// Returns `true` when the row passes `filter`.
    fn matches(&self, _filter: &Self::Filter) -> bool {
        true
    }

    /// Returns the history row to record alongside an update, if this type
    /// keeps one.
    fn history_entry(&self, _changes: &ChangeSet, _now: DateTime<Utc>) -> Option<History> {
        None
    }
}
