//! Domain model for tracked entities.
//!
//! Every record type implements [`Entity`], which declares its identifier,
//! write payload, list filter and the statically known field list the
//! pipeline diffs on update. No infrastructure concerns cross this
//! boundary.

mod changes;
mod entity;
mod error;
mod ids;
mod nullable;
mod satellite;
mod task;
mod team;

pub use changes::{ChangeSet, FieldChange};
pub use entity::{Anchor, Entity, EntityKind, NoFilter};
pub use error::ParseChoiceError;
pub use ids::{EntityId, RecordId, TaskId, TeamId};
pub use satellite::{
    History, HistoryDraft, RecurrenceType, ReportType, TaskAttachment, TaskAttachmentDraft,
    TaskComment, TaskCommentDraft, TaskDependence, TaskDependenceDraft, TaskPriority,
    TaskPriorityDraft, TaskRecurrence, TaskRecurrenceDraft, TaskReport, TaskReportDraft,
    TaskSchedule, TaskScheduleDraft,
};
pub use task::{
    PersistedTask, PriorityLevel, Task, TaskContent, TaskDraft, TaskFilter, TaskStatus,
};
pub use team::{Team, TeamDraft, UserProfile, UserProfileDraft, UserTeams, UserTeamsDraft};
