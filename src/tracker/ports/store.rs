//! Entity store port: typed tables behind a scoped transaction primitive.

use crate::access::{ScopePredicate, UserId};
use crate::tracker::domain::{
    Entity, EntityKind, History, RecordId, Task, TaskAttachment, TaskComment, TaskDependence,
    TaskId, TaskPriority, TaskRecurrence, TaskReport, TaskSchedule, Team, TeamId, UserProfile,
    UserTeams,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Result type for entity store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by entity store implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The addressed row does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Kind of the missing row.
        kind: EntityKind,
        /// Primary key of the missing row.
        id: Uuid,
    },

    /// A uniqueness constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A referential constraint rejected the write.
    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),

    /// The unit of work stopped before completing, for example because the
    /// thread running it panicked.
    #[error("unit of work interrupted: {0}")]
    Interrupted(String),
}

impl StoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Wraps the reason a unit of work was abandoned.
    pub fn interrupted(reason: impl std::fmt::Display) -> Self {
        Self::Interrupted(reason.to_string())
    }

    /// Builds a not-found error for a row of `kind`.
    #[must_use]
    pub const fn not_found(kind: EntityKind, id: Uuid) -> Self {
        Self::NotFound { kind, id }
    }
}

/// Offset pagination plus an entity-specific filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery<F> {
    /// Entity-specific filter.
    pub filter: F,
    /// Rows to skip.
    pub offset: usize,
    /// Maximum rows to return; `None` returns the remainder.
    pub limit: Option<usize>,
}

impl<F: Default> ListQuery<F> {
    /// Returns a query with the default filter and no pagination.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }
}

impl<F> ListQuery<F> {
    /// Returns a query for `filter` with no pagination.
    #[must_use]
    pub const fn filtered(filter: F) -> Self {
        Self {
            filter,
            offset: 0,
            limit: None,
        }
    }

    /// Sets the page window.
    #[must_use]
    pub const fn with_page(mut self, offset: usize, limit: Option<usize>) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }
}

/// One page of a list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Rows matching scope and filter before pagination.
    pub total: u64,
    /// Rows inside the requested window, in list order.
    pub items: Vec<T>,
}

/// Read-only checks the validation engine runs inside a write transaction.
pub trait Lookup {
    /// Returns `true` when `task` exists and `scope` admits it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn task_exists(&mut self, task: TaskId, scope: ScopePredicate) -> StoreResult<bool>;

    /// Returns the owner of `team`, or `None` when the team does not exist.
    ///
    /// The outer option reports existence; the inner one the owner
    /// reference.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn team_owner(&mut self, team: TeamId) -> StoreResult<Option<Option<UserId>>>;

    /// Returns `true` when another team already uses `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn team_name_taken(&mut self, name: &str, except: Option<TeamId>) -> StoreResult<bool>;

    /// Returns `true` when another row already records this membership.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn membership_exists(
        &mut self,
        user: UserId,
        team: TeamId,
        except: Option<RecordId>,
    ) -> StoreResult<bool>;

    /// Returns `true` when another row already records this dependency.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn dependence_exists(
        &mut self,
        task: TaskId,
        dependent_task: TaskId,
        except: Option<RecordId>,
    ) -> StoreResult<bool>;

    /// Returns the tasks `task` directly depends on, skipping the edge
    /// identified by `except`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn dependencies_of(
        &mut self,
        task: TaskId,
        except: Option<RecordId>,
    ) -> StoreResult<Vec<TaskId>>;

    /// Returns `true` when another profile already exists for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn profile_exists(&mut self, user: UserId, except: Option<RecordId>) -> StoreResult<bool>;
}

/// Typed table access for one entity type inside a transaction.
///
/// `find` and `list` evaluate the scope predicate themselves; a row outside
/// the scope is indistinguishable from an absent one.
pub trait Table<E: Entity> {
    /// Inserts a new row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] or
    /// [`StoreError::ForeignKeyViolation`] when a constraint rejects the row.
    fn insert(&mut self, entity: &E) -> StoreResult<()>;

    /// Overwrites an existing row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the row does not exist.
    fn update(&mut self, entity: &E) -> StoreResult<()>;

    /// Deletes a row and everything that cascades from it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the row does not exist.
    fn delete(&mut self, id: E::Id) -> StoreResult<()>;

    /// Finds a row by primary key within `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find(&mut self, id: E::Id, scope: ScopePredicate) -> StoreResult<Option<E>>;

    /// Lists rows within `scope` in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn list(&mut self, scope: ScopePredicate, query: &ListQuery<E::Filter>)
    -> StoreResult<Page<E>>;
}

/// The handle a unit of work receives inside a store transaction.
pub trait StoreTx:
    Lookup
    + Table<Task>
    + Table<TaskComment>
    + Table<TaskAttachment>
    + Table<TaskPriority>
    + Table<TaskSchedule>
    + Table<TaskRecurrence>
    + Table<TaskDependence>
    + Table<History>
    + Table<TaskReport>
    + Table<Team>
    + Table<UserTeams>
    + Table<UserProfile>
    + Send
{
    /// Applies the effects of deleting `user`: nullable owner and author
    /// references are cleared; memberships and the profile are removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    fn forget_user(&mut self, user: UserId) -> StoreResult<()>;
}

/// Transactional entity store.
#[async_trait]
pub trait EntityStore: Send + Sync + 'static {
    /// Transaction handle type.
    type Tx: StoreTx;

    /// Runs `work` atomically at read-committed isolation or stronger.
    ///
    /// The transaction commits when `work` returns `Ok` and rolls back on
    /// `Err`.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `work`, or a [`StoreError`] converted
    /// into `X` when the transaction cannot be opened or committed.
    async fn transaction<T, X, F>(&self, work: F) -> Result<T, X>
    where
        F: FnOnce(&mut Self::Tx) -> Result<T, X> + Send + 'static,
        T: Send + 'static,
        X: From<StoreError> + Send + 'static;
}
