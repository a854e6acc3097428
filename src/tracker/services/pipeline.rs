//! Operation pipeline: scope, validate, persist, audit.
//!
//! Each inbound operation runs its reads, validation lookups and writes in
//! a single store transaction. The audit event is emitted once the outcome
//! is known, through the advisory sink, so an audit failure can never undo
//! or fail a committed mutation.

use crate::access::{RequestContext, ScopePredicate, UserId, resolve_scope};
use crate::audit::{
    domain::AuditEvent,
    ports::AuditLogRepository,
    services::AuditLogSink,
};
use crate::tracker::{
    domain::{ChangeSet, Entity, EntityKind, History, Task, TaskId, TaskStatus},
    ports::{EntityStore, ListQuery, Page, StoreError, StoreTx, Table},
    validation::{FieldErrors, Rejection, Validate, ValidationContext, WriteMode, toggle_completion},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

/// Outcome of a failed operation.
#[derive(Debug, Clone, Error)]
pub enum OperationError {
    /// The payload broke one or more validation rules.
    #[error("validation failed: {0}")]
    Rejected(FieldErrors),

    /// The row does not exist or lies outside the caller's scope.
    #[error("not found")]
    NotFound,

    /// The caller may see the row but not act on it.
    #[error("you do not have permission to perform this action")]
    Forbidden,

    /// The entity store failed.
    #[error("store failure: {0}")]
    Failed(StoreError),
}

impl From<StoreError> for OperationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound,
            StoreError::UniqueViolation(constraint) => conflict_errors(&constraint).map_or_else(
                || Self::Failed(StoreError::UniqueViolation(constraint)),
                Self::Rejected,
            ),
            other => Self::Failed(other),
        }
    }
}

/// Field errors for a unique constraint that backs an in-transaction
/// check. A concurrent writer can pass the check and still lose at commit.
fn conflict_errors(constraint: &str) -> Option<FieldErrors> {
    let errors = match constraint {
        "uq_task_dependences_pair" => {
            FieldErrors::single(FieldErrors::NON_FIELD, "This dependency already exists.")
        }
        "uq_teams_name" => FieldErrors::single("name", "team with this name already exists."),
        "uq_user_teams_membership" => FieldErrors::single(
            FieldErrors::NON_FIELD,
            "This user is already a member of this team.",
        ),
        "uq_user_profiles_user" => FieldErrors::single(
            FieldErrors::NON_FIELD,
            "A profile already exists for this user.",
        ),
        _ => return None,
    };
    Some(errors)
}

impl From<Rejection> for OperationError {
    fn from(err: Rejection) -> Self {
        match err {
            Rejection::Invalid(errors) => Self::Rejected(errors),
            Rejection::Store(store) => Self::from(store),
        }
    }
}

/// Result type for pipeline operations.
pub type OperationResult<T> = Result<T, OperationError>;

/// Tunables for the operation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Append a History row for every Task update or toggle that changes a
    /// declared field.
    pub record_task_history: bool,
    /// Page size used when a list request names no limit.
    pub default_page_size: usize,
    /// Largest page a list request may ask for.
    pub max_page_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            record_task_history: true,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl PipelineConfig {
    /// Returns the effective page size for a requested `limit`.
    #[must_use]
    pub fn page_limit(&self, limit: Option<usize>) -> usize {
        limit
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}

/// Runs list, retrieve, create, update, delete and toggle operations for
/// a principal against an [`EntityStore`].
pub struct OperationPipeline<S, R, C>
where
    S: EntityStore,
    R: AuditLogRepository,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    audit: AuditLogSink<R, C>,
    config: PipelineConfig,
}

impl<S, R, C> Clone for OperationPipeline<S, R, C>
where
    S: EntityStore,
    R: AuditLogRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            audit: self.audit.clone(),
            config: self.config,
        }
    }
}

impl<S, R, C> OperationPipeline<S, R, C>
where
    S: EntityStore,
    R: AuditLogRepository,
    C: Clock + Send + Sync,
{
    /// Creates a pipeline over `store` that reports to `audit`.
    #[must_use]
    pub const fn new(store: Arc<S>, audit: AuditLogSink<R, C>, config: PipelineConfig) -> Self {
        Self {
            store,
            audit,
            config,
        }
    }

    /// Returns the entity store.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns the audit sink.
    #[must_use]
    pub const fn audit(&self) -> &AuditLogSink<R, C> {
        &self.audit
    }

    /// Returns the pipeline configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn now(&self) -> DateTime<Utc> {
        self.audit.clock().utc()
    }

    /// Lists rows of `E` visible to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Failed`] when the store fails.
    pub async fn list<E>(
        &self,
        context: &RequestContext,
        filter: E::Filter,
        offset: usize,
        limit: Option<usize>,
    ) -> OperationResult<Page<E>>
    where
        E: Entity,
        S::Tx: Table<E>,
    {
        let scope = resolve_scope(context.principal(), E::KIND.ownership());
        let query =
            ListQuery::filtered(filter).with_page(offset, Some(self.config.page_limit(limit)));
        let outcome = self
            .store
            .transaction(move |tx: &mut S::Tx| -> OperationResult<Page<E>> {
                Ok(<S::Tx as Table<E>>::list(tx, scope, &query)?)
            })
            .await;
        match outcome {
            Ok(page) => {
                let endpoint = format!("{} List", E::KIND.display_name());
                self.audit
                    .record(AuditEvent::api_access(context, &endpoint, "GET"))
                    .await;
                Ok(page)
            }
            Err(err) => Err(self.fail(context, E::KIND, "list", err).await),
        }
    }

    /// Retrieves one row of `E` by primary key.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::NotFound`] when the row is absent or out of
    /// scope.
    pub async fn retrieve<E>(&self, context: &RequestContext, id: E::Id) -> OperationResult<E>
    where
        E: Entity,
        S::Tx: Table<E>,
    {
        let scope = resolve_scope(context.principal(), E::KIND.ownership());
        let outcome = self
            .store
            .transaction(move |tx: &mut S::Tx| -> OperationResult<E> {
                <S::Tx as Table<E>>::find(tx, id, scope)?.ok_or(OperationError::NotFound)
            })
            .await;
        match outcome {
            Ok(entity) => Ok(entity),
            Err(err) => Err(self.fail(context, E::KIND, "retrieve", err).await),
        }
    }

    /// Validates `draft` and stores it as a new row owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Rejected`] with every broken rule, or
    /// [`OperationError::Failed`] when the store fails.
    pub async fn create<E>(&self, context: &RequestContext, draft: E::Draft) -> OperationResult<E>
    where
        E: Validate,
        S::Tx: Table<E>,
    {
        let principal = context.principal().clone();
        let now = self.now();
        let outcome = self
            .store
            .transaction(move |tx: &mut S::Tx| -> OperationResult<E> {
                let validation = ValidationContext::new(&principal, now, WriteMode::Create);
                let entity = E::validate(&draft, None, &validation, tx)?;
                <S::Tx as Table<E>>::insert(tx, &entity)?;
                Ok(entity)
            })
            .await;
        match outcome {
            Ok(entity) => {
                self.audit
                    .record(AuditEvent::entity_created(context, E::KIND, &entity.label()))
                    .await;
                Ok(entity)
            }
            Err(err) => Err(self.fail(context, E::KIND, "create", err).await),
        }
    }

    /// Applies `draft` to the row `id` as a full replace or a partial
    /// update, depending on `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::NotFound`] when the row is out of scope,
    /// [`OperationError::Rejected`] when the merged payload is invalid, or
    /// [`OperationError::Failed`] when the store fails.
    pub async fn update<E>(
        &self,
        context: &RequestContext,
        id: E::Id,
        draft: E::Draft,
        mode: WriteMode,
    ) -> OperationResult<E>
    where
        E: Validate,
        S::Tx: Table<E>,
    {
        let principal = context.principal().clone();
        let scope = resolve_scope(&principal, E::KIND.ownership());
        let now = self.now();
        let record_history = self.config.record_task_history;
        let outcome = self
            .store
            .transaction(move |tx: &mut S::Tx| -> OperationResult<(E, ChangeSet)> {
                let existing =
                    <S::Tx as Table<E>>::find(tx, id, scope)?.ok_or(OperationError::NotFound)?;
                let validation = ValidationContext::new(&principal, now, mode);
                let updated = E::validate(&draft, Some(&existing), &validation, tx)?;
                <S::Tx as Table<E>>::update(tx, &updated)?;
                let changes = ChangeSet::between(&existing, &updated);
                if record_history {
                    append_history(tx, &updated, &changes, now)?;
                }
                Ok((updated, changes))
            })
            .await;
        match outcome {
            Ok((entity, changes)) => {
                self.audit
                    .record(AuditEvent::entity_updated(
                        context,
                        E::KIND,
                        &entity.label(),
                        &changes,
                    ))
                    .await;
                Ok(entity)
            }
            Err(err) => Err(self.fail(context, E::KIND, "update", err).await),
        }
    }

    /// Deletes the row `id` and everything that cascades from it.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::NotFound`] when the row is out of scope, or
    /// [`OperationError::Failed`] when the store fails.
    pub async fn delete<E>(&self, context: &RequestContext, id: E::Id) -> OperationResult<()>
    where
        E: Entity,
        S::Tx: Table<E>,
    {
        let scope = resolve_scope(context.principal(), E::KIND.ownership());
        let outcome = self
            .store
            .transaction(move |tx: &mut S::Tx| -> OperationResult<String> {
                let existing =
                    <S::Tx as Table<E>>::find(tx, id, scope)?.ok_or(OperationError::NotFound)?;
                <S::Tx as Table<E>>::delete(tx, id)?;
                Ok(existing.label())
            })
            .await;
        match outcome {
            Ok(label) => {
                self.audit
                    .record(AuditEvent::entity_deleted(context, E::KIND, &label))
                    .await;
                Ok(())
            }
            Err(err) => Err(self.fail(context, E::KIND, "delete", err).await),
        }
    }

    /// Flips a task between completed and pending.
    ///
    /// The task is looked up without scope so that a non-owner receives
    /// [`OperationError::Forbidden`] instead of a not-found response.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::NotFound`] for an unknown task,
    /// [`OperationError::Forbidden`] when the caller neither owns the task
    /// nor is an administrator, [`OperationError::Rejected`] when the new
    /// state breaks a completion rule, or [`OperationError::Failed`] when the
    /// store fails.
    pub async fn toggle(&self, context: &RequestContext, id: TaskId) -> OperationResult<TaskStatus> {
        let principal = context.principal().clone();
        let now = self.now();
        let record_history = self.config.record_task_history;
        let outcome = self
            .store
            .transaction(move |tx: &mut S::Tx| -> OperationResult<(Task, ChangeSet)> {
                let existing = <S::Tx as Table<Task>>::find(tx, id, ScopePredicate::Unrestricted)?
                    .ok_or(OperationError::NotFound)?;
                if !principal.can_act_for(existing.owner()) {
                    return Err(OperationError::Forbidden);
                }
                let validation = ValidationContext::new(&principal, now, WriteMode::Patch);
                let toggled = toggle_completion(&existing, &validation)?;
                <S::Tx as Table<Task>>::update(tx, &toggled)?;
                let changes = ChangeSet::between(&existing, &toggled);
                if record_history {
                    append_history(tx, &toggled, &changes, now)?;
                }
                Ok((toggled, changes))
            })
            .await;
        match outcome {
            Ok((task, changes)) => {
                self.audit
                    .record(AuditEvent::task_toggled(context, &task.label(), &changes))
                    .await;
                Ok(task.status())
            }
            Err(err) => Err(self.fail(context, EntityKind::Task, "toggle", err).await),
        }
    }

    /// Applies the deletion of `user` announced by the identity
    /// collaborator.
    ///
    /// Owner and author references are cleared, memberships and the profile
    /// are removed, and the user's audit records lose their actor.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Failed`] when the entity store fails. Audit
    /// log failures are only reported to diagnostics.
    pub async fn on_user_deleted(&self, user: UserId) -> OperationResult<()> {
        self.store
            .transaction(move |tx: &mut S::Tx| -> OperationResult<()> {
                tx.forget_user(user)?;
                Ok(())
            })
            .await?;
        match self.audit.repository().forget_actor(user).await {
            Ok(cleared) => tracing::info!(%user, cleared, "cleared actor on audit records"),
            Err(err) => tracing::error!(%user, error = %err, "could not clear audit actor"),
        }
        Ok(())
    }

    async fn fail(
        &self,
        context: &RequestContext,
        kind: EntityKind,
        operation: &str,
        err: OperationError,
    ) -> OperationError {
        match &err {
            OperationError::Rejected(errors) => {
                self.audit
                    .record(AuditEvent::validation_failed(context, kind, errors))
                    .await;
            }
            OperationError::NotFound => {
                tracing::debug!(kind = kind.as_str(), operation, "row not found in scope");
            }
            OperationError::Forbidden => {
                let resource = format!("{operation} {}", kind.display_name().to_lowercase());
                self.audit
                    .record(AuditEvent::unauthorized_access(context, &resource))
                    .await;
            }
            OperationError::Failed(StoreError::Interrupted(reason)) => {
                tracing::error!(
                    kind = kind.as_str(),
                    operation,
                    reason = %reason,
                    "unit of work interrupted"
                );
                self.audit
                    .record(AuditEvent::system_error(reason, context.origin()))
                    .await;
            }
            OperationError::Failed(store) => {
                tracing::error!(
                    kind = kind.as_str(),
                    operation,
                    error = %store,
                    "entity store failure"
                );
                let label = format!("{operation} {}", kind.display_name().to_lowercase());
                self.audit
                    .record(AuditEvent::store_failed(context, &label, &store.to_string()))
                    .await;
            }
        }
        err
    }
}

fn append_history<X, E>(
    tx: &mut X,
    entity: &E,
    changes: &ChangeSet,
    now: DateTime<Utc>,
) -> Result<(), StoreError>
where
    X: Table<History> + ?Sized,
    E: Entity,
{
    match entity.history_entry(changes, now) {
        Some(entry) => X::insert(tx, &entry),
        None => Ok(()),
    }
}
