//! Typed table access and store-backed lookups over a `PostgreSQL`
//! connection.
//!
//! Scope predicates become `WHERE` clauses: owner columns for directly
//! owned rows, the caller's task ids for task satellites, and member or
//! team-owner matches for memberships.

use super::models::{
    HistoryRow, TaskAttachmentRow, TaskCommentRow, TaskDependenceRow, TaskPriorityRow,
    TaskRecurrenceRow, TaskReportRow, TaskRow, TaskScheduleRow, TeamRow, UserProfileRow,
    UserTeamsRow,
};
use super::schema::{
    task_attachments, task_comments, task_dependences, task_histories, task_priorities,
    task_recurrences, task_reports, task_schedules, tasks, teams, user_profiles, user_teams,
};
use super::{contains_pattern, store_error};
use crate::access::{ScopePredicate, UserId};
use crate::tracker::{
    domain::{
        Entity, EntityId, History, RecordId, Task, TaskAttachment, TaskComment, TaskDependence,
        TaskId, TaskPriority, TaskRecurrence, TaskReport, TaskSchedule, Team, TeamId,
        UserProfile, UserTeams,
    },
    ports::{ListQuery, Lookup, Page, StoreError, StoreResult, StoreTx, Table},
};
use diesel::dsl::count_star;
use diesel::expression::BoxableExpression;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::sql_types::Bool;
use uuid::Uuid;

type Restriction<T> = Box<dyn BoxableExpression<T, Pg, SqlType = Bool>>;

fn owned_task_ids(connection: &mut PgConnection, user: UserId) -> StoreResult<Vec<Uuid>> {
    tasks::table
        .filter(tasks::owner_id.is_not_distinct_from(user.into_inner()))
        .select(tasks::id)
        .load(connection)
        .map_err(store_error)
}

fn owned_team_ids(connection: &mut PgConnection, user: UserId) -> StoreResult<Vec<Uuid>> {
    teams::table
        .filter(teams::owner_id.is_not_distinct_from(user.into_inner()))
        .select(teams::id)
        .load(connection)
        .map_err(store_error)
}

fn any_rows(count: QueryResult<i64>) -> StoreResult<bool> {
    count.map(|rows| rows > 0).map_err(store_error)
}

fn to_offset(value: usize) -> StoreResult<i64> {
    i64::try_from(value).map_err(StoreError::persistence)
}

/// Implements [`Table`] for one entity over `PgConnection`.
///
/// `restrict` builds the predicate for a restricted scope; `refine`
/// applies the entity's list filter.
macro_rules! pg_table {
    (
        $entity:ty,
        row: $row:ty,
        table: $table:ident,
        order: $order:ident,
        restrict: |$conn:ident, $user:ident| $restrict:expr,
        refine: |$query:ident, $filter:ident| $refine:expr $(,)?
    ) => {
        const _: () = {
            fn restrict($conn: &mut PgConnection, $user: UserId) -> StoreResult<Restriction<$table::table>> {
                $restrict
            }

            fn refine<'a>(
                $query: $table::BoxedQuery<'a, Pg>,
                $filter: &<$entity as Entity>::Filter,
            ) -> $table::BoxedQuery<'a, Pg> {
                $refine
            }

            fn scoped<'a>(
                connection: &mut PgConnection,
                scope: ScopePredicate,
            ) -> StoreResult<$table::BoxedQuery<'a, Pg>> {
                let query = $table::table.into_boxed();
                match scope.restricted_user() {
                    Some(user) => Ok(query.filter(restrict(connection, user)?)),
                    None => Ok(query),
                }
            }

            impl Table<$entity> for PgConnection {
                fn insert(&mut self, entity: &$entity) -> StoreResult<()> {
                    diesel::insert_into($table::table)
                        .values(<$row>::from(entity))
                        .execute(self)
                        .map_err(store_error)?;
                    Ok(())
                }

                fn update(&mut self, entity: &$entity) -> StoreResult<()> {
                    let row = <$row>::from(entity);
                    let updated = diesel::update($table::table.find(row.id))
                        .set(&row)
                        .execute(self)
                        .map_err(store_error)?;
                    if updated == 0 {
                        return Err(StoreError::not_found(<$entity as Entity>::KIND, row.id));
                    }
                    Ok(())
                }

                fn delete(&mut self, id: <$entity as Entity>::Id) -> StoreResult<()> {
                    let key = id.into_uuid();
                    let removed = diesel::delete($table::table.find(key))
                        .execute(self)
                        .map_err(store_error)?;
                    if removed == 0 {
                        return Err(StoreError::not_found(<$entity as Entity>::KIND, key));
                    }
                    Ok(())
                }

                fn find(
                    &mut self,
                    id: <$entity as Entity>::Id,
                    scope: ScopePredicate,
                ) -> StoreResult<Option<$entity>> {
                    let row = scoped(self, scope)?
                        .filter($table::id.eq(id.into_uuid()))
                        .select(<$row>::as_select())
                        .first::<$row>(self)
                        .optional()
                        .map_err(store_error)?;
                    row.map(<$entity>::try_from).transpose()
                }

                fn list(
                    &mut self,
                    scope: ScopePredicate,
                    query: &ListQuery<<$entity as Entity>::Filter>,
                ) -> StoreResult<Page<$entity>> {
                    let total: i64 = refine(scoped(self, scope)?, &query.filter)
                        .select(count_star())
                        .get_result(self)
                        .map_err(store_error)?;
                    let mut window = refine(scoped(self, scope)?, &query.filter)
                        .order(($table::$order.asc(), $table::id.asc()))
                        .offset(to_offset(query.offset)?);
                    if let Some(limit) = query.limit {
                        window = window.limit(to_offset(limit)?);
                    }
                    let rows = window
                        .select(<$row>::as_select())
                        .load::<$row>(self)
                        .map_err(store_error)?;
                    let items = rows
                        .into_iter()
                        .map(<$entity>::try_from)
                        .collect::<StoreResult<Vec<_>>>()?;
                    Ok(Page {
                        total: u64::try_from(total).map_err(StoreError::persistence)?,
                        items,
                    })
                }
            }
        };
    };
}

pg_table!(
    Task,
    row: TaskRow,
    table: tasks,
    order: created_at,
    restrict: |_connection, user| Ok(Box::new(
        tasks::owner_id.is_not_distinct_from(user.into_inner())
    )),
    refine: |query, filter| {
        let mut refined = query;
        if let Some(term) = filter.search_term() {
            refined = refined.filter(tasks::title.ilike(contains_pattern(term)));
        }
        if let Some(status) = filter.status {
            refined = refined.filter(tasks::status.eq(status.as_str()));
        }
        if let Some(priority) = filter.priority {
            refined = refined.filter(tasks::priority.eq(priority.as_str()));
        }
        if let Some(after) = filter.due_after {
            refined = refined.filter(tasks::due_date.ge(after));
        }
        if let Some(before) = filter.due_before {
            refined = refined.filter(tasks::due_date.le(before));
        }
        refined
    },
);

pg_table!(
    TaskComment,
    row: TaskCommentRow,
    table: task_comments,
    order: created_at,
    restrict: |connection, user| Ok(Box::new(
        task_comments::task_id.eq_any(owned_task_ids(connection, user)?)
    )),
    refine: |query, _filter| query,
);

pg_table!(
    TaskAttachment,
    row: TaskAttachmentRow,
    table: task_attachments,
    order: created_at,
    restrict: |connection, user| Ok(Box::new(
        task_attachments::task_id.eq_any(owned_task_ids(connection, user)?)
    )),
    refine: |query, _filter| query,
);

pg_table!(
    TaskPriority,
    row: TaskPriorityRow,
    table: task_priorities,
    order: created_at,
    restrict: |connection, user| Ok(Box::new(
        task_priorities::task_id.eq_any(owned_task_ids(connection, user)?)
    )),
    refine: |query, _filter| query,
);

pg_table!(
    TaskSchedule,
    row: TaskScheduleRow,
    table: task_schedules,
    order: created_at,
    restrict: |connection, user| Ok(Box::new(
        task_schedules::task_id.eq_any(owned_task_ids(connection, user)?)
    )),
    refine: |query, _filter| query,
);

pg_table!(
    TaskRecurrence,
    row: TaskRecurrenceRow,
    table: task_recurrences,
    order: created_at,
    restrict: |connection, user| Ok(Box::new(
        task_recurrences::task_id.eq_any(owned_task_ids(connection, user)?)
    )),
    refine: |query, _filter| query,
);

pg_table!(
    TaskDependence,
    row: TaskDependenceRow,
    table: task_dependences,
    order: created_at,
    restrict: |connection, user| Ok(Box::new(
        task_dependences::task_id.eq_any(owned_task_ids(connection, user)?)
    )),
    refine: |query, _filter| query,
);

pg_table!(
    History,
    row: HistoryRow,
    table: task_histories,
    order: updated_at,
    restrict: |connection, user| Ok(Box::new(
        task_histories::task_id.eq_any(owned_task_ids(connection, user)?)
    )),
    refine: |query, _filter| query,
);

pg_table!(
    TaskReport,
    row: TaskReportRow,
    table: task_reports,
    order: created_at,
    restrict: |_connection, user| Ok(Box::new(
        task_reports::user_id.is_not_distinct_from(user.into_inner())
    )),
    refine: |query, _filter| query,
);

pg_table!(
    Team,
    row: TeamRow,
    table: teams,
    order: created_at,
    restrict: |_connection, user| Ok(Box::new(
        teams::owner_id.is_not_distinct_from(user.into_inner())
    )),
    refine: |query, _filter| query,
);

pg_table!(
    UserTeams,
    row: UserTeamsRow,
    table: user_teams,
    order: created_at,
    restrict: |connection, user| {
        let owned_teams = owned_team_ids(connection, user)?;
        Ok(Box::new(
            user_teams::user_id
                .eq(user.into_inner())
                .or(user_teams::team_id.eq_any(owned_teams)),
        ))
    },
    refine: |query, _filter| query,
);

pg_table!(
    UserProfile,
    row: UserProfileRow,
    table: user_profiles,
    order: created_at,
    restrict: |_connection, user| Ok(Box::new(user_profiles::user_id.eq(user.into_inner()))),
    refine: |query, _filter| query,
);

impl Lookup for PgConnection {
    fn task_exists(&mut self, task: TaskId, scope: ScopePredicate) -> StoreResult<bool> {
        let mut query = tasks::table
            .filter(tasks::id.eq(task.into_inner()))
            .into_boxed();
        if let Some(user) = scope.restricted_user() {
            query = query.filter(tasks::owner_id.is_not_distinct_from(user.into_inner()));
        }
        any_rows(query.select(count_star()).get_result(self))
    }

    fn team_owner(&mut self, team: TeamId) -> StoreResult<Option<Option<UserId>>> {
        let owner = teams::table
            .find(team.into_inner())
            .select(teams::owner_id)
            .first::<Option<Uuid>>(self)
            .optional()
            .map_err(store_error)?;
        Ok(owner.map(|found| found.map(UserId::from_uuid)))
    }

    fn team_name_taken(&mut self, name: &str, except: Option<TeamId>) -> StoreResult<bool> {
        let mut query = teams::table.filter(teams::name.eq(name)).into_boxed();
        if let Some(skip) = except {
            query = query.filter(teams::id.ne(skip.into_inner()));
        }
        any_rows(query.select(count_star()).get_result(self))
    }

    fn membership_exists(
        &mut self,
        user: UserId,
        team: TeamId,
        except: Option<RecordId>,
    ) -> StoreResult<bool> {
        let mut query = user_teams::table
            .filter(user_teams::user_id.eq(user.into_inner()))
            .filter(user_teams::team_id.eq(team.into_inner()))
            .into_boxed();
        if let Some(skip) = except {
            query = query.filter(user_teams::id.ne(skip.into_inner()));
        }
        any_rows(query.select(count_star()).get_result(self))
    }

    fn dependence_exists(
        &mut self,
        task: TaskId,
        dependent_task: TaskId,
        except: Option<RecordId>,
    ) -> StoreResult<bool> {
        let mut query = task_dependences::table
            .filter(task_dependences::task_id.eq(task.into_inner()))
            .filter(task_dependences::dependent_task_id.eq(dependent_task.into_inner()))
            .into_boxed();
        if let Some(skip) = except {
            query = query.filter(task_dependences::id.ne(skip.into_inner()));
        }
        any_rows(query.select(count_star()).get_result(self))
    }

    fn dependencies_of(
        &mut self,
        task: TaskId,
        except: Option<RecordId>,
    ) -> StoreResult<Vec<TaskId>> {
        let mut query = task_dependences::table
            .filter(task_dependences::task_id.eq(task.into_inner()))
            .into_boxed();
        if let Some(skip) = except {
            query = query.filter(task_dependences::id.ne(skip.into_inner()));
        }
        let targets = query
            .select(task_dependences::dependent_task_id)
            .load::<Uuid>(self)
            .map_err(store_error)?;
        Ok(targets.into_iter().map(TaskId::from_uuid).collect())
    }

    fn profile_exists(&mut self, user: UserId, except: Option<RecordId>) -> StoreResult<bool> {
        let mut query = user_profiles::table
            .filter(user_profiles::user_id.eq(user.into_inner()))
            .into_boxed();
        if let Some(skip) = except {
            query = query.filter(user_profiles::id.ne(skip.into_inner()));
        }
        any_rows(query.select(count_star()).get_result(self))
    }
}

impl StoreTx for PgConnection {
    fn forget_user(&mut self, user: UserId) -> StoreResult<()> {
        let key = user.into_inner();
        diesel::update(tasks::table.filter(tasks::owner_id.eq(key)))
            .set(tasks::owner_id.eq(None::<Uuid>))
            .execute(self)
            .map_err(store_error)?;
        diesel::update(task_comments::table.filter(task_comments::author_id.eq(key)))
            .set(task_comments::author_id.eq(None::<Uuid>))
            .execute(self)
            .map_err(store_error)?;
        diesel::update(task_reports::table.filter(task_reports::user_id.eq(key)))
            .set(task_reports::user_id.eq(None::<Uuid>))
            .execute(self)
            .map_err(store_error)?;
        diesel::update(teams::table.filter(teams::owner_id.eq(key)))
            .set(teams::owner_id.eq(None::<Uuid>))
            .execute(self)
            .map_err(store_error)?;
        diesel::delete(user_teams::table.filter(user_teams::user_id.eq(key)))
            .execute(self)
            .map_err(store_error)?;
        diesel::delete(user_profiles::table.filter(user_profiles::user_id.eq(key)))
            .execute(self)
            .map_err(store_error)?;
        Ok(())
    }
}
