//! Table storage and constraint emulation for the in-memory store.

use crate::access::{ScopePredicate, UserId};
use crate::tracker::{
    domain::{
        Anchor, Entity, EntityId, History, RecordId, Task, TaskAttachment, TaskComment,
        TaskDependence, TaskId, TaskPriority, TaskRecurrence, TaskReport, TaskSchedule, Team,
        TeamId, UserProfile, UserTeams,
    },
    ports::{ListQuery, Lookup, Page, StoreError, StoreResult, StoreTx, Table},
};

/// Every table of the in-memory store, each kept in insertion order.
///
/// A transaction works on a clone and the clone replaces the committed
/// tables only when the unit of work succeeds.
#[derive(Debug, Clone, Default)]
pub struct MemoryTables {
    tasks: Vec<Task>,
    comments: Vec<TaskComment>,
    attachments: Vec<TaskAttachment>,
    priorities: Vec<TaskPriority>,
    schedules: Vec<TaskSchedule>,
    recurrences: Vec<TaskRecurrence>,
    dependences: Vec<TaskDependence>,
    histories: Vec<History>,
    reports: Vec<TaskReport>,
    teams: Vec<Team>,
    memberships: Vec<UserTeams>,
    profiles: Vec<UserProfile>,
}

impl MemoryTables {
    /// Returns every stored row of `E`, ignoring scope.
    #[must_use]
    pub fn rows<E: MemoryRow>(&self) -> &[E] {
        E::rows(self)
    }

    fn task_owner(&self, task: TaskId) -> Option<Option<UserId>> {
        self.tasks
            .iter()
            .find(|row| row.id() == task)
            .map(Task::owner)
    }

    fn has_task(&self, task: TaskId) -> bool {
        self.task_owner(task).is_some()
    }

    fn has_team(&self, team: TeamId) -> bool {
        self.teams.iter().any(|row| row.id == team)
    }

    fn admits(&self, scope: ScopePredicate, anchor: Anchor) -> bool {
        let Some(user) = scope.restricted_user() else {
            return true;
        };
        match anchor {
            Anchor::User(owner) => owner == Some(user),
            Anchor::Task(task) => self.task_owner(task) == Some(Some(user)),
            Anchor::Membership { user: member, team } => {
                member == user
                    || self
                        .teams
                        .iter()
                        .any(|row| row.id == team && row.owner == Some(user))
            }
        }
    }
}

fn require_task(tables: &MemoryTables, task: TaskId, constraint: &str) -> StoreResult<()> {
    if tables.has_task(task) {
        Ok(())
    } else {
        Err(StoreError::ForeignKeyViolation(constraint.to_owned()))
    }
}

/// Per-entity storage hooks for the in-memory store: which vector holds
/// the rows, which constraints a row must satisfy, and what a delete
/// cascades to.
pub trait MemoryRow: Entity {
    /// Returns the table holding rows of this type.
    fn rows(tables: &MemoryTables) -> &Vec<Self>;

    /// Returns the table holding rows of this type, mutably.
    fn rows_mut(tables: &mut MemoryTables) -> &mut Vec<Self>;

    /// Checks referential and uniqueness constraints for `self`, ignoring
    /// the stored row with the same identifier.
    ///
    /// # Errors
    ///
    /// Returns the constraint violation the relational store would report.
    fn check(&self, _tables: &MemoryTables) -> StoreResult<()> {
        Ok(())
    }

    /// Removes rows that reference the deleted row `id`.
    fn cascade(_id: Self::Id, _tables: &mut MemoryTables) {}
}

impl MemoryRow for Task {
    fn rows(tables: &MemoryTables) -> &Vec<Self> {
        &tables.tasks
    }

    fn rows_mut(tables: &mut MemoryTables) -> &mut Vec<Self> {
        &mut tables.tasks
    }

    fn cascade(id: TaskId, tables: &mut MemoryTables) {
        tables.comments.retain(|row| row.task != id);
        tables.attachments.retain(|row| row.task != id);
        tables.priorities.retain(|row| row.task != id);
        tables.schedules.retain(|row| row.task != id);
        tables.recurrences.retain(|row| row.task != id);
        tables.histories.retain(|row| row.task != id);
        tables
            .dependences
            .retain(|row| row.task != id && row.dependent_task != id);
    }
}

impl MemoryRow for TaskComment {
    fn rows(tables: &MemoryTables) -> &Vec<Self> {
        &tables.comments
    }

    fn rows_mut(tables: &mut MemoryTables) -> &mut Vec<Self> {
        &mut tables.comments
    }

    fn check(&self, tables: &MemoryTables) -> StoreResult<()> {
        require_task(tables, self.task, "fk_task_comments_task")
    }
}

impl MemoryRow for TaskAttachment {
    fn rows(tables: &MemoryTables) -> &Vec<Self> {
        &tables.attachments
    }

    fn rows_mut(tables: &mut MemoryTables) -> &mut Vec<Self> {
        &mut tables.attachments
    }

    fn check(&self, tables: &MemoryTables) -> StoreResult<()> {
        require_task(tables, self.task, "fk_task_attachments_task")
    }
}

impl MemoryRow for TaskPriority {
    fn rows(tables: &MemoryTables) -> &Vec<Self> {
        &tables.priorities
    }

    fn rows_mut(tables: &mut MemoryTables) -> &mut Vec<Self> {
        &mut tables.priorities
    }

    fn check(&self, tables: &MemoryTables) -> StoreResult<()> {
        require_task(tables, self.task, "fk_task_priorities_task")
    }
}

impl MemoryRow for TaskSchedule {
    fn rows(tables: &MemoryTables) -> &Vec<Self> {
        &tables.schedules
    }

    fn rows_mut(tables: &mut MemoryTables) -> &mut Vec<Self> {
        &mut tables.schedules
    }

    fn check(&self, tables: &MemoryTables) -> StoreResult<()> {
        require_task(tables, self.task, "fk_task_schedules_task")
    }
}

impl MemoryRow for TaskRecurrence {
    fn rows(tables: &MemoryTables) -> &Vec<Self> {
        &tables.recurrences
    }

    fn rows_mut(tables: &mut MemoryTables) -> &mut Vec<Self> {
        &mut tables.recurrences
    }

    fn check(&self, tables: &MemoryTables) -> StoreResult<()> {
        require_task(tables, self.task, "fk_task_recurrences_task")
    }
}

impl MemoryRow for TaskDependence {
    fn rows(tables: &MemoryTables) -> &Vec<Self> {
        &tables.dependences
    }

    fn rows_mut(tables: &mut MemoryTables) -> &mut Vec<Self> {
        &mut tables.dependences
    }

    fn check(&self, tables: &MemoryTables) -> StoreResult<()> {
        require_task(tables, self.task, "fk_task_dependences_task")?;
        require_task(tables, self.dependent_task, "fk_task_dependences_dependent")?;
        let duplicate = tables.dependences.iter().any(|row| {
            row.id != self.id && row.task == self.task && row.dependent_task == self.dependent_task
        });
        if duplicate {
            return Err(StoreError::UniqueViolation(
                "uq_task_dependences_pair".to_owned(),
            ));
        }
        Ok(())
    }
}

impl MemoryRow for History {
    fn rows(tables: &MemoryTables) -> &Vec<Self> {
        &tables.histories
    }

    fn rows_mut(tables: &mut MemoryTables) -> &mut Vec<Self> {
        &mut tables.histories
    }

    fn check(&self, tables: &MemoryTables) -> StoreResult<()> {
        require_task(tables, self.task, "fk_task_histories_task")
    }
}

impl MemoryRow for TaskReport {
    fn rows(tables: &MemoryTables) -> &Vec<Self> {
        &tables.reports
    }

    fn rows_mut(tables: &mut MemoryTables) -> &mut Vec<Self> {
        &mut tables.reports
    }
}

impl MemoryRow for Team {
    fn rows(tables: &MemoryTables) -> &Vec<Self> {
        &tables.teams
    }

    fn rows_mut(tables: &mut MemoryTables) -> &mut Vec<Self> {
        &mut tables.teams
    }

    fn check(&self, tables: &MemoryTables) -> StoreResult<()> {
        if tables
            .teams
            .iter()
            .any(|row| row.id != self.id && row.name == self.name)
        {
            return Err(StoreError::UniqueViolation("uq_teams_name".to_owned()));
        }
        Ok(())
    }

    fn cascade(id: TeamId, tables: &mut MemoryTables) {
        tables.memberships.retain(|row| row.team != id);
    }
}

impl MemoryRow for UserTeams {
    fn rows(tables: &MemoryTables) -> &Vec<Self> {
        &tables.memberships
    }

    fn rows_mut(tables: &mut MemoryTables) -> &mut Vec<Self> {
        &mut tables.memberships
    }

    fn check(&self, tables: &MemoryTables) -> StoreResult<()> {
        if !tables.has_team(self.team) {
            return Err(StoreError::ForeignKeyViolation(
                "fk_user_teams_team".to_owned(),
            ));
        }
        if tables
            .memberships
            .iter()
            .any(|row| row.id != self.id && row.user == self.user && row.team == self.team)
        {
            return Err(StoreError::UniqueViolation(
                "uq_user_teams_membership".to_owned(),
            ));
        }
        Ok(())
    }
}

impl MemoryRow for UserProfile {
    fn rows(tables: &MemoryTables) -> &Vec<Self> {
        &tables.profiles
    }

    fn rows_mut(tables: &mut MemoryTables) -> &mut Vec<Self> {
        &mut tables.profiles
    }

    fn check(&self, tables: &MemoryTables) -> StoreResult<()> {
        if tables
            .profiles
            .iter()
            .any(|row| row.id != self.id && row.user == self.user)
        {
            return Err(StoreError::UniqueViolation(
                "uq_user_profiles_user".to_owned(),
            ));
        }
        Ok(())
    }
}

impl<E: MemoryRow> Table<E> for MemoryTables {
    fn insert(&mut self, entity: &E) -> StoreResult<()> {
        if E::rows(self).iter().any(|row| row.id() == entity.id()) {
            return Err(StoreError::UniqueViolation(format!(
                "{}_pkey",
                E::KIND.collection_path()
            )));
        }
        entity.check(self)?;
        E::rows_mut(self).push(entity.clone());
        Ok(())
    }

    fn update(&mut self, entity: &E) -> StoreResult<()> {
        entity.check(self)?;
        let slot = E::rows_mut(self)
            .iter_mut()
            .find(|row| row.id() == entity.id())
            .ok_or_else(|| StoreError::not_found(E::KIND, entity.id().into_uuid()))?;
        *slot = entity.clone();
        Ok(())
    }

    fn delete(&mut self, id: E::Id) -> StoreResult<()> {
        let rows = E::rows_mut(self);
        let before = rows.len();
        rows.retain(|row| row.id() != id);
        if rows.len() == before {
            return Err(StoreError::not_found(E::KIND, id.into_uuid()));
        }
        E::cascade(id, self);
        Ok(())
    }

    fn find(&mut self, id: E::Id, scope: ScopePredicate) -> StoreResult<Option<E>> {
        Ok(E::rows(self)
            .iter()
            .find(|row| row.id() == id && self.admits(scope, row.anchor()))
            .cloned())
    }

    fn list(
        &mut self,
        scope: ScopePredicate,
        query: &ListQuery<E::Filter>,
    ) -> StoreResult<Page<E>> {
        let mut matching: Vec<&E> = E::rows(self)
            .iter()
            .filter(|row| self.admits(scope, row.anchor()) && row.matches(&query.filter))
            .collect();
        matching.sort_by_key(|row| row.recorded_at());

        let total = u64::try_from(matching.len()).map_err(StoreError::persistence)?;
        let items = matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(Page { total, items })
    }
}

impl Lookup for MemoryTables {
    fn task_exists(&mut self, task: TaskId, scope: ScopePredicate) -> StoreResult<bool> {
        Ok(self.has_task(task) && self.admits(scope, Anchor::User(self.task_owner(task).flatten())))
    }

    fn team_owner(&mut self, team: TeamId) -> StoreResult<Option<Option<UserId>>> {
        Ok(self
            .teams
            .iter()
            .find(|row| row.id == team)
            .map(|row| row.owner))
    }

    fn team_name_taken(&mut self, name: &str, except: Option<TeamId>) -> StoreResult<bool> {
        Ok(self
            .teams
            .iter()
            .any(|row| Some(row.id) != except && row.name == name))
    }

    fn membership_exists(
        &mut self,
        user: UserId,
        team: TeamId,
        except: Option<RecordId>,
    ) -> StoreResult<bool> {
        Ok(self
            .memberships
            .iter()
            .any(|row| Some(row.id) != except && row.user == user && row.team == team))
    }

    fn dependence_exists(
        &mut self,
        task: TaskId,
        dependent_task: TaskId,
        except: Option<RecordId>,
    ) -> StoreResult<bool> {
        Ok(self.dependences.iter().any(|row| {
            Some(row.id) != except && row.task == task && row.dependent_task == dependent_task
        }))
    }

    fn dependencies_of(
        &mut self,
        task: TaskId,
        except: Option<RecordId>,
    ) -> StoreResult<Vec<TaskId>> {
        Ok(self
            .dependences
            .iter()
            .filter(|row| Some(row.id) != except && row.task == task)
            .map(|row| row.dependent_task)
            .collect())
    }

    fn profile_exists(&mut self, user: UserId, except: Option<RecordId>) -> StoreResult<bool> {
        Ok(self
            .profiles
            .iter()
            .any(|row| Some(row.id) != except && row.user == user))
    }
}

impl StoreTx for MemoryTables {
    fn forget_user(&mut self, user: UserId) -> StoreResult<()> {
        for task in self.tasks.iter_mut().filter(|task| task.owner() == Some(user)) {
            task.clear_owner();
        }
        for comment in &mut self.comments {
            if comment.author == Some(user) {
                comment.author = None;
            }
        }
        for report in &mut self.reports {
            if report.user == Some(user) {
                report.user = None;
            }
        }
        for team in &mut self.teams {
            if team.owner == Some(user) {
                team.owner = None;
            }
        }
        self.memberships.retain(|row| row.user != user);
        self.profiles.retain(|row| row.user != user);
        Ok(())
    }
}
