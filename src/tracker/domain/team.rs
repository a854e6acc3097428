//! Teams, team memberships, and user profiles.

use super::{Anchor, Entity, EntityKind, NoFilter, RecordId, TeamId, nullable};
use crate::access::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named team. Names are unique across the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    /// Team identifier.
    pub id: TeamId,
    /// Unique trimmed name.
    pub name: String,
    /// Owning user; cleared when the owner is deleted.
    pub owner: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Write payload for teams.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TeamDraft {
    /// Team name.
    pub name: Option<String>,
}

impl Entity for Team {
    const KIND: EntityKind = EntityKind::Team;
    type Id = TeamId;
    type Draft = TeamDraft;
    type Filter = NoFilter;

    fn id(&self) -> TeamId {
        self.id
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn anchor(&self) -> Anchor {
        Anchor::User(self.owner)
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn snapshot(&self) -> Vec<(&'static str, Option<String>)> {
        vec![("name", Some(self.name.clone()))]
    }
}

/// Membership of a user in a team. Each (user, team) pair occurs once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserTeams {
    /// Row identifier.
    pub id: RecordId,
    /// Member.
    pub user: UserId,
    /// Team joined.
    pub team: TeamId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Write payload for team memberships. An absent `user` means the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserTeamsDraft {
    /// Member.
    pub user: Option<UserId>,
    /// Team joined.
    pub team: Option<TeamId>,
}

impl Entity for UserTeams {
    const KIND: EntityKind = EntityKind::UserTeams;
    type Id = RecordId;
    type Draft = UserTeamsDraft;
    type Filter = NoFilter;

    fn id(&self) -> RecordId {
        self.id
    }

    fn label(&self) -> String {
        format!("{} in team {}", self.user, self.team)
    }

    fn anchor(&self) -> Anchor {
        Anchor::Membership {
            user: self.user,
            team: self.team,
        }
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn snapshot(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("user", Some(self.user.to_string())),
            ("team", Some(self.team.to_string())),
        ]
    }
}

/// One-to-one extension of a user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    /// Row identifier.
    pub id: RecordId,
    /// Profiled user.
    pub user: UserId,
    /// Free-text role.
    pub role: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Write payload for user profiles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserProfileDraft {
    /// Free-text role. An explicit `null` clears it.
    #[serde(deserialize_with = "nullable::deserialize")]
    pub role: Option<Option<String>>,
}

impl Entity for UserProfile {
    const KIND: EntityKind = EntityKind::UserProfile;
    type Id = RecordId;
    type Draft = UserProfileDraft;
    type Filter = NoFilter;

    fn id(&self) -> RecordId {
        self.id
    }

    fn label(&self) -> String {
        format!("profile of {}", self.user)
    }

    fn anchor(&self) -> Anchor {
        Anchor::User(Some(self.user))
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn snapshot(&self) -> Vec<(&'static str, Option<String>)> {
        vec![("role", self.role.clone())]
    }
}
