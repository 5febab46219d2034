// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Participation records of users in events
//!
//! A participant is identified by the `(event_id, user_id)` pair, the primary key of the
//! table guarantees at most one record per pair.

use super::{Event, EventId};
use crate::schema::{participants, users};
use crate::users::{User, UserId};
use chrono::{DateTime, Utc};
use database::{DatabaseError, DbConnection, Result};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

sql_enum!(
    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    ParticipantStatus,
    "participant_status",
    ParticipantStatusType,
    {
        Attending = "attending",
        Cancelled = "cancelled",
        Banned = "banned",
    }
);

sql_enum!(
    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    ParticipantRole,
    "participant_role",
    ParticipantRoleType,
    {
        Organizer = "organizer",
        Moderator = "moderator",
        Participant = "participant",
    }
);

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Associations)]
#[diesel(table_name = participants)]
#[diesel(primary_key(event_id, user_id))]
#[diesel(belongs_to(Event, foreign_key = event_id))]
#[diesel(belongs_to(User, foreign_key = user_id))]
pub struct Participant {
    pub event_id: EventId,
    pub user_id: UserId,
    pub status: ParticipantStatus,
    pub role: ParticipantRole,
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    pub fn is_attending(&self) -> bool {
        self.status == ParticipantStatus::Attending
    }

    pub fn is_organizer(&self) -> bool {
        self.role == ParticipantRole::Organizer
    }

    /// Organizers and attending moderators may manage the event's participants and invitations
    pub fn is_event_manager(&self) -> bool {
        match self.role {
            ParticipantRole::Organizer => true,
            ParticipantRole::Moderator => self.is_attending(),
            ParticipantRole::Participant => false,
        }
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get(conn: &mut DbConnection, event_id: EventId, user_id: UserId) -> Result<Participant> {
        let participant = participants::table
            .filter(participants::event_id.eq(event_id))
            .filter(participants::user_id.eq(user_id))
            .get_result(conn)?;

        Ok(participant)
    }

    /// Counts the attending participants of the event
    ///
    /// Cancelled and banned participants are neither counted against the capacity nor displayed.
    #[tracing::instrument(err, skip_all)]
    pub fn count_attending(conn: &mut DbConnection, event_id: EventId) -> Result<i64> {
        let count = participants::table
            .filter(participants::event_id.eq(event_id))
            .filter(participants::status.eq(ParticipantStatus::Attending))
            .count()
            .get_result(conn)?;

        Ok(count)
    }

    /// Returns all participants of the event with their user, ordered by the time they joined
    #[tracing::instrument(err, skip_all)]
    pub fn get_all_for_event_with_users(
        conn: &mut DbConnection,
        event_id: EventId,
    ) -> Result<Vec<(Participant, User)>> {
        let participants = participants::table
            .inner_join(users::table)
            .filter(participants::event_id.eq(event_id))
            .order_by((participants::joined_at.asc(), participants::user_id.asc()))
            .load(conn)?;

        Ok(participants)
    }

    /// Removes the participation record, fails with [`DatabaseError::NotFound`] if there is none
    #[tracing::instrument(err, skip_all)]
    pub fn delete(conn: &mut DbConnection, event_id: EventId, user_id: UserId) -> Result<()> {
        let deleted = diesel::delete(
            participants::table
                .filter(participants::event_id.eq(event_id))
                .filter(participants::user_id.eq(user_id)),
        )
        .execute(conn)?;

        if deleted == 0 {
            return Err(DatabaseError::NotFound);
        }

        Ok(())
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = participants)]
pub struct NewParticipant {
    pub event_id: EventId,
    pub user_id: UserId,
    pub status: ParticipantStatus,
    pub role: ParticipantRole,
}

impl NewParticipant {
    /// Creates an attending participant with the participant role
    pub fn attending(event_id: EventId, user_id: UserId) -> Self {
        Self {
            event_id,
            user_id,
            status: ParticipantStatus::Attending,
            role: ParticipantRole::Participant,
        }
    }

    /// Creates the attending organizer record of a freshly created event
    pub fn organizer(event_id: EventId, user_id: UserId) -> Self {
        Self {
            event_id,
            user_id,
            status: ParticipantStatus::Attending,
            role: ParticipantRole::Organizer,
        }
    }

    #[tracing::instrument(err, skip_all)]
    pub fn insert(self, conn: &mut DbConnection) -> Result<Participant> {
        let participant = diesel::insert_into(participants::table)
            .values(self)
            .get_result(conn)?;

        Ok(participant)
    }

    /// Tries to insert the participant into the database
    ///
    /// When yielding a unique key violation, None is returned.
    #[tracing::instrument(err, skip_all)]
    pub fn try_insert(self, conn: &mut DbConnection) -> Result<Option<Participant>> {
        let result = diesel::insert_into(participants::table)
            .values(self)
            .get_result(conn);

        match result {
            Ok(participant) => Ok(Some(participant)),
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                ..,
            )) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Changes to a participant, None fields are left untouched
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = participants)]
pub struct UpdateParticipant {
    pub status: Option<ParticipantStatus>,
    pub role: Option<ParticipantRole>,
}

impl UpdateParticipant {
    #[tracing::instrument(err, skip_all)]
    pub fn apply(
        self,
        conn: &mut DbConnection,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<Participant> {
        let query = diesel::update(
            participants::table
                .filter(participants::event_id.eq(event_id))
                .filter(participants::user_id.eq(user_id)),
        )
        .set(self);

        let participant = query.get_result(conn)?;

        Ok(participant)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn participant(role: ParticipantRole, status: ParticipantStatus) -> Participant {
        Participant {
            event_id: EventId::from(uuid::Uuid::nil()),
            user_id: UserId::from(uuid::Uuid::nil()),
            status,
            role,
            joined_at: Utc::now(),
        }
    }

    #[test]
    fn event_managers() {
        use ParticipantStatus::*;

        assert!(participant(ParticipantRole::Organizer, Attending).is_event_manager());
        assert!(participant(ParticipantRole::Moderator, Attending).is_event_manager());
        assert!(!participant(ParticipantRole::Moderator, Banned).is_event_manager());
        assert!(!participant(ParticipantRole::Moderator, Cancelled).is_event_manager());
        assert!(!participant(ParticipantRole::Participant, Attending).is_event_manager());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&ParticipantStatus::Cancelled).unwrap();
        assert_eq!(json, r#""cancelled""#);
    }
}
