// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use crate::schema::{events, users};
use crate::users::User;
use chrono::{DateTime, Utc};
use database::{DatabaseError, DbConnection, Paginate, Result};
use diesel::prelude::*;

pub use types::core::{EventId, UserId};

pub mod participants;

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Associations)]
#[diesel(table_name = events)]
#[diesel(belongs_to(User, foreign_key = created_by))]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,

    /// Upper bound of attending participants, the organizer included.
    /// `None` means unlimited.
    pub max_participants: Option<i32>,

    /// The organizer, never changes after creation
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Returns true if another attending participant fits into the event
    /// given the current amount of attending participants
    pub fn has_capacity_for_one_more(&self, attending: i64) -> bool {
        match self.max_participants {
            Some(max) => attending < i64::from(max),
            None => true,
        }
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get(conn: &mut DbConnection, event_id: EventId) -> Result<Event> {
        let event = events::table
            .filter(events::id.eq(event_id))
            .get_result(conn)?;

        Ok(event)
    }

    /// Get the event and lock its row until the surrounding transaction ends
    ///
    /// Every operation that admits attending participants takes this lock first,
    /// which serializes admissions per event across all connections.
    #[tracing::instrument(err, skip_all)]
    pub fn get_for_update(conn: &mut DbConnection, event_id: EventId) -> Result<Event> {
        let event = events::table
            .filter(events::id.eq(event_id))
            .for_update()
            .get_result(conn)?;

        Ok(event)
    }

    /// Returns the requested page of events ordered by their start and the total amount of events
    #[tracing::instrument(err, skip_all)]
    pub fn get_all_paginated(
        conn: &mut DbConnection,
        per_page: i64,
        page: i64,
    ) -> Result<(Vec<Event>, i64)> {
        let query = events::table
            .order_by((events::starts_at.asc(), events::id.asc()))
            .paginate_by(per_page, page);

        let events_with_total = query.load_and_count::<Event, _>(conn)?;

        Ok(events_with_total)
    }

    /// Get the event together with its organizer
    #[tracing::instrument(err, skip_all)]
    pub fn get_with_organizer(conn: &mut DbConnection, event_id: EventId) -> Result<(Event, User)> {
        let event_with_organizer = events::table
            .inner_join(users::table)
            .filter(events::id.eq(event_id))
            .get_result(conn)?;

        Ok(event_with_organizer)
    }

    /// Deletes the event, its participants, invitations and notifications are removed with it
    #[tracing::instrument(err, skip_all)]
    pub fn delete_by_id(conn: &mut DbConnection, event_id: EventId) -> Result<()> {
        let deleted = diesel::delete(events::table.filter(events::id.eq(event_id))).execute(conn)?;

        if deleted == 0 {
            return Err(DatabaseError::NotFound);
        }

        Ok(())
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = events)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub max_participants: Option<i32>,
    pub created_by: UserId,
}

impl NewEvent {
    #[tracing::instrument(err, skip_all)]
    pub fn insert(self, conn: &mut DbConnection) -> Result<Event> {
        let event = diesel::insert_into(events::table)
            .values(self)
            .get_result(conn)?;

        Ok(event)
    }
}

/// Changes to an event, None fields are left untouched
///
/// The nested options of nullable columns allow resetting them to NULL.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = events)]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<Option<String>>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub max_participants: Option<Option<i32>>,
    pub updated_at: DateTime<Utc>,
}

impl UpdateEvent {
    #[tracing::instrument(err, skip_all)]
    pub fn apply(self, conn: &mut DbConnection, event_id: EventId) -> Result<Event> {
        let event = diesel::update(events::table.filter(events::id.eq(event_id)))
            .set(self)
            .get_result(conn)?;

        Ok(event)
    }
}
