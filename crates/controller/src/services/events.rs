// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use super::{ensure_organizer_or_admin, OrNotFound, Result, ServiceError, CODE_CAPACITY_BELOW_ATTENDING};
use chrono::{DateTime, Utc};
use database::DbConnection;
use db_storage::events::participants::{NewParticipant, Participant};
use db_storage::events::{Event, EventId, NewEvent, UpdateEvent};
use db_storage::users::User;
use diesel::Connection;
use std::borrow::Cow;
use validator::{ValidationError, ValidationErrors};

/// Details of a new event
#[derive(Debug)]
pub struct NewEventDetails {
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub max_participants: Option<i32>,
}

/// Changes to an existing event, None fields are kept
#[derive(Debug, Default)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<Option<String>>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub max_participants: Option<Option<i32>>,
}

/// An event with its number of attending participants
#[derive(Debug)]
pub struct EventWithAttendance {
    pub event: Event,
    pub attending_count: i64,
}

/// Creates the event together with the attending organizer participation of `organizer`
#[tracing::instrument(err, skip_all, fields(organizer = %organizer.id))]
pub fn create(
    conn: &mut DbConnection,
    organizer: &User,
    details: NewEventDetails,
    now: DateTime<Utc>,
) -> Result<EventWithAttendance> {
    validate_schedule(details.starts_at, details.ends_at, Some(now))?;

    let new_event = NewEvent {
        title: details.title,
        description: details.description,
        location: details.location,
        starts_at: details.starts_at,
        ends_at: details.ends_at,
        max_participants: details.max_participants,
        created_by: organizer.id,
    };

    let event = conn.transaction(|conn| {
        let event = new_event.insert(conn)?;

        let _organizer = NewParticipant::organizer(event.id, organizer.id).insert(conn)?;

        Ok::<_, ServiceError>(event)
    })?;

    Ok(EventWithAttendance {
        event,
        attending_count: 1,
    })
}

#[tracing::instrument(err, skip(conn))]
pub fn get(conn: &mut DbConnection, event_id: EventId) -> Result<EventWithAttendance> {
    let event = Event::get(conn, event_id).or_not_found("event")?;
    let attending_count = Participant::count_attending(conn, event_id)?;

    Ok(EventWithAttendance {
        event,
        attending_count,
    })
}

/// Returns a page of events and the total amount of events
#[tracing::instrument(err, skip(conn))]
pub fn list(
    conn: &mut DbConnection,
    per_page: i64,
    page: i64,
) -> Result<(Vec<EventWithAttendance>, i64)> {
    let (events, total) = Event::get_all_paginated(conn, per_page, page)?;

    let events = events
        .into_iter()
        .map(|event| {
            let attending_count = Participant::count_attending(conn, event.id)?;

            Ok(EventWithAttendance {
                event,
                attending_count,
            })
        })
        .collect::<Result<_>>()?;

    Ok((events, total))
}

/// Applies the changes on behalf of the organizer or an administrator
///
/// The capacity cannot be lowered below the current number of attending participants.
#[tracing::instrument(err, skip(conn, actor, changes), fields(actor = %actor.id))]
pub fn update(
    conn: &mut DbConnection,
    actor: &User,
    event_id: EventId,
    changes: EventChanges,
    now: DateTime<Utc>,
) -> Result<EventWithAttendance> {
    conn.transaction(|conn| {
        let event = Event::get_for_update(conn, event_id).or_not_found("event")?;

        ensure_organizer_or_admin(&event, actor)?;

        let starts_at = changes.starts_at.unwrap_or(event.starts_at);
        let ends_at = changes.ends_at.unwrap_or(event.ends_at);

        // Moving the event only requires the new start to lie in the future
        let must_be_after = changes.starts_at.map(|_| now);
        validate_schedule(starts_at, ends_at, must_be_after)?;

        let attending_count = Participant::count_attending(conn, event_id)?;

        if let Some(Some(max_participants)) = changes.max_participants {
            if i64::from(max_participants) < attending_count {
                return Err(ServiceError::conflict(
                    CODE_CAPACITY_BELOW_ATTENDING,
                    format!(
                        "The event already has {attending_count} attending participants, the capacity cannot be lowered to {max_participants}"
                    ),
                ));
            }
        }

        let event = UpdateEvent {
            title: changes.title,
            description: changes.description,
            location: changes.location,
            starts_at: changes.starts_at,
            ends_at: changes.ends_at,
            max_participants: changes.max_participants,
            updated_at: now,
        }
        .apply(conn, event_id)?;

        Ok(EventWithAttendance {
            event,
            attending_count,
        })
    })
}

/// Deletes the event with all of its participants, invitations and notifications
#[tracing::instrument(err, skip(conn, actor), fields(actor = %actor.id))]
pub fn delete(conn: &mut DbConnection, actor: &User, event_id: EventId) -> Result<()> {
    conn.transaction(|conn| {
        let event = Event::get_for_update(conn, event_id).or_not_found("event")?;

        ensure_organizer_or_admin(&event, actor)?;

        Event::delete_by_id(conn, event_id).or_not_found("event")
    })
}

/// Checks that the event starts before it ends and, if given, that both lie after `now`
fn validate_schedule(
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    now: Option<DateTime<Utc>>,
) -> Result<()> {
    let mut errors = ValidationErrors::new();

    if starts_at >= ends_at {
        errors.add(
            "ends_at",
            schedule_error("invalid_schedule", "The event must end after it starts"),
        );
    }

    if let Some(now) = now {
        if starts_at <= now {
            errors.add(
                "starts_at",
                schedule_error("not_in_future", "The event must start in the future"),
            );
        }

        if ends_at <= now {
            errors.add(
                "ends_at",
                schedule_error("not_in_future", "The event must end in the future"),
            );
        }
    }

    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(errors.into())
    }
}

fn schedule_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}
