// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Joining, leaving and moderating the participants of an event
use super::{
    ensure_capacity, ensure_event_manager, ensure_organizer_or_admin, OrNotFound, Result,
    ServiceError, CODE_PARTICIPANT_BANNED,
};
use database::{DbConnection, OptionalExt};
use db_storage::events::participants::{
    NewParticipant, Participant, ParticipantRole, ParticipantStatus, UpdateParticipant,
};
use db_storage::events::{Event, EventId};
use db_storage::users::{User, UserId};
use diesel::Connection;

/// Admits the user as attending participant of the event
///
/// The capacity check and the insert happen while holding the lock on the event row,
/// concurrent joins of the same event are processed one after another.
#[tracing::instrument(err, skip(conn))]
pub fn join(conn: &mut DbConnection, event_id: EventId, user_id: UserId) -> Result<Participant> {
    conn.transaction(|conn| {
        let event = Event::get_for_update(conn, event_id).or_not_found("event")?;

        admit(conn, &event, user_id)
    })
}

/// Inserts the attending participant, the event row must be locked by the caller
fn admit(conn: &mut DbConnection, event: &Event, user_id: UserId) -> Result<Participant> {
    if Participant::get(conn, event.id, user_id)
        .optional()?
        .is_some()
    {
        return Err(ServiceError::already_participant());
    }

    ensure_capacity(conn, event)?;

    // The primary key catches duplicates which slipped past the check above
    NewParticipant::attending(event.id, user_id)
        .try_insert(conn)?
        .ok_or_else(ServiceError::already_participant)
}

/// Makes the user an attending participant, taking an existing participation into account
///
/// Attending participants stay untouched, cancelled ones are readmitted if the event has a free
/// seat and banned ones are rejected. The event row must be locked by the caller.
pub(crate) fn readmit(
    conn: &mut DbConnection,
    event: &Event,
    user_id: UserId,
) -> Result<Participant> {
    let Some(participant) = Participant::get(conn, event.id, user_id).optional()? else {
        return admit(conn, event, user_id);
    };

    match participant.status {
        ParticipantStatus::Attending => Ok(participant),
        ParticipantStatus::Banned => Err(banned()),
        ParticipantStatus::Cancelled => {
            ensure_capacity(conn, event)?;

            let participant = UpdateParticipant {
                status: Some(ParticipantStatus::Attending),
                role: None,
            }
            .apply(conn, event.id, user_id)?;

            Ok(participant)
        }
    }
}

fn banned() -> ServiceError {
    ServiceError::conflict(CODE_PARTICIPANT_BANNED, "The user is banned from the event")
}

/// Removes the participation of the user
///
/// The row is deleted, so the user may join again later. Organizers cannot leave
/// their event and banned participants cannot leave to get rid of the ban.
#[tracing::instrument(err, skip(conn))]
pub fn leave(conn: &mut DbConnection, event_id: EventId, user_id: UserId) -> Result<()> {
    conn.transaction(|conn| {
        let participant = Participant::get(conn, event_id, user_id).or_not_found("participant")?;

        if participant.is_organizer() {
            return Err(ServiceError::organizer_immutable());
        }

        if participant.status == ParticipantStatus::Banned {
            return Err(ServiceError::conflict(
                CODE_PARTICIPANT_BANNED,
                "Banned participants cannot leave the event",
            ));
        }

        Participant::delete(conn, event_id, user_id).or_not_found("participant")
    })
}

/// Changes the status of a participant on behalf of an event manager
///
/// Any status may change into any other one. Turning a participant back into an attending
/// one is subject to the capacity of the event.
#[tracing::instrument(err, skip(conn, actor), fields(actor = %actor.id))]
pub fn change_status(
    conn: &mut DbConnection,
    actor: &User,
    event_id: EventId,
    user_id: UserId,
    status: ParticipantStatus,
) -> Result<Participant> {
    conn.transaction(|conn| {
        let event = Event::get_for_update(conn, event_id).or_not_found("event")?;

        ensure_event_manager(conn, &event, actor)?;

        let participant = Participant::get(conn, event_id, user_id).or_not_found("participant")?;

        if participant.is_organizer() {
            return Err(ServiceError::organizer_immutable());
        }

        if participant.status == status {
            return Ok(participant);
        }

        if status == ParticipantStatus::Attending {
            ensure_capacity(conn, &event)?;
        }

        let participant = UpdateParticipant {
            status: Some(status),
            role: None,
        }
        .apply(conn, event_id, user_id)?;

        Ok(participant)
    })
}

/// Promotes a participant to moderator or demotes a moderator
///
/// Only the organizer or an administrator may do so. The organizer role can be neither granted nor taken.
#[tracing::instrument(err, skip(conn, actor), fields(actor = %actor.id))]
pub fn change_role(
    conn: &mut DbConnection,
    actor: &User,
    event_id: EventId,
    user_id: UserId,
    role: ParticipantRole,
) -> Result<Participant> {
    conn.transaction(|conn| {
        let event = Event::get(conn, event_id).or_not_found("event")?;

        ensure_organizer_or_admin(&event, actor)?;

        let participant = Participant::get(conn, event_id, user_id).or_not_found("participant")?;

        if participant.is_organizer() || role == ParticipantRole::Organizer {
            return Err(ServiceError::organizer_immutable());
        }

        let participant = UpdateParticipant {
            status: None,
            role: Some(role),
        }
        .apply(conn, event_id, user_id)?;

        Ok(participant)
    })
}

/// Number of attending participants of the event
#[tracing::instrument(err, skip(conn))]
pub fn count_attending(conn: &mut DbConnection, event_id: EventId) -> Result<i64> {
    let event = Event::get(conn, event_id).or_not_found("event")?;

    Ok(Participant::count_attending(conn, event.id)?)
}

/// All participants of the event regardless of their status
#[tracing::instrument(err, skip(conn))]
pub fn list(conn: &mut DbConnection, event_id: EventId) -> Result<Vec<(Participant, User)>> {
    let event = Event::get(conn, event_id).or_not_found("event")?;

    Ok(Participant::get_all_for_event_with_users(conn, event.id)?)
}
