// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Business logic behind the REST API
//!
//! Every operation takes a database connection and runs its reads and writes in one
//! transaction. Operations which admit attending participants lock the event row first,
//! see [`Event::get_for_update`].

use database::{DatabaseError, DbConnection, OptionalExt};
use db_storage::events::participants::Participant;
use db_storage::events::Event;
use db_storage::users::User;
use std::borrow::Cow;
use validator::ValidationErrors;

pub mod events;
pub mod invitations;
pub mod notifications;
pub mod participation;
pub mod users;

pub use notifications::NotificationService;

pub const CODE_ALREADY_PARTICIPANT: &str = "already_participant";
pub const CODE_CAPACITY_EXCEEDED: &str = "capacity_exceeded";
pub const CODE_CAPACITY_BELOW_ATTENDING: &str = "capacity_below_attending";
pub const CODE_ORGANIZER_IMMUTABLE: &str = "organizer_immutable";
pub const CODE_PARTICIPANT_BANNED: &str = "participant_banned";
pub const CODE_INVALID_STATE_TRANSITION: &str = "invalid_state_transition";
pub const CODE_INVITATION_EXPIRED: &str = "invitation_expired";
pub const CODE_EVENT_STARTED: &str = "event_started";

/// Errors of the service layer
///
/// Lost admission races end up as [`ServiceError::Conflict`] just like their sequential counterparts.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("The requested {0} could not be found")]
    NotFound(&'static str),
    #[error("{message}")]
    Conflict {
        code: &'static str,
        message: Cow<'static, str>,
    },
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("Validation failed, {0}")]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Database(DatabaseError),
}

impl ServiceError {
    pub fn conflict<M>(code: &'static str, message: M) -> Self
    where
        M: Into<Cow<'static, str>>,
    {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn capacity_exceeded() -> Self {
        Self::conflict(
            CODE_CAPACITY_EXCEEDED,
            "The event has reached its maximum number of participants",
        )
    }

    pub(crate) fn already_participant() -> Self {
        Self::conflict(
            CODE_ALREADY_PARTICIPANT,
            "The user already participates in the event",
        )
    }

    pub(crate) fn organizer_immutable() -> Self {
        Self::conflict(
            CODE_ORGANIZER_IMMUTABLE,
            "The participation of the organizer cannot be changed",
        )
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound => Self::NotFound("resource"),
            e => Self::Database(e),
        }
    }
}

// Required to use `?` on diesel results inside of transactions
impl From<diesel::result::Error> for ServiceError {
    fn from(e: diesel::result::Error) -> Self {
        DatabaseError::from(e).into()
    }
}

pub type Result<T, E = ServiceError> = std::result::Result<T, E>;

/// Names the missing entity of a [`DatabaseError::NotFound`]
pub(crate) trait OrNotFound<T> {
    fn or_not_found(self, entity: &'static str) -> Result<T>;
}

impl<T> OrNotFound<T> for database::Result<T> {
    fn or_not_found(self, entity: &'static str) -> Result<T> {
        self.map_err(|e| match e {
            DatabaseError::NotFound => ServiceError::NotFound(entity),
            e => ServiceError::Database(e),
        })
    }
}

/// Checks if the user may manage the event's participants and invitations
///
/// Administrators, the organizer and attending moderators are event managers.
pub(crate) fn ensure_event_manager(
    conn: &mut DbConnection,
    event: &Event,
    user: &User,
) -> Result<()> {
    if user.is_admin() || event.created_by == user.id {
        return Ok(());
    }

    match Participant::get(conn, event.id, user.id).optional()? {
        Some(participant) if participant.is_event_manager() => Ok(()),
        _ => Err(ServiceError::Forbidden(
            "Only organizers, moderators and administrators may manage this event",
        )),
    }
}

/// Checks if the user is the organizer of the event or an administrator
pub(crate) fn ensure_organizer_or_admin(event: &Event, user: &User) -> Result<()> {
    if user.is_admin() || event.created_by == user.id {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "Only the organizer and administrators may modify this event",
        ))
    }
}

/// Fails with a capacity conflict if no further attending participant fits into the event
///
/// Must be called with the event row locked.
pub(crate) fn ensure_capacity(conn: &mut DbConnection, event: &Event) -> Result<()> {
    let attending = Participant::count_attending(conn, event.id)?;

    if event.has_capacity_for_one_more(attending) {
        Ok(())
    } else {
        Err(ServiceError::capacity_exceeded())
    }
}
