// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Invitations of users to events
//!
//! Every invitation starts out as [`InvitationStatus::Sent`] and moves at most once
//! into one of the terminal states.

use crate::events::{Event, EventId};
use crate::schema::{events, invitations};
use crate::users::UserId;
use chrono::{DateTime, Utc};
use database::{DbConnection, Result};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

pub use types::core::InvitationId;

sql_enum!(
    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    InvitationStatus,
    "invitation_status",
    InvitationStatusType,
    {
        Sent = "sent",
        Accepted = "accepted",
        Declined = "declined",
        Revoked = "revoked",
        Expired = "expired",
    }
);

impl InvitationStatus {
    pub fn is_terminal(&self) -> bool {
        *self != Self::Sent
    }

    /// Only sent invitations can change their status, and only into a terminal one
    pub fn can_transition_to(&self, next: InvitationStatus) -> bool {
        !self.is_terminal() && next.is_terminal()
    }

    /// Returns true for the statuses which record the time of the invitee's response
    pub fn is_response(&self) -> bool {
        matches!(self, Self::Accepted | Self::Declined)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Associations)]
#[diesel(table_name = invitations)]
#[diesel(belongs_to(Event, foreign_key = event_id))]
pub struct Invitation {
    pub id: InvitationId,
    pub event_id: EventId,
    pub invitee: UserId,
    pub created_by: UserId,
    pub status: InvitationStatus,
    pub sent_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl Invitation {
    #[tracing::instrument(err, skip_all)]
    pub fn get(conn: &mut DbConnection, invitation_id: InvitationId) -> Result<Invitation> {
        let invitation = invitations::table
            .filter(invitations::id.eq(invitation_id))
            .get_result(conn)?;

        Ok(invitation)
    }

    /// Get the invitation and lock its row until the surrounding transaction ends
    ///
    /// When the event row is locked as well, the event must be locked first.
    #[tracing::instrument(err, skip_all)]
    pub fn get_for_update(conn: &mut DbConnection, invitation_id: InvitationId) -> Result<Invitation> {
        let invitation = invitations::table
            .filter(invitations::id.eq(invitation_id))
            .for_update()
            .get_result(conn)?;

        Ok(invitation)
    }

    /// Returns all invitations the user received, most recent first
    #[tracing::instrument(err, skip_all)]
    pub fn get_all_for_invitee(conn: &mut DbConnection, invitee: UserId) -> Result<Vec<Invitation>> {
        let invitations = invitations::table
            .filter(invitations::invitee.eq(invitee))
            .order_by((invitations::sent_at.desc(), invitations::id.asc()))
            .load(conn)?;

        Ok(invitations)
    }

    /// Returns all invitations of the event, most recent first
    #[tracing::instrument(err, skip_all)]
    pub fn get_all_for_event(conn: &mut DbConnection, event_id: EventId) -> Result<Vec<Invitation>> {
        let invitations = invitations::table
            .filter(invitations::event_id.eq(event_id))
            .order_by((invitations::sent_at.desc(), invitations::id.asc()))
            .load(conn)?;

        Ok(invitations)
    }

    /// Moves every sent invitation whose event has started before `now` into the expired state
    ///
    /// Returns the number of expired invitations.
    #[tracing::instrument(err, skip_all)]
    pub fn expire_stale(conn: &mut DbConnection, now: DateTime<Utc>) -> Result<usize> {
        let started_events = events::table
            .filter(events::starts_at.le(now))
            .select(events::id);

        let expired = diesel::update(
            invitations::table
                .filter(invitations::status.eq(InvitationStatus::Sent))
                .filter(invitations::event_id.eq_any(started_events)),
        )
        .set(invitations::status.eq(InvitationStatus::Expired))
        .execute(conn)?;

        Ok(expired)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = invitations)]
pub struct NewInvitation {
    pub event_id: EventId,
    pub invitee: UserId,
    pub created_by: UserId,
}

impl NewInvitation {
    /// Inserts the invitation in the sent state
    #[tracing::instrument(err, skip_all)]
    pub fn insert(self, conn: &mut DbConnection) -> Result<Invitation> {
        let invitation = diesel::insert_into(invitations::table)
            .values((self, invitations::status.eq(InvitationStatus::Sent)))
            .get_result(conn)?;

        Ok(invitation)
    }
}

/// Terminal status change of a sent invitation
#[derive(Debug, AsChangeset)]
#[diesel(table_name = invitations)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateInvitation {
    pub status: InvitationStatus,
    pub responded_at: Option<DateTime<Utc>>,
}

impl UpdateInvitation {
    /// Creates the change into `status`, the response time is only recorded for
    /// accepted and declined invitations
    pub fn transition(status: InvitationStatus, now: DateTime<Utc>) -> Self {
        Self {
            status,
            responded_at: status.is_response().then_some(now),
        }
    }

    /// Applies the change if the invitation is still sent
    ///
    /// Returns None if the invitation does not exist or already left the sent state.
    #[tracing::instrument(err, skip_all)]
    pub fn apply_if_sent(
        self,
        conn: &mut DbConnection,
        invitation_id: InvitationId,
    ) -> Result<Option<Invitation>> {
        let query = diesel::update(
            invitations::table
                .filter(invitations::id.eq(invitation_id))
                .filter(invitations::status.eq(InvitationStatus::Sent)),
        )
        .set(self);

        let invitation = query.get_result(conn).optional()?;

        Ok(invitation)
    }
}
