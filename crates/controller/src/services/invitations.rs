// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Invitation lifecycle
//!
//! ```text
//!          ┌──> accepted
//!          ├──> declined
//! sent ────┼──> revoked
//!          └──> expired
//! ```
//!
//! Accepting admits the invitee as participant in the same transaction.
use super::participation::readmit;
use super::{
    ensure_event_manager, NotificationService, OrNotFound, Result, ServiceError,
    CODE_EVENT_STARTED, CODE_INVALID_STATE_TRANSITION, CODE_INVITATION_EXPIRED,
};
use chrono::{DateTime, Utc};
use database::DbConnection;
use db_storage::events::{Event, EventId};
use db_storage::invitations::{
    Invitation, InvitationId, InvitationStatus, NewInvitation, UpdateInvitation,
};
use db_storage::users::{User, UserId};
use diesel::Connection;

/// Invites `invitee` to the event on behalf of `inviter`
///
/// The inviter has to be allowed to manage the event. Inviting the same user multiple
/// times is allowed, each call creates a new invitation.
#[tracing::instrument(err, skip(conn, inviter, notifications), fields(inviter = %inviter.id))]
pub fn create(
    conn: &mut DbConnection,
    notifications: &NotificationService,
    inviter: &User,
    event_id: EventId,
    invitee: UserId,
    now: DateTime<Utc>,
) -> Result<Invitation> {
    let invitation = conn.transaction(|conn| {
        let event = Event::get(conn, event_id).or_not_found("event")?;

        ensure_event_manager(conn, &event, inviter)?;

        let invitee = User::get(conn, invitee).or_not_found("user")?;

        if event.has_started(now) {
            return Err(ServiceError::conflict(
                CODE_EVENT_STARTED,
                "Invitations to events which already started cannot be sent",
            ));
        }

        let invitation = NewInvitation {
            event_id,
            invitee: invitee.id,
            created_by: inviter.id,
        }
        .insert(conn)?;

        Ok::<_, ServiceError>(invitation)
    })?;

    notifications.notify_invitation_received(&invitation);

    Ok(invitation)
}

enum Acceptance {
    Accepted(Invitation),
    Expired,
}

/// Accepts the invitation and admits the invitee as attending participant
///
/// Both writes share one transaction. If the event is full, nothing is written and the
/// invitation stays sent. Cancelled invitees are readmitted while banned ones are rejected.
/// Invitations of events which already started expire instead.
#[tracing::instrument(err, skip(conn, user, notifications), fields(user = %user.id))]
pub fn accept(
    conn: &mut DbConnection,
    notifications: &NotificationService,
    user: &User,
    invitation_id: InvitationId,
    now: DateTime<Utc>,
) -> Result<Invitation> {
    let acceptance = conn.transaction(|conn| {
        let invitation = Invitation::get(conn, invitation_id).or_not_found("invitation")?;

        ensure_invitee(&invitation, user)?;

        // Lock order is event before invitation
        let event = Event::get_for_update(conn, invitation.event_id).or_not_found("event")?;
        let invitation = Invitation::get_for_update(conn, invitation_id).or_not_found("invitation")?;

        ensure_transition(&invitation, InvitationStatus::Accepted)?;

        if event.has_started(now) {
            let _expired = UpdateInvitation::transition(InvitationStatus::Expired, now)
                .apply_if_sent(conn, invitation_id)?;

            return Ok(Acceptance::Expired);
        }

        let _participant = readmit(conn, &event, user.id)?;

        let invitation = UpdateInvitation::transition(InvitationStatus::Accepted, now)
            .apply_if_sent(conn, invitation_id)?
            .ok_or_else(|| only_sent(InvitationStatus::Accepted))?;

        Ok::<_, ServiceError>(Acceptance::Accepted(invitation))
    })?;

    match acceptance {
        Acceptance::Accepted(invitation) => {
            notifications.notify_invitation_accepted(&invitation);

            Ok(invitation)
        }
        Acceptance::Expired => Err(ServiceError::conflict(
            CODE_INVITATION_EXPIRED,
            "The event already started, the invitation expired",
        )),
    }
}

/// Declines the invitation on behalf of the invitee
#[tracing::instrument(err, skip(conn, user), fields(user = %user.id))]
pub fn decline(
    conn: &mut DbConnection,
    user: &User,
    invitation_id: InvitationId,
    now: DateTime<Utc>,
) -> Result<Invitation> {
    let invitation = Invitation::get(conn, invitation_id).or_not_found("invitation")?;

    ensure_invitee(&invitation, user)?;
    ensure_transition(&invitation, InvitationStatus::Declined)?;

    UpdateInvitation::transition(InvitationStatus::Declined, now)
        .apply_if_sent(conn, invitation_id)?
        .ok_or_else(|| only_sent(InvitationStatus::Declined))
}

/// Revokes the invitation
///
/// Allowed for the inviter, the organizer of the event and administrators.
#[tracing::instrument(err, skip(conn, user), fields(user = %user.id))]
pub fn revoke(
    conn: &mut DbConnection,
    user: &User,
    invitation_id: InvitationId,
    now: DateTime<Utc>,
) -> Result<Invitation> {
    let invitation = Invitation::get(conn, invitation_id).or_not_found("invitation")?;

    if invitation.created_by != user.id && !user.is_admin() {
        let event = Event::get(conn, invitation.event_id).or_not_found("event")?;

        if event.created_by != user.id {
            return Err(ServiceError::Forbidden(
                "Only the inviter, the organizer and administrators may revoke an invitation",
            ));
        }
    }

    ensure_transition(&invitation, InvitationStatus::Revoked)?;

    UpdateInvitation::transition(InvitationStatus::Revoked, now)
        .apply_if_sent(conn, invitation_id)?
        .ok_or_else(|| only_sent(InvitationStatus::Revoked))
}

/// Invitations the user received
#[tracing::instrument(err, skip(conn, user), fields(user = %user.id))]
pub fn list_received(conn: &mut DbConnection, user: &User) -> Result<Vec<Invitation>> {
    Ok(Invitation::get_all_for_invitee(conn, user.id)?)
}

/// Invitations of the event, visible to its managers
#[tracing::instrument(err, skip(conn, user), fields(user = %user.id))]
pub fn list_for_event(
    conn: &mut DbConnection,
    user: &User,
    event_id: EventId,
) -> Result<Vec<Invitation>> {
    let event = Event::get(conn, event_id).or_not_found("event")?;

    ensure_event_manager(conn, &event, user)?;

    Ok(Invitation::get_all_for_event(conn, event_id)?)
}

/// Expires every sent invitation of events which started before `now`
#[tracing::instrument(err, skip(conn))]
pub fn expire_stale(conn: &mut DbConnection, now: DateTime<Utc>) -> Result<usize> {
    let expired = Invitation::expire_stale(conn, now)?;

    log::info!("Expired {} stale invitation(s)", expired);

    Ok(expired)
}

fn ensure_invitee(invitation: &Invitation, user: &User) -> Result<()> {
    if invitation.invitee == user.id {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "Only the invited user may respond to an invitation",
        ))
    }
}

fn ensure_transition(invitation: &Invitation, next: InvitationStatus) -> Result<()> {
    if invitation.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(only_sent(next))
    }
}

fn only_sent(target: InvitationStatus) -> ServiceError {
    ServiceError::conflict(
        CODE_INVALID_STATE_TRANSITION,
        format!("Only sent invitations can be {target}"),
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn revoke_conflict_message() {
        let ServiceError::Conflict { code, message } = only_sent(InvitationStatus::Revoked) else {
            panic!("expected conflict");
        };

        assert_eq!(code, CODE_INVALID_STATE_TRANSITION);
        assert_eq!(message, "Only sent invitations can be revoked");
    }

    #[test]
    fn responses_require_a_sent_invitation() {
        let invitation = |status| Invitation {
            id: InvitationId::from(uuid::Uuid::nil()),
            event_id: EventId::from(uuid::Uuid::nil()),
            invitee: UserId::from(uuid::Uuid::nil()),
            created_by: UserId::from(uuid::Uuid::nil()),
            status,
            sent_at: Utc::now(),
            responded_at: None,
        };

        assert!(
            ensure_transition(&invitation(InvitationStatus::Sent), InvitationStatus::Accepted)
                .is_ok()
        );

        let result = ensure_transition(
            &invitation(InvitationStatus::Declined),
            InvitationStatus::Accepted,
        );
        let Err(ServiceError::Conflict { message, .. }) = &result else {
            panic!("expected conflict, got {result:?}");
        };
        assert_eq!(message, "Only sent invitations can be accepted");

        assert!(
            ensure_transition(&invitation(InvitationStatus::Revoked), InvitationStatus::Revoked)
                .is_err()
        );
    }
}
