// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! NotificationService
//!
//! Records notifications for users. Emitting them is best effort and happens after the
//! triggering transaction committed, a failure is logged and never undoes the trigger.
use super::{OrNotFound, Result};
use chrono::{DateTime, Utc};
use database::{Db, DbConnection};
use db_storage::invitations::Invitation;
use db_storage::notifications::{NewNotification, Notification, NotificationId, NotificationKind};
use db_storage::users::UserId;
use std::sync::Arc;

#[derive(Clone)]
pub struct NotificationService {
    db: Arc<Db>,
}

impl NotificationService {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }

    /// Tells the invitee about a new invitation
    pub fn notify_invitation_received(&self, invitation: &Invitation) {
        self.emit(NewNotification {
            recipient: invitation.invitee,
            kind: NotificationKind::InvitationReceived,
            event_id: invitation.event_id,
            invitation_id: Some(invitation.id),
        })
    }

    /// Tells the inviter that the invitation was accepted
    pub fn notify_invitation_accepted(&self, invitation: &Invitation) {
        self.emit(NewNotification {
            recipient: invitation.created_by,
            kind: NotificationKind::InvitationAccepted,
            event_id: invitation.event_id,
            invitation_id: Some(invitation.id),
        })
    }

    fn emit(&self, notification: NewNotification) {
        let kind = notification.kind;
        let recipient = notification.recipient;

        let result = self
            .db
            .get_conn()
            .and_then(|mut conn| notification.insert(&mut conn));

        if let Err(e) = result {
            log::warn!(
                "Failed to emit {} notification for user {}, {}",
                kind,
                recipient,
                e
            );
        }
    }
}

/// The notifications of the user, unread ones first
#[tracing::instrument(err, skip(conn))]
pub fn list(conn: &mut DbConnection, recipient: UserId) -> Result<Vec<Notification>> {
    Ok(Notification::get_all_for_recipient(conn, recipient)?)
}

/// Marks one of the user's notifications as read
#[tracing::instrument(err, skip(conn))]
pub fn mark_read(
    conn: &mut DbConnection,
    recipient: UserId,
    notification_id: NotificationId,
    now: DateTime<Utc>,
) -> Result<Notification> {
    Notification::mark_read(conn, recipient, notification_id, now).or_not_found("notification")
}
