// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use crate::events::EventId;
use crate::invitations::InvitationId;
use crate::schema::notifications;
use crate::users::UserId;
use chrono::{DateTime, Utc};
use database::{DbConnection, Result};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

pub use types::core::NotificationId;

sql_enum!(
    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    NotificationKind,
    "notification_kind",
    NotificationKindType,
    {
        InvitationReceived = "invitation_received",
        InvitationAccepted = "invitation_accepted",
    }
);

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable)]
#[diesel(table_name = notifications)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: UserId,
    pub kind: NotificationKind,
    pub event_id: EventId,
    pub invitation_id: Option<InvitationId>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Returns the notifications of the recipient, unread ones first
    #[tracing::instrument(err, skip_all)]
    pub fn get_all_for_recipient(
        conn: &mut DbConnection,
        recipient: UserId,
    ) -> Result<Vec<Notification>> {
        let notifications = notifications::table
            .filter(notifications::recipient.eq(recipient))
            .order_by((
                notifications::read_at.is_not_null(),
                notifications::created_at.desc(),
            ))
            .load(conn)?;

        Ok(notifications)
    }

    /// Marks the notification of the recipient as read
    ///
    /// Marking it again keeps the time it was first read.
    #[tracing::instrument(err, skip_all)]
    pub fn mark_read(
        conn: &mut DbConnection,
        recipient: UserId,
        notification_id: NotificationId,
        now: DateTime<Utc>,
    ) -> Result<Notification> {
        let own_notification = notifications::table
            .filter(notifications::id.eq(notification_id))
            .filter(notifications::recipient.eq(recipient));

        let updated = diesel::update(own_notification.clone().filter(notifications::read_at.is_null()))
            .set(notifications::read_at.eq(now))
            .get_result(conn)
            .optional()?;

        let notification = match updated {
            Some(notification) => notification,
            None => own_notification.get_result(conn)?,
        };

        Ok(notification)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotification {
    pub recipient: UserId,
    pub kind: NotificationKind,
    pub event_id: EventId,
    pub invitation_id: Option<InvitationId>,
}

impl NewNotification {
    #[tracing::instrument(err, skip_all)]
    pub fn insert(self, conn: &mut DbConnection) -> Result<Notification> {
        let notification = diesel::insert_into(notifications::table)
            .values(self)
            .get_result(conn)?;

        Ok(notification)
    }
}
