// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use super::response::ApiError;
use super::{ApiResponse, DefaultApiResult};
use crate::services::notifications;
use actix_web::web::{Data, Json, Path, ReqData};
use actix_web::{get, post};
use chrono::{DateTime, Utc};
use database::Db;
use db_storage::events::EventId;
use db_storage::invitations::InvitationId;
use db_storage::notifications::{Notification, NotificationId, NotificationKind};
use db_storage::users::User;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct NotificationResource {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub event_id: EventId,
    pub invitation_id: Option<InvitationId>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl From<Notification> for NotificationResource {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id,
            kind: notification.kind,
            event_id: notification.event_id,
            invitation_id: notification.invitation_id,
            created_at: notification.created_at,
            read_at: notification.read_at,
        }
    }
}

/// API Endpoint *GET /users/me/notifications*
#[get("/users/me/notifications")]
pub async fn get_notifications(
    db: Data<Db>,
    current_user: ReqData<User>,
) -> DefaultApiResult<Vec<NotificationResource>> {
    let user_id = current_user.id;

    let notifications = crate::block(move || {
        let mut conn = db.get_conn()?;

        notifications::list(&mut conn, user_id)
    })
    .await??;

    Ok(ApiResponse::new(
        notifications.into_iter().map(Into::into).collect(),
    ))
}

/// API Endpoint *POST /users/me/notifications/{notification_id}/read*
#[post("/users/me/notifications/{notification_id}/read")]
pub async fn mark_read(
    db: Data<Db>,
    current_user: ReqData<User>,
    notification_id: Path<NotificationId>,
) -> Result<Json<NotificationResource>, ApiError> {
    let notification_id = notification_id.into_inner();
    let user_id = current_user.id;

    let notification = crate::block(move || {
        let mut conn = db.get_conn()?;

        notifications::mark_read(&mut conn, user_id, notification_id, Utc::now())
    })
    .await??;

    Ok(Json(notification.into()))
}
