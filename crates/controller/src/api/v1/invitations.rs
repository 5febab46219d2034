// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Invitation related API structs and Endpoints
//!
//! An invitation starts out as `sent` and ends in exactly one of `accepted`, `declined`,
//! `revoked` or `expired`.
use super::response::{ApiError, Created};
use super::{ApiResponse, DefaultApiResult};
use crate::services::{invitations, NotificationService};
use actix_web::web::{Data, Json, Path, ReqData};
use actix_web::{get, post};
use chrono::{DateTime, Utc};
use database::Db;
use db_storage::events::EventId;
use db_storage::invitations::{Invitation, InvitationId, InvitationStatus};
use db_storage::users::{User, UserId};
use serde::{Deserialize, Serialize};

/// An invitation as returned by the API
#[derive(Debug, Serialize)]
pub struct InvitationResource {
    pub id: InvitationId,
    pub event_id: EventId,
    pub invitee: UserId,
    pub created_by: UserId,
    pub status: InvitationStatus,
    pub sent_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl From<Invitation> for InvitationResource {
    fn from(invitation: Invitation) -> Self {
        Self {
            id: invitation.id,
            event_id: invitation.event_id,
            invitee: invitation.invitee,
            created_by: invitation.created_by,
            status: invitation.status,
            sent_at: invitation.sent_at,
            responded_at: invitation.responded_at,
        }
    }
}

/// Body of the *POST /invitations* endpoint
///
/// The camel case and `invited_user_id` spellings are accepted as well.
#[derive(Debug, Deserialize)]
pub struct PostInvitationBody {
    #[serde(alias = "eventId")]
    pub event_id: EventId,
    #[serde(alias = "invited_user_id", alias = "invitedUserId")]
    pub invitee: UserId,
}

/// API Endpoint *POST /invitations*
///
/// Invites a user to an event. The current user has to be allowed to manage the event.
#[post("/invitations")]
pub async fn new_invitation(
    db: Data<Db>,
    notifications: Data<NotificationService>,
    current_user: ReqData<User>,
    body: Json<PostInvitationBody>,
) -> Result<Created<InvitationResource>, ApiError> {
    let PostInvitationBody { event_id, invitee } = body.into_inner();
    let current_user = current_user.into_inner();

    let invitation = crate::block(move || {
        let mut conn = db.get_conn()?;

        invitations::create(
            &mut conn,
            &notifications,
            &current_user,
            event_id,
            invitee,
            Utc::now(),
        )
    })
    .await??;

    Ok(Created(invitation.into()))
}

/// API Endpoint *GET /invitations*
///
/// Lists the invitations the current user received.
#[get("/invitations")]
pub async fn get_invitations(
    db: Data<Db>,
    current_user: ReqData<User>,
) -> DefaultApiResult<Vec<InvitationResource>> {
    let current_user = current_user.into_inner();

    let invitations = crate::block(move || {
        let mut conn = db.get_conn()?;

        invitations::list_received(&mut conn, &current_user)
    })
    .await??;

    Ok(ApiResponse::new(
        invitations.into_iter().map(Into::into).collect(),
    ))
}

/// API Endpoint *GET /events/{event_id}/invitations*
#[get("/events/{event_id}/invitations")]
pub async fn get_event_invitations(
    db: Data<Db>,
    current_user: ReqData<User>,
    event_id: Path<EventId>,
) -> DefaultApiResult<Vec<InvitationResource>> {
    let event_id = event_id.into_inner();
    let current_user = current_user.into_inner();

    let invitations = crate::block(move || {
        let mut conn = db.get_conn()?;

        invitations::list_for_event(&mut conn, &current_user, event_id)
    })
    .await??;

    Ok(ApiResponse::new(
        invitations.into_iter().map(Into::into).collect(),
    ))
}

/// API Endpoint *POST /invitations/{invitation_id}/accept*
///
/// Accepts the invitation and joins the event in one step.
#[post("/invitations/{invitation_id}/accept")]
pub async fn accept(
    db: Data<Db>,
    notifications: Data<NotificationService>,
    current_user: ReqData<User>,
    invitation_id: Path<InvitationId>,
) -> Result<Json<InvitationResource>, ApiError> {
    let invitation_id = invitation_id.into_inner();
    let current_user = current_user.into_inner();

    let invitation = crate::block(move || {
        let mut conn = db.get_conn()?;

        invitations::accept(
            &mut conn,
            &notifications,
            &current_user,
            invitation_id,
            Utc::now(),
        )
    })
    .await??;

    Ok(Json(invitation.into()))
}

/// API Endpoint *POST /invitations/{invitation_id}/decline*
#[post("/invitations/{invitation_id}/decline")]
pub async fn decline(
    db: Data<Db>,
    current_user: ReqData<User>,
    invitation_id: Path<InvitationId>,
) -> Result<Json<InvitationResource>, ApiError> {
    let invitation_id = invitation_id.into_inner();
    let current_user = current_user.into_inner();

    let invitation = crate::block(move || {
        let mut conn = db.get_conn()?;

        invitations::decline(&mut conn, &current_user, invitation_id, Utc::now())
    })
    .await??;

    Ok(Json(invitation.into()))
}

/// API Endpoint *POST /invitations/{invitation_id}/revoke*
///
/// Allowed for the inviter, the organizer of the event and administrators.
#[post("/invitations/{invitation_id}/revoke")]
pub async fn revoke(
    db: Data<Db>,
    current_user: ReqData<User>,
    invitation_id: Path<InvitationId>,
) -> Result<Json<InvitationResource>, ApiError> {
    let invitation_id = invitation_id.into_inner();
    let current_user = current_user.into_inner();

    let invitation = crate::block(move || {
        let mut conn = db.get_conn()?;

        invitations::revoke(&mut conn, &current_user, invitation_id, Utc::now())
    })
    .await??;

    Ok(Json(invitation.into()))
}
