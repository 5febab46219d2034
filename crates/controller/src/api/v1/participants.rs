// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Participation related API structs and Endpoints
use super::response::{ApiError, Created, NoContent};
use super::{ApiResponse, DefaultApiResult};
use crate::services::participation;
use actix_web::web::{Data, Json, Path, ReqData};
use actix_web::{delete, get, patch, post};
use chrono::{DateTime, Utc};
use database::Db;
use db_storage::events::participants::{Participant, ParticipantRole, ParticipantStatus};
use db_storage::events::EventId;
use db_storage::users::{User, UserId};
use serde::{Deserialize, Serialize};

/// A participation as returned by the API
#[derive(Debug, Serialize)]
pub struct ParticipantResource {
    pub event_id: EventId,
    pub user_id: UserId,
    pub status: ParticipantStatus,
    pub role: ParticipantRole,
    pub joined_at: DateTime<Utc>,
}

impl From<Participant> for ParticipantResource {
    fn from(participant: Participant) -> Self {
        Self {
            event_id: participant.event_id,
            user_id: participant.user_id,
            status: participant.status,
            role: participant.role,
            joined_at: participant.joined_at,
        }
    }
}

/// Entry of the participant list, includes the public profile of the user
#[derive(Debug, Serialize)]
pub struct ParticipantListEntry {
    #[serde(flatten)]
    pub participant: ParticipantResource,
    pub login: String,
    pub display_name: String,
}

/// API Endpoint *POST /events/{event_id}/participants*
///
/// Joins the event as attending participant. Answers 409 if the user already has a
/// participation or the event is full.
#[post("/events/{event_id}/participants")]
pub async fn join(
    db: Data<Db>,
    current_user: ReqData<User>,
    event_id: Path<EventId>,
) -> Result<Created<ParticipantResource>, ApiError> {
    let event_id = event_id.into_inner();
    let user_id = current_user.id;

    let participant = crate::block(move || {
        let mut conn = db.get_conn()?;

        participation::join(&mut conn, event_id, user_id)
    })
    .await??;

    Ok(Created(participant.into()))
}

/// API Endpoint *DELETE /events/{event_id}/participants/me*
#[delete("/events/{event_id}/participants/me")]
pub async fn leave(
    db: Data<Db>,
    current_user: ReqData<User>,
    event_id: Path<EventId>,
) -> Result<NoContent, ApiError> {
    let event_id = event_id.into_inner();
    let user_id = current_user.id;

    crate::block(move || {
        let mut conn = db.get_conn()?;

        participation::leave(&mut conn, event_id, user_id)
    })
    .await??;

    Ok(NoContent)
}

/// API Endpoint *GET /events/{event_id}/participants*
///
/// Lists all participations of the event regardless of their status.
#[get("/events/{event_id}/participants")]
pub async fn get_participants(
    db: Data<Db>,
    _current_user: ReqData<User>,
    event_id: Path<EventId>,
) -> DefaultApiResult<Vec<ParticipantListEntry>> {
    let event_id = event_id.into_inner();

    let participants = crate::block(move || {
        let mut conn = db.get_conn()?;

        participation::list(&mut conn, event_id)
    })
    .await??;

    let participants = participants
        .into_iter()
        .map(|(participant, user)| ParticipantListEntry {
            participant: participant.into(),
            login: user.login,
            display_name: user.display_name,
        })
        .collect();

    Ok(ApiResponse::new(participants))
}

/// Body of the *PATCH /events/{event_id}/participants/{user_id}/status* endpoint
#[derive(Debug, Deserialize)]
pub struct PatchStatusBody {
    pub status: ParticipantStatus,
}

/// API Endpoint *PATCH /events/{event_id}/participants/{user_id}/status*
///
/// Organizers, moderators and administrators may cancel, ban or readmit participants.
#[patch("/events/{event_id}/participants/{user_id}/status")]
pub async fn patch_status(
    db: Data<Db>,
    current_user: ReqData<User>,
    path: Path<(EventId, UserId)>,
    body: Json<PatchStatusBody>,
) -> Result<Json<ParticipantResource>, ApiError> {
    let (event_id, user_id) = path.into_inner();
    let status = body.into_inner().status;
    let current_user = current_user.into_inner();

    let participant = crate::block(move || {
        let mut conn = db.get_conn()?;

        participation::change_status(&mut conn, &current_user, event_id, user_id, status)
    })
    .await??;

    Ok(Json(participant.into()))
}

/// Body of the *PATCH /events/{event_id}/participants/{user_id}/role* endpoint
#[derive(Debug, Deserialize)]
pub struct PatchRoleBody {
    pub role: ParticipantRole,
}

/// API Endpoint *PATCH /events/{event_id}/participants/{user_id}/role*
#[patch("/events/{event_id}/participants/{user_id}/role")]
pub async fn patch_role(
    db: Data<Db>,
    current_user: ReqData<User>,
    path: Path<(EventId, UserId)>,
    body: Json<PatchRoleBody>,
) -> Result<Json<ParticipantResource>, ApiError> {
    let (event_id, user_id) = path.into_inner();
    let role = body.into_inner().role;
    let current_user = current_user.into_inner();

    let participant = crate::block(move || {
        let mut conn = db.get_conn()?;

        participation::change_role(&mut conn, &current_user, event_id, user_id, role)
    })
    .await??;

    Ok(Json(participant.into()))
}
