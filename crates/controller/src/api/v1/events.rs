// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Event related API structs and Endpoints
//!
//! Events are created by their organizer, who attends the event from the start and counts
//! towards its capacity.
use super::response::{ApiError, Created, NoContent};
use super::util::deserialize_some;
use super::{ApiResponse, DefaultApiResult, PagePaginationQuery};
use crate::services::events::{self, EventChanges, EventWithAttendance, NewEventDetails};
use actix_web::web::{Data, Json, Path, Query, ReqData};
use actix_web::{delete, get, patch, post};
use chrono::{DateTime, Utc};
use database::Db;
use db_storage::events::EventId;
use db_storage::users::{User, UserId};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// An event as returned by the API
#[derive(Debug, Serialize)]
pub struct EventResource {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub max_participants: Option<i32>,
    pub attending_count: i64,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventWithAttendance> for EventResource {
    fn from(
        EventWithAttendance {
            event,
            attending_count,
        }: EventWithAttendance,
    ) -> Self {
        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            location: event.location,
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            max_participants: event.max_participants,
            attending_count,
            created_by: event.created_by,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

/// Body of the *POST /events* endpoint
#[derive(Debug, Deserialize, Validate)]
pub struct PostEventsBody {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 4096))]
    pub description: String,
    #[validate(length(min = 1, max = 255))]
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[validate(range(min = 1))]
    pub max_participants: Option<i32>,
}

/// API Endpoint *POST /events*
///
/// Creates the event with the current user as organizer.
#[post("/events")]
pub async fn new_event(
    db: Data<Db>,
    current_user: ReqData<User>,
    body: Json<PostEventsBody>,
) -> Result<Created<EventResource>, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let current_user = current_user.into_inner();

    let event = crate::block(move || {
        let mut conn = db.get_conn()?;

        let details = NewEventDetails {
            title: body.title,
            description: body.description,
            location: body.location,
            starts_at: body.starts_at,
            ends_at: body.ends_at,
            max_participants: body.max_participants,
        };

        events::create(&mut conn, &current_user, details, Utc::now())
    })
    .await??;

    Ok(Created(event.into()))
}

/// API Endpoint *GET /events*
///
/// Returns a page of events ordered by their start, see [`PagePaginationQuery`].
#[get("/events")]
pub async fn get_events(
    db: Data<Db>,
    _current_user: ReqData<User>,
    pagination: Query<PagePaginationQuery>,
) -> DefaultApiResult<Vec<EventResource>> {
    let PagePaginationQuery { per_page, page } = pagination.into_inner();

    let (events, total) = crate::block(move || {
        let mut conn = db.get_conn()?;

        events::list(&mut conn, per_page, page)
    })
    .await??;

    let events = events.into_iter().map(EventResource::from).collect();

    Ok(ApiResponse::new(events).with_page_pagination(per_page, page, total))
}

/// API Endpoint *GET /events/{event_id}*
#[get("/events/{event_id}")]
pub async fn get_event(
    db: Data<Db>,
    _current_user: ReqData<User>,
    event_id: Path<EventId>,
) -> DefaultApiResult<EventResource> {
    let event_id = event_id.into_inner();

    let event = crate::block(move || {
        let mut conn = db.get_conn()?;

        events::get(&mut conn, event_id)
    })
    .await??;

    Ok(ApiResponse::new(event.into()))
}

/// Body of the *PATCH /events/{event_id}* endpoint
///
/// Missing fields are left untouched, `null` clears the location or lifts the capacity limit.
#[derive(Debug, Deserialize, Validate)]
pub struct PatchEventBody {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(max = 4096))]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub location: Option<Option<String>>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub max_participants: Option<Option<i32>>,
}

impl PatchEventBody {
    fn is_empty(&self) -> bool {
        let PatchEventBody {
            title,
            description,
            location,
            starts_at,
            ends_at,
            max_participants,
        } = self;

        title.is_none()
            && description.is_none()
            && location.is_none()
            && starts_at.is_none()
            && ends_at.is_none()
            && max_participants.is_none()
    }

    /// Validates the nullable fields which the validator derive does not look into
    fn validate_nullable(&self) -> Result<(), ApiError> {
        let mut errors = validator::ValidationErrors::new();

        if let Some(Some(max_participants)) = self.max_participants {
            if max_participants < 1 {
                errors.add("max_participants", validator::ValidationError::new("range"));
            }
        }

        if let Some(Some(location)) = &self.location {
            if location.is_empty() || location.len() > 255 {
                errors.add("location", validator::ValidationError::new("length"));
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors.into())
        }
    }
}

/// API Endpoint *PATCH /events/{event_id}*
///
/// Only the organizer and administrators may change an event.
#[patch("/events/{event_id}")]
pub async fn patch_event(
    db: Data<Db>,
    current_user: ReqData<User>,
    event_id: Path<EventId>,
    patch: Json<PatchEventBody>,
) -> Result<Json<EventResource>, ApiError> {
    let event_id = event_id.into_inner();
    let patch = patch.into_inner();

    patch.validate()?;
    patch.validate_nullable()?;

    if patch.is_empty() {
        return Err(ApiError::bad_request()
            .with_code("empty_patch")
            .with_message("The patch does not contain any changes"));
    }

    let current_user = current_user.into_inner();

    let event = crate::block(move || {
        let mut conn = db.get_conn()?;

        let changes = EventChanges {
            title: patch.title,
            description: patch.description,
            location: patch.location,
            starts_at: patch.starts_at,
            ends_at: patch.ends_at,
            max_participants: patch.max_participants,
        };

        events::update(&mut conn, &current_user, event_id, changes, Utc::now())
    })
    .await??;

    Ok(Json(event.into()))
}

/// API Endpoint *DELETE /events/{event_id}*
///
/// Deletes the event together with its participants and invitations.
#[delete("/events/{event_id}")]
pub async fn delete_event(
    db: Data<Db>,
    current_user: ReqData<User>,
    event_id: Path<EventId>,
) -> Result<NoContent, ApiError> {
    let event_id = event_id.into_inner();
    let current_user = current_user.into_inner();

    crate::block(move || {
        let mut conn = db.get_conn()?;

        events::delete(&mut conn, &current_user, event_id)
    })
    .await??;

    Ok(NoContent)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn patch_with_null_capacity_lifts_the_limit() {
        let patch: PatchEventBody = serde_json::from_str(r#"{"max_participants":null}"#).unwrap();

        assert!(!patch.is_empty());
        assert_eq!(patch.max_participants, Some(None));
        assert!(patch.validate_nullable().is_ok());
    }

    #[test]
    fn patch_with_zero_capacity_is_invalid() {
        let patch: PatchEventBody = serde_json::from_str(r#"{"max_participants":0}"#).unwrap();

        assert!(patch.validate_nullable().is_err());
    }

    #[test]
    fn empty_patch() {
        let patch: PatchEventBody = serde_json::from_str("{}").unwrap();

        assert!(patch.is_empty());
    }

    #[test]
    fn new_event_body_validation() {
        let body: PostEventsBody = serde_json::from_str(
            r#"{
                "title": "",
                "starts_at": "2030-01-01T10:00:00Z",
                "ends_at": "2030-01-01T12:00:00Z",
                "max_participants": 0
            }"#,
        )
        .unwrap();

        let errors = body.validate().unwrap_err();
        let fields = errors.field_errors();

        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("max_participants"));
        assert_eq!(body.description, "");
    }
}
