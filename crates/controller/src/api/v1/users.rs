// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! User related API structs and Endpoints
//!
//! Users are provisioned by the identity provider, this API only exposes them.
use super::response::ApiError;
use crate::services::users;
use actix_web::web::{Data, Json, Path, ReqData};
use actix_web::{get, patch};
use chrono::{DateTime, Utc};
use database::Db;
use db_storage::users::{User, UserId, UserRole, UserStatus};
use serde::{Deserialize, Serialize};

/// Private user profile.
///
/// Is only accessible to the user himself and administrators.
#[derive(Debug, Serialize)]
pub struct PrivateUserProfile {
    pub id: UserId,
    pub login: String,
    pub display_name: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PrivateUserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            login: user.login,
            display_name: user.display_name,
            role: user.role,
            status: user.status,
            created_at: user.created_at,
        }
    }
}

/// API Endpoint *GET /users/me*
///
/// Returns the user profile of the current user
#[get("/users/me")]
pub async fn get_me(current_user: ReqData<User>) -> Json<PrivateUserProfile> {
    Json(current_user.into_inner().into())
}

/// Body of the *PATCH /users/{user_id}/status* endpoint
#[derive(Debug, Deserialize)]
pub struct PatchUserStatusBody {
    pub status: UserStatus,
}

/// API Endpoint *PATCH /users/{user_id}/status*
///
/// Blocks or unblocks a user, administrators only.
#[patch("/users/{user_id}/status")]
pub async fn patch_status(
    db: Data<Db>,
    current_user: ReqData<User>,
    user_id: Path<UserId>,
    body: Json<PatchUserStatusBody>,
) -> Result<Json<PrivateUserProfile>, ApiError> {
    let user_id = user_id.into_inner();
    let status = body.into_inner().status;
    let current_user = current_user.into_inner();

    let user = crate::block(move || {
        let mut conn = db.get_conn()?;

        users::set_status(&mut conn, &current_user, user_id, status)
    })
    .await??;

    Ok(Json(user.into()))
}
