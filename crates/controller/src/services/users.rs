// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use super::{OrNotFound, Result, ServiceError};
use database::DbConnection;
use db_storage::users::{UpdateUser, User, UserId, UserStatus};

/// Blocks or unblocks a user, administrators only
///
/// Blocked users keep their participations but can no longer authenticate.
#[tracing::instrument(err, skip(conn, actor), fields(actor = %actor.id))]
pub fn set_status(
    conn: &mut DbConnection,
    actor: &User,
    user_id: UserId,
    status: UserStatus,
) -> Result<User> {
    if !actor.is_admin() {
        return Err(ServiceError::Forbidden(
            "Only administrators may change the status of a user",
        ));
    }

    let user = User::get(conn, user_id).or_not_found("user")?;

    if user.status == status {
        return Ok(user);
    }

    UpdateUser {
        status: Some(status),
        ..Default::default()
    }
    .apply(conn, user_id)
    .or_not_found("user")
}
