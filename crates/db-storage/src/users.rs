// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Users as known to the identity store
//!
//! Accounts are created by the identity provider, the controller only reads them,
//! moderates their status and references them from events, participants and invitations.

use crate::schema::users;
use chrono::{DateTime, Utc};
use database::{DbConnection, Result};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

pub use types::core::UserId;

sql_enum!(
    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    UserRole,
    "user_role",
    UserRoleType,
    {
        User = "user",
        Admin = "admin",
    }
);

sql_enum!(
    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    UserStatus,
    "user_status",
    UserStatusType,
    {
        Active = "active",
        Blocked = "blocked",
    }
);

/// Diesel user struct
///
/// Is used as a result in various queries. Represents a user column
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: UserId,
    pub login: String,
    pub display_name: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_blocked(&self) -> bool {
        self.status == UserStatus::Blocked
    }

    /// Get a user with the given id
    #[tracing::instrument(err, skip_all)]
    pub fn get(conn: &mut DbConnection, user_id: UserId) -> Result<User> {
        let user = users::table
            .filter(users::id.eq(user_id))
            .get_result(conn)?;

        Ok(user)
    }

    /// Get a user by its login, returns None if no such user exists
    #[tracing::instrument(err, skip_all)]
    pub fn get_by_login(conn: &mut DbConnection, login: &str) -> Result<Option<User>> {
        let user = users::table
            .filter(users::login.eq(login))
            .get_result(conn)
            .optional()?;

        Ok(user)
    }

    /// Get all users with the given ids
    ///
    /// Ids without a matching user are skipped
    #[tracing::instrument(err, skip_all)]
    pub fn get_all_by_ids(conn: &mut DbConnection, ids: &[UserId]) -> Result<Vec<User>> {
        let users = users::table
            .filter(users::id.eq_any(ids))
            .order_by(users::login.asc())
            .load(conn)?;

        Ok(users)
    }
}

/// Diesel insertable user struct
///
/// Represents fields that have to be specified when inserting a new user
#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub login: String,
    pub display_name: String,
    pub role: UserRole,
}

impl NewUser {
    #[tracing::instrument(err, skip_all)]
    pub fn insert(self, conn: &mut DbConnection) -> Result<User> {
        let user = diesel::insert_into(users::table)
            .values(self)
            .get_result(conn)?;

        Ok(user)
    }
}

/// Diesel user struct for updates
///
/// Is used in update queries. None fields will be ignored on update queries
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = users)]
pub struct UpdateUser {
    pub display_name: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

impl UpdateUser {
    #[tracing::instrument(err, skip_all)]
    pub fn apply(self, conn: &mut DbConnection, user_id: UserId) -> Result<User> {
        let user = diesel::update(users::table.filter(users::id.eq(user_id)))
            .set(self)
            .get_result(conn)?;

        Ok(user)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn enum_database_representation() {
        assert_eq!(UserRole::Admin.as_str(), "admin");
        assert_eq!("blocked".parse::<UserStatus>(), Ok(UserStatus::Blocked));
        assert!("root".parse::<UserRole>().is_err());
    }
}
