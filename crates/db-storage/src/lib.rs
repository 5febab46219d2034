// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

#![allow(clippy::extra_unused_lifetimes)]

//! Contains the database ORM and database migrations for the controller/storage
//! Builds upon gathr-database
//!
//! Every model exposes its queries as associated functions taking a
//! `&mut DbConnection`, so callers decide about the transaction boundaries:
//! ```rust,ignore
//! conn.transaction(|conn| {
//!     let event = Event::get_for_update(conn, event_id)?;
//!     let attending = Participant::count_attending(conn, event.id)?;
//!     // ...
//! })
//! ```

#[macro_use]
mod macros;
mod schema;

pub mod events;
pub mod invitations;
pub mod migrations;
pub mod notifications;
pub mod users;

// SQL types reexport for schema.rs
pub mod sql_types {
    pub use super::events::participants::{ParticipantRoleType, ParticipantStatusType};
    pub use super::invitations::InvitationStatusType;
    pub use super::notifications::NotificationKindType;
    pub use super::users::{UserRoleType, UserStatusType};
    pub use diesel::sql_types::*;
}
