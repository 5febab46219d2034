// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! This module contains types that are considered to be in the core of Gathr.
//!
//! All core types are simple newtypes of primitive or other simple types,
//! and typically used by other crates of the workspace.

mod event_id;
mod invitation_id;
mod notification_id;
mod user_id;

pub use event_id::EventId;
pub use invitation_id::InvitationId;
pub use notification_id::NotificationId;
pub use user_id::UserId;
