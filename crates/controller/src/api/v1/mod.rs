// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! REST API v1
//!
//! Current Endpoints. See their respective function:
//! - `/events` ([GET](events::get_events), [POST](events::new_event))
//! - `/events/{event_id}` ([GET](events::get_event), [PATCH](events::patch_event), [DELETE](events::delete_event))
//! - `/events/{event_id}/participants` ([GET](participants::get_participants), [POST](participants::join))
//! - `/events/{event_id}/participants/me` ([DELETE](participants::leave))
//! - `/events/{event_id}/participants/{user_id}/status` ([PATCH](participants::patch_status))
//! - `/events/{event_id}/participants/{user_id}/role` ([PATCH](participants::patch_role))
//! - `/events/{event_id}/invitations` ([GET](invitations::get_event_invitations))
//! - `/invitations` ([GET](invitations::get_invitations), [POST](invitations::new_invitation))
//! - `/invitations/{invitation_id}/accept` ([POST](invitations::accept))
//! - `/invitations/{invitation_id}/decline` ([POST](invitations::decline))
//! - `/invitations/{invitation_id}/revoke` ([POST](invitations::revoke))
//! - `/users/me` ([GET](users::get_me))
//! - `/users/{user_id}/status` ([PATCH](users::patch_status))
//! - `/users/me/notifications` ([GET](notifications::get_notifications))
//! - `/users/me/notifications/{notification_id}/read` ([POST](notifications::mark_read))
//!
//! Every endpoint requires a bearer token, see [`middleware::user_auth`].

pub use request::PagePaginationQuery;
pub use response::{ApiResponse, DefaultApiResult};

pub mod events;
pub mod invitations;
pub mod middleware;
pub mod notifications;
pub mod participants;
mod request;
pub mod response;
pub mod users;
mod util;
