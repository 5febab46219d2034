// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use chrono::{Duration, Utc};
use gathr_db_storage::events::UpdateEvent;
use gathr_db_storage::invitations::{
    Invitation, InvitationStatus, NewInvitation, UpdateInvitation,
};
use pretty_assertions::assert_eq;
use serial_test::serial;
use test_util::database::DatabaseContext;

#[tokio::test]
#[serial]
#[ignore = "requires a postgres database"]
async fn invitation_leaves_sent_only_once() {
    let db_ctx = DatabaseContext::new(true).await;

    let organizer = db_ctx.create_test_user(0).unwrap();
    let invitee = db_ctx.create_test_user(1).unwrap();
    let event = db_ctx.create_test_event(organizer.id, None).unwrap();

    let mut conn = db_ctx.db.get_conn().unwrap();

    let invitation = NewInvitation {
        event_id: event.id,
        invitee: invitee.id,
        created_by: organizer.id,
    }
    .insert(&mut conn)
    .unwrap();

    assert_eq!(invitation.status, InvitationStatus::Sent);
    assert_eq!(invitation.responded_at, None);

    let declined = UpdateInvitation::transition(InvitationStatus::Declined, Utc::now())
        .apply_if_sent(&mut conn, invitation.id)
        .unwrap()
        .unwrap();
    assert_eq!(declined.status, InvitationStatus::Declined);
    assert!(declined.responded_at.is_some());

    let accepted = UpdateInvitation::transition(InvitationStatus::Accepted, Utc::now())
        .apply_if_sent(&mut conn, invitation.id)
        .unwrap();
    assert_eq!(accepted, None);

    let stored = Invitation::get(&mut conn, invitation.id).unwrap();
    assert_eq!(stored, declined);
}

#[tokio::test]
#[serial]
#[ignore = "requires a postgres database"]
async fn repeated_invitations_are_listed() {
    let db_ctx = DatabaseContext::new(true).await;

    let organizer = db_ctx.create_test_user(0).unwrap();
    let invitee = db_ctx.create_test_user(1).unwrap();
    let event = db_ctx.create_test_event(organizer.id, None).unwrap();

    let mut conn = db_ctx.db.get_conn().unwrap();

    for _ in 0..2 {
        NewInvitation {
            event_id: event.id,
            invitee: invitee.id,
            created_by: organizer.id,
        }
        .insert(&mut conn)
        .unwrap();
    }

    assert_eq!(Invitation::get_all_for_invitee(&mut conn, invitee.id).unwrap().len(), 2);
    assert_eq!(Invitation::get_all_for_event(&mut conn, event.id).unwrap().len(), 2);
    assert!(Invitation::get_all_for_invitee(&mut conn, organizer.id)
        .unwrap()
        .is_empty());
}

#[tokio::test]
#[serial]
#[ignore = "requires a postgres database"]
async fn expire_stale_only_touches_started_events() {
    let db_ctx = DatabaseContext::new(true).await;

    let organizer = db_ctx.create_test_user(0).unwrap();
    let invitee = db_ctx.create_test_user(1).unwrap();
    let upcoming = db_ctx.create_test_event(organizer.id, None).unwrap();
    let started = db_ctx.create_test_event(organizer.id, None).unwrap();

    let mut conn = db_ctx.db.get_conn().unwrap();

    let now = Utc::now();
    UpdateEvent {
        title: None,
        description: None,
        location: None,
        starts_at: Some(now - Duration::hours(1)),
        ends_at: None,
        max_participants: None,
        updated_at: now,
    }
    .apply(&mut conn, started.id)
    .unwrap();

    let mut invite = |event_id| {
        NewInvitation {
            event_id,
            invitee: invitee.id,
            created_by: organizer.id,
        }
        .insert(&mut conn)
        .unwrap()
    };

    let pending = invite(upcoming.id);
    let stale = invite(started.id);

    assert_eq!(Invitation::expire_stale(&mut conn, now).unwrap(), 1);

    assert_eq!(
        Invitation::get(&mut conn, stale.id).unwrap().status,
        InvitationStatus::Expired
    );
    assert_eq!(
        Invitation::get(&mut conn, pending.id).unwrap().status,
        InvitationStatus::Sent
    );

    // nothing left to expire
    assert_eq!(Invitation::expire_stale(&mut conn, now).unwrap(), 0);
}
