// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use chrono::{Duration, Utc};
use db_storage::events::participants::{Participant, ParticipantStatus};
use db_storage::invitations::{Invitation, InvitationStatus};
use db_storage::notifications::NotificationKind;
use gathr_controller_core::services::{
    invitations, notifications, participation, NotificationService, ServiceError,
    CODE_CAPACITY_EXCEEDED, CODE_EVENT_STARTED, CODE_INVALID_STATE_TRANSITION,
    CODE_INVITATION_EXPIRED, CODE_PARTICIPANT_BANNED,
};
use pretty_assertions::assert_eq;
use serial_test::serial;
use test_util::database::DatabaseContext;

fn conflict<T: std::fmt::Debug>(result: Result<T, ServiceError>) -> (&'static str, String) {
    match result {
        Err(ServiceError::Conflict { code, message }) => (code, message.into_owned()),
        other => panic!("expected a conflict, got {other:?}"),
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires a postgres database"]
async fn accept_admits_the_invitee() {
    let db_ctx = DatabaseContext::new(true).await;
    let notification_service = NotificationService::new(db_ctx.db.clone());

    let organizer = db_ctx.create_test_user(0).unwrap();
    let invitee = db_ctx.create_test_user(1).unwrap();
    let event = db_ctx.create_test_event(organizer.id, Some(5)).unwrap();

    let mut conn = db_ctx.db.get_conn().unwrap();

    let invitation = invitations::create(
        &mut conn,
        &notification_service,
        &organizer,
        event.id,
        invitee.id,
        Utc::now(),
    )
    .unwrap();
    assert_eq!(invitation.status, InvitationStatus::Sent);
    assert_eq!(invitation.responded_at, None);

    let accepted = invitations::accept(
        &mut conn,
        &notification_service,
        &invitee,
        invitation.id,
        Utc::now(),
    )
    .unwrap();
    assert_eq!(accepted.status, InvitationStatus::Accepted);
    assert!(accepted.responded_at.is_some());

    let participant = Participant::get(&mut conn, event.id, invitee.id).unwrap();
    assert_eq!(participant.status, ParticipantStatus::Attending);
    assert_eq!(
        participation::count_attending(&mut conn, event.id).unwrap(),
        2
    );

    let received = notifications::list(&mut conn, invitee.id).unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].kind, NotificationKind::InvitationReceived);

    let accepted = notifications::list(&mut conn, organizer.id).unwrap();
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].kind, NotificationKind::InvitationAccepted);
    assert_eq!(accepted[0].invitation_id, Some(invitation.id));
}

#[tokio::test]
#[serial]
#[ignore = "requires a postgres database"]
async fn revoke_after_accept_is_a_conflict() {
    let db_ctx = DatabaseContext::new(true).await;
    let notification_service = NotificationService::new(db_ctx.db.clone());

    let organizer = db_ctx.create_test_user(0).unwrap();
    let invitee = db_ctx.create_test_user(1).unwrap();
    let event = db_ctx.create_test_event(organizer.id, None).unwrap();

    let mut conn = db_ctx.db.get_conn().unwrap();

    let invitation = invitations::create(
        &mut conn,
        &notification_service,
        &organizer,
        event.id,
        invitee.id,
        Utc::now(),
    )
    .unwrap();

    invitations::accept(
        &mut conn,
        &notification_service,
        &invitee,
        invitation.id,
        Utc::now(),
    )
    .unwrap();

    let (code, message) =
        conflict(invitations::revoke(&mut conn, &organizer, invitation.id, Utc::now()));

    assert_eq!(code, CODE_INVALID_STATE_TRANSITION);
    assert_eq!(message, "Only sent invitations can be revoked");
}

#[tokio::test]
#[serial]
#[ignore = "requires a postgres database"]
async fn only_the_invitee_may_respond() {
    let db_ctx = DatabaseContext::new(true).await;
    let notification_service = NotificationService::new(db_ctx.db.clone());

    let organizer = db_ctx.create_test_user(0).unwrap();
    let invitee = db_ctx.create_test_user(1).unwrap();
    let other = db_ctx.create_test_user(2).unwrap();
    let event = db_ctx.create_test_event(organizer.id, None).unwrap();

    let mut conn = db_ctx.db.get_conn().unwrap();

    let invitation = invitations::create(
        &mut conn,
        &notification_service,
        &organizer,
        event.id,
        invitee.id,
        Utc::now(),
    )
    .unwrap();

    assert!(matches!(
        invitations::accept(
            &mut conn,
            &notification_service,
            &other,
            invitation.id,
            Utc::now()
        ),
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        invitations::decline(&mut conn, &other, invitation.id, Utc::now()),
        Err(ServiceError::Forbidden(_))
    ));

    // Nothing changed
    let invitation = Invitation::get(&mut conn, invitation.id).unwrap();
    assert_eq!(invitation.status, InvitationStatus::Sent);
    assert!(Participant::get(&mut conn, event.id, other.id).is_err());
}

#[tokio::test]
#[serial]
#[ignore = "requires a postgres database"]
async fn accept_after_decline_is_a_conflict() {
    let db_ctx = DatabaseContext::new(true).await;
    let notification_service = NotificationService::new(db_ctx.db.clone());

    let organizer = db_ctx.create_test_user(0).unwrap();
    let invitee = db_ctx.create_test_user(1).unwrap();
    let event = db_ctx.create_test_event(organizer.id, None).unwrap();

    let mut conn = db_ctx.db.get_conn().unwrap();

    let invitation = invitations::create(
        &mut conn,
        &notification_service,
        &organizer,
        event.id,
        invitee.id,
        Utc::now(),
    )
    .unwrap();

    let declined = invitations::decline(&mut conn, &invitee, invitation.id, Utc::now()).unwrap();
    assert_eq!(declined.status, InvitationStatus::Declined);
    assert!(declined.responded_at.is_some());

    let (code, _) = conflict(invitations::accept(
        &mut conn,
        &notification_service,
        &invitee,
        invitation.id,
        Utc::now(),
    ));
    assert_eq!(code, CODE_INVALID_STATE_TRANSITION);

    assert!(Participant::get(&mut conn, event.id, invitee.id).is_err());
}

#[tokio::test]
#[serial]
#[ignore = "requires a postgres database"]
async fn accept_into_full_event_rolls_back() {
    let db_ctx = DatabaseContext::new(true).await;
    let notification_service = NotificationService::new(db_ctx.db.clone());

    let organizer = db_ctx.create_test_user(0).unwrap();
    let invitee = db_ctx.create_test_user(1).unwrap();
    // Only the organizer fits
    let event = db_ctx.create_test_event(organizer.id, Some(1)).unwrap();

    let mut conn = db_ctx.db.get_conn().unwrap();

    let invitation = invitations::create(
        &mut conn,
        &notification_service,
        &organizer,
        event.id,
        invitee.id,
        Utc::now(),
    )
    .unwrap();

    let (code, _) = conflict(invitations::accept(
        &mut conn,
        &notification_service,
        &invitee,
        invitation.id,
        Utc::now(),
    ));
    assert_eq!(code, CODE_CAPACITY_EXCEEDED);

    let invitation = Invitation::get(&mut conn, invitation.id).unwrap();
    assert_eq!(invitation.status, InvitationStatus::Sent);
    assert_eq!(invitation.responded_at, None);
    assert!(notifications::list(&mut conn, organizer.id)
        .unwrap()
        .is_empty());
}

#[tokio::test]
#[serial]
#[ignore = "requires a postgres database"]
async fn accept_readmits_a_cancelled_participant() {
    let db_ctx = DatabaseContext::new(true).await;
    let notification_service = NotificationService::new(db_ctx.db.clone());

    let organizer = db_ctx.create_test_user(0).unwrap();
    let invitee = db_ctx.create_test_user(1).unwrap();
    let event = db_ctx.create_test_event(organizer.id, None).unwrap();

    let mut conn = db_ctx.db.get_conn().unwrap();

    participation::join(&mut conn, event.id, invitee.id).unwrap();
    participation::change_status(
        &mut conn,
        &organizer,
        event.id,
        invitee.id,
        ParticipantStatus::Cancelled,
    )
    .unwrap();

    let invitation = invitations::create(
        &mut conn,
        &notification_service,
        &organizer,
        event.id,
        invitee.id,
        Utc::now(),
    )
    .unwrap();

    let accepted = invitations::accept(
        &mut conn,
        &notification_service,
        &invitee,
        invitation.id,
        Utc::now(),
    )
    .unwrap();
    assert_eq!(accepted.status, InvitationStatus::Accepted);

    let participant = Participant::get(&mut conn, event.id, invitee.id).unwrap();
    assert_eq!(participant.status, ParticipantStatus::Attending);
    assert_eq!(
        participation::count_attending(&mut conn, event.id).unwrap(),
        2
    );
}

#[tokio::test]
#[serial]
#[ignore = "requires a postgres database"]
async fn accept_rejects_a_banned_invitee() {
    let db_ctx = DatabaseContext::new(true).await;
    let notification_service = NotificationService::new(db_ctx.db.clone());

    let organizer = db_ctx.create_test_user(0).unwrap();
    let invitee = db_ctx.create_test_user(1).unwrap();
    let event = db_ctx.create_test_event(organizer.id, None).unwrap();

    let mut conn = db_ctx.db.get_conn().unwrap();

    participation::join(&mut conn, event.id, invitee.id).unwrap();
    participation::change_status(
        &mut conn,
        &organizer,
        event.id,
        invitee.id,
        ParticipantStatus::Banned,
    )
    .unwrap();

    let invitation = invitations::create(
        &mut conn,
        &notification_service,
        &organizer,
        event.id,
        invitee.id,
        Utc::now(),
    )
    .unwrap();

    let (code, _) = conflict(invitations::accept(
        &mut conn,
        &notification_service,
        &invitee,
        invitation.id,
        Utc::now(),
    ));
    assert_eq!(code, CODE_PARTICIPANT_BANNED);

    let invitation = Invitation::get(&mut conn, invitation.id).unwrap();
    assert_eq!(invitation.status, InvitationStatus::Sent);
    assert_eq!(invitation.responded_at, None);

    let participant = Participant::get(&mut conn, event.id, invitee.id).unwrap();
    assert_eq!(participant.status, ParticipantStatus::Banned);
    assert_eq!(
        participation::count_attending(&mut conn, event.id).unwrap(),
        1
    );
}

#[tokio::test]
#[serial]
#[ignore = "requires a postgres database"]
async fn accept_readmission_is_capacity_checked() {
    let db_ctx = DatabaseContext::new(true).await;
    let notification_service = NotificationService::new(db_ctx.db.clone());

    let organizer = db_ctx.create_test_user(0).unwrap();
    let invitee = db_ctx.create_test_user(1).unwrap();
    let other = db_ctx.create_test_user(2).unwrap();
    let event = db_ctx.create_test_event(organizer.id, Some(2)).unwrap();

    let mut conn = db_ctx.db.get_conn().unwrap();

    participation::join(&mut conn, event.id, invitee.id).unwrap();
    participation::change_status(
        &mut conn,
        &organizer,
        event.id,
        invitee.id,
        ParticipantStatus::Cancelled,
    )
    .unwrap();
    participation::join(&mut conn, event.id, other.id).unwrap();

    let invitation = invitations::create(
        &mut conn,
        &notification_service,
        &organizer,
        event.id,
        invitee.id,
        Utc::now(),
    )
    .unwrap();

    let (code, _) = conflict(invitations::accept(
        &mut conn,
        &notification_service,
        &invitee,
        invitation.id,
        Utc::now(),
    ));
    assert_eq!(code, CODE_CAPACITY_EXCEEDED);

    let invitation = Invitation::get(&mut conn, invitation.id).unwrap();
    assert_eq!(invitation.status, InvitationStatus::Sent);

    let participant = Participant::get(&mut conn, event.id, invitee.id).unwrap();
    assert_eq!(participant.status, ParticipantStatus::Cancelled);
}

#[tokio::test]
#[serial]
#[ignore = "requires a postgres database"]
async fn inviting_requires_an_event_manager_and_an_existing_invitee() {
    let db_ctx = DatabaseContext::new(true).await;
    let notification_service = NotificationService::new(db_ctx.db.clone());

    let organizer = db_ctx.create_test_user(0).unwrap();
    let participant = db_ctx.create_test_user(1).unwrap();
    let invitee = db_ctx.create_test_user(2).unwrap();
    let event = db_ctx.create_test_event(organizer.id, None).unwrap();

    let mut conn = db_ctx.db.get_conn().unwrap();
    participation::join(&mut conn, event.id, participant.id).unwrap();

    assert!(matches!(
        invitations::create(
            &mut conn,
            &notification_service,
            &participant,
            event.id,
            invitee.id,
            Utc::now()
        ),
        Err(ServiceError::Forbidden(_))
    ));

    let unknown = db_storage::users::UserId::from(uuid::Uuid::nil());

    assert!(matches!(
        invitations::create(
            &mut conn,
            &notification_service,
            &organizer,
            event.id,
            unknown,
            Utc::now()
        ),
        Err(ServiceError::NotFound("user"))
    ));
}

#[tokio::test]
#[serial]
#[ignore = "requires a postgres database"]
async fn repeated_invitations_are_allowed() {
    let db_ctx = DatabaseContext::new(true).await;
    let notification_service = NotificationService::new(db_ctx.db.clone());

    let organizer = db_ctx.create_test_user(0).unwrap();
    let invitee = db_ctx.create_test_user(1).unwrap();
    let event = db_ctx.create_test_event(organizer.id, None).unwrap();

    let mut conn = db_ctx.db.get_conn().unwrap();

    for _ in 0..2 {
        invitations::create(
            &mut conn,
            &notification_service,
            &organizer,
            event.id,
            invitee.id,
            Utc::now(),
        )
        .unwrap();
    }

    assert_eq!(
        invitations::list_received(&mut conn, &invitee).unwrap().len(),
        2
    );
    assert_eq!(
        invitations::list_for_event(&mut conn, &organizer, event.id)
            .unwrap()
            .len(),
        2
    );
    assert!(matches!(
        invitations::list_for_event(&mut conn, &invitee, event.id),
        Err(ServiceError::Forbidden(_))
    ));
}

#[tokio::test]
#[serial]
#[ignore = "requires a postgres database"]
async fn revoke_permissions() {
    let db_ctx = DatabaseContext::new(true).await;
    let notification_service = NotificationService::new(db_ctx.db.clone());

    let organizer = db_ctx.create_test_user(0).unwrap();
    let moderator = db_ctx.create_test_user(1).unwrap();
    let invitee = db_ctx.create_test_user(2).unwrap();
    let bystander = db_ctx.create_test_user(3).unwrap();
    let event = db_ctx.create_test_event(organizer.id, None).unwrap();

    let mut conn = db_ctx.db.get_conn().unwrap();

    participation::join(&mut conn, event.id, moderator.id).unwrap();
    participation::change_role(
        &mut conn,
        &organizer,
        event.id,
        moderator.id,
        db_storage::events::participants::ParticipantRole::Moderator,
    )
    .unwrap();

    let invitation = invitations::create(
        &mut conn,
        &notification_service,
        &moderator,
        event.id,
        invitee.id,
        Utc::now(),
    )
    .unwrap();

    assert!(matches!(
        invitations::revoke(&mut conn, &bystander, invitation.id, Utc::now()),
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        invitations::revoke(&mut conn, &invitee, invitation.id, Utc::now()),
        Err(ServiceError::Forbidden(_))
    ));

    // The organizer may revoke invitations sent by moderators
    let revoked = invitations::revoke(&mut conn, &organizer, invitation.id, Utc::now()).unwrap();
    assert_eq!(revoked.status, InvitationStatus::Revoked);
    assert_eq!(revoked.responded_at, None);
}

#[tokio::test]
#[serial]
#[ignore = "requires a postgres database"]
async fn invitations_of_started_events_expire() {
    let db_ctx = DatabaseContext::new(true).await;
    let notification_service = NotificationService::new(db_ctx.db.clone());

    let organizer = db_ctx.create_test_user(0).unwrap();
    let invitee = db_ctx.create_test_user(1).unwrap();
    let other = db_ctx.create_test_user(2).unwrap();
    let event = db_ctx.create_test_event(organizer.id, None).unwrap();

    let mut conn = db_ctx.db.get_conn().unwrap();

    let first = invitations::create(
        &mut conn,
        &notification_service,
        &organizer,
        event.id,
        invitee.id,
        Utc::now(),
    )
    .unwrap();
    let second = invitations::create(
        &mut conn,
        &notification_service,
        &organizer,
        event.id,
        other.id,
        Utc::now(),
    )
    .unwrap();

    // The test event starts tomorrow
    let later = Utc::now() + Duration::days(2);

    let (code, _) = conflict(invitations::create(
        &mut conn,
        &notification_service,
        &organizer,
        event.id,
        other.id,
        later,
    ));
    assert_eq!(code, CODE_EVENT_STARTED);

    let (code, _) = conflict(invitations::accept(
        &mut conn,
        &notification_service,
        &invitee,
        first.id,
        later,
    ));
    assert_eq!(code, CODE_INVITATION_EXPIRED);

    let first = Invitation::get(&mut conn, first.id).unwrap();
    assert_eq!(first.status, InvitationStatus::Expired);
    assert!(Participant::get(&mut conn, event.id, invitee.id).is_err());

    assert_eq!(invitations::expire_stale(&mut conn, later).unwrap(), 1);

    let second = Invitation::get(&mut conn, second.id).unwrap();
    assert_eq!(second.status, InvitationStatus::Expired);
}
