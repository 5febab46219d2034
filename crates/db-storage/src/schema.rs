// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

diesel::table! {
    use crate::sql_types::*;

    users (id) {
        id -> Uuid,
        login -> Text,
        display_name -> Text,
        role -> UserRoleType,
        status -> UserStatusType,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    use crate::sql_types::*;

    events (id) {
        id -> Uuid,
        title -> Text,
        description -> Text,
        location -> Nullable<Text>,
        starts_at -> Timestamptz,
        ends_at -> Timestamptz,
        max_participants -> Nullable<Int4>,
        created_by -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    use crate::sql_types::*;

    participants (event_id, user_id) {
        event_id -> Uuid,
        user_id -> Uuid,
        status -> ParticipantStatusType,
        role -> ParticipantRoleType,
        joined_at -> Timestamptz,
    }
}

diesel::table! {
    use crate::sql_types::*;

    invitations (id) {
        id -> Uuid,
        event_id -> Uuid,
        invitee -> Uuid,
        created_by -> Uuid,
        status -> InvitationStatusType,
        sent_at -> Timestamptz,
        responded_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    use crate::sql_types::*;

    notifications (id) {
        id -> Uuid,
        recipient -> Uuid,
        kind -> NotificationKindType,
        event_id -> Uuid,
        invitation_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        read_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(events -> users (created_by));
diesel::joinable!(participants -> events (event_id));
diesel::joinable!(participants -> users (user_id));
diesel::joinable!(invitations -> events (event_id));
diesel::joinable!(notifications -> users (recipient));

diesel::allow_tables_to_appear_in_same_query!(events, invitations, notifications, participants, users);
