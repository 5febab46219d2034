// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use crate::migrations::type_polyfills::datetime;
use barrel::backend::Pg;
use barrel::{types, Migration};

pub fn migration() -> String {
    let mut migr = Migration::new();

    migr.inject_custom("CREATE TYPE user_role AS ENUM ('user', 'admin')");
    migr.inject_custom("CREATE TYPE user_status AS ENUM ('active', 'blocked')");
    migr.inject_custom(
        "CREATE TYPE participant_status AS ENUM ('attending', 'cancelled', 'banned')",
    );
    migr.inject_custom(
        "CREATE TYPE participant_role AS ENUM ('organizer', 'moderator', 'participant')",
    );
    migr.inject_custom(
        "CREATE TYPE invitation_status AS ENUM ('sent', 'accepted', 'declined', 'revoked', 'expired')",
    );
    migr.inject_custom(
        "CREATE TYPE notification_kind AS ENUM ('invitation_received', 'invitation_accepted')",
    );

    migr.create_table("users", |table| {
        table.add_column(
            "id",
            types::custom("UUID DEFAULT gen_random_uuid()").primary(true),
        );
        table.add_column("login", types::text().unique(true));
        table.add_column("display_name", types::text());
        table.add_column("role", types::custom("user_role DEFAULT 'user'"));
        table.add_column("status", types::custom("user_status DEFAULT 'active'"));
        table.add_column("created_at", types::custom("TIMESTAMPTZ DEFAULT now()"));
    });

    migr.create_table("events", |table| {
        table.add_column(
            "id",
            types::custom("UUID DEFAULT gen_random_uuid()").primary(true),
        );
        table.add_column("title", types::text());
        table.add_column("description", types::text());
        table.add_column("location", types::text().nullable(true));
        table.add_column("starts_at", datetime());
        table.add_column("ends_at", datetime());
        table.add_column("max_participants", types::integer().nullable(true));
        table.add_column("created_by", types::custom("UUID REFERENCES users(id)"));
        table.add_column("created_at", types::custom("TIMESTAMPTZ DEFAULT now()"));
        table.add_column("updated_at", types::custom("TIMESTAMPTZ DEFAULT now()"));
        table.inject_custom("CHECK (starts_at < ends_at)");
        table.inject_custom("CHECK (max_participants IS NULL OR max_participants >= 1)");
    });

    migr.create_table("participants", |table| {
        table.add_column(
            "event_id",
            types::custom("UUID REFERENCES events(id) ON DELETE CASCADE"),
        );
        table.add_column(
            "user_id",
            types::custom("UUID REFERENCES users(id) ON DELETE CASCADE"),
        );
        table.add_column("status", types::custom("participant_status"));
        table.add_column("role", types::custom("participant_role"));
        table.add_column("joined_at", types::custom("TIMESTAMPTZ DEFAULT now()"));
        table.inject_custom("PRIMARY KEY (event_id, user_id)");
    });

    // Organizers are never demoted, so there is exactly one per event
    migr.inject_custom(
        "CREATE UNIQUE INDEX participants_one_organizer_idx ON participants (event_id) WHERE role = 'organizer'",
    );
    migr.inject_custom(
        "CREATE INDEX participants_event_status_idx ON participants (event_id, status)",
    );

    migr.create_table("invitations", |table| {
        table.add_column(
            "id",
            types::custom("UUID DEFAULT gen_random_uuid()").primary(true),
        );
        table.add_column(
            "event_id",
            types::custom("UUID REFERENCES events(id) ON DELETE CASCADE"),
        );
        table.add_column(
            "invitee",
            types::custom("UUID REFERENCES users(id) ON DELETE CASCADE"),
        );
        table.add_column(
            "created_by",
            types::custom("UUID REFERENCES users(id) ON DELETE CASCADE"),
        );
        table.add_column("status", types::custom("invitation_status DEFAULT 'sent'"));
        table.add_column("sent_at", types::custom("TIMESTAMPTZ DEFAULT now()"));
        table.add_column("responded_at", datetime().nullable(true));
        table.inject_custom(
            "CHECK ((status IN ('accepted', 'declined')) = (responded_at IS NOT NULL))",
        );
    });

    migr.inject_custom("CREATE INDEX invitations_invitee_idx ON invitations (invitee)");
    migr.inject_custom("CREATE INDEX invitations_event_idx ON invitations (event_id)");

    migr.create_table("notifications", |table| {
        table.add_column(
            "id",
            types::custom("UUID DEFAULT gen_random_uuid()").primary(true),
        );
        table.add_column(
            "recipient",
            types::custom("UUID REFERENCES users(id) ON DELETE CASCADE"),
        );
        table.add_column("kind", types::custom("notification_kind"));
        table.add_column(
            "event_id",
            types::custom("UUID REFERENCES events(id) ON DELETE CASCADE"),
        );
        table.add_column(
            "invitation_id",
            types::custom("UUID REFERENCES invitations(id) ON DELETE CASCADE").nullable(true),
        );
        table.add_column("created_at", types::custom("TIMESTAMPTZ DEFAULT now()"));
        table.add_column("read_at", datetime().nullable(true));
    });

    migr.inject_custom("CREATE INDEX notifications_recipient_idx ON notifications (recipient)");

    migr.make::<Pg>()
}
