use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS profiles (
            id          TEXT PRIMARY KEY,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            full_name   TEXT NOT NULL,
            avatar      TEXT NOT NULL DEFAULT '',
            instagram   TEXT,
            birthdate   TEXT,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS events (
            id                TEXT PRIMARY KEY,
            title             TEXT NOT NULL,
            description       TEXT NOT NULL,
            event_type        TEXT NOT NULL,
            date              TEXT NOT NULL,
            province          TEXT NOT NULL,
            city              TEXT NOT NULL,
            address           TEXT NOT NULL,
            is_free           INTEGER NOT NULL,
            price_anticipada  REAL,
            price_general     REAL,
            multimedia        TEXT NOT NULL DEFAULT '[]',
            organizer_id      TEXT NOT NULL REFERENCES profiles(id),
            created_at        TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_events_date
            ON events(date);

        -- One row per (event, user): the schema is the backstop for the
        -- check-before-write in the toggle logic.
        CREATE TABLE IF NOT EXISTS likes (
            event_id    TEXT NOT NULL REFERENCES events(id),
            user_id     TEXT NOT NULL REFERENCES profiles(id),
            full_name   TEXT NOT NULL,
            avatar      TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            PRIMARY KEY (event_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS attendances (
            event_id    TEXT NOT NULL REFERENCES events(id),
            user_id     TEXT NOT NULL REFERENCES profiles(id),
            full_name   TEXT NOT NULL,
            avatar      TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            PRIMARY KEY (event_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS communities (
            follower_id  TEXT NOT NULL REFERENCES profiles(id),
            followed_id  TEXT NOT NULL REFERENCES profiles(id),
            created_at   TEXT NOT NULL,
            PRIMARY KEY (follower_id, followed_id)
        );

        CREATE TABLE IF NOT EXISTS notifications (
            id            TEXT PRIMARY KEY,
            recipient_id  TEXT NOT NULL REFERENCES profiles(id),
            sender_id     TEXT NOT NULL REFERENCES profiles(id),
            sender_name   TEXT NOT NULL,
            kind          TEXT NOT NULL,
            event_id      TEXT,
            read          INTEGER NOT NULL DEFAULT 0,
            created_at    TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_recipient
            ON notifications(recipient_id, created_at);

        CREATE TABLE IF NOT EXISTS announcements (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            body        TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS announcement_reads (
            announcement_id  TEXT NOT NULL REFERENCES announcements(id),
            user_id          TEXT NOT NULL REFERENCES profiles(id),
            PRIMARY KEY (announcement_id, user_id)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
